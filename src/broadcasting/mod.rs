//! Public broadcasting facade.
//!
//! Maps the laravel-echo channel model onto the socket: a [`Connector`]
//! owns the connection and memoizes [`Channel`] handles, with
//! [`PrivateChannel`] and [`PresenceChannel`] layering authorization
//! and member tracking over the same event plumbing.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connector` | Entry point tying the socket to the channel API |
//! | `channel` | Public channel handle |
//! | `private_channel` | Authorized channel with whispering |
//! | `presence_channel` | Authorized channel with member tracking |

// ============================================================================
// Submodules
// ============================================================================

/// Entry point tying the socket to the channel API.
pub mod connector;

/// Public channel handle.
pub mod channel;

/// Authorized channel with whispering.
pub mod private_channel;

/// Authorized channel with member tracking.
pub mod presence_channel;

// ============================================================================
// Re-exports
// ============================================================================

pub use channel::Channel;
pub use connector::Connector;
pub use presence_channel::PresenceChannel;
pub use private_channel::PrivateChannel;
