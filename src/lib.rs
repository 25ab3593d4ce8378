//! Pollcast - HTTP polling pub/sub client.
//!
//! This library emulates a real-time pub/sub socket connection over
//! plain HTTP polling, for backends that speak the pollcast protocol
//! (connect / receive / subscribe / unsubscribe / publish). The public
//! surface follows the laravel-echo channel model.
//!
//! # Architecture
//!
//! The client is a small state machine over callback-based HTTP
//! primitives:
//!
//! - A [`Socket`] owns the connection: handshake, channel registry,
//!   request queue, and a self-paced poll loop
//! - Requests issued before the handshake settles are queued and
//!   flushed as a barrier, so the first poll never races a subscribe
//! - An expired session token triggers a bounded reconnect that
//!   preserves the polling cursor, so no events are skipped
//! - With several instances sharing storage, only the most recently
//!   active one polls; the rest keep a warm no-op timer
//!
//! # Quick Start
//!
//! ```no_run
//! use pollcast::{Connector, Options, Routes};
//!
//! #[tokio::main]
//! async fn main() -> pollcast::Result<()> {
//!     let connector = Connector::new(
//!         Options::new(Routes::with_base("https://example.com/pollcast"))
//!             .with_polling_ms(2_000)
//!             .with_auth_header("Authorization", "Bearer token"),
//!     )?;
//!
//!     connector.channel("orders").listen("OrderShipped", |payload| {
//!         println!("shipped: {payload}");
//!     });
//!
//!     connector
//!         .private_channel("chat")
//!         .whisper("typing", serde_json::json!({"name": "jo"}));
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`broadcasting`] | Connector and channel facade |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`http`] | Request wrapper and fan-out joins (internal) |
//! | [`options`] | Routes and socket configuration |
//! | [`protocol`] | Wire message types and constants (internal) |
//! | [`socket`] | Connection state machine |
//! | [`storage`] | JSON key-value persistence |
//! | [`transport`] | Pluggable HTTP transport |
//! | [`util`] | Form encoding and event name formatting |
//! | [`window`] | Cross-instance polling arbitration |

// ============================================================================
// Modules
// ============================================================================

/// Connector and channel facade.
///
/// The public API surface: [`Connector`] owns the socket and hands out
/// [`Channel`], [`PrivateChannel`] and [`PresenceChannel`] handles.
pub mod broadcasting;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Request plumbing.
///
/// Internal module wrapping single HTTP calls behind callback hooks
/// and joining batches of them.
pub mod http;

/// Routes and socket configuration.
pub mod options;

/// Wire message types and protocol constants.
///
/// Internal module defining the response shapes the backend sends.
pub mod protocol;

/// Connection state machine.
///
/// [`Socket`] manages the handshake, subscriptions, the poll loop and
/// token-expiry recovery.
pub mod socket;

/// JSON key-value persistence.
///
/// Pluggable storage for the socket id and the active-window marker.
pub mod storage;

/// Pluggable HTTP transport.
///
/// [`HttpTransport`] is the seam between the state machine and the
/// network; [`ReqwestTransport`] is the default implementation.
pub mod transport;

/// Form encoding and event name formatting.
pub mod util;

/// Cross-instance polling arbitration.
pub mod window;

// ============================================================================
// Re-exports
// ============================================================================

// Facade types
pub use broadcasting::{Channel, Connector, PresenceChannel, PrivateChannel};

// Error types
pub use error::{Error, Result};

// Configuration
pub use options::{DEFAULT_POLLING_INTERVAL, Options, Routes};

// Core types
pub use socket::{Listener, Socket};

// Storage and transport seams
pub use storage::{MemoryBackend, StorageBackend};
pub use transport::{HttpTransport, ReqwestTransport};
pub use window::{AlwaysActive, TabArbiter, WindowVisibility};
