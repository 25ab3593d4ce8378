//! Polling protocol wire types.
//!
//! Defines the message shapes exchanged with the polling backend and
//! the protocol constants (headers, status values, internal event
//! names).
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `response` | Response body types for connect/receive/failures |

// ============================================================================
// Submodules
// ============================================================================

/// Response body types.
pub mod response;

// ============================================================================
// Re-exports
// ============================================================================

pub use response::{ChannelRef, ConnectResponse, ErrorResponse, EventItem, PollResponse};

// ============================================================================
// Constants
// ============================================================================

/// Header correlating requests of one logical session.
///
/// Carried on every request (sourced live from storage) and persisted
/// back from every successful response that includes it.
pub const SOCKET_ID_HEADER: &str = "X-Socket-ID";

/// The `status` value of an accepted response body.
pub const STATUS_SUCCESS: &str = "success";

/// Error code marking a recoverable expired-session failure.
pub const TOKEN_EXPIRED_CODE: &str = "TOKEN_EXPIRED";

/// Internal event fired when a subscription is established.
pub const SUBSCRIPTION_SUCCEEDED_EVENT: &str = "pollcast:subscription_succeeded";

/// Internal event fired when a member joins a presence channel.
pub const MEMBER_ADDED_EVENT: &str = "pollcast:member_added";

/// Internal event fired when a member leaves a presence channel.
pub const MEMBER_REMOVED_EVENT: &str = "pollcast:member_removed";
