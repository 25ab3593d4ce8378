//! Request plumbing for the polling protocol.
//!
//! [`Request`] wraps a single outbound HTTP call behind
//! success/fail/always hooks; [`RequestGroup`] joins a batch of them.
//! Both are consumed by the [`Socket`](crate::socket::Socket), which is
//! where retry and recovery policy lives — a `Request` never retries
//! itself.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `request` | Single-call wrapper with hooks and cancellation |
//! | `request_group` | Fan-out/fan-in join over a request batch |

// ============================================================================
// Submodules
// ============================================================================

/// Single-call wrapper with hooks and cancellation.
pub mod request;

/// Fan-out/fan-in join over a request batch.
pub mod request_group;

// ============================================================================
// Re-exports
// ============================================================================

pub use request::{ErrorNotify, ErrorSink, HeaderValue, Request, RequestHandle, default_error_sink};
pub use request_group::RequestGroup;
