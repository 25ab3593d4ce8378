//! Small shared utilities.
//!
//! | Module | Description |
//! |--------|-------------|
//! | `encode` | PHP-style URL-form encoding of nested values |
//! | `event_formatter` | laravel-echo event name formatting |

// ============================================================================
// Submodules
// ============================================================================

/// URL-form encoding of nested key/value structures.
pub mod encode;

/// Event name formatting for the broadcasting facade.
pub mod event_formatter;

// ============================================================================
// Re-exports
// ============================================================================

pub use encode::{FormMap, FormValue, url_encode_object};
pub use event_formatter::EventFormatter;
