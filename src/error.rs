//! Error types for the pollcast client.
//!
//! This module defines all error types used throughout the crate.
//!
//! Note that the [`Socket`](crate::socket::Socket) itself never surfaces
//! errors to its caller — failed polls are retried on the next tick and
//! unrecoverable responses are reported through the error sink (see the
//! crate-level docs). The [`Error`] type covers the places where an error
//! *is* a return value: configuration validation and the concrete HTTP
//! transport.
//!
//! # Usage
//!
//! ```ignore
//! use pollcast::{Result, Error};
//!
//! fn example(options: &Options) -> Result<()> {
//!     options.validate()?;
//!     Ok(())
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when connector configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Route URL failed to parse.
    ///
    /// Returned when one of the configured routes is not a valid URL.
    #[error("Invalid route URL: {0}")]
    UrlParse(#[from] url::ParseError),

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// Network-level transport failure.
    ///
    /// Returned by the HTTP transport when the request could not be
    /// completed at all (connection refused, DNS failure, ...). HTTP
    /// error statuses are not transport errors; they settle normally
    /// and run the request's `fail` hooks.
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// HTTP client error.
    ///
    /// Produced by the default [`reqwest`] transport for client
    /// construction and request execution failures.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a transport error.
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a configuration error.
    #[inline]
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::UrlParse(_))
    }

    /// Returns `true` if this is a network-level transport error.
    #[inline]
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Http(_))
    }
}

// ============================================================================
// Tests
// ============================================================================
