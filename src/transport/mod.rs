//! HTTP transport layer.
//!
//! The socket does not speak HTTP directly; it builds [`WireRequest`]s
//! and hands them to an [`HttpTransport`]. This keeps the state machine
//! testable against a scripted transport and lets hosts swap in their
//! own client (connection pooling, proxies, instrumented clients, ...).
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `reqwest_client` | Default transport backed by `reqwest` |

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;

use crate::error::Result;

// ============================================================================
// Submodules
// ============================================================================

/// Default transport backed by `reqwest`.
pub mod reqwest_client;

#[cfg(test)]
pub(crate) mod mock;

// ============================================================================
// Re-exports
// ============================================================================

pub use reqwest_client::ReqwestTransport;

// ============================================================================
// Method
// ============================================================================

/// HTTP method of a wire request.
///
/// The polling protocol only POSTs, but the request wrapper is
/// method-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// HTTP GET.
    Get,
    /// HTTP POST.
    Post,
}

impl Method {
    /// Returns the method name as it appears on the wire.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

// ============================================================================
// WireRequest
// ============================================================================

/// A fully-resolved outbound request.
///
/// Header values are already evaluated (lazy headers resolved, absent
/// ones omitted) and the body is already form-encoded by the time a
/// transport sees it.
#[derive(Debug, Clone)]
pub struct WireRequest {
    /// HTTP method.
    pub method: Method,

    /// Absolute request URL.
    pub url: String,

    /// Resolved request headers.
    pub headers: Vec<(String, String)>,

    /// URL-form-encoded body.
    pub body: String,

    /// Include credentials (cookies) on this request.
    pub with_credentials: bool,

    /// Request should survive host teardown (used for
    /// unsubscribe-on-navigate). Transports honor this on a best-effort
    /// basis.
    pub keep_alive: bool,
}

// ============================================================================
// HttpResponse
// ============================================================================

/// A settled HTTP response.
///
/// A network-level failure that is not an explicit abort synthesizes a
/// status-0 response so failure hooks still run.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code; 0 for a synthesized network-error response.
    pub status: u16,

    /// Response headers with lowercase names.
    pub headers: Vec<(String, String)>,

    /// Response body.
    pub body: String,
}

impl HttpResponse {
    /// Creates a response with no headers.
    #[inline]
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Creates the pseudo-response representing a network-level
    /// failure.
    #[inline]
    #[must_use]
    pub fn network_error() -> Self {
        Self::new(0, "")
    }

    /// Returns `true` for 2xx statuses.
    #[inline]
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Looks up a response header by name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        let lower = name.to_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| k == &lower)
            .map(|(_, v)| v.as_str())
    }

    /// Adds a header (stored lowercase).
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_lowercase(), value.into()));
        self
    }
}

// ============================================================================
// HttpTransport
// ============================================================================

/// A minimal async HTTP client.
///
/// Implementations handle the mechanics of making requests (TLS,
/// pooling, ...); an `Err` return means the request could not complete
/// at the network level. HTTP error statuses are `Ok` responses.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Executes a request and returns the settled response.
    async fn execute(&self, request: WireRequest) -> Result<HttpResponse>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_as_str() {
        assert_eq!(Method::Post.as_str(), "POST");
        assert_eq!(Method::Get.as_str(), "GET");
    }

    #[test]
    fn test_is_success_bounds() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(301, "").is_success());
        assert!(!HttpResponse::new(404, "").is_success());
        assert!(!HttpResponse::network_error().is_success());
    }

    #[test]
    fn test_header_lookup_case_insensitive() {
        let response = HttpResponse::new(200, "").with_header("X-Socket-ID", "s1");

        assert_eq!(response.header("x-socket-id"), Some("s1"));
        assert_eq!(response.header("X-SOCKET-ID"), Some("s1"));
        assert_eq!(response.header("x-other"), None);
    }
}
