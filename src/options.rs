//! Connector and socket configuration.
//!
//! Provides a type-safe interface for configuring the polling transport:
//! endpoint routes, polling interval, credentials mode and static auth
//! headers.
//!
//! # Example
//!
//! ```ignore
//! use pollcast::{Options, Routes};
//!
//! let options = Options::new(Routes::with_base("https://example.com/pollcast"))
//!     .with_polling_ms(2_000)
//!     .with_credentials()
//!     .with_auth_header("Authorization", "Bearer token");
//!
//! options.validate()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default polling interval (5s, matching the reference connector).
pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_millis(5_000);

// ============================================================================
// Routes
// ============================================================================

/// The five endpoint URLs the polling protocol is built on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Routes {
    /// Starts or resumes a logical connection.
    pub connect: String,

    /// Long/short poll for new events.
    pub receive: String,

    /// Registers interest in a channel server-side.
    pub subscribe: String,

    /// Drops a channel registration. Sent with keep-alive so it
    /// survives page unload.
    pub unsubscribe: String,

    /// Client-to-server message publication.
    pub publish: String,
}

impl Routes {
    /// Creates an empty route set.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            connect: String::new(),
            receive: String::new(),
            subscribe: String::new(),
            unsubscribe: String::new(),
            publish: String::new(),
        }
    }

    /// Creates a route set by appending the conventional path segments
    /// to a base URL.
    #[must_use]
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            connect: format!("{base}/connect"),
            receive: format!("{base}/receive"),
            subscribe: format!("{base}/subscribe"),
            unsubscribe: format!("{base}/unsubscribe"),
            publish: format!("{base}/publish"),
        }
    }

    /// Iterates over `(name, url)` pairs for validation.
    fn entries(&self) -> [(&'static str, &str); 5] {
        [
            ("connect", &self.connect),
            ("receive", &self.receive),
            ("subscribe", &self.subscribe),
            ("unsubscribe", &self.unsubscribe),
            ("publish", &self.publish),
        ]
    }
}

// ============================================================================
// Options
// ============================================================================

/// Socket configuration options.
///
/// Controls endpoint routes, the self-paced polling interval, whether
/// cross-origin credentials are included, static auth headers attached
/// to subscribe requests, and the event namespace used by the
/// broadcasting facade.
#[derive(Debug, Clone)]
pub struct Options {
    /// Endpoint routes.
    pub routes: Routes,

    /// Delay between a poll settling and the next poll being issued.
    pub polling: Duration,

    /// Include credentials (cookies) on requests.
    pub with_credentials: bool,

    /// Static headers attached to subscribe requests (e.g. an
    /// authorization token for private channels).
    pub auth_headers: Vec<(String, String)>,

    /// Event namespace prefix (laravel-echo convention), e.g.
    /// `App.Events`.
    pub namespace: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self::new(Routes::new())
    }
}

// ============================================================================
// Constructors & Builder Methods
// ============================================================================

impl Options {
    /// Creates options for the given routes with default settings.
    #[inline]
    #[must_use]
    pub const fn new(routes: Routes) -> Self {
        Self {
            routes,
            polling: DEFAULT_POLLING_INTERVAL,
            with_credentials: false,
            auth_headers: Vec::new(),
            namespace: None,
        }
    }

    /// Sets the polling interval.
    #[inline]
    #[must_use]
    pub const fn with_polling(mut self, interval: Duration) -> Self {
        self.polling = interval;
        self
    }

    /// Sets the polling interval in milliseconds.
    #[inline]
    #[must_use]
    pub const fn with_polling_ms(mut self, millis: u64) -> Self {
        self.polling = Duration::from_millis(millis);
        self
    }

    /// Enables credential (cookie) inclusion on requests.
    #[inline]
    #[must_use]
    pub const fn with_credentials(mut self) -> Self {
        self.with_credentials = true;
        self
    }

    /// Adds a static auth header sent with subscribe requests.
    #[inline]
    #[must_use]
    pub fn with_auth_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.auth_headers.push((name.into(), value.into()));
        self
    }

    /// Sets the event namespace used by the broadcasting facade.
    #[inline]
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl Options {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a route is empty, or
    /// [`Error::UrlParse`] if a route is not a valid URL.
    pub fn validate(&self) -> Result<()> {
        for (name, route) in self.routes.entries() {
            if route.is_empty() {
                return Err(Error::config(format!("missing {name} route")));
            }
            Url::parse(route)?;
        }

        if self.polling.is_zero() {
            return Err(Error::config("polling interval must be non-zero"));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert_eq!(options.polling, DEFAULT_POLLING_INTERVAL);
        assert!(!options.with_credentials);
        assert!(options.auth_headers.is_empty());
        assert!(options.namespace.is_none());
    }

    #[test]
    fn test_routes_with_base() {
        let routes = Routes::with_base("https://example.com/pollcast/");
        assert_eq!(routes.connect, "https://example.com/pollcast/connect");
        assert_eq!(routes.receive, "https://example.com/pollcast/receive");
        assert_eq!(routes.publish, "https://example.com/pollcast/publish");
    }

    #[test]
    fn test_builder_chain() {
        let options = Options::new(Routes::with_base("https://example.com"))
            .with_polling_ms(250)
            .with_credentials()
            .with_auth_header("Authorization", "Bearer t")
            .with_namespace("App.Events");

        assert_eq!(options.polling, Duration::from_millis(250));
        assert!(options.with_credentials);
        assert_eq!(options.auth_headers.len(), 1);
        assert_eq!(options.namespace.as_deref(), Some("App.Events"));
    }

    #[test]
    fn test_validate_ok() {
        let options = Options::new(Routes::with_base("https://example.com"));
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_validate_missing_route() {
        let mut routes = Routes::with_base("https://example.com");
        routes.receive = String::new();

        let err = Options::new(routes).validate().unwrap_err();
        assert!(err.to_string().contains("receive"));
    }

    #[test]
    fn test_validate_bad_url() {
        let mut routes = Routes::with_base("https://example.com");
        routes.connect = "not a url".to_string();

        assert!(Options::new(routes).validate().is_err());
    }

    #[test]
    fn test_validate_zero_interval() {
        let options =
            Options::new(Routes::with_base("https://example.com")).with_polling(Duration::ZERO);
        assert!(options.validate().is_err());
    }
}
