//! [`reqwest`]-backed implementation of [`HttpTransport`].

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use tracing::trace;

use crate::error::Result;

use super::{HttpResponse, HttpTransport, Method, WireRequest};

// ============================================================================
// ReqwestTransport
// ============================================================================

/// Default HTTP transport.
///
/// Credentialed requests rely on the client's cookie store; the
/// `keep_alive` hint has no equivalent here and is ignored — a native
/// process does not tear requests down the way a navigating browser
/// tab does.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with a cookie-enabled client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`](crate::Error::Http) if the client
    /// cannot be built.
    pub fn new() -> Result<Self> {
        Ok(Self {
            inner: reqwest::Client::builder().cookie_store(true).build()?,
        })
    }

    /// Creates a transport with a request timeout.
    ///
    /// Useful when the backend long-polls: the timeout should exceed
    /// the server's hold time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`](crate::Error::Http) if the client
    /// cannot be built.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Ok(Self {
            inner: reqwest::Client::builder()
                .cookie_store(true)
                .timeout(timeout)
                .build()?,
        })
    }

    /// Wraps an existing client.
    ///
    /// `with_credentials` requests need the client built with a cookie
    /// store.
    #[inline]
    #[must_use]
    pub const fn from_client(inner: reqwest::Client) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: WireRequest) -> Result<HttpResponse> {
        let mut builder = match request.method {
            Method::Get => self.inner.get(&request.url),
            Method::Post => self.inner.post(&request.url),
        };

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        trace!(url = %request.url, method = request.method.as_str(), "Executing request");

        let response = builder.body(request.body).send().await?;

        let status = response.status().as_u16();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_lowercase(), v.to_string()))
            })
            .collect();

        let body = response.text().await?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
