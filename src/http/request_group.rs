//! Fan-out/fan-in join over a batch of requests.
//!
//! A [`RequestGroup`] sends every member concurrently and reports one
//! combined outcome: all-success with the responses in member order,
//! or the first failure in member order. An aborted member silently
//! cancels the whole join (neither callback runs), matching the
//! per-request rule that an abort suppresses all hooks.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use futures_util::future::join_all;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

use crate::transport::{HttpResponse, HttpTransport};

use super::Request;

// ============================================================================
// RequestGroup
// ============================================================================

/// A batch of requests settled as one unit.
#[derive(Debug, Default)]
pub struct RequestGroup {
    requests: Vec<Request>,
}

impl RequestGroup {
    /// Creates a group over the given requests.
    #[must_use]
    pub fn new(requests: Vec<Request>) -> Self {
        Self { requests }
    }

    /// Returns `true` if the group has no members.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Number of member requests.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Sends every member and joins their outcomes.
    ///
    /// `on_all` receives the responses in member order once every
    /// member succeeded; `on_err` receives the first failing response
    /// in member order. Each member's own hooks still run normally.
    ///
    /// An empty group settles immediately through `on_all`.
    pub fn then(
        self,
        transport: &Arc<dyn HttpTransport>,
        on_all: impl FnOnce(Vec<HttpResponse>) + Send + 'static,
        on_err: impl FnOnce(HttpResponse) + Send + 'static,
    ) {
        if self.requests.is_empty() {
            on_all(Vec::new());
            return;
        }

        let mut receivers = Vec::with_capacity(self.requests.len());

        for mut request in self.requests {
            let (tx, rx) = oneshot::channel::<std::result::Result<HttpResponse, HttpResponse>>();
            let slot = Arc::new(Mutex::new(Some(tx)));

            let on_success = Arc::clone(&slot);
            request.success(move |response| {
                if let Some(tx) = on_success.lock().take() {
                    let _ = tx.send(Ok(response.clone()));
                }
            });

            let on_fail = Arc::clone(&slot);
            request.fail(move |response| {
                if let Some(tx) = on_fail.lock().take() {
                    let _ = tx.send(Err(response.clone()));
                }
            });

            // The handle is dropped; members run detached and report
            // back through their channel. An aborted member drops its
            // sender, which surfaces as a RecvError below.
            request.send(transport);
            receivers.push(rx);
        }

        tokio::spawn(async move {
            let outcomes = join_all(receivers).await;

            let mut responses = Vec::with_capacity(outcomes.len());
            let mut failure = None;

            for outcome in outcomes {
                match outcome {
                    Ok(Ok(response)) => responses.push(response),
                    Ok(Err(response)) => {
                        if failure.is_none() {
                            failure = Some(response);
                        }
                    }
                    Err(_) => {
                        debug!("Request group member aborted, dropping join");
                        return;
                    }
                }
            }

            match failure {
                Some(response) => on_err(response),
                None => on_all(responses),
            }
        });
    }
}

impl From<Vec<Request>> for RequestGroup {
    fn from(requests: Vec<Request>) -> Self {
        Self::new(requests)
    }
}

// ============================================================================
// Tests
// ============================================================================
