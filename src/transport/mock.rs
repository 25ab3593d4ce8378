//! Scripted transport for tests.
//!
//! Responses are enqueued per URL and consumed in order; unscripted
//! URLs settle with an empty 200 (which the socket treats as a
//! malformed body, a silent no-op). Every executed request is recorded
//! for assertions.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};

use super::{HttpResponse, HttpTransport, WireRequest};

#[derive(Default)]
pub(crate) struct MockTransport {
    scripts: Mutex<FxHashMap<String, VecDeque<Result<HttpResponse>>>>,
    requests: Mutex<Vec<WireRequest>>,
}

impl MockTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queues a response for the next request to `url`.
    pub(crate) fn enqueue(&self, url: &str, response: HttpResponse) {
        self.scripts
            .lock()
            .entry(url.to_string())
            .or_default()
            .push_back(Ok(response));
    }

    /// Queues a network-level failure for the next request to `url`.
    pub(crate) fn enqueue_error(&self, url: &str, message: &str) {
        self.scripts
            .lock()
            .entry(url.to_string())
            .or_default()
            .push_back(Err(Error::transport(message)));
    }

    /// All executed requests, in order.
    pub(crate) fn requests(&self) -> Vec<WireRequest> {
        self.requests.lock().clone()
    }

    /// Number of executed requests to `url`.
    pub(crate) fn count_to(&self, url: &str) -> usize {
        self.requests.lock().iter().filter(|r| r.url == url).count()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn execute(&self, request: WireRequest) -> Result<HttpResponse> {
        let url = request.url.clone();
        self.requests.lock().push(request);

        let scripted = self.scripts.lock().get_mut(&url).and_then(VecDeque::pop_front);
        match scripted {
            Some(result) => result,
            None => Ok(HttpResponse::new(200, "")),
        }
    }
}
