//! Single outbound HTTP call with callback hooks.
//!
//! A [`Request`] is built synchronously, then `send` spawns the actual
//! network call as a tokio task and returns a [`RequestHandle`] for
//! cancellation. Outcomes are delivered through registered hooks:
//!
//! - `success` — any 2xx response,
//! - `fail` — any non-2xx response, including the synthesized status-0
//!   response for a network-level failure,
//! - `always` — exactly once per send, after success/fail.
//!
//! An explicit [`RequestHandle::abort`] suppresses every hook
//! (including `always`) if the call has not already settled.
//!
//! Failures are additionally reported to the request's error sink
//! after the `fail` hooks run, unless a hook handled the failure and
//! muted the notification (see [`ErrorNotify`]).

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::transport::{HttpResponse, HttpTransport, Method, WireRequest};
use crate::util::{FormMap, url_encode_object};

// ============================================================================
// Types
// ============================================================================

/// A registered outcome hook.
type Hook = Box<dyn Fn(&HttpResponse) + Send + Sync>;

/// Destination for unhandled request failures.
///
/// Injected at construction so the core has no ambient side channel;
/// hosts typically forward these to their own telemetry.
pub type ErrorSink = Arc<dyn Fn(&HttpResponse) + Send + Sync>;

/// Returns the default sink, which logs a warning.
#[must_use]
pub fn default_error_sink() -> ErrorSink {
    Arc::new(|response| {
        warn!(status = response.status, "Request failed");
    })
}

// ============================================================================
// HeaderValue
// ============================================================================

/// A request header value, literal or computed at send time.
///
/// Lazy values exist so headers like the socket-id — which may change
/// between request construction and send — are always fresh. A lazy
/// value returning `None` omits the header entirely.
#[derive(Clone)]
pub enum HeaderValue {
    /// Fixed value.
    Literal(String),

    /// Evaluated when the request is sent.
    Lazy(Arc<dyn Fn() -> Option<String> + Send + Sync>),
}

impl HeaderValue {
    fn resolve(&self) -> Option<String> {
        match self {
            Self::Literal(value) => Some(value.clone()),
            Self::Lazy(f) => f(),
        }
    }
}

impl std::fmt::Debug for HeaderValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

// ============================================================================
// ErrorNotify
// ============================================================================

/// Shared mute flag for a request's sink notification.
///
/// A `fail` hook that fully handles a failure (e.g. token-expiry
/// recovery) calls [`mute`](Self::mute) so the failure is not also
/// reported as unhandled.
#[derive(Clone)]
pub struct ErrorNotify(Arc<AtomicBool>);

impl ErrorNotify {
    fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    /// Suppresses the sink notification for this request.
    #[inline]
    pub fn mute(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    #[inline]
    fn enabled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Request
// ============================================================================

/// Builder-style wrapper around one outbound HTTP call.
pub struct Request {
    method: Method,
    url: String,
    headers: Vec<(String, HeaderValue)>,
    body: Option<FormMap>,
    with_credentials: bool,
    keep_alive: bool,
    success_hooks: Vec<Hook>,
    fail_hooks: Vec<Hook>,
    always_hooks: Vec<Hook>,
    notify: ErrorNotify,
    sink: ErrorSink,
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url)
            .finish()
    }
}

impl Request {
    /// Creates a request with the standard polling-protocol headers
    /// pre-set and the default (logging) error sink.
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        let mut request = Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            with_credentials: false,
            keep_alive: false,
            success_hooks: Vec::new(),
            fail_hooks: Vec::new(),
            always_hooks: Vec::new(),
            notify: ErrorNotify::new(),
            sink: default_error_sink(),
        };

        request.set_request_header("X-Requested-With", "XMLHttpRequest");
        request.set_request_header("Content-Type", "application/x-www-form-urlencoded");

        request
    }

    /// Replaces the failure sink.
    pub fn set_error_sink(&mut self, sink: ErrorSink) -> &mut Self {
        self.sink = sink;
        self
    }

    /// Sets a literal request header.
    pub fn set_request_header(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.headers
            .push((name.to_string(), HeaderValue::Literal(value.into())));
        self
    }

    /// Sets a header whose value is computed at send time; `None`
    /// omits the header.
    pub fn set_lazy_header(
        &mut self,
        name: &str,
        value: impl Fn() -> Option<String> + Send + Sync + 'static,
    ) -> &mut Self {
        self.headers
            .push((name.to_string(), HeaderValue::Lazy(Arc::new(value))));
        self
    }

    /// Sets the request body, URL-form encoded at send time.
    pub fn data(&mut self, body: FormMap) -> &mut Self {
        self.body = Some(body);
        self
    }

    /// Includes credentials (cookies) on this request.
    pub fn set_with_credentials(&mut self, with_credentials: bool) -> &mut Self {
        self.with_credentials = with_credentials;
        self
    }

    /// Marks the request as surviving host teardown (best effort).
    pub fn set_keep_alive(&mut self, keep_alive: bool) -> &mut Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Registers a hook run on any 2xx response.
    pub fn success(&mut self, hook: impl Fn(&HttpResponse) + Send + Sync + 'static) -> &mut Self {
        self.success_hooks.push(Box::new(hook));
        self
    }

    /// Registers a hook run on any non-2xx response.
    pub fn fail(&mut self, hook: impl Fn(&HttpResponse) + Send + Sync + 'static) -> &mut Self {
        self.fail_hooks.push(Box::new(hook));
        self
    }

    /// Registers a hook run exactly once per send, after success/fail.
    pub fn always(&mut self, hook: impl Fn(&HttpResponse) + Send + Sync + 'static) -> &mut Self {
        self.always_hooks.push(Box::new(hook));
        self
    }

    /// Returns the mute handle for this request's sink notification.
    #[must_use]
    pub fn notifier(&self) -> ErrorNotify {
        self.notify.clone()
    }

    /// Issues the network call as a spawned task.
    ///
    /// Must be called within a tokio runtime context.
    pub fn send(self, transport: &Arc<dyn HttpTransport>) -> RequestHandle {
        let aborted = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&aborted);
        let transport = Arc::clone(transport);

        let join = tokio::spawn(async move {
            let wire = self.resolve();
            let outcome = transport.execute(wire).await;

            // An abort that lost the race against completion still
            // suppresses all hooks.
            if flag.load(Ordering::SeqCst) {
                return;
            }

            match outcome {
                Ok(response) => self.settle(&response),
                Err(error) => {
                    debug!(url = %self.url, error = %error, "Network-level request failure");
                    self.settle(&HttpResponse::network_error());
                }
            }
        });

        RequestHandle { join, aborted }
    }

    /// Resolves lazy headers and encodes the body.
    fn resolve(&self) -> WireRequest {
        let headers = self
            .headers
            .iter()
            .filter_map(|(name, value)| value.resolve().map(|v| (name.clone(), v)))
            .collect();

        let body = self
            .body
            .as_ref()
            .map(url_encode_object)
            .unwrap_or_default();

        WireRequest {
            method: self.method,
            url: self.url.clone(),
            headers,
            body,
            with_credentials: self.with_credentials,
            keep_alive: self.keep_alive,
        }
    }

    /// Runs the outcome hooks for a settled response.
    fn settle(&self, response: &HttpResponse) {
        if response.is_success() {
            for hook in &self.success_hooks {
                hook(response);
            }
        } else {
            for hook in &self.fail_hooks {
                hook(response);
            }

            if self.notify.enabled() {
                (self.sink)(response);
            }
        }

        for hook in &self.always_hooks {
            hook(response);
        }
    }
}

// ============================================================================
// RequestHandle
// ============================================================================

/// Handle to an in-flight request.
///
/// Dropping the handle detaches the request (it settles normally);
/// only [`abort`](Self::abort) cancels it.
#[derive(Debug)]
pub struct RequestHandle {
    join: JoinHandle<()>,
    aborted: Arc<AtomicBool>,
}

impl RequestHandle {
    /// Cancels the call, preventing every hook (including `always`)
    /// from running if the request has not already settled.
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
        self.join.abort();
    }
}

// ============================================================================
// Tests
// ============================================================================
