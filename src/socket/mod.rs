//! Connection state machine.
//!
//! The socket owns everything stateful about a logical polling
//! connection: the server-issued id, the polling cursor, the channel
//! and listener registry, the queue of requests issued before the
//! connect handshake settled, and the self-paced poll loop.
//!
//! States, informally: disconnected (empty id) to connecting (connect
//! request in flight) to connected-idle (id set, nothing to poll for)
//! to polling (recurring receive calls), and back to disconnected via
//! [`Socket::disconnect`]. Token-expiry recovery transiently re-enters
//! connecting from within a failure hook.
//!
//! A `Socket` is a cheap clone over shared state; clones are handed
//! into callbacks so the loop can reschedule itself.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `registry` | Channel and listener bookkeeping |

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::http::{ErrorSink, Request, RequestGroup, RequestHandle, default_error_sink};
use crate::options::Options;
use crate::protocol::{
    ConnectResponse, ErrorResponse, EventItem, PollResponse, SOCKET_ID_HEADER,
};
use crate::storage::{JsonStore, StorageBackend};
use crate::transport::{HttpResponse, HttpTransport, Method};
use crate::util::{FormMap, FormValue};
use crate::window::{TabArbiter, WindowVisibility};

// ============================================================================
// Submodules
// ============================================================================

/// Channel and listener bookkeeping.
pub mod registry;

pub use registry::{ChannelRegistry, Listener};

// ============================================================================
// Constants
// ============================================================================

/// Storage key the socket persists its state under.
pub const SOCKET_STORAGE_KEY: &str = "pollcast";

/// Subkey holding the server-issued socket identifier.
const SOCKET_ID_KEY: &str = "socket_id";

// ============================================================================
// Attempt
// ============================================================================

/// Call context for operations that participate in token-expiry
/// recovery.
///
/// A retried attempt carries no recovery hook, which bounds recovery
/// to one reconnect per original failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    /// This call is a post-reconnect retry.
    pub is_retry: bool,
}

impl Attempt {
    /// An original, recoverable attempt.
    #[inline]
    #[must_use]
    pub const fn first() -> Self {
        Self { is_retry: false }
    }

    /// A post-reconnect retry.
    #[inline]
    #[must_use]
    pub const fn retry() -> Self {
        Self { is_retry: true }
    }
}

// ============================================================================
// Socket
// ============================================================================

/// Mutable connection state, guarded by one lock.
#[derive(Default)]
struct State {
    /// Server-assigned connection id; empty means disconnected.
    id: String,

    /// Opaque polling cursor; empty means never connected.
    last_request_time: String,

    /// Channel and listener registry.
    registry: ChannelRegistry,

    /// Requests issued before the handshake settled.
    queue: Vec<Request>,

    /// Pending poll reschedule.
    timer: Option<JoinHandle<()>>,

    /// In-flight connect/poll request.
    active: Option<RequestHandle>,

    /// Bumped on every disconnect. A poll tick captures the value it
    /// started under; a tick from a torn-down connection fails the
    /// comparison and cannot reschedule itself alongside the loop a
    /// reconnect started.
    generation: u64,
}

struct Inner {
    options: Options,
    transport: Arc<dyn HttpTransport>,
    store: JsonStore,
    arbiter: Arc<dyn TabArbiter>,
    sink: ErrorSink,
    state: Mutex<State>,
}

/// Handle to one logical polling connection.
#[derive(Clone)]
pub struct Socket {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Socket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Socket")
            .field("id", &state.id)
            .field("last_request_time", &state.last_request_time)
            .field("queued", &state.queue.len())
            .finish()
    }
}

// ============================================================================
// Construction
// ============================================================================

impl Socket {
    /// Creates a socket with storage-backed tab arbitration and the
    /// default (logging) error sink.
    #[must_use]
    pub fn new(
        options: Options,
        transport: Arc<dyn HttpTransport>,
        backend: Arc<dyn StorageBackend>,
    ) -> Self {
        let arbiter = Arc::new(WindowVisibility::new(Arc::clone(&backend)));
        Self::with_parts(options, transport, backend, arbiter, default_error_sink())
    }

    /// Creates a socket with every collaborator supplied explicitly.
    #[must_use]
    pub fn with_parts(
        options: Options,
        transport: Arc<dyn HttpTransport>,
        backend: Arc<dyn StorageBackend>,
        arbiter: Arc<dyn TabArbiter>,
        sink: ErrorSink,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                options,
                transport,
                store: JsonStore::new(backend, SOCKET_STORAGE_KEY),
                arbiter,
                sink,
                state: Mutex::new(State::default()),
            }),
        }
    }

    /// The server-assigned connection id; empty while disconnected.
    #[must_use]
    pub fn id(&self) -> String {
        self.inner.state.lock().id.clone()
    }

    /// Returns `true` once a connect handshake has been accepted.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        !self.inner.state.lock().id.is_empty()
    }
}

// ============================================================================
// Connection lifecycle
// ============================================================================

impl Socket {
    /// Starts the connect handshake.
    ///
    /// On acceptance the queued requests are flushed and, once they
    /// all land, polling starts. A rejected or malformed handshake is
    /// a quiet no-op.
    pub fn connect(&self) {
        self.connect_with_cursor(String::new());
    }

    /// Connect with an explicit cursor carried over from a previous
    /// session, used by recovery so no events are skipped across the
    /// reconnect gap.
    pub(crate) fn connect_with_cursor(&self, cursor: String) {
        let socket = self.clone();
        let mut request = self.request(Method::Post, &self.inner.options.routes.connect);

        request.success(move |response| {
            let Ok(body) = serde_json::from_str::<ConnectResponse>(&response.body) else {
                return;
            };
            if !body.is_success() {
                debug!("Connect rejected, startup aborted");
                return;
            }

            let id = body
                .id_str()
                .or_else(|| response.header(SOCKET_ID_HEADER).map(str::to_string));

            let group = {
                let mut state = socket.inner.state.lock();
                state.last_request_time = if cursor.is_empty() {
                    body.time.clone()
                } else {
                    cursor.clone()
                };
                if let Some(id) = &id {
                    state.id = id.clone();
                }

                RequestGroup::new(std::mem::take(&mut state.queue))
            };

            if let Some(id) = id {
                socket.inner.store.set(SOCKET_ID_KEY, id);
            }

            info!(queued = group.len(), "Connected, flushing queued requests");
            let poller = socket.clone();
            group.then(&socket.inner.transport, move |_| poller.poll(), |_| {});
        });

        let handle = request.send(&self.inner.transport);
        self.inner.state.lock().active = Some(handle);
    }

    /// Tears the connection down: aborts in-flight work, cancels the
    /// poll timer, and resets transient state. Idempotent; the channel
    /// registry is left intact so a reconnect can resubscribe.
    pub fn disconnect(&self) {
        let mut state = self.inner.state.lock();

        if let Some(active) = state.active.take() {
            active.abort();
        }
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }

        state.id.clear();
        state.last_request_time.clear();
        state.queue.clear();
        state.generation = state.generation.wrapping_add(1);
    }
}

// ============================================================================
// Channel operations
// ============================================================================

impl Socket {
    /// Registers a channel and sends (or queues) the subscribe call.
    ///
    /// The in-memory entry is created only if absent; the network call
    /// is issued every time, not deduplicated.
    pub fn subscribe(&self, channel: &str) {
        self.subscribe_with(channel, Attempt::first());
    }

    pub(crate) fn subscribe_with(&self, channel: &str, attempt: Attempt) {
        self.inner.state.lock().registry.ensure_channel(channel);

        let mut request = self.request(Method::Post, &self.inner.options.routes.subscribe);
        for (name, value) in &self.inner.options.auth_headers {
            request.set_request_header(name, value.clone());
        }

        let mut body = FormMap::new();
        body.insert("channel_name".to_string(), FormValue::text(channel));
        request.data(body);

        if !attempt.is_retry {
            let socket = self.clone();
            let notify = request.notifier();
            request.fail(move |response| {
                if socket.handle_token_expired(response, None) {
                    notify.mute();
                }
            });
        }

        self.send_or_queue(request);
    }

    /// Sends a keep-alive unsubscribe call; on success the channel
    /// entry and all of its listeners are dropped.
    ///
    /// Never queued and never recovered: an unsubscribing host is
    /// usually tearing down.
    pub fn unsubscribe(&self, channel: &str) {
        let mut request = self.request(Method::Post, &self.inner.options.routes.unsubscribe);
        request.set_keep_alive(true);

        let mut body = FormMap::new();
        body.insert("channel_name".to_string(), FormValue::text(channel));
        request.data(body);

        let socket = self.clone();
        let channel = channel.to_string();
        request.success(move |_| {
            socket.inner.state.lock().registry.remove_channel(&channel);
        });

        request.send(&self.inner.transport);
    }

    /// Attaches a listener to an event on a subscribed channel.
    ///
    /// A channel that was never subscribed is a no-op; only
    /// [`subscribe`](Self::subscribe) creates channel entries.
    pub fn on(&self, channel: &str, event: &str, listener: Listener) {
        let mut state = self.inner.state.lock();
        if !state.registry.has_channel(channel) {
            return;
        }
        state.registry.add_listener(channel, event, listener);
    }

    /// Detaches one listener (by identity) or, with `None`, every
    /// listener for the event.
    pub fn off(&self, channel: &str, event: &str, listener: Option<&Listener>) {
        self.inner
            .state
            .lock()
            .registry
            .remove_listener(channel, event, listener);
    }

    /// Publishes a client-originated event on a channel.
    pub fn emit(&self, channel: &str, event: &str, data: Value) {
        self.emit_with(channel, event, data, Attempt::first());
    }

    pub(crate) fn emit_with(&self, channel: &str, event: &str, data: Value, attempt: Attempt) {
        let mut request = self.request(Method::Post, &self.inner.options.routes.publish);

        let mut body = FormMap::new();
        body.insert("channel_name".to_string(), FormValue::text(channel));
        body.insert("event".to_string(), FormValue::text(event));
        body.insert("data".to_string(), FormValue::from_json(&data));
        request.data(body);

        if !attempt.is_retry {
            let socket = self.clone();
            let notify = request.notifier();
            let channel = channel.to_string();
            let event = event.to_string();
            request.fail(move |response| {
                let replay_socket = socket.clone();
                let replay = (channel.clone(), event.clone(), data.clone());
                let after: Box<dyn FnOnce() + Send> = Box::new(move || {
                    replay_socket.emit_with(&replay.0, &replay.1, replay.2, Attempt::retry());
                });
                if socket.handle_token_expired(response, Some(after)) {
                    notify.mute();
                }
            });
        }

        self.send_or_queue(request);
    }

    /// Sends immediately once connected; queues while the handshake is
    /// outstanding so the flush barrier can order it before the first
    /// poll.
    fn send_or_queue(&self, request: Request) {
        let mut state = self.inner.state.lock();
        if state.last_request_time.is_empty() {
            state.queue.push(request);
        } else {
            drop(state);
            request.send(&self.inner.transport);
        }
    }
}

// ============================================================================
// Poll loop
// ============================================================================

impl Socket {
    /// One tick of the self-paced poll loop.
    ///
    /// Skips the network call (but keeps the loop warm) while this
    /// instance is not the active window or no channel has a listener.
    /// The next tick is scheduled only after this one fully settles.
    pub(crate) fn poll(&self) {
        let (id, time, subscriptions, generation) = {
            let state = self.inner.state.lock();
            (
                state.id.clone(),
                state.last_request_time.clone(),
                state.registry.subscriptions(),
                state.generation,
            )
        };
        if id.is_empty() {
            return;
        }

        let has_listeners = subscriptions.iter().any(|(_, events)| !events.is_empty());
        if !self.inner.arbiter.is_active() || !has_listeners {
            self.schedule_poll(generation);
            return;
        }

        let mut channels = FormMap::new();
        for (name, events) in subscriptions {
            channels.insert(
                name,
                FormValue::List(events.into_iter().map(FormValue::Text).collect()),
            );
        }

        let mut body = FormMap::new();
        body.insert("time".to_string(), FormValue::Text(time));
        body.insert("channels".to_string(), FormValue::Map(channels));

        let mut request = self.request(Method::Post, &self.inner.options.routes.receive);
        request.data(body);

        let socket = self.clone();
        request.success(move |response| {
            let Ok(body) = serde_json::from_str::<PollResponse>(&response.body) else {
                return;
            };
            if !body.is_success() {
                return;
            }

            socket.inner.state.lock().last_request_time = body.time.clone();
            socket.dispatch(&body.events);
        });

        let socket = self.clone();
        let notify = request.notifier();
        request.fail(move |response| {
            if socket.handle_token_expired(response, None) {
                notify.mute();
                return;
            }

            // A 404 means the server evicted our registration; blindly
            // re-register every known channel, fire and forget.
            if response.status == 404 {
                let channels = socket.inner.state.lock().registry.channel_names();
                warn!(channels = channels.len(), "Subscriptions evicted, resubscribing");
                for channel in &channels {
                    socket.subscribe_with(channel, Attempt::first());
                }
            }
        });

        let socket = self.clone();
        request.always(move |_| socket.schedule_poll(generation));

        let handle = request.send(&self.inner.transport);
        self.inner.state.lock().active = Some(handle);
    }

    /// Schedules the next poll tick on behalf of a tick that started
    /// under `generation`.
    ///
    /// No-op when disconnected, and also when the generation no longer
    /// matches: a recovery inside this tick's failure hook may already
    /// have reconnected and started a fresh loop, and a stale tick
    /// rescheduling on top of it would leave two self-paced loops
    /// running.
    fn schedule_poll(&self, generation: u64) {
        let mut state = self.inner.state.lock();
        if state.id.is_empty() || state.generation != generation {
            return;
        }

        let socket = self.clone();
        let interval = self.inner.options.polling;
        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            socket.poll();
        }));
    }

    /// Delivers inbound events to listeners by exact channel and event
    /// name match; unknown combinations are skipped.
    fn dispatch(&self, events: &[EventItem]) {
        for item in events {
            let listeners = {
                let state = self.inner.state.lock();
                state.registry.listeners(&item.channel.name, &item.event)
            };
            if listeners.is_empty() {
                continue;
            }

            debug!(channel = %item.channel.name, event = %item.event, "Dispatching event");
            for listener in &listeners {
                listener(&item.payload);
            }
        }
    }
}

// ============================================================================
// Recovery
// ============================================================================

impl Socket {
    /// Recovers from an expired session token.
    ///
    /// Returns `false` (no action) unless the response is a 401 whose
    /// body carries the token-expired code. Otherwise snapshots the
    /// channel list and cursor, tears the connection down, queues a
    /// retried subscribe per channel (plus any replay action), and
    /// reconnects with the preserved cursor. The queued retries are
    /// flushed by the new connect ahead of the first poll.
    ///
    /// A `true` return tells the caller to suppress its own handling
    /// of the failure.
    pub(crate) fn handle_token_expired(
        &self,
        response: &HttpResponse,
        after_reconnect: Option<Box<dyn FnOnce() + Send>>,
    ) -> bool {
        if response.status != 401 {
            return false;
        }
        let Ok(body) = serde_json::from_str::<ErrorResponse>(&response.body) else {
            return false;
        };
        if !body.is_token_expired() {
            return false;
        }

        let (channels, cursor) = {
            let state = self.inner.state.lock();
            (
                state.registry.channel_names(),
                state.last_request_time.clone(),
            )
        };

        info!(channels = channels.len(), "Session token expired, reconnecting");
        self.disconnect();

        // Queued ahead of the connect so the flush barrier sends them
        // before the first poll. Retried attempts carry no recovery
        // hook, so a second expiry cannot cascade.
        for channel in &channels {
            self.subscribe_with(channel, Attempt::retry());
        }
        if let Some(after) = after_reconnect {
            after();
        }

        self.connect_with_cursor(cursor);

        true
    }
}

// ============================================================================
// Request construction
// ============================================================================

impl Socket {
    /// Builds a request with the shared cross-cutting wiring: the
    /// socket-id header read live from storage at send time, the
    /// response socket-id persisted back, credentials mode, and the
    /// injected error sink.
    fn request(&self, method: Method, url: &str) -> Request {
        let mut request = Request::new(method, url);
        request.set_error_sink(Arc::clone(&self.inner.sink));
        request.set_with_credentials(self.inner.options.with_credentials);

        let store = self.inner.store.clone();
        request.set_lazy_header(SOCKET_ID_HEADER, move || store.get_str(SOCKET_ID_KEY));

        let store = self.inner.store.clone();
        request.success(move |response| {
            if let Some(id) = response.header(SOCKET_ID_HEADER) {
                store.set(SOCKET_ID_KEY, id);
            }
        });

        request
    }
}

// ============================================================================
// Tests
// ============================================================================
