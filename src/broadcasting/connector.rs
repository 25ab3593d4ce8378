//! Entry point tying the socket to the channel API.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::http::ErrorSink;
use crate::options::Options;
use crate::socket::Socket;
use crate::storage::{MemoryBackend, StorageBackend};
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::util::EventFormatter;
use crate::window::TabArbiter;

use super::{Channel, PresenceChannel, PrivateChannel};

// ============================================================================
// Connector
// ============================================================================

/// Owns the socket and hands out channel handles.
///
/// Construction validates the options and starts the connect handshake
/// immediately; channel handles are memoized per full name so repeated
/// lookups share one subscription.
///
/// Must be created within a tokio runtime context.
pub struct Connector {
    socket: Socket,
    formatter: EventFormatter,
    channels: Mutex<FxHashMap<String, Channel>>,
}

impl std::fmt::Debug for Connector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connector")
            .field("socket", &self.socket)
            .finish()
    }
}

impl Connector {
    /// Creates a connector with the default transport and in-process
    /// storage, and starts connecting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) or
    /// [`Error::UrlParse`](crate::Error::UrlParse) if the options are
    /// invalid, or [`Error::Http`](crate::Error::Http) if the default
    /// client cannot be built.
    pub fn new(options: Options) -> Result<Self> {
        Self::with_parts(
            options,
            Arc::new(ReqwestTransport::new()?),
            Arc::new(MemoryBackend::new()),
        )
    }

    /// Creates a connector over an explicit transport and storage
    /// backend, and starts connecting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) or
    /// [`Error::UrlParse`](crate::Error::UrlParse) if the options are
    /// invalid.
    pub fn with_parts(
        options: Options,
        transport: Arc<dyn HttpTransport>,
        backend: Arc<dyn StorageBackend>,
    ) -> Result<Self> {
        options.validate()?;

        let formatter = EventFormatter::new(options.namespace.clone());
        let socket = Socket::new(options, transport, backend);

        Ok(Self::start(socket, formatter))
    }

    /// Creates a connector with every socket collaborator supplied
    /// explicitly (tab arbiter and error sink included), and starts
    /// connecting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) or
    /// [`Error::UrlParse`](crate::Error::UrlParse) if the options are
    /// invalid.
    pub fn with_collaborators(
        options: Options,
        transport: Arc<dyn HttpTransport>,
        backend: Arc<dyn StorageBackend>,
        arbiter: Arc<dyn TabArbiter>,
        sink: ErrorSink,
    ) -> Result<Self> {
        options.validate()?;

        let formatter = EventFormatter::new(options.namespace.clone());
        let socket = Socket::with_parts(options, transport, backend, arbiter, sink);

        Ok(Self::start(socket, formatter))
    }

    fn start(socket: Socket, formatter: EventFormatter) -> Self {
        socket.connect();

        Self {
            socket,
            formatter,
            channels: Mutex::new(FxHashMap::default()),
        }
    }

    /// Returns the (memoized) handle for a public channel.
    pub fn channel(&self, name: &str) -> Channel {
        self.channels
            .lock()
            .entry(name.to_string())
            .or_insert_with(|| {
                Channel::new(self.socket.clone(), name.to_string(), self.formatter.clone())
            })
            .clone()
    }

    /// Returns the handle for a private channel (`private-{name}`).
    pub fn private_channel(&self, name: &str) -> PrivateChannel {
        PrivateChannel::new(self.channel(&format!("private-{name}")))
    }

    /// Returns the handle for a presence channel (`presence-{name}`).
    pub fn presence_channel(&self, name: &str) -> PresenceChannel {
        PresenceChannel::new(PrivateChannel::new(
            self.channel(&format!("presence-{name}")),
        ))
    }

    /// Leaves a channel and its private/presence variants.
    pub fn leave(&self, name: &str) {
        for full in [
            name.to_string(),
            format!("private-{name}"),
            format!("presence-{name}"),
        ] {
            self.leave_channel(&full);
        }
    }

    /// Leaves a single channel by its full name.
    pub fn leave_channel(&self, name: &str) {
        if self.channels.lock().remove(name).is_some() {
            self.socket.unsubscribe(name);
        }
    }

    /// The current socket id; empty while disconnected.
    #[must_use]
    pub fn socket_id(&self) -> String {
        self.socket.id()
    }

    /// The underlying socket.
    #[inline]
    #[must_use]
    pub fn socket(&self) -> &Socket {
        &self.socket
    }

    /// Tears the connection down. Channel handles stay memoized and
    /// keep working after a later [`Socket::connect`].
    pub fn disconnect(&self) {
        self.socket.disconnect();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use serde_json::{Value, json};

    use crate::options::Routes;
    use crate::transport::HttpResponse;
    use crate::transport::mock::MockTransport;

    const BASE: &str = "https://example.com/pollcast";

    fn url(path: &str) -> String {
        format!("{BASE}/{path}")
    }

    fn connector(mock: &Arc<MockTransport>, options: Options) -> Connector {
        let transport: Arc<dyn HttpTransport> = mock.clone();
        Connector::with_parts(options, transport, Arc::new(MemoryBackend::new()))
            .expect("valid options")
    }

    fn options() -> Options {
        Options::new(Routes::with_base(BASE)).with_polling_ms(50)
    }

    fn connect_ok() -> HttpResponse {
        HttpResponse::new(200, r#"{"status":"success","time":"t1","id":"s1"}"#)
    }

    fn poll_with_event(channel: &str, event: &str, payload: &str) -> HttpResponse {
        HttpResponse::new(
            200,
            format!(
                r#"{{"status":"success","time":"t2","events":[{{"channel":{{"name":"{channel}"}},"event":"{event}","payload":{payload}}}]}}"#,
            ),
        )
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_options_are_rejected() {
        let mock = MockTransport::new();
        let transport: Arc<dyn HttpTransport> = mock.clone();

        let result = Connector::with_parts(
            Options::default(),
            transport,
            Arc::new(MemoryBackend::new()),
        );

        assert!(result.is_err());
        assert!(mock.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_channel_handles_are_memoized() {
        let mock = MockTransport::new();
        mock.enqueue(&url("connect"), connect_ok());
        let connector = connector(&mock, options());

        connector.channel("room");
        connector.channel("room");
        settle().await;

        assert_eq!(mock.count_to(&url("subscribe")), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_listen_applies_namespace_formatting() {
        let mock = MockTransport::new();
        mock.enqueue(&url("connect"), connect_ok());
        mock.enqueue(
            &url("receive"),
            poll_with_event("room", "App\\\\Events\\\\OrderShipped", r#"{"order": 7}"#),
        );
        let connector = connector(&mock, options().with_namespace("App.Events"));

        let calls = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&calls);
        connector
            .channel("room")
            .listen("OrderShipped", move |payload: &Value| {
                seen.lock().push(payload.clone());
            });
        settle().await;

        assert_eq!(*calls.lock(), vec![json!({"order": 7})]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_listening_detaches_by_handle() {
        let mock = MockTransport::new();
        mock.enqueue(&url("connect"), connect_ok());
        mock.enqueue(
            &url("receive"),
            poll_with_event("room", "msg", r#"{"n": 1}"#),
        );
        let connector = connector(&mock, options());

        let calls = Arc::new(Mutex::new(Vec::<Value>::new()));
        let seen = Arc::clone(&calls);
        let channel = connector.channel("room");
        let listener = channel.listen("msg", move |payload: &Value| {
            seen.lock().push(payload.clone());
        });
        let kept = channel.listen("msg", |_| {});
        channel.stop_listening("msg", Some(&listener));
        drop(kept);
        settle().await;

        assert!(calls.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_whisper_publishes_client_event() {
        let mock = MockTransport::new();
        mock.enqueue(&url("connect"), connect_ok());
        let connector = connector(&mock, options());

        connector
            .private_channel("room")
            .whisper("typing", json!({"name": "jo"}));
        settle().await;

        let publish = mock
            .requests()
            .into_iter()
            .find(|r| r.url == url("publish"))
            .expect("whisper published");
        assert_eq!(
            publish.body,
            "channel_name=private-room&data%5Bname%5D=jo&event=client-typing"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_presence_joining_unwraps_member_info() {
        let mock = MockTransport::new();
        mock.enqueue(&url("connect"), connect_ok());
        mock.enqueue(
            &url("receive"),
            poll_with_event(
                "presence-room",
                "pollcast:member_added",
                r#"{"user_info": {"name": "jo"}}"#,
            ),
        );
        let connector = connector(&mock, options());

        let calls = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&calls);
        connector.presence_channel("room").joining(move |member| {
            seen.lock().push(member);
        });
        settle().await;

        assert_eq!(*calls.lock(), vec![json!({"name": "jo"})]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_presence_here_receives_roster() {
        let mock = MockTransport::new();
        mock.enqueue(&url("connect"), connect_ok());
        mock.enqueue(
            &url("receive"),
            poll_with_event(
                "presence-room",
                "pollcast:subscription_succeeded",
                r#"[{"user_info": {"name": "jo"}}, {"user_info": {"name": "sam"}}]"#,
            ),
        );
        let connector = connector(&mock, options());

        let rosters = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&rosters);
        connector.presence_channel("room").here(move |members| {
            seen.lock().push(members);
        });
        settle().await;

        assert_eq!(
            *rosters.lock(),
            vec![vec![json!({"name": "jo"}), json!({"name": "sam"})]]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_injected_sink_receives_unhandled_failures() {
        let mock = MockTransport::new();
        mock.enqueue(&url("connect"), HttpResponse::new(500, "boom"));
        let transport: Arc<dyn HttpTransport> = mock.clone();

        let statuses = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&statuses);
        let sink: crate::http::ErrorSink = Arc::new(move |response: &HttpResponse| {
            seen.lock().push(response.status);
        });

        let _connector = Connector::with_collaborators(
            options(),
            transport,
            Arc::new(MemoryBackend::new()),
            Arc::new(crate::window::AlwaysActive),
            sink,
        )
        .expect("valid options");
        settle().await;

        assert_eq!(*statuses.lock(), vec![500]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_leave_unsubscribes_every_variant() {
        let mock = MockTransport::new();
        mock.enqueue(&url("connect"), connect_ok());
        let connector = connector(&mock, options());

        connector.channel("room");
        connector.private_channel("room");
        settle().await;

        connector.leave("room");
        settle().await;

        let unsubscribed: Vec<String> = mock
            .requests()
            .into_iter()
            .filter(|r| r.url == url("unsubscribe"))
            .map(|r| r.body)
            .collect();
        assert_eq!(
            unsubscribed,
            vec!["channel_name=room", "channel_name=private-room"]
        );
    }
}
