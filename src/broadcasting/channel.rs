//! Public channel handle.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use serde_json::Value;

use crate::protocol::SUBSCRIPTION_SUCCEEDED_EVENT;
use crate::socket::{Listener, Socket};
use crate::util::EventFormatter;

// ============================================================================
// Channel
// ============================================================================

/// A handle to one broadcast channel.
///
/// Creating the handle subscribes the channel; listeners attach through
/// [`listen`](Self::listen). Handles are cheap clones over the shared
/// socket and can be held anywhere.
#[derive(Debug, Clone)]
pub struct Channel {
    socket: Socket,
    name: String,
    formatter: EventFormatter,
}

impl Channel {
    /// Subscribes the channel and returns its handle.
    pub(crate) fn new(socket: Socket, name: String, formatter: EventFormatter) -> Self {
        socket.subscribe(&name);
        Self {
            socket,
            name,
            formatter,
        }
    }

    /// The full channel name, including any `private-`/`presence-`
    /// prefix.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub(crate) fn socket(&self) -> &Socket {
        &self.socket
    }

    /// Attaches a listener for a broadcast event.
    ///
    /// The event name goes through the namespace formatter. The
    /// returned handle identifies the listener for
    /// [`stop_listening`](Self::stop_listening).
    pub fn listen(&self, event: &str, callback: impl Fn(&Value) + Send + Sync + 'static) -> Listener {
        let listener: Listener = Arc::new(callback);
        self.socket
            .on(&self.name, &self.formatter.format(event), Arc::clone(&listener));

        listener
    }

    /// Detaches one listener (by handle) or, with `None`, every
    /// listener for the event.
    pub fn stop_listening(&self, event: &str, listener: Option<&Listener>) {
        self.socket
            .off(&self.name, &self.formatter.format(event), listener);
    }

    /// Runs a callback once the server confirms the subscription.
    pub fn subscribed(&self, callback: impl Fn() + Send + Sync + 'static) -> Listener {
        self.bind(SUBSCRIPTION_SUCCEEDED_EVENT, Arc::new(move |_| callback()))
    }

    /// Attaches a listener to an internal event, bypassing the
    /// namespace formatter.
    pub(crate) fn bind(&self, event: &str, listener: Listener) -> Listener {
        self.socket.on(&self.name, event, Arc::clone(&listener));
        listener
    }
}
