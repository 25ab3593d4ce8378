//! Private (authorized) channel handle.

// ============================================================================
// Imports
// ============================================================================

use std::ops::Deref;

use serde_json::Value;

use super::Channel;

// ============================================================================
// PrivateChannel
// ============================================================================

/// A channel requiring server-side authorization, named with the
/// `private-` prefix.
///
/// Authorization itself happens on the subscribe call through the
/// configured auth headers; this handle adds client-to-client
/// whispering on top of the base channel API.
#[derive(Debug, Clone)]
pub struct PrivateChannel {
    channel: Channel,
}

impl PrivateChannel {
    pub(crate) fn new(channel: Channel) -> Self {
        Self { channel }
    }

    /// Publishes a client-originated whisper, broadcast to the other
    /// subscribers as `client-{event}`.
    pub fn whisper(&self, event: &str, data: Value) -> &Self {
        self.channel
            .socket()
            .emit(self.channel.name(), &format!("client-{event}"), data);

        self
    }
}

impl Deref for PrivateChannel {
    type Target = Channel;

    fn deref(&self) -> &Channel {
        &self.channel
    }
}
