//! Presence channel handle.

// ============================================================================
// Imports
// ============================================================================

use std::ops::Deref;
use std::sync::Arc;

use serde_json::Value;

use crate::protocol::{MEMBER_ADDED_EVENT, MEMBER_REMOVED_EVENT, SUBSCRIPTION_SUCCEEDED_EVENT};
use crate::socket::Listener;

use super::PrivateChannel;

// ============================================================================
// PresenceChannel
// ============================================================================

/// An authorized channel that also tracks who is subscribed, named
/// with the `presence-` prefix.
///
/// Presence semantics are layered over the generic event model: the
/// server emits internal events for the member roster and for
/// join/leave transitions, and this handle unwraps the member payloads
/// before invoking the callbacks.
#[derive(Debug, Clone)]
pub struct PresenceChannel {
    channel: PrivateChannel,
}

/// Members arrive as `{user_info: ...}` wrappers; older backends send
/// the info object bare.
fn member_info(member: &Value) -> Value {
    member
        .get("user_info")
        .cloned()
        .unwrap_or_else(|| member.clone())
}

impl PresenceChannel {
    pub(crate) fn new(channel: PrivateChannel) -> Self {
        Self { channel }
    }

    /// Runs a callback with the current member roster once the
    /// subscription is confirmed.
    pub fn here(&self, callback: impl Fn(Vec<Value>) + Send + Sync + 'static) -> Listener {
        let listener: Listener = Arc::new(move |payload| {
            let members = payload
                .as_array()
                .map(|items| items.iter().map(member_info).collect())
                .unwrap_or_default();
            callback(members);
        });

        self.channel.bind(SUBSCRIPTION_SUCCEEDED_EVENT, listener)
    }

    /// Runs a callback whenever a member joins.
    pub fn joining(&self, callback: impl Fn(Value) + Send + Sync + 'static) -> Listener {
        let listener: Listener = Arc::new(move |payload| callback(member_info(payload)));
        self.channel.bind(MEMBER_ADDED_EVENT, listener)
    }

    /// Runs a callback whenever a member leaves.
    pub fn leaving(&self, callback: impl Fn(Value) + Send + Sync + 'static) -> Listener {
        let listener: Listener = Arc::new(move |payload| callback(member_info(payload)));
        self.channel.bind(MEMBER_REMOVED_EVENT, listener)
    }
}

impl Deref for PresenceChannel {
    type Target = PrivateChannel;

    fn deref(&self) -> &PrivateChannel {
        &self.channel
    }
}
