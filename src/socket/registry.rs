//! Channel and listener bookkeeping.
//!
//! The registry is plain data behind explicit mutation methods; the
//! socket owns the single instance and decides when network traffic
//! accompanies a mutation. Adding a listener never subscribes, and
//! removing one never unsubscribes.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde_json::Value;

// ============================================================================
// Types
// ============================================================================

/// An event listener.
///
/// Listeners are compared by pointer identity for removal, so the same
/// `Arc` must be kept by callers that intend to detach later.
pub type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

/// Registered channels and their per-event listeners.
#[derive(Default)]
pub struct ChannelRegistry {
    channels: FxHashMap<String, FxHashMap<String, Vec<Listener>>>,
}

impl ChannelRegistry {
    /// Registers a channel if absent. Listeners on an existing channel
    /// are untouched.
    pub fn ensure_channel(&mut self, channel: &str) {
        self.channels.entry(channel.to_string()).or_default();
    }

    /// Removes a channel and all of its listeners.
    pub fn remove_channel(&mut self, channel: &str) {
        self.channels.remove(channel);
    }

    /// Returns `true` if the channel is registered.
    #[inline]
    #[must_use]
    pub fn has_channel(&self, channel: &str) -> bool {
        self.channels.contains_key(channel)
    }

    /// Returns `true` if no channel is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// All registered channel names, sorted.
    #[must_use]
    pub fn channel_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.channels.keys().cloned().collect();
        names.sort();
        names
    }

    /// Attaches a listener. Registers the channel if absent.
    pub fn add_listener(&mut self, channel: &str, event: &str, listener: Listener) {
        self.channels
            .entry(channel.to_string())
            .or_default()
            .entry(event.to_string())
            .or_default()
            .push(listener);
    }

    /// Detaches listeners from an event on a registered channel.
    ///
    /// With a listener given, only entries that are the same `Arc` are
    /// removed; without one, every listener for the event goes. An
    /// unknown channel or event is a no-op.
    pub fn remove_listener(&mut self, channel: &str, event: &str, listener: Option<&Listener>) {
        let Some(events) = self.channels.get_mut(channel) else {
            return;
        };
        match listener {
            Some(target) => {
                if let Some(listeners) = events.get_mut(event) {
                    listeners.retain(|l| !Arc::ptr_eq(l, target));
                }
            }
            None => {
                events.remove(event);
            }
        }
    }

    /// Listeners attached to an event on a channel, cloned out so
    /// callers can invoke them without holding any lock.
    #[must_use]
    pub fn listeners(&self, channel: &str, event: &str) -> Vec<Listener> {
        self.channels
            .get(channel)
            .and_then(|events| events.get(event))
            .cloned()
            .unwrap_or_default()
    }

    /// Per-channel event-name lists for the poll body, sorted for a
    /// deterministic wire encoding.
    #[must_use]
    pub fn subscriptions(&self) -> Vec<(String, Vec<String>)> {
        let mut out: Vec<(String, Vec<String>)> = self
            .channels
            .iter()
            .map(|(channel, events)| {
                let mut names: Vec<String> = events.keys().cloned().collect();
                names.sort();
                (channel.clone(), names)
            })
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }
}

impl std::fmt::Debug for ChannelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelRegistry")
            .field("channels", &self.channel_names())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    fn noop() -> Listener {
        Arc::new(|_| {})
    }

    #[test]
    fn test_ensure_channel_is_idempotent() {
        let mut registry = ChannelRegistry::default();
        registry.add_listener("room", "msg", noop());
        registry.ensure_channel("room");

        assert_eq!(registry.listeners("room", "msg").len(), 1);
    }

    #[test]
    fn test_remove_channel_drops_listeners() {
        let mut registry = ChannelRegistry::default();
        registry.add_listener("room", "msg", noop());
        registry.remove_channel("room");

        assert!(!registry.has_channel("room"));
        assert!(registry.listeners("room", "msg").is_empty());
    }

    #[test]
    fn test_remove_listener_by_identity() {
        let mut registry = ChannelRegistry::default();
        let keep = noop();
        let gone = noop();
        registry.add_listener("room", "msg", Arc::clone(&keep));
        registry.add_listener("room", "msg", Arc::clone(&gone));

        registry.remove_listener("room", "msg", Some(&gone));

        let left = registry.listeners("room", "msg");
        assert_eq!(left.len(), 1);
        assert!(Arc::ptr_eq(&left[0], &keep));
    }

    #[test]
    fn test_remove_listener_without_target_clears_event() {
        let mut registry = ChannelRegistry::default();
        registry.add_listener("room", "msg", noop());
        registry.add_listener("room", "msg", noop());
        registry.add_listener("room", "other", noop());

        registry.remove_listener("room", "msg", None);

        assert!(registry.listeners("room", "msg").is_empty());
        assert_eq!(registry.listeners("room", "other").len(), 1);
    }

    #[test]
    fn test_remove_listener_unknown_channel_is_noop() {
        let mut registry = ChannelRegistry::default();
        registry.remove_listener("missing", "msg", None);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_subscriptions_sorted() {
        let mut registry = ChannelRegistry::default();
        registry.add_listener("b", "z", noop());
        registry.add_listener("b", "a", noop());
        registry.add_listener("a", "m", noop());
        registry.ensure_channel("c");

        let subs = registry.subscriptions();
        assert_eq!(
            subs,
            vec![
                ("a".to_string(), vec!["m".to_string()]),
                ("b".to_string(), vec!["a".to_string(), "z".to_string()]),
                ("c".to_string(), Vec::new()),
            ]
        );
    }

    #[test]
    fn test_listeners_cloned_out_are_callable() {
        let mut registry = ChannelRegistry::default();
        let hits = Arc::new(AtomicUsize::new(0));
        let count = Arc::clone(&hits);
        registry.add_listener("room", "msg", Arc::new(move |_| {
            count.fetch_add(1, Ordering::SeqCst);
        }));

        for listener in registry.listeners("room", "msg") {
            listener(&serde_json::json!({"text": "hi"}));
        }

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
