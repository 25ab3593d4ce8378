//! Key-value persistence with JSON serialization.
//!
//! The socket persists two things across requests (and, in a multi-tab
//! host, across instances): the server-issued socket-id and the
//! active-window marker. Both live under a single storage key holding a
//! JSON object, mirroring how a browser client keeps them in
//! `localStorage`.
//!
//! The [`StorageBackend`] trait is the seam: the default
//! [`MemoryBackend`] is per-process, while a host embedding several
//! logical tabs can supply a shared implementation. Durability is the
//! host's problem, not ours.
//!
//! Writes are read-modify-write and not atomic across instances; each
//! subkey is written by logic that tolerates eventual consistency.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};

// ============================================================================
// StorageBackend
// ============================================================================

/// Raw string storage keyed by name.
pub trait StorageBackend: Send + Sync {
    /// Reads the raw value stored under `key`, if any.
    fn read(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    fn write(&self, key: &str, value: String);
}

// ============================================================================
// MemoryBackend
// ============================================================================

/// In-process storage backend.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<FxHashMap<String, String>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn write(&self, key: &str, value: String) {
        self.entries.lock().insert(key.to_string(), value);
    }
}

// ============================================================================
// JsonStore
// ============================================================================

/// A JSON object stored under a single backend key.
///
/// `get` never fails: an absent, unparsable, or non-object value reads
/// as an empty object.
#[derive(Clone)]
pub struct JsonStore {
    backend: Arc<dyn StorageBackend>,
    key: String,
}

impl std::fmt::Debug for JsonStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonStore").field("key", &self.key).finish()
    }
}

impl JsonStore {
    /// Creates a store scoped to `key` on the given backend.
    #[inline]
    pub fn new(backend: Arc<dyn StorageBackend>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    /// Returns the stored object, or an empty one if the key is absent,
    /// unparsable, or did not serialize an object.
    #[must_use]
    pub fn get(&self) -> Map<String, Value> {
        let Some(raw) = self.backend.read(&self.key) else {
            return Map::new();
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Returns a string subkey, if present.
    #[must_use]
    pub fn get_str(&self, subkey: &str) -> Option<String> {
        self.get()
            .get(subkey)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Merges `{subkey: value}` into the stored object and writes the
    /// whole object back.
    pub fn set(&self, subkey: &str, value: impl Into<Value>) {
        let mut data = self.get();
        data.insert(subkey.to_string(), value.into());

        self.backend
            .write(&self.key, Value::Object(data).to_string());
    }
}

// ============================================================================
// Tests
// ============================================================================
