//! Cross-tab "who polls" arbitration.
//!
//! When several tabs (or embedded client instances) share one account,
//! only the most-recently-foregrounded one should hit the receive
//! endpoint; the others keep a cheap no-op timer running so they can
//! resume instantly on focus without a fresh connect handshake.
//!
//! Arbitration is cooperative and best-effort: a shared storage key
//! holds the identifier of the last instance to declare itself active,
//! last-writer-wins. Brief double-polling during a focus race is
//! acceptable and self-corrects within one poll interval.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use uuid::Uuid;

use crate::storage::{JsonStore, StorageBackend};

// ============================================================================
// Constants
// ============================================================================

/// Storage key holding the visibility marker.
pub const VISIBILITY_STORAGE_KEY: &str = "window-visibility";

/// Subkey holding the identifier of the last active instance.
const LAST_ACTIVE: &str = "lastActive";

// ============================================================================
// TabArbiter
// ============================================================================

/// Decides whether this instance is the one that polls.
pub trait TabArbiter: Send + Sync {
    /// Declares this instance the active one.
    fn set_active(&self);

    /// Returns `true` if this instance was the last to declare itself
    /// active.
    fn is_active(&self) -> bool;
}

// ============================================================================
// WindowVisibility
// ============================================================================

/// Storage-backed arbiter keyed by a random per-instance identifier.
///
/// Marks itself active on construction. The host should call
/// [`TabArbiter::set_active`] again whenever the instance transitions
/// to visible (and only on that transition, not when hiding).
pub struct WindowVisibility {
    window_id: String,
    storage: JsonStore,
}

impl WindowVisibility {
    /// Creates an arbiter on the given shared backend and marks it
    /// active.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        let arbiter = Self {
            window_id: Uuid::new_v4().to_string(),
            storage: JsonStore::new(backend, VISIBILITY_STORAGE_KEY),
        };
        arbiter.set_active();

        arbiter
    }
}

impl TabArbiter for WindowVisibility {
    fn set_active(&self) {
        self.storage.set(LAST_ACTIVE, self.window_id.clone());
    }

    fn is_active(&self) -> bool {
        self.storage.get_str(LAST_ACTIVE).as_deref() == Some(self.window_id.as_str())
    }
}

// ============================================================================
// AlwaysActive
// ============================================================================

/// Arbiter for single-instance hosts: always polls.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysActive;

impl TabArbiter for AlwaysActive {
    fn set_active(&self) {}

    fn is_active(&self) -> bool {
        true
    }
}

// ============================================================================
// Tests
// ============================================================================
