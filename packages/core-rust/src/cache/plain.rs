//! Plain (no-TTL) key/value cache over a backing [`StorageMedium`].

use std::rc::Rc;

use tracing::{debug, warn};

use crate::codec;
use crate::types::Value;

use super::medium::StorageMedium;

/// Keyed cache without expiry, typically backed by a session-scoped medium.
///
/// Entries live until explicitly removed, the medium is cleared, or the
/// medium itself discards them (for example when a session ends). The same
/// failure policy as [`TtlCache`](super::TtlCache) applies: storage faults
/// and malformed entries resolve to absence or `false`, never to an error.
pub struct PlainCache {
    medium: Rc<dyn StorageMedium>,
}

impl PlainCache {
    /// Creates a cache over `medium`.
    #[must_use]
    pub fn new(medium: Rc<dyn StorageMedium>) -> Self {
        Self { medium }
    }

    /// Stores `value` under `key`. Returns `false` (with a logged
    /// diagnostic) when the value has no JSON form or the write is rejected.
    pub fn set(&self, key: &str, value: &Value) -> bool {
        let payload = match codec::to_json_string(value) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(key, error = %err, "cache entry is not serializable");
                return false;
            }
        };
        match self.medium.set_item(key, &payload) {
            Ok(()) => true,
            Err(err) => {
                warn!(key, error = %err, "cache write rejected by storage medium");
                false
            }
        }
    }

    /// Returns the value stored under `key`, or `None` if absent or
    /// malformed.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        let raw = match self.medium.get_item(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!(key, error = %err, "cache read rejected by storage medium");
                return None;
            }
        };
        match codec::from_json_string(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                debug!(key, error = %err, "ignoring malformed cache entry");
                None
            }
        }
    }

    /// Returns the value stored under `key`, or `default` if absent or
    /// malformed.
    #[must_use]
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).unwrap_or(default)
    }

    /// Deletes any entry under `key`. Absent keys and medium faults are
    /// absorbed.
    pub fn remove(&self, key: &str) {
        if let Err(err) = self.medium.remove_item(key) {
            warn!(key, error = %err, "cache removal rejected by storage medium");
        }
    }

    /// Deletes every entry in the backing medium.
    pub fn clear(&self) {
        if let Err(err) = self.medium.clear() {
            warn!(error = %err, "cache clear rejected by storage medium");
        }
    }

    /// Lists all keys currently stored in the backing medium. Empty on a
    /// medium fault.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        match self.medium.keys() {
            Ok(keys) => keys,
            Err(err) => {
                warn!(error = %err, "cache key listing rejected by storage medium");
                Vec::new()
            }
        }
    }
}
