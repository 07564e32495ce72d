//! Time-bounded key/value cache over a backing [`StorageMedium`].

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::{ClockSource, SystemClock};
use crate::codec;
use crate::types::Value;

use super::medium::StorageMedium;

/// Serialized form of one cache entry: the value plus its absolute expiry
/// instant (milliseconds since epoch).
#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    value: serde_json::Value,
    expiry: i64,
}

/// Keyed cache whose entries expire after a caller-supplied time-to-live.
///
/// Entries are serialized to JSON strings and written through an injected
/// [`StorageMedium`]. Each entry carries an absolute expiry instant computed
/// from the injected [`ClockSource`] at write time; a read at or past that
/// instant reports absence and lazily evicts the entry.
///
/// Several instances may share one medium. Keys are passed through to the
/// medium verbatim, so callers sharing a medium must namespace their keys.
///
/// Storage faults and malformed stored strings never surface as errors:
/// reads report absence, writes report `false`, and a diagnostic is logged.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use statekit_core::{MemoryMedium, TtlCache, Value};
///
/// let cache = TtlCache::new(Rc::new(MemoryMedium::new()));
/// cache.set("greeting", &Value::from("hello"), 60_000);
/// assert!(cache.is_valid("greeting"));
/// assert_eq!(cache.get("greeting").and_then(|v| v.as_str().map(String::from)),
///            Some("hello".to_string()));
/// ```
pub struct TtlCache {
    medium: Rc<dyn StorageMedium>,
    clock: Rc<dyn ClockSource>,
}

impl TtlCache {
    /// Creates a cache over `medium` using the system clock.
    #[must_use]
    pub fn new(medium: Rc<dyn StorageMedium>) -> Self {
        Self::with_clock(medium, Rc::new(SystemClock))
    }

    /// Creates a cache over `medium` with an injected clock.
    #[must_use]
    pub fn with_clock(medium: Rc<dyn StorageMedium>, clock: Rc<dyn ClockSource>) -> Self {
        Self { medium, clock }
    }

    /// Stores `value` under `key` with an expiry of now + `ttl_millis`.
    ///
    /// A TTL of zero produces an entry that is already expired for every
    /// subsequent read. Returns `false` (with a logged diagnostic) when the
    /// value has no JSON form or the medium rejects the write.
    pub fn set(&self, key: &str, value: &Value, ttl_millis: u64) -> bool {
        let json = match codec::to_json(value) {
            Ok(json) => json,
            Err(err) => {
                warn!(key, error = %err, "cache entry is not serializable");
                return false;
            }
        };
        let entry = StoredEntry {
            value: json,
            expiry: self.clock.now().saturating_add_unsigned(ttl_millis),
        };
        let payload = match serde_json::to_string(&entry) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(key, error = %err, "cache entry serialization failed");
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

    /// Returns the value stored under `key`, or `None` if the key is
    /// absent, malformed, or expired.
    ///
    /// An expired entry is removed from the medium as a side effect; the
    /// read reports absence whether or not that removal succeeds.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        let entry = self.load(key)?;
        if self.clock.now() >= entry.expiry {
            if let Err(err) = self.medium.remove_item(key) {
                warn!(key, error = %err, "failed to evict expired cache entry");
            }
            return None;
        }
        Some(codec::from_json(&entry.value))
    }

    /// Unconditionally deletes any entry under `key`. Absent keys and
    /// medium faults are absorbed (the latter with a logged diagnostic).
    pub fn remove(&self, key: &str) {
        if let Err(err) = self.medium.remove_item(key) {
            warn!(key, error = %err, "cache removal rejected by storage medium");
        }
    }

    /// Reports whether `key` holds an unexpired entry.
    ///
    /// Unlike [`get`](Self::get), this neither returns the value nor evicts
    /// an expired entry.
    #[must_use]
    pub fn is_valid(&self, key: &str) -> bool {
        self.load(key)
            .is_some_and(|entry| self.clock.now() < entry.expiry)
    }

    /// Reads and parses the stored entry. Medium faults and malformed
    /// strings both resolve to `None`.
    fn load(&self, key: &str) -> Option<StoredEntry> {
        let raw = match self.medium.get_item(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!(key, error = %err, "cache read rejected by storage medium");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(entry) => Some(entry),
            Err(err) => {
                debug!(key, error = %err, "ignoring malformed cache entry");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::cache::medium::{MemoryMedium, StorageError};
    use crate::deep;

    /// Clock whose time only moves when a test advances it.
    struct ManualClock {
        millis: Cell<i64>,
    }

    impl ManualClock {
        fn at(millis: i64) -> Self {
            Self {
                millis: Cell::new(millis),
            }
        }

        fn advance(&self, delta: i64) {
            self.millis.set(self.millis.get() + delta);
        }
    }

    impl ClockSource for ManualClock {
        fn now(&self) -> i64 {
            self.millis.get()
        }
    }

    /// Medium that fails every operation, for the storage-fault policy.
    struct FailingMedium;

    impl StorageMedium for FailingMedium {
        fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable)
        }
        fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::QuotaExceeded)
        }
        fn remove_item(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable)
        }
        fn clear(&self) -> Result<(), StorageError> {
            Err(StorageError::Unavailable)
        }
        fn keys(&self) -> Result<Vec<String>, StorageError> {
            Err(StorageError::Unavailable)
        }
    }

    fn cache_at(start: i64) -> (TtlCache, Rc<MemoryMedium>, Rc<ManualClock>) {
        let medium = Rc::new(MemoryMedium::new());
        let clock = Rc::new(ManualClock::at(start));
        let cache = TtlCache::with_clock(medium.clone(), clock.clone());
        (cache, medium, clock)
    }

    #[test]
    fn set_then_get_returns_value() {
        let (cache, _, _) = cache_at(1_000);
        let value = Value::map([("x", Value::Int(1))]);
        assert!(cache.set("a", &value, 1_000));
        let read = cache.get("a").expect("fresh entry is present");
        assert!(deep::equal(&read, &value));
    }

    #[test]
    fn entry_expires_after_ttl() {
        let (cache, medium, clock) = cache_at(0);
        cache.set("a", &Value::map([("x", Value::Int(1))]), 1_000);

        clock.advance(999);
        assert!(cache.get("a").is_some(), "t=999 is inside the ttl");

        clock.advance(2);
        assert!(cache.get("a").is_none(), "t=1001 is past the ttl");
        assert!(!cache.is_valid("a"));
        assert!(medium.is_empty(), "expired entry is lazily evicted");
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let (cache, _, clock) = cache_at(0);
        cache.set("a", &Value::Int(1), 1_000);
        clock.advance(1_000);
        // now == expiry counts as expired.
        assert!(!cache.is_valid("a"));
        assert!(cache.get("a").is_none());
    }

    #[test]
    fn zero_ttl_entry_is_immediately_expired() {
        let (cache, _, _) = cache_at(5_000);
        assert!(cache.set("a", &Value::Int(1), 0));
        assert!(cache.get("a").is_none());
        assert!(!cache.is_valid("a"));
    }

    #[test]
    fn is_valid_does_not_evict() {
        let (cache, medium, clock) = cache_at(0);
        cache.set("a", &Value::Int(1), 100);
        clock.advance(200);
        assert!(!cache.is_valid("a"));
        assert_eq!(medium.len(), 1, "is_valid must not remove the entry");
        assert!(cache.get("a").is_none());
        assert!(medium.is_empty(), "get does evict");
    }

    #[test]
    fn overwrite_refreshes_expiry() {
        let (cache, _, clock) = cache_at(0);
        cache.set("a", &Value::Int(1), 100);
        clock.advance(90);
        cache.set("a", &Value::Int(2), 100);
        clock.advance(90);
        // 180ms after the first write, but only 90ms after the refresh.
        assert_eq!(cache.get("a").and_then(|v| v.as_int()), Some(2));
    }

    #[test]
    fn remove_deletes_entry_and_tolerates_absence() {
        let (cache, medium, _) = cache_at(0);
        cache.set("a", &Value::Int(1), 1_000);
        cache.remove("a");
        assert!(medium.is_empty());
        cache.remove("a");
    }

    #[test]
    fn malformed_entry_reads_as_absent() {
        let (cache, medium, _) = cache_at(0);
        medium.set_item("a", "{corrupted").expect("seed");
        assert!(cache.get("a").is_none());
        assert!(!cache.is_valid("a"));
    }

    #[test]
    fn entry_with_unexpected_shape_reads_as_absent() {
        let (cache, medium, _) = cache_at(0);
        medium.set_item("a", r#"{"something":"else"}"#).expect("seed");
        assert!(cache.get("a").is_none());
    }

    #[test]
    fn cyclic_value_is_rejected_on_set() {
        let (cache, medium, _) = cache_at(0);
        let v = Value::empty_map();
        v.insert("self", v.clone());
        assert!(!cache.set("a", &v, 1_000));
        assert!(medium.is_empty());
    }

    #[test]
    fn failing_medium_is_absorbed() {
        let cache = TtlCache::with_clock(Rc::new(FailingMedium), Rc::new(ManualClock::at(0)));
        assert!(!cache.set("a", &Value::Int(1), 1_000));
        assert!(cache.get("a").is_none());
        assert!(!cache.is_valid("a"));
        cache.remove("a");
    }

    #[test]
    fn two_caches_share_one_medium() {
        let medium = Rc::new(MemoryMedium::new());
        let clock = Rc::new(ManualClock::at(0));
        let first = TtlCache::with_clock(medium.clone(), clock.clone());
        let second = TtlCache::with_clock(medium, clock);

        first.set("ns1:a", &Value::Int(1), 1_000);
        assert_eq!(second.get("ns1:a").and_then(|v| v.as_int()), Some(1));
    }

    #[test]
    fn huge_ttl_does_not_overflow() {
        let (cache, _, _) = cache_at(i64::MAX - 5);
        assert!(cache.set("a", &Value::Int(1), u64::MAX));
        assert!(cache.is_valid("a"));
    }
}
