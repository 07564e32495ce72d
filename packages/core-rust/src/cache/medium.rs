//! Backing key/value medium trait and the in-memory implementation.
//!
//! The medium is a string-keyed, string-valued store external to the caches
//! (persistent or session-scoped in a host environment). It is the only
//! seam through which [`TtlCache`](super::TtlCache) and
//! [`PlainCache`](super::PlainCache) touch the outside world, and the only
//! place a storage fault can originate.

use std::cell::RefCell;
use std::collections::BTreeMap;

use thiserror::Error;

/// Failure reported by a [`StorageMedium`] implementation.
///
/// The caches absorb these at their boundary (logging a diagnostic and
/// reporting absence or a `false` result); they are never propagated to
/// cache callers.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The medium is disabled or cannot be reached.
    #[error("storage medium is unavailable")]
    Unavailable,

    /// The medium rejected a write for lack of space.
    #[error("storage quota exceeded")]
    QuotaExceeded,

    /// Any other backend-specific failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// String-keyed, string-valued backing store.
///
/// Operations take `&self` so that several cache instances can share one
/// medium handle; implementations use interior mutability. The toolkit
/// assumes a single logical thread of control, so no locking is required
/// of implementations.
pub trait StorageMedium {
    /// Reads the string stored under `key`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] when the medium cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous string.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] when the write is rejected (for example
    /// [`StorageError::QuotaExceeded`]).
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Deletes any entry under `key`. Absent keys are not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] when the medium cannot be written.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Deletes every entry.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] when the medium cannot be written.
    fn clear(&self) -> Result<(), StorageError>;

    /// Lists all stored keys.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] when the medium cannot be read.
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// In-memory [`StorageMedium`] backed by a `BTreeMap`.
///
/// The default medium for tests and for hosts without durable storage.
/// Deterministic key order, never fails.
#[derive(Debug, Default)]
pub struct MemoryMedium {
    entries: RefCell<BTreeMap<String, String>>,
}

impl MemoryMedium {
    /// Creates a new, empty medium.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether the medium holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl StorageMedium for MemoryMedium {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.entries.borrow_mut().clear();
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.entries.borrow().keys().cloned().collect())
    }
}
