//! Cache primitives: backing-medium abstraction, TTL-bounded cache,
//! plain (no-TTL) cache, and call memoization.
//!
//! [`TtlCache`] and [`PlainCache`] write through a shared string-keyed
//! [`StorageMedium`]; multiple cache instances may share one medium, with
//! key namespacing left to the caller. [`MemoCache`] keeps its results
//! privately in memory.

pub mod medium;
pub mod memo;
pub mod plain;
pub mod ttl;

pub use medium::{MemoryMedium, StorageError, StorageMedium};
pub use memo::MemoCache;
pub use plain::PlainCache;
pub use ttl::TtlCache;
