//! Statekit Core: client-side state and cache primitives.
//!
//! Four loosely composed components over one dynamic [`Value`] type:
//!
//! - [`TtlCache`] / [`PlainCache`]: keyed caches over an injected
//!   string-keyed [`StorageMedium`], with and without per-entry expiry
//! - [`MemoCache`]: call memoization with pluggable key derivation
//! - [`Store`]: observable reducer-driven state container
//! - [`deep`]: clone / equality / diff utilities that stay correct on
//!   aliased and cyclic value graphs
//!
//! The toolkit assumes a single logical thread of control: every operation
//! is synchronous and runs to completion before returning. Ordinary misuse
//! (absent keys, expired entries, unknown actions, corrupt stored strings)
//! resolves to documented absent/false/no-op results with a `tracing`
//! diagnostic, never to an error that interrupts the caller.

pub mod cache;
pub mod clock;
pub mod codec;
pub mod deep;
pub mod store;
pub mod types;

pub use cache::{MemoCache, MemoryMedium, PlainCache, StorageError, StorageMedium, TtlCache};
pub use clock::{ClockSource, SystemClock};
pub use codec::CodecError;
pub use deep::{DiffEntry, DiffMap};
pub use store::{ActionTable, Reducer, Store, Subscription};
pub use types::{ArrayNode, MapNode, Value};
