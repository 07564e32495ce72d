//! Call memoization with pluggable cache-key derivation.

use std::collections::HashMap;

use serde::Serialize;
use tracing::warn;

/// Memoizes a pure computation behind a derived string cache key.
///
/// `A` is the argument shape (use a tuple for several arguments), `R` the
/// result. The key-derivation function maps arguments to the cache key; by
/// default it is a stable structural JSON serialization of the arguments.
/// Results persist until explicitly invalidated or cleared; there is no TTL.
///
/// The computation is assumed pure: if distinct argument values can derive
/// the same key, or the same arguments can legitimately produce different
/// results over time, the cache gives no consistency guarantee.
///
/// # Examples
///
/// ```
/// use statekit_core::MemoCache;
///
/// let mut squares = MemoCache::new(|n: &i64| n * n);
/// assert_eq!(squares.call(&12), 144);
/// assert_eq!(squares.call(&12), 144); // served from cache
/// squares.invalidate(&12);
/// assert!(!squares.has(&12));
/// ```
pub struct MemoCache<A, R> {
    compute: Box<dyn Fn(&A) -> R>,
    key_fn: Box<dyn Fn(&A) -> String>,
    results: HashMap<String, R>,
}

impl<A: Serialize + 'static, R: Clone + 'static> MemoCache<A, R> {
    /// Creates a memoizer with the default structural key derivation
    /// (JSON serialization of the arguments).
    #[must_use]
    pub fn new(compute: impl Fn(&A) -> R + 'static) -> Self {
        Self::with_key_fn(compute, derive_structural_key)
    }
}

impl<A: 'static, R: Clone + 'static> MemoCache<A, R> {
    /// Creates a memoizer with a custom key-derivation function.
    #[must_use]
    pub fn with_key_fn(
        compute: impl Fn(&A) -> R + 'static,
        key_fn: impl Fn(&A) -> String + 'static,
    ) -> Self {
        Self {
            compute: Box::new(compute),
            key_fn: Box::new(key_fn),
            results: HashMap::new(),
        }
    }

    /// Returns the result for `args`, invoking the computation only when the
    /// derived key has no cached result.
    pub fn call(&mut self, args: &A) -> R {
        let key = (self.key_fn)(args);
        if let Some(hit) = self.results.get(&key) {
            return hit.clone();
        }
        let result = (self.compute)(args);
        self.results.insert(key, result.clone());
        result
    }

    /// Removes the cached result for `args`. Returns whether an entry was
    /// present.
    pub fn invalidate(&mut self, args: &A) -> bool {
        let key = (self.key_fn)(args);
        self.results.remove(&key).is_some()
    }

    /// Reports whether a result is cached for `args`, without computing.
    #[must_use]
    pub fn has(&self, args: &A) -> bool {
        self.results.contains_key(&(self.key_fn)(args))
    }

    /// Removes all cached results.
    pub fn clear(&mut self) {
        self.results.clear();
    }

    /// Number of cached results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether no results are cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Default key derivation: stable JSON serialization of the arguments.
///
/// Serialization failures are logged and collapse onto one sentinel key, so
/// such argument values share a single cache slot (callers with
/// unserializable arguments should supply their own key function).
fn derive_structural_key<A: Serialize>(args: &A) -> String {
    match serde_json::to_string(args) {
        Ok(key) => key,
        Err(err) => {
            warn!(error = %err, "memo key derivation failed");
            "\u{0}unserializable".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn repeated_calls_compute_once() {
        let calls = Rc::new(Cell::new(0_u32));
        let counter = calls.clone();
        let mut memo = MemoCache::new(move |n: &i64| {
            counter.set(counter.get() + 1);
            n * 2
        });

        for _ in 0..5 {
            assert_eq!(memo.call(&21), 42);
        }
        assert_eq!(calls.get(), 1, "computation must run exactly once per key");
    }

    #[test]
    fn distinct_arguments_compute_separately() {
        let calls = Rc::new(Cell::new(0_u32));
        let counter = calls.clone();
        let mut memo = MemoCache::new(move |n: &i64| {
            counter.set(counter.get() + 1);
            n + 1
        });

        assert_eq!(memo.call(&1), 2);
        assert_eq!(memo.call(&2), 3);
        assert_eq!(memo.call(&1), 2);
        assert_eq!(calls.get(), 2);
        assert_eq!(memo.len(), 2);
    }

    #[test]
    fn invalidate_forces_recomputation() {
        let calls = Rc::new(Cell::new(0_u32));
        let counter = calls.clone();
        let mut memo = MemoCache::new(move |n: &i64| {
            counter.set(counter.get() + 1);
            *n
        });

        memo.call(&7);
        assert!(memo.invalidate(&7));
        assert!(!memo.invalidate(&7), "second invalidation finds nothing");
        memo.call(&7);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn has_reports_presence_without_computing() {
        let calls = Rc::new(Cell::new(0_u32));
        let counter = calls.clone();
        let mut memo = MemoCache::new(move |n: &i64| {
            counter.set(counter.get() + 1);
            *n
        });

        assert!(!memo.has(&3));
        assert_eq!(calls.get(), 0);
        memo.call(&3);
        assert!(memo.has(&3));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn clear_empties_the_cache() {
        let mut memo = MemoCache::new(|n: &i64| *n);
        memo.call(&1);
        memo.call(&2);
        memo.clear();
        assert!(memo.is_empty());
        assert!(!memo.has(&1));
    }

    #[test]
    fn tuple_arguments_use_structural_keys() {
        let calls = Rc::new(Cell::new(0_u32));
        let counter = calls.clone();
        let mut memo = MemoCache::new(move |(a, b): &(i64, String)| {
            counter.set(counter.get() + 1);
            format!("{a}-{b}")
        });

        assert_eq!(memo.call(&(1, "x".to_string())), "1-x");
        assert_eq!(memo.call(&(1, "x".to_string())), "1-x");
        assert_eq!(memo.call(&(1, "y".to_string())), "1-y");
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn custom_key_fn_controls_collisions() {
        let calls = Rc::new(Cell::new(0_u32));
        let counter = calls.clone();
        // Key on the first tuple field only: second field is ignored.
        let mut memo = MemoCache::with_key_fn(
            move |(a, _b): &(i64, i64)| {
                counter.set(counter.get() + 1);
                *a
            },
            |(a, _b): &(i64, i64)| a.to_string(),
        );

        assert_eq!(memo.call(&(1, 10)), 1);
        assert_eq!(memo.call(&(1, 20)), 1, "same derived key hits the cache");
        assert_eq!(calls.get(), 1);
    }
}
