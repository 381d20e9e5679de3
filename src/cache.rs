//! The memoization cache backing the query layer.
//!
//! [`Memo`] is an explicitly constructed cache owned by whatever build or
//! request context needs it: created with the context, dropped with it.
//! There is no eviction--a build runs over a bounded input set and the
//! cache lives only as long as the build. A capacity-bounded variant
//! would slot in behind the same two methods if the cache ever had to
//! outlive a single build.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};

/// A per-operation memoization table keyed by the operation's concrete
/// argument values. Zero-argument operations key on `()`.
///
/// Failures are never stored: a failed computation propagates its error
/// and leaves the slot empty, so the next call retries instead of
/// replaying the failure. Two callers racing on the same uncached key may
/// both run the computation--it runs without the table lock held--and the
/// later result wins the slot. Computations are pure, so both callers
/// still observe equal values.
pub struct Memo<K, V> {
    slots: Mutex<HashMap<K, V>>,
}

impl<K: Eq + Hash + Clone, V: Clone> Memo<K, V> {
    pub fn new() -> Memo<K, V> {
        Memo {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the value for `key`, computing and storing it on first
    /// use.
    pub fn get_or_compute<F>(&self, key: K, compute: F) -> V
    where
        F: FnOnce() -> V,
    {
        if let Some(value) = self.get(&key) {
            return value;
        }
        let value = compute();
        self.insert(key, value.clone());
        value
    }

    /// Fallible variant of [`Memo::get_or_compute`]: the error propagates
    /// to the caller and nothing is stored, so a later call retries.
    pub fn get_or_try_compute<E, F>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = compute()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    fn get(&self, key: &K) -> Option<V> {
        self.lock().get(key).cloned()
    }

    fn insert(&self, key: K, value: V) {
        self.lock().insert(key, value);
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, V>> {
        // A poisoned lock only means another thread panicked between
        // lock and unlock; the map itself is still coherent.
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Default for Memo<K, V> {
    fn default() -> Memo<K, V> {
        Memo::new()
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_computes_once_per_key() {
        let memo: Memo<(), usize> = Memo::new();
        let calls = AtomicUsize::new(0);
        let compute = || {
            calls.fetch_add(1, Ordering::SeqCst);
            42
        };

        assert_eq!(42, memo.get_or_compute((), compute));
        assert_eq!(42, memo.get_or_compute((), compute));
        assert_eq!(1, calls.load(Ordering::SeqCst));
    }

    #[test]
    fn test_distinct_keys_get_distinct_slots() {
        let memo: Memo<String, usize> = Memo::new();
        assert_eq!(1, memo.get_or_compute(String::from("a"), || 1));
        assert_eq!(2, memo.get_or_compute(String::from("b"), || 2));
        assert_eq!(1, memo.get_or_compute(String::from("a"), || 99));
    }

    #[test]
    fn test_failure_is_not_cached() {
        let memo: Memo<(), usize> = Memo::new();
        let calls = AtomicUsize::new(0);
        let flaky = || -> Result<usize, String> {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(String::from("transient"))
            } else {
                Ok(7)
            }
        };

        assert_eq!(Err(String::from("transient")), memo.get_or_try_compute((), flaky));
        assert_eq!(Ok(7), memo.get_or_try_compute((), flaky));
        // The success is cached; the failure was not.
        assert_eq!(Ok(7), memo.get_or_try_compute((), flaky));
        assert_eq!(2, calls.load(Ordering::SeqCst));
    }

    #[test]
    fn test_concurrent_duplicate_calls_agree() {
        const CALLERS: usize = 8;

        let memo: Memo<(), usize> = Memo::new();
        let calls = AtomicUsize::new(0);

        let results = std::thread::scope(|s| {
            let handles: Vec<_> = (0..CALLERS)
                .map(|_| {
                    s.spawn(|| {
                        memo.get_or_compute((), || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            // Widen the race window so callers actually
                            // overlap on the uncached key.
                            std::thread::sleep(std::time::Duration::from_millis(10));
                            42
                        })
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .collect::<Vec<usize>>()
        });

        // Duplicate computation is allowed, but every caller must see the
        // same value and at least one computation must have run.
        assert_eq!(vec![42; CALLERS], results);
        let computed = calls.load(Ordering::SeqCst);
        assert!((1..=CALLERS).contains(&computed));
    }
}
