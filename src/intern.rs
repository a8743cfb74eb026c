//! Shared string interning for repetitive columns.
//!
//! Columns such as title type, adult flag, years and genres take a handful of
//! distinct values across millions of rows. Interning them hands every record
//! an `Arc<str>` pointing at one shared copy per distinct value instead of a
//! fresh allocation per row.
//!
//! The interner is split into independently locked shards so that concurrent
//! workers rarely contend. Entries are never evicted; memory is bounded by the
//! number of distinct values seen, which is what makes it suitable only for
//! low-cardinality columns.

use std::collections::HashSet;
use std::hash::{BuildHasher, RandomState};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

const SHARDS: usize = 16;

static SHARED: LazyLock<Interner> = LazyLock::new(Interner::new);

/// The process-wide interner used by [`CompactTitle`](crate::CompactTitle).
pub fn shared() -> &'static Interner {
    &SHARED
}

pub struct Interner {
    shards: [Mutex<HashSet<Arc<str>>>; SHARDS],
    hasher: RandomState,
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Interner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interner").field("len", &self.len()).finish()
    }
}

impl Interner {
    #[must_use]
    pub fn new() -> Self {
        Self {
            shards: std::array::from_fn(|_| Mutex::new(HashSet::new())),
            hasher: RandomState::new(),
        }
    }

    /// The shared copy of `value`, created on first sight.
    pub fn intern(&self, value: &str) -> Arc<str> {
        let shard = (self.hasher.hash_one(value) % SHARDS as u64) as usize;
        let mut set = self.shards[shard].lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(hit) = set.get(value) {
            return Arc::clone(hit);
        }
        let fresh: Arc<str> = Arc::from(value);
        set.insert(Arc::clone(&fresh));
        fresh
    }

    /// Distinct values held.
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|s| s.lock().unwrap_or_else(PoisonError::into_inner).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn equal_values_share_storage() {
        let interner = Interner::new();
        let a = interner.intern("movie");
        let b = interner.intern(&String::from("movie"));
        let c = interner.intern("short");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn concurrent_interning_converges() {
        let interner = Interner::new();
        let values: Vec<Arc<str>> = thread::scope(|s| {
            let handles: Vec<_> = (0..8).map(|_| s.spawn(|| interner.intern("Drama"))).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(values.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(interner.len(), 1);
    }
}
