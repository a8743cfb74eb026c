//! Reusable batch storage shared by every stage of the pipeline.
//!
//! A [`BufferPool`] hands out items wrapped in a [`Pooled`] guard. The guard
//! owns the item exclusively and puts it back when dropped, whether the batch
//! was fully consumed, discarded on cancellation, or dropped on an error path.
//! Before an item re-enters the idle list it is [`reset`](Recycle::reset), so
//! its logical length is zero and nothing from the previous batch is visible.
//!
//! The idle list is a bounded lock-free queue. Returning an item to a full pool
//! drops it, which caps the memory a pool can retain.

use crossbeam_queue::ArrayQueue;
use serde::Serialize;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Storage that can be wiped for reuse without giving up its allocation.
pub trait Recycle: Send {
    /// Reset the logical length (and any per-batch metadata) to empty.
    /// Capacity may be retained; contents become garbage.
    fn reset(&mut self);
}

impl<T: Send> Recycle for Vec<T> {
    fn reset(&mut self) {
        self.clear();
    }
}

/// Counters describing how a pool has been used so far.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Items built by the factory because the idle list was empty.
    pub created: u64,
    /// Checkouts served from the idle list.
    pub reused: u64,
    /// Returned items dropped because the idle list was full.
    pub discarded: u64,
    /// Items currently checked out.
    pub outstanding: usize,
    /// Highest `outstanding` value observed.
    pub peak_outstanding: usize,
    /// Items currently idle.
    pub idle: usize,
}

impl PoolStats {
    /// # Errors
    /// Propagates serializer failures.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

type Factory<B> = Box<dyn Fn() -> B + Send + Sync>;

pub struct BufferPool<B> {
    idle: ArrayQueue<B>,
    make: Factory<B>,
    created: AtomicU64,
    reused: AtomicU64,
    discarded: AtomicU64,
    outstanding: AtomicUsize,
    peak_outstanding: AtomicUsize,
}

impl<B> fmt::Debug for BufferPool<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferPool")
            .field("capacity", &self.idle.capacity())
            .field("idle", &self.idle.len())
            .finish_non_exhaustive()
    }
}

impl<B: Recycle> BufferPool<B> {
    /// Create a pool retaining at most `capacity` idle items (minimum 1).
    pub fn new(capacity: usize, make: impl Fn() -> B + Send + Sync + 'static) -> Self {
        Self {
            idle: ArrayQueue::new(capacity.max(1)),
            make: Box::new(make),
            created: AtomicU64::new(0),
            reused: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
            outstanding: AtomicUsize::new(0),
            peak_outstanding: AtomicUsize::new(0),
        }
    }

    /// Take an item, reusing an idle one when available.
    pub fn checkout(&self) -> Pooled<'_, B> {
        let item = match self.idle.pop() {
            Some(item) => {
                self.reused.fetch_add(1, Ordering::Relaxed);
                item
            }
            None => {
                self.created.fetch_add(1, Ordering::Relaxed);
                (self.make)()
            }
        };
        let now = self.outstanding.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak_outstanding.fetch_max(now, Ordering::AcqRel);
        Pooled {
            item: Some(item),
            pool: self,
        }
    }

    fn restore(&self, mut item: B) {
        self.outstanding.fetch_sub(1, Ordering::AcqRel);
        item.reset();
        if self.idle.push(item).is_err() {
            self.discarded.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Maximum number of idle items retained.
    pub fn capacity(&self) -> usize {
        self.idle.capacity()
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            created: self.created.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            outstanding: self.outstanding.load(Ordering::Acquire),
            peak_outstanding: self.peak_outstanding.load(Ordering::Acquire),
            idle: self.idle.len(),
        }
    }
}

/// Exclusive handle on a checked-out pool item; returns it on drop.
pub struct Pooled<'a, B: Recycle> {
    item: Option<B>,
    pool: &'a BufferPool<B>,
}

impl<B: Recycle> Deref for Pooled<'_, B> {
    type Target = B;

    fn deref(&self) -> &B {
        // `item` is only `None` inside `drop`.
        self.item.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl<B: Recycle> DerefMut for Pooled<'_, B> {
    fn deref_mut(&mut self) -> &mut B {
        self.item.as_mut().unwrap_or_else(|| unreachable!())
    }
}

impl<B: Recycle + fmt::Debug> fmt::Debug for Pooled<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pooled").field(&self.item).finish()
    }
}

impl<B: Recycle> Drop for Pooled<'_, B> {
    fn drop(&mut self) {
        if let Some(item) = self.item.take() {
            self.pool.restore(item);
        }
    }
}
