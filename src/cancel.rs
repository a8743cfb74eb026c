//! Cooperative cancellation shared by producers, workers and collectors.
//!
//! A [`CancelToken`] is a cheap, cloneable handle. Polling code checks
//! [`is_cancelled`](CancelToken::is_cancelled); blocking code adds
//! [`signal`](CancelToken::signal) as an extra arm of a
//! `crossbeam_channel::select!` so a blocked `send`/`recv` wakes up the moment
//! the token fires. Nothing is ever sent on the signal channel: cancelling drops
//! its only sender, which disconnects every receiver at once.

use crate::error::{ParseError, Result};
use crossbeam_channel::{Receiver, Sender, bounded, select};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Clone, Debug)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    cancelled: AtomicBool,
    trigger: Mutex<Option<Sender<()>>>,
    signal: Receiver<()>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        let (trigger, signal) = bounded(0);
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                trigger: Mutex::new(Some(trigger)),
                signal,
            }),
        }
    }

    /// Fire the token. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
        self.inner
            .trigger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Receiver that becomes ready (disconnected) once the token fires.
    #[must_use]
    pub fn signal(&self) -> &Receiver<()> {
        &self.inner.signal
    }
}

/// Internal stop raised by the first worker that fails.
///
/// Besides waking blocked stages it records the lowest failing position seen,
/// so workers still short of that position can finish their part and surface
/// an earlier failure if there is one.
#[derive(Debug)]
pub(crate) struct Abort {
    token: CancelToken,
    first_failure: AtomicUsize,
}

impl Abort {
    pub(crate) fn new() -> Self {
        Self {
            token: CancelToken::new(),
            first_failure: AtomicUsize::new(usize::MAX),
        }
    }

    /// Record a failure at `position` and wake every stage.
    pub(crate) fn trip(&self, position: usize) {
        self.first_failure.fetch_min(position, Ordering::AcqRel);
        self.token.cancel();
    }

    /// Wake every stage without recording a position.
    pub(crate) fn cancel(&self) {
        self.token.cancel();
    }

    pub(crate) fn is_tripped(&self) -> bool {
        self.token.is_cancelled()
    }

    pub(crate) fn signal(&self) -> &Receiver<()> {
        self.token.signal()
    }
}

/// What a running pipeline watches: the caller's token and the internal abort.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Stop<'a> {
    pub(crate) user: &'a CancelToken,
    pub(crate) abort: &'a Abort,
}

impl<'a> Stop<'a> {
    pub(crate) fn new(user: &'a CancelToken, abort: &'a Abort) -> Self {
        Self { user, abort }
    }

    #[inline]
    pub(crate) fn is_set(&self) -> bool {
        self.user.is_cancelled() || self.abort.is_tripped()
    }

    /// Whether a worker about to handle `position` should give up: the caller
    /// cancelled, or a failure was already recorded before `position`.
    #[inline]
    pub(crate) fn is_past(&self, position: usize) -> bool {
        self.user.is_cancelled() || self.abort.first_failure.load(Ordering::Acquire) < position
    }

    /// Blocking send that gives up when either signal fires or the receiving
    /// side has gone away.
    pub(crate) fn send<T>(&self, tx: &Sender<T>, msg: T) -> Result<()> {
        if self.is_set() {
            return Err(ParseError::Cancelled);
        }
        select! {
            send(tx, msg) -> res => res.map_err(|_| ParseError::Cancelled),
            recv(self.user.signal()) -> _ => Err(ParseError::Cancelled),
            recv(self.abort.signal()) -> _ => Err(ParseError::Cancelled),
        }
    }

    /// Blocking receive; `Ok(None)` once every sender has hung up.
    pub(crate) fn recv<T>(&self, rx: &Receiver<T>) -> Result<Option<T>> {
        if self.is_set() {
            return Err(ParseError::Cancelled);
        }
        select! {
            recv(rx) -> msg => Ok(msg.ok()),
            recv(self.user.signal()) -> _ => Err(ParseError::Cancelled),
            recv(self.abort.signal()) -> _ => Err(ParseError::Cancelled),
        }
    }
}
