//! Fan-in: merging worker output into the single result collection.
//!
//! - [`settle`] is the join barrier shared by every strategy: once all
//!   workers have reported, it turns their outcomes into one verdict.
//! - [`merge_streams`] multiplexes the per-worker output queues of the
//!   streaming pipeline, finishing when every queue has closed.
//! - [`ReorderBuffer`] restores input order for streaming output when asked to.

use crate::batch::RecordBatch;
use crate::cancel::{CancelToken, Stop};
use crate::error::{ParseError, Result};
use crate::pool::Pooled;
use crossbeam_channel::{Receiver, Select};
use std::collections::VecDeque;

/// Reduce worker outcomes to a single result.
///
/// Succeeds only if every outcome succeeded. Otherwise the caller's
/// cancellation wins, then the most relevant worker error (see
/// [`ParseError::most_relevant`]).
pub(crate) fn settle<T>(outcomes: impl IntoIterator<Item = Result<T>>, user: &CancelToken) -> Result<Vec<T>> {
    let mut ok = Vec::new();
    let mut errors = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(v) => ok.push(v),
            Err(e) => errors.push(e),
        }
    }
    if errors.is_empty() {
        return Ok(ok);
    }
    if user.is_cancelled() {
        return Err(ParseError::Cancelled);
    }
    Err(ParseError::most_relevant(errors).unwrap_or(ParseError::Cancelled))
}

/// Concatenate per-worker results, in the order given, into one collection.
pub(crate) fn concat<R>(parts: Vec<Vec<R>>) -> Vec<R> {
    let total = parts.iter().map(Vec::len).sum();
    let mut out = Vec::with_capacity(total);
    for mut part in parts {
        out.append(&mut part);
    }
    out
}

/// Outcome of a streaming merge.
#[derive(Debug)]
pub(crate) struct Merged<R> {
    pub(crate) records: Vec<R>,
    pub(crate) batches: u64,
}

/// Drain every worker's output queue into one collection.
///
/// With `preserve_order` the batches are re-sequenced by their `seq` tag;
/// otherwise they are appended in arrival order. Returns once every queue is
/// closed, or early with [`ParseError::Cancelled`] when either token fires.
pub(crate) fn merge_streams<'p, R: Send>(
    outputs: Vec<Receiver<Pooled<'p, RecordBatch<R>>>>,
    stop: Stop<'_>,
    preserve_order: bool,
) -> Result<Merged<R>> {
    let mut sel = Select::new();
    for rx in &outputs {
        sel.recv(rx);
    }
    let user_idx = sel.recv(stop.user.signal());
    let abort_idx = sel.recv(stop.abort.signal());

    let mut records = Vec::new();
    let mut batches = 0u64;
    let mut reorder: ReorderBuffer<Pooled<'p, RecordBatch<R>>> = ReorderBuffer::new();
    let mut open = outputs.len();

    while open > 0 {
        let oper = sel.select();
        let idx = oper.index();
        if idx == user_idx || idx == abort_idx {
            let signal = if idx == user_idx { stop.user.signal() } else { stop.abort.signal() };
            let _ = oper.recv(signal);
            return Err(ParseError::Cancelled);
        }
        match oper.recv(&outputs[idx]) {
            Ok(mut batch) => {
                batches += 1;
                if preserve_order {
                    reorder.insert(batch.seq, batch);
                    while let Some(mut ready) = reorder.pop_ready() {
                        records.append(&mut ready.records);
                    }
                } else {
                    records.append(&mut batch.records);
                }
            }
            Err(_) => {
                sel.remove(idx);
                open -= 1;
            }
        }
    }

    debug_assert!(reorder.is_empty(), "sequence gap after all workers finished");
    Ok(Merged { records, batches })
}

/// Releases items strictly in sequence order, whatever order they arrive in.
#[derive(Debug)]
pub struct ReorderBuffer<T> {
    slots: VecDeque<Option<T>>,
    next_seq: u64,
    held: usize,
}

impl<T> Default for ReorderBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ReorderBuffer<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: VecDeque::new(),
            next_seq: 0,
            held: 0,
        }
    }

    /// Hold `item` until every lower sequence number has been released.
    ///
    /// Sequence numbers already released are ignored.
    pub fn insert(&mut self, seq: u64, item: T) {
        let Some(offset) = seq.checked_sub(self.next_seq) else {
            return;
        };
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        if self.slots.len() <= offset {
            self.slots.resize_with(offset + 1, || None);
        }
        if self.slots[offset].replace(item).is_none() {
            self.held += 1;
        }
    }

    /// Release the next item in sequence, if it has arrived.
    pub fn pop_ready(&mut self) -> Option<T> {
        if !matches!(self.slots.front(), Some(Some(_))) {
            return None;
        }
        let item = self.slots.pop_front().flatten()?;
        self.next_seq += 1;
        self.held -= 1;
        Some(item)
    }

    /// Items waiting on an earlier sequence number.
    pub fn len(&self) -> usize {
        self.held
    }

    pub fn is_empty(&self) -> bool {
        self.held == 0
    }
}
