//! Field workers: split lines on the delimiter and build records.
//!
//! Each strategy has its own unit of work but the same per-line rule: a line
//! becomes a record only if it splits into exactly `R::COLUMNS` columns.
//! A worker that sees a bad line trips the run's abort with the line's
//! position. Siblings working past that position stop at their next check;
//! those still before it carry on, so the earliest bad line is always found.

use crate::batch::{LineBatch, RecordBatch};
use crate::cancel::Stop;
use crate::error::{ParseError, Result};
use crate::pool::{BufferPool, Pooled};
use crate::record::TsvRecord;
use crate::segment::strip_cr;
use crossbeam_channel::{Receiver, Sender};
use std::ops::Range;
use tracing::trace;

/// Lines parsed between two polls of the stop flags.
pub(crate) const POLL_EVERY: usize = 4096;

#[inline]
fn violation<R: TsvRecord>(stop: &Stop<'_>, position: usize, line: usize, found: usize) -> ParseError {
    stop.abort.trip(position);
    ParseError::SchemaViolation {
        line,
        expected: R::COLUMNS,
        found,
    }
}

/// Parse `lines` into `dst`, slot for slot.
///
/// `first_line` is the input line number of `lines[0]`. `dst` is this worker's
/// own region of the pre-sized result, so no other worker touches it.
///
/// # Errors
/// [`ParseError::SchemaViolation`] for the first bad line in the range, or
/// [`ParseError::Cancelled`] when stopped.
pub(crate) fn fill_range<R: TsvRecord>(
    dst: &mut [R],
    lines: &[&str],
    first_line: usize,
    stop: &Stop<'_>,
) -> Result<()> {
    debug_assert_eq!(dst.len(), lines.len());
    for (i, (slot, line)) in dst.iter_mut().zip(lines).enumerate() {
        let line_no = first_line + i;
        if i % POLL_EVERY == 0 && stop.is_past(line_no) {
            return Err(ParseError::Cancelled);
        }
        *slot = R::from_line(line).map_err(|found| violation::<R>(stop, line_no, line_no, found))?;
    }
    Ok(())
}

/// Parse the whole lines found in `text[range]`, appending to `out`.
///
/// Progress is tracked by byte offset. The line number of a bad line is only
/// worked out on failure, by counting the newlines that precede the chunk.
///
/// # Errors
/// See [`fill_range`].
pub(crate) fn parse_chunk<R: TsvRecord>(
    text: &str,
    range: Range<usize>,
    out: &mut Vec<R>,
    stop: &Stop<'_>,
) -> Result<()> {
    let start = range.start;
    let chunk = &text[range];
    let chunk = chunk.strip_suffix('\n').unwrap_or(chunk);
    let mut offset = start;
    for (i, line) in chunk.split('\n').enumerate() {
        if i % POLL_EVERY == 0 && stop.is_past(offset) {
            return Err(ParseError::Cancelled);
        }
        match R::from_line(strip_cr(line)) {
            Ok(rec) => out.push(rec),
            Err(found) => {
                let before = text.as_bytes()[..start].iter().filter(|&&b| b == b'\n').count();
                return Err(violation::<R>(stop, offset, before + 1 + i, found));
            }
        }
        offset += line.len() + 1;
    }
    Ok(())
}

/// Parse one streamed batch into `out` (cleared storage from the record pool).
fn parse_batch<R: TsvRecord>(batch: &LineBatch, out: &mut Vec<R>, stop: &Stop<'_>) -> Result<()> {
    out.reserve(batch.len());
    for (i, line) in batch.lines().iter().enumerate() {
        if i % POLL_EVERY == 0 && stop.is_set() {
            return Err(ParseError::Cancelled);
        }
        let line_no = batch.first_line + i;
        let rec = R::from_line(line).map_err(|found| violation::<R>(stop, line_no, line_no, found))?;
        out.push(rec);
    }
    Ok(())
}

/// Streaming worker loop: pull line batches until the input queue closes.
///
/// Input storage goes back to its pool as soon as the batch is parsed; output
/// storage comes from `records` and travels to the collector. Returns the
/// number of batches processed.
///
/// # Errors
/// [`ParseError::SchemaViolation`] on a bad line, [`ParseError::Cancelled`]
/// when stopped or when the collector has gone away.
pub(crate) fn stream_worker<'p, R: TsvRecord>(
    id: usize,
    input: Receiver<Pooled<'p, LineBatch>>,
    output: Sender<Pooled<'p, RecordBatch<R>>>,
    records: &'p BufferPool<RecordBatch<R>>,
    stop: Stop<'_>,
) -> Result<u64> {
    let mut done = 0u64;
    while let Some(batch) = stop.recv(&input)? {
        let mut out = records.checkout();
        out.seq = batch.seq;
        parse_batch(&batch, &mut out.records, &stop)?;
        trace!(worker = id, seq = batch.seq, lines = batch.len(), "batch parsed");
        drop(batch);
        stop.send(&output, out)?;
        done += 1;
    }
    Ok(done)
}
