//! Dividing input into independent units of work.
//!
//! Three partitioners, matching the parse strategies:
//!
//! - [`static_ranges`]: known line count, one contiguous index range per worker.
//! - [`byte_chunks`]: known buffer, one newline-aligned byte range per worker.
//! - [`StreamBatcher`]: unknown length, accumulate lines into fixed-size
//!   pooled batches as they arrive.

use crate::batch::LineBatch;
use crate::cancel::Stop;
use crate::error::{ParseError, Result};
use crate::pool::{BufferPool, Pooled};
use std::io::{self, BufRead};
use std::ops::Range;

/// Split the data lines of an input with `total_lines` lines (header included)
/// into at most `workers` contiguous ranges of input line indices.
///
/// Index 0 is the header, so the ranges cover `[1, total_lines)`. Ranges are
/// non-empty, non-overlapping and in order; sizes differ by at most one. Fewer
/// than `workers` ranges come back only when there are fewer data lines than
/// workers.
pub fn static_ranges(total_lines: usize, workers: usize) -> Vec<Range<usize>> {
    let data = total_lines.saturating_sub(1);
    if data == 0 {
        return Vec::new();
    }
    let parts = workers.max(1).min(data);
    let base = data / parts;
    let rem = data % parts;

    let mut out = Vec::with_capacity(parts);
    let mut start = 1usize;
    for idx in 0..parts {
        let end = start + base + usize::from(idx < rem);
        out.push(start..end);
        start = end;
    }
    out
}

/// Cut `body` into at most `parts` byte ranges, each holding whole lines.
///
/// Every range but possibly the last ends just past a `\n`. Ranges are
/// non-empty, contiguous and cover the entire body.
pub fn byte_chunks(body: &str, parts: usize) -> Vec<Range<usize>> {
    let bytes = body.as_bytes();
    let len = bytes.len();
    if len == 0 {
        return Vec::new();
    }
    let target = len.div_ceil(parts.max(1));

    let mut out = Vec::with_capacity(parts);
    let mut start = 0usize;
    while start < len {
        let guess = (start + target).min(len);
        let end = if guess == len {
            len
        } else {
            bytes[guess - 1..]
                .iter()
                .position(|&b| b == b'\n')
                .map_or(len, |p| guess + p)
        };
        out.push(start..end);
        start = end;
    }
    out
}

/// Accumulates a stream of lines into pooled [`LineBatch`]es of `batch_size`.
///
/// The stream gets the same end-of-input treatment as a whole buffer:
/// whitespace-only lines are held back until a line with content follows, so
/// the ones at the very end are dropped, and the last line with content loses
/// its trailing whitespace. Interior whitespace-only lines still reach the
/// workers (and fail validation there). A full batch is emitted only once the
/// next line arrives, so the final one can still be trimmed.
pub struct StreamBatcher<'p> {
    pool: &'p BufferPool<LineBatch>,
    batch_size: usize,
    current: Option<Pooled<'p, LineBatch>>,
    next_seq: u64,
    next_line: usize,
    pending_blank: Vec<String>,
}

impl<'p> StreamBatcher<'p> {
    /// `first_line` is the input line number of the first line to be pushed.
    pub fn new(pool: &'p BufferPool<LineBatch>, batch_size: usize, first_line: usize) -> Self {
        Self {
            pool,
            batch_size: batch_size.max(1),
            current: None,
            next_seq: 0,
            next_line: first_line,
            pending_blank: Vec::new(),
        }
    }

    /// Batches emitted so far.
    pub fn emitted(&self) -> u64 {
        self.next_seq
    }

    /// Take one line; `emit` is called for every batch that is complete.
    ///
    /// # Errors
    /// Whatever `emit` returns.
    pub fn push<F>(&mut self, line: &str, emit: &mut F) -> Result<()>
    where
        F: FnMut(Pooled<'p, LineBatch>) -> Result<()>,
    {
        if line.trim().is_empty() {
            self.pending_blank.push(line.to_owned());
            return Ok(());
        }
        for blank in std::mem::take(&mut self.pending_blank) {
            self.append(&blank, emit)?;
        }
        self.append(line, emit)
    }

    /// Emit the final, possibly short, batch. Trailing whitespace-only lines
    /// are dropped and the last line is right-trimmed.
    ///
    /// # Errors
    /// Whatever `emit` returns.
    pub fn finish<F>(mut self, emit: &mut F) -> Result<u64>
    where
        F: FnMut(Pooled<'p, LineBatch>) -> Result<()>,
    {
        if let Some(mut batch) = self.current.take() {
            batch.trim_last_end();
            emit(batch)?;
            self.next_seq += 1;
        }
        Ok(self.next_seq)
    }

    fn append<F>(&mut self, line: &str, emit: &mut F) -> Result<()>
    where
        F: FnMut(Pooled<'p, LineBatch>) -> Result<()>,
    {
        if self.current.as_ref().is_some_and(|b| b.len() >= self.batch_size) {
            if let Some(full) = self.current.take() {
                emit(full)?;
                self.next_seq += 1;
            }
        }
        let (pool, seq, first_line) = (self.pool, self.next_seq, self.next_line);
        let batch = self.current.get_or_insert_with(|| {
            let mut b = pool.checkout();
            b.seq = seq;
            b.first_line = first_line;
            b
        });
        batch.push(line);
        self.next_line += 1;
        Ok(())
    }
}

/// Read `reader` line by line, skip the header, and batch the rest.
///
/// Returns the number of batches emitted. Polls `stop` between lines.
///
/// # Errors
/// - [`ParseError::MalformedInput`] if the stream holds nothing but whitespace
///   or is not UTF-8.
/// - [`ParseError::Cancelled`] if `stop` fires.
/// - [`ParseError::Io`] on read failures, or whatever `emit` returns.
pub(crate) fn accumulate<'p, B, F>(
    mut reader: B,
    pool: &'p BufferPool<LineBatch>,
    batch_size: usize,
    stop: &Stop<'_>,
    mut emit: F,
) -> Result<u64>
where
    B: BufRead,
    F: FnMut(Pooled<'p, LineBatch>) -> Result<()>,
{
    let mut buf = String::new();
    let mut line_no = 1usize;

    if !read_line(&mut reader, &mut buf, line_no)? {
        return Err(ParseError::MalformedInput("input is empty".into()));
    }
    let mut saw_content = !buf.trim().is_empty();

    let mut batcher = StreamBatcher::new(pool, batch_size, 2);
    loop {
        if stop.is_set() {
            return Err(ParseError::Cancelled);
        }
        line_no += 1;
        if !read_line(&mut reader, &mut buf, line_no)? {
            break;
        }
        saw_content |= !buf.trim().is_empty();
        batcher.push(&buf, &mut emit)?;
    }

    if !saw_content {
        return Err(ParseError::MalformedInput("input is empty".into()));
    }
    batcher.finish(&mut emit)
}

/// Read one line into `buf` without its `\n` / `\r\n` terminator.
/// Returns `false` at end of input.
fn read_line<B: BufRead>(reader: &mut B, buf: &mut String, line_no: usize) -> Result<bool> {
    buf.clear();
    match reader.read_line(buf) {
        Ok(0) => Ok(false),
        Ok(_) => {
            if buf.ends_with('\n') {
                buf.pop();
            }
            if buf.ends_with('\r') {
                buf.pop();
            }
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::InvalidData => Err(ParseError::MalformedInput(
            format!("line {line_no} is not valid UTF-8"),
        )),
        Err(e) => Err(ParseError::Io(e)),
    }
}
