//! Line segmentation of an in-memory buffer.
//!
//! Trailing whitespace and line terminators are trimmed once from the end of
//! the buffer, then it is split on `\n`. Interior lines are left as they are. Line 1 is the header: it is consumed here but never parsed.

use crate::error::{ParseError, Result};

/// One newline-delimited row borrowed from the input buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineSpan<'a> {
    /// 1-based line number within the input (the header is line 1).
    pub line: usize,
    pub text: &'a str,
}

/// A segmented buffer: the header plus every data line, in input order.
#[derive(Debug)]
pub struct Segments<'a> {
    pub header: &'a str,
    /// Data lines only; `lines[i]` is input line `i + 2`.
    pub lines: Vec<&'a str>,
}

impl<'a> Segments<'a> {
    /// Number of lines including the header.
    pub fn total_lines(&self) -> usize {
        self.lines.len() + 1
    }

    /// Data lines paired with their input line numbers.
    pub fn spans(&self) -> impl Iterator<Item = LineSpan<'a>> + '_ {
        self.lines
            .iter()
            .enumerate()
            .map(|(i, text)| LineSpan { line: i + 2, text: *text })
    }
}

/// Decode `input` as UTF-8 and drop trailing whitespace, newlines included.
///
/// # Errors
/// [`ParseError::MalformedInput`] when the input is not UTF-8 or nothing is
/// left after trimming.
pub fn prepare(input: &[u8]) -> Result<&str> {
    let text = std::str::from_utf8(input)
        .map_err(|e| ParseError::MalformedInput(format!("input is not valid UTF-8: {e}")))?;
    let text = text.trim_end();
    if text.is_empty() {
        return Err(ParseError::MalformedInput("input is empty".into()));
    }
    Ok(text)
}

/// Split `text` at the first newline into `(header, body)`.
///
/// `body` is empty when the input is a header alone.
pub(crate) fn split_header(text: &str) -> (&str, &str) {
    match text.split_once('\n') {
        Some((header, body)) => (strip_cr(header), body),
        None => (strip_cr(text), ""),
    }
}

/// Iterate the lines of an already-trimmed body, stripping a trailing `\r`.
pub(crate) fn body_lines(body: &str) -> impl Iterator<Item = &str> {
    let mut lines = (!body.is_empty()).then(|| body.split('\n'));
    std::iter::from_fn(move || lines.as_mut()?.next().map(strip_cr))
}

#[inline]
pub(crate) fn strip_cr(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}

/// Segment a full buffer into header and data lines.
///
/// # Errors
/// See [`prepare`].
pub fn segment(input: &[u8]) -> Result<Segments<'_>> {
    let text = prepare(input)?;
    let (header, body) = split_header(text);
    let lines = body_lines(body).collect();
    Ok(Segments { header, lines })
}
