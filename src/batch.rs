//! Pooled batch types moved between the stages of the streaming pipeline.

use crate::pool::Recycle;

/// A bounded group of input lines.
///
/// Slots beyond `len` hold text from earlier batches and are kept only for
/// their allocation; readers must go through [`lines`](LineBatch::lines).
#[derive(Debug, Default)]
pub struct LineBatch {
    /// Emission order of this batch, starting at 0.
    pub seq: u64,
    /// 1-based input line number of the first line in the batch.
    pub first_line: usize,
    slots: Vec<String>,
    len: usize,
}

impl LineBatch {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Number of lines actually filled in.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn lines(&self) -> &[String] {
        &self.slots[..self.len]
    }

    /// Append a copy of `line`, overwriting a stale slot when one exists.
    pub fn push(&mut self, line: &str) {
        if let Some(slot) = self.slots.get_mut(self.len) {
            slot.clear();
            slot.push_str(line);
        } else {
            self.slots.push(line.to_owned());
        }
        self.len += 1;
    }

    /// Drop trailing whitespace from the last filled line.
    pub fn trim_last_end(&mut self) {
        if let Some(last) = self.len.checked_sub(1).and_then(|i| self.slots.get_mut(i)) {
            let keep = last.trim_end().len();
            last.truncate(keep);
        }
    }
}

impl Recycle for LineBatch {
    fn reset(&mut self) {
        self.seq = 0;
        self.first_line = 0;
        self.len = 0;
    }
}

/// A group of parsed records; one per [`LineBatch`], same length and order.
#[derive(Debug)]
pub struct RecordBatch<R> {
    pub seq: u64,
    pub records: Vec<R>,
}

impl<R> RecordBatch<R> {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            seq: 0,
            records: Vec::with_capacity(capacity),
        }
    }
}

impl<R: Send> Recycle for RecordBatch<R> {
    fn reset(&mut self) {
        self.seq = 0;
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_slots_are_invisible_after_reset() {
        let mut b = LineBatch::with_capacity(4);
        b.push("one");
        b.push("two");
        b.push("three");
        b.reset();
        assert!(b.is_empty());
        b.push("x");
        assert_eq!(b.lines(), ["x".to_string()]);
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn trim_last_end_touches_only_last_line() {
        let mut b = LineBatch::with_capacity(2);
        b.push("a\t ");
        b.push("b\t\t ");
        b.trim_last_end();
        assert_eq!(b.lines(), ["a\t ".to_string(), "b".to_string()]);
    }
}
