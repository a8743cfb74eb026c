//! Line sources for exercising the streaming path.

use super::fixtures::{HEADER, title_row};
use std::io::{self, BufRead, Read};

/// A header followed by fixture rows that never run out.
///
/// Useful for proving that cancellation stops a parse that would otherwise
/// never finish.
#[derive(Debug, Default)]
pub struct EndlessTitles {
    buf: Vec<u8>,
    pos: usize,
    next: Option<usize>,
}

impl EndlessTitles {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows handed out so far.
    #[must_use]
    pub fn rows_read(&self) -> usize {
        self.next.unwrap_or(0)
    }
}

impl Read for EndlessTitles {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let n = {
            let avail = self.fill_buf()?;
            let n = avail.len().min(out.len());
            out[..n].copy_from_slice(&avail[..n]);
            n
        };
        self.consume(n);
        Ok(n)
    }
}

impl BufRead for EndlessTitles {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        if self.pos >= self.buf.len() {
            self.buf.clear();
            self.pos = 0;
            let line = match self.next {
                None => {
                    self.next = Some(0);
                    HEADER.to_owned()
                }
                Some(i) => {
                    self.next = Some(i + 1);
                    title_row(i)
                }
            };
            self.buf.extend_from_slice(line.as_bytes());
            self.buf.push(b'\n');
        }
        Ok(&self.buf[self.pos..])
    }

    fn consume(&mut self, amt: usize) {
        self.pos = (self.pos + amt).min(self.buf.len());
    }
}

/// Serves `data`, then fails with an I/O error instead of reporting end of input.
#[derive(Debug)]
pub struct FailingReader {
    data: io::Cursor<Vec<u8>>,
    kind: io::ErrorKind,
}

impl FailingReader {
    #[must_use]
    pub fn new(data: Vec<u8>, kind: io::ErrorKind) -> Self {
        Self {
            data: io::Cursor::new(data),
            kind,
        }
    }
}

impl Read for FailingReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let n = {
            let avail = self.fill_buf()?;
            let n = avail.len().min(out.len());
            out[..n].copy_from_slice(&avail[..n]);
            n
        };
        self.consume(n);
        Ok(n)
    }
}

impl BufRead for FailingReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        let pos = usize::try_from(self.data.position()).unwrap_or(usize::MAX);
        if pos >= self.data.get_ref().len() {
            return Err(io::Error::new(self.kind, "source went away"));
        }
        self.data.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.data.consume(amt);
    }
}
