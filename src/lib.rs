//! # Ironrow
//!
//! A **concurrent batch parser** for large tab-separated datasets with a fixed
//! schema. Ironrow turns a header line plus millions of data rows into a
//! collection of typed records, spreading the work across a pool of field
//! workers while keeping the result identical to a single-threaded scan.
//!
//! ## Key Features
//!
//! - **Four strategies** - sequential, static index ranges, newline-aligned
//!   byte chunks, and a bounded streaming pipeline
//! - **Strict schema** - a line must split into exactly the record's column
//!   count; anything else fails the whole parse with its line number
//! - **All or nothing** - a parse returns the complete record set or one error
//! - **Bounded memory** - streaming batches are recycled through fixed-capacity
//!   pools and queues
//! - **Cooperative cancellation** - one [`CancelToken`] stops every stage
//!
//! ## Quick Start
//!
//! ```
//! use ironrow::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let input = testing::titles_tsv(1_000);
//!
//! let parser: Parser<Title> = Parser::new(ParserConfig::default().with_workers(4))?;
//! let titles = parser.parse(&input)?;
//!
//! assert_eq!(titles.len(), 1_000);
//! assert_eq!(titles, parse_sequential::<Title>(&input)?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Records
//!
//! A [`TsvRecord`] declares its column count and how to build itself from one
//! line. [`Title`] is the built-in nine-column record; [`CompactTitle`] holds
//! the same columns but interns the repetitive ones to save memory on large
//! inputs.
//!
//! ### Strategies
//!
//! - [`Strategy::StaticRanges`] (default) segments the buffer into lines and
//!   hands each worker one contiguous range, written straight into a pre-sized
//!   result. Output order is input order.
//! - [`Strategy::ByteChunks`] skips the segmentation pass: each worker takes a
//!   byte range cut on a newline and splits it itself.
//! - [`Strategy::Streaming`] reads lines one at a time into pooled batches,
//!   which flow through bounded queues to the workers and on to a collector.
//!   [`Parser::parse_reader`] always uses it. Output is in completion order
//!   unless [`ParserConfig::preserve_order`] is set.
//! - [`Strategy::Sequential`] is the single-threaded reference.
//!
//! ### Errors
//!
//! [`ParseError::MalformedInput`] for empty or non-UTF-8 input,
//! [`ParseError::SchemaViolation`] for a line with the wrong column count
//! (lowest line wins when several workers fail), [`ParseError::Cancelled`]
//! when the token fires. Line numbers are 1-based and count the header.
//!
//! ## Testing
//!
//! The [`testing`] module has dataset generators, order-aware assertions and
//! mock line sources for writing tests against the parser.

pub mod batch;
pub mod cancel;
pub mod collect;
pub mod config;
pub mod error;
pub mod intern;
pub mod parser;
pub mod partition;
pub mod pool;
pub mod record;
pub mod segment;
pub mod testing;
mod worker;

pub use batch::{LineBatch, RecordBatch};
pub use cancel::CancelToken;
pub use collect::ReorderBuffer;
pub use config::{ParserConfig, Strategy};
pub use error::{ParseError, Result};
pub use intern::Interner;
pub use parser::{Parsed, Parser, RunStats, parse_sequential};
pub use partition::{StreamBatcher, byte_chunks, static_ranges};
pub use pool::{BufferPool, PoolStats, Pooled, Recycle};
pub use record::{CompactTitle, DELIMITER, Title, TsvRecord, split_columns};
pub use segment::{LineSpan, Segments, segment};
