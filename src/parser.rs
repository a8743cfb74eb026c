//! The parse entry point.
//!
//! A [`Parser`] owns its configuration and a rayon thread pool sized to the
//! configured worker count. Every call builds its own batch pools and queues,
//! so calls are independent and nothing is retained between them.
//!
//! ```
//! use ironrow::{Parser, ParserConfig, Strategy, Title};
//!
//! # fn main() -> anyhow::Result<()> {
//! let input = b"tconst\ttitleType\tprimaryTitle\toriginalTitle\tisAdult\tstartYear\tendYear\truntimeMinutes\tgenres\n\
//!               tt0000001\tshort\tCarmencita\tCarmencita\t0\t1894\t\\N\t1\tDocumentary,Short\n";
//!
//! let parser: Parser<Title> = Parser::new(ParserConfig::default().with_workers(2))?;
//! let titles = parser.parse(input)?;
//! assert_eq!(titles.len(), 1);
//! assert_eq!(titles[0].primary_title, "Carmencita");
//! # Ok(())
//! # }
//! ```

use crate::batch::{LineBatch, RecordBatch};
use crate::cancel::{Abort, CancelToken, Stop};
use crate::collect::{self, Merged};
use crate::config::{ParserConfig, Strategy};
use crate::error::{ParseError, Result};
use crate::partition::{self, byte_chunks, static_ranges};
use crate::pool::{BufferPool, PoolStats};
use crate::record::{Title, TsvRecord};
use crate::segment::{self, segment};
use crate::worker;
use crossbeam_channel::bounded;
use rayon::prelude::*;
use serde::Serialize;
use std::io::BufRead;
use std::marker::PhantomData;
use std::thread;
use std::time::Instant;
use tracing::{debug, warn};

/// What a run did, for whoever reports on it.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RunStats {
    pub strategy: Strategy,
    pub workers: usize,
    pub records: usize,
    /// Units of work handed to workers: ranges, chunks or streamed batches.
    pub batches: u64,
    pub line_pool: PoolStats,
    pub record_pool: PoolStats,
    pub elapsed_ms: u128,
}

/// Records plus the statistics of the run that produced them.
#[derive(Debug)]
pub struct Parsed<R> {
    pub records: Vec<R>,
    pub stats: RunStats,
}

/// Single-threaded reference parse of a full buffer.
///
/// # Errors
/// [`ParseError::MalformedInput`] or the first [`ParseError::SchemaViolation`].
pub fn parse_sequential<R: TsvRecord>(input: &[u8]) -> Result<Vec<R>> {
    scan(input, &CancelToken::new())
}

/// Line-by-line scan on the calling thread, polling `cancel` as it goes.
fn scan<R: TsvRecord>(input: &[u8], cancel: &CancelToken) -> Result<Vec<R>> {
    let segments = segment(input)?;
    let mut out = Vec::with_capacity(segments.lines.len());
    for (i, span) in segments.spans().enumerate() {
        if i % worker::POLL_EVERY == 0 && cancel.is_cancelled() {
            return Err(ParseError::Cancelled);
        }
        let record = R::from_line(span.text).map_err(|found| ParseError::SchemaViolation {
            line: span.line,
            expected: R::COLUMNS,
            found,
        })?;
        out.push(record);
    }
    Ok(out)
}

pub struct Parser<R = Title> {
    config: ParserConfig,
    threads: rayon::ThreadPool,
    _record: PhantomData<fn() -> R>,
}

impl<R> std::fmt::Debug for Parser<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<R: TsvRecord> Parser<R> {
    /// # Errors
    /// [`ParseError::InvalidConfig`] if the config does not validate, or
    /// [`ParseError::WorkerPool`] if the worker threads cannot be started.
    pub fn new(config: ParserConfig) -> Result<Self> {
        config.validate()?;
        let threads = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(|i| format!("ironrow-worker-{i}"))
            .build()?;
        Ok(Self {
            config,
            threads,
            _record: PhantomData,
        })
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse a full buffer with the configured strategy.
    ///
    /// # Errors
    /// See [`ParseError`].
    pub fn parse(&self, input: &[u8]) -> Result<Vec<R>> {
        self.parse_with_cancel(input, &CancelToken::new())
    }

    /// Like [`parse`](Self::parse), but abandons the run when `cancel` fires.
    ///
    /// # Errors
    /// See [`ParseError`].
    pub fn parse_with_cancel(&self, input: &[u8], cancel: &CancelToken) -> Result<Vec<R>> {
        self.run(input, cancel).map(|parsed| parsed.records)
    }

    /// Parse an incremental line source through the streaming pipeline,
    /// regardless of the configured strategy.
    ///
    /// # Errors
    /// See [`ParseError`].
    pub fn parse_reader<B: BufRead + Send>(&self, reader: B, cancel: &CancelToken) -> Result<Vec<R>> {
        self.run_reader(reader, cancel).map(|parsed| parsed.records)
    }

    /// Parse a full buffer and report run statistics.
    ///
    /// # Errors
    /// See [`ParseError`].
    pub fn run(&self, input: &[u8], cancel: &CancelToken) -> Result<Parsed<R>> {
        let strategy = self.config.strategy;
        self.instrumented(strategy, || match strategy {
            Strategy::Sequential => Ok((scan(input, cancel)?, 1, PoolStats::default(), PoolStats::default())),
            Strategy::StaticRanges => self.run_static(input, cancel),
            Strategy::ByteChunks => self.run_chunks(input, cancel),
            Strategy::Streaming => self.run_streaming(input, cancel),
        })
    }

    /// Streaming counterpart of [`run`](Self::run).
    ///
    /// # Errors
    /// See [`ParseError`].
    pub fn run_reader<B: BufRead + Send>(&self, reader: B, cancel: &CancelToken) -> Result<Parsed<R>> {
        self.instrumented(Strategy::Streaming, || self.run_streaming(reader, cancel))
    }

    fn instrumented<F>(&self, strategy: Strategy, body: F) -> Result<Parsed<R>>
    where
        F: FnOnce() -> Result<(Vec<R>, u64, PoolStats, PoolStats)>,
    {
        let workers = self.config.workers;
        debug!(?strategy, workers, "parse started");
        let started = Instant::now();
        match body() {
            Ok((records, batches, line_pool, record_pool)) => {
                let stats = RunStats {
                    strategy,
                    workers,
                    records: records.len(),
                    batches,
                    line_pool,
                    record_pool,
                    elapsed_ms: started.elapsed().as_millis(),
                };
                debug!(
                    records = stats.records,
                    batches = stats.batches,
                    elapsed_ms = stats.elapsed_ms,
                    "parse finished"
                );
                Ok(Parsed { records, stats })
            }
            Err(e) => {
                warn!(?strategy, error = %e, "parse aborted");
                Err(e)
            }
        }
    }

    /// Segment up front, then fill a pre-sized result by index range.
    fn run_static(&self, input: &[u8], cancel: &CancelToken) -> Result<(Vec<R>, u64, PoolStats, PoolStats)> {
        let segments = segment(input)?;
        let ranges = static_ranges(segments.total_lines(), self.config.workers);

        let mut out: Vec<R> = Vec::new();
        out.resize_with(segments.lines.len(), R::default);

        // One disjoint window of `out` per range; input index i lands in slot i - 1.
        let mut slots: Vec<&mut [R]> = Vec::with_capacity(ranges.len());
        let mut rest = out.as_mut_slice();
        for range in &ranges {
            let (head, tail) = std::mem::take(&mut rest).split_at_mut(range.len());
            slots.push(head);
            rest = tail;
        }

        let abort = Abort::new();
        let stop = Stop::new(cancel, &abort);
        let lines = &segments.lines;
        let batches = ranges.len() as u64;
        let outcomes: Vec<Result<()>> = self.threads.install(|| {
            slots
                .into_par_iter()
                .zip(ranges.into_par_iter())
                .map(|(dst, range)| {
                    worker::fill_range(dst, &lines[range.start - 1..range.end - 1], range.start + 1, &stop)
                })
                .collect()
        });
        collect::settle(outcomes, cancel)?;
        Ok((out, batches, PoolStats::default(), PoolStats::default()))
    }

    /// Newline-aligned byte ranges parsed in parallel, concatenated in order.
    fn run_chunks(&self, input: &[u8], cancel: &CancelToken) -> Result<(Vec<R>, u64, PoolStats, PoolStats)> {
        let text = segment::prepare(input)?;
        let (_header, body) = segment::split_header(text);
        let body_start = text.len() - body.len();
        let chunks = byte_chunks(body, self.config.workers);
        let batches = chunks.len() as u64;

        let abort = Abort::new();
        let stop = Stop::new(cancel, &abort);
        let outcomes: Vec<Result<Vec<R>>> = self.threads.install(|| {
            chunks
                .into_par_iter()
                .map(|range| {
                    let mut out = Vec::new();
                    let range = body_start + range.start..body_start + range.end;
                    worker::parse_chunk(text, range, &mut out, &stop)?;
                    Ok(out)
                })
                .collect()
        });
        let done = collect::settle(outcomes, cancel)?;
        Ok((collect::concat(done), batches, PoolStats::default(), PoolStats::default()))
    }

    /// Producer thread, `workers` worker threads, and the calling thread as
    /// collector, joined by bounded queues.
    fn run_streaming<B: BufRead + Send>(
        &self,
        reader: B,
        cancel: &CancelToken,
    ) -> Result<(Vec<R>, u64, PoolStats, PoolStats)> {
        let cfg = &self.config;
        let batch_size = cfg.batch_size;
        let pool_capacity = cfg.effective_pool_capacity();
        let line_pool = BufferPool::new(pool_capacity, move || LineBatch::with_capacity(batch_size));
        let record_pool: BufferPool<RecordBatch<R>> =
            BufferPool::new(pool_capacity, move || RecordBatch::with_capacity(batch_size));

        let abort = Abort::new();
        let stop = Stop::new(cancel, &abort);
        let (line_pool_ref, record_pool_ref, abort_ref) = (&line_pool, &record_pool, &abort);

        let (merged, outcomes) = thread::scope(|s| -> Result<(Result<Merged<R>>, Vec<Result<u64>>)> {
            let (line_tx, line_rx) = bounded(cfg.queue_capacity);

            let producer = thread::Builder::new()
                .name("ironrow-reader".into())
                .spawn_scoped(s, move || {
                    let res = partition::accumulate(reader, line_pool_ref, batch_size, &stop, |batch| {
                        stop.send(&line_tx, batch)
                    });
                    if res.is_err() {
                        abort_ref.cancel();
                    }
                    res
                })
                .inspect_err(|_| abort.cancel())?;

            let mut workers = Vec::with_capacity(cfg.workers);
            let mut outputs = Vec::with_capacity(cfg.workers);
            for id in 0..cfg.workers {
                let (tx, rx) = bounded(cfg.queue_capacity);
                let input = line_rx.clone();
                let handle = thread::Builder::new()
                    .name(format!("ironrow-worker-{id}"))
                    .spawn_scoped(s, move || {
                        let res = worker::stream_worker(id, input, tx, record_pool_ref, stop);
                        if res.is_err() {
                            abort_ref.cancel();
                        }
                        res
                    })
                    .inspect_err(|_| abort.cancel())?;
                workers.push(handle);
                outputs.push(rx);
            }
            drop(line_rx);

            let merged = collect::merge_streams(outputs, stop, cfg.preserve_order);

            let mut outcomes = Vec::with_capacity(cfg.workers + 1);
            outcomes.push(producer.join().unwrap_or_else(|p| Err(ParseError::from_panic(p))));
            for handle in workers {
                outcomes.push(handle.join().unwrap_or_else(|p| Err(ParseError::from_panic(p))));
            }
            Ok((merged, outcomes))
        })?;

        let emitted = match outcomes.first() {
            Some(Ok(n)) => *n,
            _ => 0,
        };
        // A worker's own error explains a collector that stopped early.
        collect::settle(outcomes, cancel)?;
        let merged = merged?;
        debug_assert_eq!(merged.batches, emitted);
        Ok((merged.records, emitted, line_pool.stats(), record_pool.stats()))
    }
}
