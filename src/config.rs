//! Parser tuning knobs.
//!
//! Configuration is an explicit value passed to [`Parser::new`](crate::Parser::new),
//! so several parsers with different tuning can coexist in one process.
//!
//! ```
//! use ironrow::{ParserConfig, Strategy};
//!
//! let cfg = ParserConfig::default()
//!     .with_workers(4)
//!     .with_strategy(Strategy::Streaming)
//!     .with_batch_size(10_000);
//! assert!(cfg.validate().is_ok());
//! ```

use crate::error::{ParseError, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How an in-memory buffer is divided among workers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Single-threaded scan; the baseline the parallel strategies must match.
    Sequential,
    /// Segment all lines, then give each worker one contiguous index range
    /// writing into a pre-sized result. Preserves input order.
    #[default]
    StaticRanges,
    /// Cut the body into one newline-aligned byte range per worker, skipping
    /// the up-front segmentation pass. Preserves input order.
    ByteChunks,
    /// Feed the buffer through the streaming batch pipeline. Order follows
    /// [`ParserConfig::preserve_order`].
    Streaming,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Number of concurrent field workers.
    pub workers: usize,
    /// Lines per streaming batch.
    pub batch_size: usize,
    /// Capacity, in batches, of each bounded streaming queue.
    pub queue_capacity: usize,
    /// Idle batches each pool may retain; `None` derives it from the queue
    /// capacity and worker count.
    pub pool_capacity: Option<usize>,
    /// Re-sequence streaming output so it matches input order.
    pub preserve_order: bool,
    /// Strategy used by [`Parser::parse`](crate::Parser::parse).
    pub strategy: Strategy,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            batch_size: 100_000,
            queue_capacity: 100,
            pool_capacity: None,
            preserve_order: false,
            strategy: Strategy::default(),
        }
    }
}

impl ParserConfig {
    /// Defaults with one worker per logical CPU.
    #[must_use]
    pub fn for_host() -> Self {
        Self {
            workers: num_cpus::get().max(1),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    #[must_use]
    pub fn with_pool_capacity(mut self, pool_capacity: usize) -> Self {
        self.pool_capacity = Some(pool_capacity);
        self
    }

    #[must_use]
    pub fn with_preserve_order(mut self, preserve_order: bool) -> Self {
        self.preserve_order = preserve_order;
        self
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Idle batches retained per pool.
    ///
    /// Enough to cover a full input queue plus one batch in flight per worker
    /// on each side, so steady-state streaming allocates nothing new.
    pub fn effective_pool_capacity(&self) -> usize {
        self.pool_capacity
            .unwrap_or(self.queue_capacity + 2 * self.workers)
            .max(1)
    }

    /// # Errors
    /// [`ParseError::InvalidConfig`] when any size is zero.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(ParseError::InvalidConfig("workers must be at least 1".into()));
        }
        if self.batch_size == 0 {
            return Err(ParseError::InvalidConfig("batch_size must be at least 1".into()));
        }
        if self.queue_capacity == 0 {
            return Err(ParseError::InvalidConfig("queue_capacity must be at least 1".into()));
        }
        if self.pool_capacity == Some(0) {
            return Err(ParseError::InvalidConfig("pool_capacity must be at least 1".into()));
        }
        Ok(())
    }

    /// Load a config from a JSON file. Missing fields take their defaults.
    ///
    /// # Errors
    /// Fails if the file cannot be read, is not valid JSON, or does not validate.
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let cfg: ParserConfig =
            serde_json::from_str(&raw).with_context(|| format!("parse config {}", path.display()))?;
        cfg.validate()
            .with_context(|| format!("validate config {}", path.display()))?;
        Ok(cfg)
    }
}
