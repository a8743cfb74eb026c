//! Error taxonomy for the parsing pipeline.
//!
//! Every public parse entry point returns [`Result<T>`](Result). A parse either
//! yields the complete record set or exactly one [`ParseError`]; no partial
//! result is ever handed back.

use thiserror::Error;

/// Errors surfaced by [`Parser`](crate::Parser) and the free parse functions.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The input is empty or structurally unusable before any line is parsed.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// A line split into the wrong number of columns.
    ///
    /// `line` is the 1-based line number within the input; the header is line 1.
    #[error("line {line}: expected {expected} columns, found {found}")]
    SchemaViolation {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// The shared cancellation token fired before the parse completed.
    #[error("parse cancelled")]
    Cancelled,

    /// Reading an incremental line source failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid parser configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    /// A pipeline thread panicked; the payload message is kept when it is a string.
    #[error("pipeline thread panicked: {0}")]
    WorkerPanicked(String),
}

impl ParseError {
    /// `true` if the parse was abandoned through a [`CancelToken`](crate::CancelToken).
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ParseError::Cancelled)
    }

    /// Ranking used when several workers fail at once; lower wins.
    fn precedence(&self) -> (u8, usize) {
        match self {
            ParseError::SchemaViolation { line, .. } => (0, *line),
            ParseError::MalformedInput(_) => (1, 0),
            ParseError::Io(_) => (2, 0),
            ParseError::WorkerPanicked(_) => (3, 0),
            ParseError::InvalidConfig(_) | ParseError::WorkerPool(_) => (4, 0),
            ParseError::Cancelled => (5, 0),
        }
    }

    /// Pick the error to report out of everything the workers returned.
    ///
    /// A schema violation beats the secondary `Cancelled` results of the
    /// siblings it stopped, and among violations the lowest line wins.
    pub(crate) fn most_relevant(errors: impl IntoIterator<Item = ParseError>) -> Option<ParseError> {
        errors.into_iter().min_by_key(ParseError::precedence)
    }

    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let msg = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        ParseError::WorkerPanicked(msg)
    }
}

/// Crate-wide result alias.
pub type Result<T, E = ParseError> = std::result::Result<T, E>;
