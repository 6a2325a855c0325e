use std::fmt;
use std::io::{Error as IOError, ErrorKind};

use thiserror::Error;

/// One end of a pipe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Reader,
    Writer,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Reader => f.write_str("reader"),
            Side::Writer => f.write_str("writer"),
        }
    }
}

/// Errors returned by pipe operations.
///
/// Only [`PipeError::ClosedPipe`] is part of normal operation: a writer that gets it
/// should stop producing, the stream is over. The other variants report misuse of the
/// close protocol or an expired timeout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PipeError {
    /// The reader side was closed or dropped before the item was taken.
    #[error("pipe: write on closed pipe")]
    ClosedPipe,

    /// The writer side was already closed by this writer or one of its clones.
    #[error("pipe: write after writer close")]
    WriteAfterClose,

    /// `close` was called a second time on the same side.
    #[error("pipe: {0} side already closed")]
    AlreadyClosed(Side),

    /// No counterpart showed up before the deadline.
    #[error("pipe: operation timed out")]
    Timeout,
}

impl From<PipeError> for IOError {
    fn from(e: PipeError) -> Self {
        let kind = match e {
            PipeError::ClosedPipe | PipeError::WriteAfterClose => ErrorKind::BrokenPipe,
            PipeError::Timeout => ErrorKind::TimedOut,
            PipeError::AlreadyClosed(_) => ErrorKind::Other,
        };
        IOError::new(kind, e)
    }
}
