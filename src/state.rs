use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{trace, warn};

use crate::error::{PipeError, Side};

#[derive(Debug, Default)]
pub(crate) struct State {
    reader_closed: AtomicBool,
    writer_closed: AtomicBool,
}

/// Close flags shared by every handle of one pipe.
///
/// Each flag flips at most once. The channel itself does the blocking, the flags only
/// tell the writer why a send failed and turn a second close into an error.
#[derive(Clone, Debug, Default)]
pub(crate) struct SharedState(Arc<State>);

impl SharedState {
    fn flag(&self, side: Side) -> &AtomicBool {
        match side {
            Side::Reader => &self.0.reader_closed,
            Side::Writer => &self.0.writer_closed,
        }
    }

    /// Marks `side` closed. Fails if it already was.
    pub(crate) fn close(&self, side: Side) -> Result<(), PipeError> {
        if self.flag(side).swap(true, Ordering::AcqRel) {
            warn!("pipe: {side} side closed twice");
            return Err(PipeError::AlreadyClosed(side));
        }
        trace!("pipe: {side} side closed");
        Ok(())
    }

    pub(crate) fn is_closed(&self, side: Side) -> bool {
        self.flag(side).load(Ordering::Acquire)
    }

    /// Error to report for a write that can not proceed, if any.
    ///
    /// The writer's own close wins over the reader's: writing after closing is misuse
    /// even when the reader is gone too.
    pub(crate) fn write_error(&self) -> Option<PipeError> {
        if self.is_closed(Side::Writer) {
            Some(PipeError::WriteAfterClose)
        } else if self.is_closed(Side::Reader) {
            Some(PipeError::ClosedPipe)
        } else {
            None
        }
    }
}
