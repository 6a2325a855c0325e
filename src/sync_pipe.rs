use std::fmt;

#[cfg(feature = "sync")]
use std::time::Duration;

use log::{debug, trace};
use loole::{bounded, Receiver, Sender};
#[cfg(feature = "sync")]
use loole::{RecvTimeoutError, SendTimeoutError};

use crate::error::{PipeError, Side};
use crate::state::SharedState;

/// Creates a connected pair of writer and reader objects.
///
/// The pipe has no buffer: every successful write is handed directly to a reader call
/// that is waiting for it, so `write` blocks until the reader takes the item or closes.
///
/// # Returns
///
/// A tuple containing `(Writer, Reader)`.
///
/// # Example
///
/// ```rust
/// use std::thread::spawn;
/// use rendezvous_pipe::pipe;
///
/// let (writer, reader) = pipe();
/// spawn(move || {
///     for i in 1..=3 {
///         writer.write(i).unwrap();
///     }
///     writer.close().unwrap();
/// });
///
/// assert_eq!(vec![1, 2, 3], reader.read_all().collect::<Vec<_>>());
/// ```
pub fn pipe<T>() -> (Writer<T>, Reader<T>) {
    let (sender, receiver) = bounded(0);

    let state = SharedState::default();

    (
        Writer {
            sender,
            state: state.clone(),
        },
        Reader { receiver, state },
    )
}

/// The producing end of a pipe.
///
/// Clones share the same pipe, so several threads may write at once; each item is
/// delivered to exactly one read, in the order the hand-offs happen.
///
/// # Notes
///
/// - `write` blocks until the reader takes the item or closes its side.
/// - Write returns [`PipeError::ClosedPipe`] once the reader is closed or dropped.
/// - `close` ends the stream for the reader. Dropping every clone has the same effect.
///
/// # Example
///
/// ```rust
/// use rendezvous_pipe::{pipe, PipeError};
///
/// let (writer, reader) = pipe();
/// reader.close().unwrap();
/// assert_eq!(Err(PipeError::ClosedPipe), writer.write(42));
/// ```
pub struct Writer<T> {
    pub(crate) sender: Sender<T>,
    pub(crate) state: SharedState,
}

impl<T> Writer<T> {
    /// Closes the writer side. Readers drain what is in flight and then see the end
    /// of the stream.
    ///
    /// The side is shared by all clones, so only the first call from any of them
    /// succeeds; later calls return [`PipeError::AlreadyClosed`].
    pub fn close(&self) -> Result<(), PipeError> {
        self.state.close(Side::Writer)?;
        self.sender.close();
        Ok(())
    }

    /// Returns true once the writer side was closed through [`Writer::close`].
    pub fn is_closed(&self) -> bool {
        self.state.is_closed(Side::Writer)
    }

    pub(crate) fn check_open(&self) -> Result<(), PipeError> {
        match self.state.write_error() {
            Some(e) => {
                debug!("pipe: write refused: {e}");
                Err(e)
            }
            None => Ok(()),
        }
    }

    // The channel only fails a send once one of the sides closed it.
    pub(crate) fn refused(&self) -> PipeError {
        let e = self.state.write_error().unwrap_or(PipeError::ClosedPipe);
        debug!("pipe: write refused: {e}");
        e
    }
}

#[cfg(feature = "sync")]
impl<T> Writer<T> {
    /// Hands `item` to the reader, blocking until it is taken.
    ///
    /// Returns [`PipeError::ClosedPipe`] if the reader closed before taking it and
    /// [`PipeError::WriteAfterClose`] if this writer side was already closed.
    pub fn write(&self, item: T) -> Result<(), PipeError> {
        self.check_open()?;
        self.sender.send(item).map_err(|_| self.refused())
    }

    /// Like [`Writer::write`], but gives up with [`PipeError::Timeout`] when no reader
    /// takes the item within `timeout`.
    ///
    /// An item that timed out is dropped and never reaches the reader. Callers that
    /// retry must write a fresh value.
    pub fn write_timeout(&self, item: T, timeout: Duration) -> Result<(), PipeError> {
        self.check_open()?;
        match self.sender.send_timeout(item, timeout) {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Timeout(_)) => {
                debug!("pipe: write timed out after {timeout:?}");
                Err(PipeError::Timeout)
            }
            Err(SendTimeoutError::Disconnected(_)) => Err(self.refused()),
        }
    }
}

// Not derived: that would demand `T: Clone`.
impl<T> Clone for Writer<T> {
    fn clone(&self) -> Self {
        Writer {
            sender: self.sender.clone(),
            state: self.state.clone(),
        }
    }
}

impl<T> fmt::Debug for Writer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Writer")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// The consuming end of a pipe.
///
/// There is exactly one reader per pipe. It yields items until the writer side is
/// closed or every writer is dropped.
///
/// # Notes
///
/// - Reads block the thread until a writer hands over an item.
/// - `close` makes current and future writes fail with [`PipeError::ClosedPipe`].
///   Dropping the reader does the same.
/// - Reading in the same thread that should later write deadlocks: the pipe has no
///   buffer to write into.
///
/// # Example
///
/// ```rust
/// use std::thread::spawn;
/// use rendezvous_pipe::pipe;
///
/// let (writer, reader) = pipe();
/// spawn(move || {
///     writer.write("hello").unwrap();
///     writer.write("world").unwrap();
/// });
///
/// assert_eq!(vec!["hello", "world"], reader.into_iter().collect::<Vec<_>>());
/// ```
pub struct Reader<T> {
    pub(crate) receiver: Receiver<T>,
    pub(crate) state: SharedState,
}

impl<T> Reader<T> {
    /// Closes the reader side. Blocked and future writes return [`PipeError::ClosedPipe`].
    ///
    /// A second call returns [`PipeError::AlreadyClosed`].
    pub fn close(&self) -> Result<(), PipeError> {
        self.state.close(Side::Reader)?;
        self.receiver.close();
        Ok(())
    }

    /// Returns true once the reader side was closed.
    pub fn is_closed(&self) -> bool {
        self.state.is_closed(Side::Reader)
    }
}

#[cfg(feature = "sync")]
impl<T> Reader<T> {
    /// Takes the next item, blocking until a writer hands one over.
    ///
    /// Returns `None` once the stream has ended.
    pub fn read(&self) -> Option<T> {
        match self.receiver.recv() {
            Ok(item) => Some(item),
            Err(_) => {
                trace!("pipe: stream ended");
                None
            }
        }
    }

    /// Like [`Reader::read`], but returns [`PipeError::Timeout`] when nothing arrives
    /// within `timeout`. `Ok(None)` still means the stream has ended.
    pub fn read_timeout(&self, timeout: Duration) -> Result<Option<T>, PipeError> {
        match self.receiver.recv_timeout(timeout) {
            Ok(item) => Ok(Some(item)),
            Err(RecvTimeoutError::Disconnected) => {
                trace!("pipe: stream ended");
                Ok(None)
            }
            Err(RecvTimeoutError::Timeout) => Err(PipeError::Timeout),
        }
    }

    /// Returns a blocking iterator over the items of the stream.
    ///
    /// The iterator borrows the reader, so it may be dropped part way and picked up
    /// again with another call; both continue the same stream.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::thread::spawn;
    /// use rendezvous_pipe::pipe;
    ///
    /// let (writer, reader) = pipe();
    /// spawn(move || {
    ///     for i in 0..4 {
    ///         writer.write(i).unwrap();
    ///     }
    /// });
    ///
    /// assert_eq!(vec![0, 1], reader.read_all().take(2).collect::<Vec<_>>());
    /// assert_eq!(vec![2, 3], reader.read_all().collect::<Vec<_>>());
    /// ```
    pub fn read_all(&self) -> ReadAll<'_, T> {
        ReadAll { reader: self }
    }
}

impl<T> Drop for Reader<T> {
    fn drop(&mut self) {
        if !self.is_closed() {
            _ = self.close();
        }
    }
}

impl<T> fmt::Debug for Reader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reader")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Borrowing iterator returned by [`Reader::read_all`].
#[cfg(feature = "sync")]
#[derive(Debug)]
pub struct ReadAll<'a, T> {
    reader: &'a Reader<T>,
}

#[cfg(feature = "sync")]
impl<T> Iterator for ReadAll<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.reader.read()
    }
}

/// Owning iterator over a [`Reader`]. Dropping it closes the reader side.
#[cfg(feature = "sync")]
#[derive(Debug)]
pub struct IntoReadAll<T> {
    reader: Reader<T>,
}

#[cfg(feature = "sync")]
impl<T> Iterator for IntoReadAll<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.reader.read()
    }
}

#[cfg(feature = "sync")]
impl<T> IntoIterator for Reader<T> {
    type Item = T;
    type IntoIter = IntoReadAll<T>;

    fn into_iter(self) -> IntoReadAll<T> {
        IntoReadAll { reader: self }
    }
}

#[cfg(feature = "sync")]
impl<'a, T> IntoIterator for &'a Reader<T> {
    type Item = T;
    type IntoIter = ReadAll<'a, T>;

    fn into_iter(self) -> ReadAll<'a, T> {
        self.read_all()
    }
}
