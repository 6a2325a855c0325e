use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use log::trace;
use loole::RecvFuture;

use crate::error::PipeError;
use crate::{Reader, Writer};

impl<T> Writer<T> {
    /// Hands `item` to the reader, suspending the task until it is taken.
    ///
    /// Outcomes are the same as for the blocking write: [`PipeError::ClosedPipe`] once
    /// the reader side is closed, [`PipeError::WriteAfterClose`] once this side is.
    ///
    /// # Example
    ///
    /// ```rust
    /// use futures::executor::block_on;
    /// use rendezvous_pipe::{pipe, PipeError};
    ///
    /// let (writer, reader) = pipe::<u32>();
    /// drop(reader);
    /// assert_eq!(Err(PipeError::ClosedPipe), block_on(writer.write_async(1)));
    /// ```
    pub async fn write_async(&self, item: T) -> Result<(), PipeError> {
        self.check_open()?;
        self.sender
            .send_async(item)
            .await
            .map_err(|_| self.refused())
    }
}

impl<T> Reader<T> {
    /// Takes the next item, suspending the task until a writer hands one over.
    ///
    /// Returns `None` once the stream has ended.
    ///
    /// # Cancel safety
    ///
    /// Not cancel safe. Once polled, the future is registered with the channel and a
    /// writer may hand its item over and return `Ok(())` before the future completes.
    /// If the future is dropped at that point the item stays in the pipe and the next
    /// read returns it, but closing the reader instead loses it.
    pub async fn read_async(&self) -> Option<T> {
        match self.receiver.recv_async().await {
            Ok(item) => Some(item),
            Err(_) => {
                trace!("pipe: stream ended");
                None
            }
        }
    }

    /// Returns a [`Stream`] over the items of the pipe, the async form of `read_all`.
    ///
    /// # Cancel safety
    ///
    /// Same as [`Reader::read_async`]: dropping the stream while `poll_next` is pending
    /// may leave an already acknowledged item in the pipe for the next read.
    ///
    /// # Example
    ///
    /// ```rust
    /// use futures::{executor::block_on, join, StreamExt};
    /// use rendezvous_pipe::pipe;
    ///
    /// let (writer, reader) = pipe();
    /// block_on(async {
    ///     let (_, got) = join!(
    ///         async move {
    ///             for i in 1..=3 {
    ///                 writer.write_async(i).await.unwrap();
    ///             }
    ///             writer.close().unwrap();
    ///         },
    ///         reader.stream().collect::<Vec<_>>()
    ///     );
    ///     assert_eq!(vec![1, 2, 3], got);
    /// });
    /// ```
    pub fn stream(&self) -> ReadStream<'_, T> {
        ReadStream {
            reader: self,
            reading: None,
        }
    }
}

/// Stream returned by [`Reader::stream`].
pub struct ReadStream<'a, T> {
    reader: &'a Reader<T>,
    reading: Option<Pin<Box<RecvFuture<T>>>>,
}

impl<T> Stream for ReadStream<'_, T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        let this = &mut *self;
        let reader = this.reader;
        let reading = this
            .reading
            .get_or_insert_with(|| Box::pin(reader.receiver.recv_async()));

        match reading.as_mut().poll(cx) {
            Poll::Ready(Ok(item)) => {
                this.reading = None;
                Poll::Ready(Some(item))
            }
            Poll::Ready(Err(_)) => {
                this.reading = None;
                trace!("pipe: stream ended");
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> std::fmt::Debug for ReadStream<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadStream")
            .field("reader", self.reader)
            .field("reading", &self.reading.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    #[cfg(feature = "sync")]
    use std::thread::{sleep, spawn};
    #[cfg(feature = "sync")]
    use std::time::Duration;

    use futures::{executor::block_on, join, poll, StreamExt};

    use crate::{PipeError, Side};

    #[test]
    fn base_read_case() {
        block_on(async {
            let (writer, reader) = crate::pipe();
            let (_, got) = join!(
                async move {
                    writer.write_async("hello").await.unwrap();
                    writer.write_async("world").await.unwrap();
                    writer.close().unwrap();
                },
                reader.stream().collect::<Vec<_>>()
            );

            assert_eq!(vec!["hello", "world"], got);
        })
    }

    #[test]
    fn read_async_case() {
        block_on(async {
            let (writer, reader) = crate::pipe();
            let (_, first) = join!(
                async move {
                    writer.write_async(1).await.unwrap();
                },
                reader.read_async()
            );
            assert_eq!(Some(1), first);

            // every writer is gone by now
            assert_eq!(None, reader.read_async().await);
        })
    }

    #[test]
    fn writer_err_case() {
        block_on(async {
            let (writer, reader) = crate::pipe();
            reader.close().unwrap();

            assert_eq!(Err(PipeError::ClosedPipe), writer.write_async(42).await);
        })
    }

    #[test]
    fn write_after_close_case() {
        block_on(async {
            let (writer, _reader) = crate::pipe();
            writer.close().unwrap();

            assert_eq!(Err(PipeError::WriteAfterClose), writer.write_async(1).await);
            assert_eq!(Err(PipeError::AlreadyClosed(Side::Writer)), writer.close());
        })
    }

    #[cfg(feature = "sync")]
    #[test]
    fn thread_writer_case() {
        let (writer, reader) = crate::pipe();
        for i in 0..10 {
            let writer = writer.clone();
            spawn(move || {
                writer.write(i).unwrap();
            });
        }
        drop(writer);

        block_on(async {
            let mut got = reader.stream().collect::<Vec<_>>().await;
            got.sort_unstable();
            assert_eq!((0..10).collect::<Vec<_>>(), got);
        })
    }

    #[cfg(feature = "sync")]
    #[test]
    fn thread_reader_case() {
        let (writer, reader) = crate::pipe();
        spawn(move || {
            block_on(async {
                for i in 0..10 {
                    writer.write_async(i).await.unwrap();
                }
                writer.close().unwrap();
            })
        });

        assert_eq!((0..10).collect::<Vec<_>>(), reader.read_all().collect::<Vec<_>>());
    }

    #[cfg(feature = "sync")]
    #[test]
    fn write_async_blocks_until_read_case() {
        let (writer, reader) = crate::pipe();
        let handle = spawn(move || block_on(writer.write_async(7)));

        sleep(Duration::from_millis(50));
        assert!(!handle.is_finished());

        assert_eq!(Some(7), reader.read());
        assert_eq!(Ok(()), handle.join().unwrap());
    }

    #[cfg(feature = "sync")]
    #[test]
    fn blocked_write_async_released_by_reader_close_case() {
        let (writer, reader) = crate::pipe();
        let handle = spawn(move || block_on(writer.write_async(7)));

        sleep(Duration::from_millis(50));
        assert!(!handle.is_finished());

        reader.close().unwrap();
        assert_eq!(Err(PipeError::ClosedPipe), handle.join().unwrap());
    }

    #[cfg(feature = "sync")]
    #[test]
    fn pending_stream_released_by_writer_close_case() {
        let (writer, reader) = crate::pipe::<u32>();
        let handle = spawn(move || block_on(reader.stream().collect::<Vec<_>>()));

        sleep(Duration::from_millis(50));
        assert!(!handle.is_finished());

        writer.close().unwrap();
        assert!(handle.join().unwrap().is_empty());
    }

    #[cfg(feature = "sync")]
    #[test]
    fn dropped_read_async_keeps_item_case() {
        let (writer, reader) = crate::pipe();

        let handle = block_on(async {
            let mut reading = Box::pin(reader.read_async());
            assert!(poll!(reading.as_mut()).is_pending());

            let handle = spawn({
                let writer = writer.clone();
                move || writer.write(1)
            });
            sleep(Duration::from_millis(50));
            handle
        });

        assert_eq!(Some(1), reader.read());
        assert_eq!(Ok(()), handle.join().unwrap());
        drop(writer);
    }
}
