//! # Rendezvous pipe
//! A synchronous in-memory pipe that streams typed values from a writer side to a single
//! reader side. There is no buffer: every write is handed directly to a waiting read.
//!
//! Either side can end the stream. Closing the writer lets the reader drain and stop,
//! closing the reader makes every pending and future write return
//! [`PipeError::ClosedPipe`].
//!
//! Single thread usage example. Handing a value over needs a second thread or task, since a
//! write and a read on the same thread wait for each other forever; the close protocol
//! works from one thread:
//! ```rust
//! use rendezvous_pipe::{pipe, PipeError};
//!
//! let (writer, reader) = pipe::<&str>();
//! writer.close().unwrap();
//! assert_eq!(None, reader.read_all().next());
//!
//! reader.close().unwrap();
//! assert_eq!(Err(PipeError::WriteAfterClose), writer.write("late"));
//! ```
//!
//! Multi thread usage example:
//! ```rust
//! use std::thread::spawn;
//! use rendezvous_pipe::pipe;
//!
//! let (writer, reader) = pipe();
//! spawn(move || {
//!     for row in ["a", "b", "c"] {
//!         writer.write(row).unwrap();
//!     }
//!     writer.close().unwrap();
//! });
//!
//! assert_eq!(vec!["a", "b", "c"], reader.read_all().collect::<Vec<_>>());
//! ```
//!
//! Stopping a producer early:
//! ```rust
//! use std::thread::spawn;
//! use rendezvous_pipe::{pipe, PipeError};
//!
//! let (writer, reader) = pipe();
//! let producer = spawn(move || {
//!     let mut i = 0;
//!     loop {
//!         match writer.write(i) {
//!             Ok(()) => i += 1,
//!             Err(PipeError::ClosedPipe) => return i,
//!             Err(e) => panic!("{e}"),
//!         }
//!     }
//! });
//!
//! assert_eq!(vec![0, 1, 2], reader.read_all().take(3).collect::<Vec<_>>());
//! reader.close().unwrap();
//! assert_eq!(3, producer.join().unwrap());
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

mod error;
mod state;
mod sync_pipe;

#[cfg(feature = "async")]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
mod async_pipe;

pub use error::{PipeError, Side};
pub use sync_pipe::{pipe, Reader, Writer};

#[cfg(feature = "sync")]
pub use sync_pipe::{IntoReadAll, ReadAll};

#[cfg(feature = "async")]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
pub use async_pipe::ReadStream;
