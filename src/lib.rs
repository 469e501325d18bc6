//! Directory-based multi-process FIFO queue.
//!
//! A library (no server process) that lets unrelated processes add, browse,
//! lock, retrieve and remove opaque byte strings using only a shared
//! filesystem as the coordination medium. Elements are stored one per file
//! under time-bucketed intermediate directories; writes are made atomic by
//! staging under a `.tmp` name and publishing via hardlink, and consumers
//! claim elements through advisory `.lck` hardlinks. Ordering is best-effort
//! FIFO: names derive from a high-resolution timestamp, so elements come out
//! in insertion order with high probability, but exact arrival order is not
//! guaranteed under concurrent writers.
//!
//! ```no_run
//! use dirqueue::{DirQueue, Queue};
//!
//! # fn main() -> dirqueue::Result<()> {
//! let queue = DirQueue::open("/var/spool/events")?;
//! queue.add(b"hello")?;
//!
//! for name in queue.iter()? {
//!     if !queue.lock(&name)? {
//!         continue; // claimed by another consumer
//!     }
//!     let data = queue.get(&name)?;
//!     println!("{}: {} bytes", name, data.len());
//!     queue.remove(&name)?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The on-disk layout is shared with the Perl, Python and Java
//! implementations of the same queue format, so producers and consumers can
//! be written in different languages.

pub mod clock;
pub mod dir_queue;
pub mod error;
mod fsutil;
pub mod iter;
pub mod name;
pub mod null_queue;
pub mod queue;

pub use clock::{Clock, QuantaClock, SystemClock};
pub use dir_queue::{DirQueue, QueueOptions};
pub use error::{Error, Result};
pub use iter::QueueIter;
pub use null_queue::NullQueue;
pub use queue::{Queue, DEFAULT_MAX_LOCK, DEFAULT_MAX_TEMP};
