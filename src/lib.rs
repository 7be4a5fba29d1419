//! # cbuf - Circular Byte Buffer
//!
//! A fixed-capacity byte ring buffer used as a bounded staging area between
//! producers and consumers of a byte stream.
//!
//! ## Design
//!
//! - Backing store of `capacity + 1` bytes; the spare slot tells "full" from
//!   "empty" without a separate counter
//! - One mutex per buffer guards the store and both cursors, so any number of
//!   threads may read and write concurrently
//! - Writes are all-or-nothing: a write that does not fit is refused whole
//! - Reads are best-effort: they return whatever is available, up to the
//!   requested amount
//! - Nothing waits for space or data; producers and consumers poll and retry
//!
//! ## Example
//!
//! ```
//! use cbuf::{RingBuffer, WriteError};
//!
//! let rb = RingBuffer::new(8).unwrap();
//!
//! // Producer: the whole slice goes in or nothing does
//! assert_eq!(rb.write(b"hello"), Ok(5));
//! assert!(matches!(rb.write(b"world"), Err(WriteError::NotEnoughSpace { .. })));
//!
//! // Consumer: asking for more than is there is fine
//! let mut out = [0u8; 16];
//! let n = rb.read(&mut out);
//! assert_eq!(&out[..n], b"hello");
//! assert!(rb.is_empty());
//! ```

#![warn(missing_docs)]

mod cursor;
mod dump;
mod error;
mod ring_buffer;

pub use cursor::Cursors;
pub use dump::Dump;
pub use error::{CreateError, DestroyError, WriteError};
pub use ring_buffer::RingBuffer;
