//! Cursor arithmetic over a store of `capacity + 1` slots.
//!
//! One slot is never filled. That is what keeps `read == write` meaning
//! "empty" rather than "empty or full", so both cursors always wrap at
//! `capacity + 1`, never at `capacity`. Nothing outside this module should
//! compute a position or a length from raw cursor values.

use std::ops::Range;

/// Snapshot of the read and write positions of a ring buffer.
///
/// Both positions are slot indices in `0..=capacity`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Cursors {
    /// Next slot to read from (the tail).
    pub read: usize,
    /// Next slot to write to (the head).
    pub write: usize,
}

impl Cursors {
    /// Bytes written but not yet read. Always in `0..=capacity`.
    pub(crate) fn available_data(self, capacity: usize) -> usize {
        debug_assert!(self.read <= capacity && self.write <= capacity);
        if self.read <= self.write {
            self.write - self.read
        } else {
            slots(capacity) - self.read + self.write
        }
    }

    /// Bytes that can be written before the buffer is full.
    pub(crate) fn available_space(self, capacity: usize) -> usize {
        capacity - self.available_data(capacity)
    }
}

/// Number of physical slots backing a buffer of `capacity` usable bytes.
///
/// Callers must have checked that `capacity + 1` fits in a `usize`; the
/// constructor refuses capacities where it doesn't.
pub(crate) fn slots(capacity: usize) -> usize {
    capacity + 1
}

/// Moves `pos` forward by `amount` slots, wrapping at `capacity + 1`.
///
/// `amount` never exceeds `capacity`, so at most one wrap happens. Computed
/// without the intermediate `pos + amount` so it cannot overflow.
pub(crate) fn advance(pos: usize, amount: usize, capacity: usize) -> usize {
    debug_assert!(pos <= capacity && amount <= capacity);
    let to_end = slots(capacity) - pos;
    if amount < to_end {
        pos + amount
    } else {
        amount - to_end
    }
}

/// Physical runs covered by `len` logical bytes starting at slot `start`.
///
/// A range that crosses the end of the store is split in two: `first` runs to
/// the end, `second` continues from slot 0. When no wrap happens `second` is
/// empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Span {
    pub(crate) first: Range<usize>,
    pub(crate) second: Range<usize>,
}

impl Span {
    pub(crate) fn new(start: usize, len: usize, capacity: usize) -> Self {
        debug_assert!(start <= capacity && len <= capacity);
        let to_end = slots(capacity) - start;
        if len <= to_end {
            Self {
                first: start..start + len,
                second: 0..0,
            }
        } else {
            Self {
                first: start..slots(capacity),
                second: 0..len - to_end,
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.first.len() + self.second.len()
    }

    pub(crate) fn wraps(&self) -> bool {
        !self.second.is_empty()
    }
}
