use thiserror::Error;

/// Why a ring buffer could not be created.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateError {
    /// `capacity + 1` slots do not fit in a `usize`.
    #[error("capacity {capacity} leaves no room for the sentinel slot")]
    CapacityOverflow {
        /// Requested usable capacity.
        capacity: usize,
    },

    /// The backing store could not be allocated.
    #[error("failed to allocate backing store for capacity {capacity}")]
    AllocationFailed {
        /// Requested usable capacity.
        capacity: usize,
    },
}

/// A refused write. Nothing was copied and the cursors did not move.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteError {
    /// The whole request does not fit in the free space. Drain with a read and
    /// retry.
    #[error("not enough space: {requested} bytes requested, {available} available")]
    NotEnoughSpace {
        /// Bytes the caller tried to write.
        requested: usize,
        /// Free space at the time of the attempt.
        available: usize,
    },
}

/// Teardown was reached with the buffer's guard poisoned.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyError {
    /// A thread panicked while holding the buffer's lock.
    #[error("ring buffer lock was poisoned by a panicking holder")]
    LockPoisoned,
}
