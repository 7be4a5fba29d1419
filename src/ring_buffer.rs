use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace, warn};

use crate::cursor::{self, Cursors, Span};
use crate::dump::Dump;
use crate::error::{CreateError, DestroyError, WriteError};

/// Storage and cursors, only ever touched through the buffer's lock.
struct State {
    /// `capacity + 1` slots; one is always left unfilled
    storage: Vec<u8>,
    cursors: Cursors,
}

/// Fixed-capacity byte ring buffer
///
/// - Any number of producers and consumers, serialized by one mutex
/// - Writes are all-or-nothing, reads are best-effort
/// - Never blocks beyond acquiring the lock: a full buffer refuses writes and
///   an empty one returns zero bytes, callers poll and retry
pub struct RingBuffer {
    capacity: usize,
    state: Mutex<State>,
}

impl RingBuffer {
    /// Create an empty ring buffer holding up to `capacity` bytes
    ///
    /// The backing store is zero-filled and one byte larger than `capacity`.
    ///
    /// # Returns
    /// * `Ok(RingBuffer)` on success
    /// * `Err(CreateError)` if the store cannot be sized or allocated; nothing
    ///   stays allocated in that case
    pub fn new(capacity: usize) -> Result<Self, CreateError> {
        let slots = capacity
            .checked_add(1)
            .ok_or(CreateError::CapacityOverflow { capacity })?;

        let mut storage = Vec::new();
        storage
            .try_reserve_exact(slots)
            .map_err(|_| CreateError::AllocationFailed { capacity })?;
        storage.resize(slots, 0);

        trace!(capacity, "created ring buffer");

        Ok(RingBuffer {
            capacity,
            state: Mutex::new(State {
                storage,
                cursors: Cursors::default(),
            }),
        })
    }

    /// Tear the buffer down
    ///
    /// Taking `self` by value means no other thread can be inside an
    /// operation; a buffer shared through an `Arc` has to be reclaimed first
    /// (e.g. with `Arc::try_unwrap`). Storage is released in every case.
    ///
    /// # Returns
    /// * `Err(DestroyError::LockPoisoned)` if a thread panicked while holding
    ///   the lock
    pub fn destroy(self) -> Result<(), DestroyError> {
        let capacity = self.capacity;
        let result = match self.state.into_inner() {
            Ok(_state) => Ok(()),
            Err(_) => {
                warn!(capacity, "destroying ring buffer with poisoned lock");
                Err(DestroyError::LockPoisoned)
            }
        };
        trace!(capacity, "destroyed ring buffer");
        result
    }

    /// Usable capacity in bytes
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes currently held and not yet read
    pub fn available_data(&self) -> usize {
        self.observe().cursors.available_data(self.capacity)
    }

    /// Bytes that can be written before the buffer is full
    pub fn available_space(&self) -> usize {
        self.observe().cursors.available_space(self.capacity)
    }

    /// `true` when no more bytes can be written
    pub fn is_full(&self) -> bool {
        self.available_space() == 0
    }

    /// `true` when there is nothing to read
    pub fn is_empty(&self) -> bool {
        self.available_data() == 0
    }

    /// Both cursors, observed together
    pub fn cursors(&self) -> Cursors {
        self.observe().cursors
    }

    /// Copy all of `src` into the buffer
    ///
    /// Either every byte is written or none is. An empty `src` is a no-op.
    ///
    /// # Returns
    /// * `Ok(n)` with `n == src.len()` on success (`Ok(0)` if the lock is
    ///   poisoned and nothing was written)
    /// * `Err(WriteError::NotEnoughSpace)` if `src` does not fit in the free
    ///   space; the buffer is left untouched
    pub fn write(&self, src: &[u8]) -> Result<usize, WriteError> {
        let Some(mut guard) = self.lock("write") else {
            return Ok(0);
        };
        let state = &mut *guard;
        let amount = src.len();

        let available = state.cursors.available_space(self.capacity);
        if amount > available {
            debug!(requested = amount, available, "not enough space");
            return Err(WriteError::NotEnoughSpace {
                requested: amount,
                available,
            });
        }
        if amount == 0 {
            return Ok(0);
        }

        let span = Span::new(state.cursors.write, amount, self.capacity);
        debug_assert_eq!(span.len(), amount);
        let wrapped = span.wraps();
        let (head, tail) = src.split_at(span.first.len());
        state.storage[span.first].copy_from_slice(head);
        state.storage[span.second].copy_from_slice(tail);

        state.cursors.write = cursor::advance(state.cursors.write, amount, self.capacity);
        trace!(amount, wrapped, "wrote bytes");
        Ok(amount)
    }

    /// Copy up to `dst.len()` bytes out of the buffer
    ///
    /// Asking for more than is available is not an error: whatever is
    /// available is copied into the front of `dst`.
    ///
    /// # Returns
    /// Number of bytes copied, `0` if the buffer is empty, `dst` is empty or
    /// the lock is poisoned
    pub fn read(&self, dst: &mut [u8]) -> usize {
        let Some(mut guard) = self.lock("read") else {
            return 0;
        };
        let state = &mut *guard;

        let amount = dst.len().min(state.cursors.available_data(self.capacity));
        if amount == 0 {
            return 0;
        }

        let span = Span::new(state.cursors.read, amount, self.capacity);
        debug_assert_eq!(span.len(), amount);
        let wrapped = span.wraps();
        let (head, tail) = dst[..amount].split_at_mut(span.first.len());
        head.copy_from_slice(&state.storage[span.first]);
        tail.copy_from_slice(&state.storage[span.second]);

        state.cursors.read = cursor::advance(state.cursors.read, amount, self.capacity);
        trace!(amount, wrapped, "read bytes");
        amount
    }

    /// Read one byte, `None` if the buffer is empty
    pub fn read_single(&self) -> Option<u8> {
        let mut byte = [0u8; 1];
        (self.read(&mut byte) == 1).then_some(byte[0])
    }

    /// Drop all unread bytes
    ///
    /// Only the cursors are reset; the old bytes stay in the store as
    /// unreachable garbage.
    pub fn clear(&self) {
        if let Some(mut state) = self.lock("clear") {
            state.cursors = Cursors::default();
            trace!(capacity = self.capacity, "cleared ring buffer");
        }
    }

    /// Snapshot of the cursors and raw slots for debugging
    pub fn dump(&self) -> Dump {
        let state = self.observe();
        Dump::new(self.capacity, state.cursors, &state.storage)
    }

    /// Lock for a mutating operation, `None` if a previous holder panicked
    fn lock(&self, op: &'static str) -> Option<MutexGuard<'_, State>> {
        match self.state.lock() {
            Ok(guard) => Some(guard),
            Err(_) => {
                warn!(op, "ring buffer lock poisoned, operation skipped");
                None
            }
        }
    }

    /// Lock for observation; cursors are only moved after a copy completes,
    /// so the state behind a poisoned lock is still consistent
    fn observe(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for RingBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity)
            .field("cursors", &self.cursors())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn incrementing(capacity: usize) -> RingBuffer {
        let rb = RingBuffer::new(capacity).unwrap();
        let data: Vec<u8> = (0..capacity as u8).collect();
        assert_eq!(rb.write(&data), Ok(capacity));
        rb
    }

    #[test]
    fn test_create_ring_buffer() {
        let rb = RingBuffer::new(16).unwrap();
        assert_eq!(rb.capacity(), 16);
        assert_eq!(rb.available_data(), 0);
        assert_eq!(rb.available_space(), 16);
        assert!(rb.is_empty());
        assert!(!rb.is_full());
        assert_eq!(rb.cursors(), Cursors::default());
        assert_eq!(rb.dump().slots(), &[0u8; 17][..]);
    }

    #[test]
    fn test_create_with_zero_capacity() {
        let rb = RingBuffer::new(0).unwrap();
        assert!(rb.is_empty());
        assert!(rb.is_full());
        assert_eq!(rb.write(&[]), Ok(0));
        assert_eq!(
            rb.write(&[1]),
            Err(WriteError::NotEnoughSpace {
                requested: 1,
                available: 0
            })
        );
    }

    #[test]
    fn test_create_capacity_overflow() {
        let result = RingBuffer::new(usize::MAX);
        assert_eq!(
            result.unwrap_err(),
            CreateError::CapacityOverflow {
                capacity: usize::MAX
            }
        );
    }

    #[test]
    fn test_create_allocation_failure() {
        // larger than any allocation can be
        let result = RingBuffer::new(usize::MAX - 1);
        assert_eq!(
            result.unwrap_err(),
            CreateError::AllocationFailed {
                capacity: usize::MAX - 1
            }
        );
    }

    #[test]
    fn test_single_threaded_roundtrip() {
        let rb = RingBuffer::new(16).unwrap();
        let data = b"Hello, world!";
        assert_eq!(rb.write(data), Ok(data.len()));
        assert_eq!(rb.available_data(), data.len());

        let mut out = [0u8; 16];
        assert_eq!(rb.read(&mut out), data.len());
        assert_eq!(&out[..data.len()], data);

        // Buffer should be empty now
        assert!(rb.is_empty());
        assert_eq!(rb.read(&mut out), 0);
    }

    #[test]
    fn test_not_enough_space() {
        let rb = RingBuffer::new(8).unwrap();
        assert_eq!(rb.write(b"12345"), Ok(5));

        let result = rb.write(b"6789");
        assert_eq!(
            result,
            Err(WriteError::NotEnoughSpace {
                requested: 4,
                available: 3
            })
        );
        assert_eq!(rb.available_data(), 5);
        assert_eq!(rb.cursors().write, 5);

        // Read to free space, then it fits
        let mut out = [0u8; 1];
        assert_eq!(rb.read(&mut out), 1);
        assert_eq!(rb.write(b"6789"), Ok(4));
        assert!(rb.is_full());
    }

    #[test]
    fn test_refused_write_leaves_store_untouched() {
        let rb = RingBuffer::new(10).unwrap();
        let data = [0xffu8; 11];
        assert!(rb.write(&data).is_err());
        assert_eq!(rb.dump().slots(), &[0u8; 11][..]);
    }

    #[test]
    fn test_write_lands_at_start_of_store() {
        let rb = incrementing(10);
        let dump = rb.dump();
        assert_eq!(&dump.slots()[..10], &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        assert_eq!(dump.cursors(), Cursors { read: 0, write: 10 });
    }

    #[test]
    fn test_read_single() {
        let rb = RingBuffer::new(4).unwrap();
        assert_eq!(rb.read_single(), None);
        rb.write(&[7, 8]).unwrap();
        assert_eq!(rb.read_single(), Some(7));
        assert_eq!(rb.read_single(), Some(8));
        assert_eq!(rb.read_single(), None);
    }

    #[test]
    fn test_read_into_empty_destination() {
        let rb = incrementing(4);
        assert_eq!(rb.read(&mut []), 0);
        assert_eq!(rb.available_data(), 4);
    }

    #[test]
    fn test_clear_keeps_store_contents() {
        let rb = incrementing(4);
        rb.clear();
        assert!(rb.is_empty());
        assert_eq!(rb.available_space(), 4);
        assert_eq!(rb.cursors(), Cursors::default());
        assert_eq!(&rb.dump().slots()[..4], &[0, 1, 2, 3]);
    }

    #[test]
    fn test_destroy() {
        let rb = incrementing(8);
        assert_eq!(rb.destroy(), Ok(()));
    }

    #[test]
    fn test_destroy_shared_buffer_after_reclaiming() {
        let rb = Arc::new(incrementing(8));
        let reader = {
            let rb = Arc::clone(&rb);
            thread::spawn(move || {
                let mut out = [0u8; 8];
                rb.read(&mut out)
            })
        };
        assert_eq!(reader.join().unwrap(), 8);

        let rb = Arc::try_unwrap(rb).unwrap();
        assert_eq!(rb.destroy(), Ok(()));
    }

    #[test]
    fn test_poisoned_lock() {
        let rb = Arc::new(incrementing(4));
        let poisoner = {
            let rb = Arc::clone(&rb);
            thread::spawn(move || {
                let _guard = rb.state.lock().unwrap();
                panic!("poison the lock");
            })
        };
        assert!(poisoner.join().is_err());

        // mutators refuse, observers still see the last consistent state
        let mut out = [0u8; 4];
        assert_eq!(rb.read(&mut out), 0);
        assert_eq!(rb.write(&[1]), Ok(0));
        rb.clear();
        assert_eq!(rb.available_data(), 4);
        assert!(rb.is_full());

        let rb = Arc::try_unwrap(rb).unwrap();
        assert_eq!(rb.destroy(), Err(DestroyError::LockPoisoned));
    }

    #[test]
    fn test_debug_shows_cursors_not_contents() {
        let rb = incrementing(3);
        let rendered = format!("{rb:?}");
        assert_eq!(
            rendered,
            "RingBuffer { capacity: 3, cursors: Cursors { read: 0, write: 3 } }"
        );
    }

    #[test]
    fn test_multi_producer_single_consumer() {
        let rb = Arc::new(RingBuffer::new(64).unwrap());
        let num_producers = 4;
        let chunks_per_producer = 50;
        let chunk = 8;

        let mut handles = vec![];
        for i in 0..num_producers {
            let rb = Arc::clone(&rb);
            handles.push(thread::spawn(move || {
                let data = [i as u8; 8];
                for _ in 0..chunks_per_producer {
                    while rb.write(&data).is_err() {
                        thread::yield_now();
                    }
                }
            }));
        }

        // every chunk is written whole, so 8-byte reads never mix producers
        let mut counts = [0usize; 4];
        let mut out = [0u8; 8];
        let expected_total = num_producers * chunks_per_producer;
        let mut total = 0;
        while total < expected_total {
            if rb.available_data() < chunk {
                thread::yield_now();
                continue;
            }
            assert_eq!(rb.read(&mut out), chunk);
            assert!(out.iter().all(|b| *b == out[0]), "torn chunk: {out:?}");
            counts[out[0] as usize] += 1;
            total += 1;
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counts, [chunks_per_producer; 4]);
        assert!(rb.is_empty());
    }
}
