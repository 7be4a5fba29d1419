//! Human-readable rendering of a ring buffer's cursors and raw slots.

use std::fmt;

use crate::cursor::Cursors;

/// Point-in-time copy of a ring buffer, for debugging only.
///
/// Rendered with [`Display`](fmt::Display) as
/// `{ length='4' tail='0' head='2' available_data='2' available_space='2' buffer='tail->1 2 head->0 0 0' }`.
/// Every slot is listed, the sentinel included. Slots outside the readable
/// region hold whatever was last written there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dump {
    capacity: usize,
    cursors: Cursors,
    slots: Vec<u8>,
}

impl Dump {
    pub(crate) fn new(capacity: usize, cursors: Cursors, slots: &[u8]) -> Self {
        Self {
            capacity,
            cursors,
            slots: slots.to_vec(),
        }
    }

    /// Cursor positions at capture time.
    pub fn cursors(&self) -> Cursors {
        self.cursors
    }

    /// Raw contents of all `capacity + 1` slots.
    pub fn slots(&self) -> &[u8] {
        &self.slots
    }
}

impl fmt::Display for Dump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ length='{}' tail='{}' head='{}' available_data='{}' available_space='{}' buffer='",
            self.capacity,
            self.cursors.read,
            self.cursors.write,
            self.cursors.available_data(self.capacity),
            self.cursors.available_space(self.capacity),
        )?;
        for (i, byte) in self.slots.iter().enumerate() {
            if i != 0 {
                f.write_str(" ")?;
            }
            if i == self.cursors.read {
                f.write_str("tail->")?;
            }
            if i == self.cursors.write {
                f.write_str("head->")?;
            }
            write!(f, "{byte:x}")?;
        }
        f.write_str("' }")
    }
}
