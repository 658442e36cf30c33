//! Fixed-capacity FIFO ring buffer with drop-oldest overflow.
//!
//! ```
//! use ov_ring::Ring;
//!
//! let mut ring: Ring<i32> = Ring::new(2);
//! assert!(ring.insert(1).is_none());
//! assert!(ring.insert(2).is_none());
//! // Third insert overflows; oldest element (1) is dropped and returned.
//! assert_eq!(ring.insert(3), Some(1));
//! assert_eq!(ring.pop(), Some(2));
//! assert_eq!(ring.pop(), Some(3));
//! ```

use tracing::trace;

/// Running counters over a ring's lifetime, surviving `clear`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RingStats {
    pub inserted: u64,
    pub dropped: u64,
}

/// A fixed-capacity FIFO queue that overwrites its oldest element on
/// overflow instead of rejecting the new one.
///
/// Internally holds `capacity + 1` slots so `read == write` means empty
/// and `(write + 1) % slots.len() == read` means full, without a
/// separate length field (`ov_ringbuffer.c`'s `new_buffer_create`).
pub struct Ring<T> {
    slots: Vec<Option<T>>,
    read: usize,
    write: usize,
    stats: RingStats,
}

impl<T> Ring<T> {
    /// Creates a ring holding up to `capacity` elements. `capacity == 0`
    /// is rounded up to 1, since a zero-slot ring cannot hold the
    /// sentinel empty/full gap slot.
    pub fn new(capacity: usize) -> Self {
        let slot_count = capacity.max(1) + 1;
        Self {
            slots: (0..slot_count).map(|_| None).collect(),
            read: 0,
            write: 0,
            stats: RingStats::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len() - 1
    }

    fn advance(&self, index: usize) -> usize {
        (index + 1) % self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read == self.write
    }

    fn is_full(&self) -> bool {
        self.advance(self.write) == self.read
    }

    pub fn len(&self) -> usize {
        if self.write >= self.read {
            self.write - self.read
        } else {
            self.slots.len() - self.read + self.write
        }
    }

    pub fn stats(&self) -> RingStats {
        self.stats
    }

    /// Inserts `value`. Returns `None` on success, or the oldest element
    /// (now dropped to make room) if the ring was already full.
    pub fn insert(&mut self, value: T) -> Option<T> {
        let dropped = if self.is_full() {
            let oldest = self.slots[self.read].take();
            self.read = self.advance(self.read);
            self.stats.dropped += 1;
            trace!("ring full, dropping oldest element");
            oldest
        } else {
            None
        };
        self.slots[self.write] = Some(value);
        self.write = self.advance(self.write);
        self.stats.inserted += 1;
        dropped
    }

    /// Removes and returns the oldest element, if any.
    pub fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let value = self.slots[self.read].take();
        self.read = self.advance(self.read);
        value
    }

    /// Discards every held element, preserving lifetime `stats`.
    pub fn clear(&mut self) {
        while self.pop().is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order_is_preserved() {
        let mut ring = Ring::new(3);
        ring.insert(1);
        ring.insert(2);
        ring.insert(3);
        assert_eq!(ring.pop(), Some(1));
        assert_eq!(ring.pop(), Some(2));
        assert_eq!(ring.pop(), Some(3));
        assert_eq!(ring.pop(), None);
    }

    #[test]
    fn overflow_drops_oldest() {
        let mut ring = Ring::new(2);
        ring.insert('a');
        ring.insert('b');
        assert_eq!(ring.insert('c'), Some('a'));
        assert_eq!(ring.pop(), Some('b'));
        assert_eq!(ring.pop(), Some('c'));
    }

    #[test]
    fn stats_track_inserts_and_drops() {
        let mut ring = Ring::new(1);
        ring.insert(1);
        ring.insert(2);
        ring.insert(3);
        let stats = ring.stats();
        assert_eq!(stats.inserted, 3);
        assert_eq!(stats.dropped, 2);
    }

    #[test]
    fn clear_empties_but_keeps_stats() {
        let mut ring = Ring::new(2);
        ring.insert(1);
        ring.insert(2);
        ring.clear();
        assert!(ring.is_empty());
        assert_eq!(ring.stats().inserted, 2);
    }

    #[test]
    fn len_tracks_wraparound() {
        let mut ring = Ring::new(2);
        ring.insert(1);
        ring.insert(2);
        ring.pop();
        ring.insert(3);
        assert_eq!(ring.len(), 2);
    }

    proptest::proptest! {
        #[test]
        fn len_never_exceeds_capacity(ops in proptest::collection::vec(proptest::bool::ANY, 0..200)) {
            let mut ring: Ring<u32> = Ring::new(4);
            let mut next = 0u32;
            for insert in ops {
                if insert {
                    ring.insert(next);
                    next += 1;
                } else {
                    ring.pop();
                }
                proptest::prop_assert!(ring.len() <= ring.capacity());
            }
        }
    }
}
