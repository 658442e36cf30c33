//! Byte-stream reassembler: accumulate arbitrarily-sized writes, read
//! back fixed-size chunks on demand.
//!
//! ```
//! use ov_chunker::Chunker;
//!
//! let mut chunker = Chunker::new();
//! chunker.add(b"hello ");
//! chunker.add(b"world");
//! let chunk = chunker.next_chunk(5).unwrap();
//! assert_eq!(chunk.data(), b"hello");
//! let rest = chunker.remainder();
//! assert_eq!(rest.data(), b" world");
//! ```

use ov_buffer::Buffer;
use tracing::trace;

/// Accumulates byte slices and serves them back as fixed-size chunks,
/// independent of how the input was originally segmented.
///
/// Internally a single [`Buffer`] plus a read cursor (`read_offset`)
/// into it, mirroring `ov_chunker.c`'s `buffer`/`read_ptr` pair. `add`
/// and `next_chunk`/`preview` can be freely interleaved.
pub struct Chunker {
    buffer: Buffer,
    read_offset: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new()
    }
}

impl Chunker {
    pub fn new() -> Self {
        Self {
            buffer: Buffer::create(1),
            read_offset: 0,
        }
    }

    /// Octets available to read right now (written minus already read).
    pub fn available(&self) -> usize {
        self.buffer.len() - self.read_offset
    }

    /// Appends `data` to the tail of the accumulator.
    ///
    /// If the backing buffer has tail slack, appends in place. Otherwise
    /// reassembles: copies the still-unread tail plus `data` into a
    /// fresh buffer, because defragmenting in place would require a
    /// copy anyway (`ov_chunker.c`'s `ov_chunker_add` comment) — so the
    /// copy target is allocated straight away instead of shuffling
    /// bytes first. The new capacity over-allocates to `unread + 3 *
    /// data.len()` whenever the exact requirement would not fit the
    /// current capacity, absorbing a run of further same-sized appends
    /// without repeating the reassembly on every one of them.
    pub fn add(&mut self, data: &[u8]) -> bool {
        if data.is_empty() {
            return true;
        }
        if self.buffer.capacity() - self.buffer.len() > data.len() {
            return self.buffer.push(data);
        }
        trace!(len = data.len(), "chunker defragmenting to fit append");
        self.defragment_and_merge(data)
    }

    fn defragment_and_merge(&mut self, data: &[u8]) -> bool {
        let unread = self.available();
        let required = unread + data.len();
        let new_capacity = if required > self.buffer.capacity() {
            unread + 3 * data.len()
        } else {
            required
        };
        let mut merged = Buffer::create(new_capacity);
        let tail_start = self.read_offset;
        let tail_end = self.buffer.len();
        if !merged.set(&self.buffer.data()[tail_start..tail_end]) {
            return false;
        }
        if !merged.push(data) {
            return false;
        }
        self.buffer = merged;
        self.read_offset = 0;
        true
    }

    /// Borrows the next `num_octets` without consuming them. Returns
    /// `None` if fewer than `num_octets` are available, or if
    /// `num_octets == 0`.
    pub fn preview(&self, num_octets: usize) -> Option<&[u8]> {
        if num_octets == 0 || num_octets > self.available() {
            return None;
        }
        Some(&self.buffer.data()[self.read_offset..self.read_offset + num_octets])
    }

    /// Copies the next `num_octets` into `dest` and advances the read
    /// cursor past them. Fails (no-op) if fewer than `num_octets` are
    /// available.
    pub fn next_chunk_raw(&mut self, num_octets: usize, dest: &mut [u8]) -> bool {
        let Some(chunk) = self.preview(num_octets) else {
            return false;
        };
        dest[..num_octets].copy_from_slice(chunk);
        self.read_offset += num_octets;
        true
    }

    /// Removes and returns the next `num_octets` as an owned [`Buffer`].
    /// Returns `None` if fewer than `num_octets` are available.
    pub fn next_chunk(&mut self, num_octets: usize) -> Option<Buffer> {
        if num_octets == 0 {
            return None;
        }
        let mut out = Buffer::create(num_octets);
        let chunk = self.preview(num_octets)?;
        out.set(chunk);
        self.read_offset += num_octets;
        Some(out)
    }

    /// Removes and returns everything currently available, however much
    /// that is (possibly zero bytes).
    pub fn remainder(&mut self) -> Buffer {
        let available = self.available();
        if available == 0 {
            return Buffer::create(0);
        }
        self.next_chunk(available)
            .unwrap_or_else(|| Buffer::create(0))
    }

    /// The buffer cache capacity this component needs: 1, since a
    /// chunker holds at most one live buffer at a time
    /// (`ov_chunker_enable_caching`'s rationale).
    pub fn recommended_cache_size() -> usize {
        1
    }

    /// Registers the chunker's buffer usage with the process-wide
    /// buffer cache.
    pub fn enable_caching() -> Result<(), ov_cache::CacheError> {
        ov_buffer::enable_caching(Self::recommended_cache_size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_preview_without_consuming() {
        let mut chunker = Chunker::new();
        chunker.add(b"abcdef");
        assert_eq!(chunker.preview(3), Some(&b"abc"[..]));
        assert_eq!(chunker.available(), 6);
    }

    #[test]
    fn preview_past_available_returns_none() {
        let mut chunker = Chunker::new();
        chunker.add(b"ab");
        assert_eq!(chunker.preview(3), None);
    }

    #[test]
    fn next_chunk_consumes_and_advances() {
        let mut chunker = Chunker::new();
        chunker.add(b"abcdef");
        let chunk = chunker.next_chunk(2).unwrap();
        assert_eq!(chunk.data(), b"ab");
        assert_eq!(chunker.available(), 4);
    }

    #[test]
    fn remainder_drains_everything_left() {
        let mut chunker = Chunker::new();
        chunker.add(b"abcdef");
        chunker.next_chunk(2);
        let rest = chunker.remainder();
        assert_eq!(rest.data(), b"cdef");
        assert_eq!(chunker.available(), 0);
    }

    #[test]
    fn interleaved_add_and_next_chunk_preserve_order() {
        let mut chunker = Chunker::new();
        chunker.add(b"1234");
        assert_eq!(chunker.next_chunk(2).unwrap().data(), b"12");
        chunker.add(b"5678");
        assert_eq!(chunker.next_chunk(4).unwrap().data(), b"3456");
        assert_eq!(chunker.remainder().data(), b"78");
    }

    #[test]
    fn many_small_appends_trigger_defragmentation() {
        let mut chunker = Chunker::new();
        for _ in 0..100 {
            chunker.add(b"x");
        }
        assert_eq!(chunker.available(), 100);
        let all = chunker.remainder();
        assert_eq!(all.data(), vec![b'x'; 100]);
    }

    proptest::proptest! {
        #[test]
        fn chunk_reconstruction_matches_input(pieces in proptest::collection::vec(proptest::collection::vec(proptest::any::<u8>(), 0..20), 0..20)) {
            let mut chunker = Chunker::new();
            let mut expected = Vec::new();
            for piece in &pieces {
                chunker.add(piece);
                expected.extend_from_slice(piece);
            }
            let out = chunker.remainder();
            proptest::prop_assert_eq!(out.data(), &expected[..]);
        }
    }
}
