/// Requests at or beyond this size always fail; mirrors the original's
/// `>= SIZE_MAX` guard at the practical allocation ceiling Rust enforces.
const OVERSIZE_LIMIT: usize = isize::MAX as usize;

/// Owned, resizable octet sequence.
///
/// `capacity() == 0` is the "view" state: an empty buffer that has never
/// allocated and therefore skips the cache on drop. Everywhere the
/// original C type used a non-owning view over externally-owned memory,
/// this port uses a plain `&[u8]` slice instead — Rust's borrow checker
/// already gives the non-owning, zero-copy guarantee the C code had to
/// hand-roll (see `ov_chunker::preview`, which returns `&[u8]` directly).
pub struct Buffer {
    storage: Box<[u8]>,
    length: usize,
}

impl Buffer {
    /// Creates a buffer with at least `min_capacity` bytes of storage.
    /// `min_capacity == 0` returns a non-allocating, cache-exempt buffer.
    pub fn create(min_capacity: usize) -> Self {
        if min_capacity == 0 {
            return Self {
                storage: Box::new([]),
                length: 0,
            };
        }
        let mut storage = crate::cache::take().unwrap_or_default();
        if storage.len() < min_capacity {
            storage = vec![0u8; min_capacity].into_boxed_slice();
        }
        Self { storage, length: 0 }
    }

    /// Creates a buffer holding `string`'s bytes, with a terminating zero
    /// byte placed one past `length` (C-string usable, excluded from
    /// `length`/`data()`).
    pub fn from_string(string: &str) -> Self {
        let bytes = string.as_bytes();
        let mut buffer = Self::create(bytes.len() + 1);
        buffer.set(bytes);
        buffer
    }

    /// Creates one zero-terminated buffer from the concatenation of
    /// `parts`, in order.
    pub fn from_str_list(parts: &[&str]) -> Self {
        let total: usize = parts.iter().map(|p| p.len()).sum();
        let mut buffer = Self::create(total + 1);
        for part in parts {
            buffer.push(part.as_bytes());
        }
        buffer
    }

    fn ensure_capacity_at_least(&mut self, needed: usize) -> bool {
        if needed >= OVERSIZE_LIMIT {
            return false;
        }
        if self.storage.len() >= needed {
            return true;
        }
        let new_capacity = needed.max(self.storage.len().saturating_mul(2)).max(1);
        let mut new_storage = vec![0u8; new_capacity].into_boxed_slice();
        new_storage[..self.length].copy_from_slice(&self.storage[..self.length]);
        self.storage = new_storage;
        true
    }

    /// Copies `data` to the buffer start, growing capacity if needed.
    /// Leaves the buffer unchanged if `data` is oversized.
    pub fn set(&mut self, data: &[u8]) -> bool {
        if data.len() >= OVERSIZE_LIMIT {
            return false;
        }
        if !self.ensure_capacity_at_least(data.len()) {
            return false;
        }
        self.storage[..data.len()].copy_from_slice(data);
        self.length = data.len();
        true
    }

    /// Appends `data` after `length`, growing capacity amortized (at
    /// least doubling) if needed.
    pub fn push(&mut self, data: &[u8]) -> bool {
        let Some(new_length) = self.length.checked_add(data.len()) else {
            return false;
        };
        if !self.ensure_capacity_at_least(new_length) {
            return false;
        }
        self.storage[self.length..new_length].copy_from_slice(data);
        self.length = new_length;
        true
    }

    /// Grows capacity by exactly `add_bytes`, independent of how much
    /// headroom is already free. Fails (no-op) if `add_bytes == 0`.
    pub fn extend(&mut self, add_bytes: usize) -> bool {
        if add_bytes == 0 {
            return false;
        }
        let Some(new_capacity) = self.storage.len().checked_add(add_bytes) else {
            return false;
        };
        if new_capacity >= OVERSIZE_LIMIT {
            return false;
        }
        let mut new_storage = vec![0u8; new_capacity].into_boxed_slice();
        new_storage[..self.length].copy_from_slice(&self.storage[..self.length]);
        self.storage = new_storage;
        true
    }

    /// Removes the first `n` octets, moving the remainder to the start.
    /// `n == length` clears the buffer; `n > length` fails.
    pub fn shift(&mut self, n: usize) -> bool {
        if n > self.length {
            return false;
        }
        if n == self.length {
            return self.clear();
        }
        if n == 0 {
            return true;
        }
        self.storage.copy_within(n..self.length, 0);
        self.length -= n;
        true
    }

    /// Appends `other`'s content to `self` in place. No new buffer is
    /// allocated beyond whatever growth `push` requires.
    pub fn concat(&mut self, other: &Buffer) -> bool {
        self.push(other.data())
    }

    /// Zeroes storage and resets `length` to zero. Capacity is retained.
    pub fn clear(&mut self) -> bool {
        self.storage.fill(0);
        self.length = 0;
        true
    }

    /// Compares buffer content against `other`, ignoring any hidden
    /// trailing NUL from [`Buffer::from_string`].
    pub fn equals_str(&self, other: &str) -> bool {
        self.data() == other.as_bytes()
    }

    pub fn data(&self) -> &[u8] {
        &self.storage[..self.length]
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.storage[..self.length]
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn capacity(&self) -> usize {
        self.storage.len()
    }
}

impl Clone for Buffer {
    fn clone(&self) -> Self {
        let mut copy = Buffer::create(self.length);
        copy.set(self.data());
        copy
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if self.storage.is_empty() {
            return;
        }
        self.storage.fill(0);
        let storage = std::mem::take(&mut self.storage);
        // Returned to the process-wide cache if there's room; dropped
        // (deallocated) otherwise via `Option`'s own `Drop`.
        crate::cache::give_back(storage);
    }
}
