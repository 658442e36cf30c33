use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::OnceLock;

use crate::registry::ErasedCache;

/// A named, bounded free-list of homogeneous objects `T`.
///
/// Meant to be declared as a `static`: the owning component holds the
/// pointer directly so the hot `get`/`put` path never pays a hashtable
/// lookup. Concurrent access is mediated by a single [`AtomicBool`]
/// test-and-set guard — contention is resolved by falling back to a
/// cache miss (`get` returns `None`, `put` hands the object back),
/// never by blocking.
pub struct Cache<T> {
    name: &'static str,
    busy: AtomicBool,
    capacity: AtomicUsize,
    len: AtomicUsize,
    slots: UnsafeCell<Vec<Option<T>>>,
    disposer: fn(T),
    checker: OnceLock<fn(&T) -> bool>,
}

// Safety: all mutable access to `slots` happens while `busy` is held,
// which serializes access the same way a spinlock would; `len` is an
// atomic and may be read outside the guard (see `in_use`).
unsafe impl<T: Send> Sync for Cache<T> {}

struct Guard<'a, T> {
    cache: &'a Cache<T>,
}

impl<'a, T> Drop for Guard<'a, T> {
    fn drop(&mut self) {
        self.cache.busy.store(false, Ordering::Release);
    }
}

impl<T> Cache<T> {
    /// Creates an (initially empty, zero-capacity) named cache.
    ///
    /// `disposer` is called on every slot's contents when the cache is
    /// torn down via [`crate::Registry::free_all`] or when `put` is
    /// called on a cache that is already full.
    pub const fn new(name: &'static str, disposer: fn(T)) -> Self {
        Self {
            name,
            busy: AtomicBool::new(false),
            capacity: AtomicUsize::new(0),
            len: AtomicUsize::new(0),
            slots: UnsafeCell::new(Vec::new()),
            disposer,
            checker: OnceLock::new(),
        }
    }

    /// Installs a predicate validating objects passed to `put`.
    ///
    /// Violations are fatal (`panic!`) in debug builds, ignored in release.
    pub fn set_element_checker(&self, checker: fn(&T) -> bool) {
        let _ = self.checker.set(checker);
    }

    fn try_lock(&self) -> Option<Guard<'_, T>> {
        self.busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|()| Guard { cache: self })
    }

    /// Returns the topmost cached slot, or `None` if the cache is empty
    /// or contended.
    pub fn get(&self) -> Option<T> {
        let _guard = self.try_lock()?;
        let len = self.len.load(Ordering::Relaxed);
        if len == 0 {
            return None;
        }
        // Safety: guard holds exclusive access to `slots`.
        let slots = unsafe { &mut *self.slots.get() };
        let new_len = len - 1;
        self.len.store(new_len, Ordering::Relaxed);
        slots[new_len].take()
    }

    /// Stores `object` in the next free slot.
    ///
    /// Returns `None` on success. Returns the object back to the caller
    /// if the cache is full or contended, so the caller can free it
    /// directly.
    pub fn put(&self, object: T) -> Option<T> {
        #[cfg(debug_assertions)]
        if let Some(checker) = self.checker.get() {
            assert!(
                checker(&object),
                "ov-cache: type check failed for cache `{}`",
                self.name
            );
        }

        let Some(_guard) = self.try_lock() else {
            return Some(object);
        };
        let len = self.len.load(Ordering::Relaxed);
        if len >= self.capacity.load(Ordering::Relaxed) {
            return Some(object);
        }
        // Safety: guard holds exclusive access to `slots`.
        let slots = unsafe { &mut *self.slots.get() };
        slots[len] = Some(object);
        self.len.store(len + 1, Ordering::Relaxed);
        None
    }

    /// Number of objects currently held.
    ///
    /// Does not acquire `busy` — `len` is read directly via a relaxed
    /// atomic load, so this never races `get`/`put`'s guarded writes to
    /// it even under contention.
    pub fn in_use(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    pub fn capacity(&self) -> usize {
        self.capacity.load(Ordering::Relaxed)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Grows the backing slot array to `new_capacity` if larger than the
    /// current capacity. Never shrinks; existing entries survive.
    ///
    /// Callers must ensure no concurrent `get`/`put` races an extension —
    /// the same precondition the original C registry documents ("call
    /// only once, only after you are sure nobody uses the cache").
    pub(crate) fn grow_capacity(&self, new_capacity: usize) {
        let current = self.capacity.load(Ordering::Relaxed);
        if new_capacity <= current {
            return;
        }
        // Spin briefly for the guard: extension is an administrative,
        // rare operation, unlike the lock-free hot path.
        while self.try_lock().is_none() {
            std::hint::spin_loop();
        }
        let slots = unsafe { &mut *self.slots.get() };
        slots.resize_with(new_capacity, || None);
        self.capacity.store(new_capacity, Ordering::Relaxed);
        self.busy.store(false, Ordering::Release);
    }

    fn dispose_all(&self) {
        while self.try_lock().is_none() {
            std::hint::spin_loop();
        }
        // Safety: guard holds exclusive access to `slots`.
        let slots = unsafe { &mut *self.slots.get() };
        for slot in slots.iter_mut() {
            if let Some(obj) = slot.take() {
                (self.disposer)(obj);
            }
        }
        self.len.store(0, Ordering::Relaxed);
        self.busy.store(false, Ordering::Release);
    }
}

impl<T: Send> ErasedCache for Cache<T> {
    fn name(&self) -> &'static str {
        Cache::name(self)
    }

    fn capacity(&self) -> usize {
        Cache::capacity(self)
    }

    fn in_use(&self) -> usize {
        Cache::in_use(self)
    }

    fn dispose_all(&self) {
        Cache::dispose_all(self);
    }

    fn grow_capacity(&self, new_capacity: usize) {
        Cache::grow_capacity(self, new_capacity);
    }

    fn identity(&self) -> *const () {
        (self as *const Cache<T>).cast::<()>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_disposer(_: i32) {}

    #[test]
    fn empty_cache_misses() {
        let cache: Cache<i32> = Cache::new("t1", noop_disposer);
        cache.grow_capacity(2);
        assert_eq!(cache.get(), None);
    }

    #[test]
    fn put_then_get_round_trips() {
        let cache: Cache<i32> = Cache::new("t2", noop_disposer);
        cache.grow_capacity(2);
        assert_eq!(cache.put(42), None);
        assert_eq!(cache.in_use(), 1);
        assert_eq!(cache.get(), Some(42));
        assert_eq!(cache.get(), None);
    }

    #[test]
    fn full_cache_returns_object_unchanged() {
        let cache: Cache<i32> = Cache::new("t3", noop_disposer);
        cache.grow_capacity(1);
        assert_eq!(cache.put(1), None);
        assert_eq!(cache.put(2), Some(2));
        assert_eq!(cache.in_use(), 1);
    }

    #[test]
    fn grow_capacity_preserves_entries() {
        let cache: Cache<i32> = Cache::new("t4", noop_disposer);
        cache.grow_capacity(1);
        assert_eq!(cache.put(7), None);
        cache.grow_capacity(3);
        assert_eq!(cache.put(8), None);
        assert_eq!(cache.in_use(), 2);
        assert_eq!(cache.get(), Some(8));
        assert_eq!(cache.get(), Some(7));
    }

    #[test]
    #[cfg_attr(not(debug_assertions), ignore)]
    #[should_panic(expected = "type check failed")]
    fn checker_violation_is_fatal_in_debug() {
        let cache: Cache<i32> = Cache::new("t5", noop_disposer);
        cache.grow_capacity(1);
        cache.set_element_checker(|v| *v > 0);
        cache.put(-1);
    }
}
