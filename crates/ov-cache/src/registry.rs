use std::collections::HashMap;
use std::sync::Mutex;

use once_cell::sync::Lazy;
use serde_json::json;
use thiserror::Error;

/// Type-erased view of a [`crate::Cache`], used only by [`Registry`] for
/// creation/extension/teardown/reporting — never on the hot path.
pub trait ErasedCache: Sync {
    fn name(&self) -> &'static str;
    fn capacity(&self) -> usize;
    fn in_use(&self) -> usize;
    fn dispose_all(&self);
    fn grow_capacity(&self, new_capacity: usize);
    /// Stable identity of the concrete cache instance, used to detect a
    /// second, unrelated cache registering under the same name.
    fn identity(&self) -> *const ();
}

// Safety: `*const ()` identities are only ever compared, never dereferenced.
unsafe impl Send for RegistryEntry {}
unsafe impl Sync for RegistryEntry {}

struct RegistryEntry {
    cache: &'static dyn ErasedCache,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("cache `{0}` already registered under a different disposer")]
    MismatchedDisposer(&'static str),
}

/// Process-wide map from cache name to cache instance.
///
/// Mutated under a single global lock, used only at creation/extension
/// and at teardown/reporting — never on the `get`/`put` hot path of the
/// individual [`crate::Cache`] values it tracks.
pub struct Registry {
    entries: Mutex<HashMap<&'static str, RegistryEntry>>,
}

impl Registry {
    const fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Creates the named cache if absent, or grows its capacity if the
    /// registration matches the cache already registered under that
    /// name. Capacity can only grow; existing entries survive.
    pub fn extend<T: Send + 'static>(
        &self,
        cache: &'static crate::Cache<T>,
        capacity: usize,
    ) -> Result<(), CacheError> {
        let erased: &'static dyn ErasedCache = cache;
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(erased.name()) {
            Some(existing) if existing.cache.identity() != erased.identity() => {
                Err(CacheError::MismatchedDisposer(erased.name()))
            }
            Some(_) => {
                erased.grow_capacity(capacity);
                Ok(())
            }
            None => {
                entries.insert(erased.name(), RegistryEntry { cache: erased });
                erased.grow_capacity(capacity);
                Ok(())
            }
        }
    }

    /// Disposes every slot of every registered cache and forgets them.
    ///
    /// Must be called exactly once, immediately before process exit, and
    /// only after every user of every cache has stopped using it.
    pub fn free_all(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        for entry in entries.values() {
            entry.cache.dispose_all();
        }
        entries.clear();
    }

    /// `{cache-name: {capacity, in_use}}` for every registered cache.
    pub fn report(&self) -> serde_json::Value {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let mut out = serde_json::Map::new();
        for (name, entry) in entries.iter() {
            out.insert(
                (*name).to_string(),
                json!({
                    "capacity": entry.cache.capacity(),
                    "in_use": entry.cache.in_use(),
                }),
            );
        }
        serde_json::Value::Object(out)
    }
}

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// The single process-wide cache registry.
pub fn registry() -> &'static Registry {
    &REGISTRY
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cache;

    fn noop(_: i32) {}

    #[test]
    fn extend_creates_then_grows() {
        static C: Cache<i32> = Cache::new("registry-test-grow", noop);
        registry().extend(&C, 2).unwrap();
        registry().extend(&C, 5).unwrap();
        assert_eq!(C.capacity(), 5);
    }

    #[test]
    fn mismatched_registration_under_same_name_fails() {
        static A: Cache<i32> = Cache::new("registry-test-dup", noop);
        static B: Cache<i32> = Cache::new("registry-test-dup", noop);
        registry().extend(&A, 1).unwrap();
        let err = registry().extend(&B, 1).unwrap_err();
        assert_eq!(err, CacheError::MismatchedDisposer("registry-test-dup"));
    }

    #[test]
    fn report_reflects_in_use() {
        static C: Cache<i32> = Cache::new("registry-test-report", noop);
        registry().extend(&C, 2).unwrap();
        C.put(1);
        let report = registry().report();
        assert_eq!(report["registry-test-report"]["in_use"], 1);
    }
}
