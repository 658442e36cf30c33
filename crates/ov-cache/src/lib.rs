//! Process-wide registry of named, bounded free-lists.
//!
//! Amortizes allocator pressure for hot, small, frequently recycled
//! structures (buffers, ring-buffer nodes, RTP frames). Each cache lives
//! behind a single [`AtomicBool`] test-and-set guard so the hot `get`/`put`
//! path never touches a hashtable or a lock; the central [`Registry`] is
//! only consulted when a cache is created, extended, or torn down.
//!
//! ```
//! use ov_cache::{Cache, registry};
//!
//! static BUFFERS: Cache<Vec<u8>> = Cache::new("buffers", |_| {});
//!
//! registry().extend(&BUFFERS, 4).unwrap();
//! assert!(BUFFERS.get().is_none());
//! assert!(BUFFERS.put(vec![1, 2, 3]).is_none());
//! assert_eq!(BUFFERS.get(), Some(vec![1, 2, 3]));
//! ```

mod cache;
mod registry;
mod sizes;

pub use cache::Cache;
pub use registry::{registry, CacheError, Registry};
pub use sizes::CacheSizes;
