//! Owned, resizable octet sequence with explicit length/capacity and
//! process-wide cache participation.
//!
//! A [`Buffer`] either owns its storage (`capacity > 0`) or borrows a
//! slice it does not own (`capacity == 0`, a "view"). Owning buffers are
//! returned to a process-wide recycler on [`Drop`] instead of being
//! deallocated directly, amortizing allocator pressure for the hot,
//! small, frequently recycled buffers that flow through the reactor,
//! chunker and RTP pipeline.
//!
//! ```
//! use ov_buffer::Buffer;
//!
//! let mut buf = Buffer::create(8);
//! assert!(buf.set(b"hello"));
//! assert_eq!(buf.data(), b"hello");
//! assert!(buf.push(b" world"));
//! assert_eq!(buf.data(), b"hello world");
//! ```

mod buffer;
mod cache;

pub use buffer::Buffer;
pub use cache::enable_caching;
