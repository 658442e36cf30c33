//! Per-SSRC fixed-depth RTP reorder buffer, plus a datagram I/O adapter
//! binding it to a [`ov_reactor::Reactor`].
//!
//! ```
//! use ov_rtp::{Frame, JitterBuffer, JitterConfig};
//! use ov_buffer::Buffer;
//!
//! let mut jitter = JitterBuffer::new(JitterConfig { num_frames_to_buffer_per_stream: 2 });
//! jitter.add(Frame { ssrc: 1, sequence_number: 1, timestamp: 0, payload_type: 96, marker: false, payload: Buffer::create(0) });
//! assert_eq!(jitter.take_current().len(), 1);
//! ```

mod frame;
mod jitter;
mod socket_adapter;

pub use frame::Frame;
pub use jitter::{JitterBuffer, JitterConfig, DEFAULT_DEPTH};
pub use socket_adapter::{RtpSocketAdapter, DEFAULT_MTU, MAX_MTU};
