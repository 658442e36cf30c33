use std::collections::HashMap;

use ov_ring::Ring;
use serde::Deserialize;

use crate::frame::Frame;

/// Default per-SSRC ring depth when not configured.
///
/// spec.md §9 notes the original's depth default is ambiguous between
/// a comment (2) and a constant (3); this port takes 3, matching the
/// constant the original code actually compiles with (see DESIGN.md).
pub const DEFAULT_DEPTH: usize = 3;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct JitterConfig {
    #[serde(default = "default_depth")]
    pub num_frames_to_buffer_per_stream: usize,
}

fn default_depth() -> usize {
    DEFAULT_DEPTH
}

impl Default for JitterConfig {
    fn default() -> Self {
        Self {
            num_frames_to_buffer_per_stream: DEFAULT_DEPTH,
        }
    }
}

/// Per-SSRC fixed-depth reorder buffer.
///
/// Each SSRC gets its own [`Ring`] of `depth_per_stream`; a full ring
/// drops its oldest frame to admit a new one, independent of every
/// other stream. Missing SSRCs are never synthesized.
pub struct JitterBuffer {
    streams: HashMap<u32, Ring<Frame>>,
    depth_per_stream: usize,
}

impl JitterBuffer {
    pub fn new(config: JitterConfig) -> Self {
        Self {
            streams: HashMap::new(),
            depth_per_stream: config.num_frames_to_buffer_per_stream.max(1),
        }
    }

    /// Classifies `frame` by SSRC and inserts it into that stream's
    /// ring, dropping the oldest frame in that ring alone if it was full.
    pub fn add(&mut self, frame: Frame) {
        let depth = self.depth_per_stream;
        self.streams
            .entry(frame.ssrc)
            .or_insert_with(|| Ring::new(depth))
            .insert(frame);
    }

    /// One frame per SSRC that currently has any — the oldest still
    /// held in that stream's ring. Ordering across SSRCs is unspecified
    /// but stable call to call; ordering within one SSRC is FIFO.
    /// Never returns `None`; an empty `Vec` means no stream had a frame.
    pub fn take_current(&mut self) -> Vec<Frame> {
        self.streams
            .values_mut()
            .filter_map(Ring::pop)
            .collect()
    }

    /// Total frames dropped for `ssrc` over its lifetime, or `0` if the
    /// stream has never been seen.
    pub fn dropped_for(&self, ssrc: u32) -> u64 {
        self.streams.get(&ssrc).map_or(0, |ring| ring.stats().dropped)
    }

    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }
}
