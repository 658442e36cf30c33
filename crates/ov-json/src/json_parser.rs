use ov_buffer::Buffer;
use tracing::trace;

use crate::error::ParserError;
use crate::state::Decode;

/// Whether a [`JsonParser`] expects exactly one value per `decode` call
/// or accumulates arbitrarily chunked input looking for complete
/// top-level objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// The entire input to one `decode` call must be exactly one
    /// syntactically valid JSON value.
    Strict,
    /// Input is appended to an internal accumulator; `decode` yields one
    /// complete top-level object at a time via bracket matching.
    Buffered,
}

/// Controls [`JsonParser::encode`]'s output formatting. Key ordering is
/// always ascending (`serde_json`'s default `Map` is a `BTreeMap`) and
/// is not affected by this setting.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringifyConfig {
    pub pretty: bool,
}

/// Incremental JSON decoder/encoder.
///
/// In [`Mode::Buffered`], `accumulator` holds only bytes not yet yielded
/// as a complete object, plus any trailing bytes received after the
/// last complete object — spec.md §3's invariant for this type.
pub struct JsonParser {
    mode: Mode,
    accumulator: Buffer,
    stringify_config: StringifyConfig,
}

impl JsonParser {
    pub fn strict() -> Self {
        Self {
            mode: Mode::Strict,
            accumulator: Buffer::create(0),
            stringify_config: StringifyConfig::default(),
        }
    }

    pub fn buffered() -> Self {
        Self {
            mode: Mode::Buffered,
            accumulator: Buffer::create(64),
            stringify_config: StringifyConfig::default(),
        }
    }

    pub fn with_stringify_config(mut self, config: StringifyConfig) -> Self {
        self.stringify_config = config;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn supports_buffering(&self) -> bool {
        self.mode == Mode::Buffered
    }

    /// Decodes `input`, returning the matched object's/value's source
    /// bytes on success. See [`JsonParser::decode_value`] for the
    /// `serde_json::Value` convenience wrapper most callers want.
    pub fn decode(&mut self, input: &[u8]) -> Decode {
        match self.mode {
            Mode::Strict => Self::decode_strict(input),
            Mode::Buffered => self.decode_buffered(input),
        }
    }

    /// [`JsonParser::decode`], deserializing a `Success` payload into a
    /// [`serde_json::Value`] for the caller.
    pub fn decode_value(&mut self, input: &[u8]) -> JsonOutcome {
        match self.decode(input) {
            Decode::Progress => JsonOutcome::Progress,
            Decode::Mismatch => JsonOutcome::Mismatch,
            Decode::Error(e) => JsonOutcome::Error(e),
            Decode::Success(bytes) => match serde_json::from_slice(bytes.data()) {
                Ok(value) => JsonOutcome::Success(value),
                Err(e) => JsonOutcome::Error(ParserError::Malformed(e.to_string())),
            },
            // A bare JSON parser never produces these; chained framing
            // layers do. Surface as Mismatch rather than panicking.
            Decode::Answer(_) | Decode::AnswerClose(_) | Decode::Close | Decode::Done => {
                JsonOutcome::Mismatch
            }
        }
    }

    fn decode_strict(input: &[u8]) -> Decode {
        match serde_json::from_slice::<serde_json::Value>(input) {
            Ok(_) => Decode::Success(owned_buffer(input)),
            Err(_) => Decode::Mismatch,
        }
    }

    fn decode_buffered(&mut self, input: &[u8]) -> Decode {
        if !input.is_empty() && !self.accumulator.push(input) {
            return Decode::Error(ParserError::Malformed(
                "failed to grow accumulator".to_string(),
            ));
        }

        let data = self.accumulator.data();
        let first_non_ws = data.iter().position(|b| !b.is_ascii_whitespace());
        let Some(start) = first_non_ws else {
            // Whitespace-only (or empty) accumulator: not yet a mismatch,
            // just nothing to report (open question in spec.md §9,
            // resolved in favor of PROGRESS — see DESIGN.md).
            return Decode::Progress;
        };
        if data[start] != b'{' {
            return Decode::Mismatch;
        }

        match find_matching_close(data, start) {
            Some(end) => {
                let object_bytes = owned_buffer(&data[start..=end]);
                let consumed = end + 1;
                self.accumulator.shift(consumed);
                trace!(consumed, "buffered json parser yielded one object");
                Decode::Success(object_bytes)
            }
            None => Decode::Progress,
        }
    }

    /// Peeks at the buffered-but-not-yet-yielded bytes without
    /// consuming them.
    pub fn dump(&self) -> &[u8] {
        self.accumulator.data()
    }

    /// Drains and returns whatever is currently buffered.
    pub fn empty_out(&mut self) -> Buffer {
        let drained = owned_buffer(self.accumulator.data());
        self.accumulator.clear();
        drained
    }

    /// Stringifies `value` into a freshly allocated buffer. Object keys
    /// are always written in ascending order (`serde_json`'s `Map` is a
    /// `BTreeMap` without the `preserve_order` feature).
    pub fn encode(&self, value: &serde_json::Value) -> Buffer {
        let bytes = if self.stringify_config.pretty {
            serde_json::to_vec_pretty(value)
        } else {
            serde_json::to_vec(value)
        }
        .unwrap_or_default();
        owned_buffer(&bytes)
    }
}

/// Result of [`JsonParser::decode_value`] — the JSON-specific subset of
/// [`Decode`], with the object already deserialized.
#[derive(Debug)]
pub enum JsonOutcome {
    Progress,
    Success(serde_json::Value),
    Mismatch,
    Error(ParserError),
}

fn owned_buffer(bytes: &[u8]) -> Buffer {
    let mut buf = Buffer::create(bytes.len());
    buf.set(bytes);
    buf
}

/// Scans `data` starting at `data[start] == b'{'`, respecting string
/// literals and backslash escapes, and returns the index of the
/// matching close brace.
fn find_matching_close(data: &[u8], start: usize) -> Option<usize> {
    let mut depth: i64 = 0;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, &byte) in data[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
}
