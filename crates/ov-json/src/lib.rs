//! Incremental, object-framed JSON decoder/encoder behind a chainable
//! parser protocol.
//!
//! [`JsonParser`] runs in [`Mode::Strict`] (the whole input must be
//! exactly one JSON value) or [`Mode::Buffered`] (input accumulates and
//! complete top-level objects are yielded one at a time via bracket
//! matching). [`FrameParser`] is the narrow trait that lets a JSON
//! stage be composed after a framing/transport stage in a chain.
//!
//! ```
//! use ov_json::{JsonParser, JsonOutcome};
//!
//! let mut parser = JsonParser::buffered();
//! assert!(matches!(parser.decode_value(br#"{"a":1}{"b":2}"#), JsonOutcome::Success(_)));
//! assert!(matches!(parser.decode_value(b""), JsonOutcome::Success(_)));
//! assert!(matches!(parser.decode_value(b""), JsonOutcome::Progress));
//! ```

mod chain;
mod error;
mod json_parser;
mod state;

pub use chain::{decode_chain, encode_chain, FrameParser};
pub use error::ParserError;
pub use json_parser::{JsonOutcome, JsonParser, Mode, StringifyConfig};
pub use state::Decode;
