use ov_buffer::Buffer;
use ov_json::{JsonOutcome, JsonParser};
use tracing::warn;

/// Frames a byte stream into the decoded [`serde_json::Value`]s
/// [`crate::Bridge::handle_inbound`] expects, and the reverse: encodes
/// outbound envelopes for writing back to the same connection. One of
/// these sits between a reactor-registered socket and the bridge, per
/// connection (spec.md's C5+C6+C8 dataflow).
pub struct WireCodec {
    parser: JsonParser,
}

impl WireCodec {
    pub fn new() -> Self {
        Self {
            parser: JsonParser::buffered(),
        }
    }

    /// Feeds newly read bytes in and drains every complete top-level
    /// object currently available. Malformed input is logged and
    /// dropped; anything already buffered before the syntax error stays
    /// buffered, matching `ov_mc_backend_sip`'s tolerance for a single
    /// bad frame on an otherwise healthy connection.
    pub fn decode(&mut self, input: &[u8]) -> Vec<serde_json::Value> {
        let mut values = Vec::new();
        let mut remaining = input;
        loop {
            match self.parser.decode_value(remaining) {
                JsonOutcome::Success(value) => {
                    values.push(value);
                    remaining = &[];
                }
                JsonOutcome::Progress => break,
                JsonOutcome::Mismatch => {
                    warn!("dropping unparseable bridge frame");
                    break;
                }
                JsonOutcome::Error(err) => {
                    warn!(%err, "bridge wire codec error");
                    break;
                }
            }
        }
        values
    }

    pub fn encode(&self, value: &serde_json::Value) -> Buffer {
        self.parser.encode(value)
    }
}

impl Default for WireCodec {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_one_object_arriving_in_two_reads() {
        let mut codec = WireCodec::new();
        assert!(codec.decode(br#"{"event":"acqu"#).is_empty());
        let values = codec.decode(br#"ire","uuid":"00000000-0000-0000-0000-000000000000"}"#);
        assert_eq!(values.len(), 1);
        assert_eq!(values[0]["event"], "acquire");
    }

    #[test]
    fn encode_then_decode_round_trips_a_value() {
        let codec = WireCodec::new();
        let original = json!({"event": "register", "uuid": "00000000-0000-0000-0000-000000000000", "parameter": {}});
        let bytes = codec.encode(&original);
        let mut decoder = WireCodec::new();
        let values = decoder.decode(bytes.data());
        assert_eq!(values.len(), 1);
        assert_eq!(values[0], original);
    }
}
