use ov_buffer::Buffer;

/// One decoded RTP frame (RFC 3550 §5.1 fixed header plus payload).
///
/// Payload bytes are opaque — codec/DSP interpretation is out of scope
/// (spec.md §1's explicit non-goal).
pub struct Frame {
    pub ssrc: u32,
    pub sequence_number: u16,
    pub timestamp: u32,
    pub payload_type: u8,
    pub marker: bool,
    pub payload: Buffer,
}

const FIXED_HEADER_LEN: usize = 12;
const RTP_VERSION: u8 = 2;

impl Frame {
    /// Decodes one RTP datagram. Returns `None` on any malformed input:
    /// too short for the fixed header, wrong version, a CSRC/extension
    /// region or padding length that doesn't fit, or CSRC count/
    /// extension-length arithmetic overflow.
    pub fn decode(datagram: &[u8]) -> Option<Frame> {
        if datagram.len() < FIXED_HEADER_LEN {
            return None;
        }
        let b0 = datagram[0];
        if b0 >> 6 != RTP_VERSION {
            return None;
        }
        let padding = b0 & 0b0010_0000 != 0;
        let extension = b0 & 0b0001_0000 != 0;
        let csrc_count = (b0 & 0b0000_1111) as usize;

        let b1 = datagram[1];
        let marker = b1 & 0b1000_0000 != 0;
        let payload_type = b1 & 0b0111_1111;

        let sequence_number = u16::from_be_bytes([datagram[2], datagram[3]]);
        let timestamp = u32::from_be_bytes(datagram[4..8].try_into().ok()?);
        let ssrc = u32::from_be_bytes(datagram[8..12].try_into().ok()?);

        let mut offset = FIXED_HEADER_LEN.checked_add(csrc_count.checked_mul(4)?)?;
        if offset > datagram.len() {
            return None;
        }

        if extension {
            if offset.checked_add(4)? > datagram.len() {
                return None;
            }
            let ext_words =
                u16::from_be_bytes([datagram[offset + 2], datagram[offset + 3]]) as usize;
            offset = offset.checked_add(4)?.checked_add(ext_words.checked_mul(4)?)?;
            if offset > datagram.len() {
                return None;
            }
        }

        let mut payload_end = datagram.len();
        if padding {
            let pad_len = *datagram.last()? as usize;
            if pad_len == 0 || pad_len > payload_end.saturating_sub(offset) {
                return None;
            }
            payload_end -= pad_len;
        }
        if offset > payload_end {
            return None;
        }

        let mut payload = Buffer::create(payload_end - offset);
        payload.set(&datagram[offset..payload_end]);

        Some(Frame {
            ssrc,
            sequence_number,
            timestamp,
            payload_type,
            marker,
            payload,
        })
    }
}
