use byteorder::{ByteOrder, LittleEndian};

use crate::{CodecError, Result};

/// Fixed 12-byte prefix on every SCCP frame: length, reserved, message id.
pub const FRAME_HEADER_LEN: usize = 12;

/// CUCM never sends larger bodies in practice; anything bigger is a framing
/// error, not a message.
pub const MAX_PAYLOAD_LEN: usize = 8 * 1024;

/// The `length` word counts the message id plus the payload, but not the
/// reserved word. All three words are little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub length: u32,
    pub reserved: u32,
    pub message_id: u32,
}

impl FrameHeader {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < FRAME_HEADER_LEN {
            return Err(CodecError::Short {
                need: FRAME_HEADER_LEN,
                got: bytes.len(),
            });
        }
        Ok(Self {
            length: LittleEndian::read_u32(&bytes[0..4]),
            reserved: LittleEndian::read_u32(&bytes[4..8]),
            message_id: LittleEndian::read_u32(&bytes[8..12]),
        })
    }

    /// Payload bytes that follow the header on the wire.
    pub fn payload_len(&self) -> Result<usize> {
        let len = (self.length as usize).saturating_sub(4);
        if len > MAX_PAYLOAD_LEN {
            return Err(CodecError::Oversize(len));
        }
        Ok(len)
    }
}

/// Build one wire frame: header words then payload.
pub fn encode_frame(message_id: u32, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
    out.extend_from_slice(&(payload.len() as u32 + 4).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&message_id.to_le_bytes());
    out.extend_from_slice(payload);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_round_trip() {
        let frame = encode_frame(0x0026, &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(frame.len(), 20);

        let header = FrameHeader::parse(&frame).unwrap();
        assert_eq!(header.length, 12);
        assert_eq!(header.reserved, 0);
        assert_eq!(header.message_id, 0x0026);
        assert_eq!(header.payload_len().unwrap(), 8);
        assert_eq!(&frame[FRAME_HEADER_LEN..], &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn empty_body_has_length_four() {
        let frame = encode_frame(0x0000, &[]);
        assert_eq!(frame.len(), FRAME_HEADER_LEN);
        let header = FrameHeader::parse(&frame).unwrap();
        assert_eq!(header.length, 4);
        assert_eq!(header.payload_len().unwrap(), 0);
    }

    #[test]
    fn short_header_rejected() {
        assert_eq!(
            FrameHeader::parse(&[0u8; 5]),
            Err(CodecError::Short { need: 12, got: 5 })
        );
    }

    #[test]
    fn oversize_length_rejected() {
        let mut frame = encode_frame(0x0001, &[]);
        frame[0..4].copy_from_slice(&(1u32 << 20).to_le_bytes());
        let header = FrameHeader::parse(&frame).unwrap();
        assert!(header.payload_len().is_err());
    }
}
