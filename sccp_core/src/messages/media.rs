//! Media-channel control: CUCM tells the station where to send RTP and
//! where to listen.

use std::net::Ipv4Addr;

use crate::fields::{FieldReader, FieldWriter};
use crate::Result;

/// Compression types CUCM uses for G.711.
pub const MEDIA_PAYLOAD_G711_ALAW: u32 = 2;
pub const MEDIA_PAYLOAD_G711_ULAW: u32 = 4;

/// Map an SCCP compression type to the RTP payload type we emit.
/// Anything we do not speak falls back to PCMU.
pub fn rtp_payload_type(compression_type: u32) -> u8 {
    match compression_type {
        MEDIA_PAYLOAD_G711_ALAW => 8,
        _ => 0,
    }
}

/// StartMediaTransmission (0x008A).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartMediaTransmission {
    pub conference_id: u32,
    pub pass_through_party_id: u32,
    pub remote_ip: Ipv4Addr,
    pub remote_port: u32,
    pub ms_per_packet: u32,
    pub compression_type: u32,
    pub precedence: u32,
    pub silence_suppression: u32,
    pub max_frames_per_packet: u16,
    pub g723_bitrate: u32,
    pub call_reference: u32,
    pub algorithm_id: u32,
    pub key: Vec<u8>,
    pub salt: Vec<u8>,
}

impl StartMediaTransmission {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(payload);
        let conference_id = r.u32()?;
        let pass_through_party_id = r.u32()?;
        let remote_ip = r.ipv4()?;
        let remote_port = r.u32()?;
        let ms_per_packet = r.u32()?;
        let compression_type = r.u32()?;
        let precedence = r.u32_or(0);
        let silence_suppression = r.u32_or(0);
        let max_frames_per_packet = r.u16_or(0);
        let _pad = r.u16_or(0);
        let g723_bitrate = r.u32_or(0);
        let call_reference = r.u32_or(0);
        let algorithm_id = r.u32_or(0);
        let key_len = r.u16_or(0);
        let salt_len = r.u16_or(0);
        let key = r.bytes(16).map(|b| b[..key_len.min(16) as usize].to_vec()).unwrap_or_default();
        let salt = r.bytes(16).map(|b| b[..salt_len.min(16) as usize].to_vec()).unwrap_or_default();
        Ok(Self {
            conference_id,
            pass_through_party_id,
            remote_ip,
            remote_port,
            ms_per_packet,
            compression_type,
            precedence,
            silence_suppression,
            max_frames_per_packet,
            g723_bitrate,
            call_reference,
            algorithm_id,
            key,
            salt,
        })
    }
}

/// OpenReceiveChannel (0x0105).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenReceiveChannel {
    pub conference_id: u32,
    pub pass_through_party_id: u32,
    pub ms_per_packet: u32,
    pub compression_type: u32,
    pub echo_cancel: u32,
    pub g723_bitrate: u32,
    pub call_reference: u32,
    pub algorithm_id: u32,
}

impl OpenReceiveChannel {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(payload);
        Ok(Self {
            conference_id: r.u32()?,
            pass_through_party_id: r.u32()?,
            ms_per_packet: r.u32()?,
            compression_type: r.u32()?,
            echo_cancel: r.u32_or(0),
            g723_bitrate: r.u32_or(0),
            call_reference: r.u32_or(0),
            algorithm_id: r.u32_or(0),
        })
    }
}

/// OpenReceiveChannelAck (0x0022), station -> CUCM: the address we bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenReceiveChannelAck {
    pub status: u32,
    pub station_ip: Ipv4Addr,
    pub port: u32,
    pub pass_through_party_id: u32,
    pub call_reference: u32,
}

impl OpenReceiveChannelAck {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = FieldWriter::new();
        w.u32(self.status)
            .ipv4(self.station_ip)
            .u32(self.port)
            .u32(self.pass_through_party_id)
            .u32(self.call_reference);
        w.finish()
    }
}

/// StopMediaTransmission (0x008B).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopMediaTransmission {
    pub conference_id: u32,
    pub pass_through_party_id: u32,
    pub call_reference: u32,
}

impl StopMediaTransmission {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(payload);
        Ok(Self {
            conference_id: r.u32()?,
            pass_through_party_id: r.u32_or(0),
            call_reference: r.u32_or(0),
        })
    }
}

/// CloseReceiveChannel (0x0106); same shape as StopMediaTransmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseReceiveChannel {
    pub conference_id: u32,
    pub pass_through_party_id: u32,
    pub call_reference: u32,
}

impl CloseReceiveChannel {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(payload);
        Ok(Self {
            conference_id: r.u32()?,
            pass_through_party_id: r.u32_or(0),
            call_reference: r.u32_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start_media_body() -> Vec<u8> {
        let mut w = FieldWriter::new();
        w.u32(7) // conference
            .u32(0x0101_0001) // pass-through party
            .ipv4(Ipv4Addr::new(10, 0, 0, 9))
            .u32(24000)
            .u32(20)
            .u32(4) // ulaw
            .u32(0)
            .u32(0)
            .u16(1)
            .u16(0)
            .u32(0)
            .u32(1001)
            .u32(0)
            .u16(0)
            .u16(0)
            .raw(&[0u8; 16])
            .raw(&[0u8; 16]);
        w.finish()
    }

    #[test]
    fn start_media_layout() {
        let msg = StartMediaTransmission::decode(&start_media_body()).unwrap();
        assert_eq!(msg.remote_ip, Ipv4Addr::new(10, 0, 0, 9));
        assert_eq!(msg.remote_port, 24000);
        assert_eq!(msg.ms_per_packet, 20);
        assert_eq!(msg.compression_type, MEDIA_PAYLOAD_G711_ULAW);
        assert_eq!(msg.call_reference, 1001);
        assert!(msg.key.is_empty());
    }

    #[test]
    fn start_media_minimal_dialect() {
        // only through compression_type
        let body = &start_media_body()[..24];
        let msg = StartMediaTransmission::decode(body).unwrap();
        assert_eq!(msg.remote_port, 24000);
        assert_eq!(msg.call_reference, 0);
    }

    #[test]
    fn payload_type_mapping() {
        assert_eq!(rtp_payload_type(MEDIA_PAYLOAD_G711_ULAW), 0);
        assert_eq!(rtp_payload_type(MEDIA_PAYLOAD_G711_ALAW), 8);
        assert_eq!(rtp_payload_type(11), 0);
    }

    #[test]
    fn open_receive_channel_ack_layout() {
        let ack = OpenReceiveChannelAck {
            status: 0,
            station_ip: Ipv4Addr::new(192, 168, 1, 50),
            port: 16384,
            pass_through_party_id: 0x0101_0001,
            call_reference: 1001,
        };
        let body = ack.encode();
        assert_eq!(body.len(), 20);
        assert_eq!(&body[..4], &0u32.to_le_bytes());
        assert_eq!(&body[4..8], &[192, 168, 1, 50]);
        assert_eq!(&body[8..12], &16384u32.to_le_bytes());
        assert_eq!(&body[16..20], &1001u32.to_le_bytes());
    }
}
