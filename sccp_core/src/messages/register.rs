use std::net::Ipv4Addr;

use crate::fields::{FieldReader, FieldWriter};
use crate::Result;

/// Protocol revision this station speaks.
pub const PROTOCOL_VERSION: u8 = 5;

/// Feature bits as observed on the wire from a real 7940; meaning of the
/// individual bits is undocumented, keep the literal value.
pub const FEATURE_FLAGS: u16 = 0x0560;

pub const MAX_CONFERENCES: u32 = 0xFFFF_FEE0;

/// Opaque 16-byte trailer every hardware phone appends to RegisterReq.
/// Provenance unknown; CUCM expects it verbatim.
pub const REGISTER_TRAILER: [u8; 16] = [
    0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00, 0xe0, 0x82, 0x18, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// RegisterReq (0x0001), station -> CUCM.
#[derive(Debug, Clone)]
pub struct RegisterReq {
    pub device_name: String,
    pub instance: u32,
    pub station_ip: Ipv4Addr,
    pub device_type: u32,
    pub max_rtp_streams: u32,
    pub active_rtp_streams: u32,
}

impl RegisterReq {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = FieldWriter::new();
        w.ascii(&self.device_name, 16)
            .u32(0) // reserved
            .u32(self.instance)
            .ipv4(self.station_ip)
            .u32(self.device_type)
            .u32(self.max_rtp_streams)
            .u32(self.active_rtp_streams)
            .u8(PROTOCOL_VERSION)
            .u8(0)
            .u16(FEATURE_FLAGS)
            .u32(MAX_CONFERENCES)
            .raw(&REGISTER_TRAILER);
        w.finish()
    }
}

/// RegisterAck (0x0081). The protocol/feature words are absent on old
/// CallManager 3.1 and default to zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterAck {
    pub keepalive_interval: u32,
    pub date_template: String,
    pub secondary_keepalive_interval: u32,
    pub max_protocol_version: u8,
    pub feature_flags: u16,
}

impl RegisterAck {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(payload);
        let keepalive_interval = r.u32()?;
        let date_template = r.ascii(6)?;
        let _pad = r.u16()?;
        let secondary_keepalive_interval = r.u32()?;
        let max_protocol_version = r.u8_or(0);
        let _unknown = r.u8_or(0);
        let feature_flags = r.u16_or(0);
        Ok(Self {
            keepalive_interval,
            date_template,
            secondary_keepalive_interval,
            max_protocol_version,
            feature_flags,
        })
    }
}

/// RegisterReject (0x009D) carries a 32-byte display reason. Non-ASCII
/// reasons have been seen in the wild, so the raw bytes are kept alongside
/// the printable rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterReject {
    pub reason: String,
    pub raw: Vec<u8>,
}

impl RegisterReject {
    pub fn decode(payload: &[u8]) -> Self {
        let raw = payload[..payload.len().min(32)].to_vec();
        Self {
            reason: crate::fields::clean_ascii(&raw),
            raw,
        }
    }
}

/// UnregisterAck (0x0118).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnregisterAck {
    pub status: u32,
}

impl UnregisterAck {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(payload);
        Ok(Self { status: r.u32()? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_req_layout() {
        let req = RegisterReq {
            device_name: "SEP001122334455".into(),
            instance: 0,
            station_ip: Ipv4Addr::new(192, 168, 1, 50),
            device_type: 8,
            max_rtp_streams: 5,
            active_rtp_streams: 1,
        };
        let body = req.encode();
        assert_eq!(body.len(), 64);
        assert_eq!(&body[..15], b"SEP001122334455");
        assert_eq!(body[15], 0);
        // station ip stays in network order
        assert_eq!(&body[24..28], &[192, 168, 1, 50]);
        assert_eq!(&body[28..32], &8u32.to_le_bytes());
        assert_eq!(body[40], PROTOCOL_VERSION);
        assert_eq!(&body[42..44], &FEATURE_FLAGS.to_le_bytes());
        assert_eq!(&body[44..48], &MAX_CONFERENCES.to_le_bytes());
        assert_eq!(&body[48..], &REGISTER_TRAILER);
    }

    #[test]
    fn register_ack_with_and_without_tail() {
        let mut body = Vec::new();
        body.extend_from_slice(&30u32.to_le_bytes());
        body.extend_from_slice(b"M/D/YA");
        body.extend_from_slice(&0u16.to_le_bytes());
        body.extend_from_slice(&45u32.to_le_bytes());

        // CallManager 3.1 dialect: no protocol/feature tail
        let ack = RegisterAck::decode(&body).unwrap();
        assert_eq!(ack.keepalive_interval, 30);
        assert_eq!(ack.date_template, "M/D/YA");
        assert_eq!(ack.secondary_keepalive_interval, 45);
        assert_eq!(ack.max_protocol_version, 0);
        assert_eq!(ack.feature_flags, 0);

        body.push(17);
        body.push(0);
        body.extend_from_slice(&0x0101u16.to_le_bytes());
        let ack = RegisterAck::decode(&body).unwrap();
        assert_eq!(ack.max_protocol_version, 17);
        assert_eq!(ack.feature_flags, 0x0101);
    }

    #[test]
    fn register_ack_short_is_error() {
        assert!(RegisterAck::decode(&[0u8; 8]).is_err());
    }

    #[test]
    fn register_reject_keeps_raw_bytes() {
        let mut body = vec![0u8; 32];
        body[..10].copy_from_slice(b"Dup device");
        body[10] = 0xFE;
        let rej = RegisterReject::decode(&body);
        assert_eq!(rej.reason, "Dup device");
        assert_eq!(rej.raw.len(), 32);
        assert_eq!(rej.raw[10], 0xFE);
    }
}
