//! RTP packet model and the G.711 codecs used on the media path.

pub mod codecs;
pub mod error;
pub mod rtp;

pub use codecs::alaw::{decode_alaw, encode_alaw, pcma_decode_f32, pcma_encode};
pub use codecs::ulaw::{decode_ulaw, encode_ulaw, pcmu_decode_f32, pcmu_encode};
pub use error::AudioError;
pub use rtp::{RtpHeader, RtpPacket, RTP_HEADER_LEN};
