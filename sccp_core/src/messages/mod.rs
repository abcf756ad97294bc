//! Typed records for every supported SCCP message, one encode/decode per
//! message. Layouts follow the CallManager wire formats; decoders tolerate
//! longer payloads (newer servers) and default optional trailing fields
//! (older servers), but an undersized mandatory prefix is an error.

mod call;
mod media;
mod register;
mod setup;

pub use call::*;
pub use media::*;
pub use register::*;
pub use setup::*;

/// Several requests carry nothing but one little-endian word.
pub fn u32_body(v: u32) -> Vec<u8> {
    v.to_le_bytes().to_vec()
}
