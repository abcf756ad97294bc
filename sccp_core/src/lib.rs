//! Pure SCCP (Skinny Client Control Protocol) core: frame codec, typed
//! message records with per-message encode/decode, and the enum/name tables
//! the rest of the client keys off. No I/O happens here.

mod fields;
mod frame;
mod names;

pub mod ids;
pub mod messages;

pub use crate::fields::{clean_ascii, FieldReader, FieldWriter};
pub use crate::frame::{encode_frame, FrameHeader, FRAME_HEADER_LEN, MAX_PAYLOAD_LEN};
pub use crate::messages::{BUTTON_TYPE_LINE, BUTTON_TYPE_SPEED_DIAL};
pub use crate::names::{
    char_to_keypad_code, device_type_from_model, device_type_name, keypad_code_to_char,
    keyset_name, softkey_info_name, softkey_template_name, stimulus_name, tone_name,
    unregister_status_name, CallState, CallType,
};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Payload too short for a mandatory field.
    #[error("payload too short: need {need} bytes, got {got}")]
    Short { need: usize, got: usize },

    #[error("payload exceeds maximum frame size ({0} bytes)")]
    Oversize(usize),
}

pub type Result<T> = core::result::Result<T, CodecError>;
