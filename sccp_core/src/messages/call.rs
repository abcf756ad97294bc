//! Call-plane messages: state transitions, party info, tones, prompts,
//! keypad and softkey traffic.

use crate::fields::{FieldReader, FieldWriter};
use crate::names::{CallState, CallType};
use crate::Result;

/// CallState (0x0111). Privacy/precedence are absent on some dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallStateMsg {
    pub state: CallState,
    pub line: u32,
    pub call_reference: u32,
    pub privacy: u32,
    pub precedence_level: u32,
    pub precedence_domain: u32,
}

impl CallStateMsg {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(payload);
        Ok(Self {
            state: CallState::from_u32(r.u32()?),
            line: r.u32()?,
            call_reference: r.u32()?,
            privacy: r.u32_or(0),
            precedence_level: r.u32_or(0),
            precedence_domain: r.u32_or(0),
        })
    }
}

/// CallInfo (0x008F): the full 384-byte party record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallInfo {
    pub calling_party_name: String,
    pub calling_party: String,
    pub called_party_name: String,
    pub called_party: String,
    pub line: u32,
    pub call_reference: u32,
    pub call_type: u32,
    pub original_called_party_name: String,
    pub original_called_party: String,
    pub last_redirecting_party_name: String,
    pub last_redirecting_party: String,
    pub original_called_redirect_reason: u32,
    pub last_redirecting_reason: u32,
    pub calling_party_voicemail: String,
    pub called_party_voicemail: String,
    pub original_called_voicemail: String,
    pub last_redirecting_voicemail: String,
    pub call_instance: u32,
    pub call_security_status: u32,
    pub party_pi_restriction_bits: u32,
}

impl CallInfo {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(payload);
        Ok(Self {
            calling_party_name: r.ascii(40)?,
            calling_party: r.ascii(24)?,
            called_party_name: r.ascii(40)?,
            called_party: r.ascii(24)?,
            line: r.u32()?,
            call_reference: r.u32()?,
            call_type: r.u32()?,
            original_called_party_name: r.ascii_or(40),
            original_called_party: r.ascii_or(24),
            last_redirecting_party_name: r.ascii_or(40),
            last_redirecting_party: r.ascii_or(24),
            original_called_redirect_reason: r.u32_or(0),
            last_redirecting_reason: r.u32_or(0),
            calling_party_voicemail: r.ascii_or(24),
            called_party_voicemail: r.ascii_or(24),
            original_called_voicemail: r.ascii_or(24),
            last_redirecting_voicemail: r.ascii_or(24),
            call_instance: r.u32_or(0),
            call_security_status: r.u32_or(0),
            party_pi_restriction_bits: r.u32_or(0),
        })
    }

    pub fn call_type_enum(&self) -> CallType {
        CallType::from_u32(self.call_type)
    }
}

/// StartTone (0x0082).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartTone {
    pub tone: u32,
    pub output_direction: u32,
    pub line: u32,
    pub call_reference: u32,
}

impl StartTone {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(payload);
        Ok(Self {
            tone: r.u32()?,
            output_direction: r.u32_or(0),
            line: r.u32_or(0),
            call_reference: r.u32_or(0),
        })
    }
}

/// StopTone (0x0083).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopTone {
    pub line: u32,
    pub call_reference: u32,
}

impl StopTone {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(payload);
        Ok(Self {
            line: r.u32_or(0),
            call_reference: r.u32_or(0),
        })
    }
}

/// SetRinger (0x0085).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetRinger {
    pub ring_mode: u32,
    pub ring_duration: u32,
    pub line: u32,
    pub call_reference: u32,
}

impl SetRinger {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(payload);
        Ok(Self {
            ring_mode: r.u32()?,
            ring_duration: r.u32_or(0),
            line: r.u32_or(0),
            call_reference: r.u32_or(0),
        })
    }
}

/// SetLamp (0x0086).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetLamp {
    pub stimulus: u32,
    pub stimulus_instance: u32,
    pub lamp_mode: u32,
}

impl SetLamp {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(payload);
        Ok(Self {
            stimulus: r.u32()?,
            stimulus_instance: r.u32_or(0),
            lamp_mode: r.u32_or(0),
        })
    }
}

/// SetSpeakerMode (0x0088).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetSpeakerMode {
    pub mode: u32,
}

impl SetSpeakerMode {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(payload);
        Ok(Self { mode: r.u32()? })
    }
}

/// ActivateCallPlane (0x0116).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivateCallPlane {
    pub line: u32,
}

impl ActivateCallPlane {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(payload);
        Ok(Self { line: r.u32()? })
    }
}

/// DisplayPromptStatus (0x0112).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayPromptStatus {
    pub timeout: u32,
    pub prompt: String,
    pub line: u32,
    pub call_reference: u32,
}

impl DisplayPromptStatus {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(payload);
        Ok(Self {
            timeout: r.u32()?,
            prompt: r.ascii(32)?,
            line: r.u32()?,
            call_reference: r.u32()?,
        })
    }
}

/// ClearPromptStatus (0x0113).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearPromptStatus {
    pub line: u32,
    pub call_reference: u32,
}

impl ClearPromptStatus {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(payload);
        Ok(Self {
            line: r.u32()?,
            call_reference: r.u32_or(0),
        })
    }
}

/// DisplayNotify (0x0114).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayNotify {
    pub timeout: u32,
    pub text: String,
}

impl DisplayNotify {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(payload);
        Ok(Self {
            timeout: r.u32()?,
            text: r.ascii(32)?,
        })
    }
}

/// DisplayPriNotify (0x0120).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayPriNotify {
    pub timeout: u32,
    pub priority: u32,
    pub text: String,
}

impl DisplayPriNotify {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(payload);
        Ok(Self {
            timeout: r.u32()?,
            priority: r.u32()?,
            text: r.ascii(32)?,
        })
    }
}

/// DialedNumber (0x011D).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialedNumber {
    pub number: String,
    pub line: u32,
    pub call_reference: u32,
}

impl DialedNumber {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(payload);
        Ok(Self {
            number: r.ascii(24)?,
            line: r.u32()?,
            call_reference: r.u32_or(0),
        })
    }
}

/// CallSelectStatRes (0x0130).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSelectStatRes {
    pub call_select_stat: u32,
    pub call_reference: u32,
    pub line: u32,
}

impl CallSelectStatRes {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(payload);
        Ok(Self {
            call_select_stat: r.u32()?,
            call_reference: r.u32_or(0),
            line: r.u32_or(0),
        })
    }
}

/// KeypadButton (0x0003): sent by us when dialing; received back from the
/// server when it relays local key presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeypadButton {
    pub button: u32,
    pub line: u32,
    pub call_reference: u32,
}

impl KeypadButton {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(payload);
        Ok(Self {
            button: r.u32()?,
            line: r.u32_or(0),
            call_reference: r.u32_or(0),
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = FieldWriter::new();
        w.u32(self.button).u32(self.line).u32(self.call_reference);
        w.finish()
    }
}

/// SoftKeyEvent (0x0026), station -> CUCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftKeyEvent {
    pub event: u32,
    pub line: u32,
    pub call_reference: u32,
}

impl SoftKeyEvent {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = FieldWriter::new();
        w.u32(self.event).u32(self.line).u32(self.call_reference);
        w.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_state_tolerates_missing_precedence() {
        let mut w = FieldWriter::new();
        w.u32(4).u32(1).u32(1001);
        let msg = CallStateMsg::decode(&w.finish()).unwrap();
        assert_eq!(msg.state, CallState::RingIn);
        assert_eq!(msg.line, 1);
        assert_eq!(msg.call_reference, 1001);
        assert_eq!(msg.precedence_level, 0);
    }

    #[test]
    fn call_state_short_prefix_is_error() {
        assert!(CallStateMsg::decode(&5u32.to_le_bytes()).is_err());
    }

    #[test]
    fn call_info_full_record() {
        let mut w = FieldWriter::new();
        w.ascii("Alice Smith", 40)
            .ascii("5551234", 24)
            .ascii("Lobby", 40)
            .ascii("2000", 24)
            .u32(1)
            .u32(1001)
            .u32(1);
        w.ascii("", 40).ascii("", 24).ascii("", 40).ascii("", 24);
        w.u32(0).u32(0);
        w.ascii("", 24).ascii("", 24).ascii("", 24).ascii("", 24);
        w.u32(1).u32(0).u32(0);
        let info = CallInfo::decode(&w.finish()).unwrap();
        assert_eq!(info.calling_party, "5551234");
        assert_eq!(info.calling_party_name, "Alice Smith");
        assert_eq!(info.called_party, "2000");
        assert_eq!(info.call_reference, 1001);
        assert_eq!(info.call_type_enum(), CallType::Inbound);
        assert_eq!(info.call_instance, 1);
    }

    #[test]
    fn call_info_short_dialect_defaults_tail() {
        // only through call_type: 40+24+40+24+12 = 140 bytes
        let mut w = FieldWriter::new();
        w.ascii("Bob", 40).ascii("100", 24).ascii("", 40).ascii("200", 24);
        w.u32(2).u32(77).u32(2);
        let info = CallInfo::decode(&w.finish()).unwrap();
        assert_eq!(info.call_reference, 77);
        assert_eq!(info.call_type_enum(), CallType::Outbound);
        assert_eq!(info.original_called_party, "");
        assert_eq!(info.party_pi_restriction_bits, 0);
    }

    #[test]
    fn prompt_status_layout() {
        let mut w = FieldWriter::new();
        w.u32(10).ascii("Enter number", 32).u32(1).u32(1001);
        let msg = DisplayPromptStatus::decode(&w.finish()).unwrap();
        assert_eq!(msg.timeout, 10);
        assert_eq!(msg.prompt, "Enter number");
        assert_eq!(msg.line, 1);
        assert_eq!(msg.call_reference, 1001);
    }

    #[test]
    fn keypad_round_trip() {
        let btn = KeypadButton { button: 0x0E, line: 1, call_reference: 42 };
        let decoded = KeypadButton::decode(&btn.encode()).unwrap();
        assert_eq!(decoded, btn);
    }

    #[test]
    fn softkey_event_layout() {
        let body = SoftKeyEvent { event: 11, line: 1, call_reference: 1001 }.encode();
        assert_eq!(body.len(), 12);
        assert_eq!(&body[..4], &11u32.to_le_bytes());
        assert_eq!(&body[8..], &1001u32.to_le_bytes());
    }
}
