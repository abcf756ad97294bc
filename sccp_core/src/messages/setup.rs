//! Post-registration template/status downloads and the capabilities
//! advertisement.

use crate::fields::{FieldReader, FieldWriter};
use crate::Result;

/// One advertised media capability: payload id, max frames per packet,
/// codec mode, dynamic payload number.
#[derive(Debug, Clone, Copy)]
pub struct Capability {
    pub payload_id: u32,
    pub max_frames: u32,
    pub codec_mode: u8,
    pub dyn_payload: u8,
}

/// The seven codecs this station claims, in preference order.
pub const CAPABILITIES: [Capability; 7] = [
    Capability { payload_id: 0x04, max_frames: 40, codec_mode: 0, dyn_payload: 0 }, // G.711 ulaw
    Capability { payload_id: 0x02, max_frames: 40, codec_mode: 0, dyn_payload: 0 }, // G.711 alaw
    Capability { payload_id: 0x0B, max_frames: 60, codec_mode: 0, dyn_payload: 0 }, // G.729
    Capability { payload_id: 0x0C, max_frames: 60, codec_mode: 0, dyn_payload: 0 }, // G.729 Annex A
    Capability { payload_id: 0x0F, max_frames: 60, codec_mode: 0, dyn_payload: 0 }, // G.729 Annex B
    Capability { payload_id: 0x12, max_frames: 60, codec_mode: 0, dyn_payload: 0 }, // GSM full rate
    Capability { payload_id: 0x56, max_frames: 60, codec_mode: 3, dyn_payload: 98 }, // iLBC
];

/// CUCM expects exactly this many 16-byte capability records, zero-filled
/// past the advertised count.
pub const CAPABILITY_SLOTS: usize = 18;

/// CapabilitiesRes (0x0010) body: cap count + 18 fixed records.
pub fn encode_capabilities_res() -> Vec<u8> {
    let mut w = FieldWriter::new();
    w.u32(CAPABILITIES.len() as u32);
    for cap in CAPABILITIES {
        w.u32(cap.payload_id)
            .u32(cap.max_frames)
            .u8(cap.codec_mode)
            .u8(cap.dyn_payload)
            .u8(0)
            .u8(0)
            .u32(0);
    }
    for _ in CAPABILITIES.len()..CAPABILITY_SLOTS {
        w.raw(&[0u8; 16]);
    }
    w.finish()
}

/// ConfigStatRes (0x0093).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigStatRes {
    pub device_name: String,
    pub instance: u32,
    pub user_name: String,
    pub server_name: String,
    pub number_of_lines: u32,
    pub number_of_speed_dials: u32,
}

impl ConfigStatRes {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(payload);
        let device_name = r.ascii(16)?;
        let _reserved = r.u32()?;
        let instance = r.u32()?;
        let user_name = r.ascii(40)?;
        let server_name = r.ascii(40)?;
        let number_of_lines = r.u32()?;
        let number_of_speed_dials = r.u32_or(0);
        Ok(Self {
            device_name,
            instance,
            user_name,
            server_name,
            number_of_lines,
            number_of_speed_dials,
        })
    }
}

/// LineStatRes (0x0092).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineStatRes {
    pub line: u32,
    pub dir_number: String,
    pub fully_qualified_name: String,
    pub text_label: String,
    pub display_options: u32,
}

impl LineStatRes {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(payload);
        Ok(Self {
            line: r.u32()?,
            dir_number: r.ascii(24)?,
            fully_qualified_name: r.ascii(40)?,
            text_label: r.ascii(40)?,
            display_options: r.u32_or(0),
        })
    }
}

/// ForwardStatRes (0x0090): per-line forward all/busy/no-answer state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardStatRes {
    pub active_forward: u32,
    pub line: u32,
    pub forward_all_active: u32,
    pub forward_all_number: String,
    pub forward_busy_active: u32,
    pub forward_busy_number: String,
    pub forward_no_answer_active: u32,
    pub forward_no_answer_number: String,
}

impl ForwardStatRes {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(payload);
        Ok(Self {
            active_forward: r.u32()?,
            line: r.u32()?,
            forward_all_active: r.u32()?,
            forward_all_number: r.ascii(24)?,
            forward_busy_active: r.u32_or(0),
            forward_busy_number: r.ascii_or(24),
            forward_no_answer_active: r.u32_or(0),
            forward_no_answer_number: r.ascii_or(24),
        })
    }
}

/// SpeedDialStatRes (0x0091).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeedDialStatRes {
    pub index: u32,
    pub dir_number: String,
    pub display_name: String,
}

impl SpeedDialStatRes {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(payload);
        Ok(Self {
            index: r.u32()?,
            dir_number: r.ascii(24)?,
            display_name: r.ascii(40)?,
        })
    }
}

/// TimeDateRes (0x0094): nine 32-bit words of Windows-style calendar time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeDateRes {
    pub year: u32,
    pub month: u32,
    pub day_of_week: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub millisecond: u32,
    pub system_time: u32,
}

impl TimeDateRes {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(payload);
        Ok(Self {
            year: r.u32()?,
            month: r.u32()?,
            day_of_week: r.u32()?,
            day: r.u32()?,
            hour: r.u32()?,
            minute: r.u32()?,
            second: r.u32()?,
            millisecond: r.u32_or(0),
            system_time: r.u32_or(0),
        })
    }
}

/// One phone button: which line/speed-dial instance it is bound to.
/// Type 9 is a line key, type 2 a speed dial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonDef {
    pub instance: u8,
    pub button_type: u8,
}

pub const BUTTON_TYPE_SPEED_DIAL: u8 = 2;
pub const BUTTON_TYPE_LINE: u8 = 9;

/// ButtonTemplateRes (0x0097).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonTemplateRes {
    pub offset: u32,
    pub count: u32,
    pub total_count: u32,
    pub buttons: Vec<ButtonDef>,
}

impl ButtonTemplateRes {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(payload);
        let offset = r.u32()?;
        let count = r.u32()?;
        let total_count = r.u32()?;
        let mut buttons = Vec::new();
        for _ in 0..count {
            // low byte instance, high byte type
            let Ok(word) = r.u16() else { break };
            buttons.push(ButtonDef {
                instance: (word & 0xFF) as u8,
                button_type: (word >> 8) as u8,
            });
        }
        Ok(Self {
            offset,
            count,
            total_count,
            buttons,
        })
    }
}

/// One downloadable softkey: display label plus the event code SoftKeyEvent
/// sends back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftKeyDef {
    pub label: String,
    pub event: u32,
}

/// SoftKeyTemplateRes (0x0108): count x 20-byte entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftKeyTemplateRes {
    pub offset: u32,
    pub count: u32,
    pub total_count: u32,
    pub keys: Vec<SoftKeyDef>,
}

impl SoftKeyTemplateRes {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(payload);
        let offset = r.u32()?;
        let count = r.u32()?;
        let total_count = r.u32()?;
        let mut keys = Vec::new();
        for _ in 0..count {
            let Ok(label) = r.ascii(16) else { break };
            let Ok(event) = r.u32() else { break };
            keys.push(SoftKeyDef { label, event });
        }
        Ok(Self {
            offset,
            count,
            total_count,
            keys,
        })
    }
}

/// Positions per softkey set on the wire.
pub const SOFTKEY_SET_POSITIONS: usize = 16;

/// One softkey set: for each of 16 screen positions, an index into the
/// softkey template and an info (help) index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftKeySetDef {
    pub template_indexes: [u8; SOFTKEY_SET_POSITIONS],
    pub info_indexes: [u16; SOFTKEY_SET_POSITIONS],
}

/// SoftKeySetRes (0x0109): count x 48-byte set definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftKeySetRes {
    pub offset: u32,
    pub count: u32,
    pub total_count: u32,
    pub sets: Vec<SoftKeySetDef>,
}

impl SoftKeySetRes {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(payload);
        let offset = r.u32()?;
        let count = r.u32()?;
        let total_count = r.u32()?;
        let mut sets = Vec::new();
        for _ in 0..count {
            if r.remaining() < 48 {
                break;
            }
            let mut def = SoftKeySetDef {
                template_indexes: [0; SOFTKEY_SET_POSITIONS],
                info_indexes: [0; SOFTKEY_SET_POSITIONS],
            };
            for slot in def.template_indexes.iter_mut() {
                *slot = r.u8()?;
            }
            for slot in def.info_indexes.iter_mut() {
                *slot = r.u16()?;
            }
            sets.push(def);
        }
        Ok(Self {
            offset,
            count,
            total_count,
            sets,
        })
    }
}

/// SelectSoftKeys (0x0110): which set is live for a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectSoftKeys {
    pub line: u32,
    pub call_reference: u32,
    pub softkey_set_index: u32,
    pub valid_key_mask: u32,
}

impl SelectSoftKeys {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new(payload);
        Ok(Self {
            line: r.u32()?,
            call_reference: r.u32()?,
            softkey_set_index: r.u32()?,
            valid_key_mask: r.u32_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capabilities_res_is_exactly_292_bytes() {
        let body = encode_capabilities_res();
        // cap count word + 18 records of 16 bytes; frame length field adds 4
        assert_eq!(body.len(), 4 + CAPABILITY_SLOTS * 16);
        assert_eq!(&body[..4], &7u32.to_le_bytes());
        // first record is ulaw
        assert_eq!(&body[4..8], &4u32.to_le_bytes());
        assert_eq!(&body[8..12], &40u32.to_le_bytes());
        // iLBC record carries mode 3, dynamic payload 98
        let ilbc = &body[4 + 6 * 16..4 + 7 * 16];
        assert_eq!(&ilbc[..4], &0x56u32.to_le_bytes());
        assert_eq!(ilbc[8], 3);
        assert_eq!(ilbc[9], 98);
        // padding slots all zero
        assert!(body[4 + 7 * 16..].iter().all(|&b| b == 0));
    }

    #[test]
    fn button_template_splits_packed_words() {
        let mut w = FieldWriter::new();
        w.u32(0).u32(3).u32(3);
        w.u16(0x0901); // line 1
        w.u16(0x0902); // line 2
        w.u16(0x0201); // speed dial 1
        let res = ButtonTemplateRes::decode(&w.finish()).unwrap();
        assert_eq!(res.buttons.len(), 3);
        assert_eq!(res.buttons[0], ButtonDef { instance: 1, button_type: BUTTON_TYPE_LINE });
        assert_eq!(res.buttons[2], ButtonDef { instance: 1, button_type: BUTTON_TYPE_SPEED_DIAL });
    }

    #[test]
    fn softkey_template_entries() {
        let mut w = FieldWriter::new();
        w.u32(0).u32(2).u32(2);
        w.ascii("Redial", 16).u32(1);
        w.ascii("NewCall", 16).u32(2);
        let res = SoftKeyTemplateRes::decode(&w.finish()).unwrap();
        assert_eq!(res.keys.len(), 2);
        assert_eq!(res.keys[0], SoftKeyDef { label: "Redial".into(), event: 1 });
        assert_eq!(res.keys[1].label, "NewCall");
    }

    #[test]
    fn softkey_set_truncated_entry_is_dropped() {
        let mut w = FieldWriter::new();
        w.u32(0).u32(2).u32(2);
        // one full 48-byte set
        for i in 0..16u8 {
            w.u8(i);
        }
        for i in 0..16u16 {
            w.u16(300 + i);
        }
        // second set cut off after 10 bytes
        w.raw(&[0u8; 10]);
        let res = SoftKeySetRes::decode(&w.finish()).unwrap();
        assert_eq!(res.sets.len(), 1);
        assert_eq!(res.sets[0].template_indexes[3], 3);
        assert_eq!(res.sets[0].info_indexes[0], 300);
    }

    #[test]
    fn line_stat_full_and_truncated_options() {
        let mut w = FieldWriter::new();
        w.u32(1)
            .ascii("2000", 24)
            .ascii("2000 Lobby", 40)
            .ascii("Lobby", 40);
        let res = LineStatRes::decode(&w.finish()).unwrap();
        assert_eq!(res.line, 1);
        assert_eq!(res.dir_number, "2000");
        assert_eq!(res.text_label, "Lobby");
        assert_eq!(res.display_options, 0);
    }

    #[test]
    fn time_date_decodes() {
        let mut w = FieldWriter::new();
        for v in [2024u32, 6, 6, 15, 10, 30, 0, 0, 1718447400] {
            w.u32(v);
        }
        let res = TimeDateRes::decode(&w.finish()).unwrap();
        assert_eq!(res.year, 2024);
        assert_eq!(res.month, 6);
        assert_eq!(res.day, 15);
        assert_eq!(res.system_time, 1718447400);
    }
}
