//! SCCP message ids for the subset of the protocol an ordinary call
//! lifecycle uses.

// Station -> CallManager
pub const KEEP_ALIVE_REQ: u32 = 0x0000;
pub const REGISTER_REQ: u32 = 0x0001;
pub const KEYPAD_BUTTON: u32 = 0x0003;
pub const FORWARD_STAT_REQ: u32 = 0x0009;
pub const SPEED_DIAL_STAT_REQ: u32 = 0x000A;
pub const LINE_STAT_REQ: u32 = 0x000B;
pub const CONFIG_STAT_REQ: u32 = 0x000C;
pub const TIME_DATE_REQ: u32 = 0x000D;
pub const BUTTON_TEMPLATE_REQ: u32 = 0x000E;
pub const CAPABILITIES_RES: u32 = 0x0010;
pub const OPEN_RECEIVE_CHANNEL_ACK: u32 = 0x0022;
pub const SOFT_KEY_SET_REQ: u32 = 0x0025;
pub const SOFT_KEY_EVENT: u32 = 0x0026;
pub const UNREGISTER_REQ: u32 = 0x0027;
pub const SOFT_KEY_TEMPLATE_REQ: u32 = 0x0028;
pub const REGISTER_AVAILABLE_LINES: u32 = 0x002D;

// CallManager -> station
pub const REGISTER_ACK: u32 = 0x0081;
pub const START_TONE: u32 = 0x0082;
pub const STOP_TONE: u32 = 0x0083;
pub const SET_RINGER: u32 = 0x0085;
pub const SET_LAMP: u32 = 0x0086;
pub const SET_SPEAKER_MODE: u32 = 0x0088;
pub const START_MEDIA_TRANSMISSION: u32 = 0x008A;
pub const STOP_MEDIA_TRANSMISSION: u32 = 0x008B;
pub const CALL_INFO: u32 = 0x008F;
pub const FORWARD_STAT_RES: u32 = 0x0090;
pub const SPEED_DIAL_STAT_RES: u32 = 0x0091;
pub const LINE_STAT_RES: u32 = 0x0092;
pub const CONFIG_STAT_RES: u32 = 0x0093;
pub const TIME_DATE_RES: u32 = 0x0094;
pub const BUTTON_TEMPLATE_RES: u32 = 0x0097;
pub const CAPABILITIES_REQ: u32 = 0x009B;
pub const REGISTER_REJECT: u32 = 0x009D;
pub const KEEP_ALIVE_ACK: u32 = 0x0100;
pub const OPEN_RECEIVE_CHANNEL: u32 = 0x0105;
pub const CLOSE_RECEIVE_CHANNEL: u32 = 0x0106;
pub const SOFT_KEY_TEMPLATE_RES: u32 = 0x0108;
pub const SOFT_KEY_SET_RES: u32 = 0x0109;
pub const SELECT_SOFT_KEYS: u32 = 0x0110;
pub const CALL_STATE: u32 = 0x0111;
pub const DISPLAY_PROMPT_STATUS: u32 = 0x0112;
pub const CLEAR_PROMPT_STATUS: u32 = 0x0113;
pub const DISPLAY_NOTIFY: u32 = 0x0114;
pub const ACTIVATE_CALL_PLANE: u32 = 0x0116;
pub const UNREGISTER_ACK: u32 = 0x0118;
pub const DIALED_NUMBER: u32 = 0x011D;
pub const DISPLAY_PRI_NOTIFY: u32 = 0x0120;
pub const CALL_SELECT_STAT_RES: u32 = 0x0130;

/// Display name for a message id, either direction.
pub fn message_name(message_id: u32) -> &'static str {
    match message_id {
        KEEP_ALIVE_REQ => "KeepAliveReq",
        REGISTER_REQ => "RegisterReq",
        KEYPAD_BUTTON => "KeypadButton",
        FORWARD_STAT_REQ => "ForwardStatReq",
        SPEED_DIAL_STAT_REQ => "SpeedDialStatReq",
        LINE_STAT_REQ => "LineStatReq",
        CONFIG_STAT_REQ => "ConfigStatReq",
        TIME_DATE_REQ => "TimeDateReq",
        BUTTON_TEMPLATE_REQ => "ButtonTemplateReq",
        CAPABILITIES_RES => "CapabilitiesRes",
        OPEN_RECEIVE_CHANNEL_ACK => "OpenReceiveChannelAck",
        SOFT_KEY_SET_REQ => "SoftKeySetReq",
        SOFT_KEY_EVENT => "SoftKeyEvent",
        UNREGISTER_REQ => "UnregisterReq",
        SOFT_KEY_TEMPLATE_REQ => "SoftKeyTemplateReq",
        REGISTER_AVAILABLE_LINES => "RegisterAvailableLines",
        REGISTER_ACK => "RegisterAck",
        START_TONE => "StartTone",
        STOP_TONE => "StopTone",
        SET_RINGER => "SetRinger",
        SET_LAMP => "SetLamp",
        SET_SPEAKER_MODE => "SetSpeakerMode",
        START_MEDIA_TRANSMISSION => "StartMediaTransmission",
        STOP_MEDIA_TRANSMISSION => "StopMediaTransmission",
        CALL_INFO => "CallInfo",
        FORWARD_STAT_RES => "ForwardStatRes",
        SPEED_DIAL_STAT_RES => "SpeedDialStatRes",
        LINE_STAT_RES => "LineStatRes",
        CONFIG_STAT_RES => "ConfigStatRes",
        TIME_DATE_RES => "TimeDateRes",
        BUTTON_TEMPLATE_RES => "ButtonTemplateRes",
        CAPABILITIES_REQ => "CapabilitiesReq",
        REGISTER_REJECT => "RegisterReject",
        KEEP_ALIVE_ACK => "KeepAliveAck",
        OPEN_RECEIVE_CHANNEL => "OpenReceiveChannel",
        CLOSE_RECEIVE_CHANNEL => "CloseReceiveChannel",
        SOFT_KEY_TEMPLATE_RES => "SoftKeyTemplateRes",
        SOFT_KEY_SET_RES => "SoftKeySetRes",
        SELECT_SOFT_KEYS => "SelectSoftKeys",
        CALL_STATE => "CallState",
        DISPLAY_PROMPT_STATUS => "DisplayPromptStatus",
        CLEAR_PROMPT_STATUS => "ClearPromptStatus",
        DISPLAY_NOTIFY => "DisplayNotify",
        ACTIVATE_CALL_PLANE => "ActivateCallPlane",
        UNREGISTER_ACK => "UnregisterAck",
        DIALED_NUMBER => "DialedNumber",
        DISPLAY_PRI_NOTIFY => "DisplayPriNotify",
        CALL_SELECT_STAT_RES => "CallSelectStatRes",
        _ => "Unknown",
    }
}
