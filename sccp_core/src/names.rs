//! Enum and name tables CUCM shares with its stations. Unknown numeric
//! values are preserved, never rejected.

/// Call leg state as carried in CallState (0x0111).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Idle,
    OffHook,
    OnHook,
    RingOut,
    RingIn,
    Connected,
    Busy,
    Congestion,
    Hold,
    CallWaiting,
    CallTransfer,
    CallPark,
    Proceed,
    CallRxOffer,
    Unknown(u32),
}

impl CallState {
    pub fn from_u32(v: u32) -> Self {
        match v {
            0 => Self::Idle,
            1 => Self::OffHook,
            2 => Self::OnHook,
            3 => Self::RingOut,
            4 => Self::RingIn,
            5 => Self::Connected,
            6 => Self::Busy,
            7 => Self::Congestion,
            8 => Self::Hold,
            9 => Self::CallWaiting,
            10 => Self::CallTransfer,
            11 => Self::CallPark,
            12 => Self::Proceed,
            13 => Self::CallRxOffer,
            other => Self::Unknown(other),
        }
    }

    pub fn as_u32(self) -> u32 {
        match self {
            Self::Idle => 0,
            Self::OffHook => 1,
            Self::OnHook => 2,
            Self::RingOut => 3,
            Self::RingIn => 4,
            Self::Connected => 5,
            Self::Busy => 6,
            Self::Congestion => 7,
            Self::Hold => 8,
            Self::CallWaiting => 9,
            Self::CallTransfer => 10,
            Self::CallPark => 11,
            Self::Proceed => 12,
            Self::CallRxOffer => 13,
            Self::Unknown(v) => v,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::OffHook => "OffHook",
            Self::OnHook => "OnHook",
            Self::RingOut => "RingOut",
            Self::RingIn => "RingIn",
            Self::Connected => "Connected",
            Self::Busy => "Busy",
            Self::Congestion => "Congestion",
            Self::Hold => "Hold",
            Self::CallWaiting => "CallWaiting",
            Self::CallTransfer => "CallTransfer",
            Self::CallPark => "CallPark",
            Self::Proceed => "Proceed",
            Self::CallRxOffer => "CallRxOffer",
            Self::Unknown(_) => "UNKNOWN",
        }
    }

    /// A call leg occupies the phone unless it is idle or hung up.
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Idle | Self::OnHook)
    }

    pub fn is_ringing(self) -> bool {
        matches!(self, Self::RingIn | Self::RingOut)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallType {
    Inbound,
    Outbound,
    Unknown(u32),
}

impl CallType {
    pub fn from_u32(v: u32) -> Self {
        match v {
            1 => Self::Inbound,
            2 => Self::Outbound,
            other => Self::Unknown(other),
        }
    }

    pub fn as_u32(self) -> u32 {
        match self {
            Self::Inbound => 1,
            Self::Outbound => 2,
            Self::Unknown(v) => v,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Inbound => "InBoundCall",
            Self::Outbound => "OutBoundCall",
            Self::Unknown(_) => "UNKNOWN",
        }
    }
}

/// Softkey template index -> canonical label (the template the server
/// downloads uses the same ordering).
pub fn softkey_template_name(index: u32) -> &'static str {
    match index {
        0 => "Undefined",
        1 => "Redial",
        2 => "NewCall",
        3 => "Hold",
        4 => "Transfer",
        5 => "CfwdAll",
        6 => "CfwdBusy",
        7 => "CfwdNoAnswer",
        8 => "BackSpace",
        9 => "EndCall",
        10 => "Resume",
        11 => "Answer",
        12 => "Info",
        13 => "Confrn",
        14 => "Park",
        15 => "Join",
        16 => "MeetMe",
        17 => "Pickup",
        18 => "GrpPickup",
        19 => "Monitor",
        20 => "CallBack",
        21 => "Select",
        22 => "Page",
        23 => "Exit",
        24 => "DirTrfr",
        25 => "EditDial",
        26 => "TrnsfVM",
        27 => "Intrude",
        28 => "Private",
        29 => "RmLstC",
        30 => "Save",
        31 => "Delete",
        32 => "Dial",
        33 => "ConfList",
        34 => "SelectList",
        35 => "Barge",
        36 => "cBarge",
        37 => "ReDial",
        38 => "DND",
        39 => "DivAll",
        40 => "CallInfo",
        41 => "Update",
        42 => "Cancel",
        43 => "CallSelect",
        _ => "UNKNOWN",
    }
}

pub fn softkey_info_name(index: u32) -> &'static str {
    match index {
        0 => "Undefined",
        301 => "Redial",
        302 => "NewCall",
        303 => "Hold",
        304 => "Transfer",
        305 => "CfwdAll",
        306 => "CfwdBusy",
        307 => "CfwdNoAnswer",
        308 => "BackSpace",
        309 => "EndCall",
        310 => "Resume",
        311 => "Answer",
        312 => "Info",
        313 => "Confrn",
        314 => "Park",
        315 => "Join",
        316 => "MeetMe",
        317 => "Pickup",
        318 => "GrpPickup",
        319 => "ToVoicemail",
        320 => "Select",
        321 => "Barge",
        322 => "cBarge",
        323 => "DND",
        324 => "DivAll",
        325 => "CallInfo",
        326 => "Update",
        327 => "Cancel",
        328 => "Immediate Divert",
        329 => "Video Mode",
        330 => "Intercept",
        331 => "Record",
        332 => "TrnsfVM",
        333 => "Conference Barge",
        _ => "UNKNOWN",
    }
}

/// Softkey set (keyset) index -> call-plane name.
pub fn keyset_name(index: u32) -> &'static str {
    match index {
        0 => "On Hook",
        1 => "Connected",
        2 => "On Hold",
        3 => "Ring In",
        4 => "Off Hook",
        5 => "Connected Transferable",
        6 => "Digits Following",
        7 => "Connected Conference",
        8 => "Ring Out",
        9 => "Off Hook with Features",
        10 => "In Transfer",
        11 => "Connected Conference Join",
        12 => "Connected Monitored",
        13 => "Call Park",
        14 => "Call Pickup",
        _ => "UNKNOWN",
    }
}

pub fn stimulus_name(stimulus: u32) -> &'static str {
    match stimulus {
        1 => "Headset",
        2 => "Mute",
        3 => "Speaker",
        4 => "Transfer",
        5 => "Hold",
        6 => "Redial",
        7 => "NewCall",
        8 => "CallBack",
        9 => "Line",
        10 => "Messages",
        11 => "Directories",
        12 => "Services",
        13 => "Settings",
        14 => "HeadsetHook",
        15 => "MuteHook",
        16 => "SpeakerHook",
        17 => "CallForward",
        18 => "Applications",
        19 => "DoNotDisturb",
        20 => "Broadcast",
        125 => "Conference",
        126 => "CallPark",
        127 => "HeadsetLED",
        _ => "UNKNOWN",
    }
}

pub fn tone_name(tone: u32) -> &'static str {
    match tone {
        0x00 => "Silence",
        0x01 => "Dtmf0",
        0x02 => "Dtmf1",
        0x03 => "Dtmf2",
        0x04 => "Dtmf3",
        0x05 => "Dtmf4",
        0x06 => "Dtmf5",
        0x07 => "Dtmf6",
        0x08 => "Dtmf7",
        0x09 => "Dtmf8",
        0x0A => "Dtmf9",
        0x0B => "DtmfStar",
        0x0C => "DtmfPound",
        0x20 => "DialTone",
        0x21 => "InsideDialTone",
        0x22 => "OutsideDialTone",
        0x23 => "LineBusyTone",
        0x24 => "AlertingTone",
        0x25 => "ReorderTone",
        0x26 => "RecorderWarningTone",
        0x27 => "RecorderDetectedTone",
        0x28 => "ReorderToneFast",
        0x29 => "BusyVerificationTone",
        0x2A => "CallWaitingTone",
        0x2B => "StutterDialTone",
        0x2C => "HowlerTone",
        0x2D => "ManagerBargeTone",
        0x2E => "ForcedAuthorizationTone",
        0x2F => "PriorityCallTone",
        0x30 => "AutoAnswerTone",
        0x31 => "ZipZip",
        0x32 => "BeepBonk",
        0x33 => "InsideDialTone",
        0x34 => "DistinctiveRing1",
        0x35 => "DistinctiveRing2",
        0x36 => "DistinctiveRing3",
        0x37 => "MultilineRingingTone",
        0x38 => "PickupTone",
        0x39 => "RemindTone",
        0x3A => "HoldTone",
        0x3B => "RemoteHoldTone",
        0x3C => "SharedLineAlert",
        0x3D => "CoachingTone",
        0x3E => "SilentMonitorTone",
        _ => "UNKNOWN",
    }
}

pub fn unregister_status_name(status: u32) -> &'static str {
    match status {
        0 => "Ok",
        2 => "NAK",
        _ => "UNKNOWN",
    }
}

/// Device type enums as CUCM knows them, keyed by marketing model name.
/// Accepts "Cisco 7940" or the bare "7940".
pub fn device_type_from_model(model: &str) -> Option<u32> {
    let m = model.trim().to_ascii_lowercase();
    let short = m.strip_prefix("cisco ").unwrap_or(&m);
    let enum_for = |name: &str| -> Option<u32> {
        Some(match name {
            "7910" => 6,
            "7960" => 7,
            "7940" => 8,
            "7935" => 9,
            "7941" => 115,
            "7971" => 119,
            "7985" => 302,
            "7911" => 307,
            "7961g-ge" => 308,
            "7941g-ge" => 309,
            "7931" => 348,
            "7921" => 365,
            "7906" => 369,
            "7962" => 404,
            "3951" => 412,
            "7937" => 431,
            "7942" => 434,
            "7945" => 435,
            "7965" => 436,
            "7975" => 437,
            "7925" => 484,
            "9971" => 493,
            "6921" => 495,
            "6941" => 496,
            "6961" => 497,
            "9951" => 537,
            "8961" => 540,
            "7905" => 20000,
            "7920" => 30002,
            "7970" => 30006,
            "7912" => 30007,
            "7902" => 30008,
            "ip communicator" => 30016,
            "7961" => 30018,
            "7936" => 30019,
            _ => return None,
        })
    };
    enum_for(short).or_else(|| enum_for(&m))
}

pub fn device_type_name(device_type: u32) -> &'static str {
    match device_type {
        6 => "Cisco 7910",
        7 => "Cisco 7960",
        8 => "Cisco 7940",
        9 => "Cisco 7935",
        115 => "Cisco 7941",
        119 => "Cisco 7971",
        302 => "Cisco 7985",
        307 => "Cisco 7911",
        308 => "Cisco 7961G-GE",
        309 => "Cisco 7941G-GE",
        348 => "Cisco 7931",
        365 => "Cisco 7921",
        369 => "Cisco 7906",
        404 => "Cisco 7962",
        412 => "Cisco 3951",
        431 => "Cisco 7937",
        434 => "Cisco 7942",
        435 => "Cisco 7945",
        436 => "Cisco 7965",
        437 => "Cisco 7975",
        484 => "Cisco 7925",
        493 => "Cisco 9971",
        495 => "Cisco 6921",
        496 => "Cisco 6941",
        497 => "Cisco 6961",
        537 => "Cisco 9951",
        540 => "Cisco 8961",
        20000 => "Cisco 7905",
        30002 => "Cisco 7920",
        30006 => "Cisco 7970",
        30007 => "Cisco 7912",
        30008 => "Cisco 7902",
        30016 => "Cisco IP Communicator",
        30018 => "Cisco 7961",
        30019 => "Cisco 7936",
        _ => "UNKNOWN",
    }
}

/// KeypadButton code -> DTMF character.
pub fn keypad_code_to_char(code: u32) -> Option<char> {
    match code {
        0..=9 => Some((b'0' + code as u8) as char),
        0x0E => Some('*'),
        0x0F => Some('#'),
        _ => None,
    }
}

pub fn char_to_keypad_code(ch: char) -> Option<u32> {
    match ch {
        '0'..='9' => Some(ch as u32 - '0' as u32),
        '*' => Some(0x0E),
        '#' => Some(0x0F),
        _ => None,
    }
}
