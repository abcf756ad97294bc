use std::sync::Arc;

use sccp_core::messages::{
    ActivateCallPlane, CallInfo, CallSelectStatRes, CallStateMsg, DialedNumber, KeypadButton,
    SetLamp, SetRinger, SetSpeakerMode, StartTone, StopTone,
};
use sccp_core::{keypad_code_to_char, stimulus_name, tone_name, CallState};

use super::decoded;
use crate::session::Session;
use crate::state::{DialedNumberEntry, LampEntry, RingerState};

pub fn on_call_state(session: &Arc<Session>, payload: &[u8]) {
    let Some(msg) = decoded("CallState", session, CallStateMsg::decode(payload)) else {
        return;
    };
    log::info!(
        "({}) [RECV] CallState {} ({}) line={} ref={}",
        session.device_name(),
        msg.state.name(),
        msg.state.as_u32(),
        msg.line,
        msg.call_reference
    );

    session.state.apply_call_state(&msg);

    if msg.state == CallState::RingIn && session.config.auto_answer {
        log::info!("({}) auto-answering ref={}", session.device_name(), msg.call_reference);
        session.press_softkey("Answer", msg.line, msg.call_reference);
    }
}

pub fn on_call_info(session: &Arc<Session>, payload: &[u8]) {
    let Some(info) = decoded("CallInfo", session, CallInfo::decode(payload)) else {
        return;
    };
    session.state.merge_call_info(&info);
    log::info!("({}) [RECV] CallInfo", session.device_name());
}

pub fn on_start_tone(session: &Arc<Session>, payload: &[u8]) {
    let Some(msg) = decoded("StartTone", session, StartTone::decode(payload)) else {
        return;
    };
    log::info!(
        "({}) [RECV] StartTone {} ({}) line={}",
        session.device_name(),
        tone_name(msg.tone),
        msg.tone,
        msg.line
    );
    session
        .mixer
        .set_tone(msg.line, msg.tone, session.config.tone_volume_db);
}

pub fn on_stop_tone(session: &Arc<Session>, payload: &[u8]) {
    let Some(msg) = decoded("StopTone", session, StopTone::decode(payload)) else {
        return;
    };
    log::info!("({}) [RECV] StopTone line={}", session.device_name(), msg.line);
    session.mixer.clear_tone(msg.line);
}

pub fn on_set_ringer(session: &Arc<Session>, payload: &[u8]) {
    let Some(msg) = decoded("SetRinger", session, SetRinger::decode(payload)) else {
        return;
    };
    session.state.write().ringer = RingerState {
        mode: msg.ring_mode,
        duration: msg.ring_duration,
        line: msg.line,
        call_reference: msg.call_reference,
    };
    log::info!("({}) [RECV] SetRinger", session.device_name());
}

pub fn on_set_lamp(session: &Arc<Session>, payload: &[u8]) {
    let Some(msg) = decoded("SetLamp", session, SetLamp::decode(payload)) else {
        return;
    };
    session.state.write().lamps.insert(
        msg.stimulus,
        LampEntry {
            stimulus_name: stimulus_name(msg.stimulus).into(),
            stimulus_instance: msg.stimulus_instance,
            mode: msg.lamp_mode,
        },
    );
    log::info!("({}) [RECV] SetLamp", session.device_name());
}

pub fn on_set_speaker_mode(session: &Arc<Session>, payload: &[u8]) {
    let Some(msg) = decoded("SetSpeakerMode", session, SetSpeakerMode::decode(payload)) else {
        return;
    };
    session.state.write().speaker_mode = msg.mode;
    log::info!("({}) [RECV] SetSpeakerMode", session.device_name());
}

pub fn on_activate_call_plane(session: &Arc<Session>, payload: &[u8]) {
    let Some(msg) = decoded("ActivateCallPlane", session, ActivateCallPlane::decode(payload))
    else {
        return;
    };
    session.state.write().active_call_line = msg.line;
    log::info!("({}) [RECV] ActivateCallPlane", session.device_name());
}

/// The server relaying local key presses back at us; this is where DTMF
/// digits enter the macro-visible buffer.
pub fn on_keypad_button(session: &Arc<Session>, payload: &[u8]) {
    let Some(msg) = decoded("KeypadButton", session, KeypadButton::decode(payload)) else {
        return;
    };
    log::info!("({}) [RECV] KeypadButton {}", session.device_name(), msg.button);

    if let Some(ch) = keypad_code_to_char(msg.button) {
        session.state.dtmf.push(ch);
    }
}

pub fn on_dialed_number(session: &Arc<Session>, payload: &[u8]) {
    let Some(msg) = decoded("DialedNumber", session, DialedNumber::decode(payload)) else {
        return;
    };
    session.state.write().dialed_number = Some(DialedNumberEntry {
        number: msg.number,
        line: msg.line,
        call_reference: msg.call_reference,
    });
    log::info!("({}) [RECV] DialedNumber", session.device_name());
}

pub fn on_call_select_stat_res(session: &Arc<Session>, payload: &[u8]) {
    let Some(msg) = decoded(
        "CallSelectStatRes",
        session,
        CallSelectStatRes::decode(payload),
    ) else {
        return;
    };
    log::info!(
        "({}) [RECV] CallSelectStatRes stat={} ref={}",
        session.device_name(),
        msg.call_select_stat,
        msg.call_reference
    );
}
