use std::sync::Arc;

use sccp_core::messages::{
    ClearPromptStatus, DisplayNotify, DisplayPriNotify, DisplayPromptStatus,
};

use super::decoded;
use crate::session::Session;

pub fn on_display_prompt_status(session: &Arc<Session>, payload: &[u8]) {
    let Some(msg) = decoded(
        "DisplayPromptStatus",
        session,
        DisplayPromptStatus::decode(payload),
    ) else {
        return;
    };
    session.state.update_prompt(
        &msg.prompt,
        msg.timeout,
        msg.line,
        msg.call_reference,
        &session.stop,
    );
    log::info!("({}) [RECV] DisplayPromptStatus", session.device_name());
}

pub fn on_clear_prompt_status(session: &Arc<Session>, payload: &[u8]) {
    let Some(msg) = decoded("ClearPromptStatus", session, ClearPromptStatus::decode(payload))
    else {
        return;
    };
    session
        .state
        .update_prompt("", 0, msg.line, msg.call_reference, &session.stop);
    log::info!("({}) [RECV] ClearPromptStatus", session.device_name());
}

pub fn on_display_notify(session: &Arc<Session>, payload: &[u8]) {
    let Some(msg) = decoded("DisplayNotify", session, DisplayNotify::decode(payload)) else {
        return;
    };
    session
        .state
        .update_prompt(&msg.text, msg.timeout, 0, 0, &session.stop);
    log::info!(
        "({}) [PROMPT] '{}' timeout={}",
        session.device_name(),
        msg.text,
        msg.timeout
    );
}

pub fn on_display_pri_notify(session: &Arc<Session>, payload: &[u8]) {
    let Some(msg) = decoded("DisplayPriNotify", session, DisplayPriNotify::decode(payload))
    else {
        return;
    };
    log::info!(
        "({}) [RECV] DisplayPriNotify priority={} '{}'",
        session.device_name(),
        msg.priority,
        msg.text
    );
}
