//! Inbound message routing: a static table from message id to a named
//! handler function. Handlers run on the receive thread, take the session
//! explicitly, and never block on the network. Unknown ids are logged and
//! dropped; the session continues.

use std::sync::Arc;

use sccp_core::ids;

use crate::handlers;
use crate::session::Session;

pub type Handler = fn(&Arc<Session>, &[u8]);

pub static HANDLERS: &[(u32, &str, Handler)] = &[
    (ids::REGISTER_ACK, "RegisterAck", handlers::registration::on_register_ack),
    (ids::REGISTER_REJECT, "RegisterReject", handlers::registration::on_register_reject),
    (ids::KEEP_ALIVE_ACK, "KeepAliveAck", handlers::registration::on_keep_alive_ack),
    (ids::UNREGISTER_ACK, "UnregisterAck", handlers::registration::on_unregister_ack),
    (ids::CAPABILITIES_REQ, "CapabilitiesReq", handlers::registration::on_capabilities_req),
    (ids::CONFIG_STAT_RES, "ConfigStatRes", handlers::setup::on_config_stat_res),
    (ids::LINE_STAT_RES, "LineStatRes", handlers::setup::on_line_stat_res),
    (ids::FORWARD_STAT_RES, "ForwardStatRes", handlers::setup::on_forward_stat_res),
    (ids::SPEED_DIAL_STAT_RES, "SpeedDialStatRes", handlers::setup::on_speed_dial_stat_res),
    (ids::BUTTON_TEMPLATE_RES, "ButtonTemplateRes", handlers::setup::on_button_template_res),
    (ids::SOFT_KEY_TEMPLATE_RES, "SoftKeyTemplateRes", handlers::setup::on_softkey_template_res),
    (ids::SOFT_KEY_SET_RES, "SoftKeySetRes", handlers::setup::on_softkey_set_res),
    (ids::SELECT_SOFT_KEYS, "SelectSoftKeys", handlers::setup::on_select_softkeys),
    (ids::TIME_DATE_RES, "TimeDateRes", handlers::setup::on_time_date_res),
    (ids::CALL_STATE, "CallState", handlers::call::on_call_state),
    (ids::CALL_INFO, "CallInfo", handlers::call::on_call_info),
    (ids::START_TONE, "StartTone", handlers::call::on_start_tone),
    (ids::STOP_TONE, "StopTone", handlers::call::on_stop_tone),
    (ids::SET_RINGER, "SetRinger", handlers::call::on_set_ringer),
    (ids::SET_LAMP, "SetLamp", handlers::call::on_set_lamp),
    (ids::SET_SPEAKER_MODE, "SetSpeakerMode", handlers::call::on_set_speaker_mode),
    (ids::ACTIVATE_CALL_PLANE, "ActivateCallPlane", handlers::call::on_activate_call_plane),
    (ids::KEYPAD_BUTTON, "KeypadButton", handlers::call::on_keypad_button),
    (ids::DIALED_NUMBER, "DialedNumber", handlers::call::on_dialed_number),
    (ids::CALL_SELECT_STAT_RES, "CallSelectStatRes", handlers::call::on_call_select_stat_res),
    (ids::DISPLAY_PROMPT_STATUS, "DisplayPromptStatus", handlers::display::on_display_prompt_status),
    (ids::CLEAR_PROMPT_STATUS, "ClearPromptStatus", handlers::display::on_clear_prompt_status),
    (ids::DISPLAY_NOTIFY, "DisplayNotify", handlers::display::on_display_notify),
    (ids::DISPLAY_PRI_NOTIFY, "DisplayPriNotify", handlers::display::on_display_pri_notify),
    (ids::START_MEDIA_TRANSMISSION, "StartMediaTransmission", handlers::media::on_start_media_transmission),
    (ids::STOP_MEDIA_TRANSMISSION, "StopMediaTransmission", handlers::media::on_stop_media_transmission),
    (ids::OPEN_RECEIVE_CHANNEL, "OpenReceiveChannel", handlers::media::on_open_receive_channel),
    (ids::CLOSE_RECEIVE_CHANNEL, "CloseReceiveChannel", handlers::media::on_close_receive_channel),
];

pub fn dispatch(session: &Arc<Session>, message_id: u32, payload: &[u8]) {
    match HANDLERS.iter().find(|(id, _, _)| *id == message_id) {
        Some((_, name, handler)) => {
            log::debug!("dispatching {name} (msg_id=0x{message_id:04X})");
            handler(session, payload);
        }
        None => {
            log::warn!(
                "({}) unhandled message id 0x{message_id:04X} / {message_id}",
                session.device_name()
            );
        }
    }
}

/// Name for an inbound id, or None if we do not handle it.
pub fn handled_message_name(message_id: u32) -> Option<&'static str> {
    HANDLERS
        .iter()
        .find(|(id, _, _)| *id == message_id)
        .map(|(_, name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_has_no_duplicate_ids() {
        for (i, (id, name, _)) in HANDLERS.iter().enumerate() {
            for (other_id, other_name, _) in &HANDLERS[i + 1..] {
                assert_ne!(id, other_id, "{name} and {other_name} share an id");
            }
        }
    }

    #[test]
    fn names_match_the_id_table() {
        for (id, name, _) in HANDLERS {
            assert_eq!(sccp_core::ids::message_name(*id), *name);
        }
        assert_eq!(handled_message_name(0x0111), Some("CallState"));
        assert_eq!(handled_message_name(0xFFFF), None);
    }
}
