use std::collections::BTreeMap;
use std::sync::Arc;

use sccp_core::messages::{
    ButtonTemplateRes, ConfigStatRes, ForwardStatRes, LineStatRes, SelectSoftKeys,
    SoftKeySetRes, SoftKeyTemplateRes, SpeedDialStatRes, TimeDateRes,
};

use super::decoded;
use crate::session::Session;
use crate::state::{
    ButtonEntry, ForwardEntry, LineEntry, ServerTime, SoftKeyEntry, SoftKeySetEntry,
    SpeedDialEntry,
};

pub fn on_config_stat_res(session: &Arc<Session>, payload: &[u8]) {
    let Some(msg) = decoded("ConfigStatRes", session, ConfigStatRes::decode(payload)) else {
        return;
    };
    {
        let mut inner = session.state.write();
        inner.line_count = msg.number_of_lines;
        inner.speed_dial_count = msg.number_of_speed_dials;
        inner.instance = msg.instance;
        inner.user_name = msg.user_name;
        inner.server_name = msg.server_name;
    }
    log::info!("({}) [RECV] ConfigStatRes", session.device_name());

    session.send_stat_burst();
}

pub fn on_line_stat_res(session: &Arc<Session>, payload: &[u8]) {
    let Some(msg) = decoded("LineStatRes", session, LineStatRes::decode(payload)) else {
        return;
    };
    session.state.write().lines.insert(
        msg.line,
        LineEntry {
            dir_number: msg.dir_number,
            fully_qualified_name: msg.fully_qualified_name,
            text_label: msg.text_label,
            display_options: msg.display_options,
        },
    );
    log::info!("({}) [RECV] LineStatRes", session.device_name());
}

pub fn on_forward_stat_res(session: &Arc<Session>, payload: &[u8]) {
    let Some(msg) = decoded("ForwardStatRes", session, ForwardStatRes::decode(payload)) else {
        return;
    };
    {
        let mut inner = session.state.write();
        inner.active_forward = msg.active_forward;
        inner.call_forward.insert(
            msg.line,
            ForwardEntry {
                forward_all_active: msg.forward_all_active,
                forward_all_number: msg.forward_all_number,
                forward_busy_active: msg.forward_busy_active,
                forward_busy_number: msg.forward_busy_number,
                forward_no_answer_active: msg.forward_no_answer_active,
                forward_no_answer_number: msg.forward_no_answer_number,
            },
        );
    }
    log::info!("({}) [RECV] ForwardStatRes", session.device_name());
}

pub fn on_speed_dial_stat_res(session: &Arc<Session>, payload: &[u8]) {
    let Some(msg) = decoded("SpeedDialStatRes", session, SpeedDialStatRes::decode(payload))
    else {
        return;
    };
    session.state.write().speed_dials.insert(
        msg.index,
        SpeedDialEntry {
            dir_number: msg.dir_number,
            display_name: msg.display_name,
        },
    );
    log::info!("({}) [RECV] SpeedDialStatRes", session.device_name());
}

pub fn on_button_template_res(session: &Arc<Session>, payload: &[u8]) {
    let Some(msg) = decoded("ButtonTemplateRes", session, ButtonTemplateRes::decode(payload))
    else {
        return;
    };
    {
        let mut inner = session.state.write();
        inner.button_template.clear();
        for (i, button) in msg.buttons.iter().enumerate() {
            inner.button_template.insert(
                i as u32 + 1,
                ButtonEntry {
                    instance: button.instance as u32,
                    button_type: button.button_type as u32,
                },
            );
        }
    }
    log::info!("({}) [RECV] ButtonTemplateRes", session.device_name());
}

pub fn on_softkey_template_res(session: &Arc<Session>, payload: &[u8]) {
    let Some(msg) = decoded(
        "SoftKeyTemplateRes",
        session,
        SoftKeyTemplateRes::decode(payload),
    ) else {
        return;
    };
    {
        let mut inner = session.state.write();
        inner.softkey_template.clear();
        for (i, key) in msg.keys.iter().enumerate() {
            inner.softkey_template.insert(
                i as u32 + 1,
                SoftKeyEntry {
                    label: key.label.clone(),
                    event: key.event,
                },
            );
        }
    }
    log::info!("({}) [RECV] SoftKeyTemplateRes", session.device_name());
}

pub fn on_softkey_set_res(session: &Arc<Session>, payload: &[u8]) {
    let Some(msg) = decoded("SoftKeySetRes", session, SoftKeySetRes::decode(payload)) else {
        return;
    };
    {
        let mut inner = session.state.write();
        inner.softkey_sets.clear();
        for (set_index, set) in msg.sets.iter().enumerate() {
            let mut positions = BTreeMap::new();
            for (pos, (&template_index, &info_index)) in set
                .template_indexes
                .iter()
                .zip(set.info_indexes.iter())
                .enumerate()
            {
                // position 0 is meaningful even when empty
                if pos == 0 || template_index != 0 {
                    positions.insert(
                        pos as u32,
                        SoftKeySetEntry {
                            template_index: template_index as u32,
                            info_index: info_index as u32,
                        },
                    );
                }
            }
            inner.softkey_sets.insert(set_index as u32, positions);
        }
    }
    log::info!("({}) [RECV] SoftKeySetRes", session.device_name());
}

pub fn on_select_softkeys(session: &Arc<Session>, payload: &[u8]) {
    let Some(msg) = decoded("SelectSoftKeys", session, SelectSoftKeys::decode(payload)) else {
        return;
    };
    session.state.select_softkeys(
        msg.line,
        msg.call_reference,
        msg.softkey_set_index,
        msg.valid_key_mask,
    );
    log::info!("({}) [RECV] SelectSoftKeys", session.device_name());
}

pub fn on_time_date_res(session: &Arc<Session>, payload: &[u8]) {
    let Some(msg) = decoded("TimeDateRes", session, TimeDateRes::decode(payload)) else {
        return;
    };
    session.state.write().server_time = Some(ServerTime {
        year: msg.year,
        month: msg.month,
        day: msg.day,
        day_of_week: msg.day_of_week,
        hour: msg.hour,
        minute: msg.minute,
        second: msg.second,
        system_time: msg.system_time,
    });
    log::info!("({}) [RECV] TimeDateRes", session.device_name());

    // the last download of the handshake: we are on the air
    session.state.is_registered.set();
}
