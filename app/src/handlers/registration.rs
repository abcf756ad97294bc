use std::sync::Arc;

use sccp_core::ids;
use sccp_core::messages::{encode_capabilities_res, RegisterAck, RegisterReject, UnregisterAck};
use sccp_core::unregister_status_name;

use super::decoded;
use crate::session::Session;

pub fn on_register_ack(session: &Arc<Session>, payload: &[u8]) {
    let Some(ack) = decoded("RegisterAck", session, RegisterAck::decode(payload)) else {
        return;
    };
    log::debug!("feature_flags={}", ack.feature_flags);

    {
        let mut inner = session.state.write();
        inner.keepalive_interval = ack.keepalive_interval.max(1);
        inner.second_keepalive_interval = ack.secondary_keepalive_interval;
        inner.date_template = ack.date_template;
        inner.feature_flags = ack.feature_flags;
    }

    log::info!("({}) [RECV] RegisterAck", session.device_name());
}

pub fn on_register_reject(session: &Arc<Session>, payload: &[u8]) {
    let reject = RegisterReject::decode(payload);
    log::error!(
        "({}) [RECV] RegisterReject {}",
        session.device_name(),
        reject.reason
    );
    if reject.reason.is_empty() {
        // non-ASCII reason: keep the evidence
        log::debug!("RegisterReject raw reason: {:02x?}", reject.raw);
    }

    session.state.is_unregistered.set();
    session.stop.set();
}

pub fn on_keep_alive_ack(session: &Arc<Session>, _payload: &[u8]) {
    log::info!("({}) [RECV] KeepAliveAck", session.device_name());
}

pub fn on_unregister_ack(session: &Arc<Session>, payload: &[u8]) {
    let status = UnregisterAck::decode(payload).map(|a| a.status).unwrap_or(0);
    if status != 0 {
        log::error!(
            "({}) [RECV] UnregisterAck response {} ({status})",
            session.device_name(),
            unregister_status_name(status)
        );
    }
    log::info!("({}) [RECV] UnregisterAck", session.device_name());

    session.state.is_unregistered.set();
    session.stop.set();
}

/// CUCM asks for our codec set; answering it kicks off the rest of the
/// registration download.
pub fn on_capabilities_req(session: &Arc<Session>, _payload: &[u8]) {
    log::info!("({}) [RECV] CapabilitiesReq", session.device_name());
    session.send(ids::CAPABILITIES_RES, &encode_capabilities_res());
    session.send_post_registration_requests();
}
