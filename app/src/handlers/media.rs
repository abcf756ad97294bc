use std::net::SocketAddr;
use std::sync::Arc;

use sccp_core::ids;
use sccp_core::messages::{
    rtp_payload_type, CloseReceiveChannel, OpenReceiveChannel, OpenReceiveChannelAck,
    StartMediaTransmission, StopMediaTransmission,
};

use super::decoded;
use crate::config::PlayMode;
use crate::session::Session;
use crate::state::MediaSessionInfo;
use crate::tasks::rtp_tx::{RtpSender, RtpSenderConfig};

/// CUCM told us where to send audio: bring up the sender, point it at the
/// configured source, and flag media as started.
pub fn on_start_media_transmission(session: &Arc<Session>, payload: &[u8]) {
    let Some(msg) = decoded(
        "StartMediaTransmission",
        session,
        StartMediaTransmission::decode(payload),
    ) else {
        return;
    };

    let remote = SocketAddr::from((msg.remote_ip, msg.remote_port as u16));
    let mut config = RtpSenderConfig::new(remote);
    if msg.ms_per_packet > 0 {
        config.ptime_ms = msg.ms_per_packet;
    }
    config.payload_type = rtp_payload_type(msg.compression_type);

    let sender = match RtpSender::start(config) {
        Ok(s) => s,
        Err(e) => {
            log::error!("({}) RTP sender failed to start: {e}", session.device_name());
            return;
        }
    };

    match &session.config.play_mode {
        PlayMode::Silent => {
            log::debug!("RTP sending mode: silence");
        }
        PlayMode::Microphone => {
            log::debug!("RTP sending mode: microphone");
            if let Err(e) = sender.send_microphone() {
                log::warn!("({}) microphone unavailable, sending silence: {e}", session.device_name());
            }
        }
        PlayMode::Wav(path) => {
            log::debug!("RTP sending mode: file {}", path.display());
            if let Err(e) = sender.send_wav(path, true) {
                log::warn!("({}) wav source failed, sending silence: {e}", session.device_name());
            }
        }
    }

    {
        let mut media = session.media.lock().unwrap();
        if let Some(mut old) = media.sender.replace(sender) {
            old.stop();
        }
    }
    session.state.write().media = Some(MediaSessionInfo {
        remote_ip: msg.remote_ip.to_string(),
        remote_port: msg.remote_port,
        ptime_ms: config.ptime_ms,
        payload_type: config.payload_type,
    });
    session.state.events.media_started.set();

    log::info!("({}) [RECV] StartMediaTransmission", session.device_name());
}

pub fn on_stop_media_transmission(session: &Arc<Session>, payload: &[u8]) {
    let Some(_msg) = decoded(
        "StopMediaTransmission",
        session,
        StopMediaTransmission::decode(payload),
    ) else {
        return;
    };

    if let Some(mut sender) = session.media.lock().unwrap().sender.take() {
        sender.stop();
    }
    session.state.write().media = None;
    session.state.events.media_started.clear();

    log::info!("({}) [RECV] StopMediaTransmission", session.device_name());
}

/// CUCM wants to send us audio: bind a receiver and answer with the local
/// address and port.
pub fn on_open_receive_channel(session: &Arc<Session>, payload: &[u8]) {
    let Some(msg) = decoded(
        "OpenReceiveChannel",
        session,
        OpenReceiveChannel::decode(payload),
    ) else {
        return;
    };
    log::info!("({}) [RECV] OpenReceiveChannel", session.device_name());

    let receiver = match crate::tasks::rtp_rx::RtpReceiver::start(session.mixer.clone()) {
        Ok(r) => r,
        Err(e) => {
            log::error!("({}) RTP receiver failed to start: {e}", session.device_name());
            return;
        }
    };
    let port = receiver.port();

    {
        let mut media = session.media.lock().unwrap();
        if let Some(mut old) = media.receiver.replace(receiver) {
            old.stop();
        }
    }

    let ack = OpenReceiveChannelAck {
        status: 0,
        station_ip: session.local_ip,
        port: port as u32,
        pass_through_party_id: msg.pass_through_party_id,
        call_reference: msg.call_reference,
    };
    log::info!(
        "({}) [SEND] OpenReceiveChannelAck -> IP: {}, Port: {port}, CallRef: {}",
        session.device_name(),
        session.local_ip,
        msg.call_reference
    );
    if let Err(e) = session
        .transport
        .send(ids::OPEN_RECEIVE_CHANNEL_ACK, &ack.encode())
    {
        log::error!("({}) OpenReceiveChannelAck failed: {e}", session.device_name());
        session.state.is_unregistered.set();
        session.stop.set();
    }
}

pub fn on_close_receive_channel(session: &Arc<Session>, payload: &[u8]) {
    let Some(_msg) = decoded(
        "CloseReceiveChannel",
        session,
        CloseReceiveChannel::decode(payload),
    ) else {
        return;
    };

    if let Some(mut receiver) = session.media.lock().unwrap().receiver.take() {
        receiver.stop();
    }

    log::info!("({}) [RECV] CloseReceiveChannel", session.device_name());
}
