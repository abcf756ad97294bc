//! One registration session: the TCP transport, the shared state, the audio
//! command queue, and whatever RTP endpoints the server has opened. Inbound
//! handlers receive the session explicitly; nothing is captured ambiently.

use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};

use audio_mixer::MixerHandle;

use sccp_core::ids::{self, message_name};
use sccp_core::messages::{u32_body, KeypadButton, RegisterReq, SoftKeyEvent};
use sccp_core::{char_to_keypad_code, BUTTON_TYPE_LINE, BUTTON_TYPE_SPEED_DIAL};

use crate::config::{tone_wav_path, PhoneConfig};
use crate::event::Latch;
use crate::state::PhoneState;
use crate::tasks::rtp_rx::RtpReceiver;
use crate::tasks::rtp_tx::RtpSender;
use crate::transport::Transport;

/// RTP endpoints the server has asked us to run.
#[derive(Default)]
pub struct Media {
    pub sender: Option<RtpSender>,
    pub receiver: Option<RtpReceiver>,
}

pub struct Session {
    pub config: PhoneConfig,
    pub state: Arc<PhoneState>,
    pub transport: Transport,
    pub mixer: MixerHandle,
    pub media: Mutex<Media>,
    pub stop: Arc<Latch>,
    pub local_ip: Ipv4Addr,
}

impl Session {
    pub fn device_name(&self) -> &str {
        &self.config.device_name
    }

    /// Send one message, logging it. A send failure ends the session:
    /// the unregistered latch fires so no waiter hangs.
    pub fn send(&self, message_id: u32, body: &[u8]) {
        log::info!("({}) [SEND] {}", self.device_name(), message_name(message_id));
        if let Err(e) = self.transport.send(message_id, body) {
            log::error!(
                "({}) send {} failed: {e}",
                self.device_name(),
                message_name(message_id)
            );
            self.state.is_unregistered.set();
            self.stop.set();
        }
    }

    // ---- registration flow ---------------------------------------------

    pub fn send_register(&self) {
        let req = RegisterReq {
            device_name: self.config.device_name.clone(),
            instance: 0,
            station_ip: self.local_ip,
            device_type: self.config.device_type,
            max_rtp_streams: 5,
            active_rtp_streams: 1,
        };
        self.send(ids::REGISTER_REQ, &req.encode());
    }

    /// Everything we ask for right after the capabilities exchange.
    pub fn send_post_registration_requests(&self) {
        self.send(ids::BUTTON_TEMPLATE_REQ, &u32_body(8));
        self.send(ids::SOFT_KEY_TEMPLATE_REQ, &[]);
        self.send(ids::SOFT_KEY_SET_REQ, &[]);
        self.send(ids::CONFIG_STAT_REQ, &[]);
        self.send(ids::LINE_STAT_REQ, &u32_body(1));
        self.send(ids::FORWARD_STAT_REQ, &u32_body(1));
        let line_count = self.state.read().line_count;
        self.send(ids::REGISTER_AVAILABLE_LINES, &u32_body(line_count));
    }

    /// After ConfigStatRes: one LineStatReq per line button and one
    /// SpeedDialStatReq per speed-dial button, all in a single TCP write
    /// (CUCM orders its responses off that), then TimeDateReq.
    pub fn send_stat_burst(&self) {
        let (line_count, buttons) = {
            let inner = self.state.read();
            (inner.line_count, inner.button_template.clone())
        };

        let mut frames: Vec<(u32, Vec<u8>)> =
            vec![(ids::REGISTER_AVAILABLE_LINES, u32_body(line_count))];
        for button in buttons.values() {
            match button.button_type as u8 {
                BUTTON_TYPE_LINE => {
                    log::debug!(
                        "({}) [SEND] LineStatReq for line {}",
                        self.device_name(),
                        button.instance
                    );
                    frames.push((ids::LINE_STAT_REQ, u32_body(button.instance)));
                }
                BUTTON_TYPE_SPEED_DIAL => {
                    log::debug!(
                        "({}) [SEND] SpeedDialStatReq for speed dial {}",
                        self.device_name(),
                        button.instance
                    );
                    frames.push((ids::SPEED_DIAL_STAT_REQ, u32_body(button.instance)));
                }
                _ => {}
            }
        }

        if let Err(e) = self.transport.send_all(&frames) {
            log::error!("({}) stat burst failed: {e}", self.device_name());
            self.state.is_unregistered.set();
            self.stop.set();
            return;
        }
        self.send(ids::TIME_DATE_REQ, &[]);
    }

    // ---- user actions ---------------------------------------------------

    /// Press a softkey by its template label. With `call_reference` 0 the
    /// active call (if any) is targeted.
    pub fn press_softkey(&self, name: &str, line: u32, call_reference: u32) {
        let Some(event) = self.state.find_softkey_event(name) else {
            log::warn!("({}) no such softkey {name}", self.device_name());
            return;
        };

        let (line, call_reference) = if call_reference == 0 {
            self.state.active_call().unwrap_or((line.max(1), 0))
        } else {
            (line, call_reference)
        };

        log::info!(
            "[SEND] SoftKeyEvent lineNumber={line} callReference={call_reference} softKeyId={event}"
        );
        let body = SoftKeyEvent {
            event,
            line,
            call_reference,
        }
        .encode();
        if let Err(e) = self.transport.send(ids::SOFT_KEY_EVENT, &body) {
            log::error!("({}) SoftKeyEvent failed: {e}", self.device_name());
            self.state.is_unregistered.set();
            self.stop.set();
        }
    }

    /// Emit one DTMF digit as a KeypadButton.
    pub fn send_digit(&self, digit: char, line: u32, call_reference: u32) {
        let Some(code) = char_to_keypad_code(digit) else {
            log::warn!("({}) not a DTMF digit: {digit:?}", self.device_name());
            return;
        };
        let (line, call_reference) = if call_reference == 0 {
            self.state.active_call().unwrap_or((line.max(1), 0))
        } else {
            (line, call_reference)
        };
        log::info!(
            "[SEND] KeypadButton lineNumber={line} callReference={call_reference} keyPadBtn={code}"
        );
        let body = KeypadButton {
            button: code,
            line,
            call_reference,
        }
        .encode();
        if let Err(e) = self.transport.send(ids::KEYPAD_BUTTON, &body) {
            log::error!("({}) KeypadButton failed: {e}", self.device_name());
        }
    }

    /// Local key-press feedback through the mixer.
    pub fn play_beep(&self) {
        if let Some(path) = tone_wav_path(&self.config.tones_dir, 0) {
            self.mixer.play_wav_once(path, 0.0);
        }
    }

    /// Stop both RTP endpoints and drop their sockets.
    pub fn stop_media(&self) {
        let mut media = self.media.lock().unwrap();
        if let Some(mut sender) = media.sender.take() {
            sender.stop();
        }
        if let Some(mut receiver) = media.receiver.take() {
            receiver.stop();
        }
    }
}
