//! The control surface UIs and macros drive. A `Phone` owns the audio
//! engine for its whole lifetime and one `Session` per registration.

use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use audio_mixer::{Mixer, MixerConfig, MixerHandle};
use thiserror::Error;

use sccp_core::ids;

use crate::config::{local_ip_toward, tone_wav_path, PhoneConfig};
use crate::event::Latch;
use crate::session::{Media, Session};
use crate::state::{PhoneEvent, PhoneState};
use crate::tasks::{keepalive::spawn_keepalive_task, recv::spawn_recv_task};
use crate::transport::{Transport, TransportError};

#[derive(Debug, Error)]
pub enum PhoneError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error("not connected")]
    NotConnected,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct Phone {
    config: PhoneConfig,
    state: Arc<PhoneState>,
    mixer: Option<Mixer>,
    mixer_handle: Option<MixerHandle>,
    session: Mutex<Option<Arc<Session>>>,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

impl Phone {
    pub fn new(config: PhoneConfig) -> Self {
        Self {
            config,
            state: Arc::new(PhoneState::new()),
            mixer: None,
            mixer_handle: None,
            session: Mutex::new(None),
            threads: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &PhoneConfig {
        &self.config
    }

    pub fn state(&self) -> &Arc<PhoneState> {
        &self.state
    }

    pub fn session(&self) -> Option<Arc<Session>> {
        self.session.lock().unwrap().clone()
    }

    /// Bring up the audio engine, and connect unless configured not to.
    pub fn start(&mut self) -> Result<(), PhoneError> {
        if self.mixer.is_none() {
            let tones_dir = self.config.tones_dir.clone();
            let mixer = Mixer::start(MixerConfig {
                tone_resolver: Box::new(move |tone_id| tone_wav_path(&tones_dir, tone_id)),
                ..Default::default()
            });
            self.mixer_handle = Some(mixer.handle());
            self.mixer = Some(mixer);
        }
        if self.config.auto_connect {
            self.connect()?;
        }
        Ok(())
    }

    /// Open the TCP session, spawn the receive and keepalive workers, and
    /// fire the registration handshake.
    pub fn connect(&self) -> Result<(), PhoneError> {
        let mut slot = self.session.lock().unwrap();
        if slot.is_some() {
            return Ok(());
        }

        let mixer = self
            .mixer_handle
            .clone()
            .ok_or(PhoneError::NotConnected)?;

        let transport = Transport::connect(&self.config.server, self.config.port)?;
        let local_ip = local_ip_toward(&self.config.server)?;
        log::info!("({}) client IP: {local_ip}", self.config.device_name);

        // fresh per-session signals; state itself persists across sessions
        self.state.is_registered.clear();
        self.state.is_unregistered.clear();

        let session = Arc::new(Session {
            config: self.config.clone(),
            state: self.state.clone(),
            transport,
            mixer,
            media: Mutex::new(Media::default()),
            stop: Arc::new(Latch::new()),
            local_ip,
        });
        log::info!(
            "({}) connected to CUCM; type={}",
            self.config.device_name,
            self.config.device_type
        );

        let reader = session.transport.reader()?;
        let mut threads = self.threads.lock().unwrap();
        threads.push(spawn_recv_task(session.clone(), reader));
        threads.push(spawn_keepalive_task(session.clone()));

        session.send_register();
        *slot = Some(session);
        Ok(())
    }

    /// Unregister (ending any live call first), then tear the session
    /// down. Waiting for UnregisterAck is bounded; teardown happens
    /// regardless.
    pub fn disconnect(&self) {
        let session = {
            let mut slot = self.session.lock().unwrap();
            slot.take()
        };
        let Some(session) = session else {
            return;
        };

        if self.state.has_active_call() {
            log::warn!(
                "({}) unregistering with an active call; ending call first",
                self.config.device_name
            );
            session.press_softkey("EndCall", 1, 0);
            std::thread::sleep(Duration::from_millis(500));
        }

        session.send(ids::UNREGISTER_REQ, &[]);
        if !self
            .state
            .is_unregistered
            .wait_timeout(Some(Duration::from_secs(10)))
        {
            log::error!(
                "({}) phone failed to unregister in time; terminating session",
                self.config.device_name
            );
        }

        session.stop.set();
        session.transport.shutdown();
        session.stop_media();

        let mut threads = self.threads.lock().unwrap();
        for t in threads.drain(..) {
            let _ = t.join();
        }
    }

    /// Disconnect and stop the audio engine.
    pub fn stop(&mut self) {
        self.disconnect();
        if let Some(mut mixer) = self.mixer.take() {
            mixer.close();
        }
        self.mixer_handle = None;
    }

    // ---- actions --------------------------------------------------------

    pub fn press_softkey(&self, name: &str) {
        self.press_softkey_on(name, 1, 0);
    }

    pub fn press_softkey_on(&self, name: &str, line: u32, call_reference: u32) {
        match self.session() {
            Some(session) => session.press_softkey(name, line, call_reference),
            None => log::warn!("press_softkey {name}: not connected"),
        }
    }

    pub fn send_digit(&self, digit: char) {
        match self.session() {
            Some(session) => session.send_digit(digit, 1, 0),
            None => log::warn!("send_digit: not connected"),
        }
    }

    /// Emit a digit string with key beeps and inter-digit pauses, the way
    /// a human would dial. `stop` aborts the burst early.
    pub fn dial(&self, digits: &str, stop: Option<&Latch>) {
        for ch in digits.chars() {
            if let Some(stop) = stop {
                if stop.is_set() {
                    return;
                }
            }
            self.send_digit(ch);
            self.play_beep();
            std::thread::sleep(Duration::from_millis(500));
        }
    }

    pub fn play_beep(&self) {
        if let Some(session) = self.session() {
            session.play_beep();
        }
    }

    pub fn set_master_volume_db(&self, db: f32) {
        if let Some(handle) = &self.mixer_handle {
            handle.set_master_gain_db(db);
        }
    }

    // ---- waiting and digits --------------------------------------------

    pub fn wait_for(&self, event: PhoneEvent, timeout: Option<Duration>) -> bool {
        self.state.wait_for(event, timeout)
    }

    pub fn wait_for_digit(&self, timeout: Option<Duration>) -> Option<char> {
        self.state.dtmf.wait_digit(timeout, None)
    }

    pub fn read_digits(
        &self,
        max_len: usize,
        timeout: Option<Duration>,
        interdigit: Option<Duration>,
        terminators: &str,
    ) -> String {
        self.state
            .read_digits(max_len, timeout, interdigit, terminators, None)
    }

    // ---- snapshot -------------------------------------------------------

    pub fn snapshot(&self) -> serde_json::Value {
        self.state.snapshot()
    }
}

impl Drop for Phone {
    fn drop(&mut self) {
        self.stop();
    }
}
