//! SCCP softphone: registers with a Cisco CallManager, tracks line and
//! call state from inbound messages, renders tones and received RTP
//! through the audio engine, and exposes a programmable control surface.

pub mod config;
pub mod dispatcher;
pub mod event;
pub mod handlers;
pub mod macro_engine;
pub mod phone;
pub mod session;
pub mod state;
pub mod tasks;
pub mod transport;

pub use crate::config::{PhoneConfig, PlayMode};
pub use crate::event::Latch;
pub use crate::phone::{Phone, PhoneError};
pub use crate::state::{PhoneEvent, PhoneState};
pub use crate::transport::TransportError;

use std::time::Duration;

/// Headless entry point: configuration from the environment, then either a
/// macro from `SKINNY_MACRO` (a program string) or `SKINNY_MACRO_FILE`, or
/// sit registered until the server lets go.
pub fn run() -> Result<(), PhoneError> {
    let config = PhoneConfig::from_env()?;
    log::info!("starting {} -> {}:{}", config.device_name, config.server, config.port);

    let mut phone = Phone::new(config);
    phone.start()?;

    if !phone
        .state()
        .is_registered
        .wait_timeout(Some(Duration::from_secs(15)))
    {
        log::error!("registration did not complete");
        phone.stop();
        return Err(PhoneError::NotConnected);
    }

    let script = std::env::var("SKINNY_MACRO").ok().or_else(|| {
        std::env::var("SKINNY_MACRO_FILE")
            .ok()
            .and_then(|path| std::fs::read_to_string(path).ok())
    });

    match script {
        Some(script) => {
            let program = macro_engine::parse(&script);
            let stop = Latch::new();
            macro_engine::run(&phone, &program, &stop);
        }
        None => {
            // stay registered until unregistered from the far side
            phone.state().is_unregistered.wait_timeout(None);
        }
    }

    phone.stop();
    Ok(())
}
