//! Periodic KeepAliveReq. Sleeps on the stop latch so shutdown wakes it
//! immediately; a failed send means the session is gone.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use sccp_core::ids;

use crate::session::Session;

pub fn spawn_keepalive_task(session: Arc<Session>) -> JoinHandle<()> {
    thread::Builder::new()
        .name("sccp-keepalive".into())
        .spawn(move || {
            log::info!("({}) keepalive loop running", session.device_name());
            loop {
                // interval can change when RegisterAck arrives
                let interval = session.state.read().keepalive_interval.max(1);
                if session
                    .stop
                    .wait_timeout(Some(Duration::from_secs(interval as u64)))
                {
                    break;
                }
                log::info!("({}) [SEND] KeepAliveReq", session.device_name());
                if let Err(e) = session.transport.send(ids::KEEP_ALIVE_REQ, &[]) {
                    if !session.stop.is_set() {
                        log::warn!("({}) keepalive send failed: {e}", session.device_name());
                        session.state.is_unregistered.set();
                        session.stop.set();
                    }
                    break;
                }
            }
            log::info!("({}) keepalive loop stopped", session.device_name());
        })
        .expect("failed to spawn keepalive task")
}
