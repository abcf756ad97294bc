//! The receive loop: the sole mutator of `PhoneState`. Reads one frame at a
//! time with a short timeout so the stop latch is observed between frames,
//! and dispatches each message on this thread.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::dispatcher::dispatch;
use crate::session::Session;
use crate::transport::{FrameReader, ReadOutcome};

pub fn spawn_recv_task(session: Arc<Session>, mut reader: FrameReader) -> JoinHandle<()> {
    thread::Builder::new()
        .name("sccp-recv".into())
        .spawn(move || {
            run(&session, &mut reader);
            // whatever ended the loop, nobody should keep waiting on us
            session.state.is_unregistered.set();
            log::info!("({}) shutdown complete", session.device_name());
        })
        .expect("failed to spawn receive task")
}

fn run(session: &Arc<Session>, reader: &mut FrameReader) {
    while !session.stop.is_set() {
        match reader.read_one() {
            ReadOutcome::Msg {
                message_id,
                payload,
            } => dispatch(session, message_id, &payload),
            ReadOutcome::Timeout => continue,
            ReadOutcome::Closed => {
                log::info!("({}) connection closed by server", session.device_name());
                break;
            }
            ReadOutcome::Error(e) => {
                if !session.stop.is_set() {
                    log::error!("({}) receive error: {e}", session.device_name());
                }
                break;
            }
        }
    }
}
