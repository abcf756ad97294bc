//! Inbound message handlers, grouped the way the traffic groups itself:
//! registration, post-registration setup, the call plane, the display, and
//! media control. All of them run on the receive thread.

pub mod call;
pub mod display;
pub mod media;
pub mod registration;
pub mod setup;

use crate::session::Session;

/// Decode-or-drop: a short payload is logged and the message discarded,
/// per the error contract. The session continues.
pub(crate) fn decoded<T>(
    name: &str,
    session: &Session,
    result: sccp_core::Result<T>,
) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            log::warn!("({}) {name} decode failed: {e}", session.device_name());
            None
        }
    }
}
