//! Long-lived worker threads. Each task owns its OS resource (socket or
//! stream), polls the shared stop latch, and is spawned through a named
//! `thread::Builder` so logs and debuggers can tell them apart.

pub mod keepalive;
pub mod recv;
pub mod rtp_rx;
pub mod rtp_tx;
