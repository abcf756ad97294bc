//! RTP receive task. Owns the UDP socket we advertised in
//! OpenReceiveChannelAck, decodes G.711 payloads, and feeds the mixer's
//! `rx` stream. Everything else is dropped silently.

use std::net::UdpSocket;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use audio_mixer::MixerHandle;
use rtp_audio::{pcma_decode_f32, pcmu_decode_f32, RtpPacket};

use crate::event::Latch;

/// Mixer stream fed by this receiver.
pub const RX_STREAM_ID: &str = "rx";

/// G.711 on the wire is 8 kHz.
const RX_SAMPLE_RATE: u32 = 8000;

const RX_BUF_SIZE: usize = 2048;
const RECV_TIMEOUT: Duration = Duration::from_millis(500);

pub struct RtpReceiver {
    port: u16,
    stop: Arc<Latch>,
    mixer: MixerHandle,
    thread: Option<JoinHandle<()>>,
}

impl RtpReceiver {
    /// Bind an ephemeral UDP port and start pumping packets into the
    /// mixer. The bound port goes back to CUCM in the ack.
    pub fn start(mixer: MixerHandle) -> std::io::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_read_timeout(Some(RECV_TIMEOUT))?;
        let port = socket.local_addr()?.port();

        mixer.add_stream(RX_STREAM_ID, 0.0);

        let stop = Arc::new(Latch::new());
        let thread = {
            let stop = stop.clone();
            let mixer = mixer.clone();
            thread::Builder::new()
                .name(format!("rtp-rx:{port}"))
                .spawn(move || run(&socket, &stop, &mixer))
                .expect("failed to spawn RTP RX task")
        };

        Ok(Self {
            port,
            stop,
            mixer,
            thread: Some(thread),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Stop the task, release the socket, and detach the mixer stream.
    pub fn stop(&mut self) {
        self.stop.set();
        if let Some(t) = self.thread.take() {
            let _ = t.join();
        }
        self.mixer.remove_stream(RX_STREAM_ID);
    }
}

impl Drop for RtpReceiver {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(socket: &UdpSocket, stop: &Latch, mixer: &MixerHandle) {
    log::info!(
        "RTP RX listening on {}",
        socket.local_addr().map(|a| a.to_string()).unwrap_or_default()
    );
    let mut buf = [0u8; RX_BUF_SIZE];

    while !stop.is_set() {
        let len = match socket.recv_from(&mut buf) {
            Ok((len, _addr)) => len,
            Err(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                ) =>
            {
                continue
            }
            Err(e) => {
                if !stop.is_set() {
                    log::warn!("RTP RX socket error: {e}");
                }
                break;
            }
        };

        if len < rtp_audio::RTP_HEADER_LEN {
            continue;
        }
        let packet = match RtpPacket::unpack(&buf[..len]) {
            Ok(p) => p,
            Err(_) => continue,
        };
        if packet.header.version != 2 {
            continue;
        }

        let pcm = match packet.header.payload_type {
            0 => pcmu_decode_f32(&packet.payload),
            8 => pcma_decode_f32(&packet.payload),
            other => {
                log::debug!("RTP RX: dropping payload type {other}");
                continue;
            }
        };
        if !pcm.is_empty() {
            mixer.feed_stream(RX_STREAM_ID, pcm, RX_SAMPLE_RATE);
        }
    }
}
