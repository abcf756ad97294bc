//! RTP send task: packetize the current source (silence, wav, microphone)
//! into fixed-ptime G.711 packets against a monotonic schedule. Source
//! swaps are two-phase so there is never an audio gap: the new source is
//! brought up first, then the old one is stopped.

use std::net::{SocketAddr, UdpSocket};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use audio_mixer::{db_to_lin, load_wav_f32, MicCapture};
use rtp_audio::{pcma_encode, pcmu_encode, RtpHeader, RtpPacket};

use crate::event::Latch;

/// Where the outgoing audio comes from. `read` must hand back exactly `n`
/// samples' worth of audio or less; the packetizer zero-fills the rest.
pub trait AudioSource: Send {
    fn read(&mut self, n: usize) -> Vec<f32>;
    fn stop(&mut self) {}
}

pub struct SilenceSource;

impl AudioSource for SilenceSource {
    fn read(&mut self, n: usize) -> Vec<f32> {
        vec![0.0; n]
    }
}

/// Preloaded 16-bit wav, downmixed and resampled to the sender rate.
pub struct WavSource {
    buf: Vec<f32>,
    pos: usize,
    looping: bool,
    gain: f32,
}

impl WavSource {
    pub fn load(
        path: &std::path::Path,
        sample_rate: u32,
        looping: bool,
        gain_db: f32,
    ) -> audio_mixer::Result<Self> {
        Ok(Self {
            buf: load_wav_f32(path, sample_rate)?,
            pos: 0,
            looping,
            gain: db_to_lin(gain_db),
        })
    }
}

impl AudioSource for WavSource {
    fn read(&mut self, n: usize) -> Vec<f32> {
        let mut out = vec![0.0f32; n];
        let len = self.buf.len();
        if len == 0 {
            return out;
        }
        if self.looping {
            for (i, slot) in out.iter_mut().enumerate() {
                *slot = self.gain * self.buf[(self.pos + i) % len];
            }
            self.pos = (self.pos + n) % len;
        } else {
            let take = n.min(len.saturating_sub(self.pos));
            for (slot, &s) in out.iter_mut().zip(&self.buf[self.pos..self.pos + take]) {
                *slot = self.gain * s;
            }
            self.pos += take;
        }
        out
    }
}

pub struct MicSource {
    capture: MicCapture,
}

impl MicSource {
    pub fn start(sample_rate: u32) -> audio_mixer::Result<Self> {
        Ok(Self {
            capture: MicCapture::start(sample_rate)?,
        })
    }
}

impl AudioSource for MicSource {
    fn read(&mut self, n: usize) -> Vec<f32> {
        self.capture.read(n)
    }

    fn stop(&mut self) {
        self.capture.stop();
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RtpSenderConfig {
    pub remote: SocketAddr,
    pub ptime_ms: u32,
    pub sample_rate: u32,
    pub payload_type: u8,
}

impl RtpSenderConfig {
    pub fn new(remote: SocketAddr) -> Self {
        Self {
            remote,
            ptime_ms: 20,
            sample_rate: 8000,
            payload_type: 0,
        }
    }

    fn samples_per_packet(&self) -> usize {
        (self.sample_rate * self.ptime_ms / 1000) as usize
    }
}

struct SenderShared {
    socket: UdpSocket,
    config: RtpSenderConfig,
    stop: Latch,
    source: Mutex<Box<dyn AudioSource>>,
}

pub struct RtpSender {
    shared: Arc<SenderShared>,
    thread: Option<JoinHandle<()>>,
}

impl RtpSender {
    /// Bind a socket and start packetizing silence toward the remote.
    pub fn start(config: RtpSenderConfig) -> std::io::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        log::info!(
            "RTP TX -> {} PT={} ptime={}ms sr={}",
            config.remote,
            config.payload_type,
            config.ptime_ms,
            config.sample_rate
        );

        let shared = Arc::new(SenderShared {
            socket,
            config,
            stop: Latch::new(),
            source: Mutex::new(Box::new(SilenceSource)),
        });

        let thread = {
            let shared = shared.clone();
            thread::Builder::new()
                .name("rtp-tx".into())
                .spawn(move || run(&shared))
                .expect("failed to spawn RTP TX task")
        };

        Ok(Self {
            shared,
            thread: Some(thread),
        })
    }

    pub fn send_silence(&self) {
        self.swap_source(Box::new(SilenceSource));
        log::info!("RTP TX source -> silence");
    }

    /// Switch to a wav file. The file is loaded before the swap; on
    /// failure the current source keeps playing.
    pub fn send_wav(&self, path: &std::path::Path, looping: bool) -> audio_mixer::Result<()> {
        let source = WavSource::load(path, self.shared.config.sample_rate, looping, 0.0)?;
        self.swap_source(Box::new(source));
        log::info!("RTP TX source -> wav {}", path.display());
        Ok(())
    }

    /// Switch to the microphone. Capture is running before the swap; on
    /// failure the current source keeps playing.
    pub fn send_microphone(&self) -> audio_mixer::Result<()> {
        let source = MicSource::start(self.shared.config.sample_rate)?;
        self.swap_source(Box::new(source));
        log::info!("RTP TX source -> microphone");
        Ok(())
    }

    fn swap_source(&self, new: Box<dyn AudioSource>) {
        let mut old = {
            let mut guard = self.shared.source.lock().unwrap();
            std::mem::replace(&mut *guard, new)
        };
        // old source stops only after the new one is in place
        old.stop();
    }

    pub fn stop(&mut self) {
        self.shared.stop.set();
        if let Some(t) = self.thread.take() {
            let _ = t.join();
        }
        self.shared.source.lock().unwrap().stop();
    }
}

impl Drop for RtpSender {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(shared: &SenderShared) {
    let samples_per_packet = shared.config.samples_per_packet();
    let ptime = Duration::from_millis(shared.config.ptime_ms as u64);

    let mut header = RtpHeader {
        payload_type: shared.config.payload_type,
        sequence_number: rand::random::<u16>(),
        timestamp: rand::random::<u32>(),
        ssrc: rand::random::<u32>(),
        ..Default::default()
    };

    let mut next_send = Instant::now();
    while !shared.stop.is_set() {
        // pull one packet of audio; zero-fill underruns
        let mut pcm = {
            let mut source = shared.source.lock().unwrap();
            source.read(samples_per_packet)
        };
        pcm.resize(samples_per_packet, 0.0);

        let payload = match shared.config.payload_type {
            8 => pcma_encode(&pcm),
            _ => pcmu_encode(&pcm),
        };

        let packet = RtpPacket::new(header, payload);
        if let Err(e) = shared.socket.send_to(&packet.pack(), shared.config.remote) {
            if !shared.stop.is_set() {
                log::warn!("RTP TX send failed: {e}");
            }
            break;
        }

        header.sequence_number = header.sequence_number.wrapping_add(1);
        header.timestamp = header.timestamp.wrapping_add(samples_per_packet as u32);

        // drift-corrected pacing; when behind, restart the schedule
        // instead of bursting to catch up
        next_send += ptime;
        let now = Instant::now();
        if next_send > now {
            thread::sleep(next_send - now);
        } else {
            next_send = now;
        }
    }
    log::debug!("RTP TX stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn wav_source_loops_seamlessly() {
        let mut source = WavSource {
            buf: vec![0.1, 0.2, 0.3],
            pos: 0,
            looping: true,
            gain: 1.0,
        };
        let out = source.read(7);
        let expected = [0.1, 0.2, 0.3, 0.1, 0.2, 0.3, 0.1];
        for (a, b) in out.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
        assert_eq!(source.pos, 1);
    }

    #[test]
    fn wav_source_without_loop_goes_silent() {
        let mut source = WavSource {
            buf: vec![0.5, 0.5],
            pos: 0,
            looping: false,
            gain: 1.0,
        };
        assert_eq!(source.read(4), vec![0.5, 0.5, 0.0, 0.0]);
        assert_eq!(source.read(4), vec![0.0; 4]);
    }

    #[test]
    fn sender_paces_and_advances_seq_and_ts() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let remote = receiver.local_addr().unwrap();

        let mut sender = RtpSender::start(RtpSenderConfig::new(remote)).unwrap();

        let mut buf = [0u8; 1500];
        let mut packets = Vec::new();
        let start = Instant::now();
        while packets.len() < 10 {
            let (len, _) = receiver.recv_from(&mut buf).unwrap();
            packets.push(RtpPacket::unpack(&buf[..len]).unwrap());
        }
        let elapsed = start.elapsed();
        sender.stop();

        // 10 packets at 20 ms ptime: allow scheduling slack either way
        assert!(elapsed >= Duration::from_millis(140), "too fast: {elapsed:?}");
        assert!(elapsed <= Duration::from_millis(400), "too slow: {elapsed:?}");

        for pair in packets.windows(2) {
            assert_eq!(
                pair[1].header.sequence_number,
                pair[0].header.sequence_number.wrapping_add(1)
            );
            assert_eq!(
                pair[1].header.timestamp,
                pair[0].header.timestamp.wrapping_add(160)
            );
            assert_eq!(pair[1].header.ssrc, pair[0].header.ssrc);
        }
        for p in &packets {
            assert_eq!(p.header.version, 2);
            assert_eq!(p.header.payload_type, 0);
            assert_eq!(p.payload.len(), 160);
            // silence is the all-0xFF ulaw code
            assert!(p.payload.iter().all(|&b| b == 0xFF));
        }
    }

    #[test]
    fn swap_to_missing_wav_keeps_old_source() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        let remote = receiver.local_addr().unwrap();
        let mut sender = RtpSender::start(RtpSenderConfig::new(remote)).unwrap();

        assert!(sender
            .send_wav(std::path::Path::new("/nonexistent/file.wav"), true)
            .is_err());
        sender.stop();
    }
}
