//! Microphone capture for the RTP send path.
//!
//! cpal input streams are not `Send`, so the stream lives on its own
//! thread; readers pull float32 mono out of a shared bounded FIFO. When the
//! FIFO overflows (reader stalled), the oldest audio is dropped.

use std::collections::VecDeque;
use std::sync::mpsc::{channel, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::{MixerError, Result};

/// Keep at most ~400 ms of backlog.
const MAX_BACKLOG_MS: usize = 400;

pub struct MicCapture {
    buf: Arc<Mutex<VecDeque<f32>>>,
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl MicCapture {
    /// Open the default input device capturing mono float32 at
    /// `sample_rate`. Fails if there is no device or the stream cannot be
    /// built, in which case nothing is left running.
    pub fn start(sample_rate: u32) -> Result<Self> {
        let buf: Arc<Mutex<VecDeque<f32>>> = Arc::new(Mutex::new(VecDeque::new()));
        let cap = sample_rate as usize * MAX_BACKLOG_MS / 1000;

        let (stop_tx, stop_rx) = channel::<()>();
        let (ready_tx, ready_rx) = channel::<Result<()>>();
        let shared = buf.clone();

        let thread = thread::Builder::new()
            .name("mic-capture".into())
            .spawn(move || {
                let stream = match build_input_stream(sample_rate, cap, shared) {
                    Ok(s) => {
                        let _ = ready_tx.send(Ok(()));
                        s
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                // park until stop() or drop; the stream dies with this thread
                let _ = stop_rx.recv();
                drop(stream);
            })
            .map_err(|e| MixerError::Backend(e.to_string()))?;

        match ready_rx.recv_timeout(Duration::from_secs(2)) {
            Ok(Ok(())) => Ok(Self {
                buf,
                stop_tx: Some(stop_tx),
                thread: Some(thread),
            }),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {
                drop(stop_tx);
                let _ = thread.join();
                Err(MixerError::Backend("capture thread did not start".into()))
            }
        }
    }

    /// Pull up to `n` captured samples; missing audio is zero-filled.
    pub fn read(&self, n: usize) -> Vec<f32> {
        let mut out = vec![0.0f32; n];
        let mut fifo = self.buf.lock().unwrap();
        for slot in out.iter_mut() {
            match fifo.pop_front() {
                Some(s) => *slot = s,
                None => break,
            }
        }
        out
    }

    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(t) = self.thread.take() {
            let _ = t.join();
        }
        self.buf.lock().unwrap().clear();
    }
}

impl Drop for MicCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

fn build_input_stream(
    sample_rate: u32,
    cap: usize,
    shared: Arc<Mutex<VecDeque<f32>>>,
) -> Result<cpal::Stream> {
    let host = cpal::default_host();
    let device = host.default_input_device().ok_or(MixerError::NoDevice)?;

    let default = device
        .default_input_config()
        .map_err(|e| MixerError::Backend(e.to_string()))?;
    let channels = default.channels().max(1) as usize;
    let config = cpal::StreamConfig {
        channels: channels as u16,
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let stream = device
        .build_input_stream(
            &config,
            move |data: &[f32], _: &_| {
                let mut fifo = shared.lock().unwrap();
                for frame in data.chunks(channels) {
                    let mono = frame.iter().sum::<f32>() / channels as f32;
                    fifo.push_back(mono);
                }
                while fifo.len() > cap {
                    fifo.pop_front();
                }
            },
            |e| log::debug!("input stream error: {e}"),
            None,
        )
        .map_err(|e| MixerError::Backend(e.to_string()))?;
    stream
        .play()
        .map_err(|e| MixerError::Backend(e.to_string()))?;
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_zero_fills_an_empty_fifo() {
        let cap = MicCapture {
            buf: Arc::new(Mutex::new(VecDeque::new())),
            stop_tx: None,
            thread: None,
        };
        assert_eq!(cap.read(4), vec![0.0; 4]);
    }

    #[test]
    fn read_drains_in_order_then_zero_fills() {
        let cap = MicCapture {
            buf: Arc::new(Mutex::new(VecDeque::from(vec![0.1, 0.2]))),
            stop_tx: None,
            thread: None,
        };
        let out = cap.read(4);
        assert_eq!(out, vec![0.1, 0.2, 0.0, 0.0]);
        assert!(cap.buf.lock().unwrap().is_empty());
    }
}
