//! Output backends. The mixer only talks to `OutputSink`; a cpal stream is
//! used when a device exists, and a clock-paced null sink keeps the render
//! loop honest when none does.

use std::collections::VecDeque;
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::{MixerError, Result};

/// One consumer, one block at a time. `write` blocks until the backend has
/// accepted the block, which is what paces the render loop. Sinks live and
/// die on the mixer thread (cpal streams are not `Send`).
pub trait OutputSink {
    fn write(&mut self, block: &[f32]) -> Result<()>;
}

/// Open the best available sink for `sample_rate`. Must be called on the
/// thread that will own the sink (cpal streams are not `Send`).
pub fn open_sink(sample_rate: u32, block_size: usize) -> Box<dyn OutputSink> {
    match CpalSink::open(sample_rate) {
        Ok(sink) => Box::new(sink),
        Err(e) => {
            log::warn!("audio output unavailable ({e}); rendering to null sink");
            Box::new(NullSink::new(sample_rate, block_size))
        }
    }
}

/// Real device output. Rendered blocks are handed to the stream callback
/// through a small bounded queue; mono samples are duplicated across the
/// device's channels.
pub struct CpalSink {
    // Held for its Drop; the callback owns the receiving side.
    _stream: cpal::Stream,
    tx: SyncSender<Vec<f32>>,
}

impl CpalSink {
    pub fn open(sample_rate: u32) -> Result<Self> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(MixerError::NoDevice)?;

        let default = device
            .default_output_config()
            .map_err(|e| MixerError::Backend(e.to_string()))?;
        let channels = default.channels() as usize;
        let config = cpal::StreamConfig {
            channels: channels as u16,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let (tx, rx) = sync_channel::<Vec<f32>>(2);
        let mut feed = CallbackFeed {
            rx,
            pending: VecDeque::new(),
        };

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _| feed.fill(data, channels),
                |e| log::debug!("output stream error: {e}"),
                None,
            )
            .map_err(|e| MixerError::Backend(e.to_string()))?;
        stream
            .play()
            .map_err(|e| MixerError::Backend(e.to_string()))?;

        Ok(Self {
            _stream: stream,
            tx,
        })
    }
}

impl OutputSink for CpalSink {
    fn write(&mut self, block: &[f32]) -> Result<()> {
        self.tx
            .send(block.to_vec())
            .map_err(|_| MixerError::Backend("output stream closed".into()))
    }
}

struct CallbackFeed {
    rx: Receiver<Vec<f32>>,
    pending: VecDeque<f32>,
}

impl CallbackFeed {
    fn fill(&mut self, data: &mut [f32], channels: usize) {
        for frame in data.chunks_mut(channels) {
            if self.pending.is_empty() {
                if let Ok(block) = self.rx.try_recv() {
                    self.pending.extend(block);
                }
            }
            let sample = self.pending.pop_front().unwrap_or(0.0);
            for out in frame.iter_mut() {
                *out = sample;
            }
        }
    }
}

/// Discards audio but consumes it at the real-time rate, so tone position,
/// one-shot lifetimes and stream FIFOs all advance normally.
pub struct NullSink {
    block_duration: Duration,
    next_deadline: Option<Instant>,
}

impl NullSink {
    pub fn new(sample_rate: u32, block_size: usize) -> Self {
        Self {
            block_duration: Duration::from_secs_f64(block_size as f64 / sample_rate as f64),
            next_deadline: None,
        }
    }
}

impl OutputSink for NullSink {
    fn write(&mut self, _block: &[f32]) -> Result<()> {
        let now = Instant::now();
        let deadline = self.next_deadline.unwrap_or(now) + self.block_duration;
        if deadline > now {
            std::thread::sleep(deadline - now);
            self.next_deadline = Some(deadline);
        } else {
            // fell behind; restart the schedule instead of bursting
            self.next_deadline = Some(now);
        }
        Ok(())
    }
}
