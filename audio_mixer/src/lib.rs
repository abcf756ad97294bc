//! Audio engine: a single-owner mixer thread that renders looping tones,
//! one-shot prompts, and decoded RTP streams into one float32 mono output,
//! plus microphone capture for the send side.
//!
//! The rest of the codebase only talks to `MixerHandle` (a command queue)
//! and `MicCapture`; the concrete output backend is picked at runtime and
//! falls back to a paced null sink when no device is available, so the
//! engine keeps rendering on headless machines.

pub mod capture;
pub mod mixer;
pub mod sink;
pub mod wav;

pub use capture::MicCapture;
pub use mixer::{Mixer, MixerCommand, MixerConfig, MixerHandle, ToneResolver};
pub use sink::OutputSink;
pub use wav::{db_to_lin, load_wav_f32, resample_nearest};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MixerError {
    /// The wav is not something we mix (anything but 16-bit integer PCM).
    #[error("wav format not supported ({path}): {reason}")]
    WavFormat { path: String, reason: String },

    #[error("no audio device available")]
    NoDevice,

    #[error("audio backend error: {0}")]
    Backend(String),
}

pub type Result<T> = core::result::Result<T, MixerError>;
