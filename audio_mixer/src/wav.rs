//! WAV loading and the cheap resampler used for in-band tones.

use std::path::Path;

use crate::MixerError;

pub fn db_to_lin(db: f32) -> f32 {
    if db == 0.0 {
        1.0
    } else {
        10f32.powf(db / 20.0)
    }
}

/// Nearest-neighbor resample. Good enough for tones and prompts; not a
/// speech resampler.
pub fn resample_nearest(data: &[f32], src_rate: u32, dst_rate: u32) -> Vec<f32> {
    if src_rate == dst_rate || data.is_empty() {
        return data.to_vec();
    }
    let ratio = dst_rate as f64 / src_rate as f64;
    let out_len = (data.len() as f64 * ratio) as usize;
    (0..out_len)
        .map(|i| {
            let src = ((i as f64 / ratio) as usize).min(data.len() - 1);
            data[src]
        })
        .collect()
}

/// Load a 16-bit PCM wav as float32 mono at `target_rate`. Multi-channel
/// files are averaged down; anything that is not 16-bit integer PCM is
/// refused.
pub fn load_wav_f32<P: AsRef<Path>>(path: P, target_rate: u32) -> crate::Result<Vec<f32>> {
    let path = path.as_ref();
    let display = path.display().to_string();

    let mut reader = hound::WavReader::open(path).map_err(|e| MixerError::WavFormat {
        path: display.clone(),
        reason: e.to_string(),
    })?;
    let spec = reader.spec();

    if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(MixerError::WavFormat {
            path: display,
            reason: format!(
                "must be 16-bit PCM, got {}-bit {:?}",
                spec.bits_per_sample, spec.sample_format
            ),
        });
    }

    let channels = spec.channels.max(1) as usize;
    let mut mono = Vec::new();
    let mut frame = Vec::with_capacity(channels);
    for sample in reader.samples::<i16>() {
        let s = sample.map_err(|e| MixerError::WavFormat {
            path: display.clone(),
            reason: e.to_string(),
        })?;
        frame.push(s as f32 / 32768.0);
        if frame.len() == channels {
            mono.push(frame.iter().sum::<f32>() / channels as f32);
            frame.clear();
        }
    }

    let mut data = resample_nearest(&mono, spec.sample_rate, target_rate);
    if data.is_empty() {
        data.push(0.0);
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_test_wav(path: &Path, spec: hound::WavSpec, frames: &[i16]) {
        let mut w = hound::WavWriter::create(path, spec).unwrap();
        for &s in frames {
            w.write_sample(s).unwrap();
        }
        w.finalize().unwrap();
    }

    #[test]
    fn db_conversion() {
        assert_eq!(db_to_lin(0.0), 1.0);
        assert!((db_to_lin(6.0) - 1.9953).abs() < 1e-3);
        assert!((db_to_lin(-20.0) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn resample_identity_and_ratio() {
        let data = [0.0f32, 1.0, 2.0, 3.0];
        assert_eq!(resample_nearest(&data, 8000, 8000), data);

        let up = resample_nearest(&data, 8000, 16000);
        assert_eq!(up.len(), 8);
        assert_eq!(up[0], 0.0);
        assert_eq!(up[1], 0.0);
        assert_eq!(up[7], 3.0);

        let down = resample_nearest(&data, 8000, 4000);
        assert_eq!(down, vec![0.0, 2.0]);
    }

    #[test]
    fn loads_stereo_and_downmixes() {
        let dir = std::env::temp_dir().join("audio_mixer_wav_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        // two frames: (16384, 0) and (-16384, -16384)
        write_test_wav(&path, spec, &[16384, 0, -16384, -16384]);

        let data = load_wav_f32(&path, 8000).unwrap();
        assert_eq!(data.len(), 2);
        assert!((data[0] - 0.25).abs() < 1e-4);
        assert!((data[1] + 0.5).abs() < 1e-4);
    }

    #[test]
    fn rejects_non_16_bit() {
        let dir = std::env::temp_dir().join("audio_mixer_wav_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("float.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut w = hound::WavWriter::create(&path, spec).unwrap();
        w.write_sample(0.5f32).unwrap();
        w.finalize().unwrap();

        assert!(matches!(
            load_wav_f32(&path, 8000),
            Err(MixerError::WavFormat { .. })
        ));
    }
}
