//! The single-owner render engine. One thread owns the output sink and all
//! mixing state; everyone else talks to it through `MixerHandle`, a cloneable
//! command queue. Commands are applied between blocks, in order.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::sink::{open_sink, OutputSink};
use crate::wav::{db_to_lin, load_wav_f32, resample_nearest};

/// Maps a CUCM tone id to a wav file, or None for "no tone".
pub type ToneResolver = Box<dyn Fn(u32) -> Option<PathBuf> + Send>;

pub struct MixerConfig {
    pub sample_rate: u32,
    pub block_size: usize,
    pub master_gain_db: f32,
    pub tone_resolver: ToneResolver,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            block_size: 1024, // ~23 ms at 44.1 kHz
            master_gain_db: 0.0,
            tone_resolver: Box::new(|_| None),
        }
    }
}

#[derive(Debug)]
pub enum MixerCommand {
    SetTone { line: u32, tone_id: u32, gain_db: f32 },
    ClearTone { line: u32 },
    ClearAll,
    PlayWavOnce { path: PathBuf, gain_db: f32 },
    PlayBytesOnce { samples: Vec<f32>, gain_db: f32 },
    AddStream { id: String, gain_db: f32 },
    RemoveStream { id: String },
    FeedStream { id: String, samples: Vec<f32>, src_rate: u32 },
    SetMasterGainDb(f32),
    SetStreamGainDb { id: String, gain_db: f32 },
    Quit,
}

/// Cloneable front end to the mixer thread. Sends never block; if the
/// engine is gone the command is dropped silently.
#[derive(Clone)]
pub struct MixerHandle {
    tx: Sender<MixerCommand>,
}

impl MixerHandle {
    fn send(&self, cmd: MixerCommand) {
        let _ = self.tx.send(cmd);
    }

    pub fn set_tone(&self, line: u32, tone_id: u32, gain_db: f32) {
        self.send(MixerCommand::SetTone { line, tone_id, gain_db });
    }

    pub fn clear_tone(&self, line: u32) {
        self.send(MixerCommand::ClearTone { line });
    }

    pub fn clear_all(&self) {
        self.send(MixerCommand::ClearAll);
    }

    pub fn play_wav_once(&self, path: PathBuf, gain_db: f32) {
        self.send(MixerCommand::PlayWavOnce { path, gain_db });
    }

    pub fn play_bytes_once(&self, samples: Vec<f32>, gain_db: f32) {
        self.send(MixerCommand::PlayBytesOnce { samples, gain_db });
    }

    pub fn add_stream(&self, id: &str, gain_db: f32) {
        self.send(MixerCommand::AddStream { id: id.into(), gain_db });
    }

    pub fn remove_stream(&self, id: &str) {
        self.send(MixerCommand::RemoveStream { id: id.into() });
    }

    pub fn feed_stream(&self, id: &str, samples: Vec<f32>, src_rate: u32) {
        self.send(MixerCommand::FeedStream { id: id.into(), samples, src_rate });
    }

    pub fn set_master_gain_db(&self, db: f32) {
        self.send(MixerCommand::SetMasterGainDb(db));
    }

    pub fn set_stream_gain_db(&self, id: &str, gain_db: f32) {
        self.send(MixerCommand::SetStreamGainDb { id: id.into(), gain_db });
    }
}

pub struct Mixer {
    handle: MixerHandle,
    thread: Option<JoinHandle<()>>,
}

impl Mixer {
    /// Spawn the render thread. The output device is opened on that thread;
    /// with no device available the engine renders to a paced null sink.
    pub fn start(config: MixerConfig) -> Self {
        let (tx, rx) = channel();
        let handle = MixerHandle { tx };

        let thread = thread::Builder::new()
            .name("audio-mixer".into())
            .spawn(move || {
                let mut sink = open_sink(config.sample_rate, config.block_size);
                let mut engine = RenderEngine::new(config);
                run(&mut engine, &rx, sink.as_mut());
                log::debug!("audio mixer stopped");
            })
            .expect("failed to spawn audio mixer thread");

        Self {
            handle,
            thread: Some(thread),
        }
    }

    pub fn handle(&self) -> MixerHandle {
        self.handle.clone()
    }

    pub fn close(&mut self) {
        self.handle.send(MixerCommand::Quit);
        if let Some(t) = self.thread.take() {
            let _ = t.join();
        }
    }
}

impl Drop for Mixer {
    fn drop(&mut self) {
        self.close();
    }
}

fn run(engine: &mut RenderEngine, rx: &Receiver<MixerCommand>, sink: &mut dyn OutputSink) {
    loop {
        // drain all pending commands quickly
        loop {
            match rx.try_recv() {
                Ok(MixerCommand::Quit) => return,
                Ok(cmd) => engine.apply(cmd),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return,
            }
        }

        let block = engine.mix_block();
        if let Err(e) = sink.write(&block) {
            // keep the engine alive even if the backend hiccups
            log::debug!("mixer output write failed: {e}");
        }
    }
}

struct Voice {
    buf: Arc<Vec<f32>>,
    pos: usize,
    gain: f32,
}

struct StreamBuf {
    fifo: Vec<f32>,
    gain: f32,
}

struct RenderEngine {
    sample_rate: u32,
    block_size: usize,
    master_gain: f32,
    tone_resolver: ToneResolver,
    tone_cache: HashMap<u32, Arc<Vec<f32>>>,
    tones: HashMap<u32, Voice>, // line -> looping voice
    oneshots: Vec<Voice>,
    streams: HashMap<String, StreamBuf>,
}

impl RenderEngine {
    fn new(config: MixerConfig) -> Self {
        Self {
            sample_rate: config.sample_rate,
            block_size: config.block_size,
            master_gain: db_to_lin(config.master_gain_db),
            tone_resolver: config.tone_resolver,
            tone_cache: HashMap::new(),
            tones: HashMap::new(),
            oneshots: Vec::new(),
            streams: HashMap::new(),
        }
    }

    fn tone_buffer(&mut self, tone_id: u32) -> Option<Arc<Vec<f32>>> {
        if let Some(buf) = self.tone_cache.get(&tone_id) {
            return Some(buf.clone());
        }
        let path = (self.tone_resolver)(tone_id)?;
        match load_wav_f32(&path, self.sample_rate) {
            Ok(data) => {
                let buf = Arc::new(data);
                self.tone_cache.insert(tone_id, buf.clone());
                Some(buf)
            }
            Err(e) => {
                log::warn!("tone {tone_id}: {e}");
                None
            }
        }
    }

    fn apply(&mut self, cmd: MixerCommand) {
        match cmd {
            MixerCommand::SetTone { line, tone_id, gain_db } => {
                match self.tone_buffer(tone_id) {
                    Some(buf) => {
                        self.tones.insert(
                            line,
                            Voice { buf, pos: 0, gain: db_to_lin(gain_db) },
                        );
                    }
                    // unknown tone ids resolve to "no tone"
                    None => {
                        self.tones.remove(&line);
                    }
                }
            }
            MixerCommand::ClearTone { line } => {
                self.tones.remove(&line);
            }
            MixerCommand::ClearAll => {
                self.tones.clear();
                self.oneshots.clear();
            }
            MixerCommand::PlayWavOnce { path, gain_db } => {
                match load_wav_f32(&path, self.sample_rate) {
                    Ok(data) => self.oneshots.push(Voice {
                        buf: Arc::new(data),
                        pos: 0,
                        gain: db_to_lin(gain_db),
                    }),
                    Err(e) => log::warn!("play_wav_once: {e}"),
                }
            }
            MixerCommand::PlayBytesOnce { samples, gain_db } => {
                self.oneshots.push(Voice {
                    buf: Arc::new(samples),
                    pos: 0,
                    gain: db_to_lin(gain_db),
                });
            }
            MixerCommand::AddStream { id, gain_db } => {
                self.streams.insert(
                    id,
                    StreamBuf { fifo: Vec::new(), gain: db_to_lin(gain_db) },
                );
            }
            MixerCommand::RemoveStream { id } => {
                self.streams.remove(&id);
            }
            MixerCommand::FeedStream { id, samples, src_rate } => {
                let pcm = resample_nearest(&samples, src_rate, self.sample_rate);
                // auto-create at 0 dB so a receiver can feed before add_stream
                let entry = self
                    .streams
                    .entry(id)
                    .or_insert_with(|| StreamBuf { fifo: Vec::new(), gain: 1.0 });
                entry.fifo.extend_from_slice(&pcm);
            }
            MixerCommand::SetMasterGainDb(db) => {
                self.master_gain = db_to_lin(db);
            }
            MixerCommand::SetStreamGainDb { id, gain_db } => {
                if let Some(s) = self.streams.get_mut(&id) {
                    s.gain = db_to_lin(gain_db);
                }
            }
            MixerCommand::Quit => {}
        }
    }

    fn mix_block(&mut self) -> Vec<f32> {
        let n = self.block_size;
        let mut out = vec![0.0f32; n];

        self.mix_tones(&mut out);
        self.mix_oneshots(&mut out);
        self.mix_streams(&mut out);

        for s in out.iter_mut() {
            *s = (*s * self.master_gain).clamp(-1.0, 1.0);
        }
        out
    }

    fn mix_tones(&mut self, out: &mut [f32]) {
        for voice in self.tones.values_mut() {
            let len = voice.buf.len();
            if len == 0 {
                continue;
            }
            for (i, slot) in out.iter_mut().enumerate() {
                *slot += voice.gain * voice.buf[(voice.pos + i) % len];
            }
            voice.pos = (voice.pos + out.len()) % len;
        }
    }

    fn mix_oneshots(&mut self, out: &mut [f32]) {
        for voice in self.oneshots.iter_mut() {
            let take = out.len().min(voice.buf.len() - voice.pos);
            for (slot, &s) in out.iter_mut().zip(&voice.buf[voice.pos..voice.pos + take]) {
                *slot += voice.gain * s;
            }
            voice.pos += take;
        }
        // drop one-shots that finished this block
        self.oneshots.retain(|v| v.pos < v.buf.len());
    }

    fn mix_streams(&mut self, out: &mut [f32]) {
        for stream in self.streams.values_mut() {
            let take = out.len().min(stream.fifo.len());
            for (slot, &s) in out.iter_mut().zip(&stream.fifo[..take]) {
                *slot += stream.gain * s;
            }
            stream.fifo.drain(..take);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(block: usize) -> RenderEngine {
        RenderEngine::new(MixerConfig {
            sample_rate: 8000,
            block_size: block,
            master_gain_db: 0.0,
            tone_resolver: Box::new(|_| None),
        })
    }

    fn set_raw_tone(e: &mut RenderEngine, line: u32, data: Vec<f32>) {
        e.tones.insert(
            line,
            Voice { buf: Arc::new(data), pos: 0, gain: 1.0 },
        );
    }

    #[test]
    fn clear_all_renders_silence() {
        let mut e = engine(16);
        set_raw_tone(&mut e, 1, vec![0.5; 7]);
        e.apply(MixerCommand::PlayBytesOnce { samples: vec![0.25; 100], gain_db: 0.0 });
        e.apply(MixerCommand::ClearAll);
        assert!(e.mix_block().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn tone_wraps_modulo_buffer_length() {
        let mut e = engine(16);
        let buf: Vec<f32> = (0..7).map(|i| i as f32 / 10.0).collect();
        set_raw_tone(&mut e, 1, buf.clone());

        for k in 1..=5 {
            let block = e.mix_block();
            for (i, &s) in block.iter().enumerate() {
                let expected = buf[((k - 1) * 16 + i) % 7];
                assert!((s - expected).abs() < 1e-6, "block {k} sample {i}");
            }
            assert_eq!(e.tones[&1].pos, (k * 16) % 7);
        }
    }

    #[test]
    fn oneshot_is_dropped_when_finished() {
        let mut e = engine(8);
        e.apply(MixerCommand::PlayBytesOnce { samples: vec![0.5; 12], gain_db: 0.0 });

        let b1 = e.mix_block();
        assert!(b1.iter().all(|&s| s == 0.5));
        assert_eq!(e.oneshots.len(), 1);

        let b2 = e.mix_block();
        assert_eq!(&b2[..4], &[0.5; 4]);
        assert_eq!(&b2[4..], &[0.0; 4]);
        assert!(e.oneshots.is_empty());
    }

    #[test]
    fn streams_consume_fifo_and_auto_create() {
        let mut e = engine(4);
        e.apply(MixerCommand::FeedStream {
            id: "rx".into(),
            samples: vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6],
            src_rate: 8000,
        });
        assert_eq!(e.mix_block(), vec![0.1, 0.2, 0.3, 0.4]);
        let b2 = e.mix_block();
        assert!((b2[0] - 0.5).abs() < 1e-6);
        assert!((b2[1] - 0.6).abs() < 1e-6);
        assert_eq!(&b2[2..], &[0.0, 0.0]);
    }

    #[test]
    fn feed_stream_resamples_to_engine_rate() {
        let mut e = engine(8);
        // 8 kHz engine fed 4 kHz audio: every sample doubles
        e.apply(MixerCommand::FeedStream {
            id: "rx".into(),
            samples: vec![0.1, 0.2, 0.3, 0.4],
            src_rate: 4000,
        });
        assert_eq!(e.streams["rx"].fifo.len(), 8);
        assert_eq!(e.streams["rx"].fifo[0], 0.1);
        assert_eq!(e.streams["rx"].fifo[1], 0.1);
    }

    #[test]
    fn output_is_clamped_and_master_gain_applies() {
        let mut e = engine(4);
        set_raw_tone(&mut e, 1, vec![0.9; 4]);
        set_raw_tone(&mut e, 2, vec![0.9; 4]);
        assert!(e.mix_block().iter().all(|&s| s == 1.0));

        e.apply(MixerCommand::SetMasterGainDb(-6.0));
        let block = e.mix_block();
        assert!(block.iter().all(|&s| (s - 1.8 * db_to_lin(-6.0)).abs() < 1e-3));
    }

    #[test]
    fn mixer_thread_starts_and_stops() {
        let mut mixer = Mixer::start(MixerConfig {
            sample_rate: 8000,
            block_size: 64,
            ..Default::default()
        });
        let handle = mixer.handle();
        handle.feed_stream("rx", vec![0.0; 64], 8000);
        std::thread::sleep(std::time::Duration::from_millis(50));
        mixer.close();
    }
}
