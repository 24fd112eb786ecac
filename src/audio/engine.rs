//! SoundFont playback backend.
//!
//! rustysynth renders the audio, rodio plays it. The synthesizer is shared
//! with the audio thread behind a mutex; the main thread only sends it
//! note and program messages from [`SynthEngine::update`].

use super::sequencer::{tick_at, Sequencer, SynthMessage};
use super::PlaybackBackend;
use crate::sheet::Score;
use anyhow::{Context, Result};
use rodio::{OutputStream, OutputStreamHandle, Source};
use rustysynth::{SoundFont, Synthesizer, SynthesizerSettings};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Sample rate for audio synthesis (44.1 kHz standard).
pub const SAMPLE_RATE: u32 = 44100;

/// Samples rendered per channel at a time.
/// Smaller = lower latency but higher CPU usage.
const BUFFER_SIZE: usize = 256;

/// Audio source that pulls stereo samples out of the synthesizer.
struct SynthSource {
    synth: Arc<Mutex<Synthesizer>>,
    left_buf: Vec<f32>,
    right_buf: Vec<f32>,
    buf_pos: usize,
    /// 0 = left, 1 = right.
    channel: usize,
}

impl SynthSource {
    fn new(synth: Arc<Mutex<Synthesizer>>) -> Self {
        Self {
            synth,
            left_buf: vec![0.0; BUFFER_SIZE],
            right_buf: vec![0.0; BUFFER_SIZE],
            buf_pos: BUFFER_SIZE, // forces a render on the first sample
            channel: 0,
        }
    }
}

impl Iterator for SynthSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.buf_pos >= BUFFER_SIZE {
            match self.synth.lock() {
                Ok(mut synth) => synth.render(&mut self.left_buf, &mut self.right_buf),
                Err(_) => {
                    self.left_buf.fill(0.0);
                    self.right_buf.fill(0.0);
                }
            }
            self.buf_pos = 0;
        }

        // Interleaved: L, R, L, R, ...
        let sample = if self.channel == 0 {
            self.left_buf[self.buf_pos]
        } else {
            self.right_buf[self.buf_pos]
        };
        self.channel = 1 - self.channel;
        if self.channel == 0 {
            self.buf_pos += 1;
        }

        Some(sample)
    }
}

impl Source for SynthSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        2
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

/// Plays scores through a SoundFont.
pub struct SynthEngine {
    synth: Arc<Mutex<Synthesizer>>,
    /// Audio output stream (must be kept alive).
    _stream: OutputStream,
    _stream_handle: OutputStreamHandle,
    sequencer: Sequencer,
    ticks_per_second: f64,
    /// Wall time at which tick 0 sounded; `None` while stopped.
    started: Option<Instant>,
}

impl SynthEngine {
    /// Loads a SoundFont and opens the default audio output.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The SoundFont file cannot be read or is invalid
    /// - Audio output cannot be initialized
    pub fn new<P: AsRef<Path>>(soundfont_path: P, ticks_per_second: f64) -> Result<Self> {
        let path = soundfont_path.as_ref();
        let mut file = BufReader::new(
            File::open(path)
                .with_context(|| format!("Failed to open SoundFont: {}", path.display()))?,
        );
        let soundfont = Arc::new(
            SoundFont::new(&mut file)
                .map_err(|e| anyhow::anyhow!("Failed to load SoundFont: {:?}", e))?,
        );

        let settings = SynthesizerSettings::new(SAMPLE_RATE as i32);
        let synth = Synthesizer::new(&soundfont, &settings)
            .map_err(|e| anyhow::anyhow!("Failed to create synthesizer: {:?}", e))?;
        let synth = Arc::new(Mutex::new(synth));

        let (stream, stream_handle) =
            OutputStream::try_default().context("Failed to open audio output")?;
        stream_handle
            .play_raw(SynthSource::new(Arc::clone(&synth)))
            .context("Failed to start audio playback")?;

        info!(soundfont = %path.display(), ticks_per_second, "synthesizer ready");

        Ok(Self {
            synth,
            _stream: stream,
            _stream_handle: stream_handle,
            sequencer: Sequencer::new(),
            ticks_per_second,
            started: None,
        })
    }

    fn send(&self, messages: &[SynthMessage]) {
        if messages.is_empty() {
            return;
        }
        if let Ok(mut synth) = self.synth.lock() {
            for message in messages {
                match *message {
                    SynthMessage::ProgramChange { channel, program } => {
                        // Program change is MIDI command 0xC0 (192)
                        synth.process_midi_message(channel as i32, 0xC0, program as i32, 0);
                    }
                    SynthMessage::NoteOn {
                        channel,
                        pitch,
                        velocity,
                    } => synth.note_on(channel as i32, pitch as i32, velocity as i32),
                    SynthMessage::NoteOff { channel, pitch } => {
                        synth.note_off(channel as i32, pitch as i32)
                    }
                }
            }
        }
    }

    fn all_notes_off(&self) {
        if let Ok(mut synth) = self.synth.lock() {
            synth.note_off_all(true);
        }
    }
}

impl PlaybackBackend for SynthEngine {
    fn stop(&mut self) {
        self.started = None;
        self.sequencer.rewind();
        self.all_notes_off();
    }

    fn clear(&mut self) {
        self.sequencer.clear();
    }

    fn load(&mut self, score: &Score) {
        self.sequencer.load(score);
        self.send(&self.sequencer.setup());
    }

    fn play(&mut self) {
        self.sequencer.rewind();
        self.started = Some(Instant::now());
    }

    fn update(&mut self) {
        let Some(started) = self.started else {
            return;
        };
        let current_tick = tick_at(started.elapsed(), self.ticks_per_second);
        let messages = self.sequencer.advance(current_tick);
        self.send(&messages);

        if self.sequencer.is_finished_at(current_tick) {
            debug!(current_tick, "score finished");
            self.stop();
        }
    }

    fn is_playing(&self) -> bool {
        self.started.is_some()
    }
}
