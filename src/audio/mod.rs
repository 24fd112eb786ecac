//! Playback backends.
//!
//! The editor hands a finished [`Score`] to a [`PlaybackBackend`] and never
//! looks at audio again. Two backends exist:
//! - [`SynthEngine`]: SoundFont synthesis through rustysynth, output via rodio
//! - [`MutedBackend`]: keeps time without making a sound, for machines
//!   without a SoundFont or an audio device

pub mod engine;
pub mod sequencer;

pub use engine::SynthEngine;
pub use sequencer::{tick_at, Sequencer, SynthMessage};

use crate::sheet::Score;
use std::time::{Duration, Instant};

/// The sound side of playback.
///
/// The editor always calls `stop` and `clear` before `load`, then `play`.
/// `update` is called once per host frame while the application runs.
pub trait PlaybackBackend {
    /// Silences everything and halts the clock.
    fn stop(&mut self);

    /// Forgets the loaded score.
    fn clear(&mut self);

    /// Takes over a score for the next `play`.
    fn load(&mut self, score: &Score);

    /// Starts playing the loaded score from tick 0.
    fn play(&mut self);

    /// Advances playback to the current wall time.
    fn update(&mut self) {}

    fn is_playing(&self) -> bool;
}

impl<P: PlaybackBackend + ?Sized> PlaybackBackend for Box<P> {
    fn stop(&mut self) {
        (**self).stop()
    }

    fn clear(&mut self) {
        (**self).clear()
    }

    fn load(&mut self, score: &Score) {
        (**self).load(score)
    }

    fn play(&mut self) {
        (**self).play()
    }

    fn update(&mut self) {
        (**self).update()
    }

    fn is_playing(&self) -> bool {
        (**self).is_playing()
    }
}

/// A backend that follows the score's clock in silence.
#[derive(Debug)]
pub struct MutedBackend {
    ticks_per_second: f64,
    stop_time: u32,
    started: Option<Instant>,
}

impl MutedBackend {
    pub fn new(ticks_per_second: f64) -> Self {
        Self {
            ticks_per_second,
            stop_time: 0,
            started: None,
        }
    }

    fn finished_after(&self, elapsed: Duration) -> bool {
        tick_at(elapsed, self.ticks_per_second) >= self.stop_time
    }
}

impl PlaybackBackend for MutedBackend {
    fn stop(&mut self) {
        self.started = None;
    }

    fn clear(&mut self) {
        self.stop_time = 0;
    }

    fn load(&mut self, score: &Score) {
        self.stop_time = score.stop_time;
    }

    fn play(&mut self) {
        self.started = Some(Instant::now());
    }

    fn update(&mut self) {
        if let Some(started) = self.started {
            if self.finished_after(started.elapsed()) {
                self.started = None;
            }
        }
    }

    fn is_playing(&self) -> bool {
        self.started.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_muted_backend_lifecycle() {
        let mut backend = MutedBackend::new(100.0);
        assert!(!backend.is_playing());
        backend.load(&Score {
            events: Vec::new(),
            stop_time: 500,
        });
        backend.play();
        assert!(backend.is_playing());
        assert!(!backend.finished_after(Duration::from_millis(4_000)));
        assert!(backend.finished_after(Duration::from_millis(5_000)));
        backend.stop();
        assert!(!backend.is_playing());
    }

    #[test]
    fn test_empty_score_finishes_immediately() {
        let mut backend: Box<dyn PlaybackBackend> = Box::new(MutedBackend::new(100.0));
        backend.clear();
        backend.load(&Score::default());
        backend.play();
        backend.update();
        assert!(!backend.is_playing());
    }
}
