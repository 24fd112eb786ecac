//! The progress line that sweeps across the sheet during playback.

use std::time::{Duration, Instant};

/// Milliseconds the progress line spends on each tick.
pub const DEFAULT_MS_PER_TICK: f64 = 10.0;

/// Start/stop control over the playback progress indicator.
///
/// The editor only supplies the stop time and the start/stop trigger; how the
/// indicator animates is up to the implementation.
pub trait Transport {
    fn start(&mut self, stop_time: u32);
    fn stop(&mut self);
    fn is_active(&self) -> bool;
}

#[derive(Debug, Clone, Copy)]
struct Run {
    started: Instant,
    stop_time: u32,
}

/// A line moving linearly from tick 0 to the stop time.
///
/// Takes `stop_time × ms_per_tick` milliseconds and deactivates itself once
/// it gets there.
#[derive(Debug, Clone)]
pub struct ProgressLine {
    ms_per_tick: f64,
    run: Option<Run>,
}

impl ProgressLine {
    pub fn new(ms_per_tick: f64) -> Self {
        Self {
            ms_per_tick,
            run: None,
        }
    }

    /// Builds a line paced for `ticks_per_second`.
    pub fn with_tick_rate(ticks_per_second: f64) -> Self {
        Self::new(1000.0 / ticks_per_second)
    }

    pub fn start_at(&mut self, stop_time: u32, now: Instant) {
        self.run = Some(Run {
            started: now,
            stop_time,
        });
    }

    /// Total length of the current run.
    pub fn duration(&self) -> Option<Duration> {
        self.run
            .map(|run| Duration::from_secs_f64(run.stop_time as f64 * self.ms_per_tick / 1000.0))
    }

    /// Position of the line in ticks, or `None` when inactive at `now`.
    ///
    /// # Examples
    ///
    /// ```
    /// use pianoroll::transport::ProgressLine;
    /// use std::time::{Duration, Instant};
    ///
    /// let mut line = ProgressLine::new(10.0);
    /// let start = Instant::now();
    /// line.start_at(200, start);
    /// assert_eq!(line.position_at(start + Duration::from_millis(1000)), Some(100.0));
    /// assert_eq!(line.position_at(start + Duration::from_millis(2000)), None);
    /// ```
    pub fn position_at(&self, now: Instant) -> Option<f64> {
        let run = self.run?;
        let total = self.duration()?.as_secs_f64();
        let elapsed = now.saturating_duration_since(run.started).as_secs_f64();
        if elapsed >= total {
            return None;
        }
        Some(elapsed / total * run.stop_time as f64)
    }

    pub fn position(&self) -> Option<f64> {
        self.position_at(Instant::now())
    }

    pub fn is_active_at(&self, now: Instant) -> bool {
        self.position_at(now).is_some()
    }
}

impl Default for ProgressLine {
    fn default() -> Self {
        Self::new(DEFAULT_MS_PER_TICK)
    }
}

impl Transport for ProgressLine {
    fn start(&mut self, stop_time: u32) {
        self.start_at(stop_time, Instant::now());
    }

    fn stop(&mut self) {
        self.run = None;
    }

    fn is_active(&self) -> bool {
        self.is_active_at(Instant::now())
    }
}
