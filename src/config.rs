//! Startup configuration.
//!
//! Read from an optional JSON file; every field falls back to its default, so
//! `{}` is a valid configuration.
//!
//! ```json
//! {
//!   "instrument": "blue",
//!   "channels": [
//!     { "instrument": "gray", "channel": 0 },
//!     { "instrument": "blue", "channel": 1 }
//!   ],
//!   "programs": [0, 6, 12, 19, 21, 25, 40, 60],
//!   "ticks_per_beat": 100,
//!   "tempo": 60,
//!   "soundfont": "/usr/share/sounds/sf2/FluidR3_GM.sf2"
//! }
//! ```

use crate::error::{ComposerError, Result};
use crate::sheet::{ChannelMap, Instrument, CHANNEL_COUNT, DEFAULT_PROGRAMS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Ticks per quarter note. One tick is one canvas unit.
pub const DEFAULT_TICKS_PER_BEAT: u32 = 100;

/// Beats per minute. With the default resolution that is 100 ticks a second.
pub const DEFAULT_TEMPO: u32 = 60;

/// One row of the instrument → channel table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelEntry {
    pub instrument: Instrument,
    pub channel: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Instrument active at startup.
    pub instrument: Instrument,
    pub channels: Vec<ChannelEntry>,
    pub programs: [u8; CHANNEL_COUNT],
    pub ticks_per_beat: u32,
    pub tempo: u32,
    pub soundfont: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            instrument: Instrument::Gray,
            channels: Instrument::ALL
                .iter()
                .enumerate()
                .map(|(channel, instrument)| ChannelEntry {
                    instrument: *instrument,
                    channel: channel as u8,
                })
                .collect(),
            programs: DEFAULT_PROGRAMS,
            ticks_per_beat: DEFAULT_TICKS_PER_BEAT,
            tempo: DEFAULT_TEMPO,
            soundfont: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| ComposerError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| ComposerError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(text: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Builds and validates the channel table.
    pub fn channel_map(&self) -> Result<ChannelMap> {
        let entries = self
            .channels
            .iter()
            .map(|entry| (entry.instrument, entry.channel))
            .collect();
        ChannelMap::new(entries, self.programs)
    }

    /// Playback rate in ticks per second.
    pub fn ticks_per_second(&self) -> f64 {
        let ticks_per_beat = self.ticks_per_beat.max(1) as f64;
        let tempo = self.tempo.max(1) as f64;
        ticks_per_beat * tempo / 60.0
    }
}
