//! Instrument identifiers and the fixed instrument → channel table.

use crate::error::{ComposerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of playback channels (and instruments).
pub const CHANNEL_COUNT: usize = 8;

/// General MIDI program assigned to channels 0-7 before playback starts.
///
/// Acoustic Grand Piano, Harpsichord, Marimba, Church Organ, Accordion,
/// Steel Guitar, Violin, French Horn.
pub const DEFAULT_PROGRAMS: [u8; CHANNEL_COUNT] = [0, 6, 12, 19, 21, 25, 40, 60];

/// The instrument identifiers offered by the instrument selector.
///
/// Identifiers are colours: notes are drawn in the colour of the instrument
/// they were created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Instrument {
    Gray,
    Green,
    Blue,
    Goldenrod,
    Magenta,
    DeepSkyBlue,
    Black,
    Brown,
}

impl Instrument {
    /// All instruments in default channel order.
    pub const ALL: [Instrument; CHANNEL_COUNT] = [
        Instrument::Gray,
        Instrument::Green,
        Instrument::Blue,
        Instrument::Goldenrod,
        Instrument::Magenta,
        Instrument::DeepSkyBlue,
        Instrument::Black,
        Instrument::Brown,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Instrument::Gray => "gray",
            Instrument::Green => "green",
            Instrument::Blue => "blue",
            Instrument::Goldenrod => "goldenrod",
            Instrument::Magenta => "magenta",
            Instrument::DeepSkyBlue => "deepskyblue",
            Instrument::Black => "black",
            Instrument::Brown => "brown",
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Instrument {
    type Err = ComposerError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Instrument::ALL
            .into_iter()
            .find(|instrument| instrument.name() == wanted)
            .ok_or_else(|| ComposerError::UnknownInstrumentName(s.to_string()))
    }
}

/// Immutable bijection between instruments and channels 0-7.
///
/// Built once when the editor starts and passed to whoever needs channel
/// resolution. A table may register fewer than eight instruments; looking
/// up one it does not register is an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMap {
    entries: Vec<(Instrument, u8)>,
    programs: [u8; CHANNEL_COUNT],
}

impl ChannelMap {
    /// Validates and builds a table.
    ///
    /// Every channel must be below [`CHANNEL_COUNT`], and neither an
    /// instrument nor a channel may appear twice.
    pub fn new(entries: Vec<(Instrument, u8)>, programs: [u8; CHANNEL_COUNT]) -> Result<Self> {
        for (index, (instrument, channel)) in entries.iter().enumerate() {
            if *channel as usize >= CHANNEL_COUNT {
                return Err(ComposerError::InvalidChannelTable(format!(
                    "{} is mapped to channel {}, channels go from 0 to {}",
                    instrument,
                    channel,
                    CHANNEL_COUNT - 1
                )));
            }
            for (other, other_channel) in &entries[..index] {
                if other == instrument {
                    return Err(ComposerError::InvalidChannelTable(format!(
                        "{} is mapped twice",
                        instrument
                    )));
                }
                if other_channel == channel {
                    return Err(ComposerError::InvalidChannelTable(format!(
                        "{} and {} share channel {}",
                        other, instrument, channel
                    )));
                }
            }
        }
        if let Some(program) = programs.iter().find(|p| **p > 127) {
            return Err(ComposerError::InvalidChannelTable(format!(
                "program {} is outside 0-127",
                program
            )));
        }
        Ok(Self { entries, programs })
    }

    /// Returns the channel of `instrument`.
    ///
    /// # Examples
    ///
    /// ```
    /// use pianoroll::sheet::{ChannelMap, Instrument};
    ///
    /// let channels = ChannelMap::default();
    /// assert_eq!(channels.channel_for(Instrument::Gray).unwrap(), 0);
    /// assert_eq!(channels.channel_for(Instrument::Brown).unwrap(), 7);
    /// ```
    pub fn channel_for(&self, instrument: Instrument) -> Result<u8> {
        self.entries
            .iter()
            .find(|(registered, _)| *registered == instrument)
            .map(|(_, channel)| *channel)
            .ok_or(ComposerError::UnknownInstrument(instrument))
    }

    /// Reverse lookup, used to colour notes by channel.
    pub fn instrument_for(&self, channel: u8) -> Option<Instrument> {
        self.entries
            .iter()
            .find(|(_, registered)| *registered == channel)
            .map(|(instrument, _)| *instrument)
    }

    pub fn program_for(&self, channel: u8) -> Option<u8> {
        self.programs.get(channel as usize).copied()
    }

    pub fn programs(&self) -> &[u8; CHANNEL_COUNT] {
        &self.programs
    }

    /// Registered instruments in table order.
    pub fn instruments(&self) -> impl Iterator<Item = Instrument> + '_ {
        self.entries.iter().map(|(instrument, _)| *instrument)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ChannelMap {
    fn default() -> Self {
        Self {
            entries: Instrument::ALL
                .iter()
                .enumerate()
                .map(|(channel, instrument)| (*instrument, channel as u8))
                .collect(),
            programs: DEFAULT_PROGRAMS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let channels = ChannelMap::default();
        for (expected, instrument) in Instrument::ALL.iter().enumerate() {
            assert_eq!(channels.channel_for(*instrument).unwrap(), expected as u8);
            assert_eq!(channels.instrument_for(expected as u8), Some(*instrument));
        }
        assert_eq!(channels.programs(), &DEFAULT_PROGRAMS);
        assert_eq!(channels.program_for(2), Some(12));
        assert_eq!(channels.program_for(8), None);
        assert_eq!(channels.len(), 8);
    }

    #[test]
    fn test_lookup_is_stable() {
        let channels = ChannelMap::default();
        let first = channels.channel_for(Instrument::Magenta).unwrap();
        for _ in 0..10 {
            assert_eq!(channels.channel_for(Instrument::Magenta).unwrap(), first);
        }
    }

    #[test]
    fn test_unregistered_instrument_is_an_error() {
        let channels = ChannelMap::new(vec![(Instrument::Gray, 0)], DEFAULT_PROGRAMS).unwrap();
        let err = channels.channel_for(Instrument::Blue).unwrap_err();
        assert!(matches!(err, ComposerError::UnknownInstrument(Instrument::Blue)));
        assert_eq!(err.to_string(), "no such instrument in the channel map: blue");
    }

    #[test]
    fn test_rejects_invalid_tables() {
        let duplicate_channel = vec![(Instrument::Gray, 0), (Instrument::Blue, 0)];
        assert!(ChannelMap::new(duplicate_channel, DEFAULT_PROGRAMS).is_err());

        let duplicate_instrument = vec![(Instrument::Gray, 0), (Instrument::Gray, 1)];
        assert!(ChannelMap::new(duplicate_instrument, DEFAULT_PROGRAMS).is_err());

        let out_of_range = vec![(Instrument::Gray, 8)];
        assert!(ChannelMap::new(out_of_range, DEFAULT_PROGRAMS).is_err());

        let bad_program = [0, 0, 0, 0, 0, 0, 0, 200];
        assert!(ChannelMap::new(vec![(Instrument::Gray, 0)], bad_program).is_err());
    }

    #[test]
    fn test_instrument_names_round_trip() {
        for instrument in Instrument::ALL {
            assert_eq!(instrument.name().parse::<Instrument>().unwrap(), instrument);
        }
        assert_eq!("DeepSkyBlue".parse::<Instrument>().unwrap(), Instrument::DeepSkyBlue);
        assert!("teal".parse::<Instrument>().is_err());
    }

    #[test]
    fn test_instrument_serde_names() {
        let parsed: Instrument = serde_json::from_str("\"goldenrod\"").unwrap();
        assert_eq!(parsed, Instrument::Goldenrod);
        assert_eq!(serde_json::to_string(&Instrument::DeepSkyBlue).unwrap(), "\"deepskyblue\"");
    }
}
