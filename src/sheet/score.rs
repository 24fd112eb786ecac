//! Translation from notes on the sheet into a playable score.
//!
//! Pure functions: nothing here reads or writes editor state.

use super::channel::{ChannelMap, CHANNEL_COUNT};
use super::note::Note;

/// One note to be played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    pub pitch: u8,
    pub volume: u8,
    pub start_tick: u32,
    pub duration: u32,
    pub channel: u8,
    pub track_index: u8,
}

impl NoteEvent {
    pub fn end_tick(&self) -> u32 {
        self.start_tick.saturating_add(self.duration)
    }
}

impl From<&Note> for NoteEvent {
    fn from(note: &Note) -> Self {
        Self {
            pitch: note.pitch(),
            volume: note.volume(),
            start_tick: note.start_tick(),
            duration: note.duration(),
            channel: note.channel(),
            track_index: note.track_index(),
        }
    }
}

/// An entry of the event list handed to the playback backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreEvent {
    /// Assigns an instrument program to a channel.
    ProgramChange { channel: u8, program: u8 },
    Note(NoteEvent),
}

/// The event list together with its total length in ticks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Score {
    pub events: Vec<ScoreEvent>,
    pub stop_time: u32,
}

impl Score {
    /// The note events, in list order.
    pub fn notes(&self) -> impl Iterator<Item = &NoteEvent> {
        self.events.iter().filter_map(|event| match event {
            ScoreEvent::Note(note) => Some(note),
            ScoreEvent::ProgramChange { .. } => None,
        })
    }

    /// The `(channel, program)` assignments, in list order.
    pub fn program_changes(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        self.events.iter().filter_map(|event| match event {
            ScoreEvent::ProgramChange { channel, program } => Some((*channel, *program)),
            ScoreEvent::Note(_) => None,
        })
    }

    pub fn is_silent(&self) -> bool {
        self.notes().next().is_none()
    }
}

/// Builds the event list.
///
/// One program change per channel (0-7, whether or not anything was drawn on
/// it), then one event per note in insertion order. Note events are not
/// sorted by time; the backend schedules by `start_tick`.
pub fn build_events(notes: &[Note], channels: &ChannelMap) -> Vec<ScoreEvent> {
    let mut events = Vec::with_capacity(CHANNEL_COUNT + notes.len());
    events.extend(
        channels
            .programs()
            .iter()
            .enumerate()
            .map(|(channel, program)| ScoreEvent::ProgramChange {
                channel: channel as u8,
                program: *program,
            }),
    );
    events.extend(notes.iter().map(|note| ScoreEvent::Note(note.into())));
    events
}

/// Latest `start_tick + duration` over all notes; 0 when there are none.
///
/// # Examples
///
/// ```
/// use pianoroll::sheet::{stop_time, Composition};
///
/// let mut composition = Composition::new();
/// assert_eq!(stop_time(composition.notes()), 0);
///
/// composition.add_note(40.0, 0.0, 0);
/// assert_eq!(stop_time(composition.notes()), 140);
/// ```
pub fn stop_time(notes: &[Note]) -> u32 {
    notes.iter().map(Note::end_tick).max().unwrap_or(0)
}

pub fn build_score(notes: &[Note], channels: &ChannelMap) -> Score {
    Score {
        events: build_events(notes, channels),
        stop_time: stop_time(notes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::{Composition, ResizeEdge, DEFAULT_PROGRAMS};

    #[test]
    fn test_stop_time_of_two_notes() {
        let mut composition = Composition::new();
        composition.add_note(0.0, 0.0, 0);
        composition.add_note(100.0, 20.0, 0);
        // (x=0, width=50) and (x=100, width=80)
        composition.clear_selection();
        let first = composition.notes()[0].id;
        let second = composition.notes()[1].id;
        composition.select(first);
        composition.resize_selected(ResizeEdge::Right, -50.0);
        composition.clear_selection();
        composition.select(second);
        composition.resize_selected(ResizeEdge::Right, -20.0);

        assert_eq!(stop_time(composition.notes()), 180);
    }

    #[test]
    fn test_empty_composition() {
        let score = build_score(&[], &ChannelMap::default());
        assert_eq!(score.stop_time, 0);
        assert_eq!(score.events.len(), 8);
        assert!(score.is_silent());
    }

    #[test]
    fn test_program_changes_come_first() {
        let mut composition = Composition::new();
        composition.add_note(10.0, 0.0, 4);
        let events = build_events(composition.notes(), &ChannelMap::default());
        for (channel, event) in events.iter().take(8).enumerate() {
            assert_eq!(
                *event,
                ScoreEvent::ProgramChange {
                    channel: channel as u8,
                    program: DEFAULT_PROGRAMS[channel],
                }
            );
        }
        assert!(matches!(events[8], ScoreEvent::Note(_)));
    }

    #[test]
    fn test_note_events_keep_insertion_order() {
        let mut composition = Composition::new();
        composition.add_note(500.0, 670.0, 2);
        composition.add_note(20.0, 0.0, 5);
        let score = build_score(composition.notes(), &ChannelMap::default());
        let notes: Vec<NoteEvent> = score.notes().copied().collect();
        assert_eq!(
            notes,
            vec![
                NoteEvent {
                    pitch: 60,
                    volume: 100,
                    start_tick: 500,
                    duration: 100,
                    channel: 2,
                    track_index: 0,
                },
                NoteEvent {
                    pitch: 127,
                    volume: 100,
                    start_tick: 20,
                    duration: 100,
                    channel: 5,
                    track_index: 0,
                },
            ]
        );
        assert_eq!(score.stop_time, 600);
        assert_eq!(score.program_changes().count(), 8);
    }
}
