//! Turns a score into synthesizer messages as playback time advances.
//!
//! The sequencer knows nothing about audio or wall time: the backend tells
//! it which tick has been reached and it answers with the note-on/note-off
//! messages due since the previous call. Scheduling is by `start_tick`, so
//! the order of notes in the event list does not matter.

use crate::sheet::{NoteEvent, Score};
use std::collections::HashMap;
use std::time::Duration;

/// A message for the synthesizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthMessage {
    ProgramChange { channel: u8, program: u8 },
    NoteOn { channel: u8, pitch: u8, velocity: u8 },
    NoteOff { channel: u8, pitch: u8 },
}

/// Converts elapsed wall time into a tick position.
pub fn tick_at(elapsed: Duration, ticks_per_second: f64) -> u32 {
    (elapsed.as_secs_f64() * ticks_per_second).floor() as u32
}

#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    /// Notes sorted by start tick.
    notes: Vec<NoteEvent>,
    programs: Vec<(u8, u8)>,
    stop_time: u32,
    /// Last tick handed to `advance`; `None` before the first call.
    last_tick: Option<u32>,
    /// Sounding note-ons per (channel, pitch).
    held: HashMap<(u8, u8), u32>,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces whatever was loaded and rewinds to the start.
    pub fn load(&mut self, score: &Score) {
        self.notes = score.notes().copied().collect();
        self.notes.sort_by_key(|note| note.start_tick);
        self.programs = score.program_changes().collect();
        self.stop_time = score.stop_time;
        self.rewind();
    }

    pub fn clear(&mut self) {
        self.notes.clear();
        self.programs.clear();
        self.stop_time = 0;
        self.rewind();
    }

    pub fn rewind(&mut self) {
        self.last_tick = None;
        self.held.clear();
    }

    /// Channel setup messages, to be sent before the first `advance`.
    pub fn setup(&self) -> Vec<SynthMessage> {
        self.programs
            .iter()
            .map(|&(channel, program)| SynthMessage::ProgramChange { channel, program })
            .collect()
    }

    pub fn stop_time(&self) -> u32 {
        self.stop_time
    }

    pub fn position(&self) -> Option<u32> {
        self.last_tick
    }

    /// Returns the messages due in `(last_tick, current_tick]`, or in
    /// `[0, current_tick]` on the first call.
    ///
    /// Messages come out in tick order; at equal ticks note-offs go first so
    /// a note ending where the next one on the same key starts does not cut
    /// the new one short. Overlapping notes on one key share a single
    /// release, sent when the last of them ends.
    pub fn advance(&mut self, current_tick: u32) -> Vec<SynthMessage> {
        let due = |tick: u32| match self.last_tick {
            None => tick <= current_tick,
            Some(last) => tick > last && tick <= current_tick,
        };

        let mut scheduled: Vec<(u32, u8, SynthMessage)> = Vec::new();
        for note in self.notes.iter().filter(|n| n.duration > 0) {
            if note.start_tick > current_tick {
                // Sorted by start: nothing further can start or end yet.
                break;
            }
            if due(note.start_tick) {
                scheduled.push((
                    note.start_tick,
                    1,
                    SynthMessage::NoteOn {
                        channel: note.channel,
                        pitch: note.pitch,
                        velocity: note.volume,
                    },
                ));
            }
            if due(note.end_tick()) {
                scheduled.push((
                    note.end_tick(),
                    0,
                    SynthMessage::NoteOff {
                        channel: note.channel,
                        pitch: note.pitch,
                    },
                ));
            }
        }
        scheduled.sort_by_key(|(tick, order, _)| (*tick, *order));

        self.last_tick = Some(current_tick);
        scheduled
            .into_iter()
            .filter_map(|(_, _, message)| self.track_held(message))
            .collect()
    }

    /// Counts note-ons per key and swallows note-offs that would release a
    /// key another note still holds.
    fn track_held(&mut self, message: SynthMessage) -> Option<SynthMessage> {
        match message {
            SynthMessage::NoteOn { channel, pitch, .. } => {
                *self.held.entry((channel, pitch)).or_insert(0) += 1;
                Some(message)
            }
            SynthMessage::NoteOff { channel, pitch } => {
                let count = self.held.get_mut(&(channel, pitch))?;
                *count -= 1;
                if *count > 0 {
                    return None;
                }
                self.held.remove(&(channel, pitch));
                Some(message)
            }
            SynthMessage::ProgramChange { .. } => Some(message),
        }
    }

    /// True once `tick` has passed the end of the last note.
    pub fn is_finished_at(&self, tick: u32) -> bool {
        tick >= self.stop_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::{build_score, ChannelMap, Composition, ResizeEdge};

    fn score_of(notes: &[(f64, f64, u8)]) -> Score {
        let mut composition = Composition::new();
        for &(x, y, channel) in notes {
            composition.add_note(x, y, channel);
        }
        build_score(composition.notes(), &ChannelMap::default())
    }

    #[test]
    fn test_setup_lists_program_changes() {
        let mut sequencer = Sequencer::new();
        sequencer.load(&score_of(&[]));
        let setup = sequencer.setup();
        assert_eq!(setup.len(), 8);
        assert_eq!(
            setup[1],
            SynthMessage::ProgramChange {
                channel: 1,
                program: 6
            }
        );
    }

    #[test]
    fn test_schedules_by_start_tick_not_list_order() {
        // Inserted late-first.
        let mut sequencer = Sequencer::new();
        sequencer.load(&score_of(&[(300.0, 0.0, 1), (0.0, 670.0, 0)]));

        let first = sequencer.advance(50);
        assert_eq!(
            first,
            vec![SynthMessage::NoteOn {
                channel: 0,
                pitch: 60,
                velocity: 100
            }]
        );

        let second = sequencer.advance(150);
        assert_eq!(
            second,
            vec![SynthMessage::NoteOff {
                channel: 0,
                pitch: 60
            }]
        );

        assert!(sequencer.advance(299).is_empty());
        let third = sequencer.advance(301);
        assert_eq!(
            third,
            vec![SynthMessage::NoteOn {
                channel: 1,
                pitch: 127,
                velocity: 100
            }]
        );
        assert!(!sequencer.is_finished_at(301));
        assert!(sequencer.is_finished_at(400));
    }

    #[test]
    fn test_large_step_emits_on_before_off() {
        let mut sequencer = Sequencer::new();
        sequencer.load(&score_of(&[(10.0, 0.0, 0)]));
        let messages = sequencer.advance(1000);
        assert!(matches!(messages[0], SynthMessage::NoteOn { .. }));
        assert!(matches!(messages[1], SynthMessage::NoteOff { .. }));
    }

    #[test]
    fn test_back_to_back_notes_release_first() {
        let mut composition = Composition::new();
        composition.add_note(0.0, 0.0, 0);
        composition.add_note(100.0, 0.0, 0);
        let score = build_score(composition.notes(), &ChannelMap::default());

        let mut sequencer = Sequencer::new();
        sequencer.load(&score);
        sequencer.advance(50);
        let messages = sequencer.advance(100);
        assert_eq!(
            messages,
            vec![
                SynthMessage::NoteOff {
                    channel: 0,
                    pitch: 127
                },
                SynthMessage::NoteOn {
                    channel: 0,
                    pitch: 127,
                    velocity: 100
                },
            ]
        );
    }

    #[test]
    fn test_overlapping_notes_on_one_key_release_once() {
        let mut composition = Composition::new();
        composition.add_note(0.0, 0.0, 0);
        composition.add_note(50.0, 0.0, 0);
        let score = build_score(composition.notes(), &ChannelMap::default());

        let mut sequencer = Sequencer::new();
        sequencer.load(&score);
        assert_eq!(sequencer.advance(60).len(), 2);
        assert!(sequencer.advance(100).is_empty());
        assert_eq!(
            sequencer.advance(150),
            vec![SynthMessage::NoteOff {
                channel: 0,
                pitch: 127
            }]
        );
    }

    #[test]
    fn test_load_rewinds() {
        let mut composition = Composition::new();
        composition.add_note(0.0, 0.0, 0);
        composition.resize_selected(ResizeEdge::Right, -50.0);
        let score = build_score(composition.notes(), &ChannelMap::default());

        let mut sequencer = Sequencer::new();
        sequencer.load(&score);
        sequencer.advance(20);
        assert_eq!(sequencer.position(), Some(20));
        sequencer.load(&score);
        assert_eq!(sequencer.position(), None);
        assert_eq!(sequencer.stop_time(), 50);
        assert_eq!(sequencer.advance(0).len(), 1);
    }

    #[test]
    fn test_tick_at() {
        assert_eq!(tick_at(Duration::from_millis(0), 100.0), 0);
        assert_eq!(tick_at(Duration::from_millis(1500), 100.0), 150);
        assert_eq!(tick_at(Duration::from_millis(19), 100.0), 1);
    }
}
