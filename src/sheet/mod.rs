//! Composition sheet data structures.
//!
//! This module provides the note geometry, the instrument/channel table, the
//! selection set, the owned note store, and the translation from notes on the
//! sheet into a playable score.
//!
//! The sheet is a fixed coordinate space: the horizontal axis is time (one
//! canvas unit = one tick) and the vertical axis is divided into 128 rows of
//! [`ROW_HEIGHT`] units, one semitone per row, highest pitch at the top.

mod channel;
mod composition;
mod note;
mod score;
mod selection;

pub use channel::{ChannelMap, Instrument, CHANNEL_COUNT, DEFAULT_PROGRAMS};
pub use composition::Composition;
pub use note::{Bounds, DragBox, Note, NoteId, ResizeEdge};
pub use score::{build_events, build_score, stop_time, NoteEvent, Score, ScoreEvent};
pub use selection::Selection;

/// Height of one grid row in canvas units.
pub const ROW_HEIGHT: f64 = 10.0;

/// Number of rows on the sheet (one per MIDI pitch).
pub const ROW_COUNT: u32 = 128;

/// Width of the sheet in canvas units.
pub const CANVAS_WIDTH: f64 = 2000.0;

/// Height of the sheet in canvas units.
pub const CANVAS_HEIGHT: f64 = ROW_HEIGHT * ROW_COUNT as f64;

/// Largest `y` a note may rest at (top of the last row).
pub const MAX_NOTE_Y: f64 = CANVAS_HEIGHT - ROW_HEIGHT;

/// Highest pitch, found in the top row.
pub const MAX_PITCH: u8 = 127;

/// Standard note names for display purposes.
/// Maps MIDI note number (0-127) to note name within an octave.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Returns true if `y` lies on the sheet, i.e. a note may be created there.
pub fn is_on_sheet(y: f64) -> bool {
    (0.0..CANVAS_HEIGHT).contains(&y)
}

/// Returns the pitch of the row containing `y`.
///
/// Row 0 (the top of the sheet) is pitch 127; every row further down is one
/// semitone lower. Values off the sheet are clamped to the valid pitch range.
///
/// # Examples
///
/// ```
/// use pianoroll::sheet::pitch_at;
///
/// assert_eq!(pitch_at(0.0), 127);
/// assert_eq!(pitch_at(15.0), 126);
/// assert_eq!(pitch_at(1270.0), 0);
/// ```
pub fn pitch_at(y: f64) -> u8 {
    let row = (y / ROW_HEIGHT).floor() as i64;
    (MAX_PITCH as i64 - row).clamp(0, MAX_PITCH as i64) as u8
}

/// Converts a MIDI note number to a human-readable note name with octave.
///
/// # Examples
///
/// ```
/// use pianoroll::sheet::note_to_name;
///
/// assert_eq!(note_to_name(60), "C4");
/// ```
pub fn note_to_name(note: u8) -> String {
    let octave = (note / 12) as i8 - 1; // MIDI octave convention
    let note_index = (note % 12) as usize;
    format!("{}{}", NOTE_NAMES[note_index], octave)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_to_name() {
        assert_eq!(note_to_name(60), "C4");
        assert_eq!(note_to_name(69), "A4");
        assert_eq!(note_to_name(0), "C-1");
        assert_eq!(note_to_name(127), "G9");
    }

    #[test]
    fn test_pitch_decreases_down_the_sheet() {
        assert_eq!(pitch_at(0.0), 127);
        assert_eq!(pitch_at(MAX_NOTE_Y), 0);
        let mut previous = pitch_at(0.0);
        for row in 1..ROW_COUNT {
            let pitch = pitch_at(row as f64 * ROW_HEIGHT);
            assert!(pitch < previous);
            previous = pitch;
        }
    }

    #[test]
    fn test_sheet_bounds() {
        assert!(is_on_sheet(0.0));
        assert!(is_on_sheet(1279.9));
        assert!(!is_on_sheet(1280.0));
        assert!(!is_on_sheet(-0.1));
    }
}
