//! The selection set.
//!
//! Holds note ids, never notes. Every mutation updates the note's own flag in
//! the same call, so `note.is_selected()` and set membership cannot drift.

use super::note::{Note, NoteId};
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct Selection {
    ids: HashSet<NoteId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the note selected. Returns true if it was not selected before.
    pub fn select(&mut self, note: &mut Note) -> bool {
        note.set_selected(true);
        self.ids.insert(note.id)
    }

    /// Marks the note unselected. Returns true if it was selected before.
    pub fn unselect(&mut self, note: &mut Note) -> bool {
        note.set_selected(false);
        self.ids.remove(&note.id)
    }

    /// Unselects every member.
    ///
    /// `notes` is the whole store; ids without a note there are dropped too.
    pub fn clear(&mut self, notes: &mut [Note]) {
        for note in notes.iter_mut().filter(|n| self.ids.contains(&n.id)) {
            note.set_selected(false);
        }
        self.ids.clear();
    }

    pub fn select_all(&mut self, notes: &mut [Note]) {
        self.clear(notes);
        for note in notes.iter_mut() {
            self.select(note);
        }
    }

    /// Forgets ids without touching any note; used when the notes are gone.
    pub(crate) fn forget(&mut self, id: NoteId) -> bool {
        self.ids.remove(&id)
    }

    pub fn contains(&self, id: NoteId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selected ids in ascending (creation) order.
    pub fn ids(&self) -> Vec<NoteId> {
        let mut ids: Vec<NoteId> = self.ids.iter().copied().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notes(count: u64) -> Vec<Note> {
        (0..count)
            .map(|i| {
                let mut note =
                    Note::create(NoteId::from_raw(i), i as f64 * 120.0, 50.0, 0).unwrap();
                note.set_selected(false);
                note
            })
            .collect()
    }

    #[test]
    fn test_select_is_idempotent() {
        let mut notes = notes(1);
        let mut selection = Selection::new();
        assert!(selection.select(&mut notes[0]));
        assert!(!selection.select(&mut notes[0]));
        assert_eq!(selection.len(), 1);
        assert!(notes[0].is_selected());
    }

    #[test]
    fn test_unselect_is_idempotent() {
        let mut notes = notes(1);
        let mut selection = Selection::new();
        selection.select(&mut notes[0]);
        assert!(selection.unselect(&mut notes[0]));
        assert!(!selection.unselect(&mut notes[0]));
        assert!(selection.is_empty());
        assert!(!notes[0].is_selected());
    }

    #[test]
    fn test_clear_resets_flags() {
        let mut notes = notes(3);
        let mut selection = Selection::new();
        selection.select(&mut notes[0]);
        selection.select(&mut notes[2]);
        selection.clear(&mut notes);
        assert!(selection.is_empty());
        assert!(notes.iter().all(|n| !n.is_selected()));
    }

    #[test]
    fn test_select_all_matches_flags() {
        let mut notes = notes(4);
        let mut selection = Selection::new();
        selection.select(&mut notes[1]);
        selection.select_all(&mut notes);
        assert_eq!(selection.len(), 4);
        for note in &notes {
            assert_eq!(note.is_selected(), selection.contains(note.id));
        }
        assert_eq!(
            selection.ids(),
            (0..4).map(NoteId::from_raw).collect::<Vec<_>>()
        );
    }
}
