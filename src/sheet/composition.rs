//! The note store.
//!
//! A composition owns every note in insertion order (which doubles as
//! z-order) together with the selection over them. Notes are addressed by
//! [`NoteId`], allocated from the composition's own counter and never reused.

use super::note::{Bounds, Note, NoteId, ResizeEdge};
use super::selection::Selection;

#[derive(Debug, Clone, Default)]
pub struct Composition {
    notes: Vec<Note>,
    selection: Selection,
    next_id: u64,
}

impl Composition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a note and selects it.
    ///
    /// # Arguments
    ///
    /// * `x`, `y` - Sheet position of the press
    /// * `channel` - Channel of the active instrument
    ///
    /// # Returns
    ///
    /// The id of the new note, or `None` if `y` is off the sheet (the
    /// composition is left untouched).
    pub fn add_note(&mut self, x: f64, y: f64, channel: u8) -> Option<NoteId> {
        let id = NoteId::from_raw(self.next_id);
        let mut note = Note::create(id, x, y, channel)?;
        self.next_id += 1;
        self.selection.select(&mut note);
        self.notes.push(note);
        Some(id)
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Notes in the current selection, in insertion order.
    pub fn selected_notes(&self) -> impl Iterator<Item = &Note> {
        self.notes.iter().filter(|n| self.selection.contains(n.id))
    }

    /// First note (in insertion order) strictly containing the point.
    pub fn note_at(&self, x: f64, y: f64) -> Option<NoteId> {
        self.notes.iter().find(|n| n.hit_test(x, y)).map(|n| n.id)
    }

    /// First note (in insertion order) with a resize edge under the point.
    pub fn edge_at(&self, x: f64, y: f64) -> Option<(NoteId, ResizeEdge)> {
        self.notes.iter().find_map(|n| match n.resize_edge(x, y) {
            ResizeEdge::None => None,
            edge => Some((n.id, edge)),
        })
    }

    pub fn is_selected(&self, id: NoteId) -> bool {
        self.selection.contains(id)
    }

    /// Returns true if the note exists and was newly selected.
    pub fn select(&mut self, id: NoteId) -> bool {
        match self.notes.iter_mut().find(|n| n.id == id) {
            Some(note) => self.selection.select(note),
            None => false,
        }
    }

    /// Returns true if the note exists and was selected before.
    pub fn unselect(&mut self, id: NoteId) -> bool {
        match self.notes.iter_mut().find(|n| n.id == id) {
            Some(note) => self.selection.unselect(note),
            None => false,
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear(&mut self.notes);
    }

    pub fn select_all(&mut self) {
        self.selection.select_all(&mut self.notes);
    }

    /// Replaces the selection with `base` plus every note enclosed by
    /// `bounds`.
    pub fn select_enclosed(&mut self, bounds: &Bounds, base: &[NoteId]) {
        self.selection.clear(&mut self.notes);
        for note in self.notes.iter_mut() {
            if base.contains(&note.id) || note.is_enclosed_by(bounds) {
                self.selection.select(note);
            }
        }
    }

    /// Removes every selected note and empties the selection.
    ///
    /// Returns the removed notes in insertion order.
    pub fn delete_selected(&mut self) -> Vec<Note> {
        let (removed, kept): (Vec<Note>, Vec<Note>) = std::mem::take(&mut self.notes)
            .into_iter()
            .partition(|n| self.selection.contains(n.id));
        self.notes = kept;
        for note in &removed {
            self.selection.forget(note.id);
        }
        debug_assert!(self.selection.is_empty());
        removed
    }

    pub fn translate_selected(&mut self, dx: f64, dy: f64) {
        for note in self.selected_mut() {
            note.translate(dx, dy);
        }
    }

    pub fn resize_selected(&mut self, edge: ResizeEdge, dx: f64) {
        for note in self.selected_mut() {
            note.resize(edge, dx);
        }
    }

    pub fn snap_selected(&mut self) {
        for note in self.selected_mut() {
            note.snap_to_grid();
        }
    }

    fn selected_mut(&mut self) -> impl Iterator<Item = &mut Note> {
        let selection = &self.selection;
        self.notes
            .iter_mut()
            .filter(move |n| selection.contains(n.id))
    }
}
