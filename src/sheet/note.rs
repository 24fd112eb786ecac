//! Note glyph representation.
//!
//! A note is a rectangle on the sheet: its left edge is the start tick, its
//! width the duration, and the row it rests on the pitch. Each note owns its
//! own hit-testing, resize-edge detection and grid snapping.

use super::{is_on_sheet, pitch_at, MAX_NOTE_Y, ROW_HEIGHT};
use std::fmt;

/// Height of every note glyph in canvas units.
pub const NOTE_HEIGHT: f64 = ROW_HEIGHT;

/// Width given to freshly created notes.
pub const DEFAULT_WIDTH: f64 = 100.0;

/// Notes can never be resized below this width.
pub const MIN_WIDTH: f64 = 5.0;

/// Distance from a note's left or right edge that still grabs the edge.
pub const RESIZE_MARGIN: f64 = 5.0;

/// Volume of every note event.
pub const DEFAULT_VOLUME: u8 = 100;

/// Unique identifier for a note within a composition.
/// Allows selection and manipulation without holding references into the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteId(u64);

impl NoteId {
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which edge of a note a pointer has grabbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeEdge {
    /// The pointer is not on an edge.
    #[default]
    None,
    /// The left edge: moves the start, keeps the end.
    Left,
    /// The right edge: changes the duration.
    Right,
}

/// An axis-aligned rectangle with normalized corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Builds bounds from any two opposite corners.
    pub fn from_corners(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            min_x: x0.min(x1),
            min_y: y0.min(y1),
            max_x: x0.max(x1),
            max_y: y0.max(y1),
        }
    }

    /// Returns true if the point lies strictly inside, not on an edge.
    pub fn contains_strict(&self, x: f64, y: f64) -> bool {
        x > self.min_x && x < self.max_x && y > self.min_y && y < self.max_y
    }

    /// Returns true if `other` lies strictly inside these bounds on both axes.
    pub fn encloses(&self, other: &Bounds) -> bool {
        self.min_x < other.min_x
            && other.max_x < self.max_x
            && self.min_y < other.min_y
            && other.max_y < self.max_y
    }
}

/// The rubber-band rectangle of a box-selection gesture.
///
/// Anchored where the pointer went down and grown by pointer deltas. The
/// extent may go negative when dragging up or left; [`DragBox::bounds`]
/// always normalizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragBox {
    anchor_x: f64,
    anchor_y: f64,
    width: f64,
    height: f64,
}

impl DragBox {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            anchor_x: x,
            anchor_y: y,
            width: 0.0,
            height: 0.0,
        }
    }

    pub fn grow(&mut self, dx: f64, dy: f64) {
        self.width += dx;
        self.height += dy;
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::from_corners(
            self.anchor_x,
            self.anchor_y,
            self.anchor_x + self.width,
            self.anchor_y + self.height,
        )
    }
}

/// A single note glyph on the sheet.
///
/// Geometry is kept in canvas units; the musical values (`pitch`,
/// `start_tick`, `duration`) are derived from it on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    /// Unique identifier for this note instance.
    pub id: NoteId,
    x: f64,
    y: f64,
    width: f64,
    /// Channel (0-7) of the instrument active when the note was created.
    channel: u8,
    selected: bool,
}

impl Note {
    /// Creates a note at the given sheet position.
    ///
    /// Returns `None` if `y` is off the sheet. Otherwise `y` is moved down
    /// to the top of its row, the note gets the default width, and starts
    /// out selected.
    ///
    /// # Examples
    ///
    /// ```
    /// use pianoroll::sheet::{Note, NoteId};
    ///
    /// let note = Note::create(NoteId::default(), 40.0, 127.0, 2).unwrap();
    /// assert_eq!(note.y(), 120.0);
    /// assert_eq!(note.width(), 100.0);
    /// assert!(note.is_selected());
    ///
    /// assert!(Note::create(NoteId::default(), 40.0, 1280.0, 2).is_none());
    /// ```
    pub fn create(id: NoteId, x: f64, y: f64, channel: u8) -> Option<Self> {
        if !is_on_sheet(y) {
            return None;
        }
        Some(Self {
            id,
            x,
            y: y - (y % ROW_HEIGHT),
            width: DEFAULT_WIDTH,
            channel,
            selected: true,
        })
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        NOTE_HEIGHT
    }

    /// X coordinate of the right edge.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Single-track model: always track 0.
    pub fn track_index(&self) -> u8 {
        0
    }

    pub fn bounds(&self) -> Bounds {
        Bounds {
            min_x: self.x,
            min_y: self.y,
            max_x: self.x + self.width,
            max_y: self.y + NOTE_HEIGHT,
        }
    }

    /// MIDI pitch of the row the note rests on: 127 at the top of the sheet.
    pub fn pitch(&self) -> u8 {
        pitch_at(self.y)
    }

    pub fn start_tick(&self) -> u32 {
        self.x.max(0.0).floor() as u32
    }

    pub fn duration(&self) -> u32 {
        self.width.max(0.0).floor() as u32
    }

    /// Returns the end tick of this note (start + duration).
    pub fn end_tick(&self) -> u32 {
        self.start_tick().saturating_add(self.duration())
    }

    pub fn volume(&self) -> u8 {
        DEFAULT_VOLUME
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Sets the selection flag.
    ///
    /// Only [`super::Selection`] should call this so the flag never drifts
    /// from set membership.
    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    /// Returns true if the point lies strictly inside the note.
    ///
    /// Points on the boundary belong to no note, so adjacent notes never
    /// both claim a click.
    pub fn hit_test(&self, px: f64, py: f64) -> bool {
        self.bounds().contains_strict(px, py)
    }

    /// Returns which edge, if any, the point grabs.
    ///
    /// The point must be strictly inside the note's vertical span and within
    /// `margin` units of an edge, the edge itself included. The right edge
    /// wins when a narrow note puts the point near both.
    pub fn resize_edge_with_margin(&self, px: f64, py: f64, margin: f64) -> ResizeEdge {
        if !(py > self.y && py < self.y + NOTE_HEIGHT) {
            return ResizeEdge::None;
        }
        let from_right = self.right() - px;
        let from_left = px - self.x;
        if (0.0..=margin).contains(&from_right) {
            ResizeEdge::Right
        } else if (0.0..=margin).contains(&from_left) {
            ResizeEdge::Left
        } else {
            ResizeEdge::None
        }
    }

    /// [`Note::resize_edge_with_margin`] with the default [`RESIZE_MARGIN`].
    pub fn resize_edge(&self, px: f64, py: f64) -> ResizeEdge {
        self.resize_edge_with_margin(px, py, RESIZE_MARGIN)
    }

    pub fn is_on_resize_edge(&self, px: f64, py: f64) -> bool {
        self.resize_edge(px, py) != ResizeEdge::None
    }

    /// Returns true if the note lies entirely, strictly inside `bounds`.
    /// Partial overlap does not count.
    pub fn is_enclosed_by(&self, bounds: &Bounds) -> bool {
        bounds.encloses(&self.bounds())
    }

    /// Moves the note. No clamping happens until [`Note::snap_to_grid`].
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }

    /// Drags one edge of the note by `dx`.
    ///
    /// The width never drops below [`MIN_WIDTH`]; a left-edge drag keeps the
    /// right edge in place and does not push the start below zero.
    pub fn resize(&mut self, edge: ResizeEdge, dx: f64) {
        match edge {
            ResizeEdge::None => {}
            ResizeEdge::Right => {
                self.width = (self.width + dx).max(MIN_WIDTH);
            }
            ResizeEdge::Left => {
                let right = self.right();
                let lowest = self.x.min(0.0);
                let x = (self.x + dx).clamp(lowest, right - MIN_WIDTH);
                self.x = x;
                self.width = right - x;
            }
        }
    }

    /// Drops the note into the nearest row and back onto the sheet.
    ///
    /// Offsets below half a row snap to the row above (smaller y); half a
    /// row or more snap to the row below.
    pub fn snap_to_grid(&mut self) {
        let offset = self.y.rem_euclid(ROW_HEIGHT);
        let snapped = if offset < ROW_HEIGHT / 2.0 {
            self.y - offset
        } else {
            self.y + (ROW_HEIGHT - offset)
        };
        self.y = snapped.clamp(0.0, MAX_NOTE_Y);
        self.x = self.x.max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note_at(x: f64, y: f64) -> Note {
        Note::create(NoteId::from_raw(1), x, y, 0).unwrap()
    }

    #[test]
    fn test_create_snaps_down_to_row() {
        for y in [0.0, 0.5, 9.99, 10.0, 123.4, 1269.0, 1279.9] {
            let note = note_at(0.0, y);
            assert_eq!(note.y(), y - (y % ROW_HEIGHT));
            assert_eq!(note.y() % ROW_HEIGHT, 0.0);
            assert!((0.0..=MAX_NOTE_Y).contains(&note.y()));
        }
    }

    #[test]
    fn test_create_rejects_off_sheet() {
        assert!(Note::create(NoteId::from_raw(1), 10.0, -1.0, 0).is_none());
        assert!(Note::create(NoteId::from_raw(1), 10.0, 1280.0, 0).is_none());
        assert!(Note::create(NoteId::from_raw(1), 10.0, 5000.0, 0).is_none());
    }

    #[test]
    fn test_create_defaults() {
        let note = Note::create(NoteId::from_raw(7), 30.0, 45.0, 3).unwrap();
        assert_eq!(note.width(), DEFAULT_WIDTH);
        assert_eq!(note.height(), NOTE_HEIGHT);
        assert_eq!(note.channel(), 3);
        assert_eq!(note.track_index(), 0);
        assert_eq!(note.volume(), 100);
        assert!(note.is_selected());
    }

    #[test]
    fn test_pitch_from_row() {
        assert_eq!(note_at(0.0, 0.0).pitch(), 127);
        assert_eq!(note_at(0.0, 1270.0).pitch(), 0);
        assert_eq!(note_at(0.0, 670.0).pitch(), 60);
    }

    #[test]
    fn test_ticks_are_floored() {
        let mut note = note_at(12.7, 0.0);
        note.resize(ResizeEdge::Right, 0.9);
        assert_eq!(note.start_tick(), 12);
        assert_eq!(note.duration(), 100);
        assert_eq!(note.end_tick(), 112);
    }

    #[test]
    fn test_hit_test_is_strictly_interior() {
        let note = note_at(100.0, 50.0); // (100,50)-(200,60)
        assert!(!note.hit_test(100.0, 55.0));
        assert!(!note.hit_test(200.0, 55.0));
        assert!(!note.hit_test(150.0, 50.0));
        assert!(!note.hit_test(150.0, 60.0));
        assert!(note.hit_test(101.0, 55.0));
        assert!(note.hit_test(199.0, 55.0));
        assert!(note.hit_test(150.0, 51.0));
        assert!(note.hit_test(150.0, 59.0));
    }

    #[test]
    fn test_resize_edges() {
        let note = note_at(100.0, 50.0);
        assert_eq!(note.resize_edge(200.0, 55.0), ResizeEdge::Right);
        assert_eq!(note.resize_edge(195.0, 55.0), ResizeEdge::Right);
        assert_eq!(note.resize_edge(194.0, 55.0), ResizeEdge::None);
        assert_eq!(note.resize_edge(201.0, 55.0), ResizeEdge::None);
        assert_eq!(note.resize_edge(100.0, 55.0), ResizeEdge::Left);
        assert_eq!(note.resize_edge(105.0, 55.0), ResizeEdge::Left);
        assert_eq!(note.resize_edge(106.0, 55.0), ResizeEdge::None);
        assert_eq!(note.resize_edge(99.0, 55.0), ResizeEdge::None);
        // Vertical span is strict.
        assert_eq!(note.resize_edge(198.0, 50.0), ResizeEdge::None);
        assert_eq!(note.resize_edge(198.0, 60.0), ResizeEdge::None);
        assert!(note.is_on_resize_edge(198.0, 52.0));
    }

    #[test]
    fn test_narrow_note_prefers_right_edge() {
        let mut note = note_at(0.0, 0.0);
        note.resize(ResizeEdge::Right, -1000.0);
        assert_eq!(note.resize_edge(2.0, 5.0), ResizeEdge::Right);
    }

    #[test]
    fn test_box_containment() {
        let note = note_at(10.0, 10.0); // (10,10)-(110,20)
        assert!(note.is_enclosed_by(&Bounds::from_corners(0.0, 0.0, 150.0, 150.0)));
        assert!(!note.is_enclosed_by(&Bounds::from_corners(0.0, 0.0, 50.0, 50.0)));
        // Touching edges is not strict containment.
        assert!(!note.is_enclosed_by(&Bounds::from_corners(10.0, 0.0, 150.0, 150.0)));
        // Corner order does not matter.
        assert!(note.is_enclosed_by(&Bounds::from_corners(150.0, 150.0, 0.0, 0.0)));
    }

    #[test]
    fn test_translate_does_not_clamp() {
        let mut note = note_at(10.0, 10.0);
        note.translate(-50.0, -30.0);
        assert_eq!(note.x(), -40.0);
        assert_eq!(note.y(), -20.0);
    }

    #[test]
    fn test_snap_to_nearest_row() {
        let cases = [
            (100.0, 4.0, 100.0),
            (100.0, 4.9, 100.0),
            (100.0, 5.0, 110.0),
            (100.0, 7.0, 110.0),
            (100.0, -3.0, 100.0),
            (100.0, -6.0, 90.0),
        ];
        for (start, dy, expected) in cases {
            let mut note = note_at(0.0, start);
            note.translate(0.0, dy);
            note.snap_to_grid();
            assert_eq!(note.y(), expected, "start {} moved by {}", start, dy);
            assert_eq!(note.y() % ROW_HEIGHT, 0.0);
        }
    }

    #[test]
    fn test_snap_clamps_onto_sheet() {
        let mut note = note_at(10.0, 0.0);
        note.translate(-30.0, -42.0);
        note.snap_to_grid();
        assert_eq!(note.y(), 0.0);
        assert_eq!(note.x(), 0.0);

        let mut note = note_at(10.0, MAX_NOTE_Y);
        note.translate(0.0, 300.0);
        note.snap_to_grid();
        assert_eq!(note.y(), MAX_NOTE_Y);
    }

    #[test]
    fn test_resize_right_clamps_to_minimum() {
        let mut note = note_at(10.0, 10.0);
        note.resize(ResizeEdge::Right, 25.0);
        assert_eq!(note.width(), 125.0);
        note.resize(ResizeEdge::Right, -10_000.0);
        assert_eq!(note.width(), MIN_WIDTH);
        note.resize(ResizeEdge::Right, -1.0);
        assert_eq!(note.width(), MIN_WIDTH);
    }

    #[test]
    fn test_resize_left_keeps_right_edge() {
        let mut note = note_at(100.0, 10.0);
        note.resize(ResizeEdge::Left, 30.0);
        assert_eq!(note.x(), 130.0);
        assert_eq!(note.right(), 200.0);

        note.resize(ResizeEdge::Left, 500.0);
        assert_eq!(note.width(), MIN_WIDTH);
        assert_eq!(note.right(), 200.0);

        note.resize(ResizeEdge::Left, -1000.0);
        assert_eq!(note.x(), 0.0);
        assert_eq!(note.right(), 200.0);
    }

    #[test]
    fn test_resize_none_is_noop() {
        let mut note = note_at(100.0, 10.0);
        let before = note.clone();
        note.resize(ResizeEdge::None, 40.0);
        assert_eq!(note, before);
    }

    #[test]
    fn test_drag_box_normalizes() {
        let mut drag_box = DragBox::new(100.0, 100.0);
        drag_box.grow(-60.0, -40.0);
        let bounds = drag_box.bounds();
        assert_eq!(bounds.min_x, 40.0);
        assert_eq!(bounds.min_y, 60.0);
        assert_eq!(bounds.max_x, 100.0);
        assert_eq!(bounds.max_y, 100.0);
    }
}
