//! Application state and event handling.
//!
//! Sits between the terminal and the [`Editor`]: translates terminal cells
//! into canvas units, keeps the viewport (scroll and zoom), and turns the
//! editor's canvas events into status messages.

use crate::audio::PlaybackBackend;
use crate::editor::{CanvasEvent, Editor, PlaybackAction};
use crate::error::Result;
use crate::sheet::{note_to_name, Instrument, ROW_COUNT, ROW_HEIGHT};
use crate::transport::ProgressLine;
use ratatui::layout::Rect;
use std::time::{Duration, Instant};
use tracing::info;

/// The editor as the application runs it.
pub type SheetEditor = Editor<Box<dyn PlaybackBackend>, ProgressLine>;

/// Width of the pitch labels left of the grid.
pub const PITCH_LABEL_WIDTH: u16 = 5;

/// Canvas units (ticks) per terminal column at startup.
pub const DEFAULT_ZOOM: u32 = 10;

const MIN_ZOOM: u32 = 1;
const MAX_ZOOM: u32 = 80;

/// Row shown at the top of the grid at startup (pitch 72, C5).
const DEFAULT_SCROLL_ROW: u32 = 55;

/// How long a status message stays up.
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// Layout regions for mouse hit testing.
/// Stores the screen coordinates of each UI panel.
#[derive(Debug, Clone, Default)]
pub struct LayoutRegions {
    /// The instrument selector at the top.
    pub instrument_bar: Rect,
    /// One clickable slot per instrument, in table order.
    pub instrument_slots: Vec<(Instrument, Rect)>,
    /// The sheet panel (border and pitch labels included).
    pub sheet: Rect,
    /// The drawable grid inside the sheet panel.
    pub grid: Rect,
    /// The status line at the bottom.
    pub status: Rect,
}

impl LayoutRegions {
    fn contains(rect: Rect, x: u16, y: u16) -> bool {
        x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
    }

    pub fn is_in_grid(&self, x: u16, y: u16) -> bool {
        Self::contains(self.grid, x, y)
    }

    /// The instrument whose selector slot covers the given cell.
    pub fn instrument_at(&self, x: u16, y: u16) -> Option<Instrument> {
        self.instrument_slots
            .iter()
            .find(|(_, rect)| Self::contains(*rect, x, y))
            .map(|(instrument, _)| *instrument)
    }

    /// Number of grid rows on screen.
    pub fn visible_rows(&self) -> u32 {
        self.grid.height as u32
    }
}

pub struct App {
    pub editor: SheetEditor,
    /// Canvas x at the left edge of the grid.
    pub scroll_x: u32,
    /// Sheet row at the top of the grid (row 0 = pitch 127).
    pub scroll_row: u32,
    /// Canvas units per column.
    pub zoom: u32,
    pub layout: LayoutRegions,
    pub status_message: Option<(String, Instant)>,
    pub should_quit: bool,
}

impl App {
    pub fn new(editor: SheetEditor) -> Self {
        Self {
            editor,
            scroll_x: 0,
            scroll_row: DEFAULT_SCROLL_ROW,
            zoom: DEFAULT_ZOOM,
            layout: LayoutRegions::default(),
            status_message: None,
            should_quit: false,
        }
    }

    /// Updates the layout regions based on current terminal size.
    /// Called by the UI module during rendering.
    pub fn update_layout(&mut self, layout: LayoutRegions) {
        self.layout = layout;
        self.clamp_scroll();
    }

    /// Canvas coordinates at the centre of a terminal cell.
    ///
    /// Cells outside the grid map past its edges, so a drag that leaves
    /// the grid keeps producing deltas.
    pub fn canvas_point(&self, column: u16, row: u16) -> (f64, f64) {
        let col = column as f64 - self.layout.grid.x as f64;
        let row = row as f64 - self.layout.grid.y as f64;
        let zoom = self.zoom as f64;
        let x = self.scroll_x as f64 + col * zoom + zoom / 2.0;
        let y = (self.scroll_row as f64 + row) * ROW_HEIGHT + ROW_HEIGHT / 2.0;
        (x, y)
    }

    /// Column showing canvas x, if it is on screen.
    pub fn column_of(&self, x: f64) -> Option<u16> {
        if x < self.scroll_x as f64 {
            return None;
        }
        let col = ((x - self.scroll_x as f64) / self.zoom as f64).floor() as u32;
        (col < self.layout.grid.width as u32).then_some(col as u16)
    }

    /// Left button pressed on a cell.
    pub fn press(&mut self, column: u16, row: u16, ctrl: bool) -> Result<()> {
        if let Some(instrument) = self.layout.instrument_at(column, row) {
            self.select_instrument(instrument);
            return Ok(());
        }
        if self.layout.is_in_grid(column, row) {
            let (x, y) = self.canvas_point(column, row);
            self.editor.pointer_down(x, y, ctrl);
        }
        Ok(())
    }

    /// Pointer dragged to a cell with the left button held.
    pub fn drag(&mut self, column: u16, row: u16) {
        if self.editor.is_gesture_active() {
            let (x, y) = self.canvas_point(column, row);
            self.editor.pointer_move(x, y);
        }
    }

    /// Left button released on a cell.
    pub fn release(&mut self, column: u16, row: u16) -> Result<()> {
        if self.editor.is_gesture_active() {
            let (x, y) = self.canvas_point(column, row);
            self.editor.pointer_up(x, y)?;
        }
        Ok(())
    }

    pub fn select_instrument(&mut self, instrument: Instrument) {
        self.editor.change_instrument(instrument);
        self.set_status(format!("Instrument: {}", instrument));
    }

    /// Selects the instrument in the given selector slot (0-based).
    pub fn select_instrument_slot(&mut self, index: usize) {
        let instrument = self.editor.channels().instruments().nth(index);
        if let Some(instrument) = instrument {
            self.select_instrument(instrument);
        }
    }

    pub fn toggle_playback(&mut self) {
        if self.editor.toggle_playback() == PlaybackAction::Deferred {
            self.set_status("Finish the current drag first");
        }
    }

    pub fn select_all(&mut self) {
        self.editor.select_all();
    }

    pub fn delete_selected(&mut self) {
        self.editor.delete_selected();
    }

    pub fn scroll_horizontal(&mut self, columns: i32) {
        let delta = columns as i64 * self.zoom as i64;
        self.scroll_x = (self.scroll_x as i64 + delta).max(0) as u32;
    }

    pub fn scroll_vertical(&mut self, rows: i32) {
        self.scroll_row = (self.scroll_row as i64 + rows as i64).max(0) as u32;
        self.clamp_scroll();
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom / 2).max(MIN_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom * 2).min(MAX_ZOOM);
    }

    fn clamp_scroll(&mut self) {
        let max_row = ROW_COUNT.saturating_sub(self.layout.visible_rows().max(1));
        self.scroll_row = self.scroll_row.min(max_row);
    }

    /// Per-frame housekeeping: advances playback, follows the progress
    /// line, and reports editor events.
    pub fn tick(&mut self) {
        self.editor.update();

        for event in self.editor.take_events() {
            match event {
                CanvasEvent::NoteAdded(id) => {
                    if let Some(note) = self.editor.composition().get(id) {
                        let message = format!(
                            "Added {} at tick {} ({})",
                            note_to_name(note.pitch()),
                            note.start_tick(),
                            self.editor.instrument()
                        );
                        self.set_status(message);
                    }
                }
                CanvasEvent::NotesRemoved(ids) => {
                    self.set_status(format!("Deleted {} note(s)", ids.len()));
                }
                CanvasEvent::PlaybackStarted { stop_time } => {
                    self.set_status(format!("Playing ({} ticks)", stop_time));
                }
                CanvasEvent::PlaybackStopped => {
                    self.set_status("Stopped");
                }
                CanvasEvent::NotesChanged(_)
                | CanvasEvent::SelectionChanged { .. }
                | CanvasEvent::DragBoxChanged(_) => {}
            }
        }

        // Auto-scroll to follow playback
        if let Some(position) = self.progress_position() {
            let visible_ticks = self.zoom * self.layout.grid.width as u32;
            let position = position as u32;
            if visible_ticks > 0 && position > self.scroll_x + visible_ticks * 3 / 4 {
                self.scroll_x = position.saturating_sub(visible_ticks / 4);
            }
        }

        self.clear_expired_status();
    }

    /// Position of the progress line in canvas units while it runs.
    pub fn progress_position(&self) -> Option<f64> {
        self.editor.transport().position()
    }

    /// Sets a status message to display temporarily.
    pub fn set_status(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!(status = %message);
        self.status_message = Some((message, Instant::now()));
    }

    pub fn clear_expired_status(&mut self) {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed() > STATUS_TIMEOUT {
                self.status_message = None;
            }
        }
    }

    pub fn quit(&mut self) {
        self.editor.stop();
        self.should_quit = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::MutedBackend;
    use crate::sheet::ChannelMap;

    fn app() -> App {
        let editor = Editor::new(
            ChannelMap::default(),
            Instrument::Gray,
            Box::new(MutedBackend::new(100.0)) as Box<dyn PlaybackBackend>,
            ProgressLine::default(),
        );
        let mut app = App::new(editor);
        app.update_layout(LayoutRegions {
            instrument_slots: vec![
                (Instrument::Gray, Rect::new(0, 0, 8, 1)),
                (Instrument::Green, Rect::new(8, 0, 9, 1)),
            ],
            grid: Rect::new(6, 2, 60, 20),
            ..LayoutRegions::default()
        });
        app
    }

    #[test]
    fn test_canvas_point_is_cell_centre() {
        let app = app();
        assert_eq!(app.canvas_point(6, 2), (5.0, 555.0));
        assert_eq!(app.canvas_point(8, 3), (25.0, 565.0));
    }

    #[test]
    fn test_column_of() {
        let mut app = app();
        app.scroll_x = 100;
        assert_eq!(app.column_of(99.0), None);
        assert_eq!(app.column_of(100.0), Some(0));
        assert_eq!(app.column_of(129.0), Some(2));
        assert_eq!(app.column_of(700.0), None);
    }

    #[test]
    fn test_click_on_grid_creates_note() {
        let mut app = app();
        app.press(10, 4, false).unwrap();
        app.release(10, 4).unwrap();
        let notes = app.editor.notes();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].x(), 45.0);
        assert_eq!(notes[0].y(), 570.0);
        assert_eq!(notes[0].pitch(), 70);
    }

    #[test]
    fn test_click_outside_grid_does_nothing() {
        let mut app = app();
        app.press(2, 10, false).unwrap();
        app.release(2, 10).unwrap();
        assert!(app.editor.notes().is_empty());
    }

    #[test]
    fn test_instrument_slot_click() {
        let mut app = app();
        app.press(9, 0, false).unwrap();
        assert_eq!(app.editor.instrument(), Instrument::Green);
        app.select_instrument_slot(4);
        assert_eq!(app.editor.instrument(), Instrument::Magenta);
        app.select_instrument_slot(20);
        assert_eq!(app.editor.instrument(), Instrument::Magenta);
    }

    #[test]
    fn test_drag_outside_grid_keeps_moving() {
        let mut app = app();
        app.press(10, 4, false).unwrap();
        app.release(10, 4).unwrap();
        // Grab the middle of the note and drag it left past the grid edge.
        app.press(12, 4, false).unwrap();
        app.drag(2, 4);
        app.release(2, 4).unwrap();
        assert_eq!(app.editor.notes()[0].x(), 0.0);
    }

    #[test]
    fn test_scroll_and_zoom_limits() {
        let mut app = app();
        app.scroll_horizontal(-5);
        assert_eq!(app.scroll_x, 0);
        app.scroll_horizontal(3);
        assert_eq!(app.scroll_x, 30);

        app.scroll_vertical(1000);
        assert_eq!(app.scroll_row, 128 - 20);
        app.scroll_vertical(-1000);
        assert_eq!(app.scroll_row, 0);

        for _ in 0..10 {
            app.zoom_in();
        }
        assert_eq!(app.zoom, 1);
        for _ in 0..10 {
            app.zoom_out();
        }
        assert_eq!(app.zoom, 80);
    }

    #[test]
    fn test_tick_reports_events() {
        let mut app = app();
        app.press(10, 4, false).unwrap();
        app.release(10, 4).unwrap();
        app.tick();
        let (message, _) = app.status_message.clone().unwrap();
        assert_eq!(message, "Added A#4 at tick 45 (gray)");

        app.select_all();
        app.delete_selected();
        app.tick();
        assert_eq!(app.status_message.clone().unwrap().0, "Deleted 1 note(s)");
    }
}
