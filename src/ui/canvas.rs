//! Sheet rendering.
//!
//! Draws the visible part of the 2000 × 1280 canvas: pitch labels on the
//! left, then one terminal row per grid row and one column per `zoom` canvas
//! units. Notes are drawn as `[====` runs in their instrument's colour,
//! selected notes in red; the drag box shades the background it covers and
//! the progress line is a red bar.

use super::instrument_color;
use crate::app::{App, PITCH_LABEL_WIDTH};
use crate::sheet::{note_to_name, Bounds, Note, CANVAS_WIDTH, MAX_PITCH, ROW_HEIGHT};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

/// Ticks per beat marker on the background.
const BEAT_TICKS: u32 = 100;

/// Ticks per measure marker (four beats).
const MEASURE_TICKS: u32 = BEAT_TICKS * 4;

/// Returns true if `[start, start + width)` contains a multiple of `step`.
fn spans_multiple(start: u32, width: u32, step: u32) -> bool {
    start % step == 0 || start / step != (start + width.max(1) - 1) / step
}

/// Topmost note (last in insertion order) covering part of the cell.
fn note_in_cell(notes: &[Note], pitch: u8, start: f64, end: f64) -> Option<&Note> {
    notes
        .iter()
        .rev()
        .find(|n| n.pitch() == pitch && n.x() < end && n.right() > start)
}

/// Renders the sheet panel.
pub fn render_sheet(frame: &mut Frame, area: Rect, app: &App) {
    let editor = &app.editor;
    let title = format!(" Sheet - {} ", editor.instrument());
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if editor.is_gesture_active() {
            Color::Cyan
        } else {
            Color::Gray
        }));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width <= PITCH_LABEL_WIDTH || inner.height == 0 {
        return;
    }

    let grid_width = inner.width - PITCH_LABEL_WIDTH;
    let notes = editor.notes();
    let drag_box: Option<Bounds> = editor.drag_box();
    let progress_col = app.progress_position().and_then(|x| app.column_of(x));
    let zoom = app.zoom as f64;

    for row in 0..inner.height {
        let sheet_row = app.scroll_row + row as u32;
        if sheet_row > MAX_PITCH as u32 {
            break;
        }
        let pitch = MAX_PITCH - sheet_row as u8;
        let y = inner.y + row;
        let row_centre = sheet_row as f64 * ROW_HEIGHT + ROW_HEIGHT / 2.0;

        let is_black_key = matches!(pitch % 12, 1 | 3 | 6 | 8 | 10);
        let key_style = if is_black_key {
            Style::default().bg(Color::DarkGray).fg(Color::White)
        } else if pitch % 12 == 0 {
            Style::default().bg(Color::White).fg(Color::Black)
        } else {
            Style::default().bg(Color::Gray).fg(Color::Black)
        };
        frame.render_widget(
            Paragraph::new(format!("{:>4} ", note_to_name(pitch))).style(key_style),
            Rect::new(inner.x, y, PITCH_LABEL_WIDTH, 1),
        );

        let mut line: Vec<Span> = Vec::with_capacity(grid_width as usize);
        for col in 0..grid_width {
            let tick = app.scroll_x + col as u32 * app.zoom;
            let start = tick as f64;
            let end = start + zoom;
            let centre = start + zoom / 2.0;

            let (ch, style) = if let Some(note) = note_in_cell(notes, pitch, start, end) {
                let ch = if note.x() >= start { '[' } else { '=' };
                let bg = if note.is_selected() {
                    Color::Red
                } else {
                    editor
                        .channels()
                        .instrument_for(note.channel())
                        .map(instrument_color)
                        .unwrap_or(Color::White)
                };
                let mut style = Style::default().fg(Color::Black).bg(bg);
                if note.is_selected() {
                    style = style.fg(Color::White).add_modifier(Modifier::BOLD);
                }
                (ch, style)
            } else if progress_col == Some(col) {
                (
                    '|',
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )
            } else {
                let in_box = drag_box
                    .map(|b| b.contains_strict(centre, row_centre))
                    .unwrap_or(false);
                let bg = if in_box {
                    Color::Rgb(70, 70, 20)
                } else if start >= CANVAS_WIDTH {
                    Color::Rgb(15, 15, 15)
                } else if is_black_key {
                    Color::Rgb(30, 30, 30)
                } else {
                    Color::Rgb(40, 40, 40)
                };

                let (ch, fg) = if spans_multiple(tick, app.zoom, MEASURE_TICKS) {
                    ('|', Color::White)
                } else if spans_multiple(tick, app.zoom, BEAT_TICKS) {
                    (':', Color::DarkGray)
                } else {
                    ('.', Color::Rgb(60, 60, 60))
                };
                (ch, Style::default().fg(fg).bg(bg))
            };

            line.push(Span::styled(ch.to_string(), style));
        }

        frame.render_widget(
            Paragraph::new(Line::from(line)),
            Rect::new(inner.x + PITCH_LABEL_WIDTH, y, grid_width, 1),
        );
    }
}
