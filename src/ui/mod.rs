//! Terminal user interface components.
//!
//! The sheet (grid, notes, drag box, progress line), the instrument
//! selector above it, and a one-line status bar below.

mod canvas;
mod instruments;

use crate::app::{App, LayoutRegions, PITCH_LABEL_WIDTH};
use crate::editor::InteractionState;
use crate::sheet::{ChannelMap, Instrument};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

pub use canvas::render_sheet;
pub use instruments::render_instrument_bar;

/// Display colour of an instrument.
pub fn instrument_color(instrument: Instrument) -> Color {
    match instrument {
        Instrument::Gray => Color::Gray,
        Instrument::Green => Color::Green,
        Instrument::Blue => Color::Blue,
        Instrument::Goldenrod => Color::Rgb(218, 165, 32),
        Instrument::Magenta => Color::Magenta,
        Instrument::DeepSkyBlue => Color::Rgb(0, 191, 255),
        Instrument::Black => Color::Rgb(70, 70, 70),
        Instrument::Brown => Color::Rgb(165, 42, 42),
    }
}

/// Calculates the layout regions for the given terminal size.
///
/// This is called during rendering to update the layout regions used
/// for mouse hit testing.
pub fn calculate_layout(size: Rect, channels: &ChannelMap) -> LayoutRegions {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Instrument selector
            Constraint::Min(6),    // Sheet
            Constraint::Length(1), // Status bar
        ])
        .split(size);

    let instrument_bar = chunks[0];
    let sheet = chunks[1];

    let grid = Rect {
        x: sheet.x + 1 + PITCH_LABEL_WIDTH,
        y: sheet.y + 1,
        width: sheet.width.saturating_sub(2 + PITCH_LABEL_WIDTH),
        height: sheet.height.saturating_sub(2),
    };

    LayoutRegions {
        instrument_bar,
        instrument_slots: instruments::slot_rects(instrument_bar, channels),
        sheet,
        grid,
        status: chunks[2],
    }
}

/// Renders the complete UI and updates layout regions.
pub fn render(frame: &mut Frame, app: &mut App) {
    let layout = calculate_layout(frame.area(), app.editor.channels());
    app.update_layout(layout.clone());

    render_instrument_bar(frame, &layout, app);
    render_sheet(frame, layout.sheet, app);
    render_status_bar(frame, layout.status, app);
}

fn state_label(state: &InteractionState) -> &'static str {
    match state {
        InteractionState::Idle => "IDLE",
        InteractionState::BoxSelecting { .. } => "SELECT",
        InteractionState::Moving => "MOVE",
        InteractionState::Resizing { .. } => "RESIZE",
    }
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let editor = &app.editor;
    let label = if editor.is_playing() {
        "PLAY"
    } else {
        state_label(editor.state())
    };

    let mut spans = vec![
        Span::styled(
            format!(" {} ", label),
            Style::default()
                .fg(Color::Black)
                .bg(if editor.is_playing() {
                    Color::Green
                } else {
                    Color::Cyan
                })
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            " notes: {}  selected: {}  length: {} ticks  zoom: {} ",
            editor.notes().len(),
            editor.selection().len(),
            crate::sheet::stop_time(editor.notes()),
            app.zoom
        )),
    ];
    if let Some((message, _)) = &app.status_message {
        spans.push(Span::styled(
            format!("| {}", message),
            Style::default().fg(Color::Yellow),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
