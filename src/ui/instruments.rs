//! Instrument selector rendering.
//!
//! One slot per registered instrument, labelled with its number key and
//! drawn in its colour. The active instrument is shown reversed.

use super::instrument_color;
use crate::app::{App, LayoutRegions};
use crate::sheet::{ChannelMap, Instrument};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

fn slot_label(index: usize, instrument: Instrument) -> String {
    format!(" {} {} ", index + 1, instrument.name())
}

/// Screen rectangles of the selector slots, laid out left to right inside
/// the bar's border. Slots that do not fit are dropped.
pub(super) fn slot_rects(bar: Rect, channels: &ChannelMap) -> Vec<(Instrument, Rect)> {
    let inner = Block::default().borders(Borders::ALL).inner(bar);
    if inner.height == 0 {
        return Vec::new();
    }
    let end = inner.x + inner.width;
    let mut x = inner.x;
    let mut slots = Vec::new();
    for (index, instrument) in channels.instruments().enumerate() {
        let width = slot_label(index, instrument).len() as u16;
        if x + width > end {
            break;
        }
        slots.push((instrument, Rect::new(x, inner.y, width, 1)));
        x += width + 1;
    }
    slots
}

pub fn render_instrument_bar(frame: &mut Frame, layout: &LayoutRegions, app: &App) {
    let active = app.editor.instrument();
    let block = Block::default()
        .title(" Instruments ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));
    frame.render_widget(block, layout.instrument_bar);

    for (index, (instrument, rect)) in layout.instrument_slots.iter().enumerate() {
        let color = instrument_color(*instrument);
        let style = if *instrument == active {
            Style::default()
                .fg(Color::Black)
                .bg(color)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(color)
        };
        frame.render_widget(
            Paragraph::new(slot_label(index, *instrument)).style(style),
            *rect,
        );
    }
}
