//! TUI rendering for the metronome screen
//!
//! Draws the title, four beat boxes, the status line, an optional notice and
//! the key help from a [`MetronomeSnapshot`]. The row/column math lives in small pure helpers
//! so it can be checked without a terminal.

use ratatui::prelude::*;
use ratatui::widgets::{Block, BorderType, Paragraph};

use super::keymap::help_line;
use crate::engine::tempo::BEATS_PER_BAR;
use crate::engine::MetronomeSnapshot;

pub const TITLE: &str = "Terminal Metronome";

/// Text rows inside a beat box
pub const BOX_ROWS: usize = 5;

/// Symbol row for each wave frame; frame 0 is also the resting position
pub const WAVE_SYMBOL_ROWS: [usize; 5] = [1, 0, 1, 2, 1];

/// Row holding the beat number
pub const NUMBER_ROW: usize = 3;

const BOX_WIDTH: u16 = 14;
const BOX_HEIGHT: u16 = BOX_ROWS as u16 + 2;

const ACCENT: Color = Color::Indexed(205);
const IDLE_BORDER: Color = Color::Indexed(240);
const ACTIVE_BG: Color = Color::Indexed(235);
const STATUS_FG: Color = Color::Indexed(86);
const HELP_FG: Color = Color::Indexed(241);
const NOTICE_FG: Color = Color::Indexed(214);

/// Render the whole screen.
///
/// `notice` is shown under the status line, e.g. a startup usage warning.
pub fn render(frame: &mut Frame, snapshot: &MetronomeSnapshot, notice: Option<&str>) {
    let [title, _, beats, _, status, notice_area, help] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(BOX_HEIGHT),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .horizontal_margin(2)
    .vertical_margin(1)
    .areas(frame.area());

    frame.render_widget(
        Paragraph::new(Span::styled(
            TITLE,
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )),
        title,
    );

    let [b0, b1, b2, b3, _] = Layout::horizontal([
        Constraint::Length(BOX_WIDTH),
        Constraint::Length(BOX_WIDTH),
        Constraint::Length(BOX_WIDTH),
        Constraint::Length(BOX_WIDTH),
        Constraint::Min(0),
    ])
    .areas(beats);
    for (index, area) in [b0, b1, b2, b3].into_iter().enumerate() {
        render_beat_box(frame, area, snapshot, index as u8);
    }

    frame.render_widget(
        Paragraph::new(Span::styled(
            status_line(snapshot),
            Style::default().fg(STATUS_FG),
        )),
        status,
    );
    if let Some(notice) = notice {
        frame.render_widget(
            Paragraph::new(Span::styled(notice, Style::default().fg(NOTICE_FG))),
            notice_area,
        );
    }
    frame.render_widget(
        Paragraph::new(Span::styled(help_line(), Style::default().fg(HELP_FG))),
        help,
    );
}

fn render_beat_box(frame: &mut Frame, area: Rect, snapshot: &MetronomeSnapshot, index: u8) {
    let active = is_active(snapshot, index);

    // Double border marks the downbeat while it sounds
    let border_type = if active && index == 0 {
        BorderType::Double
    } else {
        BorderType::Rounded
    };
    let mut block = Block::bordered()
        .border_type(border_type)
        .border_style(Style::default().fg(if active { ACCENT } else { IDLE_BORDER }));
    let mut text_style = Style::default();
    if active {
        block = block.style(Style::default().bg(ACTIVE_BG));
        text_style = text_style.add_modifier(Modifier::BOLD);
    }

    let lines: Vec<Line> = beat_box_lines(snapshot, index)
        .into_iter()
        .map(Line::from)
        .collect();
    frame.render_widget(
        Paragraph::new(lines)
            .style(text_style)
            .alignment(Alignment::Center)
            .block(block),
        area,
    );
}

/// Whether box `index` is the sounding beat. Nothing is active while paused.
pub fn is_active(snapshot: &MetronomeSnapshot, index: u8) -> bool {
    snapshot.is_playing() && snapshot.beat_index == index
}

/// Wave frame for an animation phase: min(phase / 2, 4).
pub fn wave_frame(phase: u8) -> usize {
    (phase as usize / 2).min(WAVE_SYMBOL_ROWS.len() - 1)
}

pub fn beat_symbol(index: u8) -> &'static str {
    if index == 0 {
        "♩"
    } else {
        "♪"
    }
}

/// Row the symbol of box `index` sits on.
pub fn symbol_row(snapshot: &MetronomeSnapshot, index: u8) -> usize {
    if is_active(snapshot, index) && snapshot.is_animating() {
        WAVE_SYMBOL_ROWS[wave_frame(snapshot.animation_phase)]
    } else {
        WAVE_SYMBOL_ROWS[0]
    }
}

/// Text rows of beat box `index`, top to bottom.
pub fn beat_box_lines(snapshot: &MetronomeSnapshot, index: u8) -> [String; BOX_ROWS] {
    debug_assert!(index < BEATS_PER_BAR);
    let mut rows: [String; BOX_ROWS] = Default::default();
    rows[symbol_row(snapshot, index)] = beat_symbol(index).to_string();
    rows[NUMBER_ROW] = (index + 1).to_string();
    rows
}

pub fn status_line(snapshot: &MetronomeSnapshot) -> String {
    format!(
        "BPM: {}  •  Status: {}",
        snapshot.tempo.bpm(),
        snapshot.playback.label()
    )
}
