//! Key bindings for the metronome screen.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::engine::Command;

/// One help entry: the keys shown and what they do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyHelp {
    pub keys: &'static str,
    pub action: &'static str,
}

/// Help entries in display order
pub const HELP: [KeyHelp; 4] = [
    KeyHelp {
        keys: "↑/+",
        action: "increase BPM",
    },
    KeyHelp {
        keys: "↓/-",
        action: "decrease BPM",
    },
    KeyHelp {
        keys: "space",
        action: "play/pause",
    },
    KeyHelp {
        keys: "q",
        action: "quit",
    },
];

/// Map a terminal key event to a metronome command.
///
/// Only presses are mapped so terminals reporting releases and repeats do
/// not toggle twice.
pub fn command_for(key: &KeyEvent) -> Option<Command> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Command::Quit),
        KeyCode::Up | KeyCode::Char('+') | KeyCode::Char('=') => Some(Command::IncreaseTempo),
        KeyCode::Down | KeyCode::Char('-') => Some(Command::DecreaseTempo),
        KeyCode::Char(' ') => Some(Command::TogglePlay),
        KeyCode::Char('q') => Some(Command::Quit),
        _ => None,
    }
}

/// Single-line help text, e.g. `↑/+ increase BPM • ↓/- decrease BPM • ...`
pub fn help_line() -> String {
    HELP.iter()
        .map(|entry| format!("{} {}", entry.keys, entry.action))
        .collect::<Vec<_>>()
        .join(" • ")
}
