//! Terminal presentation: key bindings, rendering and the event loop.

pub mod app;
pub mod keymap;
pub mod ui;

pub use app::{run_event_loop, InputEvent, InputReader, TerminalSession};
pub use keymap::{command_for, help_line};
pub use ui::render;
