// Terminal Metronome Core
// Beat scheduling, click synthesis and audio output for the `metronome` binary

// Module declarations
pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod tui;

// Re-exports for convenience
pub use config::AppConfig;
pub use engine::{Command, Metronome, MetronomeSnapshot, PlaybackState, Tempo};
