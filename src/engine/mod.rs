//! Engine module housing the metronome core.
//!
//! `tempo` holds the BPM bounds and interval math, `scheduler` the timer
//! sources, and `core` the state machine that ties them to an audio sink.

pub mod core;
pub mod scheduler;
pub mod tempo;

pub use self::core::{
    Command, FiredTimer, Metronome, MetronomeSettings, MetronomeSnapshot, PlaybackState,
    TickOutcome,
};
pub use scheduler::{ManualScheduler, Scheduler, TimerEvent, TokioScheduler};
pub use tempo::Tempo;
