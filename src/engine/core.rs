//! Metronome: the beat state machine.
//!
//! Owns tempo, play/pause state, beat index and animation phase. Every
//! mutation goes through a command (`toggle_play`, `increase_tempo`,
//! `decrease_tempo`, `quit`) or a timer event; presentation code only reads
//! [`MetronomeSnapshot`]s.
//!
//! Beat timers are single-shot. Each accepted beat schedules the next one at
//! the tempo current at that moment, so tempo changes take effect on the
//! following interval without restarting anything. Every schedule request
//! carries a fresh generation number and only the most recent beat (and
//! animation) generation is accepted, which keeps exactly one live timer of
//! each kind no matter how quickly play/pause is toggled.

use std::time::Duration;

use tracing::{debug, info};

use crate::audio::click::{synthesize_click, ClickParams};
use crate::audio::sink::AudioSink;
use crate::config::AppConfig;
use crate::engine::scheduler::{ManualScheduler, Scheduler, TimerEvent};
use crate::engine::tempo::{Tempo, BEATS_PER_BAR};
use crate::error::{log_audio_error, AudioError};

/// Whether beats are currently being produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaybackState {
    Playing,
    Paused,
}

impl PlaybackState {
    pub fn label(&self) -> &'static str {
        match self {
            PlaybackState::Playing => "Playing",
            PlaybackState::Paused => "Paused",
        }
    }
}

/// State-mutation commands available to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    TogglePlay,
    IncreaseTempo,
    DecreaseTempo,
    Quit,
}

/// Result of handling a timer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Event was current and changed state
    Accepted,
    /// Event was superseded (paused, rescheduled or quit) and ignored
    Stale,
}

/// Read-only view of the metronome used for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetronomeSnapshot {
    pub tempo: Tempo,
    pub beat_index: u8,
    pub playback: PlaybackState,
    pub animation_phase: u8,
    pub animation_ceiling: u8,
}

impl MetronomeSnapshot {
    pub fn is_playing(&self) -> bool {
        self.playback == PlaybackState::Playing
    }

    /// Whether the active beat's animation window is still open
    pub fn is_animating(&self) -> bool {
        self.animation_phase < self.animation_ceiling
    }
}

/// Tunables for a [`Metronome`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetronomeSettings {
    pub initial_tempo: Tempo,
    /// BPM change per increase/decrease command
    pub bpm_step: u32,
    /// Period of the animation tick
    pub animation_interval: Duration,
    /// Animation ticks per beat
    pub animation_ceiling: u8,
    /// Click parameters; the sample rate is replaced by the sink's at play time
    pub click: ClickParams,
}

impl Default for MetronomeSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default(), Tempo::default())
    }
}

impl MetronomeSettings {
    /// Build settings from config. A zero step or interval is raised to 1.
    pub fn from_config(config: &AppConfig, initial_tempo: Tempo) -> Self {
        Self {
            initial_tempo,
            bpm_step: config.metronome.bpm_step.max(1),
            animation_interval: Duration::from_millis(config.metronome.animation_interval_ms.max(1)),
            animation_ceiling: config.metronome.animation_ceiling,
            click: ClickParams::from_config(&config.click, config.audio.sample_rate),
        }
    }
}

/// A single timer event the manual scheduler delivered during [`Metronome::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredTimer {
    pub at: Duration,
    pub event: TimerEvent,
    pub outcome: TickOutcome,
}

/// Beat state machine.
pub struct Metronome<S: Scheduler, K: AudioSink> {
    settings: MetronomeSettings,
    tempo: Tempo,
    beat_index: u8,
    playback: PlaybackState,
    animation_phase: u8,
    scheduler: S,
    sink: K,
    next_generation: u64,
    /// Generation of the only beat timer that will be accepted
    pending_beat: Option<u64>,
    /// Generation of the only animation timer that will be accepted
    pending_animation: Option<u64>,
    beats_played: u64,
    quit: bool,
}

impl<S: Scheduler, K: AudioSink> Metronome<S, K> {
    /// Create a metronome in the Playing state at beat 0.
    ///
    /// No timer is scheduled until [`Metronome::start`] is called.
    pub fn new(settings: MetronomeSettings, scheduler: S, sink: K) -> Self {
        Self {
            tempo: settings.initial_tempo,
            settings,
            beat_index: 0,
            playback: PlaybackState::Playing,
            animation_phase: 0,
            scheduler,
            sink,
            next_generation: 0,
            pending_beat: None,
            pending_animation: None,
            beats_played: 0,
            quit: false,
        }
    }

    /// Schedule the first beat one interval from now.
    pub fn start(&mut self) {
        if self.quit || self.playback == PlaybackState::Paused || self.pending_beat.is_some() {
            return;
        }
        info!(bpm = self.tempo.bpm(), "metronome started");
        self.schedule_beat();
    }

    /// Apply a presentation-layer command.
    ///
    /// Only `Quit` can fail, when releasing the audio output fails.
    pub fn apply(&mut self, command: Command) -> Result<(), AudioError> {
        match command {
            Command::TogglePlay => self.toggle_play(),
            Command::IncreaseTempo => self.increase_tempo(),
            Command::DecreaseTempo => self.decrease_tempo(),
            Command::Quit => return self.quit(),
        }
        Ok(())
    }

    /// Pause, or resume with a full interval before the next beat.
    pub fn toggle_play(&mut self) {
        if self.quit {
            return;
        }
        match self.playback {
            PlaybackState::Playing => {
                self.playback = PlaybackState::Paused;
                // The in-flight beat timer still fires but is no longer accepted
                self.pending_beat = None;
                info!(beat = self.beat_index, "paused");
            }
            PlaybackState::Paused => {
                self.playback = PlaybackState::Playing;
                self.schedule_beat();
                info!(bpm = self.tempo.bpm(), "resumed");
            }
        }
    }

    pub fn increase_tempo(&mut self) {
        self.set_tempo(self.tempo.increased(self.settings.bpm_step));
    }

    pub fn decrease_tempo(&mut self) {
        self.set_tempo(self.tempo.decreased(self.settings.bpm_step));
    }

    fn set_tempo(&mut self, tempo: Tempo) {
        if self.quit || tempo == self.tempo {
            return;
        }
        self.tempo = tempo;
        debug!(bpm = tempo.bpm(), "tempo changed, applies from next beat");
    }

    /// Stop for good: cancel timers and release the audio output.
    ///
    /// Calling this again is a no-op.
    pub fn quit(&mut self) -> Result<(), AudioError> {
        if self.quit {
            return Ok(());
        }
        self.quit = true;
        self.pending_beat = None;
        self.pending_animation = None;
        self.scheduler.cancel_all();
        info!(beats = self.beats_played, "metronome stopped");

        self.sink.shutdown().map_err(|err| {
            log_audio_error(&err, "quit");
            err
        })
    }

    /// Route a timer event to its handler.
    pub fn handle_timer(&mut self, event: TimerEvent) -> TickOutcome {
        match event {
            TimerEvent::Beat { generation } => self.on_beat_tick(generation),
            TimerEvent::Animation { generation } => self.on_animation_tick(generation),
        }
    }

    /// Advance the beat, play a click and schedule the next beat.
    pub fn on_beat_tick(&mut self, generation: u64) -> TickOutcome {
        if self.quit
            || self.playback == PlaybackState::Paused
            || self.pending_beat != Some(generation)
        {
            debug!(generation, "dropping stale beat tick");
            return TickOutcome::Stale;
        }

        self.beat_index = (self.beat_index + 1) % BEATS_PER_BAR;
        self.animation_phase = 0;
        self.beats_played += 1;

        let params = self.settings.click.with_sample_rate(self.sink.sample_rate());
        if let Err(err) = self.sink.play(synthesize_click(&params)) {
            log_audio_error(&err, "on_beat_tick");
        }

        self.schedule_beat();
        self.schedule_animation();
        TickOutcome::Accepted
    }

    /// Step the animation phase until it reaches the ceiling.
    pub fn on_animation_tick(&mut self, generation: u64) -> TickOutcome {
        if self.quit || self.pending_animation != Some(generation) {
            return TickOutcome::Stale;
        }

        self.pending_animation = None;
        if self.animation_phase < self.settings.animation_ceiling {
            self.animation_phase += 1;
            if self.animation_phase < self.settings.animation_ceiling {
                self.schedule_animation();
            }
        }
        TickOutcome::Accepted
    }

    fn next_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    fn schedule_beat(&mut self) {
        let generation = self.next_generation();
        self.pending_beat = Some(generation);
        self.scheduler
            .schedule_once(self.tempo.interval(), TimerEvent::Beat { generation });
    }

    fn schedule_animation(&mut self) {
        if self.settings.animation_ceiling == 0 {
            return;
        }
        let generation = self.next_generation();
        self.pending_animation = Some(generation);
        self.scheduler.schedule_once(
            self.settings.animation_interval,
            TimerEvent::Animation { generation },
        );
    }

    pub fn snapshot(&self) -> MetronomeSnapshot {
        MetronomeSnapshot {
            tempo: self.tempo,
            beat_index: self.beat_index,
            playback: self.playback,
            animation_phase: self.animation_phase,
            animation_ceiling: self.settings.animation_ceiling,
        }
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    pub fn beat_index(&self) -> u8 {
        self.beat_index
    }

    pub fn playback(&self) -> PlaybackState {
        self.playback
    }

    pub fn animation_phase(&self) -> u8 {
        self.animation_phase
    }

    /// Generation of the beat timer that will be accepted next, if any
    pub fn pending_beat(&self) -> Option<u64> {
        self.pending_beat
    }

    /// Number of beats accepted since creation
    pub fn beats_played(&self) -> u64 {
        self.beats_played
    }

    pub fn is_quit(&self) -> bool {
        self.quit
    }

    pub fn settings(&self) -> &MetronomeSettings {
        &self.settings
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }
}

impl<K: AudioSink> Metronome<ManualScheduler, K> {
    /// Move the virtual clock forward by `by`, handling every timer that
    /// falls due on the way, including ones scheduled by those handlers.
    pub fn advance(&mut self, by: Duration) -> Vec<FiredTimer> {
        let until = self.scheduler.now() + by;
        let mut fired = Vec::new();

        while let Some((at, event)) = self.scheduler.pop_due(until) {
            let outcome = self.handle_timer(event);
            fired.push(FiredTimer { at, event, outcome });
        }

        self.scheduler.set_now(until);
        fired
    }
}
