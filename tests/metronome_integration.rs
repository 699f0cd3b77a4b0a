//! Integration tests for the metronome core
//!
//! These tests drive the public API end to end with the deterministic
//! scheduler and the recording sink:
//! - Beat timing across the tempo range
//! - Play/pause and tempo commands
//! - Command-line BPM handling
//! - Overlapping clicks through the mixer
//! - Unusable click settings in config

use std::time::Duration;

use terminal_metronome::audio::{synthesize, voice_queue, AudioSink, RecordingSink};
use terminal_metronome::config::AppConfig;
use terminal_metronome::engine::tempo::{beat_interval_ms, resolve_bpm_arg, MAX_BPM, MIN_BPM};
use terminal_metronome::engine::{
    Command, FiredTimer, ManualScheduler, Metronome, MetronomeSettings, PlaybackState,
    TickOutcome, Tempo,
};
use terminal_metronome::error::UsageError;

type TestMetronome = Metronome<ManualScheduler, RecordingSink>;

fn started(settings: MetronomeSettings) -> TestMetronome {
    let mut metronome = Metronome::new(settings, ManualScheduler::new(), RecordingSink::default());
    metronome.start();
    metronome
}

fn at_bpm(bpm: u32) -> TestMetronome {
    started(MetronomeSettings {
        initial_tempo: Tempo::clamped(bpm),
        ..MetronomeSettings::default()
    })
}

fn beat_times(fired: &[FiredTimer]) -> Vec<u64> {
    fired
        .iter()
        .filter(|f| f.event.is_beat() && f.outcome == TickOutcome::Accepted)
        .map(|f| f.at.as_millis() as u64)
        .collect()
}

#[test]
fn test_beats_are_one_interval_apart_across_range() {
    for bpm in [MIN_BPM, 60, 97, 120, 145, 233, MAX_BPM] {
        let mut metronome = at_bpm(bpm);
        let interval = beat_interval_ms(bpm);

        let times = beat_times(&metronome.advance(Duration::from_millis(interval * 8)));
        let expected: Vec<u64> = (1..=8).map(|n| n * interval).collect();
        assert_eq!(times, expected, "bpm {}", bpm);
    }
}

#[test]
fn test_first_tick_at_120_moves_to_second_beat() {
    let mut metronome = at_bpm(120);
    let times = beat_times(&metronome.advance(Duration::from_millis(500)));

    assert_eq!(times, vec![500]);
    assert_eq!(metronome.snapshot().beat_index, 1);
}

#[test]
fn test_five_increases_reach_145() {
    let mut metronome = at_bpm(120);
    for _ in 0..5 {
        metronome.apply(Command::IncreaseTempo).unwrap();
    }
    assert_eq!(metronome.tempo().bpm(), 145);
    assert_eq!(metronome.tempo().interval(), Duration::from_millis(414));

    // The first beat was scheduled at 120 BPM, the next one at 145
    let times = beat_times(&metronome.advance(Duration::from_millis(914)));
    assert_eq!(times, vec![500, 914]);
}

#[test]
fn test_paused_metronome_does_not_advance() {
    let mut metronome = at_bpm(120);
    metronome.advance(Duration::from_millis(1000));
    assert_eq!(metronome.beat_index(), 2);

    metronome.apply(Command::TogglePlay).unwrap();
    assert_eq!(metronome.playback(), PlaybackState::Paused);

    let fired = metronome.advance(Duration::from_secs(10));
    assert!(beat_times(&fired).is_empty());
    assert_eq!(metronome.beat_index(), 2);
    assert_eq!(metronome.sink().play_count(), 2);
}

#[test]
fn test_pause_resume_neither_skips_nor_doubles() {
    let mut metronome = at_bpm(120);
    metronome.advance(Duration::from_millis(700));
    metronome.apply(Command::TogglePlay).unwrap();
    metronome.advance(Duration::from_millis(100));
    metronome.apply(Command::TogglePlay).unwrap();

    let times = beat_times(&metronome.advance(Duration::from_millis(1200)));
    // Resumed at 800: next beats at 1300 and 1800, none at the stale 1000
    assert_eq!(times, vec![1300, 1800]);
    assert_eq!(metronome.beat_index(), 3);
}

#[test]
fn test_rapid_toggling_leaves_one_pending_beat() {
    let mut metronome = at_bpm(120);
    for _ in 0..10 {
        metronome.apply(Command::TogglePlay).unwrap();
        metronome.advance(Duration::from_millis(7));
    }
    assert!(metronome.snapshot().is_playing());
    assert!(metronome.pending_beat().is_some());

    // Last resume happened at 63ms
    let times = beat_times(&metronome.advance(Duration::from_millis(2000)));
    assert_eq!(times, vec![563, 1063, 1563, 2063]);
}

#[test]
fn test_every_beat_plays_identical_click() {
    let mut metronome = at_bpm(300);
    metronome.advance(Duration::from_millis(600));

    let played = metronome.sink().played();
    assert_eq!(played.len(), 3);
    assert_eq!(played[0].len(), 441);
    assert_eq!(played[0].frames(), played[2].frames());
}

#[test]
fn test_quit_releases_sink() {
    let mut metronome = at_bpm(120);
    metronome.advance(Duration::from_millis(500));
    metronome.apply(Command::Quit).unwrap();

    assert!(metronome.sink().is_shut_down());
    assert!(metronome.advance(Duration::from_secs(5)).is_empty());
    assert_eq!(metronome.sink().play_count(), 1);
}

#[test]
fn test_bpm_argument_fallback() {
    let (tempo, warning) = resolve_bpm_arg(Some("400"), Tempo::default());
    assert_eq!(tempo.bpm(), 120);
    assert_eq!(
        warning.map(|w| w.to_string()),
        Some("BPM must be between 20 and 300 (got 400)".to_string())
    );

    let (tempo, warning) = resolve_bpm_arg(Some("allegro"), Tempo::default());
    assert_eq!(tempo.bpm(), 120);
    assert!(matches!(warning, Some(UsageError::NotANumber { .. })));

    let (tempo, warning) = resolve_bpm_arg(Some("300"), Tempo::default());
    assert_eq!(tempo.bpm(), 300);
    assert!(warning.is_none());
}

#[test]
fn test_config_drives_step_and_animation() {
    let config: AppConfig = serde_json::from_str(
        r#"{ "metronome": { "bpm_step": 10, "animation_interval_ms": 50, "animation_ceiling": 4 } }"#,
    )
    .unwrap();
    let mut metronome = started(MetronomeSettings::from_config(&config, Tempo::default()));

    metronome.apply(Command::IncreaseTempo).unwrap();
    assert_eq!(metronome.tempo().bpm(), 130);

    // First beat was scheduled before the change; animation then ticks every 50ms up to 4
    metronome.advance(Duration::from_millis(500));
    assert_eq!(metronome.animation_phase(), 0);
    metronome.advance(Duration::from_millis(150));
    assert_eq!(metronome.animation_phase(), 3);
    metronome.advance(Duration::from_millis(200));
    assert_eq!(metronome.animation_phase(), 4);
    assert!(!metronome.snapshot().is_animating());
}

#[test]
fn test_unusable_click_config_still_plays_decaying_click() {
    let config: AppConfig =
        serde_json::from_str(r#"{ "click": { "decay_rate": -200.0, "amplitude": 40.0 } }"#)
            .unwrap();
    let mut metronome = started(MetronomeSettings::from_config(&config, Tempo::default()));
    metronome.advance(Duration::from_millis(500));

    let played = metronome.sink().played();
    assert_eq!(played.len(), 1);
    let frames = played[0].frames();
    assert_eq!(frames.len(), 441);

    let peak = frames.iter().map(|[l, _]| l.abs()).fold(0.0_f32, f32::max);
    assert!(peak <= 0.3 + f32::EPSILON, "peak {}", peak);

    // Envelope shrinks: the last quarter stays well below the first
    let early = frames[..110].iter().map(|[l, _]| l.abs()).fold(0.0_f32, f32::max);
    let late = frames[330..].iter().map(|[l, _]| l.abs()).fold(0.0_f32, f32::max);
    assert!(late < early * 0.5, "early {} late {}", early, late);
}

#[test]
fn test_overlapping_clicks_are_summed() {
    let (mut voices, mut mixer) = voice_queue(4);
    let click = synthesize(1200.0, 0.01, 44_100, 0.3);
    let first = click.frames()[10][0];

    voices.submit(click.clone()).unwrap();
    voices.submit(click).unwrap();

    let mut out = vec![0.0_f32; 64];
    mixer.render(&mut out, 2);

    assert_eq!(mixer.active_voices(), 2);
    assert!((out[20] - 2.0 * first).abs() < 1e-6);
    assert_eq!(out[20], out[21]);
}

#[test]
fn test_recording_sink_rejects_after_shutdown() {
    let mut sink = RecordingSink::new(48_000);
    sink.shutdown().unwrap();
    assert!(sink.play(synthesize(1200.0, 0.01, 48_000, 0.3)).is_err());
}
