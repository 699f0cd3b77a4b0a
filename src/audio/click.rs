//! Click - deterministic synthesis of the metronome click
//!
//! This module produces the waveform played on every beat. Key features:
//! - Sine burst shaped by an exponential decay envelope
//! - Identical left/right channels (mono click, centre panned)
//! - Pure functions (no side effects, deterministic output)

use std::f64::consts::PI;

use crate::config::ClickConfig;

/// Default click frequency in Hz
pub const DEFAULT_FREQUENCY_HZ: f64 = 1200.0;

/// Default click duration in seconds
pub const DEFAULT_DURATION_S: f64 = 0.01;

/// Default sample rate in Hz
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Default peak amplitude
pub const DEFAULT_AMPLITUDE: f64 = 0.3;

/// Default envelope decay rate (per second)
pub const DEFAULT_DECAY_RATE: f64 = 200.0;

/// Longest click accepted from config, in seconds
pub const MAX_DURATION_S: f64 = 1.0;

/// One stereo sample pair: `[left, right]`
pub type StereoFrame = [f32; 2];

/// Immutable stereo waveform for a single click.
///
/// Created fresh for every beat, handed to the audio sink by value and
/// dropped once the mixer has finished playing it.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickWaveform {
    frames: Box<[StereoFrame]>,
}

impl ClickWaveform {
    /// All stereo frames in playback order
    pub fn frames(&self) -> &[StereoFrame] {
        &self.frames
    }

    /// Number of stereo frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Parameters for [`synthesize_click`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickParams {
    pub frequency_hz: f64,
    pub duration_s: f64,
    pub sample_rate_hz: u32,
    pub amplitude: f64,
    pub decay_rate: f64,
}

impl Default for ClickParams {
    fn default() -> Self {
        Self {
            frequency_hz: DEFAULT_FREQUENCY_HZ,
            duration_s: DEFAULT_DURATION_S,
            sample_rate_hz: DEFAULT_SAMPLE_RATE,
            amplitude: DEFAULT_AMPLITUDE,
            decay_rate: DEFAULT_DECAY_RATE,
        }
    }
}

impl ClickParams {
    /// Build click parameters from config at the given output sample rate.
    ///
    /// Unusable values are replaced so every click is finite and decays:
    /// - `frequency_hz`, `decay_rate`: must be finite and > 0, else the default
    /// - `duration_s`: must be finite and > 0, else the default; capped at `MAX_DURATION_S`
    /// - `amplitude`: must lie in [0.0, 1.0], else the default
    pub fn from_config(config: &ClickConfig, sample_rate_hz: u32) -> Self {
        Self {
            frequency_hz: positive_or(config.frequency_hz, DEFAULT_FREQUENCY_HZ, "frequency_hz"),
            duration_s: positive_or(config.duration_s, DEFAULT_DURATION_S, "duration_s")
                .min(MAX_DURATION_S),
            sample_rate_hz,
            amplitude: if (0.0..=1.0).contains(&config.amplitude) {
                config.amplitude
            } else {
                log::warn!(
                    "[Click] amplitude = {} is outside [0, 1], using {}",
                    config.amplitude,
                    DEFAULT_AMPLITUDE
                );
                DEFAULT_AMPLITUDE
            },
            decay_rate: positive_or(config.decay_rate, DEFAULT_DECAY_RATE, "decay_rate"),
        }
    }

    /// Same parameters at a different sample rate.
    pub fn with_sample_rate(self, sample_rate_hz: u32) -> Self {
        Self {
            sample_rate_hz,
            ..self
        }
    }
}

fn positive_or(value: f64, default: f64, field: &str) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        log::warn!("[Click] {} = {} is not usable, using {}", field, value, default);
        default
    }
}

/// Number of samples a click of `duration_s` occupies at `sample_rate_hz`.
///
/// Formula: round(sample_rate × duration). Negative or NaN durations yield 0.
#[inline]
pub fn click_sample_count(sample_rate_hz: u32, duration_s: f64) -> usize {
    let count = (sample_rate_hz as f64 * duration_s).round();
    if count.is_finite() && count > 0.0 {
        count as usize
    } else {
        0
    }
}

/// Envelope gain of sample `index`: exp(-t × decay_rate) with t = index / sample_rate.
#[inline]
pub fn envelope_at(index: usize, sample_rate_hz: u32, decay_rate: f64) -> f64 {
    let t = index as f64 / sample_rate_hz as f64;
    (-t * decay_rate).exp()
}

/// Generates a click with the default decay rate.
///
/// # Examples
/// ```
/// use terminal_metronome::audio::click::synthesize;
///
/// let click = synthesize(1200.0, 0.01, 44_100, 0.3);
/// assert_eq!(click.len(), 441);
/// assert_eq!(click.frames()[0], [0.0, 0.0]);
/// ```
pub fn synthesize(
    frequency_hz: f64,
    duration_s: f64,
    sample_rate_hz: u32,
    amplitude: f64,
) -> ClickWaveform {
    synthesize_click(&ClickParams {
        frequency_hz,
        duration_s,
        sample_rate_hz,
        amplitude,
        decay_rate: DEFAULT_DECAY_RATE,
    })
}

/// Generates a click waveform from full parameters.
///
/// Sample `i` is `sin(2π·f·t) · exp(-t·decay) · amplitude` with
/// `t = i / sample_rate`, written to both channels.
pub fn synthesize_click(params: &ClickParams) -> ClickWaveform {
    if params.sample_rate_hz == 0 {
        return ClickWaveform {
            frames: Box::new([]),
        };
    }

    let num_samples = click_sample_count(params.sample_rate_hz, params.duration_s);
    let sample_rate = params.sample_rate_hz as f64;

    let frames = (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate;
            let wave = (2.0 * PI * params.frequency_hz * t).sin();
            let envelope = envelope_at(i, params.sample_rate_hz, params.decay_rate);
            let sample = (wave * envelope * params.amplitude) as f32;
            [sample, sample]
        })
        .collect();

    ClickWaveform { frames }
}
