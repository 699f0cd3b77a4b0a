//! Configuration management for click sound, audio output and tempo control
//!
//! This module provides runtime configuration loading from JSON files so the
//! click timbre, output buffer and tempo step can be adjusted without
//! recompiling. Every section has defaults matching the built-in metronome,
//! and missing fields fall back to those defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub click: ClickConfig,
    pub audio: AudioConfig,
    pub metronome: MetronomeConfig,
}

/// Click synthesis parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClickConfig {
    /// Sine frequency of the click in Hz
    pub frequency_hz: f64,
    /// Click length in seconds
    pub duration_s: f64,
    /// Peak amplitude in [0.0, 1.0]
    pub amplitude: f64,
    /// Exponential decay rate of the envelope (per second)
    pub decay_rate: f64,
}

impl Default for ClickConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 1200.0,
            duration_s: 0.01,
            amplitude: 0.3,
            decay_rate: 200.0,
        }
    }
}

/// Audio output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Requested output sample rate in Hz
    pub sample_rate: u32,
    /// Output buffer size in frames
    pub buffer_size: u32,
    /// Maximum number of clicks mixed at once
    pub max_voices: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            // 100ms of audio at the default rate
            buffer_size: 4_410,
            max_voices: crate::audio::mixer::DEFAULT_MAX_VOICES,
        }
    }
}

/// Tempo and animation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetronomeConfig {
    /// Tempo used when no BPM argument is given (clamped to 20-300)
    pub default_bpm: u32,
    /// BPM change per increase/decrease command
    pub bpm_step: u32,
    /// Animation tick period in milliseconds
    pub animation_interval_ms: u64,
    /// Number of animation ticks per beat
    pub animation_ceiling: u8,
}

impl Default for MetronomeConfig {
    fn default() -> Self {
        Self {
            default_bpm: 120,
            bpm_step: 5,
            animation_interval_ms: 30,
            animation_ceiling: 10,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration. If the file doesn't exist or the JSON is
    /// invalid, a warning is logged and the default configuration is returned.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }
}
