//! Stub audio sink for deterministic testing
//!
//! This module provides a sink that records every click it is asked to play
//! instead of touching audio hardware. It keeps the same lifecycle rules as
//! the real output (no playback after shutdown) so state machine tests can
//! assert on exactly what would have been heard.

use super::click::ClickWaveform;
use super::sink::AudioSink;
use crate::error::AudioError;

/// Recording sink used by tests and headless runs.
#[derive(Debug)]
pub struct RecordingSink {
    sample_rate: u32,
    played: Vec<ClickWaveform>,
    shutdown_calls: usize,
    shut_down: bool,
}

impl RecordingSink {
    /// Create a new recording sink reporting `sample_rate`
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            played: Vec::new(),
            shutdown_calls: 0,
            shut_down: false,
        }
    }

    /// Clicks played so far, oldest first
    pub fn played(&self) -> &[ClickWaveform] {
        &self.played
    }

    pub fn play_count(&self) -> usize {
        self.played.len()
    }

    /// Number of times `shutdown` was called, including repeated calls
    pub fn shutdown_calls(&self) -> usize {
        self.shutdown_calls
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new(super::click::DEFAULT_SAMPLE_RATE)
    }
}

impl AudioSink for RecordingSink {
    fn play(&mut self, waveform: ClickWaveform) -> Result<(), AudioError> {
        if self.shut_down {
            return Err(AudioError::ShutDown);
        }
        self.played.push(waveform);
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), AudioError> {
        self.shutdown_calls += 1;
        self.shut_down = true;
        Ok(())
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::click::synthesize;

    #[test]
    fn test_records_played_clicks() {
        let mut sink = RecordingSink::new(48_000);
        sink.play(synthesize(1200.0, 0.01, 48_000, 0.3)).unwrap();
        sink.play(synthesize(1200.0, 0.01, 48_000, 0.3)).unwrap();

        assert_eq!(sink.play_count(), 2);
        assert_eq!(sink.played()[0].len(), 480);
        assert_eq!(sink.sample_rate(), 48_000);
    }

    #[test]
    fn test_play_after_shutdown_fails() {
        let mut sink = RecordingSink::default();
        sink.shutdown().unwrap();

        let result = sink.play(synthesize(1200.0, 0.01, 44_100, 0.3));
        assert_eq!(result, Err(AudioError::ShutDown));
        assert!(sink.is_shut_down());
        assert_eq!(sink.play_count(), 0);
    }

    #[test]
    fn test_repeated_shutdown_is_ok() {
        let mut sink = RecordingSink::default();
        assert!(sink.shutdown().is_ok());
        assert!(sink.shutdown().is_ok());
        assert_eq!(sink.shutdown_calls(), 2);
    }
}
