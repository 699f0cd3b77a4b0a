//! Audio output sink abstraction.
//!
//! The metronome core only ever talks to audio through this trait, so the
//! real cpal output and the recording stub used by tests are interchangeable.

use super::click::ClickWaveform;
use crate::error::AudioError;

/// Trait implemented by audio outputs that can play click waveforms.
///
/// A sink value only exists after successful initialization, so playing
/// before init cannot be expressed. After [`AudioSink::shutdown`] every
/// `play` call fails with [`AudioError::ShutDown`].
pub trait AudioSink {
    /// Enqueue a click for playback without waiting for it to sound.
    ///
    /// Clicks submitted while an earlier click is still playing are mixed
    /// with it.
    fn play(&mut self, waveform: ClickWaveform) -> Result<(), AudioError>;

    /// Release the output device. Calling this more than once is a no-op.
    fn shutdown(&mut self) -> Result<(), AudioError>;

    /// Sample rate clicks must be synthesized at
    fn sample_rate(&self) -> u32;

    fn is_shut_down(&self) -> bool;
}
