// Audio error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Audio error code constants
///
/// Error code range: 1001-1007
pub struct AudioErrorCodes {}

impl AudioErrorCodes {
    /// No output device is available on the default host
    pub const DEVICE_UNAVAILABLE: i32 = 1001;

    /// Failed to open or configure the output stream
    pub const STREAM_OPEN_FAILED: i32 = 1002;

    /// Device only offers a sample format the mixer cannot write
    pub const UNSUPPORTED_SAMPLE_FORMAT: i32 = 1003;

    /// Hardware error occurred while starting or running the stream
    pub const HARDWARE_ERROR: i32 = 1004;

    /// Output was already shut down
    pub const SHUT_DOWN: i32 = 1005;

    /// Click queue to the audio thread is full
    pub const QUEUE_FULL: i32 = 1006;

    /// Audio settings are unusable (zero sample rate, zero buffer)
    pub const INVALID_CONFIG: i32 = 1007;
}

/// Log an audio error with structured context
///
/// This function logs audio errors with structured fields including:
/// - error_code: Numeric error code for programmatic handling
/// - component: The component where the error occurred
/// - message: Human-readable error message
/// - context: Additional contextual information
pub fn log_audio_error(err: &AudioError, context: &str) {
    error!(
        "Audio error in {}: code={}, component=AudioSink, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Audio-related errors
///
/// These errors cover device acquisition, stream management and click
/// submission. Device errors are fatal at startup; `QueueFull` only drops
/// a single click.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioError {
    /// No output device is available
    DeviceUnavailable { reason: String },

    /// Failed to open audio stream
    StreamOpenFailed { reason: String },

    /// Device sample format is not f32
    UnsupportedSampleFormat { format: String },

    /// Hardware error occurred
    HardwareError { details: String },

    /// `play` called after the output was shut down
    ShutDown,

    /// Click queue is full, click dropped
    QueueFull,

    /// Audio settings are unusable
    InvalidConfig { reason: String },
}

impl ErrorCode for AudioError {
    fn code(&self) -> i32 {
        match self {
            AudioError::DeviceUnavailable { .. } => AudioErrorCodes::DEVICE_UNAVAILABLE,
            AudioError::StreamOpenFailed { .. } => AudioErrorCodes::STREAM_OPEN_FAILED,
            AudioError::UnsupportedSampleFormat { .. } => {
                AudioErrorCodes::UNSUPPORTED_SAMPLE_FORMAT
            }
            AudioError::HardwareError { .. } => AudioErrorCodes::HARDWARE_ERROR,
            AudioError::ShutDown => AudioErrorCodes::SHUT_DOWN,
            AudioError::QueueFull => AudioErrorCodes::QUEUE_FULL,
            AudioError::InvalidConfig { .. } => AudioErrorCodes::INVALID_CONFIG,
        }
    }

    fn message(&self) -> String {
        match self {
            AudioError::DeviceUnavailable { reason } => {
                format!("Audio device unavailable: {}", reason)
            }
            AudioError::StreamOpenFailed { reason } => {
                format!("Failed to open audio stream: {}", reason)
            }
            AudioError::UnsupportedSampleFormat { format } => {
                format!("Unsupported output sample format: {}", format)
            }
            AudioError::HardwareError { details } => {
                format!("Hardware error: {}", details)
            }
            AudioError::ShutDown => "Audio output already shut down".to_string(),
            AudioError::QueueFull => "Click queue full, click dropped".to_string(),
            AudioError::InvalidConfig { reason } => {
                format!("Invalid audio configuration: {}", reason)
            }
        }
    }
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AudioError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AudioError {}
