// Error types for the terminal metronome
//
// This module defines custom error types for audio output and command-line
// usage, each carrying a stable numeric code for structured logging.

mod audio;
mod usage;

pub use audio::{log_audio_error, AudioError, AudioErrorCodes};
pub use usage::{UsageError, UsageErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent log lines and exit messages.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
