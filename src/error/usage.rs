// Command-line usage error types

use std::fmt;

use crate::engine::tempo::{MAX_BPM, MIN_BPM};
use crate::error::ErrorCode;

/// Usage error code constants
///
/// Error code range: 2001-2002
pub struct UsageErrorCodes {}

impl UsageErrorCodes {
    /// BPM argument is not an integer
    pub const NOT_A_NUMBER: i32 = 2001;

    /// BPM argument is outside the supported tempo range
    pub const OUT_OF_RANGE: i32 = 2002;
}

/// Errors raised while interpreting the BPM argument.
///
/// These are never fatal: the caller prints a usage warning and falls back
/// to the default tempo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    /// Argument could not be parsed as an integer
    NotANumber { input: String },

    /// Argument parsed but lies outside [MIN_BPM, MAX_BPM]
    OutOfRange { bpm: i64 },
}

impl ErrorCode for UsageError {
    fn code(&self) -> i32 {
        match self {
            UsageError::NotANumber { .. } => UsageErrorCodes::NOT_A_NUMBER,
            UsageError::OutOfRange { .. } => UsageErrorCodes::OUT_OF_RANGE,
        }
    }

    fn message(&self) -> String {
        match self {
            UsageError::NotANumber { input } => format!(
                "BPM must be a whole number between {} and {} (got {:?})",
                MIN_BPM, MAX_BPM, input
            ),
            UsageError::OutOfRange { bpm } => format!(
                "BPM must be between {} and {} (got {})",
                MIN_BPM, MAX_BPM, bpm
            ),
        }
    }
}

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for UsageError {}
