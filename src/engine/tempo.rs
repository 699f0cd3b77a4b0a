//! Tempo - bounded BPM and the beat interval derived from it.

use std::fmt;
use std::time::Duration;

use crate::error::UsageError;

/// Slowest supported tempo
pub const MIN_BPM: u32 = 20;

/// Fastest supported tempo
pub const MAX_BPM: u32 = 300;

/// Tempo used when no valid BPM is supplied
pub const DEFAULT_BPM: u32 = 120;

/// Beats before the beat index wraps back to the downbeat
pub const BEATS_PER_BAR: u8 = 4;

/// Beats per minute, always within [MIN_BPM, MAX_BPM].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tempo(u32);

impl Tempo {
    /// Validate a BPM value.
    pub fn new(bpm: u32) -> Result<Self, UsageError> {
        if (MIN_BPM..=MAX_BPM).contains(&bpm) {
            Ok(Self(bpm))
        } else {
            Err(UsageError::OutOfRange { bpm: bpm as i64 })
        }
    }

    /// Clamp any BPM value into range.
    pub fn clamped(bpm: u32) -> Self {
        Self(bpm.clamp(MIN_BPM, MAX_BPM))
    }

    #[inline]
    pub fn bpm(self) -> u32 {
        self.0
    }

    /// Tempo raised by `step`, stopping at MAX_BPM.
    pub fn increased(self, step: u32) -> Self {
        Self::clamped(self.0.saturating_add(step))
    }

    /// Tempo lowered by `step`, stopping at MIN_BPM.
    pub fn decreased(self, step: u32) -> Self {
        Self::clamped(self.0.saturating_sub(step))
    }

    /// Time between two beats at this tempo, in whole milliseconds.
    #[inline]
    pub fn interval(self) -> Duration {
        Duration::from_millis(beat_interval_ms(self.0))
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self(DEFAULT_BPM)
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} BPM", self.0)
    }
}

/// Converts BPM to the inter-beat interval in milliseconds.
///
/// Formula: round(60000 / BPM)
///
/// # Examples
/// ```
/// use terminal_metronome::engine::tempo::beat_interval_ms;
///
/// assert_eq!(beat_interval_ms(120), 500);
/// assert_eq!(beat_interval_ms(145), 414);
/// ```
#[inline]
pub fn beat_interval_ms(bpm: u32) -> u64 {
    (60_000.0 / bpm as f64).round() as u64
}

/// Parse the BPM command-line argument.
pub fn parse_bpm_arg(arg: &str) -> Result<Tempo, UsageError> {
    let bpm: i64 = arg.trim().parse().map_err(|_| UsageError::NotANumber {
        input: arg.to_string(),
    })?;

    if bpm < MIN_BPM as i64 || bpm > MAX_BPM as i64 {
        return Err(UsageError::OutOfRange { bpm });
    }
    Ok(Tempo(bpm as u32))
}

/// Resolve the optional BPM argument against a fallback tempo.
///
/// A bad argument is not fatal: the fallback is returned together with the
/// usage error so the caller can print a warning.
pub fn resolve_bpm_arg(arg: Option<&str>, fallback: Tempo) -> (Tempo, Option<UsageError>) {
    match arg.map(parse_bpm_arg) {
        None => (fallback, None),
        Some(Ok(tempo)) => (tempo, None),
        Some(Err(err)) => (fallback, Some(err)),
    }
}
