use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error for a string that is not a valid `HH:MM:SS` timecode.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid timecode (expected HH:MM:SS): {raw}")]
pub struct TimecodeError {
    raw: String,
}

impl TimecodeError {
    /// The rejected input.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

/// Playback offset in wall-clock `HH:MM:SS` form.
///
/// The platform reports positions and durations as time-of-day-shaped
/// strings, so components are bounded to valid hour/minute/second ranges and
/// comparison is plain time-of-day ordering. The zero value doubles as a
/// sentinel: "no progress yet" for positions, "not yet reported" for
/// durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timecode(NaiveTime);

impl Timecode {
    /// `00:00:00`.
    pub const ZERO: Timecode = Timecode(NaiveTime::MIN);

    /// Whole seconds from `00:00:00`.
    #[must_use]
    pub fn total_seconds(&self) -> u32 {
        self.0.num_seconds_from_midnight()
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M:%S"))
    }
}

impl FromStr for Timecode {
    type Err = TimecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::parse_from_str(s, "%H:%M:%S")
            .map(Timecode)
            .map_err(|_| TimecodeError { raw: s.to_owned() })
    }
}

/// Renders a second count as zero-padded `HH:MM:SS`.
///
/// Unlike [`Timecode`], the hour field is unbounded; accumulated estimates
/// can exceed a day.
#[must_use]
pub fn format_seconds(total: u64) -> String {
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_displays_padded() {
        let t: Timecode = "00:05:00".parse().unwrap();
        assert_eq!(t.to_string(), "00:05:00");
        assert_eq!(t.total_seconds(), 300);
    }

    #[test]
    fn zero_is_the_sentinel() {
        let t: Timecode = "00:00:00".parse().unwrap();
        assert!(t.is_zero());
        assert_eq!(t, Timecode::ZERO);
        assert!(!"00:00:01".parse::<Timecode>().unwrap().is_zero());
    }

    #[test]
    fn rejects_malformed_input() {
        assert!("five minutes".parse::<Timecode>().is_err());
        assert!("00:05".parse::<Timecode>().is_err());
        assert!("00:05:00 ".parse::<Timecode>().is_err());
        assert!(String::new().parse::<Timecode>().is_err());
    }

    #[test]
    fn rejects_out_of_range_components() {
        assert!("25:00:00".parse::<Timecode>().is_err());
        assert!("00:61:00".parse::<Timecode>().is_err());
        assert!("00:00:99".parse::<Timecode>().is_err());
    }

    #[test]
    fn error_carries_the_input() {
        let err = "nope".parse::<Timecode>().unwrap_err();
        assert_eq!(err.raw(), "nope");
    }

    #[test]
    fn orders_as_time_of_day() {
        let early: Timecode = "00:09:00".parse().unwrap();
        let late: Timecode = "01:00:00".parse().unwrap();
        assert!(early < late);
        assert!(Timecode::ZERO < early);
    }

    #[test]
    fn format_seconds_pads_and_carries() {
        assert_eq!(format_seconds(0), "00:00:00");
        assert_eq!(format_seconds(240), "00:04:00");
        assert_eq!(format_seconds(3_661), "01:01:01");
        // Estimates may exceed a day; the hour field keeps counting.
        assert_eq!(format_seconds(144_000), "40:00:00");
    }
}
