//! Duration codec: rendered countdown text <-> seconds <-> display units

use std::fmt;

use crate::error::{EngineError, Result};

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 3600;

/// Remaining time broken into the units a countdown display shows.
///
/// Leading units that are zero are dropped rather than rendered as `00`,
/// so hours only appear together with minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayDuration {
    Seconds { seconds: u8 },
    Minutes { minutes: u8, seconds: u8 },
    Hours { hours: u64, minutes: u8, seconds: u8 },
}

impl DisplayDuration {
    /// Split a non-negative seconds count into display units
    pub fn from_secs(total: u64) -> Self {
        let hours = total / SECONDS_PER_HOUR;
        // Both remainders are below 60
        let minutes = ((total % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE) as u8;
        let seconds = (total % SECONDS_PER_MINUTE) as u8;

        if hours == 0 && minutes == 0 {
            DisplayDuration::Seconds { seconds }
        } else if hours == 0 {
            DisplayDuration::Minutes { minutes, seconds }
        } else {
            DisplayDuration::Hours { hours, minutes, seconds }
        }
    }

    pub fn hours(&self) -> Option<u64> {
        match self {
            DisplayDuration::Hours { hours, .. } => Some(*hours),
            _ => None,
        }
    }

    pub fn minutes(&self) -> Option<u8> {
        match self {
            DisplayDuration::Seconds { .. } => None,
            DisplayDuration::Minutes { minutes, .. } | DisplayDuration::Hours { minutes, .. } => {
                Some(*minutes)
            }
        }
    }

    pub fn seconds(&self) -> u8 {
        match self {
            DisplayDuration::Seconds { seconds }
            | DisplayDuration::Minutes { seconds, .. }
            | DisplayDuration::Hours { seconds, .. } => *seconds,
        }
    }

    /// Total seconds represented by the shown units
    pub fn total_seconds(&self) -> u64 {
        let hours = self.hours().unwrap_or(0);
        let minutes = u64::from(self.minutes().unwrap_or(0));
        hours * SECONDS_PER_HOUR + minutes * SECONDS_PER_MINUTE + u64::from(self.seconds())
    }

    /// True for the terminal `00s` rendering
    pub fn is_zero(&self) -> bool {
        matches!(self, DisplayDuration::Seconds { seconds: 0 })
    }
}

impl fmt::Display for DisplayDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayDuration::Seconds { seconds } => write!(f, "{:02}s", seconds),
            DisplayDuration::Minutes { minutes, seconds } => {
                write!(f, "{:02}m:{:02}s", minutes, seconds)
            }
            DisplayDuration::Hours { hours, minutes, seconds } => {
                write!(f, "{:02}h:{:02}m:{:02}s", hours, minutes, seconds)
            }
        }
    }
}

/// Canonical text of an expired countdown
pub fn zero_text() -> String {
    DisplayDuration::Seconds { seconds: 0 }.to_string()
}

/// Split on every run of non-digit characters.
///
/// A trailing separator yields a trailing empty token (`"45s"` -> `["45", ""]`),
/// and that token counts towards the unit rule in [`parse_to_seconds`].
fn split_tokens(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut in_separator = false;

    for (idx, ch) in text.char_indices() {
        if ch.is_ascii_digit() {
            if in_separator {
                start = idx;
                in_separator = false;
            }
        } else if !in_separator {
            tokens.push(&text[start..idx]);
            in_separator = true;
        }
    }
    tokens.push(if in_separator { "" } else { &text[start..] });
    tokens
}

/// Decode rendered countdown text into seconds.
///
/// Two tokens yield the first token unchanged, three tokens read as
/// minutes and seconds, four or more as hours, minutes and seconds.
/// Tokens after the first that are empty count as zero.
pub fn parse_to_seconds(text: &str) -> Result<u64> {
    let tokens = split_tokens(text.trim());
    let invalid = || EngineError::InvalidDuration(text.to_string());

    let first: u64 = tokens.first().and_then(|t| t.parse().ok()).ok_or_else(invalid)?;
    let lenient = |idx: usize| -> u64 { tokens.get(idx).and_then(|t| t.parse().ok()).unwrap_or(0) };

    let seconds = match tokens.len() {
        0 | 1 => return Err(invalid()),
        2 => Some(first),
        3 => first
            .checked_mul(SECONDS_PER_MINUTE)
            .and_then(|s| s.checked_add(lenient(1))),
        _ => first
            .checked_mul(SECONDS_PER_MINUTE)
            .and_then(|m| m.checked_add(lenient(1)))
            .and_then(|m| m.checked_mul(SECONDS_PER_MINUTE))
            .and_then(|s| s.checked_add(lenient(2))),
    };

    seconds.ok_or_else(invalid)
}

/// Convert a seconds count into display units, rejecting negative input
pub fn seconds_to_display(seconds: i64) -> Result<DisplayDuration> {
    u64::try_from(seconds)
        .map(DisplayDuration::from_secs)
        .map_err(|_| EngineError::InvalidDuration(format!("{} seconds", seconds)))
}

/// Unpadded rendering used when a stored remaining time is first put on the page
pub fn format_timedelta(total: u64) -> String {
    let hours = total / SECONDS_PER_HOUR;
    let minutes = (total % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    let seconds = total % SECONDS_PER_MINUTE;

    if hours != 0 {
        format!("{}h:{}m:{}s", hours, minutes, seconds)
    } else if minutes == 0 {
        format!("{}s", seconds)
    } else {
        format!("{}m:{}s", minutes, seconds)
    }
}
