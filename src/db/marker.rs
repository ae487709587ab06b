use std::fmt;

use chrono::{DateTime, Local};

/// End marker for sessions whose real end was never captured.
#[cfg(test)]
pub(crate) const UNKNOWN_END: &str = "sometime at finished?";

const MARKER_SEPARATOR: &str = " at ";

/// `"<date> at <offset>"`, the position marker stored as a viewing's start or end.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Marker {
    pub(crate) date: MarkerDate,
    pub(crate) offset: MarkerOffset,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum MarkerDate {
    At(DateTime<Local>),
    Sometime,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum MarkerOffset {
    Seconds(f64),
    Finished,
}

impl MarkerOffset {
    pub(crate) const FINISHED: &'static str = "finished?";
}

impl Marker {
    pub(crate) fn at(time: DateTime<Local>, seconds: f64) -> Self {
        Self {
            date: MarkerDate::At(time),
            offset: MarkerOffset::Seconds(seconds),
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{MARKER_SEPARATOR}{}", self.date, self.offset)
    }
}

impl fmt::Display for MarkerDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::At(time) => write!(f, "{}", time.format("%Y/%m/%d %H:%M:%S")),
            Self::Sometime => f.write_str("sometime"),
        }
    }
}

impl fmt::Display for MarkerOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seconds(seconds) => f.write_str(&format_duration(*seconds)),
            Self::Finished => f.write_str(Self::FINISHED),
        }
    }
}

/// Offset component of a stored marker, `None` when the marker has no `" at "`.
pub(crate) fn end_offset(marker: &str) -> Option<&str> {
    marker
        .split_once(MARKER_SEPARATOR)
        .map(|(_, offset)| offset.trim())
}

/// Formats seconds as `H:MM:SS.fff`; milliseconds are truncated.
pub(crate) fn format_duration(seconds: f64) -> String {
    let total_ms = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).floor() as u64
    } else {
        0
    };
    let hours = total_ms / 3_600_000;
    let mins = (total_ms / 60_000) % 60;
    let secs = (total_ms / 1000) % 60;
    let millis = total_ms % 1000;
    format!("{hours}:{mins:02}:{secs:02}.{millis:03}")
}

/// Inverse of [`format_duration`]; also accepts offsets without milliseconds.
pub(crate) fn parse_duration(raw: &str) -> Option<f64> {
    let mut parts = raw.trim().split(':');
    let hours = parts.next()?.parse::<u64>().ok()?;
    let mins = parts.next()?.parse::<u64>().ok()?;
    let secs = parts.next()?.parse::<f64>().ok()?;
    if parts.next().is_some() || mins >= 60 || !(0.0..60.0).contains(&secs) {
        return None;
    }
    Some((hours * 3600 + mins * 60) as f64 + secs)
}
