//! Job listing domain types

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Date format used by the portal, e.g. `03/10/2026`
pub const DATE_FORMAT: &str = "%m/%d/%Y";

/// Time format used in summaries, e.g. `8:00 AM`
pub const TIME_FORMAT: &str = "%-I:%M %p";

/// Calendar date of a listing
///
/// Rows without a recognizable date are still listings; they carry
/// `Unknown` and are left to the user to judge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListingDate {
    Known(NaiveDate),
    Unknown,
}

impl ListingDate {
    /// Returns the date if one was recognized
    pub fn known(&self) -> Option<NaiveDate> {
        match self {
            Self::Known(date) => Some(*date),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for ListingDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(date) => write!(f, "{}", date.format(DATE_FORMAT)),
            Self::Unknown => f.write_str("Unknown"),
        }
    }
}

/// Wall-clock span of a shift
///
/// `end` is only present when the row carried exactly two times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: NaiveTime,
    pub end: Option<NaiveTime>,
}

impl TimeRange {
    /// Signed hours between start and end, `0.0` without an end
    ///
    /// Overnight shifts are not wrapped; an end before the start yields a
    /// negative value.
    pub fn span_hours(&self) -> f64 {
        match self.end {
            Some(end) => (end - self.start).num_minutes() as f64 / 60.0,
            None => 0.0,
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start.format(TIME_FORMAT))?;
        if let Some(end) = self.end {
            write!(f, " - {}", end.format(TIME_FORMAT))?;
        }
        Ok(())
    }
}

/// Deterministic key identifying a listing for deduplication
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One scraped job row, normalized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobListing {
    pub date: ListingDate,
    pub time_range: Option<TimeRange>,
    pub duration_hours: f64,
    /// Best-effort trailing descriptive text (usually the school)
    pub location: String,
    /// Cleaned, whitespace-normalized row text
    pub raw_text: String,
    /// Human-readable one-liner; doubles as the fingerprint
    pub summary: String,
}

impl JobListing {
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::new(self.summary.clone())
    }

    /// True when both a start and an end time were found
    pub fn has_duration(&self) -> bool {
        self.time_range.is_some_and(|range| range.end.is_some())
    }
}
