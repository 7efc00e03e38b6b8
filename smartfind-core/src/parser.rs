//! Listing extraction
//!
//! Turns the visible text of one job-table row into a [`JobListing`].
//! Rows that cannot carry a date or time (headers, spacers, button bars)
//! come back as [`ParsedRow::NotAListing`]; that is never an error.

use chrono::{NaiveDate, NaiveTime};
use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::domain::{JobListing, ListingDate, TimeRange};

/// Text the portal shows when the board holds no openings
pub const BOARD_EMPTY_MARKER: &str = "no jobs available";

/// Action-button labels rendered inside job rows
const UI_CHROME: &[&str] = &["Accept", "Decline", "Details", "Select"];

/// Words that show a page is a job list even when no row parsed
const LISTING_TERMS: &[&str] = &["date", "job", "location"];

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").unwrap());
static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2}):(\d{2})\s*([AaPp][Mm])\b").unwrap());
static WEEKDAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b").unwrap()
});

/// Result of parsing a single row
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedRow {
    Listing(JobListing),
    NotAListing,
}

impl ParsedRow {
    pub fn into_listing(self) -> Option<JobListing> {
        match self {
            Self::Listing(listing) => Some(listing),
            Self::NotAListing => None,
        }
    }
}

/// Parses the visible text of one table row
pub fn parse_row(row_text: &str) -> ParsedRow {
    let tokens: Vec<String> = row_text
        .lines()
        .map(normalize_whitespace)
        .filter(|token| !token.is_empty() && !is_ui_chrome(token))
        .collect();

    if tokens.is_empty() {
        return ParsedRow::NotAListing;
    }

    let raw_text = tokens.join(" ");
    if !raw_text.chars().any(|c| c.is_ascii_digit()) {
        return ParsedRow::NotAListing;
    }

    let date = find_date(&raw_text).map_or(ListingDate::Unknown, ListingDate::Known);

    let time_matches: Vec<Option<NaiveTime>> =
        TIME_RE.captures_iter(&raw_text).map(|c| time_from(&c)).collect();

    let time_range = match time_matches.as_slice() {
        [] => None,
        [Some(start), Some(end)] => Some(TimeRange {
            start: *start,
            end: Some(*end),
        }),
        [first, ..] => first.map(|start| TimeRange { start, end: None }),
    };

    let duration_hours = time_range.map_or(0.0, |range| range.span_hours());
    let location = location_token(&tokens);
    let summary = summarize(date, &location, time_range);

    ParsedRow::Listing(JobListing {
        date,
        time_range,
        duration_hours,
        location,
        raw_text,
        summary,
    })
}

/// Returns the first `MM/DD/YYYY` date in `text`
///
/// Only the first date-shaped substring is considered; if it is not a real
/// calendar date the result is `None`.
pub fn find_date(text: &str) -> Option<NaiveDate> {
    DATE_RE.captures(text).and_then(|c| date_from(&c))
}

/// Extracts one date per committed-assignment row
///
/// Rows without a date are ignored.
pub fn assignment_dates<S: AsRef<str>>(rows: &[S]) -> Vec<NaiveDate> {
    rows.iter().filter_map(|row| find_date(row.as_ref())).collect()
}

/// True when the board text carries the explicit "no jobs" marker
pub fn is_board_empty(board_text: &str) -> bool {
    board_text.to_lowercase().contains(BOARD_EMPTY_MARKER)
}

/// True when the board text looks like a job list at all
pub fn mentions_listing_terms(board_text: &str) -> bool {
    let lower = board_text.to_lowercase();
    LISTING_TERMS.iter().any(|term| lower.contains(term))
}

/// Picks the descriptive token of a row
///
/// Heuristic: after stripping dates, weekday names and times from every
/// token, the last one left standing is usually the school. This can pick
/// the classification instead when the portal orders cells differently.
pub fn location_token(tokens: &[String]) -> String {
    tokens
        .iter()
        .map(|token| {
            let stripped = DATE_RE.replace_all(token, " ");
            let stripped = WEEKDAY_RE.replace_all(&stripped, " ");
            let stripped = TIME_RE.replace_all(&stripped, " ");
            normalize_whitespace(&stripped)
        })
        .filter(|token| !token.is_empty())
        .last()
        .unwrap_or_default()
}

fn summarize(date: ListingDate, location: &str, time_range: Option<TimeRange>) -> String {
    let mut parts = vec![date.to_string()];
    if !location.is_empty() {
        parts.push(location.to_string());
    }
    if let Some(range) = time_range {
        parts.push(range.to_string());
    }
    parts.join(" | ")
}

fn is_ui_chrome(token: &str) -> bool {
    UI_CHROME.iter().any(|label| label.eq_ignore_ascii_case(token))
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn date_from(caps: &Captures<'_>) -> Option<NaiveDate> {
    let month = caps[1].parse().ok()?;
    let day = caps[2].parse().ok()?;
    let year = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn time_from(caps: &Captures<'_>) -> Option<NaiveTime> {
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    if !(1..=12).contains(&hour) {
        return None;
    }
    let pm = caps[3].eq_ignore_ascii_case("pm");
    let hour = match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, true) => h + 12,
        (h, false) => h,
    };
    NaiveTime::from_hms_opt(hour, minute, 0)
}
