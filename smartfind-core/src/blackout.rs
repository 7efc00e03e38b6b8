//! Blocked-date calendar
//!
//! Dates come from three places: manually listed days off, a vacation
//! range, and the user's already-committed assignments. Blocking is
//! monotonic, so the set is a plain union rebuilt on every scan.

use chrono::NaiveDate;
use std::collections::BTreeSet;

use crate::domain::listing::DATE_FORMAT;
use crate::error::PolicyError;

/// Parses a single `MM/DD/YYYY` date
pub fn parse_date(text: &str) -> Result<NaiveDate, PolicyError> {
    let trimmed = text.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|_| PolicyError::InvalidDate(trimmed.to_string()))
}

/// Parses a comma-separated list of dates, ignoring blank entries
pub fn parse_date_list(text: &str) -> Result<Vec<NaiveDate>, PolicyError> {
    text.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(parse_date)
        .collect()
}

/// Inclusive range of vacation days
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VacationRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl VacationRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, PolicyError> {
        if end < start {
            return Err(PolicyError::InvertedRange {
                start: start.format(DATE_FORMAT).to_string(),
                end: end.format(DATE_FORMAT).to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Builds a range from the two configured strings
    pub fn parse(start: &str, end: &str) -> Result<Self, PolicyError> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    /// Every day from start to end, inclusive
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }
}

/// Union of all dates on which nothing may be claimed
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BlockedDates {
    dates: BTreeSet<NaiveDate>,
}

impl BlockedDates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, date: NaiveDate) -> bool {
        self.dates.insert(date)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    pub fn add_range(&mut self, range: &VacationRange) {
        self.dates.extend(range.days());
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NaiveDate> {
        self.dates.iter()
    }
}

impl Extend<NaiveDate> for BlockedDates {
    fn extend<T: IntoIterator<Item = NaiveDate>>(&mut self, iter: T) {
        self.dates.extend(iter);
    }
}

impl FromIterator<NaiveDate> for BlockedDates {
    fn from_iter<T: IntoIterator<Item = NaiveDate>>(iter: T) -> Self {
        Self {
            dates: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, day).unwrap()
    }

    #[test]
    fn test_parse_date_list() {
        let dates = parse_date_list("03/10/2026, 3/11/2026,,").unwrap();
        assert_eq!(dates, vec![d(3, 10), d(3, 11)]);
        assert_eq!(
            parse_date_list("03/10/2026,tomorrow"),
            Err(PolicyError::InvalidDate("tomorrow".to_string()))
        );
        assert!(parse_date_list("").unwrap().is_empty());
    }

    #[test]
    fn test_vacation_range_is_inclusive() {
        let range = VacationRange::parse("02/27/2026", "03/02/2026").unwrap();
        let days: Vec<_> = range.days().collect();
        assert_eq!(days, vec![d(2, 27), d(2, 28), d(3, 1), d(3, 2)]);
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        assert!(matches!(
            VacationRange::parse("03/05/2026", "03/01/2026"),
            Err(PolicyError::InvertedRange { .. })
        ));
    }

    #[test]
    fn test_union_of_sources() {
        let mut blocked: BlockedDates = vec![d(3, 10)].into_iter().collect();
        blocked.add_range(&VacationRange::new(d(4, 1), d(4, 3)).unwrap());
        blocked.extend(vec![d(5, 20), d(3, 10)]);

        assert_eq!(blocked.len(), 5);
        for day in [d(3, 10), d(4, 1), d(4, 2), d(4, 3), d(5, 20)] {
            assert!(blocked.contains(day));
        }
        assert!(!blocked.contains(d(4, 4)));
    }
}
