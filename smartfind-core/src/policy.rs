//! Eligibility policy
//!
//! Pure decision over a listing, the current time and the blocked-date
//! set. Rules are checked in a fixed order and the first failing rule
//! wins:
//!
//! 1. Blackout: the date is blocked, drop the listing silently
//! 2. Auto-claim switch and active-hours window
//! 3. Prep deadline: cutoff hour on the day before the job
//! 4. School allow-list
//! 5. Minimum duration for a claim
//!
//! A listing passing 2-5 is claimed. Anything else is notified, unless the
//! noise filter drops it for being a very short shift.

use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::blackout::BlockedDates;
use crate::domain::JobListing;

/// Why a listing was not auto-claimed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reason {
    Blackout,
    AutoClaimDisabled,
    Hours,
    PrepDeadline,
    School,
    Duration,
    /// Below the notification noise threshold
    NoiseFilter,
}

/// Outcome of classifying one listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Drop without notifying
    Skip(Reason),
    /// Route to the claim protocol
    Claim,
    /// Notify only; carries the auto-claim gate that failed
    NotifyOnly(Reason),
}

/// Immutable policy knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityPolicy {
    pub auto_claim: bool,
    /// Claiming allowed when `start_hour <= hour < end_hour`
    pub start_hour: u32,
    pub end_hour: u32,
    /// Hour of day, on the day before the job, after which it is too late
    pub prep_cutoff_hour: u32,
    /// Upper-cased school names; a claim needs one of them in the summary
    pub schools: Vec<String>,
    pub min_claim_hours: f64,
    pub min_notify_hours: f64,
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self {
            auto_claim: false,
            start_hour: 6,
            end_hour: 22,
            prep_cutoff_hour: 15,
            schools: Vec::new(),
            min_claim_hours: 6.0,
            min_notify_hours: 0.0,
        }
    }
}

impl EligibilityPolicy {
    /// Sets the allow-list, normalizing names for case-insensitive matching
    pub fn with_schools<I, S>(mut self, schools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.schools = schools
            .into_iter()
            .map(|s| s.as_ref().trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
        self
    }

    pub fn classify(
        &self,
        listing: &JobListing,
        now: NaiveDateTime,
        blocked: &BlockedDates,
    ) -> Decision {
        if listing.date.known().is_some_and(|date| blocked.contains(date)) {
            return Decision::Skip(Reason::Blackout);
        }

        match self.claim_gate(listing, now) {
            None => Decision::Claim,
            Some(_) if self.is_noise(listing) => Decision::Skip(Reason::NoiseFilter),
            Some(reason) => Decision::NotifyOnly(reason),
        }
    }

    /// First auto-claim gate the listing fails, if any
    fn claim_gate(&self, listing: &JobListing, now: NaiveDateTime) -> Option<Reason> {
        if !self.auto_claim {
            return Some(Reason::AutoClaimDisabled);
        }
        if !self.within_active_hours(now) {
            return Some(Reason::Hours);
        }
        if !self.before_prep_deadline(listing, now) {
            return Some(Reason::PrepDeadline);
        }
        if !self.school_allowed(listing) {
            return Some(Reason::School);
        }
        if listing.duration_hours < self.min_claim_hours {
            return Some(Reason::Duration);
        }
        None
    }

    pub fn within_active_hours(&self, now: NaiveDateTime) -> bool {
        let hour = now.hour();
        self.start_hour <= hour && hour < self.end_hour
    }

    /// Latest moment at which the listing may still be auto-claimed
    ///
    /// `None` when the listing has no recognizable date.
    pub fn prep_deadline(&self, listing: &JobListing) -> Option<NaiveDateTime> {
        let date = listing.date.known()?;
        let cutoff = NaiveTime::from_hms_opt(self.prep_cutoff_hour, 0, 0)?;
        Some((date - Duration::days(1)).and_time(cutoff))
    }

    pub fn before_prep_deadline(&self, listing: &JobListing, now: NaiveDateTime) -> bool {
        self.prep_deadline(listing)
            .is_some_and(|deadline| now <= deadline)
    }

    pub fn school_allowed(&self, listing: &JobListing) -> bool {
        let summary = listing.summary.to_uppercase();
        self.schools.iter().any(|school| summary.contains(school))
    }

    fn is_noise(&self, listing: &JobListing) -> bool {
        listing.has_duration() && listing.duration_hours < self.min_notify_hours
    }
}
