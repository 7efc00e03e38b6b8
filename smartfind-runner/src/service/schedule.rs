//! Blackout resolver
//!
//! Builds the set of dates that must never be claimed or announced: the
//! manual list, the vacation range, and every date the user is already
//! booked on according to the portal's active-assignments tab.

use anyhow::{Context, Result};
use smartfind_core::blackout::{BlockedDates, VacationRange};
use smartfind_core::parser::assignment_dates;
use tracing::{debug, info, warn};

use crate::config::BlackoutConfig;
use crate::service::PortalSession;

pub struct BlackoutResolver<'a> {
    config: &'a BlackoutConfig,
}

impl<'a> BlackoutResolver<'a> {
    pub fn new(config: &'a BlackoutConfig) -> Self {
        Self { config }
    }

    /// Dates that come from configuration alone
    ///
    /// A malformed vacation range is reported and left out; it does not
    /// stop the rest of the set from being built.
    pub fn configured(&self) -> BlockedDates {
        let mut blocked: BlockedDates = self.config.dates.iter().copied().collect();

        if let Some((start, end)) = &self.config.vacation {
            match VacationRange::parse(start, end) {
                Ok(range) => blocked.add_range(&range),
                Err(e) => warn!("Ignoring vacation range {:?}..{:?}: {}", start, end, e),
            }
        }

        blocked
    }

    /// Configured dates plus every date booked on the portal
    ///
    /// Leaves the page on the active-assignments tab. Failing to read the
    /// assignments is an error; claiming without them could double-book.
    pub async fn resolve(&self, session: &PortalSession<'_>) -> Result<BlockedDates> {
        let mut blocked = self.configured();

        session
            .open_assignments()
            .await
            .context("Failed to open active assignments")?;
        let rows = session
            .assignment_rows()
            .await
            .context("Failed to read active assignments")?;

        let booked = assignment_dates(&rows);
        debug!("Found {} booked date(s) in {} row(s)", booked.len(), rows.len());
        blocked.extend(booked);

        info!("Blocked dates this cycle: {}", blocked.len());
        Ok(blocked)
    }
}
