//! Scan poller
//!
//! Runs one scan cycle per interval, strictly one after another. Each
//! cycle opens a fresh page, logs in, resolves blocked dates, reads the
//! board, and decides what to do with every listing it has not seen yet.
//! The page is closed at the end of the cycle whether or not it succeeded.
//!
//! State that outlives a cycle (dedup ledger, login failure count, last
//! heartbeat) lives in [`ScanState`]; a failed cycle leaves it as it was
//! after the last listing that was fully handled.

use anyhow::{Context, Result};
use smartfind_core::ledger::KnownJobsLedger;
use smartfind_core::monitor::{HeartbeatMarker, LoginFailureCounter};
use smartfind_core::parser::{mentions_listing_terms, parse_row};
use smartfind_core::policy::Decision;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::browser::{Surface, SurfaceFactory};
use crate::config::Config;
use crate::service::{
    Alert, BlackoutResolver, ClaimOutcome, ClaimProtocol, Clock, Notifier, PortalSession,
};

/// Characters of board text quoted when the page is not recognized
const EXCERPT_CHARS: usize = 200;

/// Memory carried from one cycle to the next
#[derive(Debug, Clone)]
pub struct ScanState {
    pub ledger: KnownJobsLedger,
    pub login_failures: LoginFailureCounter,
    pub heartbeat: HeartbeatMarker,
}

impl ScanState {
    pub fn new(config: &Config) -> Self {
        Self {
            ledger: KnownJobsLedger::new(),
            login_failures: LoginFailureCounter::new(config.login_alert_threshold),
            heartbeat: HeartbeatMarker::new(config.heartbeat_hour),
        }
    }
}

/// How a cycle ended
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CycleStatus {
    #[default]
    Scanned,
    LoginFailed,
    BoardEmpty,
    /// Neither the empty marker nor anything that looks like a job list
    Unrecognized,
}

/// Counters for one cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub status: CycleStatus,
    pub rows: usize,
    pub listings: usize,
    pub known: usize,
    pub skipped: usize,
    pub notified: usize,
    pub claimed: usize,
    pub lost: usize,
}

impl CycleReport {
    fn with_status(status: CycleStatus) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }
}

/// Poller that drives the scan loop
pub struct ScanPoller {
    config: Config,
    factory: Arc<dyn SurfaceFactory>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    state: ScanState,
}

impl ScanPoller {
    pub fn new(
        config: Config,
        factory: Arc<dyn SurfaceFactory>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let state = ScanState::new(&config);
        Self {
            config,
            factory,
            notifier,
            clock,
            state,
        }
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    /// Announces startup, then scans forever
    pub async fn run(&mut self) -> Result<()> {
        info!(
            "Starting scan poller (interval: {:?})",
            self.config.poll_interval
        );
        self.notifier.alert(&Alert::Online).await;

        loop {
            self.run_once().await;
            self.clock.sleep(self.config.poll_interval).await;
        }
    }

    /// Sends the heartbeat if due and runs one cycle
    ///
    /// Errors end the cycle and are logged; `None` means "no result".
    pub async fn run_once(&mut self) -> Option<CycleReport> {
        self.send_heartbeat_if_due().await;

        match self.cycle().await {
            Ok(report) => {
                info!(
                    "Cycle done: {:?}, {} listing(s), {} new notified, {} claimed, {} lost",
                    report.status, report.listings, report.notified, report.claimed, report.lost
                );
                Some(report)
            }
            Err(e) => {
                error!("Error during scan cycle: {:#}", e);
                None
            }
        }
    }

    async fn send_heartbeat_if_due(&mut self) {
        let now = self.clock.now();
        if self.state.heartbeat.is_due(now) {
            self.notifier.alert(&Alert::Heartbeat(now.date())).await;
            self.state.heartbeat.mark_sent(now.date());
        }
    }

    /// One cycle on a fresh page; the page is always closed
    async fn cycle(&mut self) -> Result<CycleReport> {
        let surface = self
            .factory
            .open()
            .await
            .context("Failed to open browser page")?;

        let result = self.scan(surface.as_ref()).await;

        if let Err(e) = surface.close().await {
            warn!("Failed to close browser page: {:#}", e);
        }

        result
    }

    async fn scan(&mut self, surface: &dyn Surface) -> Result<CycleReport> {
        let config = &self.config;
        let clock = self.clock.as_ref();
        let notifier = self.notifier.as_ref();
        let state = &mut self.state;

        let session = PortalSession::new(surface, &config.portal, clock);

        if !session.authenticate().await {
            warn!("Login failed");
            if let Some(count) = state.login_failures.record_failure() {
                error!("Login failed {} times in a row", count);
                notifier.alert(&Alert::LoginFailures(count)).await;
            }
            return Ok(CycleReport::with_status(CycleStatus::LoginFailed));
        }
        state.login_failures.record_success();

        let mut blocked = BlackoutResolver::new(&config.blackout)
            .resolve(&session)
            .await?;

        session.open_board().await?;
        let board_text = session
            .board_text()
            .await
            .context("Failed to read job board")?;

        if state.ledger.reset_if_board_empty(&board_text) {
            info!("No jobs available");
            return Ok(CycleReport::with_status(CycleStatus::BoardEmpty));
        }

        let rows = session
            .job_rows()
            .await
            .context("Failed to read job rows")?;
        let listings: Vec<_> = rows
            .iter()
            .filter_map(|row| parse_row(row).into_listing())
            .collect();

        let mut report = CycleReport {
            rows: rows.len(),
            listings: listings.len(),
            ..Default::default()
        };

        if listings.is_empty() {
            if !mentions_listing_terms(&board_text) {
                let excerpt: String = board_text.chars().take(EXCERPT_CHARS).collect();
                warn!("Job board not recognized. Page starts with: {:?}", excerpt);
                report.status = CycleStatus::Unrecognized;
            } else {
                debug!("Board shows a job list but no row parsed");
            }
            return Ok(report);
        }

        let claims = ClaimProtocol::new(surface, clock, &config.portal.selectors, &config.claim);
        let mut fresh = Vec::new();

        for listing in listings {
            let fingerprint = listing.fingerprint();
            if !state.ledger.is_new(&fingerprint) {
                report.known += 1;
                continue;
            }

            match config.policy.classify(&listing, clock.now(), &blocked) {
                Decision::Skip(reason) => {
                    debug!("Skipping {} ({:?})", listing.summary, reason);
                    report.skipped += 1;
                }
                Decision::NotifyOnly(reason) => {
                    info!("New listing {} (not claimed: {:?})", listing.summary, reason);
                    state.ledger.record(fingerprint);
                    fresh.push(listing.summary);
                    report.notified += 1;
                }
                Decision::Claim => {
                    info!("Claiming {}", listing.summary);
                    let outcome = claims.attempt_claim(&listing).await;
                    state.ledger.record(fingerprint);
                    match outcome {
                        ClaimOutcome::Secured { .. } => {
                            if let Some(date) = listing.date.known() {
                                blocked.insert(date);
                            }
                            notifier.alert(&Alert::Secured(listing.summary)).await;
                            report.claimed += 1;
                        }
                        ClaimOutcome::Lost { .. } => {
                            notifier.alert(&Alert::ClaimLost(listing.summary)).await;
                            report.lost += 1;
                        }
                    }
                }
            }
        }

        if !fresh.is_empty() {
            notifier.alert(&Alert::NewListings(fresh)).await;
        }

        Ok(report)
    }
}
