//! Claim protocol
//!
//! Contests one listing against everyone else watching the board. The
//! portal may reject a claim and still let a later attempt through, so a
//! rejection only means "try again". The only proof of success is the
//! row leaving the board. Every pass through [`ClaimState::ClickAccept`]
//! spends one attempt, which bounds the loop.

use smartfind_core::domain::JobListing;
use std::fmt;
use tracing::{debug, info, warn};

use crate::browser::{Frame, Locator, Surface};
use crate::config::ClaimSettings;
use crate::portal::PortalSelectors;
use crate::service::Clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimState {
    Idle,
    ClickAccept,
    AwaitConfirm,
    CheckBlockedBanner,
    CheckRowGone,
    Retry,
    Success,
    Fail(LossReason),
}

/// Why a claim ended without the job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossReason {
    /// The accept control vanished before we could press it
    Taken,
    /// Every attempt was spent
    Exhausted,
}

impl fmt::Display for LossReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Taken => write!(f, "taken by someone else"),
            Self::Exhausted => write!(f, "out of attempts"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    Secured { attempts: u32 },
    Lost { attempts: u32, reason: LossReason },
}

/// Runs the claim state machine against one surface
pub struct ClaimProtocol<'a> {
    surface: &'a dyn Surface,
    clock: &'a dyn Clock,
    selectors: &'a PortalSelectors,
    settings: &'a ClaimSettings,
}

/// Locators for one listing, resolved once per claim
struct Targets {
    frame: Frame,
    row: Locator,
    accept: Locator,
    confirm: Locator,
    banner: Locator,
}

impl<'a> ClaimProtocol<'a> {
    pub fn new(
        surface: &'a dyn Surface,
        clock: &'a dyn Clock,
        selectors: &'a PortalSelectors,
        settings: &'a ClaimSettings,
    ) -> Self {
        Self {
            surface,
            clock,
            selectors,
            settings,
        }
    }

    pub async fn attempt_claim(&self, listing: &JobListing) -> ClaimOutcome {
        let targets = Targets {
            frame: Frame::top(),
            row: self.selectors.row_of(listing),
            accept: self.selectors.accept_in(listing),
            confirm: self.selectors.confirm(),
            banner: self.selectors.blocked_banner(),
        };

        let mut attempts = 0;
        let mut state = ClaimState::Idle;

        loop {
            state = match state {
                ClaimState::Idle => ClaimState::ClickAccept,
                ClaimState::ClickAccept if attempts >= self.settings.max_attempts => {
                    ClaimState::Fail(LossReason::Exhausted)
                }
                ClaimState::ClickAccept => {
                    attempts += 1;
                    debug!("Claim attempt {} for {}", attempts, listing.summary);
                    self.click_accept(&targets).await
                }
                ClaimState::AwaitConfirm => self.confirm(&targets).await,
                ClaimState::CheckBlockedBanner => self.check_banner(&targets).await,
                ClaimState::CheckRowGone => self.check_row(&targets).await,
                ClaimState::Retry => ClaimState::ClickAccept,
                ClaimState::Success => {
                    info!("Secured {} after {} attempt(s)", listing.summary, attempts);
                    return ClaimOutcome::Secured { attempts };
                }
                ClaimState::Fail(reason) => {
                    warn!(
                        "Lost {} after {} attempt(s): {}",
                        listing.summary, attempts, reason
                    );
                    return ClaimOutcome::Lost { attempts, reason };
                }
            };
        }
    }

    async fn click_accept(&self, t: &Targets) -> ClaimState {
        match self.surface.is_visible(&t.frame, &t.accept).await {
            Ok(true) => {}
            Ok(false) => return ClaimState::Fail(LossReason::Taken),
            Err(e) => {
                debug!("Accept control check failed: {:#}", e);
                return ClaimState::Retry;
            }
        }

        match self.surface.click(&t.frame, &t.accept, true).await {
            Ok(()) => ClaimState::AwaitConfirm,
            Err(e) => {
                debug!("Accept click failed: {:#}", e);
                ClaimState::Retry
            }
        }
    }

    async fn confirm(&self, t: &Targets) -> ClaimState {
        match self
            .surface
            .wait_visible(&t.frame, &t.confirm, self.settings.confirm_timeout)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                debug!("Confirmation never appeared");
                return ClaimState::Retry;
            }
            Err(e) => {
                debug!("Confirmation check failed: {:#}", e);
                return ClaimState::Retry;
            }
        }

        match self.surface.click(&t.frame, &t.confirm, true).await {
            Ok(()) => ClaimState::CheckBlockedBanner,
            Err(e) => {
                debug!("Confirm click failed: {:#}", e);
                ClaimState::Retry
            }
        }
    }

    async fn check_banner(&self, t: &Targets) -> ClaimState {
        self.clock.sleep(self.settings.settle).await;
        match self.surface.is_visible(&t.frame, &t.banner).await {
            Ok(false) => ClaimState::CheckRowGone,
            Ok(true) => {
                debug!("Portal rejected the claim");
                ClaimState::Retry
            }
            Err(e) => {
                debug!("Banner check failed: {:#}", e);
                ClaimState::Retry
            }
        }
    }

    async fn check_row(&self, t: &Targets) -> ClaimState {
        match self.surface.is_visible(&t.frame, &t.row).await {
            Ok(false) => ClaimState::Success,
            Ok(true) => ClaimState::Retry,
            Err(e) => {
                debug!("Row check failed: {:#}", e);
                ClaimState::Retry
            }
        }
    }
}
