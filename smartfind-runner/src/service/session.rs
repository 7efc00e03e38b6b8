//! Portal session
//!
//! Logs in and moves the page between the two tabs the agent cares about.
//! The login form may live in the top document or in any nested frame, so
//! every rendering context is tried in order, each within its own time box.

use anyhow::{Context, Result};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::browser::{Frame, Locator, Surface};
use crate::config::PortalConfig;
use crate::service::Clock;

/// An open surface bound to the portal configuration
pub struct PortalSession<'a> {
    surface: &'a dyn Surface,
    config: &'a PortalConfig,
    clock: &'a dyn Clock,
}

impl<'a> PortalSession<'a> {
    pub fn new(surface: &'a dyn Surface, config: &'a PortalConfig, clock: &'a dyn Clock) -> Self {
        Self {
            surface,
            config,
            clock,
        }
    }

    /// Loads the login page and submits the credentials
    ///
    /// Returns false when no rendering context accepted them. Errors are
    /// logged here and never escape.
    pub async fn authenticate(&self) -> bool {
        if let Err(e) = self.surface.navigate(&self.config.login_url).await {
            warn!("Failed to load login page: {:#}", e);
            return false;
        }

        let frames = match self.surface.frames().await {
            Ok(frames) if !frames.is_empty() => frames,
            Ok(_) => vec![Frame::top()],
            Err(e) => {
                debug!("Could not list frames, using top document only: {:#}", e);
                vec![Frame::top()]
            }
        };

        for (index, frame) in frames.iter().enumerate() {
            match timeout(self.config.login_timeout, self.submit_credentials(frame)).await {
                Ok(Ok(())) => {
                    info!("Submitted credentials in context {} {}", index, frame.url);
                    if let Err(e) = self.surface.wait_idle().await {
                        warn!("Page did not settle after login: {:#}", e);
                    }
                    return self.landed().await;
                }
                Ok(Err(e)) => debug!("Login form not usable in context {}: {:#}", index, e),
                Err(_) => debug!("Login attempt in context {} timed out", index),
            }
        }

        false
    }

    /// True once the job tabs show up behind the login form
    async fn landed(&self) -> bool {
        let tab = self.config.selectors.available_tab();
        match self
            .surface
            .wait_visible(&Frame::top(), &tab, self.config.tab_timeout)
            .await
        {
            Ok(true) => true,
            Ok(false) => {
                warn!("Credentials submitted but the job board never appeared");
                false
            }
            Err(e) => {
                warn!("Could not confirm login: {:#}", e);
                false
            }
        }
    }

    async fn submit_credentials(&self, frame: &Frame) -> Result<()> {
        let selectors = &self.config.selectors;
        let user = selectors.user_field();
        let pin = selectors.pin_field();

        if !self
            .surface
            .wait_visible(frame, &user, self.config.login_timeout)
            .await?
        {
            anyhow::bail!("user field not visible");
        }

        self.surface.fill(frame, &user, &self.config.username).await?;
        self.surface
            .fill(frame, &pin, self.config.password.expose())
            .await?;
        self.surface.press_enter(frame, &pin).await?;
        Ok(())
    }

    /// Switches to the available-jobs tab and lets it render
    pub async fn open_board(&self) -> Result<()> {
        self.open_tab(self.config.selectors.available_tab(), "available jobs")
            .await
    }

    /// Switches to the committed-assignments tab and lets it render
    pub async fn open_assignments(&self) -> Result<()> {
        self.open_tab(self.config.selectors.active_tab(), "active assignments")
            .await
    }

    async fn open_tab(&self, tab: Locator, name: &str) -> Result<()> {
        let top = Frame::top();

        if !self
            .surface
            .wait_visible(&top, &tab, self.config.tab_timeout)
            .await?
        {
            anyhow::bail!("{} tab did not appear", name);
        }

        self.surface
            .click(&top, &tab, false)
            .await
            .with_context(|| format!("Failed to open {} tab", name))?;
        self.clock.sleep(self.config.settle).await;
        debug!("Opened {} tab", name);
        Ok(())
    }

    /// Lower-cased text of the top document and every nested frame
    pub async fn board_text(&self) -> Result<String> {
        let body = self.config.selectors.body();
        let mut parts = vec![self.surface.read_text(&Frame::top(), &body).await?];

        let frames = self.surface.frames().await.unwrap_or_default();
        for frame in frames.iter().filter(|f| !f.is_top()) {
            match self.surface.read_text(frame, &body).await {
                Ok(text) => parts.push(text),
                Err(e) => debug!("Skipping unreadable frame {}: {:#}", frame.url, e),
            }
        }

        Ok(parts.join("\n").to_lowercase())
    }

    /// Visible text of every row on the available-jobs table
    pub async fn job_rows(&self) -> Result<Vec<String>> {
        self.surface
            .read_all(&Frame::top(), &self.config.selectors.job_rows)
            .await
    }

    /// Visible text of every committed-assignment row
    pub async fn assignment_rows(&self) -> Result<Vec<String>> {
        self.surface
            .read_all(&Frame::top(), &self.config.selectors.assignment_rows)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeSurface, ManualClock, portal_config};

    #[tokio::test]
    async fn test_login_in_top_document() {
        let surface = FakeSurface::new();
        let config = portal_config();
        let clock = ManualClock::default();
        let session = PortalSession::new(&surface, &config, &clock);

        assert!(session.authenticate().await);
        let state = surface.state();
        assert_eq!(state.navigations, vec![config.login_url.clone()]);
        assert_eq!(state.login_frame_used, Some(0));
        assert_eq!(state.filled, vec!["123456".to_string(), "9999".to_string()]);
    }

    #[tokio::test]
    async fn test_login_falls_back_to_nested_frame() {
        let surface = FakeSurface::new().with_nested_frames(2).with_login_frame(Some(2));
        let config = portal_config();
        let clock = ManualClock::default();

        assert!(PortalSession::new(&surface, &config, &clock).authenticate().await);
        assert_eq!(surface.state().login_frame_used, Some(2));
    }

    #[tokio::test]
    async fn test_login_fails_without_form() {
        let surface = FakeSurface::new().with_nested_frames(1).with_login_frame(None);
        let config = portal_config();
        let clock = ManualClock::default();

        assert!(!PortalSession::new(&surface, &config, &clock).authenticate().await);
        assert!(surface.state().filled.is_empty());
    }

    #[tokio::test]
    async fn test_rejected_credentials_fail() {
        let surface = FakeSurface::new();
        surface.update(|s| s.reject_login = true);
        let config = portal_config();
        let clock = ManualClock::default();

        assert!(!PortalSession::new(&surface, &config, &clock).authenticate().await);
        assert_eq!(surface.state().login_frame_used, Some(0));
    }

    #[tokio::test]
    async fn test_login_fails_when_page_does_not_load() {
        let surface = FakeSurface::new();
        surface.update(|s| s.navigate_fails = true);
        let config = portal_config();
        let clock = ManualClock::default();

        assert!(!PortalSession::new(&surface, &config, &clock).authenticate().await);
    }

    #[tokio::test]
    async fn test_board_text_combines_frames() {
        let surface = FakeSurface::new().with_nested_frames(1);
        surface.update(|s| {
            s.body_text = "Available Jobs".to_string();
            s.frame_text = "No Jobs Available".to_string();
        });
        let config = portal_config();
        let clock = ManualClock::default();

        let text = PortalSession::new(&surface, &config, &clock)
            .board_text()
            .await
            .unwrap();
        assert!(text.contains("available jobs"));
        assert!(text.contains("no jobs available"));
    }

    #[tokio::test]
    async fn test_open_board_settles() {
        let surface = FakeSurface::new();
        let config = portal_config();
        let clock = ManualClock::default();

        PortalSession::new(&surface, &config, &clock)
            .open_board()
            .await
            .unwrap();
        assert_eq!(surface.state().tabs_opened, vec![config.selectors.available_tab.clone()]);
        assert_eq!(clock.slept(), vec![config.settle]);
    }

    #[tokio::test]
    async fn test_missing_tab_is_an_error() {
        let surface = FakeSurface::new();
        surface.update(|s| s.tabs_visible = false);
        let config = portal_config();
        let clock = ManualClock::default();

        let session = PortalSession::new(&surface, &config, &clock);
        assert!(session.open_assignments().await.is_err());
    }
}
