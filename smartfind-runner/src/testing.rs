//! Test doubles for the browser, notification and clock seams

use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::browser::{Frame, Locator, Surface, SurfaceFactory};
use crate::config::{Config, PortalConfig};
use crate::portal::PortalSelectors;
use crate::service::{Clock, Notifier};

pub fn test_config() -> Config {
    let pairs = [
        ("SF_USERNAME", "123456"),
        ("SF_PASSWORD", "9999"),
        ("PUSHOVER_USER", "user-key"),
        ("PUSHOVER_TOKEN", "app-token"),
    ];
    Config::from_lookup(|key| {
        pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    })
    .unwrap()
}

pub fn portal_config() -> PortalConfig {
    test_config().portal
}

/// Scripted portal page
#[derive(Debug, Clone)]
pub struct FakeState {
    pub navigate_fails: bool,
    pub nested_frames: usize,
    /// Frame index holding the login form; 0 is the top document
    pub login_frame: Option<usize>,
    pub reject_login: bool,
    pub tabs_visible: bool,
    pub body_text: String,
    pub frame_text: String,
    pub job_rows: Vec<String>,
    /// Rows resolved one by one like the page scripts do; when set, they
    /// replace `job_rows` and the single-row claim flags
    pub board: Option<Vec<String>>,
    pub assignment_rows: Vec<String>,
    pub assignments_fail: bool,
    pub accept_visible: bool,
    pub confirm_visible: bool,
    pub banner_visible: bool,
    pub row_gone_after_confirms: Option<u32>,
    pub clicks_fail: bool,

    pub navigations: Vec<String>,
    pub filled: Vec<String>,
    pub login_frame_used: Option<usize>,
    pub tabs_opened: Vec<String>,
    pub row_gone: bool,
    /// Row whose accept control was clicked last
    pub selected: Option<String>,
    /// Board rows taken by a confirmed claim
    pub claimed: Vec<String>,
    pub accept_clicks: u32,
    pub confirm_clicks: u32,
    pub closed: u32,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            navigate_fails: false,
            nested_frames: 0,
            login_frame: Some(0),
            reject_login: false,
            tabs_visible: true,
            body_text: "Available Jobs".to_string(),
            frame_text: String::new(),
            job_rows: Vec::new(),
            board: None,
            assignment_rows: Vec::new(),
            assignments_fail: false,
            accept_visible: true,
            confirm_visible: true,
            banner_visible: false,
            row_gone_after_confirms: None,
            clicks_fail: false,
            navigations: Vec::new(),
            filled: Vec::new(),
            login_frame_used: None,
            tabs_opened: Vec::new(),
            row_gone: false,
            selected: None,
            claimed: Vec::new(),
            accept_clicks: 0,
            confirm_clicks: 0,
            closed: 0,
        }
    }
}

#[derive(Clone)]
pub struct FakeSurface {
    state: Arc<Mutex<FakeState>>,
    selectors: PortalSelectors,
}

impl FakeSurface {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState::default())),
            selectors: PortalSelectors::default(),
        }
    }

    pub fn with_nested_frames(self, count: usize) -> Self {
        self.update(|s| s.nested_frames = count);
        self
    }

    pub fn with_login_frame(self, index: Option<usize>) -> Self {
        self.update(|s| s.login_frame = index);
        self
    }

    pub fn state(&self) -> FakeState {
        self.state.lock().unwrap().clone()
    }

    pub fn update(&self, f: impl FnOnce(&mut FakeState)) {
        f(&mut self.state.lock().unwrap());
    }

    fn index(frame: &Frame) -> usize {
        frame.context.map_or(0, |c| c as usize)
    }

    fn is_tab(&self, locator: &Locator) -> Option<String> {
        [&self.selectors.available_tab, &self.selectors.active_tab]
            .into_iter()
            .find(|css| *locator == Locator::css(css.as_str()))
            .cloned()
    }

    fn visible(&self, frame: &Frame, locator: &Locator) -> bool {
        let s = self.state.lock().unwrap();
        let sel = &self.selectors;

        if *locator == sel.user_field() || *locator == sel.pin_field() {
            return s.login_frame == Some(Self::index(frame));
        }
        if self.is_tab(locator).is_some() {
            return s.tabs_visible && !s.reject_login;
        }
        if *locator == sel.confirm() {
            return s.confirm_visible;
        }
        if *locator == sel.blocked_banner() {
            return s.banner_visible;
        }
        if let Some(board) = &s.board {
            return match locator {
                Locator::Within { scope, .. } => {
                    s.accept_visible && board_row(board, scope).is_some()
                }
                Locator::Text { css, .. } if *css == sel.job_rows => {
                    board_row(board, locator).is_some()
                }
                _ => false,
            };
        }
        match locator {
            Locator::Within { .. } => s.accept_visible && !s.row_gone,
            Locator::Text { css, .. } if *css == sel.job_rows => !s.row_gone,
            _ => false,
        }
    }
}

/// Board row a text locator resolves to: every needle present, least
/// other text first
fn board_row(board: &[String], locator: &Locator) -> Option<String> {
    let Locator::Text { contains, .. } = locator else {
        return None;
    };
    let norm = |s: &str| s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    board
        .iter()
        .filter(|row| contains.iter().all(|needle| norm(row).contains(&norm(needle))))
        .min_by_key(|row| norm(row).len())
        .cloned()
}

#[async_trait]
impl Surface for FakeSurface {
    async fn navigate(&self, url: &str) -> Result<()> {
        let mut s = self.state.lock().unwrap();
        if s.navigate_fails {
            anyhow::bail!("net::ERR_CONNECTION_REFUSED");
        }
        s.navigations.push(url.to_string());
        Ok(())
    }

    async fn wait_idle(&self) -> Result<()> {
        Ok(())
    }

    async fn frames(&self) -> Result<Vec<Frame>> {
        let count = self.state.lock().unwrap().nested_frames;
        let mut frames = vec![Frame::top()];
        frames.extend((1..=count).map(|i| Frame {
            id: format!("frame-{}", i),
            url: format!("https://portal.test/frame/{}", i),
            context: Some(i as i64),
        }));
        Ok(frames)
    }

    async fn read_text(&self, frame: &Frame, locator: &Locator) -> Result<String> {
        let s = self.state.lock().unwrap();
        if *locator != self.selectors.body() {
            return Ok(String::new());
        }
        Ok(if frame.is_top() {
            s.body_text.clone()
        } else {
            s.frame_text.clone()
        })
    }

    async fn read_all(&self, _frame: &Frame, css: &str) -> Result<Vec<String>> {
        let s = self.state.lock().unwrap();
        if css == self.selectors.job_rows {
            Ok(s.board.clone().unwrap_or_else(|| s.job_rows.clone()))
        } else if css == self.selectors.assignment_rows {
            if s.assignments_fail {
                anyhow::bail!("assignments table detached");
            }
            Ok(s.assignment_rows.clone())
        } else {
            Ok(Vec::new())
        }
    }

    async fn fill(&self, frame: &Frame, locator: &Locator, value: &str) -> Result<()> {
        if !self.visible(frame, locator) {
            anyhow::bail!("element not found: {:?}", locator);
        }
        self.state.lock().unwrap().filled.push(value.to_string());
        Ok(())
    }

    async fn press_enter(&self, frame: &Frame, locator: &Locator) -> Result<()> {
        if !self.visible(frame, locator) {
            anyhow::bail!("element not found: {:?}", locator);
        }
        self.state.lock().unwrap().login_frame_used = Some(Self::index(frame));
        Ok(())
    }

    async fn click(&self, frame: &Frame, locator: &Locator, _force: bool) -> Result<()> {
        let tab = self.is_tab(locator);
        let is_confirm = *locator == self.selectors.confirm();
        let visible = self.visible(frame, locator);
        let row = match (locator, &self.state().board) {
            (Locator::Within { scope, .. }, Some(board)) => board_row(board, scope),
            _ => None,
        };

        let mut s = self.state.lock().unwrap();
        if s.clicks_fail {
            anyhow::bail!("click intercepted");
        }
        if let Some(css) = tab {
            s.tabs_opened.push(css);
        } else if is_confirm {
            s.confirm_clicks += 1;
            if s.row_gone_after_confirms.is_some_and(|n| s.confirm_clicks >= n) {
                s.row_gone = true;
            }
            if !s.banner_visible
                && let Some(taken) = s.selected.take()
            {
                if let Some(board) = s.board.as_mut() {
                    board.retain(|r| *r != taken);
                }
                s.claimed.push(taken);
            }
        } else if matches!(locator, Locator::Within { .. }) && visible {
            s.accept_clicks += 1;
            s.selected = row;
        }
        Ok(())
    }

    async fn is_visible(&self, frame: &Frame, locator: &Locator) -> Result<bool> {
        Ok(self.visible(frame, locator))
    }

    async fn wait_visible(
        &self,
        frame: &Frame,
        locator: &Locator,
        _timeout: Duration,
    ) -> Result<bool> {
        Ok(self.visible(frame, locator))
    }

    async fn close(&self) -> Result<()> {
        self.state.lock().unwrap().closed += 1;
        Ok(())
    }
}

/// Hands out clones of one scripted surface
pub struct FakeFactory {
    surface: FakeSurface,
    fail_next: AtomicBool,
}

impl FakeFactory {
    pub fn new(surface: FakeSurface) -> Self {
        Self {
            surface,
            fail_next: AtomicBool::new(false),
        }
    }

    pub fn fail_next_open(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl SurfaceFactory for FakeFactory {
    async fn open(&self) -> Result<Box<dyn Surface>> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            anyhow::bail!("Chrome not available");
        }
        Ok(Box::new(self.surface.clone()))
    }
}

/// Keeps every `(message, title)` it is asked to send
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &str, title: &str) {
        self.sent
            .lock()
            .unwrap()
            .push((message.to_string(), title.to_string()));
    }
}

/// Clock that only moves when slept on
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
    slept: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn at(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
            slept: Mutex::new(Vec::new()),
        }
    }

    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::at(
            NaiveDate::from_ymd_opt(2026, 3, 9)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
        )
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        *self.now.lock().unwrap() += chrono::Duration::from_std(duration).unwrap();
        self.slept.lock().unwrap().push(duration);
    }
}
