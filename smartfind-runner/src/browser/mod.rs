//! Browser surface
//!
//! The agent never touches a browser directly. Everything it needs from
//! the portal page goes through the [`Surface`] trait: navigate, read
//! text, fill fields, click, and check visibility. A surface is opened
//! fresh for every scan cycle by a [`SurfaceFactory`] and closed at the
//! end of it.
//!
//! The production implementation drives Chrome over the DevTools
//! protocol (see [`cdp`]).

pub mod cdp;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

pub use cdp::CdpSurfaceFactory;

/// One rendering context of the page: the top document or a nested frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub id: String,
    pub url: String,
    /// Execution context for nested frames; `None` is the top document
    pub context: Option<i64>,
}

impl Frame {
    /// The top-level document
    pub fn top() -> Self {
        Self {
            id: String::new(),
            url: String::new(),
            context: None,
        }
    }

    pub fn is_top(&self) -> bool {
        self.context.is_none()
    }
}

/// How to find one element inside a frame
///
/// Text matching is case-insensitive and whitespace-normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Locator {
    /// First element matching a CSS selector
    Css { css: String },
    /// Element matching `css` whose text contains every needle; the one
    /// with the least other text wins
    Text { css: String, contains: Vec<String> },
    /// Like `Text`, searched only inside the element `scope` resolves to
    Within {
        scope: Box<Locator>,
        css: String,
        contains: Vec<String>,
    },
}

impl Locator {
    pub fn css(css: impl Into<String>) -> Self {
        Self::Css { css: css.into() }
    }

    pub fn text<I, S>(css: impl Into<String>, contains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Text {
            css: css.into(),
            contains: contains.into_iter().map(Into::into).collect(),
        }
    }

    /// Narrows the search to descendants of `self`
    pub fn within<I, S>(self, css: impl Into<String>, contains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Within {
            scope: Box::new(self),
            css: css.into(),
            contains: contains.into_iter().map(Into::into).collect(),
        }
    }
}

/// An open page the agent can drive
///
/// Lookups that find nothing are not errors: `read_text` returns an empty
/// string and `is_visible` returns false. Actions on a missing element
/// (fill, click) fail.
#[async_trait]
pub trait Surface: Send + Sync {
    /// Loads `url` and waits for the document to settle
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Waits until the current document has finished loading
    async fn wait_idle(&self) -> Result<()>;

    /// Every rendering context of the page, top document first
    async fn frames(&self) -> Result<Vec<Frame>>;

    /// Visible text of the first element `locator` resolves to
    async fn read_text(&self, frame: &Frame, locator: &Locator) -> Result<String>;

    /// Visible text of every element matching `css`, in page order
    async fn read_all(&self, frame: &Frame, css: &str) -> Result<Vec<String>>;

    /// Sets an input's value, bypassing visibility checks
    async fn fill(&self, frame: &Frame, locator: &Locator, value: &str) -> Result<()>;

    /// Focuses the element and presses Enter
    async fn press_enter(&self, frame: &Frame, locator: &Locator) -> Result<()>;

    /// Clicks the element; `force` skips the visibility check
    async fn click(&self, frame: &Frame, locator: &Locator, force: bool) -> Result<()>;

    async fn is_visible(&self, frame: &Frame, locator: &Locator) -> Result<bool>;

    /// Polls until the element is visible; false on timeout
    async fn wait_visible(&self, frame: &Frame, locator: &Locator, timeout: Duration)
    -> Result<bool>;

    /// Releases the page
    async fn close(&self) -> Result<()>;
}

/// Opens one fresh [`Surface`] per scan cycle
#[async_trait]
pub trait SurfaceFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn Surface>>;
}
