//! Chrome-backed surface
//!
//! Each action is a small script evaluated in the target frame. Locators
//! travel into the page as JSON and are resolved by a shared prelude, so
//! the Rust side never holds DOM handles. Nested frames get an isolated
//! execution context, which also reaches cross-origin frames.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use smartfind_client::cdp::{CdpClient, PageSession};
use std::time::{Duration, Instant};
use tracing::debug;

use super::{Frame, Locator, Surface, SurfaceFactory};

/// Locator resolution and visibility helpers shared by every action script
const PRELUDE: &str = r#"
const norm = (s) => (s || '').replace(/\s+/g, ' ').trim().toLowerCase();
const textOf = (el) => el.innerText || el.textContent || el.value || '';
const hasAll = (el, needles) => needles.every((n) => norm(textOf(el)).includes(norm(n)));
const pick = (root, css, needles) =>
  Array.from(root.querySelectorAll(css))
    .filter((el) => hasAll(el, needles))
    .reduce((best, el) =>
      !best || norm(textOf(el)).length < norm(textOf(best)).length ? el : best, null);
const find = (root, loc) => {
  switch (loc.kind) {
    case 'css': return root.querySelector(loc.css);
    case 'text': return pick(root, loc.css, loc.contains);
    case 'within': {
      const scope = find(root, loc.scope);
      return scope ? pick(scope, loc.css, loc.contains) : null;
    }
    default: return null;
  }
};
const visible = (el) => {
  if (!el || !el.isConnected) return false;
  const style = getComputedStyle(el);
  if (style.visibility === 'hidden' || style.display === 'none') return false;
  return !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length);
};
"#;

const READ_TEXT: &str = "const el = find(document, loc); return el ? textOf(el) : '';";

const READ_ALL: &str = "return Array.from(document.querySelectorAll(arg)).map(textOf);";

const FILL: &str = r#"
const el = find(document, loc);
if (!el) return 'missing';
el.focus();
el.value = arg;
el.dispatchEvent(new Event('input', { bubbles: true }));
el.dispatchEvent(new Event('change', { bubbles: true }));
return 'ok';
"#;

const FOCUS: &str = r#"
const el = find(document, loc);
if (!el) return 'missing';
el.focus();
return 'ok';
"#;

const CLICK: &str = r#"
const el = find(document, loc);
if (!el) return 'missing';
if (!arg && !visible(el)) return 'hidden';
el.scrollIntoView({ block: 'center' });
el.click();
return 'ok';
"#;

const IS_VISIBLE: &str = "return visible(find(document, loc));";

const DESCRIBE_INPUTS: &str = r#"
return Array.from(document.querySelectorAll('input'))
  .filter((el) => !['hidden', 'submit', 'checkbox'].includes(el.type))
  .map((el) => ({ id: el.id || '', name: el.name || '', kind: el.type || 'text' }));
"#;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// One form input as seen by `inspect-inputs`
#[derive(Debug, Clone, Deserialize)]
pub struct InputField {
    pub id: String,
    pub name: String,
    pub kind: String,
}

/// Opens a new Chrome tab per cycle
pub struct CdpSurfaceFactory {
    endpoint: String,
}

impl CdpSurfaceFactory {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    /// Opens a surface without going through the trait object
    pub async fn open_page(&self) -> Result<CdpSurface> {
        let client = CdpClient::connect(&self.endpoint)
            .await
            .with_context(|| format!("Failed to connect to Chrome at {}", self.endpoint))?;
        let page = client.new_page().await.context("Failed to open a new tab")?;
        debug!("Opened tab {}", page.target_id());
        Ok(CdpSurface { client, page })
    }
}

#[async_trait]
impl SurfaceFactory for CdpSurfaceFactory {
    async fn open(&self) -> Result<Box<dyn Surface>> {
        Ok(Box::new(self.open_page().await?))
    }
}

/// A single Chrome tab
pub struct CdpSurface {
    client: CdpClient,
    page: PageSession,
}

impl CdpSurface {
    /// Runs an action script with `loc` and `arg` bound
    async fn run(
        &self,
        frame: &Frame,
        body: &str,
        locator: Option<&Locator>,
        arg: Value,
    ) -> Result<Value> {
        let loc = serde_json::to_string(&locator)?;
        let arg = serde_json::to_string(&arg)?;
        let script = format!("((loc, arg) => {{ {PRELUDE} {body} }})({loc}, {arg})");

        let value = self.page.evaluate(&script, frame.context).await?;
        Ok(value)
    }

    async fn expect_ok(
        &self,
        frame: &Frame,
        body: &str,
        locator: &Locator,
        arg: Value,
    ) -> Result<()> {
        let status = self.run(frame, body, Some(locator), arg).await?;
        match status.as_str() {
            Some("ok") => Ok(()),
            Some("hidden") => anyhow::bail!("element is not visible: {:?}", locator),
            _ => anyhow::bail!("element not found: {:?}", locator),
        }
    }

    /// Lists the text inputs of every frame, for selector discovery
    pub async fn describe_inputs(&self) -> Result<Vec<(Frame, Vec<InputField>)>> {
        let mut found = Vec::new();
        for frame in self.frames().await? {
            let value = self.run(&frame, DESCRIBE_INPUTS, None, Value::Null).await?;
            let inputs: Vec<InputField> = serde_json::from_value(value)?;
            found.push((frame, inputs));
        }
        Ok(found)
    }
}

#[async_trait]
impl Surface for CdpSurface {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.page
            .navigate(url)
            .await
            .with_context(|| format!("Failed to load {}", url))
    }

    async fn wait_idle(&self) -> Result<()> {
        self.page.wait_for_load().await?;
        Ok(())
    }

    async fn frames(&self) -> Result<Vec<Frame>> {
        let infos = self.page.frames().await?;
        let mut frames = Vec::with_capacity(infos.len());

        for (index, info) in infos.into_iter().enumerate() {
            let context = if index == 0 {
                None
            } else {
                match self.page.frame_context(&info.id).await {
                    Ok(id) => Some(id),
                    Err(e) => {
                        debug!("Skipping frame {} ({}): {}", info.id, info.url, e);
                        continue;
                    }
                }
            };
            frames.push(Frame {
                id: info.id,
                url: info.url,
                context,
            });
        }

        Ok(frames)
    }

    async fn read_text(&self, frame: &Frame, locator: &Locator) -> Result<String> {
        let value = self.run(frame, READ_TEXT, Some(locator), Value::Null).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn read_all(&self, frame: &Frame, css: &str) -> Result<Vec<String>> {
        let value = self.run(frame, READ_ALL, None, json!(css)).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn fill(&self, frame: &Frame, locator: &Locator, value: &str) -> Result<()> {
        self.expect_ok(frame, FILL, locator, json!(value)).await
    }

    async fn press_enter(&self, frame: &Frame, locator: &Locator) -> Result<()> {
        self.expect_ok(frame, FOCUS, locator, Value::Null).await?;
        self.page.press_key("Enter").await?;
        Ok(())
    }

    async fn click(&self, frame: &Frame, locator: &Locator, force: bool) -> Result<()> {
        self.expect_ok(frame, CLICK, locator, json!(force)).await
    }

    async fn is_visible(&self, frame: &Frame, locator: &Locator) -> Result<bool> {
        let value = self.run(frame, IS_VISIBLE, Some(locator), Value::Null).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn wait_visible(
        &self,
        frame: &Frame,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<bool> {
        let start = Instant::now();
        loop {
            if self.is_visible(frame, locator).await? {
                return Ok(true);
            }
            if start.elapsed() >= timeout {
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn close(&self) -> Result<()> {
        self.client.close_page(self.page.target_id()).await?;
        debug!("Closed tab {}", self.page.target_id());
        Ok(())
    }
}
