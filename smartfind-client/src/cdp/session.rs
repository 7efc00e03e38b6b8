//! Page session: commands scoped to one attached tab.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{Value, json};
use tracing::debug;

use super::client::Transport;
use super::error::CdpError;
use super::protocol::{FrameInfo, FrameTree};

/// How long to wait for `document.readyState` after navigating.
const LOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// A session attached to a single page/target.
pub struct PageSession {
    target_id: String,
    session_id: String,
    transport: Arc<Transport>,
}

impl PageSession {
    pub(crate) fn new(target_id: String, session_id: String, transport: Arc<Transport>) -> Self {
        Self {
            target_id,
            session_id,
            transport,
        }
    }

    /// Get target ID.
    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// Send a CDP command to this page session.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.transport
            .call(method, params, Some(&self.session_id))
            .await
    }

    /// Enable required CDP domains.
    pub(crate) async fn enable_domains(&self) -> Result<(), CdpError> {
        self.call("Page.enable", None).await?;
        self.call("Runtime.enable", None).await?;

        debug!("Enabled CDP domains for session {}", self.session_id);
        Ok(())
    }

    /// Navigate to URL and wait for the document to load.
    pub async fn navigate(&self, url: &str) -> Result<(), CdpError> {
        let result = self
            .call("Page.navigate", Some(json!({"url": url})))
            .await?;

        if let Some(error) = result.get("errorText") {
            return Err(CdpError::NavigationFailed(
                error.as_str().unwrap_or("Unknown error").to_string(),
            ));
        }

        self.wait_for_load().await?;
        debug!("Navigated to {}", url);
        Ok(())
    }

    /// Wait until the main document is at least interactive.
    pub async fn wait_for_load(&self) -> Result<(), CdpError> {
        let start = Instant::now();

        loop {
            // The context can be torn down mid-navigation; keep polling.
            if let Ok(result) = self.evaluate("document.readyState", None).await {
                if matches!(result.as_str(), Some("complete" | "interactive")) {
                    return Ok(());
                }
            }

            if start.elapsed() > LOAD_TIMEOUT {
                return Err(CdpError::Timeout("Page load timeout".to_string()));
            }

            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    /// Evaluate a JavaScript expression and return its JSON value.
    ///
    /// `context_id` selects a frame's execution context; `None` runs in the
    /// main frame.
    pub async fn evaluate(
        &self,
        expression: &str,
        context_id: Option<i64>,
    ) -> Result<Value, CdpError> {
        let mut params = json!({
            "expression": expression,
            "returnByValue": true,
            "awaitPromise": true,
        });

        if let Some(id) = context_id {
            params["contextId"] = json!(id);
        }

        let result = self.call("Runtime.evaluate", Some(params)).await?;

        if let Some(exception) = result.get("exceptionDetails") {
            let text = exception["exception"]["description"]
                .as_str()
                .or_else(|| exception["text"].as_str())
                .unwrap_or("Unknown error");
            return Err(CdpError::JavaScript(text.to_string()));
        }

        Ok(result["result"]["value"].clone())
    }

    /// All frames of the page, main frame first.
    pub async fn frames(&self) -> Result<Vec<FrameInfo>, CdpError> {
        let result = self.call("Page.getFrameTree", None).await?;
        let tree: FrameTree = serde_json::from_value(result["frameTree"].clone())?;
        Ok(tree.flatten())
    }

    /// Create an isolated execution context inside a frame.
    ///
    /// The context sees the frame's DOM, including cross-origin frames that
    /// page scripts cannot reach.
    pub async fn frame_context(&self, frame_id: &str) -> Result<i64, CdpError> {
        let result = self
            .call(
                "Page.createIsolatedWorld",
                Some(json!({
                    "frameId": frame_id,
                    "worldName": "smartfind",
                    "grantUniveralAccess": true,
                })),
            )
            .await?;

        result["executionContextId"]
            .as_i64()
            .ok_or_else(|| CdpError::InvalidResponse("Missing executionContextId".to_string()))
    }

    /// Press and release a named key (e.g. "Enter") on the focused element.
    pub async fn press_key(&self, key: &str) -> Result<(), CdpError> {
        let (code, key_code, text) = match key {
            "Enter" => ("Enter", 13, "\r"),
            "Tab" => ("Tab", 9, ""),
            "Escape" => ("Escape", 27, ""),
            other => (other, 0, ""),
        };

        for event_type in ["keyDown", "keyUp"] {
            let mut params = json!({
                "type": event_type,
                "key": key,
                "code": code,
                "windowsVirtualKeyCode": key_code,
                "nativeVirtualKeyCode": key_code,
            });
            if event_type == "keyDown" && !text.is_empty() {
                params["text"] = json!(text);
            }
            self.call("Input.dispatchKeyEvent", Some(params)).await?;
        }

        debug!("Pressed key {}", key);
        Ok(())
    }
}
