//! Pushover notification API

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{ClientError, Result};

/// Public Pushover endpoint
pub const DEFAULT_PUSHOVER_URL: &str = "https://api.pushover.net";

/// HTTP client for the Pushover message API
#[derive(Debug, Clone)]
pub struct PushoverClient {
    /// Base URL of the API (e.g., "https://api.pushover.net")
    base_url: String,
    /// Application token
    token: String,
    /// Recipient user key
    user: String,
    /// HTTP client instance
    client: Client,
}

/// Form body of a message request
#[derive(Debug, Serialize)]
struct MessageForm<'a> {
    token: &'a str,
    user: &'a str,
    message: &'a str,
    title: &'a str,
}

/// Delivery receipt returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Delivery {
    /// `1` when the message was accepted
    pub status: i32,
    /// Request identifier assigned by the API
    pub request: String,
}

impl PushoverClient {
    /// Create a client against the public API
    pub fn new(token: impl Into<String>, user: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_PUSHOVER_URL, token, user)
    }

    /// Create a client against a custom base URL
    pub fn with_base_url(
        base_url: impl Into<String>,
        token: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            user: user.into(),
            client: Client::new(),
        }
    }

    /// Replace the underlying HTTP client (timeouts, proxies, TLS)
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Bound every request, connection included, by `timeout`
    pub fn with_timeout(self, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(self.with_client(client))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one message
    ///
    /// # Arguments
    /// * `message` - Message body
    /// * `title` - Title shown above the message
    ///
    /// # Returns
    /// The delivery receipt, or the API status and body on rejection
    pub async fn send(&self, message: &str, title: &str) -> Result<Delivery> {
        if self.token.is_empty() {
            return Err(ClientError::MissingCredential("token"));
        }
        if self.user.is_empty() {
            return Err(ClientError::MissingCredential("user"));
        }

        let url = format!("{}/1/messages.json", self.base_url);
        let form = MessageForm {
            token: &self.token,
            user: &self.user,
            message,
            title,
        };

        let response = self.client.post(&url).form(&form).send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        let delivery: Delivery = response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))?;

        debug!("Pushover accepted request {}", delivery.request);
        Ok(delivery)
    }
}
