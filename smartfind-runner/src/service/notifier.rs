//! Notifier adapter
//!
//! Formats agent outcomes and pushes them to the user's phone. Delivery is
//! best effort: a failed push is logged and otherwise ignored, so it can
//! never change the course of a scan cycle.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use smartfind_client::PushoverClient;
use tracing::{info, warn};

use crate::config::NotifyConfig;

/// Title used when an alert has no more specific one
pub const DEFAULT_TITLE: &str = "SmartFind Bot";

/// Something the user should hear about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    Online,
    /// Consecutive failed logins that tripped the alarm
    LoginFailures(u32),
    Heartbeat(NaiveDate),
    /// Summaries of listings seen for the first time this cycle
    NewListings(Vec<String>),
    Secured(String),
    ClaimLost(String),
}

impl Alert {
    pub fn title(&self) -> &'static str {
        match self {
            Self::LoginFailures(_) => "SmartFind Bot: Login Failing",
            Self::Secured(_) => "SmartFind Bot: Job Secured",
            Self::ClaimLost(_) => "SmartFind Bot: Job Lost",
            _ => DEFAULT_TITLE,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Online => "✅ Bot Online: watching for new jobs.".to_string(),
            Self::LoginFailures(count) => format!(
                "⛔ Login failed {} times in a row. Check the portal credentials.",
                count
            ),
            Self::Heartbeat(date) => {
                format!("💓 Still running ({}).", date.format("%m/%d/%Y"))
            }
            Self::NewListings(summaries) => {
                let mut message = format!("🚨 {} new job(s) on SmartFind:", summaries.len());
                for summary in summaries {
                    message.push_str("\n• ");
                    message.push_str(summary);
                }
                message
            }
            Self::Secured(summary) => format!("🎉 Claimed: {}", summary),
            Self::ClaimLost(summary) => format!("❌ Someone else got it: {}", summary),
        }
    }
}

/// Fire-and-forget notification sink
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers one message; failures are absorbed
    async fn notify(&self, message: &str, title: &str);

    async fn alert(&self, alert: &Alert) {
        self.notify(&alert.message(), alert.title()).await;
    }
}

/// Pushover-backed notifier
pub struct PushoverNotifier {
    client: PushoverClient,
}

impl PushoverNotifier {
    pub fn new(config: &NotifyConfig) -> Result<Self> {
        Ok(Self {
            client: config.client()?,
        })
    }
}

#[async_trait]
impl Notifier for PushoverNotifier {
    async fn notify(&self, message: &str, title: &str) {
        match self.client.send(message, title).await {
            Ok(delivery) => info!("Push sent ({}): {}", delivery.request, message),
            Err(e) if e.is_client_error() => warn!(
                "Pushover rejected the notification, check PUSHOVER_USER/PUSHOVER_TOKEN: {}",
                e
            ),
            Err(e) if e.is_server_error() => warn!("Pushover unavailable, message dropped: {}", e),
            Err(e) => warn!("Failed to send push notification: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Secret;
    use std::time::Duration;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(url: String) -> NotifyConfig {
        NotifyConfig {
            api_url: url,
            user: "usr".to_string(),
            token: Secret::new("tok"),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_new_listings_message_lists_every_summary() {
        let alert = Alert::NewListings(vec![
            "03/10/2026 | Kennedy High | 8:00 AM - 3:30 PM".to_string(),
            "03/11/2026 | Hercules Middle".to_string(),
        ]);
        let message = alert.message();
        assert!(message.contains("2 new job(s)"));
        assert!(message.contains("Kennedy High"));
        assert!(message.contains("Hercules Middle"));
        assert_eq!(alert.title(), DEFAULT_TITLE);
    }

    #[test]
    fn test_outcome_titles_differ() {
        assert_ne!(
            Alert::Secured("x".into()).title(),
            Alert::ClaimLost("x".into()).title()
        );
        assert!(Alert::LoginFailures(3).message().contains('3'));
    }

    #[tokio::test]
    async fn test_alert_posts_to_pushover() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1/messages.json"))
            .and(body_string_contains("title=SmartFind+Bot"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"status": 1, "request": "r-1"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let notifier = PushoverNotifier::new(&config(server.uri())).unwrap();
        notifier.alert(&Alert::Online).await;
    }

    #[tokio::test]
    async fn test_delivery_failure_is_swallowed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("down"))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = PushoverNotifier::new(&config(server.uri())).unwrap();
        notifier.notify("hello", DEFAULT_TITLE).await;
    }

    #[tokio::test]
    async fn test_stalled_delivery_does_not_block() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"status": 1, "request": "r-2"}))
                    .set_delay(Duration::from_secs(60)),
            )
            .mount(&server)
            .await;

        let mut slow = config(server.uri());
        slow.timeout = Duration::from_millis(200);
        let notifier = PushoverNotifier::new(&slow).unwrap();

        tokio::time::timeout(Duration::from_secs(5), notifier.alert(&Alert::Online))
            .await
            .expect("notify must return once the request times out");
    }
}
