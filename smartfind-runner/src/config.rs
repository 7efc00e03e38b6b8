//! Agent configuration
//!
//! Every knob is read once at startup into an immutable [`Config`] that is
//! handed to the poller. Values come from the process environment; `main`
//! loads an optional `.env` file into it first.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use smartfind_client::{DEFAULT_PUSHOVER_URL, PushoverClient};
use smartfind_core::blackout::parse_date_list;
use smartfind_core::policy::EligibilityPolicy;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::portal::PortalSelectors;

/// Default login page of the portal
pub const DEFAULT_PORTAL_URL: &str =
    "https://westcontracosta.eschoolsolutions.com/logOnInitAction.do";

/// Default Chrome remote-debugging endpoint
pub const DEFAULT_CDP_ENDPOINT: &str = "http://localhost:9222";

/// A string that never shows up in logs
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Where and how to log in
#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub login_url: String,
    pub username: String,
    pub password: Secret,
    pub cdp_endpoint: String,
    /// Pause after switching tabs so the table can render
    pub settle: Duration,
    /// Time box for one login attempt in one rendering context
    pub login_timeout: Duration,
    /// How long to wait for a tab link to appear
    pub tab_timeout: Duration,
    pub selectors: PortalSelectors,
}

/// Pushover credentials
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    pub api_url: String,
    pub user: String,
    pub token: Secret,
    /// Upper bound for one delivery request
    pub timeout: Duration,
}

/// Manual blackout sources
#[derive(Debug, Clone, Default)]
pub struct BlackoutConfig {
    pub dates: Vec<NaiveDate>,
    /// Raw `(start, end)` text; checked when dates are resolved
    pub vacation: Option<(String, String)>,
}

/// Bounds of the claim protocol
#[derive(Debug, Clone)]
pub struct ClaimSettings {
    pub max_attempts: u32,
    pub confirm_timeout: Duration,
    /// Pause after confirming before looking for the blocked banner
    pub settle: Duration,
}

impl Default for ClaimSettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            confirm_timeout: Duration::from_millis(3000),
            settle: Duration::from_millis(1500),
        }
    }
}

/// Agent configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub portal: PortalConfig,
    pub notify: NotifyConfig,
    pub policy: EligibilityPolicy,
    pub blackout: BlackoutConfig,
    pub claim: ClaimSettings,

    /// Pause between scan cycles
    pub poll_interval: Duration,

    /// Consecutive login failures before a critical alert
    pub login_alert_threshold: u32,

    /// Earliest hour of the day for the daily heartbeat
    pub heartbeat_hour: u32,
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// See [`Config::from_lookup`] for the variable list.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    /// Creates configuration from a key lookup
    ///
    /// Required: SF_USERNAME, SF_PASSWORD, PUSHOVER_USER, PUSHOVER_TOKEN.
    /// Everything else falls back to a default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let portal = PortalConfig::from_lookup(&lookup)?;
        let notify = NotifyConfig::from_lookup(&lookup)?;

        let schools = lookup("AUTO_ACCEPT_SCHOOLS").unwrap_or_default();
        let policy = EligibilityPolicy {
            auto_claim: parse_bool(&lookup, "AUTO_ACCEPT", false)?,
            start_hour: parse_or(&lookup, "AUTO_ACCEPT_START_HOUR", 6)?,
            end_hour: parse_or(&lookup, "AUTO_ACCEPT_END_HOUR", 22)?,
            prep_cutoff_hour: parse_or(&lookup, "AUTO_ACCEPT_PREP_CUTOFF", 15)?,
            schools: Vec::new(),
            min_claim_hours: parse_or(&lookup, "AUTO_ACCEPT_MIN_HOURS", 6.0)?,
            min_notify_hours: parse_or(&lookup, "NOTIFY_MIN_HOURS", 0.0)?,
        }
        .with_schools(schools.split(','));

        let dates = parse_date_list(&lookup("BLACKOUT_DATES").unwrap_or_default())
            .context("BLACKOUT_DATES must be a comma-separated list of MM/DD/YYYY dates")?;
        let vacation = match (lookup("VACATION_START"), lookup("VACATION_END")) {
            (None, None) => None,
            (start, end) => Some((start.unwrap_or_default(), end.unwrap_or_default())),
        };

        let claim = ClaimSettings {
            max_attempts: parse_or(&lookup, "MAX_CLAIM_ATTEMPTS", 5)?,
            confirm_timeout: Duration::from_millis(parse_or(&lookup, "CONFIRM_TIMEOUT_MS", 3000)?),
            settle: Duration::from_millis(parse_or(&lookup, "CLAIM_SETTLE_MS", 1500)?),
        };

        Ok(Self {
            portal,
            notify,
            policy,
            blackout: BlackoutConfig { dates, vacation },
            claim,
            poll_interval: Duration::from_secs(parse_or(&lookup, "POLL_INTERVAL", 60)?),
            login_alert_threshold: parse_or(&lookup, "LOGIN_ALERT_THRESHOLD", 3)?,
            heartbeat_hour: parse_or(&lookup, "HEARTBEAT_HOUR", 7)?,
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        self.portal.validate()?;
        self.notify.validate()?;

        let policy = &self.policy;
        if policy.start_hour >= policy.end_hour || policy.end_hour > 24 {
            anyhow::bail!(
                "auto-accept window {}-{} is not a valid hour range",
                policy.start_hour,
                policy.end_hour
            );
        }

        if policy.prep_cutoff_hour > 23 {
            anyhow::bail!("AUTO_ACCEPT_PREP_CUTOFF must be an hour between 0 and 23");
        }

        if !policy.min_claim_hours.is_finite() || !policy.min_notify_hours.is_finite() {
            anyhow::bail!("minimum durations must be finite numbers");
        }

        if policy.auto_claim && policy.schools.is_empty() {
            anyhow::bail!("AUTO_ACCEPT is on but AUTO_ACCEPT_SCHOOLS is empty");
        }

        if self.claim.max_attempts == 0 {
            anyhow::bail!("MAX_CLAIM_ATTEMPTS must be greater than 0");
        }

        if self.poll_interval.as_secs() == 0 {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.login_alert_threshold == 0 {
            anyhow::bail!("LOGIN_ALERT_THRESHOLD must be greater than 0");
        }

        if self.heartbeat_hour > 23 {
            anyhow::bail!("HEARTBEAT_HOUR must be an hour between 0 and 23");
        }

        Ok(())
    }
}

impl PortalConfig {
    /// Reads portal settings including login credentials
    fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut portal = Self::browser_only(lookup)?;
        portal.username = required(lookup, "SF_USERNAME")?;
        portal.password = Secret::new(required(lookup, "SF_PASSWORD")?);
        Ok(portal)
    }

    /// Reads only what is needed to open the login page
    pub fn browser_only<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            login_url: lookup("SF_PORTAL_URL").unwrap_or_else(|| DEFAULT_PORTAL_URL.to_string()),
            username: String::new(),
            password: Secret::new(""),
            cdp_endpoint: lookup("CDP_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_CDP_ENDPOINT.to_string()),
            settle: Duration::from_secs(parse_or(lookup, "LIST_SETTLE_SECS", 5)?),
            login_timeout: Duration::from_secs(parse_or(lookup, "LOGIN_TIMEOUT", 10)?),
            tab_timeout: Duration::from_secs(15),
            selectors: PortalSelectors::default(),
        })
    }

    fn validate(&self) -> Result<()> {
        if self.username.is_empty() || self.password.expose().is_empty() {
            anyhow::bail!("portal credentials cannot be empty");
        }
        ensure_http("SF_PORTAL_URL", &self.login_url)?;
        ensure_http("CDP_ENDPOINT", &self.cdp_endpoint)?;
        if self.login_timeout.is_zero() {
            anyhow::bail!("LOGIN_TIMEOUT must be greater than 0");
        }
        Ok(())
    }
}

impl NotifyConfig {
    pub fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            api_url: lookup("PUSHOVER_URL").unwrap_or_else(|| DEFAULT_PUSHOVER_URL.to_string()),
            user: required(lookup, "PUSHOVER_USER")?,
            token: Secret::new(required(lookup, "PUSHOVER_TOKEN")?),
            timeout: Duration::from_secs(parse_or(lookup, "PUSHOVER_TIMEOUT_SECS", 10)?),
        })
    }

    fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            anyhow::bail!("PUSHOVER_TIMEOUT_SECS must be greater than 0");
        }
        ensure_http("PUSHOVER_URL", &self.api_url)
    }

    /// Pushover client bounded by the configured request timeout
    pub fn client(&self) -> Result<PushoverClient> {
        PushoverClient::with_base_url(&self.api_url, self.token.expose(), &self.user)
            .with_timeout(self.timeout)
            .context("Failed to build Pushover client")
    }
}

/// Reads a variable from the process environment
pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .with_context(|| format!("{} environment variable not set", key))
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {}", key, raw)),
        None => Ok(default),
    }
}

fn parse_bool<F>(lookup: &F, key: &str, default: bool) -> Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.trim().to_lowercase()) {
        None => Ok(default),
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
        Some(v) => anyhow::bail!("{} must be true or false, got {}", key, v),
    }
}

fn ensure_http(key: &str, url: &str) -> Result<()> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://", key);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("SF_USERNAME", "123456"),
        ("SF_PASSWORD", "9999"),
        ("PUSHOVER_USER", "user-key"),
        ("PUSHOVER_TOKEN", "app-token"),
    ];

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(REQUIRED)).unwrap();
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(config.portal.login_url, DEFAULT_PORTAL_URL);
        assert_eq!(config.notify.api_url, DEFAULT_PUSHOVER_URL);
        assert_eq!(config.notify.timeout, Duration::from_secs(10));
        assert!(!config.policy.auto_claim);
        assert_eq!(config.policy.prep_cutoff_hour, 15);
        assert_eq!(config.claim.max_attempts, 5);
        assert!(config.blackout.vacation.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_policy_knobs() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("AUTO_ACCEPT", "yes"),
            ("AUTO_ACCEPT_SCHOOLS", "El Cerrito High, Kennedy High ,"),
            ("AUTO_ACCEPT_MIN_HOURS", "6.5"),
            ("BLACKOUT_DATES", "03/10/2026,03/11/2026"),
            ("VACATION_START", "04/01/2026"),
            ("MAX_CLAIM_ATTEMPTS", "8"),
        ]);
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();

        assert!(config.policy.auto_claim);
        assert_eq!(config.policy.schools, vec!["EL CERRITO HIGH", "KENNEDY HIGH"]);
        assert_eq!(config.policy.min_claim_hours, 6.5);
        assert_eq!(config.blackout.dates.len(), 2);
        assert_eq!(
            config.blackout.vacation,
            Some(("04/01/2026".to_string(), String::new()))
        );
        assert_eq!(config.claim.max_attempts, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_credentials_fail() {
        let err = Config::from_lookup(lookup_from(&REQUIRED[1..])).unwrap_err();
        assert!(err.to_string().contains("SF_USERNAME"));
    }

    #[test]
    fn test_bad_values_fail() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("BLACKOUT_DATES", "next tuesday"));
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("POLL_INTERVAL", "soon"));
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());
    }

    #[test]
    fn test_validation() {
        let mut config = Config::from_lookup(lookup_from(REQUIRED)).unwrap();
        assert!(config.validate().is_ok());

        config.policy.start_hour = 22;
        config.policy.end_hour = 6;
        assert!(config.validate().is_err());
        config.policy.start_hour = 6;
        config.policy.end_hour = 22;

        config.policy.auto_claim = true;
        assert!(config.validate().is_err());
        config.policy = config.policy.clone().with_schools(["Kennedy High"]);
        assert!(config.validate().is_ok());

        config.notify.timeout = Duration::ZERO;
        assert!(config.validate().is_err());
        config.notify.timeout = Duration::from_secs(10);

        config.portal.cdp_endpoint = "localhost:9222".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_secret_is_redacted() {
        let config = Config::from_lookup(lookup_from(REQUIRED)).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("9999"));
        assert!(!debug.contains("app-token"));
    }
}
