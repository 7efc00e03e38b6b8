//! SmartFind Clients
//!
//! Outbound clients used by the SmartFind agent:
//! - [`PushoverClient`]: push notifications over the Pushover HTTP API
//! - [`cdp`]: a Chrome DevTools Protocol client that drives the portal page
//!
//! # Example
//!
//! ```no_run
//! use smartfind_client::PushoverClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), smartfind_client::ClientError> {
//!     let client = PushoverClient::new("app-token", "user-key");
//!     let delivery = client.send("Bot online", "SmartFind Bot").await?;
//!     println!("Delivered: {}", delivery.request);
//!     Ok(())
//! }
//! ```

pub mod cdp;
pub mod error;
mod pushover;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use pushover::{DEFAULT_PUSHOVER_URL, Delivery, PushoverClient};
