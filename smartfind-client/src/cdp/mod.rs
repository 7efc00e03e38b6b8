//! Chrome DevTools Protocol (CDP) client.
//!
//! A small CDP client that drives one browser tab: navigation, script
//! evaluation inside any frame, and key presses. It talks JSON-RPC over
//! the browser's WebSocket debugging endpoint.
//!
//! ## Usage
//!
//! 1. Start Chrome with remote debugging:
//!    ```bash
//!    chrome --headless=new --remote-debugging-port=9222
//!    ```
//!
//! 2. Connect and automate:
//!    ```rust,ignore
//!    let client = CdpClient::connect("http://localhost:9222").await?;
//!    let page = client.new_page().await?;
//!    page.navigate("https://example.com").await?;
//!    let title = page.evaluate("document.title", None).await?;
//!    ```

mod client;
mod error;
mod protocol;
mod session;

pub use client::CdpClient;
pub use error::CdpError;
pub use protocol::*;
pub use session::PageSession;
