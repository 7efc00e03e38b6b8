//! CDP WebSocket client.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, trace, warn};

use super::error::CdpError;
use super::protocol::{BrowserVersion, CdpRequest, CdpResponse, PageInfo};
use super::session::PageSession;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;
type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value, CdpError>>>>>;

/// How long a single CDP command may take.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Default bound for endpoint discovery and the WebSocket handshake.
const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Request/response plumbing shared by the client and its page sessions.
pub(crate) struct Transport {
    ws_tx: tokio::sync::Mutex<WsSink>,
    request_id: AtomicU64,
    pending: Pending,
}

impl Transport {
    /// Send a CDP command and wait for its response.
    pub(crate) async fn call(
        &self,
        method: &str,
        params: Option<Value>,
        session_id: Option<&str>,
    ) -> Result<Value, CdpError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);

        let request = CdpRequest {
            id,
            method: method.to_string(),
            params,
            session_id: session_id.map(|s| s.to_string()),
        };

        let json = serde_json::to_string(&request)?;
        trace!("CDP send: {}", json);

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        {
            let mut ws = self.ws_tx.lock().await;
            if let Err(e) = ws.send(Message::Text(json.into())).await {
                self.pending.lock().remove(&id);
                return Err(e.into());
            }
        }

        match tokio::time::timeout(COMMAND_TIMEOUT, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CdpError::SessionClosed),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(CdpError::Timeout(format!("Request {} timed out", method)))
            }
        }
    }
}

/// CDP client for browser automation.
///
/// Holds the browser-level WebSocket. Pages are opened with
/// [`CdpClient::new_page`] and share the same connection.
pub struct CdpClient {
    /// HTTP endpoint for page discovery.
    http_endpoint: String,
    /// Client for the discovery endpoints, bounded by a request timeout.
    http: reqwest::Client,
    transport: Arc<Transport>,
    /// Background task handle.
    recv_task: tokio::task::JoinHandle<()>,
}

impl CdpClient {
    /// Connect to Chrome at the given endpoint.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Chrome debugging endpoint (e.g., "http://localhost:9222")
    pub async fn connect(endpoint: &str) -> Result<Self, CdpError> {
        Self::connect_with_timeout(endpoint, DISCOVERY_TIMEOUT).await
    }

    /// Connect to Chrome, giving up on any discovery step slower than `timeout`.
    pub async fn connect_with_timeout(endpoint: &str, timeout: Duration) -> Result<Self, CdpError> {
        let http_endpoint = endpoint.trim_end_matches('/').to_string();
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        let version_url = format!("{}/json/version", http_endpoint);
        debug!("Fetching browser version from {}", version_url);

        let version: BrowserVersion = http
            .get(&version_url)
            .send()
            .await
            .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", endpoint, e)))?
            .json()
            .await
            .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", endpoint, e)))?;

        debug!("Connected to browser: {}", version.browser);

        let handshake = tokio_tungstenite::connect_async(&version.web_socket_debugger_url);
        let (ws_stream, _) = tokio::time::timeout(timeout, handshake)
            .await
            .map_err(|_| CdpError::Timeout("WebSocket handshake".to_string()))?
            .map_err(|e| CdpError::ConnectionFailed(format!("WebSocket: {}", e)))?;

        let (ws_sink, ws_source) = ws_stream.split();
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));

        let recv_task = {
            let pending = pending.clone();
            tokio::spawn(async move {
                Self::receive_loop(ws_source, pending).await;
            })
        };

        Ok(Self {
            http_endpoint,
            http,
            transport: Arc::new(Transport {
                ws_tx: tokio::sync::Mutex::new(ws_sink),
                request_id: AtomicU64::new(1),
                pending,
            }),
            recv_task,
        })
    }

    /// WebSocket receive loop.
    ///
    /// Routes responses to their waiting callers. Events are not consumed.
    async fn receive_loop(mut ws_source: WsSource, pending: Pending) {
        while let Some(msg) = ws_source.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    trace!("CDP recv: {}", text);
                    let resp = match serde_json::from_str::<CdpResponse>(&text) {
                        Ok(resp) => resp,
                        Err(e) => {
                            warn!("Failed to parse CDP message: {}", e);
                            continue;
                        }
                    };

                    let Some(id) = resp.id else {
                        continue;
                    };

                    let waiter = pending.lock().remove(&id);
                    if let Some(tx) = waiter {
                        let result = match resp.error {
                            Some(error) => Err(CdpError::Protocol {
                                code: error.code,
                                message: error.message,
                            }),
                            None => Ok(resp.result.unwrap_or(Value::Null)),
                        };
                        let _ = tx.send(result);
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!("WebSocket closed");
                    break;
                }
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }

        // Wake everyone still waiting; their senders drop here.
        pending.lock().clear();
    }

    /// Send a browser-level CDP command.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.transport.call(method, params, None).await
    }

    /// Create a new blank tab and attach to it.
    pub async fn new_page(&self) -> Result<PageSession, CdpError> {
        // Chrome requires PUT for /json/new
        let create_url = format!("{}/json/new", self.http_endpoint);
        let page_info: PageInfo = self
            .http
            .put(&create_url)
            .send()
            .await?
            .json()
            .await?;
        debug!("Created new page: {} - {}", page_info.id, page_info.url);

        let result = self
            .call(
                "Target.attachToTarget",
                Some(json!({
                    "targetId": page_info.id,
                    "flatten": true
                })),
            )
            .await?;

        let session_id = result["sessionId"]
            .as_str()
            .ok_or_else(|| CdpError::InvalidResponse("Missing sessionId".to_string()))?
            .to_string();

        let session = PageSession::new(page_info.id, session_id, self.transport.clone());
        session.enable_domains().await?;

        Ok(session)
    }

    /// Close a page/target.
    pub async fn close_page(&self, target_id: &str) -> Result<(), CdpError> {
        self.call(
            "Target.closeTarget",
            Some(json!({"targetId": target_id})),
        )
        .await?;
        Ok(())
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self.recv_task.abort();
    }
}
