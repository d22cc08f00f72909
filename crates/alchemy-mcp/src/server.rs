//! MCP server loop
//!
//! Reads one frame at a time, routes it as a request or notification, writes
//! the reply and repeats. On end of input or Ctrl-C every live subscription is
//! cancelled before returning.

use std::future::Future;
use std::io;
use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncWrite};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::backend::Backend;
use crate::dispatcher::Dispatcher;
use crate::handlers::{handle_notification, handle_request, McpServerState};
use crate::protocol::{
    JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, RequestId,
};
use crate::subscriptions::{log_events, EventObserver, SubscriptionRegistry};
use crate::transport::stdio::AsyncStdioTransport;

pub struct McpServer {
    state: Arc<RwLock<McpServerState>>,
    dispatcher: Arc<Dispatcher>,
}

impl McpServer {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            state: Arc::new(RwLock::new(McpServerState::new(dispatcher.clone()))),
            dispatcher,
        }
    }

    /// Wire a backend to a fresh registry and spawn the event logger.
    /// Must be called inside a tokio runtime.
    pub fn from_backend(backend: Arc<dyn Backend>, event_buffer: usize) -> Self {
        let (observer, events) = EventObserver::channel(event_buffer);
        tokio::spawn(log_events(events));

        let dispatcher = Dispatcher::new(backend, SubscriptionRegistry::new(), observer);
        Self::new(Arc::new(dispatcher))
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Route one raw frame. Returns the reply to write, if any.
    pub async fn handle_message(&self, message: &str) -> Option<JsonRpcResponse> {
        let json: Value = match serde_json::from_str(message) {
            Ok(v) => v,
            Err(e) => {
                warn!("Failed to parse JSON: {}", e);
                return Some(JsonRpcResponse::error(
                    RequestId::Null,
                    JsonRpcError::parse_error(),
                ));
            }
        };

        let has_id = json.get("id").is_some();
        let has_method = json.get("method").is_some();

        if has_id && has_method {
            let id = json
                .get("id")
                .cloned()
                .and_then(|id| serde_json::from_value(id).ok())
                .unwrap_or(RequestId::Null);

            let request: JsonRpcRequest = match serde_json::from_value(json) {
                Ok(r) => r,
                Err(e) => {
                    warn!("Failed to parse request: {}", e);
                    return Some(JsonRpcResponse::error(
                        id,
                        JsonRpcError::invalid_request(e.to_string()),
                    ));
                }
            };

            let mut state = self.state.write().await;
            Some(handle_request(&mut state, &request).await)
        } else if has_method {
            match serde_json::from_value::<JsonRpcNotification>(json) {
                Ok(notification) => {
                    let mut state = self.state.write().await;
                    handle_notification(&mut state, &notification).await;
                }
                Err(e) => warn!("Failed to parse notification: {}", e),
            }
            None
        } else if has_id && (json.get("result").is_some() || json.get("error").is_some()) {
            debug!("Ignoring response from client");
            None
        } else {
            warn!("Unknown message type: {}", json);
            Some(JsonRpcResponse::error(
                RequestId::Null,
                JsonRpcError::invalid_request("Not a JSON-RPC request or notification"),
            ))
        }
    }

    /// Serve MCP over the process's stdin/stdout
    pub async fn run_stdio(&self) -> io::Result<()> {
        info!("Starting Alchemy MCP server (stdio transport)");
        self.serve(AsyncStdioTransport::new()).await
    }

    /// Serve until end of input or Ctrl-C, then tear down subscriptions
    pub async fn serve<R, W>(&self, transport: AsyncStdioTransport<R, W>) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        self.serve_until(transport, interrupted()).await
    }

    /// Serve until end of input or until `shutdown` resolves. A request still
    /// in flight when `shutdown` fires is abandoned without a reply.
    pub async fn serve_until<R, W, F>(
        &self,
        mut transport: AsyncStdioTransport<R, W>,
        shutdown: F,
    ) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let message = tokio::select! {
                read = transport.read_message() => match read {
                    Ok(Some(msg)) => msg,
                    Ok(None) => {
                        info!("EOF received, shutting down");
                        break;
                    }
                    Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                        warn!("Unreadable frame: {}", e);
                        let response =
                            JsonRpcResponse::error(RequestId::Null, JsonRpcError::parse_error());
                        if let Err(e) = transport.write_response(&response).await {
                            error!("Failed to write response: {}", e);
                        }
                        continue;
                    }
                    Err(e) => {
                        error!("Error reading message: {}", e);
                        break;
                    }
                },
                _ = &mut shutdown => {
                    info!("Interrupt received, shutting down");
                    break;
                }
            };

            let reply = tokio::select! {
                reply = self.handle_message(&message) => reply,
                _ = &mut shutdown => {
                    info!("Interrupt received, abandoning in-flight request");
                    break;
                }
            };

            if let Some(response) = reply {
                if let Err(e) = transport.write_response(&response).await {
                    error!("Failed to write response: {}", e);
                }
            }
        }

        let failures = self.dispatcher.shutdown().await;
        if failures > 0 {
            warn!("{} subscription(s) failed to cancel cleanly", failures);
        }

        info!("Alchemy MCP server stopped");
        Ok(())
    }
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
