//! MCP request handlers

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::dispatcher::Dispatcher;
use crate::protocol::*;

/// MCP session state
pub struct McpServerState {
    /// Protocol version requested by the client
    pub protocol_version: Option<String>,

    /// Set by `notifications/initialized`
    pub initialized: bool,

    pub client_capabilities: Option<ClientCapabilities>,

    pub client_info: Option<ClientInfo>,

    pub dispatcher: Arc<Dispatcher>,
}

impl McpServerState {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            protocol_version: None,
            initialized: false,
            client_capabilities: None,
            client_info: None,
            dispatcher,
        }
    }
}

/// Handle an incoming JSON-RPC request
pub async fn handle_request(
    state: &mut McpServerState,
    request: &JsonRpcRequest,
) -> JsonRpcResponse {
    debug!("Handling request: {} (id: {})", request.method, request.id);

    if request.jsonrpc != JSONRPC_VERSION {
        return JsonRpcResponse::error(
            request.id.clone(),
            JsonRpcError::invalid_request(format!(
                "Unsupported jsonrpc version: {}",
                request.jsonrpc
            )),
        );
    }

    if !state.initialized && request.method != "initialize" && request.method != "ping" {
        return JsonRpcResponse::error(request.id.clone(), JsonRpcError::server_not_initialized());
    }

    let result = match request.method.as_str() {
        // Lifecycle
        "initialize" => handle_initialize(state, request).await,
        "ping" => handle_ping().await,

        // Tools
        "tools/list" => handle_tools_list(state, request).await,
        "tools/call" => handle_tools_call(state, request).await,

        _ => Err(JsonRpcError::method_not_found(&request.method)),
    };

    match result {
        Ok(value) => JsonRpcResponse::success(request.id.clone(), value),
        Err(error) => JsonRpcResponse::error(request.id.clone(), error),
    }
}

/// Handle an incoming notification. Notifications never get a reply.
pub async fn handle_notification(state: &mut McpServerState, notification: &JsonRpcNotification) {
    debug!("Handling notification: {}", notification.method);

    match notification.method.as_str() {
        "notifications/initialized" => {
            info!("Client sent initialized notification");
            state.initialized = true;
        }
        "notifications/cancelled" => {
            // Requests are served one at a time, so by now it has already completed
            match notification
                .params
                .clone()
                .map(serde_json::from_value::<CancelledNotification>)
            {
                Some(Ok(cancelled)) => warn!(
                    "Request {} cancelled by client: {}",
                    cancelled.request_id,
                    cancelled.reason.as_deref().unwrap_or("no reason given")
                ),
                _ => warn!("Malformed cancellation notification"),
            }
        }
        _ => debug!("Unknown notification: {}", notification.method),
    }
}

// ============================================================================
// Lifecycle Handlers
// ============================================================================

async fn handle_initialize(
    state: &mut McpServerState,
    request: &JsonRpcRequest,
) -> Result<Value, JsonRpcError> {
    let params: InitializeParams = request
        .params
        .as_ref()
        .ok_or_else(|| JsonRpcError::invalid_params("Missing params"))
        .and_then(|p| {
            serde_json::from_value(p.clone())
                .map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {}", e)))
        })?;

    info!(
        "Initialize request from {} (version: {})",
        params.client_info.name, params.protocol_version
    );

    if params.protocol_version != MCP_PROTOCOL_VERSION {
        warn!(
            "Protocol version mismatch: client={}, server={}",
            params.protocol_version, MCP_PROTOCOL_VERSION
        );
    }

    state.protocol_version = Some(params.protocol_version);
    state.client_capabilities = Some(params.capabilities);
    state.client_info = Some(params.client_info);

    let result = InitializeResult::new(MCP_PROTOCOL_VERSION.to_string());
    serde_json::to_value(result).map_err(|e| JsonRpcError::internal_error(e.to_string()))
}

async fn handle_ping() -> Result<Value, JsonRpcError> {
    Ok(json!({}))
}

// ============================================================================
// Tools Handlers
// ============================================================================

async fn handle_tools_list(
    state: &McpServerState,
    request: &JsonRpcRequest,
) -> Result<Value, JsonRpcError> {
    let _params: ToolsListParams = request
        .params
        .as_ref()
        .map(|p| serde_json::from_value(p.clone()))
        .transpose()
        .map_err(|e| JsonRpcError::invalid_params(e.to_string()))?
        .unwrap_or_default();

    let result = ToolsListResult {
        tools: state.dispatcher.tools(),
        next_cursor: None,
    };

    serde_json::to_value(result).map_err(|e| JsonRpcError::internal_error(e.to_string()))
}

async fn handle_tools_call(
    state: &McpServerState,
    request: &JsonRpcRequest,
) -> Result<Value, JsonRpcError> {
    let params: ToolsCallParams = request
        .params
        .as_ref()
        .ok_or_else(|| JsonRpcError::invalid_params("Missing params"))
        .and_then(|p| {
            serde_json::from_value(p.clone())
                .map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {}", e)))
        })?;

    debug!("Calling tool: {}", params.name);

    let result = state
        .dispatcher
        .call_tool(&params.name, &params.arguments)
        .await?;

    serde_json::to_value(result).map_err(|e| JsonRpcError::internal_error(e.to_string()))
}
