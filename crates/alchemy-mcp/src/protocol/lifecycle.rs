//! MCP lifecycle messages

use serde::{Deserialize, Serialize};

use super::capabilities::{ClientCapabilities, ClientInfo, ServerCapabilities, ServerInfo};
use super::jsonrpc::RequestId;

/// Initialize request parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: String,

    #[serde(default)]
    pub capabilities: ClientCapabilities,

    pub client_info: ClientInfo,
}

/// Initialize response result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    pub server_info: ServerInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl InitializeResult {
    pub fn new(protocol_version: String) -> Self {
        Self {
            protocol_version,
            capabilities: ServerCapabilities::default(),
            server_info: ServerInfo::default(),
            instructions: Some(
                "Alchemy MCP server exposes NFT, chain, ENS and gas queries plus live \
                 event subscriptions. Use subscribe/unsubscribe to manage subscriptions; \
                 events are logged by the server, not returned to the caller."
                    .to_string(),
            ),
        }
    }
}

/// Cancellation notification
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelledNotification {
    pub request_id: RequestId,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_params_without_capabilities() {
        let json = r#"{
            "protocolVersion": "2025-06-18",
            "clientInfo": { "name": "inspector" }
        }"#;

        let params: InitializeParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.client_info.name, "inspector");
        assert!(params.capabilities.roots.is_none());
    }

    #[test]
    fn test_initialize_result_serialize() {
        let result = InitializeResult::new("2025-06-18".to_string());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["protocolVersion"], "2025-06-18");
        assert_eq!(json["serverInfo"]["name"], "alchemy-mcp");
    }

    #[test]
    fn test_cancelled_notification() {
        let params: CancelledNotification =
            serde_json::from_str(r#"{"requestId": 7, "reason": "timeout"}"#).unwrap();
        assert_eq!(params.request_id, RequestId::Number(7));
    }
}
