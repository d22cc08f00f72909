//! Integration tests for the MCP protocol flow
//!
//! Drives `handle_request`/`handle_notification` end to end against the mock
//! backend: lifecycle, tool listing, validation, forwarding, error
//! classification and subscription management.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use alchemy_mcp::backend::MockBackend;
use alchemy_mcp::dispatcher::Dispatcher;
use alchemy_mcp::handlers::{handle_notification, handle_request, McpServerState};
use alchemy_mcp::protocol::*;
use alchemy_mcp::subscriptions::{EventObserver, SubscriptionEvent, SubscriptionRegistry};
use alchemy_mcp::tools::{self, FieldShape};
use serde_json::{json, Map, Value};
use tokio::sync::mpsc;

/// Helper to create a dispatcher plus the receiving end of its event channel
fn create_dispatcher(backend: MockBackend) -> (Arc<Dispatcher>, mpsc::Receiver<SubscriptionEvent>) {
    let (observer, events) = EventObserver::channel(32);
    let dispatcher = Dispatcher::new(Arc::new(backend), SubscriptionRegistry::new(), observer);
    (Arc::new(dispatcher), events)
}

/// Helper to create an uninitialized server state
fn create_test_state(backend: MockBackend) -> McpServerState {
    let (dispatcher, _events) = create_dispatcher(backend);
    McpServerState::new(dispatcher)
}

/// Helper to create an initialized server state
fn create_initialized_state(backend: MockBackend) -> McpServerState {
    let mut state = create_test_state(backend);
    state.initialized = true;
    state.protocol_version = Some(MCP_PROTOCOL_VERSION.to_string());
    state
}

fn tools_call(id: i64, name: &str, arguments: Value) -> JsonRpcRequest {
    JsonRpcRequest::new(id, "tools/call").with_params(json!({
        "name": name,
        "arguments": arguments,
    }))
}

/// A well-typed value for a field shape
fn sample(shape: FieldShape) -> Value {
    match shape {
        FieldShape::String => json!("0xabc"),
        FieldShape::Integer => json!(1),
        FieldShape::Number => json!(1.5),
        FieldShape::Boolean => json!(true),
        FieldShape::StringArray => json!(["0xabc"]),
        FieldShape::Array => json!(["0x1"]),
        FieldShape::Object => json!({}),
        FieldShape::Block => json!("latest"),
        FieldShape::OneOf(allowed) => json!(allowed[0]),
    }
}

fn required_args(op: &tools::OperationDescriptor) -> Map<String, Value> {
    op.fields
        .iter()
        .filter(|f| f.required)
        .map(|f| (f.name.to_string(), sample(f.shape)))
        .collect()
}

fn error_kind(response: &JsonRpcResponse) -> Option<String> {
    response
        .error
        .as_ref()
        .and_then(|e| e.data.as_ref())
        .and_then(|d| d["kind"].as_str())
        .map(str::to_string)
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

#[tokio::test]
async fn test_full_initialization_flow() {
    let mut state = create_test_state(MockBackend::new());

    let init_request = JsonRpcRequest::new(1, "initialize").with_params(json!({
        "protocolVersion": "2025-11-25",
        "capabilities": {},
        "clientInfo": { "name": "test-client", "version": "1.0.0" }
    }));

    let response = handle_request(&mut state, &init_request).await;
    assert!(response.error.is_none(), "Initialize should succeed");
    let result = response.result.expect("Should have result");

    assert_eq!(result["protocolVersion"], "2025-11-25");
    assert!(result["capabilities"]["tools"].is_object());
    assert!(result["capabilities"].get("resources").is_none());
    assert_eq!(result["serverInfo"]["name"], "alchemy-mcp");

    handle_notification(&mut state, &JsonRpcNotification::new("notifications/initialized")).await;

    assert!(state.initialized);
    assert_eq!(state.client_info.as_ref().map(|c| c.name.as_str()), Some("test-client"));
}

#[tokio::test]
async fn test_request_before_initialize_fails() {
    let mut state = create_test_state(MockBackend::new());

    let response = handle_request(&mut state, &JsonRpcRequest::new(1, "tools/list")).await;

    assert_eq!(response.error.unwrap().code, -32002);
}

#[tokio::test]
async fn test_ping_works_without_initialize() {
    let mut state = create_test_state(MockBackend::new());

    let response = handle_request(&mut state, &JsonRpcRequest::new(1, "ping")).await;

    assert!(response.error.is_none());
    assert_eq!(response.result, Some(json!({})));
}

#[tokio::test]
async fn test_unknown_method() {
    let mut state = create_initialized_state(MockBackend::new());

    let response = handle_request(&mut state, &JsonRpcRequest::new(1, "resources/list")).await;

    assert_eq!(response.error.unwrap().code, -32601);
}

#[tokio::test]
async fn test_wrong_jsonrpc_version() {
    let mut state = create_initialized_state(MockBackend::new());
    let mut request = JsonRpcRequest::new(1, "ping");
    request.jsonrpc = "1.0".to_string();

    let response = handle_request(&mut state, &request).await;

    assert_eq!(response.error.unwrap().code, -32600);
}

#[tokio::test]
async fn test_cancelled_notification_is_accepted() {
    let mut state = create_initialized_state(MockBackend::new());
    let mut notification = JsonRpcNotification::new("notifications/cancelled");
    notification.params = Some(json!({ "requestId": 4, "reason": "user abort" }));

    handle_notification(&mut state, &notification).await;

    assert!(state.initialized);
}

// ============================================================================
// Tool Listing Tests
// ============================================================================

#[tokio::test]
async fn test_tools_list() {
    let mut state = create_initialized_state(MockBackend::new());

    let response = handle_request(&mut state, &JsonRpcRequest::new(1, "tools/list")).await;
    let result = response.result.expect("Should have result");
    let tools = result["tools"].as_array().unwrap();

    assert_eq!(tools.len(), tools::all_operations().count());

    let metadata = tools
        .iter()
        .find(|t| t["name"] == "getNftMetadata")
        .expect("getNftMetadata listed");
    assert_eq!(metadata["inputSchema"]["type"], "object");
    assert_eq!(
        metadata["inputSchema"]["required"],
        json!(["contractAddress", "tokenId"])
    );
    assert_eq!(metadata["annotations"]["readOnlyHint"], true);

    let subscribe = tools.iter().find(|t| t["name"] == "subscribe").unwrap();
    assert_eq!(
        subscribe["inputSchema"]["properties"]["type"]["enum"],
        json!(["newHeads", "logs", "pendingTransactions"])
    );
}

// ============================================================================
// Validation Tests
// ============================================================================

#[test]
fn test_every_operation_accepts_its_required_fields() {
    for op in tools::all_operations() {
        let args = Value::Object(required_args(op));
        assert!(op.validate(&args).is_ok(), "{} rejected {}", op.name, args);
    }
}

#[tokio::test]
async fn test_every_operation_forwards_with_required_fields() {
    let mut state = create_initialized_state(MockBackend::new());

    // unsubscribe needs an id issued by subscribe, covered separately
    for (i, op) in tools::all_operations()
        .filter(|op| op.name != "unsubscribe")
        .enumerate()
    {
        let request = tools_call(i as i64, op.name, Value::Object(required_args(op)));
        let response = handle_request(&mut state, &request).await;
        assert!(response.error.is_none(), "{} failed: {:?}", op.name, response.error);

        let result = response.result.unwrap();
        assert_eq!(result["content"][0]["type"], "text", "{}", op.name);
    }
}

#[tokio::test]
async fn test_missing_any_required_field_is_invalid_parameters() {
    // The backend would fail loudly if it were ever reached
    let mut state = create_initialized_state(MockBackend::failing("backend reached"));

    for op in tools::all_operations() {
        for field in op.fields.iter().filter(|f| f.required) {
            let mut args = required_args(op);
            args.remove(field.name);

            let response = handle_request(&mut state, &tools_call(1, op.name, Value::Object(args))).await;
            let error = response.error.clone().expect("should fail");
            assert_eq!(error.code, -32602, "{} without {}", op.name, field.name);
            assert_eq!(error_kind(&response).as_deref(), Some("InvalidParameters"));
            assert!(error.message.contains(field.name));
        }
    }
}

#[tokio::test]
async fn test_wrong_shape_names_field_and_expectation() {
    let mut state = create_initialized_state(MockBackend::new());

    let response = handle_request(
        &mut state,
        &tools_call(1, "getNftsForOwner", json!({ "owner": "0xabc", "pageSize": "ten" })),
    )
    .await;

    let error = response.error.unwrap();
    assert_eq!(error.code, -32602);
    assert!(error.message.contains("pageSize"));
    assert!(error.message.contains("integer"));
}

#[tokio::test]
async fn test_unknown_tool_is_invalid_operation() {
    let mut state = create_initialized_state(MockBackend::new());

    let response = handle_request(&mut state, &tools_call(1, "mintNft", json!({}))).await;

    assert_eq!(response.error.as_ref().unwrap().code, -32601);
    assert_eq!(error_kind(&response).as_deref(), Some("InvalidOperation"));
}

#[tokio::test]
async fn test_missing_arguments_treated_as_empty() {
    let mut state = create_initialized_state(MockBackend::new());
    let request = JsonRpcRequest::new(1, "tools/call").with_params(json!({ "name": "getBlockNumber" }));

    let response = handle_request(&mut state, &request).await;

    let result = response.result.unwrap();
    assert_eq!(result["content"][0]["text"], "\"0x121eac0\"");
    assert!(result.get("structuredContent").is_none());
}

// ============================================================================
// Forwarding Tests
// ============================================================================

#[tokio::test]
async fn test_nft_metadata_forwarded() {
    let mut state = create_initialized_state(MockBackend::new());

    let response = handle_request(
        &mut state,
        &tools_call(1, "getNftMetadata", json!({ "contractAddress": "0xabc", "tokenId": "1" })),
    )
    .await;

    let result = response.result.unwrap();
    assert_eq!(result["structuredContent"]["contract"]["address"], "0xabc");
    assert_eq!(result["structuredContent"]["tokenId"], "1");
    assert!(result.get("isError").is_none());
}

#[tokio::test]
async fn test_backend_rejection_is_backend_error() {
    let mut state = create_initialized_state(MockBackend::failing("Contract 0xabc not found"));

    let response = handle_request(
        &mut state,
        &tools_call(1, "getNftMetadata", json!({ "contractAddress": "0xabc", "tokenId": "1" })),
    )
    .await;

    let error = response.error.clone().unwrap();
    assert_eq!(error.code, -32603);
    assert_eq!(error.message, "Contract 0xabc not found");
    assert_eq!(error_kind(&response).as_deref(), Some("BackendError"));
}

#[tokio::test]
async fn test_backend_panic_is_backend_error() {
    let mut state = create_initialized_state(MockBackend::panicking());

    let response = handle_request(&mut state, &tools_call(1, "getFeeData", json!({}))).await;

    assert_eq!(error_kind(&response).as_deref(), Some("BackendError"));
}

// ============================================================================
// Subscription Tests
// ============================================================================

#[tokio::test]
async fn test_subscribe_unsubscribe_lifecycle() {
    let backend = MockBackend::new();
    let cancelled = backend.cancelled();
    let mut state = create_initialized_state(backend);

    let response = handle_request(
        &mut state,
        &tools_call(1, "subscribe", json!({ "type": "logs", "address": "0xabc", "topics": ["0x1"] })),
    )
    .await;
    let created = response.result.unwrap()["structuredContent"].clone();
    let id = created["subscriptionId"].as_str().unwrap().to_string();
    assert_eq!(created["type"], "logs");

    let response = handle_request(&mut state, &tools_call(2, "unsubscribe", json!({ "subscriptionId": id }))).await;
    let removed = response.result.unwrap()["structuredContent"].clone();
    assert_eq!(removed, json!({ "success": true, "subscriptionId": id }));
    assert_eq!(cancelled.load(Ordering::SeqCst), 1);

    let response = handle_request(&mut state, &tools_call(3, "unsubscribe", json!({ "subscriptionId": id }))).await;
    assert_eq!(error_kind(&response).as_deref(), Some("InvalidParameters"));
    assert_eq!(cancelled.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unsubscribe_never_issued_id() {
    let mut state = create_initialized_state(MockBackend::new());

    let response = handle_request(
        &mut state,
        &tools_call(1, "unsubscribe", json!({ "subscriptionId": "no-such-id" })),
    )
    .await;

    assert_eq!(response.error.as_ref().unwrap().code, -32602);
    assert_eq!(error_kind(&response).as_deref(), Some("InvalidParameters"));
}

#[tokio::test]
async fn test_subscribe_ids_are_distinct() {
    let mut state = create_initialized_state(MockBackend::new());

    let mut ids = Vec::new();
    for i in 0..3 {
        let response = handle_request(&mut state, &tools_call(i, "subscribe", json!({ "type": "newHeads" }))).await;
        ids.push(response.result.unwrap()["structuredContent"]["subscriptionId"].clone());
    }
    ids.sort_by_key(|id| id.to_string());
    ids.dedup();
    assert_eq!(ids.len(), 3);

    let response = handle_request(&mut state, &tools_call(9, "listSubscriptions", json!({}))).await;
    let listed = &response.result.unwrap()["structuredContent"]["subscriptions"];
    assert_eq!(listed.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_events_tagged_with_subscription_id() {
    let (dispatcher, mut events) = create_dispatcher(MockBackend::new());

    let created = dispatcher
        .dispatch("subscribe", &json!({ "type": "pendingTransactions" }))
        .await
        .unwrap();

    let event = events.recv().await.expect("sample event");
    assert_eq!(json!(event.subscription_id), created["subscriptionId"]);
    assert_eq!(event.kind.as_str(), "pendingTransactions");
    assert!(event.payload.is_string());
}

#[tokio::test]
async fn test_shutdown_cancels_live_subscriptions() {
    let backend = MockBackend::new();
    let cancelled = backend.cancelled();
    let (dispatcher, _events) = create_dispatcher(backend);

    for kind in ["newHeads", "logs"] {
        dispatcher
            .dispatch("subscribe", &json!({ "type": kind }))
            .await
            .unwrap();
    }

    assert_eq!(dispatcher.shutdown().await, 0);
    assert_eq!(cancelled.load(Ordering::SeqCst), 2);
    assert_eq!(dispatcher.registry().len().await, 0);
}
