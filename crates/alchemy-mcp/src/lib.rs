//! Alchemy MCP Server
//!
//! A Model Context Protocol server that exposes Alchemy's blockchain data
//! methods as tools any MCP-compatible agent can call.
//!
//! # Features
//!
//! - **Tools**: NFT, core chain, ENS and gas queries, each validated against a
//!   static descriptor before it reaches the backend
//! - **Subscriptions**: `subscribe`/`unsubscribe` for new heads, logs and
//!   pending transactions; events are logged by the server
//! - **Mock backend**: canned responses for running without an API key
//!
//! # Transport Support
//!
//! - **stdio**: newline-delimited JSON-RPC 2.0
//!
//! # Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use alchemy_mcp::{backend::MockBackend, McpServer};
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = McpServer::from_backend(Arc::new(MockBackend::new()), 256);
//!     server.run_stdio().await.expect("Server failed");
//! }
//! ```
//!
//! # Protocol Version
//!
//! This implementation targets MCP version 2025-11-25.

pub mod backend;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod protocol;
pub mod server;
pub mod subscriptions;
pub mod tools;
pub mod transport;

pub use config::{ConfigError, ServerConfig};
pub use dispatcher::Dispatcher;
pub use error::DispatchError;
pub use protocol::{
    ClientCapabilities, ClientInfo, InitializeParams, InitializeResult, JsonRpcError,
    JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, ServerCapabilities, ServerInfo, Tool,
    ToolContent, ToolsCallResult, MCP_PROTOCOL_VERSION,
};
pub use server::McpServer;
pub use subscriptions::{EventObserver, SubscriptionEvent, SubscriptionKind, SubscriptionRegistry};
