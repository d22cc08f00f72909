//! MCP protocol types
//!
//! The subset of the Model Context Protocol this server speaks: lifecycle,
//! ping and tools.

pub mod capabilities;
pub mod jsonrpc;
pub mod lifecycle;
pub mod messages;

pub use capabilities::*;
pub use jsonrpc::*;
pub use lifecycle::*;
pub use messages::*;
