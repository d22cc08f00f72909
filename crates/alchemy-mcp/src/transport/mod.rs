//! MCP transports
//!
//! Only stdio is served; `--transport http` is refused at startup.

pub mod stdio;

pub use stdio::*;
