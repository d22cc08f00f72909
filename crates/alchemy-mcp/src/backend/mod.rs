//! Backend selection
//!
//! The dispatcher talks to any [`Backend`]; this module picks the hosted
//! provider binding or the in-process mock.

mod mock;

use std::sync::Arc;

pub use alchemy_client::Backend;
pub use mock::MockBackend;

use alchemy_client::AlchemyClient;

use crate::config::ServerConfig;

/// Hosted provider binding for the configured network
pub fn hosted(config: &ServerConfig) -> Arc<dyn Backend> {
    Arc::new(AlchemyClient::new(config.api_key.clone(), config.network))
}

pub fn mock() -> Arc<dyn Backend> {
    Arc::new(MockBackend::new())
}
