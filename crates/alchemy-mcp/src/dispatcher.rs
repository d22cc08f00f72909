//! Tool dispatcher
//!
//! Looks an operation up by name, validates the argument bag against its
//! descriptor, forwards the validated fields to the backend and classifies the
//! outcome. Subscription operations are served here directly because the
//! dispatcher owns the subscription registry.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use alchemy_client::SubscriptionApi;
use futures_util::FutureExt;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::backend::Backend;
use crate::error::{DispatchError, Result};
use crate::protocol::{Tool, ToolsCallResult};
use crate::subscriptions::{
    EventObserver, SubscriptionHandle, SubscriptionKind, SubscriptionRegistry,
};
use crate::tools::{self, OperationDescriptor, OperationGroup, ValidArgs};

pub struct Dispatcher {
    backend: Arc<dyn Backend>,
    operations: HashMap<&'static str, &'static OperationDescriptor>,
    registry: SubscriptionRegistry,
    observer: EventObserver,
}

impl Dispatcher {
    pub fn new(
        backend: Arc<dyn Backend>,
        registry: SubscriptionRegistry,
        observer: EventObserver,
    ) -> Self {
        let operations = tools::all_operations().map(|op| (op.name, op)).collect();
        Self {
            backend,
            operations,
            registry,
            observer,
        }
    }

    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    pub fn tools(&self) -> Vec<Tool> {
        tools::get_all_tools()
    }

    /// Run one operation and return the backend's value.
    ///
    /// Validation completes before the backend is touched. A panic while
    /// forwarding is reported as a backend failure.
    pub async fn dispatch(&self, name: &str, arguments: &Value) -> Result<Value> {
        let descriptor = self
            .operations
            .get(name)
            .copied()
            .ok_or_else(|| DispatchError::InvalidOperation(name.to_string()))?;

        let args = descriptor.validate(arguments)?;
        debug!(tool = name, group = descriptor.group.as_str(), "Dispatching tool");

        match AssertUnwindSafe(self.forward(descriptor.group, &args))
            .catch_unwind()
            .await
        {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                if let DispatchError::BackendError(message) = &e {
                    warn!(tool = name, "Backend call failed: {}", message);
                }
                Err(e)
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(tool = name, "Backend call panicked: {}", message);
                Err(DispatchError::BackendError(format!(
                    "{} failed unexpectedly: {}",
                    name, message
                )))
            }
        }
    }

    /// `dispatch` wrapped in the MCP reply envelope
    pub async fn call_tool(&self, name: &str, arguments: &Value) -> Result<ToolsCallResult> {
        self.dispatch(name, arguments)
            .await
            .map(ToolsCallResult::from_value)
    }

    async fn forward(&self, group: OperationGroup, args: &ValidArgs) -> Result<Value> {
        let backend = &*self.backend;
        match group {
            OperationGroup::Nft => tools::nft::forward(backend, args).await,
            OperationGroup::Core => tools::chain::forward(backend, args).await,
            OperationGroup::Ens => tools::ens::forward(backend, args).await,
            OperationGroup::Gas => tools::gas::forward(backend, args).await,
            OperationGroup::Subscription => self.forward_subscription(args).await,
        }
    }

    async fn forward_subscription(&self, args: &ValidArgs) -> Result<Value> {
        match args.operation() {
            "subscribe" => {
                let kind = args
                    .require_string("type")?
                    .parse::<SubscriptionKind>()
                    .map_err(DispatchError::InvalidParameters)?;
                self.subscribe(kind, args.string("address"), args.array("topics"))
                    .await
            }
            "unsubscribe" => self.unsubscribe(args.require_string("subscriptionId")?).await,
            "listSubscriptions" => Ok(self.list_subscriptions().await),
            other => Err(DispatchError::InvalidOperation(other.to_string())),
        }
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    /// Register a standing subscription. The registry entry only exists once
    /// the backend has accepted it.
    pub async fn subscribe(
        &self,
        kind: SubscriptionKind,
        address: Option<String>,
        topics: Option<Vec<Value>>,
    ) -> Result<Value> {
        if kind != SubscriptionKind::Logs && (address.is_some() || topics.is_some()) {
            debug!(kind = %kind, "Ignoring log filter for non-log subscription");
        }

        let id = Uuid::new_v4().to_string();
        let callback = self.observer.callback(id.clone(), kind);
        let cancel = self
            .backend
            .subscribe(kind.request(address, topics), callback)
            .await?;

        self.registry
            .insert(SubscriptionHandle::new(id.clone(), kind, cancel))
            .await;
        info!(subscription_id = %id, kind = %kind, "Subscription created");

        Ok(json!({ "subscriptionId": id, "type": kind.as_str() }))
    }

    /// Remove and cancel. The entry is gone even when the cancel action fails.
    pub async fn unsubscribe(&self, id: &str) -> Result<Value> {
        let handle = self.registry.remove(id).await.ok_or_else(|| {
            DispatchError::InvalidParameters(format!("unknown subscription id '{}'", id))
        })?;

        if let Err(e) = handle.cancel.cancel() {
            warn!(subscription_id = %id, "Cancel failed: {}", e);
            return Err(e.into());
        }
        info!(subscription_id = %id, kind = %handle.kind, "Subscription cancelled");

        Ok(json!({ "success": true, "subscriptionId": id }))
    }

    pub async fn list_subscriptions(&self) -> Value {
        json!({ "subscriptions": self.registry.snapshot().await })
    }

    /// Cancel every live subscription; returns the number of failed cancels
    pub async fn shutdown(&self) -> usize {
        let live = self.registry.len().await;
        let failures = self.registry.cancel_all().await;
        info!(live, failures, "Subscriptions torn down");
        failures
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use std::sync::atomic::Ordering;

    fn dispatcher(backend: MockBackend) -> Dispatcher {
        let (observer, _rx) = EventObserver::channel(16);
        Dispatcher::new(Arc::new(backend), SubscriptionRegistry::new(), observer)
    }

    #[tokio::test]
    async fn test_unknown_operation() {
        let d = dispatcher(MockBackend::new());
        let err = d.dispatch("getNftMetadataz", &json!({})).await.unwrap_err();
        assert_eq!(err, DispatchError::InvalidOperation("getNftMetadataz".into()));
    }

    #[tokio::test]
    async fn test_validation_precedes_backend() {
        // A failing backend is never reached when validation fails
        let d = dispatcher(MockBackend::failing("should not be seen"));
        let err = d
            .dispatch("getNftMetadata", &json!({ "contractAddress": "0xabc" }))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::InvalidParameters(msg) if msg.contains("tokenId")));
    }

    #[tokio::test]
    async fn test_block_number_forwarded() {
        let d = dispatcher(MockBackend::new());
        let value = d
            .dispatch("getBlock", &json!({ "blockHashOrBlockTag": 16 }))
            .await
            .unwrap();
        assert_eq!(value["requested"], "0x10");
    }

    #[tokio::test]
    async fn test_max_count_sent_as_hex() {
        let d = dispatcher(MockBackend::new());
        let value = d
            .dispatch(
                "getAssetTransfers",
                &json!({ "category": ["erc20"], "maxCount": 100 }),
            )
            .await
            .unwrap();
        assert_eq!(value["maxCount"], "0x64");
    }

    #[tokio::test]
    async fn test_panic_becomes_backend_error() {
        let d = dispatcher(MockBackend::panicking());
        let err = d.dispatch("getGasPrice", &json!({})).await.unwrap_err();
        assert!(matches!(err, DispatchError::BackendError(msg) if msg.contains("mock backend fault")));
    }

    #[tokio::test]
    async fn test_rpc_error_message_forwarded_verbatim() {
        let d = dispatcher(MockBackend::rpc_failing(
            -32602,
            "invalid argument 0: hex string has odd length",
        ));
        let err = d
            .dispatch("getBalance", &json!({ "address": "0xabc" }))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            DispatchError::BackendError("invalid argument 0: hex string has odd length".into())
        );
    }

    #[tokio::test]
    async fn test_call_tool_envelope() {
        let d = dispatcher(MockBackend::new());
        let result = d
            .call_tool("getContractMetadata", &json!({ "contractAddress": "0xabc" }))
            .await
            .unwrap();
        assert_eq!(result.structured_content.unwrap()["address"], "0xabc");
    }

    #[tokio::test]
    async fn test_subscribe_unsubscribe_cycle() {
        let backend = MockBackend::new();
        let cancelled = backend.cancelled();
        let d = dispatcher(backend);

        let created = d
            .dispatch("subscribe", &json!({ "type": "logs", "address": "0xabc", "topics": ["0x1"] }))
            .await
            .unwrap();
        let id = created["subscriptionId"].as_str().unwrap().to_string();
        assert_eq!(created["type"], "logs");
        assert!(d.registry().contains(&id).await);

        let listed = d.dispatch("listSubscriptions", &json!({})).await.unwrap();
        assert_eq!(listed["subscriptions"][0]["subscriptionId"], id.as_str());

        let removed = d
            .dispatch("unsubscribe", &json!({ "subscriptionId": id }))
            .await
            .unwrap();
        assert_eq!(removed["success"], true);
        assert_eq!(cancelled.load(Ordering::SeqCst), 1);

        let again = d
            .dispatch("unsubscribe", &json!({ "subscriptionId": id }))
            .await
            .unwrap_err();
        assert!(matches!(again, DispatchError::InvalidParameters(_)));
    }

    #[tokio::test]
    async fn test_failed_subscribe_registers_nothing() {
        let d = dispatcher(MockBackend::failing("ws refused"));
        let err = d
            .dispatch("subscribe", &json!({ "type": "newHeads" }))
            .await
            .unwrap_err();
        assert_eq!(err, DispatchError::BackendError("ws refused".into()));
        assert!(d.registry().is_empty().await);
    }

    #[tokio::test]
    async fn test_failed_cancel_still_removes() {
        let d = dispatcher(MockBackend::with_failing_cancel());
        let created = d.subscribe(SubscriptionKind::NewHeads, None, None).await.unwrap();
        let id = created["subscriptionId"].as_str().unwrap();

        let err = d.unsubscribe(id).await.unwrap_err();
        assert!(matches!(err, DispatchError::BackendError(_)));
        assert!(!d.registry().contains(id).await);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_everything() {
        let backend = MockBackend::new();
        let cancelled = backend.cancelled();
        let d = dispatcher(backend);

        for kind in [SubscriptionKind::NewHeads, SubscriptionKind::PendingTransactions] {
            d.subscribe(kind, None, None).await.unwrap();
        }
        assert_eq!(d.shutdown().await, 0);
        assert_eq!(cancelled.load(Ordering::SeqCst), 2);
        assert!(d.registry().is_empty().await);
    }
}
