//! Backend interface
//!
//! The method groups the MCP server forwards to. Arguments arrive already
//! reshaped from a tool's argument bag; results are the provider's JSON,
//! untouched.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

// ============================================================================
// Option types
// ============================================================================

/// Paging and filtering options shared by the NFT listing endpoints
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NftPageOptions {
    pub page_key: Option<String>,
    pub page_size: Option<u64>,
    pub contract_addresses: Option<Vec<String>>,
    pub exclude_filters: Option<Vec<String>>,
    pub omit_metadata: Option<bool>,
}

/// Options for a single NFT metadata lookup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NftMetadataOptions {
    pub token_type: Option<String>,
    pub refresh_cache: Option<bool>,
}

/// Filters for NFT sales history
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NftSalesOptions {
    pub contract_address: Option<String>,
    pub token_id: Option<String>,
    pub from_block: Option<String>,
    pub to_block: Option<String>,
    pub order: Option<String>,
    pub marketplace: Option<String>,
    pub buyer_address: Option<String>,
    pub seller_address: Option<String>,
    pub limit: Option<u64>,
    pub page_key: Option<String>,
}

/// `eth_getLogs` filter object
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topics: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_block: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_block: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<String>,
}

/// Call object used by `eth_call` and `eth_estimateGas`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransactionRequest {
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Block selector for `alchemy_getTransactionReceipts`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceiptsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<String>,
}

/// `alchemy_getAssetTransfers` request object
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetTransfersParams {
    pub category: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_block: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_block: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_addresses: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_zero_value: Option<bool>,
    /// Hex quantity, e.g. `0x3e8`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_count: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub with_metadata: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
}

// ============================================================================
// Subscriptions
// ============================================================================

/// A standing event registration
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriptionRequest {
    /// Every new block header
    NewHeads,
    /// Logs matching an optional address and topic filter
    Logs {
        address: Option<String>,
        topics: Option<Vec<Value>>,
    },
    /// Pending transaction hashes
    PendingTransactions,
}

impl SubscriptionRequest {
    /// `eth_subscribe` params array
    pub fn to_params(&self) -> Value {
        match self {
            SubscriptionRequest::NewHeads => serde_json::json!(["newHeads"]),
            SubscriptionRequest::Logs { address, topics } => {
                let mut filter = serde_json::Map::new();
                if let Some(address) = address {
                    filter.insert("address".to_string(), Value::String(address.clone()));
                }
                if let Some(topics) = topics {
                    filter.insert("topics".to_string(), Value::Array(topics.clone()));
                }
                serde_json::json!(["logs", filter])
            }
            SubscriptionRequest::PendingTransactions => {
                serde_json::json!(["newPendingTransactions"])
            }
        }
    }
}

/// Observer invoked once per received event. Must not block.
pub type EventCallback = Arc<dyn Fn(Value) + Send + Sync>;

/// One-shot cancellation action for a live subscription
pub struct CancelHandle {
    action: Box<dyn FnOnce() -> Result<()> + Send + Sync>,
}

impl CancelHandle {
    pub fn new(action: impl FnOnce() -> Result<()> + Send + Sync + 'static) -> Self {
        Self {
            action: Box::new(action),
        }
    }

    /// Tear down the underlying subscription
    pub fn cancel(self) -> Result<()> {
        (self.action)()
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHandle").finish_non_exhaustive()
    }
}

// ============================================================================
// Method groups
// ============================================================================

/// NFT queries
#[async_trait]
pub trait NftApi: Send + Sync {
    async fn get_nfts_for_owner(&self, owner: &str, options: NftPageOptions) -> Result<Value>;

    async fn get_nft_metadata(
        &self,
        contract_address: &str,
        token_id: &str,
        options: NftMetadataOptions,
    ) -> Result<Value>;

    async fn get_nfts_for_contract(
        &self,
        contract_address: &str,
        options: NftPageOptions,
    ) -> Result<Value>;

    async fn get_owners_for_nft(&self, contract_address: &str, token_id: &str) -> Result<Value>;

    async fn get_owners_for_contract(
        &self,
        contract_address: &str,
        with_token_balances: bool,
        page_key: Option<String>,
    ) -> Result<Value>;

    async fn get_contract_metadata(&self, contract_address: &str) -> Result<Value>;

    async fn get_contracts_for_owner(&self, owner: &str, options: NftPageOptions)
        -> Result<Value>;

    async fn get_floor_price(&self, contract_address: &str) -> Result<Value>;

    async fn get_nft_sales(&self, options: NftSalesOptions) -> Result<Value>;

    async fn is_spam_contract(&self, contract_address: &str) -> Result<Value>;

    async fn get_spam_contracts(&self) -> Result<Value>;

    async fn compute_rarity(&self, contract_address: &str, token_id: &str) -> Result<Value>;

    async fn summarize_nft_attributes(&self, contract_address: &str) -> Result<Value>;

    async fn search_contract_metadata(&self, query: &str) -> Result<Value>;

    async fn verify_nft_ownership(&self, owner: &str, contract_address: &str) -> Result<Value>;

    async fn refresh_nft_metadata(&self, contract_address: &str, token_id: &str)
        -> Result<Value>;
}

/// Core chain queries
#[async_trait]
pub trait CoreApi: Send + Sync {
    async fn get_block_number(&self) -> Result<Value>;

    async fn get_balance(&self, address: &str, block_tag: Option<String>) -> Result<Value>;

    async fn get_block(&self, block_hash_or_tag: &str) -> Result<Value>;

    async fn get_transaction(&self, hash: &str) -> Result<Value>;

    async fn get_transaction_receipt(&self, hash: &str) -> Result<Value>;

    async fn get_transaction_receipts(&self, params: TransactionReceiptsParams) -> Result<Value>;

    async fn get_transaction_count(&self, address: &str, block_tag: Option<String>)
        -> Result<Value>;

    async fn get_code(&self, address: &str, block_tag: Option<String>) -> Result<Value>;

    async fn get_storage_at(
        &self,
        address: &str,
        position: &str,
        block_tag: Option<String>,
    ) -> Result<Value>;

    async fn get_logs(&self, filter: LogFilter) -> Result<Value>;

    async fn call(&self, transaction: TransactionRequest, block_tag: Option<String>)
        -> Result<Value>;

    async fn get_token_balances(
        &self,
        address: &str,
        contract_addresses: Option<Vec<String>>,
    ) -> Result<Value>;

    async fn get_token_metadata(&self, contract_address: &str) -> Result<Value>;

    async fn get_asset_transfers(&self, params: AssetTransfersParams) -> Result<Value>;

    /// Raw JSON-RPC passthrough
    async fn send(&self, method: &str, params: Vec<Value>) -> Result<Value>;
}

/// ENS resolution
#[async_trait]
pub trait EnsApi: Send + Sync {
    /// Name to address; `null` when the name does not resolve
    async fn resolve_name(&self, name: &str) -> Result<Value>;

    /// Address to primary name; `null` when no verified reverse record exists
    async fn lookup_address(&self, address: &str) -> Result<Value>;
}

/// Gas pricing and estimation
#[async_trait]
pub trait GasApi: Send + Sync {
    async fn get_gas_price(&self) -> Result<Value>;

    async fn get_fee_data(&self) -> Result<Value>;

    async fn get_max_priority_fee_per_gas(&self) -> Result<Value>;

    async fn estimate_gas(&self, transaction: TransactionRequest) -> Result<Value>;
}

/// Event subscriptions
#[async_trait]
pub trait SubscriptionApi: Send + Sync {
    /// Register `request`; `on_event` receives every event until the returned
    /// handle is cancelled.
    async fn subscribe(
        &self,
        request: SubscriptionRequest,
        on_event: EventCallback,
    ) -> Result<CancelHandle>;
}

/// The complete backend: every method group
pub trait Backend: NftApi + CoreApi + EnsApi + GasApi + SubscriptionApi {}

impl<T> Backend for T where T: NftApi + CoreApi + EnsApi + GasApi + SubscriptionApi {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_logs_params_include_filter() {
        let request = SubscriptionRequest::Logs {
            address: Some("0xabc".to_string()),
            topics: Some(vec![Value::String("0x1".to_string())]),
        };
        assert_eq!(
            request.to_params(),
            serde_json::json!(["logs", { "address": "0xabc", "topics": ["0x1"] }])
        );
    }

    #[test]
    fn test_logs_params_without_filter() {
        let request = SubscriptionRequest::Logs {
            address: None,
            topics: None,
        };
        assert_eq!(request.to_params(), serde_json::json!(["logs", {}]));
    }

    #[test]
    fn test_cancel_handle_runs_action_once() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let handle = CancelHandle::new(move || {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        });
        handle.cancel().unwrap();
        assert!(fired.load(Ordering::SeqCst));
    }

    #[test]
    fn test_asset_transfers_serialization() {
        let params = AssetTransfersParams {
            category: vec!["erc721".to_string()],
            max_count: Some("0x3e8".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json, serde_json::json!({ "category": ["erc721"], "maxCount": "0x3e8" }));
    }
}
