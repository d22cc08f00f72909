//! Core chain JSON-RPC bindings

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::api::{
    AssetTransfersParams, CoreApi, LogFilter, TransactionReceiptsParams, TransactionRequest,
};
use crate::client::AlchemyClient;
use crate::error::Result;

const LATEST: &str = "latest";

/// 32-byte hex hash (`0x` + 64 nibbles)
fn is_block_hash(s: &str) -> bool {
    s.len() == 66 && s.starts_with("0x")
}

#[async_trait]
impl CoreApi for AlchemyClient {
    async fn get_block_number(&self) -> Result<Value> {
        self.rpc("eth_blockNumber", json!([])).await
    }

    async fn get_balance(&self, address: &str, block_tag: Option<String>) -> Result<Value> {
        let tag = block_tag.unwrap_or_else(|| LATEST.to_string());
        self.rpc("eth_getBalance", json!([address, tag])).await
    }

    async fn get_block(&self, block_hash_or_tag: &str) -> Result<Value> {
        if is_block_hash(block_hash_or_tag) {
            self.rpc("eth_getBlockByHash", json!([block_hash_or_tag, false]))
                .await
        } else {
            self.rpc("eth_getBlockByNumber", json!([block_hash_or_tag, false]))
                .await
        }
    }

    async fn get_transaction(&self, hash: &str) -> Result<Value> {
        self.rpc("eth_getTransactionByHash", json!([hash])).await
    }

    async fn get_transaction_receipt(&self, hash: &str) -> Result<Value> {
        self.rpc("eth_getTransactionReceipt", json!([hash])).await
    }

    async fn get_transaction_receipts(&self, params: TransactionReceiptsParams) -> Result<Value> {
        self.rpc("alchemy_getTransactionReceipts", json!([params]))
            .await
    }

    async fn get_transaction_count(
        &self,
        address: &str,
        block_tag: Option<String>,
    ) -> Result<Value> {
        let tag = block_tag.unwrap_or_else(|| LATEST.to_string());
        self.rpc("eth_getTransactionCount", json!([address, tag]))
            .await
    }

    async fn get_code(&self, address: &str, block_tag: Option<String>) -> Result<Value> {
        let tag = block_tag.unwrap_or_else(|| LATEST.to_string());
        self.rpc("eth_getCode", json!([address, tag])).await
    }

    async fn get_storage_at(
        &self,
        address: &str,
        position: &str,
        block_tag: Option<String>,
    ) -> Result<Value> {
        let tag = block_tag.unwrap_or_else(|| LATEST.to_string());
        self.rpc("eth_getStorageAt", json!([address, position, tag]))
            .await
    }

    async fn get_logs(&self, filter: LogFilter) -> Result<Value> {
        self.rpc("eth_getLogs", json!([filter])).await
    }

    async fn call(
        &self,
        transaction: TransactionRequest,
        block_tag: Option<String>,
    ) -> Result<Value> {
        let tag = block_tag.unwrap_or_else(|| LATEST.to_string());
        self.rpc("eth_call", json!([transaction, tag])).await
    }

    async fn get_token_balances(
        &self,
        address: &str,
        contract_addresses: Option<Vec<String>>,
    ) -> Result<Value> {
        let params = match contract_addresses {
            Some(contracts) => json!([address, contracts]),
            None => json!([address, "erc20"]),
        };
        self.rpc("alchemy_getTokenBalances", params).await
    }

    async fn get_token_metadata(&self, contract_address: &str) -> Result<Value> {
        self.rpc("alchemy_getTokenMetadata", json!([contract_address]))
            .await
    }

    async fn get_asset_transfers(&self, params: AssetTransfersParams) -> Result<Value> {
        self.rpc("alchemy_getAssetTransfers", json!([params])).await
    }

    async fn send(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        self.rpc(method, Value::Array(params)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_hash_detection() {
        let hash = format!("0x{}", "ab".repeat(32));
        assert!(is_block_hash(&hash));
        assert!(!is_block_hash("latest"));
        assert!(!is_block_hash("0x10d4f"));
    }
}
