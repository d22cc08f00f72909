//! In-process backend returning canned data
//!
//! Serves `--mock` and the test suite. Responses echo their inputs so callers
//! can check that arguments reached the backend intact.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use alchemy_client::{
    AssetTransfersParams, CancelHandle, ClientError, CoreApi, EnsApi, EventCallback, GasApi,
    LogFilter, NftApi, NftMetadataOptions, NftPageOptions, NftSalesOptions, Result,
    SubscriptionApi, SubscriptionRequest, TransactionReceiptsParams, TransactionRequest,
};
use async_trait::async_trait;
use serde_json::{json, Value};

const MOCK_BLOCK: u64 = 19_000_000;

#[derive(Debug, Clone, Default)]
enum Fault {
    #[default]
    None,
    Reject(String),
    RpcReject { code: i64, message: String },
    Panic,
    Stall,
}

#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    fault: Fault,
    fail_cancel: bool,
    subscribed: Arc<AtomicUsize>,
    cancelled: Arc<AtomicUsize>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with `ClientError::Api(message)`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fault: Fault::Reject(message.into()),
            ..Self::default()
        }
    }

    /// Every call fails the way a node reports a JSON-RPC error object
    pub fn rpc_failing(code: i64, message: impl Into<String>) -> Self {
        Self {
            fault: Fault::RpcReject {
                code,
                message: message.into(),
            },
            ..Self::default()
        }
    }

    /// `subscribe` never completes, like a WebSocket connect to a host that
    /// never answers
    pub fn stalled() -> Self {
        Self {
            fault: Fault::Stall,
            ..Self::default()
        }
    }

    /// Every call panics
    pub fn panicking() -> Self {
        Self {
            fault: Fault::Panic,
            ..Self::default()
        }
    }

    /// Subscriptions succeed but their cancel action fails
    pub fn with_failing_cancel() -> Self {
        Self {
            fail_cancel: true,
            ..Self::default()
        }
    }

    /// Number of subscriptions accepted so far
    pub fn subscribed(&self) -> Arc<AtomicUsize> {
        self.subscribed.clone()
    }

    /// Number of cancel actions run so far
    pub fn cancelled(&self) -> Arc<AtomicUsize> {
        self.cancelled.clone()
    }

    fn reply(&self, value: Value) -> Result<Value> {
        match &self.fault {
            Fault::None | Fault::Stall => Ok(value),
            Fault::Reject(message) => Err(ClientError::Api(message.clone())),
            Fault::RpcReject { code, message } => Err(ClientError::Rpc {
                code: *code,
                message: message.clone(),
            }),
            Fault::Panic => panic!("mock backend fault"),
        }
    }

    fn sample_event(request: &SubscriptionRequest) -> Value {
        match request {
            SubscriptionRequest::NewHeads => json!({
                "number": format!("{:#x}", MOCK_BLOCK + 1),
                "hash": format!("0x{}", "ab".repeat(32)),
            }),
            SubscriptionRequest::Logs { address, topics } => json!({
                "address": address,
                "topics": topics.clone().unwrap_or_default(),
                "data": "0x",
                "blockNumber": format!("{:#x}", MOCK_BLOCK + 1),
            }),
            SubscriptionRequest::PendingTransactions => json!(format!("0x{}", "cd".repeat(32))),
        }
    }
}

fn nft(contract_address: &str, token_id: &str) -> Value {
    json!({
        "contract": { "address": contract_address, "tokenType": "ERC721" },
        "tokenId": token_id,
        "name": format!("Mock #{}", token_id),
    })
}

#[async_trait]
impl NftApi for MockBackend {
    async fn get_nfts_for_owner(&self, owner: &str, options: NftPageOptions) -> Result<Value> {
        let contract = options
            .contract_addresses
            .and_then(|c| c.into_iter().next())
            .unwrap_or_else(|| "0xmock".to_string());
        self.reply(json!({
            "owner": owner,
            "ownedNfts": [nft(&contract, "1")],
            "totalCount": 1,
            "pageKey": options.page_key,
        }))
    }

    async fn get_nft_metadata(
        &self,
        contract_address: &str,
        token_id: &str,
        _options: NftMetadataOptions,
    ) -> Result<Value> {
        self.reply(nft(contract_address, token_id))
    }

    async fn get_nfts_for_contract(
        &self,
        contract_address: &str,
        options: NftPageOptions,
    ) -> Result<Value> {
        self.reply(json!({
            "nfts": [nft(contract_address, "1"), nft(contract_address, "2")],
            "pageKey": options.page_key,
        }))
    }

    async fn get_owners_for_nft(&self, contract_address: &str, token_id: &str) -> Result<Value> {
        self.reply(json!({
            "owners": ["0x000000000000000000000000000000000000dead"],
            "contractAddress": contract_address,
            "tokenId": token_id,
        }))
    }

    async fn get_owners_for_contract(
        &self,
        contract_address: &str,
        with_token_balances: bool,
        page_key: Option<String>,
    ) -> Result<Value> {
        self.reply(json!({
            "owners": ["0x000000000000000000000000000000000000dead"],
            "contractAddress": contract_address,
            "withTokenBalances": with_token_balances,
            "pageKey": page_key,
        }))
    }

    async fn get_contract_metadata(&self, contract_address: &str) -> Result<Value> {
        self.reply(json!({
            "address": contract_address,
            "name": "Mock Collection",
            "symbol": "MOCK",
            "tokenType": "ERC721",
        }))
    }

    async fn get_contracts_for_owner(
        &self,
        owner: &str,
        options: NftPageOptions,
    ) -> Result<Value> {
        self.reply(json!({
            "owner": owner,
            "contracts": [{ "address": "0xmock", "name": "Mock Collection" }],
            "pageKey": options.page_key,
        }))
    }

    async fn get_floor_price(&self, contract_address: &str) -> Result<Value> {
        self.reply(json!({
            "contractAddress": contract_address,
            "openSea": { "floorPrice": 0.5, "priceCurrency": "ETH" },
        }))
    }

    async fn get_nft_sales(&self, options: NftSalesOptions) -> Result<Value> {
        self.reply(json!({
            "nftSales": [],
            "contractAddress": options.contract_address,
            "order": options.order,
            "pageKey": options.page_key,
        }))
    }

    async fn is_spam_contract(&self, _contract_address: &str) -> Result<Value> {
        self.reply(json!({ "isSpamContract": false }))
    }

    async fn get_spam_contracts(&self) -> Result<Value> {
        self.reply(json!({ "contractAddresses": [] }))
    }

    async fn compute_rarity(&self, contract_address: &str, token_id: &str) -> Result<Value> {
        self.reply(json!({
            "contractAddress": contract_address,
            "tokenId": token_id,
            "rarities": [{ "traitType": "Background", "value": "Blue", "prevalence": 0.12 }],
        }))
    }

    async fn summarize_nft_attributes(&self, contract_address: &str) -> Result<Value> {
        self.reply(json!({
            "contractAddress": contract_address,
            "totalSupply": "2",
            "summary": { "Background": { "Blue": 1, "Red": 1 } },
        }))
    }

    async fn search_contract_metadata(&self, query: &str) -> Result<Value> {
        self.reply(json!({ "query": query, "contracts": [] }))
    }

    async fn verify_nft_ownership(&self, owner: &str, contract_address: &str) -> Result<Value> {
        self.reply(json!({
            "owner": owner,
            "contractAddress": contract_address,
            "isHolderOfContract": true,
        }))
    }

    async fn refresh_nft_metadata(&self, contract_address: &str, token_id: &str) -> Result<Value> {
        self.reply(json!({
            "contractAddress": contract_address,
            "tokenId": token_id,
            "refreshState": "queued",
        }))
    }
}

#[async_trait]
impl CoreApi for MockBackend {
    async fn get_block_number(&self) -> Result<Value> {
        self.reply(json!(format!("{:#x}", MOCK_BLOCK)))
    }

    async fn get_balance(&self, _address: &str, _block_tag: Option<String>) -> Result<Value> {
        self.reply(json!("0xde0b6b3a7640000"))
    }

    async fn get_block(&self, block_hash_or_tag: &str) -> Result<Value> {
        self.reply(json!({
            "number": format!("{:#x}", MOCK_BLOCK),
            "requested": block_hash_or_tag,
            "baseFeePerGas": "0x3b9aca00",
            "transactions": [],
        }))
    }

    async fn get_transaction(&self, hash: &str) -> Result<Value> {
        self.reply(json!({ "hash": hash, "nonce": "0x0", "value": "0x0" }))
    }

    async fn get_transaction_receipt(&self, hash: &str) -> Result<Value> {
        self.reply(json!({ "transactionHash": hash, "status": "0x1", "logs": [] }))
    }

    async fn get_transaction_receipts(&self, params: TransactionReceiptsParams) -> Result<Value> {
        self.reply(json!({
            "receipts": [],
            "blockNumber": params.block_number,
            "blockHash": params.block_hash,
        }))
    }

    async fn get_transaction_count(
        &self,
        _address: &str,
        _block_tag: Option<String>,
    ) -> Result<Value> {
        self.reply(json!("0x2a"))
    }

    async fn get_code(&self, _address: &str, _block_tag: Option<String>) -> Result<Value> {
        self.reply(json!("0x"))
    }

    async fn get_storage_at(
        &self,
        _address: &str,
        _position: &str,
        _block_tag: Option<String>,
    ) -> Result<Value> {
        self.reply(json!(format!("0x{}", "0".repeat(64))))
    }

    async fn get_logs(&self, filter: LogFilter) -> Result<Value> {
        self.reply(json!([{
            "address": filter.address,
            "topics": filter.topics.unwrap_or_default(),
            "data": "0x",
        }]))
    }

    async fn call(
        &self,
        _transaction: TransactionRequest,
        _block_tag: Option<String>,
    ) -> Result<Value> {
        self.reply(json!("0x"))
    }

    async fn get_token_balances(
        &self,
        address: &str,
        contract_addresses: Option<Vec<String>>,
    ) -> Result<Value> {
        let balances: Vec<Value> = contract_addresses
            .unwrap_or_default()
            .into_iter()
            .map(|contract| json!({ "contractAddress": contract, "tokenBalance": "0x0" }))
            .collect();
        self.reply(json!({ "address": address, "tokenBalances": balances }))
    }

    async fn get_token_metadata(&self, _contract_address: &str) -> Result<Value> {
        self.reply(json!({ "name": "Mock Token", "symbol": "MCK", "decimals": 18, "logo": null }))
    }

    async fn get_asset_transfers(&self, params: AssetTransfersParams) -> Result<Value> {
        self.reply(json!({
            "transfers": [],
            "category": params.category,
            "maxCount": params.max_count,
            "pageKey": params.page_key,
        }))
    }

    async fn send(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        self.reply(json!({ "method": method, "params": params }))
    }
}

#[async_trait]
impl EnsApi for MockBackend {
    async fn resolve_name(&self, name: &str) -> Result<Value> {
        if name.ends_with(".eth") {
            self.reply(json!("0xd8da6bf26964af9d7eed9e03e53415d37aa96045"))
        } else {
            self.reply(Value::Null)
        }
    }

    async fn lookup_address(&self, _address: &str) -> Result<Value> {
        self.reply(json!("mock.eth"))
    }
}

#[async_trait]
impl GasApi for MockBackend {
    async fn get_gas_price(&self) -> Result<Value> {
        self.reply(json!("0x3b9aca00"))
    }

    async fn get_fee_data(&self) -> Result<Value> {
        self.reply(json!({
            "gasPrice": "0x3b9aca00",
            "lastBaseFeePerGas": "0x3b9aca00",
            "maxFeePerGas": "0x77359400",
            "maxPriorityFeePerGas": "0x5f5e100",
        }))
    }

    async fn get_max_priority_fee_per_gas(&self) -> Result<Value> {
        self.reply(json!("0x5f5e100"))
    }

    async fn estimate_gas(&self, _transaction: TransactionRequest) -> Result<Value> {
        self.reply(json!("0x5208"))
    }
}

#[async_trait]
impl SubscriptionApi for MockBackend {
    async fn subscribe(
        &self,
        request: SubscriptionRequest,
        on_event: EventCallback,
    ) -> Result<CancelHandle> {
        if let Fault::Stall = self.fault {
            std::future::pending::<()>().await;
        }
        self.reply(Value::Null)?;
        self.subscribed.fetch_add(1, Ordering::SeqCst);
        on_event(Self::sample_event(&request));

        let cancelled = self.cancelled.clone();
        let fail_cancel = self.fail_cancel;
        Ok(CancelHandle::new(move || {
            cancelled.fetch_add(1, Ordering::SeqCst);
            if fail_cancel {
                Err(ClientError::WebSocket("mock cancel failure".to_string()))
            } else {
                Ok(())
            }
        }))
    }
}
