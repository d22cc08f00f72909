//! NFT REST v3 bindings

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::api::{NftApi, NftMetadataOptions, NftPageOptions, NftSalesOptions};
use crate::client::{push_all, push_opt, AlchemyClient, Query};
use crate::error::Result;

/// Paging keys differ between the owner and contract listings
struct PageKeys {
    cursor: &'static str,
    size: &'static str,
}

const OWNER_PAGING: PageKeys = PageKeys {
    cursor: "pageKey",
    size: "pageSize",
};

const CONTRACT_PAGING: PageKeys = PageKeys {
    cursor: "startToken",
    size: "limit",
};

fn page_query(mut query: Query, options: &NftPageOptions, keys: &PageKeys) -> Query {
    push_opt(&mut query, keys.cursor, options.page_key.as_deref());
    push_opt(&mut query, keys.size, options.page_size);
    push_all(
        &mut query,
        "contractAddresses[]",
        options.contract_addresses.as_deref(),
    );
    push_all(&mut query, "excludeFilters[]", options.exclude_filters.as_deref());
    push_opt(&mut query, "withMetadata", options.omit_metadata.map(|omit| !omit));
    query
}

#[async_trait]
impl NftApi for AlchemyClient {
    async fn get_nfts_for_owner(&self, owner: &str, options: NftPageOptions) -> Result<Value> {
        let query = page_query(vec![("owner", owner.to_string())], &options, &OWNER_PAGING);
        self.nft_get("getNFTsForOwner", &query).await
    }

    async fn get_nft_metadata(
        &self,
        contract_address: &str,
        token_id: &str,
        options: NftMetadataOptions,
    ) -> Result<Value> {
        let mut query = vec![
            ("contractAddress", contract_address.to_string()),
            ("tokenId", token_id.to_string()),
        ];
        push_opt(&mut query, "tokenType", options.token_type);
        push_opt(&mut query, "refreshCache", options.refresh_cache);
        self.nft_get("getNFTMetadata", &query).await
    }

    async fn get_nfts_for_contract(
        &self,
        contract_address: &str,
        options: NftPageOptions,
    ) -> Result<Value> {
        let query = page_query(
            vec![("contractAddress", contract_address.to_string())],
            &options,
            &CONTRACT_PAGING,
        );
        self.nft_get("getNFTsForContract", &query).await
    }

    async fn get_owners_for_nft(&self, contract_address: &str, token_id: &str) -> Result<Value> {
        let query = vec![
            ("contractAddress", contract_address.to_string()),
            ("tokenId", token_id.to_string()),
        ];
        self.nft_get("getOwnersForNFT", &query).await
    }

    async fn get_owners_for_contract(
        &self,
        contract_address: &str,
        with_token_balances: bool,
        page_key: Option<String>,
    ) -> Result<Value> {
        let mut query = vec![
            ("contractAddress", contract_address.to_string()),
            ("withTokenBalances", with_token_balances.to_string()),
        ];
        push_opt(&mut query, "pageKey", page_key);
        self.nft_get("getOwnersForContract", &query).await
    }

    async fn get_contract_metadata(&self, contract_address: &str) -> Result<Value> {
        let query = vec![("contractAddress", contract_address.to_string())];
        self.nft_get("getContractMetadata", &query).await
    }

    async fn get_contracts_for_owner(
        &self,
        owner: &str,
        options: NftPageOptions,
    ) -> Result<Value> {
        let query = page_query(vec![("owner", owner.to_string())], &options, &OWNER_PAGING);
        self.nft_get("getContractsForOwner", &query).await
    }

    async fn get_floor_price(&self, contract_address: &str) -> Result<Value> {
        let query = vec![("contractAddress", contract_address.to_string())];
        self.nft_get("getFloorPrice", &query).await
    }

    async fn get_nft_sales(&self, options: NftSalesOptions) -> Result<Value> {
        let mut query = Query::new();
        push_opt(&mut query, "contractAddress", options.contract_address);
        push_opt(&mut query, "tokenId", options.token_id);
        push_opt(&mut query, "fromBlock", options.from_block);
        push_opt(&mut query, "toBlock", options.to_block);
        push_opt(&mut query, "order", options.order);
        push_opt(&mut query, "marketplace", options.marketplace);
        push_opt(&mut query, "buyerAddress", options.buyer_address);
        push_opt(&mut query, "sellerAddress", options.seller_address);
        push_opt(&mut query, "limit", options.limit);
        push_opt(&mut query, "pageKey", options.page_key);
        self.nft_get("getNFTSales", &query).await
    }

    async fn is_spam_contract(&self, contract_address: &str) -> Result<Value> {
        let query = vec![("contractAddress", contract_address.to_string())];
        self.nft_get("isSpamContract", &query).await
    }

    async fn get_spam_contracts(&self) -> Result<Value> {
        self.nft_get("getSpamContracts", &Query::new()).await
    }

    async fn compute_rarity(&self, contract_address: &str, token_id: &str) -> Result<Value> {
        let query = vec![
            ("contractAddress", contract_address.to_string()),
            ("tokenId", token_id.to_string()),
        ];
        self.nft_get("computeRarity", &query).await
    }

    async fn summarize_nft_attributes(&self, contract_address: &str) -> Result<Value> {
        let query = vec![("contractAddress", contract_address.to_string())];
        self.nft_get("summarizeNFTAttributes", &query).await
    }

    async fn search_contract_metadata(&self, query_text: &str) -> Result<Value> {
        let query = vec![("query", query_text.to_string())];
        self.nft_get("searchContractMetadata", &query).await
    }

    async fn verify_nft_ownership(&self, owner: &str, contract_address: &str) -> Result<Value> {
        let query = vec![
            ("wallet", owner.to_string()),
            ("contractAddress", contract_address.to_string()),
        ];
        self.nft_get("isHolderOfContract", &query).await
    }

    async fn refresh_nft_metadata(
        &self,
        contract_address: &str,
        token_id: &str,
    ) -> Result<Value> {
        let body = json!({
            "contractAddress": contract_address,
            "tokenId": token_id,
        });
        self.nft_post("refreshNftMetadata", body).await
    }
}
