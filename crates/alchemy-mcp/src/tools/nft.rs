//! NFT tools

use alchemy_client::{NftApi, NftMetadataOptions, NftPageOptions, NftSalesOptions};
use serde_json::Value;

use super::schema::{FieldShape, FieldSpec, OperationDescriptor, OperationGroup, ValidArgs};
use crate::error::{DispatchError, Result};

const ORDER: &[&str] = &["asc", "desc"];

const CONTRACT: FieldSpec =
    FieldSpec::required("contractAddress", FieldShape::String, "NFT contract address");
const TOKEN_ID: FieldSpec =
    FieldSpec::required("tokenId", FieldShape::String, "Token id (decimal or hex string)");
const OWNER: FieldSpec =
    FieldSpec::required("owner", FieldShape::String, "Owner address or ENS name");
const PAGE_KEY: FieldSpec =
    FieldSpec::optional("pageKey", FieldShape::String, "Page key from a previous response");
const PAGE_SIZE: FieldSpec =
    FieldSpec::optional("pageSize", FieldShape::Integer, "Maximum results per page");
const OMIT_METADATA: FieldSpec =
    FieldSpec::optional("omitMetadata", FieldShape::Boolean, "Return ids only");
const EXCLUDE_FILTERS: FieldSpec = FieldSpec::optional(
    "excludeFilters",
    FieldShape::StringArray,
    "Filters such as SPAM or AIRDROPS",
);

const fn nft(
    name: &'static str,
    title: &'static str,
    description: &'static str,
    fields: &'static [FieldSpec],
) -> OperationDescriptor {
    OperationDescriptor {
        name,
        title,
        description,
        group: OperationGroup::Nft,
        fields,
        read_only: true,
    }
}

pub static OPERATIONS: &[OperationDescriptor] = &[
    nft(
        "getNftsForOwner",
        "NFTs for Owner",
        "List the NFTs held by an address",
        &[
            OWNER,
            FieldSpec::optional(
                "contractAddresses",
                FieldShape::StringArray,
                "Only return NFTs from these contracts",
            ),
            EXCLUDE_FILTERS,
            PAGE_KEY,
            PAGE_SIZE,
            OMIT_METADATA,
        ],
    ),
    nft(
        "getNftMetadata",
        "NFT Metadata",
        "Fetch metadata for a single NFT",
        &[
            CONTRACT,
            TOKEN_ID,
            FieldSpec::optional("tokenType", FieldShape::String, "ERC721 or ERC1155"),
            FieldSpec::optional(
                "refreshCache",
                FieldShape::Boolean,
                "Ask the provider to refresh cached metadata",
            ),
        ],
    ),
    nft(
        "getNftsForContract",
        "NFTs for Contract",
        "List the NFTs minted by a contract",
        &[CONTRACT, PAGE_KEY, PAGE_SIZE, OMIT_METADATA],
    ),
    nft(
        "getOwnersForNft",
        "Owners for NFT",
        "List the owners of a single NFT",
        &[CONTRACT, TOKEN_ID],
    ),
    nft(
        "getOwnersForContract",
        "Owners for Contract",
        "List every owner of NFTs in a contract",
        &[
            CONTRACT,
            FieldSpec::optional(
                "withTokenBalances",
                FieldShape::Boolean,
                "Include per-token balances",
            ),
            PAGE_KEY,
        ],
    ),
    nft(
        "getContractMetadata",
        "Contract Metadata",
        "Fetch collection-level metadata for a contract",
        &[CONTRACT],
    ),
    nft(
        "getContractsForOwner",
        "Contracts for Owner",
        "List the NFT contracts an address holds tokens from",
        &[OWNER, PAGE_KEY, PAGE_SIZE, EXCLUDE_FILTERS],
    ),
    nft(
        "getFloorPrice",
        "Floor Price",
        "Marketplace floor prices for a collection",
        &[CONTRACT],
    ),
    nft(
        "getNftSales",
        "NFT Sales",
        "Historical NFT sales, optionally filtered",
        &[
            FieldSpec::optional("contractAddress", FieldShape::String, "Collection filter"),
            FieldSpec::optional("tokenId", FieldShape::String, "Token filter"),
            FieldSpec::optional("fromBlock", FieldShape::Block, "First block"),
            FieldSpec::optional("toBlock", FieldShape::Block, "Last block"),
            FieldSpec::optional("order", FieldShape::OneOf(ORDER), "Sort order"),
            FieldSpec::optional("marketplace", FieldShape::String, "Marketplace filter"),
            FieldSpec::optional("buyerAddress", FieldShape::String, "Buyer filter"),
            FieldSpec::optional("sellerAddress", FieldShape::String, "Seller filter"),
            FieldSpec::optional("limit", FieldShape::Integer, "Maximum sales returned"),
            PAGE_KEY,
        ],
    ),
    nft(
        "isSpamContract",
        "Is Spam Contract",
        "Whether a contract is classified as spam",
        &[CONTRACT],
    ),
    nft(
        "getSpamContracts",
        "Spam Contracts",
        "List every contract classified as spam",
        &[],
    ),
    nft(
        "computeRarity",
        "Compute Rarity",
        "Attribute rarity for a single NFT",
        &[CONTRACT, TOKEN_ID],
    ),
    nft(
        "summarizeNftAttributes",
        "Summarize Attributes",
        "Attribute prevalence across a collection",
        &[CONTRACT],
    ),
    nft(
        "searchContractMetadata",
        "Search Contracts",
        "Keyword search over contract metadata",
        &[FieldSpec::required("query", FieldShape::String, "Search keywords")],
    ),
    nft(
        "verifyNftOwnership",
        "Verify Ownership",
        "Whether an address holds any NFT from a contract",
        &[OWNER, CONTRACT],
    ),
    OperationDescriptor {
        name: "refreshNftMetadata",
        title: "Refresh NFT Metadata",
        description: "Queue a metadata refresh for a single NFT",
        group: OperationGroup::Nft,
        fields: &[CONTRACT, TOKEN_ID],
        read_only: false,
    },
];

fn page_options(args: &ValidArgs) -> NftPageOptions {
    NftPageOptions {
        page_key: args.string("pageKey"),
        page_size: args.integer("pageSize"),
        contract_addresses: args.strings("contractAddresses"),
        exclude_filters: args.strings("excludeFilters"),
        omit_metadata: args.boolean("omitMetadata"),
    }
}

pub async fn forward<B: NftApi + ?Sized>(backend: &B, args: &ValidArgs) -> Result<Value> {
    let value = match args.operation() {
        "getNftsForOwner" => {
            backend
                .get_nfts_for_owner(args.require_string("owner")?, page_options(args))
                .await?
        }
        "getNftMetadata" => {
            let options = NftMetadataOptions {
                token_type: args.string("tokenType"),
                refresh_cache: args.boolean("refreshCache"),
            };
            backend
                .get_nft_metadata(
                    args.require_string("contractAddress")?,
                    args.require_string("tokenId")?,
                    options,
                )
                .await?
        }
        "getNftsForContract" => {
            backend
                .get_nfts_for_contract(args.require_string("contractAddress")?, page_options(args))
                .await?
        }
        "getOwnersForNft" => {
            backend
                .get_owners_for_nft(
                    args.require_string("contractAddress")?,
                    args.require_string("tokenId")?,
                )
                .await?
        }
        "getOwnersForContract" => {
            backend
                .get_owners_for_contract(
                    args.require_string("contractAddress")?,
                    args.boolean("withTokenBalances").unwrap_or(false),
                    args.string("pageKey"),
                )
                .await?
        }
        "getContractMetadata" => {
            backend
                .get_contract_metadata(args.require_string("contractAddress")?)
                .await?
        }
        "getContractsForOwner" => {
            backend
                .get_contracts_for_owner(args.require_string("owner")?, page_options(args))
                .await?
        }
        "getFloorPrice" => {
            backend
                .get_floor_price(args.require_string("contractAddress")?)
                .await?
        }
        "getNftSales" => {
            let options = NftSalesOptions {
                contract_address: args.string("contractAddress"),
                token_id: args.string("tokenId"),
                from_block: args.block("fromBlock"),
                to_block: args.block("toBlock"),
                order: args.string("order"),
                marketplace: args.string("marketplace"),
                buyer_address: args.string("buyerAddress"),
                seller_address: args.string("sellerAddress"),
                limit: args.integer("limit"),
                page_key: args.string("pageKey"),
            };
            backend.get_nft_sales(options).await?
        }
        "isSpamContract" => {
            backend
                .is_spam_contract(args.require_string("contractAddress")?)
                .await?
        }
        "getSpamContracts" => backend.get_spam_contracts().await?,
        "computeRarity" => {
            backend
                .compute_rarity(
                    args.require_string("contractAddress")?,
                    args.require_string("tokenId")?,
                )
                .await?
        }
        "summarizeNftAttributes" => {
            backend
                .summarize_nft_attributes(args.require_string("contractAddress")?)
                .await?
        }
        "searchContractMetadata" => {
            backend
                .search_contract_metadata(args.require_string("query")?)
                .await?
        }
        "verifyNftOwnership" => {
            backend
                .verify_nft_ownership(
                    args.require_string("owner")?,
                    args.require_string("contractAddress")?,
                )
                .await?
        }
        "refreshNftMetadata" => {
            backend
                .refresh_nft_metadata(
                    args.require_string("contractAddress")?,
                    args.require_string("tokenId")?,
                )
                .await?
        }
        other => return Err(DispatchError::InvalidOperation(other.to_string())),
    };
    Ok(value)
}
