//! Core chain tools: blocks, transactions, state, logs, tokens

use alchemy_client::{
    AssetTransfersParams, CoreApi, LogFilter, TransactionReceiptsParams, TransactionRequest,
};
use serde_json::Value;

use super::schema::{FieldShape, FieldSpec, OperationDescriptor, OperationGroup, ValidArgs};
use crate::error::{DispatchError, Result};

const ORDER: &[&str] = &["asc", "desc"];

const ADDRESS: FieldSpec = FieldSpec::required("address", FieldShape::String, "Account address");
const HASH: FieldSpec = FieldSpec::required("hash", FieldShape::String, "Transaction hash");
const BLOCK_TAG: FieldSpec = FieldSpec::optional(
    "blockTag",
    FieldShape::Block,
    "Block tag, hash or number (default latest)",
);
const FROM_BLOCK: FieldSpec = FieldSpec::optional("fromBlock", FieldShape::Block, "First block");
const TO_BLOCK: FieldSpec = FieldSpec::optional("toBlock", FieldShape::Block, "Last block");

const fn core(
    name: &'static str,
    title: &'static str,
    description: &'static str,
    fields: &'static [FieldSpec],
) -> OperationDescriptor {
    OperationDescriptor {
        name,
        title,
        description,
        group: OperationGroup::Core,
        fields,
        read_only: true,
    }
}

pub static OPERATIONS: &[OperationDescriptor] = &[
    core(
        "getBlockNumber",
        "Block Number",
        "Most recent block number",
        &[],
    ),
    core(
        "getBalance",
        "Balance",
        "Native token balance of an address in wei",
        &[ADDRESS, BLOCK_TAG],
    ),
    core(
        "getBlock",
        "Block",
        "Fetch a block by hash, tag or number",
        &[FieldSpec::required(
            "blockHashOrBlockTag",
            FieldShape::Block,
            "Block hash, tag or number",
        )],
    ),
    core(
        "getTransaction",
        "Transaction",
        "Fetch a transaction by hash",
        &[HASH],
    ),
    core(
        "getTransactionReceipt",
        "Transaction Receipt",
        "Fetch the receipt of a mined transaction",
        &[HASH],
    ),
    core(
        "getTransactionReceipts",
        "Block Receipts",
        "Every receipt in a block, by number or hash",
        &[
            FieldSpec::optional("blockNumber", FieldShape::Block, "Block number"),
            FieldSpec::optional("blockHash", FieldShape::String, "Block hash"),
        ],
    ),
    core(
        "getTransactionCount",
        "Transaction Count",
        "Nonce of an address",
        &[ADDRESS, BLOCK_TAG],
    ),
    core(
        "getCode",
        "Code",
        "Contract bytecode deployed at an address",
        &[ADDRESS, BLOCK_TAG],
    ),
    core(
        "getStorageAt",
        "Storage",
        "Raw storage slot of a contract",
        &[
            ADDRESS,
            FieldSpec::required("position", FieldShape::String, "Storage slot as hex"),
            BLOCK_TAG,
        ],
    ),
    core(
        "getLogs",
        "Logs",
        "Event logs matching a filter",
        &[
            FieldSpec::optional("address", FieldShape::String, "Emitting contract"),
            FieldSpec::optional("topics", FieldShape::Array, "Topic filter"),
            FROM_BLOCK,
            TO_BLOCK,
            FieldSpec::optional("blockHash", FieldShape::String, "Single block by hash"),
        ],
    ),
    core(
        "call",
        "Call",
        "Execute a read-only contract call",
        &[
            FieldSpec::required("to", FieldShape::String, "Target address"),
            FieldSpec::optional("from", FieldShape::String, "Caller address"),
            FieldSpec::optional("data", FieldShape::String, "ABI-encoded calldata"),
            FieldSpec::optional("value", FieldShape::String, "Value in wei as hex"),
            BLOCK_TAG,
        ],
    ),
    core(
        "getTokenBalances",
        "Token Balances",
        "ERC-20 balances held by an address",
        &[
            ADDRESS,
            FieldSpec::optional(
                "contractAddresses",
                FieldShape::StringArray,
                "Token contracts to check (default all ERC-20)",
            ),
        ],
    ),
    core(
        "getTokenMetadata",
        "Token Metadata",
        "Name, symbol, decimals and logo of an ERC-20 token",
        &[FieldSpec::required(
            "contractAddress",
            FieldShape::String,
            "Token contract address",
        )],
    ),
    core(
        "getAssetTransfers",
        "Asset Transfers",
        "Historical transfers of native, ERC-20, ERC-721 and ERC-1155 assets",
        &[
            FieldSpec::required(
                "category",
                FieldShape::StringArray,
                "external, internal, erc20, erc721, erc1155, specialnft",
            ),
            FROM_BLOCK,
            TO_BLOCK,
            FieldSpec::optional("fromAddress", FieldShape::String, "Sender filter"),
            FieldSpec::optional("toAddress", FieldShape::String, "Recipient filter"),
            FieldSpec::optional(
                "contractAddresses",
                FieldShape::StringArray,
                "Token contract filter",
            ),
            FieldSpec::optional(
                "excludeZeroValue",
                FieldShape::Boolean,
                "Skip zero-value transfers",
            ),
            FieldSpec::optional("maxCount", FieldShape::Integer, "Maximum transfers returned"),
            FieldSpec::optional("pageKey", FieldShape::String, "Page key from a previous response"),
            FieldSpec::optional("withMetadata", FieldShape::Boolean, "Include block timestamps"),
            FieldSpec::optional("order", FieldShape::OneOf(ORDER), "Sort order"),
        ],
    ),
    OperationDescriptor {
        name: "send",
        title: "Raw JSON-RPC",
        description: "Send an arbitrary JSON-RPC request to the provider",
        group: OperationGroup::Core,
        fields: &[
            FieldSpec::required("method", FieldShape::String, "JSON-RPC method name"),
            FieldSpec::optional("params", FieldShape::Array, "Positional parameters"),
        ],
        read_only: false,
    },
];

pub async fn forward<B: CoreApi + ?Sized>(backend: &B, args: &ValidArgs) -> Result<Value> {
    let value = match args.operation() {
        "getBlockNumber" => backend.get_block_number().await?,
        "getBalance" => {
            backend
                .get_balance(args.require_string("address")?, args.block("blockTag"))
                .await?
        }
        "getBlock" => {
            backend
                .get_block(&args.require_block("blockHashOrBlockTag")?)
                .await?
        }
        "getTransaction" => backend.get_transaction(args.require_string("hash")?).await?,
        "getTransactionReceipt" => {
            backend
                .get_transaction_receipt(args.require_string("hash")?)
                .await?
        }
        "getTransactionReceipts" => {
            let params = TransactionReceiptsParams {
                block_number: args.block("blockNumber"),
                block_hash: args.string("blockHash"),
            };
            backend.get_transaction_receipts(params).await?
        }
        "getTransactionCount" => {
            backend
                .get_transaction_count(args.require_string("address")?, args.block("blockTag"))
                .await?
        }
        "getCode" => {
            backend
                .get_code(args.require_string("address")?, args.block("blockTag"))
                .await?
        }
        "getStorageAt" => {
            backend
                .get_storage_at(
                    args.require_string("address")?,
                    args.require_string("position")?,
                    args.block("blockTag"),
                )
                .await?
        }
        "getLogs" => {
            let filter = LogFilter {
                address: args.string("address"),
                topics: args.array("topics"),
                from_block: args.block("fromBlock"),
                to_block: args.block("toBlock"),
                block_hash: args.string("blockHash"),
            };
            backend.get_logs(filter).await?
        }
        "call" => {
            let transaction = TransactionRequest {
                to: args.require_string("to")?.to_string(),
                from: args.string("from"),
                data: args.string("data"),
                value: args.string("value"),
            };
            backend.call(transaction, args.block("blockTag")).await?
        }
        "getTokenBalances" => {
            backend
                .get_token_balances(
                    args.require_string("address")?,
                    args.strings("contractAddresses"),
                )
                .await?
        }
        "getTokenMetadata" => {
            backend
                .get_token_metadata(args.require_string("contractAddress")?)
                .await?
        }
        "getAssetTransfers" => {
            let params = AssetTransfersParams {
                category: args.require_strings("category")?,
                from_block: args.block("fromBlock"),
                to_block: args.block("toBlock"),
                from_address: args.string("fromAddress"),
                to_address: args.string("toAddress"),
                contract_addresses: args.strings("contractAddresses"),
                exclude_zero_value: args.boolean("excludeZeroValue"),
                max_count: args.integer("maxCount").map(|n| format!("{:#x}", n)),
                page_key: args.string("pageKey"),
                with_metadata: args.boolean("withMetadata"),
                order: args.string("order"),
            };
            backend.get_asset_transfers(params).await?
        }
        "send" => {
            backend
                .send(
                    args.require_string("method")?,
                    args.array("params").unwrap_or_default(),
                )
                .await?
        }
        other => return Err(DispatchError::InvalidOperation(other.to_string())),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_names_unique() {
        let mut names: Vec<_> = OPERATIONS.iter().map(|op| op.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), OPERATIONS.len());
        assert_eq!(names.len(), 15);
    }
}
