//! Gas tools

use alchemy_client::{GasApi, TransactionRequest};
use serde_json::Value;

use super::schema::{FieldShape, FieldSpec, OperationDescriptor, OperationGroup, ValidArgs};
use crate::error::{DispatchError, Result};

const fn gas(
    name: &'static str,
    title: &'static str,
    description: &'static str,
    fields: &'static [FieldSpec],
) -> OperationDescriptor {
    OperationDescriptor {
        name,
        title,
        description,
        group: OperationGroup::Gas,
        fields,
        read_only: true,
    }
}

pub static OPERATIONS: &[OperationDescriptor] = &[
    gas("getGasPrice", "Gas Price", "Current legacy gas price in wei", &[]),
    gas(
        "getFeeData",
        "Fee Data",
        "Gas price plus EIP-1559 fee suggestions",
        &[],
    ),
    gas(
        "getMaxPriorityFeePerGas",
        "Priority Fee",
        "Suggested EIP-1559 priority fee in wei",
        &[],
    ),
    gas(
        "estimateGas",
        "Estimate Gas",
        "Gas a transaction would consume",
        &[
            FieldSpec::required("to", FieldShape::String, "Target address"),
            FieldSpec::optional("from", FieldShape::String, "Sender address"),
            FieldSpec::optional("data", FieldShape::String, "ABI-encoded calldata"),
            FieldSpec::optional("value", FieldShape::String, "Value in wei as hex"),
        ],
    ),
];

pub async fn forward<B: GasApi + ?Sized>(backend: &B, args: &ValidArgs) -> Result<Value> {
    let value = match args.operation() {
        "getGasPrice" => backend.get_gas_price().await?,
        "getFeeData" => backend.get_fee_data().await?,
        "getMaxPriorityFeePerGas" => backend.get_max_priority_fee_per_gas().await?,
        "estimateGas" => {
            let transaction = TransactionRequest {
                to: args.require_string("to")?.to_string(),
                from: args.string("from"),
                data: args.string("data"),
                value: args.string("value"),
            };
            backend.estimate_gas(transaction).await?
        }
        other => return Err(DispatchError::InvalidOperation(other.to_string())),
    };
    Ok(value)
}
