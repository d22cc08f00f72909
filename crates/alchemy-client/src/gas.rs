//! Gas pricing bindings

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::api::{GasApi, TransactionRequest};
use crate::client::{parse_quantity, to_quantity, AlchemyClient};
use crate::error::Result;

/// EIP-1559 fee suggestion: `maxFeePerGas = 2 * baseFee + priorityFee`
fn fee_data(gas_price: &Value, base_fee: Option<u128>, priority_fee: &Value) -> Value {
    let max_fee = base_fee
        .zip(parse_quantity(priority_fee))
        .and_then(|(base, tip)| base.checked_mul(2)?.checked_add(tip))
        .map(to_quantity);

    json!({
        "gasPrice": gas_price,
        "lastBaseFeePerGas": base_fee.map(to_quantity),
        "maxFeePerGas": max_fee,
        "maxPriorityFeePerGas": if base_fee.is_some() { priority_fee.clone() } else { Value::Null },
    })
}

#[async_trait]
impl GasApi for AlchemyClient {
    async fn get_gas_price(&self) -> Result<Value> {
        self.rpc("eth_gasPrice", json!([])).await
    }

    async fn get_fee_data(&self) -> Result<Value> {
        let block = self
            .rpc("eth_getBlockByNumber", json!(["latest", false]))
            .await?;
        let gas_price = self.get_gas_price().await?;
        let base_fee = block.get("baseFeePerGas").and_then(parse_quantity);

        let priority_fee = if base_fee.is_some() {
            self.get_max_priority_fee_per_gas().await?
        } else {
            Value::Null
        };

        Ok(fee_data(&gas_price, base_fee, &priority_fee))
    }

    async fn get_max_priority_fee_per_gas(&self) -> Result<Value> {
        self.rpc("eth_maxPriorityFeePerGas", json!([])).await
    }

    async fn estimate_gas(&self, transaction: TransactionRequest) -> Result<Value> {
        self.rpc("eth_estimateGas", json!([transaction])).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_data_eip1559() {
        let data = fee_data(&json!("0x3b9aca00"), Some(1_000), &json!("0x64"));
        assert_eq!(data["gasPrice"], "0x3b9aca00");
        assert_eq!(data["lastBaseFeePerGas"], "0x3e8");
        // 2 * 1000 + 100
        assert_eq!(data["maxFeePerGas"], "0x834");
        assert_eq!(data["maxPriorityFeePerGas"], "0x64");
    }

    #[test]
    fn test_fee_data_legacy_chain() {
        let data = fee_data(&json!("0x1"), None, &Value::Null);
        assert_eq!(data["gasPrice"], "0x1");
        assert!(data["lastBaseFeePerGas"].is_null());
        assert!(data["maxFeePerGas"].is_null());
        assert!(data["maxPriorityFeePerGas"].is_null());
    }
}
