//! ENS resolution over `eth_call`
//!
//! Forward: registry `resolver(node)` then resolver `addr(node)`.
//! Reverse: `<addr>.addr.reverse` through the same path with `name(node)`,
//! accepted only when the name resolves back to the queried address.

use async_trait::async_trait;
use serde_json::{json, Value};
use sha3::{Digest, Keccak256};

use crate::api::EnsApi;
use crate::client::AlchemyClient;
use crate::error::{ClientError, Result};

/// ENS registry (same address on mainnet and testnets)
pub const ENS_REGISTRY: &str = "0x00000000000C2E074eC69A0dFb2997BA6C7d2e1e";

const RESOLVER_SELECTOR: &str = "0178b8bf";
const ADDR_SELECTOR: &str = "3b3b57de";
const NAME_SELECTOR: &str = "691f3431";

/// EIP-137 namehash
pub fn namehash(name: &str) -> [u8; 32] {
    let mut node = [0u8; 32];
    if name.is_empty() {
        return node;
    }
    for label in name.to_lowercase().rsplit('.') {
        let label_hash = Keccak256::digest(label.as_bytes());
        let mut hasher = Keccak256::new();
        hasher.update(node);
        hasher.update(label_hash);
        node = hasher.finalize().into();
    }
    node
}

/// Reverse-registrar name for an address
pub fn reverse_name(address: &str) -> String {
    let hex_part = address.strip_prefix("0x").unwrap_or(address);
    format!("{}.addr.reverse", hex_part.to_lowercase())
}

fn decode_words(output: &Value) -> Result<Vec<u8>> {
    let s = output
        .as_str()
        .ok_or_else(|| ClientError::InvalidResponse("eth_call returned a non-string".into()))?;
    hex::decode(s.strip_prefix("0x").unwrap_or(s))
        .map_err(|e| ClientError::InvalidResponse(format!("eth_call returned bad hex: {}", e)))
}

/// First ABI word as an address; `None` for the zero address or empty output
fn decode_address(output: &Value) -> Result<Option<String>> {
    let bytes = decode_words(output)?;
    if bytes.len() < 32 {
        return Ok(None);
    }
    let address = &bytes[12..32];
    if address.iter().all(|b| *b == 0) {
        return Ok(None);
    }
    Ok(Some(format!("0x{}", hex::encode(address))))
}

fn word_as_usize(word: &[u8]) -> Option<usize> {
    if word[..24].iter().any(|b| *b != 0) {
        return None;
    }
    let mut tail = [0u8; 8];
    tail.copy_from_slice(&word[24..32]);
    usize::try_from(u64::from_be_bytes(tail)).ok()
}

/// ABI-encoded dynamic `string` return value
fn decode_string(output: &Value) -> Result<Option<String>> {
    let bytes = decode_words(output)?;
    if bytes.len() < 64 {
        return Ok(None);
    }
    let malformed = || ClientError::InvalidResponse("malformed ABI string".into());

    let offset = word_as_usize(&bytes[..32]).ok_or_else(malformed)?;
    let start = offset.checked_add(32).ok_or_else(malformed)?;
    let len_word = bytes.get(offset..start).ok_or_else(malformed)?;
    let len = word_as_usize(len_word).ok_or_else(malformed)?;
    let end = start.checked_add(len).ok_or_else(malformed)?;
    let data = bytes.get(start..end).ok_or_else(malformed)?;

    let name = String::from_utf8(data.to_vec()).map_err(|_| malformed())?;
    Ok(Some(name).filter(|n| !n.is_empty()))
}

impl AlchemyClient {
    async fn eth_call_raw(&self, to: &str, selector: &str, node: &[u8; 32]) -> Result<Value> {
        let data = format!("0x{}{}", selector, hex::encode(node));
        self.rpc("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await
    }

    async fn resolver_for(&self, node: &[u8; 32]) -> Result<Option<String>> {
        let output = self.eth_call_raw(ENS_REGISTRY, RESOLVER_SELECTOR, node).await?;
        decode_address(&output)
    }

    async fn resolve_address(&self, name: &str) -> Result<Option<String>> {
        let node = namehash(name);
        let Some(resolver) = self.resolver_for(&node).await? else {
            return Ok(None);
        };
        let output = self.eth_call_raw(&resolver, ADDR_SELECTOR, &node).await?;
        decode_address(&output)
    }
}

#[async_trait]
impl EnsApi for AlchemyClient {
    async fn resolve_name(&self, name: &str) -> Result<Value> {
        Ok(self
            .resolve_address(name)
            .await?
            .map(Value::String)
            .unwrap_or(Value::Null))
    }

    async fn lookup_address(&self, address: &str) -> Result<Value> {
        let node = namehash(&reverse_name(address));
        let Some(resolver) = self.resolver_for(&node).await? else {
            return Ok(Value::Null);
        };
        let output = self.eth_call_raw(&resolver, NAME_SELECTOR, &node).await?;
        let Some(name) = decode_string(&output)? else {
            return Ok(Value::Null);
        };

        let forward = self.resolve_address(&name).await?;
        if forward.as_deref().map(str::to_lowercase) == Some(address.to_lowercase()) {
            Ok(Value::String(name))
        } else {
            Ok(Value::Null)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namehash_vectors() {
        assert_eq!(namehash(""), [0u8; 32]);
        assert_eq!(
            hex::encode(namehash("eth")),
            "93cdeb708b7545dc668eb9280176169d1c33cfd8ed6f04690a0bcc88a93fc4ae"
        );
        assert_eq!(
            hex::encode(namehash("foo.eth")),
            "de9b09fd7c5f901e23a3f19fecc54828e9c848539801e86591bd9801b019f84f"
        );
    }

    #[test]
    fn test_namehash_is_case_insensitive() {
        assert_eq!(namehash("Foo.ETH"), namehash("foo.eth"));
    }

    #[test]
    fn test_reverse_name() {
        assert_eq!(
            reverse_name("0xD8dA6BF26964aF9D7eEd9e03E53415D37aA96045"),
            "d8da6bf26964af9d7eed9e03e53415d37aa96045.addr.reverse"
        );
    }

    #[test]
    fn test_decode_address() {
        let word = format!("0x{}{}", "00".repeat(12), "11".repeat(20));
        assert_eq!(
            decode_address(&json!(word)).unwrap(),
            Some(format!("0x{}", "11".repeat(20)))
        );
        let zero = format!("0x{}", "00".repeat(32));
        assert_eq!(decode_address(&json!(zero)).unwrap(), None);
        assert_eq!(decode_address(&json!("0x")).unwrap(), None);
    }

    #[test]
    fn test_decode_string() {
        // offset 0x20, length 8, "vitalik." padded
        let encoded = format!(
            "0x{:064x}{:064x}{}{}",
            32,
            8,
            hex::encode("vitalik."),
            "00".repeat(24)
        );
        assert_eq!(
            decode_string(&json!(encoded)).unwrap(),
            Some("vitalik.".to_string())
        );
    }

    #[test]
    fn test_decode_string_rejects_bad_offset() {
        let encoded = format!("0x{:064x}{:064x}", 4096, 8);
        assert!(decode_string(&json!(encoded)).is_err());
    }
}
