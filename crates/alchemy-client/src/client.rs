//! HTTP binding for Alchemy's hosted endpoints
//!
//! JSON-RPC goes to `https://{network}.g.alchemy.com/v2/{key}`, NFT REST v3
//! to `https://{network}.g.alchemy.com/nft/v3/{key}/{method}`.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tracing::trace;

use crate::error::{ClientError, Result};
use crate::network::Network;

/// Query string pairs; repeated keys are allowed (`contractAddresses[]`)
pub(crate) type Query = Vec<(&'static str, String)>;

/// Alchemy API client
pub struct AlchemyClient {
    http: Client,
    api_key: String,
    network: Network,
    next_id: AtomicU64,
}

impl AlchemyClient {
    /// Create a client for `network` authenticated by `api_key`
    pub fn new(api_key: impl Into<String>, network: Network) -> Self {
        Self {
            http: Client::new(),
            api_key: api_key.into(),
            network,
            next_id: AtomicU64::new(1),
        }
    }

    /// Network this client talks to
    pub fn network(&self) -> Network {
        self.network
    }

    pub(crate) fn rpc_url(&self) -> String {
        format!("https://{}.g.alchemy.com/v2/{}", self.network, self.api_key)
    }

    pub(crate) fn nft_url(&self, method: &str) -> String {
        format!(
            "https://{}.g.alchemy.com/nft/v3/{}/{}",
            self.network, self.api_key, method
        )
    }

    pub(crate) fn ws_url(&self) -> String {
        format!("wss://{}.g.alchemy.com/v2/{}", self.network, self.api_key)
    }

    /// Issue a single JSON-RPC call and return its `result`
    pub async fn rpc(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        trace!("rpc -> {} {}", method, body["params"]);
        let resp = self.http.post(self.rpc_url()).json(&body).send().await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;
        let reply = decode_body(status, &bytes)?;

        if let Some(error) = reply.get("error") {
            let code = error.get("code").and_then(Value::as_i64).unwrap_or_default();
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string();
            return Err(ClientError::Rpc { code, message });
        }

        if !status.is_success() {
            return Err(ClientError::Api(api_message(&reply, status)));
        }

        reply
            .get("result")
            .cloned()
            .ok_or_else(|| ClientError::InvalidResponse(format!("{}: missing result", method)))
    }

    /// GET an NFT v3 endpoint
    pub(crate) async fn nft_get(&self, method: &str, query: &Query) -> Result<Value> {
        trace!("nft GET {} {:?}", method, query);
        let resp = self.http.get(self.nft_url(method)).query(query).send().await?;
        read_rest_reply(resp).await
    }

    /// POST an NFT v3 endpoint
    pub(crate) async fn nft_post(&self, method: &str, body: Value) -> Result<Value> {
        trace!("nft POST {} {}", method, body);
        let resp = self.http.post(self.nft_url(method)).json(&body).send().await?;
        read_rest_reply(resp).await
    }
}

impl fmt::Debug for AlchemyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlchemyClient")
            .field("network", &self.network)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

async fn read_rest_reply(resp: reqwest::Response) -> Result<Value> {
    let status = resp.status();
    let bytes = resp.bytes().await?;
    let reply = decode_body(status, &bytes)?;

    if !status.is_success() {
        return Err(ClientError::Api(api_message(&reply, status)));
    }
    Ok(reply)
}

fn decode_body(status: StatusCode, bytes: &[u8]) -> Result<Value> {
    match serde_json::from_slice(bytes) {
        Ok(v) => Ok(v),
        Err(e) if status.is_success() => Err(ClientError::Serialization(e)),
        Err(_) => {
            let text = String::from_utf8_lossy(bytes).trim().to_string();
            if text.is_empty() {
                Err(ClientError::Api(status.to_string()))
            } else {
                Err(ClientError::Api(text))
            }
        }
    }
}

/// Best human-readable message from an error body
fn api_message(reply: &Value, status: StatusCode) -> String {
    reply
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| reply.get("error").and_then(Value::as_str))
        .or_else(|| {
            reply
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
        })
        .map(str::to_string)
        .unwrap_or_else(|| status.to_string())
}

/// Append `key=value` when the option is set
pub(crate) fn push_opt(query: &mut Query, key: &'static str, value: Option<impl ToString>) {
    if let Some(value) = value {
        query.push((key, value.to_string()));
    }
}

/// Append one `key=item` pair per element
pub(crate) fn push_all(query: &mut Query, key: &'static str, values: Option<&[String]>) {
    for value in values.unwrap_or_default() {
        query.push((key, value.clone()));
    }
}

/// Decode a JSON-RPC hex quantity
pub(crate) fn parse_quantity(value: &Value) -> Option<u128> {
    let s = value.as_str()?;
    u128::from_str_radix(s.strip_prefix("0x")?, 16).ok()
}

/// Encode a JSON-RPC hex quantity
pub(crate) fn to_quantity(n: u128) -> String {
    format!("{:#x}", n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_urls() {
        let client = AlchemyClient::new("demo", Network::BaseSepolia);
        assert_eq!(client.rpc_url(), "https://base-sepolia.g.alchemy.com/v2/demo");
        assert_eq!(
            client.nft_url("getNFTsForOwner"),
            "https://base-sepolia.g.alchemy.com/nft/v3/demo/getNFTsForOwner"
        );
        assert_eq!(client.ws_url(), "wss://base-sepolia.g.alchemy.com/v2/demo");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let client = AlchemyClient::new("super-secret", Network::EthMainnet);
        let rendered = format!("{:?}", client);
        assert!(!rendered.contains("super-secret"));
    }

    #[test]
    fn test_api_message_prefers_message_field() {
        let body = json!({ "message": "Contract address is invalid" });
        assert_eq!(
            api_message(&body, StatusCode::BAD_REQUEST),
            "Contract address is invalid"
        );

        let nested = json!({ "error": { "message": "Must be authenticated!" } });
        assert_eq!(
            api_message(&nested, StatusCode::UNAUTHORIZED),
            "Must be authenticated!"
        );

        assert_eq!(
            api_message(&json!({}), StatusCode::TOO_MANY_REQUESTS),
            "429 Too Many Requests"
        );
    }

    #[test]
    fn test_decode_body_non_json_error() {
        let err = decode_body(StatusCode::BAD_GATEWAY, b"upstream down").unwrap_err();
        assert_eq!(err.to_string(), "upstream down");
    }

    #[test]
    fn test_quantity_helpers() {
        assert_eq!(parse_quantity(&json!("0x3b9aca00")), Some(1_000_000_000));
        assert_eq!(parse_quantity(&json!("12")), None);
        assert_eq!(parse_quantity(&Value::Null), None);
        assert_eq!(to_quantity(1000), "0x3e8");
    }

    #[test]
    fn test_query_helpers() {
        let mut query = Query::new();
        push_opt(&mut query, "pageSize", Some(50u64));
        push_opt(&mut query, "pageKey", None::<String>);
        let addresses = vec!["0xa".to_string(), "0xb".to_string()];
        push_all(&mut query, "contractAddresses[]", Some(addresses.as_slice()));
        assert_eq!(
            query,
            vec![
                ("pageSize", "50".to_string()),
                ("contractAddresses[]", "0xa".to_string()),
                ("contractAddresses[]", "0xb".to_string()),
            ]
        );
    }
}
