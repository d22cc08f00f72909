//! Dispatch failure classification

use alchemy_client::ClientError;
use serde_json::json;
use thiserror::Error;

use crate::protocol::{codes, JsonRpcError};

/// Why a tool invocation failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("Unknown operation: {0}")]
    InvalidOperation(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// Carries the backend's message unchanged
    #[error("{0}")]
    BackendError(String),
}

impl DispatchError {
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::InvalidOperation(_) => "InvalidOperation",
            DispatchError::InvalidParameters(_) => "InvalidParameters",
            DispatchError::BackendError(_) => "BackendError",
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            DispatchError::InvalidOperation(_) => codes::METHOD_NOT_FOUND,
            DispatchError::InvalidParameters(_) => codes::INVALID_PARAMS,
            DispatchError::BackendError(_) => codes::INTERNAL_ERROR,
        }
    }
}

impl From<ClientError> for DispatchError {
    fn from(e: ClientError) -> Self {
        if let ClientError::Rpc { code, .. } = &e {
            tracing::debug!(code, "Backend returned a JSON-RPC error");
        }
        DispatchError::BackendError(e.to_string())
    }
}

impl From<DispatchError> for JsonRpcError {
    fn from(e: DispatchError) -> Self {
        JsonRpcError::new(e.code(), e.to_string()).with_data(json!({ "kind": e.kind() }))
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jsonrpc_mapping() {
        let cases = [
            (DispatchError::InvalidOperation("x".into()), -32601, "InvalidOperation"),
            (DispatchError::InvalidParameters("y".into()), -32602, "InvalidParameters"),
            (DispatchError::BackendError("z".into()), -32603, "BackendError"),
        ];
        for (err, code, kind) in cases {
            let rpc: JsonRpcError = err.into();
            assert_eq!(rpc.code, code);
            assert_eq!(rpc.data.unwrap()["kind"], kind);
        }
    }

    #[test]
    fn test_backend_message_verbatim() {
        let err: DispatchError = ClientError::Api("Contract not found".into()).into();
        assert_eq!(err, DispatchError::BackendError("Contract not found".into()));

        let rpc: JsonRpcError = err.into();
        assert_eq!(rpc.message, "Contract not found");
    }
}
