use alloy_primitives::B256;
use chain_eth::EthError;
use thiserror::Error;

/// Result alias for the RPC layer.
pub type Result<T> = std::result::Result<T, RpcError>;

/// JSON-RPC transport, protocol and workflow errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RpcError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("receipt for {hash} not available after {attempts} attempts")]
    ReceiptTimeout { hash: B256, attempts: u32 },

    #[error("transaction {0} reverted")]
    Reverted(B256),

    #[error("subscription error: {0}")]
    Subscription(String),

    #[error("websocket error: {0}")]
    WebSocket(String),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Eth(#[from] EthError),
}

impl From<reqwest::Error> for RpcError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RpcError::Timeout(e.to_string())
        } else {
            RpcError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for RpcError {
    fn from(e: serde_json::Error) -> Self {
        RpcError::InvalidResponse(e.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for RpcError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        RpcError::WebSocket(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_rpc_error() {
        let err = RpcError::Rpc {
            code: -32000,
            message: "nonce too low".into(),
        };
        assert_eq!(err.to_string(), "rpc error -32000: nonce too low");
    }

    #[test]
    fn display_receipt_timeout() {
        let err = RpcError::ReceiptTimeout {
            hash: B256::ZERO,
            attempts: 60,
        };
        assert!(err.to_string().ends_with("not available after 60 attempts"));
    }

    #[test]
    fn eth_errors_pass_through() {
        let err: RpcError = EthError::UnsupportedType("int256".into()).into();
        assert_eq!(err.to_string(), "unsupported type: int256");
        assert!(matches!(err, RpcError::Eth(EthError::UnsupportedType(_))));
    }

    #[test]
    fn json_errors_are_invalid_responses() {
        let json_err = serde_json::from_str::<u64>("\"x\"").unwrap_err();
        assert!(matches!(RpcError::from(json_err), RpcError::InvalidResponse(_)));
    }
}
