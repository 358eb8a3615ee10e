use std::io;
use thiserror::Error;

/// Infrastructure-level failures. Protocol rejections are not errors: they are
/// `PoolMessage` codes relayed back to the originating peer.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("{format} serialization error: {details}")]
    Serialization { format: String, details: String },

    #[error("crypto error during {operation}: {details}")]
    Crypto { operation: String, details: String },

    #[error("operator key unavailable: {0}")]
    OperatorKey(String),

    #[error("wire message too short: {size} bytes")]
    MessageTooShort { size: usize },

    #[error("wire protocol version mismatch: expected {expected}, got {actual}")]
    WireVersionMismatch { expected: u16, actual: u16 },

    #[error("{0}")]
    Message(String),
}

pub type Result<T> = std::result::Result<T, PoolError>;

impl From<bincode::Error> for PoolError {
    fn from(err: bincode::Error) -> Self {
        PoolError::Serialization { format: "bincode".to_string(), details: err.to_string() }
    }
}

impl From<serde_json::Error> for PoolError {
    fn from(err: serde_json::Error) -> Self {
        PoolError::Serialization { format: "json".to_string(), details: err.to_string() }
    }
}

impl From<hex::FromHexError> for PoolError {
    fn from(err: hex::FromHexError) -> Self {
        PoolError::Serialization { format: "hex".to_string(), details: err.to_string() }
    }
}

impl From<secp256k1::Error> for PoolError {
    fn from(err: secp256k1::Error) -> Self {
        PoolError::Crypto { operation: "secp256k1".to_string(), details: err.to_string() }
    }
}

impl From<io::Error> for PoolError {
    fn from(err: io::Error) -> Self {
        PoolError::Message(err.to_string())
    }
}

// NOTE: Avoid adding generic "stringly" conversions here. Use structured
// `PoolError` variants at the call site to preserve context.
