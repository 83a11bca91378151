//! Error taxonomy shared by every ChainContract crate.

use alloy_primitives::{Address, Bytes, B256};
use thiserror::Error;

use crate::chain::Receipt;
use crate::request::JsonRpcError;
use crate::revert::RevertReason;

/// Errors raised while talking to a node.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed (connection refused, bad status, etc.).
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON-RPC protocol-level error returned by the node.
    #[error("RPC error {}: {}", .0.code, .0.message)]
    Rpc(JsonRpcError),

    #[error("Request timed out after {ms}ms")]
    Timeout { ms: u64 },

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Returns `true` if this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Timeout { .. })
    }

    /// Revert payload attached to a node execution error, if any.
    pub fn revert_data(&self) -> Option<Bytes> {
        let Self::Rpc(err) = self else {
            return None;
        };
        let hex_str = err.data_hex()?;
        let stripped = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        hex::decode(stripped).ok().map(Bytes::from)
    }

    /// Whether the node reported an execution revert.
    pub fn is_revert(&self) -> bool {
        match self {
            Self::Rpc(err) => {
                err.code == 3 || err.message.contains("revert") || self.revert_data().is_some()
            }
            _ => false,
        }
    }
}

/// Errors surfaced by ABI handling, dispatch, deployment and batching.
#[derive(Debug, Error)]
pub enum ContractError {
    /// The ABI source could not be parsed: bad JSON shape, unsupported type
    /// string, invalid signature or duplicate selector.
    #[error("malformed ABI: {reason}")]
    MalformedAbi { reason: String },

    #[error("unknown function '{name}': {reason}")]
    UnknownFunction { name: String, reason: String },

    #[error("unknown event for topic0 {topic}")]
    UnknownEvent { topic: String },

    #[error("ambiguous call to '{name}', candidates: {}", .candidates.join(", "))]
    AmbiguousSelector { name: String, candidates: Vec<String> },

    #[error("decoding failed: {reason}")]
    DecodingError { reason: String },

    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("call reverted: {reason}")]
    CallReverted { reason: RevertReason },

    #[error("transaction {} failed{}", .receipt.transaction_hash, .reason.as_ref().map(|r| format!(": {r}")).unwrap_or_default())]
    TransactionFailed {
        receipt: Box<Receipt>,
        reason: Option<RevertReason>,
    },

    #[error("address mismatch: expected {expected}, got {actual}")]
    AddressMismatch { expected: Address, actual: Address },

    #[error("batch call {index} failed: {reason}")]
    BatchFailed { index: usize, reason: RevertReason },

    /// Loading a key or signing a transaction failed.
    #[error("signing failed: {reason}")]
    Signing { reason: String },
}

impl ContractError {
    /// Stable classification label, printed by the CLI on failure.
    pub fn classification(&self) -> &'static str {
        match self {
            Self::MalformedAbi { .. } => "MalformedAbi",
            Self::UnknownFunction { .. } => "UnknownFunction",
            Self::UnknownEvent { .. } => "UnknownEvent",
            Self::AmbiguousSelector { .. } => "AmbiguousSelector",
            Self::DecodingError { .. } => "DecodingError",
            Self::InvalidArgument { .. } => "InvalidArgument",
            Self::Transport(_) => "TransportError",
            Self::CallReverted { .. } => "CallReverted",
            Self::TransactionFailed { .. } => "TransactionFailed",
            Self::AddressMismatch { .. } => "AddressMismatch",
            Self::BatchFailed { .. } => "BatchFailed",
            Self::Signing { .. } => "Signing",
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedAbi { reason: reason.into() }
    }

    pub fn decoding(reason: impl Into<String>) -> Self {
        Self::DecodingError { reason: reason.into() }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument { reason: reason.into() }
    }

    pub fn signing(reason: impl Into<String>) -> Self {
        Self::Signing { reason: reason.into() }
    }

    pub fn unknown_event(topic: Option<&B256>) -> Self {
        Self::UnknownEvent {
            topic: topic.map_or_else(|| "<none>".to_string(), |t| t.to_string()),
        }
    }
}
