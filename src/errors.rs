//! Error types for transaction lookup and decoding
//!
//! This module defines the error taxonomy of the lookup pipeline:
//! - Analyzer construction errors
//! - Ledger (RPC) client errors, including archival-state rejections
//! - Metadata service errors
//! - ABI availability and decoding outcomes
//!
//! Only [`LookupError`] ever leaves [`crate::TxAnalyzer::analyze`]. Every
//! other error here is absorbed inside the pipeline and degrades the
//! corresponding part of the report.

use alloy::primitives::{Address, B256};
use thiserror::Error;

/// Top-level error type for a lookup
#[derive(Debug, Error)]
pub enum LookupError {
    /// No transaction exists for the given hash
    #[error("No transaction found for {0}")]
    NotFound(B256),

    /// Errors occurring while building the analyzer
    #[error("Failed to initialize analyzer: {0}")]
    Init(#[from] InitError),

    /// The transaction itself could not be fetched
    #[error("Ledger query failed: {0}")]
    Ledger(#[from] ClientError),
}

/// Initialization-specific errors
///
/// These errors occur while connecting the ledger and metadata clients.
#[derive(Debug, Error)]
pub enum InitError {
    /// Invalid or malformed RPC URL
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    /// WebSocket connection establishment errors
    #[error("WebSocket connection failed: {0}")]
    WsConnection(String),

    /// HTTP client construction errors
    #[error("HTTP client setup failed: {0}")]
    HttpClient(String),
}

/// Errors returned by a [`crate::traits::LedgerClient`]
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// The node cannot serve state for the requested (historical) block
    #[error("Archival access denied: {0}")]
    ArchivalAccessDenied(String),

    /// The node answered with a JSON-RPC error
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Connection or serialization failure
    #[error("Transport error: {0}")]
    Transport(String),
}

impl ClientError {
    /// Check if this error means historical state is unavailable
    pub fn is_archival(&self) -> bool {
        matches!(self, ClientError::ArchivalAccessDenied(_))
    }
}

/// Node error messages that indicate pruned or unavailable historical state
const ARCHIVAL_MARKERS: &[&str] = &[
    "missing trie node",
    "header not found",
    "historical state",
    "state histories",
    "state is not available",
    "archive node",
    "pruned",
];

/// Prefixes of messages for calls that executed and reverted
const REVERT_PREFIXES: &[&str] = &["execution reverted", "reverted", "vm execution error"];

/// Classify a node error message as either an archival rejection or a plain RPC error
///
/// A revert message is never archival, whatever its revert text says.
pub fn classify_rpc_message(message: impl Into<String>) -> ClientError {
    let message = message.into();
    let lowered = message.trim_start().to_lowercase();
    let reverted = REVERT_PREFIXES.iter().any(|prefix| lowered.starts_with(prefix));
    if !reverted && ARCHIVAL_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        ClientError::ArchivalAccessDenied(message)
    } else {
        ClientError::Rpc(message)
    }
}

/// Errors returned by a [`crate::traits::MetadataClient`]
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Request could not be sent or the body could not be read
    #[error("HTTP error: {0}")]
    Http(String),

    /// The service answered with an error status or message
    #[error("Metadata service error: {0}")]
    Api(String),

    /// The service answered with an empty result list
    #[error("Metadata service returned no result")]
    EmptyResult,

    /// The returned ABI is not a valid interface description
    #[error("Invalid ABI: {0}")]
    InvalidAbi(String),
}

/// Cached outcome for an address whose ABI could not be obtained
///
/// Stored in the resolver cache as-is, so later callers for the same
/// address observe the identical failure without a new remote call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("ABI unavailable for {address}: {reason}")]
pub struct AbiUnavailable {
    /// Contract address
    pub address: Address,
    /// Rendered cause
    pub reason: String,
}

/// Reasons call data or a log could not be matched against known signatures
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Call data shorter than a 4-byte selector
    #[error("Input data too short to contain a function selector")]
    InputTooShort,

    /// No registered function has this selector
    #[error("Function selector not found: 0x{}", alloy::hex::encode(.0))]
    UnknownSelector([u8; 4]),

    /// A log without topics cannot be identified
    #[error("Log has no topics, cannot identify event")]
    LogHasNoTopics,

    /// No registered event has this topic0
    #[error("Event signature not found: {0}")]
    UnknownEvent(B256),

    /// Matching signature found but the payload did not decode
    #[error("Failed to decode data: {0}")]
    Abi(#[from] alloy::dyn_abi::Error),
}
