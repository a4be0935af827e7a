//! Core types for transaction lookup
//!
//! This module defines the data structures used throughout the pipeline:
//! - Chain data as fetched from the ledger (transaction, receipt, logs)
//! - Network selection and lookup options
//! - The final [`LookupResult`] report and its parts

use std::{fmt, str::FromStr};

pub use alloy::primitives::{Address, Bytes, B256, U256};
use serde::{Serialize, Serializer};

use crate::decoder::{CallDecoding, LogDecoding};

/// Placeholder rendered in place of a recipient for contract creations
pub const CONTRACT_CREATION: &str = "(contract creation)";

/// A fetched transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    /// Transaction hash
    pub hash: B256,
    /// Sender address
    pub from: Address,
    /// Recipient, `None` for contract creation
    pub to: Option<Address>,
    /// Call data
    pub input: Bytes,
    /// Native value sent
    pub value: U256,
    /// Sender nonce
    pub nonce: u64,
    /// Effective gas price in wei
    pub gas_price: u128,
    /// Gas limit
    pub gas_limit: u64,
    /// Containing block, `None` while pending
    pub block_number: Option<u64>,
}

/// Receipt execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    /// Execution succeeded
    Success,
    /// Execution reverted or halted
    Failure,
    /// Pre-Byzantium receipt or no receipt at all
    Unknown,
}

impl TxStatus {
    /// Check if this status triggers revert-reason extraction
    pub fn is_failure(&self) -> bool {
        matches!(self, TxStatus::Failure)
    }
}

/// A single log emitted by a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// Emitting contract
    pub address: Address,
    /// Indexed topics, topic0 first
    pub topics: Vec<B256>,
    /// Non-indexed data
    pub data: Bytes,
}

/// A fetched transaction receipt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    /// Actual sender
    pub from: Address,
    /// Gas used by the transaction
    pub gas_used: u64,
    /// Execution status
    pub status: TxStatus,
    /// Emitted logs in order
    pub logs: Vec<LogEntry>,
    /// Address of the created contract, only for contract creation
    pub contract_address: Option<Address>,
}

/// Read-only call request used for replays and accessor probes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    /// Caller, `None` for an anonymous call
    pub from: Option<Address>,
    /// Callee, `None` replays a contract creation
    pub to: Option<Address>,
    /// Call data
    pub input: Bytes,
    /// Native value
    pub value: U256,
    /// Gas limit, `None` lets the node decide
    pub gas: Option<u64>,
}

impl CallRequest {
    /// Build a zero-value call to `to` with the given call data
    pub fn read(to: Address, input: Bytes) -> Self {
        Self { from: None, to: Some(to), input, value: U256::ZERO, gas: None }
    }
}

impl From<&Transaction> for CallRequest {
    fn from(tx: &Transaction) -> Self {
        Self {
            from: Some(tx.from),
            to: tx.to,
            input: tx.input.clone(),
            value: tx.value,
            gas: Some(tx.gas_limit),
        }
    }
}

/// Outcome of a read-only call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutput {
    /// The call returned normally
    Returned(Bytes),
    /// The call reverted with this payload
    Reverted(Bytes),
}

impl CallOutput {
    /// Return data or revert payload
    pub fn data(&self) -> &Bytes {
        match self {
            CallOutput::Returned(data) | CallOutput::Reverted(data) => data,
        }
    }

    pub fn is_reverted(&self) -> bool {
        matches!(self, CallOutput::Reverted(_))
    }
}

/// Supported networks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Goerli,
    Sepolia,
    Holesky,
}

impl Network {
    /// Lowercase network name as used in service host names
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Goerli => "goerli",
            Network::Sepolia => "sepolia",
            Network::Holesky => "holesky",
        }
    }

    /// Base URL of the metadata service for this network
    pub fn etherscan_url(&self) -> String {
        match self {
            Network::Mainnet => "https://api.etherscan.io/api".to_string(),
            other => format!("https://api-{}.etherscan.io/api", other.as_str()),
        }
    }

    /// Public RPC endpoint used when no RPC URL is configured
    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://eth.llamarpc.com",
            Network::Goerli => "https://ethereum-goerli-rpc.publicnode.com",
            Network::Sepolia => "https://ethereum-sepolia-rpc.publicnode.com",
            Network::Holesky => "https://ethereum-holesky-rpc.publicnode.com",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "homestead" => Ok(Network::Mainnet),
            "goerli" => Ok(Network::Goerli),
            "sepolia" => Ok(Network::Sepolia),
            "holesky" => Ok(Network::Holesky),
            other => Err(format!("unsupported network: {other}")),
        }
    }
}

/// Lookup configuration
#[derive(Debug, Clone, Default)]
pub struct LookupOptions {
    /// Network to query
    pub network: Network,
    /// Metadata service API key
    pub etherscan_key: Option<String>,
    /// RPC endpoint, defaults to [`Network::default_rpc_url`]
    pub rpc_url: Option<String>,
    /// Metadata service base URL, defaults to [`Network::etherscan_url`]
    pub etherscan_url: Option<String>,
}

impl LookupOptions {
    /// Options for `network` with key and RPC URL taken from the environment
    ///
    /// Reads `ETHERSCAN_API_KEY` and `ETH_RPC_URL`.
    pub fn from_env(network: Network) -> Self {
        Self {
            network,
            etherscan_key: std::env::var("ETHERSCAN_API_KEY").ok(),
            rpc_url: std::env::var("ETH_RPC_URL").ok(),
            etherscan_url: None,
        }
    }

    pub fn rpc_url(&self) -> &str {
        self.rpc_url.as_deref().unwrap_or_else(|| self.network.default_rpc_url())
    }

    pub fn etherscan_url(&self) -> String {
        self.etherscan_url.clone().unwrap_or_else(|| self.network.etherscan_url())
    }
}

/// Transaction recipient as reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    Address(Address),
    ContractCreation,
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recipient::Address(address) => write!(f, "{address}"),
            Recipient::ContractCreation => f.write_str(CONTRACT_CREATION),
        }
    }
}

impl Serialize for Recipient {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Contract identity as reported
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ContractIdentity {
    /// Verified contract name from the metadata service
    Named(String),
    /// Address created by a contract-creation transaction
    Created(Address),
}

/// Human-friendly gas figures
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GasFormat {
    /// Gas price in gwei
    pub price_gwei: f64,
    /// Gas limit
    pub limit: u64,
    /// Gas used, `None` without a receipt
    pub used: Option<u64>,
}

/// Non-fatal conditions met while building a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LookupWarning {
    /// Proxy target read at latest state because historical state was unavailable
    ProxyProbeAtLatest {
        proxy: Address,
        block: u64,
    },
    /// Failed transaction replayed at latest state; the reason may be inaccurate
    RevertReplayAtLatest {
        block: u64,
    },
}

/// The final report for one transaction
#[derive(Debug, Clone, Serialize)]
pub struct LookupResult {
    pub hash: B256,
    pub block_number: Option<u64>,
    /// Timestamp of the containing block
    pub timestamp: Option<u64>,
    pub from: Address,
    pub to: Recipient,
    pub is_contract: bool,
    pub is_contract_creation: bool,
    /// Name of the called contract, or the created address
    pub contract: Option<ContractIdentity>,
    /// Name of the proxy target contract
    pub underlying_contract: Option<String>,
    /// Decoded call, `None` when the call data is empty
    pub method: Option<CallDecoding>,
    pub decoded_logs: Vec<LogDecoding>,
    pub gas_used: Option<u64>,
    pub gas_price: u128,
    pub gas_limit: u64,
    pub gas_format: GasFormat,
    pub status: TxStatus,
    /// Error description from the metadata service
    pub error_message: String,
    /// Revert reason recovered by replay
    pub revert_reason: String,
    pub value: U256,
    pub nonce: u64,
    pub warnings: Vec<LookupWarning>,
}
