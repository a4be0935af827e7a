//! Remote capability traits
//!
//! The pipeline consumes two remote services through these traits:
//! - `LedgerClient`: JSON-RPC style chain queries
//! - `MetadataClient`: verified-source metadata (contract name, ABI, status)
//!
//! Both are object-safe and `Send + Sync` so one instance can be shared by
//! concurrent lookups behind an `Arc`.

use alloy::primitives::{Address, Bytes, B256};
use async_trait::async_trait;

use crate::{
    errors::{ClientError, MetadataError},
    resolver::ContractAbi,
    types::{CallOutput, CallRequest, Receipt, Transaction},
};

/// Read access to a ledger node
#[async_trait]
pub trait LedgerClient: Send + Sync + 'static {
    /// Fetch a transaction by hash, `None` if unknown
    async fn transaction(&self, hash: B256) -> Result<Option<Transaction>, ClientError>;

    /// Fetch a receipt by transaction hash, `None` if unmined or unknown
    async fn receipt(&self, hash: B256) -> Result<Option<Receipt>, ClientError>;

    /// Fetch the timestamp of a block, `None` if the block is unknown
    async fn block_timestamp(&self, number: u64) -> Result<Option<u64>, ClientError>;

    /// Fetch deployed bytecode at latest state
    ///
    /// Fails when the node cannot resolve the address context.
    async fn code(&self, address: Address) -> Result<Bytes, ClientError>;

    /// Execute a read-only call
    ///
    /// `block` of `None` means latest state. Historical blocks the node cannot
    /// serve fail with [`ClientError::ArchivalAccessDenied`]. A reverting call
    /// is not an error: its payload comes back as [`CallOutput::Reverted`].
    async fn call(
        &self,
        request: &CallRequest,
        block: Option<u64>,
    ) -> Result<CallOutput, ClientError>;
}

/// Read access to a contract metadata service
#[async_trait]
pub trait MetadataClient: Send + Sync + 'static {
    /// Fetch the verified contract name and ABI for an address
    async fn contract_abi(&self, address: Address) -> Result<ContractAbi, MetadataError>;

    /// Fetch the indexer's error description for a transaction
    async fn tx_error_description(&self, hash: B256) -> Result<String, MetadataError>;
}
