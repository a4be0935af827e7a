//! Transaction analysis
//!
//! [`TxAnalyzer`] turns a transaction hash into a [`LookupResult`]:
//!
//! 1. fetch the transaction (absent means [`LookupError::NotFound`])
//! 2. fetch its receipt and the containing block's timestamp
//! 3. classify the recipient as account, contract or contract creation
//! 4. resolve ABIs for every log emitter and for the called contract
//! 5. decode call data and logs against every ABI resolved so far
//! 6. recover the revert reason when the receipt reports a failure
//!
//! Only step 1 can fail the analysis. Everything else degrades the
//! corresponding part of the report.

pub mod builder;

use std::sync::Arc;

use alloy::primitives::{utils::format_units, Address, B256, U256};
use futures::{stream, StreamExt};
use tracing::{debug, warn};

use crate::{
    decoder::{decode_call, decode_logs, CallDecoding, LogDecoding},
    errors::LookupError,
    resolver::{AbiResolver, ProxyResolution},
    revert::{extract_revert, RevertReport},
    traits::{LedgerClient, MetadataClient},
    types::{
        ContractIdentity, GasFormat, LogEntry, LookupResult, Receipt, Recipient, Transaction,
        TxStatus,
    },
};

pub use builder::{create_analyzer, lookup};

/// ABI lookups (and proxy reads) kept in flight at once for one transaction
const MAX_CONCURRENT_LOOKUPS: usize = 4;

/// How the recipient of a transaction was classified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Classification {
    /// Recipient has no code
    Account,
    /// Recipient has code
    Contract,
    /// No recipient, or its code could not be read
    Creation,
}

/// Transaction analyzer holding one long-lived ABI resolver
///
/// The resolver cache lives as long as the analyzer. Share one analyzer
/// (e.g. behind an `Arc`) across concurrent lookups to share the cache, or
/// build a new one for an isolated view.
pub struct TxAnalyzer<L, M> {
    ledger: Arc<L>,
    metadata: Arc<M>,
    resolver: AbiResolver<L, M>,
}

impl<L, M> TxAnalyzer<L, M>
where
    L: LedgerClient,
    M: MetadataClient,
{
    pub fn new(ledger: Arc<L>, metadata: Arc<M>) -> Self {
        let resolver = AbiResolver::new(Arc::clone(&ledger), Arc::clone(&metadata));
        Self { ledger, metadata, resolver }
    }

    pub fn resolver(&self) -> &AbiResolver<L, M> {
        &self.resolver
    }

    /// Analyze the transaction with the given hash
    ///
    /// # Returns
    /// * `Ok(LookupResult)` - the report, possibly with degraded parts
    /// * `Err(LookupError::NotFound)` - no transaction has this hash
    /// * `Err(LookupError::Ledger)` - the transaction query itself failed
    pub async fn analyze(&self, hash: B256) -> Result<LookupResult, LookupError> {
        let tx = self
            .ledger
            .transaction(hash)
            .await?
            .ok_or(LookupError::NotFound(hash))?;

        let receipt = match self.ledger.receipt(hash).await {
            Ok(receipt) => receipt,
            Err(err) => {
                warn!(%hash, error = %err, "receipt lookup failed");
                None
            }
        };
        let timestamp = self.timestamp(&tx).await;
        let classification = self.classify(&tx).await;

        let target = match (classification, tx.to) {
            (Classification::Contract, Some(to)) => Some(to),
            _ => None,
        };
        let mut emitters = receipt.as_ref().map(distinct_emitters).unwrap_or_default();
        // the target leads the lookups and is resolved once
        emitters.retain(|address| Some(*address) != target);

        let lookups: Vec<Address> = target.into_iter().chain(emitters).collect();
        let mut resolutions: Vec<ProxyResolution> = stream::iter(lookups)
            .map(|address| self.resolver.resolve_with_proxy(address, tx.block_number))
            .buffered(MAX_CONCURRENT_LOOKUPS)
            .collect()
            .await;
        let target_resolution = match target {
            Some(_) if !resolutions.is_empty() => Some(resolutions.remove(0)),
            _ => None,
        };
        let emitter_resolutions = resolutions;

        let mut warnings = Vec::new();
        for resolution in emitter_resolutions.iter().chain(target_resolution.iter()) {
            warnings.extend(resolution.warnings.iter().cloned());
        }

        let logs: &[LogEntry] = receipt.as_ref().map(|r| r.logs.as_slice()).unwrap_or_default();
        let (method, decoded_logs) = {
            let registry = self.resolver.registry().await;
            let method = if tx.input.is_empty() {
                None
            } else if classification == Classification::Contract {
                Some(decode_call(&registry, &tx.input))
            } else {
                Some(CallDecoding::Raw(tx.input.clone()))
            };
            let decoded_logs = if classification == Classification::Contract {
                decode_logs(&registry, logs)
            } else {
                logs.iter().cloned().map(LogDecoding::Raw).collect()
            };
            (method, decoded_logs)
        };

        let status = receipt.as_ref().map(|r| r.status).unwrap_or(TxStatus::Unknown);
        let revert = if status.is_failure() {
            extract_revert(self.ledger.as_ref(), self.metadata.as_ref(), &tx).await
        } else {
            RevertReport::default()
        };
        warnings.extend(revert.warning);

        let (to, contract, underlying_contract) = match classification {
            Classification::Creation => (
                Recipient::ContractCreation,
                receipt
                    .as_ref()
                    .and_then(|r| r.contract_address)
                    .map(ContractIdentity::Created),
                None,
            ),
            _ => {
                let ProxyResolution { name, underlying_name, .. } =
                    target_resolution.unwrap_or_default();
                // an account classification always has a recipient
                let to = tx.to.map(Recipient::Address).unwrap_or(Recipient::ContractCreation);
                (to, name.map(ContractIdentity::Named), underlying_name)
            }
        };

        let gas_used = receipt.as_ref().map(|r| r.gas_used);
        Ok(LookupResult {
            hash,
            block_number: tx.block_number,
            timestamp,
            from: sender(&tx, receipt.as_ref()),
            to,
            is_contract: classification == Classification::Contract,
            is_contract_creation: classification == Classification::Creation,
            contract,
            underlying_contract,
            method,
            decoded_logs,
            gas_used,
            gas_price: tx.gas_price,
            gas_limit: tx.gas_limit,
            gas_format: gas_format(&tx, gas_used),
            status,
            error_message: revert.error_message,
            revert_reason: revert.revert_reason,
            value: tx.value,
            nonce: tx.nonce,
            warnings,
        })
    }

    async fn timestamp(&self, tx: &Transaction) -> Option<u64> {
        let number = tx.block_number?;
        match self.ledger.block_timestamp(number).await {
            Ok(timestamp) => timestamp,
            Err(err) => {
                warn!(block = number, error = %err, "block lookup failed");
                None
            }
        }
    }

    async fn classify(&self, tx: &Transaction) -> Classification {
        let Some(to) = tx.to else {
            return Classification::Creation;
        };
        match self.ledger.code(to).await {
            Ok(code) if code.is_empty() => Classification::Account,
            Ok(_) => Classification::Contract,
            Err(err) => {
                debug!(%to, error = %err, "code read failed, treating as contract creation");
                Classification::Creation
            }
        }
    }
}

/// Log emitters in order of first appearance
fn distinct_emitters(receipt: &Receipt) -> Vec<Address> {
    let mut emitters: Vec<Address> = Vec::new();
    for log in &receipt.logs {
        if !emitters.contains(&log.address) {
            emitters.push(log.address);
        }
    }
    emitters
}

fn sender(tx: &Transaction, receipt: Option<&Receipt>) -> Address {
    receipt.map(|r| r.from).unwrap_or(tx.from)
}

fn gas_format(tx: &Transaction, used: Option<u64>) -> GasFormat {
    let price_gwei = format_units(U256::from(tx.gas_price), 9)
        .ok()
        .and_then(|gwei| gwei.parse::<f64>().ok())
        .unwrap_or_default();
    GasFormat { price_gwei, limit: tx.gas_limit, used }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, Bytes};

    fn tx(gas_price: u128) -> Transaction {
        Transaction {
            hash: B256::ZERO,
            from: address!("0x00000000000000000000000000000000000000aa"),
            to: None,
            input: Bytes::new(),
            value: U256::ZERO,
            nonce: 0,
            gas_price,
            gas_limit: 21_000,
            block_number: Some(1),
        }
    }

    #[test]
    fn test_gas_format() {
        let gas = gas_format(&tx(32_500_000_000), Some(21_000));
        assert_eq!(gas.price_gwei, 32.5);
        assert_eq!(gas.limit, 21_000);
        assert_eq!(gas.used, Some(21_000));
    }

    #[test]
    fn test_distinct_emitters_keep_first_order() {
        let a = address!("0x0000000000000000000000000000000000000001");
        let b = address!("0x0000000000000000000000000000000000000002");
        let log = |address| LogEntry { address, topics: vec![], data: Bytes::new() };
        let receipt = Receipt {
            from: Address::ZERO,
            gas_used: 0,
            status: TxStatus::Success,
            logs: vec![log(b), log(a), log(b)],
            contract_address: None,
        };
        assert_eq!(distinct_emitters(&receipt), vec![b, a]);
    }
}
