//! Revert reason recovery for failed transactions
//!
//! Two independent sources are consulted:
//! - a read-only replay of the transaction at its block (latest state if the
//!   node lacks that history), whose output is parsed as a revert payload
//! - the metadata service's status endpoint, for its error description
//!
//! Neither failure is fatal. A failed replay leaves the reason empty and a
//! failed status query leaves the message empty.

use tracing::{debug, warn};

use crate::{
    traits::{LedgerClient, MetadataClient},
    types::{CallRequest, LookupWarning, Transaction},
    utils::{
        error_utils::revert_reason,
        replay_utils::{call_with_fallback, ReplayState},
    },
};

/// What could be recovered about a failure
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevertReport {
    /// Reason decoded from the replay output
    pub revert_reason: String,
    /// Error description from the metadata service
    pub error_message: String,
    /// Set when the replay ran at latest state
    pub warning: Option<LookupWarning>,
}

/// Recover the revert reason and error description of a failed transaction
///
/// Callers should only invoke this for receipts with a failure status.
pub async fn extract_revert<L, M>(ledger: &L, metadata: &M, tx: &Transaction) -> RevertReport
where
    L: LedgerClient + ?Sized,
    M: MetadataClient + ?Sized,
{
    let request = CallRequest::from(tx);
    let (replay, status) = futures::join!(
        call_with_fallback(ledger, &request, tx.block_number),
        metadata.tx_error_description(tx.hash),
    );

    let mut report = RevertReport::default();
    match replay {
        Ok(replay) => {
            report.revert_reason = revert_reason(replay.output.data());
            if let ReplayState::Latest { requested } = replay.state {
                report.warning = Some(LookupWarning::RevertReplayAtLatest { block: requested });
            }
        }
        Err(err) => warn!(hash = %tx.hash, error = %err, "replay of failed transaction failed"),
    }
    match status {
        Ok(description) => report.error_message = description,
        Err(err) => debug!(hash = %tx.hash, error = %err, "status lookup failed"),
    }
    report
}
