//! Historical-state calls with a latest-state fallback
//!
//! Full nodes only keep recent state, so a call pinned to an old block can be
//! rejected. [`call_with_fallback`] makes the retry explicit: first the
//! historical block, then, only for [`ClientError::ArchivalAccessDenied`],
//! latest state. The returned [`ReplayState`] tells the caller which one
//! answered so it can warn that the result may not match history.

use tracing::warn;

use crate::{
    errors::ClientError,
    traits::LedgerClient,
    types::{CallOutput, CallRequest},
};

/// State a call was answered from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayState {
    /// Answered at the requested block
    Historical(u64),
    /// Historical block was rejected; answered at latest state
    Latest { requested: u64 },
    /// No block was requested
    Unpinned,
}

/// Output of a call together with the state that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayOutput {
    pub output: CallOutput,
    pub state: ReplayState,
}

/// Call at `block`, retrying at latest state if the node lacks that history
pub async fn call_with_fallback<L>(
    ledger: &L,
    request: &CallRequest,
    block: Option<u64>,
) -> Result<ReplayOutput, ClientError>
where
    L: LedgerClient + ?Sized,
{
    let Some(number) = block else {
        let output = ledger.call(request, None).await?;
        return Ok(ReplayOutput { output, state: ReplayState::Unpinned });
    };

    match ledger.call(request, Some(number)).await {
        Ok(output) => Ok(ReplayOutput { output, state: ReplayState::Historical(number) }),
        Err(err) if err.is_archival() => {
            warn!(block = number, error = %err, "historical state unavailable, retrying at latest");
            let output = ledger.call(request, None).await?;
            Ok(ReplayOutput { output, state: ReplayState::Latest { requested: number } })
        }
        Err(err) => Err(err),
    }
}
