//! Proxy contract detection and target resolution
//!
//! A contract counts as a proxy when its verified ABI declares a
//! conventional target accessor:
//! - named `target` or `implementation`
//! - no inputs
//! - exactly one `address` output
//!
//! The accessor is only called after this check passes; contracts without
//! one are never probed.

use alloy::{
    dyn_abi::{DynSolType, DynSolValue},
    json_abi::{Function, JsonAbi},
    primitives::Address,
};
use tracing::debug;

use crate::{
    errors::ClientError,
    traits::LedgerClient,
    types::{CallOutput, CallRequest},
    utils::replay_utils::{call_with_fallback, ReplayState},
};

/// Accessor names conventionally used to expose a delegation target
pub const PROXY_ACCESSORS: &[&str] = &["target", "implementation"];

/// Find the target accessor declared by an ABI, if any
pub fn proxy_accessor(abi: &JsonAbi) -> Option<&Function> {
    PROXY_ACCESSORS.iter().find_map(|name| {
        abi.function(name)?.iter().find(|function| {
            function.inputs.is_empty()
                && function.outputs.len() == 1
                && function.outputs[0].ty == "address"
        })
    })
}

/// Result of probing a proxy's target accessor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxyTarget {
    /// Target address, `None` for the zero address, a revert or undecodable output
    pub target: Option<Address>,
    /// State the accessor was evaluated at
    pub state: ReplayState,
}

/// Call the accessor on `proxy`, preferring the state at `block`
///
/// # Returns
/// * `Ok(ProxyTarget)` - accessor answered (possibly at latest state)
/// * `Err(_)` - the call failed for a reason other than missing history
pub async fn get_target<L>(
    ledger: &L,
    proxy: Address,
    accessor: &Function,
    block: Option<u64>,
) -> Result<ProxyTarget, ClientError>
where
    L: LedgerClient + ?Sized,
{
    let request = CallRequest::read(proxy, accessor.selector().to_vec().into());
    let replay = call_with_fallback(ledger, &request, block).await?;

    let target = match &replay.output {
        // admin-gated accessors revert for ordinary callers
        CallOutput::Reverted(_) => {
            debug!(%proxy, accessor = %accessor.name, "accessor reverted");
            None
        }
        CallOutput::Returned(output) => match DynSolType::Address.abi_decode(output) {
            Ok(DynSolValue::Address(address)) if !address.is_zero() => Some(address),
            Ok(_) => None,
            Err(err) => {
                debug!(
                    %proxy,
                    accessor = %accessor.name,
                    error = %err,
                    "unexpected accessor output"
                );
                None
            }
        },
    };

    Ok(ProxyTarget { target, state: replay.state })
}
