//! Contract ABI resolution with single-flight caching
//!
//! [`AbiResolver`] fetches verified ABIs from a [`MetadataClient`] and keeps
//! them for the lifetime of the resolver. Each cache slot moves through
//! `absent -> pending -> resolved` exactly once:
//!
//! - the first caller for an address inserts the pending fetch itself
//! - concurrent callers for that address await the same shared future
//! - failures are cached too, so an unverified contract is asked for once
//!
//! Slots are never invalidated. Create a fresh resolver for a fresh view.
//!
//! Every successfully resolved ABI is also added to the resolver's
//! [`SignatureRegistry`], the union the decoder matches against.

use std::{collections::HashMap, sync::Arc};

use alloy::{json_abi::JsonAbi, primitives::Address};
use futures::{
    future::{BoxFuture, Shared},
    FutureExt,
};
use tokio::sync::{Mutex, RwLock, RwLockReadGuard};
use tracing::{debug, warn};

use crate::{
    decoder::SignatureRegistry,
    errors::AbiUnavailable,
    traits::{LedgerClient, MetadataClient},
    types::LookupWarning,
    utils::{
        proxy_utils::{get_target, proxy_accessor},
        replay_utils::ReplayState,
    },
};

/// Verified contract metadata
#[derive(Debug, Clone, PartialEq)]
pub struct ContractAbi {
    /// Contract display name
    pub name: String,
    /// Interface description
    pub abi: JsonAbi,
}

/// Cached outcome of one ABI fetch
pub type AbiLookup = Result<Arc<ContractAbi>, AbiUnavailable>;

type PendingLookup = Shared<BoxFuture<'static, AbiLookup>>;

/// Names resolved for a possibly proxied contract
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyResolution {
    /// Name of the contract itself, `None` if its ABI is unavailable
    pub name: Option<String>,
    /// Name of the proxy target, when one was found and resolved
    pub underlying_name: Option<String>,
    /// Target address reported by the accessor
    pub target: Option<Address>,
    pub warnings: Vec<LookupWarning>,
}

/// ABI resolver shared by every lookup of one process
pub struct AbiResolver<L, M> {
    ledger: Arc<L>,
    metadata: Arc<M>,
    cache: Mutex<HashMap<Address, PendingLookup>>,
    registry: RwLock<SignatureRegistry>,
}

impl<L, M> AbiResolver<L, M>
where
    L: LedgerClient,
    M: MetadataClient,
{
    pub fn new(ledger: Arc<L>, metadata: Arc<M>) -> Self {
        Self {
            ledger,
            metadata,
            cache: Mutex::new(HashMap::new()),
            registry: RwLock::new(SignatureRegistry::new()),
        }
    }

    /// Resolve the ABI for `address`, sharing any fetch already in flight
    ///
    /// # Returns
    /// * `Ok(ContractAbi)` - verified name and ABI, now also registered for decoding
    /// * `Err(AbiUnavailable)` - no usable ABI; decoding degrades to raw data
    pub async fn resolve(&self, address: Address) -> AbiLookup {
        let pending = {
            let mut cache = self.cache.lock().await;
            cache
                .entry(address)
                .or_insert_with(|| self.fetch(address))
                .clone()
        };

        let lookup = pending.await;
        if let Ok(contract) = &lookup {
            self.register(address, &contract.abi).await;
        }
        lookup
    }

    fn fetch(&self, address: Address) -> PendingLookup {
        let metadata = Arc::clone(&self.metadata);
        async move {
            debug!(%address, "fetching contract ABI");
            metadata
                .contract_abi(address)
                .await
                .map(Arc::new)
                .map_err(|err| {
                    debug!(%address, error = %err, "ABI unavailable");
                    AbiUnavailable { address, reason: err.to_string() }
                })
        }
        .boxed()
        .shared()
    }

    async fn register(&self, address: Address, abi: &JsonAbi) {
        if self.registry.read().await.contains(&address) {
            return;
        }
        self.registry.write().await.register(address, abi);
    }

    /// Resolve `address` and, if it declares a target accessor, its target
    ///
    /// The accessor is evaluated at `block` when given, falling back to
    /// latest state (with a warning) if the node lacks that history. Only one
    /// hop is followed: the target's own accessor is never probed.
    pub async fn resolve_with_proxy(
        &self,
        address: Address,
        block: Option<u64>,
    ) -> ProxyResolution {
        let contract = match self.resolve(address).await {
            Ok(contract) => contract,
            Err(_) => return ProxyResolution::default(),
        };
        let mut resolution = ProxyResolution {
            name: Some(contract.name.clone()),
            ..Default::default()
        };

        let Some(accessor) = proxy_accessor(&contract.abi) else {
            return resolution;
        };

        let probe = match get_target(self.ledger.as_ref(), address, accessor, block).await {
            Ok(probe) => probe,
            Err(err) => {
                warn!(proxy = %address, error = %err, "proxy target probe failed");
                return resolution;
            }
        };
        if let ReplayState::Latest { requested } = probe.state {
            resolution
                .warnings
                .push(LookupWarning::ProxyProbeAtLatest { proxy: address, block: requested });
        }

        let Some(target) = probe.target else {
            return resolution;
        };
        resolution.target = Some(target);
        if let Ok(underlying) = self.resolve(target).await {
            resolution.underlying_name = Some(underlying.name.clone());
        }
        resolution
    }

    /// Read access to the union of every ABI resolved so far
    pub async fn registry(&self) -> RwLockReadGuard<'_, SignatureRegistry> {
        self.registry.read().await
    }

    /// Number of addresses with a pending or resolved cache slot
    pub async fn cached(&self) -> usize {
        self.cache.lock().await.len()
    }
}
