use std::sync::Arc;

use alloy::primitives::B256;

use crate::{
    analyzer::TxAnalyzer,
    clients::{AlloyLedger, EtherscanClient},
    errors::LookupError,
    types::{LookupOptions, LookupResult},
};

/// Analyzer backed by an RPC node and an Etherscan-compatible service
pub type DefaultAnalyzer = TxAnalyzer<AlloyLedger, EtherscanClient>;

/// Create an analyzer from lookup options
///
/// Connects to `options.rpc_url()` (HTTP, or WebSocket for `ws(s)://`) and
/// prepares a metadata client for `options.etherscan_url()`.
///
/// # Example
/// ```no_run
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// use tx_reveal::{create_analyzer, LookupOptions, Network};
/// let analyzer = create_analyzer(&LookupOptions::from_env(Network::Mainnet)).await?;
/// # Ok(())
/// # }
/// ```
pub async fn create_analyzer(options: &LookupOptions) -> Result<DefaultAnalyzer, LookupError> {
    let ledger = AlloyLedger::connect(options.rpc_url()).await?;
    let metadata = EtherscanClient::from_options(options)?;
    Ok(TxAnalyzer::new(Arc::new(ledger), Arc::new(metadata)))
}

/// One-shot lookup with a fresh analyzer and ABI cache
pub async fn lookup(hash: B256, options: &LookupOptions) -> Result<LookupResult, LookupError> {
    create_analyzer(options).await?.analyze(hash).await
}
