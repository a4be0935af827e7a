//! # Basic Usage
//!
//! Looks up one mainnet transaction and prints a short summary followed by
//! the full JSON report.
//!
//! ```sh
//! export ETHERSCAN_API_KEY=...
//! cargo run --example basic_usage -- <tx hash>
//! ```
//!
//! Without a hash a known mainnet transfer is used. `ETH_RPC_URL` overrides
//! the public endpoint.

use anyhow::Result;
use tx_reveal::{create_analyzer, decoder::value_to_json, LookupOptions, Network};

const DEFAULT_HASH: &str = "0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let hash = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_HASH.to_string());
    let analyzer = create_analyzer(&LookupOptions::from_env(Network::Mainnet)).await?;
    let report = analyzer.analyze(hash.parse()?).await?;

    println!("{} -> {} ({:?})", report.from, report.to, report.status);
    if let Some(contract) = &report.contract {
        println!("contract: {}", serde_json::to_string(contract)?);
    }
    if let Some(call) = report.method.as_ref().and_then(|method| method.as_decoded()) {
        println!("method: {}", call.signature);
        for param in &call.params {
            println!("  {} {} = {}", param.ty, param.name, value_to_json(param.value.value()));
        }
    }
    for log in report.decoded_logs.iter().filter_map(|log| log.as_decoded()) {
        println!("event: {} @ {}", log.name, log.address);
    }
    if !report.revert_reason.is_empty() {
        println!("reverted: {}", report.revert_reason);
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
