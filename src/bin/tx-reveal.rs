use alloy::primitives::B256;
use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tx_reveal::{create_analyzer, LookupOptions, Network};

/// Explain a mined EVM transaction
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Transaction hash
    #[arg(long)]
    hash: B256,

    /// Network to query (mainnet, goerli, sepolia, holesky)
    #[arg(long, default_value = "mainnet")]
    network: Network,

    /// Etherscan API key
    #[arg(long, env = "ETHERSCAN_API_KEY")]
    etherscan_key: Option<String>,

    /// RPC endpoint, http(s):// or ws(s)://
    #[arg(long, env = "ETH_RPC_URL")]
    rpc_url: Option<String>,

    /// Etherscan-compatible API base URL
    #[arg(long)]
    etherscan_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tx_reveal=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let options = LookupOptions {
        network: cli.network,
        etherscan_key: cli.etherscan_key,
        rpc_url: cli.rpc_url,
        etherscan_url: cli.etherscan_url,
    };

    let analyzer = create_analyzer(&options).await?;
    let report = analyzer
        .analyze(cli.hash)
        .await
        .with_context(|| format!("lookup of {} failed", cli.hash))?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
