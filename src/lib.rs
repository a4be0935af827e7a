//! # EVM Transaction Decoder and Revert Analyzer
//!
//! A library for explaining a single mined EVM transaction by hash.
//!
//! ## Core Features
//!
//! - **Classification**
//!   - Plain transfers, contract calls and contract creations
//!   - Block timestamp and gas figures in human units
//!
//! - **ABI Resolution**
//!   - Verified ABIs from an Etherscan-compatible service
//!   - Single-flight cache shared by concurrent lookups
//!   - One hop of proxy resolution (`target()` / `implementation()`)
//!
//! - **Decoding**
//!   - Call data and logs matched against every ABI seen so far
//!   - Undecodable entries kept raw, in place
//!   - Heuristic formatting of dates, token amounts and byte strings
//!
//! - **Failure Analysis**
//!   - Revert reason recovered by replaying the transaction
//!   - Latest-state fallback when the node has no archival history
//!
//! ## Features
//!
//! - `rustls-tls`: Uses rustls as the TLS implementation instead of native-tls (OpenSSL).
//!
//!   Usage example:
//!   ```toml
//!   [dependencies]
//!   tx-reveal = { version = "0.3.0", default-features = false, features = ["rustls-tls"] }
//!   ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use tx_reveal::{create_analyzer, LookupOptions, Network};
//! use alloy::primitives::b256;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let analyzer = create_analyzer(&LookupOptions::from_env(Network::Mainnet)).await?;
//!
//! let report = analyzer
//!     .analyze(b256!("0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060"))
//!     .await?;
//!
//! println!("{} -> {} ({:?})", report.from, report.to, report.status);
//! if let Some(method) = report.method.as_ref().and_then(|m| m.as_decoded()) {
//!     println!("called {}", method.signature);
//! }
//! if report.status.is_failure() {
//!     println!("reverted: {}", report.revert_reason);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Structure
//!
//! - `analyzer`: Transaction analysis and analyzer construction
//! - `resolver`: ABI resolution, caching and proxy detection
//! - `decoder`: Call data and log decoding
//! - `revert`: Revert reason recovery
//! - `clients`: RPC and metadata service clients
//! - `types`: Core data structures and type definitions
//! - `traits`: Client traits for extensibility
//! - `errors`: Error types and handling
//! - `utils`: Helper functions and utilities

pub mod analyzer;
pub mod clients;
pub mod decoder;
pub mod errors;
pub mod resolver;
pub mod revert;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export only the essential types and functions
pub use analyzer::{create_analyzer, lookup, TxAnalyzer};
pub use errors::LookupError;
pub use traits::{LedgerClient, MetadataClient};
pub use types::{LookupOptions, LookupResult, Network};
