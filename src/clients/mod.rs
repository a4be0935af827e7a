//! Concrete remote clients
//!
//! - [`AlloyLedger`]: JSON-RPC node access through an alloy provider
//! - [`EtherscanClient`]: verified-source metadata over HTTP

pub mod etherscan;
pub mod ledger;

pub use etherscan::EtherscanClient;
pub use ledger::AlloyLedger;
