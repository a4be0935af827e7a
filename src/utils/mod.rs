//! Helper utilities for the lookup pipeline
//!
//! # Modules
//!
//! - [`format_utils`]: Human-readable renderings of decoded values
//!   - Timestamp and unit-scaling heuristics for `uint256`
//!   - UTF-8 text for byte strings
//!
//! - [`error_utils`]: Revert payload parsing
//!   - `Error(string)` and `Panic(uint256)` decoding
//!   - Fixed-offset reason extraction
//!
//! - [`proxy_utils`]: Proxy contract analysis
//!   - Target accessor detection from a verified ABI
//!   - Target resolution by read-only call
//!
//! - [`replay_utils`]: Historical calls with latest-state fallback
//!
//! # Example
//!
//! ```
//! use tx_reveal::utils::{error_utils, format_utils};
//! use alloy::primitives::U256;
//!
//! let formatted = format_utils::format_uint(U256::from(1_577_836_800u64));
//! assert!(matches!(formatted, Some(format_utils::Formatted::Date(_))));
//! assert_eq!(error_utils::revert_reason(&[]), "");
//! ```

/// Value formatting heuristics
pub mod format_utils;

/// Revert payload parsing
pub mod error_utils;

/// Proxy contract analysis utilities
pub mod proxy_utils;

/// Historical call fallback strategy
pub mod replay_utils;
