//! Human-readable renderings of decoded ABI values
//!
//! Decoded values carry no unit information, so numbers are interpreted by
//! the length of their decimal representation:
//!
//! | digits                  | interpretation              |
//! |-------------------------|-----------------------------|
//! | exactly 10, prefix `15` | Unix timestamp (seconds)    |
//! | 27 or more              | fixed point, 27 decimals    |
//! | 18 to 26                | wei-style, 18 decimals      |
//! | anything shorter        | gwei-style, 9 decimals      |
//!
//! The timestamp rule only recognises dates from mid-2017 to late 2020.
//! These thresholds are kept exactly as listed; reports produced by this
//! crate are compared against them.
//!
//! Only `uint256` values are interpreted as numbers. Byte strings are shown
//! as text when they are valid UTF-8, and left unformatted otherwise.

use alloy::{
    dyn_abi::DynSolValue,
    primitives::{utils::format_units, U256},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Decimals applied to high precision fixed point values
pub const HIGH_PRECISION_DECIMALS: u8 = 27;
/// Decimals applied to wei-denominated values
pub const WEI_DECIMALS: u8 = 18;
/// Decimals applied to everything else
pub const GWEI_DECIMALS: u8 = 9;

/// A secondary rendering attached next to a decoded value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Formatted {
    /// Number read as a Unix timestamp
    Date(DateTime<Utc>),
    /// Number scaled down by `10^decimals`
    Units { decimals: u8, amount: String },
    /// Bytes read as UTF-8 text
    Text(String),
    /// Element-wise rendering of an array or tuple
    List(Vec<Option<Formatted>>),
}

/// Render a decoded value, `None` if no heuristic applies
///
/// Arrays and tuples are walked depth-first; the result is a list as long
/// as the input when at least one element has a rendering.
pub fn format_value(value: &DynSolValue) -> Option<Formatted> {
    match value {
        DynSolValue::Uint(number, 256) => format_uint(*number),
        DynSolValue::Bytes(bytes) => format_text(bytes),
        DynSolValue::FixedBytes(word, size) => format_text(&word[..*size]),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
            let rendered: Vec<Option<Formatted>> = items.iter().map(format_value).collect();
            if rendered.iter().all(Option::is_none) {
                None
            } else {
                Some(Formatted::List(rendered))
            }
        }
        _ => None,
    }
}

/// Apply the digit-count heuristic to a single number
pub fn format_uint(number: U256) -> Option<Formatted> {
    let digits = number.to_string();
    if digits.len() == 10 && digits.starts_with("15") {
        let seconds = u64::try_from(number).ok()?;
        return DateTime::from_timestamp(seconds as i64, 0).map(Formatted::Date);
    }
    let decimals = match digits.len() {
        len if len >= 27 => HIGH_PRECISION_DECIMALS,
        len if len >= 18 => WEI_DECIMALS,
        _ => GWEI_DECIMALS,
    };
    let amount = format_units(number, decimals).ok()?;
    Some(Formatted::Units { decimals, amount })
}

/// Read bytes as text, dropping trailing zero padding
fn format_text(bytes: &[u8]) -> Option<Formatted> {
    let end = bytes.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
    std::str::from_utf8(&bytes[..end])
        .ok()
        .map(|text| Formatted::Text(text.to_string()))
}
