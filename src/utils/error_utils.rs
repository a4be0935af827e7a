//! Revert payload parsing
//!
//! This module turns the raw output of a replayed failed call into text:
//! - `Error(string)` reverts (selector `0x08c379a0`)
//! - `Panic(uint256)` codes (selector `0x4e487b71`)
//! - anything else that still follows the `selector ++ offset ++ length ++ bytes`
//!   layout, read from its fixed text offset

use alloy::dyn_abi::{DynSolType, DynSolValue};

/// Byte offset of the reason text in an ABI-encoded revert string
/// (4-byte selector, 32-byte offset word, 32-byte length word)
pub const REVERT_TEXT_OFFSET: usize = 68;

/// Offset of the length word in an ABI-encoded revert string
const REVERT_LENGTH_OFFSET: usize = 36;

/// Parse custom error output from a failed transaction
///
/// Handles two main types of errors:
/// 1. Error(string) - Standard revert with message (selector: 0x08c379a0)
/// 2. Panic(uint256) - Solidity panic with error code (selector: 0x4e487b71)
///
/// # Returns
/// * `Some(String)` - Decoded error message or panic reason
/// * `None` - If the error format is not recognized or cannot be decoded
pub fn parse_custom_error(output: &[u8]) -> Option<String> {
    if output.len() < 4 {
        return None;
    }

    match &output[0..4] {
        // Error(string) - 0x08c379a0
        [0x08, 0xc3, 0x79, 0xa0] => match DynSolType::String.abi_decode(&output[4..]) {
            Ok(DynSolValue::String(reason)) => Some(reason),
            _ => None,
        },
        // Panic(uint256) - 0x4e487b71
        [0x4e, 0x48, 0x7b, 0x71] => {
            let Ok(DynSolValue::Uint(code, _)) = DynSolType::Uint(256).abi_decode(&output[4..])
            else {
                return None;
            };
            let code = u64::try_from(code).unwrap_or(u64::MAX);
            Some(match code {
                0x01 => "Panic: Assertion failed".to_string(),
                0x11 => "Panic: Arithmetic overflow".to_string(),
                0x12 => "Panic: Division by zero".to_string(),
                0x21 => "Panic: Invalid enum value".to_string(),
                0x22 => "Panic: Invalid storage byte array access".to_string(),
                0x31 => "Panic: Pop on empty array".to_string(),
                0x32 => "Panic: Array access out of bounds".to_string(),
                0x41 => "Panic: Out of memory".to_string(),
                0x51 => "Panic: Invalid internal function call".to_string(),
                code => format!("Panic: Unknown error code (0x{:x})", code),
            })
        }
        _ => None,
    }
}

/// Read the reason text starting at [`REVERT_TEXT_OFFSET`]
///
/// The length word bounds the text when it fits the payload; otherwise the
/// remainder is used with zero padding stripped. Invalid UTF-8 is replaced.
pub fn text_at_fixed_offset(output: &[u8]) -> String {
    if output.len() <= REVERT_TEXT_OFFSET {
        return String::new();
    }
    let tail = &output[REVERT_TEXT_OFFSET..];
    let declared = output[REVERT_LENGTH_OFFSET..REVERT_TEXT_OFFSET]
        .iter()
        .try_fold(0usize, |acc, b| acc.checked_mul(256)?.checked_add(*b as usize));
    let text = match declared {
        Some(len) if len <= tail.len() => &tail[..len],
        _ => {
            let end = tail.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
            &tail[..end]
        }
    };
    String::from_utf8_lossy(text).into_owned()
}

/// Best-effort revert reason from a replay output
pub fn revert_reason(output: &[u8]) -> String {
    parse_custom_error(output).unwrap_or_else(|| text_at_fixed_offset(output))
}
