//! Revert reasons surfaced by reverted calls and failed transactions.
//!
//! Selectors:
//! - `Error(string)`  → `0x08c379a0`
//! - `Panic(uint256)` → `0x4e487b71`
//!
//! Panic codes: <https://docs.soliditylang.org/en/latest/control-structures.html#panic-via-assert-and-error-via-require>

use alloy_primitives::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::AbiValue;

pub const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

pub const PANIC_SELECTOR: [u8; 4] = [0x4e, 0x48, 0x7b, 0x71];

/// A decoded (or undecodable) revert payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RevertReason {
    /// Reverted without data (`revert()` or `require(cond)`).
    Empty,
    /// `require(cond, "message")` / `revert("message")`.
    Message { message: String },
    /// `Panic(uint256)` from a failed `assert` or checked arithmetic.
    Panic { code: u64, meaning: String },
    /// A custom error declared in the contract ABI.
    Custom {
        name: String,
        signature: String,
        inputs: Vec<(String, AbiValue)>,
    },
    /// No matching error entry; bytes are passed through unmodified.
    Raw { data: Bytes },
}

impl RevertReason {
    /// The 4-byte selector of the payload, when it had one.
    pub fn raw_selector(data: &[u8]) -> Option<[u8; 4]> {
        data.get(..4)?.try_into().ok()
    }
}

impl fmt::Display for RevertReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevertReason::Empty => write!(f, "reverted without data"),
            RevertReason::Message { message } => write!(f, "{message:?}"),
            RevertReason::Panic { code, meaning } => write!(f, "panic 0x{code:02x} ({meaning})"),
            RevertReason::Custom { name, inputs, .. } => {
                let args: Vec<_> = inputs
                    .iter()
                    .map(|(n, v)| if n.is_empty() { v.to_string() } else { format!("{n}: {v}") })
                    .collect();
                write!(f, "{name}({})", args.join(", "))
            }
            RevertReason::Raw { data } => write!(f, "raw revert 0x{}", hex::encode(data)),
        }
    }
}

/// Map a Solidity panic code to a human-readable description.
pub fn panic_meaning(code: u64) -> &'static str {
    match code {
        0x00 => "generic compiler-inserted panic",
        0x01 => "assert() called with false condition",
        0x11 => "arithmetic overflow or underflow",
        0x12 => "division or modulo by zero",
        0x21 => "invalid enum value",
        0x22 => "corrupted storage byte array",
        0x31 => ".pop() on empty array",
        0x32 => "out-of-bounds array access",
        0x41 => "too much memory allocated (out of memory)",
        0x51 => "called zero-initialized internal function pointer",
        _ => "unknown panic code",
    }
}
