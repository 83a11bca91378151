//! Revert payload decoding.
//!
//! Decode priority:
//! 1. Empty data          → `RevertReason::Empty`
//! 2. `0x08c379a0` prefix → `RevertReason::Message`  (Error(string))
//! 3. `0x4e487b71` prefix → `RevertReason::Panic`    (Panic(uint256))
//! 4. Selector declared as a custom error in the ABI → `RevertReason::Custom`
//! 5. Fallback            → `RevertReason::Raw`, bytes passed through

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::Bytes;
use chaincontract_core::{panic_meaning, RevertReason, ERROR_STRING_SELECTOR, PANIC_SELECTOR};
use tracing::{debug, trace};

use crate::descriptor::ContractDescriptor;

/// Decode a revert payload, consulting `descriptor` for custom errors.
pub fn decode_revert(data: &[u8], descriptor: Option<&ContractDescriptor>) -> RevertReason {
    if data.is_empty() {
        return RevertReason::Empty;
    }
    if let Some(message) = decode_error_string(data) {
        return RevertReason::Message { message };
    }
    if let Some(code) = decode_panic(data) {
        return RevertReason::Panic { code, meaning: panic_meaning(code).to_string() };
    }
    if data.starts_with(ERROR_STRING_SELECTOR.as_slice()) || data.starts_with(PANIC_SELECTOR.as_slice()) {
        debug!(len = data.len(), "builtin revert selector with undecodable payload");
        return RevertReason::Raw { data: Bytes::copy_from_slice(data) };
    }
    if let Some(entry) = descriptor.and_then(|d| d.error_by_selector(data)) {
        match entry.decode(data) {
            Ok(reason) => return reason,
            Err(e) => trace!(error = %e, signature = %entry.signature, "custom error payload did not decode"),
        }
    }
    RevertReason::Raw { data: Bytes::copy_from_slice(data) }
}

/// `Error(string)` message, if `data` is one.
pub fn decode_error_string(data: &[u8]) -> Option<String> {
    let payload = data.strip_prefix(ERROR_STRING_SELECTOR.as_slice())?;
    match DynSolType::String.abi_decode(payload) {
        Ok(DynSolValue::String(s)) => Some(s),
        _ => None,
    }
}

/// `Panic(uint256)` code, if `data` is one.
pub fn decode_panic(data: &[u8]) -> Option<u64> {
    let payload = data.strip_prefix(PANIC_SELECTOR.as_slice())?;
    match DynSolType::Uint(256).abi_decode(payload) {
        Ok(DynSolValue::Uint(v, _)) => Some(v.saturating_to::<u64>()),
        _ => None,
    }
}
