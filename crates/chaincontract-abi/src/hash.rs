//! Keccak-256 helpers for selectors, topics and source fingerprints.
//!
//! Function selector: `keccak256("transfer(address,uint256)")[..4]`
//! Event topic0:      `keccak256("Transfer(address,address,uint256)")`

use alloy_primitives::{Selector, B256};
use tiny_keccak::{Hasher, Keccak};

pub fn keccak256(data: impl AsRef<[u8]>) -> B256 {
    let mut hasher = Keccak::v256();
    hasher.update(data.as_ref());
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    B256::from(out)
}

/// Keccak over several byte slices, without concatenating them first.
pub fn keccak256_concat(parts: &[&[u8]]) -> B256 {
    let mut hasher = Keccak::v256();
    for part in parts {
        hasher.update(part);
    }
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    B256::from(out)
}

/// 4-byte selector of a canonical signature.
pub fn selector(signature: &str) -> Selector {
    let hash = keccak256(signature.as_bytes());
    Selector::from_slice(&hash[..4])
}

/// topic0 of a canonical event signature.
pub fn event_topic(signature: &str) -> B256 {
    keccak256(signature.as_bytes())
}
