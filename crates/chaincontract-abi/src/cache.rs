//! Process-wide memoization of parsed ABIs.
//!
//! Parsing the same source twice returns the same `Arc<ContractDescriptor>`.
//! Keys are the keccak hash of the exact source bytes, so sources that
//! differ only in formatting parse separately. Parse failures are not
//! cached.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use alloy_primitives::B256;
use chaincontract_core::ContractError;
use tracing::debug;

use crate::descriptor::ContractDescriptor;
use crate::hash::keccak256_concat;

/// Where an ABI comes from.
#[derive(Debug, Clone, Copy)]
pub enum AbiSource<'a> {
    /// JSON ABI array, or a compiler artifact with an `"abi"` field.
    Json(&'a str),
    /// Human-readable declarations, one per entry.
    HumanReadable(&'a [&'a str]),
    /// Free text: JSON when it starts with `[` or `{`, otherwise
    /// newline-separated human-readable declarations.
    Text(&'a str),
}

impl AbiSource<'_> {
    fn cache_key(&self) -> B256 {
        match *self {
            AbiSource::Json(json) => keccak256_concat(&[b"json\0".as_slice(), json.as_bytes()]),
            AbiSource::HumanReadable(lines) => {
                let mut parts: Vec<&[u8]> = vec![b"human\0".as_slice()];
                for line in lines {
                    parts.push(line.as_bytes());
                    parts.push(b"\0".as_slice());
                }
                keccak256_concat(&parts)
            }
            AbiSource::Text(text) => keccak256_concat(&[b"text\0".as_slice(), text.as_bytes()]),
        }
    }

    fn parse(&self) -> Result<ContractDescriptor, ContractError> {
        match *self {
            AbiSource::Json(json) => ContractDescriptor::from_json(json),
            AbiSource::HumanReadable(lines) => ContractDescriptor::from_human_readable(lines),
            AbiSource::Text(text) => {
                let trimmed = text.trim_start();
                if trimmed.starts_with('[') || trimmed.starts_with('{') {
                    ContractDescriptor::from_json(text)
                } else {
                    let lines: Vec<&str> = text
                        .lines()
                        .map(str::trim)
                        .filter(|l| !l.is_empty() && !l.starts_with("//"))
                        .collect();
                    ContractDescriptor::from_human_readable(&lines)
                }
            }
        }
    }
}

/// Thread-safe descriptor cache.
#[derive(Debug, Default)]
pub struct AbiCache {
    entries: RwLock<HashMap<B256, Arc<ContractDescriptor>>>,
}

impl AbiCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache behind [`parse`].
    pub fn global() -> &'static AbiCache {
        static GLOBAL: OnceLock<AbiCache> = OnceLock::new();
        GLOBAL.get_or_init(AbiCache::new)
    }

    /// Return the cached descriptor for `source`, parsing it on first use.
    ///
    /// Concurrent first calls may both parse; the first insert wins and
    /// every caller receives that instance.
    pub fn parse(&self, source: AbiSource<'_>) -> Result<Arc<ContractDescriptor>, ContractError> {
        let key = source.cache_key();
        if let Some(hit) = self.entries.read().unwrap_or_else(PoisonError::into_inner).get(&key) {
            debug!(key = %key, "abi cache hit");
            return Ok(Arc::clone(hit));
        }

        debug!(key = %key, "abi cache miss");
        let parsed = Arc::new(source.parse()?);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(entries.entry(key).or_insert(parsed)))
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

/// Parse an ABI through the process-wide cache.
pub fn parse(source: AbiSource<'_>) -> Result<Arc<ContractDescriptor>, ContractError> {
    AbiCache::global().parse(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINES: &[&str] = &["function totalSupply() view returns (uint256)"];

    #[test]
    fn same_source_same_instance() {
        let cache = AbiCache::new();
        let a = cache.parse(AbiSource::HumanReadable(LINES)).unwrap();
        let b = cache.parse(AbiSource::HumanReadable(LINES)).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn failures_not_cached() {
        let cache = AbiCache::new();
        let err = cache.parse(AbiSource::Json("not json")).unwrap_err();
        assert_eq!(err.classification(), "MalformedAbi");
        assert!(cache.is_empty());
    }

    #[test]
    fn text_source_detects_format() {
        let cache = AbiCache::new();
        let human = cache
            .parse(AbiSource::Text("// token\nfunction totalSupply() view returns (uint256)\n"))
            .unwrap();
        let json = cache
            .parse(AbiSource::Text(
                r#"[{"type":"function","name":"totalSupply","inputs":[],"outputs":[{"name":"","type":"uint256"}],"stateMutability":"view"}]"#,
            ))
            .unwrap();
        assert_eq!(human.overloads("totalSupply")[0].selector, json.overloads("totalSupply")[0].selector);
        assert!(!Arc::ptr_eq(&human, &json));
    }

    #[test]
    fn concurrent_first_use_converges() {
        let cache = Arc::new(AbiCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.parse(AbiSource::HumanReadable(LINES)).unwrap())
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }
}
