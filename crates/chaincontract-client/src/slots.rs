//! Storage-slot detection for token balance and allowance mappings.
//!
//! Overriding a token balance in `eth_call` state overrides needs the
//! storage slot of the balance mapping, which ERC-20 does not standardize.
//! Tracing a `balanceOf(user)` (or `allowance(user, spender)`) call with
//! the struct-log tracer reveals it: a mapping read compiles to
//!
//! ```text
//! slot = KECCAK256(v0 ++ v1)
//! SLOAD(slot)
//! ```
//!
//! where Solidity hashes `key ++ mapping_slot` and Vyper hashes
//! `mapping_slot ++ key`. Nested mappings hash twice.

use std::collections::{HashMap, HashSet};

use alloy_primitives::{Address, B256, U256};
use chaincontract_abi::hash::keccak256_concat;
use chaincontract_core::ContractError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ─── Mapping slots ────────────────────────────────────────────────────────────

/// How a compiler lays out `mapping(key => value)` storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotLayout {
    /// `keccak256(key ++ slot)`
    Solidity,
    /// `keccak256(slot ++ key)`
    Vyper,
}

/// Base slot of a mapping plus its layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingSlot {
    pub slot: B256,
    pub layout: SlotLayout,
}

impl MappingSlot {
    pub fn new(slot: B256, layout: SlotLayout) -> Self {
        Self { slot, layout }
    }

    pub fn solidity(slot: u64) -> Self {
        Self::new(B256::from(U256::from(slot)), SlotLayout::Solidity)
    }

    pub fn vyper(slot: u64) -> Self {
        Self::new(B256::from(U256::from(slot)), SlotLayout::Vyper)
    }

    /// Slot holding the value for `key`; chain calls for nested mappings.
    pub fn value(&self, key: B256) -> MappingSlot {
        let slot = match self.layout {
            SlotLayout::Solidity => keccak256_concat(&[key.as_slice(), self.slot.as_slice()]),
            SlotLayout::Vyper => keccak256_concat(&[self.slot.as_slice(), key.as_slice()]),
        };
        MappingSlot { slot, layout: self.layout }
    }

    /// Slot of `mapping[address]`.
    pub fn value_for(&self, key: Address) -> MappingSlot {
        self.value(key.into_word())
    }
}

// ─── Struct-log traces ────────────────────────────────────────────────────────

/// EVM memory as reported by tracers: one hex string or 32-byte words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TraceMemory {
    Hex(String),
    Words(Vec<String>),
}

impl TraceMemory {
    fn bytes(&self) -> Option<Vec<u8>> {
        match self {
            TraceMemory::Hex(s) => hex::decode(s.strip_prefix("0x").unwrap_or(s)).ok(),
            TraceMemory::Words(words) => {
                let mut out = Vec::with_capacity(words.len() * 32);
                for w in words {
                    out.extend(hex::decode(w.strip_prefix("0x").unwrap_or(w)).ok()?);
                }
                Some(out)
            }
        }
    }
}

/// One step of a `debug_traceCall` struct-log trace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructLog {
    #[serde(default)]
    pub op: Option<String>,
    #[serde(default)]
    pub op_name: Option<String>,
    pub depth: u64,
    /// Bottom to top; the last entry is the top of the stack.
    #[serde(default)]
    pub stack: Option<Vec<String>>,
    #[serde(default)]
    pub memory: Option<TraceMemory>,
}

impl StructLog {
    pub fn op(&self) -> &str {
        self.op_name.as_deref().or(self.op.as_deref()).unwrap_or_default()
    }

    /// The `n`th stack entry from the top (0 = top).
    fn peek(&self, n: usize) -> Option<B256> {
        let stack = self.stack.as_ref()?;
        let entry = stack.get(stack.len().checked_sub(n + 1)?)?;
        parse_word(entry)
    }
}

/// Parse a tracer result: either `{"structLogs": [...]}` or the bare list.
pub fn parse_struct_logs(trace: &Value) -> Result<Vec<StructLog>, ContractError> {
    let logs = trace.get("structLogs").unwrap_or(trace);
    serde_json::from_value(logs.clone())
        .map_err(|e| ContractError::decoding(format!("invalid struct-log trace: {e}")))
}

fn parse_word(s: &str) -> Option<B256> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let value = U256::from_str_radix(digits, 16).ok()?;
    Some(B256::from(value))
}

fn word_to_usize(word: B256) -> Option<usize> {
    usize::try_from(U256::from_be_bytes(word.0)).ok()
}

/// `(contract, v0, v1, slot)`: an SLOAD of `keccak256(v0 ++ v1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingRead {
    pub contract: Address,
    pub v0: B256,
    pub v1: B256,
    pub slot: B256,
}

/// `(contract, v0, v1, v2, slot)`: an SLOAD of a slot hashed from `v2`
/// and `keccak256(v0 ++ v1)`, in either order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NestedMappingRead {
    pub contract: Address,
    pub v0: B256,
    pub v1: B256,
    pub v2: B256,
    pub slot: B256,
}

/// Walk `steps`, tracking the executing contract per call depth and the
/// pre-images of 64-byte KECCAK256 operations, and report every SLOAD.
fn walk_sloads<'a>(
    top_contract: Address,
    steps: impl IntoIterator<Item = &'a StructLog>,
    mut on_sload: impl FnMut(Address, B256, &HashMap<B256, (B256, B256)>),
) {
    let mut contracts: HashMap<u64, Address> = HashMap::from([(1, top_contract)]);
    let mut hashed: HashMap<B256, (B256, B256)> = HashMap::new();
    let mut pending: Option<(B256, B256)> = None;

    for step in steps {
        if step.stack.is_none() {
            continue;
        }
        // The hash lands on top of the stack of the step after KECCAK256.
        if let Some(pre_image) = pending.take() {
            if let Some(result) = step.peek(0) {
                hashed.insert(result, pre_image);
            }
        }

        match step.op() {
            "KECCAK256" | "SHA3" => {
                let (Some(offset), Some(size)) = (step.peek(0), step.peek(1)) else { continue };
                if word_to_usize(size) != Some(64) {
                    continue;
                }
                let Some(offset) = word_to_usize(offset) else { continue };
                let Some(memory) = step.memory.as_ref().and_then(TraceMemory::bytes) else { continue };
                let Some(end) = offset.checked_add(64) else { continue };
                if let Some(window) = memory.get(offset..end) {
                    pending = Some((B256::from_slice(&window[..32]), B256::from_slice(&window[32..])));
                }
            }
            "SLOAD" => {
                let (Some(slot), Some(contract)) = (step.peek(0), contracts.get(&step.depth)) else { continue };
                on_sload(*contract, slot, &hashed);
            }
            "CALL" | "STATICCALL" => {
                if let Some(target) = step.peek(1) {
                    contracts.insert(step.depth + 1, Address::from_word(target));
                }
            }
            "DELEGATECALL" => {
                if let Some(current) = contracts.get(&step.depth).copied() {
                    contracts.insert(step.depth + 1, current);
                }
            }
            _ => {}
        }
    }
}

pub fn parse_mapping_reads<'a>(
    top_contract: Address,
    steps: impl IntoIterator<Item = &'a StructLog>,
) -> Vec<MappingRead> {
    let mut reads = Vec::new();
    walk_sloads(top_contract, steps, |contract, slot, hashed| {
        if let Some(&(v0, v1)) = hashed.get(&slot) {
            reads.push(MappingRead { contract, v0, v1, slot });
        }
    });
    reads
}

pub fn parse_nested_mapping_reads<'a>(
    top_contract: Address,
    steps: impl IntoIterator<Item = &'a StructLog>,
) -> Vec<NestedMappingRead> {
    let mut reads = Vec::new();
    walk_sloads(top_contract, steps, |contract, slot, hashed| {
        let Some(&(n0, n1)) = hashed.get(&slot) else { return };
        let inner = match (hashed.get(&n0), hashed.get(&n1)) {
            (Some(&(v0, v1)), _) => Some((v0, v1, n1)),
            (None, Some(&(v0, v1))) => Some((v0, v1, n0)),
            (None, None) => None,
        };
        if let Some((v0, v1, v2)) = inner {
            reads.push(NestedMappingRead { contract, v0, v1, v2, slot });
        }
    });
    reads
}

// ─── Detection ────────────────────────────────────────────────────────────────

fn classify(user: B256, v0: B256, v1: B256) -> Option<MappingSlot> {
    if v0 == user {
        Some(MappingSlot::new(v1, SlotLayout::Solidity))
    } else if v1 == user {
        Some(MappingSlot::new(v0, SlotLayout::Vyper))
    } else {
        None
    }
}

/// Balance mapping of `token`, from a trace of `token.balanceOf(user)`.
pub fn parse_balance_slot(token: Address, user: Address, steps: &[StructLog]) -> Option<MappingSlot> {
    let user = user.into_word();
    parse_mapping_reads(token, steps)
        .into_iter()
        .filter(|r| r.contract == token)
        .find_map(|r| classify(user, r.v0, r.v1))
}

/// Allowance mapping of `token`, from a trace of
/// `token.allowance(user, spender)`.
pub fn parse_allowance_slot(
    token: Address,
    user: Address,
    spender: Address,
    steps: &[StructLog],
) -> Option<MappingSlot> {
    let (user, spender) = (user.into_word(), spender.into_word());
    parse_nested_mapping_reads(token, steps)
        .into_iter()
        .filter(|r| r.contract == token && r.v2 == spender)
        .find_map(|r| classify(user, r.v0, r.v1))
}

/// Balance mappings of several tokens from one trace of a multicall of
/// `balanceOf(user)`. Later reads of the same token win.
pub fn parse_batch_balance_slot(
    tokens: &HashSet<Address>,
    user: Address,
    steps: &[StructLog],
) -> HashMap<Address, MappingSlot> {
    let user = user.into_word();
    let mut found = HashMap::new();
    for read in parse_mapping_reads(Address::ZERO, steps) {
        if !tokens.contains(&read.contract) {
            continue;
        }
        if let Some(slot) = classify(user, read.v0, read.v1) {
            found.insert(read.contract, slot);
        }
    }
    found
}

/// Allowance mappings of several tokens from one trace of a multicall of
/// `allowance(user, spender)`.
pub fn parse_batch_allowance_slot(
    tokens: &HashSet<Address>,
    user: Address,
    spender: Address,
    steps: &[StructLog],
) -> HashMap<Address, MappingSlot> {
    let (user, spender) = (user.into_word(), spender.into_word());
    let mut found = HashMap::new();
    for read in parse_nested_mapping_reads(Address::ZERO, steps) {
        if !tokens.contains(&read.contract) || read.v2 != spender {
            continue;
        }
        if let Some(slot) = classify(user, read.v0, read.v1) {
            found.insert(read.contract, slot);
        }
    }
    found
}
