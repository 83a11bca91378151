//! Chain-facing data types exchanged with a [`ChainTransport`](crate::transport::ChainTransport).

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Block selector for state-reading calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockTag {
    #[default]
    Latest,
    Pending,
    Earliest,
    Number(u64),
}

impl BlockTag {
    /// JSON-RPC parameter form: `"latest"` or a hex quantity.
    pub fn to_rpc_param(&self) -> String {
        match self {
            BlockTag::Latest => "latest".into(),
            BlockTag::Pending => "pending".into(),
            BlockTag::Earliest => "earliest".into(),
            BlockTag::Number(n) => format!("0x{n:x}"),
        }
    }
}

impl fmt::Display for BlockTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockTag::Number(n) => write!(f, "{n}"),
            other => f.write_str(&other.to_rpc_param()),
        }
    }
}

/// Transaction / call parameters.
///
/// Every field is optional so the same type serves as a full request and as a
/// set of overrides; see [`TxRequest::merge`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,
}

impl TxRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    pub fn to(mut self, to: Address) -> Self {
        self.to = Some(to);
        self
    }

    pub fn data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }

    pub fn gas(mut self, gas: u64) -> Self {
        self.gas = Some(gas);
        self
    }

    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Layer `overrides` on top of `self`; fields set in `overrides` win.
    pub fn merge(&self, overrides: &TxRequest) -> TxRequest {
        TxRequest {
            from: overrides.from.or(self.from),
            to: overrides.to.or(self.to),
            data: overrides.data.clone().or_else(|| self.data.clone()),
            value: overrides.value.or(self.value),
            gas: overrides.gas.or(self.gas),
            nonce: overrides.nonce.or(self.nonce),
        }
    }

    /// Calldata, or empty when unset.
    pub fn input(&self) -> &[u8] {
        self.data.as_ref().map_or(&[][..], |d| &d[..])
    }
}

/// An event log as returned by `eth_getLogs` or inside a receipt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<B256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_index: Option<u64>,
}

impl RawLog {
    pub fn topic0(&self) -> Option<&B256> {
        self.topics.first()
    }
}

/// A mined transaction receipt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub block_number: Option<u64>,
    pub from: Address,
    #[serde(default)]
    pub to: Option<Address>,
    /// `true` for status `0x1`.
    pub status: bool,
    #[serde(default)]
    pub contract_address: Option<Address>,
    pub gas_used: u64,
    #[serde(default)]
    pub logs: Vec<RawLog>,
}

impl Receipt {
    pub fn succeeded(&self) -> bool {
        self.status
    }
}

/// Filter for `eth_getLogs`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogFilter {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<Address>,
    /// Positional topic constraints; `None` matches anything, a list matches
    /// any of its members.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub topics: Vec<Option<Vec<B256>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_block: Option<BlockTag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_block: Option<BlockTag>,
}

impl LogFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn address(mut self, address: Address) -> Self {
        self.address.push(address);
        self
    }

    /// Constrain topic0 to a single event signature.
    pub fn event(mut self, topic0: B256) -> Self {
        if self.topics.is_empty() {
            self.topics.push(Some(vec![topic0]));
        } else {
            self.topics[0] = Some(vec![topic0]);
        }
        self
    }

    pub fn from_block(mut self, block: BlockTag) -> Self {
        self.from_block = Some(block);
        self
    }

    pub fn to_block(mut self, block: BlockTag) -> Self {
        self.to_block = Some(block);
        self
    }

    /// Whether `log` satisfies the address and topic constraints.
    pub fn matches(&self, log: &RawLog) -> bool {
        if !self.address.is_empty() && !self.address.contains(&log.address) {
            return false;
        }
        self.topics.iter().enumerate().all(|(i, want)| match want {
            None => true,
            Some(options) => log.topics.get(i).is_some_and(|t| options.contains(t)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_tag_rpc_param() {
        assert_eq!(BlockTag::Latest.to_rpc_param(), "latest");
        assert_eq!(BlockTag::Number(255).to_rpc_param(), "0xff");
    }

    #[test]
    fn merge_prefers_overrides() {
        let base = TxRequest::new()
            .to(Address::with_last_byte(1))
            .value(U256::from(5))
            .gas(21_000);
        let merged = base.merge(&TxRequest::new().value(U256::from(9)));
        assert_eq!(merged.to, Some(Address::with_last_byte(1)));
        assert_eq!(merged.value, Some(U256::from(9)));
        assert_eq!(merged.gas, Some(21_000));
    }

    #[test]
    fn input_defaults_to_empty() {
        assert!(TxRequest::new().input().is_empty());
        let tx = TxRequest::new().data(vec![0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(tx.input(), &[0xa9, 0x05, 0x9c, 0xbb]);
    }

    #[test]
    fn filter_matching() {
        let topic = B256::with_last_byte(7);
        let log = RawLog {
            address: Address::with_last_byte(2),
            topics: vec![topic],
            ..Default::default()
        };
        assert!(LogFilter::new().event(topic).matches(&log));
        assert!(!LogFilter::new().event(B256::ZERO).matches(&log));
        assert!(!LogFilter::new().address(Address::ZERO).matches(&log));
    }
}
