//! Conversion between core chain types and the node's JSON shapes.
//!
//! Quantities travel as `0x`-prefixed hex without leading zeros; data and
//! hashes as `0x`-prefixed hex of their full width.

use alloy_primitives::{Address, Bytes, B256, U256};
use chaincontract_core::{LogFilter, RawLog, Receipt, TransportError, TxRequest};
use serde::{Deserialize, Deserializer};
use serde_json::{json, Map, Value};

type Result<T> = std::result::Result<T, TransportError>;

// ─── Requests ─────────────────────────────────────────────────────────────────

/// Call object for `eth_call`, `eth_estimateGas` and `eth_sendTransaction`.
pub fn tx_object(tx: &TxRequest) -> Value {
    let mut obj = Map::new();
    if let Some(from) = tx.from {
        obj.insert("from".into(), json!(from));
    }
    if let Some(to) = tx.to {
        obj.insert("to".into(), json!(to));
    }
    if let Some(data) = &tx.data {
        obj.insert("data".into(), json!(data));
    }
    if let Some(value) = tx.value {
        obj.insert("value".into(), json!(format!("0x{value:x}")));
    }
    if let Some(gas) = tx.gas {
        obj.insert("gas".into(), json!(format!("0x{gas:x}")));
    }
    if let Some(nonce) = tx.nonce {
        obj.insert("nonce".into(), json!(format!("0x{nonce:x}")));
    }
    Value::Object(obj)
}

/// Filter object for `eth_getLogs`.
pub fn filter_object(filter: &LogFilter) -> Value {
    let mut obj = Map::new();
    match filter.address.as_slice() {
        [] => {}
        [single] => {
            obj.insert("address".into(), json!(single));
        }
        many => {
            obj.insert("address".into(), json!(many));
        }
    }
    if !filter.topics.is_empty() {
        let topics: Vec<Value> = filter
            .topics
            .iter()
            .map(|slot| match slot.as_deref() {
                None => Value::Null,
                Some([one]) => json!(one),
                Some(any) => json!(any),
            })
            .collect();
        obj.insert("topics".into(), Value::Array(topics));
    }
    if let Some(from) = filter.from_block {
        obj.insert("fromBlock".into(), json!(from.to_rpc_param()));
    }
    if let Some(to) = filter.to_block {
        obj.insert("toBlock".into(), json!(to.to_rpc_param()));
    }
    Value::Object(obj)
}

// ─── Responses ────────────────────────────────────────────────────────────────

fn unexpected(what: &str, value: &Value) -> TransportError {
    TransportError::Other(format!("expected {what}, node returned {value}"))
}

fn strip(s: &str) -> &str {
    s.strip_prefix("0x").unwrap_or(s)
}

pub fn parse_bytes(value: &Value) -> Result<Bytes> {
    let s = value.as_str().ok_or_else(|| unexpected("hex data", value))?;
    hex::decode(strip(s)).map(Bytes::from).map_err(|_| unexpected("hex data", value))
}

pub fn parse_b256(value: &Value) -> Result<B256> {
    let raw = parse_bytes(value)?;
    if raw.len() != 32 {
        return Err(unexpected("32-byte hash", value));
    }
    Ok(B256::from_slice(&raw))
}

pub fn parse_u256(value: &Value) -> Result<U256> {
    let s = value.as_str().ok_or_else(|| unexpected("hex quantity", value))?;
    U256::from_str_radix(strip(s), 16).map_err(|_| unexpected("hex quantity", value))
}

pub fn parse_u128(value: &Value) -> Result<u128> {
    let s = value.as_str().ok_or_else(|| unexpected("hex quantity", value))?;
    u128::from_str_radix(strip(s), 16).map_err(|_| unexpected("hex quantity", value))
}

pub fn parse_u64(value: &Value) -> Result<u64> {
    let s = value.as_str().ok_or_else(|| unexpected("hex quantity", value))?;
    u64::from_str_radix(strip(s), 16).map_err(|_| unexpected("hex quantity", value))
}

pub fn parse_addresses(value: &Value) -> Result<Vec<Address>> {
    serde_json::from_value(value.clone()).map_err(TransportError::from)
}

fn quantity<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<u64, D::Error> {
    let s = String::deserialize(d)?;
    u64::from_str_radix(strip(&s), 16).map_err(serde::de::Error::custom)
}

fn opt_quantity<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<u64>, D::Error> {
    Option::<String>::deserialize(d)?
        .map(|s| u64::from_str_radix(strip(&s), 16).map_err(serde::de::Error::custom))
        .transpose()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireLog {
    address: Address,
    topics: Vec<B256>,
    data: Bytes,
    #[serde(default, deserialize_with = "opt_quantity")]
    block_number: Option<u64>,
    #[serde(default)]
    transaction_hash: Option<B256>,
    #[serde(default, deserialize_with = "opt_quantity")]
    log_index: Option<u64>,
}

impl From<WireLog> for RawLog {
    fn from(w: WireLog) -> Self {
        RawLog {
            address: w.address,
            topics: w.topics,
            data: w.data,
            block_number: w.block_number,
            transaction_hash: w.transaction_hash,
            log_index: w.log_index,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireReceipt {
    transaction_hash: B256,
    #[serde(default, deserialize_with = "opt_quantity")]
    block_number: Option<u64>,
    from: Address,
    #[serde(default)]
    to: Option<Address>,
    /// Absent on pre-Byzantium receipts.
    #[serde(default, deserialize_with = "opt_quantity")]
    status: Option<u64>,
    #[serde(default)]
    contract_address: Option<Address>,
    #[serde(deserialize_with = "quantity")]
    gas_used: u64,
    #[serde(default)]
    logs: Vec<WireLog>,
}

pub fn parse_logs(value: Value) -> Result<Vec<RawLog>> {
    let logs: Vec<WireLog> = serde_json::from_value(value)?;
    Ok(logs.into_iter().map(RawLog::from).collect())
}

/// `None` for a `null` result (transaction still pending).
pub fn parse_receipt(value: Value) -> Result<Option<Receipt>> {
    if value.is_null() {
        return Ok(None);
    }
    let w: WireReceipt = serde_json::from_value(value)?;
    Ok(Some(Receipt {
        transaction_hash: w.transaction_hash,
        block_number: w.block_number,
        from: w.from,
        to: w.to,
        status: w.status.map_or(true, |s| s == 1),
        contract_address: w.contract_address,
        gas_used: w.gas_used,
        logs: w.logs.into_iter().map(RawLog::from).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaincontract_core::BlockTag;

    #[test]
    fn tx_object_uses_hex_quantities() {
        let tx = TxRequest::new()
            .to(Address::repeat_byte(1))
            .data(vec![0xab])
            .value(U256::from(255u64))
            .gas(21_000)
            .nonce(0);
        let obj = tx_object(&tx);
        assert_eq!(obj["to"], "0x0101010101010101010101010101010101010101");
        assert_eq!(obj["data"], "0xab");
        assert_eq!(obj["value"], "0xff");
        assert_eq!(obj["gas"], "0x5208");
        assert_eq!(obj["nonce"], "0x0");
        assert!(obj.get("from").is_none());
    }

    #[test]
    fn filter_object_shapes() {
        let topic = B256::repeat_byte(7);
        let filter = LogFilter::new()
            .address(Address::repeat_byte(2))
            .event(topic)
            .from_block(BlockTag::Number(16))
            .to_block(BlockTag::Latest);
        let obj = filter_object(&filter);
        assert!(obj["address"].is_string());
        assert_eq!(obj["topics"][0], json!(topic));
        assert_eq!(obj["fromBlock"], "0x10");
        assert_eq!(obj["toBlock"], "latest");
    }

    #[test]
    fn receipt_from_node_json() {
        let receipt = parse_receipt(json!({
            "transactionHash": format!("0x{}", "11".repeat(32)),
            "blockNumber": "0x1b4",
            "from": "0x0101010101010101010101010101010101010101",
            "to": null,
            "status": "0x0",
            "contractAddress": "0x0202020202020202020202020202020202020202",
            "gasUsed": "0x5208",
            "logs": [{
                "address": "0x0303030303030303030303030303030303030303",
                "topics": [format!("0x{}", "aa".repeat(32))],
                "data": "0x",
                "logIndex": "0x2",
                "removed": false
            }]
        }))
        .unwrap()
        .unwrap();
        assert_eq!(receipt.block_number, Some(436));
        assert!(!receipt.status);
        assert_eq!(receipt.gas_used, 21_000);
        assert_eq!(receipt.contract_address, Some(Address::repeat_byte(2)));
        assert_eq!(receipt.logs[0].log_index, Some(2));
        assert!(receipt.logs[0].data.is_empty());

        assert_eq!(parse_receipt(Value::Null).unwrap(), None);
    }

    #[test]
    fn scalar_results() {
        assert_eq!(parse_u64(&json!("0x1")).unwrap(), 1);
        assert_eq!(parse_u256(&json!("0xde0b6b3a7640000")).unwrap(), U256::from(10u64).pow(U256::from(18u64)));
        assert_eq!(parse_bytes(&json!("0x")).unwrap(), Bytes::new());
        assert!(parse_b256(&json!("0x01")).is_err());
        assert!(parse_u64(&json!(1)).is_err());
    }
}
