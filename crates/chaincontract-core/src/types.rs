//! The native value model.
//!
//! Arguments handed to a call and values decoded from return data, logs or
//! revert payloads are all [`AbiValue`]s. Variants follow the EVM ABI type
//! families; bit widths and array lengths come from the ABI entry, not the
//! value, so one `AbiValue::Uint` can feed a `uint8` or a `uint256` parameter.

use alloy_primitives::{Address, Bytes, B256, I256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A typed native value exchanged with the ABI layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum AbiValue {
    Uint(U256),
    Int(I256),
    Bool(bool),
    Address(Address),
    /// `bytes1` .. `bytes32`, stored at the declared width (no padding).
    FixedBytes(Vec<u8>),
    Bytes(Vec<u8>),
    Str(String),
    Array(Vec<AbiValue>),
    /// Tuple / struct. Names are empty for anonymous components.
    Tuple(Vec<(String, AbiValue)>),
}

impl AbiValue {
    /// Build an anonymous tuple from positional values.
    pub fn tuple(values: impl IntoIterator<Item = AbiValue>) -> Self {
        AbiValue::Tuple(values.into_iter().map(|v| (String::new(), v)).collect())
    }

    /// Build an array from values of one element type.
    pub fn array(values: impl IntoIterator<Item = AbiValue>) -> Self {
        AbiValue::Array(values.into_iter().collect())
    }

    /// Short name of the value family, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            AbiValue::Uint(_) => "uint",
            AbiValue::Int(_) => "int",
            AbiValue::Bool(_) => "bool",
            AbiValue::Address(_) => "address",
            AbiValue::FixedBytes(_) => "fixed-bytes",
            AbiValue::Bytes(_) => "bytes",
            AbiValue::Str(_) => "string",
            AbiValue::Array(_) => "array",
            AbiValue::Tuple(_) => "tuple",
        }
    }

    pub fn as_uint(&self) -> Option<U256> {
        match self {
            AbiValue::Uint(v) => Some(*v),
            AbiValue::Int(v) if !v.is_negative() => Some(v.into_raw()),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<I256> {
        match self {
            AbiValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AbiValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<Address> {
        match self {
            AbiValue::Address(a) => Some(*a),
            _ => None,
        }
    }

    /// Raw bytes of a `bytes` or `bytesN` value.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            AbiValue::Bytes(b) | AbiValue::FixedBytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AbiValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[AbiValue]> {
        match self {
            AbiValue::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[(String, AbiValue)]> {
        match self {
            AbiValue::Tuple(v) => Some(v),
            _ => None,
        }
    }

    /// Look up a tuple component by name.
    pub fn field(&self, name: &str) -> Option<&AbiValue> {
        self.as_tuple()?
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

impl From<bool> for AbiValue {
    fn from(v: bool) -> Self {
        AbiValue::Bool(v)
    }
}

impl From<u64> for AbiValue {
    fn from(v: u64) -> Self {
        AbiValue::Uint(U256::from(v))
    }
}

impl From<u128> for AbiValue {
    fn from(v: u128) -> Self {
        AbiValue::Uint(U256::from(v))
    }
}

impl From<U256> for AbiValue {
    fn from(v: U256) -> Self {
        AbiValue::Uint(v)
    }
}

impl From<i64> for AbiValue {
    fn from(v: i64) -> Self {
        AbiValue::Int(I256::try_from(v).unwrap_or_default())
    }
}

impl From<I256> for AbiValue {
    fn from(v: I256) -> Self {
        AbiValue::Int(v)
    }
}

impl From<Address> for AbiValue {
    fn from(v: Address) -> Self {
        AbiValue::Address(v)
    }
}

impl From<B256> for AbiValue {
    fn from(v: B256) -> Self {
        AbiValue::FixedBytes(v.to_vec())
    }
}

impl From<Bytes> for AbiValue {
    fn from(v: Bytes) -> Self {
        AbiValue::Bytes(v.to_vec())
    }
}

impl From<Vec<u8>> for AbiValue {
    fn from(v: Vec<u8>) -> Self {
        AbiValue::Bytes(v)
    }
}

impl From<&str> for AbiValue {
    fn from(v: &str) -> Self {
        AbiValue::Str(v.to_string())
    }
}

impl From<String> for AbiValue {
    fn from(v: String) -> Self {
        AbiValue::Str(v)
    }
}

impl fmt::Display for AbiValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbiValue::Uint(v) => write!(f, "{v}"),
            AbiValue::Int(v) => write!(f, "{v}"),
            AbiValue::Bool(v) => write!(f, "{v}"),
            AbiValue::Address(a) => write!(f, "{a}"),
            AbiValue::FixedBytes(b) | AbiValue::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
            AbiValue::Str(s) => write!(f, "{s:?}"),
            AbiValue::Array(v) => {
                let parts: Vec<_> = v.iter().map(|x| x.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            AbiValue::Tuple(fields) => {
                let parts: Vec<_> = fields
                    .iter()
                    .map(|(k, v)| {
                        if k.is_empty() {
                            v.to_string()
                        } else {
                            format!("{k}: {v}")
                        }
                    })
                    .collect();
                write!(f, "({})", parts.join(", "))
            }
        }
    }
}
