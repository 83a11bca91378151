//! Converts alloy `DynSolValue` → ChainContract `AbiValue`.
//!
//! Tuple components take their names from the ABI `components` list so
//! decoded structs can be read by field. Unnamed components get positional
//! names "0", "1", ...

use alloy_dyn_abi::DynSolValue;
use alloy_json_abi::Param;
use chaincontract_core::AbiValue;

/// Convert a decoded `DynSolValue` into an `AbiValue`.
///
/// `components` are the tuple components of the ABI parameter the value was
/// decoded for (empty for non-tuple types). Arrays pass them through to
/// their elements.
pub fn normalize(val: DynSolValue, components: &[Param]) -> AbiValue {
    match val {
        DynSolValue::Bool(b) => AbiValue::Bool(b),
        DynSolValue::Int(i, _) => AbiValue::Int(i),
        DynSolValue::Uint(u, _) => AbiValue::Uint(u),

        // Word is right-padded; keep only the declared width.
        DynSolValue::FixedBytes(word, size) => AbiValue::FixedBytes(word[..size.min(32)].to_vec()),

        DynSolValue::Bytes(b) => AbiValue::Bytes(b),
        DynSolValue::String(s) => AbiValue::Str(s),
        DynSolValue::Address(a) => AbiValue::Address(a),

        DynSolValue::Array(vals) | DynSolValue::FixedArray(vals) => {
            AbiValue::Array(vals.into_iter().map(|v| normalize(v, components)).collect())
        }

        DynSolValue::Tuple(fields) => AbiValue::Tuple(
            fields
                .into_iter()
                .enumerate()
                .map(|(i, v)| match components.get(i) {
                    Some(p) => (field_name(&p.name, i), normalize(v, &p.components)),
                    None => (i.to_string(), normalize(v, &[])),
                })
                .collect(),
        ),

        // 24-byte function pointer (address ++ selector)
        DynSolValue::Function(f) => AbiValue::FixedBytes(f.to_vec()),

        // Named structs (eip712 builds) decode as plain tuples.
        #[allow(unreachable_patterns)]
        other => AbiValue::tuple(
            other.as_fixed_seq().unwrap_or_default().iter().cloned().map(|v| normalize(v, &[])),
        ),
    }
}

/// Normalize a positional list against its parameters, e.g. function outputs.
pub fn normalize_params(values: Vec<DynSolValue>, params: &[Param]) -> Vec<(String, AbiValue)> {
    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| match params.get(i) {
            Some(p) => (field_name(&p.name, i), normalize(v, &p.components)),
            None => (i.to_string(), normalize(v, &[])),
        })
        .collect()
}

pub(crate) fn field_name(name: &str, index: usize) -> String {
    if name.is_empty() {
        index.to_string()
    } else {
        name.to_string()
    }
}
