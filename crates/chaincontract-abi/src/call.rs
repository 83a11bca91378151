//! Encoded calls and their decoded results.

use std::sync::Arc;

use alloy_primitives::{Bytes, Selector};
use chaincontract_core::{AbiValue, ContractError};

use crate::descriptor::FunctionEntry;

/// Calldata for one resolved function overload.
///
/// Keeps the overload it was built from so the matching return data can
/// be decoded without resolving the name again.
#[derive(Debug, Clone)]
pub struct EncodedCall {
    function: Arc<FunctionEntry>,
    calldata: Bytes,
}

impl EncodedCall {
    pub fn new(function: Arc<FunctionEntry>, calldata: Bytes) -> Self {
        Self { function, calldata }
    }

    pub fn function(&self) -> &Arc<FunctionEntry> {
        &self.function
    }

    pub fn selector(&self) -> Selector {
        self.function.selector
    }

    pub fn calldata(&self) -> &Bytes {
        &self.calldata
    }

    pub fn into_calldata(self) -> Bytes {
        self.calldata
    }

    /// Decode return data produced by executing this call.
    pub fn decode_result(&self, data: &[u8]) -> Result<DecodedResult, ContractError> {
        Ok(DecodedResult {
            signature: self.function.signature.clone(),
            outputs: self.function.decode_output(data)?,
        })
    }
}

/// Named outputs of a function call, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedResult {
    pub signature: String,
    pub outputs: Vec<(String, AbiValue)>,
}

impl DecodedResult {
    /// The only output, for single-return functions.
    pub fn single(&self) -> Option<&AbiValue> {
        match self.outputs.as_slice() {
            [(_, v)] => Some(v),
            _ => None,
        }
    }

    /// Output by name, or by position for unnamed outputs ("0", "1", ...).
    pub fn get(&self, name: &str) -> Option<&AbiValue> {
        self.outputs.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Collapse into one value: the single output itself, or a tuple of
    /// all outputs.
    pub fn into_value(mut self) -> AbiValue {
        if self.outputs.len() == 1 {
            if let Some((_, v)) = self.outputs.pop() {
                return v;
            }
        }
        AbiValue::Tuple(self.outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ContractDescriptor;
    use alloy_primitives::U256;

    fn descriptor() -> ContractDescriptor {
        ContractDescriptor::from_human_readable(&[
            "function balanceOf(address owner) view returns (uint256)",
            "function getReserves() view returns (uint112 reserve0, uint112 reserve1, uint32)",
            "function ping()",
        ])
        .unwrap()
    }

    #[test]
    fn single_output() {
        let d = descriptor();
        let call = d.encode_call("balanceOf", &[AbiValue::Address(Default::default())]).unwrap();
        assert_eq!(call.calldata().len(), 36);
        let result = call.decode_result(&U256::from(42u64).to_be_bytes::<32>()).unwrap();
        assert_eq!(result.single(), Some(&AbiValue::Uint(U256::from(42u64))));
        assert_eq!(result.into_value(), AbiValue::Uint(U256::from(42u64)));
    }

    #[test]
    fn multiple_outputs_named_and_positional() {
        let d = descriptor();
        let call = d.encode_call("getReserves", &[]).unwrap();
        let mut data = Vec::new();
        for n in [1u64, 2, 3] {
            data.extend_from_slice(&U256::from(n).to_be_bytes::<32>());
        }
        let result = call.decode_result(&data).unwrap();
        assert_eq!(result.len(), 3);
        assert!(result.single().is_none());
        assert_eq!(result.get("reserve1"), Some(&AbiValue::Uint(U256::from(2u64))));
        assert_eq!(result.get("2"), Some(&AbiValue::Uint(U256::from(3u64))));
    }

    #[test]
    fn truncated_return_data() {
        let d = descriptor();
        let call = d.encode_call("getReserves", &[]).unwrap();
        let err = call.decode_result(&[0u8; 40]).unwrap_err();
        assert_eq!(err.classification(), "DecodingError");
        let err = call.decode_result(&[]).unwrap_err();
        assert_eq!(err.classification(), "DecodingError");
    }

    #[test]
    fn no_outputs() {
        let d = descriptor();
        let call = d.encode_call("ping", &[]).unwrap();
        assert_eq!(hex::encode(call.calldata()), hex::encode(call.selector()));
        assert!(call.decode_result(&[]).unwrap().is_empty());
    }
}
