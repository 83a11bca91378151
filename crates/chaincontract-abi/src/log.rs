//! Decoded event logs.

use alloy_primitives::B256;
use chaincontract_core::AbiValue;

/// A log decoded against its event declaration. Arguments keep
/// declaration order, indexed and non-indexed interleaved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLog {
    pub name: String,
    pub signature: String,
    pub topic: B256,
    pub args: Vec<(String, AbiValue)>,
}

impl DecodedLog {
    pub fn get(&self, name: &str) -> Option<&AbiValue> {
        self.args.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn values(&self) -> impl Iterator<Item = &AbiValue> {
        self.args.iter().map(|(_, v)| v)
    }
}
