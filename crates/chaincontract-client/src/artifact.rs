//! Compiler artifacts and command-line argument parsing.
//!
//! Artifacts from Foundry, Hardhat and plain `solc --combined-json` differ
//! in where they keep the bytecode: a hex string under `bytecode`, or an
//! object with the hex under `bytecode.object`. Both are accepted.

use std::sync::Arc;

use alloy_primitives::{Bytes, I256, U256};
use chaincontract_abi::{parse, AbiSource, ContractDescriptor};
use chaincontract_core::{AbiValue, ContractError};
use serde_json::Value;

type Result<T> = std::result::Result<T, ContractError>;

/// A parsed artifact: ABI plus creation bytecode.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub abi: Arc<ContractDescriptor>,
    pub bytecode: Bytes,
}

impl Artifact {
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| ContractError::invalid(format!("artifact is not valid JSON: {e}")))?;
        Self::from_value(&value)
    }

    pub fn from_value(artifact: &Value) -> Result<Self> {
        let abi_json = artifact
            .get("abi")
            .ok_or_else(|| ContractError::invalid("artifact has no \"abi\" field"))?
            .to_string();
        Ok(Self { abi: parse(AbiSource::Json(&abi_json))?, bytecode: bytecode(artifact)? })
    }

    /// `bytecode ++ abi.encode(constructor args)`. Arguments for a contract
    /// without a constructor are rejected.
    pub fn init_code(&self, args: &[AbiValue]) -> Result<Bytes> {
        self.abi.encode_deploy(&self.bytecode, args)
    }
}

/// Creation bytecode of an artifact.
pub fn bytecode(artifact: &Value) -> Result<Bytes> {
    let field = artifact
        .get("bytecode")
        .or_else(|| artifact.get("byte"))
        .ok_or_else(|| ContractError::invalid("bytecode not found in artifact"))?;
    let hex_str = match field {
        Value::String(s) => s.as_str(),
        Value::Object(obj) => obj
            .get("object")
            .and_then(Value::as_str)
            .ok_or_else(|| ContractError::invalid("artifact bytecode object has no \"object\" string"))?,
        _ => return Err(ContractError::invalid("artifact bytecode must be a string or an object")),
    };
    let stripped = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    if stripped.is_empty() {
        return Err(ContractError::invalid("artifact bytecode is empty (abstract contract or interface?)"));
    }
    hex::decode(stripped)
        .map(Bytes::from)
        .map_err(|e| ContractError::invalid(format!("artifact bytecode is not hex: {e}")))
}

/// Init code from an artifact JSON value and constructor arguments.
pub fn init_code(artifact: &Value, args: &[AbiValue]) -> Result<Bytes> {
    Artifact::from_value(artifact)?.init_code(args)
}

/// Best-effort typing of a command-line argument. Final conversion happens
/// against the parameter type at encode time, so `0x` hex becomes bytes
/// (which also feed `address` and `bytesN` parameters), integers become
/// `Uint`/`Int`, `true`/`false` become `Bool`, and anything else a string.
pub fn parse_cli_arg(arg: &str) -> AbiValue {
    if let Some(hex_digits) = arg.strip_prefix("0x") {
        if let Ok(raw) = hex::decode(hex_digits) {
            return AbiValue::Bytes(raw);
        }
    }
    match arg {
        "true" => return AbiValue::Bool(true),
        "false" => return AbiValue::Bool(false),
        _ => {}
    }
    if let Ok(u) = U256::from_str_radix(arg, 10) {
        return AbiValue::Uint(u);
    }
    if arg.starts_with('-') {
        if let Ok(i) = I256::from_dec_str(arg) {
            return AbiValue::Int(i);
        }
    }
    AbiValue::Str(arg.to_string())
}
