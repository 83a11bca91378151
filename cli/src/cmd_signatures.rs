//! `chaincontract signatures`: list every ABI entry with its selector.

use anyhow::Result;
use chaincontract_abi::ContractDescriptor;

pub fn run(path: &str) -> Result<()> {
    let abi = crate::load_abi(path)?;
    for line in listing(&abi) {
        println!("{line}");
    }
    Ok(())
}

/// One line per entry: constructor first, then functions, events and
/// errors, each sorted by name.
pub fn listing(abi: &ContractDescriptor) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(ctor) = abi.constructor() {
        let types: Vec<_> = ctor.input_types.iter().map(|t| t.sol_type_name()).collect();
        lines.push(format!("{:<66}  constructor({})", "", types.join(",")));
    }
    for f in abi.functions() {
        let shown = if f.output_types.is_empty() { f.signature.clone() } else { f.display_signature() };
        lines.push(format!("{:<66}  function {shown}", f.selector.to_string()));
    }
    for e in abi.events() {
        lines.push(format!("{:<66}  event {}", e.topic.to_string(), e.signature));
    }
    for e in abi.errors() {
        lines.push(format!("{:<66}  error {}", e.selector.to_string(), e.signature));
    }
    lines
}
