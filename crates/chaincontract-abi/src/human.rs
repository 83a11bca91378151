//! Human-readable ABI parser.
//!
//! Converts Solidity-style declarations into an `alloy_json_abi::JsonAbi`:
//!
//! ```text
//! struct Order { address maker; uint256 amount; }
//! function fill(Order order, bytes calldata sig) external payable returns (bool)
//! event Filled(address indexed maker, uint256 amount)
//! error Expired(uint256 deadline)
//! constructor(address owner)
//! fallback() external payable
//! receive() external payable
//! balanceOf(address)(uint256)
//! ```
//!
//! Function, event, error and constructor lines are parsed by alloy's
//! signature parser; lines without a keyword are functions. Struct names in
//! the parsed parameters are then replaced by their tuple components. Struct
//! definitions only feed that substitution and never appear in the output.

use std::collections::{HashMap, HashSet};

use alloy_json_abi::parser::{is_valid_identifier, Parameters, RootType};
use alloy_json_abi::{
    Constructor, Error, Event, EventParam, Fallback, Function, JsonAbi, Param, Receive,
    StateMutability,
};
use chaincontract_core::ContractError;

type Result<T> = std::result::Result<T, ContractError>;

/// Resolved struct name → tuple components.
type StructLookup = HashMap<String, Vec<Param>>;

/// Where a parameter list appears; decides which modifiers are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Function,
    Event,
    Error,
    Constructor,
}

impl Context {
    fn label(self) -> &'static str {
        match self {
            Context::Function => "function",
            Context::Event => "event",
            Context::Error => "error",
            Context::Constructor => "constructor",
        }
    }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

/// Parse a complete human-readable interface.
pub fn parse_human_readable<S: AsRef<str>>(signatures: &[S]) -> Result<JsonAbi> {
    let lines: Vec<String> = signatures
        .iter()
        .map(|s| strip_address_payable(normalize_line(s.as_ref())))
        .filter(|s| !s.is_empty())
        .collect();
    if lines.is_empty() {
        return Err(ContractError::malformed("at least one signature required"));
    }

    let structs = parse_structs(&lines)?;

    let mut abi = JsonAbi::new();
    for line in lines.iter().filter(|l| !is_struct_signature(l)) {
        add_signature(&mut abi, line, &structs)?;
    }
    Ok(abi)
}

fn normalize_line(line: &str) -> &str {
    line.trim().trim_end_matches(';').trim_end()
}

fn add_signature(abi: &mut JsonAbi, signature: &str, structs: &StructLookup) -> Result<()> {
    match leading_keyword(signature) {
        Some("event") => {
            check_modifiers(signature, Context::Event)?;
            let mut e = Event::parse(signature).map_err(|e| invalid("event", signature, e))?;
            e.inputs = resolve_event_params(e.inputs, structs)?;
            abi.events.entry(e.name.clone()).or_default().push(e);
        }
        Some("error") => {
            check_modifiers(signature, Context::Error)?;
            let mut e = Error::parse(signature).map_err(|e| invalid("error", signature, e))?;
            e.inputs = resolve_params(&e.inputs, structs)?;
            abi.errors.entry(e.name.clone()).or_default().push(e);
        }
        Some("constructor") => {
            if abi.constructor.is_some() {
                return Err(ContractError::malformed("more than one constructor declared"));
            }
            check_modifiers(signature, Context::Constructor)?;
            let mut c =
                Constructor::parse(signature).map_err(|e| invalid("constructor", signature, e))?;
            c.inputs = resolve_params(&c.inputs, structs)?;
            abi.constructor = Some(c);
        }
        Some("fallback") => abi.fallback = Some(parse_fallback_signature(signature)?),
        Some("receive") => abi.receive = Some(parse_receive_signature(signature)?),
        _ => {
            check_modifiers(signature, Context::Function)?;
            let mut f =
                Function::parse(signature).map_err(|e| invalid("function", signature, e))?;
            f.inputs = resolve_params(&f.inputs, structs)?;
            f.outputs = resolve_params(&f.outputs, structs)?;
            abi.functions.entry(f.name.clone()).or_default().push(f);
        }
    }
    Ok(())
}

fn invalid(kind: &str, signature: &str, err: impl std::fmt::Display) -> ContractError {
    ContractError::malformed(format!("invalid {kind} signature '{signature}': {err}"))
}

/// The declaration keyword, if the line starts with one followed by a
/// separator (`function f()`, `constructor(`, `receive()`).
fn leading_keyword(signature: &str) -> Option<&'static str> {
    const KEYWORDS: &[&str] = &[
        "function",
        "event",
        "error",
        "constructor",
        "fallback",
        "receive",
        "struct",
    ];
    KEYWORDS.iter().copied().find(|kw| {
        signature
            .strip_prefix(kw)
            .and_then(|rest| rest.chars().next())
            .is_some_and(|c| c.is_whitespace() || c == '(' || c == '{')
    })
}

fn is_struct_signature(signature: &str) -> bool {
    leading_keyword(signature) == Some("struct")
}

/// `address payable to` → `address to`.
fn strip_address_payable(line: &str) -> String {
    const PATTERN: &str = "address payable";
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(at) = rest.find(PATTERN) {
        let after = &rest[at + PATTERN.len()..];
        let ends_word = !after.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '$');
        out.push_str(&rest[..at]);
        out.push_str(if ends_word { "address" } else { PATTERN });
        rest = after;
    }
    out.push_str(rest);
    out
}

// ─── Modifiers ────────────────────────────────────────────────────────────────

/// Reject `indexed` outside events and data locations inside events.
///
/// Alloy accepts either modifier anywhere and drops what it does not model,
/// so every top-level parameter group is re-read as a parameter list.
fn check_modifiers(signature: &str, ctx: Context) -> Result<()> {
    for group in top_level_groups(signature)? {
        let params = Parameters::parse(group).map_err(|e| invalid(ctx.label(), signature, e))?;
        for param in &params.params {
            let modifier = match (ctx, param.storage, param.indexed) {
                (Context::Event, Some(storage), _) => Some(storage.as_str()),
                (Context::Event, None, _) => None,
                (_, _, true) => Some("indexed"),
                _ => None,
            };
            if let Some(m) = modifier {
                return Err(ContractError::malformed(format!(
                    "invalid modifier '{m}' for type {}",
                    ctx.label()
                )));
            }
        }
    }
    Ok(())
}

/// Parenthesised groups at nesting depth zero: inputs, then outputs.
fn top_level_groups(signature: &str) -> Result<Vec<&str>> {
    let unbalanced = || ContractError::malformed(format!("invalid parenthesis in '{signature}'"));
    let mut groups = Vec::new();
    let mut rest_from = 0;
    while let Some(offset) = signature[rest_from..].find('(') {
        let open = rest_from + offset;
        let close = matching_paren(signature, open).ok_or_else(unbalanced)?;
        groups.push(&signature[open..=close]);
        rest_from = close + 1;
    }
    if signature[rest_from..].contains(')') {
        return Err(unbalanced());
    }
    Ok(groups)
}

// ─── Structs ──────────────────────────────────────────────────────────────────

fn parse_structs(lines: &[String]) -> Result<StructLookup> {
    // First pass: shallow components, struct references left unresolved.
    let mut shallow: HashMap<String, Vec<Param>> = HashMap::new();
    for line in lines.iter().filter(|l| is_struct_signature(l)) {
        let (name, body) = split_struct(line)?;
        let components = body
            .split(';')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|member| parse_struct_member(member, line))
            .collect::<Result<Vec<_>>>()?;
        if components.is_empty() {
            return Err(ContractError::malformed(format!(
                "invalid struct signature (no properties): {line}"
            )));
        }
        if shallow.insert(name.to_string(), components).is_some() {
            return Err(ContractError::malformed(format!("duplicate struct '{name}'")));
        }
    }

    // Second pass: resolve nested struct references.
    let mut resolved = StructLookup::new();
    for (name, params) in &shallow {
        let mut ancestors = HashSet::new();
        ancestors.insert(name.clone());
        resolved.insert(name.clone(), resolve_components(params, &shallow, &ancestors)?);
    }
    Ok(resolved)
}

fn split_struct(signature: &str) -> Result<(&str, &str)> {
    let invalid = || ContractError::malformed(format!("invalid struct signature: {signature}"));
    let rest = signature.strip_prefix("struct").ok_or_else(invalid)?.trim_start();
    let open = rest.find('{').ok_or_else(invalid)?;
    let name = rest[..open].trim();
    if !is_valid_identifier(name) {
        return Err(invalid());
    }
    let body = rest[open + 1..].trim_end().strip_suffix('}').ok_or_else(invalid)?;
    Ok((name, body))
}

fn parse_struct_member(member: &str, line: &str) -> Result<Param> {
    let list = format!("({member})");
    let params = Parameters::parse(&list).map_err(|e| invalid("struct", line, e))?;
    match params.params.as_slice() {
        [p] if p.storage.is_none() && !p.indexed => {}
        [p] => {
            let m = p.storage.map_or("indexed", |s| s.as_str());
            return Err(ContractError::malformed(format!("invalid modifier '{m}' for type struct")));
        }
        _ => return Err(ContractError::malformed(format!("invalid struct member '{member}' in {line}"))),
    }
    Param::parse(member).map_err(|e| invalid("struct", line, e))
}

// ─── Type resolution ──────────────────────────────────────────────────────────

fn resolve_params(params: &[Param], structs: &StructLookup) -> Result<Vec<Param>> {
    resolve_components(params, structs, &HashSet::new())
}

fn resolve_event_params(params: Vec<EventParam>, structs: &StructLookup) -> Result<Vec<EventParam>> {
    params
        .into_iter()
        .map(|p| {
            let param = Param { ty: p.ty, name: p.name, components: p.components, internal_type: None };
            let mut resolved = resolve_params(std::slice::from_ref(&param), structs)?;
            let param = resolved.remove(0);
            Ok(EventParam {
                ty: param.ty,
                name: param.name,
                indexed: p.indexed,
                components: param.components,
                internal_type: None,
            })
        })
        .collect()
}

/// Replace struct references by tuples and check every other base type is
/// a Solidity elementary type.
fn resolve_components(
    params: &[Param],
    structs: &HashMap<String, Vec<Param>>,
    ancestors: &HashSet<String>,
) -> Result<Vec<Param>> {
    let mut out = Vec::with_capacity(params.len());
    for param in params {
        if param.ty.starts_with("tuple") {
            let mut p = param.clone();
            p.components = resolve_components(&param.components, structs, ancestors)?;
            out.push(p);
            continue;
        }

        let (base, suffix) = param.ty.split_at(param.ty.find('[').unwrap_or(param.ty.len()));
        if let Some(members) = structs.get(base) {
            if ancestors.contains(base) {
                return Err(ContractError::malformed(format!(
                    "circular reference detected: {base}"
                )));
            }
            let mut nested = ancestors.clone();
            nested.insert(base.to_string());
            out.push(Param {
                ty: format!("tuple{suffix}"),
                name: param.name.clone(),
                components: resolve_components(members, structs, &nested)?,
                internal_type: None,
            });
        } else if is_solidity_type(base) {
            out.push(param.clone());
        } else {
            return Err(ContractError::malformed(format!("unknown type: {base}")));
        }
    }
    Ok(out)
}

/// Whether `ty` names a Solidity elementary type.
fn is_solidity_type(ty: &str) -> bool {
    RootType::parse(ty).is_ok_and(|root| root.try_basic_solidity().is_ok())
}

// ─── Fallback and receive ─────────────────────────────────────────────────────

/// Split `keyword head(params) rest` into its parts.
fn split_declaration<'a>(signature: &'a str, keyword: &str) -> Result<(&'a str, &'a str, &'a str)> {
    let invalid = || ContractError::malformed(format!("invalid {keyword} signature: {signature}"));
    let rest = signature.strip_prefix(keyword).ok_or_else(invalid)?;
    let open = rest.find('(').ok_or_else(invalid)?;
    let close = matching_paren(rest, open).ok_or_else(invalid)?;
    Ok((rest[..open].trim(), &rest[open + 1..close], rest[close + 1..].trim()))
}

fn parse_fallback_signature(signature: &str) -> Result<Fallback> {
    let (head, params, rest) = split_declaration(signature, "fallback")?;
    let state_mutability = match rest.split_whitespace().collect::<Vec<_>>().as_slice() {
        ["external"] => StateMutability::NonPayable,
        ["external", "payable"] => StateMutability::Payable,
        _ => {
            return Err(ContractError::malformed(format!(
                "invalid fallback signature: {signature}"
            )))
        }
    };
    if !head.is_empty() || !params.trim().is_empty() {
        return Err(ContractError::malformed(format!("invalid fallback signature: {signature}")));
    }
    Ok(Fallback { state_mutability })
}

fn parse_receive_signature(signature: &str) -> Result<Receive> {
    let (head, params, rest) = split_declaration(signature, "receive")?;
    let words: Vec<_> = rest.split_whitespace().collect();
    if !head.is_empty() || !params.trim().is_empty() || words != ["external", "payable"] {
        return Err(ContractError::malformed(format!("invalid receive signature: {signature}")));
    }
    Ok(Receive { state_mutability: StateMutability::Payable })
}

/// Index of the `)` matching the `(` at byte offset `open`.
fn matching_paren(s: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, ch) in s.char_indices().skip_while(|(i, _)| *i < open) {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_function(sig: &str) -> Function {
        let abi = parse_human_readable(&[sig]).unwrap();
        abi.functions().next().unwrap().clone()
    }

    #[test]
    fn simple_function() {
        let f = single_function("function transfer(address to, uint256 amount) external returns (bool)");
        assert_eq!(f.name, "transfer");
        assert_eq!(f.inputs.len(), 2);
        assert_eq!(f.inputs[0].name, "to");
        assert_eq!(f.outputs[0].ty, "bool");
        assert_eq!(f.state_mutability, StateMutability::NonPayable);
        assert_eq!(f.signature(), "transfer(address,uint256)");
    }

    #[test]
    fn view_function_with_dynamic_int() {
        let f = single_function("function balanceOf(address owner) view returns (uint)");
        assert_eq!(f.state_mutability, StateMutability::View);
        assert_eq!(f.outputs[0].ty, "uint256");
    }

    #[test]
    fn address_payable_and_data_location() {
        let f = single_function("function send(address payable to, bytes calldata data) payable");
        assert_eq!(f.inputs[0].ty, "address");
        assert_eq!(f.inputs[1].ty, "bytes");
        assert_eq!(f.inputs[1].name, "data");
        assert_eq!(f.state_mutability, StateMutability::Payable);
    }

    #[test]
    fn inline_tuple_array() {
        let f = single_function("function foo((uint256,address)[] pairs, string memo)");
        assert_eq!(f.inputs[0].ty, "tuple[]");
        assert_eq!(f.inputs[0].components.len(), 2);
        assert_eq!(f.signature(), "foo((uint256,address)[],string)");
    }

    #[test]
    fn structs_resolve_nested() {
        let abi = parse_human_readable(&[
            "struct Inner { uint256 a; bool b; }",
            "struct Outer { Inner inner; Inner[] list; address owner; }",
            "function take(Outer o) returns (Inner)",
        ])
        .unwrap();
        let f = abi.functions().next().unwrap();
        assert_eq!(f.signature(), "take(((uint256,bool),(uint256,bool)[],address))");
        assert_eq!(f.outputs[0].ty, "tuple");
        assert_eq!(f.outputs[0].components[1].name, "b");
    }

    #[test]
    fn circular_struct_rejected() {
        let err = parse_human_readable(&[
            "struct A { B b; }",
            "struct B { A a; }",
            "function f(A a)",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("circular reference"), "{err}");
    }

    #[test]
    fn event_indexed_params() {
        let abi = parse_human_readable(&[
            "event Transfer(address indexed from, address indexed to, uint256 amount)",
        ])
        .unwrap();
        let e = abi.events().next().unwrap();
        assert!(e.inputs[0].indexed && e.inputs[1].indexed && !e.inputs[2].indexed);
        assert_eq!(e.signature(), "Transfer(address,address,uint256)");
    }

    #[test]
    fn indexed_outside_event_rejected() {
        let err = parse_human_readable(&["function f(address indexed a)"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "malformed ABI: invalid modifier 'indexed' for type function"
        );
    }

    #[test]
    fn error_constructor_fallback_receive() {
        let abi = parse_human_readable(&[
            "error Unauthorized(address caller)",
            "constructor(address owner) payable",
            "fallback() external",
            "receive() external payable",
        ])
        .unwrap();
        assert_eq!(abi.errors().next().unwrap().signature(), "Unauthorized(address)");
        let ctor = abi.constructor.as_ref().unwrap();
        assert_eq!(ctor.state_mutability, StateMutability::Payable);
        assert_eq!(abi.fallback.unwrap().state_mutability, StateMutability::NonPayable);
        assert!(abi.receive.is_some());
    }

    #[test]
    fn unknown_type_rejected() {
        let err = parse_human_readable(&["function f(uint7 x)"]).unwrap_err();
        assert!(err.to_string().contains("unknown type: uint7"));
    }

    #[test]
    fn empty_source_rejected() {
        let empty: [&str; 0] = [];
        assert!(parse_human_readable(&empty).is_err());
    }

    #[test]
    fn unbalanced_parenthesis() {
        assert!(parse_human_readable(&["function f((uint256,address) x"]).is_err());
        assert!(parse_human_readable(&["function f(uint256 x))"]).is_err());
    }

    #[test]
    fn compact_lines_mix_in() {
        let abi = parse_human_readable(&[
            "function transfer(address,uint256) returns (bool)",
            "balanceOf(address)(uint256)",
        ])
        .unwrap();
        assert_eq!(abi.functions().count(), 2);
        let f = &abi.functions["balanceOf"][0];
        assert_eq!(f.outputs[0].ty, "uint256");
        assert_eq!(hex::encode(f.selector()), "70a08231");
    }

    #[test]
    fn data_location_in_event_rejected() {
        let err = parse_human_readable(&["event Stored(bytes memory blob)"]).unwrap_err();
        assert_eq!(err.to_string(), "malformed ABI: invalid modifier 'memory' for type event");
    }

    #[test]
    fn struct_names_inside_events_and_errors() {
        let abi = parse_human_readable(&[
            "struct Order { address maker; uint256 amount; }",
            "event Filled(Order indexed order)",
            "error Rejected(Order[2] orders)",
        ])
        .unwrap();
        let e = abi.events().next().unwrap();
        assert!(e.inputs[0].indexed);
        assert_eq!(e.signature(), "Filled((address,uint256))");
        assert_eq!(abi.errors().next().unwrap().signature(), "Rejected((address,uint256)[2])");
    }

    #[test]
    fn address_payable_only_as_a_word() {
        assert_eq!(strip_address_payable("f(address payable to)"), "f(address to)");
        assert_eq!(strip_address_payable("f(address payableTo)"), "f(address payableTo)");
    }

    #[test]
    fn solidity_type_table() {
        for ty in ["uint8", "int256", "bytes1", "bytes32", "address", "function", "uint"] {
            assert!(is_solidity_type(ty), "{ty}");
        }
        for ty in ["uint7", "uint264", "bytes0", "bytes33", "Foo"] {
            assert!(!is_solidity_type(ty), "{ty}");
        }
    }
}
