//! Parsed, immutable contract descriptors.
//!
//! A [`ContractDescriptor`] indexes a `JsonAbi` for the lookups call
//! dispatch needs: functions by name (with overloads) and by selector,
//! events by topic0, custom errors by selector. Every parameter type is
//! resolved to a `DynSolType` up front, so a descriptor that exists can
//! always encode and decode.

use std::collections::HashMap;
use std::sync::Arc;

use alloy_dyn_abi::{DynSolType, DynSolValue, Specifier};
use alloy_json_abi::{Constructor, Error, Event, EventParam, Function, JsonAbi, Param, StateMutability};
use alloy_primitives::{Bytes, Selector, B256};
use chaincontract_core::{AbiValue, ContractError, RawLog, RevertReason};
use indexmap::IndexMap;
use tracing::debug;

use crate::call::EncodedCall;
use crate::coerce::coerce_args;
use crate::hash::{event_topic, selector};
use crate::log::DecodedLog;
use crate::normalizer::{field_name, normalize, normalize_params};

type Result<T> = std::result::Result<T, ContractError>;

fn resolve_params(params: &[Param], context: &str) -> Result<Vec<DynSolType>> {
    params
        .iter()
        .map(|p| {
            p.resolve().map_err(|e| {
                ContractError::malformed(format!("{context}: unsupported type '{}': {e}", p.ty))
            })
        })
        .collect()
}

fn type_list(types: &[DynSolType]) -> String {
    types.iter().map(|t| t.sol_type_name().into_owned()).collect::<Vec<_>>().join(",")
}

/// Decode `data` as the ABI-encoded parameter list `types`.
fn decode_params(types: &[DynSolType], data: &[u8]) -> Result<Vec<DynSolValue>> {
    let decoded = DynSolType::Tuple(types.to_vec())
        .abi_decode_params(data)
        .map_err(|e| ContractError::decoding(e.to_string()))?;
    match decoded {
        DynSolValue::Tuple(values) => Ok(values),
        other => Ok(vec![other]),
    }
}

// ─── Functions ────────────────────────────────────────────────────────────────

/// One callable function with its resolved types.
#[derive(Debug, Clone)]
pub struct FunctionEntry {
    pub function: Function,
    /// Canonical signature, e.g. `transfer(address,uint256)`.
    pub signature: String,
    pub selector: Selector,
    pub input_types: Vec<DynSolType>,
    pub output_types: Vec<DynSolType>,
}

impl FunctionEntry {
    pub fn new(function: Function) -> Result<Self> {
        let context = format!("function {}", function.name);
        let input_types = resolve_params(&function.inputs, &context)?;
        let output_types = resolve_params(&function.outputs, &context)?;
        let signature = format!("{}({})", function.name, type_list(&input_types));
        Ok(Self {
            selector: selector(&signature),
            signature,
            function,
            input_types,
            output_types,
        })
    }

    /// Build an entry from a compact signature such as
    /// `balanceOf(address)(uint256)`.
    pub fn from_compact(signature: &str) -> Result<Self> {
        let function = Function::parse(signature)
            .map_err(|e| ContractError::malformed(format!("invalid signature '{signature}': {e}")))?;
        Self::new(function)
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }

    /// `name(inputs)(outputs)`, the compact form used in listings.
    pub fn display_signature(&self) -> String {
        format!("{}({})", self.signature, type_list(&self.output_types))
    }

    /// Whether the function can only be simulated (`view` / `pure`).
    pub fn is_read_only(&self) -> bool {
        matches!(self.function.state_mutability, StateMutability::View | StateMutability::Pure)
    }

    pub fn is_payable(&self) -> bool {
        self.function.state_mutability == StateMutability::Payable
    }

    /// Encode `selector ++ args` for this exact overload.
    pub fn encode(self: &Arc<Self>, args: &[AbiValue]) -> Result<EncodedCall> {
        let coerced = coerce_args(args, &self.input_types).map_err(|reason| {
            ContractError::invalid(format!("{}: {reason}", self.signature))
        })?;
        Ok(self.encode_coerced(coerced.value))
    }

    fn encode_coerced(self: &Arc<Self>, args: DynSolValue) -> EncodedCall {
        let mut calldata = self.selector.to_vec();
        calldata.extend_from_slice(&args.abi_encode_params());
        EncodedCall::new(Arc::clone(self), Bytes::from(calldata))
    }

    /// Decode calldata (selector included) back into named arguments.
    pub fn decode_input(&self, calldata: &[u8]) -> Result<Vec<(String, AbiValue)>> {
        let body = calldata
            .strip_prefix(self.selector.as_slice())
            .ok_or_else(|| ContractError::decoding(format!("calldata is not a call to {}", self.signature)))?;
        Ok(normalize_params(decode_params(&self.input_types, body)?, &self.function.inputs))
    }

    /// Decode return data into named outputs.
    pub fn decode_output(&self, data: &[u8]) -> Result<Vec<(String, AbiValue)>> {
        if self.output_types.is_empty() {
            return Ok(Vec::new());
        }
        if data.is_empty() {
            return Err(ContractError::decoding(format!(
                "{} returned no data, expected ({})",
                self.signature,
                type_list(&self.output_types)
            )));
        }
        Ok(normalize_params(decode_params(&self.output_types, data)?, &self.function.outputs))
    }
}

// ─── Events ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct EventEntry {
    pub event: Event,
    pub signature: String,
    pub topic: B256,
    types: Vec<DynSolType>,
}

impl EventEntry {
    pub fn new(event: Event) -> Result<Self> {
        let context = format!("event {}", event.name);
        let types = event
            .inputs
            .iter()
            .map(|p| {
                p.resolve().map_err(|e| {
                    ContractError::malformed(format!("{context}: unsupported type '{}': {e}", p.ty))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let signature = format!("{}({})", event.name, type_list(&types));
        Ok(Self { topic: event_topic(&signature), signature, event, types })
    }

    pub fn name(&self) -> &str {
        &self.event.name
    }

    fn expected_topics(&self) -> usize {
        let indexed = self.event.inputs.iter().filter(|p| p.indexed).count();
        if self.event.anonymous {
            indexed
        } else {
            indexed + 1
        }
    }

    /// Decode a log emitted by this event.
    ///
    /// Indexed parameters of reference type (`string`, `bytes`, arrays,
    /// tuples) are stored as their keccak hash and come back as a 32-byte
    /// `FixedBytes` value.
    pub fn decode(&self, topics: &[B256], data: &[u8]) -> Result<DecodedLog> {
        if topics.len() != self.expected_topics() {
            return Err(ContractError::decoding(format!(
                "{}: expected {} topics, got {}",
                self.signature,
                self.expected_topics(),
                topics.len()
            )));
        }
        let mut indexed_topics = topics.iter().skip(usize::from(!self.event.anonymous));

        let data_types: Vec<DynSolType> = self
            .event
            .inputs
            .iter()
            .zip(&self.types)
            .filter(|(p, _)| !p.indexed)
            .map(|(_, t)| t.clone())
            .collect();
        let mut data_values = decode_params(&data_types, data)?.into_iter();

        let mut args = Vec::with_capacity(self.types.len());
        for (i, (param, ty)) in self.event.inputs.iter().zip(&self.types).enumerate() {
            let value = if param.indexed {
                let topic = indexed_topics
                    .next()
                    .ok_or_else(|| ContractError::decoding("missing indexed topic"))?;
                decode_topic(param, ty, topic)?
            } else {
                let v = data_values
                    .next()
                    .ok_or_else(|| ContractError::decoding("log data shorter than event"))?;
                normalize(v, &param.components)
            };
            args.push((field_name(&param.name, i), value));
        }

        Ok(DecodedLog {
            name: self.event.name.clone(),
            signature: self.signature.clone(),
            topic: self.topic,
            args,
        })
    }
}

fn decode_topic(param: &EventParam, ty: &DynSolType, topic: &B256) -> Result<AbiValue> {
    match ty {
        DynSolType::String
        | DynSolType::Bytes
        | DynSolType::Array(_)
        | DynSolType::FixedArray(..)
        | DynSolType::Tuple(_) => Ok(AbiValue::FixedBytes(topic.to_vec())),
        _ => {
            let v = ty.abi_decode(topic.as_slice()).map_err(|e| {
                ContractError::decoding(format!("indexed '{}': {e}", param.name))
            })?;
            Ok(normalize(v, &param.components))
        }
    }
}

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ErrorEntry {
    pub error: Error,
    pub signature: String,
    pub selector: Selector,
    pub input_types: Vec<DynSolType>,
}

impl ErrorEntry {
    pub fn new(error: Error) -> Result<Self> {
        let input_types = resolve_params(&error.inputs, &format!("error {}", error.name))?;
        let signature = format!("{}({})", error.name, type_list(&input_types));
        Ok(Self { selector: selector(&signature), signature, error, input_types })
    }

    /// Decode a revert payload (selector included) as this error.
    pub fn decode(&self, data: &[u8]) -> Result<RevertReason> {
        let body = data
            .strip_prefix(self.selector.as_slice())
            .ok_or_else(|| ContractError::decoding(format!("payload is not {}", self.signature)))?;
        Ok(RevertReason::Custom {
            name: self.error.name.clone(),
            signature: self.signature.clone(),
            inputs: normalize_params(decode_params(&self.input_types, body)?, &self.error.inputs),
        })
    }
}

// ─── Constructor ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ConstructorEntry {
    pub constructor: Constructor,
    pub input_types: Vec<DynSolType>,
}

impl ConstructorEntry {
    pub fn new(constructor: Constructor) -> Result<Self> {
        let input_types = resolve_params(&constructor.inputs, "constructor")?;
        Ok(Self { constructor, input_types })
    }

    /// ABI-encode constructor arguments (no selector).
    pub fn encode_args(&self, args: &[AbiValue]) -> Result<Vec<u8>> {
        let coerced = coerce_args(args, &self.input_types)
            .map_err(|reason| ContractError::invalid(format!("constructor: {reason}")))?;
        Ok(coerced.value.abi_encode_params())
    }
}

// ─── Descriptor ───────────────────────────────────────────────────────────────

/// Indexed, immutable view of a contract ABI.
#[derive(Debug, Clone)]
pub struct ContractDescriptor {
    abi: JsonAbi,
    functions: IndexMap<String, Vec<Arc<FunctionEntry>>>,
    by_selector: HashMap<Selector, Arc<FunctionEntry>>,
    events: IndexMap<B256, Arc<EventEntry>>,
    anonymous_events: Vec<Arc<EventEntry>>,
    errors: IndexMap<Selector, Arc<ErrorEntry>>,
    constructor: Option<ConstructorEntry>,
}

impl ContractDescriptor {
    pub fn from_json_abi(abi: JsonAbi) -> Result<Self> {
        let mut functions: IndexMap<String, Vec<Arc<FunctionEntry>>> = IndexMap::new();
        let mut by_selector: HashMap<Selector, Arc<FunctionEntry>> = HashMap::new();
        for function in abi.functions() {
            let entry = Arc::new(FunctionEntry::new(function.clone())?);
            if let Some(existing) = by_selector.get(&entry.selector) {
                if existing.signature == entry.signature {
                    continue;
                }
                return Err(ContractError::malformed(format!(
                    "selector collision 0x{}: {} and {}",
                    hex::encode(entry.selector),
                    existing.signature,
                    entry.signature
                )));
            }
            by_selector.insert(entry.selector, Arc::clone(&entry));
            functions.entry(entry.function.name.clone()).or_default().push(entry);
        }

        let mut events = IndexMap::new();
        let mut anonymous_events = Vec::new();
        for event in abi.events() {
            let entry = Arc::new(EventEntry::new(event.clone())?);
            if entry.event.anonymous {
                anonymous_events.push(entry);
            } else {
                events.entry(entry.topic).or_insert(entry);
            }
        }

        let mut errors: IndexMap<Selector, Arc<ErrorEntry>> = IndexMap::new();
        for error in abi.errors() {
            let entry = Arc::new(ErrorEntry::new(error.clone())?);
            if let Some(existing) = errors.get(&entry.selector) {
                if existing.signature != entry.signature {
                    return Err(ContractError::malformed(format!(
                        "error selector collision 0x{}: {} and {}",
                        hex::encode(entry.selector),
                        existing.signature,
                        entry.signature
                    )));
                }
                continue;
            }
            errors.insert(entry.selector, entry);
        }

        let constructor = abi.constructor.clone().map(ConstructorEntry::new).transpose()?;

        debug!(
            functions = by_selector.len(),
            events = events.len(),
            errors = errors.len(),
            "contract descriptor built"
        );

        Ok(Self { abi, functions, by_selector, events, anonymous_events, errors, constructor })
    }

    /// Parse a JSON ABI: either the bare array or a compiler artifact
    /// object carrying it under `"abi"`.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| ContractError::malformed(format!("invalid ABI JSON: {e}")))?;
        let abi_value = match value {
            serde_json::Value::Array(_) => value,
            serde_json::Value::Object(mut obj) => obj
                .remove("abi")
                .ok_or_else(|| ContractError::malformed("JSON object has no \"abi\" field"))?,
            _ => return Err(ContractError::malformed("ABI JSON must be an array or an object")),
        };
        let abi: JsonAbi = serde_json::from_value(abi_value)
            .map_err(|e| ContractError::malformed(format!("invalid ABI JSON: {e}")))?;
        Self::from_json_abi(abi)
    }

    /// Parse human-readable declarations.
    pub fn from_human_readable<S: AsRef<str>>(signatures: &[S]) -> Result<Self> {
        Self::from_json_abi(crate::human::parse_human_readable(signatures)?)
    }

    pub fn abi(&self) -> &JsonAbi {
        &self.abi
    }

    // ── functions ──

    /// All functions, sorted by name; overloads of one name keep their
    /// declaration order.
    pub fn functions(&self) -> impl Iterator<Item = &Arc<FunctionEntry>> {
        self.functions.values().flatten()
    }

    /// Overloads declared under `name`.
    pub fn overloads(&self, name: &str) -> &[Arc<FunctionEntry>] {
        self.functions.get(name).map_or(&[], Vec::as_slice)
    }

    pub fn function_by_selector(&self, selector: &[u8]) -> Option<&Arc<FunctionEntry>> {
        let selector: [u8; 4] = selector.get(..4)?.try_into().ok()?;
        self.by_selector.get(&Selector::from(selector))
    }

    /// Pick the overload of `name` that best fits `args` and encode it.
    ///
    /// `name` may also be a full signature (`transfer(address,uint256)`)
    /// to select one overload explicitly.
    pub fn encode_call(&self, name: &str, args: &[AbiValue]) -> Result<EncodedCall> {
        if name.contains('(') {
            let entry = self
                .functions()
                .find(|f| f.signature == name || f.display_signature() == name)
                .ok_or_else(|| ContractError::UnknownFunction {
                    name: name.to_string(),
                    reason: "no function with this signature".into(),
                })?;
            return entry.encode(args);
        }

        let overloads = self.overloads(name);
        if overloads.is_empty() {
            return Err(ContractError::UnknownFunction {
                name: name.to_string(),
                reason: "no function with this name".into(),
            });
        }

        let mut best: Vec<(&Arc<FunctionEntry>, DynSolValue)> = Vec::new();
        let mut best_score = 0;
        let mut rejections = Vec::new();
        for entry in overloads {
            match coerce_args(args, &entry.input_types) {
                Ok(c) if c.score > best_score || best.is_empty() => {
                    best_score = c.score;
                    best = vec![(entry, c.value)];
                }
                Ok(c) if c.score == best_score => best.push((entry, c.value)),
                Ok(_) => {}
                Err(reason) => rejections.push(format!("{}: {reason}", entry.signature)),
            }
        }

        match best.len() {
            0 => Err(ContractError::UnknownFunction {
                name: name.to_string(),
                reason: format!("no overload accepts the arguments ({})", rejections.join("; ")),
            }),
            1 => {
                let (entry, value) = best.remove(0);
                Ok(entry.encode_coerced(value))
            }
            _ => Err(ContractError::AmbiguousSelector {
                name: name.to_string(),
                candidates: best.iter().map(|(e, _)| e.signature.clone()).collect(),
            }),
        }
    }

    /// Identify and decode calldata by its selector.
    pub fn decode_calldata(&self, calldata: &[u8]) -> Result<(Arc<FunctionEntry>, Vec<(String, AbiValue)>)> {
        let entry = self.function_by_selector(calldata).ok_or_else(|| ContractError::UnknownFunction {
            name: format!("0x{}", hex::encode(calldata.get(..4).unwrap_or(calldata))),
            reason: "no function with this selector".into(),
        })?;
        Ok((Arc::clone(entry), entry.decode_input(calldata)?))
    }

    /// `(display signature, selector)` of every function.
    pub fn selectors(&self) -> Vec<(String, Selector)> {
        self.functions().map(|f| (f.display_signature(), f.selector)).collect()
    }

    // ── events ──

    pub fn events(&self) -> impl Iterator<Item = &Arc<EventEntry>> {
        self.events.values().chain(self.anonymous_events.iter())
    }

    pub fn event(&self, name: &str) -> Option<&Arc<EventEntry>> {
        self.events().find(|e| e.event.name == name || e.signature == name)
    }

    pub fn event_by_topic(&self, topic: &B256) -> Option<&Arc<EventEntry>> {
        self.events.get(topic)
    }

    /// Decode a log by its topic0.
    pub fn decode_log(&self, topics: &[B256], data: &[u8]) -> Result<DecodedLog> {
        let topic0 = topics.first();
        let entry = topic0
            .and_then(|t| self.events.get(t))
            .ok_or_else(|| ContractError::unknown_event(topic0))?;
        entry.decode(topics, data)
    }

    pub fn decode_raw_log(&self, log: &RawLog) -> Result<DecodedLog> {
        self.decode_log(&log.topics, &log.data)
    }

    // ── errors ──

    pub fn errors(&self) -> impl Iterator<Item = &Arc<ErrorEntry>> {
        self.errors.values()
    }

    pub fn error_by_selector(&self, selector: &[u8]) -> Option<&Arc<ErrorEntry>> {
        let selector: [u8; 4] = selector.get(..4)?.try_into().ok()?;
        self.errors.get(&Selector::from(selector))
    }

    /// Decode a revert payload against this ABI's errors.
    pub fn decode_revert(&self, data: &[u8]) -> RevertReason {
        crate::revert::decode_revert(data, Some(self))
    }

    // ── constructor / special functions ──

    pub fn constructor(&self) -> Option<&ConstructorEntry> {
        self.constructor.as_ref()
    }

    /// ABI-encoded constructor arguments. Without a declared constructor
    /// only an empty argument list is accepted.
    pub fn encode_constructor(&self, args: &[AbiValue]) -> Result<Vec<u8>> {
        match &self.constructor {
            Some(ctor) => ctor.encode_args(args),
            None if args.is_empty() => Ok(Vec::new()),
            None => Err(ContractError::invalid(format!(
                "contract has no constructor but {} arguments were given",
                args.len()
            ))),
        }
    }

    /// `init_code ++ abi.encode(args)`.
    pub fn encode_deploy(&self, bytecode: &[u8], args: &[AbiValue]) -> Result<Bytes> {
        let mut init_code = bytecode.to_vec();
        init_code.extend_from_slice(&self.encode_constructor(args)?);
        Ok(Bytes::from(init_code))
    }

    pub fn has_receive(&self) -> bool {
        self.abi.receive.is_some()
    }

    pub fn has_fallback(&self) -> bool {
        self.abi.fallback.is_some()
    }

    pub fn is_payable_fallback(&self) -> bool {
        self.abi
            .fallback
            .as_ref()
            .is_some_and(|f| f.state_mutability == StateMutability::Payable)
    }
}
