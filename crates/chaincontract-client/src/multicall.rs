//! Multicall3 batching.
//!
//! [`aggregate`] sends each sub-call with its own `allowFailure` flag.
//! [`Call3::new`] sets it, so a reverting call leaves the rest of the batch
//! intact and results line up positionally with the input. A failing call
//! built with [`Call3::strict`] makes Multicall3 revert the whole batch,
//! which surfaces as `CallReverted` from the read. `require_success`
//! checks tolerant batches client-side and reports the first failing index
//! as `BatchFailed`.

use alloy_primitives::{Address, Bytes, U256};
use chaincontract_abi::{decode_revert, DecodedResult, EncodedCall};
use chaincontract_core::{AbiValue, ChainTransport, ContractError, TxRequest};
use tracing::{debug, warn};

use crate::builtins::multicall3;
use crate::dispatcher::Dispatcher;

type Result<T> = std::result::Result<T, ContractError>;

// ─── Types ────────────────────────────────────────────────────────────────────

/// One `aggregate3` sub-call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call3 {
    pub target: Address,
    pub allow_failure: bool,
    pub call_data: Bytes,
}

impl Call3 {
    pub fn new(target: Address, call_data: impl Into<Bytes>) -> Self {
        Self { target, allow_failure: true, call_data: call_data.into() }
    }

    /// A sub-call whose failure reverts the whole batch on chain.
    pub fn strict(target: Address, call_data: impl Into<Bytes>) -> Self {
        Self { allow_failure: false, ..Self::new(target, call_data) }
    }

    pub fn from_call(target: Address, call: &EncodedCall) -> Self {
        Self::new(target, call.calldata().clone())
    }

    fn to_value(&self) -> AbiValue {
        AbiValue::tuple([
            AbiValue::Address(self.target),
            AbiValue::Bool(self.allow_failure),
            AbiValue::Bytes(self.call_data.to_vec()),
        ])
    }
}

/// One `aggregate3Value` sub-call, forwarding `value` wei to the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call3Value {
    pub target: Address,
    pub allow_failure: bool,
    pub value: U256,
    pub call_data: Bytes,
}

impl Call3Value {
    pub fn new(target: Address, value: U256, call_data: impl Into<Bytes>) -> Self {
        Self { target, allow_failure: true, value, call_data: call_data.into() }
    }

    fn to_value(&self) -> AbiValue {
        AbiValue::tuple([
            AbiValue::Address(self.target),
            AbiValue::Bool(self.allow_failure),
            AbiValue::Uint(self.value),
            AbiValue::Bytes(self.call_data.to_vec()),
        ])
    }
}

/// Outcome of one sub-call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallResult {
    pub success: bool,
    pub return_data: Bytes,
}

// ─── Encoding ─────────────────────────────────────────────────────────────────

/// `aggregate3(calls)` with each call's own failure flag.
pub fn aggregate3_call(calls: &[Call3]) -> Result<EncodedCall> {
    let values = AbiValue::array(calls.iter().map(Call3::to_value));
    multicall3()?.encode_call("aggregate3", &[values])
}

/// `aggregate3Value(calls)` plus the total value the batch must carry.
pub fn aggregate3_value_call(calls: &[Call3Value]) -> Result<(EncodedCall, U256)> {
    let total = calls.iter().try_fold(U256::ZERO, |acc, c| {
        acc.checked_add(c.value)
            .ok_or_else(|| ContractError::invalid("aggregate3Value total value overflows uint256"))
    })?;
    let values = AbiValue::array(calls.iter().map(Call3Value::to_value));
    Ok((multicall3()?.encode_call("aggregate3Value", &[values])?, total))
}

/// Decode `aggregate3` / `aggregate3Value` return data.
pub fn decode_results(call: &EncodedCall, data: &[u8]) -> Result<Vec<CallResult>> {
    let decoded = call.decode_result(data)?;
    let items = decoded
        .single()
        .and_then(AbiValue::as_array)
        .ok_or_else(|| ContractError::decoding("multicall returned no result array"))?;
    items
        .iter()
        .map(|item| {
            let success = item.field("success").and_then(AbiValue::as_bool);
            let data = item.field("returnData").and_then(AbiValue::as_bytes);
            match (success, data) {
                (Some(success), Some(data)) => {
                    Ok(CallResult { success, return_data: Bytes::copy_from_slice(data) })
                }
                _ => Err(ContractError::decoding(format!("malformed multicall result: {item}"))),
            }
        })
        .collect()
}

// ─── Dispatch ─────────────────────────────────────────────────────────────────

/// Execute `calls` in one `eth_call` through the Multicall3 contract at
/// `multicall`.
pub async fn aggregate(
    dispatcher: &Dispatcher,
    transport: &dyn ChainTransport,
    multicall: Address,
    calls: &[Call3],
    require_success: bool,
) -> Result<Vec<CallResult>> {
    let call = aggregate3_call(calls)?;
    let tx = TxRequest::new().to(multicall).data(call.calldata().clone());

    debug!(%multicall, calls = calls.len(), "aggregate3");
    let data = dispatcher.read(transport, &tx).await?;
    let results = decode_results(&call, &data)?;
    if results.len() != calls.len() {
        return Err(ContractError::decoding(format!(
            "multicall returned {} results for {} calls",
            results.len(),
            calls.len()
        )));
    }

    let failed = results.iter().filter(|r| !r.success).count();
    if failed > 0 {
        warn!(%multicall, failed, total = results.len(), "multicall sub-calls failed");
    }
    if require_success {
        if let Some(index) = results.iter().position(|r| !r.success) {
            let reason = decode_revert(&results[index].return_data, None);
            return Err(ContractError::BatchFailed { index, reason });
        }
    }
    Ok(results)
}

/// Batch already-encoded calls and decode each successful, non-empty
/// return against its own function. Failed or empty sub-calls yield
/// `None`; return data that fails to decode is an error.
pub async fn multicall(
    dispatcher: &Dispatcher,
    transport: &dyn ChainTransport,
    multicall: Address,
    calls: &[(Address, EncodedCall)],
) -> Result<Vec<Option<DecodedResult>>> {
    let batch: Vec<Call3> = calls.iter().map(|(target, call)| Call3::from_call(*target, call)).collect();
    let results = aggregate(dispatcher, transport, multicall, &batch, false).await?;
    calls
        .iter()
        .zip(results)
        .map(|((_, call), result)| {
            if result.success && !result.return_data.is_empty() {
                call.decode_result(&result.return_data).map(Some)
            } else {
                Ok(None)
            }
        })
        .collect()
}
