//! Contract handles: an address bound to a shared ABI descriptor.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes};
use chaincontract_abi::{parse, selector, AbiSource, ContractDescriptor, DecodedLog, DecodedResult, EncodedCall};
use chaincontract_core::{
    AbiValue, BlockTag, ChainTransport, ContractError, LogFilter, RawLog, Receipt, TxRequest,
};

use crate::dispatcher::Dispatcher;

type Result<T> = std::result::Result<T, ContractError>;

/// A deployed contract: address, ABI and default transaction parameters.
///
/// Building and decoding calls has no side effects; only the `call`,
/// `send` and `logs` helpers touch the transport, which is borrowed per
/// invocation rather than owned.
#[derive(Debug, Clone)]
pub struct Contract {
    address: Address,
    abi: Arc<ContractDescriptor>,
    defaults: TxRequest,
}

impl Contract {
    pub fn new(address: Address, abi: Arc<ContractDescriptor>) -> Self {
        Self { address, abi, defaults: TxRequest::default() }
    }

    /// Parse (or fetch from the cache) `source` and bind it to `address`.
    pub fn from_source(address: Address, source: AbiSource<'_>) -> Result<Self> {
        Ok(Self::new(address, parse(source)?))
    }

    /// The same ABI and defaults at another address.
    pub fn at(&self, address: Address) -> Self {
        Self { address, ..self.clone() }
    }

    /// Layer default transaction parameters; fields set here override
    /// earlier defaults.
    pub fn with_tx(mut self, params: TxRequest) -> Self {
        self.defaults = self.defaults.merge(&params);
        self
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn abi(&self) -> &Arc<ContractDescriptor> {
        &self.abi
    }

    pub fn defaults(&self) -> &TxRequest {
        &self.defaults
    }

    // ─── Encoding ─────────────────────────────────────────────────────────────

    /// Resolve `name` against `args` (overloads ranked by compatibility)
    /// and encode the call.
    pub fn build_call(&self, name: &str, args: &[AbiValue]) -> Result<EncodedCall> {
        self.abi.encode_call(name, args)
    }

    /// Encode against one exact signature, e.g. `transfer(address,uint256)`.
    pub fn build_call_by_signature(&self, signature: &str, args: &[AbiValue]) -> Result<EncodedCall> {
        let entry = self
            .abi
            .functions()
            .find(|f| f.signature == signature)
            .ok_or_else(|| ContractError::UnknownFunction {
                name: signature.to_string(),
                reason: "no function with this signature".into(),
            })?;
        entry.encode(args)
    }

    /// Calldata triggering `receive()`: only valid when the ABI declares one.
    pub fn receive_call(&self) -> Result<Bytes> {
        if !self.abi.has_receive() {
            return Err(ContractError::UnknownFunction {
                name: "receive".into(),
                reason: "ABI declares no receive function".into(),
            });
        }
        Ok(Bytes::copy_from_slice(selector("receive()").as_slice()))
    }

    /// Calldata routed to `fallback()`: only valid when the ABI declares one.
    pub fn fallback_call(&self) -> Result<Bytes> {
        if !self.abi.has_fallback() {
            return Err(ContractError::UnknownFunction {
                name: "fallback".into(),
                reason: "ABI declares no fallback function".into(),
            });
        }
        Ok(Bytes::copy_from_slice(selector("fallback()").as_slice()))
    }

    /// Transaction for `call` with this contract's defaults applied;
    /// `overrides` win over the defaults.
    pub fn tx_request(&self, call: &EncodedCall, overrides: Option<&TxRequest>) -> TxRequest {
        let tx = match overrides {
            Some(o) => self.defaults.merge(o),
            None => self.defaults.clone(),
        };
        TxRequest { to: Some(self.address), data: Some(call.calldata().clone()), ..tx }
    }

    // ─── Decoding ─────────────────────────────────────────────────────────────

    pub fn decode_result(&self, call: &EncodedCall, data: &[u8]) -> Result<DecodedResult> {
        call.decode_result(data)
    }

    /// Decode return data by function name. The name must identify a single
    /// overload (or be a full signature).
    pub fn decode_result_by_name(&self, name: &str, data: &[u8]) -> Result<DecodedResult> {
        let candidates: Vec<_> = if name.contains('(') {
            self.abi.functions().filter(|f| f.signature == name).collect()
        } else {
            self.abi.overloads(name).iter().collect()
        };
        match candidates.as_slice() {
            [] => Err(ContractError::UnknownFunction {
                name: name.to_string(),
                reason: "no function with this name".into(),
            }),
            [entry] => Ok(DecodedResult {
                signature: entry.signature.clone(),
                outputs: entry.decode_output(data)?,
            }),
            many => Err(ContractError::AmbiguousSelector {
                name: name.to_string(),
                candidates: many.iter().map(|f| f.signature.clone()).collect(),
            }),
        }
    }

    pub fn decode_log(&self, log: &RawLog) -> Result<DecodedLog> {
        self.abi.decode_raw_log(log)
    }

    // ─── I/O ──────────────────────────────────────────────────────────────────

    /// Build, simulate and decode a read-only call.
    pub async fn call(
        &self,
        transport: &dyn ChainTransport,
        dispatcher: &Dispatcher,
        name: &str,
        args: &[AbiValue],
    ) -> Result<DecodedResult> {
        let call = self.build_call(name, args)?;
        let tx = self.tx_request(&call, None);
        let data = dispatcher.read_with_abi(transport, &tx, Some(&self.abi)).await?;
        call.decode_result(&data)
    }

    /// Build and submit a state-changing call, waiting for its receipt.
    pub async fn send(
        &self,
        transport: &dyn ChainTransport,
        dispatcher: &Dispatcher,
        name: &str,
        args: &[AbiValue],
        overrides: Option<&TxRequest>,
    ) -> Result<Receipt> {
        let call = self.build_call(name, args)?;
        let tx = self.tx_request(&call, overrides);
        dispatcher.write_with_abi(transport, &tx, Some(&self.abi)).await
    }

    /// Fetch and decode this contract's `event_name` logs in a block range.
    /// Logs of other events or that fail to decode are an error.
    pub async fn logs(
        &self,
        transport: &dyn ChainTransport,
        event_name: &str,
        from_block: BlockTag,
        to_block: BlockTag,
    ) -> Result<Vec<DecodedLog>> {
        let event = self.abi.event(event_name).ok_or_else(|| ContractError::UnknownEvent {
            topic: event_name.to_string(),
        })?;
        let filter = LogFilter::new()
            .address(self.address)
            .event(event.topic)
            .from_block(from_block)
            .to_block(to_block);
        transport
            .get_logs(&filter)
            .await?
            .iter()
            .map(|log| self.decode_log(log))
            .collect()
    }

    /// Decode every log in `receipt` emitted by this contract, skipping
    /// events the ABI does not declare.
    pub fn receipt_logs(&self, receipt: &Receipt) -> Vec<DecodedLog> {
        receipt
            .logs
            .iter()
            .filter(|l| l.address == self.address)
            .filter_map(|l| self.decode_log(l).ok())
            .collect()
    }
}
