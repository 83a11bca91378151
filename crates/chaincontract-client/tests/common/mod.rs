//! In-memory `ChainTransport` for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use chaincontract_client::recover_signer;
use chaincontract_core::{
    BlockTag, ChainTransport, JsonRpcError, LogFilter, RawLog, Receipt, TransportError, TxRequest,
};
use serde_json::json;

pub const ESTIMATED_GAS: u64 = 60_000;
pub const GAS_PRICE: u128 = 2_000_000_000;

/// Mutable chain state visible to the send handlers.
#[derive(Debug, Default)]
pub struct ChainState {
    pub code: HashMap<Address, Bytes>,
    pub balances: HashMap<Address, U256>,
    pub sent: Vec<TxRequest>,
    pub raw_sent: Vec<Vec<u8>>,
    pub receipts: HashMap<B256, Receipt>,
    pub receipt_polls: usize,
}

type CallHandler = Box<dyn Fn(&TxRequest, BlockTag) -> Result<Bytes, TransportError> + Send + Sync>;
type SendHandler = Box<dyn Fn(&TxRequest, &mut ChainState) -> Option<Receipt> + Send + Sync>;
type RawHandler = Box<dyn Fn(&[u8], &mut ChainState) -> Option<Receipt> + Send + Sync>;

pub struct MockChain {
    pub state: Mutex<ChainState>,
    on_call: CallHandler,
    on_send: SendHandler,
    on_raw: RawHandler,
    logs: Vec<RawLog>,
    chain_id: u64,
    accounts: Vec<Address>,
}

impl MockChain {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ChainState::default()),
            on_call: Box::new(|_, _| Ok(Bytes::new())),
            on_send: Box::new(|_, _| Some(mined(true))),
            on_raw: Box::new(|_, _| Some(mined(true))),
            logs: Vec::new(),
            chain_id: 1,
            accounts: vec![Address::repeat_byte(0xee)],
        }
    }

    pub fn on_call(
        mut self,
        f: impl Fn(&TxRequest, BlockTag) -> Result<Bytes, TransportError> + Send + Sync + 'static,
    ) -> Self {
        self.on_call = Box::new(f);
        self
    }

    /// Handler deciding the receipt of each sent transaction; `None` leaves
    /// it pending forever.
    pub fn on_send(
        mut self,
        f: impl Fn(&TxRequest, &mut ChainState) -> Option<Receipt> + Send + Sync + 'static,
    ) -> Self {
        self.on_send = Box::new(f);
        self
    }

    pub fn on_raw(
        mut self,
        f: impl Fn(&[u8], &mut ChainState) -> Option<Receipt> + Send + Sync + 'static,
    ) -> Self {
        self.on_raw = Box::new(f);
        self
    }

    pub fn with_logs(mut self, logs: Vec<RawLog>) -> Self {
        self.logs = logs;
        self
    }

    pub fn with_code(self, address: Address, code: &[u8]) -> Self {
        self.state.lock().unwrap().code.insert(address, Bytes::copy_from_slice(code));
        self
    }

    pub fn with_balance(self, address: Address, balance: U256) -> Self {
        self.state.lock().unwrap().balances.insert(address, balance);
        self
    }

    pub fn sent(&self) -> Vec<TxRequest> {
        self.state.lock().unwrap().sent.clone()
    }

    fn record(&self, state: &mut ChainState, receipt: Option<Receipt>, from: Address) -> B256 {
        let hash = B256::from(U256::from(state.sent.len() + state.raw_sent.len()));
        if let Some(mut receipt) = receipt {
            receipt.transaction_hash = hash;
            receipt.from = from;
            state.receipts.insert(hash, receipt);
        }
        hash
    }
}

/// A mined receipt with the given status.
pub fn mined(status: bool) -> Receipt {
    Receipt { status, block_number: Some(7), gas_used: 21_000, ..Default::default() }
}

/// A node execution error carrying revert data.
pub fn revert(data: &[u8]) -> TransportError {
    TransportError::Rpc(JsonRpcError {
        code: 3,
        message: "execution reverted".into(),
        data: Some(json!(format!("0x{}", hex::encode(data)))),
    })
}

/// `Error(string)` revert payload.
pub fn error_string(message: &str) -> Vec<u8> {
    let mut data = hex::decode("08c379a0").unwrap();
    data.extend_from_slice(&U256::from(32u64).to_be_bytes::<32>());
    data.extend_from_slice(&U256::from(message.len()).to_be_bytes::<32>());
    let mut body = message.as_bytes().to_vec();
    body.resize(message.len().div_ceil(32) * 32, 0);
    data.extend_from_slice(&body);
    data
}

pub fn word(value: u64) -> Bytes {
    Bytes::copy_from_slice(&U256::from(value).to_be_bytes::<32>())
}

#[async_trait]
impl ChainTransport for MockChain {
    async fn call(&self, tx: &TxRequest, block: BlockTag) -> Result<Bytes, TransportError> {
        (self.on_call)(tx, block)
    }

    async fn send_transaction(&self, tx: &TxRequest) -> Result<B256, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.sent.push(tx.clone());
        if let (Some(value), Some(from), Some(to)) = (tx.value, tx.from, tx.to) {
            let balance = state.balances.entry(from).or_default();
            *balance = balance.saturating_sub(value);
            *state.balances.entry(to).or_default() += value;
        }
        let receipt = (self.on_send)(tx, &mut state);
        Ok(self.record(&mut state, receipt, tx.from.unwrap_or(self.accounts[0])))
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.raw_sent.push(raw.to_vec());
        let receipt = (self.on_raw)(raw, &mut state);
        Ok(self.record(&mut state, receipt, recover_signer(raw).unwrap_or_default()))
    }

    async fn get_transaction_receipt(&self, hash: B256) -> Result<Option<Receipt>, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.receipt_polls += 1;
        Ok(state.receipts.get(&hash).cloned())
    }

    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, TransportError> {
        Ok(self.logs.iter().filter(|l| filter.matches(l)).cloned().collect())
    }

    async fn get_code(&self, address: Address, _block: BlockTag) -> Result<Bytes, TransportError> {
        Ok(self.state.lock().unwrap().code.get(&address).cloned().unwrap_or_default())
    }

    async fn get_balance(&self, address: Address, _block: BlockTag) -> Result<U256, TransportError> {
        Ok(self.state.lock().unwrap().balances.get(&address).copied().unwrap_or_default())
    }

    async fn get_transaction_count(&self, address: Address, _block: BlockTag) -> Result<u64, TransportError> {
        let state = self.state.lock().unwrap();
        let sent = state.sent.iter().filter(|tx| tx.from == Some(address) && tx.nonce.is_some()).count();
        let raw = state.raw_sent.iter().filter(|raw| recover_signer(raw).ok() == Some(address)).count();
        Ok((sent + raw) as u64)
    }

    async fn chain_id(&self) -> Result<u64, TransportError> {
        Ok(self.chain_id)
    }

    /// Reverts exactly when the `eth_call` handler does.
    async fn estimate_gas(&self, tx: &TxRequest) -> Result<u64, TransportError> {
        (self.on_call)(tx, BlockTag::Pending).map(|_| ESTIMATED_GAS)
    }

    async fn gas_price(&self) -> Result<u128, TransportError> {
        Ok(GAS_PRICE)
    }

    async fn accounts(&self) -> Result<Vec<Address>, TransportError> {
        Ok(self.accounts.clone())
    }

    fn url(&self) -> &str {
        "mock://chain"
    }
}
