//! Call dispatch through an injected [`ChainTransport`].
//!
//! Read mode simulates with `eth_call`; write mode submits with
//! `eth_sendTransaction`, or signs locally and sends the raw transaction
//! when the dispatcher holds a [`LocalAccount`], then polls for the receipt. Reverts surfaced by the
//! node become [`ContractError::CallReverted`] with the payload decoded
//! against the contract ABI when one is supplied. The dispatcher never
//! retries; retry policy belongs to the transport.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256};
use chaincontract_abi::{decode_revert, ContractDescriptor};
use chaincontract_core::{
    BlockTag, ChainTransport, ContractError, Receipt, RevertReason, TransportError, TxRequest,
};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::config::DispatchConfig;
use crate::signer::LocalAccount;

type Result<T> = std::result::Result<T, ContractError>;

/// How a call is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
    /// `eth_call` against the dispatcher's block; no state change.
    Read,
    /// Signed and mined transaction.
    Write,
}

/// Outcome of a dispatched call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    /// Raw return data of a read.
    Returned(Bytes),
    /// Receipt of a successfully mined write.
    Mined(Receipt),
}

impl Dispatched {
    pub fn into_return_data(self) -> Option<Bytes> {
        match self {
            Dispatched::Returned(b) => Some(b),
            Dispatched::Mined(_) => None,
        }
    }

    pub fn into_receipt(self) -> Option<Receipt> {
        match self {
            Dispatched::Mined(r) => Some(r),
            Dispatched::Returned(_) => None,
        }
    }
}

/// Executes encoded calls in read or write mode.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    config: DispatchConfig,
    block: BlockTag,
    signer: Option<Arc<LocalAccount>>,
}

impl Dispatcher {
    pub fn new(config: DispatchConfig) -> Self {
        Self { config, block: BlockTag::Latest, signer: None }
    }

    /// Sign writes with `account` instead of relying on node-managed keys.
    pub fn with_signer(mut self, account: LocalAccount) -> Self {
        self.signer = Some(Arc::new(account));
        self
    }

    pub fn signer(&self) -> Option<&LocalAccount> {
        self.signer.as_deref()
    }

    /// Default sender of writes: the signing account, if any.
    pub fn sender(&self) -> Option<Address> {
        self.signer.as_ref().map(|s| s.address())
    }

    /// Block reads are simulated against.
    pub fn at_block(mut self, block: BlockTag) -> Self {
        self.block = block;
        self
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub async fn dispatch(
        &self,
        transport: &dyn ChainTransport,
        tx: &TxRequest,
        mode: CallMode,
    ) -> Result<Dispatched> {
        self.dispatch_with_abi(transport, tx, mode, None).await
    }

    /// Like [`dispatch`](Self::dispatch), decoding revert payloads against
    /// `abi`'s custom errors.
    pub async fn dispatch_with_abi(
        &self,
        transport: &dyn ChainTransport,
        tx: &TxRequest,
        mode: CallMode,
        abi: Option<&ContractDescriptor>,
    ) -> Result<Dispatched> {
        match mode {
            CallMode::Read => self.read_with_abi(transport, tx, abi).await.map(Dispatched::Returned),
            CallMode::Write => self.write_with_abi(transport, tx, abi).await.map(Dispatched::Mined),
        }
    }

    pub async fn read(&self, transport: &dyn ChainTransport, tx: &TxRequest) -> Result<Bytes> {
        self.read_with_abi(transport, tx, None).await
    }

    pub async fn write(&self, transport: &dyn ChainTransport, tx: &TxRequest) -> Result<Receipt> {
        self.write_with_abi(transport, tx, None).await
    }

    pub async fn read_with_abi(
        &self,
        transport: &dyn ChainTransport,
        tx: &TxRequest,
        abi: Option<&ContractDescriptor>,
    ) -> Result<Bytes> {
        debug!(to = ?tx.to, block = %self.block, url = transport.url(), "eth_call");
        transport
            .call(tx, self.block)
            .await
            .map_err(|e| revert_or_transport(e, abi))
    }

    pub async fn write_with_abi(
        &self,
        transport: &dyn ChainTransport,
        tx: &TxRequest,
        abi: Option<&ContractDescriptor>,
    ) -> Result<Receipt> {
        let hash = self.submit(transport, tx, abi).await?;
        info!(tx_hash = %hash, to = ?tx.to, "transaction submitted");

        let receipt = self.wait_for_receipt(transport, hash).await?;
        if receipt.succeeded() {
            info!(tx_hash = %hash, block = ?receipt.block_number, gas_used = receipt.gas_used, "transaction mined");
            return Ok(receipt);
        }

        let reason = replay_revert(transport, tx, &receipt, abi).await;
        warn!(
            tx_hash = %hash,
            reason = %reason.as_ref().map(ToString::to_string).unwrap_or_else(|| "unknown".into()),
            "transaction failed"
        );
        Err(ContractError::TransactionFailed { receipt: Box::new(receipt), reason })
    }

    /// Submit `tx` without waiting for it to be mined.
    pub async fn submit(
        &self,
        transport: &dyn ChainTransport,
        tx: &TxRequest,
        abi: Option<&ContractDescriptor>,
    ) -> Result<B256> {
        match &self.signer {
            Some(account) => account.send_transaction(transport, tx, abi).await,
            None => transport.send_transaction(tx).await.map_err(|e| revert_or_transport(e, abi)),
        }
    }

    /// Poll for `hash`'s receipt until it appears or the receipt timeout
    /// passes. A timeout too large to represent as an instant never expires.
    pub async fn wait_for_receipt(&self, transport: &dyn ChainTransport, hash: B256) -> Result<Receipt> {
        let deadline = Instant::now().checked_add(self.config.receipt_timeout());
        let mut polls = 0u32;
        loop {
            if let Some(receipt) = transport.get_transaction_receipt(hash).await? {
                return Ok(receipt);
            }
            polls += 1;
            if deadline.is_some_and(|d| Instant::now() >= d) {
                warn!(tx_hash = %hash, polls, "gave up waiting for receipt");
                return Err(TransportError::Timeout { ms: self.config.receipt_timeout_ms }.into());
            }
            debug!(tx_hash = %hash, polls, "receipt pending");
            sleep(self.config.poll_interval()).await;
        }
    }
}

/// Map a transport failure to `CallReverted` when the node reported an
/// execution revert, otherwise pass it through.
pub(crate) fn revert_or_transport(err: TransportError, abi: Option<&ContractDescriptor>) -> ContractError {
    match err.revert_data() {
        Some(data) => {
            let reason = decode_revert(&data, abi);
            warn!(%reason, "call reverted");
            ContractError::CallReverted { reason }
        }
        None if err.is_revert() => {
            warn!(error = %err, "call reverted without data");
            ContractError::CallReverted { reason: RevertReason::Empty }
        }
        None => ContractError::Transport(err),
    }
}

/// Re-run a failed transaction as `eth_call` at its block to recover the
/// revert reason. Best effort: any failure yields `None`.
async fn replay_revert(
    transport: &dyn ChainTransport,
    tx: &TxRequest,
    receipt: &Receipt,
    abi: Option<&ContractDescriptor>,
) -> Option<RevertReason> {
    let block = receipt.block_number.map_or(BlockTag::Latest, BlockTag::Number);
    let replay = TxRequest { from: Some(receipt.from), nonce: None, ..tx.clone() };
    match transport.call(&replay, block).await {
        Ok(_) => None,
        Err(e) => match revert_or_transport(e, abi) {
            ContractError::CallReverted { reason } => Some(reason),
            other => {
                debug!(error = %other, "revert replay failed");
                None
            }
        },
    }
}
