//! The `ChainTransport` trait: the only way ChainContract reaches a node.

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;

use crate::chain::{BlockTag, LogFilter, RawLog, Receipt, TxRequest};
use crate::error::TransportError;

/// Async chain-access capability injected into every I/O operation.
///
/// Implementations own connection handling and retries. Callers
/// hold it as `&dyn ChainTransport` or `Arc<dyn ChainTransport>`.
///
/// Node execution reverts must be reported as
/// [`TransportError::Rpc`] with the revert bytes in the error's `data`
/// field so they can be decoded against the contract ABI.
#[async_trait]
pub trait ChainTransport: Send + Sync {
    /// `eth_call`: simulate `tx` against the state at `block`.
    async fn call(&self, tx: &TxRequest, block: BlockTag) -> Result<Bytes, TransportError>;

    /// `eth_sendTransaction`: submit `tx` and return its hash.
    async fn send_transaction(&self, tx: &TxRequest) -> Result<B256, TransportError>;

    /// `eth_sendRawTransaction`: submit an already signed transaction.
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, TransportError>;

    /// `eth_getTransactionReceipt`; `None` while the transaction is pending.
    async fn get_transaction_receipt(&self, hash: B256)
        -> Result<Option<Receipt>, TransportError>;

    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, TransportError>;

    async fn get_code(&self, address: Address, block: BlockTag) -> Result<Bytes, TransportError>;

    async fn get_balance(&self, address: Address, block: BlockTag)
        -> Result<U256, TransportError>;

    async fn get_transaction_count(
        &self,
        address: Address,
        block: BlockTag,
    ) -> Result<u64, TransportError>;

    async fn chain_id(&self) -> Result<u64, TransportError>;

    /// `eth_estimateGas` for `tx` against the pending state.
    async fn estimate_gas(&self, tx: &TxRequest) -> Result<u64, TransportError>;

    /// `eth_gasPrice` in wei.
    async fn gas_price(&self) -> Result<u128, TransportError>;

    /// Accounts managed by the node. Empty for transports without them.
    async fn accounts(&self) -> Result<Vec<Address>, TransportError> {
        Ok(Vec::new())
    }

    /// Return the transport's identifier (URL or name).
    fn url(&self) -> &str;
}
