//! EIP-2935 historical block hashes.
//!
//! The history contract has no ABI: a call with a 32-byte block number
//! returns that block's hash, and the system address writes the parent
//! hash with 32 bytes of calldata at the start of each block.

use alloy_primitives::{address, Address, Bytes, B256, U256};
use chaincontract_core::{ChainTransport, ContractError, TxRequest};

use crate::dispatcher::Dispatcher;

pub const SYSTEM_ADDRESS: Address = address!("fffffffffffffffffffffffffffffffffffffffe");
pub const HISTORY_STORAGE_ADDRESS: Address = address!("0000F90827F1C53a10cb7A02335B175320002935");

/// Number of recent block hashes the contract serves.
pub const HISTORY_SERVE_WINDOW: u64 = 8191;

/// `eth_call` request reading the hash of block `number`.
pub fn block_hash_request(number: u64) -> TxRequest {
    TxRequest::new()
        .to(HISTORY_STORAGE_ADDRESS)
        .data(Bytes::copy_from_slice(&U256::from(number).to_be_bytes::<32>()))
}

/// System transaction storing `parent_hash`, as issued by the client at
/// the start of a block.
pub fn store_parent_hash_request(parent_hash: B256) -> TxRequest {
    TxRequest::new()
        .from(SYSTEM_ADDRESS)
        .to(HISTORY_STORAGE_ADDRESS)
        .data(Bytes::copy_from_slice(parent_hash.as_slice()))
}

/// Hash of block `number`. The contract reverts for blocks outside its
/// serve window, which surfaces as `CallReverted`.
pub async fn block_hash(
    dispatcher: &Dispatcher,
    transport: &dyn ChainTransport,
    number: u64,
) -> Result<B256, ContractError> {
    let data = dispatcher.read(transport, &block_hash_request(number)).await?;
    if data.len() != 32 {
        return Err(ContractError::decoding(format!(
            "history storage returned {} bytes, expected 32",
            data.len()
        )));
    }
    Ok(B256::from_slice(&data))
}
