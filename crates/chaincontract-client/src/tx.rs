//! Transaction helpers: native and ERC-20 transfers, balances, batched
//! submission and presigned deployments.
//!
//! Token arguments use the zero address for the chain's native currency.

use std::collections::HashMap;

use alloy_primitives::{Address, U256};
use chaincontract_abi::EncodedCall;
use chaincontract_core::{AbiValue, BlockTag, ChainTransport, ContractError, Receipt, TxRequest};
use tracing::{debug, info, warn};

use crate::builtins::{erc20, multicall3, PresignedDeployment, ZERO_ADDRESS};
use crate::dispatcher::{revert_or_transport, Dispatcher};
use crate::multicall::{aggregate, Call3};
use crate::signer::recover_signer;

type Result<T> = std::result::Result<T, ContractError>;

// ─── Transfers and balances ───────────────────────────────────────────────────

/// Transaction moving `amount` of `token` to `to`. Fields already set in
/// `tx` (sender, gas, nonce) are kept unless the transfer needs them.
pub fn transfer_request(token: Address, to: Address, amount: U256, tx: &TxRequest) -> Result<TxRequest> {
    let request = if token == ZERO_ADDRESS {
        TxRequest::new().to(to).value(amount)
    } else {
        let call = erc20()?.encode_call("transfer", &[to.into(), amount.into()])?;
        TxRequest::new().to(token).data(call.into_calldata())
    };
    Ok(tx.merge(&request))
}

pub async fn transfer(
    dispatcher: &Dispatcher,
    transport: &dyn ChainTransport,
    token: Address,
    to: Address,
    amount: U256,
    tx: &TxRequest,
) -> Result<Receipt> {
    let request = transfer_request(token, to, amount, tx)?;
    let abi = if token == ZERO_ADDRESS { None } else { Some(erc20()?) };
    dispatcher.write_with_abi(transport, &request, abi.as_deref()).await
}

/// `approve(spender, amount)` on `token`, sent from `tx.from`.
pub fn approve_request(token: Address, spender: Address, amount: U256, tx: &TxRequest) -> Result<TxRequest> {
    if token == ZERO_ADDRESS {
        return Err(ContractError::invalid("the native currency has no allowance to approve"));
    }
    let call = erc20()?.encode_call("approve", &[spender.into(), amount.into()])?;
    Ok(tx.merge(&TxRequest::new().to(token).data(call.into_calldata())))
}

pub async fn approve(
    dispatcher: &Dispatcher,
    transport: &dyn ChainTransport,
    token: Address,
    spender: Address,
    amount: U256,
    tx: &TxRequest,
) -> Result<Receipt> {
    let request = approve_request(token, spender, amount, tx)?;
    dispatcher.write_with_abi(transport, &request, Some(&*erc20()?)).await
}

pub async fn balance_of(
    dispatcher: &Dispatcher,
    transport: &dyn ChainTransport,
    token: Address,
    owner: Address,
) -> Result<U256> {
    if token == ZERO_ADDRESS {
        return Ok(transport.get_balance(owner, BlockTag::Latest).await?);
    }
    let abi = erc20()?;
    let call = abi.encode_call("balanceOf", &[owner.into()])?;
    let data = dispatcher
        .read_with_abi(transport, &TxRequest::new().to(token).data(call.calldata().clone()), Some(&abi))
        .await?;
    single_uint(&call, &data)
}

/// Balances of many owners in one Multicall3 round trip. Owners whose
/// sub-call failed come back as `None`.
pub async fn balances(
    dispatcher: &Dispatcher,
    transport: &dyn ChainTransport,
    multicall: Address,
    token: Address,
    owners: &[Address],
) -> Result<Vec<Option<U256>>> {
    let (target, abi, function) = if token == ZERO_ADDRESS {
        (multicall, multicall3()?, "getEthBalance")
    } else {
        (token, erc20()?, "balanceOf")
    };
    let calls = owners
        .iter()
        .map(|owner| abi.encode_call(function, &[(*owner).into()]))
        .collect::<Result<Vec<_>>>()?;
    let batch: Vec<Call3> = calls.iter().map(|c| Call3::from_call(target, c)).collect();
    let results = aggregate(dispatcher, transport, multicall, &batch, false).await?;
    calls
        .iter()
        .zip(results)
        .map(|(call, result)| {
            if result.success && !result.return_data.is_empty() {
                single_uint(call, &result.return_data).map(Some)
            } else {
                Ok(None)
            }
        })
        .collect()
}

fn single_uint(call: &EncodedCall, data: &[u8]) -> Result<U256> {
    let decoded = call.decode_result(data)?;
    decoded
        .single()
        .and_then(AbiValue::as_uint)
        .ok_or_else(|| ContractError::decoding(format!("{} did not return a uint", decoded.signature)))
}

// ─── Batches ──────────────────────────────────────────────────────────────────

/// Submit `txs` back to back, then wait for every receipt.
///
/// `extra` is layered over each transaction. Transactions without `from`
/// are sent by the dispatcher's signing account. Senders without an
/// explicit nonce get one from the node on first use, incremented locally
/// for each further transaction. With `check`, the first failed receipt is returned
/// as `TransactionFailed`.
pub async fn send_transactions(
    dispatcher: &Dispatcher,
    transport: &dyn ChainTransport,
    txs: &[TxRequest],
    extra: &TxRequest,
    check: bool,
) -> Result<Vec<Receipt>> {
    let mut nonces: HashMap<Address, u64> = HashMap::new();
    let mut hashes = Vec::with_capacity(txs.len());
    for tx in txs {
        let mut tx = tx.merge(extra);
        let sender = tx
            .from
            .or_else(|| dispatcher.sender())
            .ok_or_else(|| ContractError::invalid("transaction has no sender (from)"))?;
        tx.from = Some(sender);
        if tx.nonce.is_none() {
            let nonce = match nonces.get(&sender) {
                Some(last) => last + 1,
                None => transport.get_transaction_count(sender, BlockTag::Pending).await?,
            };
            nonces.insert(sender, nonce);
            tx.nonce = Some(nonce);
        }
        let hash = dispatcher.submit(transport, &tx, None).await?;
        debug!(tx_hash = %hash, %sender, nonce = ?tx.nonce, "batch transaction submitted");
        hashes.push(hash);
    }

    let mut receipts = Vec::with_capacity(hashes.len());
    for hash in hashes {
        let receipt = dispatcher.wait_for_receipt(transport, hash).await?;
        if check && !receipt.succeeded() {
            return Err(ContractError::TransactionFailed { receipt: Box::new(receipt), reason: None });
        }
        receipts.push(receipt);
    }
    Ok(receipts)
}

// ─── Presigned deployments ────────────────────────────────────────────────────

/// Broadcast a keyless presigned deployment unless the contract already
/// exists.
///
/// The deployer is recovered from `raw_tx`'s signature and must match
/// `deployment.deployer`, otherwise this fails with `AddressMismatch`
/// before anything is sent. When the deployer holds less than the
/// deployment's fee, `funder` (a transaction template, sent by the
/// dispatcher's signer when it has no `from`) sends it the fee first;
/// without a funder this fails with `InvalidArgument`.
pub async fn ensure_presigned_deployed(
    dispatcher: &Dispatcher,
    transport: &dyn ChainTransport,
    deployment: &PresignedDeployment,
    raw_tx: &[u8],
    funder: Option<&TxRequest>,
) -> Result<Address> {
    let contract = deployment.contract;
    if !transport.get_code(contract, BlockTag::Latest).await?.is_empty() {
        debug!(name = deployment.name, %contract, "presigned contract already deployed");
        return Ok(contract);
    }

    let deployer = recover_signer(raw_tx)?;
    if deployer != deployment.deployer {
        warn!(name = deployment.name, expected = %deployment.deployer, actual = %deployer, "presigned transaction has another sender");
        return Err(ContractError::AddressMismatch { expected: deployment.deployer, actual: deployer });
    }

    let balance = transport.get_balance(deployer, BlockTag::Latest).await?;
    if balance < deployment.fee {
        let funder = funder.ok_or_else(|| {
            ContractError::invalid(format!(
                "no funder given, send {} wei to the deployer {deployer} manually",
                deployment.fee
            ))
        })?;
        info!(name = deployment.name, %deployer, fee = %deployment.fee, "funding presigned deployer");
        transfer(dispatcher, transport, ZERO_ADDRESS, deployer, deployment.fee, funder).await?;
    }

    let hash = transport.send_raw_transaction(raw_tx).await.map_err(|e| revert_or_transport(e, None))?;
    let receipt = dispatcher.wait_for_receipt(transport, hash).await?;
    if !receipt.succeeded() {
        return Err(ContractError::TransactionFailed { receipt: Box::new(receipt), reason: None });
    }
    match receipt.contract_address {
        Some(actual) if actual == contract => {
            info!(name = deployment.name, %contract, "presigned contract deployed");
            Ok(contract)
        }
        other => Err(ContractError::AddressMismatch { expected: contract, actual: other.unwrap_or_default() }),
    }
}
