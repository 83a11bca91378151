mod common;

use alloy_consensus::{TxEnvelope, TxLegacy};
use alloy_eips::eip2718::Decodable2718;
use alloy_primitives::{address, Address, TxKind, B256, U256};
use chaincontract_abi::keccak256;
use chaincontract_client::deploy::ensure_deployed;
use chaincontract_client::tx::send_transactions;
use chaincontract_client::{
    builtins, compute_address, recover_signer, Contract, DeployScheme, DispatchConfig, Dispatcher, LocalAccount,
};
use chaincontract_core::{ContractError, RevertReason, TxRequest};
use common::{error_string, revert, MockChain, ESTIMATED_GAS, GAS_PRICE};

const TOKEN: Address = Address::repeat_byte(0xaa);
const DEV_KEY: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
const DEV_ADDRESS: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");

fn signing() -> Dispatcher {
    Dispatcher::new(DispatchConfig::local()).with_signer(LocalAccount::from_private_key(DEV_KEY).unwrap())
}

fn raw_sent(chain: &MockChain) -> Vec<Vec<u8>> {
    chain.state.lock().unwrap().raw_sent.clone()
}

fn legacy(raw: &[u8]) -> TxLegacy {
    match TxEnvelope::decode_2718(&mut &raw[..]).unwrap() {
        TxEnvelope::Legacy(signed) => signed.tx().clone(),
        other => panic!("unexpected envelope {other:?}"),
    }
}

#[tokio::test]
async fn writes_are_signed_locally() {
    let chain = MockChain::new();
    let token = Contract::new(TOKEN, builtins::erc20().unwrap());
    let receipt = token
        .send(&chain, &signing(), "transfer", &[Address::repeat_byte(2).into(), 5u64.into()], None)
        .await
        .unwrap();
    assert!(receipt.succeeded());
    assert_eq!(receipt.from, DEV_ADDRESS);
    assert!(chain.sent().is_empty());

    let raw = raw_sent(&chain);
    assert_eq!(raw.len(), 1);
    assert_eq!(recover_signer(&raw[0]).unwrap(), DEV_ADDRESS);
    let tx = legacy(&raw[0]);
    assert_eq!(tx.chain_id, Some(1));
    assert_eq!(tx.nonce, 0);
    assert_eq!(tx.gas_limit, ESTIMATED_GAS);
    assert_eq!(tx.gas_price, GAS_PRICE);
    assert_eq!(tx.to, TxKind::Call(TOKEN));
    assert_eq!(hex::encode(&tx.input[..4]), "a9059cbb");
}

#[tokio::test]
async fn explicit_fields_are_kept_and_nonces_advance() {
    let chain = MockChain::new();
    let dispatcher = signing();
    dispatcher.write(&chain, &TxRequest::new().to(TOKEN).gas(90_000)).await.unwrap();
    dispatcher.write(&chain, &TxRequest::new().to(TOKEN).value(U256::from(7u64))).await.unwrap();

    let raw = raw_sent(&chain);
    let (first, second) = (legacy(&raw[0]), legacy(&raw[1]));
    assert_eq!(first.gas_limit, 90_000);
    assert_eq!((first.nonce, second.nonce), (0, 1));
    assert_eq!(second.value, U256::from(7u64));
}

#[tokio::test]
async fn foreign_sender_is_rejected() {
    let chain = MockChain::new();
    let err = signing()
        .write(&chain, &TxRequest::new().to(TOKEN).from(Address::repeat_byte(9)))
        .await
        .unwrap_err();
    assert_eq!(err.classification(), "Signing");
    assert!(raw_sent(&chain).is_empty());
}

#[tokio::test]
async fn estimation_reverts_are_decoded() {
    let chain = MockChain::new().on_call(|_, _| Err(revert(&error_string("paused"))));
    let err = signing().write(&chain, &TxRequest::new().to(TOKEN)).await.unwrap_err();
    match err {
        ContractError::CallReverted { reason } => {
            assert_eq!(reason, RevertReason::Message { message: "paused".into() });
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(raw_sent(&chain).is_empty());
}

#[tokio::test]
async fn batches_use_the_signing_account() {
    let chain = MockChain::new();
    let txs = [TxRequest::new().to(TOKEN), TxRequest::new().to(TOKEN)];
    let receipts = send_transactions(&signing(), &chain, &txs, &TxRequest::new(), true).await.unwrap();
    assert_eq!(receipts.len(), 2);
    let nonces: Vec<u64> = raw_sent(&chain).iter().map(|raw| legacy(raw).nonce).collect();
    assert_eq!(nonces, vec![0, 1]);
}

#[tokio::test]
async fn create3_deployer_is_the_signing_account() {
    let mut salt = [0u8; 32];
    salt[..20].copy_from_slice(DEV_ADDRESS.as_slice());
    let salt = B256::from(salt);
    let scheme = DeployScheme::create3().with_chain_id(1);
    let expected = compute_address(&scheme, salt, keccak256([0xfe]), Some(DEV_ADDRESS)).unwrap();

    let chain = MockChain::new().with_code(expected, &[0xfe]);
    let address = ensure_deployed(&signing(), &chain, &scheme, salt, &[0xfe], &TxRequest::new()).await.unwrap();
    assert_eq!(address, expected);
    assert!(raw_sent(&chain).is_empty());
}
