mod common;

use alloy_primitives::{address, Address, Bytes, B256, U256};
use chaincontract_abi::{event_topic, keccak256};
use chaincontract_client::builtins::{
    CREATE2_FACTORY, CREATEX_FACTORY, PRESIGNED_CREATE2, PRESIGNED_CREATE2_TX, PRESIGNED_MULTICALL3,
};
use chaincontract_client::deploy::{create2_address_from_code, ensure_create2_deployed};
use chaincontract_client::tx::ensure_presigned_deployed;
use chaincontract_client::{compute_address, deploy, DeployScheme, DispatchConfig, Dispatcher};
use chaincontract_core::{ContractError, RawLog, TxRequest};
use common::{mined, MockChain};

const INIT_CODE: &[u8] = &[0x60, 0x00, 0x60, 0x00, 0xf3];
const CREATE3_TARGET: Address = address!("60f7b32b5799838a480572aee2a8f0355f607b38");

fn fast() -> Dispatcher {
    Dispatcher::new(DispatchConfig::local())
}

fn salt(n: u64) -> B256 {
    B256::from(U256::from(n))
}

/// Chain whose CREATE2 proxy places code where the formula says.
fn create2_chain() -> MockChain {
    MockChain::new().on_send(|tx, state| {
        let data = tx.input();
        let deployed = create2_address_from_code(CREATE2_FACTORY, B256::from_slice(&data[..32]), &data[32..]);
        state.code.insert(deployed, Bytes::from_static(&[0xfe]));
        Some(mined(true))
    })
}

#[tokio::test]
async fn create2_deploys_to_computed_address() {
    let chain = create2_chain();
    let scheme = DeployScheme::create2();
    let expected = compute_address(&scheme, salt(1), keccak256(INIT_CODE), None).unwrap();

    let deployed = deploy(&fast(), &chain, &scheme, salt(1), INIT_CODE, &TxRequest::new()).await.unwrap();
    assert_eq!(deployed, expected);

    let sent = chain.sent();
    assert_eq!(sent[0].to, Some(CREATE2_FACTORY));
    assert_eq!(&sent[0].input()[..32], salt(1).as_slice());
    assert_eq!(&sent[0].input()[32..], INIT_CODE);
}

#[tokio::test]
async fn missing_code_is_a_mismatch() {
    let chain = MockChain::new();
    let scheme = DeployScheme::create2();
    let err = deploy(&fast(), &chain, &scheme, salt(1), INIT_CODE, &TxRequest::new()).await.unwrap_err();
    match err {
        ContractError::AddressMismatch { expected, actual } => {
            assert_eq!(expected, compute_address(&scheme, salt(1), keccak256(INIT_CODE), None).unwrap());
            assert_eq!(actual, Address::ZERO);
        }
        other => panic!("unexpected {other:?}"),
    }
}

fn create3_chain(reported: Address) -> MockChain {
    MockChain::new().on_send(move |_, state| {
        state.code.insert(CREATE3_TARGET, Bytes::from_static(&[0xfe]));
        let mut receipt = mined(true);
        receipt.logs.push(RawLog {
            address: CREATEX_FACTORY,
            topics: vec![event_topic("ContractCreation(address)"), reported.into_word()],
            data: Bytes::new(),
            ..Default::default()
        });
        Some(receipt)
    })
}

#[tokio::test]
async fn create3_checks_factory_event() {
    let chain = create3_chain(CREATE3_TARGET);
    let deployed = deploy(&fast(), &chain, &DeployScheme::create3(), salt(200), INIT_CODE, &TxRequest::new())
        .await
        .unwrap();
    assert_eq!(deployed, CREATE3_TARGET);
    assert_eq!(hex::encode(&chain.sent()[0].input()[..4]), "9c36a286");
}

#[tokio::test]
async fn create3_event_for_other_address() {
    let elsewhere = Address::repeat_byte(0x99);
    let chain = create3_chain(elsewhere);
    let err = deploy(&fast(), &chain, &DeployScheme::create3(), salt(200), INIT_CODE, &TxRequest::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ContractError::AddressMismatch { expected, actual } if expected == CREATE3_TARGET && actual == elsewhere
    ));
}

#[tokio::test]
async fn sender_bound_create3_salt_uses_sender() {
    let sender = Address::repeat_byte(0x11);
    let mut raw = [0x22u8; 32];
    raw[..20].copy_from_slice(sender.as_slice());
    raw[20] = 0x00;
    let salt = B256::from(raw);
    let expected = address!("a269f9a61511a825f7518a850cf984ac2c82d1b5");

    let chain = MockChain::new().on_send(move |_, state| {
        state.code.insert(expected, Bytes::from_static(&[0xfe]));
        Some(mined(true))
    });
    let deployed = deploy(&fast(), &chain, &DeployScheme::create3(), salt, INIT_CODE, &TxRequest::new().from(sender))
        .await
        .unwrap();
    assert_eq!(deployed, expected);
}

#[tokio::test]
async fn ensure_deployed_skips_existing_code() {
    let expected = compute_address(&DeployScheme::create2(), salt(5), keccak256(INIT_CODE), None).unwrap();
    let chain = MockChain::new().with_code(expected, &[0xfe]);
    let address = ensure_create2_deployed(&fast(), &chain, salt(5), INIT_CODE, &TxRequest::new()).await.unwrap();
    assert_eq!(address, expected);
    assert!(chain.sent().is_empty());
}

fn presigned_chain() -> MockChain {
    MockChain::new().on_raw(|_, state| {
        state.code.insert(PRESIGNED_CREATE2.contract, Bytes::from_static(&[0xfe]));
        let mut receipt = mined(true);
        receipt.contract_address = Some(PRESIGNED_CREATE2.contract);
        Some(receipt)
    })
}

#[tokio::test]
async fn presigned_needs_funds_or_funder() {
    let chain = presigned_chain();
    let err = ensure_presigned_deployed(&fast(), &chain, &PRESIGNED_CREATE2, PRESIGNED_CREATE2_TX, None)
        .await
        .unwrap_err();
    assert_eq!(err.classification(), "InvalidArgument");
    assert!(chain.state.lock().unwrap().raw_sent.is_empty());
}

#[tokio::test]
async fn presigned_funds_deployer_then_broadcasts() {
    let funder = Address::repeat_byte(0x42);
    let chain = presigned_chain().with_balance(funder, U256::from(10u64).pow(U256::from(18u64)));
    let address = ensure_presigned_deployed(
        &fast(),
        &chain,
        &PRESIGNED_CREATE2,
        PRESIGNED_CREATE2_TX,
        Some(&TxRequest::new().from(funder)),
    )
    .await
    .unwrap();
    assert_eq!(address, PRESIGNED_CREATE2.contract);

    let sent = chain.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, Some(PRESIGNED_CREATE2.deployer));
    assert_eq!(sent[0].value, Some(PRESIGNED_CREATE2.fee));
    assert_eq!(chain.state.lock().unwrap().raw_sent, vec![PRESIGNED_CREATE2_TX.to_vec()]);

    // Second run finds the code and does nothing.
    ensure_presigned_deployed(&fast(), &chain, &PRESIGNED_CREATE2, PRESIGNED_CREATE2_TX, None).await.unwrap();
    assert_eq!(chain.state.lock().unwrap().raw_sent.len(), 1);
}

#[tokio::test]
async fn presigned_sender_must_match_deployment() {
    let funder = Address::repeat_byte(0x42);
    let chain = presigned_chain().with_balance(funder, U256::from(10u64).pow(U256::from(18u64)));
    let err = ensure_presigned_deployed(
        &fast(),
        &chain,
        &PRESIGNED_MULTICALL3,
        PRESIGNED_CREATE2_TX,
        Some(&TxRequest::new().from(funder)),
    )
    .await
    .unwrap_err();
    match err {
        ContractError::AddressMismatch { expected, actual } => {
            assert_eq!(expected, PRESIGNED_MULTICALL3.deployer);
            assert_eq!(actual, PRESIGNED_CREATE2.deployer);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(chain.sent().is_empty());
    assert!(chain.state.lock().unwrap().raw_sent.is_empty());
}
