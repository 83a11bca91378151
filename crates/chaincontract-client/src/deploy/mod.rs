//! Deterministic deployment through CREATE2 and CREATE3 factories.
//!
//! [`compute_address`] mirrors the on-chain formulas; [`deploy`] submits
//! the factory transaction and checks the contract landed where the
//! formula says it would.

pub mod create2;
pub mod create3;

use alloy_primitives::{Address, Bytes, B256};
use chaincontract_abi::{event_topic, keccak256};
use chaincontract_core::{AbiValue, BlockTag, ChainTransport, ContractError, Receipt, TxRequest};
use tracing::{debug, info, warn};

use crate::builtins::createx::{createx, CONTRACT_CREATION, CONTRACT_CREATION_WITH_SALT};
use crate::builtins::{CREATE2_FACTORY, CREATEX_FACTORY};
use crate::dispatcher::Dispatcher;

pub use create2::{create2_address, create2_address_from_code, create2_calldata};
pub use create3::{classify_salt, create3_address, guard_salt, CREATE3_PROXY_HASH};

type Result<T> = std::result::Result<T, ContractError>;

/// Which factory deploys the contract and how its address is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployScheme {
    /// Deterministic deployment proxy: calldata is `salt ++ init_code`.
    Create2 { factory: Address },
    /// CreateX `deployCreate3(bytes32,bytes)`. `chain_id` is needed only
    /// for chain-bound salts; [`deploy`] fills it from the transport.
    Create3 { factory: Address, chain_id: Option<u64> },
}

impl DeployScheme {
    pub fn create2() -> Self {
        DeployScheme::Create2 { factory: CREATE2_FACTORY }
    }

    pub fn create3() -> Self {
        DeployScheme::Create3 { factory: CREATEX_FACTORY, chain_id: None }
    }

    pub fn factory(&self) -> Address {
        match *self {
            DeployScheme::Create2 { factory } | DeployScheme::Create3 { factory, .. } => factory,
        }
    }

    pub fn with_factory(self, factory: Address) -> Self {
        match self {
            DeployScheme::Create2 { .. } => DeployScheme::Create2 { factory },
            DeployScheme::Create3 { chain_id, .. } => DeployScheme::Create3 { factory, chain_id },
        }
    }

    pub fn with_chain_id(self, chain_id: u64) -> Self {
        match self {
            DeployScheme::Create3 { factory, .. } => DeployScheme::Create3 { factory, chain_id: Some(chain_id) },
            other => other,
        }
    }

    /// Factory calldata deploying `init_code` under `salt`.
    pub fn calldata(&self, salt: B256, init_code: &[u8]) -> Result<Bytes> {
        match self {
            DeployScheme::Create2 { .. } => Ok(create2_calldata(salt, init_code)),
            DeployScheme::Create3 { .. } => {
                let call = createx()?.encode_call(
                    "deployCreate3(bytes32,bytes)",
                    &[AbiValue::FixedBytes(salt.to_vec()), AbiValue::Bytes(init_code.to_vec())],
                )?;
                Ok(call.into_calldata())
            }
        }
    }
}

/// Address `init_code_hash` deploys to under `scheme` and `salt`.
///
/// For CREATE2 the deployer defaults to the factory, which is the account
/// executing CREATE2. For CREATE3 the deployer is the transaction sender
/// and may only be omitted for salts that are not sender-bound; the init
/// code does not affect the address.
pub fn compute_address(
    scheme: &DeployScheme,
    salt: B256,
    init_code_hash: B256,
    deployer: Option<Address>,
) -> Result<Address> {
    match *scheme {
        DeployScheme::Create2 { factory } => {
            Ok(create2_address(deployer.unwrap_or(factory), salt, init_code_hash))
        }
        DeployScheme::Create3 { factory, chain_id } => {
            Ok(create3_address(factory, guard_salt(salt, deployer, chain_id)?))
        }
    }
}

/// Deploy `init_code` through `scheme`'s factory and return its address.
///
/// `tx` supplies the sender, value and gas; `to` and `data` are replaced by
/// the factory call. Fails with `AddressMismatch` when no code appears at
/// the computed address, or when a CreateX `ContractCreation` event names
/// another one. When nothing was deployed the reported actual address is
/// zero.
pub async fn deploy(
    dispatcher: &Dispatcher,
    transport: &dyn ChainTransport,
    scheme: &DeployScheme,
    salt: B256,
    init_code: &[u8],
    tx: &TxRequest,
) -> Result<Address> {
    let (scheme, deployer) = resolve(dispatcher, transport, scheme, tx).await?;
    let expected = compute_address(&scheme, salt, keccak256(init_code), deployer)?;
    let request = tx.merge(&TxRequest::new().to(scheme.factory()).data(scheme.calldata(salt, init_code)?));

    info!(factory = %scheme.factory(), %salt, %expected, "deploying contract");
    let abi = match scheme {
        DeployScheme::Create3 { .. } => Some(createx()?),
        DeployScheme::Create2 { .. } => None,
    };
    let receipt = dispatcher.write_with_abi(transport, &request, abi.as_deref()).await?;
    verify_deployment(transport, &scheme, expected, &receipt).await?;
    info!(address = %expected, tx_hash = %receipt.transaction_hash, "contract deployed");
    Ok(expected)
}

/// [`deploy`] unless code already exists at the computed address.
pub async fn ensure_deployed(
    dispatcher: &Dispatcher,
    transport: &dyn ChainTransport,
    scheme: &DeployScheme,
    salt: B256,
    init_code: &[u8],
    tx: &TxRequest,
) -> Result<Address> {
    let (resolved, deployer) = resolve(dispatcher, transport, scheme, tx).await?;
    let address = compute_address(&resolved, salt, keccak256(init_code), deployer)?;
    if !transport.get_code(address, BlockTag::Latest).await?.is_empty() {
        info!(%address, "contract already deployed");
        return Ok(address);
    }
    deploy(dispatcher, transport, &resolved, salt, init_code, tx).await
}

/// [`ensure_deployed`] through the canonical CREATE2 factory.
pub async fn ensure_create2_deployed(
    dispatcher: &Dispatcher,
    transport: &dyn ChainTransport,
    salt: B256,
    init_code: &[u8],
    tx: &TxRequest,
) -> Result<Address> {
    ensure_deployed(dispatcher, transport, &DeployScheme::create2(), salt, init_code, tx).await
}

/// [`ensure_deployed`] through the canonical CreateX factory.
pub async fn ensure_create3_deployed(
    dispatcher: &Dispatcher,
    transport: &dyn ChainTransport,
    salt: B256,
    init_code: &[u8],
    tx: &TxRequest,
) -> Result<Address> {
    ensure_deployed(dispatcher, transport, &DeployScheme::create3(), salt, init_code, tx).await
}

// ─── Internals ────────────────────────────────────────────────────────────────

/// Fill what the address formula needs from the node: the chain id for
/// CREATE3 and the sender (explicit `from`, else the dispatcher's signing
/// account, else the node's first account).
async fn resolve(
    dispatcher: &Dispatcher,
    transport: &dyn ChainTransport,
    scheme: &DeployScheme,
    tx: &TxRequest,
) -> Result<(DeployScheme, Option<Address>)> {
    match *scheme {
        DeployScheme::Create2 { .. } => Ok((*scheme, None)),
        DeployScheme::Create3 { factory, chain_id } => {
            let chain_id = match chain_id {
                Some(id) => id,
                None => transport.chain_id().await?,
            };
            let deployer = match tx.from.or_else(|| dispatcher.sender()) {
                Some(from) => Some(from),
                None => transport.accounts().await?.first().copied(),
            };
            debug!(chain_id, deployer = ?deployer, "create3 parameters resolved");
            Ok((DeployScheme::Create3 { factory, chain_id: Some(chain_id) }, deployer))
        }
    }
}

async fn verify_deployment(
    transport: &dyn ChainTransport,
    scheme: &DeployScheme,
    expected: Address,
    receipt: &Receipt,
) -> Result<()> {
    let reported = match scheme {
        DeployScheme::Create3 { factory, .. } => created_by_event(receipt, *factory)?,
        DeployScheme::Create2 { .. } => None,
    };
    if let Some(actual) = reported.filter(|a| *a != expected) {
        warn!(%expected, %actual, "factory deployed to an unexpected address");
        return Err(ContractError::AddressMismatch { expected, actual });
    }
    if transport.get_code(expected, BlockTag::Latest).await?.is_empty() {
        let actual = reported.unwrap_or(Address::ZERO);
        warn!(%expected, %actual, "no code at computed address");
        return Err(ContractError::AddressMismatch { expected, actual });
    }
    Ok(())
}

/// `newContract` of the factory's `ContractCreation` log. CreateX emits the
/// one-argument form from CREATE3 and the salted form from CREATE2 entry
/// points; either is accepted.
fn created_by_event(receipt: &Receipt, factory: Address) -> Result<Option<Address>> {
    let topics = [event_topic(CONTRACT_CREATION), event_topic(CONTRACT_CREATION_WITH_SALT)];
    let Some(log) = receipt
        .logs
        .iter()
        .find(|l| l.address == factory && l.topic0().is_some_and(|t| topics.contains(t)))
    else {
        return Ok(None);
    };
    let decoded = createx()?.decode_raw_log(log)?;
    Ok(decoded.get("newContract").and_then(AbiValue::as_address))
}
