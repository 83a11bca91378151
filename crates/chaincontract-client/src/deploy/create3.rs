//! CREATE3 address derivation as implemented by the CreateX factory.
//!
//! CreateX first "guards" the caller's salt, binding it to the sender
//! and/or chain depending on the salt's layout:
//!
//! ```text
//! bytes  0..20  sender: msg.sender, zero, or anything else (random)
//! byte   20     redeploy protection: 0x01 on, 0x00 off, other unspecified
//! bytes 21..32  entropy
//! ```
//!
//! The guarded salt deploys a fixed proxy with CREATE2, and the proxy
//! deploys the contract with CREATE at nonce 1.

use alloy_primitives::{b256, Address, B256, U256};
use chaincontract_abi::hash::keccak256_concat;
use chaincontract_core::ContractError;

use super::create2::create2_address;

/// keccak of the CreateX CREATE3 proxy init code.
pub const CREATE3_PROXY_HASH: B256 =
    b256!("21c35dbe1b344a2488cf3321d6ce542f8e9f305544ff09e4993a62319a497c1f");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaltSender {
    MsgSender,
    ZeroAddress,
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeployProtection {
    On,
    Off,
    Unspecified,
}

/// Split a salt into its sender and protection parts. Without a known
/// deployer a non-zero prefix can only be classified as random.
pub fn classify_salt(salt: B256, deployer: Option<Address>) -> (SaltSender, RedeployProtection) {
    let prefix = &salt[..20];
    let sender = if deployer.is_some_and(|d| d.as_slice() == prefix) {
        SaltSender::MsgSender
    } else if prefix.iter().all(|b| *b == 0) {
        SaltSender::ZeroAddress
    } else {
        SaltSender::Random
    };
    let protection = match salt[20] {
        0x01 => RedeployProtection::On,
        0x00 => RedeployProtection::Off,
        _ => RedeployProtection::Unspecified,
    };
    (sender, protection)
}

/// The salt CreateX actually uses for `salt` sent by `deployer` on
/// `chain_id`.
///
/// Fails with `InvalidArgument` where the factory would revert with
/// `InvalidSalt`, and when a chain-bound salt is given without a chain id.
pub fn guard_salt(salt: B256, deployer: Option<Address>, chain_id: Option<u64>) -> Result<B256, ContractError> {
    let chain = || {
        chain_id
            .map(|id| B256::from(U256::from(id)))
            .ok_or_else(|| ContractError::invalid("salt is chain-bound but no chain id was given"))
    };
    let guarded = match classify_salt(salt, deployer) {
        (SaltSender::MsgSender, RedeployProtection::On) => {
            let sender = deployer.unwrap_or_default().into_word();
            keccak256_concat(&[sender.as_slice(), chain()?.as_slice(), salt.as_slice()])
        }
        (SaltSender::MsgSender, RedeployProtection::Off) => {
            let sender = deployer.unwrap_or_default().into_word();
            keccak256_concat(&[sender.as_slice(), salt.as_slice()])
        }
        (SaltSender::MsgSender, RedeployProtection::Unspecified) => {
            return Err(ContractError::invalid(format!(
                "sender-bound salt {salt} has an unspecified redeploy protection flag"
            )));
        }
        (SaltSender::ZeroAddress, RedeployProtection::On) => {
            keccak256_concat(&[chain()?.as_slice(), salt.as_slice()])
        }
        (SaltSender::ZeroAddress, RedeployProtection::Unspecified) => {
            return Err(ContractError::invalid(format!(
                "zero-prefixed salt {salt} has an unspecified redeploy protection flag"
            )));
        }
        _ => keccak256_concat(&[salt.as_slice()]),
    };
    Ok(guarded)
}

/// Address of the contract deployed from `guarded_salt` by `factory`.
pub fn create3_address(factory: Address, guarded_salt: B256) -> Address {
    let proxy = create2_address(factory, guarded_salt, CREATE3_PROXY_HASH);
    let hash = keccak256_concat(&[&[0xd6u8, 0x94][..], proxy.as_slice(), &[0x01]]);
    Address::from_slice(&hash[12..])
}
