//! CREATE2 address derivation (EIP-1014).

use alloy_primitives::{Address, Bytes, B256};
use chaincontract_abi::hash::{keccak256, keccak256_concat};

/// `keccak256(0xff ++ deployer ++ salt ++ init_code_hash)[12:]`
pub fn create2_address(deployer: Address, salt: B256, init_code_hash: B256) -> Address {
    let hash = keccak256_concat(&[
        &[0xffu8][..],
        deployer.as_slice(),
        salt.as_slice(),
        init_code_hash.as_slice(),
    ]);
    Address::from_slice(&hash[12..])
}

/// Same as [`create2_address`], hashing `init_code` first.
pub fn create2_address_from_code(deployer: Address, salt: B256, init_code: &[u8]) -> Address {
    create2_address(deployer, salt, keccak256(init_code))
}

/// Calldata for the deterministic deployment proxy: the raw salt followed
/// by the init code, no selector.
pub fn create2_calldata(salt: B256, init_code: &[u8]) -> Bytes {
    let mut data = Vec::with_capacity(32 + init_code.len());
    data.extend_from_slice(salt.as_slice());
    data.extend_from_slice(init_code);
    Bytes::from(data)
}
