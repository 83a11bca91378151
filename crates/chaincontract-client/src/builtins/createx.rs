//! CreateX deployment factory.
//!
//! Only the CREATE2 and CREATE3 entry points plus the address helpers and
//! the events and errors they raise are declared.

use std::sync::Arc;

use chaincontract_abi::ContractDescriptor;
use chaincontract_core::ContractError;

pub const CREATEX_ABI: &[&str] = &[
    "struct Values { uint256 constructorAmount; uint256 initCallAmount; }",
    "function deployCreate(bytes initCode) payable returns (address newContract)",
    "function deployCreate2(bytes32 salt, bytes initCode) payable returns (address newContract)",
    "function deployCreate2(bytes initCode) payable returns (address newContract)",
    "function deployCreate2AndInit(bytes32 salt, bytes initCode, bytes data, Values values) payable returns (address newContract)",
    "function deployCreate3(bytes32 salt, bytes initCode) payable returns (address newContract)",
    "function deployCreate3(bytes initCode) payable returns (address newContract)",
    "function deployCreate3AndInit(bytes32 salt, bytes initCode, bytes data, Values values) payable returns (address newContract)",
    "function computeCreateAddress(address deployer, uint256 nonce) view returns (address computedAddress)",
    "function computeCreate2Address(bytes32 salt, bytes32 initCodeHash, address deployer) pure returns (address computedAddress)",
    "function computeCreate2Address(bytes32 salt, bytes32 initCodeHash) view returns (address computedAddress)",
    "function computeCreate3Address(bytes32 salt, address deployer) pure returns (address computedAddress)",
    "function computeCreate3Address(bytes32 salt) view returns (address computedAddress)",
    "event ContractCreation(address indexed newContract, bytes32 indexed salt)",
    "event ContractCreation(address indexed newContract)",
    "event Create3ProxyContractCreation(address indexed newContract, bytes32 indexed salt)",
    "error FailedContractCreation(address emitter)",
    "error FailedContractInitialisation(address emitter, bytes revertData)",
    "error FailedEtherTransfer(address emitter, bytes revertData)",
    "error InvalidNonceValue(address emitter)",
    "error InvalidSalt(address emitter)",
];

/// Emitted by `deployCreate` and `deployCreate3`.
pub const CONTRACT_CREATION: &str = "ContractCreation(address)";
/// Emitted by the `deployCreate2` family.
pub const CONTRACT_CREATION_WITH_SALT: &str = "ContractCreation(address,bytes32)";

pub fn createx() -> Result<Arc<ContractDescriptor>, ContractError> {
    super::load(CREATEX_ABI)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overloaded_entry_points() {
        let abi = createx().unwrap();
        let sigs: Vec<_> = abi.overloads("deployCreate3").iter().map(|f| f.signature.clone()).collect();
        assert_eq!(sigs, ["deployCreate3(bytes32,bytes)", "deployCreate3(bytes)"]);
        assert_eq!(hex::encode(abi.overloads("deployCreate3")[0].selector), "9c36a286");
        assert_eq!(hex::encode(abi.overloads("deployCreate2")[0].selector), "26307668");
    }

    #[test]
    fn both_creation_events_present() {
        let abi = createx().unwrap();
        let event = abi.event(CONTRACT_CREATION_WITH_SALT).unwrap();
        assert_eq!(
            hex::encode(event.topic),
            "b8fda7e00c6b06a2b54e58521bc5894fee35f1090e5a3bb6390bfe2b98b497f7"
        );
        assert!(abi.event(CONTRACT_CREATION).is_some());
    }
}
