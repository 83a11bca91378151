//! ERC-4337 EntryPoint v0.7 and v0.8.
//!
//! Both versions are deployed through the CREATE2 factory with the salts
//! below, which is how they land on the same address on every chain.

use std::sync::Arc;

use alloy_primitives::{address, b256, Address, B256};
use chaincontract_abi::ContractDescriptor;
use chaincontract_core::ContractError;

pub const ENTRYPOINT07_ADDRESS: Address = address!("0000000071727De22E5E9d8BAf0edAc6f37da032");
pub const ENTRYPOINT07_SALT: B256 =
    b256!("90d8084deab30c2a37c45e8d47f49f2f7965183cb6990a98943ef94940681de3");

pub const ENTRYPOINT08_ADDRESS: Address = address!("4337084D9E255Ff0702461CF8895CE9E3b5Ff108");
pub const ENTRYPOINT08_SALT: B256 =
    b256!("0a59dbff790c23c976a548690c27297883cc66b4c67024f9117b0238995e35e9");

pub const ENTRYPOINT07_ABI: &[&str] = &[
    "struct PackedUserOperation { address sender; uint256 nonce; bytes initCode; bytes callData; bytes32 accountGasLimits; uint256 preVerificationGas; bytes32 gasFees; bytes paymasterAndData; bytes signature; }",
    "function balanceOf(address account) view returns (uint256)",
    "function depositTo(address account) payable",
    "function withdrawTo(address withdrawAddress, uint256 withdrawAmount)",
    "function addStake(uint32 unstakeDelaySec) payable",
    "function unlockStake()",
    "function withdrawStake(address withdrawAddress)",
    "function getNonce(address sender, uint192 key) view returns (uint256 nonce)",
    "function incrementNonce(uint192 key)",
    "function getSenderAddress(bytes initCode)",
    "function getUserOpHash(PackedUserOperation userOp) view returns (bytes32)",
    "function handleOps(PackedUserOperation[] ops, address beneficiary)",
    "event AccountDeployed(bytes32 indexed userOpHash, address indexed sender, address factory, address paymaster)",
    "event BeforeExecution()",
    "event Deposited(address indexed account, uint256 totalDeposit)",
    "event Withdrawn(address indexed account, address withdrawAddress, uint256 amount)",
    "event UserOperationEvent(bytes32 indexed userOpHash, address indexed sender, address indexed paymaster, uint256 nonce, bool success, uint256 actualGasCost, uint256 actualGasUsed)",
    "event UserOperationRevertReason(bytes32 indexed userOpHash, address indexed sender, uint256 nonce, bytes revertReason)",
    "error FailedOp(uint256 opIndex, string reason)",
    "error FailedOpWithRevert(uint256 opIndex, string reason, bytes inner)",
    "error SenderAddressResult(address sender)",
    "error PostOpReverted(bytes returnData)",
    "receive() external payable",
];

pub const ENTRYPOINT08_ABI: &[&str] = &[
    "struct PackedUserOperation { address sender; uint256 nonce; bytes initCode; bytes callData; bytes32 accountGasLimits; uint256 preVerificationGas; bytes32 gasFees; bytes paymasterAndData; bytes signature; }",
    "function balanceOf(address account) view returns (uint256)",
    "function depositTo(address account) payable",
    "function withdrawTo(address withdrawAddress, uint256 withdrawAmount)",
    "function addStake(uint32 unstakeDelaySec) payable",
    "function unlockStake()",
    "function withdrawStake(address withdrawAddress)",
    "function getNonce(address sender, uint192 key) view returns (uint256 nonce)",
    "function incrementNonce(uint192 key)",
    "function getSenderAddress(bytes initCode)",
    "function getUserOpHash(PackedUserOperation userOp) view returns (bytes32)",
    "function handleOps(PackedUserOperation[] ops, address beneficiary)",
    "function senderCreator() view returns (address)",
    "function getDomainSeparatorV4() view returns (bytes32)",
    "function getPackedUserOpTypeHash() pure returns (bytes32)",
    "function eip712Domain() view returns (bytes1 fields, string name, string version, uint256 chainId, address verifyingContract, bytes32 salt, uint256[] extensions)",
    "event AccountDeployed(bytes32 indexed userOpHash, address indexed sender, address factory, address paymaster)",
    "event BeforeExecution()",
    "event Deposited(address indexed account, uint256 totalDeposit)",
    "event Withdrawn(address indexed account, address withdrawAddress, uint256 amount)",
    "event UserOperationEvent(bytes32 indexed userOpHash, address indexed sender, address indexed paymaster, uint256 nonce, bool success, uint256 actualGasCost, uint256 actualGasUsed)",
    "event UserOperationRevertReason(bytes32 indexed userOpHash, address indexed sender, uint256 nonce, bytes revertReason)",
    "event UserOperationPrefundTooLow(bytes32 indexed userOpHash, address indexed sender, uint256 nonce)",
    "error FailedOp(uint256 opIndex, string reason)",
    "error FailedOpWithRevert(uint256 opIndex, string reason, bytes inner)",
    "error SenderAddressResult(address sender)",
    "error PostOpReverted(bytes returnData)",
    "error Reentrancy()",
    "receive() external payable",
];

pub fn entrypoint07() -> Result<Arc<ContractDescriptor>, ContractError> {
    super::load(ENTRYPOINT07_ABI)
}

pub fn entrypoint08() -> Result<Arc<ContractDescriptor>, ContractError> {
    super::load(ENTRYPOINT08_ABI)
}
