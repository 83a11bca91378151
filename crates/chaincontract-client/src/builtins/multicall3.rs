//! Multicall3, deployed at [`MULTICALL3_ADDRESS`](super::MULTICALL3_ADDRESS)
//! on most EVM chains.

use std::sync::Arc;

use chaincontract_abi::ContractDescriptor;
use chaincontract_core::ContractError;

pub const MULTICALL3_ABI: &[&str] = &[
    "struct Call { address target; bytes callData; }",
    "struct Call3 { address target; bool allowFailure; bytes callData; }",
    "struct Call3Value { address target; bool allowFailure; uint256 value; bytes callData; }",
    "struct Result { bool success; bytes returnData; }",
    "function aggregate(Call[] calls) payable returns (uint256 blockNumber, bytes[] returnData)",
    "function aggregate3(Call3[] calls) payable returns (Result[] returnData)",
    "function aggregate3Value(Call3Value[] calls) payable returns (Result[] returnData)",
    "function blockAndAggregate(Call[] calls) payable returns (uint256 blockNumber, bytes32 blockHash, Result[] returnData)",
    "function tryAggregate(bool requireSuccess, Call[] calls) payable returns (Result[] returnData)",
    "function tryBlockAndAggregate(bool requireSuccess, Call[] calls) payable returns (uint256 blockNumber, bytes32 blockHash, Result[] returnData)",
    "function getBasefee() view returns (uint256 basefee)",
    "function getBlockHash(uint256 blockNumber) view returns (bytes32 blockHash)",
    "function getBlockNumber() view returns (uint256 blockNumber)",
    "function getChainId() view returns (uint256 chainid)",
    "function getCurrentBlockCoinbase() view returns (address coinbase)",
    "function getCurrentBlockGasLimit() view returns (uint256 gaslimit)",
    "function getCurrentBlockTimestamp() view returns (uint256 timestamp)",
    "function getEthBalance(address addr) view returns (uint256 balance)",
    "function getLastBlockHash() view returns (bytes32 blockHash)",
];

pub fn multicall3() -> Result<Arc<ContractDescriptor>, ContractError> {
    super::load(MULTICALL3_ABI)
}
