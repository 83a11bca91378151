//! WETH9. There is no universal address; bind one with `Contract::new`.

use std::sync::Arc;

use chaincontract_abi::ContractDescriptor;
use chaincontract_core::ContractError;

pub const WETH9_ABI: &[&str] = &[
    "function name() view returns (string)",
    "function symbol() view returns (string)",
    "function decimals() view returns (uint8)",
    "function totalSupply() view returns (uint256)",
    "function balanceOf(address) view returns (uint256)",
    "function allowance(address, address) view returns (uint256)",
    "function approve(address guy, uint256 wad) returns (bool)",
    "function transfer(address dst, uint256 wad) returns (bool)",
    "function transferFrom(address src, address dst, uint256 wad) returns (bool)",
    "function deposit() payable",
    "function withdraw(uint256 wad)",
    "event Approval(address indexed src, address indexed guy, uint256 wad)",
    "event Transfer(address indexed src, address indexed dst, uint256 wad)",
    "event Deposit(address indexed dst, uint256 wad)",
    "event Withdrawal(address indexed src, uint256 wad)",
    "fallback() external payable",
];

pub fn weth9() -> Result<Arc<ContractDescriptor>, ContractError> {
    super::load(WETH9_ABI)
}
