//! ERC-20 with the EIP-2612 permit extension.

use std::sync::Arc;

use chaincontract_abi::ContractDescriptor;
use chaincontract_core::ContractError;

pub const ERC20_ABI: &[&str] = &[
    "function name() view returns (string)",
    "function symbol() view returns (string)",
    "function decimals() view returns (uint8)",
    "function totalSupply() view returns (uint256)",
    "function balanceOf(address account) view returns (uint256)",
    "function allowance(address owner, address spender) view returns (uint256)",
    "function transfer(address to, uint256 amount) returns (bool)",
    "function approve(address spender, uint256 amount) returns (bool)",
    "function transferFrom(address from, address to, uint256 amount) returns (bool)",
    "function permit(address owner, address spender, uint256 value, uint256 deadline, uint8 v, bytes32 r, bytes32 s)",
    "function nonces(address owner) view returns (uint256)",
    "function DOMAIN_SEPARATOR() view returns (bytes32)",
    "event Transfer(address indexed from, address indexed to, uint256 value)",
    "event Approval(address indexed owner, address indexed spender, uint256 value)",
];

pub fn erc20() -> Result<Arc<ContractDescriptor>, ContractError> {
    super::load(ERC20_ABI)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_selectors() {
        let abi = erc20().unwrap();
        let sel = |name: &str| hex::encode(abi.overloads(name)[0].selector);
        assert_eq!(sel("transfer"), "a9059cbb");
        assert_eq!(sel("balanceOf"), "70a08231");
        assert_eq!(sel("approve"), "095ea7b3");
        assert_eq!(sel("transferFrom"), "23b872dd");
        assert_eq!(sel("permit"), "d505accf");
        assert_eq!(
            hex::encode(abi.event("Approval").unwrap().topic),
            "8c5be1e5ebec7d5bd14f71427d1e84f3dd0314c0f7b2291e5b200ac8c7c3b925"
        );
    }
}
