//! ABIs and canonical addresses of widely deployed contracts.
//!
//! Every table is a list of human-readable declarations parsed through the
//! process-wide ABI cache, so repeated lookups share one descriptor.

pub mod createx;
pub mod entrypoint;
pub mod erc20;
pub mod history;
pub mod multicall3;
pub mod weth;

use std::sync::Arc;

use alloy_primitives::{address, hex, Address, U256};
use chaincontract_abi::{parse, AbiSource, ContractDescriptor};
use chaincontract_core::ContractError;

pub use createx::{createx, CREATEX_ABI};
pub use entrypoint::{entrypoint07, entrypoint08, ENTRYPOINT07_ABI, ENTRYPOINT08_ABI};
pub use erc20::{erc20, ERC20_ABI};
pub use multicall3::{multicall3, MULTICALL3_ABI};
pub use weth::{weth9, WETH9_ABI};

// ─── Well-known addresses ─────────────────────────────────────────────────────

/// Arachnid's deterministic deployment proxy (`salt ++ initcode` calldata).
pub const CREATE2_FACTORY: Address = address!("4e59b44847b379578588920ca78fbf26c0b4956c");

/// CreateX factory, same address on every chain it is deployed to.
pub const CREATEX_FACTORY: Address = address!("ba5Ed099633D3B313e4D5F7bdc1305d3c28ba5Ed");

pub const MULTICALL3_ADDRESS: Address = address!("cA11bde05977b3631167028862bE2a173976CA11");

/// The zero address; stands for the native currency in transfer helpers.
pub const ZERO_ADDRESS: Address = Address::ZERO;

// ─── Presigned deployments ────────────────────────────────────────────────────

/// A contract deployed by a keyless, presigned transaction.
///
/// The raw transaction is chain-agnostic; its sender must hold at least
/// `fee` wei before it can be broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresignedDeployment {
    pub name: &'static str,
    /// Sender recovered from the presigned transaction.
    pub deployer: Address,
    /// Address the transaction deploys to.
    pub contract: Address,
    pub fee: U256,
}

const fn wei(amount: u64) -> U256 {
    U256::from_limbs([amount, 0, 0, 0])
}

pub const PRESIGNED_CREATE2: PresignedDeployment = PresignedDeployment {
    name: "create2-factory",
    deployer: address!("3fab184622dc19b6109349b94811493bf2a45362"),
    contract: CREATE2_FACTORY,
    fee: wei(10_000_000_000_000_000),
};

/// Keyless transaction deploying [`CREATE2_FACTORY`] (`r = s = 0x22..22`).
pub const PRESIGNED_CREATE2_TX: &[u8] = &hex!(
    "f8a58085174876e800830186a08080b853604580600e600039806000f350fe7fffffffffffffffffffffffffffffff"
    "ffffffffffffffffffffffffffffffffe03601600081602082378035828234f58015156039578182fd5b8082525050"
    "506014600cf31ba02222222222222222222222222222222222222222222222222222222222222222a0222222222222"
    "2222222222222222222222222222222222222222222222222222"
);

pub const PRESIGNED_MULTICALL3: PresignedDeployment = PresignedDeployment {
    name: "multicall3",
    deployer: address!("05f32b3cc3888453ff71b01135b34ff8e41263f2"),
    contract: MULTICALL3_ADDRESS,
    fee: wei(100_000_000_000_000_000),
};

pub const PRESIGNED_CREATEX: PresignedDeployment = PresignedDeployment {
    name: "createx",
    deployer: address!("eD456e05CaAb11d66C4c797dD6c1D6f9A7F352b5"),
    contract: CREATEX_FACTORY,
    fee: wei(300_000_000_000_000_000),
};

/// Parse a builtin table through the global cache.
pub(crate) fn load(lines: &'static [&'static str]) -> Result<Arc<ContractDescriptor>, ContractError> {
    parse(AbiSource::HumanReadable(lines))
}
