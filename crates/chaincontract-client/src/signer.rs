//! Local transaction signing.
//!
//! A [`LocalAccount`] holds a secp256k1 key decrypted from a JSON keystore
//! or parsed from a raw private key. Missing nonce, gas limit, gas price
//! and chain id are filled from the node, the transaction is signed as an
//! EIP-155 legacy transaction and broadcast with `eth_sendRawTransaction`.

use std::path::Path;

use alloy_consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy_eips::eip2718::{Decodable2718, Encodable2718};
use alloy_primitives::{Address, Bytes, TxKind, B256};
use alloy_signer::{Signer, SignerSync};
use alloy_signer_local::PrivateKeySigner;
use chaincontract_abi::ContractDescriptor;
use chaincontract_core::{BlockTag, ChainTransport, ContractError, TransportError, TxRequest};
use tracing::{debug, info};

use crate::dispatcher::revert_or_transport;

type Result<T> = std::result::Result<T, ContractError>;

/// A signing key held in memory.
#[derive(Debug, Clone)]
pub struct LocalAccount {
    signer: PrivateKeySigner,
}

impl LocalAccount {
    /// Decrypt a Web3 Secret Storage (V3) keystore file.
    pub fn from_keystore(path: impl AsRef<Path>, password: &str) -> Result<Self> {
        let path = path.as_ref();
        let signer = PrivateKeySigner::decrypt_keystore(path, password)
            .map_err(|e| ContractError::signing(format!("cannot decrypt keystore {}: {e}", path.display())))?;
        let account = Self { signer };
        info!(address = %account.address(), keystore = %path.display(), "keystore unlocked");
        Ok(account)
    }

    /// Hex private key, with or without `0x`.
    pub fn from_private_key(key: &str) -> Result<Self> {
        let signer = key
            .trim()
            .parse::<PrivateKeySigner>()
            .map_err(|e| ContractError::signing(format!("invalid private key: {e}")))?;
        Ok(Self { signer })
    }

    pub fn address(&self) -> Address {
        Signer::address(&self.signer)
    }

    /// Complete `tx` for signing: sender, pending nonce and estimated gas
    /// limit. Fields already set are kept.
    pub async fn fill(
        &self,
        transport: &dyn ChainTransport,
        tx: &TxRequest,
    ) -> std::result::Result<TxRequest, TransportError> {
        let mut tx = tx.clone();
        let from = *tx.from.get_or_insert(self.address());
        if tx.nonce.is_none() {
            tx.nonce = Some(transport.get_transaction_count(from, BlockTag::Pending).await?);
        }
        if tx.gas.is_none() {
            tx.gas = Some(transport.estimate_gas(&tx).await?);
        }
        Ok(tx)
    }

    /// Sign a filled request and return the raw transaction bytes.
    ///
    /// `nonce` and `gas` must be set. A `from` other than this account is
    /// rejected.
    pub fn sign_transaction(&self, tx: &TxRequest, chain_id: u64, gas_price: u128) -> Result<Bytes> {
        if let Some(from) = tx.from.filter(|from| *from != self.address()) {
            return Err(ContractError::signing(format!(
                "sender {from} is not the signing account {}",
                self.address()
            )));
        }
        let nonce = tx.nonce.ok_or_else(|| ContractError::invalid("transaction to sign has no nonce"))?;
        let gas_limit = tx.gas.ok_or_else(|| ContractError::invalid("transaction to sign has no gas limit"))?;

        let unsigned = TxLegacy {
            chain_id: Some(chain_id),
            nonce,
            gas_price,
            gas_limit,
            to: tx.to.map_or(TxKind::Create, TxKind::Call),
            value: tx.value.unwrap_or_default(),
            input: tx.data.clone().unwrap_or_default(),
        };
        let signature = self
            .signer
            .sign_hash_sync(&unsigned.signature_hash())
            .map_err(|e| ContractError::signing(e.to_string()))?;
        let envelope = TxEnvelope::from(unsigned.into_signed(signature));
        debug!(tx_hash = %envelope.tx_hash(), nonce, chain_id, "transaction signed");
        Ok(envelope.encoded_2718().into())
    }

    /// Fill, sign and broadcast `tx`, returning its hash. Node errors,
    /// including a revert during gas estimation, are decoded against `abi`.
    pub async fn send_transaction(
        &self,
        transport: &dyn ChainTransport,
        tx: &TxRequest,
        abi: Option<&ContractDescriptor>,
    ) -> Result<B256> {
        let filled = self.fill(transport, tx).await.map_err(|e| revert_or_transport(e, abi))?;
        let chain_id = transport.chain_id().await?;
        let gas_price = transport.gas_price().await?;
        let raw = self.sign_transaction(&filled, chain_id, gas_price)?;
        transport.send_raw_transaction(&raw).await.map_err(|e| revert_or_transport(e, abi))
    }
}

/// Sender of a signed raw transaction, recovered from its signature.
pub fn recover_signer(raw: &[u8]) -> Result<Address> {
    let mut buf = raw;
    let envelope = TxEnvelope::decode_2718(&mut buf)
        .map_err(|e| ContractError::decoding(format!("invalid signed transaction: {e}")))?;
    envelope
        .recover_signer()
        .map_err(|e| ContractError::signing(format!("cannot recover transaction sender: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::{PRESIGNED_CREATE2, PRESIGNED_CREATE2_TX};
    use alloy_primitives::{address, U256};

    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const DEV_ADDRESS: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

    #[test]
    fn private_key_account() {
        assert_eq!(LocalAccount::from_private_key(DEV_KEY).unwrap().address(), DEV_ADDRESS);
        assert_eq!(LocalAccount::from_private_key(&DEV_KEY[2..]).unwrap().address(), DEV_ADDRESS);
        let zero = format!("0x{}", "00".repeat(32));
        for bad in ["not a key", zero.as_str()] {
            assert_eq!(LocalAccount::from_private_key(bad).unwrap_err().classification(), "Signing");
        }
    }

    #[test]
    fn signed_transaction_recovers_to_signer() {
        let account = LocalAccount::from_private_key(DEV_KEY).unwrap();
        let tx = TxRequest::new()
            .to(Address::repeat_byte(1))
            .value(U256::from(5u64))
            .gas(21_000)
            .nonce(3);
        let raw = account.sign_transaction(&tx, 31337, 1_000_000_000).unwrap();
        assert_eq!(recover_signer(&raw).unwrap(), DEV_ADDRESS);

        let TxEnvelope::Legacy(signed) = TxEnvelope::decode_2718(&mut &raw[..]).unwrap() else {
            panic!("expected a legacy transaction");
        };
        assert_eq!(signed.tx().chain_id, Some(31337));
        assert_eq!(signed.tx().nonce, 3);
        assert_eq!(signed.tx().to, TxKind::Call(Address::repeat_byte(1)));
    }

    #[test]
    fn signing_needs_nonce_gas_and_matching_sender() {
        let account = LocalAccount::from_private_key(DEV_KEY).unwrap();
        let missing_nonce = TxRequest::new().gas(21_000);
        assert_eq!(account.sign_transaction(&missing_nonce, 1, 1).unwrap_err().classification(), "InvalidArgument");
        let missing_gas = TxRequest::new().nonce(0);
        assert_eq!(account.sign_transaction(&missing_gas, 1, 1).unwrap_err().classification(), "InvalidArgument");
        let foreign = TxRequest::new().from(Address::repeat_byte(9)).nonce(0).gas(21_000);
        assert_eq!(account.sign_transaction(&foreign, 1, 1).unwrap_err().classification(), "Signing");
    }

    #[test]
    fn keyless_deployment_sender() {
        assert_eq!(recover_signer(PRESIGNED_CREATE2_TX).unwrap(), PRESIGNED_CREATE2.deployer);
        assert_eq!(recover_signer(&[0xf8]).unwrap_err().classification(), "DecodingError");
    }

    #[test]
    fn keystore_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let key = LocalAccount::from_private_key(DEV_KEY).unwrap().signer.to_bytes();
        PrivateKeySigner::encrypt_keystore(dir.path(), &mut rand::thread_rng(), key, "hunter2", Some("dev")).unwrap();

        let path = dir.path().join("dev");
        assert_eq!(LocalAccount::from_keystore(&path, "hunter2").unwrap().address(), DEV_ADDRESS);
        let err = LocalAccount::from_keystore(&path, "wrong").unwrap_err();
        assert_eq!(err.classification(), "Signing");
    }
}
