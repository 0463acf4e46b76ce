use std::fmt;

use alloy_primitives::Address;
use k256::ecdsa::SigningKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use rand_core::OsRng;
use zeroize::{Zeroize, Zeroizing};

use crate::address::{address_from_uncompressed, UNCOMPRESSED_PUBKEY_LEN};
use crate::error::EthError;
use crate::transaction::{LegacyTransaction, SignedTransaction};

/// A single secp256k1 account key.
///
/// The signing key is zeroized on drop (k256 `SigningKey` semantics) and never
/// shown by `Debug`.
#[derive(Clone)]
pub struct Wallet {
    signing_key: SigningKey,
    address: Address,
}

impl Wallet {
    /// Generates a fresh random key from the OS RNG.
    pub fn generate() -> Result<Self, EthError> {
        Self::from_signing_key(SigningKey::random(&mut OsRng))
    }

    /// Loads a key from 64 hex characters, with or without `0x`.
    pub fn from_hex(private_key_hex: &str) -> Result<Self, EthError> {
        let trimmed = private_key_hex.trim();
        let hex_str = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if hex_str.len() != 64 {
            return Err(EthError::InvalidPrivateKey(format!(
                "expected 64 hex characters, got {}",
                hex_str.len()
            )));
        }

        let mut bytes = [0u8; 32];
        hex::decode_to_slice(hex_str, &mut bytes)
            .map_err(|e| EthError::InvalidPrivateKey(format!("invalid hex: {e}")))?;

        let result = Self::from_bytes(&bytes);
        bytes.zeroize();
        result
    }

    /// Loads a key from its raw 32-byte scalar.
    pub fn from_bytes(private_key: &[u8; 32]) -> Result<Self, EthError> {
        let signing_key = SigningKey::from_bytes(private_key.into())
            .map_err(|e| EthError::InvalidPrivateKey(e.to_string()))?;
        Self::from_signing_key(signing_key)
    }

    fn from_signing_key(signing_key: SigningKey) -> Result<Self, EthError> {
        let point = signing_key.verifying_key().as_affine().to_encoded_point(false);
        let key_65: [u8; UNCOMPRESSED_PUBKEY_LEN] = point
            .as_bytes()
            .try_into()
            .map_err(|_| EthError::InvalidPublicKey("unexpected public key length".into()))?;

        let address = address_from_uncompressed(&key_65)?;
        Ok(Self {
            signing_key,
            address,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// 65-byte uncompressed SEC1 public key (`0x04 || X || Y`).
    pub fn public_key_uncompressed(&self) -> Vec<u8> {
        self.signing_key
            .verifying_key()
            .as_affine()
            .to_encoded_point(false)
            .as_bytes()
            .to_vec()
    }

    /// Lowercase hex of the private key without prefix, wiped on drop.
    pub fn private_key_hex(&self) -> Zeroizing<String> {
        let mut bytes = self.signing_key.to_bytes();
        let encoded = Zeroizing::new(hex::encode(bytes.as_slice()));
        bytes.as_mut_slice().zeroize();
        encoded
    }

    /// Signs a legacy transaction with this account's key.
    pub fn sign_legacy(&self, tx: &LegacyTransaction) -> Result<SignedTransaction, EthError> {
        tx.sign_with_key(&self.signing_key)
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}
