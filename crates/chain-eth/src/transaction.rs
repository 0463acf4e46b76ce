use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_rlp::{Encodable, RlpEncodable};
use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{RecoveryId, Signature, SigningKey};
use zeroize::Zeroize;

use crate::error::EthError;
use crate::hash::{encode_hex, keccak256};

/// Gas limit of a plain value transfer.
pub const TRANSFER_GAS: u64 = 21_000;

/// Destination of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxKind {
    /// Message call to an account or contract.
    Call(Address),
    /// Contract creation; the data field is the init code.
    Create,
}

impl Encodable for TxKind {
    fn encode(&self, out: &mut dyn alloy_rlp::BufMut) {
        match self {
            Self::Call(address) => address.encode(out),
            // Creation encodes `to` as the empty string.
            Self::Create => out.put_u8(alloy_rlp::EMPTY_STRING_CODE),
        }
    }

    fn length(&self) -> usize {
        match self {
            Self::Call(address) => address.length(),
            Self::Create => 1,
        }
    }
}

/// An unsigned legacy Ethereum transaction, replay-protected by EIP-155.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub chain_id: u64,
    pub nonce: u64,
    /// Gas price in wei.
    pub gas_price: u128,
    pub gas_limit: u64,
    pub to: TxKind,
    /// Transfer value in wei.
    pub value: U256,
    /// Call data, or init code for a creation.
    pub data: Vec<u8>,
}

/// A signed transaction ready for `eth_sendRawTransaction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    /// RLP-encoded signed transaction bytes.
    pub raw_tx: Vec<u8>,
    /// Keccak-256 of `raw_tx`.
    pub tx_hash: B256,
}

impl SignedTransaction {
    /// `0x`-prefixed hex of the raw bytes, as the RPC expects it.
    pub fn raw_hex(&self) -> String {
        encode_hex(&self.raw_tx)
    }
}

impl LegacyTransaction {
    /// Plain value transfer with the standard 21 000 gas limit.
    pub fn transfer(chain_id: u64, nonce: u64, to: Address, value: U256, gas_price: u128) -> Self {
        Self {
            chain_id,
            nonce,
            gas_price,
            gas_limit: TRANSFER_GAS,
            to: TxKind::Call(to),
            value,
            data: Vec::new(),
        }
    }

    /// Zero-value call to a contract with prepared call data.
    pub fn contract_call(
        chain_id: u64,
        nonce: u64,
        contract: Address,
        data: Vec<u8>,
        gas_price: u128,
        gas_limit: u64,
    ) -> Self {
        Self {
            chain_id,
            nonce,
            gas_price,
            gas_limit,
            to: TxKind::Call(contract),
            value: U256::ZERO,
            data,
        }
    }

    /// Contract deployment carrying `init_code` (bytecode plus constructor args).
    pub fn contract_creation(
        chain_id: u64,
        nonce: u64,
        init_code: Vec<u8>,
        gas_price: u128,
        gas_limit: u64,
    ) -> Self {
        Self {
            chain_id,
            nonce,
            gas_price,
            gas_limit,
            to: TxKind::Create,
            value: U256::ZERO,
            data: init_code,
        }
    }

    /// EIP-155 signing payload:
    /// `rlp([nonce, gasPrice, gasLimit, to, value, data, chainId, 0, 0])`.
    pub fn encode_for_signing(&self) -> Vec<u8> {
        let fields = UnsignedTxFields {
            nonce: self.nonce,
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            to: self.to,
            value: self.value,
            data: Bytes::copy_from_slice(&self.data),
            chain_id: self.chain_id,
            empty_r: 0,
            empty_s: 0,
        };

        let mut out = Vec::with_capacity(fields.length());
        fields.encode(&mut out);
        out
    }

    /// Keccak-256 of [`Self::encode_for_signing`].
    pub fn signing_hash(&self) -> B256 {
        keccak256(self.encode_for_signing())
    }

    /// Signs with an already constructed key.
    ///
    /// `v = recovery_id + 35 + 2 * chain_id`.
    pub fn sign_with_key(&self, signing_key: &SigningKey) -> Result<SignedTransaction, EthError> {
        let hash = self.signing_hash();

        let (signature, recovery_id): (Signature, RecoveryId) = signing_key
            .sign_prehash(hash.as_slice())
            .map_err(|e| EthError::SigningError(e.to_string()))?;

        let v = self
            .chain_id
            .checked_mul(2)
            .and_then(|c| c.checked_add(35 + u64::from(recovery_id.to_byte())))
            .ok_or_else(|| EthError::SigningError(format!("chain id {} overflows v", self.chain_id)))?;

        let signed_fields = SignedTxFields {
            nonce: self.nonce,
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            to: self.to,
            value: self.value,
            data: Bytes::copy_from_slice(&self.data),
            v,
            r: U256::from_be_slice(&signature.r().to_bytes()),
            s: U256::from_be_slice(&signature.s().to_bytes()),
        };

        let mut raw_tx = Vec::with_capacity(signed_fields.length());
        signed_fields.encode(&mut raw_tx);

        let tx_hash = keccak256(&raw_tx);
        Ok(SignedTransaction { raw_tx, tx_hash })
    }
}

/// Signs a legacy transaction with a raw secp256k1 private key.
pub fn sign_transaction(
    tx: &LegacyTransaction,
    private_key: &[u8; 32],
) -> Result<SignedTransaction, EthError> {
    // Create the signing key (zeroized on drop).
    let mut key_bytes = *private_key;
    let signing_key = SigningKey::from_bytes((&key_bytes).into())
        .map_err(|e| EthError::InvalidPrivateKey(e.to_string()));
    key_bytes.zeroize();

    tx.sign_with_key(&signing_key?)
}

/// Address of a contract deployed by `sender` with the given account nonce:
/// the last 20 bytes of `keccak256(rlp([sender, nonce]))`.
pub fn create_address(sender: &Address, nonce: u64) -> Address {
    let fields = CreateFields {
        sender: *sender,
        nonce,
    };
    let mut out = Vec::with_capacity(fields.length());
    fields.encode(&mut out);

    let hash = keccak256(&out);
    Address::from_slice(&hash[12..])
}

// ---------------------------------------------------------------------------
// RLP-encodable structures
// ---------------------------------------------------------------------------

#[derive(RlpEncodable)]
struct UnsignedTxFields {
    nonce: u64,
    gas_price: u128,
    gas_limit: u64,
    to: TxKind,
    value: U256,
    data: Bytes,
    chain_id: u64,
    empty_r: u8,
    empty_s: u8,
}

#[derive(RlpEncodable)]
struct SignedTxFields {
    nonce: u64,
    gas_price: u128,
    gas_limit: u64,
    to: TxKind,
    value: U256,
    data: Bytes,
    v: u64,
    r: U256,
    s: U256,
}

#[derive(RlpEncodable)]
struct CreateFields {
    sender: Address,
    nonce: u64,
}
