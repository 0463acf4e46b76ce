use alloy_primitives::Address;
use k256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use k256::{EncodedPoint, PublicKey};

use crate::error::EthError;
use crate::hash::keccak256;

/// Length of an uncompressed SEC1 secp256k1 public key (`0x04 || X || Y`).
pub const UNCOMPRESSED_PUBKEY_LEN: usize = 65;

/// Length of a compressed SEC1 secp256k1 public key.
pub const COMPRESSED_PUBKEY_LEN: usize = 33;

/// Derives the Ethereum address of an uncompressed secp256k1 public key
/// (65 bytes, starting with 0x04).
///
/// The derivation takes the Keccak-256 hash of the 64-byte public key (without
/// the 0x04 prefix) and uses the last 20 bytes as the address.
pub fn address_from_uncompressed(pubkey: &[u8; UNCOMPRESSED_PUBKEY_LEN]) -> Result<Address, EthError> {
    if pubkey[0] != 0x04 {
        return Err(EthError::InvalidPublicKey(
            "uncompressed key must start with 0x04".into(),
        ));
    }

    let hash = keccak256(&pubkey[1..]);
    Ok(Address::from_slice(&hash[12..]))
}

/// Derives the Ethereum address of a SEC1-encoded secp256k1 public key.
///
/// Accepts the 65-byte uncompressed form directly. A 33-byte compressed key is
/// first decompressed via k256, then the standard derivation path is followed.
pub fn address_from_public_key(pubkey: &[u8]) -> Result<Address, EthError> {
    match pubkey.len() {
        UNCOMPRESSED_PUBKEY_LEN => {
            let mut key_65 = [0u8; UNCOMPRESSED_PUBKEY_LEN];
            key_65.copy_from_slice(pubkey);
            address_from_uncompressed(&key_65)
        }
        COMPRESSED_PUBKEY_LEN => {
            let key_65 = decompress_public_key(pubkey)?;
            address_from_uncompressed(&key_65)
        }
        other => Err(EthError::InvalidPublicKey(format!(
            "expected 33 or 65 bytes, got {other}"
        ))),
    }
}

/// Decompresses a 33-byte SEC1 key into its 65-byte uncompressed form.
fn decompress_public_key(compressed: &[u8]) -> Result<[u8; UNCOMPRESSED_PUBKEY_LEN], EthError> {
    let encoded = EncodedPoint::from_bytes(compressed).map_err(|e| {
        EthError::InvalidPublicKey(format!("invalid compressed key encoding: {e}"))
    })?;

    let pubkey: Option<PublicKey> = PublicKey::from_encoded_point(&encoded).into();
    let pubkey = pubkey.ok_or_else(|| {
        EthError::InvalidPublicKey("point is not on the secp256k1 curve".into())
    })?;

    let uncompressed = pubkey.to_encoded_point(false);
    let mut key_65 = [0u8; UNCOMPRESSED_PUBKEY_LEN];
    key_65.copy_from_slice(uncompressed.as_bytes());
    Ok(key_65)
}

/// Parses a 0x-prefixed hex address string into an [`Address`].
///
/// Case is not checked here; use [`validate_address`] when the EIP-55
/// checksum matters.
pub fn parse_address(address: &str) -> Result<Address, EthError> {
    let hex_str = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .ok_or_else(|| EthError::InvalidAddress("address must start with 0x".into()))?;

    if hex_str.len() != 40 {
        return Err(EthError::InvalidAddress(format!(
            "expected 40 hex characters, got {}",
            hex_str.len()
        )));
    }

    let bytes = hex::decode(hex_str)
        .map_err(|e| EthError::InvalidAddress(format!("invalid hex: {e}")))?;

    Ok(Address::from_slice(&bytes))
}

/// Renders an address in EIP-55 mixed-case form.
pub fn to_checksum(address: &Address) -> String {
    let lower = hex::encode(address.as_slice());
    apply_checksum(&lower)
}

/// Validates an Ethereum address string.
///
/// Checks that the address has the correct format (0x + 40 hex characters).
/// If the address contains mixed case, the EIP-55 checksum is verified.
pub fn validate_address(address: &str) -> Result<bool, EthError> {
    let hex_part = checked_hex_part(address)?;

    // All-lowercase or all-uppercase addresses carry no checksum.
    let is_all_lower = hex_part.chars().all(|c| !c.is_ascii_uppercase());
    let is_all_upper = hex_part.chars().all(|c| !c.is_ascii_lowercase());

    if is_all_lower || is_all_upper {
        return Ok(true);
    }

    let checksummed = apply_checksum(&hex_part.to_lowercase());
    Ok(checksummed[2..] == *hex_part)
}

/// Applies EIP-55 mixed-case checksum encoding to an Ethereum address.
///
/// The input may be in any case. Returns the checksummed version.
pub fn checksum_address(address: &str) -> Result<String, EthError> {
    let hex_part = checked_hex_part(address)?;
    Ok(apply_checksum(&hex_part.to_lowercase()))
}

fn checked_hex_part(address: &str) -> Result<&str, EthError> {
    let hex_part = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .ok_or_else(|| EthError::InvalidAddress("address must start with 0x".into()))?;

    if hex_part.len() != 40 {
        return Err(EthError::InvalidAddress(format!(
            "expected 40 hex characters, got {}",
            hex_part.len()
        )));
    }

    if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(EthError::InvalidAddress(
            "address contains non-hex characters".into(),
        ));
    }

    Ok(hex_part)
}

/// EIP-55 over a lowercase 40-character hex string (no prefix).
fn apply_checksum(lower_hex: &str) -> String {
    let hash = keccak256(lower_hex.as_bytes());

    let mut checksummed = String::with_capacity(42);
    checksummed.push_str("0x");

    for (i, c) in lower_hex.chars().enumerate() {
        let byte = hash[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };

        // Letters whose hash nibble is >= 8 are uppercased.
        if c.is_ascii_alphabetic() && nibble >= 8 {
            checksummed.push(c.to_ascii_uppercase());
        } else {
            checksummed.push(c);
        }
    }

    checksummed
}
