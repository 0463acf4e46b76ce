use alloy_primitives::B256;
use sha3::{Digest, Keccak256};

use crate::error::EthError;

/// Keccak-256 digest of `data` (the pre-standard SHA-3 variant Ethereum uses).
pub fn keccak256(data: impl AsRef<[u8]>) -> B256 {
    let digest = Keccak256::digest(data.as_ref());
    B256::from_slice(&digest)
}

/// Decodes a hex string with an optional `0x`/`0X` prefix.
///
/// Surrounding whitespace is ignored, so artifact files with a trailing
/// newline decode cleanly.
pub fn decode_hex(text: &str) -> Result<Vec<u8>, EthError> {
    let trimmed = text.trim();
    let hex_str = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    hex::decode(hex_str).map_err(|e| EthError::InvalidHex(e.to_string()))
}

/// Encodes bytes as a lowercase `0x`-prefixed hex string.
pub fn encode_hex(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(bytes.as_ref()))
}
