use thiserror::Error;

/// Ethereum encoding, derivation and signing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EthError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("argument {index} too large: {len} bytes, at most {max} allowed")]
    ArgumentTooLarge { index: usize, len: usize, max: usize },

    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    #[error("argument mismatch: {0}")]
    ArgumentMismatch(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),

    #[error("signing error: {0}")]
    SigningError(String),

    #[error("unsupported chain: {0}")]
    UnsupportedChain(u64),
}
