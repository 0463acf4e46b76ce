//! Minimal ABI encoding for EVM function calls.
//!
//! This module provides just enough of the contract ABI to build ERC-20 and
//! Store call data without pulling in a full ABI parser: static `address`,
//! `bool`, `uint<N>` and `bytes<N>` words plus the dynamic `string`/`bytes`
//! head/tail layout. Arrays, tuples and signed integers are rejected with
//! [`EthError::UnsupportedType`].

use std::fmt;

use alloy_primitives::{Address, U256};

use crate::error::EthError;
use crate::hash::keccak256;

/// Size of one ABI word.
pub const WORD: usize = 32;

/// A canonical ABI parameter type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Address,
    Bool,
    /// `uint<N>`, with N the bit width.
    Uint(usize),
    /// `bytes<N>`, with N the byte width.
    FixedBytes(usize),
    String,
    Bytes,
}

impl ParamType {
    /// Parses a canonical type name such as `uint256` or `bytes32`.
    pub fn parse(name: &str) -> Result<Self, EthError> {
        let unsupported = || EthError::UnsupportedType(name.to_string());

        if name.contains('[') || name.contains('(') {
            return Err(unsupported());
        }

        match name {
            "address" => return Ok(Self::Address),
            "bool" => return Ok(Self::Bool),
            "string" => return Ok(Self::String),
            "bytes" => return Ok(Self::Bytes),
            "uint" => return Ok(Self::Uint(256)),
            _ => {}
        }

        if let Some(bits) = name.strip_prefix("uint") {
            let bits: usize = bits.parse().map_err(|_| unsupported())?;
            if bits == 0 || bits > 256 || bits % 8 != 0 {
                return Err(unsupported());
            }
            return Ok(Self::Uint(bits));
        }

        if let Some(len) = name.strip_prefix("bytes") {
            let len: usize = len.parse().map_err(|_| unsupported())?;
            if len == 0 || len > WORD {
                return Err(unsupported());
            }
            return Ok(Self::FixedBytes(len));
        }

        Err(unsupported())
    }

    /// Dynamic types are encoded out of line (head holds an offset).
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::String | Self::Bytes)
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address => f.write_str("address"),
            Self::Bool => f.write_str("bool"),
            Self::Uint(bits) => write!(f, "uint{bits}"),
            Self::FixedBytes(len) => write!(f, "bytes{len}"),
            Self::String => f.write_str("string"),
            Self::Bytes => f.write_str("bytes"),
        }
    }
}

/// A parsed `name(type1,type2,...)` function or event signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    pub name: String,
    pub inputs: Vec<ParamType>,
}

impl FunctionSignature {
    /// Parses a canonical signature. Whitespace and argument names are not
    /// allowed, since the selector hashes the exact text.
    pub fn parse(signature: &str) -> Result<Self, EthError> {
        let invalid = |why: &str| EthError::InvalidSignature(format!("{signature:?}: {why}"));

        if signature.chars().any(char::is_whitespace) {
            return Err(invalid("whitespace is not allowed"));
        }

        let open = signature.find('(').ok_or_else(|| invalid("missing '('"))?;
        let inner = signature[open + 1..]
            .strip_suffix(')')
            .ok_or_else(|| invalid("missing closing ')'"))?;

        let name = &signature[..open];
        if name.is_empty() {
            return Err(invalid("empty name"));
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$') {
            return Err(invalid("name contains invalid characters"));
        }

        let inputs = if inner.is_empty() {
            Vec::new()
        } else {
            inner
                .split(',')
                .map(ParamType::parse)
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(Self {
            name: name.to_string(),
            inputs,
        })
    }

    /// Canonical text form, e.g. `setItem(bytes32,bytes32)`.
    pub fn canonical(&self) -> String {
        let types: Vec<String> = self.inputs.iter().map(ToString::to_string).collect();
        format!("{}({})", self.name, types.join(","))
    }

    /// 4-byte selector of the canonical form.
    pub fn selector(&self) -> [u8; 4] {
        selector(&self.canonical())
    }
}

/// Computes a function selector: the first 4 bytes of `keccak256(signature)`.
///
/// The signature text is hashed verbatim.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash[..4]);
    out
}

/// A single ABI-encoded parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiParam {
    /// A 20-byte Ethereum address, left-padded to 32 bytes.
    Address(Address),
    /// An unsigned integer as big-endian bytes (any length up to 32),
    /// left-padded to 32 bytes.
    Uint(Vec<u8>),
    Bool(bool),
    /// A fixed-size `bytes<N>` value, right-padded to 32 bytes.
    FixedBytes(Vec<u8>),
    /// Dynamic UTF-8 string.
    String(String),
    /// Dynamic byte string.
    Bytes(Vec<u8>),
}

impl AbiParam {
    /// A `uint256` from a [`U256`].
    pub fn uint(value: U256) -> Self {
        Self::Uint(value.to_be_bytes::<32>().to_vec())
    }

    /// A `bytes32` word.
    pub fn bytes32(word: [u8; 32]) -> Self {
        Self::FixedBytes(word.to_vec())
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Address(_) => "address",
            Self::Uint(_) => "uint",
            Self::Bool(_) => "bool",
            Self::FixedBytes(_) => "fixed bytes",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
        }
    }
}

impl From<Address> for AbiParam {
    fn from(address: Address) -> Self {
        Self::Address(address)
    }
}

impl From<U256> for AbiParam {
    fn from(value: U256) -> Self {
        Self::uint(value)
    }
}

impl From<u64> for AbiParam {
    fn from(value: u64) -> Self {
        Self::Uint(value.to_be_bytes().to_vec())
    }
}

impl From<bool> for AbiParam {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Left-pads `bytes` with zeros to a 32-byte word.
pub fn left_pad_32(bytes: &[u8]) -> Result<[u8; 32], EthError> {
    left_pad(0, bytes)
}

fn left_pad(index: usize, bytes: &[u8]) -> Result<[u8; 32], EthError> {
    if bytes.len() > WORD {
        return Err(EthError::ArgumentTooLarge {
            index,
            len: bytes.len(),
            max: WORD,
        });
    }
    let mut word = [0u8; WORD];
    word[WORD - bytes.len()..].copy_from_slice(bytes);
    Ok(word)
}

fn right_pad(index: usize, bytes: &[u8]) -> Result<[u8; 32], EthError> {
    if bytes.len() > WORD {
        return Err(EthError::ArgumentTooLarge {
            index,
            len: bytes.len(),
            max: WORD,
        });
    }
    let mut word = [0u8; WORD];
    word[..bytes.len()].copy_from_slice(bytes);
    Ok(word)
}

/// Encodes a static parameter as a single 32-byte word.
fn encode_word(index: usize, param: &AbiParam) -> Result<[u8; 32], EthError> {
    match param {
        AbiParam::Address(addr) => left_pad(index, addr.as_slice()),
        AbiParam::Uint(value) => left_pad(index, value),
        AbiParam::Bool(flag) => {
            let mut word = [0u8; WORD];
            word[WORD - 1] = u8::from(*flag);
            Ok(word)
        }
        AbiParam::FixedBytes(bytes) => right_pad(index, bytes),
        AbiParam::String(_) | AbiParam::Bytes(_) => Err(EthError::EncodingError(format!(
            "argument {index} is dynamic and has no single-word encoding"
        ))),
    }
}

/// Encodes the tail of a dynamic value: length word, then data right-padded
/// to a multiple of 32 bytes.
fn encode_tail(data: &[u8]) -> Vec<u8> {
    let padded_len = data.len().div_ceil(WORD) * WORD;
    let mut out = Vec::with_capacity(WORD + padded_len);
    out.extend_from_slice(&U256::from(data.len()).to_be_bytes::<32>());
    out.extend_from_slice(data);
    out.resize(WORD + padded_len, 0);
    out
}

/// Encodes a parameter list with the standard head/tail layout.
///
/// For purely static lists this is simply one 32-byte word per parameter.
pub fn encode_params(params: &[AbiParam]) -> Result<Vec<u8>, EthError> {
    let head_len = params.len() * WORD;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for (index, param) in params.iter().enumerate() {
        match param {
            AbiParam::String(text) => {
                head.extend_from_slice(&U256::from(head_len + tail.len()).to_be_bytes::<32>());
                tail.extend_from_slice(&encode_tail(text.as_bytes()));
            }
            AbiParam::Bytes(data) => {
                head.extend_from_slice(&U256::from(head_len + tail.len()).to_be_bytes::<32>());
                tail.extend_from_slice(&encode_tail(data));
            }
            _ => head.extend_from_slice(&encode_word(index, param)?),
        }
    }

    head.extend_from_slice(&tail);
    Ok(head)
}

/// Encodes a function call with the given 4-byte selector and ABI parameters.
///
/// The output is `selector || encode(params[0]) || encode(params[1]) || ...`
/// where each static parameter is encoded as a 32-byte ABI word.
///
/// # Parameters
///
/// - `selector`: The 4-byte function selector (e.g., `0xa9059cbb` for ERC-20
///   `transfer`).
/// - `params`: Slice of [`AbiParam`] values to encode after the selector.
pub fn encode_function_call(selector: [u8; 4], params: &[AbiParam]) -> Result<Vec<u8>, EthError> {
    let encoded = encode_params(params)?;
    let mut data = Vec::with_capacity(4 + encoded.len());
    data.extend_from_slice(&selector);
    data.extend_from_slice(&encoded);
    Ok(data)
}

/// Encodes a call from its textual signature, checking every argument
/// against the declared parameter type.
pub fn encode_call(signature: &str, params: &[AbiParam]) -> Result<Vec<u8>, EthError> {
    let parsed = FunctionSignature::parse(signature)?;
    check_params(&parsed.inputs, params)?;
    encode_function_call(parsed.selector(), params)
}

/// Builds contract creation data: `bytecode || encode(constructor args)`.
pub fn encode_deployment(bytecode: &[u8], constructor_args: &[AbiParam]) -> Result<Vec<u8>, EthError> {
    let encoded = encode_params(constructor_args)?;
    let mut data = Vec::with_capacity(bytecode.len() + encoded.len());
    data.extend_from_slice(bytecode);
    data.extend_from_slice(&encoded);
    Ok(data)
}

/// Checks arity, kinds and widths of `params` against `types`.
pub fn check_params(types: &[ParamType], params: &[AbiParam]) -> Result<(), EthError> {
    if types.len() != params.len() {
        return Err(EthError::ArgumentMismatch(format!(
            "expected {} arguments, got {}",
            types.len(),
            params.len()
        )));
    }

    for (index, (ty, param)) in types.iter().zip(params).enumerate() {
        match (ty, param) {
            (ParamType::Address, AbiParam::Address(_))
            | (ParamType::Bool, AbiParam::Bool(_))
            | (ParamType::String, AbiParam::String(_))
            | (ParamType::Bytes, AbiParam::Bytes(_)) => {}
            (ParamType::Uint(bits), AbiParam::Uint(value)) => {
                if value.len() > WORD {
                    return Err(EthError::ArgumentTooLarge {
                        index,
                        len: value.len(),
                        max: WORD,
                    });
                }
                let significant = value.iter().skip_while(|&&b| b == 0).count();
                if significant > bits / 8 {
                    return Err(EthError::ArgumentTooLarge {
                        index,
                        len: significant,
                        max: bits / 8,
                    });
                }
            }
            (ParamType::FixedBytes(len), AbiParam::FixedBytes(value)) => {
                if value.len() > *len {
                    return Err(EthError::ArgumentTooLarge {
                        index,
                        len: value.len(),
                        max: *len,
                    });
                }
            }
            _ => {
                return Err(EthError::ArgumentMismatch(format!(
                    "argument {index}: expected {ty}, got {}",
                    param.kind()
                )));
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Returns the 32-byte word at `index` (0-based) of ABI-encoded data.
pub fn word_at(data: &[u8], index: usize) -> Result<[u8; 32], EthError> {
    let out_of_range = || EthError::DecodingError(format!("word {index} is out of range"));
    let start = index.checked_mul(WORD).ok_or_else(out_of_range)?;
    let end = start.checked_add(WORD).ok_or_else(out_of_range)?;
    if data.len() < end {
        return Err(EthError::DecodingError(format!(
            "expected at least {end} bytes for word {index}, got {}",
            data.len()
        )));
    }

    let mut word = [0u8; WORD];
    word.copy_from_slice(&data[start..end]);
    Ok(word)
}

/// Decodes a single uint256 return value from ABI-encoded data.
///
/// Useful for decoding the return value of `balanceOf` and similar view
/// functions that return a single uint256.
pub fn decode_uint256(data: &[u8]) -> Result<U256, EthError> {
    Ok(U256::from_be_bytes(word_at(data, 0)?))
}

/// Decodes a single `bytes32` return value.
pub fn decode_bytes32(data: &[u8]) -> Result<[u8; 32], EthError> {
    word_at(data, 0)
}

/// Decodes a single `bool` return value.
pub fn decode_bool(data: &[u8]) -> Result<bool, EthError> {
    let word = word_at(data, 0)?;
    match word {
        w if w == [0u8; WORD] => Ok(false),
        w if w[..WORD - 1].iter().all(|&b| b == 0) && w[WORD - 1] == 1 => Ok(true),
        _ => Err(EthError::DecodingError("bool word is neither 0 nor 1".into())),
    }
}

/// Takes the low 20 bytes of a word as an address (topics, return values).
pub fn address_from_word(word: &[u8; 32]) -> Address {
    Address::from_slice(&word[12..])
}

/// Decodes a single dynamic `bytes` return value.
pub fn decode_bytes(data: &[u8]) -> Result<Vec<u8>, EthError> {
    let offset = word_to_usize(&word_at(data, 0)?)?;
    if offset % WORD != 0 {
        return Err(EthError::DecodingError(format!(
            "dynamic offset {offset} is not word aligned"
        )));
    }

    let start = match offset.checked_add(WORD) {
        Some(start) if start <= data.len() => start,
        _ => {
            return Err(EthError::DecodingError(format!(
                "dynamic offset {offset} is past the end of {} bytes",
                data.len()
            )))
        }
    };
    let len = word_to_usize(&word_at(data, offset / WORD)?)?;
    let end = start
        .checked_add(len)
        .ok_or_else(|| EthError::DecodingError("dynamic length overflows".into()))?;

    if data.len() < end {
        return Err(EthError::DecodingError(format!(
            "dynamic value needs {end} bytes, got {}",
            data.len()
        )));
    }

    Ok(data[start..end].to_vec())
}

/// Decodes a single dynamic `string` return value.
pub fn decode_string(data: &[u8]) -> Result<String, EthError> {
    let bytes = decode_bytes(data)?;
    String::from_utf8(bytes).map_err(|e| EthError::DecodingError(format!("invalid utf-8: {e}")))
}

fn word_to_usize(word: &[u8; 32]) -> Result<usize, EthError> {
    if word[..24].iter().any(|&b| b != 0) {
        return Err(EthError::DecodingError("length or offset out of range".into()));
    }
    let mut low = [0u8; 8];
    low.copy_from_slice(&word[24..]);
    usize::try_from(u64::from_be_bytes(low))
        .map_err(|_| EthError::DecodingError("length or offset out of range".into()))
}
