use alloy_primitives::{Address, B256, U256};

use crate::abi::{self, encode_function_call, AbiParam};
use crate::error::EthError;
use crate::event::topic_matches;

/// ERC-20 ABI subset (functions and events used by the probe).
pub const ERC20_ABI_JSON: &str = include_str!("../contracts/ERC20.abi.json");

/// Function selector for `transfer(address,uint256)`: `0xa9059cbb`.
pub const TRANSFER_SELECTOR: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];

/// Function selector for `balanceOf(address)`: `0x70a08231`.
pub const BALANCE_OF_SELECTOR: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];

/// Function selector for `approve(address,uint256)`: `0x095ea7b3`.
pub const APPROVE_SELECTOR: [u8; 4] = [0x09, 0x5e, 0xa7, 0xb3];

/// Function selector for `name()`: `0x06fdde03`.
pub const NAME_SELECTOR: [u8; 4] = [0x06, 0xfd, 0xde, 0x03];

/// Function selector for `symbol()`: `0x95d89b41`.
pub const SYMBOL_SELECTOR: [u8; 4] = [0x95, 0xd8, 0x9b, 0x41];

/// Function selector for `decimals()`: `0x313ce567`.
pub const DECIMALS_SELECTOR: [u8; 4] = [0x31, 0x3c, 0xe5, 0x67];

/// Function selector for `totalSupply()`: `0x18160ddd`.
pub const TOTAL_SUPPLY_SELECTOR: [u8; 4] = [0x18, 0x16, 0x0d, 0xdd];

pub const TRANSFER_EVENT: &str = "Transfer(address,address,uint256)";
pub const APPROVAL_EVENT: &str = "Approval(address,address,uint256)";

/// Encodes an ERC-20 `transfer(address,uint256)` call.
///
/// # Returns
///
/// The complete calldata (4-byte selector + 64 bytes of ABI-encoded params).
pub fn encode_transfer(to: Address, amount: U256) -> Result<Vec<u8>, EthError> {
    let params = [AbiParam::Address(to), AbiParam::uint(amount)];
    encode_function_call(TRANSFER_SELECTOR, &params)
}

/// Encodes an ERC-20 `balanceOf(address)` call.
///
/// # Returns
///
/// The complete calldata (4-byte selector + 32 bytes of ABI-encoded address).
pub fn encode_balance_of(owner: Address) -> Result<Vec<u8>, EthError> {
    encode_function_call(BALANCE_OF_SELECTOR, &[AbiParam::Address(owner)])
}

/// Encodes an ERC-20 `approve(address,uint256)` call.
pub fn encode_approve(spender: Address, amount: U256) -> Result<Vec<u8>, EthError> {
    let params = [AbiParam::Address(spender), AbiParam::uint(amount)];
    encode_function_call(APPROVE_SELECTOR, &params)
}

/// Call data for `name()`.
pub fn encode_name() -> Vec<u8> {
    NAME_SELECTOR.to_vec()
}

/// Call data for `symbol()`.
pub fn encode_symbol() -> Vec<u8> {
    SYMBOL_SELECTOR.to_vec()
}

/// Call data for `decimals()`.
pub fn encode_decimals() -> Vec<u8> {
    DECIMALS_SELECTOR.to_vec()
}

/// Call data for `totalSupply()`.
pub fn encode_total_supply() -> Vec<u8> {
    TOTAL_SUPPLY_SELECTOR.to_vec()
}

/// Decodes the `uint8` returned by `decimals()`.
pub fn decode_decimals(data: &[u8]) -> Result<u8, EthError> {
    let word = abi::word_at(data, 0)?;
    if word[..31].iter().any(|&b| b != 0) {
        return Err(EthError::DecodingError("decimals does not fit in uint8".into()));
    }
    Ok(word[31])
}

/// A decoded `Transfer` log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferEvent {
    pub from: Address,
    pub to: Address,
    pub value: U256,
}

/// A decoded `Approval` log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalEvent {
    pub owner: Address,
    pub spender: Address,
    pub value: U256,
}

/// Decodes a `Transfer` log: indexed addresses from topics 1 and 2, the
/// amount from the data word.
pub fn decode_transfer(topics: &[B256], data: &[u8]) -> Result<TransferEvent, EthError> {
    let (from, to, value) = decode_indexed_pair(TRANSFER_EVENT, topics, data)?;
    Ok(TransferEvent { from, to, value })
}

/// Decodes an `Approval` log, laid out like `Transfer`.
pub fn decode_approval(topics: &[B256], data: &[u8]) -> Result<ApprovalEvent, EthError> {
    let (owner, spender, value) = decode_indexed_pair(APPROVAL_EVENT, topics, data)?;
    Ok(ApprovalEvent {
        owner,
        spender,
        value,
    })
}

fn decode_indexed_pair(
    signature: &str,
    topics: &[B256],
    data: &[u8],
) -> Result<(Address, Address, U256), EthError> {
    match topics.first() {
        Some(topic) if topic_matches(topic, signature) => {}
        _ => {
            return Err(EthError::DecodingError(format!(
                "log is not a {signature} event"
            )))
        }
    }

    if topics.len() < 3 {
        return Err(EthError::DecodingError(format!(
            "{signature} needs 3 topics, got {}",
            topics.len()
        )));
    }

    let first = abi::address_from_word(&topics[1].0);
    let second = abi::address_from_word(&topics[2].0);
    let value = abi::decode_uint256(data)?;
    Ok((first, second, value))
}
