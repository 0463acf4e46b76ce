//! Bindings for the Store key/value contract used by the probe workflows.
//!
//! The contract exposes `setItem(bytes32,bytes32)`, the public mapping getter
//! `items(bytes32)` and a `version()` string set by the constructor. Every
//! `setItem` emits `ItemSet(bytes32,bytes32)` with both words in the log data.

use alloy_primitives::B256;

use crate::abi::{self, encode_deployment, encode_function_call, AbiParam, WORD};
use crate::error::EthError;
use crate::event::topic_matches;

/// Store ABI, embedded at compile time.
pub const STORE_ABI_JSON: &str = include_str!("../contracts/Store.abi.json");

/// Function selector for `setItem(bytes32,bytes32)`: `0xf56256c7`.
pub const SET_ITEM_SELECTOR: [u8; 4] = [0xf5, 0x62, 0x56, 0xc7];

/// Function selector for `items(bytes32)`: `0x48f343f3`.
pub const ITEMS_SELECTOR: [u8; 4] = [0x48, 0xf3, 0x43, 0xf3];

/// Function selector for `version()`: `0x54fd4d50`.
pub const VERSION_SELECTOR: [u8; 4] = [0x54, 0xfd, 0x4d, 0x50];

pub const ITEM_SET_EVENT: &str = "ItemSet(bytes32,bytes32)";

/// A decoded `ItemSet` log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemSet {
    pub key: B256,
    pub value: B256,
}

/// Right-pads a short text key or value into a `bytes32` word.
///
/// Text longer than 32 bytes is rejected rather than truncated.
pub fn bytes32_from_str(text: &str) -> Result<B256, EthError> {
    let bytes = text.as_bytes();
    if bytes.len() > WORD {
        return Err(EthError::ArgumentTooLarge {
            index: 0,
            len: bytes.len(),
            max: WORD,
        });
    }

    let mut word = [0u8; WORD];
    word[..bytes.len()].copy_from_slice(bytes);
    Ok(B256::from(word))
}

/// Encodes `setItem(key, value)`: 68 bytes, selector first.
pub fn encode_set_item(key: B256, value: B256) -> Result<Vec<u8>, EthError> {
    encode_function_call(
        SET_ITEM_SELECTOR,
        &[AbiParam::bytes32(key.0), AbiParam::bytes32(value.0)],
    )
}

/// Encodes the `items(key)` getter.
pub fn encode_items(key: B256) -> Result<Vec<u8>, EthError> {
    encode_function_call(ITEMS_SELECTOR, &[AbiParam::bytes32(key.0)])
}

/// Call data for `version()`.
pub fn encode_version() -> Vec<u8> {
    VERSION_SELECTOR.to_vec()
}

/// Creation payload: compiled bytecode followed by the encoded
/// `constructor(string _version)` argument.
pub fn deployment_data(bytecode: &[u8], version: &str) -> Result<Vec<u8>, EthError> {
    if bytecode.is_empty() {
        return Err(EthError::EncodingError("store bytecode is empty".into()));
    }
    encode_deployment(bytecode, &[AbiParam::String(version.to_string())])
}

/// Decodes the word returned by `items(key)`.
pub fn decode_items(data: &[u8]) -> Result<B256, EthError> {
    abi::decode_bytes32(data).map(B256::from)
}

/// Decodes the string returned by `version()`.
pub fn decode_version(data: &[u8]) -> Result<String, EthError> {
    abi::decode_string(data)
}

/// Decodes an `ItemSet` log. Neither parameter is indexed, so the topic list
/// holds only the event topic and the data holds two words.
pub fn decode_item_set(topics: &[B256], data: &[u8]) -> Result<ItemSet, EthError> {
    match topics.first() {
        Some(topic) if topic_matches(topic, ITEM_SET_EVENT) => {}
        _ => {
            return Err(EthError::DecodingError(format!(
                "log is not an {ITEM_SET_EVENT} event"
            )))
        }
    }

    Ok(ItemSet {
        key: B256::from(abi::word_at(data, 0)?),
        value: B256::from(abi::word_at(data, 1)?),
    })
}
