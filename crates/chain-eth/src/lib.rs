//! Ethereum primitives for the RPC probe.
//!
//! This crate provides:
//! - Ethereum address derivation from secp256k1 public keys (with EIP-55 checksums)
//! - Minimal ABI encoding/decoding, function selectors and event topics
//! - ERC-20 and Store contract call data and log decoding
//! - Legacy (EIP-155) transaction building and signing
//! - Wallet key handling, unit formatting and EVM network definitions

pub mod abi;
pub mod abi_json;
pub mod address;
pub mod chains;
pub mod erc20;
pub mod error;
pub mod event;
pub mod hash;
pub mod store;
pub mod transaction;
pub mod units;
pub mod wallet;

pub use alloy_primitives::{Address, B256, U256};
pub use error::EthError;
