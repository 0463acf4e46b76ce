use alloy_primitives::{Address, B256};
use serde::Serialize;

use crate::error::EthError;
use crate::hash::encode_hex;

/// Definition of a network the probe knows how to talk about.
///
/// RPC endpoints are deliberately absent: they come from configuration.
#[derive(Debug, Clone, Serialize)]
pub struct EvmChain {
    pub chain_id: u64,
    pub name: &'static str,
    pub symbol: &'static str,
    pub decimals: u8,
    pub explorer_url: Option<&'static str>,
    pub is_testnet: bool,
}

/// Ethereum Mainnet (chain ID 1).
pub const ETHEREUM: EvmChain = EvmChain {
    chain_id: 1,
    name: "Ethereum",
    symbol: "ETH",
    decimals: 18,
    explorer_url: Some("https://etherscan.io"),
    is_testnet: false,
};

/// Sepolia Testnet (chain ID 11155111).
pub const SEPOLIA: EvmChain = EvmChain {
    chain_id: 11155111,
    name: "Sepolia",
    symbol: "ETH",
    decimals: 18,
    explorer_url: Some("https://sepolia.etherscan.io"),
    is_testnet: true,
};

/// BNB Smart Chain (chain ID 56).
pub const BSC: EvmChain = EvmChain {
    chain_id: 56,
    name: "BNB Smart Chain",
    symbol: "BNB",
    decimals: 18,
    explorer_url: Some("https://bscscan.com"),
    is_testnet: false,
};

/// BNB Smart Chain Testnet (chain ID 97).
pub const BSC_TESTNET: EvmChain = EvmChain {
    chain_id: 97,
    name: "BSC Testnet",
    symbol: "tBNB",
    decimals: 18,
    explorer_url: Some("https://testnet.bscscan.com"),
    is_testnet: true,
};

/// Local Hardhat / Anvil dev node (chain ID 31337).
pub const HARDHAT: EvmChain = EvmChain {
    chain_id: 31337,
    name: "Hardhat",
    symbol: "ETH",
    decimals: 18,
    explorer_url: None,
    is_testnet: true,
};

const ALL_CHAINS: &[&EvmChain] = &[&ETHEREUM, &SEPOLIA, &BSC, &BSC_TESTNET, &HARDHAT];

/// Returns the chain definition for a given chain ID, or `None` if unknown.
pub fn get_chain(chain_id: u64) -> Option<&'static EvmChain> {
    ALL_CHAINS
        .iter()
        .find(|c| c.chain_id == chain_id)
        .copied()
}

/// Like [`get_chain`], but an unknown ID is an error.
pub fn require_chain(chain_id: u64) -> Result<&'static EvmChain, EthError> {
    get_chain(chain_id).ok_or(EthError::UnsupportedChain(chain_id))
}

/// Returns all known chain definitions.
pub fn supported_chains() -> Vec<&'static EvmChain> {
    ALL_CHAINS.to_vec()
}

impl EvmChain {
    /// Explorer page for a transaction hash.
    pub fn tx_url(&self, hash: &B256) -> Option<String> {
        self.explorer_url
            .map(|base| format!("{base}/tx/{}", encode_hex(hash)))
    }

    /// Explorer page for an account or contract.
    pub fn address_url(&self, address: &Address) -> Option<String> {
        self.explorer_url
            .map(|base| format!("{base}/address/{}", address.to_checksum(None)))
    }

    /// Explorer page for a block number.
    pub fn block_url(&self, number: u64) -> Option<String> {
        self.explorer_url.map(|base| format!("{base}/block/{number}"))
    }
}
