//! JSON-RPC object types (blocks, transactions, receipts, logs, filters).

use std::fmt;

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::quantity;

/// A block selector for `eth_*` methods taking a block number or tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockId {
    #[default]
    Latest,
    Pending,
    Earliest,
    Safe,
    Finalized,
    Number(u64),
}

impl BlockId {
    pub fn to_param(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str("latest"),
            Self::Pending => f.write_str("pending"),
            Self::Earliest => f.write_str("earliest"),
            Self::Safe => f.write_str("safe"),
            Self::Finalized => f.write_str("finalized"),
            Self::Number(n) => f.write_str(&quantity::to_hex(*n)),
        }
    }
}

impl From<u64> for BlockId {
    fn from(number: u64) -> Self {
        Self::Number(number)
    }
}

/// A log entry as returned by `eth_getLogs`, receipts and log subscriptions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    #[serde(default, with = "quantity::opt")]
    pub block_number: Option<u64>,
    #[serde(default)]
    pub block_hash: Option<B256>,
    #[serde(default)]
    pub transaction_hash: Option<B256>,
    #[serde(default, with = "quantity::opt")]
    pub transaction_index: Option<u64>,
    #[serde(default, with = "quantity::opt")]
    pub log_index: Option<u64>,
    /// Set when the log was dropped by a chain reorganisation.
    #[serde(default)]
    pub removed: bool,
}

/// Receipt of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(with = "quantity")]
    pub transaction_index: u64,
    pub block_hash: B256,
    #[serde(with = "quantity")]
    pub block_number: u64,
    pub from: Address,
    #[serde(default)]
    pub to: Option<Address>,
    #[serde(default)]
    pub contract_address: Option<Address>,
    #[serde(with = "quantity")]
    pub gas_used: u64,
    #[serde(with = "quantity")]
    pub cumulative_gas_used: u64,
    #[serde(default)]
    pub effective_gas_price: Option<U256>,
    /// `1` on success, `0` on revert. Absent on pre-Byzantium receipts.
    #[serde(default, with = "quantity::opt")]
    pub status: Option<u64>,
    #[serde(default)]
    pub logs: Vec<Log>,
    #[serde(default, rename = "type", with = "quantity::opt")]
    pub tx_type: Option<u64>,
}

impl TransactionReceipt {
    pub fn is_success(&self) -> bool {
        self.status == Some(1)
    }
}

/// A transaction object from `eth_getTransactionByHash` or a full block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: B256,
    #[serde(with = "quantity")]
    pub nonce: u64,
    #[serde(default)]
    pub block_hash: Option<B256>,
    #[serde(default, with = "quantity::opt")]
    pub block_number: Option<u64>,
    #[serde(default, with = "quantity::opt")]
    pub transaction_index: Option<u64>,
    pub from: Address,
    #[serde(default)]
    pub to: Option<Address>,
    pub value: U256,
    #[serde(default)]
    pub gas_price: Option<U256>,
    #[serde(with = "quantity")]
    pub gas: u64,
    pub input: Bytes,
    #[serde(default, with = "quantity::opt")]
    pub chain_id: Option<u64>,
    #[serde(default, rename = "type", with = "quantity::opt")]
    pub tx_type: Option<u64>,
}

impl Transaction {
    /// Pending transactions have no block yet.
    pub fn is_pending(&self) -> bool {
        self.block_number.is_none()
    }
}

/// Block header fields (also the payload of `newHeads` notifications).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    pub hash: B256,
    pub parent_hash: B256,
    #[serde(with = "quantity")]
    pub number: u64,
    #[serde(with = "quantity")]
    pub timestamp: u64,
    #[serde(with = "quantity")]
    pub gas_limit: u64,
    #[serde(with = "quantity")]
    pub gas_used: u64,
    pub miner: Address,
    #[serde(default)]
    pub base_fee_per_gas: Option<U256>,
    #[serde(default)]
    pub difficulty: Option<U256>,
}

/// Transactions of a block: hashes only, or full objects when hydrated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockTransactions {
    Hashes(Vec<B256>),
    Full(Vec<Transaction>),
}

impl BlockTransactions {
    pub fn len(&self) -> usize {
        match self {
            Self::Hashes(hashes) => hashes.len(),
            Self::Full(txs) => txs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hashes(&self) -> Vec<B256> {
        match self {
            Self::Hashes(hashes) => hashes.clone(),
            Self::Full(txs) => txs.iter().map(|tx| tx.hash).collect(),
        }
    }
}

impl Default for BlockTransactions {
    fn default() -> Self {
        Self::Hashes(Vec::new())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    #[serde(flatten)]
    pub header: Header,
    #[serde(default)]
    pub transactions: BlockTransactions,
    #[serde(default)]
    pub uncles: Vec<B256>,
}

/// Parameters of `eth_call` and `eth_estimateGas`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none", with = "quantity::opt")]
    pub gas: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
}

impl CallRequest {
    /// A read-only call of `data` against `to`.
    pub fn call(to: Address, data: Vec<u8>) -> Self {
        Self {
            to: Some(to),
            data: Some(Bytes::from(data)),
            ..Self::default()
        }
    }

    pub fn with_from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }
}

/// Log filter for `eth_getLogs` and `logs` subscriptions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterQuery {
    pub from_block: Option<BlockId>,
    pub to_block: Option<BlockId>,
    pub addresses: Vec<Address>,
    /// Positional topic filters; `None` matches anything at that position.
    pub topics: Vec<Option<Vec<B256>>>,
}

impl FilterQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn address(mut self, address: Address) -> Self {
        self.addresses.push(address);
        self
    }

    pub fn from_block(mut self, block: impl Into<BlockId>) -> Self {
        self.from_block = Some(block.into());
        self
    }

    pub fn to_block(mut self, block: impl Into<BlockId>) -> Self {
        self.to_block = Some(block.into());
        self
    }

    /// Restricts `topic[0]` to the given event topic.
    pub fn event(mut self, topic: B256) -> Self {
        if self.topics.is_empty() {
            self.topics.push(Some(vec![topic]));
        } else {
            self.topics[0] = Some(vec![topic]);
        }
        self
    }

    /// JSON object in the shape nodes expect. Empty fields are omitted.
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        if let Some(from) = &self.from_block {
            obj.insert("fromBlock".into(), from.to_param());
        }
        if let Some(to) = &self.to_block {
            obj.insert("toBlock".into(), to.to_param());
        }
        match self.addresses.as_slice() {
            [] => {}
            [single] => {
                obj.insert("address".into(), json!(single));
            }
            many => {
                obj.insert("address".into(), json!(many));
            }
        }
        if !self.topics.is_empty() {
            obj.insert("topics".into(), json!(self.topics));
        }
        Value::Object(obj)
    }
}

/// Progress of a syncing node (`eth_syncing` when not `false`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncProgress {
    #[serde(with = "quantity")]
    pub starting_block: u64,
    #[serde(with = "quantity")]
    pub current_block: u64,
    #[serde(with = "quantity")]
    pub highest_block: u64,
}

/// Raw `eth_syncing` result: `false`, or a progress object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SyncStatus {
    Synced(bool),
    Syncing(SyncProgress),
}

impl SyncStatus {
    pub fn progress(self) -> Option<SyncProgress> {
        match self {
            Self::Synced(_) => None,
            Self::Syncing(progress) => Some(progress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECEIPT_JSON: &str = r#"{
        "transactionHash": "0x25d95c09ff74fccfdb8eca54ad8d50e1d62eabe920402e735499b06769eca59a",
        "transactionIndex": "0x3",
        "blockHash": "0x62a45449d23bc26e6a16970345ac132e5f88f8bc198d9757005670db8aa8d7d0",
        "blockNumber": "0x16c2e4d",
        "from": "0x8c8ab9b6178877246b224f8d745a1410c4928373",
        "to": null,
        "contractAddress": "0x48bd8c28155a382d872e4758c11b967303fedd90",
        "gasUsed": "0x5208",
        "cumulativeGasUsed": "0xa410",
        "effectiveGasPrice": "0x3b9aca00",
        "status": "0x1",
        "type": "0x0",
        "logs": [{
            "address": "0xe5afc41736bbe96ccb912cb2d2e6bb503979b657",
            "topics": ["0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"],
            "data": "0x00",
            "blockNumber": "0x16c2e4d",
            "logIndex": "0x0",
            "removed": false
        }]
    }"#;

    #[test]
    fn block_id_params() {
        assert_eq!(BlockId::Latest.to_param(), json!("latest"));
        assert_eq!(BlockId::Pending.to_string(), "pending");
        assert_eq!(BlockId::Number(23_866_957).to_param(), json!("0x16c2e4d"));
    }

    #[test]
    fn receipt_deserializes() {
        let receipt: TransactionReceipt = serde_json::from_str(RECEIPT_JSON).unwrap();

        assert_eq!(receipt.block_number, 23_866_957);
        assert_eq!(receipt.gas_used, 21_000);
        assert!(receipt.is_success());
        assert!(receipt.to.is_none());
        assert!(receipt.contract_address.is_some());
        assert_eq!(receipt.effective_gas_price, Some(U256::from(1_000_000_000u64)));
        assert_eq!(receipt.logs.len(), 1);
        assert_eq!(receipt.logs[0].log_index, Some(0));
        assert_eq!(receipt.logs[0].transaction_hash, None);
    }

    #[test]
    fn reverted_receipt_is_not_success() {
        let json = RECEIPT_JSON.replace(r#""status": "0x1""#, r#""status": "0x0""#);
        let receipt: TransactionReceipt = serde_json::from_str(&json).unwrap();
        assert!(!receipt.is_success());
    }

    #[test]
    fn block_with_hashes_and_full_transactions() {
        let header = r#""hash": "0x62a45449d23bc26e6a16970345ac132e5f88f8bc198d9757005670db8aa8d7d0",
            "parentHash": "0x0000000000000000000000000000000000000000000000000000000000000000",
            "number": "0x10", "timestamp": "0x6553f100", "gasLimit": "0x1c9c380",
            "gasUsed": "0x0", "miner": "0x0000000000000000000000000000000000000000",
            "baseFeePerGas": "0x7""#;

        let hashes = format!(
            r#"{{ {header}, "transactions": ["0x25d95c09ff74fccfdb8eca54ad8d50e1d62eabe920402e735499b06769eca59a"] }}"#
        );
        let block: Block = serde_json::from_str(&hashes).unwrap();
        assert_eq!(block.header.number, 16);
        assert_eq!(block.transactions.len(), 1);
        assert!(matches!(block.transactions, BlockTransactions::Hashes(_)));

        let full = format!(
            r#"{{ {header}, "transactions": [{{
                "hash": "0x25d95c09ff74fccfdb8eca54ad8d50e1d62eabe920402e735499b06769eca59a",
                "nonce": "0x9", "blockNumber": "0x10", "from": "0x8c8ab9b6178877246b224f8d745a1410c4928373",
                "to": "0x2281cb9267abaf264c0a4c0dd2e414b4d68ce634", "value": "0x470de4df820000",
                "gasPrice": "0x4a817c800", "gas": "0x5208", "input": "0x"
            }}] }}"#
        );
        let block: Block = serde_json::from_str(&full).unwrap();
        let BlockTransactions::Full(txs) = &block.transactions else {
            panic!("expected full transactions");
        };
        assert_eq!(txs[0].value, U256::from(20_000_000_000_000_000u64));
        assert!(!txs[0].is_pending());
        assert_eq!(block.transactions.hashes().len(), 1);
    }

    #[test]
    fn empty_block_transactions() {
        let json = r#"{"hash": "0x62a45449d23bc26e6a16970345ac132e5f88f8bc198d9757005670db8aa8d7d0",
            "parentHash": "0x0000000000000000000000000000000000000000000000000000000000000000",
            "number": "0x0", "timestamp": "0x0", "gasLimit": "0x0", "gasUsed": "0x0",
            "miner": "0x0000000000000000000000000000000000000000", "transactions": []}"#;
        let block: Block = serde_json::from_str(json).unwrap();
        assert!(block.transactions.is_empty());
    }

    #[test]
    fn filter_query_json_shape() {
        let token = Address::from([0xe5; 20]);
        let topic = B256::repeat_byte(0xdd);
        let filter = FilterQuery::new()
            .address(token)
            .from_block(100)
            .to_block(109)
            .event(topic);

        assert_eq!(
            filter.to_json(),
            json!({
                "fromBlock": "0x64",
                "toBlock": "0x6d",
                "address": token,
                "topics": [[topic]],
            })
        );
        assert_eq!(FilterQuery::new().to_json(), json!({}));
    }

    #[test]
    fn call_request_omits_empty_fields() {
        let to = Address::from([0x11; 20]);
        let request = CallRequest::call(to, vec![0x06, 0xfd, 0xde, 0x03]);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "to": to, "data": "0x06fdde03" })
        );
    }

    #[test]
    fn sync_status_variants() {
        let synced: SyncStatus = serde_json::from_str("false").unwrap();
        assert_eq!(synced.progress(), None);

        let syncing: SyncStatus = serde_json::from_str(
            r#"{"startingBlock":"0x0","currentBlock":"0x10","highestBlock":"0x20"}"#,
        )
        .unwrap();
        assert_eq!(syncing.progress().unwrap().highest_block, 32);
    }
}
