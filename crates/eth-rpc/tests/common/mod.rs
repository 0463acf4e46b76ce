//! Scripted in-memory transport shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use eth_rpc::{Result, RpcError, Transport};
use serde_json::{json, Value};

/// Answers each method from a queue of scripted responses, then from a
/// repeated fallback. Every request is recorded.
#[derive(Default)]
pub struct FakeTransport {
    queued: Mutex<HashMap<String, VecDeque<Result<Value>>>>,
    repeated: Mutex<HashMap<String, Result<Value>>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues one response for `method`.
    pub fn push(&self, method: &str, response: Result<Value>) -> &Self {
        self.queued
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .push_back(response);
        self
    }

    pub fn ok(&self, method: &str, result: Value) -> &Self {
        self.push(method, Ok(result))
    }

    /// Answers `method` with `response` whenever its queue is empty.
    pub fn always(&self, method: &str, response: Result<Value>) -> &Self {
        self.repeated
            .lock()
            .unwrap()
            .insert(method.to_string(), response);
        self
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == method)
            .count()
    }

    /// Params of every call to `method`, in order.
    pub fn params(&self, method: &str) -> Vec<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, p)| p.clone())
            .collect()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_string(), params));

        if let Some(response) = self
            .queued
            .lock()
            .unwrap()
            .get_mut(method)
            .and_then(VecDeque::pop_front)
        {
            return response;
        }

        self.repeated
            .lock()
            .unwrap()
            .get(method)
            .cloned()
            .unwrap_or_else(|| Err(RpcError::Transport(format!("unscripted method {method}"))))
    }
}

pub fn hash(byte: u8) -> B256 {
    B256::repeat_byte(byte)
}

/// A mined receipt with the given status.
pub fn receipt(tx_hash: B256, status: u64, contract_address: Option<Address>) -> Value {
    json!({
        "transactionHash": tx_hash,
        "transactionIndex": "0x0",
        "blockHash": hash(0xbb),
        "blockNumber": "0x10",
        "from": "0x8c8ab9b6178877246b224f8d745a1410c4928373",
        "to": null,
        "contractAddress": contract_address,
        "gasUsed": "0x5208",
        "cumulativeGasUsed": "0x5208",
        "status": format!("{status:#x}"),
        "logs": []
    })
}

/// Minimal block header JSON at `number`.
pub fn header(number: u64) -> Value {
    json!({
        "hash": hash(0xaa),
        "parentHash": hash(0xab),
        "number": format!("{number:#x}"),
        "timestamp": "0x6553f100",
        "gasLimit": "0x1c9c380",
        "gasUsed": "0x0",
        "miner": Address::ZERO,
        "transactions": []
    })
}

/// ABI encoding of a single 32-byte word as `0x` hex.
pub fn word_hex(word: [u8; 32]) -> Value {
    json!(format!("0x{}", hex::encode(word)))
}
