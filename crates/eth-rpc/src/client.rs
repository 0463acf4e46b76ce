//! Owned Ethereum JSON-RPC client.
//!
//! [`EthClient`] is constructed explicitly and passed to every workflow; there
//! is no process-wide connection. The transport is generic so tests can
//! script responses without a node.

use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256, U256};
use chain_eth::hash::encode_hex;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::{Result, RpcError};
use crate::quantity;
use crate::transport::{HttpTransport, Transport};
use crate::types::{
    Block, BlockId, CallRequest, FilterQuery, Header, Log, SyncProgress, SyncStatus, Transaction,
    TransactionReceipt,
};

#[derive(Debug)]
pub struct EthClient<T = HttpTransport> {
    transport: T,
}

impl EthClient<HttpTransport> {
    /// Dials an HTTP endpoint and checks it answers `net_version`.
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self> {
        let client = Self::new(HttpTransport::new(url, timeout)?);
        let network = client.network_id().await?;
        info!(url, network, "connected to node");
        Ok(client)
    }
}

impl<T: Transport> EthClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn call<R: DeserializeOwned>(&self, method: &str, params: Value) -> Result<R> {
        let value = self.transport.request(method, params).await?;
        serde_json::from_value(value).map_err(|e| RpcError::InvalidResponse(format!("{method}: {e}")))
    }

    async fn call_optional<R: DeserializeOwned>(&self, method: &str, params: Value) -> Result<Option<R>> {
        let value = self.transport.request(method, params).await?;
        if value.is_null() {
            return Ok(None);
        }
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| RpcError::InvalidResponse(format!("{method}: {e}")))
    }

    async fn call_required<R: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
        what: String,
    ) -> Result<R> {
        self.call_optional(method, params)
            .await?
            .ok_or(RpcError::NotFound(what))
    }

    async fn call_quantity(&self, method: &str, params: Value) -> Result<u64> {
        let text: String = self.call(method, params).await?;
        quantity::parse(&text).map_err(|e| RpcError::InvalidResponse(format!("{method}: {e}")))
    }

    /// `eth_chainId`.
    pub async fn chain_id(&self) -> Result<u64> {
        self.call_quantity("eth_chainId", json!([])).await
    }

    /// `net_version`, the network ID as a decimal string.
    pub async fn network_id(&self) -> Result<u64> {
        self.call_quantity("net_version", json!([])).await
    }

    /// Number of the most recent block.
    pub async fn block_number(&self) -> Result<u64> {
        self.call_quantity("eth_blockNumber", json!([])).await
    }

    /// Balance in wei at the given block.
    pub async fn balance_at(&self, address: Address, block: BlockId) -> Result<U256> {
        self.call("eth_getBalance", json!([address, block.to_param()]))
            .await
    }

    /// Account nonce at the given block.
    pub async fn nonce_at(&self, address: Address, block: BlockId) -> Result<u64> {
        self.call_quantity("eth_getTransactionCount", json!([address, block.to_param()]))
            .await
    }

    /// Nonce including transactions still in the mempool; the value to use
    /// for the next transaction.
    pub async fn pending_nonce_at(&self, address: Address) -> Result<u64> {
        self.nonce_at(address, BlockId::Pending).await
    }

    /// `eth_gasPrice`.
    pub async fn suggest_gas_price(&self) -> Result<U256> {
        self.call("eth_gasPrice", json!([])).await
    }

    /// `eth_estimateGas` for the given call.
    pub async fn estimate_gas(&self, request: &CallRequest) -> Result<u64> {
        self.call_quantity("eth_estimateGas", json!([request])).await
    }

    /// Executes a read-only call and returns the raw return data.
    pub async fn call_contract(&self, request: &CallRequest, block: BlockId) -> Result<Vec<u8>> {
        let data: Bytes = self
            .call("eth_call", json!([request, block.to_param()]))
            .await?;
        Ok(data.to_vec())
    }

    /// Submits signed raw transaction bytes and returns the transaction hash.
    pub async fn send_raw_transaction(&self, raw_tx: &[u8]) -> Result<B256> {
        let hash: B256 = self
            .call("eth_sendRawTransaction", json!([encode_hex(raw_tx)]))
            .await?;
        info!(%hash, "transaction sent");
        Ok(hash)
    }

    pub async fn transaction_by_hash(&self, hash: B256) -> Result<Transaction> {
        self.call_required("eth_getTransactionByHash", json!([hash]), format!("transaction {hash}"))
            .await
    }

    /// Receipt of a mined transaction; [`RpcError::NotFound`] while it is
    /// still pending or unknown.
    pub async fn transaction_receipt(&self, hash: B256) -> Result<TransactionReceipt> {
        self.call_required("eth_getTransactionReceipt", json!([hash]), format!("receipt {hash}"))
            .await
    }

    pub async fn block_by_number(&self, block: BlockId, full_transactions: bool) -> Result<Block> {
        self.call_required(
            "eth_getBlockByNumber",
            json!([block.to_param(), full_transactions]),
            format!("block {block}"),
        )
        .await
    }

    pub async fn block_by_hash(&self, hash: B256, full_transactions: bool) -> Result<Block> {
        self.call_required(
            "eth_getBlockByHash",
            json!([hash, full_transactions]),
            format!("block {hash}"),
        )
        .await
    }

    /// Header of a block, without its transaction list.
    pub async fn header_by_number(&self, block: BlockId) -> Result<Header> {
        self.call_required(
            "eth_getBlockByNumber",
            json!([block.to_param(), false]),
            format!("block {block}"),
        )
        .await
    }

    /// All receipts of a block (`eth_getBlockReceipts`).
    pub async fn block_receipts(&self, block: BlockId) -> Result<Vec<TransactionReceipt>> {
        self.call_required(
            "eth_getBlockReceipts",
            json!([block.to_param()]),
            format!("receipts of block {block}"),
        )
        .await
    }

    pub async fn block_transaction_count(&self, block: BlockId) -> Result<u64> {
        let text: String = self
            .call_required(
                "eth_getBlockTransactionCountByNumber",
                json!([block.to_param()]),
                format!("block {block}"),
            )
            .await?;
        quantity::parse(&text).map_err(RpcError::InvalidResponse)
    }

    pub async fn block_transaction_count_by_hash(&self, hash: B256) -> Result<u64> {
        let text: String = self
            .call_required(
                "eth_getBlockTransactionCountByHash",
                json!([hash]),
                format!("block {hash}"),
            )
            .await?;
        quantity::parse(&text).map_err(RpcError::InvalidResponse)
    }

    /// Deployed bytecode; empty for externally owned accounts.
    pub async fn code_at(&self, address: Address, block: BlockId) -> Result<Vec<u8>> {
        let code: Bytes = self
            .call("eth_getCode", json!([address, block.to_param()]))
            .await?;
        Ok(code.to_vec())
    }

    /// `eth_getLogs` over the filter's block range.
    pub async fn filter_logs(&self, filter: &FilterQuery) -> Result<Vec<Log>> {
        let logs: Vec<Log> = self.call("eth_getLogs", json!([filter.to_json()])).await?;
        debug!(count = logs.len(), "logs fetched");
        Ok(logs)
    }

    /// `None` when the node is fully synced.
    pub async fn sync_progress(&self) -> Result<Option<SyncProgress>> {
        let status: SyncStatus = self.call("eth_syncing", json!([])).await?;
        Ok(status.progress())
    }
}
