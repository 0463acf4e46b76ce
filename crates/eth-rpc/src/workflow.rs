//! Probe workflows: sequential request/response steps over an owned client.
//!
//! Every step must succeed before the next one runs; the first error ends the
//! workflow. The only retry is receipt polling, driven by the caller's
//! [`RetryPolicy`].

use std::time::{Duration, Instant};

use alloy_primitives::{Address, B256, U256};
use chain_eth::abi;
use chain_eth::erc20;
use chain_eth::store;
use chain_eth::transaction::{create_address, LegacyTransaction};
use chain_eth::wallet::Wallet;
use tracing::{info, warn};

use crate::client::EthClient;
use crate::error::{Result, RpcError};
use crate::receipt::RetryPolicy;
use crate::transport::Transport;
use crate::types::{BlockId, CallRequest, SyncProgress, TransactionReceipt};

/// Gas limit for deploying the Store contract.
pub const DEPLOY_GAS_LIMIT: u64 = 3_000_000;

/// Gas limit for `setItem`.
pub const SET_ITEM_GAS_LIMIT: u64 = 100_000;

/// Constructor argument used when deploying Store.
pub const STORE_VERSION: &str = "v1.0.0";

/// A transaction accepted by the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentTransaction {
    pub hash: B256,
    pub nonce: u64,
    pub gas_limit: u64,
    pub gas_price: u128,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub address: Address,
    pub tx_hash: B256,
    pub receipt: TransactionReceipt,
}

/// Outcome of `setItem` followed by an `items` read-back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreWrite {
    pub tx_hash: B256,
    pub stored: B256,
    /// Whether the read-back equals the written value.
    pub verified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSnapshot {
    pub version: String,
    pub value: B256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: U256,
    pub balance: U256,
}

/// Connectivity summary of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeStatus {
    pub network_id: u64,
    pub block_number: u64,
    pub gas_price: U256,
    pub sync: Option<SyncProgress>,
    /// Round trip of the `eth_blockNumber` call.
    pub latency: Duration,
}

fn gas_price_u128(price: U256) -> Result<u128> {
    u128::try_from(price).map_err(|_| RpcError::InvalidResponse(format!("gas price {price} out of range")))
}

async fn sign_and_send<T: Transport>(
    client: &EthClient<T>,
    wallet: &Wallet,
    tx: &LegacyTransaction,
) -> Result<SentTransaction> {
    let signed = wallet.sign_legacy(tx)?;
    let hash = client.send_raw_transaction(&signed.raw_tx).await?;
    if hash != signed.tx_hash {
        warn!(node = %hash, local = %signed.tx_hash, "node reported a different transaction hash");
    }

    Ok(SentTransaction {
        hash,
        nonce: tx.nonce,
        gas_limit: tx.gas_limit,
        gas_price: tx.gas_price,
    })
}

async fn confirm<T: Transport>(
    client: &EthClient<T>,
    hash: B256,
    policy: &RetryPolicy,
) -> Result<TransactionReceipt> {
    let receipt = client.wait_for_receipt(hash, policy).await?;
    if !receipt.is_success() {
        return Err(RpcError::Reverted(hash));
    }
    Ok(receipt)
}

/// Sends `value` wei to `to` with a 21 000 gas limit at the suggested gas
/// price. The EIP-155 chain id is the node's network id.
pub async fn send_ether<T: Transport>(
    client: &EthClient<T>,
    wallet: &Wallet,
    to: Address,
    value: U256,
) -> Result<SentTransaction> {
    let nonce = client.pending_nonce_at(wallet.address()).await?;
    let gas_price = gas_price_u128(client.suggest_gas_price().await?)?;
    let chain_id = client.network_id().await?;

    let tx = LegacyTransaction::transfer(chain_id, nonce, to, value, gas_price);
    let sent = sign_and_send(client, wallet, &tx).await?;
    info!(hash = %sent.hash, %to, %value, nonce, "ether transfer sent");
    Ok(sent)
}

/// Sends an ERC-20 `transfer(to, amount)` with an estimated gas limit.
pub async fn send_token<T: Transport>(
    client: &EthClient<T>,
    wallet: &Wallet,
    token: Address,
    to: Address,
    amount: U256,
) -> Result<SentTransaction> {
    let from = wallet.address();
    let nonce = client.pending_nonce_at(from).await?;
    let gas_price = gas_price_u128(client.suggest_gas_price().await?)?;

    let data = erc20::encode_transfer(to, amount)?;
    let gas_limit = client
        .estimate_gas(&CallRequest::call(token, data.clone()).with_from(from))
        .await?;
    let chain_id = client.network_id().await?;

    let tx = LegacyTransaction::contract_call(chain_id, nonce, token, data, gas_price, gas_limit);
    let sent = sign_and_send(client, wallet, &tx).await?;
    info!(hash = %sent.hash, %token, %to, %amount, gas_limit, "token transfer sent");
    Ok(sent)
}

/// Deploys Store with `version` as constructor argument and waits for the
/// receipt.
pub async fn deploy_store<T: Transport>(
    client: &EthClient<T>,
    wallet: &Wallet,
    bytecode: &[u8],
    version: &str,
    policy: &RetryPolicy,
) -> Result<Deployment> {
    let init_code = store::deployment_data(bytecode, version)?;
    let from = wallet.address();
    let nonce = client.pending_nonce_at(from).await?;
    let gas_price = gas_price_u128(client.suggest_gas_price().await?)?;
    let chain_id = client.chain_id().await?;

    let tx = LegacyTransaction::contract_creation(chain_id, nonce, init_code, gas_price, DEPLOY_GAS_LIMIT);
    let sent = sign_and_send(client, wallet, &tx).await?;
    let receipt = confirm(client, sent.hash, policy).await?;

    let address = receipt
        .contract_address
        .unwrap_or_else(|| create_address(&from, nonce));
    info!(%address, hash = %sent.hash, block = receipt.block_number, gas_used = receipt.gas_used, "store deployed");

    Ok(Deployment {
        address,
        tx_hash: sent.hash,
        receipt,
    })
}

/// Calls `setItem(key, value)`, waits for it to be mined and reads the
/// key back.
pub async fn set_item_and_verify<T: Transport>(
    client: &EthClient<T>,
    wallet: &Wallet,
    contract: Address,
    key: B256,
    value: B256,
    policy: &RetryPolicy,
) -> Result<StoreWrite> {
    let data = store::encode_set_item(key, value)?;
    let nonce = client.pending_nonce_at(wallet.address()).await?;
    let gas_price = gas_price_u128(client.suggest_gas_price().await?)?;
    let chain_id = client.chain_id().await?;

    let tx = LegacyTransaction::contract_call(chain_id, nonce, contract, data, gas_price, SET_ITEM_GAS_LIMIT);
    let sent = sign_and_send(client, wallet, &tx).await?;
    confirm(client, sent.hash, policy).await?;

    let stored = read_item(client, contract, key).await?;
    let verified = stored == value;
    if verified {
        info!(%contract, %key, "item stored and verified");
    } else {
        warn!(%contract, %key, expected = %value, actual = %stored, "read-back differs from written value");
    }

    Ok(StoreWrite {
        tx_hash: sent.hash,
        stored,
        verified,
    })
}

async fn view<T: Transport>(client: &EthClient<T>, contract: Address, data: Vec<u8>) -> Result<Vec<u8>> {
    client
        .call_contract(&CallRequest::call(contract, data), BlockId::Latest)
        .await
}

pub async fn read_item<T: Transport>(client: &EthClient<T>, contract: Address, key: B256) -> Result<B256> {
    let data = view(client, contract, store::encode_items(key)?).await?;
    Ok(store::decode_items(&data)?)
}

pub async fn read_version<T: Transport>(client: &EthClient<T>, contract: Address) -> Result<String> {
    let data = view(client, contract, store::encode_version()).await?;
    Ok(store::decode_version(&data)?)
}

/// Reads Store's `version()` and `items(key)`.
pub async fn read_store<T: Transport>(client: &EthClient<T>, contract: Address, key: B256) -> Result<StoreSnapshot> {
    let version = read_version(client, contract).await?;
    let value = read_item(client, contract, key).await?;
    Ok(StoreSnapshot { version, value })
}

/// ERC-20 metadata plus `holder`'s balance.
pub async fn token_info<T: Transport>(client: &EthClient<T>, token: Address, holder: Address) -> Result<TokenInfo> {
    let name = abi::decode_string(&view(client, token, erc20::encode_name()).await?)?;
    let symbol = abi::decode_string(&view(client, token, erc20::encode_symbol()).await?)?;
    let decimals = erc20::decode_decimals(&view(client, token, erc20::encode_decimals()).await?)?;
    let total_supply = abi::decode_uint256(&view(client, token, erc20::encode_total_supply()).await?)?;
    let balance = abi::decode_uint256(&view(client, token, erc20::encode_balance_of(holder)?).await?)?;

    info!(%token, %name, %symbol, decimals, %balance, "token info");
    Ok(TokenInfo {
        name,
        symbol,
        decimals,
        total_supply,
        balance,
    })
}

/// Network id, head, gas price and sync state of the node.
pub async fn node_status<T: Transport>(client: &EthClient<T>) -> Result<NodeStatus> {
    let network_id = client.network_id().await?;

    let started = Instant::now();
    let block_number = client.block_number().await?;
    let latency = started.elapsed();

    let gas_price = client.suggest_gas_price().await?;
    let sync = client.sync_progress().await?;

    info!(network_id, block_number, %gas_price, syncing = sync.is_some(), ?latency, "node status");
    Ok(NodeStatus {
        network_id,
        block_number,
        gas_price,
        sync,
        latency,
    })
}

/// Size of the code deployed at `address`; zero for plain accounts.
pub async fn code_size<T: Transport>(client: &EthClient<T>, address: Address) -> Result<usize> {
    Ok(client.code_at(address, BlockId::Latest).await?.len())
}
