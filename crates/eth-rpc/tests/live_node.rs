//! Scenarios against a real node. Run with
//! `ETH_PROBE_CONFIG=probe.toml cargo test -p eth-rpc -- --ignored`.

use std::time::Duration;

use alloy_primitives::U256;
use chain_eth::chains::get_chain;
use chain_eth::store;
use chain_eth::units::wei_to_ether;
use eth_rpc::events::handle_log;
use eth_rpc::scan::{find_recent_logs, DEFAULT_MAX_DEPTH, DEFAULT_WINDOW};
use eth_rpc::signal::shutdown_signal;
use eth_rpc::telemetry::init_tracing;
use eth_rpc::types::Header;
use eth_rpc::workflow::{self, STORE_VERSION};
use eth_rpc::{run_until_shutdown, BlockId, EthClient, FilterQuery, HttpTransport, Log, ProbeConfig, WsClient};
use tracing::info;

fn config() -> ProbeConfig {
    let path = std::env::var("ETH_PROBE_CONFIG").expect("ETH_PROBE_CONFIG must point at a probe TOML file");
    ProbeConfig::load(path).unwrap()
}

async fn client(config: &ProbeConfig) -> EthClient<HttpTransport> {
    EthClient::connect(&config.http_url, config.request_timeout()).await.unwrap()
}

#[tokio::test]
#[ignore]
async fn node_status() {
    init_tracing();
    let config = config();
    let client = client(&config).await;

    let status = workflow::node_status(&client).await.unwrap();
    if let Some(expected) = config.chain_id {
        assert_eq!(client.chain_id().await.unwrap(), expected);
    }
    let name = get_chain(status.network_id).map_or("unknown", |chain| chain.name);
    info!(network = name, head = status.block_number, "node reachable");

    for address in &config.watch_addresses {
        let balance = client.balance_at(*address, BlockId::Latest).await.unwrap();
        let code = workflow::code_size(&client, *address).await.unwrap();
        info!(%address, balance = %wei_to_ether(balance), code, "account");
    }
}

#[tokio::test]
#[ignore]
async fn latest_block_and_receipts() {
    init_tracing();
    let client = client(&config()).await;

    let block = client.block_by_number(BlockId::Latest, true).await.unwrap();
    let receipts = client.block_receipts(BlockId::Number(block.header.number)).await.unwrap();
    assert_eq!(receipts.len(), block.transactions.len());

    if let Some(hash) = block.transactions.hashes().first() {
        let tx = client.transaction_by_hash(*hash).await.unwrap();
        assert_eq!(tx.block_number, Some(block.header.number));
    }
}

#[tokio::test]
#[ignore]
async fn self_transfer() {
    init_tracing();
    let config = config();
    let client = client(&config).await;
    let wallet = config.wallet().unwrap();

    let sent = workflow::send_ether(&client, &wallet, wallet.address(), U256::ZERO).await.unwrap();
    let receipt = client.wait_for_receipt(sent.hash, &config.retry_policy()).await.unwrap();
    assert!(receipt.is_success());
}

#[tokio::test]
#[ignore]
async fn deploy_and_use_store() {
    init_tracing();
    let config = config();
    let client = client(&config).await;
    let wallet = config.wallet().unwrap();
    let policy = config.retry_policy();

    let bytecode = config.store_bytecode().unwrap();
    let deployment = workflow::deploy_store(&client, &wallet, &bytecode, STORE_VERSION, &policy)
        .await
        .unwrap();

    let key = store::bytes32_from_str("mykey").unwrap();
    let value = store::bytes32_from_str("myvalue").unwrap();
    let write = workflow::set_item_and_verify(&client, &wallet, deployment.address, key, value, &policy)
        .await
        .unwrap();
    assert!(write.verified);

    let snapshot = workflow::read_store(&client, deployment.address, key).await.unwrap();
    assert_eq!(snapshot.version, STORE_VERSION);
    assert_eq!(snapshot.value, value);

    let found = find_recent_logs(&client, deployment.address, DEFAULT_WINDOW, DEFAULT_MAX_DEPTH)
        .await
        .unwrap()
        .expect("ItemSet log within scan depth");
    for log in &found.logs {
        handle_log(log);
    }
}

#[tokio::test]
#[ignore]
async fn token_metadata() {
    init_tracing();
    let config = config();
    let client = client(&config).await;
    let token = config.token_address.expect("token_address is required");
    let holder = config.wallet().map(|w| w.address()).unwrap_or(token);

    let info = workflow::token_info(&client, token, holder).await.unwrap();
    assert!(info.decimals <= 77);
}

#[tokio::test]
#[ignore]
async fn watch_until_interrupted() {
    init_tracing();
    let config = config();
    let ws_url = config.ws_url.clone().expect("ws_url is required");
    let ws = WsClient::connect(&ws_url).await.unwrap();

    let heads = ws.subscribe_new_heads().await.unwrap();
    let shutdown = async {
        tokio::select! {
            _ = shutdown_signal() => {},
            _ = tokio::time::sleep(Duration::from_secs(30)) => {},
        }
    };
    let handled = run_until_shutdown(heads, shutdown, |head: Header| {
        info!(number = head.number, hash = %head.hash, "new head");
    })
    .await
    .unwrap();
    info!(handled, "heads received");

    if !config.watch_addresses.is_empty() {
        let mut filter = FilterQuery::new();
        for address in &config.watch_addresses {
            filter = filter.address(*address);
        }
        let logs = ws.subscribe_logs(&filter).await.unwrap();
        let handled = run_until_shutdown(logs, tokio::time::sleep(Duration::from_secs(30)), |log: Log| {
            handle_log(&log);
        })
        .await
        .unwrap();
        info!(handled, "logs received");
    }
}
