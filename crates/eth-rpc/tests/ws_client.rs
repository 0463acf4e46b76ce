use std::time::Duration;

use eth_rpc::types::Header;
use eth_rpc::{run_until_shutdown, WsClient};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

const SUBSCRIPTION_ID: &str = "0x9ce59a13059e417087c02d3236a0b1cc";

fn head(number: u64) -> Value {
    json!({
        "hash": format!("0x{:064x}", number),
        "parentHash": format!("0x{:064x}", number - 1),
        "number": format!("{number:#x}"),
        "timestamp": "0x6553f100",
        "gasLimit": "0x1c9c380",
        "gasUsed": "0x0",
        "miner": "0x0000000000000000000000000000000000000000"
    })
}

async fn next_request(ws: &mut WebSocketStream<TcpStream>) -> Value {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => return serde_json::from_str(&text).unwrap(),
            Some(Ok(_)) => continue,
            other => panic!("connection ended before a request arrived: {other:?}"),
        }
    }
}

/// Accepts one connection, confirms a newHeads subscription, pushes two
/// heads and returns the next request the client sends.
async fn serve_new_heads(listener: TcpListener) -> Value {
    let (tcp, _) = listener.accept().await.unwrap();
    let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();

    let subscribe = next_request(&mut ws).await;
    assert_eq!(subscribe["method"], "eth_subscribe");
    assert_eq!(subscribe["params"], json!(["newHeads"]));

    let reply = json!({ "jsonrpc": "2.0", "id": subscribe["id"], "result": SUBSCRIPTION_ID });
    ws.send(Message::Text(reply.to_string())).await.unwrap();

    for number in [100, 101] {
        let notification = json!({
            "jsonrpc": "2.0",
            "method": "eth_subscription",
            "params": { "subscription": SUBSCRIPTION_ID, "result": head(number) }
        });
        ws.send(Message::Text(notification.to_string())).await.unwrap();
    }

    next_request(&mut ws).await
}

#[tokio::test]
async fn interrupt_sends_eth_unsubscribe() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    let server = tokio::spawn(serve_new_heads(listener));

    // 1. Connect and subscribe
    let client = WsClient::connect(&url).await.unwrap();
    let subscription = client.subscribe_new_heads().await.unwrap();
    assert_eq!(subscription.id(), SUBSCRIPTION_ID);

    // 2. Handle both heads, then interrupt
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut stop_tx = Some(stop_tx);
    let mut numbers = Vec::new();
    let handled = run_until_shutdown(
        subscription,
        async move {
            let _ = stop_rx.await;
        },
        |header: Header| {
            numbers.push(header.number);
            if numbers.len() == 2 {
                if let Some(tx) = stop_tx.take() {
                    let _ = tx.send(());
                }
            }
        },
    )
    .await
    .unwrap();

    assert_eq!(handled, 2);
    assert_eq!(numbers, vec![100, 101]);

    // 3. The node is told to stop the stream
    let unsubscribe = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not receive eth_unsubscribe")
        .unwrap();
    assert_eq!(unsubscribe["method"], "eth_unsubscribe");
    assert_eq!(unsubscribe["params"], json!([SUBSCRIPTION_ID]));
    assert!(!client.is_closed());
}

#[tokio::test]
async fn subscribe_fails_once_the_node_disconnects() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
        ws.close(None).await.unwrap();
    });

    let client = WsClient::connect(&url).await.unwrap();
    server.await.unwrap();

    let outcome = tokio::time::timeout(Duration::from_secs(5), client.subscribe_new_heads())
        .await
        .expect("subscribe hung after disconnect");
    assert!(outcome.is_err());
}
