//! WebSocket subscriptions and the subscription event loop.
//!
//! A [`WsClient`] owns one websocket connection driven by a background task.
//! Each `eth_subscribe` call yields a [`Subscription`] with an item channel
//! and an error channel; [`run_until_shutdown`] consumes it one item at a
//! time until the shutdown future resolves.

use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;

use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::error::{Result, RpcError};
use crate::transport::{RpcRequest, RpcResponse};
use crate::types::{FilterQuery, Header, Log};

/// Buffered notifications per subscription; a subscriber further behind is dropped.
const ITEM_BUFFER: usize = 256;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

enum Command {
    Subscribe {
        params: Value,
        reply: oneshot::Sender<Result<SubscriptionChannels>>,
    },
    Unsubscribe {
        id: String,
    },
}

struct SubscriptionChannels {
    id: String,
    items: mpsc::Receiver<Value>,
    errors: mpsc::Receiver<RpcError>,
}

struct SubscriptionSenders {
    items: mpsc::Sender<Value>,
    errors: mpsc::Sender<RpcError>,
}

enum Unsubscribe {
    Ws(mpsc::UnboundedSender<Command>),
    Channel(oneshot::Sender<String>),
}

/// A live subscription yielding items of type `T`.
///
/// Dropping it, or ending [`run_until_shutdown`], unsubscribes.
pub struct Subscription<T> {
    id: String,
    items: mpsc::Receiver<Value>,
    errors: mpsc::Receiver<RpcError>,
    unsubscribe: Option<Unsubscribe>,
    _item: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl<T> Subscription<T> {
    /// Builds a subscription fed by caller-owned channels. The returned
    /// receiver yields the subscription id once it is released.
    pub fn from_channels(
        id: impl Into<String>,
        items: mpsc::Receiver<Value>,
        errors: mpsc::Receiver<RpcError>,
    ) -> (Self, oneshot::Receiver<String>) {
        let (tx, rx) = oneshot::channel();
        let subscription = Self {
            id: id.into(),
            items,
            errors,
            unsubscribe: Some(Unsubscribe::Channel(tx)),
            _item: PhantomData,
        };
        (subscription, rx)
    }

    fn from_ws(channels: SubscriptionChannels, commands: mpsc::UnboundedSender<Command>) -> Self {
        Self {
            id: channels.id,
            items: channels.items,
            errors: channels.errors,
            unsubscribe: Some(Unsubscribe::Ws(commands)),
            _item: PhantomData,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Releases the subscription. Calling it again does nothing.
    pub fn unsubscribe(&mut self) {
        let id = self.id.clone();
        match self.unsubscribe.take() {
            Some(Unsubscribe::Ws(commands)) => {
                // The connection task may already be gone.
                let _ = commands.send(Command::Unsubscribe { id });
            }
            Some(Unsubscribe::Channel(tx)) => {
                let _ = tx.send(id);
            }
            None => {}
        }
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Handles incoming items until `shutdown` resolves, the error channel
/// reports a failure, or the item stream ends.
///
/// Items are handled in arrival order, one at a time. Shutdown is checked
/// first on every turn so an interrupt is never starved by a busy stream.
/// Returns the number of items handled.
pub async fn run_until_shutdown<T, S, F>(
    mut subscription: Subscription<T>,
    shutdown: S,
    mut handler: F,
) -> Result<u64>
where
    T: DeserializeOwned,
    S: Future<Output = ()>,
    F: FnMut(T),
{
    tokio::pin!(shutdown);
    let mut handled = 0u64;

    let outcome = loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                info!(id = %subscription.id, handled, "subscription interrupted");
                break Ok(handled);
            }
            Some(err) = subscription.errors.recv() => {
                warn!(id = %subscription.id, error = %err, "subscription failed");
                break Err(err);
            }
            item = subscription.items.recv() => match item {
                Some(value) => match serde_json::from_value::<T>(value) {
                    Ok(item) => {
                        handler(item);
                        handled += 1;
                    }
                    Err(e) => {
                        break Err(RpcError::InvalidResponse(format!("subscription item: {e}")));
                    }
                },
                None => {
                    break Err(RpcError::Subscription(format!(
                        "stream {} closed",
                        subscription.id
                    )));
                }
            },
        }
    };

    subscription.unsubscribe();
    outcome
}

/// JSON-RPC websocket client for `eth_subscribe`.
#[derive(Debug)]
pub struct WsClient {
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl WsClient {
    pub async fn connect(url: &str) -> Result<Self> {
        let (stream, _) = tokio_tungstenite::connect_async(url).await?;
        info!(url, "websocket connected");

        let (commands, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_connection(stream, rx));
        Ok(Self { commands, task })
    }

    /// Sends `eth_subscribe` with the given params and waits for the id.
    pub async fn subscribe<T>(&self, params: Value) -> Result<Subscription<T>> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Subscribe { params, reply })
            .map_err(|_| RpcError::WebSocket("connection closed".into()))?;

        let channels = response
            .await
            .map_err(|_| RpcError::WebSocket("connection closed".into()))??;
        info!(id = %channels.id, "subscribed");
        Ok(Subscription::from_ws(channels, self.commands.clone()))
    }

    /// Logs matching the filter's addresses and topics.
    pub async fn subscribe_logs(&self, filter: &FilterQuery) -> Result<Subscription<Log>> {
        self.subscribe(json!(["logs", filter.to_json()])).await
    }

    pub async fn subscribe_new_heads(&self) -> Result<Subscription<Header>> {
        self.subscribe(json!(["newHeads"])).await
    }

    /// Whether the connection task has exited.
    pub fn is_closed(&self) -> bool {
        self.task.is_finished()
    }
}

#[derive(Deserialize)]
struct Notification {
    method: String,
    params: NotificationParams,
}

#[derive(Deserialize)]
struct NotificationParams {
    subscription: String,
    result: Value,
}

#[derive(Default)]
struct ConnectionState {
    next_id: u64,
    pending: HashMap<u64, oneshot::Sender<Result<SubscriptionChannels>>>,
    subscriptions: HashMap<String, SubscriptionSenders>,
}

impl ConnectionState {
    fn request_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn fail_all(&mut self, reason: &str) {
        for (_, reply) in self.pending.drain() {
            let _ = reply.send(Err(RpcError::WebSocket(reason.to_string())));
        }
        for (id, subscription) in self.subscriptions.drain() {
            debug!(%id, "closing subscription");
            let _ = subscription
                .errors
                .try_send(RpcError::Subscription(reason.to_string()));
        }
    }

    /// Routes one text frame. Returns the id of a subscription dropped
    /// because its subscriber is gone or not keeping up; the node should be
    /// told to stop sending it.
    fn handle_text(&mut self, text: &str) -> Option<String> {
        if let Ok(notification) = serde_json::from_str::<Notification>(text) {
            if notification.method != "eth_subscription" {
                debug!(method = %notification.method, "ignoring notification");
                return None;
            }
            return self.deliver(notification.params.subscription, notification.params.result);
        }

        let response: RpcResponse = match serde_json::from_str(text) {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "unreadable websocket message");
                return None;
            }
        };
        let Some(reply) = response.id.and_then(|id| self.pending.remove(&id)) else {
            // Answers to eth_unsubscribe are not awaited.
            return None;
        };

        let outcome = response.into_result().and_then(|value| match value {
            Value::String(id) => {
                let (items_tx, items) = mpsc::channel(ITEM_BUFFER);
                let (errors_tx, errors) = mpsc::channel(1);
                self.subscriptions.insert(
                    id.clone(),
                    SubscriptionSenders {
                        items: items_tx,
                        errors: errors_tx,
                    },
                );
                Ok(SubscriptionChannels { id, items, errors })
            }
            other => Err(RpcError::InvalidResponse(format!("subscription id {other}"))),
        });
        let _ = reply.send(outcome);
        None
    }

    /// Hands an item to its subscriber without waiting, so one slow reader
    /// cannot hold up the connection.
    fn deliver(&mut self, id: String, item: Value) -> Option<String> {
        let Some(subscription) = self.subscriptions.get(&id) else {
            debug!(%id, "notification for unknown subscription");
            return None;
        };

        match subscription.items.try_send(item) {
            Ok(()) => None,
            Err(TrySendError::Full(_)) => {
                warn!(%id, "subscriber lagging, dropping subscription");
                let _ = subscription
                    .errors
                    .try_send(RpcError::Subscription("subscriber lagging".into()));
                self.subscriptions.remove(&id);
                Some(id)
            }
            Err(TrySendError::Closed(_)) => {
                self.subscriptions.remove(&id);
                Some(id)
            }
        }
    }
}

async fn send_unsubscribe(sink: &mut WsSink, state: &mut ConnectionState, id: &str) {
    let request = RpcRequest::new(state.request_id(), "eth_unsubscribe", json!([id]));
    let text = match serde_json::to_string(&request) {
        Ok(text) => text,
        Err(e) => {
            warn!(%id, error = %e, "unsubscribe failed");
            return;
        }
    };
    match sink.send(Message::Text(text)).await {
        Ok(()) => info!(%id, "unsubscribed"),
        Err(e) => warn!(%id, error = %e, "unsubscribe failed"),
    }
}

async fn run_connection(stream: WsStream, mut commands: mpsc::UnboundedReceiver<Command>) {
    let (mut sink, mut source) = stream.split();
    let mut state = ConnectionState::default();

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Subscribe { params, reply }) => {
                    let id = state.request_id();
                    let request = RpcRequest::new(id, "eth_subscribe", params);
                    let sent = match serde_json::to_string(&request) {
                        Ok(text) => sink.send(Message::Text(text)).await.map_err(RpcError::from),
                        Err(e) => Err(RpcError::from(e)),
                    };
                    match sent {
                        Ok(()) => {
                            state.pending.insert(id, reply);
                        }
                        Err(e) => {
                            let _ = reply.send(Err(e));
                        }
                    }
                }
                Some(Command::Unsubscribe { id }) => {
                    if state.subscriptions.remove(&id).is_some() {
                        send_unsubscribe(&mut sink, &mut state, &id).await;
                    }
                }
                None => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            },
            message = source.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    if let Some(id) = state.handle_text(&text) {
                        send_unsubscribe(&mut sink, &mut state, &id).await;
                    }
                }
                Some(Ok(Message::Ping(payload))) => {
                    let _ = sink.send(Message::Pong(payload)).await;
                }
                Some(Ok(Message::Close(frame))) => {
                    info!(?frame, "websocket closed by peer");
                    state.fail_all("connection closed");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "websocket error");
                    state.fail_all(&e.to_string());
                    break;
                }
                None => {
                    state.fail_all("connection closed");
                    break;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_routes_by_subscription_id() {
        let text = r#"{"jsonrpc":"2.0","method":"eth_subscription","params":{"subscription":"0xcd0c","result":{"number":"0x1"}}}"#;
        let notification: Notification = serde_json::from_str(text).unwrap();
        assert_eq!(notification.method, "eth_subscription");
        assert_eq!(notification.params.subscription, "0xcd0c");
    }

    #[test]
    fn responses_are_not_notifications() {
        let text = r#"{"jsonrpc":"2.0","id":1,"result":"0xcd0c"}"#;
        assert!(serde_json::from_str::<Notification>(text).is_err());
    }

    #[tokio::test]
    async fn subscribe_reply_registers_channels() {
        let mut state = ConnectionState::default();
        let id = state.request_id();
        let (reply, response) = oneshot::channel();
        state.pending.insert(id, reply);

        state
            .handle_text(&format!(r#"{{"jsonrpc":"2.0","id":{id},"result":"0xabc"}}"#));
        let mut channels = response.await.unwrap().unwrap();
        assert_eq!(channels.id, "0xabc");

        state
            .handle_text(r#"{"jsonrpc":"2.0","method":"eth_subscription","params":{"subscription":"0xabc","result":7}}"#);
        assert_eq!(channels.items.recv().await, Some(json!(7)));
    }

    #[tokio::test]
    async fn subscribe_error_is_returned() {
        let mut state = ConnectionState::default();
        let id = state.request_id();
        let (reply, response) = oneshot::channel();
        state.pending.insert(id, reply);

        state
            .handle_text(&format!(
                r#"{{"jsonrpc":"2.0","id":{id},"error":{{"code":-32601,"message":"notifications not supported"}}}}"#
            ));
        let err = response.await.unwrap().err().unwrap();
        assert_eq!(
            err,
            RpcError::Rpc {
                code: -32601,
                message: "notifications not supported".into()
            }
        );
    }

    #[tokio::test]
    async fn fail_all_reports_to_subscribers() {
        let mut state = ConnectionState::default();
        let (items_tx, _items) = mpsc::channel(1);
        let (errors_tx, mut errors) = mpsc::channel(1);
        state.subscriptions.insert(
            "0x1".into(),
            SubscriptionSenders {
                items: items_tx,
                errors: errors_tx,
            },
        );

        state.fail_all("connection closed");
        assert!(state.subscriptions.is_empty());
        assert_eq!(
            errors.recv().await,
            Some(RpcError::Subscription("connection closed".into()))
        );
    }

    fn notification(id: &str, result: u64) -> String {
        format!(
            r#"{{"jsonrpc":"2.0","method":"eth_subscription","params":{{"subscription":"{id}","result":{result}}}}}"#
        )
    }

    #[tokio::test]
    async fn lagging_subscriber_does_not_block_others() {
        let mut state = ConnectionState::default();
        let (slow_items_tx, _slow_items) = mpsc::channel(1);
        let (slow_errors_tx, mut slow_errors) = mpsc::channel(1);
        let (fast_items_tx, mut fast_items) = mpsc::channel(4);
        let (fast_errors_tx, _fast_errors) = mpsc::channel(1);
        state.subscriptions.insert(
            "0xa".into(),
            SubscriptionSenders {
                items: slow_items_tx,
                errors: slow_errors_tx,
            },
        );
        state.subscriptions.insert(
            "0xb".into(),
            SubscriptionSenders {
                items: fast_items_tx,
                errors: fast_errors_tx,
            },
        );

        assert_eq!(state.handle_text(&notification("0xa", 1)), None);
        assert_eq!(state.handle_text(&notification("0xa", 2)), Some("0xa".to_string()));
        assert!(!state.subscriptions.contains_key("0xa"));
        assert_eq!(
            slow_errors.recv().await,
            Some(RpcError::Subscription("subscriber lagging".into()))
        );

        assert_eq!(state.handle_text(&notification("0xb", 3)), None);
        assert_eq!(state.handle_text(&notification("0xa", 4)), None);
        assert_eq!(fast_items.recv().await, Some(json!(3)));
    }

    #[test]
    fn closed_subscriber_is_dropped() {
        let mut state = ConnectionState::default();
        let (items_tx, items) = mpsc::channel(1);
        let (errors_tx, _errors) = mpsc::channel(1);
        state.subscriptions.insert(
            "0xc".into(),
            SubscriptionSenders {
                items: items_tx,
                errors: errors_tx,
            },
        );
        drop(items);

        assert_eq!(state.handle_text(&notification("0xc", 1)), Some("0xc".to_string()));
        assert!(state.subscriptions.is_empty());
    }
}
