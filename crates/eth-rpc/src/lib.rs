//! Async Ethereum JSON-RPC probe.
//!
//! This crate provides:
//! - An owned JSON-RPC client over a pluggable transport (HTTP via `reqwest`)
//! - Receipt polling with an injected retry policy
//! - WebSocket log and head subscriptions with a cancellable event loop
//! - Log decoding and a windowed scan for recent contract events
//! - Transfer, token, Store deploy and Store interaction workflows
//! - TOML configuration and tracing setup

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod quantity;
pub mod receipt;
pub mod scan;
pub mod signal;
pub mod subscription;
pub mod telemetry;
pub mod transport;
pub mod types;
pub mod workflow;

pub use client::EthClient;
pub use config::ProbeConfig;
pub use error::{Result, RpcError};
pub use receipt::RetryPolicy;
pub use subscription::{run_until_shutdown, Subscription, WsClient};
pub use transport::{HttpTransport, Transport};
pub use types::{BlockId, CallRequest, FilterQuery, Log, TransactionReceipt};
