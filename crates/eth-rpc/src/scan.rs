//! Walking back from the chain head to find a contract's recent logs.

use alloy_primitives::Address;
use tracing::{debug, info, warn};

use crate::client::EthClient;
use crate::error::Result;
use crate::transport::Transport;
use crate::types::{BlockId, FilterQuery, Log};

/// Blocks per `eth_getLogs` query.
pub const DEFAULT_WINDOW: u64 = 10;

/// How far behind the head the scan goes.
pub const DEFAULT_MAX_DEPTH: u64 = 1_000;

/// The first block range that produced logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogWindow {
    pub from_block: u64,
    pub to_block: u64,
    pub logs: Vec<Log>,
}

/// Block ranges `[from, to]` visited by a scan, newest first.
///
/// Each range ends `offset` blocks below `head`, for offsets
/// `0, window, 2 * window, ...` below `max_depth`, and never starts below
/// genesis.
pub fn windows(head: u64, window: u64, max_depth: u64) -> impl Iterator<Item = (u64, u64)> {
    let window = window.max(1);
    (0..max_depth)
        .step_by(window as usize)
        .map_while(move |offset| head.checked_sub(offset))
        .map(move |to| (to.saturating_sub(window - 1), to))
}

/// Queries `address`'s logs window by window from the latest block
/// backwards and returns the first window with any logs.
///
/// A window whose query fails is logged and skipped; failing to read the
/// head is returned as an error.
pub async fn find_recent_logs<T: Transport>(
    client: &EthClient<T>,
    address: Address,
    window: u64,
    max_depth: u64,
) -> Result<Option<LogWindow>> {
    let head = client.header_by_number(BlockId::Latest).await?.number;
    info!(head, window, max_depth, %address, "scanning for logs");

    for (from_block, to_block) in windows(head, window, max_depth) {
        let filter = FilterQuery::new()
            .address(address)
            .from_block(from_block)
            .to_block(to_block);

        let logs = match client.filter_logs(&filter).await {
            Ok(logs) => logs,
            Err(e) => {
                warn!(from_block, to_block, error = %e, "log query failed, skipping window");
                continue;
            }
        };

        if logs.is_empty() {
            debug!(from_block, to_block, "no logs in window");
            continue;
        }

        info!(from_block, to_block, count = logs.len(), "found logs");
        return Ok(Some(LogWindow {
            from_block,
            to_block,
            logs,
        }));
    }

    info!(%address, "no logs within scan depth");
    Ok(None)
}
