//! Classifying and decoding logs by their first topic.

use alloy_primitives::B256;
use chain_eth::erc20::{self, ApprovalEvent, TransferEvent};
use chain_eth::event::{EventKind, EventRegistry};
use chain_eth::store::{self, ItemSet};
use tracing::{info, warn};

use crate::error::Result;
use crate::types::Log;

/// A log decoded into one of the known event families.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedEvent {
    Transfer(TransferEvent),
    Approval(ApprovalEvent),
    ItemSet(ItemSet),
    /// Unregistered topic, or an anonymous log without topics.
    Unknown { topic0: Option<B256> },
}

/// Decodes a log with the standard ERC-20 and Store events.
pub fn decode_log(log: &Log) -> Result<DecodedEvent> {
    decode_with(&EventRegistry::standard(), log)
}

pub fn decode_with(registry: &EventRegistry, log: &Log) -> Result<DecodedEvent> {
    let event = match registry.classify(&log.topics) {
        EventKind::Transfer => DecodedEvent::Transfer(erc20::decode_transfer(&log.topics, &log.data)?),
        EventKind::Approval => DecodedEvent::Approval(erc20::decode_approval(&log.topics, &log.data)?),
        EventKind::ItemSet => DecodedEvent::ItemSet(store::decode_item_set(&log.topics, &log.data)?),
        EventKind::Unknown => DecodedEvent::Unknown {
            topic0: log.topics.first().copied(),
        },
    };
    Ok(event)
}

/// Decodes a log and reports it through `tracing`. Decode failures are
/// logged and skipped.
pub fn handle_log(log: &Log) -> Option<DecodedEvent> {
    let block = log.block_number;
    let tx = log.transaction_hash;

    match decode_log(log) {
        Ok(DecodedEvent::Transfer(ev)) => {
            info!(?block, ?tx, from = %ev.from, to = %ev.to, value = %ev.value, "Transfer");
            Some(DecodedEvent::Transfer(ev))
        }
        Ok(DecodedEvent::Approval(ev)) => {
            info!(?block, ?tx, owner = %ev.owner, spender = %ev.spender, value = %ev.value, "Approval");
            Some(DecodedEvent::Approval(ev))
        }
        Ok(DecodedEvent::ItemSet(ev)) => {
            info!(?block, ?tx, key = %ev.key, value = %ev.value, "ItemSet");
            Some(DecodedEvent::ItemSet(ev))
        }
        Ok(unknown @ DecodedEvent::Unknown { .. }) => {
            info!(?block, ?tx, address = %log.address, topics = log.topics.len(), "unknown event");
            Some(unknown)
        }
        Err(e) => {
            warn!(?block, ?tx, address = %log.address, error = %e, "failed to decode log");
            None
        }
    }
}
