use alloy_primitives::B256;

use crate::erc20::{APPROVAL_EVENT, TRANSFER_EVENT};
use crate::hash::keccak256;
use crate::store::ITEM_SET_EVENT;

/// Topic 0 of an event: `keccak256(canonical signature)`.
pub fn event_topic(signature: &str) -> B256 {
    keccak256(signature.as_bytes())
}

/// Whether `topic` identifies the event with the given signature.
pub fn topic_matches(topic: &B256, signature: &str) -> bool {
    *topic == event_topic(signature)
}

/// Event families this probe knows how to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// ERC-20 `Transfer(address,address,uint256)`.
    Transfer,
    /// ERC-20 `Approval(address,address,uint256)`.
    Approval,
    /// Store `ItemSet(bytes32,bytes32)`.
    ItemSet,
    Unknown,
}

/// Maps topic 0 values to [`EventKind`]s.
#[derive(Debug, Clone, Default)]
pub struct EventRegistry {
    entries: Vec<(B256, EventKind)>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the ERC-20 and Store events.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(TRANSFER_EVENT, EventKind::Transfer);
        registry.register(APPROVAL_EVENT, EventKind::Approval);
        registry.register(ITEM_SET_EVENT, EventKind::ItemSet);
        registry
    }

    pub fn register(&mut self, signature: &str, kind: EventKind) {
        self.entries.push((event_topic(signature), kind));
    }

    /// Classifies a log by its first topic. Anonymous logs (no topics) and
    /// unregistered signatures are [`EventKind::Unknown`].
    pub fn classify(&self, topics: &[B256]) -> EventKind {
        let Some(first) = topics.first() else {
            return EventKind::Unknown;
        };

        self.entries
            .iter()
            .find(|(topic, _)| topic == first)
            .map(|(_, kind)| *kind)
            .unwrap_or(EventKind::Unknown)
    }
}
