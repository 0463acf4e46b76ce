//! Parsing of contract ABI JSON as emitted by `solc --abi`.
//!
//! Only the fields needed to rebuild canonical signatures are read; tuple
//! components and `internalType` are ignored.

use alloy_primitives::B256;
use serde::Deserialize;

use crate::abi::{selector, ParamType};
use crate::error::EthError;
use crate::event::event_topic;

/// One input or output parameter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AbiInput {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub indexed: bool,
}

/// An entry of the ABI array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AbiItem {
    Function {
        name: String,
        #[serde(default)]
        inputs: Vec<AbiInput>,
        #[serde(default)]
        outputs: Vec<AbiInput>,
        #[serde(default, rename = "stateMutability")]
        state_mutability: Option<String>,
    },
    Event {
        name: String,
        #[serde(default)]
        inputs: Vec<AbiInput>,
        #[serde(default)]
        anonymous: bool,
    },
    Constructor {
        #[serde(default)]
        inputs: Vec<AbiInput>,
    },
    #[serde(other)]
    Other,
}

impl AbiItem {
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Function { name, .. } | Self::Event { name, .. } => Some(name),
            Self::Constructor { .. } | Self::Other => None,
        }
    }

    pub fn inputs(&self) -> &[AbiInput] {
        match self {
            Self::Function { inputs, .. }
            | Self::Event { inputs, .. }
            | Self::Constructor { inputs } => inputs,
            Self::Other => &[],
        }
    }

    /// Parameter types of the inputs, rejecting anything the encoder does not
    /// support.
    pub fn input_types(&self) -> Result<Vec<ParamType>, EthError> {
        self.inputs().iter().map(|i| ParamType::parse(&i.ty)).collect()
    }

    /// Canonical signature, e.g. `transfer(address,uint256)`. Constructors and
    /// other entries have none.
    pub fn signature(&self) -> Option<String> {
        let name = self.name()?;
        let types: Vec<&str> = self.inputs().iter().map(|i| i.ty.as_str()).collect();
        Some(format!("{name}({})", types.join(",")))
    }
}

/// A parsed contract ABI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractAbi {
    items: Vec<AbiItem>,
}

impl ContractAbi {
    pub fn from_json(json: &str) -> Result<Self, EthError> {
        let items: Vec<AbiItem> = serde_json::from_str(json)
            .map_err(|e| EthError::DecodingError(format!("invalid abi json: {e}")))?;
        Ok(Self { items })
    }

    pub fn items(&self) -> &[AbiItem] {
        &self.items
    }

    pub fn function(&self, name: &str) -> Option<&AbiItem> {
        self.items
            .iter()
            .find(|item| matches!(item, AbiItem::Function { .. }) && item.name() == Some(name))
    }

    pub fn event(&self, name: &str) -> Option<&AbiItem> {
        self.items
            .iter()
            .find(|item| matches!(item, AbiItem::Event { .. }) && item.name() == Some(name))
    }

    pub fn constructor(&self) -> Option<&AbiItem> {
        self.items
            .iter()
            .find(|item| matches!(item, AbiItem::Constructor { .. }))
    }

    /// Selector of the named function.
    pub fn selector(&self, name: &str) -> Result<[u8; 4], EthError> {
        self.function(name)
            .and_then(AbiItem::signature)
            .map(|sig| selector(&sig))
            .ok_or_else(|| EthError::ArgumentMismatch(format!("no function named {name}")))
    }

    /// Topic 0 of the named event.
    pub fn topic(&self, name: &str) -> Result<B256, EthError> {
        self.event(name)
            .and_then(AbiItem::signature)
            .map(|sig| event_topic(&sig))
            .ok_or_else(|| EthError::ArgumentMismatch(format!("no event named {name}")))
    }
}
