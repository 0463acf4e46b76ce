//! Serde helpers for JSON-RPC `QUANTITY` values (`"0x1a"`) held in `u64`.

use serde::{de, Deserialize, Deserializer, Serializer};

/// Formats a `u64` as a minimal `0x` hex quantity.
pub fn to_hex(value: u64) -> String {
    format!("{value:#x}")
}

/// Parses a `0x` hex quantity. Some nodes send plain decimal numbers for a
/// few fields, so a missing prefix is read as decimal.
pub fn parse(text: &str) -> Result<u64, String> {
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some("") => Err(format!("empty quantity {text:?}")),
        Some(digits) => u64::from_str_radix(digits, 16).map_err(|e| format!("{text:?}: {e}")),
        None => text.parse().map_err(|e| format!("{text:?}: {e}")),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Raw {
    Text(String),
    Number(u64),
}

impl Raw {
    fn into_u64<E: de::Error>(self) -> Result<u64, E> {
        match self {
            Raw::Text(text) => parse(&text).map_err(E::custom),
            Raw::Number(n) => Ok(n),
        }
    }
}

pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&to_hex(*value))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Raw::deserialize(deserializer)?.into_u64()
}

/// Same as the parent module, for optional fields.
pub mod opt {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_str(&to_hex(*v)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
        Option::<Raw>::deserialize(deserializer)?
            .map(Raw::into_u64)
            .transpose()
    }
}
