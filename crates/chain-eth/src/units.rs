//! Conversions between base units (wei, token atoms) and decimal text.
//!
//! All arithmetic is exact on `U256`; no floating point is involved.

use alloy_primitives::U256;

use crate::error::EthError;

pub const ETHER_DECIMALS: u8 = 18;
pub const GWEI_DECIMALS: u8 = 9;

/// Largest decimal count whose power of ten still fits in a `U256`.
const MAX_DECIMALS: u8 = 77;

fn ten_pow(decimals: u8) -> Result<U256, EthError> {
    if decimals > MAX_DECIMALS {
        return Err(EthError::EncodingError(format!(
            "{decimals} decimals is out of range"
        )));
    }
    Ok(U256::from(10u64).pow(U256::from(decimals)))
}

/// Renders `value / 10^decimals` as a decimal string. Trailing fractional
/// zeros are trimmed, and a whole number has no decimal point.
pub fn format_units(value: U256, decimals: u8) -> Result<String, EthError> {
    if decimals == 0 {
        return Ok(value.to_string());
    }

    let base = ten_pow(decimals)?;
    let whole = value / base;
    let frac = value % base;

    if frac.is_zero() {
        return Ok(whole.to_string());
    }

    let frac = format!("{:0>width$}", frac.to_string(), width = usize::from(decimals));
    Ok(format!("{whole}.{}", frac.trim_end_matches('0')))
}

/// Formats a wei amount as ether.
pub fn wei_to_ether(wei: U256) -> String {
    // 18 is always in range.
    format_units(wei, ETHER_DECIMALS).unwrap_or_default()
}

/// Formats a wei amount as gwei.
pub fn wei_to_gwei(wei: U256) -> String {
    format_units(wei, GWEI_DECIMALS).unwrap_or_default()
}

/// Parses decimal text (`"1.5"`, `"0.001"`, `"42"`) into base units.
///
/// More fractional digits than `decimals` is an error rather than a silent
/// truncation.
pub fn parse_units(text: &str, decimals: u8) -> Result<U256, EthError> {
    let invalid = |why: &str| EthError::EncodingError(format!("invalid amount {text:?}: {why}"));

    let text = text.trim();
    let (whole, frac) = match text.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (text, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return Err(invalid("empty"));
    }
    if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        return Err(invalid("only digits and one '.' are allowed"));
    }
    if frac.len() > usize::from(decimals) {
        return Err(invalid("too many fractional digits"));
    }

    let overflow = || invalid("overflows uint256");
    let parse = |digits: &str| -> Result<U256, EthError> {
        if digits.is_empty() {
            Ok(U256::ZERO)
        } else {
            U256::from_str_radix(digits, 10).map_err(|_| overflow())
        }
    };

    let base = ten_pow(decimals)?;
    let frac_scale = ten_pow(decimals - frac.len() as u8)?;

    let whole = parse(whole)?.checked_mul(base).ok_or_else(overflow)?;
    let frac = parse(frac)?.checked_mul(frac_scale).ok_or_else(overflow)?;
    whole.checked_add(frac).ok_or_else(overflow)
}

/// Parses an ether amount into wei.
pub fn ether_to_wei(text: &str) -> Result<U256, EthError> {
    parse_units(text, ETHER_DECIMALS)
}
