//! Parsing utilities for values that appear in configuration and RPC payloads.

use alloy::primitives::U256;
use std::str::FromStr;

/// Parses a decimal or `0x`-prefixed hex string into a `U256`.
pub fn string_to_u256(value_str: &str) -> Result<U256, String> {
	let trimmed = value_str.trim();
	if trimmed.is_empty() {
		return Err("Input string is empty".to_string());
	}

	match trimmed
		.strip_prefix("0x")
		.or_else(|| trimmed.strip_prefix("0X"))
	{
		Some("") => Err("Hex string '0x' is missing value digits".to_string()),
		Some(hex_val) => U256::from_str_radix(hex_val, 16)
			.map_err(|e| format!("Failed to parse hex '{}': {}", hex_val, e)),
		None => U256::from_str(trimmed)
			.map_err(|e| format!("Failed to parse decimal '{}': {}", trimmed, e)),
	}
}

/// Parses a JSON-RPC quantity such as `"0x1b4"`.
pub fn parse_hex_quantity(value: &str) -> Result<u64, String> {
	let digits = value
		.strip_prefix("0x")
		.ok_or_else(|| format!("Quantity '{}' is missing the 0x prefix", value))?;
	u64::from_str_radix(digits, 16).map_err(|e| format!("Invalid quantity '{}': {}", value, e))
}

/// Whether `selector` is `0x` followed by exactly eight hex digits.
pub fn is_valid_selector(selector: &str) -> bool {
	selector
		.strip_prefix("0x")
		.or_else(|| selector.strip_prefix("0X"))
		.map(|digits| digits.len() == 8 && digits.chars().all(|c| c.is_ascii_hexdigit()))
		.unwrap_or(false)
}
