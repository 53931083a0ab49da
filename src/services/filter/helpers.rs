//! Normalization and formatting helpers for EVM filter evaluation.

use alloy_dyn_abi::DynSolValue;

/// Hex characters in `0x` + 4-byte selector
pub const SELECTOR_HEX_LEN: usize = 10;

/// Strips `0x`, removes spaces and lowercases.
pub fn normalize_address(address: &str) -> String {
	address
		.strip_prefix("0x")
		.or_else(|| address.strip_prefix("0X"))
		.unwrap_or(address)
		.replace(' ', "")
		.to_lowercase()
}

pub fn are_same_address(address1: &str, address2: &str) -> bool {
	normalize_address(address1) == normalize_address(address2)
}

/// Leading selector of prefixed call data, lowercased. `None` when too short.
pub fn call_data_selector(input: &str) -> Option<String> {
	input
		.get(..SELECTOR_HEX_LEN)
		.map(|selector| selector.to_lowercase())
}

/// Call data after the selector, as raw bytes.
pub fn call_data_arguments(input: &str) -> Result<Vec<u8>, hex::FromHexError> {
	hex::decode(input.get(SELECTOR_HEX_LEN..).unwrap_or(""))
}

/// Canonical string form of a decoded ABI value.
///
/// Addresses and byte strings are lowercase `0x` hex, integers are decimal, and
/// composite values are bracketed lists.
pub fn format_token_value(token: &DynSolValue) -> String {
	let join = |values: &[DynSolValue]| {
		values
			.iter()
			.map(format_token_value)
			.collect::<Vec<_>>()
			.join(",")
	};

	match token {
		DynSolValue::Address(addr) => format!("0x{:x}", addr),
		DynSolValue::FixedBytes(bytes, size) => format!("0x{}", hex::encode(&bytes[..*size])),
		DynSolValue::Bytes(bytes) => format!("0x{}", hex::encode(bytes)),
		DynSolValue::Int(num, _) => num.to_string(),
		DynSolValue::Uint(num, _) => num.to_string(),
		DynSolValue::Bool(b) => b.to_string(),
		DynSolValue::String(s) => s.clone(),
		DynSolValue::Array(values) | DynSolValue::FixedArray(values) => {
			format!("[{}]", join(values))
		}
		DynSolValue::Tuple(values) => format!("({})", join(values)),
		DynSolValue::Function(function) => format!("0x{}", hex::encode(function.as_slice())),
	}
}
