//! ABI decoding of call-data arguments.

use alloy_dyn_abi::{DynSolType, DynSolValue};
use std::collections::HashMap;

use crate::services::filter::{helpers::format_token_value, FilterError};

/// Decodes call-data arguments into canonical string values.
///
/// `data` is the argument blob after the 4-byte selector; `types` are Solidity type
/// descriptors. Values come back in positional order.
pub trait AbiDecoder: Send + Sync {
	fn decode(&self, data: &[u8], types: &[String]) -> Result<Vec<String>, FilterError>;
}

/// [`AbiDecoder`] backed by `alloy-dyn-abi`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DynAbiDecoder;

impl AbiDecoder for DynAbiDecoder {
	fn decode(&self, data: &[u8], types: &[String]) -> Result<Vec<String>, FilterError> {
		let parsed = types
			.iter()
			.map(|s| s.parse::<DynSolType>())
			.collect::<Result<Vec<_>, _>>()
			.map_err(|e| {
				FilterError::invalid_input(
					format!("Failed to parse parameter types: {}", e),
					None,
					Some(HashMap::from([("types".to_string(), types.join(","))])),
				)
			})?;

		let values = match DynSolType::Tuple(parsed).abi_decode_params(data) {
			Ok(DynSolValue::Tuple(values)) => values,
			Ok(value) => vec![value],
			Err(e) => {
				return Err(FilterError::decode_error(
					format!("Failed to decode ABI parameters: {}", e),
					None,
					None,
				))
			}
		};

		Ok(values.iter().map(format_token_value).collect())
	}
}
