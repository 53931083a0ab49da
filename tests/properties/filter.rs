use alloy::primitives::U256;
use proptest::prelude::*;

use crate::properties::strategies::{address_hex, u256_value};
use chain_scanner::{
	models::TransactionRecord,
	services::filter::MonitorEngine,
	utils::tests::{FilterBuilder, TransactionRecordBuilder},
};

proptest! {
	#[test]
	fn test_address_match_ignores_case(address in address_hex()) {
		let engine = MonitorEngine::with_default_decoder(vec![]);
		let record = TransactionRecordBuilder::new()
			.from(&address.to_lowercase())
			.to(&address.to_uppercase().replacen("0X", "0x", 1))
			.build();

		let filter = FilterBuilder::new()
			.from_address(&address.to_uppercase())
			.to_address(&address)
			.build();
		prop_assert!(engine.matches(&filter, &record));
	}

	#[test]
	fn test_value_bounds_are_inclusive(
		value in u256_value(),
		a in u256_value(),
		b in u256_value(),
	) {
		let (min, max) = if a <= b { (a, b) } else { (b, a) };
		let engine = MonitorEngine::with_default_decoder(vec![]);
		let record = TransactionRecordBuilder::new().value(value).build();
		let filter = FilterBuilder::new().min_value(min).max_value(max).build();

		prop_assert_eq!(engine.matches(&filter, &record), min <= value && value <= max);

		let exact = FilterBuilder::new().min_value(value).max_value(value).build();
		prop_assert!(engine.matches(&exact, &record));
	}

	#[test]
	fn test_missing_value_counts_as_zero(min in u256_value()) {
		let engine = MonitorEngine::with_default_decoder(vec![]);
		let record = TransactionRecord::new(1, None, None, None, None, None);
		let filter = FilterBuilder::new().min_value(min).build();

		prop_assert_eq!(record.value, U256::ZERO);
		prop_assert_eq!(engine.matches(&filter, &record), min == U256::ZERO);
	}

	#[test]
	fn test_call_data_prefix_is_normalized(body in "[0-9a-f]{8,64}") {
		let with_prefix = TransactionRecordBuilder::new().input(&format!("0x{}", body)).build();
		let without_prefix = TransactionRecordBuilder::new().input(&body).build();
		prop_assert_eq!(with_prefix.input, without_prefix.input);
	}
}
