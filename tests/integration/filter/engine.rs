use alloy::primitives::{Address, U256};
use alloy_dyn_abi::DynSolValue;
use mockall::predicate;
use std::sync::Arc;

use crate::integration::mocks::{recording_callback, MockCallback};
use chain_scanner::{
	models::{BatchSource, BlockBatch, MonitorMatch, MonitorRule},
	services::filter::MonitorEngine,
	utils::tests::{FilterBuilder, TransactionRecordBuilder},
};

const TRANSFER_SELECTOR: &str = "0xa9059cbb";

fn transfer_input(recipient: Address, amount: u64) -> String {
	let args = DynSolValue::Tuple(vec![
		DynSolValue::Address(recipient),
		DynSolValue::Uint(U256::from(amount), 256),
	])
	.abi_encode_params();
	format!("{}{}", TRANSFER_SELECTOR, hex::encode(args))
}

#[tokio::test]
async fn test_erc20_transfer_argument_matching() {
	let recipient = Address::repeat_byte(0xab);
	let input = transfer_input(recipient, 5_000);
	let checksum_case = format!("0x{}", "AB".repeat(20));

	let by_recipient = FilterBuilder::new()
		.selector(TRANSFER_SELECTOR)
		.arguments(
			&["address", "uint256"],
			vec![Some(checksum_case.as_str()), None],
		)
		.build();
	let by_amount = FilterBuilder::new()
		.selector("0xA9059CBB")
		.arguments(&["address", "uint256"], vec![None, Some("5000")])
		.build();
	let wrong_amount = FilterBuilder::new()
		.selector(TRANSFER_SELECTOR)
		.arguments(&["address", "uint256"], vec![None, Some("4999")])
		.build();
	let wrong_selector = FilterBuilder::new().selector("0x23b872dd").build();

	let engine = MonitorEngine::with_default_decoder(vec![]);
	let with_prefix = TransactionRecordBuilder::new().input(&input).build();
	let without_prefix = TransactionRecordBuilder::new()
		.input(input.trim_start_matches("0x"))
		.build();

	for record in [&with_prefix, &without_prefix] {
		assert!(engine.matches(&by_recipient, record));
		assert!(engine.matches(&by_amount, record));
		assert!(!engine.matches(&wrong_amount, record));
		assert!(!engine.matches(&wrong_selector, record));
	}
}

#[tokio::test]
async fn test_malformed_call_data_is_a_mismatch() {
	let filter = FilterBuilder::new()
		.selector(TRANSFER_SELECTOR)
		.arguments(&["address", "uint256"], vec![None, Some("1")])
		.build();
	let engine = MonitorEngine::with_default_decoder(vec![]);

	let truncated = TransactionRecordBuilder::new()
		.input(&format!("{}0000", TRANSFER_SELECTOR))
		.build();
	let too_short = TransactionRecordBuilder::new().input("0xa905").build();

	assert!(!engine.matches(&filter, &truncated));
	assert!(!engine.matches(&filter, &too_short));
}

#[tokio::test]
async fn test_failing_callback_does_not_stop_other_rules() {
	let mut failing = MockCallback::new();
	failing
		.expect_on_match()
		.withf(|m: &MonitorMatch| m.rule == "failing")
		.times(2)
		.returning(|_| Err(anyhow::anyhow!("downstream unavailable")));

	let mut exact = MockCallback::new();
	exact
		.expect_on_match()
		.with(predicate::function(|m: &MonitorMatch| {
			m.transaction.value == U256::from(2_000)
		}))
		.times(1)
		.returning(|_| Ok(()));

	let (recording, seen) = recording_callback();
	let min_value = FilterBuilder::new().min_value(U256::from(1_500)).build();

	let engine = MonitorEngine::with_default_decoder(vec![
		MonitorRule::new("failing", None, Arc::new(failing)),
		MonitorRule::new("large", Some(min_value), Arc::new(exact)),
		MonitorRule::new("everything", None, recording),
	]);

	let batch = BlockBatch::new(
		12,
		vec![
			TransactionRecordBuilder::new()
				.height(12)
				.value(U256::from(1_000))
				.build(),
			TransactionRecordBuilder::new()
				.height(12)
				.value(U256::from(2_000))
				.build(),
		],
		BatchSource::Live,
	);

	let summary = engine.process_batch(&batch).await;

	assert_eq!(summary.matched, 5);
	assert_eq!(summary.failed, 2);
	assert_eq!(*seen.lock().unwrap(), vec![12, 12]);
}
