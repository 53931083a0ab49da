//! Mock implementations shared by the integration tests.
//!
//! - [`MockEvmClient`]: scripted [`BlockChainClient`]
//! - [`MockCallback`]: monitor callback with call expectations

use alloy::primitives::{Address, U256, U64};
use async_trait::async_trait;
use mockall::mock;
use std::sync::{Arc, Mutex};

use chain_scanner::{
	models::{
		BlockType, EVMBaseBlock, EVMBaseTransaction, EVMBlock, EVMTransaction, FnCallback,
		MonitorCallback, MonitorMatch,
	},
	services::blockchain::BlockChainClient,
};

mock! {
	pub EvmClient {}

	#[async_trait]
	impl BlockChainClient for EvmClient {
		async fn get_latest_block_number(&self) -> Result<u64, anyhow::Error>;
		async fn get_block_by_number(&self, height: u64) -> Result<Option<BlockType>, anyhow::Error>;
	}

	impl Clone for EvmClient {
		fn clone(&self) -> Self;
	}
}

mock! {
	pub Callback {}

	#[async_trait]
	impl MonitorCallback for Callback {
		async fn on_match(&self, matched: &MonitorMatch) -> Result<(), anyhow::Error>;
	}
}

pub fn create_test_transaction(to: Address, value: u64, input: &str) -> EVMTransaction {
	EVMTransaction::from(EVMBaseTransaction {
		from: Some(Address::repeat_byte(0x11)),
		to: Some(to),
		value: Some(U256::from(value)),
		input: Some(input.to_string()),
		..Default::default()
	})
}

pub fn create_test_block(height: u64, transactions: Vec<EVMTransaction>) -> BlockType {
	BlockType::EVM(Box::new(EVMBlock::from(EVMBaseBlock {
		number: Some(U64::from(height)),
		transactions,
		..Default::default()
	})))
}

/// Block with `count` plain transfers to distinct recipients `0x..01`, `0x..02`, ...
pub fn create_transfer_block(height: u64, count: u8) -> BlockType {
	let transactions = (1..=count)
		.map(|i| create_test_transaction(Address::with_last_byte(i), 1_000, "0x"))
		.collect();
	create_test_block(height, transactions)
}

/// Callback that records the height of every match it receives.
pub fn recording_callback() -> (Arc<dyn MonitorCallback>, Arc<Mutex<Vec<u64>>>) {
	let seen = Arc::new(Mutex::new(Vec::new()));
	let sink = seen.clone();
	let callback = FnCallback(move |m: &MonitorMatch| -> Result<(), anyhow::Error> {
		sink.lock().unwrap().push(m.transaction.block_height);
		Ok(())
	});
	(Arc::new(callback), seen)
}
