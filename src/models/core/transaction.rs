//! Chain-agnostic transaction and batch records produced by a scanner tick.

use alloy::primitives::U256;
use serde::Serialize;

use crate::models::EVMTransaction;

/// Transaction fields needed by the filter engine, already normalized.
///
/// Addresses are lowercase `0x` hex, `value` defaults to zero when the node omits
/// it and `input` always carries a `0x` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRecord {
	/// Height of the block that contains the transaction
	pub block_height: u64,
	/// Transaction hash, when the node reported one
	pub hash: Option<String>,
	/// Sender address
	pub from: Option<String>,
	/// Recipient address, absent for contract creation
	pub to: Option<String>,
	/// Transferred value
	pub value: U256,
	/// Call data
	pub input: String,
}

impl TransactionRecord {
	/// Builds a record, applying the value and call-data normalization.
	pub fn new(
		block_height: u64,
		hash: Option<String>,
		from: Option<String>,
		to: Option<String>,
		value: Option<U256>,
		input: Option<&str>,
	) -> Self {
		Self {
			block_height,
			hash,
			from: from.map(|a| a.to_lowercase()),
			to: to.map(|a| a.to_lowercase()),
			value: value.unwrap_or(U256::ZERO),
			input: normalize_call_data(input),
		}
	}

	pub fn from_evm(block_height: u64, tx: &EVMTransaction) -> Self {
		Self::new(
			block_height,
			tx.hash_hex(),
			tx.sender().map(|a| format!("0x{:x}", a)),
			tx.to().map(|a| format!("0x{:x}", a)),
			tx.value,
			tx.input.as_deref(),
		)
	}
}

/// Prefixes `0x` when missing; absent call data becomes `0x`.
fn normalize_call_data(input: Option<&str>) -> String {
	let raw = input.unwrap_or("").trim();
	if raw.starts_with("0x") || raw.starts_with("0X") {
		format!("0x{}", &raw[2..])
	} else {
		format!("0x{}", raw)
	}
}

/// Where a batch came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchSource {
	/// Produced by the main scan cursor
	Live,
	/// Produced by re-verifying a skipped height
	Retry,
}

/// Transactions of one fetched, non-empty block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockBatch {
	pub height: u64,
	pub transactions: Vec<TransactionRecord>,
	pub source: BatchSource,
}

impl BlockBatch {
	pub fn new(height: u64, transactions: Vec<TransactionRecord>, source: BatchSource) -> Self {
		Self {
			height,
			transactions,
			source,
		}
	}
}

/// A record that satisfied a rule, handed to the rule's callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitorMatch {
	pub rule: String,
	pub transaction: TransactionRecord,
}

/// Height waiting for re-verification, with the attempts made so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryEntry {
	pub height: u64,
	pub attempts: u32,
}

impl RetryEntry {
	pub fn new(height: u64) -> Self {
		Self {
			height,
			attempts: 0,
		}
	}

	pub fn next_attempt(self) -> Self {
		Self {
			height: self.height,
			attempts: self.attempts.saturating_add(1),
		}
	}
}
