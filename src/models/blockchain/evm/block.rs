//! EVM block data structures.

use alloy::primitives::{B256, U256, U64};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, ops::Deref};

use super::EVMTransaction;

/// Block object as returned by `eth_getBlockByNumber(height, true)`.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct BaseBlock<TX> {
	/// Hash of the block. None if pending.
	#[serde(default)]
	pub hash: Option<B256>,
	/// Block number. None if pending.
	#[serde(default)]
	pub number: Option<U64>,
	/// Timestamp
	#[serde(default)]
	pub timestamp: Option<U256>,
	/// Transactions
	#[serde(default)]
	pub transactions: Vec<TX>,

	/// Catch-all for non-standard fields
	#[serde(flatten)]
	pub extra: HashMap<String, serde_json::Value>,
}

/// Wrapper around [`BaseBlock`] with full transaction objects
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Block(pub BaseBlock<EVMTransaction>);

impl Block {
	pub fn number(&self) -> Option<u64> {
		self.0.number.map(|n| n.to::<u64>())
	}
}

impl From<BaseBlock<EVMTransaction>> for Block {
	fn from(block: BaseBlock<EVMTransaction>) -> Self {
		Self(block)
	}
}

impl Deref for Block {
	type Target = BaseBlock<EVMTransaction>;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
