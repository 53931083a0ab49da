//! EVM transaction data structures.

use std::{collections::HashMap, ops::Deref};

use alloy::primitives::{Address, B256, U256, U64};
use serde::{Deserialize, Serialize};

/// Transaction object as returned by `eth_getBlockByNumber` with full transactions.
///
/// Only the fields the scanner reads are typed. `value` and `input` are optional
/// because some nodes omit them; normalization happens when the transaction is
/// turned into a [`crate::models::TransactionRecord`].
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct BaseTransaction {
	/// Hash
	#[serde(default)]
	pub hash: Option<B256>,
	/// Block number. None when pending.
	#[serde(rename = "blockNumber", default)]
	pub block_number: Option<U64>,
	/// Position in the block. None when pending.
	#[serde(rename = "transactionIndex", default)]
	pub transaction_index: Option<U64>,
	/// Sender
	#[serde(default)]
	pub from: Option<Address>,
	/// Recipient (None when contract creation)
	#[serde(default)]
	pub to: Option<Address>,
	/// Transferred value
	#[serde(default)]
	pub value: Option<U256>,
	/// Call data as a hex string
	#[serde(default)]
	pub input: Option<String>,

	/// Catch-all for non-standard fields
	#[serde(flatten)]
	pub extra: HashMap<String, serde_json::Value>,
}

/// Wrapper around [`BaseTransaction`]
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Transaction(pub BaseTransaction);

impl Transaction {
	/// Transaction hash as lowercase `0x` hex, if present
	pub fn hash_hex(&self) -> Option<String> {
		self.0.hash.map(|h| format!("{:#x}", h))
	}

	pub fn sender(&self) -> Option<&Address> {
		self.0.from.as_ref()
	}

	pub fn to(&self) -> Option<&Address> {
		self.0.to.as_ref()
	}
}

impl From<BaseTransaction> for Transaction {
	fn from(tx: BaseTransaction) -> Self {
		Self(tx)
	}
}

impl Deref for Transaction {
	type Target = BaseTransaction;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
