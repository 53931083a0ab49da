//! Chain families and the raw block shapes returned by their RPC clients.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod evm;

/// Supported chain families.
///
/// Only [`ChainType::Evm`] has a scanner; the others are reserved and are
/// rejected when a scan service starts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChainType {
	/// Ethereum compatible chains
	Evm,
	/// Solana (not implemented)
	Solana,
	/// Tron (not implemented)
	Tron,
}

impl fmt::Display for ChainType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			ChainType::Evm => "evm",
			ChainType::Solana => "solana",
			ChainType::Tron => "tron",
		};
		f.write_str(name)
	}
}

/// Block data from different chain families
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BlockType {
	/// # Note
	/// Box is used here to equalize the enum variants
	EVM(Box<evm::EVMBlock>),
}

impl BlockType {
	pub fn number(&self) -> Option<u64> {
		match self {
			BlockType::EVM(b) => b.number(),
		}
	}

	pub fn transaction_count(&self) -> usize {
		match self {
			BlockType::EVM(b) => b.transactions.len(),
		}
	}
}
