//! Domain models and data structures for chain scanning.
//!
//! - `blockchain`: chain families and their raw block/transaction shapes
//! - `config`: configuration loading and validation
//! - `core`: records, batches and monitoring rules

mod blockchain;
mod config;
mod core;

pub use blockchain::{BlockType, ChainType};

pub use blockchain::evm::{
	BaseBlock as EVMBaseBlock, BaseTransaction as EVMBaseTransaction, EVMBlock, EVMTransaction,
};

pub use core::{
	BatchSource, BlockBatch, CallDataFilter, Filter, FnCallback, MonitorCallback, MonitorMatch,
	MonitorRule, RetryEntry, TransactionRecord,
};

pub use config::{
	ActionConfig, CallDataFilterConfig, ConfigError, ConfigLoader, DeliveryOrder, FilterConfig,
	RetryPolicyConfig, RuleConfig, ScannerConfig, StartBlock, MIN_SCAN_PERIOD_MS,
};
