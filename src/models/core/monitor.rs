//! Monitoring rules: an optional filter paired with a callback.

use alloy::primitives::U256;
use async_trait::async_trait;
use std::{fmt, sync::Arc};

use crate::models::MonitorMatch;

/// Receives every transaction that satisfies a rule.
///
/// Errors are logged by the dispatch stage and never reach the scanner.
#[async_trait]
pub trait MonitorCallback: Send + Sync {
	async fn on_match(&self, matched: &MonitorMatch) -> Result<(), anyhow::Error>;
}

/// Adapts a synchronous closure into a [`MonitorCallback`].
pub struct FnCallback<F>(pub F);

#[async_trait]
impl<F> MonitorCallback for FnCallback<F>
where
	F: Fn(&MonitorMatch) -> Result<(), anyhow::Error> + Send + Sync,
{
	async fn on_match(&self, matched: &MonitorMatch) -> Result<(), anyhow::Error> {
		(self.0)(matched)
	}
}

/// Positional ABI argument constraint for a function call.
///
/// `values[i] == None` accepts any decoded value at position `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallDataFilter {
	/// `0x` + 8 hex chars, compared case-insensitively
	pub selector: Option<String>,
	/// Solidity type descriptors of the arguments, e.g. `address`, `uint256`
	pub types: Vec<String>,
	/// Expected canonical values
	pub values: Vec<Option<String>>,
}

/// Conjunction of predicates over a [`crate::models::TransactionRecord`].
///
/// Absent fields are not checked. Value bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
	pub from_address: Option<String>,
	pub to_address: Option<String>,
	pub min_value: Option<U256>,
	pub max_value: Option<U256>,
	pub call_data: Option<CallDataFilter>,
}

/// A named filter/callback pair. A rule without a filter matches everything.
#[derive(Clone)]
pub struct MonitorRule {
	pub name: String,
	pub filter: Option<Filter>,
	pub callback: Arc<dyn MonitorCallback>,
}

impl MonitorRule {
	pub fn new(
		name: impl Into<String>,
		filter: Option<Filter>,
		callback: Arc<dyn MonitorCallback>,
	) -> Self {
		Self {
			name: name.into(),
			filter,
			callback,
		}
	}
}

impl fmt::Debug for MonitorRule {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MonitorRule")
			.field("name", &self.name)
			.field("filter", &self.filter)
			.finish_non_exhaustive()
	}
}
