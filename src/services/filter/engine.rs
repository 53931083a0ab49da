//! Monitor engine: evaluates rule filters against transaction records and runs
//! the callbacks of matching rules.
//!
//! Filter evaluation is pure and may run concurrently for unrelated records.
//! Predicates are checked in a fixed order and stop at the first failure:
//! from-address, to-address, min-value, max-value, call data.

use std::sync::Arc;

use tracing::{debug, error, instrument, warn};

use crate::{
	models::{BlockBatch, CallDataFilter, Filter, MonitorMatch, MonitorRule, TransactionRecord},
	services::filter::{
		decoder::{AbiDecoder, DynAbiDecoder},
		helpers::{are_same_address, call_data_arguments, call_data_selector},
	},
};

/// Outcome counts of dispatching one record or batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
	/// Rules whose filter matched
	pub matched: usize,
	/// Matched rules whose callback returned an error or panicked
	pub failed: usize,
}

impl DispatchSummary {
	fn merge(self, other: DispatchSummary) -> Self {
		Self {
			matched: self.matched + other.matched,
			failed: self.failed + other.failed,
		}
	}
}

/// Immutable rule set plus the decoder used for call-data constraints.
#[derive(Clone)]
pub struct MonitorEngine {
	rules: Arc<[MonitorRule]>,
	decoder: Arc<dyn AbiDecoder>,
}

impl MonitorEngine {
	pub fn new(rules: Vec<MonitorRule>, decoder: Arc<dyn AbiDecoder>) -> Self {
		Self {
			rules: rules.into(),
			decoder,
		}
	}

	pub fn with_default_decoder(rules: Vec<MonitorRule>) -> Self {
		Self::new(rules, Arc::new(DynAbiDecoder))
	}

	pub fn rules(&self) -> &[MonitorRule] {
		&self.rules
	}

	/// Whether `record` satisfies every present predicate of `filter`.
	pub fn matches(&self, filter: &Filter, record: &TransactionRecord) -> bool {
		if let Some(expected) = address_constraint(&filter.from_address) {
			match &record.from {
				Some(from) if are_same_address(expected, from) => {}
				_ => return false,
			}
		}

		if let Some(expected) = address_constraint(&filter.to_address) {
			match &record.to {
				Some(to) if are_same_address(expected, to) => {}
				_ => return false,
			}
		}

		if filter.min_value.is_some_and(|min| record.value < min) {
			return false;
		}

		if filter.max_value.is_some_and(|max| record.value > max) {
			return false;
		}

		match &filter.call_data {
			Some(call_data) => self.matches_call_data(call_data, record),
			None => true,
		}
	}

	fn matches_call_data(&self, filter: &CallDataFilter, record: &TransactionRecord) -> bool {
		let Some(selector) = call_data_selector(&record.input) else {
			return false;
		};

		match &filter.selector {
			Some(expected) if expected.eq_ignore_ascii_case(&selector) => {}
			_ => return false,
		}

		if filter.values.is_empty() {
			return true;
		}

		if filter.types.len() < filter.values.len() {
			return false;
		}

		let decoded = match call_data_arguments(&record.input)
			.map_err(|e| e.to_string())
			.and_then(|data| {
				self.decoder
					.decode(&data, &filter.types)
					.map_err(|e| e.to_string())
			}) {
			Ok(decoded) => decoded,
			Err(e) => {
				debug!(
					selector = %selector,
					height = record.block_height,
					error = %e,
					"Call data did not decode, treating as mismatch"
				);
				return false;
			}
		};

		if decoded.len() < filter.values.len() {
			return false;
		}

		filter
			.values
			.iter()
			.zip(decoded.iter())
			.all(|(expected, actual)| match expected {
				None => true,
				Some(expected) => expected.to_lowercase() == actual.to_lowercase(),
			})
	}

	/// Rules matching `record`, in registration order.
	pub fn evaluate<'a>(&'a self, record: &TransactionRecord) -> Vec<&'a MonitorRule> {
		self.rules
			.iter()
			.filter(|rule| match &rule.filter {
				Some(filter) => self.matches(filter, record),
				None => true,
			})
			.collect()
	}

	/// Runs the callback of every matching rule.
	///
	/// Each callback runs in its own task so a panic is contained. Failures are
	/// logged and counted; they never stop the remaining rules.
	pub async fn dispatch(&self, record: &TransactionRecord) -> DispatchSummary {
		let mut summary = DispatchSummary::default();

		for rule in self.evaluate(record) {
			summary.matched += 1;

			let callback = rule.callback.clone();
			let matched = MonitorMatch {
				rule: rule.name.clone(),
				transaction: record.clone(),
			};
			let outcome =
				tokio::spawn(async move { callback.on_match(&matched).await }).await;

			match outcome {
				Ok(Ok(())) => {}
				Ok(Err(e)) => {
					summary.failed += 1;
					error!(
						rule = %rule.name,
						height = record.block_height,
						error = %e,
						"Monitor callback failed"
					);
				}
				Err(e) => {
					summary.failed += 1;
					warn!(
						rule = %rule.name,
						height = record.block_height,
						error = %e,
						"Monitor callback panicked"
					);
				}
			}
		}

		summary
	}

	/// Dispatches every transaction of `batch` in order.
	#[instrument(skip_all, fields(height = batch.height, source = ?batch.source))]
	pub async fn process_batch(&self, batch: &BlockBatch) -> DispatchSummary {
		let mut summary = DispatchSummary::default();
		for record in &batch.transactions {
			summary = summary.merge(self.dispatch(record).await);
		}
		debug!(
			transactions = batch.transactions.len(),
			matched = summary.matched,
			failed = summary.failed,
			"Batch dispatched"
		);
		summary
	}
}

/// A blank expected address places no constraint.
fn address_constraint(expected: &Option<String>) -> Option<&str> {
	expected
		.as_deref()
		.map(str::trim)
		.filter(|address| !address.is_empty())
}
