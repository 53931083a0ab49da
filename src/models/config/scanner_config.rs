//! Scanner configuration file model.
//!
//! A scanner configuration is a single JSON document describing one chain: its
//! endpoints, polling cadence, starting height, retry policy and monitoring rules.

use alloy::primitives::Address;
use alloy_dyn_abi::DynSolType;
use serde::{Deserialize, Serialize};
use std::{
	collections::{HashMap, HashSet},
	path::Path,
	str::FromStr,
	time::Duration,
};
use url::Url;

use crate::{
	models::{
		config::{ConfigError, ConfigLoader},
		CallDataFilter, ChainType, Filter,
	},
	utils::parsing::{is_valid_selector, string_to_u256},
};

/// Shortest accepted polling period.
pub const MIN_SCAN_PERIOD_MS: u64 = 500;

fn default_scan_period_ms() -> u64 {
	5000
}

fn default_request_timeout_ms() -> u64 {
	30_000
}

fn default_max_attempts() -> u32 {
	5
}

fn default_initial_delay_ms() -> u64 {
	1000
}

fn default_max_delay_ms() -> u64 {
	60_000
}

/// First height to scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "StartBlockRepr", into = "StartBlockRepr")]
pub enum StartBlock {
	/// Resolve to the chain tip on the first tick
	Latest,
	Height(u64),
}

impl Default for StartBlock {
	fn default() -> Self {
		StartBlock::Height(1)
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum StartBlockRepr {
	Height(u64),
	Tag(String),
}

impl TryFrom<StartBlockRepr> for StartBlock {
	type Error = String;

	fn try_from(value: StartBlockRepr) -> Result<Self, Self::Error> {
		match value {
			StartBlockRepr::Height(h) => Ok(StartBlock::Height(h)),
			StartBlockRepr::Tag(tag) if tag.eq_ignore_ascii_case("latest") => {
				Ok(StartBlock::Latest)
			}
			StartBlockRepr::Tag(tag) => tag
				.parse::<u64>()
				.map(StartBlock::Height)
				.map_err(|_| format!("invalid start block '{}'", tag)),
		}
	}
}

impl From<StartBlock> for StartBlockRepr {
	fn from(value: StartBlock) -> Self {
		match value {
			StartBlock::Latest => StartBlockRepr::Tag("latest".to_string()),
			StartBlock::Height(h) => StartBlockRepr::Height(h),
		}
	}
}

/// How retried batches are ordered relative to live ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryOrder {
	/// Dispatch batches as they arrive; a retried height may follow newer heights
	#[default]
	Arrival,
	/// Hold batches above the lowest pending retry height until it resolves
	Ordered,
}

/// Block-level retry policy for skipped heights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RetryPolicyConfig {
	Exponential {
		#[serde(default = "default_max_attempts")]
		max_attempts: u32,
		#[serde(default = "default_initial_delay_ms")]
		initial_delay_ms: u64,
		#[serde(default = "default_max_delay_ms")]
		max_delay_ms: u64,
	},
	/// Skipped heights are dropped without re-verification
	None,
}

impl Default for RetryPolicyConfig {
	fn default() -> Self {
		RetryPolicyConfig::Exponential {
			max_attempts: default_max_attempts(),
			initial_delay_ms: default_initial_delay_ms(),
			max_delay_ms: default_max_delay_ms(),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CallDataFilterConfig {
	pub selector: Option<String>,
	#[serde(default)]
	pub types: Vec<String>,
	#[serde(default)]
	pub values: Vec<Option<String>>,
}

/// Filter as written in the config file. Values are decimal or hex strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
	pub from_address: Option<String>,
	pub to_address: Option<String>,
	pub min_value: Option<String>,
	pub max_value: Option<String>,
	pub call_data: Option<CallDataFilterConfig>,
}

/// Built-in action run for each match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ActionConfig {
	#[default]
	Log,
	Webhook {
		url: String,
		#[serde(default)]
		headers: Option<HashMap<String, String>>,
	},
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
	pub name: String,
	#[serde(default)]
	pub filter: Option<FilterConfig>,
	#[serde(default)]
	pub action: ActionConfig,
}

/// Complete configuration of one scanner instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerConfig {
	pub name: String,
	#[serde(default)]
	pub chain_type: Option<ChainType>,
	#[serde(default)]
	pub rpc_urls: Vec<String>,
	#[serde(default = "default_scan_period_ms")]
	pub scan_period_ms: u64,
	#[serde(default)]
	pub start_block: StartBlock,
	#[serde(default)]
	pub retry_policy: RetryPolicyConfig,
	/// `None` means an unbounded event queue
	#[serde(default)]
	pub queue_capacity: Option<usize>,
	#[serde(default)]
	pub delivery_order: DeliveryOrder,
	#[serde(default = "default_request_timeout_ms")]
	pub request_timeout_ms: u64,
	#[serde(default)]
	pub rules: Vec<RuleConfig>,
}

impl ScannerConfig {
	pub fn scan_period(&self) -> Duration {
		Duration::from_millis(self.scan_period_ms)
	}

	pub fn request_timeout(&self) -> Duration {
		Duration::from_millis(self.request_timeout_ms)
	}
}

fn meta(key: &str, value: impl ToString) -> Option<HashMap<String, String>> {
	Some(HashMap::from([(key.to_string(), value.to_string())]))
}

fn normalize_config_address(field: &str, raw: &str) -> Result<String, ConfigError> {
	let address = Address::from_str(raw.trim()).map_err(|e| {
		ConfigError::validation_error(
			format!("{} is not a valid address", field),
			Some(Box::new(e)),
			meta(field, raw),
		)
	})?;
	Ok(format!("0x{:x}", address))
}

impl CallDataFilterConfig {
	pub fn to_filter(&self) -> Result<CallDataFilter, ConfigError> {
		if let Some(selector) = &self.selector {
			if !is_valid_selector(selector) {
				return Err(ConfigError::validation_error(
					"selector must be 0x followed by 8 hex digits",
					None,
					meta("selector", selector),
				));
			}
		}

		if self.values.len() > self.types.len() {
			return Err(ConfigError::validation_error(
				"more expected values than type descriptors",
				None,
				Some(HashMap::from([
					("types".to_string(), self.types.len().to_string()),
					("values".to_string(), self.values.len().to_string()),
				])),
			));
		}

		for ty in &self.types {
			ty.parse::<DynSolType>().map_err(|e| {
				ConfigError::validation_error(
					format!("unknown ABI type '{}': {}", ty, e),
					None,
					None,
				)
			})?;
		}

		Ok(CallDataFilter {
			selector: self.selector.as_ref().map(|s| s.to_lowercase()),
			types: self.types.clone(),
			values: self.values.clone(),
		})
	}
}

impl FilterConfig {
	/// Validates the filter and converts it into its runtime form.
	pub fn to_filter(&self) -> Result<Filter, ConfigError> {
		let parse_value = |field: &str, raw: &Option<String>| {
			raw.as_deref()
				.map(|v| {
					string_to_u256(v).map_err(|e| {
						ConfigError::validation_error(
							format!("{} is not a valid amount: {}", field, e),
							None,
							meta(field, v),
						)
					})
				})
				.transpose()
		};

		let min_value = parse_value("min_value", &self.min_value)?;
		let max_value = parse_value("max_value", &self.max_value)?;
		if let (Some(min), Some(max)) = (min_value, max_value) {
			if min > max {
				return Err(ConfigError::validation_error(
					"min_value is greater than max_value",
					None,
					None,
				));
			}
		}

		Ok(Filter {
			from_address: self
				.from_address
				.as_deref()
				.map(|a| normalize_config_address("from_address", a))
				.transpose()?,
			to_address: self
				.to_address
				.as_deref()
				.map(|a| normalize_config_address("to_address", a))
				.transpose()?,
			min_value,
			max_value,
			call_data: self
				.call_data
				.as_ref()
				.map(CallDataFilterConfig::to_filter)
				.transpose()?,
		})
	}
}

fn validate_url(field: &str, raw: &str) -> Result<(), ConfigError> {
	let url = Url::parse(raw).map_err(|e| {
		ConfigError::validation_error(
			format!("{} is not a valid URL", field),
			Some(Box::new(e)),
			meta(field, raw),
		)
	})?;
	if !matches!(url.scheme(), "http" | "https") {
		return Err(ConfigError::validation_error(
			format!("{} must use http or https", field),
			None,
			meta(field, raw),
		));
	}
	Ok(())
}

impl ConfigLoader for ScannerConfig {
	fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
		if !Self::is_json_file(path) {
			return Err(ConfigError::file_error(
				"config file must have a .json extension",
				None,
				meta("path", path.display()),
			));
		}

		let file = std::fs::File::open(path).map_err(|e| {
			ConfigError::file_error(
				format!("failed to open scanner config file: {}", e),
				Some(Box::new(e)),
				meta("path", path.display()),
			)
		})?;

		let config: ScannerConfig = serde_json::from_reader(file).map_err(|e| {
			ConfigError::parse_error(
				format!("failed to parse scanner config: {}", e),
				Some(Box::new(e)),
				meta("path", path.display()),
			)
		})?;

		config.validate()?;
		Ok(config)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.name.trim().is_empty() {
			return Err(ConfigError::validation_error(
				"scanner name is required",
				None,
				None,
			));
		}

		if self.chain_type.is_none() {
			return Err(ConfigError::validation_error(
				"chain type is not set",
				None,
				meta("scanner", &self.name),
			));
		}

		if self.rpc_urls.is_empty() {
			return Err(ConfigError::validation_error(
				"at least one RPC URL is required",
				None,
				meta("scanner", &self.name),
			));
		}
		for url in &self.rpc_urls {
			validate_url("rpc_url", url)?;
		}

		if self.scan_period_ms < MIN_SCAN_PERIOD_MS {
			return Err(ConfigError::validation_error(
				format!("scan period must be at least {} ms", MIN_SCAN_PERIOD_MS),
				None,
				meta("scan_period_ms", self.scan_period_ms),
			));
		}

		if self.request_timeout_ms == 0 {
			return Err(ConfigError::validation_error(
				"request timeout must be greater than zero",
				None,
				None,
			));
		}

		if self.queue_capacity == Some(0) {
			return Err(ConfigError::validation_error(
				"queue capacity must be greater than zero when set",
				None,
				None,
			));
		}

		if let RetryPolicyConfig::Exponential {
			max_attempts,
			initial_delay_ms,
			max_delay_ms,
		} = &self.retry_policy
		{
			if *max_attempts == 0 || initial_delay_ms > max_delay_ms {
				return Err(ConfigError::validation_error(
					"exponential retry policy needs max_attempts > 0 and initial_delay_ms <= max_delay_ms",
					None,
					None,
				));
			}
		}

		if self.chain_type == Some(ChainType::Evm) && self.rules.is_empty() {
			return Err(ConfigError::validation_error(
				"at least one monitoring rule is required",
				None,
				meta("scanner", &self.name),
			));
		}

		let mut seen = HashSet::new();
		for rule in &self.rules {
			if !seen.insert(rule.name.as_str()) {
				return Err(ConfigError::validation_error(
					format!("duplicate rule name '{}'", rule.name),
					None,
					None,
				));
			}
			if let Some(filter) = &rule.filter {
				filter.to_filter()?;
			}
			if let ActionConfig::Webhook { url, .. } = &rule.action {
				validate_url("webhook url", url)?;
			}
		}

		Ok(())
	}
}
