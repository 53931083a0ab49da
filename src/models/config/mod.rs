//! Configuration loading and validation.

#![allow(clippy::result_large_err)]

use std::path::Path;

mod error;
mod scanner_config;

pub use error::ConfigError;
pub use scanner_config::{
	ActionConfig, CallDataFilterConfig, DeliveryOrder, FilterConfig, RetryPolicyConfig,
	RuleConfig, ScannerConfig, StartBlock, MIN_SCAN_PERIOD_MS,
};

/// Common interface for loading configuration files
pub trait ConfigLoader: Sized {
	/// Reads, parses and validates a configuration file.
	fn load_from_path(path: &Path) -> Result<Self, ConfigError>;

	/// Checks semantic constraints serde cannot express.
	fn validate(&self) -> Result<(), ConfigError>;

	fn is_json_file(path: &Path) -> bool {
		path.extension()
			.map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("json"))
			.unwrap_or(false)
	}
}
