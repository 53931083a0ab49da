//! Bootstrap functionality for the scanner service.
//!
//! Turns a loaded [`ScannerConfig`] into monitoring rules with their callbacks
//! and a configured [`ScanService`] ready to start.

use std::{error::Error, path::Path, sync::Arc};
use tracing::info;

use crate::{
	models::{ActionConfig, ConfigError, ConfigLoader, MonitorCallback, MonitorRule, ScannerConfig},
	services::{
		notification::{LogCallback, NotificationError, WebhookCallback},
		scanner::{RetryPolicy, ScanService},
	},
	utils::HttpClientConfig,
};

pub type Result<T> = std::result::Result<T, Box<dyn Error + Send + Sync>>;

/// Loads and validates the scanner configuration at `path`.
pub fn load_config(path: &Path) -> std::result::Result<ScannerConfig, ConfigError> {
	let config = ScannerConfig::load_from_path(path)?;
	info!(
		path = %path.display(),
		name = %config.name,
		rules = config.rules.len(),
		endpoints = config.rpc_urls.len(),
		"Loaded scanner configuration"
	);
	Ok(config)
}

/// HTTP settings shared by RPC clients and webhook callbacks.
pub fn http_config(config: &ScannerConfig) -> HttpClientConfig {
	HttpClientConfig::default().with_request_timeout(config.request_timeout())
}

/// Builds the callback for a configured action.
pub fn create_callback(
	action: &ActionConfig,
	http: &HttpClientConfig,
) -> std::result::Result<Arc<dyn MonitorCallback>, NotificationError> {
	match action {
		ActionConfig::Log => Ok(Arc::new(LogCallback)),
		ActionConfig::Webhook { url, headers } => Ok(Arc::new(WebhookCallback::new(
			url.clone(),
			&headers.clone().unwrap_or_default(),
			http,
		)?)),
	}
}

/// Builds the monitoring rules of `config` in declaration order.
pub fn create_rules(config: &ScannerConfig, http: &HttpClientConfig) -> Result<Vec<MonitorRule>> {
	config
		.rules
		.iter()
		.map(|rule| -> Result<MonitorRule> {
			let filter = rule.filter.as_ref().map(|f| f.to_filter()).transpose()?;
			let callback = create_callback(&rule.action, http)?;
			Ok(MonitorRule::new(rule.name.clone(), filter, callback))
		})
		.collect()
}

/// Builds a scan service from `config`. The service is not started.
pub fn create_scan_service(config: &ScannerConfig) -> Result<ScanService> {
	let http = http_config(config);
	let rules = create_rules(config, &http)?;
	let retry_policy: Arc<dyn RetryPolicy> = (&config.retry_policy).into();

	let mut builder = ScanService::builder()
		.name(config.name.clone())
		.endpoints(config.rpc_urls.iter().cloned())
		.retry_policy(retry_policy)
		.scan_period(config.scan_period())
		.start_block(config.start_block)
		.delivery_order(config.delivery_order)
		.http_config(http)
		.rules(rules);
	if let Some(chain_type) = config.chain_type {
		builder = builder.chain_type(chain_type);
	}
	if let Some(capacity) = config.queue_capacity {
		builder = builder.queue_capacity(capacity);
	}

	Ok(builder.build())
}
