//! Builder for test [`ScannerConfig`] instances.

use crate::models::{
	ActionConfig, ChainType, DeliveryOrder, RetryPolicyConfig, RuleConfig, ScannerConfig,
	StartBlock,
};

pub struct ScannerConfigBuilder {
	config: ScannerConfig,
}

impl Default for ScannerConfigBuilder {
	fn default() -> Self {
		Self {
			config: ScannerConfig {
				name: "test-scanner".to_string(),
				chain_type: Some(ChainType::Evm),
				rpc_urls: vec!["http://localhost:8545".to_string()],
				scan_period_ms: 1000,
				start_block: StartBlock::Height(1),
				retry_policy: RetryPolicyConfig::default(),
				queue_capacity: None,
				delivery_order: DeliveryOrder::Arrival,
				request_timeout_ms: 30_000,
				rules: vec![RuleConfig {
					name: "all".to_string(),
					filter: None,
					action: ActionConfig::Log,
				}],
			},
		}
	}
}

impl ScannerConfigBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn name(mut self, name: &str) -> Self {
		self.config.name = name.to_string();
		self
	}

	pub fn chain_type(mut self, chain_type: Option<ChainType>) -> Self {
		self.config.chain_type = chain_type;
		self
	}

	pub fn rpc_urls(mut self, urls: Vec<String>) -> Self {
		self.config.rpc_urls = urls;
		self
	}

	pub fn scan_period_ms(mut self, period: u64) -> Self {
		self.config.scan_period_ms = period;
		self
	}

	pub fn start_block(mut self, start_block: StartBlock) -> Self {
		self.config.start_block = start_block;
		self
	}

	pub fn retry_policy(mut self, policy: RetryPolicyConfig) -> Self {
		self.config.retry_policy = policy;
		self
	}

	pub fn queue_capacity(mut self, capacity: Option<usize>) -> Self {
		self.config.queue_capacity = capacity;
		self
	}

	pub fn delivery_order(mut self, order: DeliveryOrder) -> Self {
		self.config.delivery_order = order;
		self
	}

	pub fn rules(mut self, rules: Vec<RuleConfig>) -> Self {
		self.config.rules = rules;
		self
	}

	pub fn rule(mut self, rule: RuleConfig) -> Self {
		self.config.rules.push(rule);
		self
	}

	pub fn build(self) -> ScannerConfig {
		self.config
	}
}
