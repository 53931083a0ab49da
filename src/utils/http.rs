//! Shared HTTP client construction for RPC endpoints and webhook callbacks.

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{
	default_on_request_failure, default_on_request_success, policies::ExponentialBackoff, Jitter,
	Retryable, RetryTransientMiddleware, RetryableStrategy,
};
use std::time::Duration;

/// Timeouts and transport-level retry settings for one HTTP client.
///
/// Retries here cover a single request (connection resets, 5xx, 429). They are
/// independent of block-level retries, which the retry scheduler owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientConfig {
	/// Upper bound for a whole request, body included
	pub request_timeout: Duration,
	/// Upper bound for establishing the TCP/TLS connection
	pub connect_timeout: Duration,
	/// Maximum number of transport retries per request
	pub max_retries: u32,
	/// First backoff between transport retries
	pub initial_backoff: Duration,
	/// Cap on transport retry backoff
	pub max_backoff: Duration,
}

impl Default for HttpClientConfig {
	fn default() -> Self {
		Self {
			request_timeout: Duration::from_secs(30),
			connect_timeout: Duration::from_secs(20),
			max_retries: 3,
			initial_backoff: Duration::from_millis(250),
			max_backoff: Duration::from_secs(10),
		}
	}
}

impl HttpClientConfig {
	pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = timeout;
		self
	}

	pub fn with_max_retries(mut self, max_retries: u32) -> Self {
		self.max_retries = max_retries;
		self
	}
}

/// Retries on the status codes and connection errors `reqwest-retry` deems transient.
pub struct TransientErrorRetryStrategy;

impl RetryableStrategy for TransientErrorRetryStrategy {
	fn handle(
		&self,
		res: &Result<reqwest::Response, reqwest_middleware::Error>,
	) -> Option<Retryable> {
		match res {
			Ok(success) => default_on_request_success(success),
			Err(error) => default_on_request_failure(error),
		}
	}
}

/// Builds a pooled client with explicit timeouts and exponential transport retries.
pub fn create_retryable_http_client(
	config: &HttpClientConfig,
) -> Result<ClientWithMiddleware, reqwest::Error> {
	let base_client = reqwest::ClientBuilder::new()
		.pool_idle_timeout(Duration::from_secs(90))
		.pool_max_idle_per_host(32)
		.timeout(config.request_timeout)
		.connect_timeout(config.connect_timeout)
		.build()?;

	let retry_policy = ExponentialBackoff::builder()
		.base(2)
		.jitter(Jitter::Full)
		.retry_bounds(config.initial_backoff, config.max_backoff)
		.build_with_max_retries(config.max_retries);

	Ok(ClientBuilder::new(base_client)
		.with(RetryTransientMiddleware::new_with_policy_and_strategy(
			retry_policy,
			TransientErrorRetryStrategy,
		))
		.build())
}
