//! HTTP JSON-RPC transport bound to a single endpoint.
//!
//! Failover across endpoints is the endpoint pool's job; this client only retries
//! transient failures of one request against its own URL.

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use url::Url;

use crate::{
	services::blockchain::transports::{BlockchainTransport, TransportError},
	utils::http::{create_retryable_http_client, HttpClientConfig},
};

#[derive(Clone, Debug)]
pub struct HttpTransportClient {
	client: ClientWithMiddleware,
	url: Url,
}

impl HttpTransportClient {
	/// Creates a client for `url` with explicit timeouts and transport retries.
	pub fn new(url: &str, config: &HttpClientConfig) -> Result<Self, anyhow::Error> {
		let url = Url::parse(url).map_err(|e| anyhow::anyhow!("Invalid RPC URL {}: {}", url, e))?;
		let client = create_retryable_http_client(config)
			.map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;
		Ok(Self { client, url })
	}

	pub fn new_with_client(url: Url, client: ClientWithMiddleware) -> Self {
		Self { client, url }
	}
}

#[async_trait]
impl BlockchainTransport for HttpTransportClient {
	fn url(&self) -> &str {
		self.url.as_str()
	}

	async fn send_raw_request<P>(
		&self,
		method: &str,
		params: Option<P>,
	) -> Result<Value, TransportError>
	where
		P: Into<Value> + Send + Clone + Serialize,
	{
		let request_body = self.customize_request(method, params);
		let metadata = || {
			Some(HashMap::from([
				("method".to_string(), method.to_string()),
				("url".to_string(), self.url.to_string()),
			]))
		};

		let body = serde_json::to_vec(&request_body).map_err(|e| {
			TransportError::request_serialization(
				"Failed to serialize request",
				Some(Box::new(e)),
				metadata(),
			)
		})?;

		let response = self
			.client
			.post(self.url.clone())
			.header("Content-Type", "application/json")
			.body(body)
			.send()
			.await
			.map_err(|e| TransportError::network(e.to_string(), Some(Box::new(e)), metadata()))?;

		let status = response.status();
		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			return Err(TransportError::http(
				status,
				self.url.to_string(),
				body,
				None,
				metadata(),
			));
		}

		let json: Value = response.json().await.map_err(|e| {
			TransportError::response_parse(
				"Failed to parse response body",
				Some(Box::new(e)),
				metadata(),
			)
		})?;

		if let Some(error) = json.get("error").filter(|e| !e.is_null()) {
			return Err(TransportError::response_parse(
				format!("JSON-RPC error: {}", error),
				None,
				metadata(),
			));
		}

		Ok(json)
	}
}
