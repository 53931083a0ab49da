//! Webhook callback: POSTs each match as JSON.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest_middleware::ClientWithMiddleware;
use serde::Serialize;
use std::collections::HashMap;

use crate::{
	models::{MonitorCallback, MonitorMatch, TransactionRecord},
	services::notification::NotificationError,
	utils::{create_retryable_http_client, HttpClientConfig},
};

/// Body sent to the webhook.
#[derive(Debug, Serialize)]
pub struct WebhookPayload<'a> {
	pub rule: &'a str,
	pub block_height: u64,
	pub transaction: &'a TransactionRecord,
}

/// Delivers matches to an HTTP endpoint through a retrying client.
#[derive(Clone)]
pub struct WebhookCallback {
	url: String,
	headers: HeaderMap,
	client: ClientWithMiddleware,
}

impl WebhookCallback {
	/// Header names and values are checked here, not on every delivery.
	pub fn new(
		url: impl Into<String>,
		headers: &HashMap<String, String>,
		http: &HttpClientConfig,
	) -> Result<Self, NotificationError> {
		let url = url.into();
		let mut header_map = HeaderMap::new();
		for (key, value) in headers {
			let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
				NotificationError::config_error(
					format!("invalid header name: {}", key),
					Some(Box::new(e)),
					None,
				)
			})?;
			let value = HeaderValue::from_str(value).map_err(|e| {
				NotificationError::config_error(
					format!("invalid header value for key: {}", key),
					Some(Box::new(e)),
					None,
				)
			})?;
			header_map.insert(name, value);
		}

		let client = create_retryable_http_client(http).map_err(|e| {
			NotificationError::config_error("failed to create http client", Some(Box::new(e)), None)
		})?;

		Ok(Self {
			url,
			headers: header_map,
			client,
		})
	}

	pub fn url(&self) -> &str {
		&self.url
	}

	async fn send(&self, matched: &MonitorMatch) -> Result<(), NotificationError> {
		let payload = WebhookPayload {
			rule: &matched.rule,
			block_height: matched.transaction.block_height,
			transaction: &matched.transaction,
		};
		let metadata = || Some([("url".to_string(), self.url.clone())].into());

		let response = self
			.client
			.post(self.url.as_str())
			.headers(self.headers.clone())
			.json(&payload)
			.send()
			.await
			.map_err(|e| {
				NotificationError::network_error(
					"failed to send webhook notification",
					Some(Box::new(e)),
					metadata(),
				)
			})?;

		if !response.status().is_success() {
			return Err(NotificationError::network_error(
				format!("webhook returned error status: {}", response.status()),
				None,
				metadata(),
			));
		}
		Ok(())
	}
}

#[async_trait]
impl MonitorCallback for WebhookCallback {
	async fn on_match(&self, matched: &MonitorMatch) -> Result<(), anyhow::Error> {
		self.send(matched).await.map_err(Into::into)
	}
}
