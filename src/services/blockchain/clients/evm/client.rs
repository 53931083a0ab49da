//! EVM-compatible blockchain client implementation.

use anyhow::Context;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::instrument;

use crate::{
	models::{BlockType, EVMBlock},
	services::blockchain::{
		client::BlockChainClient,
		transports::{BlockchainTransport, HttpTransportClient},
	},
	utils::{http::HttpClientConfig, parsing::parse_hex_quantity},
};

/// Client for Ethereum compatible JSON-RPC endpoints
#[derive(Clone, Debug)]
pub struct EvmClient<T: Send + Sync + Clone> {
	http_client: T,
}

impl<T: Send + Sync + Clone> EvmClient<T> {
	pub fn new_with_transport(http_client: T) -> Self {
		Self { http_client }
	}
}

impl EvmClient<HttpTransportClient> {
	/// Creates a client bound to one RPC URL.
	pub fn new(url: &str, config: &HttpClientConfig) -> Result<Self, anyhow::Error> {
		Ok(Self::new_with_transport(HttpTransportClient::new(
			url, config,
		)?))
	}
}

impl<T: Send + Sync + Clone + BlockchainTransport> EvmClient<T> {
	pub fn url(&self) -> &str {
		self.http_client.url()
	}
}

#[async_trait]
impl<T: Send + Sync + Clone + BlockchainTransport> BlockChainClient for EvmClient<T> {
	#[instrument(skip(self), fields(url = %self.http_client.url()))]
	async fn get_latest_block_number(&self) -> Result<u64, anyhow::Error> {
		let response = self
			.http_client
			.send_raw_request::<Value>("eth_blockNumber", None)
			.await
			.with_context(|| "Failed to get latest block number")?;

		let quantity = response
			.get("result")
			.and_then(|v| v.as_str())
			.ok_or_else(|| anyhow::anyhow!("Missing or invalid 'result' field"))?;

		parse_hex_quantity(quantity).map_err(|e| anyhow::anyhow!("Failed to parse block number: {}", e))
	}

	#[instrument(skip(self), fields(url = %self.http_client.url()))]
	async fn get_block_by_number(&self, height: u64) -> Result<Option<BlockType>, anyhow::Error> {
		let params = json!([format!("0x{:x}", height), true]);

		let response = self
			.http_client
			.send_raw_request("eth_getBlockByNumber", Some(params))
			.await
			.with_context(|| format!("Failed to get block: {}", height))?;

		let block_data = response
			.get("result")
			.ok_or_else(|| anyhow::anyhow!("Missing 'result' field"))?;

		if block_data.is_null() {
			return Ok(None);
		}

		let block: EVMBlock = serde_json::from_value(block_data.clone())
			.with_context(|| format!("Failed to parse block: {}", height))?;

		Ok(Some(BlockType::EVM(Box::new(block))))
	}
}
