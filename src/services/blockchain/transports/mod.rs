//! JSON-RPC transport used by chain clients.

mod error;
mod http;

pub use error::TransportError;
pub use http::HttpTransportClient;

use serde::Serialize;
use serde_json::{json, Value};

/// Base trait for blockchain transport clients
#[async_trait::async_trait]
pub trait BlockchainTransport: Send + Sync {
	/// URL requests are sent to
	fn url(&self) -> &str;

	/// Sends one request and returns the full JSON-RPC response object.
	async fn send_raw_request<P>(
		&self,
		method: &str,
		params: Option<P>,
	) -> Result<Value, TransportError>
	where
		P: Into<Value> + Send + Clone + Serialize;

	/// Builds the request body. Defaults to JSON-RPC 2.0.
	fn customize_request<P>(&self, method: &str, params: Option<P>) -> Value
	where
		P: Into<Value> + Send + Clone + Serialize,
	{
		json!({
			"jsonrpc": "2.0",
			"id": 1,
			"method": method,
			"params": params.map(|p| p.into())
		})
	}
}
