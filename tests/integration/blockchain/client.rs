use mockito::{Matcher, Server};
use serde_json::json;

use chain_scanner::{
	models::BlockType,
	services::blockchain::{BlockChainClient, EndpointPool, EvmClient, HttpTransportClient},
	utils::HttpClientConfig,
};

fn no_retries() -> HttpClientConfig {
	HttpClientConfig::default().with_max_retries(0)
}

fn block_response(height: u64) -> serde_json::Value {
	json!({
		"jsonrpc": "2.0",
		"id": 1,
		"result": {
			"hash": format!("0x{:064x}", height),
			"number": format!("0x{:x}", height),
			"timestamp": "0x65",
			"transactions": [{
				"hash": format!("0x{:064x}", height + 1),
				"blockNumber": format!("0x{:x}", height),
				"transactionIndex": "0x0",
				"from": "0x1111111111111111111111111111111111111111",
				"to": "0x2222222222222222222222222222222222222222",
				"value": "0xde0b6b3a7640000",
				"input": "0xa9059cbb"
			}]
		}
	})
}

#[tokio::test]
async fn test_pool_rotates_between_rpc_endpoints() {
	let mut first = Server::new_async().await;
	let mut second = Server::new_async().await;

	let first_tip = first
		.mock("POST", "/")
		.match_body(Matcher::PartialJson(json!({"method": "eth_blockNumber"})))
		.with_body(json!({"jsonrpc": "2.0", "id": 1, "result": "0x64"}).to_string())
		.expect(1)
		.create_async()
		.await;
	let second_block = second
		.mock("POST", "/")
		.match_body(Matcher::PartialJson(json!({
			"method": "eth_getBlockByNumber",
			"params": ["0x64", true]
		})))
		.with_body(block_response(100).to_string())
		.expect(1)
		.create_async()
		.await;

	let pool = EndpointPool::new(vec![
		EvmClient::<HttpTransportClient>::new(&first.url(), &no_retries()).unwrap(),
		EvmClient::<HttpTransportClient>::new(&second.url(), &no_retries()).unwrap(),
	])
	.unwrap();

	let tip = pool.next().get_latest_block_number().await.unwrap();
	assert_eq!(tip, 100);

	let block = pool.next().get_block_by_number(tip).await.unwrap().unwrap();
	let BlockType::EVM(block) = block;
	assert_eq!(block.number(), Some(100));
	assert_eq!(block.transactions.len(), 1);

	first_tip.assert_async().await;
	second_block.assert_async().await;
}

#[tokio::test]
async fn test_unknown_block_is_none() {
	let mut server = Server::new_async().await;
	let mock = server
		.mock("POST", "/")
		.with_body(json!({"jsonrpc": "2.0", "id": 1, "result": null}).to_string())
		.create_async()
		.await;

	let client = EvmClient::<HttpTransportClient>::new(&server.url(), &no_retries()).unwrap();

	assert!(client.get_block_by_number(999).await.unwrap().is_none());
	mock.assert_async().await;
}

#[tokio::test]
async fn test_server_error_is_an_error() {
	let mut server = Server::new_async().await;
	let mock = server
		.mock("POST", "/")
		.with_status(500)
		.create_async()
		.await;

	let client = EvmClient::<HttpTransportClient>::new(&server.url(), &no_retries()).unwrap();

	assert!(client.get_latest_block_number().await.is_err());
	mock.assert_async().await;
}
