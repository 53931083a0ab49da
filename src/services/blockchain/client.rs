//! Core blockchain client interface.

use async_trait::async_trait;

use crate::models::BlockType;

/// Read access to a chain through one endpoint.
///
/// "Not found" and "failed" are kept apart: a missing block is `Ok(None)`, while
/// transport and decoding failures are `Err`.
#[async_trait]
pub trait BlockChainClient: Send + Sync + Clone {
	/// Current tip height
	async fn get_latest_block_number(&self) -> Result<u64, anyhow::Error>;

	/// Block at `height` with full transaction objects, or `None` when the node has no data for it
	async fn get_block_by_number(&self, height: u64) -> Result<Option<BlockType>, anyhow::Error>;
}
