//! Per-chain scanning state machine.
//!
//! Each tick asks one endpoint for the tip, then for the block at the cursor:
//!
//! - cursor above tip: pause, nothing changes
//! - block missing or empty while tip > cursor: skip the height, register it for
//!   retry, advance by one
//! - block missing or empty at the tip: pause
//! - block with transactions: enqueue the batch, then advance by one
//! - fetch or enqueue failure: keep the cursor; with a non-zero error delay, ticks
//!   starting within that delay of the failed tick are skipped
//!
//! At most one height is processed per tick.

use async_trait::async_trait;
use std::{
	sync::Arc,
	time::{Duration, Instant},
};
use tracing::{debug, info, instrument, warn};

use crate::{
	models::{BatchSource, BlockBatch, BlockType, ChainType, StartBlock, TransactionRecord},
	services::{
		blockchain::{BlockChainClient, EndpointPool},
		scanner::{EventSender, RetryScheduler, ScannerError},
	},
};

/// Mutable progress of one scanner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanState {
	/// Next height to scan; `None` until the "latest" start is resolved against the tip
	pub cursor: Option<u64>,
	/// Ticks starting before this instant are skipped after a failure
	pub resume_at: Option<Instant>,
}

impl ScanState {
	pub fn new(start: StartBlock) -> Self {
		Self {
			cursor: match start {
				StartBlock::Latest => None,
				StartBlock::Height(height) => Some(height),
			},
			resume_at: None,
		}
	}
}

/// Result of a single tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
	/// A batch for `height` was enqueued and the cursor moved past it
	Advanced { height: u64, transactions: usize },
	/// Nothing new to scan
	Paused { cursor: u64, tip: u64 },
	/// `height` had no data although the tip is beyond it; it was handed to the retry scheduler
	Skipped { height: u64 },
	/// The tick failed; the cursor is unchanged
	Failed,
	/// Still inside the error delay of an earlier failure
	BackingOff,
}

/// Scanning capability of one chain family.
#[async_trait]
pub trait ChainScanner: Send + Sync {
	fn chain_type(&self) -> ChainType;

	/// Runs one tick against `state`.
	async fn scan(&self, state: &mut ScanState) -> TickOutcome;

	/// Fetches the block at `height` as a batch, or `None` when it is missing or has no transactions.
	async fn fetch_batch(
		&self,
		height: u64,
		source: BatchSource,
	) -> Result<Option<BlockBatch>, ScannerError>;

	/// Hands a batch to the event queue.
	async fn dispatch(&self, batch: BlockBatch) -> Result<(), ScannerError>;
}

/// Scanner for EVM chains over JSON-RPC.
pub struct EvmChainScanner<C> {
	pool: Arc<EndpointPool<C>>,
	queue: EventSender,
	retries: RetryScheduler,
	error_delay: Duration,
}

impl<C: BlockChainClient + 'static> EvmChainScanner<C> {
	/// `error_delay` is an extra pause after a failed tick, measured from the start
	/// of that tick. `Duration::ZERO` retries on the next tick.
	pub fn new(
		pool: Arc<EndpointPool<C>>,
		queue: EventSender,
		retries: RetryScheduler,
		error_delay: Duration,
	) -> Self {
		Self {
			pool,
			queue,
			retries,
			error_delay,
		}
	}

	async fn try_scan(&self, state: &mut ScanState) -> Result<TickOutcome, ScannerError> {
		let client = self.pool.next();
		let tip = client.get_latest_block_number().await.map_err(|e| {
			ScannerError::fetch_error("failed to fetch chain tip", Some(e.into()), None)
		})?;

		let cursor = *state.cursor.get_or_insert(tip);
		if cursor > tip {
			debug!(cursor, tip, "Cursor ahead of tip");
			return Ok(TickOutcome::Paused { cursor, tip });
		}

		let block = client
			.get_block_by_number(cursor)
			.await
			.map_err(|e| fetch_failed(cursor, e))?;
		let transactions = block
			.map(|block| block_records(cursor, &block))
			.unwrap_or_default();

		if transactions.is_empty() {
			if tip > cursor {
				state.cursor = Some(cursor + 1);
				self.retries.add(cursor);
				info!(height = cursor, tip, "Skipped height without transactions");
				return Ok(TickOutcome::Skipped { height: cursor });
			}
			debug!(cursor, tip, "Waiting for block data at tip");
			return Ok(TickOutcome::Paused { cursor, tip });
		}

		let count = transactions.len();
		self.dispatch(BlockBatch::new(cursor, transactions, BatchSource::Live))
			.await?;
		state.cursor = Some(cursor + 1);
		debug!(height = cursor, transactions = count, "Block enqueued");
		Ok(TickOutcome::Advanced {
			height: cursor,
			transactions: count,
		})
	}
}

#[async_trait]
impl<C: BlockChainClient + 'static> ChainScanner for EvmChainScanner<C> {
	fn chain_type(&self) -> ChainType {
		ChainType::Evm
	}

	#[instrument(skip_all, fields(chain = "evm", cursor = ?state.cursor))]
	async fn scan(&self, state: &mut ScanState) -> TickOutcome {
		let started = Instant::now();
		if let Some(resume_at) = state.resume_at {
			if started < resume_at {
				return TickOutcome::BackingOff;
			}
			state.resume_at = None;
		}

		match self.try_scan(state).await {
			Ok(outcome) => outcome,
			Err(e) => {
				warn!(error = %e, delay_ms = self.error_delay.as_millis() as u64, "Scan tick failed");
				if !self.error_delay.is_zero() {
					state.resume_at = Some(started + self.error_delay);
				}
				TickOutcome::Failed
			}
		}
	}

	async fn fetch_batch(
		&self,
		height: u64,
		source: BatchSource,
	) -> Result<Option<BlockBatch>, ScannerError> {
		let block = self
			.pool
			.next()
			.get_block_by_number(height)
			.await
			.map_err(|e| fetch_failed(height, e))?;
		Ok(block
			.map(|block| block_records(height, &block))
			.filter(|records| !records.is_empty())
			.map(|records| BlockBatch::new(height, records, source)))
	}

	async fn dispatch(&self, batch: BlockBatch) -> Result<(), ScannerError> {
		self.queue.send(batch).await
	}
}

fn fetch_failed(height: u64, e: anyhow::Error) -> ScannerError {
	ScannerError::fetch_error(
		"failed to fetch block",
		Some(e.into()),
		Some([("height".to_string(), height.to_string())].into()),
	)
}

fn block_records(height: u64, block: &BlockType) -> Vec<TransactionRecord> {
	match block {
		BlockType::EVM(block) => block
			.transactions
			.iter()
			.map(|tx| TransactionRecord::from_evm(height, tx))
			.collect(),
	}
}

/// Builds the scanner for `chain_type`. Chain families without an implementation are rejected.
pub fn create_chain_scanner<C: BlockChainClient + 'static>(
	chain_type: ChainType,
	pool: Arc<EndpointPool<C>>,
	queue: EventSender,
	retries: RetryScheduler,
	error_delay: Duration,
) -> Result<Arc<dyn ChainScanner>, ScannerError> {
	match chain_type {
		ChainType::Evm => Ok(Arc::new(EvmChainScanner::new(
			pool,
			queue,
			retries,
			error_delay,
		))),
		ChainType::Solana | ChainType::Tron => Err(ScannerError::unsupported_chain(
			format!("no scanner implementation for {}", chain_type),
			None,
			Some([("chain_type".to_string(), chain_type.to_string())].into()),
		)),
	}
}
