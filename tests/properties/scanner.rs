use async_trait::async_trait;
use proptest::prelude::*;
use std::{
	sync::{Arc, Mutex},
	time::{Duration, Instant},
};

use crate::properties::strategies::{tick_scripts, TickScript};
use alloy::primitives::{Address, U256};
use chain_scanner::{
	models::{
		BlockType, EVMBaseBlock, EVMBaseTransaction, EVMBlock, EVMTransaction, StartBlock,
	},
	services::{
		blockchain::{BlockChainClient, EndpointPool},
		scanner::{
			event_queue, retry_channel, ChainScanner, EvmChainScanner, ScanState, TickOutcome,
		},
	},
};

/// Client replaying the current tick script.
#[derive(Clone)]
struct ScriptedClient {
	current: Arc<Mutex<TickScript>>,
}

#[async_trait]
impl BlockChainClient for ScriptedClient {
	async fn get_latest_block_number(&self) -> Result<u64, anyhow::Error> {
		let script = *self.current.lock().unwrap();
		if script.fails {
			anyhow::bail!("scripted failure");
		}
		Ok(script.tip)
	}

	async fn get_block_by_number(&self, height: u64) -> Result<Option<BlockType>, anyhow::Error> {
		let script = *self.current.lock().unwrap();
		if !script.has_block || height > script.tip {
			return Ok(None);
		}
		let tx = EVMTransaction::from(EVMBaseTransaction {
			to: Some(Address::ZERO),
			value: Some(U256::from(height)),
			..Default::default()
		});
		Ok(Some(BlockType::EVM(Box::new(EVMBlock::from(EVMBaseBlock {
			transactions: vec![tx],
			..Default::default()
		})))))
	}
}

fn runtime() -> tokio::runtime::Runtime {
	tokio::runtime::Builder::new_current_thread()
		.enable_all()
		.build()
		.unwrap()
}

proptest! {
	#[test]
	fn test_cursor_never_regresses(start in 0u64..200, scripts in tick_scripts()) {
		runtime().block_on(async {
			let current = Arc::new(Mutex::new(scripts[0]));
			let (queue, mut events) = event_queue(None);
			let (retries, _retry_rx) = retry_channel();
			let pool = Arc::new(EndpointPool::new(vec![ScriptedClient { current: current.clone() }]).unwrap());
			let scanner = EvmChainScanner::new(pool, queue, retries.clone(), Duration::ZERO);
			let mut state = ScanState::new(StartBlock::Height(start));
			let mut last_enqueued = None;

			for script in scripts {
				*current.lock().unwrap() = script;
				let before = state.cursor.unwrap();
				state.resume_at = None;
				let outcome = scanner.scan(&mut state).await;
				let after = state.cursor.unwrap();

				match outcome {
					TickOutcome::Advanced { height, .. } => {
						prop_assert_eq!(height, before);
						prop_assert_eq!(after, before + 1);
						let batch = events.try_recv().unwrap();
						prop_assert_eq!(batch.height, height);
						if let Some(last) = last_enqueued {
							prop_assert!(height > last);
						}
						last_enqueued = Some(height);
					}
					TickOutcome::Skipped { height } => {
						prop_assert_eq!(height, before);
						prop_assert_eq!(after, before + 1);
						prop_assert!(retries.is_pending(height));
					}
					TickOutcome::Paused { cursor, tip } => {
						prop_assert_eq!(after, before);
						prop_assert!(cursor >= tip);
					}
					TickOutcome::Failed => prop_assert_eq!(after, before),
					TickOutcome::BackingOff => prop_assert!(false, "resume_at was cleared"),
				}
				prop_assert!(after <= script.tip.max(before) + 1);
			}
			Ok(())
		})?;
	}

	#[test]
	fn test_pause_is_idempotent(tip in 0u64..1_000, ahead in 1u64..50, ticks in 1usize..10) {
		runtime().block_on(async {
			let current = Arc::new(Mutex::new(TickScript { tip, has_block: true, fails: false }));
			let (queue, mut events) = event_queue(None);
			let (retries, _retry_rx) = retry_channel();
			let pool = Arc::new(EndpointPool::new(vec![ScriptedClient { current }]).unwrap());
			let scanner = EvmChainScanner::new(pool, queue, retries.clone(), Duration::ZERO);
			let mut state = ScanState::new(StartBlock::Height(tip + ahead));
			let initial = state.clone();

			for _ in 0..ticks {
				let outcome = scanner.scan(&mut state).await;
				prop_assert_eq!(outcome, TickOutcome::Paused { cursor: tip + ahead, tip });
				prop_assert_eq!(&state, &initial);
			}
			prop_assert!(events.try_recv().is_none());
			prop_assert!(retries.pending().is_empty());
			Ok(())
		})?;
	}

	#[test]
	fn test_failed_tick_backs_off(tip in 0u64..1_000) {
		runtime().block_on(async {
			let current = Arc::new(Mutex::new(TickScript { tip, has_block: true, fails: true }));
			let (queue, _events) = event_queue(None);
			let (retries, _retry_rx) = retry_channel();
			let pool = Arc::new(EndpointPool::new(vec![ScriptedClient { current }]).unwrap());
			let scanner = EvmChainScanner::new(pool, queue, retries, Duration::from_secs(30));
			let mut state = ScanState::new(StartBlock::Height(tip));

			prop_assert_eq!(scanner.scan(&mut state).await, TickOutcome::Failed);
			prop_assert!(state.resume_at.is_some_and(|at| at > Instant::now()));
			prop_assert_eq!(scanner.scan(&mut state).await, TickOutcome::BackingOff);
			prop_assert_eq!(state.cursor, Some(tip));
			Ok(())
		})?;
	}

	#[test]
	fn test_round_robin_wraps(len in 1usize..8, calls in 1usize..64) {
		let pool = EndpointPool::new((0..len).collect::<Vec<_>>()).unwrap();
		for i in 0..calls {
			prop_assert_eq!(*pool.next(), i % len);
		}
	}
}
