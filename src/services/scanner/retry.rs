//! Deferred re-verification of skipped heights.
//!
//! The scanner registers a height with [`RetryScheduler::add`] when the node
//! reports a tip above it but returns no transactions for it. A
//! [`RetryWorker`] then asks the configured [`RetryPolicy`] when to look again,
//! and enqueues the block as a retry batch once it shows up.

use backon::{BackoffBuilder, ExponentialBuilder};
use std::{collections::BTreeSet, sync::Arc, time::Duration};
use tokio::{
	sync::{mpsc, watch},
	task::JoinSet,
};
use tracing::{debug, info, instrument, warn};

use crate::{
	models::{BatchSource, RetryEntry, RetryPolicyConfig},
	services::scanner::{ChainScanner, EventSender},
};

/// What to do with a pending height after `attempts` failed verifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
	RetryNow,
	RetryAfter(Duration),
	GiveUp,
}

/// Decides the timing and the cut-off of block-level retries.
pub trait RetryPolicy: Send + Sync {
	fn decide(&self, entry: &RetryEntry) -> RetryDecision;
}

/// Exponential delays between `initial_delay` and `max_delay`, at most `max_attempts` tries.
#[derive(Debug, Clone)]
pub struct ExponentialBackoffPolicy {
	max_attempts: u32,
	initial_delay: Duration,
	max_delay: Duration,
}

impl ExponentialBackoffPolicy {
	pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
		Self {
			max_attempts,
			initial_delay,
			max_delay,
		}
	}
}

impl Default for ExponentialBackoffPolicy {
	fn default() -> Self {
		Self::new(5, Duration::from_secs(1), Duration::from_secs(60))
	}
}

impl RetryPolicy for ExponentialBackoffPolicy {
	fn decide(&self, entry: &RetryEntry) -> RetryDecision {
		if entry.attempts >= self.max_attempts {
			return RetryDecision::GiveUp;
		}
		let delay = ExponentialBuilder::default()
			.with_min_delay(self.initial_delay)
			.with_max_delay(self.max_delay)
			.with_factor(2.0)
			.with_max_times(self.max_attempts as usize)
			.build()
			.nth(entry.attempts as usize);
		match delay {
			Some(delay) if delay.is_zero() => RetryDecision::RetryNow,
			Some(delay) => RetryDecision::RetryAfter(delay),
			None => RetryDecision::GiveUp,
		}
	}
}

/// Never re-verifies; every skipped height is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetryPolicy;

impl RetryPolicy for NoRetryPolicy {
	fn decide(&self, _entry: &RetryEntry) -> RetryDecision {
		RetryDecision::GiveUp
	}
}

impl From<&RetryPolicyConfig> for Arc<dyn RetryPolicy> {
	fn from(config: &RetryPolicyConfig) -> Self {
		match config {
			RetryPolicyConfig::Exponential {
				max_attempts,
				initial_delay_ms,
				max_delay_ms,
			} => Arc::new(ExponentialBackoffPolicy::new(
				*max_attempts,
				Duration::from_millis(*initial_delay_ms),
				Duration::from_millis(*max_delay_ms),
			)),
			RetryPolicyConfig::None => Arc::new(NoRetryPolicy),
		}
	}
}

/// Registration side of the retry machinery.
///
/// Keeps the set of heights awaiting a retry outcome. Adding a height that is
/// already pending is a no-op. Subscribers observe the set through a watch
/// channel, which the ordered dispatcher uses to hold back newer batches.
#[derive(Debug, Clone)]
pub struct RetryScheduler {
	tx: mpsc::UnboundedSender<RetryEntry>,
	pending: Arc<watch::Sender<BTreeSet<u64>>>,
}

/// Receiving side, consumed by [`RetryWorker::run`].
#[derive(Debug)]
pub struct RetryReceiver {
	rx: mpsc::UnboundedReceiver<RetryEntry>,
}

pub fn retry_channel() -> (RetryScheduler, RetryReceiver) {
	let (tx, rx) = mpsc::unbounded_channel();
	let (pending, _) = watch::channel(BTreeSet::new());
	(
		RetryScheduler {
			tx,
			pending: Arc::new(pending),
		},
		RetryReceiver { rx },
	)
}

impl RetryScheduler {
	/// Registers `height` for re-verification. Returns `false` when it was already pending.
	pub fn add(&self, height: u64) -> bool {
		let inserted = self.pending.send_if_modified(|set| set.insert(height));
		if !inserted {
			debug!(height, "Height already pending retry");
			return false;
		}
		if self.tx.send(RetryEntry::new(height)).is_err() {
			warn!(height, "Retry worker is not running, dropping height");
			self.resolve(height);
			return false;
		}
		true
	}

	/// Heights awaiting an outcome, ascending.
	pub fn pending(&self) -> Vec<u64> {
		self.pending.borrow().iter().copied().collect()
	}

	pub fn lowest_pending(&self) -> Option<u64> {
		self.pending.borrow().first().copied()
	}

	pub fn is_pending(&self, height: u64) -> bool {
		self.pending.borrow().contains(&height)
	}

	pub fn subscribe(&self) -> watch::Receiver<BTreeSet<u64>> {
		self.pending.subscribe()
	}

	/// Marks `height` as done, whether delivered or given up.
	pub fn resolve(&self, height: u64) {
		self.pending.send_if_modified(|set| set.remove(&height));
	}

	fn clear(&self) {
		self.pending.send_if_modified(|set| {
			let had_entries = !set.is_empty();
			set.clear();
			had_entries
		});
	}
}

/// Runs one task per pending height until it is delivered, given up or cancelled.
#[derive(Clone)]
pub struct RetryWorker {
	scanner: Arc<dyn ChainScanner>,
	policy: Arc<dyn RetryPolicy>,
	scheduler: RetryScheduler,
	queue: EventSender,
}

impl RetryWorker {
	pub fn new(
		scanner: Arc<dyn ChainScanner>,
		policy: Arc<dyn RetryPolicy>,
		scheduler: RetryScheduler,
		queue: EventSender,
	) -> Self {
		Self {
			scanner,
			policy,
			scheduler,
			queue,
		}
	}

	/// Processes registrations until `shutdown` flips to `true`; pending work is then cancelled.
	pub async fn run(self, mut receiver: RetryReceiver, mut shutdown: watch::Receiver<bool>) {
		let mut tasks = JoinSet::new();
		loop {
			tokio::select! {
				_ = async { let _ = shutdown.wait_for(|stop| *stop).await; } => break,
				entry = receiver.rx.recv() => match entry {
					Some(entry) => {
						tasks.spawn(self.clone().verify(entry));
					}
					None => break,
				},
				Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
					if let Err(e) = joined {
						warn!(error = %e, "Retry task ended abnormally");
					}
				}
			}
		}

		let cancelled = tasks.len();
		tasks.shutdown().await;
		self.scheduler.clear();
		if cancelled > 0 {
			info!(cancelled, "Retry worker stopped with pending heights");
		}
	}

	#[instrument(skip_all, fields(height = entry.height))]
	async fn verify(self, mut entry: RetryEntry) {
		loop {
			match self.policy.decide(&entry) {
				RetryDecision::GiveUp => {
					warn!(attempts = entry.attempts, "Giving up on skipped height");
					self.scheduler.resolve(entry.height);
					return;
				}
				RetryDecision::RetryNow => {}
				RetryDecision::RetryAfter(delay) => tokio::time::sleep(delay).await,
			}

			match self.scanner.fetch_batch(entry.height, BatchSource::Retry).await {
				Ok(Some(batch)) => {
					let transactions = batch.transactions.len();
					if let Err(e) = self.queue.send(batch).await {
						warn!(error = %e, "Could not enqueue retried batch");
					} else {
						info!(transactions, attempts = entry.attempts + 1, "Recovered skipped height");
					}
					self.scheduler.resolve(entry.height);
					return;
				}
				Ok(None) => debug!(attempts = entry.attempts + 1, "Height still empty"),
				Err(e) => debug!(attempts = entry.attempts + 1, error = %e, "Retry fetch failed"),
			}
			entry = entry.next_attempt();
		}
	}
}
