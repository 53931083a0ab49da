//! Chain scanning.
//!
//! - [`ChainScanner`] / [`EvmChainScanner`]: one height per tick, cursor state machine
//! - [`EventSender`] / [`EventReceiver`]: FIFO hand-off from scanner to dispatch
//! - [`RetryScheduler`] / [`RetryWorker`]: re-verification of skipped heights
//! - [`ScanService`]: validation, periodic scheduling and lifecycle

mod chain;
mod error;
mod queue;
mod retry;
mod service;

pub use chain::{create_chain_scanner, ChainScanner, EvmChainScanner, ScanState, TickOutcome};
pub use error::ScannerError;
pub use queue::{event_queue, EventReceiver, EventSender};
pub use retry::{
	retry_channel, ExponentialBackoffPolicy, NoRetryPolicy, RetryDecision, RetryPolicy,
	RetryReceiver, RetryScheduler, RetryWorker,
};
pub use service::{run_tick, ScanService, ScanServiceBuilder};
