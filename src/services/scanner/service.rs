//! Scan service: validates configuration, drives the chain scanner on a fixed
//! cadence and owns the dispatch and retry tasks.

use std::{
	collections::{BTreeMap, BTreeSet},
	sync::Arc,
	time::Duration,
};
use tokio::{
	sync::{watch, Mutex},
	task::JoinHandle,
	time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, info, instrument, trace, warn};

use crate::{
	models::{BlockBatch, ChainType, DeliveryOrder, MonitorRule, StartBlock, MIN_SCAN_PERIOD_MS},
	services::{
		blockchain::{BlockChainClient, EndpointPool, EvmClient, HttpTransportClient},
		filter::{AbiDecoder, DynAbiDecoder, MonitorEngine},
		scanner::{
			create_chain_scanner, event_queue, retry_channel, ChainScanner, EventReceiver,
			ExponentialBackoffPolicy, RetryPolicy, RetryScheduler, RetryWorker, ScanState,
			ScannerError, TickOutcome,
		},
	},
	utils::HttpClientConfig,
};

#[derive(Debug, Clone)]
struct ScanSettings {
	name: String,
	chain_type: Option<ChainType>,
	endpoints: Vec<String>,
	scan_period: Duration,
	start_block: StartBlock,
	queue_capacity: Option<usize>,
	delivery_order: DeliveryOrder,
	error_retry_delay: Option<Duration>,
	http: HttpClientConfig,
}

impl Default for ScanSettings {
	fn default() -> Self {
		Self {
			name: "scanner".to_string(),
			chain_type: None,
			endpoints: Vec::new(),
			scan_period: Duration::from_millis(5000),
			start_block: StartBlock::default(),
			queue_capacity: None,
			delivery_order: DeliveryOrder::default(),
			error_retry_delay: None,
			http: HttpClientConfig::default(),
		}
	}
}

/// Fluent construction of a [`ScanService`]. Nothing is validated until `start`.
pub struct ScanServiceBuilder {
	settings: ScanSettings,
	rules: Vec<MonitorRule>,
	retry_policy: Arc<dyn RetryPolicy>,
	decoder: Arc<dyn AbiDecoder>,
}

impl Default for ScanServiceBuilder {
	fn default() -> Self {
		Self {
			settings: ScanSettings::default(),
			rules: Vec::new(),
			retry_policy: Arc::new(ExponentialBackoffPolicy::default()),
			decoder: Arc::new(DynAbiDecoder),
		}
	}
}

impl ScanServiceBuilder {
	pub fn name(mut self, name: impl Into<String>) -> Self {
		self.settings.name = name.into();
		self
	}

	pub fn chain_type(mut self, chain_type: ChainType) -> Self {
		self.settings.chain_type = Some(chain_type);
		self
	}

	pub fn endpoint(mut self, url: impl Into<String>) -> Self {
		self.settings.endpoints.push(url.into());
		self
	}

	pub fn endpoints<I, S>(mut self, urls: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.settings.endpoints.extend(urls.into_iter().map(Into::into));
		self
	}

	pub fn retry_policy(mut self, policy: Arc<dyn RetryPolicy>) -> Self {
		self.retry_policy = policy;
		self
	}

	pub fn scan_period(mut self, period: Duration) -> Self {
		self.settings.scan_period = period;
		self
	}

	pub fn start_block(mut self, start: StartBlock) -> Self {
		self.settings.start_block = start;
		self
	}

	/// Registers a rule. Rules are evaluated in registration order.
	pub fn rule(mut self, rule: MonitorRule) -> Self {
		self.rules.push(rule);
		self
	}

	pub fn rules(mut self, rules: impl IntoIterator<Item = MonitorRule>) -> Self {
		self.rules.extend(rules);
		self
	}

	/// Bounds the event queue; without it the queue is unbounded.
	pub fn queue_capacity(mut self, capacity: usize) -> Self {
		self.settings.queue_capacity = Some(capacity);
		self
	}

	pub fn delivery_order(mut self, order: DeliveryOrder) -> Self {
		self.settings.delivery_order = order;
		self
	}

	pub fn decoder(mut self, decoder: Arc<dyn AbiDecoder>) -> Self {
		self.decoder = decoder;
		self
	}

	/// Extra pause after a failed tick, counted from the start of that tick.
	///
	/// Without it the next scheduled tick retries the same height.
	pub fn error_retry_delay(mut self, delay: Duration) -> Self {
		self.settings.error_retry_delay = Some(delay);
		self
	}

	pub fn http_config(mut self, config: HttpClientConfig) -> Self {
		self.settings.http = config;
		self
	}

	pub fn build(self) -> ScanService {
		ScanService {
			settings: self.settings,
			rules: self.rules,
			retry_policy: self.retry_policy,
			decoder: self.decoder,
			running: None,
		}
	}
}

struct RunningScan {
	state: Arc<Mutex<ScanState>>,
	retries: RetryScheduler,
	stop_ticks: watch::Sender<bool>,
	shutdown: watch::Sender<bool>,
	ticker: JoinHandle<()>,
	dispatcher: JoinHandle<()>,
	retry_worker: JoinHandle<()>,
}

/// Runs one chain scanner with its dispatch stage and retry worker.
pub struct ScanService {
	settings: ScanSettings,
	rules: Vec<MonitorRule>,
	retry_policy: Arc<dyn RetryPolicy>,
	decoder: Arc<dyn AbiDecoder>,
	running: Option<RunningScan>,
}

impl ScanService {
	pub fn builder() -> ScanServiceBuilder {
		ScanServiceBuilder::default()
	}

	pub fn name(&self) -> &str {
		&self.settings.name
	}

	pub fn is_running(&self) -> bool {
		self.running.is_some()
	}

	/// Next height the scanner will look at, once running.
	pub async fn cursor(&self) -> Option<u64> {
		match &self.running {
			Some(running) => running.state.lock().await.cursor,
			None => None,
		}
	}

	/// Heights registered for retry and not yet resolved.
	pub fn pending_retries(&self) -> Vec<u64> {
		self.running
			.as_ref()
			.map(|running| running.retries.pending())
			.unwrap_or_default()
	}

	/// Checks the configuration and returns the chain type to scan.
	fn validate(&self, endpoint_count: usize) -> Result<ChainType, ScannerError> {
		let chain_type = self.settings.chain_type.ok_or_else(|| {
			ScannerError::configuration_error("chain type is not set", None, None)
		})?;

		let period_ms = self.settings.scan_period.as_millis();
		if period_ms < u128::from(MIN_SCAN_PERIOD_MS) {
			return Err(ScannerError::configuration_error(
				format!("scan period must be at least {} ms", MIN_SCAN_PERIOD_MS),
				None,
				Some([("scan_period_ms".to_string(), period_ms.to_string())].into()),
			));
		}

		if endpoint_count == 0 {
			return Err(ScannerError::configuration_error(
				"at least one endpoint is required",
				None,
				None,
			));
		}

		if chain_type == ChainType::Evm && self.rules.is_empty() {
			return Err(ScannerError::configuration_error(
				"at least one monitoring rule is required for evm chains",
				None,
				None,
			));
		}

		Ok(chain_type)
	}

	/// Starts scanning through the configured endpoint URLs.
	///
	/// Configuration problems are returned here; nothing is spawned in that case.
	/// Errors during scanning are logged and never reach the caller.
	pub async fn start(&mut self) -> Result<(), ScannerError> {
		let chain_type = self.validate(self.settings.endpoints.len())?;
		if chain_type != ChainType::Evm {
			return Err(ScannerError::unsupported_chain(
				format!("no scanner implementation for {}", chain_type),
				None,
				None,
			));
		}

		let clients = self
			.settings
			.endpoints
			.iter()
			.map(|url| EvmClient::<HttpTransportClient>::new(url, &self.settings.http))
			.collect::<Result<Vec<_>, _>>()
			.map_err(|e| {
				ScannerError::configuration_error("failed to create endpoint client", Some(e.into()), None)
			})?;

		self.start_with_clients(clients).await
	}

	/// Starts scanning through caller-provided clients instead of the configured URLs.
	///
	/// The first tick runs one scan period after this returns.
	#[instrument(skip_all, fields(scanner = %self.settings.name))]
	pub async fn start_with_clients<C: BlockChainClient + 'static>(
		&mut self,
		clients: Vec<C>,
	) -> Result<(), ScannerError> {
		if self.running.is_some() {
			return Err(ScannerError::configuration_error(
				"scan service is already running",
				None,
				None,
			));
		}
		let chain_type = self.validate(clients.len())?;
		let endpoint_count = clients.len();

		let (queue, events) = event_queue(self.settings.queue_capacity);
		let (retries, retry_receiver) = retry_channel();
		let pool = Arc::new(EndpointPool::new(clients).map_err(|e| {
			ScannerError::configuration_error("invalid endpoint list", Some(Box::new(e)), None)
		})?);
		let scanner = create_chain_scanner(
			chain_type,
			pool,
			queue.clone(),
			retries.clone(),
			self.settings.error_retry_delay.unwrap_or(Duration::ZERO),
		)?;
		let state = Arc::new(Mutex::new(ScanState::new(self.settings.start_block)));

		let (shutdown, shutdown_rx) = watch::channel(false);
		let (stop_ticks, stop_ticks_rx) = watch::channel(false);
		let engine = MonitorEngine::new(self.rules.clone(), self.decoder.clone());
		let dispatcher = tokio::spawn(run_dispatcher(
			engine,
			events,
			retries.subscribe(),
			self.settings.delivery_order,
			shutdown_rx.clone(),
		));
		let retry_worker = tokio::spawn(
			RetryWorker::new(
				scanner.clone(),
				self.retry_policy.clone(),
				retries.clone(),
				queue,
			)
			.run(retry_receiver, shutdown_rx),
		);
		let ticker = tokio::spawn(run_ticker(
			scanner,
			state.clone(),
			self.settings.scan_period,
			stop_ticks_rx,
		));

		info!(
			chain = %chain_type,
			endpoints = endpoint_count,
			rules = self.rules.len(),
			period_ms = self.settings.scan_period.as_millis() as u64,
			"Scan service started"
		);

		self.running = Some(RunningScan {
			state,
			retries,
			stop_ticks,
			shutdown,
			ticker,
			dispatcher,
			retry_worker,
		});
		Ok(())
	}

	/// Stops the timer, cancels pending retries and waits for queued batches to be dispatched.
	///
	/// An in-flight tick is allowed to finish first. Calling it on a service that
	/// is not running does nothing.
	#[instrument(skip_all, fields(scanner = %self.settings.name))]
	pub async fn stop(&mut self) -> Result<(), ScannerError> {
		let Some(running) = self.running.take() else {
			return Ok(());
		};

		let _ = running.stop_ticks.send(true);
		if let Err(e) = running.ticker.await {
			warn!(error = %e, "Ticker ended abnormally");
		}

		let _ = running.shutdown.send(true);
		if let Err(e) = running.retry_worker.await {
			warn!(error = %e, "Retry worker ended abnormally");
		}
		if let Err(e) = running.dispatcher.await {
			warn!(error = %e, "Dispatcher ended abnormally");
		}

		info!("Scan service stopped");
		Ok(())
	}
}

/// Fires a tick every `period` until `stop` flips to `true`.
///
/// Ticks run inline, so a slow tick delays the next one instead of overlapping it.
async fn run_ticker(
	scanner: Arc<dyn ChainScanner>,
	state: Arc<Mutex<ScanState>>,
	period: Duration,
	mut stop: watch::Receiver<bool>,
) {
	let mut ticks = interval_at(Instant::now() + period, period);
	ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

	loop {
		tokio::select! {
			_ = ticks.tick() => {
				if let Some(outcome) = run_tick(scanner.as_ref(), &state).await {
					trace!(?outcome, "Tick finished");
				}
			}
			_ = wait_for_stop(&mut stop) => break,
		}
	}
	debug!("Ticker stopped");
}

async fn wait_for_stop(stop: &mut watch::Receiver<bool>) {
	let _ = stop.wait_for(|stop| *stop).await;
}

/// Runs one tick unless the previous one is still in flight.
///
/// Returns `None` when the tick was skipped to avoid overlapping ticks.
pub async fn run_tick(scanner: &dyn ChainScanner, state: &Mutex<ScanState>) -> Option<TickOutcome> {
	let Ok(mut state) = state.try_lock() else {
		debug!("Previous tick still running, skipping");
		return None;
	};
	Some(scanner.scan(&mut state).await)
}

/// Consumes the event queue and hands batches to the monitor engine.
///
/// With [`DeliveryOrder::Ordered`] batches above the lowest pending retry height
/// are held until that height resolves. On shutdown the queue is closed, what is
/// already queued is drained, and held batches are released in height order.
async fn run_dispatcher(
	engine: MonitorEngine,
	mut events: EventReceiver,
	mut pending: watch::Receiver<BTreeSet<u64>>,
	order: DeliveryOrder,
	mut shutdown: watch::Receiver<bool>,
) {
	let mut held = BTreeMap::new();
	let mut pending_open = true;
	let ordered = order == DeliveryOrder::Ordered;

	loop {
		tokio::select! {
			batch = events.recv() => match batch {
				Some(batch) => deliver(&engine, &mut held, batch, ordered, &pending).await,
				None => break,
			},
			changed = pending.changed(), if ordered && pending_open => {
				if changed.is_err() {
					pending_open = false;
				}
				while let Some(batch) = events.try_recv() {
					held.insert(batch.height, batch);
				}
				release(&engine, &mut held, lowest_pending(&pending)).await;
			}
			_ = wait_for_stop(&mut shutdown) => {
				events.close();
				while let Some(batch) = events.recv().await {
					deliver(&engine, &mut held, batch, ordered, &pending).await;
				}
				break;
			}
		}
	}

	if !held.is_empty() {
		debug!(held = held.len(), "Releasing held batches");
		release(&engine, &mut held, None).await;
	}
}

async fn deliver(
	engine: &MonitorEngine,
	held: &mut BTreeMap<u64, BlockBatch>,
	batch: BlockBatch,
	ordered: bool,
	pending: &watch::Receiver<BTreeSet<u64>>,
) {
	if !ordered {
		engine.process_batch(&batch).await;
		return;
	}
	held.insert(batch.height, batch);
	release(engine, held, lowest_pending(pending)).await;
}

/// Dispatches held batches in height order up to and including `bound`.
async fn release(engine: &MonitorEngine, held: &mut BTreeMap<u64, BlockBatch>, bound: Option<u64>) {
	while let Some(entry) = held.first_entry() {
		if bound.is_some_and(|lowest| *entry.key() > lowest) {
			break;
		}
		let batch = entry.remove();
		engine.process_batch(&batch).await;
	}
}

fn lowest_pending(pending: &watch::Receiver<BTreeSet<u64>>) -> Option<u64> {
	pending.borrow().first().copied()
}
