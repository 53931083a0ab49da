use std::{
	sync::{
		atomic::{AtomicUsize, Ordering},
		Arc,
	},
	time::Duration,
};
use tokio::sync::watch;

use crate::integration::mocks::{create_transfer_block, MockEvmClient};
use chain_scanner::{
	models::{BatchSource, ChainType},
	services::{
		blockchain::EndpointPool,
		scanner::{
			create_chain_scanner, event_queue, retry_channel, EventReceiver,
			ExponentialBackoffPolicy, NoRetryPolicy, RetryPolicy, RetryScheduler, RetryWorker,
		},
	},
};

struct Harness {
	scheduler: RetryScheduler,
	events: EventReceiver,
	shutdown: watch::Sender<bool>,
	worker: tokio::task::JoinHandle<()>,
}

fn spawn_worker(client: MockEvmClient, policy: Arc<dyn RetryPolicy>) -> Harness {
	let (queue, events) = event_queue(None);
	let (scheduler, receiver) = retry_channel();
	let pool = Arc::new(EndpointPool::new(vec![client]).unwrap());
	let scanner = create_chain_scanner(
		ChainType::Evm,
		pool,
		queue.clone(),
		scheduler.clone(),
		Duration::from_secs(1),
	)
	.unwrap();
	let (shutdown, shutdown_rx) = watch::channel(false);
	let worker = tokio::spawn(
		RetryWorker::new(scanner, policy, scheduler.clone(), queue).run(receiver, shutdown_rx),
	);
	Harness {
		scheduler,
		events,
		shutdown,
		worker,
	}
}

fn fast_policy(max_attempts: u32) -> Arc<dyn RetryPolicy> {
	Arc::new(ExponentialBackoffPolicy::new(
		max_attempts,
		Duration::from_millis(5),
		Duration::from_millis(5),
	))
}

#[tokio::test]
async fn test_recovered_height_is_enqueued_as_retry_batch() {
	let calls = Arc::new(AtomicUsize::new(0));
	let counter = calls.clone();
	let mut client = MockEvmClient::new();
	client.expect_get_block_by_number().returning(move |height| {
		// empty twice, then the block shows up
		if counter.fetch_add(1, Ordering::SeqCst) < 2 {
			Ok(None)
		} else {
			Ok(Some(create_transfer_block(height, 2)))
		}
	});

	let mut harness = spawn_worker(client, fast_policy(5));
	assert!(harness.scheduler.add(100));

	let batch = tokio::time::timeout(Duration::from_secs(2), harness.events.recv())
		.await
		.unwrap()
		.unwrap();
	assert_eq!(batch.height, 100);
	assert_eq!(batch.source, BatchSource::Retry);
	assert_eq!(batch.transactions.len(), 2);
	assert_eq!(calls.load(Ordering::SeqCst), 3);

	tokio::time::sleep(Duration::from_millis(20)).await;
	assert!(harness.scheduler.pending().is_empty());

	harness.shutdown.send(true).unwrap();
	harness.worker.await.unwrap();
}

#[tokio::test]
async fn test_gives_up_after_max_attempts() {
	let calls = Arc::new(AtomicUsize::new(0));
	let counter = calls.clone();
	let mut client = MockEvmClient::new();
	client.expect_get_block_by_number().returning(move |_| {
		counter.fetch_add(1, Ordering::SeqCst);
		Err(anyhow::anyhow!("node unavailable"))
	});

	let mut harness = spawn_worker(client, fast_policy(3));
	harness.scheduler.add(7);

	tokio::time::sleep(Duration::from_millis(200)).await;

	assert_eq!(calls.load(Ordering::SeqCst), 3);
	assert!(harness.scheduler.pending().is_empty());
	assert!(harness.events.try_recv().is_none());

	harness.shutdown.send(true).unwrap();
	harness.worker.await.unwrap();
}

#[tokio::test]
async fn test_no_retry_policy_drops_immediately() {
	let mut client = MockEvmClient::new();
	client.expect_get_block_by_number().never();

	let mut harness = spawn_worker(client, Arc::new(NoRetryPolicy));
	harness.scheduler.add(9);

	tokio::time::sleep(Duration::from_millis(50)).await;
	assert!(harness.scheduler.pending().is_empty());
	assert!(harness.events.try_recv().is_none());

	harness.shutdown.send(true).unwrap();
	harness.worker.await.unwrap();
}

#[tokio::test]
async fn test_duplicate_registration_is_verified_once() {
	let calls = Arc::new(AtomicUsize::new(0));
	let counter = calls.clone();
	let mut client = MockEvmClient::new();
	client.expect_get_block_by_number().returning(move |height| {
		counter.fetch_add(1, Ordering::SeqCst);
		Ok(Some(create_transfer_block(height, 1)))
	});

	let policy = Arc::new(ExponentialBackoffPolicy::new(
		3,
		Duration::from_millis(50),
		Duration::from_millis(50),
	));
	let mut harness = spawn_worker(client, policy);
	assert!(harness.scheduler.add(11));
	assert!(!harness.scheduler.add(11));

	tokio::time::timeout(Duration::from_secs(2), harness.events.recv())
		.await
		.unwrap()
		.unwrap();
	tokio::time::sleep(Duration::from_millis(100)).await;

	assert_eq!(calls.load(Ordering::SeqCst), 1);
	assert!(harness.events.try_recv().is_none());

	harness.shutdown.send(true).unwrap();
	harness.worker.await.unwrap();
}

#[tokio::test]
async fn test_shutdown_cancels_pending_retries() {
	let mut client = MockEvmClient::new();
	client.expect_get_block_by_number().never();

	let policy = Arc::new(ExponentialBackoffPolicy::new(
		3,
		Duration::from_secs(60),
		Duration::from_secs(60),
	));
	let harness = spawn_worker(client, policy);
	harness.scheduler.add(1);
	harness.scheduler.add(2);
	tokio::time::sleep(Duration::from_millis(20)).await;
	assert_eq!(harness.scheduler.pending(), vec![1, 2]);

	harness.shutdown.send(true).unwrap();
	tokio::time::timeout(Duration::from_secs(1), harness.worker)
		.await
		.unwrap()
		.unwrap();

	assert!(harness.scheduler.pending().is_empty());
}
