//! Event queue between the chain scanner and the dispatch stage.
//!
//! A bounded queue makes the producer wait when the consumer falls behind; an
//! unbounded queue lets it grow. Either way order is FIFO.

use tokio::sync::mpsc;

use crate::{models::BlockBatch, services::scanner::ScannerError};

/// Producer half. Cheap to clone.
#[derive(Debug, Clone)]
pub enum EventSender {
	Bounded(mpsc::Sender<BlockBatch>),
	Unbounded(mpsc::UnboundedSender<BlockBatch>),
}

/// Consumer half.
#[derive(Debug)]
pub enum EventReceiver {
	Bounded(mpsc::Receiver<BlockBatch>),
	Unbounded(mpsc::UnboundedReceiver<BlockBatch>),
}

/// Creates a queue. `None` or `Some(0)` capacity means unbounded.
pub fn event_queue(capacity: Option<usize>) -> (EventSender, EventReceiver) {
	match capacity.filter(|c| *c > 0) {
		Some(capacity) => {
			let (tx, rx) = mpsc::channel(capacity);
			(EventSender::Bounded(tx), EventReceiver::Bounded(rx))
		}
		None => {
			let (tx, rx) = mpsc::unbounded_channel();
			(EventSender::Unbounded(tx), EventReceiver::Unbounded(rx))
		}
	}
}

impl EventSender {
	/// Enqueues a batch, waiting for room on a bounded queue.
	pub async fn send(&self, batch: BlockBatch) -> Result<(), ScannerError> {
		let height = batch.height;
		let result = match self {
			EventSender::Bounded(tx) => tx.send(batch).await.map_err(|_| ()),
			EventSender::Unbounded(tx) => tx.send(batch).map_err(|_| ()),
		};
		result.map_err(|_| {
			ScannerError::queue_closed(
				"event queue receiver dropped",
				None,
				Some([("height".to_string(), height.to_string())].into()),
			)
		})
	}

	pub fn is_closed(&self) -> bool {
		match self {
			EventSender::Bounded(tx) => tx.is_closed(),
			EventSender::Unbounded(tx) => tx.is_closed(),
		}
	}
}

impl EventReceiver {
	/// Next batch, or `None` once closed and drained.
	pub async fn recv(&mut self) -> Option<BlockBatch> {
		match self {
			EventReceiver::Bounded(rx) => rx.recv().await,
			EventReceiver::Unbounded(rx) => rx.recv().await,
		}
	}

	/// Next batch if one is ready now.
	pub fn try_recv(&mut self) -> Option<BlockBatch> {
		match self {
			EventReceiver::Bounded(rx) => rx.try_recv().ok(),
			EventReceiver::Unbounded(rx) => rx.try_recv().ok(),
		}
	}

	/// Refuses further sends; already queued batches can still be received.
	pub fn close(&mut self) {
		match self {
			EventReceiver::Bounded(rx) => rx.close(),
			EventReceiver::Unbounded(rx) => rx.close(),
		}
	}
}
