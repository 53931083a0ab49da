//! Round-robin pool of endpoint clients for one chain.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::services::blockchain::BlockChainError;

/// Fixed, non-empty list of clients selected in rotation.
///
/// There is no health tracking: a failing endpoint fails the current tick and the
/// next call moves on to the following client. The cursor is atomic so a pool can
/// be shared across scanners.
#[derive(Debug)]
pub struct EndpointPool<C> {
	endpoints: Vec<C>,
	cursor: AtomicUsize,
}

impl<C> EndpointPool<C> {
	/// Builds a pool; an empty list is rejected.
	pub fn new(endpoints: Vec<C>) -> Result<Self, BlockChainError> {
		if endpoints.is_empty() {
			return Err(BlockChainError::internal_error(
				"endpoint pool requires at least one endpoint",
				None,
				None,
			));
		}
		Ok(Self {
			endpoints,
			cursor: AtomicUsize::new(0),
		})
	}

	/// Returns the current endpoint and advances the rotation, wrapping to the first.
	pub fn next(&self) -> &C {
		let len = self.endpoints.len();
		let index = self
			.cursor
			.fetch_update(Ordering::AcqRel, Ordering::Acquire, |i| Some((i + 1) % len))
			.unwrap_or_else(|current| current);
		&self.endpoints[index % len]
	}

	pub fn len(&self) -> usize {
		self.endpoints.len()
	}

	pub fn is_empty(&self) -> bool {
		self.endpoints.is_empty()
	}

	pub fn endpoints(&self) -> &[C] {
		&self.endpoints
	}
}
