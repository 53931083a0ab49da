//! Scanner service error types.

use crate::utils::logging::error::{BoxedSource, ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error as ThisError;
use uuid::Uuid;

#[derive(ThisError, Debug)]
pub enum ScannerError {
	/// Invalid service configuration, reported synchronously from `start`
	#[error("Configuration error: {0}")]
	ConfigurationError(ErrorContext),

	/// Chain family without a scanner implementation
	#[error("Unsupported chain: {0}")]
	UnsupportedChain(ErrorContext),

	#[error("Scheduler error: {0}")]
	SchedulerError(ErrorContext),

	/// Tip or block fetch failed during a tick
	#[error("Fetch error: {0}")]
	FetchError(ErrorContext),

	/// The event queue's receiving side is gone
	#[error("Queue closed: {0}")]
	QueueClosed(ErrorContext),

	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl ScannerError {
	pub fn configuration_error(
		msg: impl Into<String>,
		source: Option<BoxedSource>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ConfigurationError(ErrorContext::new(msg, source, metadata))
	}

	pub fn unsupported_chain(
		msg: impl Into<String>,
		source: Option<BoxedSource>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::UnsupportedChain(ErrorContext::new(msg, source, metadata))
	}

	pub fn scheduler_error(
		msg: impl Into<String>,
		source: Option<BoxedSource>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::SchedulerError(ErrorContext::new_with_log(msg, source, metadata))
	}

	pub fn fetch_error(
		msg: impl Into<String>,
		source: Option<BoxedSource>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::FetchError(ErrorContext::new_with_log(msg, source, metadata))
	}

	pub fn queue_closed(
		msg: impl Into<String>,
		source: Option<BoxedSource>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::QueueClosed(ErrorContext::new_with_log(msg, source, metadata))
	}
}

impl TraceableError for ScannerError {
	fn trace_id(&self) -> String {
		match self {
			Self::ConfigurationError(ctx)
			| Self::UnsupportedChain(ctx)
			| Self::SchedulerError(ctx)
			| Self::FetchError(ctx)
			| Self::QueueClosed(ctx) => ctx.trace_id.clone(),
			Self::Other(_) => Uuid::new_v4().to_string(),
		}
	}
}
