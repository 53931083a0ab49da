//! Notification error types.

use crate::utils::logging::error::{BoxedSource, ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error as ThisError;
use uuid::Uuid;

#[derive(ThisError, Debug)]
pub enum NotificationError {
	/// Request could not be delivered or the receiver rejected it
	#[error("Network error: {0}")]
	NetworkError(Box<ErrorContext>),

	/// Invalid callback settings such as a malformed header
	#[error("Config error: {0}")]
	ConfigError(Box<ErrorContext>),

	/// Payload could not be built
	#[error("Execution error: {0}")]
	ExecutionError(Box<ErrorContext>),

	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl NotificationError {
	pub fn network_error(
		msg: impl Into<String>,
		source: Option<BoxedSource>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::NetworkError(Box::new(ErrorContext::new_with_log(msg, source, metadata)))
	}

	pub fn config_error(
		msg: impl Into<String>,
		source: Option<BoxedSource>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ConfigError(Box::new(ErrorContext::new_with_log(msg, source, metadata)))
	}

	pub fn execution_error(
		msg: impl Into<String>,
		source: Option<BoxedSource>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ExecutionError(Box::new(ErrorContext::new_with_log(msg, source, metadata)))
	}
}

impl TraceableError for NotificationError {
	fn trace_id(&self) -> String {
		match self {
			Self::NetworkError(ctx) | Self::ConfigError(ctx) | Self::ExecutionError(ctx) => {
				ctx.trace_id.clone()
			}
			Self::Other(_) => Uuid::new_v4().to_string(),
		}
	}
}
