//! Error types for filter evaluation.

use crate::utils::logging::error::{BoxedSource, ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error as ThisError;
use uuid::Uuid;

#[derive(ThisError, Debug)]
pub enum FilterError {
	/// Call data could not be decoded with the given types. Treated as a mismatch,
	/// so it is not logged on construction.
	#[error("Decode error: {0}")]
	DecodeError(ErrorContext),

	/// A filter or record field is malformed
	#[error("Invalid input: {0}")]
	InvalidInput(ErrorContext),

	#[error("Internal error: {0}")]
	InternalError(ErrorContext),

	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl FilterError {
	pub fn decode_error(
		msg: impl Into<String>,
		source: Option<BoxedSource>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::DecodeError(ErrorContext::new(msg, source, metadata))
	}

	pub fn invalid_input(
		msg: impl Into<String>,
		source: Option<BoxedSource>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::InvalidInput(ErrorContext::new(msg, source, metadata))
	}

	pub fn internal_error(
		msg: impl Into<String>,
		source: Option<BoxedSource>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::InternalError(ErrorContext::new_with_log(msg, source, metadata))
	}
}

impl TraceableError for FilterError {
	fn trace_id(&self) -> String {
		match self {
			Self::DecodeError(ctx) | Self::InvalidInput(ctx) | Self::InternalError(ctx) => {
				ctx.trace_id.clone()
			}
			Self::Other(_) => Uuid::new_v4().to_string(),
		}
	}
}
