//! Utility modules for common functionality.
//!
//! - http: retrying HTTP client construction with explicit timeouts
//! - logging: subscriber setup and error context types
//! - parsing: numeric and hex parsing helpers
//! - tests: builders for test fixtures

pub mod http;
pub mod parsing;

pub mod logging;

pub use http::{create_retryable_http_client, HttpClientConfig, TransientErrorRetryStrategy};
pub use parsing::*;
