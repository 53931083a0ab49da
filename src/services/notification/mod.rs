//! Built-in monitor callbacks.
//!
//! - [`LogCallback`]: logs each match
//! - [`WebhookCallback`]: POSTs each match as JSON to a URL

mod error;
mod log;
mod webhook;

pub use error::NotificationError;
pub use log::LogCallback;
pub use webhook::{WebhookCallback, WebhookPayload};
