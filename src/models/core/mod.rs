//! Core domain models shared by scanners, the filter engine and callbacks.

mod monitor;
mod transaction;

pub use monitor::{CallDataFilter, Filter, FnCallback, MonitorCallback, MonitorRule};
pub use transaction::{BatchSource, BlockBatch, MonitorMatch, RetryEntry, TransactionRecord};
