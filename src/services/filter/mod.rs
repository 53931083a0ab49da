//! Monitor/filter engine.
//!
//! Evaluates registered monitoring rules against transaction records and runs
//! the callbacks of the rules that match.

mod decoder;
mod engine;
mod error;
pub mod helpers;

pub use decoder::{AbiDecoder, DynAbiDecoder};
pub use engine::{DispatchSummary, MonitorEngine};
pub use error::FilterError;
