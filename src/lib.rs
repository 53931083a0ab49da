//! Polling blockchain scanner.
//!
//! A [`services::scanner::ScanService`] drives a chain scanner on a fixed
//! cadence. Each tick fetches at most one block through a round-robin endpoint
//! pool and hands its transactions to the event queue; a separate task runs the
//! monitor engine over them and calls the callbacks of matching rules. Heights
//! the node reports as empty below the tip are re-verified by the retry
//! scheduler.

pub mod bootstrap;
pub mod models;
pub mod services;
pub mod utils;
