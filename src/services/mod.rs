//! Core services.
//!
//! - blockchain: clients, transports and the endpoint pool
//! - filter: rule evaluation and callback dispatch
//! - notification: built-in callbacks
//! - scanner: scan state machine, queue, retries and the scan service

pub mod blockchain;
pub mod filter;
pub mod notification;
pub mod scanner;
