//! Blockchain client interfaces and implementations.
//!
//! - [`BlockChainClient`]: tip and block access through one endpoint
//! - [`EvmClient`]: JSON-RPC implementation for EVM chains
//! - [`EndpointPool`]: round-robin selection across configured endpoints
//! - transports: the HTTP JSON-RPC layer underneath the clients

mod client;
mod clients;
mod error;
mod pool;
mod transports;

pub use client::BlockChainClient;
pub use clients::EvmClient;
pub use error::BlockChainError;
pub use pool::EndpointPool;
pub use transports::{BlockchainTransport, HttpTransportClient, TransportError};
