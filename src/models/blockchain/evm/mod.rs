//! EVM block and transaction wire models.

mod block;
mod transaction;

pub use block::{BaseBlock, Block as EVMBlock};
pub use transaction::{BaseTransaction, Transaction as EVMTransaction};
