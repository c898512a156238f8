// Runtime module - THE HOST
// External account balances and transactional execution of contract calls

mod accounts;
mod executor;

pub use accounts::{AccountBook, AccountCheckpoint, AccountError};
pub use executor::{Method, Receipt, Runtime, RuntimeConfig, RuntimeError};
