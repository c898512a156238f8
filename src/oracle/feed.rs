// Price Feed Trait and Core Types
// The ledger only ever reads the most recent round; staleness is not checked here

use crate::identity::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors a price feed can report
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("Oracle answer must be positive, got {0}")]
    InvalidAnswer(i128),

    #[error("Unsupported feed decimals: {0}")]
    UnsupportedDecimals(u8),

    #[error("No data for round {0}")]
    RoundNotFound(u64),
}

/// One reported round of an aggregator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundData {
    pub round_id: u64,
    /// Price with `decimals()` fractional digits
    pub answer: i128,
    pub started_at: i64,
    pub updated_at: i64,
    pub answered_in_round: u64,
}

/// Read-only exchange rate source, base asset -> reference currency
pub trait PriceOracle: Send + Sync {
    /// Where the feed lives
    fn address(&self) -> Address;

    /// Number of fractional digits in `RoundData::answer`
    fn decimals(&self) -> u8;

    /// Human-readable pair, e.g. "ETH / USD"
    fn description(&self) -> String;

    /// Aggregator interface version
    fn version(&self) -> u64;

    /// The most recently reported round
    fn latest_round_data(&self) -> Result<RoundData, OracleError>;
}
