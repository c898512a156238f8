// Mock Aggregator - deterministic price feed for development networks and tests

use super::feed::{OracleError, PriceOracle, RoundData};
use crate::identity::Address;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::RwLock;
use tracing::debug;

/// Decimals reported by the mock ETH/USD feed
pub const MOCK_DECIMALS: u8 = 8;
/// $2000.00000000
pub const MOCK_INITIAL_ANSWER: i128 = 200_000_000_000;

const MOCK_VERSION: u64 = 0;

/// Serializable state of a mock aggregator
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatorSnapshot {
    pub address: Address,
    pub decimals: u8,
    pub rounds: Vec<RoundData>,
}

#[derive(Debug)]
struct Rounds {
    latest_round: u64,
    by_id: BTreeMap<u64, RoundData>,
}

/// In-process aggregator whose answer is set by hand
///
/// Interior mutability lets a test move the price while the ledger
/// holds a shared handle to the same feed.
#[derive(Debug)]
pub struct MockAggregator {
    address: Address,
    decimals: u8,
    rounds: RwLock<Rounds>,
}

impl MockAggregator {
    /// Create a feed at `address` and report `initial_answer` as round 1
    pub fn new(address: Address, decimals: u8, initial_answer: i128) -> Self {
        let feed = Self {
            address,
            decimals,
            rounds: RwLock::new(Rounds {
                latest_round: 0,
                by_id: BTreeMap::new(),
            }),
        };
        feed.update_answer(initial_answer);
        feed
    }

    /// ETH/USD at $2000 with 8 decimals
    pub fn eth_usd(address: Address) -> Self {
        Self::new(address, MOCK_DECIMALS, MOCK_INITIAL_ANSWER)
    }

    /// Report a new answer timestamped now; returns the new round id
    pub fn update_answer(&self, answer: i128) -> u64 {
        let now = Utc::now().timestamp();
        self.update_round_data(answer, now, now)
    }

    /// Report a new answer with explicit timestamps
    pub fn update_round_data(&self, answer: i128, started_at: i64, updated_at: i64) -> u64 {
        let mut rounds = self.rounds.write().unwrap_or_else(|e| e.into_inner());
        let round_id = rounds.latest_round + 1;
        rounds.latest_round = round_id;
        rounds.by_id.insert(
            round_id,
            RoundData {
                round_id,
                answer,
                started_at,
                updated_at,
                answered_in_round: round_id,
            },
        );
        debug!(feed = %self.address, round_id, answer, "mock aggregator updated");
        round_id
    }

    /// Look up a historical round
    pub fn round_data(&self, round_id: u64) -> Result<RoundData, OracleError> {
        let rounds = self.rounds.read().unwrap_or_else(|e| e.into_inner());
        rounds
            .by_id
            .get(&round_id)
            .copied()
            .ok_or(OracleError::RoundNotFound(round_id))
    }

    /// Id of the most recent round
    pub fn latest_round(&self) -> u64 {
        self.rounds.read().unwrap_or_else(|e| e.into_inner()).latest_round
    }

    /// Export every reported round
    pub fn snapshot(&self) -> AggregatorSnapshot {
        let rounds = self.rounds.read().unwrap_or_else(|e| e.into_inner());
        AggregatorSnapshot {
            address: self.address,
            decimals: self.decimals,
            rounds: rounds.by_id.values().copied().collect(),
        }
    }

    /// Rebuild a feed from an exported snapshot
    pub fn from_snapshot(snapshot: AggregatorSnapshot) -> Self {
        let latest_round = snapshot.rounds.iter().map(|r| r.round_id).max().unwrap_or(0);
        let by_id = snapshot.rounds.into_iter().map(|r| (r.round_id, r)).collect();
        Self {
            address: snapshot.address,
            decimals: snapshot.decimals,
            rounds: RwLock::new(Rounds { latest_round, by_id }),
        }
    }
}

impl PriceOracle for MockAggregator {
    fn address(&self) -> Address {
        self.address
    }

    fn decimals(&self) -> u8 {
        self.decimals
    }

    fn description(&self) -> String {
        "ETH / USD (mock)".to_string()
    }

    fn version(&self) -> u64 {
        MOCK_VERSION
    }

    fn latest_round_data(&self) -> Result<RoundData, OracleError> {
        let latest = self.latest_round();
        self.round_data(latest)
    }
}
