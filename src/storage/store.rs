// FundStore - Persistent key-value storage using sled
//
// Provides typed access for storing:
// - Labelled account keypairs
// - External account balances and nonces
// - Mock aggregator rounds
// - The deployment record and the contract's ledger state
// - The running gas report

use crate::deploy::Deployment;
use crate::identity::Keypair;
use crate::ledger::{GasReport, LedgerState};
use crate::oracle::AggregatorSnapshot;
use crate::runtime::AccountBook;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

/// Key prefixes for organizing data
mod keys {
    pub const KEYPAIR_PREFIX: &[u8] = b"account:keypair:";
    pub const ACCOUNTS: &[u8] = b"runtime:accounts";
    pub const GAS_REPORT: &[u8] = b"runtime:gas_report";
    pub const MOCK_AGGREGATOR: &[u8] = b"oracle:mock";
    pub const DEPLOYMENT: &[u8] = b"deploy:record";
    pub const LEDGER_STATE: &[u8] = b"ledger:state";
}

/// Errors from storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open database: {0}")]
    OpenFailed(String),

    #[error("Database operation failed: {0}")]
    DatabaseError(String),

    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    #[error("Flush failed: {0}")]
    FlushFailed(String),
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::DatabaseError(err.to_string())
    }
}

/// Persistent store behind the CLI host
///
/// Uses sled for crash-safe, embedded storage.
/// All writes are atomic and durable after flush.
pub struct FundStore {
    db: sled::Db,
}

impl FundStore {
    /// Open or create a store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path).map_err(|e| StoreError::OpenFailed(e.to_string()))?;
        Ok(Self { db })
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.db.is_empty())
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db
            .flush()
            .map_err(|e| StoreError::FlushFailed(e.to_string()))?;
        Ok(())
    }

    // ========================================================================
    // RAW AND TYPED OPERATIONS
    // ========================================================================

    /// Put raw bytes
    pub fn put_raw(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.db.insert(key, value)?;
        Ok(())
    }

    /// Get raw bytes
    pub fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.db.get(key)?.map(|v| v.to_vec()))
    }

    fn put<T: Serialize>(&self, key: &[u8], value: &T) -> Result<(), StoreError> {
        let bytes = postcard::to_allocvec(value)
            .map_err(|e| StoreError::SerializationFailed(e.to_string()))?;
        self.put_raw(key, &bytes)
    }

    fn get<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>, StoreError> {
        match self.get_raw(key)? {
            Some(bytes) => postcard::from_bytes(&bytes)
                .map(Some)
                .map_err(|e| StoreError::DeserializationFailed(e.to_string())),
            None => Ok(None),
        }
    }

    // ========================================================================
    // ACCOUNT KEYPAIRS
    // ========================================================================

    /// Save a keypair under a label
    pub fn save_keypair(&self, label: &str, keypair: &Keypair) -> Result<(), StoreError> {
        let key = [keys::KEYPAIR_PREFIX, label.as_bytes()].concat();
        self.put_raw(&key, &keypair.to_bytes())
    }

    /// Load a keypair by label
    pub fn load_keypair(&self, label: &str) -> Result<Option<Keypair>, StoreError> {
        let key = [keys::KEYPAIR_PREFIX, label.as_bytes()].concat();
        match self.get_raw(&key)? {
            Some(bytes) => {
                let keypair = Keypair::from_bytes(&bytes)
                    .map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
                Ok(Some(keypair))
            }
            None => Ok(None),
        }
    }

    /// All stored keypairs, ordered by label
    pub fn list_keypairs(&self) -> Result<Vec<(String, Keypair)>, StoreError> {
        let mut pairs = Vec::new();
        for result in self.db.scan_prefix(keys::KEYPAIR_PREFIX) {
            let (key, value) = result?;
            let label = String::from_utf8_lossy(&key[keys::KEYPAIR_PREFIX.len()..]).into_owned();
            let keypair = Keypair::from_bytes(&value)
                .map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
            pairs.push((label, keypair));
        }
        Ok(pairs)
    }

    // ========================================================================
    // RUNTIME PERSISTENCE
    // ========================================================================

    pub fn save_accounts(&self, accounts: &AccountBook) -> Result<(), StoreError> {
        self.put(keys::ACCOUNTS, accounts)
    }

    /// Load external balances, empty when none were saved
    pub fn load_accounts(&self) -> Result<AccountBook, StoreError> {
        Ok(self.get(keys::ACCOUNTS)?.unwrap_or_default())
    }

    pub fn save_gas_report(&self, report: &GasReport) -> Result<(), StoreError> {
        self.put(keys::GAS_REPORT, report)
    }

    pub fn load_gas_report(&self) -> Result<GasReport, StoreError> {
        Ok(self.get(keys::GAS_REPORT)?.unwrap_or_default())
    }

    // ========================================================================
    // ORACLE AND DEPLOYMENT PERSISTENCE
    // ========================================================================

    pub fn save_mock_aggregator(&self, snapshot: &AggregatorSnapshot) -> Result<(), StoreError> {
        self.put(keys::MOCK_AGGREGATOR, snapshot)
    }

    pub fn load_mock_aggregator(&self) -> Result<Option<AggregatorSnapshot>, StoreError> {
        self.get(keys::MOCK_AGGREGATOR)
    }

    pub fn save_deployment(&self, deployment: &Deployment) -> Result<(), StoreError> {
        self.put(keys::DEPLOYMENT, deployment)
    }

    pub fn load_deployment(&self) -> Result<Option<Deployment>, StoreError> {
        self.get(keys::DEPLOYMENT)
    }

    pub fn save_ledger_state(&self, state: &LedgerState) -> Result<(), StoreError> {
        self.put(keys::LEDGER_STATE, state)
    }

    pub fn load_ledger_state(&self) -> Result<Option<LedgerState>, StoreError> {
        self.get(keys::LEDGER_STATE)
    }
}
