// Gas Metering - prices every persistent storage access the ledger makes

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use thiserror::Error;

// ============================================================================
// GAS SCHEDULE
// ============================================================================

/// Cost of each metered operation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasSchedule {
    /// Flat cost of submitting a transaction
    pub transaction: u64,
    /// Reading one storage slot
    pub storage_read: u64,
    /// Writing a slot that was empty
    pub storage_init: u64,
    /// Overwriting a non-empty slot
    pub storage_update: u64,
    /// Resetting a slot to empty
    pub storage_clear: u64,
    /// Copying one word from storage into working memory
    pub memory_word: u64,
    /// Calling out of the contract (oracle read, value transfer)
    pub external_call: u64,
}

impl Default for GasSchedule {
    fn default() -> Self {
        Self {
            transaction: 21_000,
            storage_read: 2_100,
            storage_init: 20_000,
            storage_update: 2_900,
            storage_clear: 2_900,
            memory_word: 3,
            external_call: 2_600,
        }
    }
}

impl GasSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// A schedule where nothing costs anything
    pub fn free() -> Self {
        Self {
            transaction: 0,
            storage_read: 0,
            storage_init: 0,
            storage_update: 0,
            storage_clear: 0,
            memory_word: 0,
            external_call: 0,
        }
    }

    pub fn with_transaction(mut self, gas: u64) -> Self {
        self.transaction = gas;
        self
    }

    pub fn with_storage_read(mut self, gas: u64) -> Self {
        self.storage_read = gas;
        self
    }

    pub fn with_memory_word(mut self, gas: u64) -> Self {
        self.memory_word = gas;
        self
    }
}

// ============================================================================
// GAS METER
// ============================================================================

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Out of gas: limit {limit}, required {required}")]
pub struct OutOfGas {
    pub limit: u64,
    pub required: u64,
}

/// Counters accumulated by a meter
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasUsage {
    pub gas_used: u64,
    pub storage_reads: u64,
    pub storage_writes: u64,
    pub memory_words: u64,
    pub external_calls: u64,
}

/// Per-call gas accumulator with a hard limit
#[derive(Clone, Debug)]
pub struct GasMeter {
    schedule: GasSchedule,
    limit: u64,
    usage: GasUsage,
}

impl GasMeter {
    /// Create a meter that fails once `limit` is exceeded
    pub fn new(schedule: GasSchedule, limit: u64) -> Self {
        Self {
            schedule,
            limit,
            usage: GasUsage::default(),
        }
    }

    /// Create a meter that never runs out
    pub fn unlimited(schedule: GasSchedule) -> Self {
        Self::new(schedule, u64::MAX)
    }

    pub fn schedule(&self) -> &GasSchedule {
        &self.schedule
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn gas_used(&self) -> u64 {
        self.usage.gas_used
    }

    pub fn usage(&self) -> GasUsage {
        self.usage
    }

    /// Charge a raw amount of gas
    pub fn charge(&mut self, gas: u64) -> Result<(), OutOfGas> {
        let required = self.usage.gas_used.saturating_add(gas);
        if required > self.limit {
            return Err(OutOfGas {
                limit: self.limit,
                required,
            });
        }
        self.usage.gas_used = required;
        Ok(())
    }

    pub fn charge_transaction(&mut self) -> Result<(), OutOfGas> {
        self.charge(self.schedule.transaction)
    }

    pub fn charge_read(&mut self) -> Result<(), OutOfGas> {
        self.usage.storage_reads += 1;
        self.charge(self.schedule.storage_read)
    }

    /// Charge a write; `was_empty` selects the init or update price
    pub fn charge_write(&mut self, was_empty: bool) -> Result<(), OutOfGas> {
        self.usage.storage_writes += 1;
        let gas = if was_empty {
            self.schedule.storage_init
        } else {
            self.schedule.storage_update
        };
        self.charge(gas)
    }

    pub fn charge_clear(&mut self) -> Result<(), OutOfGas> {
        self.usage.storage_writes += 1;
        self.charge(self.schedule.storage_clear)
    }

    pub fn charge_memory(&mut self, words: u64) -> Result<(), OutOfGas> {
        self.usage.memory_words += words;
        self.charge(self.schedule.memory_word.saturating_mul(words))
    }

    pub fn charge_external_call(&mut self) -> Result<(), OutOfGas> {
        self.usage.external_calls += 1;
        self.charge(self.schedule.external_call)
    }
}

impl Default for GasMeter {
    fn default() -> Self {
        Self::unlimited(GasSchedule::default())
    }
}

// ============================================================================
// GAS REPORT
// ============================================================================

/// Aggregated gas figures for one method
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodGas {
    pub calls: u64,
    pub min: u64,
    pub max: u64,
    pub total: u64,
}

impl MethodGas {
    pub fn average(&self) -> u64 {
        if self.calls == 0 {
            0
        } else {
            self.total / self.calls
        }
    }
}

/// Running per-method gas statistics across many transactions
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GasReport {
    methods: BTreeMap<String, MethodGas>,
}

impl GasReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one successful call of `method`
    pub fn record(&mut self, method: &str, gas_used: u64) {
        self.methods
            .entry(method.to_string())
            .and_modify(|m| {
                m.calls += 1;
                m.min = m.min.min(gas_used);
                m.max = m.max.max(gas_used);
                m.total = m.total.saturating_add(gas_used);
            })
            .or_insert(MethodGas {
                calls: 1,
                min: gas_used,
                max: gas_used,
                total: gas_used,
            });
    }

    pub fn method(&self, method: &str) -> Option<&MethodGas> {
        self.methods.get(method)
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Plain-text table, one row per method
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<18} {:>6} {:>10} {:>10} {:>10}",
            "method", "calls", "min", "max", "avg"
        );
        for (name, gas) in &self.methods {
            let _ = writeln!(
                out,
                "{:<18} {:>6} {:>10} {:>10} {:>10}",
                name,
                gas.calls,
                gas.min,
                gas.max,
                gas.average()
            );
        }
        out
    }
}
