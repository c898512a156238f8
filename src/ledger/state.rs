// Ledger State - contributions, funder sequence and held balance
//
// `LedgerState` is the persistent part of the contract. Reads through
// `&LedgerState` are free views; anything executed inside a transaction
// goes through `Slots`, which prices each access on a `GasMeter`.

use crate::identity::Address;
use crate::ledger::meter::{GasMeter, OutOfGas};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Everything the contract persists besides its immutable configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    /// Cumulative wei per depositor
    contributions: HashMap<Address, u128>,
    /// One entry per accepted deposit, duplicates included
    funders: Vec<Address>,
    /// Wei held by the contract
    balance: u128,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wei contributed by `funder` since the last withdrawal
    pub fn amount_funded(&self, funder: &Address) -> u128 {
        self.contributions.get(funder).copied().unwrap_or(0)
    }

    /// Funder at position `index` of the sequence
    pub fn funder(&self, index: usize) -> Option<Address> {
        self.funders.get(index).copied()
    }

    pub fn funders(&self) -> &[Address] {
        &self.funders
    }

    pub fn funder_count(&self) -> usize {
        self.funders.len()
    }

    /// Number of distinct depositors with a live record
    pub fn contributor_count(&self) -> usize {
        self.contributions.len()
    }

    pub fn contributions(&self) -> impl Iterator<Item = (&Address, &u128)> {
        self.contributions.iter()
    }

    pub fn balance(&self) -> u128 {
        self.balance
    }

    /// True when nothing is held or recorded
    pub fn is_empty(&self) -> bool {
        self.balance == 0 && self.contributions.is_empty() && self.funders.is_empty()
    }

    /// Checks `balance == sum(contributions)`
    pub fn is_consistent(&self) -> bool {
        self.contributions
            .values()
            .try_fold(0u128, |acc, v| acc.checked_add(*v))
            .map(|total| total == self.balance)
            .unwrap_or(false)
    }
}

/// Metered access to a `LedgerState` during a transaction
pub struct Slots<'a> {
    state: &'a mut LedgerState,
    meter: &'a mut GasMeter,
}

impl<'a> Slots<'a> {
    pub fn new(state: &'a mut LedgerState, meter: &'a mut GasMeter) -> Self {
        Self { state, meter }
    }

    // ========================================================================
    // CONTRIBUTION RECORD
    // ========================================================================

    pub fn contribution(&mut self, funder: &Address) -> Result<u128, OutOfGas> {
        self.meter.charge_read()?;
        Ok(self.state.amount_funded(funder))
    }

    /// Delete a record; deleting an absent key is charged all the same
    pub fn remove_contribution(&mut self, funder: &Address) -> Result<(), OutOfGas> {
        self.meter.charge_clear()?;
        self.state.contributions.remove(funder);
        Ok(())
    }

    // ========================================================================
    // FUNDER SEQUENCE
    // ========================================================================

    /// Read the sequence length from storage
    pub fn funder_count(&mut self) -> Result<usize, OutOfGas> {
        self.meter.charge_read()?;
        Ok(self.state.funders.len())
    }

    /// Read one element from storage
    pub fn funder_at(&mut self, index: usize) -> Result<Option<Address>, OutOfGas> {
        self.meter.charge_read()?;
        Ok(self.state.funder(index))
    }

    /// Copy the whole sequence into working memory with one storage access
    pub fn load_funders(&mut self) -> Result<Vec<Address>, OutOfGas> {
        self.meter.charge_read()?;
        self.meter.charge_memory(self.state.funders.len() as u64)?;
        Ok(self.state.funders.clone())
    }

    pub fn clear_funders(&mut self) -> Result<(), OutOfGas> {
        self.meter.charge_clear()?;
        self.state.funders.clear();
        Ok(())
    }

    // ========================================================================
    // BALANCE
    // ========================================================================

    pub fn balance(&mut self) -> Result<u128, OutOfGas> {
        self.meter.charge_read()?;
        Ok(self.state.balance)
    }

    pub fn set_balance(&mut self, balance: u128) -> Result<(), OutOfGas> {
        self.charge_balance_write(balance)?;
        self.state.balance = balance;
        Ok(())
    }

    fn charge_balance_write(&mut self, balance: u128) -> Result<(), OutOfGas> {
        if balance == 0 {
            self.meter.charge_clear()
        } else {
            self.meter.charge_write(self.state.balance == 0)
        }
    }

    // ========================================================================
    // DEPOSIT
    // ========================================================================

    /// Write one deposit: the funder's new total, a new sequence entry and
    /// the new balance.
    ///
    /// All three writes are charged before any of them lands, so running
    /// out of gas leaves the state as it was.
    pub fn record_deposit(
        &mut self,
        funder: Address,
        contribution: u128,
        balance: u128,
    ) -> Result<(), OutOfGas> {
        self.meter
            .charge_write(!self.state.contributions.contains_key(&funder))?;
        // sequence length slot, then the new element slot
        self.meter.charge_write(self.state.funders.is_empty())?;
        self.meter.charge_write(true)?;
        self.charge_balance_write(balance)?;

        self.state.contributions.insert(funder, contribution);
        self.state.funders.push(funder);
        self.state.balance = balance;
        Ok(())
    }
}
