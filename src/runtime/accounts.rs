// Account Book - balances and nonces of externally owned accounts

use crate::identity::Address;
use crate::ledger::{TransferError, ValueTransfer};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("Insufficient funds: available {available}, required {required}")]
    InsufficientFunds { available: u128, required: u128 },

    #[error("Balance would overflow")]
    Overflow,
}

/// Balances and nonces of a few accounts, captured before a transaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountCheckpoint {
    entries: Vec<(Address, Option<u128>, Option<u64>)>,
}

/// Wei balances held outside the contract
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBook {
    balances: HashMap<Address, u128>,
    nonces: HashMap<Address, u64>,
    /// Accounts that refuse incoming transfers
    rejecting: HashSet<Address>,
}

impl AccountBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self, account: &Address) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Add freshly minted wei to an account (development faucet)
    pub fn mint(&mut self, account: Address, amount: u128) -> Result<(), AccountError> {
        let balance = self.balances.entry(account).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(AccountError::Overflow)?;
        Ok(())
    }

    /// Remove wei from an account
    pub fn debit(&mut self, account: &Address, amount: u128) -> Result<(), AccountError> {
        let available = self.balance(account);
        if available < amount {
            return Err(AccountError::InsufficientFunds {
                available,
                required: amount,
            });
        }
        if amount > 0 {
            self.balances.insert(*account, available - amount);
        }
        Ok(())
    }

    pub fn nonce(&self, account: &Address) -> u64 {
        self.nonces.get(account).copied().unwrap_or(0)
    }

    /// Return the current nonce and advance it
    pub fn next_nonce(&mut self, account: &Address) -> u64 {
        let nonce = self.nonces.entry(*account).or_insert(0);
        let current = *nonce;
        *nonce += 1;
        current
    }

    /// Move the nonce forward after nonces were consumed elsewhere (deployments)
    pub fn set_nonce(&mut self, account: Address, nonce: u64) {
        let current = self.nonces.entry(account).or_insert(0);
        *current = (*current).max(nonce);
    }

    /// Hand wei back to an account it was taken from
    ///
    /// Saturates instead of failing: the caller only returns part of an
    /// amount it debited from the same account.
    pub fn refund(&mut self, account: &Address, amount: u128) {
        if amount > 0 {
            let balance = self.balances.entry(*account).or_insert(0);
            *balance = balance.saturating_add(amount);
        }
    }

    /// Capture balance and nonce of `accounts`
    pub fn checkpoint(&self, accounts: &[Address]) -> AccountCheckpoint {
        AccountCheckpoint {
            entries: accounts
                .iter()
                .map(|a| (*a, self.balances.get(a).copied(), self.nonces.get(a).copied()))
                .collect(),
        }
    }

    /// Put back what `checkpoint` captured; other accounts are left alone
    pub fn restore(&mut self, checkpoint: AccountCheckpoint) {
        for (account, balance, nonce) in checkpoint.entries {
            match balance {
                Some(balance) => self.balances.insert(account, balance),
                None => self.balances.remove(&account),
            };
            match nonce {
                Some(nonce) => self.nonces.insert(account, nonce),
                None => self.nonces.remove(&account),
            };
        }
    }

    /// Make `account` refuse (or accept again) incoming value
    pub fn set_rejecting(&mut self, account: Address, rejecting: bool) {
        if rejecting {
            self.rejecting.insert(account);
        } else {
            self.rejecting.remove(&account);
        }
    }

    pub fn is_rejecting(&self, account: &Address) -> bool {
        self.rejecting.contains(account)
    }

    /// Accounts with a non-zero balance
    pub fn accounts(&self) -> impl Iterator<Item = (&Address, &u128)> {
        self.balances.iter().filter(|(_, balance)| **balance > 0)
    }

    /// Sum of all external balances
    pub fn total(&self) -> u128 {
        self.balances.values().fold(0u128, |acc, b| acc.saturating_add(*b))
    }
}

impl ValueTransfer for AccountBook {
    fn transfer(&mut self, to: &Address, amount: u128) -> Result<(), TransferError> {
        if self.rejecting.contains(to) {
            return Err(TransferError::Rejected(*to));
        }
        let current = self.balance(to);
        let updated = current.checked_add(amount).ok_or(TransferError::Overflow)?;
        self.balances.insert(*to, updated);
        Ok(())
    }
}
