// Executor - runs contract calls as all-or-nothing transactions
//
// A transaction takes the attached value plus gas_limit * gas_price from
// the sender up front, runs the contract method on a fresh gas meter and,
// on success, refunds the gas it did not use. A contract error puts the
// sender and the owner back where they started, so a rejected deposit
// hands its value straight back and costs nothing.

use crate::identity::Address;
use crate::ledger::{CallContext, FundError, FundMe, GasMeter, GasReport, GasSchedule, GasUsage};
use crate::runtime::accounts::{AccountBook, AccountError};
use crate::units::{format_ether, GWEI};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("Insufficient funds: available {available}, required {required}")]
    InsufficientFunds { available: u128, required: u128 },

    #[error("Transaction reverted: {0}")]
    Reverted(#[from] FundError),

    #[error("Account error: {0}")]
    Account(#[from] AccountError),

    #[error("Upfront gas cost overflows")]
    GasCostOverflow,
}

// ============================================================================
// CONFIG
// ============================================================================

/// Gas parameters applied to every transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub gas_limit: u64,
    /// Wei per unit of gas
    pub gas_price: u128,
    pub schedule: GasSchedule,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            gas_limit: 30_000_000,
            gas_price: GWEI,
            schedule: GasSchedule::default(),
        }
    }
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    pub fn with_gas_price(mut self, gas_price: u128) -> Self {
        self.gas_price = gas_price;
        self
    }

    pub fn with_schedule(mut self, schedule: GasSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Most a sender can be charged for gas in one transaction
    pub fn max_gas_cost(&self) -> Option<u128> {
        (self.gas_limit as u128).checked_mul(self.gas_price)
    }
}

// ============================================================================
// RECEIPTS
// ============================================================================

/// Contract entry points a transaction can target
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    Fund,
    Receive,
    Withdraw,
    CheaperWithdraw,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Fund => "fund",
            Method::Receive => "receive",
            Method::Withdraw => "withdraw",
            Method::CheaperWithdraw => "cheaperWithdraw",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a successful transaction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub method: Method,
    pub from: Address,
    pub to: Address,
    pub nonce: u64,
    /// Wei attached by the sender
    pub value: u128,
    /// Wei paid out by a withdrawal
    pub withdrawn: Option<u128>,
    pub gas_used: u64,
    pub effective_gas_price: u128,
    pub usage: GasUsage,
}

impl Receipt {
    /// Wei the sender paid for gas
    pub fn gas_cost(&self) -> u128 {
        (self.gas_used as u128).saturating_mul(self.effective_gas_price)
    }
}

// ============================================================================
// RUNTIME
// ============================================================================

/// A deployed FundMe plus the external accounts that talk to it
pub struct Runtime {
    address: Address,
    contract: FundMe,
    accounts: AccountBook,
    config: RuntimeConfig,
    report: GasReport,
}

impl Runtime {
    pub fn new(address: Address, contract: FundMe, accounts: AccountBook, config: RuntimeConfig) -> Self {
        Self {
            address,
            contract,
            accounts,
            config,
            report: GasReport::new(),
        }
    }

    /// Continue accumulating into a previously saved report
    pub fn with_report(mut self, report: GasReport) -> Self {
        self.report = report;
        self
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn contract(&self) -> &FundMe {
        &self.contract
    }

    pub fn accounts(&self) -> &AccountBook {
        &self.accounts
    }

    pub fn accounts_mut(&mut self) -> &mut AccountBook {
        &mut self.accounts
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn report(&self) -> &GasReport {
        &self.report
    }

    /// External balance of an account
    pub fn balance_of(&self, account: &Address) -> u128 {
        if *account == self.address {
            self.contract.balance()
        } else {
            self.accounts.balance(account)
        }
    }

    // ========================================================================
    // TRANSACTIONS
    // ========================================================================

    pub fn fund(&mut self, from: &Address, value: u128) -> Result<Receipt, RuntimeError> {
        self.execute(Method::Fund, from, value)
    }

    /// Send value to the contract with no call data
    pub fn receive(&mut self, from: &Address, value: u128) -> Result<Receipt, RuntimeError> {
        self.execute(Method::Receive, from, value)
    }

    pub fn withdraw(&mut self, from: &Address) -> Result<Receipt, RuntimeError> {
        self.execute(Method::Withdraw, from, 0)
    }

    pub fn cheaper_withdraw(&mut self, from: &Address) -> Result<Receipt, RuntimeError> {
        self.execute(Method::CheaperWithdraw, from, 0)
    }

    fn execute(&mut self, method: Method, from: &Address, value: u128) -> Result<Receipt, RuntimeError> {
        let max_gas_cost = self.config.max_gas_cost().ok_or(RuntimeError::GasCostOverflow)?;
        let required = value
            .checked_add(max_gas_cost)
            .ok_or(RuntimeError::GasCostOverflow)?;
        let available = self.accounts.balance(from);
        if available < required {
            return Err(RuntimeError::InsufficientFunds {
                available,
                required,
            });
        }

        // only the sender pays and only the owner is paid
        let checkpoint = self.accounts.checkpoint(&[*from, *self.contract.owner()]);
        self.accounts.debit(from, required)?;
        let nonce = self.accounts.next_nonce(from);

        let mut meter = GasMeter::new(self.config.schedule, self.config.gas_limit);
        let outcome = match meter.charge_transaction() {
            Err(e) => Err(FundError::from(e)),
            Ok(()) => {
                let mut ctx = CallContext::with_meter(*from, value, meter);
                let result = match method {
                    Method::Fund => self.contract.fund(&mut ctx).map(|_| None),
                    Method::Receive => self.contract.receive(&mut ctx).map(|_| None),
                    Method::Withdraw => self.contract.withdraw(&mut ctx, &mut self.accounts).map(Some),
                    Method::CheaperWithdraw => {
                        self.contract.cheaper_withdraw(&mut ctx, &mut self.accounts).map(Some)
                    }
                };
                result.map(|withdrawn| (withdrawn, ctx.into_meter()))
            }
        };

        let (withdrawn, meter) = match outcome {
            Ok(done) => done,
            Err(e) => {
                self.accounts.restore(checkpoint);
                warn!(%method, sender = %from, value = %format_ether(value), error = %e, "transaction reverted");
                return Err(RuntimeError::Reverted(e));
            }
        };

        // gas_used never exceeds gas_limit, so the fee fits in what was taken up front
        let gas_used = meter.gas_used();
        let fee = (gas_used as u128).saturating_mul(self.config.gas_price);
        self.accounts.refund(from, max_gas_cost.saturating_sub(fee));
        self.report.record(method.as_str(), gas_used);

        debug!(%method, gas_used, usage = ?meter.usage(), "gas charged");
        info!(
            %method,
            sender = %from,
            nonce,
            value = %format_ether(value),
            gas_used,
            "transaction applied"
        );

        Ok(Receipt {
            method,
            from: *from,
            to: self.address,
            nonce,
            value,
            withdrawn,
            gas_used,
            effective_gas_price: self.config.gas_price,
            usage: meter.usage(),
        })
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("address", &self.address)
            .field("contract", &self.contract)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
