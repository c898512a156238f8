// FundMe - the funding ledger contract
//
// Accepts deposits worth at least MINIMUM_USD at the oracle's latest
// rate, records who paid what, and lets the owner sweep the whole
// balance. A deposit runs every fallible step before its first write; a
// withdrawal clears a working copy and swaps it in once the transfer lands.

use crate::identity::Address;
use crate::ledger::clear::{clear_ledger, Traversal};
use crate::ledger::meter::{GasMeter, OutOfGas};
use crate::ledger::state::{LedgerState, Slots};
use crate::oracle::{get_conversion_rate, ConversionError, OracleError, PriceOracle};
use crate::units::{format_ether, WEI_PER_ETHER};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// $50 with 18 decimals
pub const MINIMUM_USD: u128 = 50 * WEI_PER_ETHER;

// ============================================================================
// ERRORS
// ============================================================================

/// Why an outbound value transfer did not happen
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("Recipient {0} rejected the transfer")]
    Rejected(Address),

    #[error("Recipient balance would overflow")]
    Overflow,
}

/// Errors that can occur during ledger operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FundError {
    #[error("Insufficient value: deposit worth {converted} (18 decimals), minimum {minimum}")]
    InsufficientValue { converted: u128, minimum: u128 },

    #[error("Caller is not the owner")]
    NotOwner,

    #[error("Transfer to owner failed: {0}")]
    TransferFailed(TransferError),

    #[error("Price feed error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Arithmetic overflow converting deposit value")]
    ConversionOverflow,

    #[error("Ledger balance would overflow")]
    BalanceOverflow,

    #[error(transparent)]
    OutOfGas(#[from] OutOfGas),
}

impl From<ConversionError> for FundError {
    fn from(err: ConversionError) -> Self {
        match err {
            ConversionError::Oracle(e) => FundError::Oracle(e),
            ConversionError::Overflow => FundError::ConversionOverflow,
        }
    }
}

// ============================================================================
// CALL CONTEXT AND VALUE TRANSFER
// ============================================================================

/// Who is calling, what value is attached, and the gas meter for the call
#[derive(Clone, Debug)]
pub struct CallContext {
    sender: Address,
    value: u128,
    meter: GasMeter,
}

impl CallContext {
    /// A call with an unlimited default meter
    pub fn new(sender: Address, value: u128) -> Self {
        Self::with_meter(sender, value, GasMeter::default())
    }

    pub fn with_meter(sender: Address, value: u128, meter: GasMeter) -> Self {
        Self {
            sender,
            value,
            meter,
        }
    }

    pub fn sender(&self) -> &Address {
        &self.sender
    }

    /// Wei attached to the call
    pub fn value(&self) -> u128 {
        self.value
    }

    pub fn meter(&self) -> &GasMeter {
        &self.meter
    }

    pub fn meter_mut(&mut self) -> &mut GasMeter {
        &mut self.meter
    }

    pub fn into_meter(self) -> GasMeter {
        self.meter
    }
}

/// Destination for value leaving the contract
pub trait ValueTransfer {
    /// Credit `amount` wei to `to`; on error nothing may have moved
    fn transfer(&mut self, to: &Address, amount: u128) -> Result<(), TransferError>;
}

// ============================================================================
// CONTRACT
// ============================================================================

/// The funding ledger
pub struct FundMe {
    owner: Address,
    price_feed: Arc<dyn PriceOracle>,
    state: LedgerState,
}

impl FundMe {
    /// Create an empty ledger owned by `owner`, priced by `price_feed`
    pub fn new(owner: Address, price_feed: Arc<dyn PriceOracle>) -> Self {
        Self::from_parts(owner, price_feed, LedgerState::new())
    }

    /// Re-bind persisted state to its owner and feed
    pub fn from_parts(owner: Address, price_feed: Arc<dyn PriceOracle>, state: LedgerState) -> Self {
        Self {
            owner,
            price_feed,
            state,
        }
    }

    // ========================================================================
    // DEPOSITS
    // ========================================================================

    /// Record the attached value as a contribution from the caller
    ///
    /// Rejects with `InsufficientValue` when the value, converted at the
    /// feed's latest rate and rounded down, is below `MINIMUM_USD`.
    pub fn fund(&mut self, ctx: &mut CallContext) -> Result<(), FundError> {
        let sender = *ctx.sender();
        let amount = ctx.value();

        ctx.meter_mut().charge_external_call()?;
        let converted = get_conversion_rate(amount, self.price_feed.as_ref())?;
        if converted < MINIMUM_USD {
            warn!(
                funder = %sender,
                amount = %format_ether(amount),
                converted,
                "deposit below minimum"
            );
            return Err(FundError::InsufficientValue {
                converted,
                minimum: MINIMUM_USD,
            });
        }

        let mut slots = Slots::new(&mut self.state, ctx.meter_mut());
        let prior = slots.contribution(&sender)?;
        let updated = prior.checked_add(amount).ok_or(FundError::BalanceOverflow)?;
        let balance = slots.balance()?;
        let new_balance = balance.checked_add(amount).ok_or(FundError::BalanceOverflow)?;
        slots.record_deposit(sender, updated, new_balance)?;

        info!(
            funder = %sender,
            amount = %format_ether(amount),
            total = %format_ether(self.state.amount_funded(&sender)),
            "deposit accepted"
        );
        Ok(())
    }

    /// Plain value transfer with no call data
    pub fn receive(&mut self, ctx: &mut CallContext) -> Result<(), FundError> {
        self.fund(ctx)
    }

    /// Call data matching no entry point
    pub fn fallback(&mut self, ctx: &mut CallContext) -> Result<(), FundError> {
        self.fund(ctx)
    }

    // ========================================================================
    // WITHDRAWALS
    // ========================================================================

    /// Sweep the balance to the owner, walking the funder sequence in storage
    pub fn withdraw(
        &mut self,
        ctx: &mut CallContext,
        payee: &mut dyn ValueTransfer,
    ) -> Result<u128, FundError> {
        self.settle(ctx, payee, Traversal::Incremental)
    }

    /// Same outcome as `withdraw`, reading the funder sequence only once
    pub fn cheaper_withdraw(
        &mut self,
        ctx: &mut CallContext,
        payee: &mut dyn ValueTransfer,
    ) -> Result<u128, FundError> {
        self.settle(ctx, payee, Traversal::Bulk)
    }

    fn settle(
        &mut self,
        ctx: &mut CallContext,
        payee: &mut dyn ValueTransfer,
        traversal: Traversal,
    ) -> Result<u128, FundError> {
        if *ctx.sender() != self.owner {
            warn!(caller = %ctx.sender(), owner = %self.owner, "withdrawal by non-owner");
            return Err(FundError::NotOwner);
        }

        let mut working = self.state.clone();
        let amount = clear_ledger(&mut Slots::new(&mut working, ctx.meter_mut()), traversal)?;

        ctx.meter_mut().charge_external_call()?;
        if let Err(e) = payee.transfer(&self.owner, amount) {
            warn!(owner = %self.owner, amount = %format_ether(amount), error = %e, "withdrawal transfer failed");
            return Err(FundError::TransferFailed(e));
        }
        self.state = working;

        info!(
            owner = %self.owner,
            amount = %format_ether(amount),
            ?traversal,
            "ledger withdrawn"
        );
        Ok(amount)
    }

    // ========================================================================
    // GETTERS
    // ========================================================================

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn price_feed(&self) -> &Arc<dyn PriceOracle> {
        &self.price_feed
    }

    /// Version of the bound price feed
    pub fn version(&self) -> u64 {
        self.price_feed.version()
    }

    pub fn funder(&self, index: usize) -> Option<Address> {
        self.state.funder(index)
    }

    pub fn funder_count(&self) -> usize {
        self.state.funder_count()
    }

    pub fn amount_funded(&self, funder: &Address) -> u128 {
        self.state.amount_funded(funder)
    }

    /// Wei held by the contract
    pub fn balance(&self) -> u128 {
        self.state.balance()
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }
}

impl fmt::Debug for FundMe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FundMe")
            .field("owner", &self.owner)
            .field("price_feed", &self.price_feed.address())
            .field("state", &self.state)
            .finish()
    }
}
