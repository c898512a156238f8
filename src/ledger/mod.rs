// Ledger module - THE CONTRACT
// Deposit validation, the funder ledger, both withdrawal algorithms and gas metering

mod clear;
mod fund_me;
mod meter;
mod state;

pub use clear::{clear_ledger, Traversal};
pub use fund_me::{CallContext, FundError, FundMe, TransferError, ValueTransfer, MINIMUM_USD};
pub use meter::{GasMeter, GasReport, GasSchedule, GasUsage, MethodGas, OutOfGas};
pub use state::{LedgerState, Slots};
