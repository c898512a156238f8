// FundMe - owner-withdrawable funding ledger
//
// Deposits must be worth at least $50 at the price feed's latest rate.
// The owner sweeps the whole balance with either withdrawal variant.

pub mod deploy;
pub mod identity;
pub mod ledger;
pub mod oracle;
pub mod runtime;
pub mod storage;
pub mod units;
