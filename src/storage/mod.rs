// Storage module - Persistent state for the CLI host (sled)

mod store;

pub use store::{FundStore, StoreError};
