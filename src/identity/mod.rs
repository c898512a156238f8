// Identity module - Ed25519 keypairs and the addresses the ledger keys on

mod address;
mod keypair;

pub use address::{Address, AddressError, ADDRESS_LENGTH};
pub use keypair::{Keypair, KeypairError, PublicKey};
