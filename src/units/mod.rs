// Units module - Decimal ether/gwei strings <-> integer wei

mod ether;

pub use ether::{
    format_ether, format_units, parse_ether, parse_gwei, parse_units, UnitsError,
    ETHER_DECIMALS, GWEI, WEI_PER_ETHER,
};
