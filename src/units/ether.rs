// Ether units - fixed-point parsing and formatting of base-asset amounts

use thiserror::Error;

/// Decimals of one ether expressed in wei
pub const ETHER_DECIMALS: u32 = 18;
/// 10^18 wei
pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;
/// 10^9 wei
pub const GWEI: u128 = 1_000_000_000;

/// Most decimals a u128 can carry without overflowing 10^decimals
const MAX_DECIMALS: u32 = 38;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum UnitsError {
    #[error("Empty amount")]
    Empty,

    #[error("Invalid digit in amount: {0:?}")]
    InvalidDigit(String),

    #[error("Too many fractional digits: {got} (max {max})")]
    TooPrecise { got: usize, max: u32 },

    #[error("Unsupported decimals: {0}")]
    UnsupportedDecimals(u32),

    #[error("Amount overflows u128")]
    Overflow,
}

/// Parse a decimal string such as `"0.025"` into base units with `decimals` places
pub fn parse_units(amount: &str, decimals: u32) -> Result<u128, UnitsError> {
    if decimals > MAX_DECIMALS {
        return Err(UnitsError::UnsupportedDecimals(decimals));
    }

    let amount = amount.trim();
    if amount.is_empty() {
        return Err(UnitsError::Empty);
    }

    let (whole, fraction) = match amount.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (amount, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(UnitsError::Empty);
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return Err(UnitsError::InvalidDigit(amount.to_string()));
    }
    if fraction.len() > decimals as usize {
        return Err(UnitsError::TooPrecise {
            got: fraction.len(),
            max: decimals,
        });
    }

    let scale = 10u128.pow(decimals);
    let whole_units = if whole.is_empty() {
        0
    } else {
        whole.parse::<u128>().map_err(|_| UnitsError::Overflow)?
    };

    let fraction_units = if fraction.is_empty() {
        0
    } else {
        let padding = 10u128.pow(decimals - fraction.len() as u32);
        fraction
            .parse::<u128>()
            .map_err(|_| UnitsError::Overflow)?
            * padding
    };

    whole_units
        .checked_mul(scale)
        .and_then(|w| w.checked_add(fraction_units))
        .ok_or(UnitsError::Overflow)
}

/// Parse an ether amount into wei
pub fn parse_ether(amount: &str) -> Result<u128, UnitsError> {
    parse_units(amount, ETHER_DECIMALS)
}

/// Parse a gwei amount into wei
pub fn parse_gwei(amount: &str) -> Result<u128, UnitsError> {
    parse_units(amount, 9)
}

/// Render base units as a decimal string, trimming trailing zeros
pub fn format_units(value: u128, decimals: u32) -> String {
    if decimals == 0 || decimals > MAX_DECIMALS {
        return value.to_string();
    }

    let scale = 10u128.pow(decimals);
    let whole = value / scale;
    let fraction = value % scale;

    if fraction == 0 {
        return format!("{}.0", whole);
    }

    let digits = format!("{:0width$}", fraction, width = decimals as usize);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

/// Render wei as ether
pub fn format_ether(wei: u128) -> String {
    format_units(wei, ETHER_DECIMALS)
}
