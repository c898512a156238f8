// Price Converter - base-asset amounts to reference-currency value
//
// All values are fixed point. Prices and converted values carry
// PRICE_DECIMALS (18) fractional digits, amounts are in wei. Every
// division rounds toward zero so a deposit is never valued above what
// the feed supports.

use super::feed::{OracleError, PriceOracle};
use thiserror::Error;
use tracing::debug;

/// Fractional digits of a normalized price or converted value
pub const PRICE_DECIMALS: u32 = 18;

const MAX_FEED_DECIMALS: u8 = 38;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Arithmetic overflow during conversion")]
    Overflow,
}

/// floor(a * b / d) without forming the full product
///
/// Splits `a` into quotient and remainder by `d` so the only products
/// taken are `(a / d) * b` and `(a % d) * b`, each checked.
pub fn mul_div_floor(a: u128, b: u128, d: u128) -> Option<u128> {
    if d == 0 {
        return None;
    }
    let high = (a / d).checked_mul(b)?;
    let low = (a % d).checked_mul(b)? / d;
    high.checked_add(low)
}

fn positive_answer(feed: &dyn PriceOracle) -> Result<(u128, u8), ConversionError> {
    let round = feed.latest_round_data()?;
    if round.answer <= 0 {
        return Err(OracleError::InvalidAnswer(round.answer).into());
    }

    let decimals = feed.decimals();
    if decimals > MAX_FEED_DECIMALS {
        return Err(OracleError::UnsupportedDecimals(decimals).into());
    }

    debug!(
        feed = %feed.address(),
        round_id = round.round_id,
        answer = round.answer,
        decimals,
        "read latest round"
    );
    Ok((round.answer as u128, decimals))
}

/// Latest price of one whole unit of the base asset, with 18 decimals
pub fn get_price(feed: &dyn PriceOracle) -> Result<u128, ConversionError> {
    let (answer, decimals) = positive_answer(feed)?;
    let decimals = decimals as u32;

    if decimals <= PRICE_DECIMALS {
        answer
            .checked_mul(10u128.pow(PRICE_DECIMALS - decimals))
            .ok_or(ConversionError::Overflow)
    } else {
        Ok(answer / 10u128.pow(decimals - PRICE_DECIMALS))
    }
}

/// Reference-currency value (18 decimals) of `amount` wei, rounded down
///
/// Equal to `price * amount / 10^18` with `price` normalized to 18
/// decimals, computed at the feed's native precision instead.
pub fn get_conversion_rate(amount: u128, feed: &dyn PriceOracle) -> Result<u128, ConversionError> {
    let (answer, decimals) = positive_answer(feed)?;
    mul_div_floor(amount, answer, 10u128.pow(decimals as u32)).ok_or(ConversionError::Overflow)
}
