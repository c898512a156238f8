// Oracle module - THE EXCHANGE RATE
// Price feed abstraction, a deterministic mock aggregator, and USD conversion

mod converter;
mod feed;
mod mock;

pub use converter::{get_conversion_rate, get_price, mul_div_floor, ConversionError, PRICE_DECIMALS};
pub use feed::{OracleError, PriceOracle, RoundData};
pub use mock::{AggregatorSnapshot, MockAggregator, MOCK_DECIMALS, MOCK_INITIAL_ANSWER};
