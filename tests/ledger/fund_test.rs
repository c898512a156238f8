// FundMe Deposit Tests
// Minimum enforcement, contribution bookkeeping and the funder sequence

use fundme::identity::{Address, Keypair};
use fundme::ledger::{CallContext, FundError, FundMe, GasMeter, GasSchedule, MINIMUM_USD};
use fundme::oracle::{MockAggregator, OracleError, PriceOracle};
use fundme::units::{parse_ether, WEI_PER_ETHER};
use std::sync::Arc;

fn setup() -> (FundMe, Arc<MockAggregator>, Address) {
    let owner = Keypair::generate().address();
    let feed = Arc::new(MockAggregator::eth_usd(Address::from_bytes([0xfe; 20])));
    let fund_me = FundMe::new(owner, feed.clone());
    (fund_me, feed, owner)
}

fn deposit(fund_me: &mut FundMe, sender: Address, value: u128) -> Result<(), FundError> {
    fund_me.fund(&mut CallContext::new(sender, value))
}

// ============================================================================
// CONSTRUCTION
// ============================================================================

#[test]
fn test_new_ledger_is_empty() {
    let (fund_me, feed, owner) = setup();

    assert_eq!(fund_me.owner(), &owner);
    assert_eq!(fund_me.price_feed().address(), feed.address());
    assert_eq!(fund_me.balance(), 0);
    assert_eq!(fund_me.funder_count(), 0);
    assert_eq!(fund_me.funder(0), None);
    assert!(fund_me.state().is_empty());
}

#[test]
fn test_version_comes_from_feed() {
    let (fund_me, _, _) = setup();

    assert_eq!(fund_me.version(), 0);
}

// ============================================================================
// MINIMUM VALUE
// ============================================================================

#[test]
fn test_fund_rejects_small_deposit() {
    let (mut fund_me, _, _) = setup();
    let funder = Keypair::generate().address();

    let result = deposit(&mut fund_me, funder, parse_ether("0.01").unwrap());

    assert_eq!(
        result,
        Err(FundError::InsufficientValue {
            converted: 20 * WEI_PER_ETHER,
            minimum: MINIMUM_USD,
        })
    );
    assert_eq!(fund_me.balance(), 0);
    assert_eq!(fund_me.funder_count(), 0);
    assert_eq!(fund_me.amount_funded(&funder), 0);
}

#[test]
fn test_fund_rejects_zero_value() {
    let (mut fund_me, _, _) = setup();

    let result = deposit(&mut fund_me, Keypair::generate().address(), 0);

    assert!(matches!(result, Err(FundError::InsufficientValue { converted: 0, .. })));
}

#[test]
fn test_fund_accepts_exact_minimum() {
    let (mut fund_me, _, _) = setup();
    let funder = Keypair::generate().address();
    let exact = parse_ether("0.025").unwrap();

    assert!(deposit(&mut fund_me, funder, exact - 1).is_err());
    deposit(&mut fund_me, funder, exact).unwrap();

    assert_eq!(fund_me.amount_funded(&funder), exact);
}

#[test]
fn test_minimum_follows_latest_price() {
    let (mut fund_me, feed, _) = setup();
    let funder = Keypair::generate().address();
    let value = parse_ether("0.04").unwrap();

    // $80 at $2000
    deposit(&mut fund_me, funder, value).unwrap();

    // $40 at $1000
    feed.update_answer(100_000_000_000);
    assert!(matches!(
        deposit(&mut fund_me, funder, value),
        Err(FundError::InsufficientValue { .. })
    ));
    assert_eq!(fund_me.amount_funded(&funder), value);
}

#[test]
fn test_fund_propagates_bad_oracle_answer() {
    let (mut fund_me, feed, _) = setup();
    feed.update_answer(-1);

    let result = deposit(&mut fund_me, Keypair::generate().address(), WEI_PER_ETHER);

    assert_eq!(result, Err(FundError::Oracle(OracleError::InvalidAnswer(-1))));
    assert_eq!(fund_me.balance(), 0);
}

// ============================================================================
// BOOKKEEPING
// ============================================================================

#[test]
fn test_fund_records_contribution() {
    let (mut fund_me, _, _) = setup();
    let funder = Keypair::generate().address();

    deposit(&mut fund_me, funder, WEI_PER_ETHER).unwrap();

    assert_eq!(fund_me.amount_funded(&funder), WEI_PER_ETHER);
    assert_eq!(fund_me.funder(0), Some(funder));
    assert_eq!(fund_me.funder_count(), 1);
    assert_eq!(fund_me.balance(), WEI_PER_ETHER);
}

#[test]
fn test_repeat_funder_accumulates_and_repeats_in_sequence() {
    let (mut fund_me, _, _) = setup();
    let funder = Keypair::generate().address();

    deposit(&mut fund_me, funder, WEI_PER_ETHER).unwrap();
    deposit(&mut fund_me, funder, 2 * WEI_PER_ETHER).unwrap();

    assert_eq!(fund_me.amount_funded(&funder), 3 * WEI_PER_ETHER);
    assert_eq!(fund_me.funder_count(), 2);
    assert_eq!(fund_me.funder(0), Some(funder));
    assert_eq!(fund_me.funder(1), Some(funder));
    assert_eq!(fund_me.state().contributor_count(), 1);
}

#[test]
fn test_funder_sequence_keeps_deposit_order() {
    let (mut fund_me, _, _) = setup();
    let funders: Vec<Address> = (0..5).map(|_| Keypair::generate().address()).collect();

    for funder in &funders {
        deposit(&mut fund_me, *funder, WEI_PER_ETHER).unwrap();
    }

    assert_eq!(fund_me.state().funders(), funders.as_slice());
    assert_eq!(fund_me.balance(), 5 * WEI_PER_ETHER);
    assert!(fund_me.state().is_consistent());
}

#[test]
fn test_receive_and_fallback_route_to_fund() {
    let (mut fund_me, _, _) = setup();
    let funder = Keypair::generate().address();

    fund_me.receive(&mut CallContext::new(funder, WEI_PER_ETHER)).unwrap();
    fund_me.fallback(&mut CallContext::new(funder, WEI_PER_ETHER)).unwrap();

    assert_eq!(fund_me.amount_funded(&funder), 2 * WEI_PER_ETHER);
    assert_eq!(fund_me.funder_count(), 2);

    let small = fund_me.receive(&mut CallContext::new(funder, 1));
    assert!(matches!(small, Err(FundError::InsufficientValue { .. })));
}

// ============================================================================
// GAS
// ============================================================================

#[test]
fn test_fund_out_of_gas_leaves_state_untouched() {
    let (mut fund_me, _, _) = setup();
    let funder = Keypair::generate().address();
    deposit(&mut fund_me, funder, WEI_PER_ETHER).unwrap();
    let before = fund_me.state().clone();

    // enough for the oracle call and the reads, not for the writes
    let meter = GasMeter::new(GasSchedule::default(), 10_000);
    let mut ctx = CallContext::with_meter(funder, WEI_PER_ETHER, meter);
    let result = fund_me.fund(&mut ctx);

    assert!(matches!(result, Err(FundError::OutOfGas(_))));
    assert_eq!(fund_me.state(), &before);
}

#[test]
fn test_fund_out_of_gas_mid_write_applies_nothing() {
    let (mut fund_me, _, _) = setup();
    let funder = Keypair::generate().address();
    deposit(&mut fund_me, funder, WEI_PER_ETHER).unwrap();
    let before = fund_me.state().clone();

    // the contribution and sequence length writes fit, the new element does not
    let meter = GasMeter::new(GasSchedule::default(), 32_000);
    let mut ctx = CallContext::with_meter(funder, WEI_PER_ETHER, meter);

    assert!(matches!(fund_me.fund(&mut ctx), Err(FundError::OutOfGas(_))));
    assert_eq!(fund_me.state(), &before);
    assert_eq!(fund_me.funder_count(), 1);
    assert!(fund_me.state().is_consistent());
}

#[test]
fn test_repeat_deposit_cost_does_not_grow_with_history() {
    let (mut fund_me, _, _) = setup();
    let funder = Keypair::generate().address();
    deposit(&mut fund_me, funder, WEI_PER_ETHER).unwrap();

    let mut early = CallContext::new(funder, WEI_PER_ETHER);
    fund_me.fund(&mut early).unwrap();
    for _ in 0..50 {
        deposit(&mut fund_me, Keypair::generate().address(), WEI_PER_ETHER).unwrap();
    }
    let mut late = CallContext::new(funder, WEI_PER_ETHER);
    fund_me.fund(&mut late).unwrap();

    assert_eq!(early.meter().usage(), late.meter().usage());
}

#[test]
fn test_first_deposit_costs_more_than_repeat() {
    let (mut fund_me, _, _) = setup();
    let funder = Keypair::generate().address();

    let mut first = CallContext::new(funder, WEI_PER_ETHER);
    fund_me.fund(&mut first).unwrap();
    let mut second = CallContext::new(funder, WEI_PER_ETHER);
    fund_me.fund(&mut second).unwrap();

    assert!(second.meter().gas_used() < first.meter().gas_used());
}
