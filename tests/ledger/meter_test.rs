// Gas Metering Tests
// Schedule pricing, limits and the per-method report

use fundme::ledger::{GasMeter, GasReport, GasSchedule, LedgerState, OutOfGas, Slots};
use fundme::identity::Address;

// ============================================================================
// SCHEDULE
// ============================================================================

#[test]
fn test_default_schedule() {
    let schedule = GasSchedule::default();

    assert_eq!(schedule.transaction, 21_000);
    assert_eq!(schedule.storage_read, 2_100);
    assert!(schedule.memory_word < schedule.storage_read);
}

#[test]
fn test_free_schedule_charges_nothing() {
    let mut meter = GasMeter::new(GasSchedule::free(), 0);

    meter.charge_transaction().unwrap();
    meter.charge_read().unwrap();
    meter.charge_write(true).unwrap();
    meter.charge_memory(100).unwrap();

    assert_eq!(meter.gas_used(), 0);
    assert_eq!(meter.usage().storage_reads, 1);
    assert_eq!(meter.usage().memory_words, 100);
}

#[test]
fn test_schedule_builders() {
    let schedule = GasSchedule::new()
        .with_transaction(1)
        .with_storage_read(2)
        .with_memory_word(3);

    assert_eq!(schedule.transaction, 1);
    assert_eq!(schedule.storage_read, 2);
    assert_eq!(schedule.memory_word, 3);
}

// ============================================================================
// METER
// ============================================================================

#[test]
fn test_write_prices_depend_on_prior_content() {
    let schedule = GasSchedule::default();
    let mut init = GasMeter::unlimited(schedule);
    let mut update = GasMeter::unlimited(schedule);

    init.charge_write(true).unwrap();
    update.charge_write(false).unwrap();

    assert_eq!(init.gas_used(), schedule.storage_init);
    assert_eq!(update.gas_used(), schedule.storage_update);
}

#[test]
fn test_out_of_gas_reports_limit_and_requirement() {
    let mut meter = GasMeter::new(GasSchedule::default(), 21_500);
    meter.charge_transaction().unwrap();

    let err = meter.charge_read().unwrap_err();

    assert_eq!(
        err,
        OutOfGas {
            limit: 21_500,
            required: 23_100
        }
    );
    assert_eq!(meter.gas_used(), 21_000);
}

#[test]
fn test_slots_meter_bulk_load() {
    let mut state = LedgerState::new();
    let mut meter = GasMeter::default();
    {
        let mut slots = Slots::new(&mut state, &mut meter);
        for i in 0..3u8 {
            let total = (i as u128 + 1) * 10;
            slots.record_deposit(Address::from_bytes([i; 20]), 10, total).unwrap();
        }
    }
    let writes = meter.usage().storage_writes;

    let mut slots = Slots::new(&mut state, &mut meter);
    let funders = slots.load_funders().unwrap();

    assert_eq!(funders.len(), 3);
    // contribution, sequence length, sequence element, balance
    assert_eq!(writes, 12);
    assert_eq!(meter.usage().storage_reads, 1);
    assert_eq!(meter.usage().memory_words, 3);
}

#[test]
fn test_record_deposit_prices_fresh_and_repeat_slots() {
    let schedule = GasSchedule::default();
    let funder = Address::from_bytes([1; 20]);
    let mut state = LedgerState::new();

    let mut first = GasMeter::unlimited(schedule);
    Slots::new(&mut state, &mut first).record_deposit(funder, 10, 10).unwrap();
    let mut repeat = GasMeter::unlimited(schedule);
    Slots::new(&mut state, &mut repeat).record_deposit(funder, 20, 20).unwrap();

    assert_eq!(first.gas_used(), 4 * schedule.storage_init);
    assert_eq!(
        repeat.gas_used(),
        3 * schedule.storage_update + schedule.storage_init
    );
    assert_eq!(state.amount_funded(&funder), 20);
    assert_eq!(state.funder_count(), 2);
    assert_eq!(state.balance(), 20);
}

// ============================================================================
// REPORT
// ============================================================================

#[test]
fn test_report_tracks_min_max_average() {
    let mut report = GasReport::new();
    assert!(report.is_empty());

    report.record("fund", 100);
    report.record("fund", 300);
    report.record("withdraw", 50);

    let fund = report.method("fund").unwrap();
    assert_eq!(fund.calls, 2);
    assert_eq!(fund.min, 100);
    assert_eq!(fund.max, 300);
    assert_eq!(fund.average(), 200);
    assert_eq!(report.method("withdraw").unwrap().calls, 1);
    assert!(report.method("cheaperWithdraw").is_none());
}

#[test]
fn test_report_render_lists_methods() {
    let mut report = GasReport::new();
    report.record("cheaperWithdraw", 40_000);
    report.record("fund", 90_000);

    let table = report.render();

    assert!(table.starts_with("method"));
    assert!(table.contains("cheaperWithdraw"));
    assert!(table.contains("90000"));
    assert_eq!(table.lines().count(), 3);
}
