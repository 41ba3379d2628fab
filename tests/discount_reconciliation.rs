//! Reconciliation properties of order-discount allocation.
//!
//! Whatever the line mix and discount amount, the per-line shares must sum
//! to the order discount exactly; the last line in stored order absorbs any
//! rounding residue.

use rusty_money::{Money, iso::USD};
use slotmap::SlotMap;
use tally::{
    lines::LineKey,
    pricing::allocation::{AllocationError, AllocationLine, prorate},
};
use testresult::TestResult;

fn lines_with_totals(totals: &[i64]) -> Vec<AllocationLine<'static>> {
    let mut keys = SlotMap::<LineKey, ()>::with_key();

    totals
        .iter()
        .map(|&total| AllocationLine {
            key: keys.insert(()),
            total: Money::from_minor(total, USD),
            quantity: 1,
        })
        .collect()
}

fn allocated_sum(lines: &[AllocationLine<'static>], discount: i64) -> Result<i64, AllocationError> {
    let result = prorate(lines, Money::from_minor(discount, USD))?;

    Ok(result.iter().map(|line| line.discount.to_minor_units()).sum())
}

#[test]
fn one_line_reconciles_exactly() -> TestResult {
    let lines = lines_with_totals(&[12_34]);

    assert_eq!(allocated_sum(&lines, 5_67)?, 5_67);

    Ok(())
}

#[test]
fn two_lines_reconcile_exactly() -> TestResult {
    let lines = lines_with_totals(&[20_00, 15_00]);

    assert_eq!(allocated_sum(&lines, 7_00)?, 7_00);

    Ok(())
}

#[test]
fn five_lines_reconcile_exactly() -> TestResult {
    let lines = lines_with_totals(&[9_99, 14_50, 3_33, 27_00, 1_05]);

    for discount in [1, 10, 13_37, 55_87] {
        assert_eq!(allocated_sum(&lines, discount)?, discount);
    }

    Ok(())
}

#[test]
fn non_terminating_shares_still_reconcile() -> TestResult {
    // 10 split three equal ways is 3.33..., which no per-line rounding can
    // represent; the remainder rule keeps the books balanced.
    let lines = lines_with_totals(&[1_00, 1_00, 1_00]);

    let result = prorate(&lines, Money::from_minor(10, USD))?;
    let shares: Vec<i64> = result.iter().map(|line| line.discount.to_minor_units()).collect();

    assert_eq!(shares, vec![3, 3, 4]);

    Ok(())
}

#[test]
fn single_line_skips_proportional_division() -> TestResult {
    // A discount that would round if prorated lands on the only line whole.
    let lines = lines_with_totals(&[3_00]);

    let result = prorate(&lines, Money::from_minor(1_00, USD))?;
    let only = result.first().ok_or("missing allocation")?;

    assert_eq!(only.discount, Money::from_minor(1_00, USD));
    assert_eq!(only.total, Money::from_minor(2_00, USD));

    Ok(())
}

#[test]
fn last_line_in_stored_order_takes_the_remainder() -> TestResult {
    // With unequal totals the earlier lines get their rounded shares; only
    // the final line's share is derived by subtraction.
    let lines = lines_with_totals(&[10_00, 10_00, 1_00]);

    let result = prorate(&lines, Money::from_minor(1_00, USD))?;
    let shares: Vec<i64> = result.iter().map(|line| line.discount.to_minor_units()).collect();

    // 100 * 10/21 = 47.6 -> 48 twice; the last line takes 100 - 96 = 4.
    assert_eq!(shares, vec![48, 48, 4]);
    assert_eq!(shares.iter().sum::<i64>(), 1_00);

    Ok(())
}

#[test]
fn allocated_prices_never_go_negative() -> TestResult {
    // A discount larger than the discountable total: every share floors its
    // line at zero instead of going negative.
    let lines = lines_with_totals(&[1_00, 50]);

    let result = prorate(&lines, Money::from_minor(2_00, USD))?;

    for line in &result {
        assert!(line.total.to_minor_units() >= 0, "line total went negative");
        assert!(
            line.unit_price.to_minor_units() >= 0,
            "unit price went negative"
        );
    }

    Ok(())
}
