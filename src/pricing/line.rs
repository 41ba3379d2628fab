//! Line pricing
//!
//! Computes a single line's unit and total prices, before and after
//! discounts. The catalogue promotion is applied first and produces the base
//! the per-unit voucher reduces; order-level proration (see
//! [`crate::pricing::allocation`]) operates on the totals produced here.

use rusty_money::{Money, iso::Currency};

use crate::{
    discounts::{Voucher, apply_reduction, reduction_amount},
    lines::CheckoutLine,
    money::{AmountError, unit_times_quantity},
    pricing::{LinePrices, PricingError},
};

/// Price a line, baking in its catalogue promotion and per-unit voucher.
///
/// # Errors
///
/// Returns a [`PricingError`] if a reduction cannot be calculated or the
/// total multiplication overflows.
pub fn price_line<'a>(line: &CheckoutLine<'a>) -> Result<LinePrices<'a>, PricingError> {
    priced(line, discounted_unit(line, true)?, None)
}

/// Price a line with only its catalogue promotion.
///
/// Used while an apply-once-per-order voucher owns the line's per-unit
/// reduction, and to establish the discountable base for order-level
/// proration.
///
/// # Errors
///
/// Returns a [`PricingError`] if a reduction cannot be calculated or the
/// total multiplication overflows.
pub fn price_line_excluding_voucher<'a>(
    line: &CheckoutLine<'a>,
) -> Result<LinePrices<'a>, PricingError> {
    priced(line, discounted_unit(line, false)?, None)
}

/// Price a line under an apply-once-per-order voucher.
///
/// The voucher discounts exactly one unit: the reduction amount is computed
/// once against the unit price and subtracted from a single unit's worth,
/// with the remaining `quantity - 1` units charged at the full unit price.
///
/// # Errors
///
/// Returns a [`PricingError`] if a reduction cannot be calculated or the
/// total arithmetic overflows.
pub fn price_line_apply_once<'a>(
    line: &CheckoutLine<'a>,
    voucher: &Voucher<'a>,
) -> Result<LinePrices<'a>, PricingError> {
    priced(line, discounted_unit(line, false)?, Some(voucher))
}

/// The unit price after the line's own reductions, floored at zero.
fn discounted_unit<'a>(
    line: &CheckoutLine<'a>,
    include_voucher: bool,
) -> Result<Money<'a, Currency>, PricingError> {
    let mut unit = *line.base_unit_price();

    if let Some(promotion) = line.promotion_reduction() {
        unit = apply_reduction(&unit, promotion)?;
    }

    if include_voucher && let Some(voucher) = line.voucher_reduction() {
        unit = apply_reduction(&unit, voucher)?;
    }

    Ok(unit)
}

/// Assemble the four line prices from a discounted unit price.
fn priced<'a>(
    line: &CheckoutLine<'a>,
    unit: Money<'a, Currency>,
    apply_once: Option<&Voucher<'a>>,
) -> Result<LinePrices<'a>, PricingError> {
    let undiscounted_unit = *line.base_unit_price();
    let undiscounted_total = unit_times_quantity(&undiscounted_unit, line.quantity())?;

    let total = match apply_once {
        Some(voucher) => {
            let off = reduction_amount(&unit, voucher.reduction())?;
            let discounted_unit_minor = 0.max(
                unit.to_minor_units()
                    .checked_sub(off)
                    .ok_or(AmountError::Unrepresentable)?,
            );
            let full_price_units = unit_times_quantity(&unit, line.quantity().saturating_sub(1))?;

            Money::from_minor(
                full_price_units
                    .to_minor_units()
                    .checked_add(discounted_unit_minor)
                    .ok_or(AmountError::Unrepresentable)?,
                unit.currency(),
            )
        }
        None => unit_times_quantity(&unit, line.quantity())?,
    };

    Ok(LinePrices {
        undiscounted_unit,
        undiscounted_total,
        unit_price: unit,
        total,
    })
}
