//! Discount allocation
//!
//! Spreads one order-level discount across checkout lines in proportion to
//! each line's share of the discountable total. The last line in the
//! checkout's stored order absorbs the rounding remainder, so the allocated
//! per-line discounts always sum to the order discount exactly.

use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;
use tracing::trace;

use crate::{
    discounts::{DiscountError, Voucher, VoucherKind},
    lines::LineKey,
};

/// Errors that can occur while allocating an order-level discount.
#[derive(Debug, Error)]
pub enum AllocationError {
    /// The voucher shape is per-line-exclusive and must not be prorated.
    #[error("voucher shape is not eligible for order-level proration")]
    InvalidVoucherShape,

    /// Proportional share arithmetic overflowed or was not representable.
    #[error("discount share is not representable in minor units")]
    ShareConversion,

    /// Wrapped discount calculation error.
    #[error(transparent)]
    Discount(#[from] DiscountError),

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// A line's discountable total entering proration.
///
/// The total is the line's catalogue-discounted price; catalogue promotions
/// are baked in before order-level allocation.
#[derive(Debug, Clone)]
pub struct AllocationLine<'a> {
    /// Line identity.
    pub key: LineKey,

    /// Catalogue-discounted line total.
    pub total: Money<'a, Currency>,

    /// Ordered quantity, used to derive the discounted unit price.
    pub quantity: u32,
}

/// One line's share of an allocated order discount.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocatedLine<'a> {
    /// Line identity.
    pub key: LineKey,

    /// This line's share of the order discount.
    pub discount: Money<'a, Currency>,

    /// Discounted unit price, floored at zero and quantized.
    pub unit_price: Money<'a, Currency>,

    /// Discounted line total, floored at zero.
    pub total: Money<'a, Currency>,
}

/// Check that a voucher may enter the order-level proration path.
///
/// Shipping and specific-product vouchers discount their own targets, and
/// apply-once vouchers hit a single unit; none of them may be prorated.
///
/// # Errors
///
/// Returns [`AllocationError::InvalidVoucherShape`] for any such voucher;
/// the caller passes line prices through unchanged.
pub fn ensure_prorating_shape(voucher: &Voucher<'_>) -> Result<(), AllocationError> {
    if voucher.kind() == VoucherKind::EntireOrder && !voucher.apply_once_per_order() {
        Ok(())
    } else {
        Err(AllocationError::InvalidVoucherShape)
    }
}

/// Allocate an entire-order voucher's discount across lines.
///
/// # Errors
///
/// Returns an [`AllocationError`] if the voucher shape is per-line-exclusive
/// or the proration arithmetic fails.
pub fn allocate<'a>(
    lines: &[AllocationLine<'a>],
    voucher: &Voucher<'a>,
    discount: Money<'a, Currency>,
) -> Result<Vec<AllocatedLine<'a>>, AllocationError> {
    ensure_prorating_shape(voucher)?;

    prorate(lines, discount)
}

/// Spread a discount amount across lines, last line taking the remainder.
///
/// With a single line the entire discount is applied directly, skipping the
/// proportional-division path entirely. With several lines, each line except
/// the last receives `round_half_up(line_total / total * discount)`; the last
/// line in stored order receives whatever is left, absorbing all residual
/// rounding error so that the shares reconcile exactly.
///
/// # Errors
///
/// Returns an [`AllocationError`] on currency mismatch or arithmetic
/// overflow.
pub fn prorate<'a>(
    lines: &[AllocationLine<'a>],
    discount: Money<'a, Currency>,
) -> Result<Vec<AllocatedLine<'a>>, AllocationError> {
    for line in lines {
        if line.total.currency() != discount.currency() {
            return Err(AllocationError::Money(MoneyError::CurrencyMismatch {
                expected: discount.currency().iso_alpha_code,
                actual: line.total.currency().iso_alpha_code,
            }));
        }
    }

    if let [only] = lines {
        return Ok(vec![allocated(only, discount.to_minor_units())?]);
    }

    let total_minor: i64 = lines
        .iter()
        .try_fold(0_i64, |acc, line| {
            acc.checked_add(line.total.to_minor_units())
        })
        .ok_or(AllocationError::ShareConversion)?;

    let discount_minor = discount.to_minor_units();
    let mut remaining = discount_minor;
    let mut result = Vec::with_capacity(lines.len());

    for (idx, line) in lines.iter().enumerate() {
        let share = if idx + 1 == lines.len() {
            remaining
        } else if total_minor == 0 {
            0
        } else {
            proportional_share(line.total.to_minor_units(), total_minor, discount_minor)?
        };

        remaining = remaining
            .checked_sub(share)
            .ok_or(AllocationError::ShareConversion)?;

        trace!(line = ?line.key, share, remaining, "allocated order discount share");

        result.push(allocated(line, share)?);
    }

    Ok(result)
}

/// `round_half_up(line_total / total * discount)` in minor units.
fn proportional_share(
    line_total: i64,
    total: i64,
    discount: i64,
) -> Result<i64, AllocationError> {
    let line_total = Decimal::from_i64(line_total).ok_or(AllocationError::ShareConversion)?;
    let total = Decimal::from_i64(total).ok_or(AllocationError::ShareConversion)?;
    let discount = Decimal::from_i64(discount).ok_or(AllocationError::ShareConversion)?;

    line_total
        .checked_mul(discount)
        .and_then(|product| product.checked_div(total))
        .ok_or(AllocationError::ShareConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(AllocationError::ShareConversion)
}

/// Build one line's allocation result, flooring prices at zero.
fn allocated<'a>(
    line: &AllocationLine<'a>,
    share: i64,
) -> Result<AllocatedLine<'a>, AllocationError> {
    let currency = line.total.currency();
    let net_total = 0.max(
        line.total
            .to_minor_units()
            .checked_sub(share)
            .ok_or(AllocationError::ShareConversion)?,
    );

    let quantity = Decimal::from(line.quantity.max(1));
    let unit_minor = Decimal::from_i64(net_total)
        .ok_or(AllocationError::ShareConversion)?
        .checked_div(quantity)
        .ok_or(AllocationError::ShareConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(AllocationError::ShareConversion)?;

    Ok(AllocatedLine {
        key: line.key,
        discount: Money::from_minor(share, currency),
        unit_price: Money::from_minor(0.max(unit_minor), currency),
        total: Money::from_minor(net_total, currency),
    })
}
