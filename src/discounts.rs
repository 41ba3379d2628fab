//! Discounts
//!
//! Value shapes shared by vouchers and catalogue promotions, plus the
//! minor-unit percentage helper used throughout the pricing engine.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

/// Errors specific to discount calculations.
#[derive(Debug, Error)]
pub enum DiscountError {
    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// The value shape of a voucher or catalogue promotion.
#[derive(Debug, Copy, Clone)]
pub enum Reduction<'a> {
    /// Take a percentage off the base price (e.g., "15% off")
    PercentageOff(Percentage),

    /// Subtract a fixed amount from the base price (e.g., "$2 off")
    AmountOff(Money<'a, Currency>),
}

/// Classification of an order-level voucher.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VoucherKind {
    /// Discounts the whole order, prorated across lines.
    EntireOrder,

    /// Discounts the delivery price only; the subtotal is untouched.
    Shipping,

    /// Discounts each unit of the specific lines it was resolved to.
    SpecificProduct,
}

/// An order-level voucher attached to a checkout.
///
/// A voucher is attached when a valid code is redeemed; detaching it when a
/// mutation invalidates eligibility is the mutation layer's job. The pricing
/// pass only consults [`Voucher::eligible_for`].
#[derive(Debug, Clone)]
pub struct Voucher<'a> {
    name: String,
    kind: VoucherKind,
    reduction: Reduction<'a>,
    apply_once_per_order: bool,
    min_spend: Option<Money<'a, Currency>>,
}

impl<'a> Voucher<'a> {
    /// Create a new voucher.
    pub fn new(name: impl Into<String>, kind: VoucherKind, reduction: Reduction<'a>) -> Self {
        Self {
            name: name.into(),
            kind,
            reduction,
            apply_once_per_order: false,
            min_spend: None,
        }
    }

    /// Restrict the voucher to a single unit of a single line item.
    #[must_use]
    pub fn with_apply_once_per_order(mut self) -> Self {
        self.apply_once_per_order = true;
        self
    }

    /// Require a minimum subtotal before the voucher contributes anything.
    #[must_use]
    pub fn with_min_spend(mut self, min_spend: Money<'a, Currency>) -> Self {
        self.min_spend = Some(min_spend);
        self
    }

    /// Return the voucher name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the voucher kind.
    pub fn kind(&self) -> VoucherKind {
        self.kind
    }

    /// Return the voucher's value shape.
    pub fn reduction(&self) -> &Reduction<'a> {
        &self.reduction
    }

    /// Whether the discount applies to one unit of one line only.
    pub fn apply_once_per_order(&self) -> bool {
        self.apply_once_per_order
    }

    /// Return the minimum-spend threshold, if any.
    pub fn min_spend(&self) -> Option<&Money<'a, Currency>> {
        self.min_spend.as_ref()
    }

    /// Check the minimum-spend threshold against a subtotal.
    ///
    /// # Errors
    ///
    /// Returns a [`DiscountError`] if the threshold and subtotal currencies
    /// differ.
    pub fn eligible_for(&self, subtotal: &Money<'a, Currency>) -> Result<bool, DiscountError> {
        let Some(min_spend) = &self.min_spend else {
            return Ok(true);
        };

        ensure_same_currency(subtotal, min_spend)?;

        Ok(subtotal.to_minor_units() >= min_spend.to_minor_units())
    }
}

/// Calculate the reduction amount in minor units against a base price.
///
/// The amount is not clamped to the base; flooring at zero happens where the
/// reduction is subtracted.
///
/// # Errors
///
/// Returns a [`DiscountError`] if the percentage calculation cannot be safely
/// represented, or if a fixed amount's currency differs from the base.
pub fn reduction_amount<'a>(
    base: &Money<'a, Currency>,
    reduction: &Reduction<'a>,
) -> Result<i64, DiscountError> {
    match reduction {
        Reduction::PercentageOff(percent) => percent_of_minor(percent, base.to_minor_units()),
        Reduction::AmountOff(amount) => {
            ensure_same_currency(base, amount)?;

            Ok(amount.to_minor_units())
        }
    }
}

/// Apply a reduction to a base price, flooring the result at zero.
///
/// # Errors
///
/// Returns a [`DiscountError`] if the reduction amount cannot be calculated.
pub fn apply_reduction<'a>(
    base: &Money<'a, Currency>,
    reduction: &Reduction<'a>,
) -> Result<Money<'a, Currency>, DiscountError> {
    let off = reduction_amount(base, reduction)?;
    let reduced = base
        .to_minor_units()
        .checked_sub(off)
        .ok_or(DiscountError::PercentConversion)?;

    Ok(Money::from_minor(0.max(reduced), base.currency()))
}

/// Calculate the discount amount in minor units based on a percentage and a
/// minor unit amount, rounding half up.
///
/// # Errors
///
/// Returns an error if:
/// - The percentage calculation overflows or cannot be safely represented
///   (`DiscountError::PercentConversion`).
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, DiscountError> {
    let minor = Decimal::from_i64(minor).ok_or(DiscountError::PercentConversion)?;

    ((*percent) * Decimal::ONE) // decimal_percentage crate doesn't actually expose the underlying Decimal
        .checked_mul(minor)
        .ok_or(DiscountError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(DiscountError::PercentConversion)
}

/// Surface a `CurrencyMismatch` instead of silently coercing.
fn ensure_same_currency<'a>(
    expected: &Money<'a, Currency>,
    actual: &Money<'a, Currency>,
) -> Result<(), DiscountError> {
    if expected.currency() == actual.currency() {
        Ok(())
    } else {
        Err(DiscountError::Money(MoneyError::CurrencyMismatch {
            expected: expected.currency().iso_alpha_code,
            actual: actual.currency().iso_alpha_code,
        }))
    }
}
