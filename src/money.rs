//! Money primitives
//!
//! Quantization and minor-unit arithmetic shared by the pricing engine.
//! All amounts surfaced by the crate are quantized to the currency's
//! minor-unit exponent using round-half-up semantics, and quantization
//! happens wherever a price is produced, not only at the final step.

use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::ToPrimitive,
};
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

/// Errors specific to amount conversion and minor-unit arithmetic.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    /// The amount overflowed or cannot be represented in minor units.
    #[error("amount is not representable in minor units")]
    Unrepresentable,
}

/// Round a decimal amount of major units to the currency's minor-unit
/// precision, using round-half-up (`MidpointAwayFromZero`) semantics.
///
/// Quantization is idempotent: re-quantizing an already quantized amount
/// yields the same value.
///
/// # Errors
///
/// Returns [`AmountError::Unrepresentable`] if the scaled amount overflows
/// or cannot be converted to minor units.
pub fn quantize(
    amount: Decimal,
    currency: &'static Currency,
) -> Result<Money<'static, Currency>, AmountError> {
    let minor = amount
        .checked_mul(minor_scale(currency)?)
        .ok_or(AmountError::Unrepresentable)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(AmountError::Unrepresentable)?;

    Ok(Money::from_minor(minor, currency))
}

/// The additive identity for a currency.
pub fn zero(currency: &'static Currency) -> Money<'static, Currency> {
    Money::from_minor(0, currency)
}

/// Multiply a quantized unit price by a quantity.
///
/// Line totals are always a quantized unit price times a quantity, never a
/// divided-down total, so rounding error cannot accumulate across
/// large-quantity lines.
///
/// # Errors
///
/// Returns [`AmountError::Unrepresentable`] if the multiplication overflows.
pub fn unit_times_quantity<'a>(
    unit: &Money<'a, Currency>,
    quantity: u32,
) -> Result<Money<'a, Currency>, AmountError> {
    let total = unit
        .to_minor_units()
        .checked_mul(i64::from(quantity))
        .ok_or(AmountError::Unrepresentable)?;

    Ok(Money::from_minor(total, unit.currency()))
}

/// The major-unit decimal value of a money amount.
pub fn major_units(money: &Money<'_, Currency>) -> Decimal {
    Decimal::new(money.to_minor_units(), money.currency().exponent)
}

/// Scale factor between a currency's major and minor units.
fn minor_scale(currency: &'static Currency) -> Result<Decimal, AmountError> {
    10_i64
        .checked_pow(currency.exponent)
        .map(Decimal::from)
        .ok_or(AmountError::Unrepresentable)
}
