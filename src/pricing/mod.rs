//! Pricing
//!
//! The per-line pricing engine and the order-level discount allocation
//! engine. Both are pure functions over line snapshots; the checkout
//! aggregate in [`crate::checkout`] orchestrates them.

use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

use crate::{discounts::DiscountError, money::AmountError};

pub mod allocation;
pub mod line;

/// Errors that can occur while pricing a line.
#[derive(Debug, Error)]
pub enum PricingError {
    /// Wrapped discount calculation error.
    #[error(transparent)]
    Discount(#[from] DiscountError),

    /// Wrapped minor-unit conversion error.
    #[error(transparent)]
    Amount(#[from] AmountError),

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Computed prices for one checkout line.
///
/// All four amounts are quantized and floored at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct LinePrices<'a> {
    /// Unit price ignoring every discount and voucher.
    pub undiscounted_unit: Money<'a, Currency>,

    /// Undiscounted unit price times quantity.
    pub undiscounted_total: Money<'a, Currency>,

    /// Unit price after catalogue promotion and per-unit voucher.
    pub unit_price: Money<'a, Currency>,

    /// Line total after all line-level discounts.
    pub total: Money<'a, Currency>,
}

impl<'a> LinePrices<'a> {
    /// The line's savings against its undiscounted total.
    ///
    /// # Errors
    ///
    /// Returns a [`MoneyError`] if the subtraction fails.
    pub fn savings(&self) -> Result<Money<'a, Currency>, MoneyError> {
        self.undiscounted_total.sub(self.total)
    }
}
