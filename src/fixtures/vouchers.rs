//! Voucher Fixtures

use rusty_money::Money;
use serde::Deserialize;

use crate::{
    discounts::{Voucher, VoucherKind},
    fixtures::{FixtureError, variants},
};

/// Wrapper for a voucher in YAML
#[derive(Debug, Deserialize)]
pub struct VoucherFixtureFile {
    /// The voucher attached to the checkout
    pub voucher: VoucherFixture,
}

/// Voucher fixture from YAML
#[derive(Debug, Deserialize)]
pub struct VoucherFixture {
    /// Voucher name/code
    pub name: String,

    /// Voucher kind
    pub kind: VoucherKindFixture,

    /// Value shape ("15%" or "7.00 USD")
    pub reduction: String,

    /// Whether the discount applies to a single unit of a single line
    #[serde(default)]
    pub apply_once_per_order: bool,

    /// Optional minimum-spend threshold (e.g., "20.00 USD")
    #[serde(default)]
    pub min_spend: Option<String>,
}

/// Voucher kind in YAML
#[derive(Debug, Copy, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoucherKindFixture {
    /// Discounts the whole order
    EntireOrder,

    /// Discounts the delivery price only
    Shipping,

    /// Discounts specific lines per unit
    SpecificProduct,
}

impl From<VoucherKindFixture> for VoucherKind {
    fn from(kind: VoucherKindFixture) -> Self {
        match kind {
            VoucherKindFixture::EntireOrder => VoucherKind::EntireOrder,
            VoucherKindFixture::Shipping => VoucherKind::Shipping,
            VoucherKindFixture::SpecificProduct => VoucherKind::SpecificProduct,
        }
    }
}

impl VoucherFixture {
    /// Convert to a [`Voucher`].
    ///
    /// # Errors
    ///
    /// Returns an error if the reduction or minimum-spend string cannot be
    /// parsed.
    pub fn try_into_voucher(self) -> Result<Voucher<'static>, FixtureError> {
        let reduction = variants::parse_reduction(&self.reduction)?;

        let mut voucher = Voucher::new(self.name, self.kind.into(), reduction);

        if self.apply_once_per_order {
            voucher = voucher.with_apply_once_per_order();
        }

        if let Some(min_spend) = &self.min_spend {
            let (minor, currency) = variants::parse_price(min_spend)?;

            voucher = voucher.with_min_spend(Money::from_minor(minor, currency));
        }

        Ok(voucher)
    }
}
