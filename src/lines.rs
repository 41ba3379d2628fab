//! Checkout lines
//!
//! Immutable per-line snapshots consumed by a pricing pass. A snapshot is
//! constructed fresh for each pass; the pass never mutates it.

use rusty_money::{Money, iso::Currency};
use slotmap::new_key_type;

use crate::{catalog::VariantKey, discounts::Reduction};

new_key_type! {
    /// Checkout Line Key
    pub struct LineKey;
}

/// A single cart line at the moment of a pricing pass.
///
/// The channel-listed unit price, any manual override, and the discounts
/// already resolved to this line (a per-unit voucher and at most one
/// catalogue promotion) are captured on the snapshot, so the pricing engine
/// needs no further lookups.
#[derive(Debug, Clone)]
pub struct CheckoutLine<'a> {
    key: LineKey,
    variant: VariantKey,
    quantity: u32,
    unit_price: Money<'a, Currency>,
    price_override: Option<Money<'a, Currency>>,
    voucher_reduction: Option<Reduction<'a>>,
    promotion_reduction: Option<Reduction<'a>>,
    requires_shipping: bool,
}

impl<'a> CheckoutLine<'a> {
    /// Create a line snapshot with the channel-listed unit price.
    ///
    /// Quantity must be at least 1; [`crate::checkout::Checkout::with_lines`]
    /// rejects zero-quantity lines at construction.
    pub fn new(
        key: LineKey,
        variant: VariantKey,
        quantity: u32,
        unit_price: Money<'a, Currency>,
    ) -> Self {
        Self {
            key,
            variant,
            quantity,
            unit_price,
            price_override: None,
            voucher_reduction: None,
            promotion_reduction: None,
            requires_shipping: true,
        }
    }

    /// Replace the channel-listed price with a manual override.
    ///
    /// The override becomes the undiscounted base; discounts still apply on
    /// top of it.
    #[must_use]
    pub fn with_price_override(mut self, price: Money<'a, Currency>) -> Self {
        self.price_override = Some(price);
        self
    }

    /// Attach the per-unit voucher reduction resolved to this line.
    #[must_use]
    pub fn with_voucher_reduction(mut self, reduction: Reduction<'a>) -> Self {
        self.voucher_reduction = Some(reduction);
        self
    }

    /// Attach the catalogue promotion reduction resolved to this line.
    ///
    /// At most one catalogue promotion is ever active per line.
    #[must_use]
    pub fn with_promotion_reduction(mut self, reduction: Reduction<'a>) -> Self {
        self.promotion_reduction = Some(reduction);
        self
    }

    /// Mark whether the line's product needs physical delivery.
    #[must_use]
    pub fn with_requires_shipping(mut self, requires_shipping: bool) -> Self {
        self.requires_shipping = requires_shipping;
        self
    }

    /// Return the line key.
    pub fn key(&self) -> LineKey {
        self.key
    }

    /// Return the variant this line references.
    pub fn variant(&self) -> VariantKey {
        self.variant
    }

    /// Return the ordered quantity.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Return the channel-listed unit price.
    pub fn unit_price(&self) -> &Money<'a, Currency> {
        &self.unit_price
    }

    /// Return the manual price override, if any.
    pub fn price_override(&self) -> Option<&Money<'a, Currency>> {
        self.price_override.as_ref()
    }

    /// Return the per-unit voucher reduction, if any.
    pub fn voucher_reduction(&self) -> Option<&Reduction<'a>> {
        self.voucher_reduction.as_ref()
    }

    /// Return the catalogue promotion reduction, if any.
    pub fn promotion_reduction(&self) -> Option<&Reduction<'a>> {
        self.promotion_reduction.as_ref()
    }

    /// Whether the line's product needs physical delivery.
    pub fn requires_shipping(&self) -> bool {
        self.requires_shipping
    }

    /// The undiscounted base price: the override when present, else the
    /// channel-listed price.
    pub fn base_unit_price(&self) -> &Money<'a, Currency> {
        self.price_override.as_ref().unwrap_or(&self.unit_price)
    }
}

/// Whether any line in the set needs physical delivery.
///
/// Callers that have already excluded unavailable lines pass the filtered
/// set; the answer always reflects exactly the lines supplied.
pub fn requires_shipping<'a>(lines: impl IntoIterator<Item = &'a CheckoutLine<'a>>) -> bool {
    lines.into_iter().any(CheckoutLine::requires_shipping)
}
