//! Checkout
//!
//! The cart aggregate and the whole-cart pricing pass. The aggregate owns an
//! ordered line collection (the order is the persisted line sequence and the
//! proration tie-break), an optional voucher, and a delivery choice; a
//! pricing pass is a pure function from that snapshot to a
//! [`PricedCheckout`], whose cached copy on the aggregate is only ever
//! replaced wholesale.

use rustc_hash::FxHashMap;
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;
use tracing::debug;

use crate::{
    discounts::{DiscountError, Voucher, VoucherKind, reduction_amount},
    lines::{CheckoutLine, LineKey, requires_shipping},
    money,
    pricing::{
        LinePrices, PricingError,
        allocation::{self, AllocationError, AllocationLine},
        line::{price_line, price_line_apply_once, price_line_excluding_voucher},
    },
    tax::{TaxData, TaxError, TaxedMoney},
};

pub mod delivery;

use delivery::{DeliveryMethod, ShippingMethodKey};

/// Errors related to checkout construction or pricing.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A line's currency differs from the checkout currency
    /// (index, line currency, checkout currency).
    #[error("Line {0} has currency {1}, but checkout has currency {2}")]
    CurrencyMismatch(usize, &'static str, &'static str),

    /// A line was constructed with a zero quantity.
    #[error("Line {0} has zero quantity")]
    ZeroQuantity(usize),

    /// A line was not found in the checkout.
    #[error("Line {0:?} not found")]
    LineNotFound(LineKey),

    /// The chosen delivery method is not in the currently valid list.
    #[error("Delivery method {0:?} is not currently valid")]
    InvalidDeliveryMethod(String),

    /// A shipping method's price is in a foreign currency
    /// (method currency, checkout currency).
    #[error("Delivery price has currency {0}, but checkout has currency {1}")]
    DeliveryCurrencyMismatch(&'static str, &'static str),

    /// Wrapped discount calculation error.
    #[error(transparent)]
    Discount(#[from] DiscountError),

    /// Wrapped line pricing error.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Wrapped discount allocation error.
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// The order-level discount recorded against a pricing pass.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedDiscount<'a> {
    /// The voucher name the discount came from.
    pub name: String,

    /// The discount amount actually applied.
    pub amount: Money<'a, Currency>,
}

/// Computed prices for one line within a [`PricedCheckout`].
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine<'a> {
    /// Unit price ignoring every discount and voucher.
    pub undiscounted_unit: Money<'a, Currency>,

    /// Undiscounted unit price times quantity.
    pub undiscounted_total: Money<'a, Currency>,

    /// Unit price after all discounts.
    pub unit_price: Money<'a, Currency>,

    /// Line total after all discounts, with tax when supplied.
    pub total: TaxedMoney<'a>,
}

impl<'a> PricedLine<'a> {
    /// The line's savings against its undiscounted total.
    ///
    /// # Errors
    ///
    /// Returns a [`MoneyError`] if the subtraction fails.
    pub fn savings(&self) -> Result<Money<'a, Currency>, MoneyError> {
        self.undiscounted_total.sub(*self.total.net())
    }
}

/// The output of one pricing pass.
///
/// Line prices, subtotal, delivery price, and total are all recomputed from
/// the snapshot every pass; a cached instance is replaced as a whole, never
/// field by field.
#[derive(Debug, Clone)]
pub struct PricedCheckout<'a> {
    lines: FxHashMap<LineKey, PricedLine<'a>>,
    subtotal: TaxedMoney<'a>,
    delivery: TaxedMoney<'a>,
    total: TaxedMoney<'a>,
    discount: Option<AppliedDiscount<'a>>,
    currency: &'static Currency,
}

impl<'a> PricedCheckout<'a> {
    /// Computed prices keyed by line.
    pub fn lines(&self) -> &FxHashMap<LineKey, PricedLine<'a>> {
        &self.lines
    }

    /// Look up one line's computed prices.
    pub fn line(&self, key: LineKey) -> Option<&PricedLine<'a>> {
        self.lines.get(&key)
    }

    /// Sum of all line totals after discounts.
    pub fn subtotal(&self) -> &TaxedMoney<'a> {
        &self.subtotal
    }

    /// The delivery price contribution.
    pub fn delivery(&self) -> &TaxedMoney<'a> {
        &self.delivery
    }

    /// Subtotal plus delivery.
    pub fn total(&self) -> &TaxedMoney<'a> {
        &self.total
    }

    /// The order-level discount applied in this pass, if any.
    pub fn discount(&self) -> Option<&AppliedDiscount<'a>> {
        self.discount.as_ref()
    }

    /// The checkout currency.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Overlay externally computed taxed prices onto this pass.
    ///
    /// Entries present in the tax data supersede the net-only baseline;
    /// absent entries are left untouched.
    ///
    /// # Errors
    ///
    /// Returns a [`TaxError`] if an entry references an unknown line or
    /// carries a foreign currency.
    pub fn apply_tax_data(&mut self, data: TaxData<'a>) -> Result<(), TaxError> {
        for (key, taxed) in data.line_totals {
            self.ensure_currency(&taxed)?;

            self.lines
                .get_mut(&key)
                .ok_or(TaxError::UnknownLine(key))?
                .total = taxed;
        }

        for (slot, taxed) in [
            (&mut self.delivery, data.delivery),
            (&mut self.subtotal, data.subtotal),
            (&mut self.total, data.total),
        ] {
            if let Some(taxed) = taxed {
                if taxed.net().currency() != self.currency {
                    return Err(TaxError::Money(MoneyError::CurrencyMismatch {
                        expected: self.currency.iso_alpha_code,
                        actual: taxed.net().currency().iso_alpha_code,
                    }));
                }

                *slot = taxed;
            }
        }

        Ok(())
    }

    fn ensure_currency(&self, taxed: &TaxedMoney<'a>) -> Result<(), TaxError> {
        if taxed.net().currency() == self.currency {
            Ok(())
        } else {
            Err(TaxError::Money(MoneyError::CurrencyMismatch {
                expected: self.currency.iso_alpha_code,
                actual: taxed.net().currency().iso_alpha_code,
            }))
        }
    }
}

/// An in-progress cart prior to order placement.
#[derive(Debug)]
pub struct Checkout<'a> {
    lines: Vec<CheckoutLine<'a>>,
    currency: &'static Currency,
    voucher: Option<Voucher<'a>>,
    delivery: DeliveryMethod<'a>,
    pricing: Option<PricedCheckout<'a>>,
}

impl<'a> Checkout<'a> {
    /// Create a checkout from its line snapshots.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] if a line's currency differs from the
    /// checkout currency or a line has zero quantity.
    pub fn with_lines(
        lines: impl Into<Vec<CheckoutLine<'a>>>,
        currency: &'static Currency,
    ) -> Result<Self, CheckoutError> {
        let lines = lines.into();

        lines.iter().enumerate().try_for_each(|(i, line)| {
            if line.quantity() == 0 {
                return Err(CheckoutError::ZeroQuantity(i));
            }

            for price in [Some(line.unit_price()), line.price_override()].into_iter().flatten() {
                if price.currency() != currency {
                    return Err(CheckoutError::CurrencyMismatch(
                        i,
                        price.currency().iso_alpha_code,
                        currency.iso_alpha_code,
                    ));
                }
            }

            Ok(())
        })?;

        Ok(Checkout {
            lines,
            currency,
            voucher: None,
            delivery: DeliveryMethod::None,
            pricing: None,
        })
    }

    /// The ordered line snapshots. The order is load-bearing: it is the
    /// persisted line sequence and the proration tie-break.
    pub fn lines(&self) -> &[CheckoutLine<'a>] {
        &self.lines
    }

    /// Look up a line by key.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::LineNotFound`] if no line has the key.
    pub fn line(&self, key: LineKey) -> Result<&CheckoutLine<'a>, CheckoutError> {
        self.lines
            .iter()
            .find(|line| line.key() == key)
            .ok_or(CheckoutError::LineNotFound(key))
    }

    /// The checkout currency.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// The attached voucher, if any.
    pub fn voucher(&self) -> Option<&Voucher<'a>> {
        self.voucher.as_ref()
    }

    /// Attach or clear the order-level voucher.
    pub fn set_voucher(&mut self, voucher: Option<Voucher<'a>>) {
        self.voucher = voucher;
    }

    /// The chosen delivery method.
    pub fn delivery(&self) -> &DeliveryMethod<'a> {
        &self.delivery
    }

    /// Choose a delivery method, validating it against the currently valid
    /// shipping methods.
    ///
    /// An invalid choice is rejected rather than silently cleared.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidDeliveryMethod`] if a shipping method
    /// is not in the valid list, or a currency mismatch error if its price is
    /// in a foreign currency.
    pub fn select_delivery(
        &mut self,
        method: DeliveryMethod<'a>,
        valid_shipping: &[ShippingMethodKey],
    ) -> Result<(), CheckoutError> {
        if !method.is_valid_choice(valid_shipping) {
            return Err(CheckoutError::InvalidDeliveryMethod(method.name().to_string()));
        }

        if let DeliveryMethod::Shipping(shipping) = &method
            && shipping.price().currency() != self.currency()
        {
            return Err(CheckoutError::DeliveryCurrencyMismatch(
                shipping.price().currency().iso_alpha_code,
                self.currency().iso_alpha_code,
            ));
        }

        self.delivery = method;

        Ok(())
    }

    /// Whether any line needs physical delivery.
    pub fn requires_shipping(&self) -> bool {
        requires_shipping(self.lines.iter())
    }

    /// The cached result of the last pricing pass, if any.
    pub fn pricing(&self) -> Option<&PricedCheckout<'a>> {
        self.pricing.as_ref()
    }

    /// Replace the cached pricing wholesale.
    ///
    /// Cached totals are never patched field by field; a fresh pass replaces
    /// the previous one entirely, so they cannot drift from recomputation.
    pub fn set_pricing(&mut self, pricing: PricedCheckout<'a>) {
        self.pricing = Some(pricing);
    }

    /// Run a pricing pass over the current snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] if discount or money arithmetic fails;
    /// negative-price conditions are recovered locally by flooring at zero
    /// and never surface as errors.
    pub fn price(&self) -> Result<PricedCheckout<'a>, CheckoutError> {
        let currency = self.currency();

        debug!(lines = self.lines.len(), "pricing checkout");

        // Base pass: catalogue promotions only. The voucher's effect is
        // decided against this subtotal.
        let mut priced: Vec<LinePrices<'a>> = self
            .lines
            .iter()
            .map(price_line_excluding_voucher)
            .collect::<Result<_, _>>()?;

        let base_subtotal = sum_totals(currency, &priced)?;

        let mut voucher = None;

        if let Some(candidate) = &self.voucher
            && candidate.eligible_for(&base_subtotal)?
        {
            voucher = Some(candidate);
        }

        let mut discount = self.apply_voucher_to_lines(voucher, &mut priced, &base_subtotal)?;

        let subtotal = sum_totals(currency, &priced)?;
        let shipping_required = self.requires_shipping();
        let delivery_base = self.delivery.delivery_price(currency, shipping_required);

        let mut delivery = delivery_base;

        if let Some(voucher) = voucher
            && voucher.kind() == VoucherKind::Shipping
            && delivery_base.to_minor_units() > 0
        {
            let off = reduction_amount(&delivery_base, voucher.reduction())?;
            let net = 0.max(delivery_base.to_minor_units().saturating_sub(off));
            let amount = delivery_base.to_minor_units() - net;

            if amount > 0 {
                discount = Some(AppliedDiscount {
                    name: voucher.name().to_string(),
                    amount: Money::from_minor(amount, currency),
                });
            }

            delivery = Money::from_minor(net, currency);
        }

        let total = subtotal.add(delivery)?;

        debug!(
            subtotal = subtotal.to_minor_units(),
            delivery = delivery.to_minor_units(),
            total = total.to_minor_units(),
            "priced checkout"
        );

        let lines = self
            .lines
            .iter()
            .zip(priced)
            .map(|(line, prices)| {
                (
                    line.key(),
                    PricedLine {
                        undiscounted_unit: prices.undiscounted_unit,
                        undiscounted_total: prices.undiscounted_total,
                        unit_price: prices.unit_price,
                        total: TaxedMoney::from_net(prices.total),
                    },
                )
            })
            .collect();

        Ok(PricedCheckout {
            lines,
            subtotal: TaxedMoney::from_net(subtotal),
            delivery: TaxedMoney::from_net(delivery),
            total: TaxedMoney::from_net(total),
            discount,
            currency,
        })
    }

    /// Apply the voucher's line-level effect, returning the recorded
    /// discount.
    fn apply_voucher_to_lines(
        &self,
        voucher: Option<&Voucher<'a>>,
        priced: &mut [LinePrices<'a>],
        base_subtotal: &Money<'a, Currency>,
    ) -> Result<Option<AppliedDiscount<'a>>, CheckoutError> {
        let currency = self.currency();

        let Some(voucher) = voucher else {
            return Ok(None);
        };

        match (voucher.kind(), voucher.apply_once_per_order()) {
            // The shipping voucher only touches the delivery price.
            (VoucherKind::Shipping, _) => Ok(None),

            (VoucherKind::SpecificProduct, false) => {
                for (line, prices) in self.lines.iter().zip(priced.iter_mut()) {
                    if line.voucher_reduction().is_some() {
                        *prices = price_line(line)?;
                    }
                }

                let new_subtotal = sum_totals(currency, priced)?;
                let amount = base_subtotal.sub(new_subtotal)?;

                Ok((amount.to_minor_units() > 0).then(|| AppliedDiscount {
                    name: voucher.name().to_string(),
                    amount,
                }))
            }

            (_, true) => {
                let Some(target) = self.apply_once_target(voucher, priced) else {
                    return Ok(None);
                };

                let (Some(line), Some(slot)) = (self.lines.get(target), priced.get_mut(target))
                else {
                    return Ok(None);
                };

                let before = slot.total;
                *slot = price_line_apply_once(line, voucher)?;
                let amount = before.sub(slot.total)?;

                Ok((amount.to_minor_units() > 0).then(|| AppliedDiscount {
                    name: voucher.name().to_string(),
                    amount,
                }))
            }

            (VoucherKind::EntireOrder, false) => {
                let raw = reduction_amount(base_subtotal, voucher.reduction())?;
                let clamped = 0.max(raw.min(base_subtotal.to_minor_units()));

                if clamped == 0 {
                    return Ok(None);
                }

                let amount = Money::from_minor(clamped, currency);
                let alloc_lines: Vec<AllocationLine<'a>> = self
                    .lines
                    .iter()
                    .zip(priced.iter())
                    .map(|(line, prices)| AllocationLine {
                        key: line.key(),
                        total: prices.total,
                        quantity: line.quantity(),
                    })
                    .collect();

                let allocated = allocation::allocate(&alloc_lines, voucher, amount)?;

                for (prices, share) in priced.iter_mut().zip(&allocated) {
                    prices.unit_price = share.unit_price;
                    prices.total = share.total;
                }

                Ok(Some(AppliedDiscount {
                    name: voucher.name().to_string(),
                    amount,
                }))
            }
        }
    }

    /// The line an apply-once voucher discounts: the cheapest applicable one.
    fn apply_once_target(
        &self,
        voucher: &Voucher<'a>,
        priced: &[LinePrices<'a>],
    ) -> Option<usize> {
        self.lines
            .iter()
            .enumerate()
            .filter(|(_, line)| {
                voucher.kind() != VoucherKind::SpecificProduct
                    || line.voucher_reduction().is_some()
            })
            .min_by_key(|(idx, _)| {
                priced
                    .get(*idx)
                    .map_or(i64::MAX, |prices| prices.unit_price.to_minor_units())
            })
            .map(|(idx, _)| idx)
    }
}

/// Sum line totals, starting from the currency's zero.
fn sum_totals<'a>(
    currency: &'static Currency,
    priced: &[LinePrices<'a>],
) -> Result<Money<'a, Currency>, CheckoutError> {
    let zero: Money<'a, Currency> = money::zero(currency);

    priced
        .iter()
        .try_fold(zero, |acc, prices| acc.add(prices.total))
        .map_err(CheckoutError::from)
}
