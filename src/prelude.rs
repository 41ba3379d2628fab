//! Tally prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    catalog::{Catalog, ChannelListing, Variant, VariantKey},
    checkout::{
        AppliedDiscount, Checkout, CheckoutError, PricedCheckout, PricedLine,
        delivery::{
            CollectionPoint, CollectionPointKey, DeliveryMethod, ShippingMethod,
            ShippingMethodKey,
        },
    },
    discounts::{DiscountError, Reduction, Voucher, VoucherKind},
    fixtures::{Fixture, FixtureError},
    lines::{CheckoutLine, LineKey, requires_shipping},
    money::{AmountError, quantize, zero},
    pricing::{
        LinePrices, PricingError,
        allocation::{AllocatedLine, AllocationError, AllocationLine, allocate, prorate},
        line::{price_line, price_line_apply_once, price_line_excluding_voucher},
    },
    problems::{Problem, ProblemMap, check_problems},
    summary::{SummaryError, write_summary},
    tax::{TaxData, TaxError, TaxedMoney},
};
