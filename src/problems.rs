//! Checkout problems
//!
//! Read-side validation of a checkout against current stock and channel
//! listing state. Problems are first-class values for the completion flow to
//! act on; they never abort or alter pricing.

use chrono::{DateTime, Utc};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::{
    catalog::{Catalog, VariantKey},
    checkout::Checkout,
    lines::LineKey,
};

/// A blocking condition on one checkout line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Problem {
    /// The variant cannot currently be purchased in this channel: the
    /// listing is missing, unpublished, not yet available, or has no price.
    VariantNotAvailable {
        /// The variant the line references.
        variant: VariantKey,
    },

    /// Requested quantity exceeds available stock for a tracked variant.
    ///
    /// Quantities are aggregated across every line referencing the variant,
    /// and each of those lines reports the problem.
    InsufficientStock {
        /// The variant the line references.
        variant: VariantKey,

        /// Available stock, floored at zero even when oversold.
        available: i64,
    },
}

/// Problems keyed by line, in detection order: availability problems come
/// before stock problems.
pub type ProblemMap = FxHashMap<LineKey, SmallVec<[Problem; 2]>>;

/// Check every checkout line against listing availability and stock.
///
/// Lines with an availability problem are reported once and excluded from
/// the stock pass, so an unavailable line is never doubly flagged.
pub fn check_problems<'a>(
    checkout: &Checkout<'a>,
    catalog: &Catalog<'a>,
    now: DateTime<Utc>,
) -> ProblemMap {
    let mut problems = ProblemMap::default();
    let mut unavailable = FxHashSet::default();

    for line in checkout.lines() {
        if !variant_is_available(catalog, line.variant(), now) {
            unavailable.insert(line.key());

            problems
                .entry(line.key())
                .or_default()
                .push(Problem::VariantNotAvailable {
                    variant: line.variant(),
                });
        }
    }

    // Aggregate requested quantities per variant; a cart may hold several
    // lines of the same variant.
    let mut requested: FxHashMap<VariantKey, i64> = FxHashMap::default();

    for line in checkout.lines() {
        if unavailable.contains(&line.key()) || !inventory_is_tracked(catalog, line.variant()) {
            continue;
        }

        *requested.entry(line.variant()).or_insert(0) += i64::from(line.quantity());
    }

    for line in checkout.lines() {
        if unavailable.contains(&line.key()) || !inventory_is_tracked(catalog, line.variant()) {
            continue;
        }

        let available = catalog.stock(line.variant()).unwrap_or(0);
        let needed = requested.get(&line.variant()).copied().unwrap_or(0);

        if available < needed {
            problems
                .entry(line.key())
                .or_default()
                .push(Problem::InsufficientStock {
                    variant: line.variant(),
                    available: 0.max(available),
                });
        }
    }

    problems
}

/// Whether the variant's channel listing allows purchase right now.
fn variant_is_available(catalog: &Catalog<'_>, variant: VariantKey, now: DateTime<Utc>) -> bool {
    let Some(listing) = catalog.listing(variant) else {
        return false;
    };

    listing.published
        && listing.price.is_some()
        && !listing
            .available_for_purchase_at
            .is_some_and(|available_at| available_at > now)
}

/// Whether stock is tracked for the variant.
fn inventory_is_tracked(catalog: &Catalog<'_>, variant: VariantKey) -> bool {
    catalog
        .listing(variant)
        .is_some_and(|listing| listing.track_inventory)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use rusty_money::{Money, iso::USD};
    use slotmap::SlotMap;
    use testresult::TestResult;

    use crate::{
        catalog::ChannelListing,
        checkout::CheckoutError,
        lines::CheckoutLine,
    };

    use super::*;

    fn listing<'a>(price_minor: i64) -> ChannelListing<'a> {
        ChannelListing {
            published: true,
            available_for_purchase_at: None,
            price: Some(Money::from_minor(price_minor, USD)),
            track_inventory: true,
        }
    }

    fn line_keys(n: usize) -> Vec<LineKey> {
        let mut map = SlotMap::<LineKey, ()>::with_key();

        (0..n).map(|_| map.insert(())).collect()
    }

    fn checkout_with<'a>(lines: Vec<CheckoutLine<'a>>) -> Result<Checkout<'a>, CheckoutError> {
        Checkout::with_lines(lines, USD)
    }

    #[test]
    fn sufficient_stock_reports_no_problems() -> TestResult {
        let mut catalog = Catalog::new();
        let variant = catalog.add_variant("Mug");

        catalog.set_listing(variant, listing(5_00));
        catalog.set_stock(variant, 10);

        let keys = line_keys(1);
        let lines: Vec<CheckoutLine<'_>> = keys
            .iter()
            .map(|key| CheckoutLine::new(*key, variant, 2, Money::from_minor(5_00, USD)))
            .collect();

        let problems = check_problems(&checkout_with(lines)?, &catalog, Utc::now());

        assert!(problems.is_empty());

        Ok(())
    }

    #[test]
    fn stock_is_aggregated_across_duplicate_variant_lines() -> TestResult {
        // Two lines of the same variant, quantities 2 and 3, against stock
        // of 4: both lines report InsufficientStock with available 4.
        let mut catalog = Catalog::new();
        let variant = catalog.add_variant("Mug");

        catalog.set_listing(variant, listing(5_00));
        catalog.set_stock(variant, 4);

        let keys = line_keys(2);
        let lines: Vec<CheckoutLine<'_>> = keys
            .iter()
            .zip([2_u32, 3])
            .map(|(key, quantity)| {
                CheckoutLine::new(*key, variant, quantity, Money::from_minor(5_00, USD))
            })
            .collect();

        let problems = check_problems(&checkout_with(lines)?, &catalog, Utc::now());

        assert_eq!(problems.len(), 2);

        for key in &keys {
            let line_problems = problems.get(key).ok_or("expected problems for line")?;

            assert_eq!(
                line_problems.as_slice(),
                &[Problem::InsufficientStock {
                    variant,
                    available: 4
                }]
            );
        }

        Ok(())
    }

    #[test]
    fn oversold_stock_reports_zero_available() -> TestResult {
        let mut catalog = Catalog::new();
        let variant = catalog.add_variant("Mug");

        catalog.set_listing(variant, listing(5_00));
        catalog.set_stock(variant, -3);

        let keys = line_keys(1);
        let lines: Vec<CheckoutLine<'_>> = keys
            .iter()
            .map(|key| CheckoutLine::new(*key, variant, 1, Money::from_minor(5_00, USD)))
            .collect();

        let problems = check_problems(&checkout_with(lines)?, &catalog, Utc::now());
        let key = keys.first().ok_or("missing key")?;
        let line_problems = problems.get(key).ok_or("expected problems")?;

        assert_eq!(
            line_problems.as_slice(),
            &[Problem::InsufficientStock {
                variant,
                available: 0
            }]
        );

        Ok(())
    }

    #[test]
    fn unpublished_listing_reports_not_available_only() -> TestResult {
        // The unavailable line is excluded from the stock pass: one problem,
        // not two.
        let mut catalog = Catalog::new();
        let variant = catalog.add_variant("Mug");

        catalog.set_listing(
            variant,
            ChannelListing {
                published: false,
                ..listing(5_00)
            },
        );
        catalog.set_stock(variant, 0);

        let keys = line_keys(1);
        let lines: Vec<CheckoutLine<'_>> = keys
            .iter()
            .map(|key| CheckoutLine::new(*key, variant, 5, Money::from_minor(5_00, USD)))
            .collect();

        let problems = check_problems(&checkout_with(lines)?, &catalog, Utc::now());
        let key = keys.first().ok_or("missing key")?;
        let line_problems = problems.get(key).ok_or("expected problems")?;

        assert_eq!(
            line_problems.as_slice(),
            &[Problem::VariantNotAvailable { variant }]
        );

        Ok(())
    }

    #[test]
    fn missing_listing_reports_not_available() -> TestResult {
        let mut catalog = Catalog::new();
        let variant = catalog.add_variant("Mug");

        let keys = line_keys(1);
        let lines: Vec<CheckoutLine<'_>> = keys
            .iter()
            .map(|key| CheckoutLine::new(*key, variant, 1, Money::from_minor(5_00, USD)))
            .collect();

        let problems = check_problems(&checkout_with(lines)?, &catalog, Utc::now());
        let key = keys.first().ok_or("missing key")?;

        assert_eq!(
            problems.get(key).map(SmallVec::as_slice),
            Some([Problem::VariantNotAvailable { variant }].as_slice())
        );

        Ok(())
    }

    #[test]
    fn future_availability_date_blocks_purchase() -> TestResult {
        let now = Utc::now();
        let mut catalog = Catalog::new();
        let variant = catalog.add_variant("Pre-order");

        catalog.set_listing(
            variant,
            ChannelListing {
                available_for_purchase_at: Some(now + Duration::days(7)),
                ..listing(5_00)
            },
        );

        let keys = line_keys(1);
        let lines: Vec<CheckoutLine<'_>> = keys
            .iter()
            .map(|key| CheckoutLine::new(*key, variant, 1, Money::from_minor(5_00, USD)))
            .collect();

        let problems = check_problems(&checkout_with(lines)?, &catalog, now);

        assert_eq!(problems.len(), 1);

        Ok(())
    }

    #[test]
    fn past_availability_date_allows_purchase() -> TestResult {
        let now = Utc::now();
        let mut catalog = Catalog::new();
        let variant = catalog.add_variant("Released");

        catalog.set_listing(
            variant,
            ChannelListing {
                available_for_purchase_at: Some(now - Duration::days(1)),
                ..listing(5_00)
            },
        );
        catalog.set_stock(variant, 5);

        let keys = line_keys(1);
        let lines: Vec<CheckoutLine<'_>> = keys
            .iter()
            .map(|key| CheckoutLine::new(*key, variant, 1, Money::from_minor(5_00, USD)))
            .collect();

        let problems = check_problems(&checkout_with(lines)?, &catalog, now);

        assert!(problems.is_empty());

        Ok(())
    }

    #[test]
    fn missing_price_makes_variant_unavailable() -> TestResult {
        let mut catalog = Catalog::new();
        let variant = catalog.add_variant("Unpriced");

        catalog.set_listing(
            variant,
            ChannelListing {
                price: None,
                ..listing(0)
            },
        );

        let keys = line_keys(1);
        let lines: Vec<CheckoutLine<'_>> = keys
            .iter()
            .map(|key| CheckoutLine::new(*key, variant, 1, Money::from_minor(5_00, USD)))
            .collect();

        let problems = check_problems(&checkout_with(lines)?, &catalog, Utc::now());

        assert_eq!(problems.len(), 1);

        Ok(())
    }

    #[test]
    fn untracked_inventory_skips_the_stock_pass() -> TestResult {
        let mut catalog = Catalog::new();
        let variant = catalog.add_variant("Made to order");

        catalog.set_listing(
            variant,
            ChannelListing {
                track_inventory: false,
                ..listing(5_00)
            },
        );
        catalog.set_stock(variant, 0);

        let keys = line_keys(1);
        let lines: Vec<CheckoutLine<'_>> = keys
            .iter()
            .map(|key| CheckoutLine::new(*key, variant, 10, Money::from_minor(5_00, USD)))
            .collect();

        let problems = check_problems(&checkout_with(lines)?, &catalog, Utc::now());

        assert!(problems.is_empty());

        Ok(())
    }
}
