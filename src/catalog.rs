//! Catalog
//!
//! Read-side variant data supplied by the availability data source: display
//! metadata, channel listings, and available stock. The problem checker
//! consults this; the pricing pass never does.

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// Variant Key
    pub struct VariantKey;
}

/// Display metadata for a product variant.
#[derive(Debug, Clone)]
pub struct Variant {
    /// Variant name
    pub name: String,
}

/// A variant's listing in the checkout's channel.
#[derive(Debug, Clone)]
pub struct ChannelListing<'a> {
    /// Whether the product is published in the channel.
    pub published: bool,

    /// Moment the variant becomes purchasable, if gated.
    pub available_for_purchase_at: Option<DateTime<Utc>>,

    /// Channel-listed price; a missing price makes the variant unavailable.
    pub price: Option<Money<'a, Currency>>,

    /// Whether inventory is tracked for this variant.
    pub track_inventory: bool,
}

/// Variant metadata, listings, and stock for one channel and country.
#[derive(Debug, Default)]
pub struct Catalog<'a> {
    variants: SlotMap<VariantKey, Variant>,
    listings: FxHashMap<VariantKey, ChannelListing<'a>>,
    stock: FxHashMap<VariantKey, i64>,
}

impl<'a> Catalog<'a> {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a variant and return its key.
    pub fn add_variant(&mut self, name: impl Into<String>) -> VariantKey {
        self.variants.insert(Variant { name: name.into() })
    }

    /// Set the channel listing for a variant.
    pub fn set_listing(&mut self, variant: VariantKey, listing: ChannelListing<'a>) {
        self.listings.insert(variant, listing);
    }

    /// Set the available stock for a variant.
    ///
    /// Oversold stock may be negative; the problem checker floors it at zero
    /// when reporting.
    pub fn set_stock(&mut self, variant: VariantKey, available: i64) {
        self.stock.insert(variant, available);
    }

    /// Look up a variant's display metadata.
    pub fn variant(&self, key: VariantKey) -> Option<&Variant> {
        self.variants.get(key)
    }

    /// Look up a variant's channel listing.
    pub fn listing(&self, key: VariantKey) -> Option<&ChannelListing<'a>> {
        self.listings.get(&key)
    }

    /// Look up a variant's available stock.
    pub fn stock(&self, key: VariantKey) -> Option<i64> {
        self.stock.get(&key).copied()
    }

    /// The variant metadata map, keyed for display lookups.
    pub fn variants(&self) -> &SlotMap<VariantKey, Variant> {
        &self.variants
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::USD;

    use super::*;

    fn listed<'a>(price: Money<'a, Currency>) -> ChannelListing<'a> {
        ChannelListing {
            published: true,
            available_for_purchase_at: None,
            price: Some(price),
            track_inventory: true,
        }
    }

    #[test]
    fn add_variant_returns_resolvable_key() {
        let mut catalog = Catalog::new();
        let key = catalog.add_variant("Blue T-Shirt");

        assert_eq!(
            catalog.variant(key).map(|v| v.name.as_str()),
            Some("Blue T-Shirt")
        );
    }

    #[test]
    fn listing_and_stock_roundtrip() {
        let mut catalog = Catalog::new();
        let key = catalog.add_variant("Mug");

        catalog.set_listing(key, listed(Money::from_minor(5_00, USD)));
        catalog.set_stock(key, 12);

        assert!(catalog.listing(key).is_some_and(|l| l.published));
        assert_eq!(catalog.stock(key), Some(12));
    }

    #[test]
    fn missing_entries_return_none() {
        let catalog = Catalog::new();

        assert!(catalog.variant(VariantKey::default()).is_none());
        assert!(catalog.listing(VariantKey::default()).is_none());
        assert!(catalog.stock(VariantKey::default()).is_none());
    }
}
