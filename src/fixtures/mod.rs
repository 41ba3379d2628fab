//! Fixtures
//!
//! Named YAML fixture sets for building catalogs, checkouts, and vouchers in
//! tests and examples. A set `name` loads `fixtures/variants/<name>.yml`,
//! `fixtures/checkouts/<name>.yml`, and, when present,
//! `fixtures/vouchers/<name>.yml`.

use std::{fs, io, path::PathBuf};

use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use slotmap::SlotMap;
use thiserror::Error;

use crate::{
    catalog::{Catalog, VariantKey},
    checkout::{
        Checkout, CheckoutError,
        delivery::{
            CollectionPoint, CollectionPointKey, DeliveryMethod, ShippingMethod,
            ShippingMethodKey,
        },
    },
    discounts::Voucher,
    lines::{CheckoutLine, LineKey},
};

pub mod checkouts;
pub mod variants;
pub mod vouchers;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Invalid percentage format
    #[error("Invalid percentage format: {0}")]
    InvalidPercentage(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Variant not found
    #[error("Variant not found: {0}")]
    VariantNotFound(String),

    /// Variant has no listed price to build a line from
    #[error("Variant has no listed price: {0}")]
    VariantNotListed(String),

    /// Currency mismatch between fixture files
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// No variants loaded yet
    #[error("No variants loaded yet; currency unknown")]
    NoCurrency,

    /// Checkout construction error
    #[error("Failed to create checkout: {0}")]
    Checkout(#[from] CheckoutError),
}

/// Fixture
#[derive(Debug)]
pub struct Fixture<'a> {
    /// Base path for fixture files
    base_path: PathBuf,

    /// Catalog built from the variants file
    catalog: Catalog<'a>,

    /// String key -> `VariantKey` mappings for lookups
    variant_keys: FxHashMap<String, VariantKey>,

    /// Pre-built line snapshots (reference variants by `VariantKey`)
    lines: Vec<CheckoutLine<'a>>,

    /// Pre-built voucher, when the set ships one
    voucher: Option<Voucher<'a>>,

    /// Pre-built delivery choice and its valid-method list
    delivery: DeliveryMethod<'a>,
    valid_shipping: Vec<ShippingMethodKey>,

    /// Key sources for generated identities
    line_keys: SlotMap<LineKey, ()>,
    shipping_keys: SlotMap<ShippingMethodKey, ()>,
    collection_keys: SlotMap<CollectionPointKey, ()>,

    /// Currency for the fixture set
    currency: Option<&'static Currency>,
}

impl<'a> Fixture<'a> {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            catalog: Catalog::new(),
            variant_keys: FxHashMap::default(),
            lines: Vec::new(),
            voucher: None,
            delivery: DeliveryMethod::None,
            valid_shipping: Vec::new(),
            line_keys: SlotMap::with_key(),
            shipping_keys: SlotMap::with_key(),
            collection_keys: SlotMap::with_key(),
            currency: None,
        }
    }

    /// Load a complete fixture set: variants, checkout, and, when the file
    /// exists, a voucher.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::new();

        fixture.load_variants(name)?.load_checkout(name)?;
        fixture.load_voucher_if_present(name)?;

        Ok(fixture)
    }

    /// Load variants from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or if there are
    /// currency mismatches.
    pub fn load_variants(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("variants").join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;
        let fixture: variants::VariantsFixture = serde_norway::from_str(&contents)?;

        for (key, variant_fixture) in fixture.variants {
            let (name, listing, stock, currency) = variant_fixture.try_into_listing()?;

            self.check_currency(currency)?;

            let variant_key = self.catalog.add_variant(name);

            self.catalog.set_listing(variant_key, listing);

            if let Some(stock) = stock {
                self.catalog.set_stock(variant_key, stock);
            }

            self.variant_keys.insert(key, variant_key);
        }

        Ok(self)
    }

    /// Load a checkout's lines and delivery choice from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or if referenced
    /// variants don't exist.
    pub fn load_checkout(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("checkouts").join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;
        let fixture: checkouts::CheckoutFixtureFile = serde_norway::from_str(&contents)?;

        let currency = variants::currency_for_code(&fixture.checkout.currency)?;

        self.check_currency(currency)?;

        for line_fixture in fixture.checkout.lines {
            let variant_key = self
                .variant_keys
                .get(&line_fixture.variant)
                .copied()
                .ok_or_else(|| FixtureError::VariantNotFound(line_fixture.variant.clone()))?;

            let unit_price = self
                .catalog
                .listing(variant_key)
                .and_then(|listing| listing.price)
                .ok_or_else(|| FixtureError::VariantNotListed(line_fixture.variant.clone()))?;

            let line =
                line_fixture.try_into_line(self.line_keys.insert(()), variant_key, unit_price)?;

            self.lines.push(line);
        }

        if let Some(delivery) = fixture.checkout.delivery {
            self.load_delivery(delivery)?;
        }

        Ok(self)
    }

    /// Load a voucher from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_voucher(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("vouchers").join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;
        let fixture: vouchers::VoucherFixtureFile = serde_norway::from_str(&contents)?;

        self.voucher = Some(fixture.voucher.try_into_voucher()?);

        Ok(self)
    }

    /// Build the delivery choice from its fixture form.
    fn load_delivery(&mut self, delivery: checkouts::DeliveryFixture) -> Result<(), FixtureError> {
        match delivery {
            checkouts::DeliveryFixture::Shipping { name, price } => {
                let (minor, currency) = variants::parse_price(&price)?;

                self.check_currency(currency)?;

                let key = self.shipping_keys.insert(());
                let method = ShippingMethod::new(key, name, Money::from_minor(minor, currency));

                self.valid_shipping.push(key);
                self.delivery = DeliveryMethod::Shipping(method);
            }
            checkouts::DeliveryFixture::CollectionPoint { name } => {
                let key = self.collection_keys.insert(());

                self.delivery = DeliveryMethod::CollectionPoint(CollectionPoint::new(key, name));
            }
        }

        Ok(())
    }

    /// Load a voucher when the set ships one; sets without a voucher file
    /// are valid.
    fn load_voucher_if_present(&mut self, name: &str) -> Result<(), FixtureError> {
        match self.load_voucher(name) {
            Ok(_) => Ok(()),
            Err(FixtureError::Io(err)) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Get a variant key by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the variant is not found.
    pub fn variant_key(&self, key: &str) -> Result<VariantKey, FixtureError> {
        self.variant_keys
            .get(key)
            .copied()
            .ok_or_else(|| FixtureError::VariantNotFound(key.to_string()))
    }

    /// The catalog built from the variants file.
    pub fn catalog(&self) -> &Catalog<'a> {
        &self.catalog
    }

    /// The loaded line snapshots, in fixture order.
    pub fn lines(&self) -> &[CheckoutLine<'a>] {
        &self.lines
    }

    /// Create a checkout from the loaded lines, voucher, and delivery choice.
    ///
    /// # Errors
    ///
    /// Returns an error if no variants are loaded or checkout construction
    /// fails.
    pub fn checkout(&self) -> Result<Checkout<'a>, FixtureError> {
        let currency = self.currency()?;

        let mut checkout = Checkout::with_lines(self.lines.clone(), currency)?;

        checkout.set_voucher(self.voucher.clone());
        checkout.select_delivery(self.delivery.clone(), &self.valid_shipping)?;

        Ok(checkout)
    }

    /// Get the currency
    ///
    /// # Errors
    ///
    /// Returns an error if no variants have been loaded yet.
    pub fn currency(&self) -> Result<&'static Currency, FixtureError> {
        self.currency.ok_or(FixtureError::NoCurrency)
    }

    /// Record the set's currency, rejecting cross-file mismatches.
    fn check_currency(&mut self, currency: &'static Currency) -> Result<(), FixtureError> {
        if let Some(existing) = self.currency {
            if existing != currency {
                return Err(FixtureError::CurrencyMismatch(
                    existing.iso_alpha_code.to_string(),
                    currency.iso_alpha_code.to_string(),
                ));
            }
        } else {
            self.currency = Some(currency);
        }

        Ok(())
    }
}

impl Default for Fixture<'_> {
    fn default() -> Self {
        Self::new()
    }
}
