//! Checkout Fixtures

use rusty_money::{Money, iso::Currency};
use serde::Deserialize;

use crate::{
    catalog::VariantKey,
    fixtures::{FixtureError, variants},
    lines::{CheckoutLine, LineKey},
};

/// Wrapper for a checkout in YAML
#[derive(Debug, Deserialize)]
pub struct CheckoutFixtureFile {
    /// The checkout under test
    pub checkout: CheckoutFixture,
}

/// Checkout fixture from YAML
#[derive(Debug, Deserialize)]
pub struct CheckoutFixture {
    /// ISO alpha currency code
    pub currency: String,

    /// Line fixtures, in the checkout's stored order
    pub lines: Vec<LineFixture>,

    /// Optional delivery choice
    #[serde(default)]
    pub delivery: Option<DeliveryFixture>,
}

/// A single line in a checkout fixture
#[derive(Debug, Deserialize)]
pub struct LineFixture {
    /// Variant key reference
    pub variant: String,

    /// Ordered quantity
    pub quantity: u32,

    /// Optional catalogue promotion reduction ("15%" or "2.00 USD")
    #[serde(default)]
    pub promotion: Option<String>,

    /// Optional per-unit voucher reduction resolved to this line
    #[serde(default)]
    pub voucher_reduction: Option<String>,

    /// Optional manual price override (e.g., "8.00 USD")
    #[serde(default)]
    pub price_override: Option<String>,

    /// Whether the line needs physical delivery
    #[serde(default = "default_true")]
    pub requires_shipping: bool,
}

/// Delivery choice fixture
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeliveryFixture {
    /// Deliver with a shipping method
    Shipping {
        /// Method name
        name: String,

        /// Channel-listed price (e.g., "5.00 USD")
        price: String,
    },

    /// Customer picks the order up from a warehouse
    CollectionPoint {
        /// Collection point name
        name: String,
    },
}

impl LineFixture {
    /// Convert to a [`CheckoutLine`] snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if a reduction or override string cannot be parsed.
    pub fn try_into_line<'a>(
        self,
        key: LineKey,
        variant: VariantKey,
        unit_price: Money<'a, Currency>,
    ) -> Result<CheckoutLine<'a>, FixtureError> {
        let mut line = CheckoutLine::new(key, variant, self.quantity, unit_price)
            .with_requires_shipping(self.requires_shipping);

        if let Some(price_override) = &self.price_override {
            let (minor, currency) = variants::parse_price(price_override)?;

            line = line.with_price_override(Money::from_minor(minor, currency));
        }

        if let Some(promotion) = &self.promotion {
            line = line.with_promotion_reduction(variants::parse_reduction(promotion)?);
        }

        if let Some(voucher_reduction) = &self.voucher_reduction {
            line = line.with_voucher_reduction(variants::parse_reduction(voucher_reduction)?);
        }

        Ok(line)
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::USD;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn checkout_fixture_parses_lines_and_delivery() -> TestResult {
        let yaml = r"
checkout:
  currency: USD
  lines:
    - variant: blue-tee
      quantity: 2
      promotion: 15%
    - variant: coffee-mug
      quantity: 1
      requires_shipping: false
  delivery:
    type: shipping
    name: Standard
    price: 5.00 USD
";
        let file: CheckoutFixtureFile = serde_norway::from_str(yaml)?;

        assert_eq!(file.checkout.currency, "USD");
        assert_eq!(file.checkout.lines.len(), 2);
        assert!(matches!(
            file.checkout.delivery,
            Some(DeliveryFixture::Shipping { .. })
        ));

        Ok(())
    }

    #[test]
    fn checkout_fixture_parses_collection_point() -> TestResult {
        let yaml = r"
checkout:
  currency: USD
  lines:
    - variant: blue-tee
      quantity: 1
  delivery:
    type: collection_point
    name: Warehouse A
";
        let file: CheckoutFixtureFile = serde_norway::from_str(yaml)?;

        assert!(matches!(
            file.checkout.delivery,
            Some(DeliveryFixture::CollectionPoint { .. })
        ));

        Ok(())
    }

    #[test]
    fn checkout_fixture_rejects_unknown_delivery_type() {
        let yaml = r"
checkout:
  currency: USD
  lines: []
  delivery:
    type: teleport
    name: Beam
";
        let result: Result<CheckoutFixtureFile, _> = serde_norway::from_str(yaml);

        assert!(result.is_err());
    }

    #[test]
    fn line_fixture_builds_a_snapshot() -> TestResult {
        let fixture = LineFixture {
            variant: "blue-tee".to_string(),
            quantity: 2,
            promotion: Some("15%".to_string()),
            voucher_reduction: None,
            price_override: Some("8.00 USD".to_string()),
            requires_shipping: true,
        };

        let line = fixture.try_into_line(
            LineKey::default(),
            VariantKey::default(),
            Money::from_minor(10_00, USD),
        )?;

        assert_eq!(line.quantity(), 2);
        assert_eq!(line.base_unit_price(), &Money::from_minor(8_00, USD));
        assert!(line.promotion_reduction().is_some());
        assert!(line.voucher_reduction().is_none());

        Ok(())
    }
}
