//! Variant Fixtures

use chrono::{DateTime, Utc};
use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use rusty_money::{
    Money,
    iso::{Currency, EUR, GBP, JPY, USD},
};
use serde::Deserialize;

use crate::{
    catalog::ChannelListing,
    discounts::Reduction,
    fixtures::FixtureError,
    money::{major_units, quantize},
};

/// Wrapper for variants in YAML
#[derive(Debug, Deserialize)]
pub struct VariantsFixture {
    /// Map of variant key -> variant fixture
    pub variants: FxHashMap<String, VariantFixture>,
}

/// Variant Fixture
#[derive(Debug, Deserialize)]
pub struct VariantFixture {
    /// Variant name
    pub name: String,

    /// Channel-listed price (e.g., "2.99 USD")
    pub price: String,

    /// Available stock; omit for variants without a stock record
    #[serde(default)]
    pub stock: Option<i64>,

    /// Whether the product is published in the channel
    #[serde(default = "default_true")]
    pub published: bool,

    /// Whether inventory is tracked
    #[serde(default = "default_true")]
    pub track_inventory: bool,

    /// Moment the variant becomes purchasable, if gated
    #[serde(default)]
    pub available_from: Option<DateTime<Utc>>,
}

impl VariantFixture {
    /// Convert to a name, channel listing, stock, and currency.
    ///
    /// # Errors
    ///
    /// Returns an error if the price string cannot be parsed.
    pub fn try_into_listing(
        self,
    ) -> Result<(String, ChannelListing<'static>, Option<i64>, &'static Currency), FixtureError>
    {
        let (minor_units, currency) = parse_price(&self.price)?;

        let listing = ChannelListing {
            published: self.published,
            available_for_purchase_at: self.available_from,
            price: Some(Money::from_minor(minor_units, currency)),
            track_inventory: self.track_inventory,
        };

        Ok((self.name, listing, self.stock, currency))
    }
}

/// Parse price string (e.g., "2.99 USD") into minor units and currency
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY",
/// if the amount cannot be parsed as a decimal, or if the currency code
/// is not recognized.
pub fn parse_price(s: &str) -> Result<(i64, &'static Currency), FixtureError> {
    let mut parts = s.split_whitespace();

    let (Some(amount), Some(code), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(FixtureError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    let currency = currency_for_code(code)?;

    let money =
        quantize(amount, currency).map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    // Reject amounts with sub-minor-unit precision rather than rounding a
    // typo into a price.
    if major_units(&money) != amount {
        return Err(FixtureError::InvalidPrice(s.to_string()));
    }

    Ok((money.to_minor_units(), currency))
}

/// Parse a reduction string: "15%" for a percentage, "2.50 USD" for a fixed
/// amount.
///
/// # Errors
///
/// Returns an error if the string parses as neither form.
pub fn parse_reduction(s: &str) -> Result<Reduction<'static>, FixtureError> {
    let trimmed = s.trim();

    if trimmed.ends_with('%') {
        return Ok(Reduction::PercentageOff(parse_percentage(trimmed)?));
    }

    let (minor_units, currency) = parse_price(trimmed)?;

    Ok(Reduction::AmountOff(Money::from_minor(minor_units, currency)))
}

/// Parse percentage string (e.g., "15%" or "0.15") into a `Percentage`
///
/// Accepts two formats:
/// - Percentage format: "15%" for 15%
/// - Decimal format: "0.15" for 15%
///
/// # Errors
///
/// Returns an error if the string cannot be parsed.
pub fn parse_percentage(s: &str) -> Result<Percentage, FixtureError> {
    let trimmed = s.trim();

    if let Some(percent_str) = trimmed.strip_suffix('%') {
        let value = percent_str
            .trim()
            .parse::<f64>()
            .map_err(|_err| FixtureError::InvalidPercentage(s.to_string()))?;

        // Convert from percent points to a fraction (15 -> 0.15)
        Ok(Percentage::from(value / 100.0))
    } else {
        let value = trimmed
            .parse::<f64>()
            .map_err(|_err| FixtureError::InvalidPercentage(s.to_string()))?;

        Ok(Percentage::from(value))
    }
}

/// Resolve an ISO alpha code to a currency.
///
/// # Errors
///
/// Returns an error if the code is not recognized.
pub fn currency_for_code(code: &str) -> Result<&'static Currency, FixtureError> {
    match code {
        "GBP" => Ok(GBP),
        "USD" => Ok(USD),
        "EUR" => Ok(EUR),
        "JPY" => Ok(JPY),
        other => Err(FixtureError::UnknownCurrency(other.to_string())),
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parse_price_reads_amount_and_currency() -> TestResult {
        let (minor, currency) = parse_price("2.99 GBP")?;

        assert_eq!(minor, 2_99);
        assert_eq!(currency, GBP);

        Ok(())
    }

    #[test]
    fn parse_price_handles_zero_exponent_currencies() -> TestResult {
        let (minor, currency) = parse_price("500 JPY")?;

        assert_eq!(minor, 500);
        assert_eq!(currency, JPY);

        Ok(())
    }

    #[test]
    fn parse_price_rejects_malformed_strings() {
        for input in ["", "2.99", "2.99 GBP extra", "abc GBP"] {
            assert!(
                matches!(parse_price(input), Err(FixtureError::InvalidPrice(_))),
                "expected invalid price for {input:?}"
            );
        }
    }

    #[test]
    fn parse_price_rejects_sub_minor_precision() {
        assert!(matches!(
            parse_price("2.999 GBP"),
            Err(FixtureError::InvalidPrice(_))
        ));
    }

    #[test]
    fn parse_price_rejects_unknown_currency() {
        assert!(matches!(
            parse_price("2.99 XYZ"),
            Err(FixtureError::UnknownCurrency(_))
        ));
    }

    #[test]
    fn parse_reduction_reads_percentages() -> TestResult {
        let reduction = parse_reduction("15%")?;

        assert!(matches!(
            reduction,
            Reduction::PercentageOff(percent) if percent == Percentage::from(0.15)
        ));

        Ok(())
    }

    #[test]
    fn parse_reduction_reads_fixed_amounts() -> TestResult {
        let reduction = parse_reduction("2.50 USD")?;

        assert!(matches!(
            reduction,
            Reduction::AmountOff(money) if money.to_minor_units() == 2_50
                && money.currency() == USD
        ));

        Ok(())
    }

    #[test]
    fn variant_fixture_defaults_to_published_and_tracked() -> TestResult {
        let yaml = "name: Tee\nprice: 10.00 USD\n";
        let fixture: VariantFixture = serde_norway::from_str(yaml)?;

        let (name, listing, stock, currency) = fixture.try_into_listing()?;

        assert_eq!(name, "Tee");
        assert!(listing.published);
        assert!(listing.track_inventory);
        assert!(listing.available_for_purchase_at.is_none());
        assert!(stock.is_none());
        assert_eq!(currency, USD);

        Ok(())
    }

    #[test]
    fn variant_fixture_reads_availability_gate() -> TestResult {
        let yaml = "name: Tee\nprice: 10.00 USD\navailable_from: 2030-01-01T00:00:00Z\n";
        let fixture: VariantFixture = serde_norway::from_str(yaml)?;

        let (_, listing, _, _) = fixture.try_into_listing()?;

        assert!(listing.available_for_purchase_at.is_some());

        Ok(())
    }
}
