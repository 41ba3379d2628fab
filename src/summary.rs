//! Checkout summary
//!
//! Console rendering of a priced checkout: a line table followed by the
//! subtotal, discount, delivery, and total block.

use std::io;

use rusty_money::MoneyError;
use slotmap::SlotMap;
use smallvec::{SmallVec, smallvec};
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    catalog::{Variant, VariantKey},
    checkout::{Checkout, PricedCheckout},
    lines::LineKey,
};

/// Errors that can occur when rendering a checkout summary.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// A line references a variant with no metadata.
    #[error("Missing variant")]
    MissingVariant(VariantKey),

    /// The pricing pass has no entry for a checkout line.
    #[error("Missing prices for line")]
    MissingLine(LineKey),

    /// Wrapper for money errors.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// IO error
    #[error("IO error")]
    Io,
}

/// Render a priced checkout as a table plus totals block.
///
/// # Errors
///
/// Returns a [`SummaryError`] if a variant or line price is missing, or the
/// sink cannot be written to.
pub fn write_summary(
    mut out: impl io::Write,
    checkout: &Checkout<'_>,
    priced: &PricedCheckout<'_>,
    variants: &SlotMap<VariantKey, Variant>,
) -> Result<(), SummaryError> {
    let mut builder = Builder::default();

    builder.push_record(["", "Item", "Qty", "Unit Price", "Line Total", "Savings"]);

    let mut savings_rows: SmallVec<[usize; 10]> = smallvec![];

    for (idx, line) in checkout.lines().iter().enumerate() {
        let variant = variants
            .get(line.variant())
            .ok_or(SummaryError::MissingVariant(line.variant()))?;

        let prices = priced
            .line(line.key())
            .ok_or(SummaryError::MissingLine(line.key()))?;

        let savings = prices.savings()?;
        let savings_cell = if savings.to_minor_units() > 0 {
            savings_rows.push(idx + 1); // header is row 0
            format!("-{savings}")
        } else {
            String::new()
        };

        builder.push_record([
            format!("#{:<3}", idx + 1),
            variant.name.clone(),
            line.quantity().to_string(),
            format!("{}", prices.unit_price),
            format!("{}", prices.total.net()),
            savings_cell,
        ]);
    }

    write_summary_table(&mut out, builder, &savings_rows)?;
    write_totals_block(&mut out, priced)?;

    Ok(())
}

fn write_summary_table(
    out: &mut impl io::Write,
    builder: Builder,
    savings_rows: &[usize],
) -> Result<(), SummaryError> {
    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());
    let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(1, separator);

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(2..6), Alignment::right());

    for &row in savings_rows {
        table.modify((row, 5), Color::FG_GREEN);
    }

    writeln!(out, "\n{table}").map_err(|_err| SummaryError::Io)
}

fn write_totals_block(
    out: &mut impl io::Write,
    priced: &PricedCheckout<'_>,
) -> Result<(), SummaryError> {
    let mut rows: SmallVec<[(String, String); 4]> = smallvec![(
        " Subtotal:".to_string(),
        format!("{}", priced.subtotal().gross())
    )];

    if let Some(discount) = priced.discount() {
        rows.push((
            format!(" Discount ({}):", discount.name),
            format!("-{}", discount.amount),
        ));
    }

    rows.push((
        " Delivery:".to_string(),
        format!("{}", priced.delivery().gross()),
    ));
    rows.push((" Total:".to_string(), format!("{}", priced.total().gross())));

    let label_width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    let value_width = rows.iter().map(|(_, value)| value.len()).max().unwrap_or(0);

    for (label, value) in &rows {
        writeln!(out, "{label:>label_width$}  {value:>value_width$}")
            .map_err(|_err| SummaryError::Io)?;
    }

    writeln!(out).map_err(|_err| SummaryError::Io)
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::USD};
    use slotmap::SlotMap;
    use testresult::TestResult;

    use crate::{
        catalog::Catalog,
        discounts::{Reduction, Voucher, VoucherKind},
        lines::CheckoutLine,
    };

    use super::*;

    #[test]
    fn summary_renders_lines_and_totals() -> TestResult {
        let mut catalog = Catalog::new();
        let tee = catalog.add_variant("Blue T-Shirt");
        let mug = catalog.add_variant("Coffee Mug");

        let mut line_keys = SlotMap::<LineKey, ()>::with_key();
        let lines = vec![
            CheckoutLine::new(line_keys.insert(()), tee, 2, Money::from_minor(10_00, USD)),
            CheckoutLine::new(line_keys.insert(()), mug, 1, Money::from_minor(15_00, USD)),
        ];

        let mut checkout = Checkout::with_lines(lines, USD)?;
        checkout.set_voucher(Some(Voucher::new(
            "SAVE7",
            VoucherKind::EntireOrder,
            Reduction::AmountOff(Money::from_minor(7_00, USD)),
        )));

        let priced = checkout.price()?;

        let mut out = Vec::new();
        write_summary(&mut out, &checkout, &priced, catalog.variants())?;

        let output = String::from_utf8(out)?;
        assert!(output.contains("Blue T-Shirt"));
        assert!(output.contains("Coffee Mug"));
        assert!(output.contains("Subtotal:"));
        assert!(output.contains("Discount (SAVE7):"));
        assert!(output.contains("Total:"));
        assert!(output.contains("$28.00"));

        Ok(())
    }

    #[test]
    fn summary_omits_discount_row_without_a_voucher() -> TestResult {
        let mut catalog = Catalog::new();
        let mug = catalog.add_variant("Coffee Mug");

        let mut line_keys = SlotMap::<LineKey, ()>::with_key();
        let lines = vec![CheckoutLine::new(
            line_keys.insert(()),
            mug,
            1,
            Money::from_minor(15_00, USD),
        )];

        let checkout = Checkout::with_lines(lines, USD)?;
        let priced = checkout.price()?;

        let mut out = Vec::new();
        write_summary(&mut out, &checkout, &priced, catalog.variants())?;

        let output = String::from_utf8(out)?;
        assert!(!output.contains("Discount"));
        assert!(output.contains("$15.00"));

        Ok(())
    }

    #[test]
    fn summary_errors_on_missing_variant_metadata() -> TestResult {
        let mut catalog = Catalog::new();
        let mug = catalog.add_variant("Coffee Mug");

        let mut line_keys = SlotMap::<LineKey, ()>::with_key();
        let lines = vec![CheckoutLine::new(
            line_keys.insert(()),
            mug,
            1,
            Money::from_minor(15_00, USD),
        )];

        let checkout = Checkout::with_lines(lines, USD)?;
        let priced = checkout.price()?;

        let empty = SlotMap::<VariantKey, Variant>::with_key();

        let result = write_summary(Vec::new(), &checkout, &priced, &empty);

        assert!(matches!(result, Err(SummaryError::MissingVariant(_))));

        Ok(())
    }
}
