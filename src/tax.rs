//! Taxed prices
//!
//! Net + gross money pairs and the overlay that lets an external tax engine
//! supersede the core's net-only computation. The core's own output always
//! has `gross == net`; a tax pass replaces totals wholesale.

use rustc_hash::FxHashMap;
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

use crate::lines::LineKey;

/// Errors that can occur while applying external tax data.
#[derive(Debug, Error)]
pub enum TaxError {
    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// Tax data referenced a line the pricing pass did not produce.
    #[error("tax data references an unknown checkout line")]
    UnknownLine(LineKey),
}

/// A price with its net and gross amounts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaxedMoney<'a> {
    net: Money<'a, Currency>,
    gross: Money<'a, Currency>,
}

impl<'a> TaxedMoney<'a> {
    /// Pair a net amount with its gross amount.
    ///
    /// # Errors
    ///
    /// Returns a [`MoneyError::CurrencyMismatch`] if the two currencies
    /// differ.
    pub fn new(net: Money<'a, Currency>, gross: Money<'a, Currency>) -> Result<Self, TaxError> {
        if net.currency() == gross.currency() {
            Ok(Self { net, gross })
        } else {
            Err(TaxError::Money(MoneyError::CurrencyMismatch {
                expected: net.currency().iso_alpha_code,
                actual: gross.currency().iso_alpha_code,
            }))
        }
    }

    /// An untaxed price: gross equals net.
    pub fn from_net(net: Money<'a, Currency>) -> Self {
        Self { net, gross: net }
    }

    /// Return the net amount.
    pub fn net(&self) -> &Money<'a, Currency> {
        &self.net
    }

    /// Return the gross amount.
    pub fn gross(&self) -> &Money<'a, Currency> {
        &self.gross
    }

    /// The tax portion: gross minus net.
    ///
    /// # Errors
    ///
    /// Returns a [`MoneyError`] if the subtraction fails.
    pub fn tax(&self) -> Result<Money<'a, Currency>, MoneyError> {
        self.gross.sub(self.net)
    }
}

/// Externally computed taxed prices keyed to one pricing pass.
///
/// Absent entries keep the core's net-only baseline.
#[derive(Debug, Default)]
pub struct TaxData<'a> {
    /// Taxed line totals keyed by line.
    pub line_totals: FxHashMap<LineKey, TaxedMoney<'a>>,

    /// Taxed delivery price.
    pub delivery: Option<TaxedMoney<'a>>,

    /// Taxed subtotal.
    pub subtotal: Option<TaxedMoney<'a>>,

    /// Taxed checkout total.
    pub total: Option<TaxedMoney<'a>>,
}
