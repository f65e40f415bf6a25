//! Cost and cost specification types.
//!
//! A [`Cost`] is the acquisition cost of a position (lot): per-unit cost,
//! currency, and optionally the acquisition date and a lot label.
//!
//! A [`CostSpec`] is the cost annotation as it appears on a posting, where
//! the per-unit price may be given directly, as a total, or left out
//! entirely. The passes resolve a spec against the posting's units to obtain
//! a concrete [`Cost`].

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Amount;

/// A cost represents the acquisition cost of a position (lot).
///
/// Buying 10 units of X at 10.00 GBP on 2023-01-25 yields a cost of:
/// - number: 10.00
/// - currency: "GBP"
/// - date: Some(2023-01-25)
///
/// # Examples
///
/// ```
/// use costbasis_core::Cost;
/// use rust_decimal_macros::dec;
/// use chrono::NaiveDate;
///
/// let cost = Cost::new(dec!(10.00), "GBP")
///     .with_date(NaiveDate::from_ymd_opt(2023, 1, 25).unwrap());
///
/// assert_eq!(cost.number, dec!(10.00));
/// assert_eq!(cost.currency, "GBP");
/// assert!(cost.date.is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cost {
    /// Cost per unit
    pub number: Decimal,
    /// Currency of the cost
    pub currency: String,
    /// Acquisition date (optional, for lot identification)
    pub date: Option<NaiveDate>,
    /// Lot label (optional, for explicit lot identification)
    pub label: Option<String>,
}

impl Cost {
    /// Create a new cost with the given per-unit number and currency.
    #[must_use]
    pub fn new(number: Decimal, currency: impl Into<String>) -> Self {
        Self {
            number,
            currency: currency.into(),
            date: None,
            label: None,
        }
    }

    /// Add a date to this cost.
    #[must_use]
    pub const fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Add a label to this cost.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Get the per-unit cost as an amount.
    #[must_use]
    pub fn as_amount(&self) -> Amount {
        Amount::new(self.number, self.currency.clone())
    }

    /// Calculate the total cost for a given number of units.
    #[must_use]
    pub fn total_cost(&self, units: Decimal) -> Amount {
        Amount::new(units * self.number, self.currency.clone())
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{} {}", self.number, self.currency)?;
        if let Some(date) = self.date {
            write!(f, ", {date}")?;
        }
        if let Some(label) = &self.label {
            write!(f, ", \"{label}\"")?;
        }
        write!(f, "}}")
    }
}

/// A cost annotation as written on a posting.
///
/// Unlike [`Cost`], every field is optional: a posting may carry a per-unit
/// cost (`{10.00 GBP}`), a total cost (`{{ 100.00 GBP }}`), or an
/// under-specified cost to be resolved later. [`CostSpec::resolve`] turns a
/// spec into a concrete [`Cost`] given the posting's units and date.
///
/// # Examples
///
/// ```
/// use costbasis_core::CostSpec;
/// use rust_decimal_macros::dec;
/// use chrono::NaiveDate;
///
/// let spec = CostSpec::empty()
///     .with_number_total(dec!(100.00))
///     .with_currency("GBP");
///
/// let date = NaiveDate::from_ymd_opt(2023, 1, 25).unwrap();
/// let cost = spec.resolve(dec!(10), date).unwrap();
/// assert_eq!(cost.number, dec!(10.00)); // 100.00 / 10
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CostSpec {
    /// Cost per unit (if specified)
    pub number_per: Option<Decimal>,
    /// Total cost (if specified) - alternative to `number_per`
    pub number_total: Option<Decimal>,
    /// Currency of the cost (if specified)
    pub currency: Option<String>,
    /// Acquisition date (if specified)
    pub date: Option<NaiveDate>,
    /// Lot label (if specified)
    pub label: Option<String>,
}

impl CostSpec {
    /// Create an empty cost spec.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Set the per-unit cost.
    #[must_use]
    pub const fn with_number_per(mut self, number: Decimal) -> Self {
        self.number_per = Some(number);
        self
    }

    /// Set the total cost.
    #[must_use]
    pub const fn with_number_total(mut self, number: Decimal) -> Self {
        self.number_total = Some(number);
        self
    }

    /// Set the currency.
    #[must_use]
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    /// Set the date.
    #[must_use]
    pub const fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Set the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Check if this is an empty cost spec (all fields `None`).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.number_per.is_none()
            && self.number_total.is_none()
            && self.currency.is_none()
            && self.date.is_none()
            && self.label.is_none()
    }

    /// Get the per-unit cost for the given signed units.
    ///
    /// A per-unit cost is returned directly; a total cost is divided by the
    /// unit magnitude. Returns `None` when neither is specified or when the
    /// units are zero and only a total is given.
    #[must_use]
    pub fn unit_price(&self, units: Decimal) -> Option<Decimal> {
        if let Some(per) = self.number_per {
            return Some(per);
        }
        match self.number_total {
            Some(total) if !units.is_zero() => Some(total / units.abs()),
            _ => None,
        }
    }

    /// Resolve this cost spec to a concrete cost, given the posting's signed
    /// units and the transaction date.
    ///
    /// Returns `None` if the currency or any price information is missing.
    #[must_use]
    pub fn resolve(&self, units: Decimal, date: NaiveDate) -> Option<Cost> {
        let currency = self.currency.clone()?;
        let number = self.unit_price(units)?;

        Some(Cost {
            number,
            currency,
            date: self.date.or(Some(date)),
            label: self.label.clone(),
        })
    }
}

impl From<&Cost> for CostSpec {
    fn from(cost: &Cost) -> Self {
        Self {
            number_per: Some(cost.number),
            number_total: None,
            currency: Some(cost.currency.clone()),
            date: cost.date,
            label: cost.label.clone(),
        }
    }
}

impl fmt::Display for CostSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        let mut parts = Vec::new();

        if let Some(n) = self.number_per {
            parts.push(format!("{n}"));
        }
        if let Some(n) = self.number_total {
            parts.push(format!("# {n}"));
        }
        if let Some(c) = &self.currency {
            parts.push(c.to_string());
        }
        if let Some(d) = self.date {
            parts.push(d.to_string());
        }
        if let Some(l) = &self.label {
            parts.push(format!("\"{l}\""));
        }

        write!(f, "{}", parts.join(", "))?;
        write!(f, "}}")
    }
}
