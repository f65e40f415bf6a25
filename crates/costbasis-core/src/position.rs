//! Position type representing units held at a cost.
//!
//! A [`Position`] is a holding of some units of an instrument, optionally at
//! an associated cost basis (lot). Positions with costs are what the
//! residual-lot clearer nets out and what the lot-adjusting gains variant
//! liquidates and reissues.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Amount, Cost};

/// A position is units of an instrument held at an optional cost.
///
/// # Examples
///
/// ```
/// use costbasis_core::{Amount, Cost, Position};
/// use rust_decimal_macros::dec;
///
/// // Simple position (no cost)
/// let cash = Position::simple(Amount::new(dec!(1000.00), "GBP"));
/// assert!(cash.cost.is_none());
///
/// // Position with cost (lot)
/// let lot = Position::with_cost(
///     Amount::new(dec!(10), "X"),
///     Cost::new(dec!(10.00), "GBP"),
/// );
/// assert!(lot.cost.is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// The units held (number + instrument currency)
    pub units: Amount,
    /// The cost basis (if tracked)
    pub cost: Option<Cost>,
}

impl Position {
    /// Create a new position without cost tracking.
    #[must_use]
    pub const fn simple(units: Amount) -> Self {
        Self { units, cost: None }
    }

    /// Create a new position with cost tracking.
    #[must_use]
    pub const fn with_cost(units: Amount, cost: Cost) -> Self {
        Self {
            units,
            cost: Some(cost),
        }
    }

    /// Check if this position is empty (zero units).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.units.is_zero()
    }

    /// Get the instrument currency of this position's units.
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.units.currency
    }

    /// Get the cost currency, if this position has a cost.
    #[must_use]
    pub fn cost_currency(&self) -> Option<&str> {
        self.cost.as_ref().map(|c| c.currency.as_str())
    }

    /// Calculate the book value (total cost) of this position.
    ///
    /// Returns `None` if there is no cost.
    #[must_use]
    pub fn book_value(&self) -> Option<Amount> {
        self.cost.as_ref().map(|c| c.total_cost(self.units.number))
    }

    /// Negate this position (reverse the sign of units, same lot).
    #[must_use]
    pub fn neg(&self) -> Self {
        Self {
            units: -&self.units,
            cost: self.cost.clone(),
        }
    }

    /// Check whether another position belongs to the same lot.
    ///
    /// Two positions share a lot when both the instrument currency and the
    /// full cost (number, currency, date, label) are equal.
    #[must_use]
    pub fn same_lot(&self, other: &Self) -> bool {
        self.units.currency == other.units.currency && self.cost == other.cost
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.units)?;
        if let Some(cost) = &self.cost {
            write!(f, " {cost}")?;
        }
        Ok(())
    }
}
