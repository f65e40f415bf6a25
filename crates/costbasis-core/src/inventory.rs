//! Inventory type representing a collection of positions.
//!
//! An [`Inventory`] tracks an account's holdings as a collection of
//! [`Position`]s, merged by lot: adding units with the same instrument and
//! the same cost accumulates into one position, so a purchase and a matching
//! disposal net to zero. This is the accumulation structure behind the
//! residual-lot clearer and the lot-adjusting gains variant.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Amount, Position};

/// An inventory is a collection of positions, merged by lot key.
///
/// The lot key is the pair (instrument currency, cost). Positions whose key
/// matches an existing position are summed into it; everything else is kept
/// as a separate lot. Positions that net to zero stay in the collection but
/// are skipped by [`Inventory::nonzero_positions`] and by
/// [`Inventory::is_empty`].
///
/// # Examples
///
/// ```
/// use costbasis_core::{Amount, Cost, Inventory, Position};
/// use rust_decimal_macros::dec;
///
/// let mut inv = Inventory::new();
/// let cost = Cost::new(dec!(100.00), "USD");
///
/// inv.add(Position::with_cost(Amount::new(dec!(10), "TEST"), cost.clone()));
/// inv.add(Position::with_cost(Amount::new(dec!(-10), "TEST"), cost));
///
/// // The two postings share a lot and net out.
/// assert!(inv.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    positions: Vec<Position>,
}

impl Inventory {
    /// Create an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all positions, including ones that have netted to zero.
    #[must_use]
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Iterate over positions with nonzero units.
    pub fn nonzero_positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.iter().filter(|p| !p.is_empty())
    }

    /// Check if the inventory nets to empty (no nonzero positions).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.iter().all(Position::is_empty)
    }

    /// Get total units of an instrument across all lots.
    #[must_use]
    pub fn units(&self, currency: &str) -> Decimal {
        self.positions
            .iter()
            .filter(|p| p.units.currency == currency)
            .map(|p| p.units.number)
            .sum()
    }

    /// Get all instrument currencies with a nonzero holding.
    #[must_use]
    pub fn currencies(&self) -> Vec<&str> {
        let mut currencies: Vec<&str> = self
            .nonzero_positions()
            .map(|p| p.units.currency.as_str())
            .collect();
        currencies.sort_unstable();
        currencies.dedup();
        currencies
    }

    /// Add a position to the inventory, merging by lot key.
    ///
    /// A position whose (instrument, cost) pair matches an existing one is
    /// summed into it; otherwise it is appended as a new lot. Zero-unit
    /// positions are ignored.
    pub fn add(&mut self, position: Position) {
        if position.is_empty() {
            return;
        }

        for existing in &mut self.positions {
            if existing.same_lot(&position) {
                existing.units += &position.units;
                return;
            }
        }

        self.positions.push(position);
    }

    /// Add a posting-shaped (units, cost) pair to the inventory.
    pub fn add_amount(&mut self, units: Amount, cost: Option<crate::Cost>) {
        let position = match cost {
            Some(cost) => Position::with_cost(units, cost),
            None => Position::simple(units),
        };
        self.add(position);
    }
}

impl fmt::Display for Inventory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for pos in self.nonzero_positions() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{pos}")?;
            first = false;
        }
        Ok(())
    }
}
