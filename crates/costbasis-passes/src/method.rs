//! Costing methods: mapping an ordered trade history to adjustments.
//!
//! A costing method is a pure function from one holding's ordered trade
//! history to the list of cost-basis corrections its realizing trades need.
//! [`CostMethod::Average`] is the reference implementation; further methods
//! (FIFO, LIFO, specific-lot) would implement the same contract as new
//! variants.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::trade::{PostingRef, Trade};

/// A cost-basis correction for one realizing trade.
///
/// Emitted only when the recorded unit price differs from the price the
/// costing method computes; a trade already recorded at the computed price
/// needs no adjustment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adjustment {
    /// Locator of the posting to rewrite.
    pub posting_ref: PostingRef,
    /// Corrected cost per unit: the method's cost at the moment of
    /// realization.
    pub price: Decimal,
    /// Signed difference between the recorded consideration and the
    /// method-costed consideration: `(recorded_price - price) * quantity`,
    /// in the holding's cost currency.
    pub counter_amount: Decimal,
}

/// A numeric impossibility encountered by a costing method.
///
/// Unlike per-posting validation failures this indicates unrecoverable
/// ledger corruption and fails the whole holding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CostingError {
    /// A realizing trade was found with no units in the preceding history,
    /// so there is no cost to average.
    #[error("average cost method requires a prior unit history, but the trade on {date} realizes against zero held units")]
    NoUnitHistory {
        /// Date of the offending trade.
        date: NaiveDate,
    },
}

/// The set of supported costing methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CostMethod {
    /// Weighted-average cost over the full acquisition history.
    #[default]
    Average,
}

impl CostMethod {
    /// Comma-separated list of recognized method names.
    #[must_use]
    pub const fn known_names() -> &'static str {
        "cost_avg"
    }

    /// Compute the adjustments for one ordered trade history.
    ///
    /// A single left-to-right scan with no look-ahead: each realizing
    /// trade is costed against strictly preceding trades only.
    pub fn cost(self, trades: &[Trade]) -> Result<Vec<Adjustment>, CostingError> {
        match self {
            Self::Average => average_cost(trades),
        }
    }
}

impl FromStr for CostMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cost_avg" => Ok(Self::Average),
            _ => Err(format!("unknown costing method: {s}")),
        }
    }
}

impl fmt::Display for CostMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Average => write!(f, "cost_avg"),
        }
    }
}

/// The average-cost method.
///
/// Maintains a running unit total and cost total. A realizing trade is
/// costed at `total_cost / total_units` over the preceding history and
/// accumulates at that average, not at its recorded price; everything else
/// accumulates at its recorded price.
fn average_cost(trades: &[Trade]) -> Result<Vec<Adjustment>, CostingError> {
    let mut total_units = Decimal::ZERO;
    let mut total_cost = Decimal::ZERO;
    let mut adjustments = Vec::new();

    for trade in trades {
        if trade.is_realizing {
            if total_units.is_zero() {
                return Err(CostingError::NoUnitHistory { date: trade.date });
            }
            let avg_price = total_cost / total_units;
            if trade.unit_price != avg_price {
                adjustments.push(Adjustment {
                    posting_ref: trade.posting_ref,
                    price: avg_price,
                    counter_amount: (trade.unit_price - avg_price) * trade.quantity,
                });
            }
            total_cost += trade.quantity * avg_price;
        } else {
            total_cost += trade.quantity * trade.unit_price;
        }
        total_units += trade.quantity;
    }

    Ok(adjustments)
}
