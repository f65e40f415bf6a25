//! Trade records and per-holding trade histories.
//!
//! A [`Trade`] is one posting's effect on a holding's position in one
//! instrument. The [`HoldingLedger`] validates postings on a tracked account
//! as they stream past in entry order, classifies each as realizing or not
//! against the running balance, and accumulates the ordered history that the
//! costing method consumes.

use chrono::NaiveDate;
use costbasis_core::{Posting, Transaction};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::error::PassError;

/// Locator for one posting within the entry list: which entry, and which
/// posting within it. Used to rewrite exactly that posting later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PostingRef {
    /// Index of the entry in the entry list.
    pub entry: usize,
    /// Index of the posting within the entry's postings.
    pub posting: usize,
}

/// A trade in an instrument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trade {
    /// Locator of the posting this trade was extracted from.
    pub posting_ref: PostingRef,
    /// Date of the trade (the transaction date).
    pub date: NaiveDate,
    /// Signed units held immediately before this trade.
    pub balance_before: Decimal,
    /// Signed units traded: positive acquires, negative disposes.
    pub quantity: Decimal,
    /// Recorded cost per unit, in the holding's cost currency.
    pub unit_price: Decimal,
    /// `quantity * unit_price`.
    pub consideration: Decimal,
    /// Whether this trade moves the balance strictly toward zero.
    pub is_realizing: bool,
}

/// Ordered trade history for one (account, instrument) pair.
#[derive(Debug, Clone)]
pub struct InstrumentHistory {
    /// Cost currency shared by every trade in this history.
    pub cost_currency: String,
    balance: Decimal,
    trades: Vec<Trade>,
}

impl InstrumentHistory {
    fn new(cost_currency: String) -> Self {
        Self {
            cost_currency,
            balance: Decimal::ZERO,
            trades: Vec::new(),
        }
    }

    /// The trades recorded so far, in entry order.
    #[must_use]
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    /// The running balance after all recorded trades.
    #[must_use]
    pub const fn balance(&self) -> Decimal {
        self.balance
    }
}

/// Per-account aggregation of trade histories, keyed by instrument.
///
/// One tracked account may hold multiple instruments; each gets its own
/// independent history and running balance. Instruments iterate in sorted
/// order so downstream rewriting is deterministic.
#[derive(Debug)]
pub(crate) struct HoldingLedger {
    account: String,
    instruments: BTreeMap<String, InstrumentHistory>,
}

impl HoldingLedger {
    pub(crate) fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            instruments: BTreeMap::new(),
        }
    }

    /// Validate a posting on this account and record it as a trade.
    ///
    /// On success the instrument's running balance is advanced; on failure
    /// nothing is recorded and the posting is skipped by the caller.
    pub(crate) fn record(
        &mut self,
        posting_ref: PostingRef,
        txn: &Transaction,
        posting: &Posting,
    ) -> Result<(), PassError> {
        let report = |message: String| {
            PassError::error(message)
                .with_date(txn.date)
                .with_context(self.account.clone())
        };

        let Some(cost) = &posting.cost else {
            return Err(report(format!(
                "posting on {} in {} has no cost",
                txn.date, self.account
            )));
        };
        let Some(units) = &posting.units else {
            return Err(report(format!(
                "posting on {} in {} has no units",
                txn.date, self.account
            )));
        };

        let Some(cost_currency) = &cost.currency else {
            return Err(report(format!(
                "cost {cost} on {} in {} has no currency",
                txn.date, self.account
            )));
        };

        // All trades of one instrument within an account must settle in the
        // same cost currency.
        if let Some(history) = self.instruments.get(&units.currency) {
            if &history.cost_currency != cost_currency {
                return Err(report(format!(
                    "account {} has inconsistent cost currencies for {}: {} and {}",
                    self.account, units.currency, history.cost_currency, cost_currency
                )));
            }
        }

        // Only same-day cost lots are supported.
        if let Some(cost_date) = cost.date {
            if cost_date != txn.date {
                return Err(report(format!(
                    "cost date {cost_date} is different from transaction date {}",
                    txn.date
                )));
            }
        }

        let Some(unit_price) = cost.unit_price(units.number) else {
            return Err(report(format!("cost {cost} has no price")));
        };

        let history = self
            .instruments
            .entry(units.currency.clone())
            .or_insert_with(|| InstrumentHistory::new(cost_currency.clone()));

        // Realizing iff the trade moves a nonzero balance strictly toward
        // zero. A zero balance never realizes.
        let balance = history.balance;
        let is_realizing = (balance > Decimal::ZERO && units.number < Decimal::ZERO)
            || (balance < Decimal::ZERO && units.number > Decimal::ZERO);

        history.trades.push(Trade {
            posting_ref,
            date: txn.date,
            balance_before: balance,
            quantity: units.number,
            unit_price,
            consideration: units.number * unit_price,
            is_realizing,
        });
        history.balance = balance + units.number;

        Ok(())
    }

    /// Iterate the recorded histories in instrument order.
    pub(crate) fn instruments(&self) -> impl Iterator<Item = (&str, &InstrumentHistory)> {
        self.instruments.iter().map(|(k, v)| (k.as_str(), v))
    }
}
