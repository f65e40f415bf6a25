//! The capital-gains pass.
//!
//! Scans the entry stream for trades on the tracked holding accounts, costs
//! each holding's trade history with its configured costing method, and
//! rewrites the original entries so the recorded cost basis matches the
//! computed basis: the realizing posting's lot price is corrected and a
//! counter-posting on the configured equity account keeps the transaction
//! balanced.
//!
//! With `lots_adjust` enabled for an account, the pass additionally keeps
//! that account's position inventory single-lot: on every trade the existing
//! lots are liquidated with paired postings and one blended lot carrying the
//! whole holding is reissued in their place.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::{debug, trace};

use costbasis_core::{Amount, Cost, CostSpec, Directive, Inventory, MetaValue, Position, Posting};

use crate::config::GainsConfig;
use crate::error::{ConfigError, PassError};
use crate::method::{Adjustment, CostMethod, CostingError};
use crate::pass::{LedgerPass, PassOutput};
use crate::trade::{HoldingLedger, InstrumentHistory, PostingRef};

/// Metadata key carried by every counter-posting the pass emits.
const PROVENANCE_KEY: &str = "note";
/// Provenance note for the plain price-correcting counter-posting.
const PART_ADJUST: &str = "part_adjust";
/// Provenance note for the lot-adjusting (liquidate-and-reissue) variant.
const FULL_ADJUSTMENT: &str = "full_adjustment";

/// Per-account rule resolved from configuration.
#[derive(Debug, Clone)]
struct AccountRule {
    method: CostMethod,
    counter_account: Option<String>,
    lots_adjust: bool,
}

/// The capital-gains pass.
///
/// Constructed from a [`GainsConfig`]; an unknown costing method is a fatal
/// configuration error raised before any entry is processed.
pub struct CapitalGainsPass {
    accounts: BTreeMap<String, AccountRule>,
}

impl CapitalGainsPass {
    /// Create the pass from a parsed configuration.
    pub fn new(config: GainsConfig) -> Result<Self, ConfigError> {
        let mut accounts = BTreeMap::new();
        for (account, cfg) in config.accounts {
            let method: CostMethod =
                cfg.method
                    .parse()
                    .map_err(|_| ConfigError::UnknownMethod {
                        account: account.clone(),
                        method: cfg.method.clone(),
                        known: CostMethod::known_names().to_string(),
                    })?;
            accounts.insert(
                account,
                AccountRule {
                    method,
                    counter_account: cfg.counter_account,
                    lots_adjust: cfg.lots_adjust,
                },
            );
        }
        Ok(Self { accounts })
    }

    /// Create the pass from the host-supplied JSON configuration string.
    pub fn from_config_str(config: &str) -> Result<Self, ConfigError> {
        Self::new(serde_json::from_str(config)?)
    }
}

impl LedgerPass for CapitalGainsPass {
    fn name(&self) -> &str {
        "capital_gains"
    }

    fn process(&self, entries: Vec<Directive>) -> PassOutput {
        debug!(
            entries = entries.len(),
            accounts = self.accounts.len(),
            "running capital gains pass"
        );
        let mut errors = Vec::new();

        // Collect the trading histories.
        let mut ledgers: BTreeMap<String, HoldingLedger> = BTreeMap::new();
        for (index, entry) in entries.iter().enumerate() {
            let Some(txn) = entry.as_transaction() else {
                continue;
            };
            for (posting_index, posting) in txn.postings.iter().enumerate() {
                if !self.accounts.contains_key(&posting.account) {
                    continue;
                }
                // Without cost or price this leg is not a trade of interest.
                if posting.cost.is_none() && posting.price.is_none() {
                    continue;
                }
                if posting.cost.is_none() {
                    errors.push(
                        PassError::error(format!(
                            "posting on {} in {} has a price but no cost",
                            txn.date, posting.account
                        ))
                        .with_date(txn.date)
                        .with_context(posting.account.clone()),
                    );
                    continue;
                }
                let ledger = ledgers
                    .entry(posting.account.clone())
                    .or_insert_with(|| HoldingLedger::new(posting.account.clone()));
                let posting_ref = PostingRef {
                    entry: index,
                    posting: posting_index,
                };
                if let Err(err) = ledger.record(posting_ref, txn, posting) {
                    errors.push(err);
                }
            }
        }

        // Cost each holding and apply the corrections.
        let mut entries = entries;
        for (account, ledger) in &ledgers {
            let rule = &self.accounts[account];
            for (instrument, history) in ledger.instruments() {
                match rule.method.cost(history.trades()) {
                    Ok(adjustments) => {
                        trace!(
                            %account,
                            %instrument,
                            adjustments = adjustments.len(),
                            "costed holding"
                        );
                        match &rule.counter_account {
                            Some(counter_account) if rule.lots_adjust => apply_lot_adjusting(
                                &mut entries,
                                account,
                                counter_account,
                                instrument,
                                history,
                                &adjustments,
                            ),
                            _ => apply_adjustments(
                                &mut entries,
                                account,
                                rule.counter_account.as_deref(),
                                history,
                                &adjustments,
                                &mut errors,
                            ),
                        }
                    }
                    Err(err) => {
                        let date = match &err {
                            CostingError::NoUnitHistory { date } => *date,
                        };
                        errors.push(
                            PassError::error(err.to_string())
                                .with_date(date)
                                .with_context(format!("{account} {instrument}")),
                        );
                    }
                }
            }
        }

        PassOutput { entries, errors }
    }
}

/// Apply adjustments by correcting the recorded lot price in place.
///
/// When no counter account is configured the mismatch is reported instead
/// and the entry keeps its stale price.
fn apply_adjustments(
    entries: &mut [Directive],
    account: &str,
    counter_account: Option<&str>,
    history: &InstrumentHistory,
    adjustments: &[Adjustment],
    errors: &mut Vec<PassError>,
) {
    for adjustment in adjustments {
        let Some(counter_account) = counter_account else {
            if let Some(txn) = entries[adjustment.posting_ref.entry].as_transaction() {
                errors.push(
                    PassError::warning(format!(
                        "transaction on {} (\"{}\") records a cost basis differing from \
                         the average cost {} for {}, but no counter account is configured",
                        txn.date, txn.narration, adjustment.price, account
                    ))
                    .with_date(txn.date)
                    .with_context(account.to_string()),
                );
            }
            continue;
        };

        let Some(txn) = entries[adjustment.posting_ref.entry].as_transaction_mut() else {
            continue;
        };
        if let Some(cost) = txn
            .postings
            .get_mut(adjustment.posting_ref.posting)
            .and_then(|posting| posting.cost.as_mut())
        {
            cost.number_per = Some(adjustment.price);
            cost.number_total = None;
        }
        if !adjustment.counter_amount.is_zero() {
            txn.postings.push(
                Posting::new(
                    counter_account,
                    Amount::new(adjustment.counter_amount, history.cost_currency.clone()),
                )
                .with_meta(PROVENANCE_KEY, MetaValue::String(PART_ADJUST.to_string())),
            );
        }
    }
}

/// Apply adjustments while keeping the account inventory single-lot.
///
/// Every trade liquidates the previously held lot and reissues one blended
/// lot carrying the whole holding at its true total cost. The counter
/// amount is the plain reclassification `(recorded - effective) * quantity`:
/// the liquidate/reissue pair removes cost `C` and reintroduces
/// `C + quantity * effective_price`, so it is cost-neutral and contributes
/// nothing to the counter-posting.
fn apply_lot_adjusting(
    entries: &mut [Directive],
    account: &str,
    counter_account: &str,
    instrument: &str,
    history: &InstrumentHistory,
    adjustments: &[Adjustment],
) {
    let mut pending = adjustments.iter().peekable();
    let mut inventory = Inventory::new();

    for trade in history.trades() {
        let adjustment = match pending.peek() {
            Some(a) if a.posting_ref == trade.posting_ref => pending.next(),
            _ => None,
        };
        // Realizing trades with no adjustment were already recorded at the
        // average; everything else is carried at its recorded price.
        let effective_price = adjustment.map_or(trade.unit_price, |a| a.price);

        let Some(txn) = entries[trade.posting_ref.entry].as_transaction_mut() else {
            continue;
        };
        let date = txn.date;

        // Liquidate the existing holding into this transaction.
        let mut liquidated_units = Decimal::ZERO;
        let mut liquidated_cost = Decimal::ZERO;
        for position in inventory.nonzero_positions() {
            let Some(cost) = &position.cost else {
                continue;
            };
            liquidated_cost += cost.number * position.units.number;
            liquidated_units += position.units.number;
            txn.postings
                .push(Posting::new(account, -&position.units).with_cost(CostSpec::from(cost)));
        }
        inventory = Inventory::new();

        // Reissue one blended lot carrying the whole holding.
        let new_units = liquidated_units + trade.quantity;
        let new_total_cost = liquidated_cost + trade.quantity * effective_price;
        let new_price = if new_units.is_zero() {
            effective_price
        } else {
            new_total_cost / new_units
        };

        if let Some(posting) = txn.postings.get_mut(trade.posting_ref.posting) {
            posting.units = Some(Amount::new(new_units, instrument));
            if let Some(cost) = posting.cost.as_mut() {
                cost.number_per = Some(new_price);
                cost.number_total = None;
                cost.date = Some(date);
            }
        }
        inventory.add(Position::with_cost(
            Amount::new(new_units, instrument),
            Cost::new(new_price, history.cost_currency.clone()).with_date(date),
        ));

        let counter_amount = (trade.unit_price - effective_price) * trade.quantity;
        if !counter_amount.is_zero() {
            txn.postings.push(
                Posting::new(
                    counter_account,
                    Amount::new(counter_amount, history.cost_currency.clone()),
                )
                .with_meta(
                    PROVENANCE_KEY,
                    MetaValue::String(FULL_ADJUSTMENT.to_string()),
                ),
            );
        }
    }
}
