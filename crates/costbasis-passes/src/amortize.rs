//! The amortization pass.
//!
//! Spreads a lump expense (a yearly subscription, an insurance premium) over
//! a configured number of months. Each matching posting is reversed
//! immediately into an equity holding account, and its amount is divided
//! into month-end installments whose sum equals the original amount exactly:
//! rounding error is pushed forward through the schedule, never dropped.
//!
//! Postings sharing a tag and currency are aggregated into one installment
//! transaction per month.

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;

use costbasis_core::{Amount, Directive, Posting, Transaction};

use crate::config::AmortizeConfig;
use crate::error::{ConfigError, PassError};
use crate::pass::{LedgerPass, PassOutput};

/// Per-account rule resolved from configuration.
#[derive(Debug, Clone)]
struct AmortizeRule {
    holding_account: String,
    months: u32,
    decimals: u32,
}

/// The amortization pass.
///
/// Constructed from an [`AmortizeConfig`]; a non-expense account or a
/// zero-month term is a fatal configuration error.
pub struct AmortizePass {
    accounts: BTreeMap<String, AmortizeRule>,
}

impl AmortizePass {
    /// Create the pass from a parsed configuration.
    pub fn new(config: AmortizeConfig) -> Result<Self, ConfigError> {
        let mut accounts = BTreeMap::new();
        for (account, cfg) in config.accounts {
            let Some(leaf) = account.strip_prefix("Expenses:") else {
                return Err(ConfigError::NonExpenseAccount(account));
            };
            if cfg.months == 0 {
                return Err(ConfigError::InvalidTerm(account, cfg.months));
            }
            let holding_account = format!("Equity:Amortization:{leaf}");
            accounts.insert(
                account,
                AmortizeRule {
                    holding_account,
                    months: cfg.months,
                    decimals: cfg.decimals,
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

impl LedgerPass for AmortizePass {
    fn name(&self) -> &str {
        "amortize"
    }

    fn process(&self, entries: Vec<Directive>) -> PassOutput {
        debug!(
            entries = entries.len(),
            accounts = self.accounts.len(),
            "running amortization pass"
        );
        let mut errors = Vec::new();
        let mut appended: Vec<Directive> = Vec::new();

        for (expense_account, rule) in &self.accounts {
            // (tag, currency) -> installment date -> aggregated amount
            let mut cashflows: BTreeMap<(String, String), BTreeMap<NaiveDate, Decimal>> =
                BTreeMap::new();

            for entry in &entries {
                let Some(txn) = entry.as_transaction() else {
                    continue;
                };
                for posting in &txn.postings {
                    if &posting.account != expense_account {
                        continue;
                    }
                    if txn.tags.len() > 1 {
                        errors.push(
                            PassError::error("must be zero or one tag only")
                                .with_date(txn.date)
                                .with_context(txn.narration.clone()),
                        );
                        continue;
                    }
                    let Some(units) = &posting.units else {
                        errors.push(
                            PassError::error("cannot amortize a posting without units")
                                .with_date(txn.date)
                                .with_context(txn.narration.clone()),
                        );
                        continue;
                    };
                    let tag = txn.tags.first().cloned().unwrap_or_default();

                    // Immediately reverse the original expense.
                    let mut reversal = Transaction::new(
                        txn.date,
                        format!("Reverse original expense for {expense_account}"),
                    )
                    .with_payee("Amortization");
                    reversal.tags = txn.tags.clone();
                    reversal.tags.push("amort-internal".to_string());
                    reversal.postings = vec![
                        Posting::new(expense_account.clone(), -units),
                        Posting::new(rule.holding_account.clone(), units.clone()),
                    ];
                    appended.push(Directive::Transaction(reversal));

                    // Divide across the term, pushing rounding error forward
                    // so the installments sum to the amount exactly.
                    let flows = cashflows
                        .entry((tag, units.currency.clone()))
                        .or_default();
                    let mut remaining = units.number;
                    for month in 0..rule.months {
                        let installment = (remaining / Decimal::from(rule.months - month))
                            .round_dp(rule.decimals);
                        let Some(installment_date) = txn
                            .date
                            .checked_add_months(Months::new(month))
                            .map(month_end)
                        else {
                            errors.push(
                                PassError::error("amortization schedule exceeds the calendar")
                                    .with_date(txn.date)
                                    .with_context(txn.narration.clone()),
                            );
                            break;
                        };
                        *flows.entry(installment_date).or_default() += installment;
                        remaining -= installment;
                    }
                }
            }

            // Emit the aggregated installment transactions.
            for ((tag, currency), flows) in cashflows {
                let mut narration = "Amortization Adjustment".to_string();
                if !tag.is_empty() {
                    narration.push_str(&format!(" for {tag}"));
                }
                for (date, amount) in flows {
                    if amount.is_zero() {
                        continue;
                    }
                    let mut installment =
                        Transaction::new(date, narration.clone()).with_payee("Amortized");
                    if !tag.is_empty() {
                        installment.tags.push(tag.clone());
                    }
                    installment.tags.push("amort".to_string());
                    installment.postings = vec![
                        Posting::new(
                            expense_account.clone(),
                            Amount::new(amount, currency.clone()),
                        ),
                        Posting::new(
                            rule.holding_account.clone(),
                            Amount::new(-amount, currency.clone()),
                        ),
                    ];
                    appended.push(Directive::Transaction(installment));
                }
            }
        }

        let mut entries = entries;
        entries.extend(appended);
        PassOutput { entries, errors }
    }
}

/// The last day of the given date's month.
fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = (date.year(), date.month());
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(date)
}
