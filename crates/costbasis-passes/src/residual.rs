//! The residual-lot clearing pass.
//!
//! Under lot-imprecise booking, disposals do not reduce the original
//! purchase lots, so a closed account can be left holding a list of residual
//! lots even when its net position is zero. This pass nets those lots out:
//!
//! 1. find every account with a close directive;
//! 2. accumulate a running inventory of every lot ever posted to it;
//! 3. for each closed account whose final inventory is non-empty, append one
//!    balancing transaction dated the day before closure whose postings
//!    cancel every remaining lot against a configured write-down account.
//!
//! The balancing transaction is appended to the entry list; callers re-sort
//! when date ordering matters downstream.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::debug;

use costbasis_core::{CostSpec, Directive, Inventory, Posting, Transaction};

use crate::error::ConfigError;
use crate::pass::{LedgerPass, PassOutput};

/// The residual-lot clearing pass.
pub struct ResidualLotClearPass {
    write_down_account: String,
}

impl ResidualLotClearPass {
    /// Create the pass with the account residual lots are written down
    /// against. An empty account name is a fatal configuration error.
    pub fn new(write_down_account: impl Into<String>) -> Result<Self, ConfigError> {
        let write_down_account = write_down_account.into();
        if write_down_account.is_empty() {
            return Err(ConfigError::MissingWriteDownAccount);
        }
        Ok(Self { write_down_account })
    }
}

impl LedgerPass for ResidualLotClearPass {
    fn name(&self) -> &str {
        "clear_residual_lots"
    }

    fn process(&self, entries: Vec<Directive>) -> PassOutput {
        debug!(entries = entries.len(), "running residual lot clearing");

        // Find all closed accounts.
        let mut closed: BTreeMap<String, NaiveDate> = BTreeMap::new();
        for entry in &entries {
            if let Directive::Close(close) = entry {
                closed.insert(close.account.clone(), close.date);
            }
        }

        // Nothing closed -- nothing to do.
        if closed.is_empty() {
            return PassOutput {
                entries,
                errors: Vec::new(),
            };
        }

        // Accumulate the residual inventory of every closed account.
        let mut inventories: BTreeMap<String, Inventory> = BTreeMap::new();
        for entry in &entries {
            let Some(txn) = entry.as_transaction() else {
                continue;
            };
            for posting in &txn.postings {
                if !closed.contains_key(&posting.account) {
                    continue;
                }
                let Some(units) = &posting.units else {
                    continue;
                };
                let cost = posting
                    .cost
                    .as_ref()
                    .and_then(|spec| spec.resolve(units.number, txn.date));
                inventories
                    .entry(posting.account.clone())
                    .or_default()
                    .add_amount(units.clone(), cost);
            }
        }

        // Generate balancing transactions for accounts with residuals.
        let mut entries = entries;
        for (account, inventory) in &inventories {
            if inventory.is_empty() {
                continue;
            }

            let mut postings = Vec::new();
            for position in inventory.nonzero_positions() {
                let cost_spec = position.cost.as_ref().map(CostSpec::from);
                let mut negate = Posting::new(account.clone(), -&position.units);
                let mut mirror =
                    Posting::new(self.write_down_account.clone(), position.units.clone());
                if let Some(spec) = cost_spec {
                    negate = negate.with_cost(spec.clone());
                    mirror = mirror.with_cost(spec);
                }
                postings.push(negate);
                postings.push(mirror);
            }
            if postings.is_empty() {
                continue;
            }

            let close_date = closed[account];
            let balancing_date = close_date.pred_opt().unwrap_or(close_date);
            let mut balancing = Transaction::new(
                balancing_date,
                format!("Automatically clear residual lots from closed account: {account}"),
            );
            balancing.postings = postings;
            entries.push(Directive::Transaction(balancing));
        }

        PassOutput {
            entries,
            errors: Vec::new(),
        }
    }
}
