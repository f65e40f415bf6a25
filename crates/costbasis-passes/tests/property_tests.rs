//! Property-based tests for the costing and amortization arithmetic.
//!
//! These tests verify the value-conservation invariants hold for arbitrary
//! inputs using proptest.

use chrono::NaiveDate;
use costbasis_core::{Amount, Directive, Posting, Transaction};
use costbasis_passes::{AmortizePass, CostMethod, LedgerPass, PostingRef, Trade};
use proptest::prelude::*;
use rust_decimal::Decimal;

// ============================================================================
// Arbitrary generators
// ============================================================================

/// Nonzero trade quantities with two decimal places.
fn arb_quantity() -> impl Strategy<Value = Decimal> {
    (-5000i64..5000i64)
        .prop_filter("quantity must be nonzero", |n| *n != 0)
        .prop_map(|n| Decimal::new(n, 2))
}

/// Non-negative unit prices with two decimal places.
fn arb_price() -> impl Strategy<Value = Decimal> {
    (0i64..100_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn arb_trade_specs() -> impl Strategy<Value = Vec<(Decimal, Decimal)>> {
    prop::collection::vec((arb_quantity(), arb_price()), 1..15)
}

fn trade_date(index: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap() + chrono::Days::new(index as u64)
}

/// Chain (quantity, price) specs into a trade history the way the extractor
/// would: balances thread through and realization follows the sign rule.
fn build_trades(specs: &[(Decimal, Decimal)]) -> Vec<Trade> {
    let mut balance = Decimal::ZERO;
    specs
        .iter()
        .enumerate()
        .map(|(index, &(quantity, unit_price))| {
            let is_realizing = (balance > Decimal::ZERO && quantity < Decimal::ZERO)
                || (balance < Decimal::ZERO && quantity > Decimal::ZERO);
            let trade = Trade {
                posting_ref: PostingRef {
                    entry: index,
                    posting: 0,
                },
                date: trade_date(index),
                balance_before: balance,
                quantity,
                unit_price,
                consideration: quantity * unit_price,
                is_realizing,
            };
            balance += quantity;
            trade
        })
        .collect()
}

// ============================================================================
// Average cost properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Value conservation: every realizing trade's recorded consideration
    /// splits into its average-costed consideration plus its counter
    /// amount, so the totals balance. A non-terminating average is carried
    /// at 28 significant digits, so the comparison allows for rounding in
    /// the last digits of the 96-bit mantissa.
    #[test]
    fn prop_average_cost_conserves_value(specs in arb_trade_specs()) {
        let trades = build_trades(&specs);
        let adjustments = CostMethod::Average.cost(&trades).unwrap();

        let by_ref: std::collections::BTreeMap<_, _> = adjustments
            .iter()
            .map(|a| (a.posting_ref, a))
            .collect();

        let mut recorded = Decimal::ZERO;
        let mut reclassified = Decimal::ZERO;
        for trade in &trades {
            recorded += trade.consideration;
            match by_ref.get(&trade.posting_ref) {
                Some(adjustment) => {
                    reclassified += adjustment.price * trade.quantity + adjustment.counter_amount;
                }
                None => reclassified += trade.consideration,
            }
        }
        let drift = (recorded - reclassified).abs();
        prop_assert!(drift <= Decimal::new(1, 12), "drift {drift}");
    }

    /// Adjustments are emitted only for realizing trades, in trade order,
    /// and each corrected price is the running average over strictly
    /// preceding trades only.
    #[test]
    fn prop_adjustment_prices_match_prefix_average(specs in arb_trade_specs()) {
        let trades = build_trades(&specs);
        let adjustments = CostMethod::Average.cost(&trades).unwrap();

        // Independently fold the pool a trade at a time.
        let mut pool_units = Decimal::ZERO;
        let mut pool_cost = Decimal::ZERO;
        let mut pending = adjustments.iter().peekable();
        for trade in &trades {
            let effective_price = if trade.is_realizing {
                prop_assert!(!pool_units.is_zero());
                let average = pool_cost / pool_units;
                match pending.peek() {
                    Some(a) if a.posting_ref == trade.posting_ref => {
                        let adjustment = pending.next().unwrap();
                        prop_assert_eq!(adjustment.price, average);
                        prop_assert_ne!(trade.unit_price, average);
                        prop_assert_eq!(
                            adjustment.counter_amount,
                            (trade.unit_price - average) * trade.quantity
                        );
                    }
                    _ => prop_assert_eq!(trade.unit_price, average),
                }
                average
            } else {
                trade.unit_price
            };
            pool_cost += trade.quantity * effective_price;
            pool_units += trade.quantity;
        }
        // Every adjustment was matched to its trade.
        prop_assert!(pending.next().is_none());
    }
}

// ============================================================================
// Amortization properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// The installments of any lump sum over any term sum to the original
    /// amount exactly: rounding never creates or destroys a cent.
    #[test]
    fn prop_installments_sum_to_amount(
        cents in -10_000_000i64..10_000_000i64,
        months in 1u32..48u32,
    ) {
        let amount = Decimal::new(cents, 2);
        let pass = AmortizePass::from_config_str(&format!(
            r#"{{ "accounts": {{ "Expenses:Software": {{ "months": {months} }} }} }}"#
        ))
        .unwrap();

        let entries = vec![Directive::Transaction(
            Transaction::new(
                NaiveDate::from_ymd_opt(2023, 1, 15).unwrap(),
                "Lump expense",
            )
            .with_posting(Posting::new(
                "Expenses:Software",
                Amount::new(amount, "GBP"),
            ))
            .with_posting(Posting::new("Assets:Cash", Amount::new(-amount, "GBP"))),
        )];

        let output = pass.process(entries);
        prop_assert!(output.errors.is_empty());

        let total: Decimal = output
            .entries
            .iter()
            .filter_map(Directive::as_transaction)
            .filter(|txn| txn.payee.as_deref() == Some("Amortized"))
            .map(|txn| txn.postings[0].units.as_ref().unwrap().number)
            .sum();
        prop_assert_eq!(total, amount);
    }
}
