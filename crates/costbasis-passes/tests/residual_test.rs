//! Integration tests for the residual-lot clearing pass.

use chrono::NaiveDate;
use costbasis_core::{
    Amount, Close, CostSpec, Directive, Inventory, Open, Posting, Transaction,
};
use costbasis_passes::{ConfigError, LedgerPass, ResidualLotClearPass};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn pass() -> ResidualLotClearPass {
    ResidualLotClearPass::new("Equity:Gains").unwrap()
}

fn investment_txn(
    txn_date: NaiveDate,
    narration: &str,
    quantity: Decimal,
    price: Decimal,
) -> Directive {
    Directive::Transaction(
        Transaction::new(txn_date, narration)
            .with_posting(
                Posting::new("Assets:Investments", Amount::new(quantity, "TEST")).with_cost(
                    CostSpec::empty()
                        .with_number_per(price)
                        .with_currency("USD"),
                ),
            )
            .with_posting(Posting::new(
                "Assets:Cash",
                Amount::new(-(quantity * price), "USD"),
            )),
    )
}

/// A closed account whose disposal never matched the purchase lot: both
/// residual lots must be cancelled pairwise against the write-down account.
#[test]
fn test_simple_residual_clear() {
    let entries = vec![
        Directive::Open(Open::new(date(2023, 1, 15), "Assets:Investments")),
        Directive::Open(Open::new(date(2023, 1, 15), "Equity:Gains")),
        investment_txn(date(2023, 1, 15), "Buy TEST", dec!(10), dec!(100.00)),
        investment_txn(date(2023, 6, 15), "Sell TEST", dec!(-10), dec!(120.00)),
        Directive::Close(Close::new(date(2024, 1, 1), "Assets:Investments")),
    ];

    let output = pass().process(entries);

    assert!(output.errors.is_empty());
    assert_eq!(output.entries.len(), 6);

    let generated = output.entries[5].as_transaction().unwrap();
    assert_eq!(
        generated.narration,
        "Automatically clear residual lots from closed account: Assets:Investments"
    );
    // Dated the day before closure.
    assert_eq!(generated.date, date(2023, 12, 31));

    assert_eq!(generated.postings.len(), 4);
    assert_eq!(generated.postings[0].account, "Assets:Investments");
    assert_eq!(
        generated.postings[0].units,
        Some(Amount::new(dec!(-10), "TEST"))
    );
    assert_eq!(
        generated.postings[0].cost.as_ref().unwrap().number_per,
        Some(dec!(100.00))
    );
    assert_eq!(generated.postings[1].account, "Equity:Gains");
    assert_eq!(
        generated.postings[1].units,
        Some(Amount::new(dec!(10), "TEST"))
    );
    assert_eq!(generated.postings[2].account, "Assets:Investments");
    assert_eq!(
        generated.postings[2].units,
        Some(Amount::new(dec!(10), "TEST"))
    );
    assert_eq!(
        generated.postings[2].cost.as_ref().unwrap().number_per,
        Some(dec!(120.00))
    );
    assert_eq!(generated.postings[3].account, "Equity:Gains");
    assert_eq!(
        generated.postings[3].units,
        Some(Amount::new(dec!(-10), "TEST"))
    );
}

#[test]
fn test_cleared_inventory_nets_to_zero() {
    let entries = vec![
        investment_txn(date(2023, 1, 15), "Buy TEST", dec!(10), dec!(100.00)),
        investment_txn(date(2023, 6, 15), "Sell TEST", dec!(-10), dec!(120.00)),
        Directive::Close(Close::new(date(2024, 1, 1), "Assets:Investments")),
    ];

    let output = pass().process(entries);

    // Replay every posting on the account, including the generated
    // balancing pair: every lot must net out.
    let mut inventory = Inventory::new();
    for entry in &output.entries {
        let Some(txn) = entry.as_transaction() else {
            continue;
        };
        for posting in &txn.postings {
            if posting.account != "Assets:Investments" {
                continue;
            }
            let units = posting.units.clone().unwrap();
            let cost = posting
                .cost
                .as_ref()
                .and_then(|spec| spec.resolve(units.number, txn.date));
            inventory.add_amount(units, cost);
        }
    }
    assert!(inventory.is_empty());
}

#[test]
fn test_matching_lots_net_out_and_skip_account() {
    // Disposal recorded against the exact purchase lot (same price, same
    // lot date): nothing residual.
    let sell = Directive::Transaction(
        Transaction::new(date(2023, 6, 15), "Sell TEST")
            .with_posting(
                Posting::new("Assets:Investments", Amount::new(dec!(-10), "TEST")).with_cost(
                    CostSpec::empty()
                        .with_number_per(dec!(100.00))
                        .with_currency("USD")
                        .with_date(date(2023, 1, 15)),
                ),
            )
            .with_posting(Posting::new(
                "Assets:Cash",
                Amount::new(dec!(1000.00), "USD"),
            )),
    );
    let entries = vec![
        investment_txn(date(2023, 1, 15), "Buy TEST", dec!(10), dec!(100.00)),
        sell,
        Directive::Close(Close::new(date(2024, 1, 1), "Assets:Investments")),
    ];

    let output = pass().process(entries.clone());

    assert!(output.errors.is_empty());
    assert_eq!(output.entries, entries);
}

#[test]
fn test_no_closed_accounts_is_a_no_op() {
    let entries = vec![
        investment_txn(date(2023, 1, 15), "Buy TEST", dec!(10), dec!(100.00)),
        investment_txn(date(2023, 6, 15), "Sell TEST", dec!(-10), dec!(120.00)),
    ];

    let output = pass().process(entries.clone());

    assert!(output.errors.is_empty());
    assert_eq!(output.entries, entries);
}

#[test]
fn test_open_accounts_not_touched() {
    // Only Assets:Investments is closed; the other account keeps its lots.
    let other = Directive::Transaction(
        Transaction::new(date(2023, 2, 1), "Buy elsewhere").with_posting(
            Posting::new("Assets:Other", Amount::new(dec!(5), "TEST")).with_cost(
                CostSpec::empty()
                    .with_number_per(dec!(50.00))
                    .with_currency("USD"),
            ),
        ),
    );
    let entries = vec![
        investment_txn(date(2023, 1, 15), "Buy TEST", dec!(10), dec!(100.00)),
        other,
        Directive::Close(Close::new(date(2024, 1, 1), "Assets:Investments")),
    ];

    let output = pass().process(entries);

    assert_eq!(output.entries.len(), 4);
    let generated = output.entries[3].as_transaction().unwrap();
    assert!(generated
        .postings
        .iter()
        .all(|p| p.account != "Assets:Other"));
}

#[test]
fn test_missing_write_down_account_is_fatal() {
    assert!(matches!(
        ResidualLotClearPass::new(""),
        Err(ConfigError::MissingWriteDownAccount)
    ));
}
