//! Directive types for the entry stream the passes operate on.
//!
//! The passes consume an ordered list of directives produced by the
//! surrounding ledger host. Only the directive types the passes inspect or
//! emit are modeled here:
//!
//! - [`Transaction`] - transfers between accounts, the unit of rewriting
//! - [`Open`] - opens an account for use
//! - [`Close`] - closes an account (drives residual-lot clearing)
//! - [`Balance`] - balance assertion, passed through untouched
//!
//! Postings carry complete amounts: interpolation of missing legs is the
//! host's concern and happens before a pass ever sees the entries.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::{Amount, CostSpec};

/// Metadata value types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetaValue {
    /// String value
    String(String),
    /// Account reference
    Account(String),
    /// Currency code
    Currency(String),
    /// Date value
    Date(NaiveDate),
    /// Numeric value
    Number(Decimal),
    /// Boolean value
    Bool(bool),
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "\"{s}\""),
            Self::Account(a) => write!(f, "{a}"),
            Self::Currency(c) => write!(f, "{c}"),
            Self::Date(d) => write!(f, "{d}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Metadata is a key-value map attached to directives and postings.
pub type Metadata = HashMap<String, MetaValue>;

/// A posting within a transaction.
///
/// Postings are the individual legs of a transaction: an account, the units
/// moved, and optionally a cost-lot annotation and a price annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    /// The account for this posting
    pub account: String,
    /// The units moved (absent when the host could not resolve them)
    pub units: Option<Amount>,
    /// Cost-lot annotation ({...})
    pub cost: Option<CostSpec>,
    /// Price annotation (@ or @@)
    pub price: Option<PriceAnnotation>,
    /// Whether this posting has the "!" flag
    pub flag: Option<char>,
    /// Posting metadata
    pub meta: Metadata,
}

impl Posting {
    /// Create a new posting with the given account and units.
    #[must_use]
    pub fn new(account: impl Into<String>, units: Amount) -> Self {
        Self {
            account: account.into(),
            units: Some(units),
            cost: None,
            price: None,
            flag: None,
            meta: Metadata::new(),
        }
    }

    /// Add a cost annotation.
    #[must_use]
    pub fn with_cost(mut self, cost: CostSpec) -> Self {
        self.cost = Some(cost);
        self
    }

    /// Add a price annotation.
    #[must_use]
    pub fn with_price(mut self, price: PriceAnnotation) -> Self {
        self.price = Some(price);
        self
    }

    /// Add a metadata entry.
    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: MetaValue) -> Self {
        self.meta.insert(key.into(), value);
        self
    }

    /// Check if this posting has units.
    #[must_use]
    pub const fn has_units(&self) -> bool {
        self.units.is_some()
    }
}

impl fmt::Display for Posting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  ")?;
        if let Some(flag) = self.flag {
            write!(f, "{flag} ")?;
        }
        write!(f, "{}", self.account)?;
        if let Some(units) = &self.units {
            write!(f, "  {units}")?;
        }
        if let Some(cost) = &self.cost {
            write!(f, " {cost}")?;
        }
        if let Some(price) = &self.price {
            write!(f, " {price}")?;
        }
        Ok(())
    }
}

/// Price annotation for a posting (@ or @@).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceAnnotation {
    /// Per-unit price (@)
    Unit(Amount),
    /// Total price (@@)
    Total(Amount),
}

impl PriceAnnotation {
    /// Get the annotated amount.
    #[must_use]
    pub const fn amount(&self) -> &Amount {
        match self {
            Self::Unit(a) | Self::Total(a) => a,
        }
    }

    /// Check if this is a per-unit price (@ vs @@).
    #[must_use]
    pub const fn is_unit(&self) -> bool {
        matches!(self, Self::Unit(_))
    }
}

impl fmt::Display for PriceAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit(a) => write!(f, "@ {a}"),
            Self::Total(a) => write!(f, "@@ {a}"),
        }
    }
}

/// Directive ordering priority for sorting.
///
/// When directives share a date they are ordered by type so that accounts
/// open before activity and close after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DirectivePriority {
    /// Open accounts first so they exist before use
    Open = 0,
    /// Balance assertions checked at start of day
    Balance = 1,
    /// Main entries
    Transaction = 2,
    /// Accounts closed after all activity
    Close = 3,
}

/// All directive types in the entry stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Directive {
    /// Transaction directive - records transfers between accounts
    Transaction(Transaction),
    /// Open account - opens an account for use
    Open(Open),
    /// Close account - closes an account
    Close(Close),
    /// Balance assertion - asserts an account balance at a point in time
    Balance(Balance),
}

impl Directive {
    /// Get the date of this directive.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        match self {
            Self::Transaction(t) => t.date,
            Self::Open(o) => o.date,
            Self::Close(c) => c.date,
            Self::Balance(b) => b.date,
        }
    }

    /// Get the metadata of this directive.
    #[must_use]
    pub const fn meta(&self) -> &Metadata {
        match self {
            Self::Transaction(t) => &t.meta,
            Self::Open(o) => &o.meta,
            Self::Close(c) => &c.meta,
            Self::Balance(b) => &b.meta,
        }
    }

    /// Check if this is a transaction.
    #[must_use]
    pub const fn is_transaction(&self) -> bool {
        matches!(self, Self::Transaction(_))
    }

    /// Get as a transaction, if this is one.
    #[must_use]
    pub const fn as_transaction(&self) -> Option<&Transaction> {
        match self {
            Self::Transaction(t) => Some(t),
            _ => None,
        }
    }

    /// Get as a mutable transaction, if this is one.
    pub fn as_transaction_mut(&mut self) -> Option<&mut Transaction> {
        match self {
            Self::Transaction(t) => Some(t),
            _ => None,
        }
    }

    /// Get the directive type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Transaction(_) => "transaction",
            Self::Open(_) => "open",
            Self::Close(_) => "close",
            Self::Balance(_) => "balance",
        }
    }

    /// Get the sorting priority for this directive.
    #[must_use]
    pub const fn priority(&self) -> DirectivePriority {
        match self {
            Self::Open(_) => DirectivePriority::Open,
            Self::Balance(_) => DirectivePriority::Balance,
            Self::Transaction(_) => DirectivePriority::Transaction,
            Self::Close(_) => DirectivePriority::Close,
        }
    }
}

/// Sort directives by date, then by type priority.
///
/// This is a stable sort that preserves input order for directives with the
/// same date and type. Callers re-sort after a pass has appended synthetic
/// transactions when date ordering matters downstream.
pub fn sort_directives(directives: &mut [Directive]) {
    directives.sort_by(|a, b| {
        // Primary: date ascending
        a.date()
            .cmp(&b.date())
            // Secondary: type priority
            .then_with(|| a.priority().cmp(&b.priority()))
    });
}

/// A transaction directive.
///
/// Transactions record transfers between accounts and must balance once the
/// host's validation has run; the passes preserve that property for every
/// transaction they rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction date
    pub date: NaiveDate,
    /// Transaction flag (* or !)
    pub flag: char,
    /// Payee (optional)
    pub payee: Option<String>,
    /// Narration (description)
    pub narration: String,
    /// Tags attached to this transaction
    pub tags: Vec<String>,
    /// Links attached to this transaction
    pub links: Vec<String>,
    /// Transaction metadata
    pub meta: Metadata,
    /// Postings (account entries)
    pub postings: Vec<Posting>,
}

impl Transaction {
    /// Create a new transaction.
    #[must_use]
    pub fn new(date: NaiveDate, narration: impl Into<String>) -> Self {
        Self {
            date,
            flag: '*',
            payee: None,
            narration: narration.into(),
            tags: Vec::new(),
            links: Vec::new(),
            meta: Metadata::new(),
            postings: Vec::new(),
        }
    }

    /// Set the flag.
    #[must_use]
    pub const fn with_flag(mut self, flag: char) -> Self {
        self.flag = flag;
        self
    }

    /// Set the payee.
    #[must_use]
    pub fn with_payee(mut self, payee: impl Into<String>) -> Self {
        self.payee = Some(payee.into());
        self
    }

    /// Add a tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Add a posting.
    #[must_use]
    pub fn with_posting(mut self, posting: Posting) -> Self {
        self.postings.push(posting);
        self
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ", self.date, self.flag)?;
        if let Some(payee) = &self.payee {
            write!(f, "\"{payee}\" ")?;
        }
        write!(f, "\"{}\"", self.narration)?;
        for tag in &self.tags {
            write!(f, " #{tag}")?;
        }
        for link in &self.links {
            write!(f, " ^{link}")?;
        }
        for posting in &self.postings {
            write!(f, "\n{posting}")?;
        }
        Ok(())
    }
}

/// An open account directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Open {
    /// Date account was opened
    pub date: NaiveDate,
    /// Account name (e.g., "Assets:Investments")
    pub account: String,
    /// Allowed currencies (empty = any currency allowed)
    pub currencies: Vec<String>,
    /// Booking method for this account
    pub booking: Option<String>,
    /// Metadata
    pub meta: Metadata,
}

impl Open {
    /// Create a new open directive.
    #[must_use]
    pub fn new(date: NaiveDate, account: impl Into<String>) -> Self {
        Self {
            date,
            account: account.into(),
            currencies: Vec::new(),
            booking: None,
            meta: Metadata::new(),
        }
    }

    /// Set allowed currencies.
    #[must_use]
    pub fn with_currencies(mut self, currencies: Vec<String>) -> Self {
        self.currencies = currencies;
        self
    }

    /// Set the booking method.
    #[must_use]
    pub fn with_booking(mut self, booking: impl Into<String>) -> Self {
        self.booking = Some(booking.into());
        self
    }
}

impl fmt::Display for Open {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} open {}", self.date, self.account)?;
        if !self.currencies.is_empty() {
            write!(f, " {}", self.currencies.join(","))?;
        }
        if let Some(booking) = &self.booking {
            write!(f, " \"{booking}\"")?;
        }
        Ok(())
    }
}

/// A close account directive.
///
/// Under lot-imprecise booking the account may still hold residual lots at
/// this point; the residual-lot clearer nets them out the day before.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Close {
    /// Date account was closed
    pub date: NaiveDate,
    /// Account name
    pub account: String,
    /// Metadata
    pub meta: Metadata,
}

impl Close {
    /// Create a new close directive.
    #[must_use]
    pub fn new(date: NaiveDate, account: impl Into<String>) -> Self {
        Self {
            date,
            account: account.into(),
            meta: Metadata::new(),
        }
    }
}

impl fmt::Display for Close {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} close {}", self.date, self.account)
    }
}

/// A balance assertion directive.
///
/// Asserted by the host's validation engine; the passes carry these through
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Assertion date
    pub date: NaiveDate,
    /// Account to check
    pub account: String,
    /// Expected amount
    pub amount: Amount,
    /// Tolerance (if explicitly specified)
    pub tolerance: Option<Decimal>,
    /// Metadata
    pub meta: Metadata,
}

impl Balance {
    /// Create a new balance assertion.
    #[must_use]
    pub fn new(date: NaiveDate, account: impl Into<String>, amount: Amount) -> Self {
        Self {
            date,
            account: account.into(),
            amount,
            tolerance: None,
            meta: Metadata::new(),
        }
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} balance {} {}", self.date, self.account, self.amount)?;
        if let Some(tol) = self.tolerance {
            write!(f, " ~ {tol}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_transaction_builder() {
        let txn = Transaction::new(date(2023, 1, 25), "Acquisition")
            .with_payee("Broker")
            .with_tag("trading")
            .with_posting(Posting::new("Assets:Test1", Amount::new(dec!(10), "X")))
            .with_posting(Posting::new(
                "Assets:Cash",
                Amount::new(dec!(-100.00), "GBP"),
            ));

        assert_eq!(txn.flag, '*');
        assert_eq!(txn.postings.len(), 2);
        assert_eq!(txn.tags, vec!["trading"]);
    }

    #[test]
    fn test_directive_date() {
        let open = Directive::Open(Open::new(date(2023, 1, 1), "Assets:Test1"));
        assert_eq!(open.date(), date(2023, 1, 1));
        assert_eq!(open.type_name(), "open");
    }

    #[test]
    fn test_as_transaction_mut() {
        let mut entry = Directive::Transaction(Transaction::new(date(2023, 1, 25), "Test"));
        let txn = entry.as_transaction_mut().unwrap();
        txn.postings
            .push(Posting::new("Equity:Gains", Amount::new(dec!(-12), "GBP")));
        assert_eq!(entry.as_transaction().unwrap().postings.len(), 1);

        let mut close = Directive::Close(Close::new(date(2024, 1, 1), "Assets:Test1"));
        assert!(close.as_transaction_mut().is_none());
    }

    #[test]
    fn test_sort_directives() {
        let mut entries = vec![
            Directive::Close(Close::new(date(2023, 1, 1), "Assets:Test1")),
            Directive::Transaction(Transaction::new(date(2023, 1, 1), "Same day")),
            Directive::Open(Open::new(date(2023, 1, 1), "Assets:Test1")),
            Directive::Transaction(Transaction::new(date(2022, 12, 31), "Earlier")),
        ];

        sort_directives(&mut entries);

        assert_eq!(entries[0].date(), date(2022, 12, 31));
        assert_eq!(entries[1].type_name(), "open");
        assert_eq!(entries[2].type_name(), "transaction");
        assert_eq!(entries[3].type_name(), "close");
    }

    #[test]
    fn test_posting_display() {
        let posting = Posting::new("Assets:Test1", Amount::new(dec!(10), "X")).with_cost(
            CostSpec::empty()
                .with_number_per(dec!(10.00))
                .with_currency("GBP"),
        );
        let s = format!("{posting}");
        assert!(s.contains("Assets:Test1"));
        assert!(s.contains("10 X"));
        assert!(s.contains("10.00, GBP"));
    }

    #[test]
    fn test_transaction_display() {
        let txn = Transaction::new(date(2023, 1, 25), "Acquisition")
            .with_posting(Posting::new("Assets:Test1", Amount::new(dec!(10), "X")));
        let s = format!("{txn}");
        assert!(s.starts_with("2023-01-25 * \"Acquisition\""));
        assert!(s.contains("Assets:Test1"));
    }
}
