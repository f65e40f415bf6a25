//! Typed pass configuration.
//!
//! The host hands each pass a JSON configuration string enumerating the
//! tracked accounts. Parsing happens once, in the pass constructor; a
//! malformed literal or an unknown field is a fatal [`ConfigError`] before
//! any entry is processed.
//!
//! [`ConfigError`]: crate::ConfigError

use serde::Deserialize;
use std::collections::BTreeMap;

/// Configuration for the capital-gains pass.
///
/// ```json
/// {
///   "accounts": {
///     "Assets:Test1": {
///       "method": "cost_avg",
///       "counter_account": "Equity:Gains",
///       "lots_adjust": false
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GainsConfig {
    /// Tracked holding accounts, keyed by account name.
    #[serde(default)]
    pub accounts: BTreeMap<String, GainsAccountConfig>,
}

/// Per-account configuration for the capital-gains pass.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GainsAccountConfig {
    /// Costing method name (currently only `"cost_avg"`).
    pub method: String,
    /// Destination for counter-postings. When unset, price mismatches are
    /// reported instead of applied.
    #[serde(default)]
    pub counter_account: Option<String>,
    /// Keep the account's position inventory single-lot by liquidating and
    /// reissuing lots on every trade.
    #[serde(default)]
    pub lots_adjust: bool,
}

/// Configuration for the amortization pass.
///
/// ```json
/// {
///   "accounts": {
///     "Expenses:Software": { "months": 12 }
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AmortizeConfig {
    /// Tracked expense accounts, keyed by account name.
    #[serde(default)]
    pub accounts: BTreeMap<String, AmortizeAccountConfig>,
}

/// Per-account configuration for the amortization pass.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AmortizeAccountConfig {
    /// Term length in months.
    pub months: u32,
    /// Decimal places installments are rounded to.
    #[serde(default = "default_decimals")]
    pub decimals: u32,
}

const fn default_decimals() -> u32 {
    2
}
