//! Cost-basis correction passes for beancount-style entry streams.
//!
//! Each pass is a pure function from an ordered entry list to a new entry
//! list plus a list of reported errors. The passes share no live state and
//! compose in any order the ledger host chooses.
//!
//! # Built-in passes (3)
//!
//! - `capital_gains`: costs each tracked holding's trade history with a
//!   configurable costing method (average cost) and rewrites recorded cost
//!   bases to match, balancing each correction with a counter-posting
//! - `clear_residual_lots`: nets out the residual lots of closed accounts
//!   with one balancing transaction dated the day before closure
//! - `amortize`: spreads lump expenses over a monthly term with exact
//!   residual-cent distribution
//!
//! # Example
//!
//! ```
//! use costbasis_passes::{LedgerPass, PassRegistry};
//!
//! let registry = PassRegistry::new();
//! let pass = registry
//!     .build("clear_residual_lots", Some("Equity:Write-Downs"))
//!     .unwrap();
//!
//! let output = pass.process(Vec::new());
//! assert!(output.entries.is_empty());
//! assert!(output.errors.is_empty());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod amortize;
pub mod config;
pub mod error;
pub mod gains;
pub mod method;
pub mod pass;
pub mod residual;
pub mod trade;

pub use amortize::AmortizePass;
pub use config::{AmortizeAccountConfig, AmortizeConfig, GainsAccountConfig, GainsConfig};
pub use error::{ConfigError, PassError, Severity};
pub use gains::CapitalGainsPass;
pub use method::{Adjustment, CostMethod, CostingError};
pub use pass::{LedgerPass, PassBuilder, PassOutput, PassRegistry};
pub use residual::ResidualLotClearPass;
pub use trade::{InstrumentHistory, PostingRef, Trade};
