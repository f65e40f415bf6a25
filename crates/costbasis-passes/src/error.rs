//! Error types for the passes.
//!
//! Two families, with different lifetimes:
//!
//! - [`ConfigError`] is fatal and surfaces from a pass constructor before a
//!   single entry is processed.
//! - [`PassError`] accumulates during processing and is returned alongside
//!   the transformed entries; a reported error never aborts the run.

use chrono::NaiveDate;
use thiserror::Error;

/// A fatal configuration error, raised before any entry is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configured costing method name is not recognized.
    #[error("account {account} has no valid method `{method}`, must be one of: {known}")]
    UnknownMethod {
        /// The tracked account the method was configured for.
        account: String,
        /// The unrecognized method name.
        method: String,
        /// Comma-separated list of known method names.
        known: String,
    },

    /// The configuration string did not parse as the expected structure.
    #[error("invalid pass configuration: {0}")]
    Invalid(#[from] serde_json::Error),

    /// The pass requires a configuration string and none was given.
    #[error("pass `{0}` requires a configuration string")]
    MissingConfig(&'static str),

    /// The residual-lot clearer needs a write-down account to balance
    /// against.
    #[error("clear_residual_lots requires a write-down account to be specified")]
    MissingWriteDownAccount,

    /// Amortization is only defined for expense accounts.
    #[error("amortize requires Expenses: accounts, got {0}")]
    NonExpenseAccount(String),

    /// An amortization term must cover at least one month.
    #[error("account {0} has an invalid amortization term of {1} months")]
    InvalidTerm(String, u32),

    /// No pass is registered under the requested name.
    #[error("unknown pass `{0}`")]
    UnknownPass(String),
}

/// Severity of a reported processing error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// The affected holding or posting could not be processed correctly.
    Error,
    /// Suspicious but recoverable; the entry was left as-is.
    Warning,
}

/// An error reported while processing entries.
///
/// Carries the originating entry's date and a context string (account or
/// narration) so the host can point at the offending source location.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PassError {
    /// Human-readable description of the problem.
    pub message: String,
    /// Whether the condition is an error or a warning.
    pub severity: Severity,
    /// Date of the originating entry, when one exists.
    pub date: Option<NaiveDate>,
    /// Additional context (account name, transaction narration).
    pub context: Option<String>,
}

impl PassError {
    /// Create a new error-severity report.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Error,
            date: None,
            context: None,
        }
    }

    /// Create a new warning-severity report.
    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Warning,
            date: None,
            context: None,
        }
    }

    /// Attach the originating entry's date.
    #[must_use]
    pub const fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Attach context (account name, transaction narration).
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}
