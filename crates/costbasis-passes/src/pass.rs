//! The pass interface and the built-in pass registry.
//!
//! A pass is a pure function from an owned entry list to a new entry list
//! plus the errors reported along the way. Passes share no live state and
//! compose in any order the host chooses.

use costbasis_core::Directive;

use crate::amortize::AmortizePass;
use crate::error::{ConfigError, PassError};
use crate::gains::CapitalGainsPass;
use crate::residual::ResidualLotClearPass;

/// Result of running one pass: the transformed entries and the errors
/// accumulated while processing. Reported errors never abort a run.
#[derive(Debug)]
pub struct PassOutput {
    /// The new entry list: original entries with selected postings rewritten
    /// and/or new postings appended, plus possibly new synthetic
    /// transactions appended. Never reordered, never shortened.
    pub entries: Vec<Directive>,
    /// Errors and warnings reported during processing.
    pub errors: Vec<PassError>,
}

/// Trait for entry-stream passes.
pub trait LedgerPass: Send + Sync {
    /// Pass name, as used in the registry.
    fn name(&self) -> &str;

    /// Process the entries and return the transformed entries + errors.
    fn process(&self, entries: Vec<Directive>) -> PassOutput;
}

/// Builder for a pass from its host-supplied configuration string.
///
/// Configuration failures surface here, before any entry is processed.
pub type PassBuilder = fn(Option<&str>) -> Result<Box<dyn LedgerPass>, ConfigError>;

/// Registry of built-in passes, keyed by name.
pub struct PassRegistry {
    builders: Vec<(&'static str, PassBuilder)>,
}

impl PassRegistry {
    /// Create a new registry with all built-in passes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            builders: vec![
                ("capital_gains", build_capital_gains as PassBuilder),
                ("clear_residual_lots", build_clear_residual_lots),
                ("amortize", build_amortize),
            ],
        }
    }

    /// The registered pass names.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.builders.iter().map(|(name, _)| *name)
    }

    /// Check if a name refers to a built-in pass.
    #[must_use]
    pub fn is_builtin(name: &str) -> bool {
        matches!(name, "capital_gains" | "clear_residual_lots" | "amortize")
    }

    /// Build the named pass from its configuration string.
    pub fn build(
        &self,
        name: &str,
        config: Option<&str>,
    ) -> Result<Box<dyn LedgerPass>, ConfigError> {
        let builder = self
            .builders
            .iter()
            .find(|(builder_name, _)| *builder_name == name)
            .map(|(_, builder)| *builder)
            .ok_or_else(|| ConfigError::UnknownPass(name.to_string()))?;
        builder(config)
    }
}

impl Default for PassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn build_capital_gains(config: Option<&str>) -> Result<Box<dyn LedgerPass>, ConfigError> {
    let config = config.ok_or(ConfigError::MissingConfig("capital_gains"))?;
    Ok(Box::new(CapitalGainsPass::from_config_str(config)?))
}

fn build_clear_residual_lots(config: Option<&str>) -> Result<Box<dyn LedgerPass>, ConfigError> {
    Ok(Box::new(ResidualLotClearPass::new(
        config.unwrap_or_default(),
    )?))
}

fn build_amortize(config: Option<&str>) -> Result<Box<dyn LedgerPass>, ConfigError> {
    let config = config.ok_or(ConfigError::MissingConfig("amortize"))?;
    Ok(Box::new(AmortizePass::from_config_str(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_registry() {
        let registry = PassRegistry::new();

        assert!(registry
            .build("clear_residual_lots", Some("Equity:Write-Downs"))
            .is_ok());
        assert!(registry
            .build(
                "capital_gains",
                Some(r#"{"accounts": {"Assets:Test1": {"method": "cost_avg"}}}"#),
            )
            .is_ok());
        assert!(matches!(
            registry.build("nonexistent", None),
            Err(ConfigError::UnknownPass(_))
        ));
    }

    #[test]
    fn test_is_builtin() {
        assert!(PassRegistry::is_builtin("capital_gains"));
        assert!(PassRegistry::is_builtin("clear_residual_lots"));
        assert!(PassRegistry::is_builtin("amortize"));
        assert!(!PassRegistry::is_builtin("my_custom_pass"));
    }

    #[test]
    fn test_missing_config_is_fatal() {
        let registry = PassRegistry::new();
        assert!(matches!(
            registry.build("capital_gains", None),
            Err(ConfigError::MissingConfig("capital_gains"))
        ));
        assert!(matches!(
            registry.build("clear_residual_lots", None),
            Err(ConfigError::MissingWriteDownAccount)
        ));
        assert!(matches!(
            registry.build("amortize", None),
            Err(ConfigError::MissingConfig("amortize"))
        ));
    }

    #[test]
    fn test_unknown_method_is_fatal() {
        let registry = PassRegistry::new();
        let result = registry.build(
            "capital_gains",
            Some(r#"{"accounts": {"Assets:Test1": {"method": "cost_fifo"}}}"#),
        );
        assert!(matches!(result, Err(ConfigError::UnknownMethod { .. })));
    }
}
