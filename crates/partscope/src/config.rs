//! Configuration types for loading, evaluation and reporting.
//!
//! All types implement [`serde::Deserialize`] so they can be read from a TOML
//! file; every field has a default, so an empty file is a valid
//! configuration.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining the three sections.
//! - [`LoadConfig`] - How load diagnostics are treated.
//! - [`EvaluationConfig`] - Settings of the evaluation [`Environment`](crate::eval::Environment).
//! - [`ReportConfig`] - Target locales and empty-element policies of reports.
//!
//! # Example
//!
//! ```
//! # use partscope::config::{AppConfig, EmptyPolicy};
//! let config = AppConfig::default();
//! assert!(config.load().warnings_as_errors());
//! assert_eq!(config.report().comments_without_entries(), EmptyPolicy::Skip);
//! assert_eq!(config.report().documentation_without_entries(), EmptyPolicy::Placeholder);
//! ```

use indexmap::IndexMap;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use partscope_core::unit::Conversion;

/// Errors found while validating a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("evaluation.max_depth must be at least 1")]
    ZeroMaxDepth,

    #[error("unit `{symbol}` has invalid conversion factor {factor}")]
    InvalidConversion { symbol: String, factor: f64 },

    #[error("unit `{symbol}` cannot be defined in terms of itself")]
    SelfConversion { symbol: String },

    #[error("report locale must not be empty")]
    EmptyLocale,

    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {}", .0.display())]
    MissingFile(PathBuf),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    load: LoadConfig,

    #[serde(default)]
    evaluation: EvaluationConfig,

    #[serde(default)]
    report: ReportConfig,
}

impl AppConfig {
    pub fn new(load: LoadConfig, evaluation: EvaluationConfig, report: ReportConfig) -> Self {
        Self {
            load,
            evaluation,
            report,
        }
    }

    pub fn load(&self) -> &LoadConfig {
        &self.load
    }

    pub fn evaluation(&self) -> &EvaluationConfig {
        &self.evaluation
    }

    pub fn report(&self) -> &ReportConfig {
        &self.report
    }

    /// Checks values that deserialize fine but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.evaluation.validate()?;
        self.report.validate()
    }
}

/// How diagnostics of the model loader are treated.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadConfig {
    /// Refuse models that load with warnings.
    #[serde(default = "default_true")]
    warnings_as_errors: bool,
}

impl LoadConfig {
    pub fn new(warnings_as_errors: bool) -> Self {
        Self { warnings_as_errors }
    }

    pub fn warnings_as_errors(&self) -> bool {
        self.warnings_as_errors
    }
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            warnings_as_errors: true,
        }
    }
}

/// Settings for the evaluation environment.
///
/// ```toml
/// [evaluation]
/// quantities = true
/// max_depth = 256
///
/// [evaluation.units]
/// lb = { factor = 0.45359237, base = "kg" }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvaluationConfig {
    /// Evaluate quantity literals with their units; when off, `500 [kg]`
    /// evaluates to the plain number `500`.
    #[serde(default = "default_true")]
    quantities: bool,

    /// Maximum nesting of feature evaluations.
    #[serde(default = "default_max_depth")]
    max_depth: usize,

    /// Conversions added to the standard unit table.
    #[serde(default)]
    units: IndexMap<String, Conversion>,
}

impl EvaluationConfig {
    pub fn new(quantities: bool, max_depth: usize) -> Self {
        Self {
            quantities,
            max_depth,
            units: IndexMap::new(),
        }
    }

    /// Adds a unit conversion on top of the standard table.
    pub fn with_unit(mut self, symbol: impl Into<String>, conversion: Conversion) -> Self {
        self.units.insert(symbol.into(), conversion);
        self
    }

    pub fn quantities(&self) -> bool {
        self.quantities
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn units(&self) -> &IndexMap<String, Conversion> {
        &self.units
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::ZeroMaxDepth);
        }
        for (symbol, conversion) in &self.units {
            if !conversion.factor.is_finite() || conversion.factor <= 0.0 {
                return Err(ConfigError::InvalidConversion {
                    symbol: symbol.clone(),
                    factor: conversion.factor,
                });
            }
            if *symbol == conversion.base {
                return Err(ConfigError::SelfConversion {
                    symbol: symbol.clone(),
                });
            }
        }
        Ok(())
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self::new(true, default_max_depth())
    }
}

/// What a report writes for an element without entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyPolicy {
    /// Leave the element out.
    Skip,
    /// Write one row with empty entry columns.
    Placeholder,
}

/// Settings for metadata reports.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    /// Locales every documented element is expected to cover.
    #[serde(default = "default_locales")]
    locales: Vec<String>,

    #[serde(default = "default_comments_policy")]
    comments_without_entries: EmptyPolicy,

    #[serde(default = "default_documentation_policy")]
    documentation_without_entries: EmptyPolicy,
}

impl ReportConfig {
    pub fn new(
        locales: Vec<String>,
        comments_without_entries: EmptyPolicy,
        documentation_without_entries: EmptyPolicy,
    ) -> Self {
        Self {
            locales,
            comments_without_entries,
            documentation_without_entries,
        }
    }

    pub fn locales(&self) -> &[String] {
        &self.locales
    }

    pub fn comments_without_entries(&self) -> EmptyPolicy {
        self.comments_without_entries
    }

    pub fn documentation_without_entries(&self) -> EmptyPolicy {
        self.documentation_without_entries
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.locales.iter().any(|locale| locale.trim().is_empty()) {
            return Err(ConfigError::EmptyLocale);
        }
        Ok(())
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self::new(
            default_locales(),
            default_comments_policy(),
            default_documentation_policy(),
        )
    }
}

fn default_true() -> bool {
    true
}

fn default_max_depth() -> usize {
    256
}

fn default_locales() -> Vec<String> {
    ["en_US", "hu_HU", "lt_LT"].map(String::from).to_vec()
}

fn default_comments_policy() -> EmptyPolicy {
    EmptyPolicy::Skip
}

fn default_documentation_policy() -> EmptyPolicy {
    EmptyPolicy::Placeholder
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert!(config.load().warnings_as_errors());
        assert!(config.evaluation().quantities());
        assert_eq!(config.evaluation().max_depth(), 256);
        assert!(config.evaluation().units().is_empty());
        assert_eq!(config.report().locales(), ["en_US", "hu_HU", "lt_LT"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_file() {
        let config: AppConfig = toml::from_str(
            r#"
            [load]
            warnings_as_errors = false

            [evaluation]
            quantities = false
            max_depth = 32

            [evaluation.units]
            lb = { factor = 0.45359237, base = "kg" }

            [report]
            locales = ["en_US", "de_DE"]
            comments_without_entries = "placeholder"
            documentation_without_entries = "skip"
            "#,
        )
        .unwrap();

        assert!(!config.load().warnings_as_errors());
        assert!(!config.evaluation().quantities());
        assert_eq!(config.evaluation().max_depth(), 32);
        assert_eq!(
            config.evaluation().units().get("lb"),
            Some(&Conversion::new(0.45359237, "kg"))
        );
        assert_eq!(config.report().locales(), ["en_US", "de_DE"]);
        assert_eq!(
            config.report().comments_without_entries(),
            EmptyPolicy::Placeholder
        );
        assert_eq!(
            config.report().documentation_without_entries(),
            EmptyPolicy::Skip
        );
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let result: Result<AppConfig, _> = toml::from_str("[evaluation]\nquantity = true\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validation() {
        let config = AppConfig::new(
            LoadConfig::default(),
            EvaluationConfig::new(true, 0),
            ReportConfig::default(),
        );
        assert_eq!(config.validate(), Err(ConfigError::ZeroMaxDepth));

        let config = AppConfig::new(
            LoadConfig::default(),
            EvaluationConfig::default().with_unit("lb", Conversion::new(-1.0, "kg")),
            ReportConfig::default(),
        );
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConversion { .. })
        ));

        let config = AppConfig::new(
            LoadConfig::default(),
            EvaluationConfig::default().with_unit("kg", Conversion::new(1.0, "kg")),
            ReportConfig::default(),
        );
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SelfConversion { .. })
        ));

        let config = AppConfig::new(
            LoadConfig::default(),
            EvaluationConfig::default(),
            ReportConfig::new(vec![" ".into()], EmptyPolicy::Skip, EmptyPolicy::Skip),
        );
        assert_eq!(config.validate(), Err(ConfigError::EmptyLocale));
    }
}
