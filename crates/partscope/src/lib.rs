//! Partscope - scope-aware evaluation of structural models.
//!
//! Loads models written in a compact structural modeling notation, evaluates
//! feature expressions in a chosen scope (so that redefinitions along the
//! specialization chain take effect), and extracts comments and localized
//! documentation into CSV reports.

pub mod config;
pub mod eval;
pub mod materialize;
pub mod metadata;
pub mod report;
pub mod resolve;

mod error;

pub use partscope_core::{expr, identifier, model, unit, value};
pub use partscope_parser::Loaded;

pub use error::PartscopeError;

use std::io::Write;

use indexmap::IndexMap;
use log::{debug, info, warn};

use partscope_parser::ParseError;

use config::AppConfig;
use eval::{Environment, Evaluator};
use materialize::Composite;
use metadata::{ElementMetadata, MissingLocales, PART_KINDS};
use model::{ElementId, Model};
use value::{CompositeRef, Value};

/// Entry point for loading and querying models.
///
/// A workbench owns the configuration and the evaluation [`Environment`]
/// built from it; every query takes the model explicitly.
///
/// # Examples
///
/// ```
/// use partscope::{Workbench, config::AppConfig, value::Value};
///
/// let source = r#"
///     package Herd {
///         part def Reindeer { attribute energyLevel = 100; }
///         part def Rudolph :> Reindeer { attribute redefines energyLevel = 120; }
///     }
/// "#;
///
/// let workbench = Workbench::new(AppConfig::default()).expect("valid config");
/// let loaded = workbench.load(source).expect("Failed to load");
/// let model = loaded.model();
///
/// let general = workbench.evaluate(model, "Reindeer", "energyLevel", None).unwrap();
/// let special = workbench
///     .evaluate(model, "Reindeer", "energyLevel", Some("Rudolph"))
///     .unwrap();
/// assert_eq!(general, Value::Scalar(100.0));
/// assert_eq!(special, Value::Scalar(120.0));
/// ```
#[derive(Debug)]
pub struct Workbench {
    config: AppConfig,
    env: Environment,
}

impl Workbench {
    /// Create a workbench with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PartscopeError::Config`] if the configuration is invalid.
    pub fn new(config: AppConfig) -> Result<Self, PartscopeError> {
        config.validate()?;
        let env = Environment::new(config.evaluation());
        Ok(Self { config, env })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Load source text into a model.
    ///
    /// Warnings fail the load when `load.warnings_as_errors` is set and are
    /// logged otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`PartscopeError::Parse`] with the source attached.
    pub fn load(&self, source: &str) -> Result<Loaded, PartscopeError> {
        info!(bytes = source.len(); "Loading model");

        let loaded = partscope_parser::load(source)
            .map_err(|err| PartscopeError::new_parse_error(err, source))?;

        if loaded.has_warnings() {
            if self.config.load().warnings_as_errors() {
                let (_, warnings) = loaded.into_parts();
                return Err(PartscopeError::new_parse_error(
                    ParseError::new(warnings),
                    source,
                ));
            }
            for warning in loaded.warnings() {
                warn!(code:? = warning.code(); "{warning}");
            }
        }

        info!(elements = loaded.model().len(); "Model loaded");
        Ok(loaded)
    }

    pub fn evaluator<'a>(&'a self, model: &'a Model) -> Evaluator<'a> {
        Evaluator::new(model, &self.env)
    }

    /// Finds an element by qualified name (`Workshop::Elf`) or, for simple
    /// names, the first element with that name in traversal order.
    pub fn element(&self, model: &Model, name: &str) -> Result<ElementId, PartscopeError> {
        let found = if name.contains("::") {
            model.find_by_qualified_name(name)
        } else {
            model.find_by_name(name)
        };
        found.ok_or_else(|| PartscopeError::ElementNotFound(name.to_string()))
    }

    /// Evaluates `element[feature]` in `scope`, or in `element` itself when
    /// no scope is given.
    ///
    /// # Errors
    ///
    /// Returns [`PartscopeError::ElementNotFound`] or
    /// [`PartscopeError::FeatureNotFound`] for unknown names, and
    /// [`PartscopeError::Evaluation`] if evaluation fails.
    pub fn evaluate(
        &self,
        model: &Model,
        element: &str,
        feature: &str,
        scope: Option<&str>,
    ) -> Result<Value, PartscopeError> {
        let owner = self.element(model, element)?;
        let scope = match scope {
            Some(scope) => self.element(model, scope)?,
            None => owner,
        };
        let feature_id =
            model
                .feature(owner, feature)
                .ok_or_else(|| PartscopeError::FeatureNotFound {
                    scope: model.path_of(owner),
                    feature: feature.to_string(),
                })?;

        let value = self.evaluator(model).evaluate_feature(feature_id, scope)?;
        info!(
            feature:% = model.path_of(feature_id),
            scope:% = model.path_of(scope),
            value:% = value;
            "Feature evaluated"
        );
        Ok(value)
    }

    /// Evaluates every feature visible in `element`, with `element` as scope.
    pub fn evaluate_all(
        &self,
        model: &Model,
        element: &str,
    ) -> Result<IndexMap<String, Value>, PartscopeError> {
        let id = self.element(model, element)?;
        let composite = Composite::new(
            CompositeRef {
                element: id,
                origin: id,
            },
            self.evaluator(model),
        );
        Ok(composite.evaluate_all()?)
    }

    /// Comments and documentation of every part definition and usage.
    pub fn metadata(&self, model: &Model) -> Vec<ElementMetadata> {
        metadata::collect(model, &PART_KINDS)
    }

    /// Writes the comments report and returns the number of entries.
    pub fn comments_report<W: Write>(&self, model: &Model, writer: W) -> Result<usize, PartscopeError> {
        let metadata = self.metadata(model);
        let policy = self.config.report().comments_without_entries();
        debug!(policy:? = policy; "Writing comments report");
        Ok(report::write_comments(writer, &metadata, policy)?)
    }

    /// Writes the documentation report and returns the number of entries.
    pub fn documentation_report<W: Write>(
        &self,
        model: &Model,
        writer: W,
    ) -> Result<usize, PartscopeError> {
        let metadata = self.metadata(model);
        let policy = self.config.report().documentation_without_entries();
        debug!(policy:? = policy; "Writing documentation report");
        Ok(report::write_documentation(writer, &metadata, policy)?)
    }

    /// Elements lacking documentation in one of the configured locales.
    pub fn missing_locales(&self, model: &Model) -> Vec<MissingLocales> {
        metadata::missing_locales(&self.metadata(model), self.config.report().locales())
    }
}

impl Default for Workbench {
    fn default() -> Self {
        let config = AppConfig::default();
        let env = Environment::new(config.evaluation());
        Self { config, env }
    }
}
