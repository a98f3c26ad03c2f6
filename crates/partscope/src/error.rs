//! Error types for Partscope operations.
//!
//! [`PartscopeError`] wraps every failure a [`Workbench`](crate::Workbench)
//! can report, from loading a model to writing a report.

use std::io;

use thiserror::Error;

use partscope_parser::ParseError;

use crate::{
    config::ConfigError, eval::EvaluationError, report::ReportError, resolve::ResolutionError,
};

/// The main error type for Partscope operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant keeps the source text next to the diagnostics so
/// that callers can render labelled source snippets.
#[derive(Debug, Error)]
pub enum PartscopeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("no element named `{0}`")]
    ElementNotFound(String),

    #[error("`{scope}` has no feature `{feature}`")]
    FeatureNotFound { scope: String, feature: String },
}

impl PartscopeError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
