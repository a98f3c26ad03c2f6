//! # Partscope Parser
//!
//! Loader for the Partscope structural model notation. This crate turns
//! source text into a [`Model`] and reports problems as [`Diagnostic`]s with
//! labelled source spans.
//!
//! ## Usage
//!
//! ```
//! # use partscope_parser::{load, ParseError};
//!
//! fn main() -> Result<(), ParseError> {
//!     let source = r#"
//!         package Workshop {
//!             part def Reindeer { attribute weight = 500 [kg]; }
//!             part def Rudolph :> Reindeer { attribute redefines weight = 520 [kg]; }
//!         }
//!     "#;
//!
//!     let loaded = load(source)?;
//!     assert!(loaded.model().find_by_name("Rudolph").is_some());
//!     Ok(())
//! }
//! ```

mod builtin_types;
mod elaborate;
pub mod error;
mod lexer;
mod parser;
mod parser_types;
mod span;
mod tokens;

pub use error::{Diagnostic, ErrorCode, Label, ParseError, Severity};
pub use span::Span;

use log::debug;
use partscope_core::model::Model;

use elaborate::Builder;

/// A successfully loaded model and the warnings found while loading it.
#[derive(Debug)]
pub struct Loaded {
    model: Model,
    warnings: Vec<Diagnostic>,
}

impl Loaded {
    fn new(model: Model, warnings: Vec<Diagnostic>) -> Self {
        Self { model, warnings }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Splits into the model and the warnings.
    pub fn into_parts(self) -> (Model, Vec<Diagnostic>) {
        (self.model, self.warnings)
    }
}

/// Load source text into a model.
///
/// The pipeline runs in three steps:
///
/// 1. **Tokenize** - Convert source text to tokens
/// 2. **Parse** - Build the declaration tree from tokens
/// 3. **Elaborate** - Resolve names and build the element graph
///
/// # Errors
///
/// Returns a [`ParseError`] if any step reports an error. Lexer and parser
/// errors stop at the first problem; elaboration reports every error it
/// finds, together with any warnings.
pub fn load(source: &str) -> Result<Loaded, ParseError> {
    // Step 1: Tokenize
    let tokens = lexer::tokenize(source)?;
    debug!(tokens = tokens.len(); "Tokenized source");

    // Step 2: Parse
    let document = parser::build_document(&tokens)?;

    // Step 3: Elaborate
    Builder::new().build(&document)
}
