//! Error and diagnostic system for the model loader.
//!
//! This module provides an error handling system with:
//! - Error codes for documentation and searchability
//! - Multiple labeled spans for rich error context
//! - Severity levels
//! - Diagnostic collector for accumulating multiple errors
//!
//! # Overview
//!
//! Every problem found while loading a model is a [`Diagnostic`]: an error or
//! a warning with an optional error code, labeled source locations and help
//! text. Loading fails with a [`ParseError`] carrying every diagnostic when
//! at least one of them is an error; warnings alone are handed back next to
//! the loaded model.
//!
//! # Example
//!
//! ```
//! # use partscope_parser::error::{Diagnostic, ErrorCode};
//! # use partscope_parser::Span;
//!
//! let span = Span::new(100..120);
//! let original_span = Span::new(50..70);
//!
//! let diag = Diagnostic::error("`weight` is declared multiple times in `Reindeer`")
//!     .with_code(ErrorCode::E203)
//!     .with_label(span, "duplicate declaration")
//!     .with_secondary_label(original_span, "first declared here")
//!     .with_help("rename one of them or use `redefines`");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub(crate) use collector::DiagnosticCollector;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
pub use severity::Severity;
