//! Error codes for the loader diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Lexer errors
//! - `E1xx` - Parser errors
//! - `E2xx` - Elaboration errors

use std::fmt;

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Lexer Errors (E0xx)
    // =========================================================================
    /// Unterminated string literal or quoted name.
    E001,

    /// Unexpected character.
    ///
    /// A character was encountered that is not valid in this context.
    E002,

    /// Unterminated block comment.
    ///
    /// A `/*` was never closed by `*/`.
    E003,

    // =========================================================================
    // Parser Errors (E1xx)
    // =========================================================================
    /// Unexpected token.
    ///
    /// The parser encountered a token it did not expect at this position.
    E100,

    /// Incomplete input.
    ///
    /// The input ended unexpectedly before a complete construct was parsed.
    E101,

    // =========================================================================
    // Elaboration Errors (E2xx)
    // =========================================================================
    /// Undefined type reference.
    ///
    /// A typing or specialization names an element that does not exist.
    E200,

    /// Undefined redefined feature.
    ///
    /// No feature with the redefined name exists in the general types of the
    /// owner.
    E201,

    /// Redefinition of a feature that is not inherited.
    ///
    /// The redefined feature exists, but the owner does not specialize the
    /// element that declares it.
    E202,

    /// Duplicate member name.
    ///
    /// Two members of the same namespace have the same name.
    E203,

    /// Generalization cycle.
    ///
    /// Specializations, typings or redefinitions form a cycle.
    E204,

    /// Invalid multiplicity.
    ///
    /// Multiplicities must be non-negative integers.
    E205,

    /// Undefined annotation target.
    ///
    /// A comment refers with `about` to an element that does not exist.
    E206,

    /// Shadowed inherited feature (warning).
    ///
    /// A feature has the same name as an inherited feature but does not
    /// redefine it; the inherited feature is not overridden.
    E207,

    /// Invalid general type.
    ///
    /// A typing or specialization names an element that cannot act as a
    /// type, such as a feature or a comment.
    E208,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            // Lexer errors
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            // Parser errors
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            // Elaboration errors
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E204 => "E204",
            ErrorCode::E205 => "E205",
            ErrorCode::E206 => "E206",
            ErrorCode::E207 => "E207",
            ErrorCode::E208 => "E208",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            // Lexer errors
            ErrorCode::E001 => "unterminated string literal",
            ErrorCode::E002 => "unexpected character",
            ErrorCode::E003 => "unterminated block comment",
            // Parser errors
            ErrorCode::E100 => "unexpected token",
            ErrorCode::E101 => "incomplete input",
            // Elaboration errors
            ErrorCode::E200 => "undefined type",
            ErrorCode::E201 => "undefined redefined feature",
            ErrorCode::E202 => "redefined feature is not inherited",
            ErrorCode::E203 => "duplicate member name",
            ErrorCode::E204 => "generalization cycle",
            ErrorCode::E205 => "invalid multiplicity",
            ErrorCode::E206 => "undefined annotation target",
            ErrorCode::E207 => "shadowed inherited feature",
            ErrorCode::E208 => "invalid general type",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::E001.to_string(), "E001");
        assert_eq!(ErrorCode::E100.to_string(), "E100");
        assert_eq!(ErrorCode::E204.to_string(), "E204");
    }

    #[test]
    fn test_error_code_description() {
        assert_eq!(ErrorCode::E001.description(), "unterminated string literal");
        assert_eq!(ErrorCode::E203.description(), "duplicate member name");
        assert_eq!(ErrorCode::E207.description(), "shadowed inherited feature");
    }
}
