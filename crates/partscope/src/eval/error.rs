use thiserror::Error;

use crate::resolve::ResolutionError;

/// Errors raised while evaluating an expression.
///
/// Every error ends the query that raised it; nothing is replaced by an
/// absent value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("cannot apply `{op}` to {lhs} and {rhs}")]
    TypeMismatch {
        op: String,
        lhs: &'static str,
        rhs: &'static str,
    },

    #[error("cannot apply `{op}` to {operand}")]
    InvalidOperand { op: String, operand: &'static str },

    #[error("incompatible units in `{op}`: [{lhs}] and [{rhs}]")]
    UnitMismatch { op: String, lhs: String, rhs: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("unit exponent out of range in `{op}` on [{unit}]")]
    UnitOverflow { op: String, unit: String },

    #[error("unknown function `{0}`")]
    UnknownFunction(String),

    #[error("`{function}` expects {expected} argument(s), got {found}")]
    ArityMismatch {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid argument to `{function}`: {message}")]
    InvalidArgument { function: String, message: String },

    #[error("cannot resolve `{name}` in scope `{scope}`")]
    UnresolvedReference { name: String, scope: String },

    #[error("`{name}` is a {kind} and has no value")]
    NotAValue { name: String, kind: &'static str },

    #[error("`{feature}` depends on itself in scope `{scope}`")]
    CyclicReference { feature: String, scope: String },

    #[error("evaluation nested deeper than {0} levels")]
    DepthLimitExceeded(usize),
}

impl EvaluationError {
    pub(crate) fn type_mismatch(op: impl ToString, lhs: &'static str, rhs: &'static str) -> Self {
        Self::TypeMismatch {
            op: op.to_string(),
            lhs,
            rhs,
        }
    }

    pub(crate) fn invalid_argument(function: impl ToString, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            function: function.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = EvaluationError::UnitMismatch {
            op: "+".into(),
            lhs: "kg".into(),
            rhs: "m".into(),
        };
        assert_eq!(err.to_string(), "incompatible units in `+`: [kg] and [m]");

        let err = EvaluationError::ArityMismatch {
            function: "count".into(),
            expected: 1,
            found: 3,
        };
        assert_eq!(err.to_string(), "`count` expects 1 argument(s), got 3");
    }

    #[test]
    fn test_resolution_errors_are_transparent() {
        let err: EvaluationError = ResolutionError::NotReachable {
            feature: "Rudolph::weight".into(),
            scope: "Reindeer".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "feature `Rudolph::weight` is not reachable from scope `Reindeer`"
        );
    }
}
