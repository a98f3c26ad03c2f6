//! Expression trees attached to features as their defining expressions.
//!
//! Expressions are immutable once the model is loaded. Names inside them stay
//! unresolved: a [`Expr::Reference`] is looked up at evaluation time against
//! whatever scope the evaluation runs in, which is what makes the same
//! expression produce different values for different scopes.

use std::fmt;

use crate::{identifier::Id, unit::Unit};

/// Literal constants.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Boolean(bool),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Xor,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Pow => "**",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Xor => "xor",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or | BinaryOp::Xor)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A name as written in an expression: one segment for relative names,
/// several for `::`-qualified ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<Id>,
}

impl Path {
    /// Creates a path from its segments.
    ///
    /// # Panics
    ///
    /// Panics if `segments` is empty; the loader never produces empty paths.
    pub fn new(segments: Vec<Id>) -> Self {
        assert!(!segments.is_empty(), "path must have at least one segment");
        Self { segments }
    }

    pub fn simple(name: Id) -> Self {
        Self {
            segments: vec![name],
        }
    }

    pub fn segments(&self) -> &[Id] {
        &self.segments
    }

    pub fn first(&self) -> Id {
        self.segments[0]
    }

    pub fn last(&self) -> Id {
        self.segments[self.segments.len() - 1]
    }

    pub fn is_simple(&self) -> bool {
        self.segments.len() == 1
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, segment) in self.segments.iter().enumerate() {
            if idx > 0 {
                write!(f, "::")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    /// Numeric literal with a unit, such as `500 [kg]`.
    Quantity {
        value: f64,
        unit: Unit,
    },
    Reference(Path),
    /// Feature access on a composite value: `features.noseColor`.
    Member {
        target: Box<Expr>,
        member: Id,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Conditional {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    Call {
        function: Id,
        args: Vec<Expr>,
    },
}

impl Expr {
    pub fn number(value: f64) -> Self {
        Expr::Literal(Literal::Number(value))
    }

    pub fn quantity(value: f64, unit: Unit) -> Self {
        Expr::Quantity { value, unit }
    }

    pub fn reference(name: &str) -> Self {
        Expr::Reference(Path::new(name.split("::").map(Id::new).collect()))
    }

    pub fn member(target: Expr, member: &str) -> Self {
        Expr::Member {
            target: Box::new(target),
            member: Id::new(member),
        }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn conditional(condition: Expr, then_branch: Expr, else_branch: Expr) -> Self {
        Expr::Conditional {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        }
    }

    pub fn call(function: &str, args: Vec<Expr>) -> Self {
        Expr::Call {
            function: Id::new(function),
            args,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(Literal::Number(value)) => write!(f, "{value}"),
            Expr::Literal(Literal::Boolean(value)) => write!(f, "{value}"),
            Expr::Literal(Literal::String(value)) => write!(f, "{value:?}"),
            Expr::Quantity { value, unit } => write!(f, "{value} [{unit}]"),
            Expr::Reference(path) => write!(f, "{path}"),
            Expr::Member { target, member } => write!(f, "{target}.{member}"),
            Expr::Unary {
                op: UnaryOp::Neg,
                operand,
            } => write!(f, "-{operand}"),
            Expr::Unary {
                op: UnaryOp::Not,
                operand,
            } => write!(f, "not {operand}"),
            Expr::Binary { op, lhs, rhs } => write!(f, "({lhs} {op} {rhs})"),
            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => write!(f, "if {condition} ? {then_branch} else {else_branch}"),
            Expr::Call { function, args } => {
                write!(f, "{function}(")?;
                for (idx, arg) in args.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_splits_qualified_names() {
        let Expr::Reference(path) = Expr::reference("Color::red") else {
            panic!("expected reference");
        };
        assert_eq!(path.segments().len(), 2);
        assert_eq!(path.first(), "Color");
        assert_eq!(path.last(), "red");
        assert!(!path.is_simple());
    }

    #[test]
    fn test_display_round_trips_structure() {
        let expr = Expr::conditional(
            Expr::binary(
                BinaryOp::Gt,
                Expr::reference("totalWeight"),
                Expr::quantity(1000.0, Unit::symbol("kg")),
            ),
            Expr::reference("FlightMode::cruise"),
            Expr::call("count", vec![Expr::reference("Reindeer")]),
        );

        assert_eq!(
            expr.to_string(),
            "if (totalWeight > 1000 [kg]) ? FlightMode::cruise else count(Reindeer)"
        );
    }

    #[test]
    fn test_member_display() {
        let expr = Expr::member(Expr::reference("features"), "noseColor");
        assert_eq!(expr.to_string(), "features.noseColor");
    }
}
