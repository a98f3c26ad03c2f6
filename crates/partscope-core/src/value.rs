//! Results of evaluating an expression.

use std::fmt;

use crate::{identifier::Id, model::ElementId, unit::Unit};

/// A number tagged with a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    pub value: f64,
    pub unit: Unit,
}

impl Quantity {
    pub fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", DisplayNumber(self.value), self.unit)
    }
}

/// An enumeration literal; two values are equal when they name the same
/// literal element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnumLiteral {
    pub literal: ElementId,
    pub name: Id,
}

/// Handle to an element whose own features can be evaluated on request.
///
/// Nothing inside the element is computed when the handle is produced;
/// callers evaluate sub-features by using [`CompositeRef::element`] as the
/// scope of a new query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompositeRef {
    /// The part, or the feature with nested features, this value stands for.
    pub element: ElementId,
    /// The scope the handle was produced in.
    pub origin: ElementId,
}

/// An evaluation result.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(f64),
    Quantity(Quantity),
    Boolean(bool),
    String(String),
    EnumValue(EnumLiteral),
    CompositeRef(CompositeRef),
    Absent,
}

impl Value {
    pub fn quantity(value: f64, unit: Unit) -> Self {
        if unit.is_dimensionless() {
            Value::Scalar(value)
        } else {
            Value::Quantity(Quantity::new(value, unit))
        }
    }

    /// Short type label used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Scalar(_) => "scalar",
            Value::Quantity(_) => "quantity",
            Value::Boolean(_) => "boolean",
            Value::String(_) => "string",
            Value::EnumValue(_) => "enum",
            Value::CompositeRef(_) => "composite",
            Value::Absent => "absent",
        }
    }

    /// Numeric magnitude of a scalar or quantity.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Scalar(value) => Some(*value),
            Value::Quantity(quantity) => Some(quantity.value),
            _ => None,
        }
    }

    pub fn as_composite(&self) -> Option<CompositeRef> {
        match self {
            Value::CompositeRef(composite) => Some(*composite),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(value) => write!(f, "{}", DisplayNumber(*value)),
            Value::Quantity(quantity) => write!(f, "{quantity}"),
            Value::Boolean(value) => write!(f, "{value}"),
            Value::String(value) => write!(f, "{value}"),
            Value::EnumValue(literal) => write!(f, "{}", literal.name),
            Value::CompositeRef(composite) => write!(f, "<composite {}>", composite.element),
            Value::Absent => write!(f, "absent"),
        }
    }
}

/// Prints integral numbers without a fractional part.
struct DisplayNumber(f64);

impl fmt::Display for DisplayNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.0;
        if value.fract() == 0.0 && value.abs() < 1e15 {
            write!(f, "{value:.0}")
        } else {
            write!(f, "{value}")
        }
    }
}
