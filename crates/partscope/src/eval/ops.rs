//! Operator semantics over [`Value`]s.
//!
//! Quantities of compatible units (identical after normalisation through
//! the [`UnitTable`]) can be added, subtracted and compared; the result is
//! expressed in the left operand's unit. Multiplication and division
//! combine units, and a product whose units cancel becomes a plain scalar.

use std::cmp::Ordering;

use partscope_core::{
    expr::{BinaryOp, UnaryOp},
    unit::{Unit, UnitTable},
    value::{Quantity, Value},
};

use super::EvaluationError;

type Result<T> = std::result::Result<T, EvaluationError>;

pub fn unary(op: UnaryOp, operand: Value) -> Result<Value> {
    match (op, operand) {
        (UnaryOp::Neg, Value::Scalar(value)) => Ok(Value::Scalar(-value)),
        (UnaryOp::Neg, Value::Quantity(quantity)) => {
            Ok(Value::Quantity(Quantity::new(-quantity.value, quantity.unit)))
        }
        (UnaryOp::Not, Value::Boolean(value)) => Ok(Value::Boolean(!value)),
        (op, operand) => Err(EvaluationError::InvalidOperand {
            op: match op {
                UnaryOp::Neg => "-".to_string(),
                UnaryOp::Not => "not".to_string(),
            },
            operand: operand.type_name(),
        }),
    }
}

pub fn binary(op: BinaryOp, lhs: Value, rhs: Value, units: &UnitTable) -> Result<Value> {
    match op {
        BinaryOp::And | BinaryOp::Or | BinaryOp::Xor => logical(op, lhs, rhs),
        BinaryOp::Eq => equals(&lhs, &rhs, units).map(Value::Boolean),
        BinaryOp::Ne => equals(&lhs, &rhs, units).map(|equal| Value::Boolean(!equal)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = order(op, &lhs, &rhs, units)?;
            let holds = ordering.is_some_and(|ordering| match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Le => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            });
            Ok(Value::Boolean(holds))
        }
        BinaryOp::Add
        | BinaryOp::Sub
        | BinaryOp::Mul
        | BinaryOp::Div
        | BinaryOp::Rem
        | BinaryOp::Pow => arithmetic(op, lhs, rhs, units),
    }
}

/// Orders two numeric (or string) values; `None` if either is NaN.
pub fn order(op: BinaryOp, lhs: &Value, rhs: &Value, units: &UnitTable) -> Result<Option<Ordering>> {
    match (lhs, rhs) {
        (Value::Scalar(a), Value::Scalar(b)) => Ok(a.partial_cmp(b)),
        (Value::Quantity(a), Value::Quantity(b)) => {
            let b = convert(op, b, &a.unit, units)?;
            Ok(a.value.partial_cmp(&b))
        }
        (Value::String(a), Value::String(b)) => Ok(Some(a.cmp(b))),
        (Value::Scalar(_), Value::Quantity(_)) | (Value::Quantity(_), Value::Scalar(_)) => {
            Err(unit_mismatch(op, lhs, rhs))
        }
        _ => Err(EvaluationError::type_mismatch(
            op,
            lhs.type_name(),
            rhs.type_name(),
        )),
    }
}

fn equals(lhs: &Value, rhs: &Value, units: &UnitTable) -> Result<bool> {
    match (lhs, rhs) {
        (Value::Scalar(a), Value::Scalar(b)) => Ok(a == b),
        (Value::Quantity(a), Value::Quantity(b)) => {
            let b = convert(BinaryOp::Eq, b, &a.unit, units)?;
            Ok(nearly_equal(a.value, b))
        }
        (Value::Boolean(a), Value::Boolean(b)) => Ok(a == b),
        (Value::String(a), Value::String(b)) => Ok(a == b),
        (Value::EnumValue(a), Value::EnumValue(b)) => Ok(a.literal == b.literal),
        (Value::CompositeRef(a), Value::CompositeRef(b)) => Ok(a.element == b.element),
        (Value::Absent, Value::Absent) => Ok(true),
        (Value::Scalar(_), Value::Quantity(_)) | (Value::Quantity(_), Value::Scalar(_)) => {
            Err(unit_mismatch(BinaryOp::Eq, lhs, rhs))
        }
        _ => Err(EvaluationError::type_mismatch(
            BinaryOp::Eq,
            lhs.type_name(),
            rhs.type_name(),
        )),
    }
}

fn logical(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value> {
    match (lhs, rhs) {
        (Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(match op {
            BinaryOp::And => a && b,
            BinaryOp::Or => a || b,
            _ => a ^ b,
        })),
        (lhs, rhs) => Err(EvaluationError::type_mismatch(
            op,
            lhs.type_name(),
            rhs.type_name(),
        )),
    }
}

fn arithmetic(op: BinaryOp, lhs: Value, rhs: Value, units: &UnitTable) -> Result<Value> {
    match (lhs, rhs) {
        (Value::Scalar(a), Value::Scalar(b)) => scalar(op, a, b).map(Value::Scalar),

        (Value::String(a), Value::String(b)) if op == BinaryOp::Add => Ok(Value::String(a + &b)),

        (Value::Quantity(a), Value::Quantity(b)) => match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Rem => {
                let b = convert(op, &b, &a.unit, units)?;
                Ok(Value::Quantity(Quantity::new(scalar(op, a.value, b)?, a.unit)))
            }
            BinaryOp::Mul => {
                let unit = a.unit.mul(&b.unit).ok_or_else(|| unit_overflow(op, &a.unit))?;
                product(op, a.value * b.value, unit, units)
            }
            BinaryOp::Div => {
                let value = scalar(op, a.value, b.value)?;
                let unit = a.unit.div(&b.unit).ok_or_else(|| unit_overflow(op, &a.unit))?;
                product(op, value, unit, units)
            }
            _ => Err(EvaluationError::type_mismatch(op, "quantity", "quantity")),
        },

        (Value::Quantity(a), Value::Scalar(b)) => match op {
            BinaryOp::Mul | BinaryOp::Div => {
                Ok(Value::Quantity(Quantity::new(scalar(op, a.value, b)?, a.unit)))
            }
            BinaryOp::Pow => {
                if b.fract() != 0.0 || b.abs() > f64::from(i32::MAX) {
                    return Err(EvaluationError::type_mismatch(
                        op,
                        "quantity",
                        "non-integral scalar",
                    ));
                }
                let exponent = b as i32;
                let unit = a.unit.powi(exponent).ok_or_else(|| unit_overflow(op, &a.unit))?;
                Ok(Value::quantity(a.value.powi(exponent), unit))
            }
            _ => Err(EvaluationError::UnitMismatch {
                op: op.to_string(),
                lhs: a.unit.to_string(),
                rhs: Unit::dimensionless().to_string(),
            }),
        },

        (Value::Scalar(a), Value::Quantity(b)) => match op {
            BinaryOp::Mul => Ok(Value::Quantity(Quantity::new(a * b.value, b.unit))),
            BinaryOp::Div => {
                let unit = b.unit.powi(-1).ok_or_else(|| unit_overflow(op, &b.unit))?;
                Ok(Value::quantity(scalar(op, a, b.value)?, unit))
            }
            BinaryOp::Pow => Err(EvaluationError::type_mismatch(op, "scalar", "quantity")),
            _ => Err(EvaluationError::UnitMismatch {
                op: op.to_string(),
                lhs: Unit::dimensionless().to_string(),
                rhs: b.unit.to_string(),
            }),
        },

        (lhs, rhs) => Err(EvaluationError::type_mismatch(
            op,
            lhs.type_name(),
            rhs.type_name(),
        )),
    }
}

fn scalar(op: BinaryOp, a: f64, b: f64) -> Result<f64> {
    match op {
        BinaryOp::Add => Ok(a + b),
        BinaryOp::Sub => Ok(a - b),
        BinaryOp::Mul => Ok(a * b),
        BinaryOp::Div | BinaryOp::Rem if b == 0.0 => Err(EvaluationError::DivisionByZero),
        BinaryOp::Div => Ok(a / b),
        BinaryOp::Rem => Ok(a % b),
        BinaryOp::Pow => Ok(a.powf(b)),
        _ => Err(EvaluationError::type_mismatch(op, "scalar", "scalar")),
    }
}

/// Expresses `quantity` in `unit`.
fn convert(op: BinaryOp, quantity: &Quantity, unit: &Unit, units: &UnitTable) -> Result<f64> {
    units
        .conversion_factor(&quantity.unit, unit)
        .map(|factor| quantity.value * factor)
        .ok_or_else(|| EvaluationError::UnitMismatch {
            op: op.to_string(),
            lhs: unit.to_string(),
            rhs: quantity.unit.to_string(),
        })
}

/// Result of a product or quotient; collapses to a scalar when the units
/// cancel out after normalisation (`kW / W`).
fn product(op: BinaryOp, value: f64, unit: Unit, units: &UnitTable) -> Result<Value> {
    let (factor, base) = units
        .normalize(&unit)
        .ok_or_else(|| unit_overflow(op, &unit))?;
    if base.is_dimensionless() {
        Ok(Value::Scalar(value * factor))
    } else {
        Ok(Value::Quantity(Quantity::new(value, unit)))
    }
}

fn unit_overflow(op: BinaryOp, unit: &Unit) -> EvaluationError {
    EvaluationError::UnitOverflow {
        op: op.to_string(),
        unit: unit.to_string(),
    }
}

fn unit_mismatch(op: BinaryOp, lhs: &Value, rhs: &Value) -> EvaluationError {
    let unit_of = |value: &Value| match value {
        Value::Quantity(quantity) => quantity.unit.to_string(),
        _ => Unit::dimensionless().to_string(),
    };
    EvaluationError::UnitMismatch {
        op: op.to_string(),
        lhs: unit_of(lhs),
        rhs: unit_of(rhs),
    }
}

/// Equality up to rounding introduced by unit conversion.
fn nearly_equal(a: f64, b: f64) -> bool {
    a == b || (a - b).abs() <= 4.0 * f64::EPSILON * a.abs().max(b.abs())
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use partscope_core::{
        identifier::Id,
        model::{ElementKind, ModelBuilder},
        value::EnumLiteral,
    };

    use super::*;

    fn kg(value: f64) -> Value {
        Value::quantity(value, Unit::symbol("kg"))
    }

    fn q(value: f64, unit: &str) -> Value {
        Value::quantity(value, unit.parse().unwrap())
    }

    fn eval(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value> {
        binary(op, lhs, rhs, &UnitTable::standard())
    }

    fn number(value: Value) -> f64 {
        value.as_number().expect("numeric value")
    }

    #[test]
    fn test_scalar_arithmetic() {
        assert_eq!(eval(BinaryOp::Add, Value::Scalar(2.0), Value::Scalar(3.0)), Ok(Value::Scalar(5.0)));
        assert_eq!(eval(BinaryOp::Rem, Value::Scalar(7.0), Value::Scalar(4.0)), Ok(Value::Scalar(3.0)));
        assert_eq!(eval(BinaryOp::Pow, Value::Scalar(2.0), Value::Scalar(10.0)), Ok(Value::Scalar(1024.0)));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(
            eval(BinaryOp::Div, Value::Scalar(1.0), Value::Scalar(0.0)),
            Err(EvaluationError::DivisionByZero)
        );
        assert_eq!(
            eval(BinaryOp::Rem, kg(1.0), kg(0.0)),
            Err(EvaluationError::DivisionByZero)
        );
        assert_eq!(
            eval(BinaryOp::Div, kg(1.0), Value::Scalar(0.0)),
            Err(EvaluationError::DivisionByZero)
        );
    }

    #[test]
    fn test_quantity_addition() {
        assert_eq!(eval(BinaryOp::Add, kg(5.0), kg(2.0)), Ok(kg(7.0)));
        assert!(matches!(
            eval(BinaryOp::Add, kg(5.0), q(2.0, "m")),
            Err(EvaluationError::UnitMismatch { .. })
        ));
    }

    #[test]
    fn test_addition_converts_to_left_unit() {
        let sum = eval(BinaryOp::Add, kg(5.0), q(200.0, "g")).unwrap();
        assert_approx_eq!(f64, number(sum.clone()), 5.2);
        assert!(matches!(sum, Value::Quantity(Quantity { ref unit, .. }) if *unit == Unit::symbol("kg")));
    }

    #[test]
    fn test_scalar_and_quantity_do_not_add() {
        assert_eq!(
            eval(BinaryOp::Add, Value::Scalar(1.0), kg(1.0)),
            Err(EvaluationError::UnitMismatch {
                op: "+".into(),
                lhs: "1".into(),
                rhs: "kg".into(),
            })
        );
        assert!(eval(BinaryOp::Sub, kg(1.0), Value::Scalar(1.0)).is_err());
    }

    #[test]
    fn test_units_combine() {
        let force = eval(BinaryOp::Mul, kg(2.0), q(9.81, "m/s^2")).unwrap();
        assert_eq!(force.to_string(), "19.62 [kg*m/s^2]");

        let speed = eval(BinaryOp::Div, q(100.0, "m"), q(10.0, "s")).unwrap();
        assert_eq!(speed, q(10.0, "m/s"));

        let frequency = eval(BinaryOp::Div, Value::Scalar(1.0), q(4.0, "s")).unwrap();
        assert_eq!(frequency, q(0.25, "1/s"));

        let area = eval(BinaryOp::Pow, q(3.0, "m"), Value::Scalar(2.0)).unwrap();
        assert_eq!(area, q(9.0, "m^2"));
    }

    #[test]
    fn test_cancelling_units_collapse() {
        assert_eq!(eval(BinaryOp::Div, kg(10.0), kg(4.0)), Ok(Value::Scalar(2.5)));

        let ratio = eval(BinaryOp::Div, q(1.5, "kW"), q(1200.0, "W")).unwrap();
        assert_approx_eq!(f64, number(ratio), 1.25);
    }

    #[test]
    fn test_non_integral_exponent_on_quantity() {
        assert!(matches!(
            eval(BinaryOp::Pow, kg(4.0), Value::Scalar(0.5)),
            Err(EvaluationError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_huge_exponent_is_an_error() {
        let err = eval(BinaryOp::Pow, q(3.0, "m^2"), Value::Scalar(f64::from(i32::MAX))).unwrap_err();
        assert_eq!(
            err,
            EvaluationError::UnitOverflow {
                op: "**".into(),
                unit: "m^2".into(),
            }
        );

        let huge = q(1.0, "m^2147483647");
        assert!(matches!(
            eval(BinaryOp::Mul, huge.clone(), q(1.0, "m")),
            Err(EvaluationError::UnitOverflow { .. })
        ));
        assert!(matches!(
            eval(BinaryOp::Div, huge, q(1.0, "1/m")),
            Err(EvaluationError::UnitOverflow { .. })
        ));
        assert!(matches!(
            eval(BinaryOp::Div, Value::Scalar(1.0), q(1.0, "m^-2147483648")),
            Err(EvaluationError::UnitOverflow { .. })
        ));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(eval(BinaryOp::Gt, kg(520.0), kg(500.0)), Ok(Value::Boolean(true)));
        assert_eq!(eval(BinaryOp::Le, q(1.5, "kW"), q(1500.0, "W")), Ok(Value::Boolean(true)));
        assert_eq!(eval(BinaryOp::Eq, q(1.0, "km"), q(1000.0, "m")), Ok(Value::Boolean(true)));
        assert_eq!(
            eval(BinaryOp::Lt, Value::Scalar(f64::NAN), Value::Scalar(1.0)),
            Ok(Value::Boolean(false))
        );
        assert!(eval(BinaryOp::Lt, kg(1.0), q(1.0, "s")).is_err());
    }

    #[test]
    fn test_enum_values_compare_by_identity() {
        let mut b = ModelBuilder::new();
        let color = b.add(None, ElementKind::EnumerationDefinition, Some("Color"));
        let red = b.add(Some(color), ElementKind::EnumerationLiteral, Some("red"));
        let brown = b.add(Some(color), ElementKind::EnumerationLiteral, Some("brown"));
        let red_value = || Value::EnumValue(EnumLiteral { literal: red, name: Id::new("red") });
        let brown_value = Value::EnumValue(EnumLiteral { literal: brown, name: Id::new("brown") });

        assert_eq!(eval(BinaryOp::Eq, red_value(), red_value()), Ok(Value::Boolean(true)));
        assert_eq!(eval(BinaryOp::Ne, red_value(), brown_value.clone()), Ok(Value::Boolean(true)));
        assert!(matches!(
            eval(BinaryOp::Lt, red_value(), brown_value),
            Err(EvaluationError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_logic_and_unary() {
        assert_eq!(
            eval(BinaryOp::Xor, Value::Boolean(true), Value::Boolean(true)),
            Ok(Value::Boolean(false))
        );
        assert!(eval(BinaryOp::And, Value::Boolean(true), Value::Scalar(1.0)).is_err());
        assert_eq!(unary(UnaryOp::Neg, kg(3.0)), Ok(kg(-3.0)));
        assert_eq!(unary(UnaryOp::Not, Value::Boolean(false)), Ok(Value::Boolean(true)));
        assert_eq!(
            unary(UnaryOp::Not, Value::Scalar(1.0)),
            Err(EvaluationError::InvalidOperand {
                op: "not".into(),
                operand: "scalar",
            })
        );
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(
            eval(
                BinaryOp::Add,
                Value::String("Rud".into()),
                Value::String("olph".into())
            ),
            Ok(Value::String("Rudolph".into()))
        );
    }
}
