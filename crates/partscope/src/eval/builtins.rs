//! Built-in functions callable from expressions.
//!
//! Aggregates take a type as their first argument and range over the part
//! usages reachable from the scope (nested parts included) whose type
//! specializes it; a usage with multiplicity `k` counts as `k` instances.
//!
//! | function      | result                                          |
//! |---------------|-------------------------------------------------|
//! | `count(T)`    | number of instances                             |
//! | `size(T)`     | same as `count`                                 |
//! | `sum(T, f)`   | sum of feature `f` over all instances           |
//! | `avg(T, f)`   | `sum(T, f) / count(T)`                          |
//! | `min(T, f)`   | smallest value of `f`                           |
//! | `max(T, f)`   | largest value of `f`                            |
//! | `abs(x)`, `sqrt(x)`, `floor(x)`, `ceil(x)`, `round(x)` | numeric functions; units are kept |

use std::cmp::Ordering;

use indexmap::IndexMap;
use log::trace;

use partscope_core::{
    expr::{BinaryOp, Expr},
    identifier::Id,
    model::{ElementId, ElementKind},
    unit::UnitTable,
    value::{Quantity, Value},
};

use super::{Builtin, EvaluationError, Evaluator, Frame, Stack, ops};

type Result<T> = std::result::Result<T, EvaluationError>;

/// The fixed function table, in documentation order.
pub(super) fn standard() -> IndexMap<Id, Builtin> {
    let table: [(&str, Builtin); 11] = [
        ("count", count),
        ("size", size),
        ("sum", sum),
        ("avg", avg),
        ("min", min),
        ("max", max),
        ("abs", abs),
        ("sqrt", sqrt),
        ("floor", floor),
        ("ceil", ceil),
        ("round", round),
    ];
    table
        .into_iter()
        .map(|(name, function)| (Id::new(name), function))
        .collect()
}

// ============================================================================
// Aggregates
// ============================================================================

/// A part usage reached from the scope, with the number of instances it
/// stands for.
#[derive(Debug, Clone, Copy)]
struct Instance {
    part: ElementId,
    weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Aggregate {
    Sum,
    Avg,
    Min,
    Max,
}

impl Aggregate {
    fn name(self) -> &'static str {
        match self {
            Aggregate::Sum => "sum",
            Aggregate::Avg => "avg",
            Aggregate::Min => "min",
            Aggregate::Max => "max",
        }
    }
}

fn count(ev: &Evaluator<'_>, _stack: &mut Stack, args: &[Expr], frame: Frame) -> Result<Value> {
    count_instances("count", ev, args, frame)
}

fn size(ev: &Evaluator<'_>, _stack: &mut Stack, args: &[Expr], frame: Frame) -> Result<Value> {
    count_instances("size", ev, args, frame)
}

fn sum(ev: &Evaluator<'_>, stack: &mut Stack, args: &[Expr], frame: Frame) -> Result<Value> {
    aggregate(Aggregate::Sum, ev, stack, args, frame)
}

fn avg(ev: &Evaluator<'_>, stack: &mut Stack, args: &[Expr], frame: Frame) -> Result<Value> {
    aggregate(Aggregate::Avg, ev, stack, args, frame)
}

fn min(ev: &Evaluator<'_>, stack: &mut Stack, args: &[Expr], frame: Frame) -> Result<Value> {
    aggregate(Aggregate::Min, ev, stack, args, frame)
}

fn max(ev: &Evaluator<'_>, stack: &mut Stack, args: &[Expr], frame: Frame) -> Result<Value> {
    aggregate(Aggregate::Max, ev, stack, args, frame)
}

fn count_instances(name: &str, ev: &Evaluator<'_>, args: &[Expr], frame: Frame) -> Result<Value> {
    expect_arity(name, args, 1)?;
    let ty = type_argument(name, ev, &args[0], frame)?;
    let total: f64 = instances(ev, frame.scope, ty)
        .iter()
        .map(|instance| instance.weight)
        .sum();
    Ok(Value::Scalar(total))
}

fn aggregate(
    kind: Aggregate,
    ev: &Evaluator<'_>,
    stack: &mut Stack,
    args: &[Expr],
    frame: Frame,
) -> Result<Value> {
    let name = kind.name();
    expect_arity(name, args, 2)?;
    let ty = type_argument(name, ev, &args[0], frame)?;
    let feature = feature_argument(name, &args[1])?;

    let instances = instances(ev, frame.scope, ty);
    let model = ev.model();
    if instances.is_empty() {
        return match kind {
            Aggregate::Sum => Ok(Value::Scalar(0.0)),
            _ => Err(EvaluationError::invalid_argument(
                name,
                format!("no parts of type `{}` in `{}`", model.path_of(ty), model.path_of(frame.scope)),
            )),
        };
    }

    let units = ev.environment().units();
    let mut result: Option<Value> = None;
    let mut total_weight = 0.0;

    for instance in &instances {
        let target = model.lookup_feature(instance.part, feature).ok_or_else(|| {
            EvaluationError::invalid_argument(
                name,
                format!("`{}` has no feature `{feature}`", model.path_of(instance.part)),
            )
        })?;
        let value = ev.element_value(stack, target, instance.part)?;
        total_weight += instance.weight;

        result = Some(match (kind, result) {
            (Aggregate::Sum | Aggregate::Avg, None) => weighted(value, instance.weight, units)?,
            (Aggregate::Sum | Aggregate::Avg, Some(acc)) => ops::binary(
                BinaryOp::Add,
                acc,
                weighted(value, instance.weight, units)?,
                units,
            )?,
            (Aggregate::Min | Aggregate::Max, None) => value,
            (Aggregate::Min | Aggregate::Max, Some(best)) => {
                let wanted = if kind == Aggregate::Min {
                    Ordering::Less
                } else {
                    Ordering::Greater
                };
                match ops::order(BinaryOp::Lt, &value, &best, units)? {
                    Some(ordering) if ordering == wanted => value,
                    _ => best,
                }
            }
        });
    }

    let result = result.unwrap_or(Value::Absent);
    if kind == Aggregate::Avg {
        return ops::binary(BinaryOp::Div, result, Value::Scalar(total_weight), units);
    }
    Ok(result)
}

fn weighted(value: Value, weight: f64, units: &UnitTable) -> Result<Value> {
    if weight == 1.0 {
        Ok(value)
    } else {
        ops::binary(BinaryOp::Mul, value, Value::Scalar(weight), units)
    }
}

/// Part usages reachable from `scope` whose type specializes `ty`.
fn instances(ev: &Evaluator<'_>, scope: ElementId, ty: ElementId) -> Vec<Instance> {
    let mut found = Vec::new();
    let mut path = vec![scope];
    collect_instances(ev, scope, 1.0, ty, &mut path, &mut found);
    trace!(
        scope:% = ev.model().path_of(scope),
        ty:% = ev.model().path_of(ty),
        parts = found.len();
        "Collected aggregate instances"
    );
    found
}

fn collect_instances(
    ev: &Evaluator<'_>,
    scope: ElementId,
    weight: f64,
    ty: ElementId,
    path: &mut Vec<ElementId>,
    found: &mut Vec<Instance>,
) {
    let model = ev.model();
    for part in ev.resolver().visible_features(scope) {
        let element = model.element(part);
        if element.kind() != ElementKind::PartUsage || path.contains(&part) {
            continue;
        }

        let weight = weight * f64::from(element.multiplicity());
        if model.specializes(part, ty) {
            found.push(Instance { part, weight });
        }

        path.push(part);
        collect_instances(ev, part, weight, ty, path, found);
        path.pop();
    }
}

fn type_argument(name: &str, ev: &Evaluator<'_>, arg: &Expr, frame: Frame) -> Result<ElementId> {
    let Expr::Reference(path) = arg else {
        return Err(EvaluationError::invalid_argument(
            name,
            format!("expected a type name, got `{arg}`"),
        ));
    };
    let ty = ev.lookup(path, frame).ok_or_else(|| EvaluationError::UnresolvedReference {
        name: path.to_string(),
        scope: ev.model().path_of(frame.scope),
    })?;

    let kind = ev.model().element(ty).kind();
    if kind.is_definition() || kind == ElementKind::PartUsage {
        Ok(ty)
    } else {
        Err(EvaluationError::invalid_argument(
            name,
            format!("`{path}` is a {kind}, not a type"),
        ))
    }
}

fn feature_argument(name: &str, arg: &Expr) -> Result<Id> {
    match arg {
        Expr::Reference(path) if path.is_simple() => Ok(path.first()),
        _ => Err(EvaluationError::invalid_argument(
            name,
            format!("expected a feature name, got `{arg}`"),
        )),
    }
}

fn expect_arity(name: &str, args: &[Expr], expected: usize) -> Result<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(EvaluationError::ArityMismatch {
            function: name.to_string(),
            expected,
            found: args.len(),
        })
    }
}

// ============================================================================
// Numeric functions
// ============================================================================

fn abs(ev: &Evaluator<'_>, stack: &mut Stack, args: &[Expr], frame: Frame) -> Result<Value> {
    numeric("abs", ev, stack, args, frame, f64::abs)
}

fn floor(ev: &Evaluator<'_>, stack: &mut Stack, args: &[Expr], frame: Frame) -> Result<Value> {
    numeric("floor", ev, stack, args, frame, f64::floor)
}

fn ceil(ev: &Evaluator<'_>, stack: &mut Stack, args: &[Expr], frame: Frame) -> Result<Value> {
    numeric("ceil", ev, stack, args, frame, f64::ceil)
}

fn round(ev: &Evaluator<'_>, stack: &mut Stack, args: &[Expr], frame: Frame) -> Result<Value> {
    numeric("round", ev, stack, args, frame, f64::round)
}

fn sqrt(ev: &Evaluator<'_>, stack: &mut Stack, args: &[Expr], frame: Frame) -> Result<Value> {
    expect_arity("sqrt", args, 1)?;
    let value = ev.eval(stack, &args[0], frame)?;

    let magnitude = value.as_number().ok_or_else(|| {
        EvaluationError::invalid_argument("sqrt", format!("expected a number, got {}", value.type_name()))
    })?;
    if magnitude < 0.0 {
        return Err(EvaluationError::invalid_argument(
            "sqrt",
            format!("negative argument {value}"),
        ));
    }

    match value {
        Value::Quantity(quantity) => {
            let unit = quantity.unit.sqrt().ok_or_else(|| {
                EvaluationError::invalid_argument(
                    "sqrt",
                    format!("unit [{}] has no square root", quantity.unit),
                )
            })?;
            Ok(Value::quantity(magnitude.sqrt(), unit))
        }
        _ => Ok(Value::Scalar(magnitude.sqrt())),
    }
}

fn numeric(
    name: &str,
    ev: &Evaluator<'_>,
    stack: &mut Stack,
    args: &[Expr],
    frame: Frame,
    f: fn(f64) -> f64,
) -> Result<Value> {
    expect_arity(name, args, 1)?;
    match ev.eval(stack, &args[0], frame)? {
        Value::Scalar(value) => Ok(Value::Scalar(f(value))),
        Value::Quantity(quantity) => Ok(Value::Quantity(Quantity::new(
            f(quantity.value),
            quantity.unit,
        ))),
        other => Err(EvaluationError::invalid_argument(
            name,
            format!("expected a number, got {}", other.type_name()),
        )),
    }
}
