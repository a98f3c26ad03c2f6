//! Tree-walking evaluation of defining expressions.
//!
//! An [`Evaluator`] evaluates an expression against a *scope*. Every name in
//! the expression is looked up from that scope, and every feature it reaches
//! is first passed through the [`Resolver`] so the scope's redefinitions
//! take effect. Composite results are returned as [`Value::CompositeRef`]
//! handles and never evaluated further on their own.

mod builtins;
mod environment;
mod error;
mod ops;

pub use environment::Environment;
pub use error::EvaluationError;

use log::{debug, trace};

use partscope_core::{
    expr::{BinaryOp, Expr, Literal, Path},
    model::{ElementId, ElementKind, Model},
    value::{CompositeRef, EnumLiteral, Value},
};

use crate::resolve::{ResolutionError, Resolver};

type Result<T> = std::result::Result<T, EvaluationError>;

/// Signature of a built-in function. Arguments arrive unevaluated so that
/// aggregates can treat them as type and feature names.
pub(crate) type Builtin = fn(&Evaluator<'_>, &mut Stack, &[Expr], Frame) -> Result<Value>;

/// Where an expression is being evaluated.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Frame {
    scope: ElementId,
    /// The feature whose expression is being evaluated, if any. Simple
    /// names bind among the features of its owner.
    origin: Option<ElementId>,
}

/// The (feature, scope) pairs currently being evaluated.
#[derive(Debug)]
pub(crate) struct Stack {
    active: Vec<(ElementId, ElementId)>,
    max_depth: usize,
}

impl Stack {
    fn new(max_depth: usize) -> Self {
        Self {
            active: Vec::new(),
            max_depth,
        }
    }

    fn enter(&mut self, model: &Model, feature: ElementId, scope: ElementId) -> Result<()> {
        if self.active.contains(&(feature, scope)) {
            return Err(EvaluationError::CyclicReference {
                feature: model.path_of(feature),
                scope: model.path_of(scope),
            });
        }
        if self.active.len() >= self.max_depth {
            return Err(EvaluationError::DepthLimitExceeded(self.max_depth));
        }
        self.active.push((feature, scope));
        Ok(())
    }

    fn leave(&mut self) {
        self.active.pop();
    }
}

/// Evaluates expressions of one model in a given [`Environment`].
///
/// Evaluation never mutates the model or the environment, so evaluators
/// are cheap to create and every query is independent: the same
/// `(expression, scope)` pair always yields the same result.
///
/// # Examples
///
/// ```
/// # use partscope::eval::{Environment, Evaluator};
/// # use partscope_core::{expr::Expr, model::{ElementKind, ModelBuilder}, value::Value};
/// let mut builder = ModelBuilder::new();
/// let reindeer = builder.add(None, ElementKind::PartDefinition, Some("Reindeer"));
/// let energy = builder.add(Some(reindeer), ElementKind::Feature, Some("energyLevel"));
/// builder.set_value(energy, Expr::number(100.0));
/// let model = builder.build();
///
/// let env = Environment::default();
/// let evaluator = Evaluator::new(&model, &env);
/// assert_eq!(evaluator.evaluate_feature(energy, reindeer).unwrap(), Value::Scalar(100.0));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    model: &'a Model,
    resolver: Resolver<'a>,
    env: &'a Environment,
}

impl<'a> Evaluator<'a> {
    pub fn new(model: &'a Model, env: &'a Environment) -> Self {
        Self {
            model,
            resolver: Resolver::new(model),
            env,
        }
    }

    pub fn model(&self) -> &'a Model {
        self.model
    }

    pub fn environment(&self) -> &'a Environment {
        self.env
    }

    pub fn resolver(&self) -> &Resolver<'a> {
        &self.resolver
    }

    /// Returns the effective feature for `feature` accessed in `scope`.
    ///
    /// See [`Resolver::resolve`].
    pub fn resolve(
        &self,
        feature: ElementId,
        scope: ElementId,
    ) -> std::result::Result<ElementId, ResolutionError> {
        self.resolver.resolve(feature, scope)
    }

    /// Evaluates `expr` with `scope` as the evaluation context.
    ///
    /// # Errors
    ///
    /// Any [`EvaluationError`]; resolution failures of referenced features
    /// are reported as [`EvaluationError::Resolution`].
    pub fn evaluate(&self, expr: &Expr, scope: ElementId) -> Result<Value> {
        let mut stack = Stack::new(self.env.max_depth());
        self.eval(&mut stack, expr, Frame { scope, origin: None })
    }

    /// Resolves `feature` in `scope` and evaluates the effective feature's
    /// expression in the same scope.
    ///
    /// A feature without an expression evaluates to a composite handle when
    /// it has nested features, and to [`Value::Absent`] otherwise. Part
    /// usages always evaluate to a composite handle.
    pub fn evaluate_feature(&self, feature: ElementId, scope: ElementId) -> Result<Value> {
        let kind = self.model.element(feature).kind();
        if !kind.is_feature() {
            return Err(EvaluationError::NotAValue {
                name: self.model.path_of(feature),
                kind: kind.as_str(),
            });
        }

        let mut stack = Stack::new(self.env.max_depth());
        let value = self.feature_value(&mut stack, feature, scope)?;
        debug!(
            feature:% = self.model.path_of(feature),
            scope:% = self.model.path_of(scope),
            value:% = value;
            "Evaluated feature"
        );
        Ok(value)
    }

    fn eval(&self, stack: &mut Stack, expr: &Expr, frame: Frame) -> Result<Value> {
        match expr {
            Expr::Literal(Literal::Number(value)) => Ok(Value::Scalar(*value)),
            Expr::Literal(Literal::Boolean(value)) => Ok(Value::Boolean(*value)),
            Expr::Literal(Literal::String(value)) => Ok(Value::String(value.clone())),
            Expr::Quantity { value, unit } => {
                if self.env.quantities() {
                    Ok(Value::quantity(*value, unit.clone()))
                } else {
                    Ok(Value::Scalar(*value))
                }
            }
            Expr::Reference(path) => {
                let target =
                    self.lookup(path, frame)
                        .ok_or_else(|| EvaluationError::UnresolvedReference {
                            name: path.to_string(),
                            scope: self.model.path_of(frame.scope),
                        })?;
                self.element_value(stack, target, frame.scope)
            }
            Expr::Member { target, member } => {
                let value = self.eval(stack, target, frame)?;
                let Some(composite) = value.as_composite() else {
                    return Err(EvaluationError::InvalidOperand {
                        op: format!(".{member}"),
                        operand: value.type_name(),
                    });
                };
                let feature = self
                    .model
                    .lookup_feature(composite.element, *member)
                    .ok_or_else(|| EvaluationError::UnresolvedReference {
                        name: member.to_string(),
                        scope: self.model.path_of(composite.element),
                    })?;
                self.element_value(stack, feature, composite.element)
            }
            Expr::Unary { op, operand } => ops::unary(*op, self.eval(stack, operand, frame)?),
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.eval(stack, lhs, frame)?;
                match (op, &lhs) {
                    (BinaryOp::And, Value::Boolean(false)) | (BinaryOp::Or, Value::Boolean(true)) => {
                        return Ok(lhs);
                    }
                    _ => {}
                }
                let rhs = self.eval(stack, rhs, frame)?;
                ops::binary(*op, lhs, rhs, self.env.units())
            }
            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => match self.eval(stack, condition, frame)? {
                Value::Boolean(true) => self.eval(stack, then_branch, frame),
                Value::Boolean(false) => self.eval(stack, else_branch, frame),
                other => Err(EvaluationError::InvalidOperand {
                    op: "if".to_string(),
                    operand: other.type_name(),
                }),
            },
            Expr::Call { function, args } => {
                let builtin = self
                    .env
                    .function(*function)
                    .ok_or_else(|| EvaluationError::UnknownFunction(function.to_string()))?;
                trace!(function:% = function, args = args.len(); "Calling built-in");
                builtin(self, stack, args, frame)
            }
        }
    }

    /// Finds the element a name refers to.
    ///
    /// Simple names are bound among the features visible from the owner of
    /// the feature being evaluated, so a same-named feature declared further
    /// down the scope's chain without `redefines` is never picked up; the
    /// bound feature is then resolved against the scope by the caller. With
    /// no such owner, or no match there, the scope's general closure is
    /// searched. Otherwise the name is resolved lexically outward from the
    /// scope and then from the feature being evaluated; both walks end at
    /// the model roots.
    fn lookup(&self, path: &Path, frame: Frame) -> Option<ElementId> {
        if path.is_simple() {
            let name = path.first();
            let declared_in = frame
                .origin
                .and_then(|origin| self.model.element(origin).owner());
            let feature = declared_in
                .and_then(|owner| self.model.lookup_feature(owner, name))
                .or_else(|| self.model.lookup_feature(frame.scope, name));
            if feature.is_some() {
                return feature;
            }
        }
        self.model
            .resolve_path(Some(frame.scope), path.segments())
            .or_else(|| {
                frame
                    .origin
                    .and_then(|origin| self.model.resolve_path(Some(origin), path.segments()))
            })
    }

    /// The value of a referenced element as seen from `scope`.
    fn element_value(&self, stack: &mut Stack, target: ElementId, scope: ElementId) -> Result<Value> {
        let element = self.model.element(target);
        // Features outside the scope's closure are evaluated in their owner.
        let reachable = element
            .owner()
            .is_some_and(|owner| self.model.specializes(scope, owner));

        match element.kind() {
            ElementKind::Feature => {
                let scope = match element.owner() {
                    Some(_) if reachable => scope,
                    Some(owner) => owner,
                    None => target,
                };
                self.feature_value(stack, target, scope)
            }
            ElementKind::PartUsage => {
                let part = if reachable {
                    self.resolver.resolve(target, scope)?
                } else {
                    target
                };
                Ok(Value::CompositeRef(CompositeRef {
                    element: part,
                    origin: scope,
                }))
            }
            kind if kind.is_definition() => Ok(Value::CompositeRef(CompositeRef {
                element: target,
                origin: scope,
            })),
            ElementKind::EnumerationLiteral => Ok(Value::EnumValue(EnumLiteral {
                literal: target,
                name: element.name().unwrap_or_else(|| element.qualified_name()),
            })),
            kind => Err(EvaluationError::NotAValue {
                name: self.model.path_of(target),
                kind: kind.as_str(),
            }),
        }
    }

    fn feature_value(&self, stack: &mut Stack, feature: ElementId, scope: ElementId) -> Result<Value> {
        let effective = match self.model.element(feature).owner() {
            Some(_) => self.resolver.resolve(feature, scope)?,
            None => feature,
        };

        stack.enter(self.model, effective, scope)?;
        let value = self.effective_value(stack, effective, scope);
        stack.leave();
        value
    }

    fn effective_value(&self, stack: &mut Stack, effective: ElementId, scope: ElementId) -> Result<Value> {
        let element = self.model.element(effective);
        match element.value() {
            Some(expr) => self.eval(
                stack,
                expr,
                Frame {
                    scope,
                    origin: Some(effective),
                },
            ),
            None if element.kind().is_part() || self.model.has_nested_features(effective) => {
                Ok(Value::CompositeRef(CompositeRef {
                    element: effective,
                    origin: scope,
                }))
            }
            None => Ok(Value::Absent),
        }
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;
    use partscope_core::{
        expr::UnaryOp,
        model::ModelBuilder,
        unit::Unit,
        value::Quantity,
    };

    use super::*;
    use crate::config::EvaluationConfig;

    fn kg(value: f64) -> Value {
        Value::Quantity(Quantity::new(value, Unit::symbol("kg")))
    }

    /// Reindeer { weight = 500 [kg]; doubled = weight * 2; features }
    /// Rudolph :> Reindeer { redefines weight = 520 [kg] }
    /// Sleigh { part rudolph : Rudolph; part team : Reindeer[8]; ... }
    struct Fixture {
        model: Model,
        reindeer: ElementId,
        rudolph: ElementId,
        sleigh: ElementId,
        weight: ElementId,
        rudolph_weight: ElementId,
        doubled: ElementId,
    }

    fn fixture() -> Fixture {
        let mut b = ModelBuilder::new();
        let package = b.add(None, ElementKind::Package, Some("Herd"));

        let color = b.add(Some(package), ElementKind::EnumerationDefinition, Some("Color"));
        b.add(Some(color), ElementKind::EnumerationLiteral, Some("red"));
        b.add(Some(color), ElementKind::EnumerationLiteral, Some("brown"));

        let reindeer = b.add(Some(package), ElementKind::PartDefinition, Some("Reindeer"));
        let weight = b.add(Some(reindeer), ElementKind::Feature, Some("weight"));
        b.set_value(weight, Expr::quantity(500.0, Unit::symbol("kg")));
        let doubled = b.add(Some(reindeer), ElementKind::Feature, Some("doubled"));
        b.set_value(
            doubled,
            Expr::binary(BinaryOp::Mul, Expr::reference("weight"), Expr::number(2.0)),
        );
        let nose = b.add(Some(reindeer), ElementKind::Feature, Some("nose"));
        b.set_value(nose, Expr::reference("Color::brown"));

        let rudolph = b.add(Some(package), ElementKind::PartDefinition, Some("Rudolph"));
        b.add_general(rudolph, reindeer);
        let rudolph_weight = b.add(Some(rudolph), ElementKind::Feature, Some("weight"));
        b.set_redefines(rudolph_weight, weight);
        b.set_value(rudolph_weight, Expr::quantity(520.0, Unit::symbol("kg")));
        let rudolph_nose = b.add(Some(rudolph), ElementKind::Feature, Some("nose"));
        b.set_redefines(rudolph_nose, nose);
        b.set_value(rudolph_nose, Expr::reference("Color::red"));

        let sleigh = b.add(Some(package), ElementKind::PartDefinition, Some("Sleigh"));
        let leader = b.add(Some(sleigh), ElementKind::PartUsage, Some("rudolph"));
        b.add_general(leader, rudolph);
        let team = b.add(Some(sleigh), ElementKind::PartUsage, Some("team"));
        b.add_general(team, reindeer);
        b.set_multiplicity(team, 8);
        let count = b.add(Some(sleigh), ElementKind::Feature, Some("count"));
        b.set_value(count, Expr::call("count", vec![Expr::reference("Reindeer")]));
        let total = b.add(Some(sleigh), ElementKind::Feature, Some("total"));
        b.set_value(
            total,
            Expr::call(
                "sum",
                vec![Expr::reference("Reindeer"), Expr::reference("weight")],
            ),
        );
        let leader_weight = b.add(Some(sleigh), ElementKind::Feature, Some("leaderWeight"));
        b.set_value(leader_weight, Expr::member(Expr::reference("rudolph"), "weight"));

        Fixture {
            model: b.build(),
            reindeer,
            rudolph,
            sleigh,
            weight,
            rudolph_weight,
            doubled,
        }
    }

    fn feature(f: &Fixture, scope: ElementId, name: &str) -> ElementId {
        f.model.feature(scope, name).unwrap()
    }

    #[test]
    fn test_feature_value_depends_on_scope() {
        let f = fixture();
        let env = Environment::default();
        let ev = Evaluator::new(&f.model, &env);

        assert_eq!(ev.evaluate_feature(f.weight, f.reindeer).unwrap(), kg(500.0));
        assert_eq!(ev.resolve(f.weight, f.rudolph).unwrap(), f.rudolph_weight);
        assert_eq!(ev.evaluate_feature(f.weight, f.rudolph).unwrap(), kg(520.0));
    }

    #[test]
    fn test_inherited_expression_sees_redefinitions() {
        let f = fixture();
        let env = Environment::default();
        let ev = Evaluator::new(&f.model, &env);

        assert_eq!(ev.evaluate_feature(f.doubled, f.reindeer).unwrap(), kg(1000.0));
        assert_eq!(ev.evaluate_feature(f.doubled, f.rudolph).unwrap(), kg(1040.0));
    }

    #[test]
    fn test_shadowing_feature_does_not_override() {
        let mut b = ModelBuilder::new();
        let reindeer = b.add(None, ElementKind::PartDefinition, Some("Reindeer"));
        let weight = b.add(Some(reindeer), ElementKind::Feature, Some("weight"));
        b.set_value(weight, Expr::number(500.0));
        let doubled = b.add(Some(reindeer), ElementKind::Feature, Some("doubled"));
        b.set_value(
            doubled,
            Expr::binary(BinaryOp::Mul, Expr::reference("weight"), Expr::number(2.0)),
        );
        let dasher = b.add(None, ElementKind::PartDefinition, Some("Dasher"));
        b.add_general(dasher, reindeer);
        // Same name, no redefinition edge
        let dasher_weight = b.add(Some(dasher), ElementKind::Feature, Some("weight"));
        b.set_value(dasher_weight, Expr::number(480.0));
        let model = b.build();

        let env = Environment::default();
        let ev = Evaluator::new(&model, &env);

        assert_eq!(ev.evaluate_feature(doubled, dasher).unwrap(), Value::Scalar(1000.0));
        assert_eq!(ev.resolver().resolve(weight, dasher).unwrap(), weight);
        // Dasher's own feature is still reachable by itself
        assert_eq!(
            ev.evaluate_feature(dasher_weight, dasher).unwrap(),
            Value::Scalar(480.0)
        );
    }

    #[test]
    fn test_unreachable_feature() {
        let f = fixture();
        let env = Environment::default();
        let ev = Evaluator::new(&f.model, &env);

        let err = ev.evaluate_feature(f.rudolph_weight, f.reindeer).unwrap_err();
        assert!(matches!(
            err,
            EvaluationError::Resolution(ResolutionError::NotReachable { .. })
        ));
    }

    #[test]
    fn test_enum_references() {
        let f = fixture();
        let env = Environment::default();
        let ev = Evaluator::new(&f.model, &env);

        let nose = feature(&f, f.rudolph, "nose");
        let Value::EnumValue(literal) = ev.evaluate_feature(nose, f.rudolph).unwrap() else {
            panic!("expected an enum value");
        };
        assert_eq!(literal.name, "red");

        let is_red = Expr::binary(
            BinaryOp::Eq,
            Expr::reference("nose"),
            Expr::reference("Color::red"),
        );
        assert_eq!(ev.evaluate(&is_red, f.rudolph).unwrap(), Value::Boolean(true));
        assert_eq!(ev.evaluate(&is_red, f.reindeer).unwrap(), Value::Boolean(false));
    }

    #[test]
    fn test_part_usage_is_composite() {
        let f = fixture();
        let env = Environment::default();
        let ev = Evaluator::new(&f.model, &env);

        let leader = feature(&f, f.sleigh, "rudolph");
        let value = ev.evaluate_feature(leader, f.sleigh).unwrap();
        assert_eq!(
            value.as_composite(),
            Some(CompositeRef {
                element: leader,
                origin: f.sleigh
            })
        );

        let leader_weight = feature(&f, f.sleigh, "leaderWeight");
        assert_eq!(ev.evaluate_feature(leader_weight, f.sleigh).unwrap(), kg(520.0));
    }

    #[test]
    fn test_aggregates_weight_multiplicity() {
        let f = fixture();
        let env = Environment::default();
        let ev = Evaluator::new(&f.model, &env);

        let count = feature(&f, f.sleigh, "count");
        assert_eq!(ev.evaluate_feature(count, f.sleigh).unwrap(), Value::Scalar(9.0));

        let total = feature(&f, f.sleigh, "total");
        let Value::Quantity(total) = ev.evaluate_feature(total, f.sleigh).unwrap() else {
            panic!("expected a quantity");
        };
        assert_approx_eq!(f64, total.value, 520.0 + 8.0 * 500.0);
        assert_eq!(total.unit, Unit::symbol("kg"));

        let heaviest = Expr::call(
            "max",
            vec![Expr::reference("Reindeer"), Expr::reference("weight")],
        );
        assert_eq!(ev.evaluate(&heaviest, f.sleigh).unwrap(), kg(520.0));

        let lightest = Expr::call(
            "min",
            vec![Expr::reference("Reindeer"), Expr::reference("weight")],
        );
        assert_eq!(ev.evaluate(&lightest, f.sleigh).unwrap(), kg(500.0));
    }

    #[test]
    fn test_aggregate_argument_errors() {
        let f = fixture();
        let env = Environment::default();
        let ev = Evaluator::new(&f.model, &env);

        let err = ev
            .evaluate(&Expr::call("count", vec![]), f.sleigh)
            .unwrap_err();
        assert!(matches!(
            err,
            EvaluationError::ArityMismatch {
                expected: 1,
                found: 0,
                ..
            }
        ));

        let err = ev
            .evaluate(&Expr::call("count", vec![Expr::number(1.0)]), f.sleigh)
            .unwrap_err();
        assert!(matches!(err, EvaluationError::InvalidArgument { .. }));

        // No reindeer inside a reindeer
        let err = ev
            .evaluate(
                &Expr::call(
                    "avg",
                    vec![Expr::reference("Reindeer"), Expr::reference("weight")],
                ),
                f.reindeer,
            )
            .unwrap_err();
        assert!(matches!(err, EvaluationError::InvalidArgument { .. }));
    }

    #[test]
    fn test_numeric_functions_keep_units() {
        let f = fixture();
        let env = Environment::default();
        let ev = Evaluator::new(&f.model, &env);

        let rounded = Expr::call("round", vec![Expr::quantity(2.6, Unit::symbol("kg"))]);
        assert_eq!(ev.evaluate(&rounded, f.sleigh).unwrap(), kg(3.0));

        let area: Unit = "m^2".parse().unwrap();
        let side = Expr::call("sqrt", vec![Expr::quantity(16.0, area)]);
        assert_eq!(
            ev.evaluate(&side, f.sleigh).unwrap(),
            Value::Quantity(Quantity::new(4.0, Unit::symbol("m")))
        );

        let negative = Expr::call(
            "sqrt",
            vec![Expr::unary(UnaryOp::Neg, Expr::number(4.0))],
        );
        assert!(matches!(
            ev.evaluate(&negative, f.sleigh).unwrap_err(),
            EvaluationError::InvalidArgument { .. }
        ));
    }

    #[test]
    fn test_unknown_function_and_reference() {
        let f = fixture();
        let env = Environment::default();
        let ev = Evaluator::new(&f.model, &env);

        assert_eq!(
            ev.evaluate(&Expr::call("simulate", vec![]), f.sleigh)
                .unwrap_err(),
            EvaluationError::UnknownFunction("simulate".to_string())
        );
        assert_eq!(
            ev.evaluate(&Expr::reference("height"), f.reindeer)
                .unwrap_err(),
            EvaluationError::UnresolvedReference {
                name: "height".to_string(),
                scope: "Herd::Reindeer".to_string(),
            }
        );
    }

    #[test]
    fn test_short_circuit_and_conditional() {
        let f = fixture();
        let env = Environment::default();
        let ev = Evaluator::new(&f.model, &env);

        // The right operand would fail to resolve
        let guarded = Expr::binary(
            BinaryOp::And,
            Expr::Literal(Literal::Boolean(false)),
            Expr::reference("missing"),
        );
        assert_eq!(ev.evaluate(&guarded, f.reindeer).unwrap(), Value::Boolean(false));

        let choice = Expr::conditional(
            Expr::binary(
                BinaryOp::Gt,
                Expr::reference("weight"),
                Expr::quantity(510.0, Unit::symbol("kg")),
            ),
            Expr::Literal(Literal::String("heavy".into())),
            Expr::Literal(Literal::String("light".into())),
        );
        assert_eq!(
            ev.evaluate(&choice, f.rudolph).unwrap(),
            Value::String("heavy".into())
        );
        assert_eq!(
            ev.evaluate(&choice, f.reindeer).unwrap(),
            Value::String("light".into())
        );

        let bad = Expr::conditional(Expr::number(1.0), Expr::number(1.0), Expr::number(2.0));
        assert!(matches!(
            ev.evaluate(&bad, f.reindeer).unwrap_err(),
            EvaluationError::InvalidOperand { .. }
        ));
    }

    #[test]
    fn test_cyclic_reference() {
        let mut b = ModelBuilder::new();
        let part = b.add(None, ElementKind::PartDefinition, Some("Loop"));
        let a = b.add(Some(part), ElementKind::Feature, Some("a"));
        b.set_value(a, Expr::reference("b"));
        let c = b.add(Some(part), ElementKind::Feature, Some("b"));
        b.set_value(c, Expr::binary(BinaryOp::Add, Expr::reference("a"), Expr::number(1.0)));
        let model = b.build();

        let env = Environment::default();
        let ev = Evaluator::new(&model, &env);
        assert_eq!(
            ev.evaluate_feature(a, part).unwrap_err(),
            EvaluationError::CyclicReference {
                feature: "Loop::a".to_string(),
                scope: "Loop".to_string(),
            }
        );
    }

    #[test]
    fn test_depth_limit() {
        let mut b = ModelBuilder::new();
        let part = b.add(None, ElementKind::PartDefinition, Some("Chain"));
        let a = b.add(Some(part), ElementKind::Feature, Some("a"));
        b.set_value(a, Expr::reference("b"));
        let c = b.add(Some(part), ElementKind::Feature, Some("b"));
        b.set_value(c, Expr::reference("c"));
        let d = b.add(Some(part), ElementKind::Feature, Some("c"));
        b.set_value(d, Expr::number(1.0));
        let model = b.build();

        let env = Environment::new(&EvaluationConfig::new(true, 2));
        let ev = Evaluator::new(&model, &env);
        assert_eq!(
            ev.evaluate_feature(a, part).unwrap_err(),
            EvaluationError::DepthLimitExceeded(2)
        );
        assert_eq!(ev.evaluate_feature(c, part).unwrap(), Value::Scalar(1.0));
    }

    #[test]
    fn test_quantities_disabled() {
        let f = fixture();
        let env = Environment::new(&EvaluationConfig::new(false, 64));
        let ev = Evaluator::new(&f.model, &env);

        assert_eq!(ev.evaluate_feature(f.weight, f.rudolph).unwrap(), Value::Scalar(520.0));
    }

    #[test]
    fn test_absent_and_not_a_value() {
        let mut b = ModelBuilder::new();
        let part = b.add(None, ElementKind::PartDefinition, Some("Sack"));
        let label = b.add(Some(part), ElementKind::Feature, Some("label"));
        let note = b.add(Some(part), ElementKind::Comment, None);
        b.set_body(note, "empty");
        let model = b.build();

        let env = Environment::default();
        let ev = Evaluator::new(&model, &env);
        assert_eq!(ev.evaluate_feature(label, part).unwrap(), Value::Absent);
        assert!(matches!(
            ev.evaluate_feature(note, part).unwrap_err(),
            EvaluationError::NotAValue { kind: "Comment", .. }
        ));
    }
}
