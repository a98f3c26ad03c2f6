//! Lazy access to the features of composite values.

use indexmap::IndexMap;
use log::debug;

use partscope_core::{
    identifier::Id,
    model::ElementId,
    value::{CompositeRef, Value},
};

use crate::eval::{EvaluationError, Evaluator};

/// A composite value opened for inspection.
///
/// Nothing is evaluated when a composite is created. Each call to
/// [`Composite::evaluate`] runs a fresh query with the composite's element
/// as the scope, so nested composites can be explored one level at a time.
#[derive(Debug, Clone, Copy)]
pub struct Composite<'a> {
    handle: CompositeRef,
    evaluator: Evaluator<'a>,
}

impl<'a> Composite<'a> {
    pub fn new(handle: CompositeRef, evaluator: Evaluator<'a>) -> Self {
        Self { handle, evaluator }
    }

    /// Opens `value` if it is a composite handle.
    pub fn from_value(value: &Value, evaluator: Evaluator<'a>) -> Option<Self> {
        value
            .as_composite()
            .map(|handle| Self::new(handle, evaluator))
    }

    pub fn handle(&self) -> CompositeRef {
        self.handle
    }

    /// The part or feature this composite stands for.
    pub fn element(&self) -> ElementId {
        self.handle.element
    }

    /// Names of the features the element declares itself, in declaration
    /// order.
    pub fn feature_names(&self) -> Vec<String> {
        let model = self.evaluator.model();
        model
            .owned_features(self.element())
            .filter_map(|feature| model.element(feature).name())
            .map(|name| name.to_string())
            .collect()
    }

    /// Names of every feature visible in the element, inherited ones
    /// included, with each redefinition chain listed once.
    pub fn effective_feature_names(&self) -> Vec<String> {
        let model = self.evaluator.model();
        self.evaluator
            .resolver()
            .visible_features(self.element())
            .into_iter()
            .filter_map(|feature| model.element(feature).name())
            .map(|name| name.to_string())
            .collect()
    }

    /// Evaluates the feature `name` with the composite's element as scope.
    ///
    /// # Errors
    ///
    /// [`EvaluationError::UnresolvedReference`] if the element has no such
    /// feature, or any error raised while evaluating it.
    pub fn evaluate(&self, name: &str) -> Result<Value, EvaluationError> {
        let model = self.evaluator.model();
        let feature = model
            .lookup_feature(self.element(), Id::new(name))
            .ok_or_else(|| EvaluationError::UnresolvedReference {
                name: name.to_string(),
                scope: model.path_of(self.element()),
            })?;
        self.evaluator.evaluate_feature(feature, self.element())
    }

    /// Evaluates every visible feature, in the order of
    /// [`Composite::effective_feature_names`].
    ///
    /// Stops at the first failing feature.
    pub fn evaluate_all(&self) -> Result<IndexMap<String, Value>, EvaluationError> {
        let names = self.effective_feature_names();
        debug!(
            element:% = self.evaluator.model().path_of(self.element()),
            features = names.len();
            "Materializing composite"
        );

        names
            .into_iter()
            .map(|name| {
                let value = self.evaluate(&name)?;
                Ok((name, value))
            })
            .collect()
    }

    /// Opens the value of feature `name` if it is itself a composite.
    pub fn nested(&self, name: &str) -> Result<Option<Composite<'a>>, EvaluationError> {
        let value = self.evaluate(name)?;
        Ok(Self::from_value(&value, self.evaluator))
    }
}

#[cfg(test)]
mod tests {
    use partscope_core::{
        expr::Expr,
        model::{ElementKind, Model, ModelBuilder},
    };

    use super::*;
    use crate::eval::Environment;

    /// Features { nose = 1; eyes = 2 }
    /// Reindeer { weight = 500; features : Features }
    /// Rudolph :> Reindeer { redefines features { :>> nose = 9 } }
    fn model() -> (Model, ElementId, ElementId) {
        let mut b = ModelBuilder::new();
        let features = b.add(None, ElementKind::AttributeDefinition, Some("Features"));
        let nose = b.add(Some(features), ElementKind::Feature, Some("nose"));
        b.set_value(nose, Expr::number(1.0));
        let eyes = b.add(Some(features), ElementKind::Feature, Some("eyes"));
        b.set_value(eyes, Expr::number(2.0));

        let reindeer = b.add(None, ElementKind::PartDefinition, Some("Reindeer"));
        let weight = b.add(Some(reindeer), ElementKind::Feature, Some("weight"));
        b.set_value(weight, Expr::number(500.0));
        let reindeer_features = b.add(Some(reindeer), ElementKind::Feature, Some("features"));
        b.add_general(reindeer_features, features);

        let rudolph = b.add(None, ElementKind::PartDefinition, Some("Rudolph"));
        b.add_general(rudolph, reindeer);
        let rudolph_features = b.add(Some(rudolph), ElementKind::Feature, Some("features"));
        b.set_redefines(rudolph_features, reindeer_features);
        let rudolph_nose = b.add(Some(rudolph_features), ElementKind::Feature, Some("nose"));
        b.set_redefines(rudolph_nose, nose);
        b.set_value(rudolph_nose, Expr::number(9.0));

        (b.build(), reindeer, rudolph)
    }

    #[test]
    fn test_feature_names() {
        let (model, _, rudolph) = model();
        let env = Environment::default();
        let ev = Evaluator::new(&model, &env);
        let composite = Composite::new(
            CompositeRef {
                element: rudolph,
                origin: rudolph,
            },
            ev,
        );

        assert_eq!(composite.feature_names(), ["features"]);
        assert_eq!(composite.effective_feature_names(), ["features", "weight"]);
    }

    #[test]
    fn test_nested_composites_evaluate_lazily() {
        let (model, reindeer, rudolph) = model();
        let env = Environment::default();
        let ev = Evaluator::new(&model, &env);

        let plain = Composite::new(
            CompositeRef {
                element: reindeer,
                origin: reindeer,
            },
            ev,
        );
        let features = plain.nested("features").unwrap().unwrap();
        assert_eq!(features.evaluate("nose").unwrap(), Value::Scalar(1.0));

        let red = Composite::new(
            CompositeRef {
                element: rudolph,
                origin: rudolph,
            },
            ev,
        );
        let features = red.nested("features").unwrap().unwrap();
        let values = features.evaluate_all().unwrap();
        assert_eq!(values.get("nose"), Some(&Value::Scalar(9.0)));
        assert_eq!(values.get("eyes"), Some(&Value::Scalar(2.0)));
        assert_eq!(
            values.keys().collect::<Vec<_>>(),
            ["nose", "eyes"]
        );

        assert!(red.nested("weight").unwrap().is_none());
    }

    #[test]
    fn test_unknown_feature() {
        let (model, reindeer, _) = model();
        let env = Environment::default();
        let ev = Evaluator::new(&model, &env);
        let composite = Composite::new(
            CompositeRef {
                element: reindeer,
                origin: reindeer,
            },
            ev,
        );

        assert!(matches!(
            composite.evaluate("antlers").unwrap_err(),
            EvaluationError::UnresolvedReference { .. }
        ));
    }
}
