//! Scope-sensitive feature resolution.
//!
//! The same feature yields different expressions depending on the scope it
//! is accessed from: `Reindeer::weight` accessed in `Rudolph` is Rudolph's
//! redefinition of it. [`Resolver::resolve`] picks that *effective* feature
//! by following redefinition edges, never by name, so a feature that merely
//! shadows another by name does not override it.

use std::collections::HashSet;

use log::trace;
use thiserror::Error;

use partscope_core::{
    identifier::Id,
    model::{Ancestor, ElementId, Model},
};

/// Errors raised while resolving the effective feature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("feature `{feature}` is not reachable from scope `{scope}`")]
    NotReachable { feature: String, scope: String },

    #[error(
        "feature `{feature}` is redefined ambiguously in scope `{scope}`: {}",
        candidates.join(", ")
    )]
    Ambiguous {
        feature: String,
        scope: String,
        candidates: Vec<String>,
    },
}

/// A redefinition of the requested feature found in the scope's closure.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    feature: ElementId,
    depth: usize,
    /// Position of the owner in the breadth-first closure.
    order: usize,
}

/// Resolves features against scopes of one model.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    model: &'a Model,
}

impl<'a> Resolver<'a> {
    pub fn new(model: &'a Model) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &'a Model {
        self.model
    }

    /// Returns the feature whose expression is evaluated when `feature` is
    /// accessed in `scope`.
    ///
    /// Among the redefinitions of `feature` owned by the scope's general
    /// closure (including `feature` itself) the nearest one wins; equally
    /// near ones are ordered by the declaration order of the generalization
    /// edges. If the winner has no expression and no nested features of its
    /// own, the redefinition chain is followed upwards to the first feature
    /// that has one.
    ///
    /// # Errors
    ///
    /// - [`ResolutionError::NotReachable`] if no element of the scope's
    ///   closure owns `feature`.
    /// - [`ResolutionError::Ambiguous`] if one element owns two unrelated
    ///   redefinitions of `feature`.
    pub fn resolve(&self, feature: ElementId, scope: ElementId) -> Result<ElementId, ResolutionError> {
        let closure = self.model.general_closure(scope);

        let owner = self.model.element(feature).owner();
        if !owner.is_some_and(|owner| closure.iter().any(|ancestor| ancestor.id == owner)) {
            return Err(ResolutionError::NotReachable {
                feature: self.model.path_of(feature),
                scope: self.model.path_of(scope),
            });
        }

        let candidates = self.candidates(feature, &closure);
        let chosen = self.most_specific(feature, scope, &candidates)?;
        let effective = self.inherit_expression(chosen);

        trace!(
            feature:% = self.model.path_of(feature),
            scope:% = self.model.path_of(scope),
            effective:% = self.model.path_of(effective);
            "Resolved feature"
        );
        Ok(effective)
    }

    /// Features visible in `scope`, one per name, nearest first.
    ///
    /// The list starts with the scope's own features in declaration order,
    /// followed by inherited features whose names were not seen yet. A
    /// redefinition always hides the feature it redefines, because it is
    /// owned by an element nearer to the scope.
    pub fn visible_features(&self, scope: ElementId) -> Vec<ElementId> {
        let mut names: HashSet<Id> = HashSet::new();
        let mut features = Vec::new();

        for ancestor in self.model.general_closure(scope) {
            for feature in self.model.owned_features(ancestor.id) {
                let unseen = match self.model.element(feature).name() {
                    Some(name) => names.insert(name),
                    None => true,
                };
                if unseen {
                    features.push(feature);
                }
            }
        }
        features
    }

    /// Redefinitions of `feature` (and `feature` itself) owned by members of
    /// the closure, keeping only the ends of redefinition chains.
    fn candidates(&self, feature: ElementId, closure: &[Ancestor]) -> Vec<Candidate> {
        let all: Vec<Candidate> = closure
            .iter()
            .enumerate()
            .flat_map(|(order, ancestor)| {
                self.model
                    .owned_features(ancestor.id)
                    .filter(move |candidate| {
                        *candidate == feature
                            || self.model.redefines_transitively(*candidate, feature)
                    })
                    .map(move |candidate| Candidate {
                        feature: candidate,
                        depth: ancestor.depth,
                        order,
                    })
            })
            .collect();

        all.iter()
            .filter(|candidate| {
                !all.iter().any(|other| {
                    self.model
                        .redefines_transitively(other.feature, candidate.feature)
                })
            })
            .copied()
            .collect()
    }

    fn most_specific(
        &self,
        feature: ElementId,
        scope: ElementId,
        candidates: &[Candidate],
    ) -> Result<ElementId, ResolutionError> {
        let Some(best) = candidates
            .iter()
            .min_by_key(|candidate| (candidate.depth, candidate.order))
        else {
            // The owner of `feature` is in the closure, so `feature` or a
            // redefinition of it is always a candidate.
            return Ok(feature);
        };

        let tied: Vec<ElementId> = candidates
            .iter()
            .filter(|candidate| candidate.depth == best.depth && candidate.order == best.order)
            .map(|candidate| candidate.feature)
            .collect();

        if tied.len() > 1 {
            return Err(ResolutionError::Ambiguous {
                feature: self.model.path_of(feature),
                scope: self.model.path_of(scope),
                candidates: tied.iter().map(|id| self.model.path_of(*id)).collect(),
            });
        }
        Ok(best.feature)
    }

    /// Follows `redefines` edges while the feature neither has an expression
    /// nor owns nested features.
    fn inherit_expression(&self, feature: ElementId) -> ElementId {
        let mut current = feature;
        let mut visited = HashSet::from([current]);
        loop {
            let element = self.model.element(current);
            if element.value().is_some() || self.model.owned_features(current).next().is_some() {
                return current;
            }
            match element.redefines() {
                Some(next) if visited.insert(next) => current = next,
                _ => return current,
            }
        }
    }
}
