//! The element graph of a loaded structural model.
//!
//! A [`Model`] is an arena of [`Element`]s addressed by [`ElementId`]. Three
//! kinds of edges connect elements:
//!
//! - **ownership**: every element but the roots has exactly one owner, and
//!   owners list their members in declaration order;
//! - **generalization**: specializations of a definition, the typing of a
//!   usage, and the feature a redefinition overrides, in declaration order;
//! - **annotation**: comments that refer to other elements with `about`.
//!
//! Models are assembled once through a [`ModelBuilder`] and never change
//! afterwards, so any number of readers can query the same model at the
//! same time.

use std::{
    collections::{HashSet, VecDeque},
    fmt,
};

use log::trace;

use crate::{expr::Expr, identifier::Id};

/// Index of an element inside its [`Model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

impl ElementId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Variant tag of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Package,
    PartDefinition,
    PartUsage,
    AttributeDefinition,
    EnumerationDefinition,
    EnumerationLiteral,
    /// An attribute usage; carries a defining expression.
    Feature,
    Comment,
    Documentation,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Package => "Package",
            ElementKind::PartDefinition => "PartDefinition",
            ElementKind::PartUsage => "PartUsage",
            ElementKind::AttributeDefinition => "AttributeDefinition",
            ElementKind::EnumerationDefinition => "EnumerationDefinition",
            ElementKind::EnumerationLiteral => "EnumerationLiteral",
            ElementKind::Feature => "Feature",
            ElementKind::Comment => "Comment",
            ElementKind::Documentation => "Documentation",
        }
    }

    /// Kinds that can be looked up as features of a scope and redefined.
    pub fn is_feature(&self) -> bool {
        matches!(self, ElementKind::Feature | ElementKind::PartUsage)
    }

    pub fn is_part(&self) -> bool {
        matches!(self, ElementKind::PartDefinition | ElementKind::PartUsage)
    }

    pub fn is_definition(&self) -> bool {
        matches!(
            self,
            ElementKind::PartDefinition
                | ElementKind::AttributeDefinition
                | ElementKind::EnumerationDefinition
        )
    }

    pub fn is_annotation(&self) -> bool {
        matches!(self, ElementKind::Comment | ElementKind::Documentation)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A node of the element graph.
#[derive(Debug, Clone)]
pub struct Element {
    id: ElementId,
    kind: ElementKind,
    name: Option<Id>,
    qualified_name: Id,
    owner: Option<ElementId>,
    members: Vec<ElementId>,
    general: Vec<ElementId>,
    redefines: Option<ElementId>,
    value: Option<Expr>,
    multiplicity: Option<u32>,
    body: Option<String>,
    locale: Option<String>,
    about: Vec<ElementId>,
    annotated_by: Vec<ElementId>,
}

impl Element {
    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn name(&self) -> Option<Id> {
        self.name
    }

    /// The `::`-joined path from the model root; unique within the model.
    pub fn qualified_name(&self) -> Id {
        self.qualified_name
    }

    pub fn owner(&self) -> Option<ElementId> {
        self.owner
    }

    /// Owned elements in declaration order.
    pub fn members(&self) -> &[ElementId] {
        &self.members
    }

    /// Specializations (definitions) or typings (usages), in declaration order.
    pub fn general(&self) -> &[ElementId] {
        &self.general
    }

    /// The feature this feature redefines, if any.
    pub fn redefines(&self) -> Option<ElementId> {
        self.redefines
    }

    /// The defining expression of a feature.
    pub fn value(&self) -> Option<&Expr> {
        self.value.as_ref()
    }

    /// Multiplicity of a part usage; `1` unless declared.
    pub fn multiplicity(&self) -> u32 {
        self.multiplicity.unwrap_or(1)
    }

    /// Text of a comment or documentation element.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Locale tag of a documentation element.
    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    /// Elements a comment explicitly refers to.
    pub fn about(&self) -> &[ElementId] {
        &self.about
    }
}

/// A member of a scope's general closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ancestor {
    pub id: ElementId,
    /// Number of generalization edges between the scope and this element.
    pub depth: usize,
}

/// An immutable element graph.
#[derive(Debug, Clone, Default)]
pub struct Model {
    elements: Vec<Element>,
    roots: Vec<ElementId>,
}

impl Model {
    /// Returns the element with the given id.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not come from this model.
    pub fn element(&self, id: ElementId) -> &Element {
        &self.elements[id.0]
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Top-level elements in declaration order.
    pub fn roots(&self) -> &[ElementId] {
        &self.roots
    }

    /// Shorthand for the qualified name of `id` as a string.
    pub fn path_of(&self, id: ElementId) -> String {
        self.element(id).qualified_name.to_string()
    }

    /// Visits every element depth-first in declaration order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> + '_ {
        let mut stack: Vec<ElementId> = self.roots.iter().rev().copied().collect();
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            let element = self.element(id);
            stack.extend(element.members.iter().rev().copied());
            Some(element)
        })
    }

    /// Visits the elements whose kind is in `kinds`.
    pub fn elements_of_kind<'a>(
        &'a self,
        kinds: &'a [ElementKind],
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements()
            .filter(move |element| kinds.contains(&element.kind))
    }

    /// First element named `name` in traversal order.
    ///
    /// Names are only unique within their owner, so this is a convenience for
    /// small models rather than a precise lookup.
    pub fn find_by_name(&self, name: &str) -> Option<ElementId> {
        self.elements()
            .find(|element| element.name.is_some_and(|n| n == name))
            .map(Element::id)
    }

    pub fn find_by_qualified_name(&self, qualified_name: &str) -> Option<ElementId> {
        self.elements()
            .find(|element| element.qualified_name == qualified_name)
            .map(Element::id)
    }

    /// Direct member of `owner` (or root, for `None`) named `name`.
    pub fn child_by_name(&self, owner: Option<ElementId>, name: Id) -> Option<ElementId> {
        let candidates = match owner {
            Some(owner) => self.element(owner).members.as_slice(),
            None => self.roots.as_slice(),
        };
        candidates
            .iter()
            .copied()
            .find(|id| self.element(*id).name == Some(name))
    }

    /// Owned features and part usages of `id`, in declaration order.
    pub fn owned_features(&self, id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        self.element(id)
            .members
            .iter()
            .copied()
            .filter(|member| self.element(*member).kind.is_feature())
    }

    /// Owned comments and documentation of `id` followed by comments that
    /// refer to it from elsewhere.
    pub fn annotations(&self, id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        let element = self.element(id);
        element
            .members
            .iter()
            .copied()
            .filter(|member| {
                let member = self.element(*member);
                member.kind.is_annotation() && member.about.is_empty()
            })
            .chain(element.annotated_by.iter().copied())
    }

    /// Direct general types: specializations and typings, then the
    /// redefined feature.
    pub fn general_types(&self, id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        let element = self.element(id);
        element.general.iter().copied().chain(element.redefines)
    }

    /// Breadth-first walk over general types starting at `scope`.
    ///
    /// The scope itself comes first at depth 0. Each element is visited once,
    /// so diamonds are reported at their shortest depth and cycles terminate.
    /// Ties at the same depth keep declaration order of the generalization
    /// edges.
    pub fn general_closure(&self, scope: ElementId) -> Vec<Ancestor> {
        let mut visited = HashSet::from([scope]);
        let mut queue = VecDeque::from([Ancestor {
            id: scope,
            depth: 0,
        }]);
        let mut closure = Vec::new();

        while let Some(ancestor) = queue.pop_front() {
            for general in self.general_types(ancestor.id) {
                if visited.insert(general) {
                    queue.push_back(Ancestor {
                        id: general,
                        depth: ancestor.depth + 1,
                    });
                }
            }
            closure.push(ancestor);
        }
        closure
    }

    /// `true` if `general` is `id` or appears in its general closure.
    pub fn specializes(&self, id: ElementId, general: ElementId) -> bool {
        id == general
            || self
                .general_closure(id)
                .iter()
                .any(|ancestor| ancestor.id == general)
    }

    /// `true` if following `redefines` edges from `feature` reaches `target`.
    /// A feature does not redefine itself.
    pub fn redefines_transitively(&self, feature: ElementId, target: ElementId) -> bool {
        let mut visited = HashSet::new();
        let mut current = self.element(feature).redefines;
        while let Some(next) = current {
            if next == target {
                return true;
            }
            if !visited.insert(next) {
                return false;
            }
            current = self.element(next).redefines;
        }
        false
    }

    /// First feature named `name` owned by `scope` or by an element of its
    /// general closure, nearest first.
    pub fn lookup_feature(&self, scope: ElementId, name: Id) -> Option<ElementId> {
        self.general_closure(scope)
            .into_iter()
            .find_map(|ancestor| {
                self.owned_features(ancestor.id)
                    .find(|feature| self.element(*feature).name == Some(name))
            })
    }

    /// `scope[name]`: the feature `name` as seen from `scope`.
    pub fn feature(&self, scope: ElementId, name: &str) -> Option<ElementId> {
        self.lookup_feature(scope, Id::new(name))
    }

    /// Resolves a possibly qualified name the way it is written inside the
    /// namespace `from`: the first segment is searched in `from` and then in
    /// each enclosing namespace up to the roots; the remaining segments walk
    /// down through members, inherited features included.
    pub fn resolve_path(&self, from: Option<ElementId>, segments: &[Id]) -> Option<ElementId> {
        let (first, rest) = segments.split_first()?;

        let mut namespace = from;
        let start = loop {
            if let Some(found) = self.child_by_name(namespace, *first) {
                break found;
            }
            match namespace {
                Some(current) => namespace = self.element(current).owner,
                None => return None,
            }
        };

        rest.iter().try_fold(start, |current, segment| {
            self.child_by_name(Some(current), *segment)
                .or_else(|| self.lookup_feature(current, *segment))
        })
    }

    /// `true` if `id` or one of its general types owns features, i.e. a
    /// value of it has sub-features that can be evaluated.
    pub fn has_nested_features(&self, id: ElementId) -> bool {
        self.general_closure(id)
            .iter()
            .any(|ancestor| self.owned_features(ancestor.id).next().is_some())
    }
}

/// Incremental constructor for a [`Model`].
///
/// Elements are added top-down; edges between them may be added in any
/// order once both ends exist.
///
/// # Examples
///
/// ```
/// use partscope_core::{
///     expr::Expr,
///     model::{ElementKind, ModelBuilder},
/// };
///
/// let mut builder = ModelBuilder::new();
/// let reindeer = builder.add(None, ElementKind::PartDefinition, Some("Reindeer"));
/// let weight = builder.add(Some(reindeer), ElementKind::Feature, Some("weight"));
/// builder.set_value(weight, Expr::number(500.0));
///
/// let model = builder.build();
/// assert_eq!(model.feature(reindeer, "weight"), Some(weight));
/// assert_eq!(model.path_of(weight), "Reindeer::weight");
/// ```
#[derive(Debug, Default)]
pub struct ModelBuilder {
    model: Model,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an element under `owner` (or as a root) and returns its id.
    pub fn add(&mut self, owner: Option<ElementId>, kind: ElementKind, name: Option<&str>) -> ElementId {
        let id = ElementId(self.model.elements.len());
        let name = name.map(Id::new);
        let segment = name.unwrap_or_else(|| Id::anonymous(id.0));
        let qualified_name = match owner {
            Some(owner) => self.model.element(owner).qualified_name.join(segment),
            None => segment,
        };

        self.model.elements.push(Element {
            id,
            kind,
            name,
            qualified_name,
            owner,
            members: Vec::new(),
            general: Vec::new(),
            redefines: None,
            value: None,
            multiplicity: None,
            body: None,
            locale: None,
            about: Vec::new(),
            annotated_by: Vec::new(),
        });

        match owner {
            Some(owner) => self.model.elements[owner.0].members.push(id),
            None => self.model.roots.push(id),
        }
        id
    }

    /// Changes the kind of an element added earlier.
    pub fn set_kind(&mut self, id: ElementId, kind: ElementKind) {
        self.model.elements[id.0].kind = kind;
    }

    /// Appends a specialization or typing edge.
    pub fn add_general(&mut self, id: ElementId, general: ElementId) {
        self.model.elements[id.0].general.push(general);
    }

    pub fn set_redefines(&mut self, id: ElementId, redefined: ElementId) {
        self.model.elements[id.0].redefines = Some(redefined);
    }

    pub fn set_value(&mut self, id: ElementId, value: Expr) {
        self.model.elements[id.0].value = Some(value);
    }

    pub fn set_multiplicity(&mut self, id: ElementId, multiplicity: u32) {
        self.model.elements[id.0].multiplicity = Some(multiplicity);
    }

    pub fn set_body(&mut self, id: ElementId, body: impl Into<String>) {
        self.model.elements[id.0].body = Some(body.into());
    }

    pub fn set_locale(&mut self, id: ElementId, locale: impl Into<String>) {
        self.model.elements[id.0].locale = Some(locale.into());
    }

    /// Records that comment `annotation` refers to `target`.
    pub fn add_about(&mut self, annotation: ElementId, target: ElementId) {
        self.model.elements[annotation.0].about.push(target);
        self.model.elements[target.0].annotated_by.push(annotation);
    }

    /// Read access to the model built so far.
    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn build(self) -> Model {
        trace!(elements = self.model.len(); "Model built");
        self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Vehicle <- Car <- SportsCar, plus a diamond Amphibian :> Car, Boat.
    fn vehicles() -> (Model, [ElementId; 6]) {
        let mut b = ModelBuilder::new();
        let pkg = b.add(None, ElementKind::Package, Some("Vehicles"));
        let vehicle = b.add(Some(pkg), ElementKind::PartDefinition, Some("Vehicle"));
        let car = b.add(Some(pkg), ElementKind::PartDefinition, Some("Car"));
        let sports = b.add(Some(pkg), ElementKind::PartDefinition, Some("SportsCar"));
        let boat = b.add(Some(pkg), ElementKind::PartDefinition, Some("Boat"));
        let amphibian = b.add(Some(pkg), ElementKind::PartDefinition, Some("Amphibian"));
        b.add_general(car, vehicle);
        b.add_general(sports, car);
        b.add_general(boat, vehicle);
        b.add_general(amphibian, car);
        b.add_general(amphibian, boat);
        (b.build(), [pkg, vehicle, car, sports, boat, amphibian])
    }

    #[test]
    fn test_qualified_names_and_traversal_order() {
        let (model, [pkg, vehicle, car, ..]) = vehicles();

        assert_eq!(model.path_of(car), "Vehicles::Car");
        let order: Vec<_> = model.elements().map(Element::id).collect();
        assert_eq!(order[0], pkg);
        assert_eq!(order[1], vehicle);
        assert_eq!(order.len(), model.len());
    }

    #[test]
    fn test_general_closure_is_breadth_first() {
        let (model, [_, vehicle, car, _, boat, amphibian]) = vehicles();

        let closure = model.general_closure(amphibian);
        let ids: Vec<_> = closure.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![amphibian, car, boat, vehicle]);
        assert_eq!(closure[3].depth, 2);
    }

    #[test]
    fn test_general_closure_terminates_on_cycles() {
        let mut b = ModelBuilder::new();
        let a = b.add(None, ElementKind::PartDefinition, Some("A"));
        let c = b.add(None, ElementKind::PartDefinition, Some("C"));
        b.add_general(a, c);
        b.add_general(c, a);
        let model = b.build();

        assert_eq!(model.general_closure(a).len(), 2);
    }

    #[test]
    fn test_specializes() {
        let (model, [_, vehicle, car, sports, boat, _]) = vehicles();

        assert!(model.specializes(sports, vehicle));
        assert!(model.specializes(car, car));
        assert!(!model.specializes(boat, car));
    }

    #[test]
    fn test_lookup_feature_prefers_nearest() {
        let mut b = ModelBuilder::new();
        let base = b.add(None, ElementKind::PartDefinition, Some("Base"));
        let base_weight = b.add(Some(base), ElementKind::Feature, Some("weight"));
        let derived = b.add(None, ElementKind::PartDefinition, Some("Derived"));
        b.add_general(derived, base);
        let derived_weight = b.add(Some(derived), ElementKind::Feature, Some("weight"));
        b.set_redefines(derived_weight, base_weight);
        let model = b.build();

        assert_eq!(model.feature(base, "weight"), Some(base_weight));
        assert_eq!(model.feature(derived, "weight"), Some(derived_weight));
        assert_eq!(model.feature(derived, "height"), None);
        assert!(model.redefines_transitively(derived_weight, base_weight));
        assert!(!model.redefines_transitively(base_weight, derived_weight));
    }

    #[test]
    fn test_resolve_path_walks_outward_then_down() {
        let mut b = ModelBuilder::new();
        let pkg = b.add(None, ElementKind::Package, Some("Pkg"));
        let color = b.add(Some(pkg), ElementKind::EnumerationDefinition, Some("Color"));
        let red = b.add(Some(color), ElementKind::EnumerationLiteral, Some("red"));
        let part = b.add(Some(pkg), ElementKind::PartDefinition, Some("Part"));
        let model = b.build();

        let path = [Id::new("Color"), Id::new("red")];
        assert_eq!(model.resolve_path(Some(part), &path), Some(red));
        assert_eq!(
            model.resolve_path(None, &[Id::new("Pkg"), Id::new("Color")]),
            Some(color)
        );
        assert_eq!(model.resolve_path(Some(part), &[Id::new("Missing")]), None);
    }

    #[test]
    fn test_annotations_include_about_references() {
        let mut b = ModelBuilder::new();
        let pkg = b.add(None, ElementKind::Package, Some("Pkg"));
        let part = b.add(Some(pkg), ElementKind::PartDefinition, Some("Part"));
        let owned = b.add(Some(part), ElementKind::Comment, None);
        let remote = b.add(Some(pkg), ElementKind::Comment, Some("Remote"));
        b.add_about(remote, part);
        let model = b.build();

        let annotations: Vec<_> = model.annotations(part).collect();
        assert_eq!(annotations, vec![owned, remote]);
        assert_eq!(model.annotations(pkg).count(), 0);
    }

    #[test]
    fn test_find_by_name_first_match() {
        let (model, [_, vehicle, ..]) = vehicles();
        assert_eq!(model.find_by_name("Vehicle"), Some(vehicle));
        assert_eq!(model.find_by_name("Plane"), None);
        assert_eq!(model.find_by_qualified_name("Vehicles::Vehicle"), Some(vehicle));
    }
}
