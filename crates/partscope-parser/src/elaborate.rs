//! Elaboration phase for the syntax tree.
//!
//! This module turns the parsed declarations into a [`Model`]. Names are
//! resolved in separate passes once every element exists, so declarations
//! may refer to elements declared later in the file:
//!
//! 1. **Declare** every element top-down, checking for duplicate names.
//! 2. **Generalize**: resolve typings and specializations lexically.
//! 3. **Redefine**: resolve redefined features through the owner's general
//!    types, outer declarations first.
//! 4. **Annotate**: resolve the `about` targets of comments.
//! 5. **Check** for generalization cycles and for features that shadow an
//!    inherited feature without redefining it.

use std::collections::HashMap;

use indexmap::IndexMap;
use log::{debug, info, trace};
use petgraph::{algo::tarjan_scc, graph::DiGraph};

use partscope_core::{
    identifier::Id,
    model::{ElementId, ElementKind, Model, ModelBuilder},
};

use crate::{
    Loaded, builtin_types,
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    parser_types::{
        Comment, Definition, DefinitionKind, Documentation, Member, QualifiedName, Usage,
        UsageKind,
    },
    span::{Span, Spanned},
};

/// A redefinition waiting for pass 3.
struct PendingRedefinition<'ast> {
    id: ElementId,
    target: &'ast Spanned<Id>,
    infer_kind: bool,
}

pub struct Builder<'ast> {
    builder: ModelBuilder,
    diagnostics: DiagnosticCollector,
    /// Declaration span of every element, used to label diagnostics.
    spans: HashMap<ElementId, Span>,
    generals: Vec<(ElementId, &'ast Spanned<QualifiedName>)>,
    redefinitions: Vec<PendingRedefinition<'ast>>,
    abouts: Vec<(ElementId, &'ast Spanned<QualifiedName>)>,
}

impl<'ast> Builder<'ast> {
    pub fn new() -> Self {
        Self {
            builder: ModelBuilder::new(),
            diagnostics: DiagnosticCollector::new(),
            spans: HashMap::new(),
            generals: Vec::new(),
            redefinitions: Vec::new(),
            abouts: Vec::new(),
        }
    }

    // ============================================================================
    // Main Entry Methods
    // ============================================================================

    pub fn build(mut self, document: &'ast [Member]) -> Result<Loaded, ParseError> {
        debug!(members = document.len(); "Declaring elements");
        self.declare_members(None, document);

        debug!(count = self.generals.len(); "Resolving typings and specializations");
        self.resolve_generals();

        debug!(count = self.redefinitions.len(); "Resolving redefinitions");
        self.resolve_redefinitions();

        debug!(count = self.abouts.len(); "Resolving annotation targets");
        self.resolve_abouts();

        if self.check_cycles() {
            self.check_shadowing();
        }

        let model = self.builder.build();
        let warnings = self.diagnostics.finish()?;
        info!(elements = model.len(), warnings = warnings.len(); "Model elaborated");

        Ok(Loaded::new(model, warnings))
    }

    fn model(&self) -> &Model {
        self.builder.model()
    }

    fn span_of(&self, id: ElementId) -> Span {
        self.spans.get(&id).copied().unwrap_or_default()
    }

    // ============================================================================
    // Pass 1: declarations
    // ============================================================================

    fn declare_members(&mut self, owner: Option<ElementId>, members: &'ast [Member]) {
        for member in members {
            self.declare_member(owner, member);
        }
    }

    fn declare_member(&mut self, owner: Option<ElementId>, member: &'ast Member) {
        match member {
            Member::Package { name, members } => {
                if let Some(id) = self.declare_named(owner, ElementKind::Package, name) {
                    self.declare_members(Some(id), members);
                }
            }
            Member::Definition(definition) => self.declare_definition(owner, definition),
            Member::Usage(usage) => self.declare_usage(owner, usage),
            Member::EnumerationLiteral(name) => {
                self.declare_named(owner, ElementKind::EnumerationLiteral, name);
            }
            Member::Comment(comment) => self.declare_comment(owner, comment),
            Member::Documentation(documentation) => {
                self.declare_documentation(owner, documentation)
            }
            Member::Import(name) => {
                trace!(import = format!("{:?}", name.inner()); "Ignoring import");
            }
        }
    }

    fn declare_definition(&mut self, owner: Option<ElementId>, definition: &'ast Definition) {
        let kind = match definition.kind {
            DefinitionKind::Part => ElementKind::PartDefinition,
            DefinitionKind::Attribute => ElementKind::AttributeDefinition,
            DefinitionKind::Enumeration => ElementKind::EnumerationDefinition,
        };

        let Some(id) = self.declare_named(owner, kind, &definition.name) else {
            return;
        };
        self.generals
            .extend(definition.specializes.iter().map(|general| (id, general)));
        self.declare_members(Some(id), &definition.members);
    }

    fn declare_usage(&mut self, owner: Option<ElementId>, usage: &'ast Usage) {
        let kind = match usage.kind {
            UsageKind::Part => ElementKind::PartUsage,
            // Fixed up once the redefined feature is known
            UsageKind::Attribute | UsageKind::Unspecified => ElementKind::Feature,
        };

        // The shorthand `:>> weight` declares a feature named `weight`
        let Some(name) = usage.name.as_ref().or(usage.redefines.as_ref()) else {
            return;
        };
        let Some(id) = self.declare_named(owner, kind, name) else {
            return;
        };

        if let Some(multiplicity) = &usage.multiplicity {
            match Self::multiplicity(*multiplicity.inner()) {
                Some(value) => self.builder.set_multiplicity(id, value),
                None => self.diagnostics.emit(
                    Diagnostic::error(format!(
                        "invalid multiplicity `{}`",
                        multiplicity.inner()
                    ))
                    .with_code(ErrorCode::E205)
                    .with_label(multiplicity.span(), "not a non-negative integer")
                    .with_help("write the number of instances, for example `[9]`"),
                ),
            }
        }

        if let Some(value) = &usage.value {
            self.builder.set_value(id, value.inner().clone());
        }

        self.generals.extend(
            usage
                .typed_by
                .iter()
                .chain(&usage.subsets)
                .map(|general| (id, general)),
        );

        if let Some(target) = &usage.redefines {
            self.redefinitions.push(PendingRedefinition {
                id,
                target,
                infer_kind: usage.kind == UsageKind::Unspecified,
            });
        }

        self.declare_members(Some(id), &usage.members);
    }

    fn declare_comment(&mut self, owner: Option<ElementId>, comment: &'ast Comment) {
        let id = match &comment.name {
            Some(name) => match self.declare_named(owner, ElementKind::Comment, name) {
                Some(id) => id,
                None => return,
            },
            None => {
                let id = self.builder.add(owner, ElementKind::Comment, None);
                self.spans.insert(id, comment.body.span());
                id
            }
        };

        self.builder.set_body(id, comment.body.inner().as_str());
        self.abouts.extend(comment.about.iter().map(|target| (id, target)));
    }

    fn declare_documentation(
        &mut self,
        owner: Option<ElementId>,
        documentation: &'ast Documentation,
    ) {
        let id = self.builder.add(owner, ElementKind::Documentation, None);
        self.spans.insert(id, documentation.body.span());
        self.builder
            .set_body(id, documentation.body.inner().as_str());
        if let Some(locale) = &documentation.locale {
            self.builder.set_locale(id, locale.inner().as_str());
        }
    }

    /// Adds a named element unless its owner already has a member with that
    /// name.
    fn declare_named(
        &mut self,
        owner: Option<ElementId>,
        kind: ElementKind,
        name: &Spanned<Id>,
    ) -> Option<ElementId> {
        if let Some(existing) = self.model().child_by_name(owner, *name.inner()) {
            let owner_name = owner.map_or_else(|| "the model root".to_string(), |owner| {
                format!("`{}`", self.model().path_of(owner))
            });
            self.diagnostics.emit(
                Diagnostic::error(format!(
                    "`{}` is declared multiple times in {owner_name}",
                    name.inner()
                ))
                .with_code(ErrorCode::E203)
                .with_label(name.span(), "duplicate declaration")
                .with_secondary_label(self.span_of(existing), "first declared here")
                .with_help("rename one of them, or use `redefines` to override an inherited feature"),
            );
            return None;
        }

        let id = self
            .builder
            .add(owner, kind, Some(name.inner().as_string().as_str()));
        self.spans.insert(id, name.span());
        trace!(id:% = id, kind:% = kind, name:% = name.inner(); "Declared element");
        Some(id)
    }

    fn multiplicity(value: f64) -> Option<u32> {
        (value.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&value))
            .then_some(value as u32)
    }

    // ============================================================================
    // Pass 2: typings and specializations
    // ============================================================================

    fn resolve_generals(&mut self) {
        for (id, general) in std::mem::take(&mut self.generals) {
            let owner = self.model().element(id).owner();

            match self.model().resolve_path(owner, general.inner()) {
                Some(target) if Self::is_type(self.model().element(target).kind()) => {
                    self.builder.add_general(id, target);
                }
                Some(target) => {
                    let kind = self.model().element(target).kind();
                    self.diagnostics.emit(
                        Diagnostic::error(format!(
                            "`{}` is a {kind} and cannot be used as a type",
                            Self::display_path(general.inner())
                        ))
                        .with_code(ErrorCode::E208)
                        .with_label(general.span(), "not a type")
                        .with_secondary_label(self.span_of(target), "declared here"),
                    );
                }
                None if builtin_types::is_builtin(general.inner()) => {
                    trace!(name = Self::display_path(general.inner()); "Library type");
                }
                None => {
                    self.diagnostics.emit(
                        Diagnostic::error(format!(
                            "undefined type `{}`",
                            Self::display_path(general.inner())
                        ))
                        .with_code(ErrorCode::E200)
                        .with_label(general.span(), "not found in this scope")
                        .with_help("declare it, or check the spelling and the enclosing package"),
                    );
                }
            }
        }
    }

    /// Kinds that can be specialized or used as the type of a usage.
    fn is_type(kind: ElementKind) -> bool {
        kind.is_definition() || kind.is_feature()
    }

    fn display_path(path: &[Id]) -> String {
        path.iter()
            .map(Id::to_string)
            .collect::<Vec<_>>()
            .join("::")
    }

    // ============================================================================
    // Pass 3: redefinitions
    // ============================================================================

    fn resolve_redefinitions(&mut self) {
        // Declaration order puts outer usages first, so a nested redefinition
        // sees the redefinition edge of its owner.
        for pending in std::mem::take(&mut self.redefinitions) {
            self.resolve_redefinition(pending);
        }
    }

    fn resolve_redefinition(&mut self, pending: PendingRedefinition<'ast>) {
        let PendingRedefinition {
            id,
            target,
            infer_kind,
        } = pending;
        let name = *target.inner();

        let Some(owner) = self.model().element(id).owner() else {
            self.emit_undefined_redefinition(id, target, None);
            return;
        };

        match self.inherited_feature(owner, name) {
            Some(redefined) => {
                trace!(feature:% = self.model().path_of(id), redefines:% = self.model().path_of(redefined); "Redefinition");
                self.builder.set_redefines(id, redefined);
                if infer_kind {
                    let kind = self.model().element(redefined).kind();
                    self.builder.set_kind(id, kind);
                }
            }
            None => self.emit_undefined_redefinition(id, target, Some(owner)),
        }
    }

    /// Nearest feature named `name` owned by a general type of `owner`.
    fn inherited_feature(&self, owner: ElementId, name: Id) -> Option<ElementId> {
        let model = self.model();
        model
            .general_closure(owner)
            .into_iter()
            .skip(1)
            .find_map(|ancestor| {
                model
                    .owned_features(ancestor.id)
                    .find(|feature| model.element(*feature).name() == Some(name))
            })
    }

    fn emit_undefined_redefinition(
        &mut self,
        id: ElementId,
        target: &Spanned<Id>,
        owner: Option<ElementId>,
    ) {
        let name = *target.inner();
        let elsewhere = self.model().elements().find(|element| {
            element.id() != id && element.kind().is_feature() && element.name() == Some(name)
        });

        let owner_name = owner.map_or_else(
            || "a top-level declaration".to_string(),
            |owner| format!("`{}`", self.model().path_of(owner)),
        );

        let diagnostic = match elsewhere {
            Some(feature) => Diagnostic::error(format!(
                "{owner_name} does not inherit the feature `{name}` it redefines"
            ))
            .with_code(ErrorCode::E202)
            .with_label(target.span(), "not inherited")
            .with_secondary_label(self.span_of(feature.id()), "declared here")
            .with_help("add a specialization or typing that brings the feature into scope"),
            None => Diagnostic::error(format!(
                "{owner_name} has no inherited feature `{name}` to redefine"
            ))
            .with_code(ErrorCode::E201)
            .with_label(target.span(), "not found in general types")
            .with_help("check the spelling, or declare the feature instead of redefining it"),
        };
        self.diagnostics.emit(diagnostic);
    }

    // ============================================================================
    // Pass 4: annotation targets
    // ============================================================================

    fn resolve_abouts(&mut self) {
        for (id, target) in std::mem::take(&mut self.abouts) {
            let owner = self.model().element(id).owner();
            match self.model().resolve_path(owner, target.inner()) {
                Some(element) => self.builder.add_about(id, element),
                None => self.diagnostics.emit(
                    Diagnostic::error(format!(
                        "comment refers to undefined element `{}`",
                        Self::display_path(target.inner())
                    ))
                    .with_code(ErrorCode::E206)
                    .with_label(target.span(), "not found in this scope"),
                ),
            }
        }
    }

    // ============================================================================
    // Pass 5: checks
    // ============================================================================

    /// Reports generalization cycles; returns `true` if there are none.
    fn check_cycles(&mut self) -> bool {
        let model = self.model();
        let mut graph = DiGraph::<ElementId, ()>::new();
        let nodes: IndexMap<ElementId, _> = model
            .elements()
            .map(|element| (element.id(), graph.add_node(element.id())))
            .collect();

        for (id, node) in &nodes {
            for general in model.general_types(*id) {
                if let Some(target) = nodes.get(&general) {
                    graph.add_edge(*node, *target, ());
                }
            }
        }

        let cycles: Vec<Vec<ElementId>> = tarjan_scc(&graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1 || graph.contains_edge(component[0], component[0])
            })
            .map(|component| {
                let mut ids: Vec<ElementId> = component.into_iter().map(|n| graph[n]).collect();
                ids.sort();
                ids
            })
            .collect();

        let diagnostics: Vec<Diagnostic> = cycles
            .iter()
            .map(|cycle| {
                let names = cycle
                    .iter()
                    .map(|id| format!("`{}`", model.path_of(*id)))
                    .collect::<Vec<_>>()
                    .join(", ");
                let mut diagnostic =
                    Diagnostic::error(format!("generalization cycle between {names}"))
                        .with_code(ErrorCode::E204)
                        .with_label(self.span_of(cycle[0]), "part of a cycle")
                        .with_help("an element cannot specialize itself, directly or indirectly");
                for id in &cycle[1..] {
                    diagnostic = diagnostic.with_secondary_label(self.span_of(*id), "part of a cycle");
                }
                diagnostic
            })
            .collect();

        let acyclic = diagnostics.is_empty();
        for diagnostic in diagnostics {
            self.diagnostics.emit(diagnostic);
        }
        acyclic
    }

    /// Warns about features that hide an inherited feature by name.
    ///
    /// Such a feature does not override the inherited one: scoped evaluation
    /// of the inherited feature keeps using its own expression.
    fn check_shadowing(&mut self) {
        let model = self.model();
        let warnings: Vec<Diagnostic> = model
            .elements()
            .filter(|element| element.kind().is_feature() && element.redefines().is_none())
            .filter_map(|element| {
                let name = element.name()?;
                let owner = element.owner()?;
                let hidden = self.inherited_feature(owner, name)?;
                Some(
                    Diagnostic::warning(format!(
                        "`{}` shadows inherited feature `{}` without redefining it",
                        model.path_of(element.id()),
                        model.path_of(hidden)
                    ))
                    .with_code(ErrorCode::E207)
                    .with_label(self.span_of(element.id()), "shadows an inherited feature")
                    .with_secondary_label(self.span_of(hidden), "inherited feature")
                    .with_help(format!("write `redefines {name}` to override it")),
                )
            })
            .collect();

        for warning in warnings {
            self.diagnostics.emit(warning);
        }
    }
}

impl Default for Builder<'_> {
    fn default() -> Self {
        Self::new()
    }
}
