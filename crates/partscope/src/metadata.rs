//! Extraction of comments and localized documentation.

use log::debug;

use partscope_core::{
    identifier::Id,
    model::{ElementKind, Model},
};

/// The element kinds reports are restricted to.
pub const PART_KINDS: [ElementKind; 2] = [ElementKind::PartDefinition, ElementKind::PartUsage];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentEntry {
    pub name: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentationEntry {
    /// `None` when the documentation does not declare a locale.
    pub locale: Option<String>,
    pub text: String,
}

/// Comments and documentation attached to one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementMetadata {
    pub name: Option<String>,
    pub qualified_name: Id,
    pub kind: ElementKind,
    pub comments: Vec<CommentEntry>,
    pub documentation: Vec<DocumentationEntry>,
}

impl ElementMetadata {
    /// Whether any documentation entry is in `locale`.
    pub fn has_locale(&self, locale: &str) -> bool {
        self.documentation
            .iter()
            .any(|doc| doc.locale.as_deref() == Some(locale))
    }
}

/// Target locales an element has no documentation for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingLocales {
    pub qualified_name: Id,
    pub missing: Vec<String>,
}

/// Collects the annotations of every element whose kind is in `kinds`.
///
/// Only annotations attached to the element itself are reported; nothing is
/// inherited from general types. The result is sorted by qualified name,
/// comparing path segments.
pub fn collect(model: &Model, kinds: &[ElementKind]) -> Vec<ElementMetadata> {
    let mut collected: Vec<ElementMetadata> = model
        .elements_of_kind(kinds)
        .map(|element| {
            let mut comments = Vec::new();
            let mut documentation = Vec::new();

            for id in model.annotations(element.id()) {
                let annotation = model.element(id);
                let text = annotation.body().unwrap_or_default().to_string();
                match annotation.kind() {
                    ElementKind::Comment => comments.push(CommentEntry {
                        name: annotation.name().map(|name| name.to_string()),
                        text,
                    }),
                    ElementKind::Documentation => documentation.push(DocumentationEntry {
                        locale: annotation.locale().map(str::to_string),
                        text,
                    }),
                    _ => {}
                }
            }

            ElementMetadata {
                name: element.name().map(|name| name.to_string()),
                qualified_name: element.qualified_name(),
                kind: element.kind(),
                comments,
                documentation,
            }
        })
        .collect();

    collected.sort_by(|a, b| a.qualified_name.cmp_path(&b.qualified_name));

    debug!(
        elements = collected.len(),
        comments = collected.iter().map(|m| m.comments.len()).sum::<usize>(),
        documentation = collected.iter().map(|m| m.documentation.len()).sum::<usize>();
        "Collected metadata"
    );
    collected
}

/// Lists, per element, the `targets` it has no documentation for.
///
/// Elements documented in every target locale are left out. Documentation
/// without a locale does not count for any target.
pub fn missing_locales<S: AsRef<str>>(
    metadata: &[ElementMetadata],
    targets: &[S],
) -> Vec<MissingLocales> {
    metadata
        .iter()
        .filter_map(|element| {
            let missing: Vec<String> = targets
                .iter()
                .map(AsRef::as_ref)
                .filter(|locale| !element.has_locale(locale))
                .map(str::to_string)
                .collect();
            (!missing.is_empty()).then(|| MissingLocales {
                qualified_name: element.qualified_name,
                missing,
            })
        })
        .collect()
}
