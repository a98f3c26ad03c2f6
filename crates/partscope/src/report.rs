//! CSV reports of extracted metadata.
//!
//! Both reports write one row per (element, entry) pair. What happens to an
//! element without entries is decided by an [`EmptyPolicy`]; by default the
//! comments report skips such elements while the documentation report writes
//! a placeholder row for them.

use std::io::{self, Write};

use log::info;
use thiserror::Error;

use crate::{config::EmptyPolicy, metadata::ElementMetadata};

pub const COMMENT_HEADERS: [&str; 5] = [
    "Name",
    "Qualified Name",
    "Type",
    "Comment Name",
    "Comment Text",
];

pub const DOCUMENTATION_HEADERS: [&str; 5] = [
    "Name",
    "Qualified Name",
    "Type",
    "Locale",
    "Documentation",
];

/// Rendered in the locale column when documentation declares none.
const NO_LOCALE: &str = "None";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to write report: {0}")]
    Io(#[from] io::Error),
}

/// Writes the comments report and returns the number of comments written.
pub fn write_comments<W: Write>(
    writer: W,
    metadata: &[ElementMetadata],
    empty: EmptyPolicy,
) -> Result<usize, ReportError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(COMMENT_HEADERS)?;

    let mut entries = 0;
    for element in metadata {
        let prefix = row_prefix(element);
        if element.comments.is_empty() {
            if empty == EmptyPolicy::Placeholder {
                csv.write_record(prefix.iter().map(String::as_str).chain(["", ""]))?;
            }
            continue;
        }
        for comment in &element.comments {
            csv.write_record(prefix.iter().map(String::as_str).chain([
                comment.name.as_deref().unwrap_or_default(),
                comment.text.as_str(),
            ]))?;
            entries += 1;
        }
    }
    csv.flush()?;

    info!(elements = metadata.len(), entries = entries; "Comments report written");
    Ok(entries)
}

/// Writes the documentation report and returns the number of
/// documentation entries written.
pub fn write_documentation<W: Write>(
    writer: W,
    metadata: &[ElementMetadata],
    empty: EmptyPolicy,
) -> Result<usize, ReportError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(DOCUMENTATION_HEADERS)?;

    let mut entries = 0;
    for element in metadata {
        let prefix = row_prefix(element);
        if element.documentation.is_empty() {
            if empty == EmptyPolicy::Placeholder {
                csv.write_record(prefix.iter().map(String::as_str).chain([NO_LOCALE, ""]))?;
            }
            continue;
        }
        for doc in &element.documentation {
            csv.write_record(prefix.iter().map(String::as_str).chain([
                doc.locale.as_deref().unwrap_or(NO_LOCALE),
                doc.text.as_str(),
            ]))?;
            entries += 1;
        }
    }
    csv.flush()?;

    info!(elements = metadata.len(), entries = entries; "Documentation report written");
    Ok(entries)
}

fn row_prefix(element: &ElementMetadata) -> [String; 3] {
    [
        element.name.clone().unwrap_or_default(),
        element.qualified_name.to_string(),
        element.kind.to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use partscope_core::{identifier::Id, model::ElementKind};

    use super::*;
    use crate::metadata::{CommentEntry, DocumentationEntry};

    fn element(name: &str, qualified: &str) -> ElementMetadata {
        ElementMetadata {
            name: Some(name.to_string()),
            qualified_name: Id::new(qualified),
            kind: ElementKind::PartDefinition,
            comments: Vec::new(),
            documentation: Vec::new(),
        }
    }

    fn sample() -> Vec<ElementMetadata> {
        let mut elf = element("Elf", "Workshop::Elf");
        elf.comments.push(CommentEntry {
            name: None,
            text: "Small, quick, cheerful".to_string(),
        });
        elf.documentation.push(DocumentationEntry {
            locale: Some("en_US".to_string()),
            text: "A helper.".to_string(),
        });
        elf.documentation.push(DocumentationEntry {
            locale: None,
            text: "Default text.".to_string(),
        });

        let sack = element("GiftSack", "Workshop::GiftSack");
        vec![elf, sack]
    }

    fn render(
        write: fn(&mut Vec<u8>, &[ElementMetadata], EmptyPolicy) -> Result<usize, ReportError>,
        empty: EmptyPolicy,
    ) -> (usize, String) {
        let mut out = Vec::new();
        let entries = write(&mut out, &sample(), empty).unwrap();
        (entries, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_comments_skip_empty_elements() {
        let (entries, text) = render(|w, m, e| write_comments(w, m, e), EmptyPolicy::Skip);
        assert_eq!(entries, 1);
        assert_eq!(
            text,
            "Name,Qualified Name,Type,Comment Name,Comment Text\n\
             Elf,Workshop::Elf,PartDefinition,,\"Small, quick, cheerful\"\n"
        );
    }

    #[test]
    fn test_comments_placeholder() {
        let (entries, text) = render(|w, m, e| write_comments(w, m, e), EmptyPolicy::Placeholder);
        assert_eq!(entries, 1);
        assert!(text.ends_with("GiftSack,Workshop::GiftSack,PartDefinition,,\n"));
    }

    #[test]
    fn test_documentation_placeholder_row() {
        let (entries, text) =
            render(|w, m, e| write_documentation(w, m, e), EmptyPolicy::Placeholder);
        assert_eq!(entries, 2);
        assert_eq!(
            text,
            "Name,Qualified Name,Type,Locale,Documentation\n\
             Elf,Workshop::Elf,PartDefinition,en_US,A helper.\n\
             Elf,Workshop::Elf,PartDefinition,None,Default text.\n\
             GiftSack,Workshop::GiftSack,PartDefinition,None,\n"
        );
    }

    #[test]
    fn test_documentation_skip() {
        let (entries, text) = render(|w, m, e| write_documentation(w, m, e), EmptyPolicy::Skip);
        assert_eq!(entries, 2);
        assert!(!text.contains("GiftSack"));
    }
}
