//! Syntax tree produced by the [`parser`](super::parser).
//!
//! The tree keeps names unresolved; [`elaborate`](super::elaborate) turns it
//! into a [`Model`](partscope_core::model::Model).

use partscope_core::{expr::Expr, identifier::Id};

use crate::span::Spanned;

/// A `::`-separated name as written in the source.
pub type QualifiedName = Vec<Id>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionKind {
    Part,
    Attribute,
    Enumeration,
}

/// `part def`, `attribute def` or `enum def`.
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub kind: DefinitionKind,
    pub name: Spanned<Id>,
    pub specializes: Vec<Spanned<QualifiedName>>,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageKind {
    Part,
    Attribute,
    /// `:>> name = ...;` without a keyword; takes the kind of the redefined
    /// feature.
    Unspecified,
}

/// A part or attribute usage.
///
/// Syntax: `part name :>> redefined : Type[k] :> Other = expr { ... }`
/// where every piece after the name is optional, and the name itself may be
/// replaced by `redefines redefined` or `:>> redefined`.
#[derive(Debug, Clone, PartialEq)]
pub struct Usage {
    pub kind: UsageKind,
    pub name: Option<Spanned<Id>>,
    pub redefines: Option<Spanned<Id>>,
    pub typed_by: Vec<Spanned<QualifiedName>>,
    pub multiplicity: Option<Spanned<f64>>,
    pub subsets: Vec<Spanned<QualifiedName>>,
    pub value: Option<Spanned<Expr>>,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub name: Option<Spanned<Id>>,
    pub about: Vec<Spanned<QualifiedName>>,
    pub body: Spanned<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Documentation {
    pub locale: Option<Spanned<String>>,
    pub body: Spanned<String>,
}

/// A declaration inside a package, definition or usage body.
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Package {
        name: Spanned<Id>,
        members: Vec<Member>,
    },
    Definition(Definition),
    Usage(Usage),
    EnumerationLiteral(Spanned<Id>),
    Comment(Comment),
    Documentation(Documentation),
    /// `import Q::*;` is accepted and has no effect on name resolution.
    Import(Spanned<QualifiedName>),
}
