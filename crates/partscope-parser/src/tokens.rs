//! Token definitions for the model notation.

use std::fmt;

use crate::span::Span;

/// Tokens produced by the [`lexer`](super::lexer).
///
/// Whitespace and `//` line comments are dropped by the lexer. Block comments
/// are kept because `/* ... */` carries the body of comment and
/// documentation elements.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    // Keywords
    Package,
    Part,
    Def,
    Attribute,
    Enum,
    Redefines,
    Comment,
    About,
    Doc,
    Locale,
    Import,
    Private,
    Public,
    If,
    Else,
    True,
    False,
    And,
    Or,
    Xor,
    Not,

    // Literals and names
    /// A plain name or the inside of a `'quoted name'`.
    Identifier(&'a str),
    StringLiteral(String),
    NumberLiteral(f64),
    /// Raw text between `/*` and `*/`.
    BlockComment(&'a str),

    // Operators and punctuation
    DoubleColon,
    /// `:>>`
    RedefinesOp,
    /// `:>`
    SpecializesOp,
    EqualsEquals,
    NotEquals,
    LessEquals,
    GreaterEquals,
    StarStar,
    Less,
    Greater,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Question,
    Dot,
    Equals,
    Colon,
    Semicolon,
    Comma,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    LeftParen,
    RightParen,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Package => write!(f, "package"),
            Token::Part => write!(f, "part"),
            Token::Def => write!(f, "def"),
            Token::Attribute => write!(f, "attribute"),
            Token::Enum => write!(f, "enum"),
            Token::Redefines => write!(f, "redefines"),
            Token::Comment => write!(f, "comment"),
            Token::About => write!(f, "about"),
            Token::Doc => write!(f, "doc"),
            Token::Locale => write!(f, "locale"),
            Token::Import => write!(f, "import"),
            Token::Private => write!(f, "private"),
            Token::Public => write!(f, "public"),
            Token::If => write!(f, "if"),
            Token::Else => write!(f, "else"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::And => write!(f, "and"),
            Token::Or => write!(f, "or"),
            Token::Xor => write!(f, "xor"),
            Token::Not => write!(f, "not"),
            Token::Identifier(name) => write!(f, "{name}"),
            Token::StringLiteral(s) => write!(f, "\"{s}\""),
            Token::NumberLiteral(n) => write!(f, "{n}"),
            Token::BlockComment(_) => write!(f, "/* ... */"),
            Token::DoubleColon => write!(f, "::"),
            Token::RedefinesOp => write!(f, ":>>"),
            Token::SpecializesOp => write!(f, ":>"),
            Token::EqualsEquals => write!(f, "=="),
            Token::NotEquals => write!(f, "!="),
            Token::LessEquals => write!(f, "<="),
            Token::GreaterEquals => write!(f, ">="),
            Token::StarStar => write!(f, "**"),
            Token::Less => write!(f, "<"),
            Token::Greater => write!(f, ">"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::Caret => write!(f, "^"),
            Token::Question => write!(f, "?"),
            Token::Dot => write!(f, "."),
            Token::Equals => write!(f, "="),
            Token::Colon => write!(f, ":"),
            Token::Semicolon => write!(f, ";"),
            Token::Comma => write!(f, ","),
            Token::LeftBrace => write!(f, "{{"),
            Token::RightBrace => write!(f, "}}"),
            Token::LeftBracket => write!(f, "["),
            Token::RightBracket => write!(f, "]"),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
        }
    }
}

/// A token together with its location in the source text.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedToken<'a> {
    pub token: Token<'a>,
    pub span: Span,
}

impl<'a> PositionedToken<'a> {
    pub fn new(token: Token<'a>, span: Span) -> Self {
        Self { token, span }
    }
}
