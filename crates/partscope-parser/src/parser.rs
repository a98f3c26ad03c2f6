//! Parser for model source tokens.
//!
//! This module transforms a token stream from the [`lexer`](super::lexer) into
//! the syntax tree defined in [`parser_types`](super::parser_types). The
//! public entry point is [`build_document`].

use winnow::{
    Parser as _,
    combinator::{alt, delimited, opt, peek, preceded, repeat, separated, terminated},
    error::{ContextError, ErrMode},
    stream::{Stream, TokenSlice},
    token::any,
};

use partscope_core::{
    expr::{BinaryOp, Expr, Literal, Path, UnaryOp},
    identifier::Id,
    unit::Unit,
};

use crate::{
    error::{Diagnostic, ErrorCode},
    parser_types::{
        Comment, Definition, DefinitionKind, Documentation, Member, QualifiedName, Usage,
        UsageKind,
    },
    span::{Span, Spanned},
    tokens::{PositionedToken, Token},
};

/// Context type for parser errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Context {
    /// Description of what is currently being parsed
    Label(&'static str),
    /// Remaining token count (`eof_offset()`) at error start position
    ///
    /// Used to calculate start_offset as: `tokens.len() - start_offset_value`
    StartOffset(usize),
}

type Input<'src> = PartscopeTokenSlice<'src>;
type IResult<O> = std::result::Result<O, ErrMode<ContextError<Context>>>;
/// Type alias for winnow TokenSlice with our positioned tokens
type PartscopeTokenSlice<'src> = TokenSlice<'src, PositionedToken<'src>>;

/// Commits to the current construct: any failure inside `f` becomes a cut
/// error remembering where the construct started.
fn cut_err<'src, O, F>(input: &mut Input<'src>, f: F) -> IResult<O>
where
    F: FnOnce(&mut Input<'src>) -> IResult<O>,
{
    let start_remaining = input.eof_offset();

    match f(input) {
        Ok(o) => Ok(o),
        Err(ErrMode::Backtrack(mut e)) | Err(ErrMode::Cut(mut e)) => {
            e.push(Context::StartOffset(start_remaining));
            Err(ErrMode::Cut(e))
        }
        Err(e) => Err(e),
    }
}

/// Span covering a run of consumed tokens.
fn tokens_span(tokens: &[PositionedToken<'_>]) -> Span {
    match (tokens.first(), tokens.last()) {
        (Some(first), Some(last)) => first.span.union(last.span),
        _ => Span::default(),
    }
}

/// Wraps the output of `parser` with the span of the tokens it consumed.
fn spanned<'src, O>(
    mut parser: impl FnMut(&mut Input<'src>) -> IResult<O>,
) -> impl FnMut(&mut Input<'src>) -> IResult<Spanned<O>> {
    move |input: &mut Input<'src>| {
        let (value, taken) = parser.by_ref().with_taken().parse_next(input)?;
        Ok(Spanned::new(value, tokens_span(taken)))
    }
}

/// Match a single token without payload.
fn tok<'src>(
    expected: Token<'static>,
    label: &'static str,
) -> impl FnMut(&mut Input<'src>) -> IResult<Span> {
    move |input: &mut Input<'src>| {
        any.verify_map(|token: &PositionedToken<'_>| {
            (token.token == expected).then_some(token.span)
        })
        .context(Context::Label(label))
        .parse_next(input)
    }
}

fn semicolon<'src>(input: &mut Input<'src>) -> IResult<Span> {
    tok(Token::Semicolon, "`;`").parse_next(input)
}

fn comma<'src>(input: &mut Input<'src>) -> IResult<Span> {
    tok(Token::Comma, "`,`").parse_next(input)
}

/// `redefines` or its `:>>` shorthand
fn redefines_marker<'src>(input: &mut Input<'src>) -> IResult<()> {
    any.verify(|token: &PositionedToken<'_>| {
        matches!(token.token, Token::Redefines | Token::RedefinesOp)
    })
    .void()
    .context(Context::Label("`redefines`"))
    .parse_next(input)
}

/// Parse an identifier with span preservation
fn identifier<'src>(input: &mut Input<'src>) -> IResult<Spanned<Id>> {
    any.verify_map(|token: &PositionedToken<'_>| match &token.token {
        Token::Identifier(name) => Some(Spanned::new(Id::new(name), token.span)),
        _ => None,
    })
    .context(Context::Label("identifier"))
    .parse_next(input)
}

/// Parse a name with `::` separators: `Vehicles::Car`
fn qualified_name<'src>(input: &mut Input<'src>) -> IResult<Spanned<QualifiedName>> {
    let first = identifier.parse_next(input)?;
    let rest: Vec<Spanned<Id>> =
        repeat(0.., preceded(tok(Token::DoubleColon, "`::`"), identifier)).parse_next(input)?;

    let span = rest
        .last()
        .map_or(first.span(), |last| first.span().union(last.span()));
    let mut segments = vec![first.into_inner()];
    segments.extend(rest.into_iter().map(Spanned::into_inner));

    Ok(Spanned::new(segments, span))
}

/// Parse a comma-separated list of qualified names: `A, B::C`
fn qualified_names<'src>(input: &mut Input<'src>) -> IResult<Vec<Spanned<QualifiedName>>> {
    separated(1.., qualified_name, comma).parse_next(input)
}

fn number<'src>(input: &mut Input<'src>) -> IResult<Spanned<f64>> {
    any.verify_map(|token: &PositionedToken<'_>| match token.token {
        Token::NumberLiteral(value) => Some(Spanned::new(value, token.span)),
        _ => None,
    })
    .context(Context::Label("number"))
    .parse_next(input)
}

fn string_literal<'src>(input: &mut Input<'src>) -> IResult<Spanned<String>> {
    any.verify_map(|token: &PositionedToken<'_>| match &token.token {
        Token::StringLiteral(s) => Some(Spanned::new(s.clone(), token.span)),
        _ => None,
    })
    .context(Context::Label("string literal"))
    .parse_next(input)
}

/// Parse a block comment and clean up its text
fn block_comment<'src>(input: &mut Input<'src>) -> IResult<Spanned<String>> {
    any.verify_map(|token: &PositionedToken<'_>| match &token.token {
        Token::BlockComment(raw) => Some(Spanned::new(comment_body(raw), token.span)),
        _ => None,
    })
    .context(Context::Label("comment body `/* ... */`"))
    .parse_next(input)
}

/// Text of a comment body without the `*` decoration at line starts and
/// without surrounding blank space.
fn comment_body(raw: &str) -> String {
    raw.lines()
        .map(|line| {
            let line = line.trim();
            let line = line.strip_prefix('*').unwrap_or(line);
            line.strip_prefix(' ').unwrap_or(line)
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_owned()
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

/// Parse the unit text between brackets: `kg`, `m/s^2`, `1/s`
fn unit<'src>(input: &mut Input<'src>) -> IResult<Unit> {
    repeat(
        1..,
        any.verify_map(|token: &PositionedToken<'_>| match &token.token {
            Token::Identifier(symbol) => Some(symbol.to_string()),
            Token::NumberLiteral(value) => Some(value.to_string()),
            Token::Star => Some("*".to_string()),
            Token::Slash => Some("/".to_string()),
            Token::Caret => Some("^".to_string()),
            Token::Minus => Some("-".to_string()),
            Token::Percent => Some("%".to_string()),
            _ => None,
        }),
    )
    .fold(String::new, |mut text, part: String| {
        text.push_str(&part);
        text
    })
    .try_map(|text: String| text.parse::<Unit>())
    .context(Context::Label("unit"))
    .parse_next(input)
}

/// Parse a number with an optional unit: `500`, `500 [kg]`
fn number_or_quantity<'src>(input: &mut Input<'src>) -> IResult<Expr> {
    let value = number.parse_next(input)?.into_inner();

    if opt(tok(Token::LeftBracket, "`[`"))
        .parse_next(input)?
        .is_none()
    {
        return Ok(Expr::number(value));
    }

    cut_err(input, |input| {
        let unit = terminated(unit, tok(Token::RightBracket, "`]`")).parse_next(input)?;
        Ok(Expr::quantity(value, unit))
    })
}

/// Parse a function call: `count(Reindeer)`
fn call<'src>(input: &mut Input<'src>) -> IResult<Expr> {
    let (function, _) = (identifier, tok(Token::LeftParen, "`(`")).parse_next(input)?;

    cut_err(input, |input| {
        let args: Vec<Expr> = separated(0.., expression, comma).parse_next(input)?;
        tok(Token::RightParen, "`)`").parse_next(input)?;
        Ok(Expr::Call {
            function: function.into_inner(),
            args,
        })
    })
}

fn parenthesized<'src>(input: &mut Input<'src>) -> IResult<Expr> {
    tok(Token::LeftParen, "`(`").parse_next(input)?;
    cut_err(input, |input| {
        terminated(expression, tok(Token::RightParen, "`)`")).parse_next(input)
    })
}

fn primary<'src>(input: &mut Input<'src>) -> IResult<Expr> {
    alt((
        number_or_quantity,
        string_literal.map(|s| Expr::Literal(Literal::String(s.into_inner()))),
        tok(Token::True, "`true`").value(Expr::Literal(Literal::Boolean(true))),
        tok(Token::False, "`false`").value(Expr::Literal(Literal::Boolean(false))),
        parenthesized,
        call,
        qualified_name.map(|name| Expr::Reference(Path::new(name.into_inner()))),
    ))
    .parse_next(input)
}

/// Parse member access chains: `features.noseColor`
fn postfix<'src>(input: &mut Input<'src>) -> IResult<Expr> {
    let mut expr = primary.parse_next(input)?;

    while opt(tok(Token::Dot, "`.`")).parse_next(input)?.is_some() {
        let member = cut_err(input, identifier)?;
        expr = Expr::Member {
            target: Box::new(expr),
            member: member.into_inner(),
        };
    }

    Ok(expr)
}

/// Right-associative exponentiation: `2 ** 3 ** 2 == 2 ** (3 ** 2)`
fn power<'src>(input: &mut Input<'src>) -> IResult<Expr> {
    let base = postfix.parse_next(input)?;

    let checkpoint = input.checkpoint();
    let op: IResult<Span> =
        alt((tok(Token::StarStar, "`**`"), tok(Token::Caret, "`^`"))).parse_next(input);
    if op.is_err() {
        input.reset(&checkpoint);
        return Ok(base);
    }

    let exponent = cut_err(input, unary)?;
    Ok(Expr::binary(BinaryOp::Pow, base, exponent))
}

/// Prefix operators bind looser than `**`: `-2 ** 2 == -(2 ** 2)`
fn unary<'src>(input: &mut Input<'src>) -> IResult<Expr> {
    let checkpoint = input.checkpoint();
    let op: IResult<UnaryOp> = any
        .verify_map(|token: &PositionedToken<'_>| match token.token {
            Token::Minus => Some(UnaryOp::Neg),
            Token::Not => Some(UnaryOp::Not),
            _ => None,
        })
        .parse_next(input);

    match op {
        Ok(op) => {
            let operand = cut_err(input, unary)?;
            Ok(Expr::unary(op, operand))
        }
        Err(_) => {
            input.reset(&checkpoint);
            power(input)
        }
    }
}

/// Parse a left-associative chain `operand (op operand)*`.
fn binary_chain<'src>(
    input: &mut Input<'src>,
    operand: fn(&mut Input<'src>) -> IResult<Expr>,
    operator: fn(&Token<'_>) -> Option<BinaryOp>,
) -> IResult<Expr> {
    let mut lhs = operand(input)?;

    loop {
        let checkpoint = input.checkpoint();
        let op: IResult<BinaryOp> = any
            .verify_map(|token: &PositionedToken<'_>| operator(&token.token))
            .parse_next(input);

        match op {
            Ok(op) => {
                let rhs = cut_err(input, operand)?;
                lhs = Expr::binary(op, lhs, rhs);
            }
            Err(_) => {
                input.reset(&checkpoint);
                break;
            }
        }
    }

    Ok(lhs)
}

fn multiplicative<'src>(input: &mut Input<'src>) -> IResult<Expr> {
    binary_chain(input, unary, |token| match token {
        Token::Star => Some(BinaryOp::Mul),
        Token::Slash => Some(BinaryOp::Div),
        Token::Percent => Some(BinaryOp::Rem),
        _ => None,
    })
}

fn additive<'src>(input: &mut Input<'src>) -> IResult<Expr> {
    binary_chain(input, multiplicative, |token| match token {
        Token::Plus => Some(BinaryOp::Add),
        Token::Minus => Some(BinaryOp::Sub),
        _ => None,
    })
}

fn relational<'src>(input: &mut Input<'src>) -> IResult<Expr> {
    binary_chain(input, additive, |token| match token {
        Token::Less => Some(BinaryOp::Lt),
        Token::LessEquals => Some(BinaryOp::Le),
        Token::Greater => Some(BinaryOp::Gt),
        Token::GreaterEquals => Some(BinaryOp::Ge),
        _ => None,
    })
}

fn equality<'src>(input: &mut Input<'src>) -> IResult<Expr> {
    binary_chain(input, relational, |token| match token {
        Token::EqualsEquals => Some(BinaryOp::Eq),
        Token::NotEquals => Some(BinaryOp::Ne),
        _ => None,
    })
}

fn and_expression<'src>(input: &mut Input<'src>) -> IResult<Expr> {
    binary_chain(input, equality, |token| {
        matches!(token, Token::And).then_some(BinaryOp::And)
    })
}

fn xor_expression<'src>(input: &mut Input<'src>) -> IResult<Expr> {
    binary_chain(input, and_expression, |token| {
        matches!(token, Token::Xor).then_some(BinaryOp::Xor)
    })
}

fn or_expression<'src>(input: &mut Input<'src>) -> IResult<Expr> {
    binary_chain(input, xor_expression, |token| {
        matches!(token, Token::Or).then_some(BinaryOp::Or)
    })
}

/// Parse a conditional: `if condition ? then_value else else_value`
fn conditional<'src>(input: &mut Input<'src>) -> IResult<Expr> {
    tok(Token::If, "`if`").parse_next(input)?;

    cut_err(input, |input| {
        let condition = or_expression.parse_next(input)?;
        tok(Token::Question, "`?`").parse_next(input)?;
        let then_branch = expression.parse_next(input)?;
        tok(Token::Else, "`else`").parse_next(input)?;
        let else_branch = expression.parse_next(input)?;
        Ok(Expr::conditional(condition, then_branch, else_branch))
    })
}

fn expression<'src>(input: &mut Input<'src>) -> IResult<Expr> {
    alt((conditional, or_expression))
        .context(Context::Label("expression"))
        .parse_next(input)
}

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

/// Parse either `;` or a braced list of members.
fn body<'src>(
    input: &mut Input<'src>,
    element: fn(&mut Input<'src>) -> IResult<Member>,
) -> IResult<Vec<Member>> {
    alt((
        semicolon.value(Vec::new()),
        delimited(
            tok(Token::LeftBrace, "`{`"),
            repeat(0.., element),
            tok(Token::RightBrace, "`}`"),
        ),
    ))
    .context(Context::Label("`;` or `{`"))
    .parse_next(input)
}

/// Parse an enumeration literal: `red;` or `enum red;`
fn enum_literal<'src>(input: &mut Input<'src>) -> IResult<Member> {
    terminated(
        preceded(opt(tok(Token::Enum, "`enum`")), identifier),
        semicolon,
    )
    .map(Member::EnumerationLiteral)
    .parse_next(input)
}

fn enum_member<'src>(input: &mut Input<'src>) -> IResult<Member> {
    alt((enum_literal, member)).parse_next(input)
}

/// Parse the rest of a definition after `part def`, `attribute def` or
/// `enum def`.
///
/// Syntax: `Name :> General, Other { members }`
fn definition<'src>(input: &mut Input<'src>, kind: DefinitionKind) -> IResult<Member> {
    let name = identifier.parse_next(input)?;
    let specializes = opt(preceded(
        tok(Token::SpecializesOp, "`:>`"),
        qualified_names,
    ))
    .parse_next(input)?
    .unwrap_or_default();

    let members = match kind {
        DefinitionKind::Enumeration => body(input, enum_member)?,
        DefinitionKind::Part | DefinitionKind::Attribute => body(input, member)?,
    };

    Ok(Member::Definition(Definition {
        kind,
        name,
        specializes,
        members,
    }))
}

/// Parse the rest of a usage after its keyword.
///
/// Examples:
/// - `weight : Real = 500 [kg];`
/// - `reindeer : Reindeer[9];`
/// - `redefines weight = 520 [kg];`
/// - `:>> weight = 520 [kg];`
/// - `sled : Sled :> vehicles { ... }`
fn usage<'src>(input: &mut Input<'src>, kind: UsageKind) -> IResult<Member> {
    let (name, redefines) = match opt(redefines_marker).parse_next(input)? {
        Some(()) => (None, Some(identifier.parse_next(input)?)),
        None => {
            let name = identifier.parse_next(input)?;
            let redefines = opt(preceded(redefines_marker, identifier)).parse_next(input)?;
            (Some(name), redefines)
        }
    };

    let typed_by = opt(preceded(tok(Token::Colon, "`:`"), qualified_names))
        .parse_next(input)?
        .unwrap_or_default();
    let multiplicity = opt(delimited(
        tok(Token::LeftBracket, "`[`"),
        number,
        tok(Token::RightBracket, "`]`"),
    ))
    .parse_next(input)?;
    let subsets = opt(preceded(
        tok(Token::SpecializesOp, "`:>`"),
        qualified_names,
    ))
    .parse_next(input)?
    .unwrap_or_default();
    let value = opt(preceded(tok(Token::Equals, "`=`"), spanned(expression))).parse_next(input)?;
    let members = body(input, member)?;

    Ok(Member::Usage(Usage {
        kind,
        name,
        redefines,
        typed_by,
        multiplicity,
        subsets,
        value,
        members,
    }))
}

/// Parse `part ...`, `attribute ...` or `enum def ...`
fn typed_member<'src>(input: &mut Input<'src>) -> IResult<Member> {
    let (definition_kind, usage_kind) = any
        .verify_map(|token: &PositionedToken<'_>| match token.token {
            Token::Part => Some((DefinitionKind::Part, Some(UsageKind::Part))),
            Token::Attribute => Some((DefinitionKind::Attribute, Some(UsageKind::Attribute))),
            Token::Enum => Some((DefinitionKind::Enumeration, None)),
            _ => None,
        })
        .parse_next(input)?;

    cut_err(input, |input| match usage_kind {
        Some(usage_kind) => {
            if opt(tok(Token::Def, "`def`")).parse_next(input)?.is_some() {
                definition(input, definition_kind)
            } else {
                usage(input, usage_kind)
            }
        }
        None => {
            tok(Token::Def, "`def`").parse_next(input)?;
            definition(input, definition_kind)
        }
    })
}

/// Parse a keyword-less redefinition: `:>> weight = 520 [kg];`
fn redefinition_shorthand<'src>(input: &mut Input<'src>) -> IResult<Member> {
    peek(redefines_marker).parse_next(input)?;
    cut_err(input, |input| usage(input, UsageKind::Unspecified))
}

fn package<'src>(input: &mut Input<'src>) -> IResult<Member> {
    tok(Token::Package, "`package`").parse_next(input)?;

    cut_err(input, |input| {
        let name = identifier.parse_next(input)?;
        let members = body(input, member)?;
        Ok(Member::Package { name, members })
    })
}

/// Parse a comment: `comment Name about Target, Other /* text */`
fn comment<'src>(input: &mut Input<'src>) -> IResult<Member> {
    tok(Token::Comment, "`comment`").parse_next(input)?;

    cut_err(input, |input| {
        let name = opt(identifier).parse_next(input)?;
        let about = opt(preceded(tok(Token::About, "`about`"), qualified_names))
            .parse_next(input)?
            .unwrap_or_default();
        let body = block_comment.parse_next(input)?;
        Ok(Member::Comment(Comment { name, about, body }))
    })
}

/// Parse an unnamed comment written as a bare `/* text */`
fn bare_comment<'src>(input: &mut Input<'src>) -> IResult<Member> {
    block_comment
        .map(|body| {
            Member::Comment(Comment {
                name: None,
                about: Vec::new(),
                body,
            })
        })
        .parse_next(input)
}

/// Parse documentation: `doc locale "en_US" /* text */`
fn documentation<'src>(input: &mut Input<'src>) -> IResult<Member> {
    tok(Token::Doc, "`doc`").parse_next(input)?;

    cut_err(input, |input| {
        let locale = opt(preceded(tok(Token::Locale, "`locale`"), string_literal))
            .parse_next(input)?;
        let body = block_comment.parse_next(input)?;
        Ok(Member::Documentation(Documentation { locale, body }))
    })
}

/// Parse an import: `import ScalarValues::*;`
fn import<'src>(input: &mut Input<'src>) -> IResult<Member> {
    tok(Token::Import, "`import`").parse_next(input)?;

    cut_err(input, |input| {
        let name = qualified_name.parse_next(input)?;
        opt((
            tok(Token::DoubleColon, "`::`"),
            tok(Token::Star, "`*`"),
        ))
        .void()
        .parse_next(input)?;
        semicolon.parse_next(input)?;
        Ok(Member::Import(name))
    })
}

/// `private` and `public` are accepted and ignored.
fn visibility<'src>(input: &mut Input<'src>) -> IResult<()> {
    any.verify(|token: &PositionedToken<'_>| {
        matches!(token.token, Token::Private | Token::Public)
    })
    .void()
    .parse_next(input)
}

fn member<'src>(input: &mut Input<'src>) -> IResult<Member> {
    alt((
        package,
        typed_member,
        redefinition_shorthand,
        comment,
        documentation,
        bare_comment,
        import,
        preceded(visibility, member),
    ))
    .context(Context::Label("declaration"))
    .parse_next(input)
}

fn document<'src>(input: &mut Input<'src>) -> IResult<Vec<Member>> {
    let members: Vec<Member> = repeat(0.., member).parse_next(input)?;

    if input.eof_offset() > 0 {
        let mut e = ContextError::new();
        e.push(Context::Label("declaration"));
        e.push(Context::StartOffset(input.eof_offset()));
        return Err(ErrMode::Cut(e));
    }

    Ok(members)
}

/// Convert a winnow error into a diagnostic.
///
/// Extracts position information from error context (StartOffset) and calculates
/// precise error spans using the token array.
fn convert_error(
    error: ErrMode<ContextError<Context>>,
    tokens: &[PositionedToken],
    current_remaining: usize,
) -> Diagnostic {
    // Extract start offset from error context if available
    let start_remaining = match &error {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => e.context().find_map(|ctx| match ctx {
            Context::StartOffset(n) => Some(*n),
            _ => None,
        }),
        _ => None,
    };

    // Calculate offsets from remaining token counts
    let end_offset = tokens.len() - current_remaining;
    let start_offset = start_remaining.map_or(end_offset, |r| tokens.len() - r);

    // The token at the error position, or the last token at end of input
    let error_token = if end_offset < tokens.len() {
        &tokens[end_offset..end_offset + 1]
    } else {
        &tokens[tokens.len().saturating_sub(1)..]
    };

    match error {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => {
            let contexts: Vec<String> = e
                .context()
                .filter_map(|ctx| match ctx {
                    Context::Label(label) => Some(format!("expected {label}")),
                    _ => None,
                })
                .collect();

            let message = if contexts.is_empty() {
                "unexpected token or end of input".to_string()
            } else {
                contexts.join(" → ")
            };

            let error_span = tokens_span(error_token);
            let mut diagnostic = Diagnostic::error(format!("unexpected token: {message}"))
                .with_code(ErrorCode::E100)
                .with_label(error_span, "unexpected token")
                .with_help("check syntax and token positioning");

            if start_offset < end_offset {
                let construct_span = tokens_span(&tokens[start_offset..end_offset]);
                diagnostic = diagnostic.with_secondary_label(construct_span, "while parsing this");
            }
            diagnostic
        }
        ErrMode::Incomplete(_) => {
            // Token slices are complete input; kept for exhaustiveness.
            Diagnostic::error("incomplete input, more tokens expected")
                .with_code(ErrorCode::E101)
                .with_label(tokens_span(error_token), "incomplete")
                .with_help("ensure input is complete")
        }
    }
}

/// Build the syntax tree of a whole source file from its tokens
pub fn build_document<'src>(
    tokens: &'src [PositionedToken<'src>],
) -> Result<Vec<Member>, Diagnostic> {
    let mut token_slice = TokenSlice::new(tokens);

    match document.parse_next(&mut token_slice) {
        Ok(members) => Ok(members),
        Err(e) => {
            let current_remaining = token_slice.eof_offset();
            Err(convert_error(e, tokens, current_remaining))
        }
    }
}
