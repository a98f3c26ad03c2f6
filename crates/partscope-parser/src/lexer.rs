//! Lexical analyzer for model source text.
//!
//! The lexer converts source text into a stream of [`Token`]s for parsing.
//! Whitespace and `//` line comments are consumed here and never reach the
//! parser; block comments are emitted as tokens since they carry the text of
//! comment and documentation elements.
//!
//! The public entry point is [`tokenize`], which performs error-recovering
//! lexical analysis and collects all diagnostics in a single pass.

use winnow::{
    Parser as _,
    ascii::{digit1, multispace1},
    combinator::{alt, cut_err, not, opt, peek, preceded, repeat, terminated},
    error::{ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{literal, none_of, one_of, take_until, take_while},
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::Span,
    tokens::{PositionedToken, Token},
};

/// Rich diagnostic information for lexer errors.
///
/// Attached to winnow errors via `.context()` to provide detailed error
/// messages with codes, help text, and precise span information.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LexerDiagnostic {
    pub code: ErrorCode,
    pub message: &'static str,
    pub help: Option<&'static str>,
    /// The error span covers from `start` to the error position.
    pub start: usize,
}

type Input<'a> = LocatingSlice<&'a str>;
type IResult<'a, O> = ModalResult<O, ContextError<LexerDiagnostic>>;

/// Parse an escape sequence in a string after the backslash.
fn string_escape<'a>(input: &mut Input<'a>) -> IResult<'a, char> {
    preceded(
        '\\',
        one_of(['n', 't', '\\', '"']).map(|c| match c {
            'n' => '\n',
            't' => '\t',
            other => other,
        }),
    )
    .parse_next(input)
}

/// Parse a double-quoted string literal such as a documentation locale.
fn string_literal<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    let start = input.current_token_start();

    let string_content = repeat(0.., alt((string_escape, none_of(['"', '\\', '\n']))))
        .fold(String::new, |mut acc, ch| {
            acc.push(ch);
            acc
        });

    preceded(
        '"',
        cut_err(terminated(string_content, '"')).context(LexerDiagnostic {
            code: ErrorCode::E001,
            message: "unterminated string literal",
            help: Some("add closing `\"`"),
            start,
        }),
    )
    .map(Token::StringLiteral)
    .parse_next(input)
}

/// Parse a quoted name: `'Santa Sleigh'`.
fn quoted_name<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    let start = input.current_token_start();

    preceded(
        '\'',
        cut_err(terminated(
            take_while(1.., |c: char| c != '\'' && c != '\n'),
            '\'',
        ))
        .context(LexerDiagnostic {
            code: ErrorCode::E001,
            message: "unterminated quoted name",
            help: Some("add closing `'`"),
            start,
        }),
    )
    .map(Token::Identifier)
    .parse_next(input)
}

/// Parse a block comment `/* ... */`, keeping the raw text between the
/// delimiters.
fn block_comment<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    let start = input.current_token_start();

    preceded(
        "/*",
        cut_err(terminated(take_until(0.., "*/"), "*/")).context(LexerDiagnostic {
            code: ErrorCode::E003,
            message: "unterminated block comment",
            help: Some("add closing `*/`"),
            start,
        }),
    )
    .map(Token::BlockComment)
    .parse_next(input)
}

/// Parse a number literal: `42`, `9.81`, `1.5e3`.
///
/// Signs are not part of the literal; `-` is always an operator token.
fn number_literal<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    terminated(
        (
            digit1,
            opt(('.', digit1)),
            opt((one_of(['e', 'E']), opt(one_of(['+', '-'])), digit1)),
        )
            .take()
            .try_map(str::parse::<f64>),
        // Rejects `2kg`; units must be written in brackets
        peek(not(one_of(|c: char| c.is_alphanumeric() || c == '_'))),
    )
    .map(Token::NumberLiteral)
    .parse_next(input)
}

/// Parse whitespace and line comments
fn trivia<'a>(input: &mut Input<'a>) -> IResult<'a, ()> {
    alt((
        multispace1.void(),
        preceded("//", take_while(0.., |c| c != '\n')).void(),
    ))
    .parse_next(input)
}

/// Parse keywords with word boundary checking
fn keyword<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    terminated(
        alt((
            alt((
                literal("package"),
                literal("part"),
                literal("def"),
                literal("attribute"),
                literal("enum"),
                literal("redefines"),
                literal("comment"),
                literal("about"),
                literal("doc"),
                literal("locale"),
                literal("import"),
            )),
            alt((
                literal("private"),
                literal("public"),
                literal("if"),
                literal("else"),
                literal("true"),
                literal("false"),
                literal("and"),
                literal("or"),
                literal("xor"),
                literal("not"),
            )),
        )),
        // Ensure keyword is not followed by identifier character (word boundary)
        peek(not(one_of(|c: char| c.is_ascii_alphanumeric() || c == '_'))),
    )
    .map(|keyword: &str| match keyword {
        "package" => Token::Package,
        "part" => Token::Part,
        "def" => Token::Def,
        "attribute" => Token::Attribute,
        "enum" => Token::Enum,
        "redefines" => Token::Redefines,
        "comment" => Token::Comment,
        "about" => Token::About,
        "doc" => Token::Doc,
        "locale" => Token::Locale,
        "import" => Token::Import,
        "private" => Token::Private,
        "public" => Token::Public,
        "if" => Token::If,
        "else" => Token::Else,
        "true" => Token::True,
        "false" => Token::False,
        "and" => Token::And,
        "or" => Token::Or,
        "xor" => Token::Xor,
        "not" => Token::Not,
        _ => unreachable!(),
    })
    .parse_next(input)
}

/// Parse identifiers
fn identifier<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    // Start with letter or underscore, followed by alphanumeric or underscore
    take_while(1.., |c: char| {
        c.is_ascii_alphabetic() || c == '_' || c.is_ascii_digit()
    })
    .verify(|s: &str| {
        s.chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
    })
    .map(Token::Identifier)
    .parse_next(input)
}

/// Parse multi-character operators (order matters - longest first)
fn multi_char_operator<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    alt((
        literal(":>>").value(Token::RedefinesOp),
        literal(":>").value(Token::SpecializesOp),
        literal("::").value(Token::DoubleColon),
        literal("==").value(Token::EqualsEquals),
        literal("!=").value(Token::NotEquals),
        literal("<=").value(Token::LessEquals),
        literal(">=").value(Token::GreaterEquals),
        literal("**").value(Token::StarStar),
    ))
    .parse_next(input)
}

/// Parse single character tokens
fn single_char_token<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    alt((
        alt((
            '<'.value(Token::Less),
            '>'.value(Token::Greater),
            '+'.value(Token::Plus),
            '-'.value(Token::Minus),
            '*'.value(Token::Star),
            '/'.value(Token::Slash),
            '%'.value(Token::Percent),
            '^'.value(Token::Caret),
            '?'.value(Token::Question),
            '.'.value(Token::Dot),
        )),
        alt((
            '='.value(Token::Equals),
            ':'.value(Token::Colon),
            ';'.value(Token::Semicolon),
            ','.value(Token::Comma),
            '{'.value(Token::LeftBrace),
            '}'.value(Token::RightBrace),
            '['.value(Token::LeftBracket),
            ']'.value(Token::RightBracket),
            '('.value(Token::LeftParen),
            ')'.value(Token::RightParen),
        )),
    ))
    .parse_next(input)
}

/// Parse a single token with position tracking
fn positioned_token<'a>(input: &mut Input<'a>) -> IResult<'a, PositionedToken<'a>> {
    let start_pos = input.current_token_start();

    let token = alt((
        block_comment,       // Must come before single char '/'
        string_literal,      // Must come before any single char
        quoted_name,         // Must come before any single char
        multi_char_operator, // Must come before single char operators
        keyword,             // Must come before identifier
        number_literal,      // Must come before identifier
        identifier,          // Must come before single chars
        single_char_token,   // Single character tokens
    ))
    .parse_next(input)?;

    let end_pos = input.current_token_start();
    let span = Span::new(start_pos..end_pos);

    Ok(PositionedToken::new(token, span))
}

/// Lexer that accumulates tokens and diagnostics during tokenization.
struct Lexer<'a> {
    tokens: Vec<PositionedToken<'a>>,
    diagnostics: DiagnosticCollector,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer.
    fn new() -> Self {
        Self {
            tokens: Vec::new(),
            diagnostics: DiagnosticCollector::new(),
        }
    }

    /// Tokenize the input, collecting tokens and errors.
    fn tokenize(&mut self, mut input: Input<'a>) {
        while !input.is_empty() {
            if trivia(&mut input).is_ok() {
                continue;
            }

            match positioned_token(&mut input) {
                Ok(token) => {
                    self.tokens.push(token);
                }
                Err(e) => {
                    let error_pos = input.current_token_start();

                    let diagnostic = Self::convert_err_mode(e, error_pos);
                    self.diagnostics.emit(diagnostic);

                    if !input.is_empty() {
                        input.next_token();
                    }
                }
            }
        }
    }

    /// Finish lexing and return tokens or collected errors.
    fn finish(self) -> Result<Vec<PositionedToken<'a>>, ParseError> {
        let tokens = self.tokens;
        self.diagnostics.finish().map(|_| tokens)
    }

    /// Convert an ErrMode and error position to a Diagnostic.
    ///
    /// Extracts `LexerDiagnostic` from the error context for rich error info
    /// with code, message, and help. Falls back to E002 (unexpected character)
    /// if no diagnostic context is found.
    fn convert_err_mode(
        err: ErrMode<ContextError<LexerDiagnostic>>,
        error_pos: usize,
    ) -> Diagnostic {
        let context_error = match err {
            ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
            ErrMode::Incomplete(_) => ContextError::new(),
        };

        if let Some(LexerDiagnostic {
            code,
            message,
            help,
            start,
        }) = context_error.context().next()
        {
            let span = Span::new(*start..error_pos);

            let mut diag = Diagnostic::error(*message)
                .with_code(*code)
                .with_label(span, code.description());
            if let Some(h) = help {
                diag = diag.with_help(*h);
            }
            return diag;
        }

        let span = Span::new(error_pos..error_pos.saturating_add(1));
        Diagnostic::error("unexpected character")
            .with_code(ErrorCode::E002)
            .with_label(span, ErrorCode::E002.description())
    }
}

/// Parse tokens from a string input, collecting multiple errors.
///
/// # Returns
///
/// - `Ok(tokens)` - All tokens successfully parsed
/// - `Err(ParseError)` - One or more errors occurred; contains all diagnostics
pub fn tokenize(input: &str) -> Result<Vec<PositionedToken<'_>>, ParseError> {
    let located_input = LocatingSlice::new(input);
    let mut lexer = Lexer::new();
    lexer.tokenize(located_input);
    lexer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_single_token(input: &str, expected: Token<'_>) {
        let mut located_input = LocatingSlice::new(input);
        let result = positioned_token(&mut located_input);
        assert!(result.is_ok(), "Failed to parse: {}", input);
        let positioned = result.unwrap();
        assert_eq!(positioned.token, expected);
    }

    fn kinds(input: &str) -> Vec<Token<'_>> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn test_keywords() {
        test_single_token("package", Token::Package);
        test_single_token("part", Token::Part);
        test_single_token("def", Token::Def);
        test_single_token("attribute", Token::Attribute);
        test_single_token("redefines", Token::Redefines);
        test_single_token("doc", Token::Doc);
        test_single_token("locale", Token::Locale);
        test_single_token("xor", Token::Xor);
        test_single_token("not", Token::Not);
    }

    #[test]
    fn test_keyword_word_boundaries() {
        test_single_token("parts", Token::Identifier("parts"));
        test_single_token("orbit", Token::Identifier("orbit"));
        test_single_token("documentation", Token::Identifier("documentation"));
        test_single_token("if_", Token::Identifier("if_"));
    }

    #[test]
    fn test_identifiers_and_quoted_names() {
        test_single_token("noseColor", Token::Identifier("noseColor"));
        test_single_token("_private", Token::Identifier("_private"));
        test_single_token("'Santa Sleigh'", Token::Identifier("Santa Sleigh"));
    }

    #[test]
    fn test_numbers() {
        test_single_token("42", Token::NumberLiteral(42.0));
        test_single_token("9.81", Token::NumberLiteral(9.81));
        test_single_token("1.5e3", Token::NumberLiteral(1500.0));
    }

    #[test]
    fn test_minus_is_an_operator() {
        assert_eq!(
            kinds("a-1"),
            vec![
                Token::Identifier("a"),
                Token::Minus,
                Token::NumberLiteral(1.0)
            ]
        );
    }

    #[test]
    fn test_operators_longest_first() {
        assert_eq!(
            kinds(":>> :> :: : ** * <= <"),
            vec![
                Token::RedefinesOp,
                Token::SpecializesOp,
                Token::DoubleColon,
                Token::Colon,
                Token::StarStar,
                Token::Star,
                Token::LessEquals,
                Token::Less,
            ]
        );
    }

    #[test]
    fn test_trivia_is_dropped() {
        let input = "part // a line comment\n  def";
        assert_eq!(kinds(input), vec![Token::Part, Token::Def]);
    }

    #[test]
    fn test_block_comment_is_kept() {
        let tokens = tokenize("doc /* Hello */").unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].token, Token::BlockComment(" Hello "));
        assert_eq!(tokens[1].span, Span::new(4..15));
    }

    #[test]
    fn test_string_escapes() {
        test_single_token(r#""en_US""#, Token::StringLiteral("en_US".to_string()));
        test_single_token(
            r#""say \"hi\"""#,
            Token::StringLiteral("say \"hi\"".to_string()),
        );
    }

    #[test]
    fn test_spans() {
        let tokens = tokenize("part  wheel").unwrap();
        assert_eq!(tokens[0].span, Span::new(0..4));
        assert_eq!(tokens[1].span, Span::new(6..11));
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("doc locale \"en_US").unwrap_err();
        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E001));
    }

    #[test]
    fn test_unterminated_block_comment() {
        let err = tokenize("comment /* never closed").unwrap_err();
        let diag = &err.diagnostics()[0];
        assert_eq!(diag.code(), Some(ErrorCode::E003));
        assert_eq!(diag.labels()[0].span().start(), 8);
    }

    #[test]
    fn test_unexpected_characters_are_all_reported() {
        let err = tokenize("part $ def #").unwrap_err();
        assert_eq!(err.diagnostics().len(), 2);
        assert!(
            err.diagnostics()
                .iter()
                .all(|d| d.code() == Some(ErrorCode::E002))
        );
    }
}
