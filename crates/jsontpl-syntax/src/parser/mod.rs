mod expressions;

use crate::ast::*;
use crate::error::{Diagnostic, ParseError, Span};
use crate::lexer::{SpannedToken, Token, tokenize};
use anyhow::{Result, anyhow};

/// Nesting limit for sub-expressions, unary chains and template literals.
///
/// Each level costs a full trip down the precedence chain, so this is kept
/// low enough that parsing and evaluating a maximally nested expression fits
/// in a default 2 MiB thread stack in unoptimized builds.
pub const MAX_NESTING: usize = 48;

/// Recursive-descent parser for compiled template expressions.
///
/// Consumes a sequence of [`SpannedToken`]s and produces a single
/// [`Expression`]. Use the free function [`parse()`] for a convenient entry point.
pub struct Parser {
    pub(super) tokens: Vec<SpannedToken>,
    pub(super) pos: usize,
    pub(super) depth: usize,
}

impl Parser {
    /// Creates a new parser from a token stream.
    pub fn new(tokens: Vec<SpannedToken>) -> Self {
        Self { tokens, pos: 0, depth: 0 }
    }

    #[inline]
    pub(super) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|st| &st.token)
    }

    #[inline]
    pub(super) fn peek_span(&self) -> Option<Span> {
        self.tokens.get(self.pos).map(|st| st.span)
    }

    #[inline]
    pub(super) fn advance(&mut self) -> Option<SpannedToken> {
        if self.pos < self.tokens.len() {
            let token = self.tokens[self.pos].clone();
            self.pos += 1;
            Some(token)
        } else {
            None
        }
    }

    pub(super) fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub(super) fn expect(&mut self, expected: Token, context: &str) -> Result<Span> {
        match self.advance() {
            Some(st) if st.token == expected => Ok(st.span),
            Some(st) => Err(anyhow!(ParseError::UnexpectedToken {
                expected: expected.display_name(),
                found: st.token.display_name(),
                span: st.span,
            })),
            None => Err(anyhow!(ParseError::UnexpectedEof {
                expected: expected.display_name(),
                context: Some(context.to_string()),
            })),
        }
    }

    /// Fails unless every token has been consumed.
    pub(super) fn expect_end(&mut self) -> Result<()> {
        match self.advance() {
            None => Ok(()),
            Some(st) => Err(anyhow!(ParseError::UnexpectedToken {
                expected: "end of expression".to_string(),
                found: st.token.display_name(),
                span: st.span,
            })),
        }
    }
}

/// Parses a token stream into exactly one [`Expression`].
///
/// Errors are returned as `anyhow::Error` wrapping a [`ParseError`].
pub fn parse(tokens: Vec<SpannedToken>) -> Result<Expression> {
    let mut parser = Parser::new(tokens);

    if parser.peek().is_none() {
        return Err(anyhow!(ParseError::UnexpectedEof {
            expected: "expression".to_string(),
            context: None,
        }));
    }

    let expr = parser.parse_expression()?;
    parser.expect_end()?;
    Ok(expr)
}

/// Tokenizes and parses `source` in one step. Lex errors are promoted to
/// [`ParseError::LexError`] so callers only need to downcast one type.
pub fn parse_source(source: &str) -> Result<Expression> {
    let tokens = tokenize(source).map_err(|e| anyhow!(ParseError::from(e)))?;
    parse(tokens)
}

/// Renders any error produced by [`parse_source`] against its source text.
pub fn render_error(source: &str, error: &anyhow::Error) -> String {
    match error.downcast_ref::<ParseError>() {
        Some(ParseError::LexError(lex)) => Diagnostic::new_lex(source, lex.clone()).format_error(),
        Some(parse) => Diagnostic::new_parse(source, parse.clone()).format_error(),
        None => format!("error: {}\n", error),
    }
}
