//! Expression parsing methods for the recursive-descent parser.

use super::{MAX_NESTING, Parser};
use crate::ast::*;
use crate::error::{ParseError, Span};
use crate::lexer::{SpannedToken, TemplateChunk, Token, tokenize};
use anyhow::{Result, anyhow};
use smallvec::SmallVec;

impl Parser {
    pub fn parse_expression(&mut self) -> Result<Expression> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            let span = self.peek_span().unwrap_or_else(|| Span::single(1, 1, 0));
            return Err(anyhow!(ParseError::InvalidSyntax {
                message: format!("expression nested too deeply (limit {})", MAX_NESTING),
                span,
            }));
        }

        let result = self.parse_conditional();
        self.depth -= 1;
        result
    }

    fn parse_conditional(&mut self) -> Result<Expression> {
        let condition = self.parse_nullish()?;

        if !self.eat(&Token::Question) {
            return Ok(condition);
        }

        let then_expr = self.parse_expression()?;
        self.expect(Token::Colon, "conditional expression")?;
        let else_expr = self.parse_expression()?;
        let span = condition.span().merge(else_expr.span());

        Ok(Expression::Conditional {
            condition: Box::new(condition),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
            span,
        })
    }

    fn parse_nullish(&mut self) -> Result<Expression> {
        let mut left = self.parse_logical_or()?;

        while self.eat(&Token::QuestionQuestion) {
            let right = self.parse_logical_or()?;
            left = logical(left, LogicalOp::Nullish, right);
        }

        Ok(left)
    }

    fn parse_logical_or(&mut self) -> Result<Expression> {
        let mut left = self.parse_logical_and()?;

        while self.eat(&Token::OrOr) {
            let right = self.parse_logical_and()?;
            left = logical(left, LogicalOp::Or, right);
        }

        Ok(left)
    }

    fn parse_logical_and(&mut self) -> Result<Expression> {
        let mut left = self.parse_equality()?;

        while self.eat(&Token::AndAnd) {
            let right = self.parse_equality()?;
            left = logical(left, LogicalOp::And, right);
        }

        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expression> {
        let mut left = self.parse_comparison()?;

        loop {
            let op = match self.peek() {
                Some(Token::Eq) | Some(Token::StrictEq) => BinaryOp::Eq,
                Some(Token::Ne) | Some(Token::StrictNe) => BinaryOp::Ne,
                _ => return Ok(left),
            };
            self.advance();

            let right = self.parse_comparison()?;
            left = binary(left, op, right);
        }
    }

    fn parse_comparison(&mut self) -> Result<Expression> {
        let mut left = self.parse_additive()?;

        loop {
            let op = match self.peek() {
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::Le) => BinaryOp::Le,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::Ge) => BinaryOp::Ge,
                _ => return Ok(left),
            };
            self.advance();

            let right = self.parse_additive()?;
            left = binary(left, op, right);
        }
    }

    fn parse_additive(&mut self) -> Result<Expression> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.advance();

            let right = self.parse_multiplicative()?;
            left = binary(left, op, right);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expression> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Mod,
                _ => return Ok(left),
            };
            self.advance();

            let right = self.parse_unary()?;
            left = binary(left, op, right);
        }
    }

    fn parse_unary(&mut self) -> Result<Expression> {
        let op = match self.peek() {
            Some(Token::Bang) => UnaryOp::Not,
            Some(Token::Minus) => UnaryOp::Minus,
            Some(Token::Plus) => UnaryOp::Plus,
            _ => return self.parse_postfix(),
        };

        let start_span = self.advance().expect("peek confirmed unary operator").span;

        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(anyhow!(ParseError::InvalidSyntax {
                message: format!("expression nested too deeply (limit {})", MAX_NESTING),
                span: start_span,
            }));
        }
        let expr = self.parse_unary();
        self.depth -= 1;

        let expr = expr?;
        let span = start_span.merge(expr.span());

        Ok(Expression::Unary {
            op,
            expr: Box::new(expr),
            span,
        })
    }

    fn parse_postfix(&mut self) -> Result<Expression> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.advance();

                    let (property, end_span) = match self.advance() {
                        Some(SpannedToken { token: Token::Identifier(id), span }) => (id, span),
                        Some(SpannedToken { token: Token::True, span }) => ("true".to_string(), span),
                        Some(SpannedToken { token: Token::False, span }) => ("false".to_string(), span),
                        Some(SpannedToken { token: Token::Null, span }) => ("null".to_string(), span),
                        Some(other) => {
                            return Err(anyhow!(ParseError::UnexpectedToken {
                                expected: "property name after '.'".to_string(),
                                found: other.token.display_name(),
                                span: other.span,
                            }));
                        }
                        None => {
                            return Err(anyhow!(ParseError::UnexpectedEof {
                                expected: "property name".to_string(),
                                context: Some("member access".to_string()),
                            }));
                        }
                    };

                    let span = expr.span().merge(&end_span);
                    expr = Expression::Member {
                        object: Box::new(expr),
                        property,
                        span,
                    };
                }

                Some(Token::LeftBracket) => {
                    self.advance();
                    let index = self.parse_expression()?;
                    let end_span = self.expect(Token::RightBracket, "index expression")?;
                    let span = expr.span().merge(&end_span);

                    expr = Expression::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                        span,
                    };
                }

                Some(Token::LeftParen) => {
                    self.advance();
                    let (args, end_span) = self.parse_list(Token::RightParen, "call arguments")?;
                    let span = expr.span().merge(&end_span);

                    expr = Expression::Call {
                        callee: Box::new(expr),
                        args,
                        span,
                    };
                }

                _ => return Ok(expr),
            }
        }
    }

    /// Parses comma-separated expressions up to and including `close`.
    /// A trailing comma is accepted.
    fn parse_list(&mut self, close: Token, context: &str) -> Result<(Vec<Expression>, Span)> {
        let mut items = Vec::with_capacity(4);

        while self.peek() != Some(&close) {
            items.push(self.parse_expression()?);

            if !self.eat(&Token::Comma) {
                break;
            }
        }

        let end_span = self.expect(close, context)?;
        Ok((items, end_span))
    }

    fn parse_primary(&mut self) -> Result<Expression> {
        let Some(st) = self.advance() else {
            return Err(anyhow!(ParseError::UnexpectedEof {
                expected: "expression".to_string(),
                context: None,
            }));
        };

        match st.token {
            Token::True => Ok(Expression::Bool(true, st.span)),
            Token::False => Ok(Expression::Bool(false, st.span)),
            Token::Null => Ok(Expression::Null(st.span)),
            Token::Number(n) => Ok(Expression::Number(n, st.span)),
            Token::String(s) => Ok(Expression::String(s, st.span)),
            Token::Identifier(id) => Ok(Expression::Identifier(id, st.span)),
            Token::Template(chunks) => self.parse_template(chunks, st.span),

            Token::LeftParen => {
                let expr = self.parse_expression()?;
                self.expect(Token::RightParen, "parenthesised expression")?;
                Ok(expr)
            }

            Token::LeftBracket => {
                let (items, end_span) = self.parse_list(Token::RightBracket, "array literal")?;
                Ok(Expression::Array(items, st.span.merge(&end_span)))
            }

            Token::LeftBrace => self.parse_object(st.span),

            other => Err(anyhow!(ParseError::UnexpectedToken {
                expected: "expression".to_string(),
                found: other.display_name(),
                span: st.span,
            })),
        }
    }

    fn parse_object(&mut self, start_span: Span) -> Result<Expression> {
        let mut entries = Vec::with_capacity(8);

        while self.peek() != Some(&Token::RightBrace) {
            let Some(key_token) = self.advance() else {
                return Err(anyhow!(ParseError::UnexpectedEof {
                    expected: "property key".to_string(),
                    context: Some("object literal".to_string()),
                }));
            };
            let key_span = key_token.span;

            let (key, shorthand) = match key_token.token {
                Token::Identifier(id) => (PropertyKey::Named(id.clone()), Some(id)),
                Token::String(s) => (PropertyKey::Named(s), None),
                Token::Number(n) => (PropertyKey::Named(n.to_string()), None),
                Token::True => (PropertyKey::Named("true".to_string()), None),
                Token::False => (PropertyKey::Named("false".to_string()), None),
                Token::Null => (PropertyKey::Named("null".to_string()), None),
                Token::LeftBracket => {
                    let expr = self.parse_expression()?;
                    self.expect(Token::RightBracket, "computed property key")?;
                    (PropertyKey::Computed(expr), None)
                }
                other => {
                    return Err(anyhow!(ParseError::UnexpectedToken {
                        expected: "property key".to_string(),
                        found: other.display_name(),
                        span: key_span,
                    }));
                }
            };

            let value = match (shorthand, self.peek()) {
                (Some(name), Some(Token::Comma) | Some(Token::RightBrace)) => {
                    Expression::Identifier(name, key_span)
                }
                _ => {
                    self.expect(Token::Colon, "object literal")?;
                    self.parse_expression()?
                }
            };

            let span = key_span.merge(value.span());
            entries.push(ObjectEntry { key, value, span });

            if !self.eat(&Token::Comma) {
                break;
            }
        }

        let end_span = self.expect(Token::RightBrace, "object literal")?;
        Ok(Expression::Object(entries, start_span.merge(&end_span)))
    }

    pub(super) fn parse_template(
        &mut self,
        chunks: Vec<TemplateChunk>,
        span: Span,
    ) -> Result<Expression> {
        let mut parts = SmallVec::with_capacity(chunks.len());

        for chunk in chunks {
            match chunk {
                TemplateChunk::Text(text) => parts.push(TemplatePart::Literal(text)),
                TemplateChunk::Code { source, span: code_span } => {
                    let tokens = tokenize(&source)
                        .map_err(|e| anyhow!(ParseError::from(e.relocate(&code_span))))?;

                    if tokens.is_empty() {
                        return Err(anyhow!(ParseError::InvalidSyntax {
                            message: "empty expression in template literal".to_string(),
                            span: code_span,
                        }));
                    }

                    let tokens = tokens
                        .into_iter()
                        .map(|st| relocate_token(st, &code_span))
                        .collect();

                    let mut inner = Parser::new(tokens);
                    inner.depth = self.depth;
                    let expr = inner.parse_expression()?;
                    inner.expect_end()?;

                    parts.push(TemplatePart::Expression(Box::new(expr)));
                }
            }
        }

        Ok(Expression::Template { parts, span })
    }
}

fn relocate_token(st: SpannedToken, base: &Span) -> SpannedToken {
    let token = match st.token {
        Token::Template(chunks) => Token::Template(
            chunks
                .into_iter()
                .map(|chunk| match chunk {
                    TemplateChunk::Code { source, span } => {
                        TemplateChunk::Code { source, span: span.relocate(base) }
                    }
                    text => text,
                })
                .collect(),
        ),
        other => other,
    };

    SpannedToken { token, span: st.span.relocate(base) }
}

fn binary(left: Expression, op: BinaryOp, right: Expression) -> Expression {
    let span = left.span().merge(right.span());
    Expression::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
        span,
    }
}

fn logical(left: Expression, op: LogicalOp, right: Expression) -> Expression {
    let span = left.span().merge(right.span());
    Expression::Logical {
        left: Box::new(left),
        op,
        right: Box::new(right),
        span,
    }
}
