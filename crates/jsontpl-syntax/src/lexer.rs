use crate::error::{LexError, Span};
use crate::parser::MAX_NESTING;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

static KEYWORDS: Lazy<HashMap<&'static str, Token>> = Lazy::new(|| {
    let mut m = HashMap::with_capacity(4);
    m.insert("true", Token::True);
    m.insert("false", Token::False);
    m.insert("null", Token::Null);
    m
});

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    True,
    False,
    Null,
    Eq,
    StrictEq,
    Ne,
    StrictNe,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    AndAnd,
    OrOr,
    Question,
    QuestionQuestion,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    LeftParen,
    RightParen,
    Dot,
    Comma,
    Colon,
    Identifier(String),
    String(String),
    Template(Vec<TemplateChunk>),
    Number(f64),
}

/// A piece of a backtick template literal as seen by the lexer. Embedded code
/// is kept as raw text and parsed later, the same way a nested source is.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateChunk {
    Text(String),
    Code { source: String, span: Span },
}

impl Token {
    pub fn display_name(&self) -> String {
        match self {
            Token::True => "keyword 'true'".to_string(),
            Token::False => "keyword 'false'".to_string(),
            Token::Null => "keyword 'null'".to_string(),
            Token::Identifier(s) => format!("identifier '{}'", s),
            Token::String(s) => format!("string '{}'", s),
            Token::Template(_) => "template literal".to_string(),
            Token::Number(n) => format!("number {}", n),
            other => format!("'{}'", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

struct Cursor<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    col: usize,
    offset: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { chars: input.chars().peekable(), line: 1, col: 1, offset: 0 }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        self.offset += ch.len_utf8();
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn mark(&self) -> (usize, usize, usize) {
        (self.line, self.col, self.offset)
    }

    fn span_from(&self, mark: (usize, usize, usize)) -> Span {
        Span::new(mark.0, mark.1, mark.2, self.offset)
    }
}

pub fn tokenize(input: &str) -> Result<Vec<SpannedToken>, LexError> {
    let mut tokens = Vec::with_capacity(input.len() / 3);
    let mut cur = Cursor::new(input);

    while let Some(ch) = cur.peek() {
        let start = cur.mark();

        let token = match ch {
            ' ' | '\t' | '\r' | '\n' => {
                cur.bump();
                continue;
            }

            '\'' | '"' => {
                cur.bump();
                Token::String(lex_quoted(&mut cur, ch, start)?)
            }

            '`' => {
                cur.bump();
                Token::Template(lex_template(&mut cur, start)?)
            }

            '0'..='9' => lex_number(&mut cur, String::new(), start)?,

            '.' => {
                cur.bump();
                if cur.peek().is_some_and(|c| c.is_ascii_digit()) {
                    lex_number(&mut cur, "0.".to_string(), start)?
                } else {
                    Token::Dot
                }
            }

            '=' => {
                cur.bump();
                if cur.eat('=') {
                    if cur.eat('=') { Token::StrictEq } else { Token::Eq }
                } else {
                    return Err(LexError::UnexpectedChar {
                        ch: '=',
                        span: cur.span_from(start),
                        suggestion: Some("==".to_string()),
                    });
                }
            }

            '!' => {
                cur.bump();
                if cur.eat('=') {
                    if cur.eat('=') { Token::StrictNe } else { Token::Ne }
                } else {
                    Token::Bang
                }
            }

            '<' => {
                cur.bump();
                if cur.eat('=') { Token::Le } else { Token::Lt }
            }

            '>' => {
                cur.bump();
                if cur.eat('=') { Token::Ge } else { Token::Gt }
            }

            '&' => {
                cur.bump();
                if cur.eat('&') {
                    Token::AndAnd
                } else {
                    return Err(LexError::UnexpectedChar {
                        ch: '&',
                        span: cur.span_from(start),
                        suggestion: Some("&&".to_string()),
                    });
                }
            }

            '|' => {
                cur.bump();
                if cur.eat('|') {
                    Token::OrOr
                } else {
                    return Err(LexError::UnexpectedChar {
                        ch: '|',
                        span: cur.span_from(start),
                        suggestion: Some("||".to_string()),
                    });
                }
            }

            '?' => {
                cur.bump();
                if cur.eat('?') { Token::QuestionQuestion } else { Token::Question }
            }

            '+' | '-' | '*' | '/' | '%' | '{' | '}' | '[' | ']' | '(' | ')' | ',' | ':' => {
                cur.bump();
                match ch {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '%' => Token::Percent,
                    '{' => Token::LeftBrace,
                    '}' => Token::RightBrace,
                    '[' => Token::LeftBracket,
                    ']' => Token::RightBracket,
                    '(' => Token::LeftParen,
                    ')' => Token::RightParen,
                    ',' => Token::Comma,
                    _ => Token::Colon,
                }
            }

            _ if is_ident_start(ch) => {
                let mut ident = String::with_capacity(16);
                while let Some(c) = cur.peek() {
                    if is_ident_continue(c) {
                        ident.push(c);
                        cur.bump();
                    } else {
                        break;
                    }
                }

                KEYWORDS
                    .get(ident.as_str())
                    .cloned()
                    .unwrap_or(Token::Identifier(ident))
            }

            _ => {
                cur.bump();
                return Err(LexError::UnexpectedChar {
                    ch,
                    span: cur.span_from(start),
                    suggestion: None,
                });
            }
        };

        tokens.push(SpannedToken { token, span: cur.span_from(start) });
    }

    Ok(tokens)
}

fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}

fn is_ident_continue(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}

fn lex_number(
    cur: &mut Cursor<'_>,
    mut text: String,
    start: (usize, usize, usize),
) -> Result<Token, LexError> {
    while let Some(c) = cur.peek() {
        if c.is_ascii_digit() || c == '.' {
            text.push(c);
            cur.bump();
        } else {
            break;
        }
    }

    if matches!(cur.peek(), Some('e') | Some('E')) {
        text.push('e');
        cur.bump();
        if let Some(sign @ ('+' | '-')) = cur.peek() {
            text.push(sign);
            cur.bump();
        }
        while let Some(c) = cur.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                cur.bump();
            } else {
                break;
            }
        }
    }

    if cur.peek().is_some_and(is_ident_start) {
        return Err(LexError::InvalidNumber { text, span: cur.span_from(start) });
    }

    text.parse::<f64>()
        .map(Token::Number)
        .map_err(|_| LexError::InvalidNumber { text, span: cur.span_from(start) })
}

/// Reads one escape sequence after a consumed backslash.
fn lex_escape(cur: &mut Cursor<'_>) -> Result<char, LexError> {
    let start = cur.mark();
    let Some(ch) = cur.bump() else {
        return Err(LexError::UnterminatedString { span: cur.span_from(start) });
    };

    let cooked = match ch {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '0' => '\0',
        '\\' | '\'' | '"' | '`' | '$' | '{' | '}' | '/' => ch,
        '\n' => '\n',
        'u' => {
            let mut hex = String::with_capacity(6);
            if cur.eat('{') {
                while let Some(c) = cur.bump() {
                    if c == '}' {
                        break;
                    }
                    hex.push(c);
                }
            } else {
                for _ in 0..4 {
                    match cur.bump() {
                        Some(c) => hex.push(c),
                        None => break,
                    }
                }
            }
            return u32::from_str_radix(&hex, 16)
                .ok()
                .and_then(char::from_u32)
                .ok_or(LexError::InvalidEscape { ch: 'u', span: cur.span_from(start) });
        }
        other => {
            return Err(LexError::InvalidEscape { ch: other, span: cur.span_from(start) });
        }
    };

    Ok(cooked)
}

fn lex_quoted(
    cur: &mut Cursor<'_>,
    quote: char,
    start: (usize, usize, usize),
) -> Result<String, LexError> {
    let mut string = String::new();

    loop {
        match cur.bump() {
            None => return Err(LexError::UnterminatedString { span: cur.span_from(start) }),
            Some(c) if c == quote => return Ok(string),
            Some('\\') => string.push(lex_escape(cur)?),
            Some(c) => string.push(c),
        }
    }
}

fn lex_template(
    cur: &mut Cursor<'_>,
    start: (usize, usize, usize),
) -> Result<Vec<TemplateChunk>, LexError> {
    let mut chunks = Vec::with_capacity(4);
    let mut text = String::new();

    loop {
        match cur.bump() {
            None => return Err(LexError::UnterminatedTemplate { span: cur.span_from(start) }),
            Some('`') => break,
            Some('\\') => text.push(lex_escape(cur)?),
            Some('$') if cur.peek() == Some('{') => {
                cur.bump();
                if !text.is_empty() {
                    chunks.push(TemplateChunk::Text(std::mem::take(&mut text)));
                }
                let code_start = cur.mark();
                let mut source = String::new();
                copy_code(cur, &mut source, start, 1)?;
                let span = Span::new(
                    code_start.0,
                    code_start.1,
                    code_start.2,
                    code_start.2 + source.len(),
                );
                chunks.push(TemplateChunk::Code { source, span });
            }
            Some(c) => text.push(c),
        }
    }

    if !text.is_empty() {
        chunks.push(TemplateChunk::Text(text));
    }

    Ok(chunks)
}

/// Copies raw expression text up to the `}` closing a `${`, skipping over
/// nested braces, quoted strings and nested template literals. The closing
/// brace is consumed but not copied.
fn copy_code(
    cur: &mut Cursor<'_>,
    out: &mut String,
    start: (usize, usize, usize),
    nesting: usize,
) -> Result<(), LexError> {
    if nesting > MAX_NESTING {
        return Err(LexError::NestedTooDeeply { limit: MAX_NESTING, span: cur.span_from(start) });
    }
    let mut depth = 0usize;

    loop {
        let Some(c) = cur.bump() else {
            return Err(LexError::UnterminatedTemplate { span: cur.span_from(start) });
        };

        match c {
            '}' if depth == 0 => return Ok(()),
            '{' => {
                depth += 1;
                out.push(c);
            }
            '}' => {
                depth -= 1;
                out.push(c);
            }
            '\'' | '"' => {
                out.push(c);
                copy_quoted(cur, c, out, start)?;
            }
            '`' => {
                out.push(c);
                copy_template(cur, out, start, nesting)?;
            }
            _ => out.push(c),
        }
    }
}

fn copy_quoted(
    cur: &mut Cursor<'_>,
    quote: char,
    out: &mut String,
    start: (usize, usize, usize),
) -> Result<(), LexError> {
    loop {
        let Some(c) = cur.bump() else {
            return Err(LexError::UnterminatedString { span: cur.span_from(start) });
        };
        out.push(c);
        if c == '\\' {
            if let Some(next) = cur.bump() {
                out.push(next);
            }
        } else if c == quote {
            return Ok(());
        }
    }
}

fn copy_template(
    cur: &mut Cursor<'_>,
    out: &mut String,
    start: (usize, usize, usize),
    nesting: usize,
) -> Result<(), LexError> {
    loop {
        let Some(c) = cur.bump() else {
            return Err(LexError::UnterminatedTemplate { span: cur.span_from(start) });
        };
        out.push(c);
        match c {
            '\\' => {
                if let Some(next) = cur.bump() {
                    out.push(next);
                }
            }
            '`' => return Ok(()),
            '$' if cur.peek() == Some('{') => {
                cur.bump();
                out.push('{');
                copy_code(cur, out, start, nesting + 1)?;
                out.push('}');
            }
            _ => {}
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::Null => write!(f, "null"),
            Token::Eq => write!(f, "=="),
            Token::StrictEq => write!(f, "==="),
            Token::Ne => write!(f, "!="),
            Token::StrictNe => write!(f, "!=="),
            Token::Lt => write!(f, "<"),
            Token::Le => write!(f, "<="),
            Token::Gt => write!(f, ">"),
            Token::Ge => write!(f, ">="),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::Bang => write!(f, "!"),
            Token::AndAnd => write!(f, "&&"),
            Token::OrOr => write!(f, "||"),
            Token::Question => write!(f, "?"),
            Token::QuestionQuestion => write!(f, "??"),
            Token::LeftBrace => write!(f, "{{"),
            Token::RightBrace => write!(f, "}}"),
            Token::LeftBracket => write!(f, "["),
            Token::RightBracket => write!(f, "]"),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::Dot => write!(f, "."),
            Token::Comma => write!(f, ","),
            Token::Colon => write!(f, ":"),
            Token::Identifier(s) => write!(f, "{}", s),
            Token::String(s) => write!(f, "'{}'", s),
            Token::Template(_) => write!(f, "`...`"),
            Token::Number(n) => write!(f, "{}", n),
        }
    }
}
