use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub col: usize,
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(line: usize, col: usize, start: usize, end: usize) -> Self {
        Self { line, col, start, end }
    }

    pub fn single(line: usize, col: usize, offset: usize) -> Self {
        Self { line, col, start: offset, end: offset + 1 }
    }

    pub fn merge(&self, other: &Span) -> Self {
        Self {
            line: self.line.min(other.line),
            col: if self.line == other.line { self.col.min(other.col) } else { self.col },
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Moves a span produced by lexing a substring back into the coordinates
    /// of the enclosing source. `base` is where the substring starts.
    pub fn relocate(&self, base: &Span) -> Self {
        let col = if self.line == 1 { base.col + self.col - 1 } else { self.col };
        Self {
            line: base.line + self.line - 1,
            col,
            start: base.start + self.start,
            end: base.start + self.end,
        }
    }
}

#[derive(Debug, Clone)]
pub enum LexError {
    UnexpectedChar { ch: char, span: Span, suggestion: Option<String> },
    UnterminatedString { span: Span },
    UnterminatedTemplate { span: Span },
    InvalidNumber { text: String, span: Span },
    InvalidEscape { ch: char, span: Span },
    NestedTooDeeply { limit: usize, span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedChar { span, .. } => *span,
            LexError::UnterminatedString { span } => *span,
            LexError::UnterminatedTemplate { span } => *span,
            LexError::InvalidNumber { span, .. } => *span,
            LexError::InvalidEscape { span, .. } => *span,
            LexError::NestedTooDeeply { span, .. } => *span,
        }
    }

    pub(crate) fn relocate(self, base: &Span) -> Self {
        match self {
            LexError::UnexpectedChar { ch, span, suggestion } => {
                LexError::UnexpectedChar { ch, span: span.relocate(base), suggestion }
            }
            LexError::UnterminatedString { span } => {
                LexError::UnterminatedString { span: span.relocate(base) }
            }
            LexError::UnterminatedTemplate { span } => {
                LexError::UnterminatedTemplate { span: span.relocate(base) }
            }
            LexError::InvalidNumber { text, span } => {
                LexError::InvalidNumber { text, span: span.relocate(base) }
            }
            LexError::InvalidEscape { ch, span } => {
                LexError::InvalidEscape { ch, span: span.relocate(base) }
            }
            LexError::NestedTooDeeply { limit, span } => {
                LexError::NestedTooDeeply { limit, span: span.relocate(base) }
            }
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexError::UnexpectedChar { ch, suggestion, .. } => {
                write!(f, "unexpected character '{}'", ch)?;
                if let Some(s) = suggestion {
                    write!(f, " (did you mean '{}'?)", s)?;
                }
                Ok(())
            }
            LexError::UnterminatedString { .. } => {
                write!(f, "unterminated string literal")
            }
            LexError::UnterminatedTemplate { .. } => {
                write!(f, "unterminated template literal")
            }
            LexError::InvalidNumber { text, .. } => {
                write!(f, "invalid number: '{}'", text)
            }
            LexError::InvalidEscape { ch, .. } => {
                write!(f, "invalid escape sequence: '\\{}'", ch)
            }
            LexError::NestedTooDeeply { limit, .. } => {
                write!(f, "template literal nested too deeply (limit {})", limit)
            }
        }
    }
}

impl std::error::Error for LexError {}

#[derive(Debug, Clone)]
pub enum ParseError {
    UnexpectedToken { expected: String, found: String, span: Span },
    UnexpectedEof { expected: String, context: Option<String> },
    InvalidSyntax { message: String, span: Span },
    LexError(LexError),
}

impl ParseError {
    pub fn span(&self) -> Option<Span> {
        match self {
            ParseError::UnexpectedToken { span, .. } => Some(*span),
            ParseError::UnexpectedEof { .. } => None,
            ParseError::InvalidSyntax { span, .. } => Some(*span),
            ParseError::LexError(e) => Some(e.span()),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnexpectedToken { expected, found, .. } => {
                write!(f, "expected {}, found {}", expected, found)
            }
            ParseError::UnexpectedEof { expected, context } => {
                if let Some(ctx) = context {
                    write!(f, "unexpected end of input while parsing {}, expected {}", ctx, expected)
                } else {
                    write!(f, "unexpected end of input, expected {}", expected)
                }
            }
            ParseError::InvalidSyntax { message, .. } => {
                write!(f, "{}", message)
            }
            ParseError::LexError(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError::LexError(err)
    }
}

/// A lex or parse error bound to the source it came from, renderable with a
/// caret under the offending range.
pub struct Diagnostic<'a> {
    source: &'a str,
    error: DiagnosticError,
}

pub enum DiagnosticError {
    Lex(LexError),
    Parse(ParseError),
}

impl<'a> Diagnostic<'a> {
    pub fn new_lex(source: &'a str, error: LexError) -> Self {
        Self { source, error: DiagnosticError::Lex(error) }
    }

    pub fn new_parse(source: &'a str, error: ParseError) -> Self {
        Self { source, error: DiagnosticError::Parse(error) }
    }

    fn span(&self) -> Option<Span> {
        match &self.error {
            DiagnosticError::Lex(e) => Some(e.span()),
            DiagnosticError::Parse(e) => e.span(),
        }
    }

    fn message(&self) -> String {
        match &self.error {
            DiagnosticError::Lex(e) => e.to_string(),
            DiagnosticError::Parse(e) => e.to_string(),
        }
    }

    fn error_label(&self) -> &str {
        match &self.error {
            DiagnosticError::Lex(_) => "lexical error",
            DiagnosticError::Parse(_) => "parse error",
        }
    }

    /// Renders the error without terminal colors.
    pub fn format_error(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("error: {}\n", self.message()));

        let Some(span) = self.span() else {
            output.push_str(&format!("   | {}\n", self.error_label()));
            return output;
        };

        output.push_str(&format!("  --> line {}:{}\n", span.line, span.col));
        output.push_str("   |\n");

        let lines: Vec<&str> = self.source.lines().collect();

        if span.line > 0 && span.line <= lines.len() {
            let line_content = lines[span.line - 1];
            let line_num_width = (span.line + 1).to_string().len().max(2);
            output.push_str(&format!(
                " {: >width$} | {}\n",
                span.line,
                line_content,
                width = line_num_width
            ));

            let visual_col: usize = line_content
                .chars()
                .take(span.col.saturating_sub(1))
                .map(|ch| if ch == '\t' { 4 } else { 1 })
                .sum();

            let error_len = self
                .source
                .get(span.start..span.end)
                .map(|text| text.chars().count().max(1))
                .unwrap_or(1);

            output.push_str(&format!(
                " {: >width$} | {}{} {}\n",
                "",
                " ".repeat(visual_col),
                "^".repeat(error_len),
                self.error_label(),
                width = line_num_width
            ));
        }

        output.push_str("   |\n");
        output
    }
}

impl<'a> fmt::Display for Diagnostic<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_spans_on_same_line() {
        let a = Span::new(1, 3, 2, 4);
        let b = Span::new(1, 7, 6, 9);
        assert_eq!(a.merge(&b), Span::new(1, 3, 2, 9));
    }

    #[test]
    fn relocate_span_into_enclosing_source() {
        let base = Span::new(1, 5, 4, 10);
        let inner = Span::new(1, 2, 1, 3);
        assert_eq!(inner.relocate(&base), Span::new(1, 6, 5, 7));
    }

    #[test]
    fn diagnostic_points_at_offending_range() {
        let source = "a + #";
        let err = LexError::UnexpectedChar {
            ch: '#',
            span: Span::new(1, 5, 4, 5),
            suggestion: None,
        };
        let rendered = Diagnostic::new_lex(source, err).format_error();
        assert!(rendered.contains("unexpected character '#'"));
        assert!(rendered.contains("line 1:5"));
        assert!(rendered.contains("    ^ lexical error"));
    }
}
