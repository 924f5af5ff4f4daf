//! # jsontpl Syntax
//!
//! Lexer, parser, and Abstract Syntax Tree (AST) definitions for the
//! expressions that the jsontpl compiler emits.
//!
//! ## Overview
//!
//! - **Lexer**: Tokenizes expression source into a stream of tokens
//! - **Parser**: Builds a single [`Expression`] using recursive descent
//! - **AST**: Type-safe representation of compiled templates
//! - **Error Handling**: Spanned errors and a [`Diagnostic`] renderer
//!
//! ## Architecture
//!
//! ```text
//! Compiled Source
//!     ↓
//! Lexer (tokenize)
//!     ↓
//! Vec<SpannedToken>
//!     ↓
//! Parser (parse)
//!     ↓
//! Expression (AST)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use jsontpl_syntax::{parse_source, Expression};
//!
//! let expr = parse_source("{ 'name': `hi ${user}` }").expect("parse failed");
//! assert!(matches!(expr, Expression::Object(..)));
//! ```
//!
//! ## Grammar Overview
//!
//! ```text
//! Expression (lowest to highest precedence):
//!   - Conditional   c ? a : b
//!   - Nullish       a ?? b
//!   - Logical       a || b, a && b
//!   - Equality      == != === !==
//!   - Comparison    < <= > >=
//!   - Arithmetic    + - * / %
//!   - Unary         ! - +
//!   - Postfix       a.b  a[b]  f(x, y)
//!   - Primary       literals, identifiers, `template ${x}`,
//!                   [arrays], { objects }, (grouping)
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;

pub use ast::*;
pub use error::{Diagnostic, LexError, ParseError, Span};
pub use lexer::{SpannedToken, TemplateChunk, Token, tokenize};
pub use parser::{parse, parse_source, render_error};
