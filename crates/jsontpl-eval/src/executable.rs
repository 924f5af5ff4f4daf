//! Turning compiled source text into something callable.

use anyhow::Result;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::context::Context;
use crate::executor::Executor;
use crate::value::Value;
use jsontpl_syntax::ast::Expression;
use jsontpl_syntax::parse_source;

/// Compiled source parsed once and ready to evaluate against any number of
/// contexts. Cloning is cheap.
#[derive(Clone)]
pub struct Executable {
    source: Arc<str>,
    expression: Arc<Expression>,
}

impl Executable {
    /// The source text this executable was built from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    /// Evaluates the expression with `context`'s variables in scope.
    pub fn call(&self, context: &Context) -> Result<Value> {
        Executor::new(context).evaluate(&self.expression)
    }

    /// Like [`call`](Self::call), taking the context as a JSON object.
    pub fn call_json(&self, context: serde_json::Value) -> Result<Value> {
        self.call(&Context::from_json(context)?)
    }
}

impl fmt::Debug for Executable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executable")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Parses `source` into an [`Executable`].
///
/// Syntax errors are reported here rather than at call time; they downcast
/// to [`ParseError`](jsontpl_syntax::ParseError) and can be rendered with
/// [`render_error`](jsontpl_syntax::render_error).
pub fn adapt(source: &str) -> Result<Executable> {
    debug!(len = source.len(), "adapting compiled source");

    let expression = parse_source(source)?;

    Ok(Executable {
        source: Arc::from(source),
        expression: Arc::new(expression),
    })
}
