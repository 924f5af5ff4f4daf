//! Tree-walking interpreter for compiled template expressions.
//!
//! Submodules:
//! - [`expressions`] – expression evaluation and call dispatch

mod expressions;

use anyhow::Result;

use crate::builtins::BuiltinRegistry;
use crate::context::Context;
use crate::value::Value;
use jsontpl_syntax::ast::Expression;

/// Evaluates [`Expression`]s against a borrowed [`Context`].
///
/// Executors are cheap to create; an [`Executable`](crate::Executable) makes a
/// fresh one for every call.
pub struct Executor<'ctx> {
    context: &'ctx Context,
    builtins: BuiltinRegistry,
}

impl<'ctx> Executor<'ctx> {
    /// Creates an executor whose identifiers resolve against `context`.
    pub fn new(context: &'ctx Context) -> Self {
        Self {
            context,
            builtins: BuiltinRegistry::new(),
        }
    }

    /// Evaluates the whole expression tree.
    pub fn evaluate(&self, expr: &Expression) -> Result<Value> {
        self.eval_expression(expr)
    }

    /// Looks `name` up in the context, then among the builtins.
    pub fn resolve(&self, name: &str) -> Option<Value> {
        self.context
            .get(name)
            .cloned()
            .or_else(|| self.builtins.lookup(name))
    }
}
