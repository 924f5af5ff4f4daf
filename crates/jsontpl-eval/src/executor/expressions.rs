//! Expression evaluation helpers.

use anyhow::{Result, anyhow};
use smallvec::SmallVec;

use crate::bail_span;
use crate::binary_ops::{eval_binary_op, eval_unary_op};
use crate::error::{EvalError, with_span};
use crate::value::{Map, Value};
use jsontpl_syntax::ast::{Expression, LogicalOp, PropertyKey, TemplatePart};
use jsontpl_syntax::error::Span;

use super::Executor;

type Args = SmallVec<[Value; 4]>;

impl Executor<'_> {
    /// Evaluates an expression and returns its runtime [`Value`].
    pub fn eval_expression(&self, expr: &Expression) -> Result<Value> {
        match expr {
            Expression::Null(_) => Ok(Value::Null),
            Expression::Bool(b, _) => Ok(Value::Bool(*b)),
            Expression::Number(n, _) => Ok(Value::Number(*n)),
            Expression::String(s, _) => Ok(Value::String(s.clone())),

            Expression::Identifier(name, span) => self.resolve(name).ok_or_else(|| {
                anyhow!(EvalError::spanned(format!("'{}' is not defined", name), span))
            }),

            Expression::Template { parts, .. } => {
                let mut result = String::new();
                for part in parts {
                    match part {
                        TemplatePart::Literal(s) => result.push_str(s),
                        TemplatePart::Expression(expr) => {
                            result.push_str(&self.eval_expression(expr)?.to_display_string());
                        }
                    }
                }
                Ok(Value::String(result))
            }

            Expression::Array(elements, _) => {
                let mut values = Vec::with_capacity(elements.len());
                for e in elements {
                    values.push(self.eval_expression(e)?);
                }
                Ok(Value::Array(values))
            }

            Expression::Object(entries, _) => {
                let mut map = Map::with_capacity(entries.len());
                for entry in entries {
                    let key = match &entry.key {
                        PropertyKey::Named(name) => name.clone(),
                        PropertyKey::Computed(expr) => self.eval_expression(expr)?.to_property_key(),
                    };
                    let value = self.eval_expression(&entry.value)?;
                    map.insert(key, value);
                }
                Ok(Value::Object(map))
            }

            Expression::Member { object, property, span } => {
                let obj = self.eval_expression(object)?;
                obj.get_property(property).map_err(|e| with_span(e, span))
            }

            Expression::Index { object, index, span } => {
                let obj = self.eval_expression(object)?;
                let idx = self.eval_expression(index)?;
                obj.get_index(&idx).map_err(|e| with_span(e, span))
            }

            Expression::Call { callee, args, span } => self.eval_call(callee, args, span),

            Expression::Unary { op, expr, span } => {
                let val = self.eval_expression(expr)?;
                eval_unary_op(*op, &val).map_err(|e| with_span(e, span))
            }

            Expression::Binary { left, op, right, span } => {
                let left_val = self.eval_expression(left)?;
                let right_val = self.eval_expression(right)?;
                eval_binary_op(&left_val, *op, &right_val).map_err(|e| with_span(e, span))
            }

            Expression::Logical { left, op, right, .. } => {
                let left_val = self.eval_expression(left)?;
                let short_circuit = match op {
                    LogicalOp::And => !left_val.is_truthy(),
                    LogicalOp::Or => left_val.is_truthy(),
                    LogicalOp::Nullish => !left_val.is_null(),
                };
                if short_circuit {
                    Ok(left_val)
                } else {
                    self.eval_expression(right)
                }
            }

            Expression::Conditional {
                condition,
                then_expr,
                else_expr,
                ..
            } => {
                if self.eval_expression(condition)?.is_truthy() {
                    self.eval_expression(then_expr)
                } else {
                    self.eval_expression(else_expr)
                }
            }
        }
    }

    fn eval_args(&self, args: &[Expression]) -> Result<Args> {
        let mut values = Args::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_expression(arg)?);
        }
        Ok(values)
    }

    fn eval_call(&self, callee: &Expression, args: &[Expression], span: &Span) -> Result<Value> {
        // `a.b(..)` dispatches on the receiver so strings and arrays get
        // their methods; everything else must evaluate to a function.
        if let Expression::Member { object, property, .. } = callee {
            let receiver = self.eval_expression(object)?;
            let arg_values = self.eval_args(args)?;
            return receiver
                .call_method(property, &arg_values)
                .map_err(|e| with_span(e, span));
        }

        let target = self.eval_expression(callee)?;
        let arg_values = self.eval_args(args)?;

        match target {
            Value::Function(func) => {
                tracing::trace!(function = func.name(), args = arg_values.len(), "calling function");
                func.call(&arg_values).map_err(|e| {
                    with_span(anyhow!("{}(): {}", func.name(), e), span)
                })
            }
            other => bail_span!(
                span,
                "{} is not a function (got {})",
                describe_callee(callee),
                other.type_name()
            ),
        }
    }
}

fn describe_callee(callee: &Expression) -> String {
    match callee {
        Expression::Identifier(name, _) => format!("'{}'", name),
        _ => "expression".to_string(),
    }
}
