use crate::value::Value;
use anyhow::{Result, bail};
use jsontpl_syntax::ast::{BinaryOp, UnaryOp};

pub fn eval_binary_op(left: &Value, op: BinaryOp, right: &Value) -> Result<Value> {
    match op {
        BinaryOp::Add => eval_add(left, right),
        BinaryOp::Sub => eval_arithmetic(left, right, "subtract", |l, r| l - r),
        BinaryOp::Mul => eval_arithmetic(left, right, "multiply", |l, r| l * r),
        BinaryOp::Div => eval_arithmetic(left, right, "divide", |l, r| l / r),
        BinaryOp::Mod => eval_arithmetic(left, right, "take the remainder of", |l, r| l % r),
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::Ne => Ok(Value::Bool(left != right)),
        BinaryOp::Lt => eval_compare(left, right, "<", |o| o.is_lt()),
        BinaryOp::Le => eval_compare(left, right, "<=", |o| o.is_le()),
        BinaryOp::Gt => eval_compare(left, right, ">", |o| o.is_gt()),
        BinaryOp::Ge => eval_compare(left, right, ">=", |o| o.is_ge()),
    }
}

pub fn eval_unary_op(op: UnaryOp, operand: &Value) -> Result<Value> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
        UnaryOp::Plus => Ok(Value::Number(operand.to_number())),
        UnaryOp::Minus => match operand {
            Value::Number(n) => Ok(Value::Number(-n)),
            _ => bail!("Cannot negate {}", operand.type_name()),
        },
    }
}

fn eval_add(left: &Value, right: &Value) -> Result<Value> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l + r)),
        (Value::String(l), Value::String(r)) => Ok(Value::String(format!("{}{}", l, r))),
        (Value::String(l), r) => Ok(Value::String(format!("{}{}", l, r.to_display_string()))),
        (l, Value::String(r)) => Ok(Value::String(format!("{}{}", l.to_display_string(), r))),
        _ => bail!("Cannot add {} and {}", left.type_name(), right.type_name()),
    }
}

fn eval_arithmetic(
    left: &Value,
    right: &Value,
    verb: &str,
    op: impl Fn(f64, f64) -> f64,
) -> Result<Value> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => Ok(Value::Number(op(*l, *r))),
        _ => bail!("Cannot {} {} and {}", verb, left.type_name(), right.type_name()),
    }
}

fn eval_compare(
    left: &Value,
    right: &Value,
    symbol: &str,
    test: impl Fn(std::cmp::Ordering) -> bool,
) -> Result<Value> {
    let ordering = match (left, right) {
        (Value::Number(l), Value::Number(r)) => l.partial_cmp(r),
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        _ => bail!("Cannot compare {} {} {}", left.type_name(), symbol, right.type_name()),
    };

    // Any comparison involving NaN is false.
    Ok(Value::Bool(ordering.is_some_and(test)))
}
