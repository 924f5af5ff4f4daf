//! The environment a compiled template is evaluated against.

use crate::value::{Function, Value};
use anyhow::{Result, bail};
use rustc_hash::FxHashMap;

/// Variables visible as bare identifiers inside an expression.
///
/// Lookups consult the context first; names it does not define fall back to
/// the [`BuiltinRegistry`](crate::builtins::BuiltinRegistry).
#[derive(Debug, Clone, Default)]
pub struct Context {
    variables: FxHashMap<String, Value>,
}

impl Context {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: binds `name` to `value`.
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Builder: binds `name` to a native function.
    pub fn with_function<F>(mut self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        let name = name.into();
        let func = Function::new(name.as_str(), func);
        self.variables.insert(name, Value::Function(func));
        self
    }

    /// Builds a context from a JSON object; each top-level key becomes a variable.
    pub fn from_json(json: serde_json::Value) -> Result<Self> {
        match json {
            serde_json::Value::Object(object) => Ok(object
                .into_iter()
                .map(|(key, value)| (key, Value::from(value)))
                .collect()),
            other => bail!("context must be a JSON object, got {}", Value::from(other).type_name()),
        }
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.variables.remove(name)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.variables.iter()
    }
}

impl FromIterator<(String, Value)> for Context {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            variables: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_json_object() {
        let ctx = Context::from_json(json!({"a": 2, "b": "x"})).unwrap();
        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx.get("a"), Some(&Value::Number(2.0)));
        assert_eq!(ctx.get("b"), Some(&Value::from("x")));
    }

    #[test]
    fn from_json_rejects_non_objects() {
        let err = Context::from_json(json!([1, 2])).unwrap_err();
        assert_eq!(err.to_string(), "context must be a JSON object, got array");
    }

    #[test]
    fn with_function_registers_callable() {
        let ctx = Context::new().with_function("twice", |args| {
            Ok(Value::Number(args.first().map(Value::to_number).unwrap_or(0.0) * 2.0))
        });

        match ctx.get("twice") {
            Some(Value::Function(f)) => {
                assert_eq!(f.name(), "twice");
                assert_eq!(f.call(&[Value::Number(4.0)]).unwrap(), Value::Number(8.0));
            }
            other => panic!("expected function, got {:?}", other),
        }
    }
}
