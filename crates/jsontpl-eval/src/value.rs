use anyhow::{Result, anyhow, bail};
use indexmap::IndexMap;
use lru::LruCache;
use regex::Regex;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, OnceLock};

pub type Map = IndexMap<String, Value>;

// ============================================================================
// VALUES
// ============================================================================

/// A runtime value. Also the input type of the template compiler, where every
/// variant except [`Value::Function`] is a valid template.
#[derive(Debug, Clone)]
pub enum Value {
    // Primitives
    Null,
    Bool(bool),
    Number(f64),
    String(String),

    // Composite
    Array(Vec<Value>),
    Object(Map),

    // Callable
    Function(Function),
}

type NativeFn = dyn Fn(&[Value]) -> Result<Value> + Send + Sync;

/// A named native function that compiled expressions can call.
#[derive(Clone)]
pub struct Function {
    name: Arc<str>,
    func: Arc<NativeFn>,
}

impl Function {
    pub fn new<F>(name: impl Into<Arc<str>>, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: &[Value]) -> Result<Value> {
        (self.func)(args)
    }

    pub fn ptr_eq(&self, other: &Function) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Function: {}]", self.name)
    }
}

impl Value {
    // ========================================================================
    // TYPE CHECKS
    // ========================================================================

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) | Value::Function(_) => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Numeric conversion with the usual loose rules: `null` is 0, booleans
    /// are 0/1, blank strings are 0, unparsable values are NaN.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
            Value::Array(_) | Value::Object(_) | Value::Function(_) => f64::NAN,
        }
    }

    // ========================================================================
    // PROPERTY ACCESS
    // ========================================================================

    /// Reads `self.name`. Missing properties read as `null`; reading anything
    /// from `null` is an error.
    pub fn get_property(&self, name: &str) -> Result<Value> {
        match self {
            Value::Null => bail!("Cannot read properties of null (reading '{}')", name),
            Value::Object(map) => Ok(map.get(name).cloned().unwrap_or(Value::Null)),
            Value::String(s) => match name {
                "length" => Ok(Value::Number(s.chars().count() as f64)),
                _ => Ok(Value::Null),
            },
            Value::Array(items) => match name {
                "length" => Ok(Value::Number(items.len() as f64)),
                _ => match name.parse::<usize>() {
                    Ok(i) => Ok(items.get(i).cloned().unwrap_or(Value::Null)),
                    Err(_) => Ok(Value::Null),
                },
            },
            Value::Function(func) => match name {
                "name" => Ok(Value::String(func.name().to_string())),
                _ => Ok(Value::Null),
            },
            Value::Bool(_) | Value::Number(_) => Ok(Value::Null),
        }
    }

    /// Reads `self[index]`.
    pub fn get_index(&self, index: &Value) -> Result<Value> {
        match (self, index) {
            (Value::Array(items), Value::Number(n)) => Ok(array_slot(items, *n)),
            (Value::String(s), Value::Number(n)) => {
                if n.fract() != 0.0 || *n < 0.0 {
                    return Ok(Value::Null);
                }
                Ok(s.chars()
                    .nth(*n as usize)
                    .map(|c| Value::String(c.to_string()))
                    .unwrap_or(Value::Null))
            }
            _ => self.get_property(&index.to_property_key()),
        }
    }

    /// The string form used when a value names an object property.
    pub fn to_property_key(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            other => other.to_display_string(),
        }
    }

    // ========================================================================
    // METHOD CALLS
    // ========================================================================

    pub fn call_method(&self, name: &str, args: &[Value]) -> Result<Value> {
        match self {
            Value::String(s) => call_string_method(s, name, args),
            Value::Number(n) => call_number_method(*n, name, args),
            Value::Array(items) => call_array_method(items, name, args),
            Value::Object(map) => match map.get(name) {
                Some(Value::Function(func)) => func.call(args),
                Some(other) => bail!("'{}' is a {}, not a function", name, other.type_name()),
                None => bail!("Method '{}' not found on object", name),
            },
            Value::Null => bail!("Cannot read properties of null (reading '{}')", name),
            _ => bail!("Cannot call method '{}' on {}", name, self.type_name()),
        }
    }

    // ========================================================================
    // DISPLAY
    // ========================================================================

    /// Converts the value to the text it contributes to a template string.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Array(items) => items
                .iter()
                .map(|v| match v {
                    Value::Null => String::new(),
                    other => other.to_display_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => "[object Object]".to_string(),
            Value::Function(func) => format!("[Function: {}]", func.name()),
        }
    }

    // ========================================================================
    // JSON
    // ========================================================================

    /// Converts to a `serde_json::Value`. Functions have no JSON form and
    /// non-finite numbers become `null`, as `JSON.stringify` would do.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => serde_json::Value::Array(
                items.iter().map(Value::to_json).collect::<Result<_>>()?,
            ),
            Value::Object(map) => {
                let mut object = serde_json::Map::with_capacity(map.len());
                for (key, value) in map {
                    object.insert(key.clone(), value.to_json()?);
                }
                serde_json::Value::Object(object)
            }
            Value::Function(func) => {
                return Err(anyhow!("Cannot convert function '{}' to JSON", func.name()));
            }
        })
    }
}

/// Formats a number the way it appears in a template string.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        format!("{}", n)
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

fn array_slot(items: &[Value], n: f64) -> Value {
    if n.fract() != 0.0 || n < 0.0 {
        return Value::Null;
    }
    items.get(n as usize).cloned().unwrap_or(Value::Null)
}

/// Resolves a possibly negative slice bound against `len`.
fn slice_bound(arg: Option<&Value>, len: usize, default: usize) -> usize {
    match arg.map(Value::to_number) {
        None => default,
        Some(n) if n.is_nan() => 0,
        Some(n) if n < 0.0 => len.saturating_sub((-n) as usize),
        Some(n) => (n as usize).min(len),
    }
}

fn expect_args(method: &str, args: &[Value], expected: usize) -> Result<()> {
    if args.len() != expected {
        bail!("{}() expects {} argument(s), got {}", method, expected, args.len());
    }
    Ok(())
}

fn string_arg(method: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => bail!("{}() expects a string argument, got {}", method, other.type_name()),
    }
}

fn call_string_method(s: &str, name: &str, args: &[Value]) -> Result<Value> {
    match name {
        "toUpperCase" => {
            expect_args(name, args, 0)?;
            Ok(Value::String(s.to_uppercase()))
        }

        "toLowerCase" => {
            expect_args(name, args, 0)?;
            Ok(Value::String(s.to_lowercase()))
        }

        "trim" => {
            expect_args(name, args, 0)?;
            Ok(Value::String(s.trim().to_string()))
        }

        "includes" => {
            expect_args(name, args, 1)?;
            let needle = string_arg(name, &args[0])?;
            Ok(Value::Bool(s.contains(&needle)))
        }

        "startsWith" => {
            expect_args(name, args, 1)?;
            let prefix = string_arg(name, &args[0])?;
            Ok(Value::Bool(s.starts_with(&prefix)))
        }

        "endsWith" => {
            expect_args(name, args, 1)?;
            let suffix = string_arg(name, &args[0])?;
            Ok(Value::Bool(s.ends_with(&suffix)))
        }

        "split" => {
            expect_args(name, args, 1)?;
            let delimiter = string_arg(name, &args[0])?;
            let parts = if delimiter.is_empty() {
                s.chars().map(|c| Value::String(c.to_string())).collect()
            } else {
                s.split(delimiter.as_str())
                    .map(|p| Value::String(p.to_string()))
                    .collect()
            };
            Ok(Value::Array(parts))
        }

        "replace" => {
            expect_args(name, args, 2)?;
            let from = string_arg(name, &args[0])?;
            let to = args[1].to_display_string();
            Ok(Value::String(s.replacen(&from, &to, 1)))
        }

        "matches" => {
            expect_args(name, args, 1)?;
            let pattern = string_arg(name, &args[0])?;
            let regex = cached_regex(&pattern)?;
            Ok(Value::Bool(regex.is_match(s)))
        }

        _ => bail!("'{}' is not a string method", name),
    }
}

fn call_number_method(n: f64, name: &str, args: &[Value]) -> Result<Value> {
    match name {
        "toFixed" => {
            let digits = match args.first() {
                None => 0,
                Some(Value::Number(d)) if (0.0..=100.0).contains(d) => *d as usize,
                Some(other) => bail!("toFixed() digits must be between 0 and 100, got {}", other.to_display_string()),
            };
            if !n.is_finite() {
                return Ok(Value::String(format_number(n)));
            }
            Ok(Value::String(format!("{:.*}", digits, n)))
        }

        _ => bail!("'{}' is not a number method", name),
    }
}

fn call_array_method(items: &[Value], name: &str, args: &[Value]) -> Result<Value> {
    match name {
        "join" => {
            let separator = match args.first() {
                None => ",".to_string(),
                Some(value) => string_arg(name, value)?,
            };

            let strings: Vec<String> = items
                .iter()
                .map(|v| match v {
                    Value::Null => String::new(),
                    other => other.to_display_string(),
                })
                .collect();

            Ok(Value::String(strings.join(&separator)))
        }

        "includes" => {
            expect_args(name, args, 1)?;
            Ok(Value::Bool(items.iter().any(|v| *v == args[0])))
        }

        "indexOf" => {
            expect_args(name, args, 1)?;
            let index = items
                .iter()
                .position(|v| *v == args[0])
                .map(|i| i as f64)
                .unwrap_or(-1.0);
            Ok(Value::Number(index))
        }

        "slice" => {
            let start = slice_bound(args.first(), items.len(), 0);
            let end = slice_bound(args.get(1), items.len(), items.len());
            if start >= end {
                return Ok(Value::Array(Vec::new()));
            }
            Ok(Value::Array(items[start..end].to_vec()))
        }

        "reverse" => {
            expect_args(name, args, 0)?;
            let mut reversed = items.to_vec();
            reversed.reverse();
            Ok(Value::Array(reversed))
        }

        _ => bail!("'{}' is not an array method", name),
    }
}

static REGEX_CACHE: OnceLock<Mutex<LruCache<String, Regex>>> = OnceLock::new();

const REGEX_CACHE_SIZE: usize = 64;

fn cached_regex(pattern: &str) -> Result<Regex> {
    let cache = REGEX_CACHE.get_or_init(|| {
        Mutex::new(LruCache::new(
            NonZeroUsize::new(REGEX_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN),
        ))
    });

    let mut cache = cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(regex) = cache.get(pattern) {
        return Ok(regex.clone());
    }

    let regex = Regex::new(pattern)?;
    cache.put(pattern.to_string(), regex.clone());
    Ok(regex)
}

// ============================================================================
// EQUALITY
// ============================================================================

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

// ============================================================================
// FROM IMPLEMENTATIONS
// ============================================================================

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Object(map)
    }
}

impl From<Function> for Value {
    fn from(func: Function) -> Self {
        Value::Function(func)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(object) => Value::Object(
                object
                    .into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        Value::from(json.clone())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}
