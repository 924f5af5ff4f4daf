use crate::value::{Function, Value};
use anyhow::{Result, bail};
use once_cell::sync::Lazy;
use std::collections::HashMap;

pub type BuiltinFn = fn(&[Value]) -> Result<Value>;

static BUILTIN_FUNCTIONS: Lazy<HashMap<&'static str, BuiltinFn>> = Lazy::new(|| {
    let mut map = HashMap::with_capacity(24);
    map.insert("max", builtin_max as BuiltinFn);
    map.insert("min", builtin_min as BuiltinFn);
    map.insert("sum", builtin_sum as BuiltinFn);
    map.insert("abs", builtin_abs as BuiltinFn);
    map.insert("floor", builtin_floor as BuiltinFn);
    map.insert("ceil", builtin_ceil as BuiltinFn);
    map.insert("round", builtin_round as BuiltinFn);
    map.insert("len", builtin_len as BuiltinFn);
    map.insert("concat", builtin_concat as BuiltinFn);
    map.insert("join", builtin_join as BuiltinFn);
    map.insert("keys", builtin_keys as BuiltinFn);
    map.insert("values", builtin_values as BuiltinFn);
    map.insert("upper", builtin_upper as BuiltinFn);
    map.insert("lower", builtin_lower as BuiltinFn);
    map.insert("trim", builtin_trim as BuiltinFn);
    map.insert("string", builtin_string as BuiltinFn);
    map.insert("number", builtin_number as BuiltinFn);
    map
});

/// The fixed set of names every expression can see after the context's own
/// variables: a few constants plus the builtin functions.
#[derive(Clone)]
pub struct BuiltinRegistry;

impl BuiltinRegistry {
    pub fn new() -> Self {
        Self
    }

    pub fn constant(&self, name: &str) -> Option<Value> {
        match name {
            "NaN" => Some(Value::Number(f64::NAN)),
            "Infinity" => Some(Value::Number(f64::INFINITY)),
            "undefined" => Some(Value::Null),
            _ => None,
        }
    }

    pub fn function(&self, name: &str) -> Option<Value> {
        BUILTIN_FUNCTIONS
            .get_key_value(name)
            .map(|(name, func)| Value::Function(Function::new(*name, *func)))
    }

    pub fn has(&self, name: &str) -> bool {
        BUILTIN_FUNCTIONS.contains_key(name) || self.constant(name).is_some()
    }

    /// Resolves a builtin name to its value.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.constant(name).or_else(|| self.function(name))
    }
}

impl Default for BuiltinRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Numeric arguments with arrays spread in place, so both `max(1, 2)` and
/// `max([1, 2])` work.
fn numbers(args: &[Value]) -> Vec<f64> {
    let mut out = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            Value::Array(items) => out.extend(items.iter().map(Value::to_number)),
            other => out.push(other.to_number()),
        }
    }
    out
}

fn single<'a>(name: &str, args: &'a [Value]) -> Result<&'a Value> {
    if args.len() != 1 {
        bail!("{}() takes exactly 1 argument, got {}", name, args.len());
    }
    Ok(&args[0])
}

pub fn builtin_max(args: &[Value]) -> Result<Value> {
    let nums = numbers(args);
    if nums.iter().any(|n| n.is_nan()) {
        return Ok(Value::Number(f64::NAN));
    }
    Ok(Value::Number(nums.into_iter().fold(f64::NEG_INFINITY, f64::max)))
}

pub fn builtin_min(args: &[Value]) -> Result<Value> {
    let nums = numbers(args);
    if nums.iter().any(|n| n.is_nan()) {
        return Ok(Value::Number(f64::NAN));
    }
    Ok(Value::Number(nums.into_iter().fold(f64::INFINITY, f64::min)))
}

pub fn builtin_sum(args: &[Value]) -> Result<Value> {
    Ok(Value::Number(numbers(args).into_iter().sum()))
}

pub fn builtin_abs(args: &[Value]) -> Result<Value> {
    Ok(Value::Number(single("abs", args)?.to_number().abs()))
}

pub fn builtin_floor(args: &[Value]) -> Result<Value> {
    Ok(Value::Number(single("floor", args)?.to_number().floor()))
}

pub fn builtin_ceil(args: &[Value]) -> Result<Value> {
    Ok(Value::Number(single("ceil", args)?.to_number().ceil()))
}

pub fn builtin_round(args: &[Value]) -> Result<Value> {
    // Halves round towards positive infinity: round(-2.5) is -2.
    Ok(Value::Number((single("round", args)?.to_number() + 0.5).floor()))
}

pub fn builtin_len(args: &[Value]) -> Result<Value> {
    let len = match single("len", args)? {
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        other => bail!("len() requires a string, array or object, got {}", other.type_name()),
    };
    Ok(Value::Number(len as f64))
}

pub fn builtin_concat(args: &[Value]) -> Result<Value> {
    if let Some(Value::Array(_)) = args.first() {
        let mut out = Vec::new();
        for arg in args {
            match arg {
                Value::Array(items) => out.extend(items.iter().cloned()),
                other => out.push(other.clone()),
            }
        }
        return Ok(Value::Array(out));
    }

    Ok(Value::String(
        args.iter().map(Value::to_display_string).collect(),
    ))
}

pub fn builtin_join(args: &[Value]) -> Result<Value> {
    let (items, separator) = match args {
        [Value::Array(items)] => (items, ",".to_string()),
        [Value::Array(items), sep] => (items, sep.to_display_string()),
        _ => bail!("join() requires an array and an optional separator"),
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

pub fn builtin_keys(args: &[Value]) -> Result<Value> {
    match single("keys", args)? {
        Value::Object(map) => Ok(Value::Array(
            map.keys().map(|k| Value::String(k.clone())).collect(),
        )),
        Value::Array(items) => Ok(Value::Array(
            (0..items.len()).map(|i| Value::String(i.to_string())).collect(),
        )),
        other => bail!("keys() requires an object, got {}", other.type_name()),
    }
}

pub fn builtin_values(args: &[Value]) -> Result<Value> {
    match single("values", args)? {
        Value::Object(map) => Ok(Value::Array(map.values().cloned().collect())),
        Value::Array(items) => Ok(Value::Array(items.clone())),
        other => bail!("values() requires an object, got {}", other.type_name()),
    }
}

pub fn builtin_upper(args: &[Value]) -> Result<Value> {
    Ok(Value::String(single("upper", args)?.to_display_string().to_uppercase()))
}

pub fn builtin_lower(args: &[Value]) -> Result<Value> {
    Ok(Value::String(single("lower", args)?.to_display_string().to_lowercase()))
}

pub fn builtin_trim(args: &[Value]) -> Result<Value> {
    Ok(Value::String(single("trim", args)?.to_display_string().trim().to_string()))
}

pub fn builtin_string(args: &[Value]) -> Result<Value> {
    Ok(Value::String(single("string", args)?.to_display_string()))
}

pub fn builtin_number(args: &[Value]) -> Result<Value> {
    Ok(Value::Number(single("number", args)?.to_number()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nums(values: &[f64]) -> Vec<Value> {
        values.iter().map(|n| Value::Number(*n)).collect()
    }

    #[test]
    fn max_and_min_are_variadic() {
        assert_eq!(builtin_max(&nums(&[1.0, 3.0, 2.0])).unwrap(), Value::Number(3.0));
        assert_eq!(builtin_min(&nums(&[4.0, -1.0])).unwrap(), Value::Number(-1.0));
    }

    #[test]
    fn max_spreads_arrays() {
        let args = vec![Value::Array(nums(&[5.0, 9.0])), Value::Number(7.0)];
        assert_eq!(builtin_max(&args).unwrap(), Value::Number(9.0));
    }

    #[test]
    fn max_without_arguments_is_negative_infinity() {
        assert_eq!(builtin_max(&[]).unwrap(), Value::Number(f64::NEG_INFINITY));
    }

    #[test]
    fn round_halves_up() {
        assert_eq!(builtin_round(&nums(&[2.5])).unwrap(), Value::Number(3.0));
        assert_eq!(builtin_round(&nums(&[-2.5])).unwrap(), Value::Number(-2.0));
    }

    #[test]
    fn len_rejects_numbers() {
        assert!(builtin_len(&nums(&[1.0])).is_err());
    }

    #[test]
    fn concat_strings_and_arrays() {
        let strings = vec![Value::from("a"), Value::Number(1.0), Value::Bool(true)];
        assert_eq!(builtin_concat(&strings).unwrap(), Value::from("a1true"));

        let arrays = vec![Value::Array(nums(&[1.0])), Value::Array(nums(&[2.0])), Value::Number(3.0)];
        assert_eq!(builtin_concat(&arrays).unwrap(), Value::Array(nums(&[1.0, 2.0, 3.0])));
    }

    #[test]
    fn registry_resolves_constants_before_functions() {
        let registry = BuiltinRegistry::new();
        assert!(matches!(registry.lookup("Infinity"), Some(Value::Number(n)) if n.is_infinite()));
        assert!(matches!(registry.lookup("max"), Some(Value::Function(f)) if f.name() == "max"));
        assert!(registry.lookup("nope").is_none());
        assert!(registry.has("undefined"));
    }
}
