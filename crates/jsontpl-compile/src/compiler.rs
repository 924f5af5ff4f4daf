//! Turns a template [`Value`] into expression source.
//!
//! | value | emitted |
//! |-------|---------|
//! | `null`, `true`, `1.5` | the literal |
//! | `"text"` | `'text'` |
//! | `"{{ expr }}"` | `expr` |
//! | `"a {{ expr }} b"` | `` `a ${expr} b` `` |
//! | `[a, b]` | `[a, b]` |
//! | `{"$f": [a, b]}` | `f(a, b)` |
//! | `{"$$f": a}` | `{ '$f': a }` |
//! | `{"k": v, "{{ e }}": w}` | `{ 'k': v, [e]: w }` |

use crate::error::CompileError;
use crate::interpolate::{Segment, segments};
use crate::options::CompileOptions;
use jsontpl_eval::{Map, Value};
use tracing::{debug, trace};

/// Deepest template nesting accepted.
///
/// Emitted source nests at most three levels deeper than the template
/// (computed keys holding template literals), which leaves room under the
/// parser's limit of 48 for the expressions inside `{{ }}` captures.
pub const MAX_DEPTH: usize = 32;

/// Compiles `value` with the default options.
pub fn to_source(value: &Value) -> Result<String, CompileError> {
    to_source_with(value, &CompileOptions::default())
}

pub fn to_source_with(value: &Value, options: &CompileOptions) -> Result<String, CompileError> {
    debug!(kind = value.type_name(), "compiling template");
    let mut compiler = Compiler {
        options,
        path: Vec::new(),
    };
    let source = compiler.value(value, 0)?;
    debug!(len = source.len(), "compiled template");
    Ok(source)
}

struct Compiler<'a> {
    options: &'a CompileOptions,
    path: Vec<String>,
}

impl Compiler<'_> {
    fn value(&mut self, value: &Value, depth: usize) -> Result<String, CompileError> {
        if depth > MAX_DEPTH {
            return Err(CompileError::DepthLimitExceeded { limit: MAX_DEPTH });
        }
        trace!(depth, kind = value.type_name(), "emit");

        match value {
            Value::Null => Ok("null".to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Number(n) => Ok(number_literal(*n)),
            Value::String(s) => Ok(self.string(s).into_source()),
            Value::Array(items) => self.array(items, depth),
            Value::Object(map) => self.object(map, depth),
            Value::Function(_) => Err(CompileError::UnsupportedType {
                type_name: value.type_name().to_string(),
                path: self.pointer(),
            }),
        }
    }

    fn child(
        &mut self,
        segment: impl Into<String>,
        value: &Value,
        depth: usize,
    ) -> Result<String, CompileError> {
        self.path.push(segment.into());
        let out = self.value(value, depth + 1);
        self.path.pop();
        out
    }

    fn string(&self, s: &str) -> StringCode {
        let segs = segments(s, &self.options.string);
        match segs.as_slice() {
            [] => StringCode::Quoted(quote("")),
            [Segment::Literal(text)] => StringCode::Quoted(quote(text)),
            [Segment::Placeholder(p)] if p.spans_whole(s) => {
                StringCode::Expression(p.expression().to_string())
            }
            _ => {
                let mut out = String::with_capacity(s.len() + 2);
                out.push('`');
                for seg in &segs {
                    match seg {
                        Segment::Literal(text) => escape_template_text(text, &mut out),
                        Segment::Placeholder(p) => {
                            out.push_str("${");
                            out.push_str(p.expression());
                            out.push('}');
                        }
                    }
                }
                out.push('`');
                StringCode::Expression(out)
            }
        }
    }

    fn key(&self, key: &str) -> String {
        match self.string(key) {
            StringCode::Quoted(code) => code,
            StringCode::Expression(code) => format!("[{}]", code),
        }
    }

    fn array(&mut self, items: &[Value], depth: usize) -> Result<String, CompileError> {
        let elements = self.elements(items, depth)?;
        Ok(format!("[{}]", elements.join(", ")))
    }

    fn elements(&mut self, items: &[Value], depth: usize) -> Result<Vec<String>, CompileError> {
        items
            .iter()
            .enumerate()
            .map(|(i, item)| self.child(i.to_string(), item, depth))
            .collect()
    }

    fn object(&mut self, map: &Map, depth: usize) -> Result<String, CompileError> {
        let sigil = self.options.object.call.as_str();

        if map.len() == 1 && !sigil.is_empty() {
            if let Some((key, value)) = map.first() {
                // A bare sigil names no function and stays an ordinary key.
                if let Some(unescaped) = key.strip_prefix(sigil).filter(|name| !name.is_empty()) {
                    if unescaped.starts_with(sigil) {
                        let value = self.child(key.as_str(), value, depth)?;
                        return Ok(format!("{{ {}: {} }}", self.key(unescaped), value));
                    }

                    let args = match value {
                        Value::Array(items) => {
                            self.path.push(key.clone());
                            let args = self.elements(items, depth + 1);
                            self.path.pop();
                            args?
                        }
                        other => vec![self.child(key.as_str(), other, depth)?],
                    };
                    trace!(function = unescaped, args = args.len(), "emit call");
                    return Ok(format!("{}({})", unescaped, args.join(", ")));
                }
            }
        }

        let mut entries = Vec::with_capacity(map.len());
        for (key, value) in map {
            let value = self.child(key.as_str(), value, depth)?;
            entries.push(format!("{}: {}", self.key(key), value));
        }
        Ok(format!("{{ {} }}", entries.join(", ")))
    }

    fn pointer(&self) -> String {
        self.path
            .iter()
            .map(|seg| format!("/{}", seg.replace('~', "~0").replace('/', "~1")))
            .collect()
    }
}

/// Compiled form of a string value. Only `Quoted` can serve as a plain
/// object key; expressions need the computed `[expr]` form.
enum StringCode {
    Quoted(String),
    Expression(String),
}

impl StringCode {
    fn into_source(self) -> String {
        match self {
            StringCode::Quoted(code) | StringCode::Expression(code) => code,
        }
    }
}

fn number_literal(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let name = if n > 0.0 { "Infinity" } else { "-Infinity" };
        name.to_string()
    } else {
        format!("{}", n)
    }
}

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

fn escape_template_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '`' => out.push_str("\\`"),
            '$' => out.push_str("\\$"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsontpl_eval::Function;
    use serde_json::json;

    fn src(json: serde_json::Value) -> String {
        to_source(&Value::from(json)).expect("compiles")
    }

    #[test]
    fn scalars() {
        assert_eq!(src(json!(null)), "null");
        assert_eq!(src(json!(true)), "true");
        assert_eq!(src(json!(false)), "false");
        assert_eq!(src(json!(42)), "42");
        assert_eq!(src(json!(-1.5)), "-1.5");
    }

    #[test]
    fn non_finite_numbers() {
        assert_eq!(to_source(&Value::Number(f64::NAN)).unwrap(), "NaN");
        assert_eq!(to_source(&Value::Number(f64::INFINITY)).unwrap(), "Infinity");
        assert_eq!(to_source(&Value::Number(f64::NEG_INFINITY)).unwrap(), "-Infinity");
    }

    #[test]
    fn plain_strings_are_quoted() {
        assert_eq!(src(json!("hello")), "'hello'");
        assert_eq!(src(json!("")), "''");
        assert_eq!(src(json!("it's")), r"'it\'s'");
        assert_eq!(src(json!("a\\b\nc")), r"'a\\b\nc'");
    }

    #[test]
    fn whole_string_span_passes_through() {
        assert_eq!(src(json!("{{ a + b }}")), "a + b");
        assert_eq!(src(json!("{{user.name}}")), "user.name");
    }

    #[test]
    fn partial_spans_become_template_literal() {
        assert_eq!(src(json!("x={{ n }}")), "`x=${n}`");
        assert_eq!(src(json!("{{a}}{{b}}")), "`${a}${b}`");
        assert_eq!(src(json!(" {{ a }}")), "` ${a}`");
        assert_eq!(src(json!("cost: ${{ price }} `q`")), "`cost: \\$${price} \\`q\\``");
    }

    #[test]
    fn escaped_delimiters_stay_literal() {
        assert_eq!(src(json!("\\{{ a }}")), "'{{ a }}'");
    }

    #[test]
    fn arrays() {
        assert_eq!(src(json!([])), "[]");
        assert_eq!(src(json!([1, "two", null])), "[1, 'two', null]");
        assert_eq!(src(json!([[1], ["{{ x }}"]])), "[[1], [x]]");
    }

    #[test]
    fn objects() {
        assert_eq!(src(json!({})), "{  }");
        assert_eq!(src(json!({"a": 1, "b": [true]})), "{ 'a': 1, 'b': [true] }");
    }

    #[test]
    fn template_keys_are_computed() {
        assert_eq!(src(json!({"{{k}}": 1})), "{ [k]: 1 }");
        assert_eq!(src(json!({"id-{{k}}": 1, "x": 2})), "{ [`id-${k}`]: 1, 'x': 2 }");
    }

    #[test]
    fn passthrough_key_starting_with_quote_is_computed() {
        assert_eq!(src(json!({"{{ 'a' + k }}": 1})), "{ ['a' + k]: 1 }");
        assert_eq!(src(json!({"{{ \"a\" }}": 1})), "{ [\"a\"]: 1 }");
    }

    #[test]
    fn bare_sigil_is_plain_key() {
        assert_eq!(src(json!({"$": [1, 2]})), "{ '$': [1, 2] }");
    }

    #[test]
    fn call_convention() {
        assert_eq!(src(json!({"$max": [1, 2, 3]})), "max(1, 2, 3)");
        assert_eq!(src(json!({"$upper": "{{ name }}"})), "upper(name)");
        assert_eq!(src(json!({"$now": []})), "now()");
        assert_eq!(src(json!({"$wrap": [[1, 2]]})), "wrap([1, 2])");
    }

    #[test]
    fn call_sigil_needs_single_key() {
        assert_eq!(
            src(json!({"$max": [1], "other": 2})),
            "{ '$max': [1], 'other': 2 }"
        );
    }

    #[test]
    fn doubled_sigil_escapes_call() {
        assert_eq!(src(json!({"$$weird": 1})), "{ '$weird': 1 }");
        assert_eq!(src(json!({"$$$x": 1})), "{ '$$x': 1 }");
    }

    #[test]
    fn custom_options() {
        let opts = CompileOptions::default()
            .with_delimiters("<%", "%>")
            .with_call_sigil("@");
        let value = Value::from(json!({"@max": ["<% a %>", "{{b}}"]}));
        assert_eq!(to_source_with(&value, &opts).unwrap(), "max(a, '{{b}}')");
    }

    #[test]
    fn empty_sigil_disables_calls() {
        let opts = CompileOptions::default().with_call_sigil("");
        let value = Value::from(json!({"max": [1]}));
        assert_eq!(to_source_with(&value, &opts).unwrap(), "{ 'max': [1] }");
    }

    #[test]
    fn function_values_are_rejected_with_path() {
        let func = Value::Function(Function::new("f", |_| Ok(Value::Null)));

        let err = to_source(&func).unwrap_err();
        assert_eq!(
            err,
            CompileError::UnsupportedType {
                type_name: "function".to_string(),
                path: String::new(),
            }
        );

        let mut inner = Map::new();
        inner.insert("a/b".to_string(), Value::Array(vec![Value::Null, func]));
        let err = to_source(&Value::Object(inner)).unwrap_err();
        assert_eq!(
            err,
            CompileError::UnsupportedType {
                type_name: "function".to_string(),
                path: "/a~1b/1".to_string(),
            }
        );
    }

    #[test]
    fn depth_limit() {
        let mut value = Value::Null;
        for _ in 0..=MAX_DEPTH {
            value = Value::Array(vec![value]);
        }
        assert_eq!(
            to_source(&value).unwrap_err(),
            CompileError::DepthLimitExceeded { limit: MAX_DEPTH }
        );

        let mut ok = Value::Null;
        for _ in 0..MAX_DEPTH {
            ok = Value::Array(vec![ok]);
        }
        assert!(to_source(&ok).is_ok());
    }

    #[test]
    fn deterministic() {
        let value = Value::from(json!({"b": ["{{x}}", 1], "a": {"$f": 2}}));
        assert_eq!(to_source(&value).unwrap(), to_source(&value).unwrap());
    }
}
