use anyhow::Result;
use jsontpl_eval::{Context, EvalError, Value, adapt};
use jsontpl_syntax::ParseError;
use serde_json::json;

fn eval(source: &str, ctx: &Context) -> Result<Value> {
    adapt(source)?.call(ctx)
}

#[test]
fn test_arithmetic_with_context() -> Result<()> {
    let ctx = Context::new().with_variable("a", 2).with_variable("b", 3);
    assert_eq!(eval("a + b", &ctx)?, Value::Number(5.0));
    assert_eq!(eval("(a + b) * 2 - 1", &ctx)?, Value::Number(9.0));
    assert_eq!(eval("b % a", &ctx)?, Value::Number(1.0));
    Ok(())
}

#[test]
fn test_template_literal_stringifies_parts() -> Result<()> {
    let ctx = Context::new()
        .with_variable("n", 7)
        .with_variable("items", Value::from(json!([1, null, "x"])));

    assert_eq!(eval("`x=${n}`", &ctx)?, Value::from("x=7"));
    assert_eq!(eval("`[${items}]`", &ctx)?, Value::from("[1,,x]"));
    assert_eq!(eval("`${ {} }`", &ctx)?, Value::from("[object Object]"));
    Ok(())
}

#[test]
fn test_object_literal_keeps_order_and_computed_keys() -> Result<()> {
    let ctx = Context::new().with_variable("k", "id");
    let value = eval("{ 'z': 1, [k]: 2, a: 3 }", &ctx)?;

    let map = value.as_object().expect("object");
    let keys: Vec<_> = map.keys().cloned().collect();
    assert_eq!(keys, vec!["z", "id", "a"]);
    assert_eq!(map["id"], Value::Number(2.0));
    Ok(())
}

#[test]
fn test_context_shadows_builtins() -> Result<()> {
    let ctx = Context::new().with_function("max", |_| Ok(Value::from("shadowed")));
    assert_eq!(eval("max(1, 2)", &ctx)?, Value::from("shadowed"));
    assert_eq!(eval("max(1, 2)", &Context::new())?, Value::Number(2.0));
    Ok(())
}

#[test]
fn test_undefined_identifier_is_spanned_error() {
    let err = eval("1 + missing", &Context::new()).unwrap_err();
    let eval_err = err.downcast_ref::<EvalError>().expect("EvalError");

    assert_eq!(eval_err.message, "'missing' is not defined");
    let span = eval_err.span.expect("span");
    assert_eq!((span.start, span.end), (4, 11));
}

#[test]
fn test_calling_non_function_fails() {
    let ctx = Context::new().with_variable("n", 1);
    let err = eval("n(2)", &ctx).unwrap_err();
    assert_eq!(err.to_string(), "'n' is not a function (got number)");
}

#[test]
fn test_native_function_error_names_function() {
    let ctx = Context::new().with_function("fail", |_| anyhow::bail!("nope"));
    let err = eval("fail()", &ctx).unwrap_err();
    assert_eq!(err.to_string(), "fail(): nope");
}

#[test]
fn test_member_access_and_methods() -> Result<()> {
    let ctx = Context::from_json(json!({
        "user": { "name": "  Ada ", "tags": ["a", "b", "c"] }
    }))?;

    assert_eq!(eval("user.name.trim().toUpperCase()", &ctx)?, Value::from("ADA"));
    assert_eq!(eval("user.tags.length", &ctx)?, Value::Number(3.0));
    assert_eq!(eval("user.tags[1]", &ctx)?, Value::from("b"));
    assert_eq!(eval("user['tags'].join('-')", &ctx)?, Value::from("a-b-c"));
    assert_eq!(eval("user.missing", &ctx)?, Value::Null);
    assert_eq!(eval("user.tags.slice(-2)", &ctx)?, Value::from(json!(["b", "c"])));
    Ok(())
}

#[test]
fn test_object_function_property_is_callable() -> Result<()> {
    let mut math = jsontpl_eval::Map::new();
    math.insert(
        "double".to_string(),
        Value::Function(jsontpl_eval::Function::new("double", |args| {
            Ok(Value::Number(args[0].to_number() * 2.0))
        })),
    );
    let ctx = Context::new().with_variable("math", Value::Object(math));

    assert_eq!(eval("math.double(21)", &ctx)?, Value::Number(42.0));
    Ok(())
}

#[test]
fn test_property_of_null_fails() {
    let ctx = Context::new().with_variable("x", Value::Null);
    let err = eval("x.y", &ctx).unwrap_err();
    assert!(err.to_string().contains("Cannot read properties of null"));
}

#[test]
fn test_regex_matches_method() -> Result<()> {
    let ctx = Context::new().with_variable("email", "ada@example.com");
    assert_eq!(eval(r"email.matches('^[^@]+@[^@]+$')", &ctx)?, Value::Bool(true));
    Ok(())
}

#[test]
fn test_number_to_fixed() -> Result<()> {
    assert_eq!(eval("(2 / 3).toFixed(2)", &Context::new())?, Value::from("0.67"));
    Ok(())
}

#[test]
fn test_adapt_reports_syntax_errors_eagerly() {
    let err = adapt("{ a: }").unwrap_err();
    assert!(err.downcast_ref::<ParseError>().is_some());
}

#[test]
fn test_executable_is_reusable() -> Result<()> {
    let exe = adapt("`hello ${name}`")?;
    assert_eq!(exe.call_json(json!({"name": "a"}))?, Value::from("hello a"));
    assert_eq!(exe.call_json(json!({"name": "b"}))?, Value::from("hello b"));
    assert_eq!(exe.source(), "`hello ${name}`");
    Ok(())
}

#[test]
fn test_non_finite_constants() -> Result<()> {
    let ctx = Context::new();
    assert_eq!(eval("-Infinity", &ctx)?, Value::Number(f64::NEG_INFINITY));
    assert!(matches!(eval("NaN", &ctx)?, Value::Number(n) if n.is_nan()));
    assert_eq!(eval("undefined", &ctx)?, Value::Null);
    Ok(())
}
