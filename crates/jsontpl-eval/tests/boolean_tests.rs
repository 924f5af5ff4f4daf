use anyhow::Result;
use jsontpl_eval::{Context, Value, adapt};

fn eval(source: &str) -> Result<Value> {
    let ctx = Context::new()
        .with_variable("zero", 0)
        .with_variable("empty", "")
        .with_variable("name", "ada")
        .with_variable("nothing", Value::Null)
        .with_variable("list", Value::Array(vec![]));
    adapt(source)?.call(&ctx)
}

#[test]
fn test_falsy_values() -> Result<()> {
    for source in ["!zero", "!empty", "!nothing", "!false", "!NaN"] {
        assert_eq!(eval(source)?, Value::Bool(true), "{}", source);
    }
    Ok(())
}

#[test]
fn test_empty_array_is_truthy() -> Result<()> {
    assert_eq!(eval("!list")?, Value::Bool(false));
    Ok(())
}

#[test]
fn test_or_returns_operand() -> Result<()> {
    assert_eq!(eval("empty || 'anonymous'")?, Value::from("anonymous"));
    assert_eq!(eval("name || 'anonymous'")?, Value::from("ada"));
    Ok(())
}

#[test]
fn test_and_short_circuits() -> Result<()> {
    // The right side would fail if it were evaluated.
    assert_eq!(eval("nothing && nothing.field")?, Value::Null);
    assert_eq!(eval("name && name.length")?, Value::Number(3.0));
    Ok(())
}

#[test]
fn test_nullish_only_replaces_null() -> Result<()> {
    assert_eq!(eval("zero ?? 5")?, Value::Number(0.0));
    assert_eq!(eval("nothing ?? 5")?, Value::Number(5.0));
    Ok(())
}

#[test]
fn test_conditional() -> Result<()> {
    assert_eq!(eval("name == 'ada' ? 'yes' : 'no'")?, Value::from("yes"));
    assert_eq!(eval("zero ? 'yes' : zero === 0 ? 'zero' : 'no'")?, Value::from("zero"));
    Ok(())
}
