use jsontpl_eval::value::{Function, Value};
use serde_json::json;

#[test]
fn test_type_names() {
    assert_eq!(Value::Null.type_name(), "null");
    assert_eq!(Value::Bool(true).type_name(), "boolean");
    assert_eq!(Value::Number(1.0).type_name(), "number");
    assert_eq!(Value::from("s").type_name(), "string");
    assert_eq!(Value::Array(vec![]).type_name(), "array");
    assert_eq!(Value::from(json!({})).type_name(), "object");
    assert_eq!(Value::Function(Function::new("f", |_| Ok(Value::Null))).type_name(), "function");
}

#[test]
fn test_structural_equality() {
    assert_eq!(Value::from(json!({"a": [1, 2]})), Value::from(json!({"a": [1, 2]})));
    assert_ne!(Value::from(json!([1])), Value::from(json!(["1"])));
    assert_ne!(Value::Number(f64::NAN), Value::Number(f64::NAN));
}

#[test]
fn test_functions_compare_by_identity() {
    let f = Function::new("f", |_| Ok(Value::Null));
    let g = Function::new("f", |_| Ok(Value::Null));
    assert_eq!(Value::Function(f.clone()), Value::Function(f.clone()));
    assert_ne!(Value::Function(f), Value::Function(g));
}

#[test]
fn test_to_number() {
    assert_eq!(Value::Null.to_number(), 0.0);
    assert_eq!(Value::Bool(true).to_number(), 1.0);
    assert_eq!(Value::from("  ").to_number(), 0.0);
    assert_eq!(Value::from("2.5").to_number(), 2.5);
    assert!(Value::from("abc").to_number().is_nan());
}

#[test]
fn test_get_index() {
    let arr = Value::from(json!(["a", "b"]));
    assert_eq!(arr.get_index(&Value::Number(1.0)).unwrap(), Value::from("b"));
    assert_eq!(arr.get_index(&Value::Number(5.0)).unwrap(), Value::Null);
    assert_eq!(arr.get_index(&Value::from("length")).unwrap(), Value::Number(2.0));

    let s = Value::from("héllo");
    assert_eq!(s.get_index(&Value::Number(1.0)).unwrap(), Value::from("é"));

    let obj = Value::from(json!({"1": "one"}));
    assert_eq!(obj.get_index(&Value::Number(1.0)).unwrap(), Value::from("one"));
}

#[test]
fn test_round_trip_through_json() {
    let json = json!({"b": [true, null, 1.5], "a": "x"});
    assert_eq!(Value::from(json.clone()).to_json().unwrap(), json);
}
