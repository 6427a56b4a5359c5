//! NULL handling, conditionals and type introspection.

use crate::types::Value;

const NAMES: &[&str] = &["COALESCE", "IFNULL", "NULLIF", "IIF", "TYPEOF"];

pub(super) fn handles(name: &str) -> bool {
    NAMES.contains(&name)
}

pub(super) fn eval_general_function(name: &str, args: &[Value]) -> Option<Value> {
    match name {
        "COALESCE" => eval_coalesce(args),
        "IFNULL" => {
            if args.len() != 2 {
                return None;
            }
            eval_coalesce(args)
        }
        "NULLIF" => eval_nullif(args),
        "IIF" => eval_iif(args),
        "TYPEOF" => eval_typeof(args),
        _ => None,
    }
}

fn eval_coalesce(args: &[Value]) -> Option<Value> {
    if args.len() < 2 {
        return None;
    }
    Some(args.iter().find(|v| !v.is_null()).cloned().unwrap_or(Value::Null))
}

fn eval_nullif(args: &[Value]) -> Option<Value> {
    let [a, b] = args else {
        return None;
    };
    if !a.is_null() && crate::types::compare_values(a, b).is_eq() && !b.is_null() {
        Some(Value::Null)
    } else {
        Some(a.clone())
    }
}

fn eval_iif(args: &[Value]) -> Option<Value> {
    let [cond, then, otherwise] = args else {
        return None;
    };
    let truthy = match cond {
        Value::Null => false,
        Value::Int(i) => *i != 0,
        Value::Float(f) => *f != 0.0,
        Value::Text(s) => s.trim().parse::<f64>().map_or(false, |f| f != 0.0),
        Value::Blob(_) => false,
    };
    Some(if truthy { then.clone() } else { otherwise.clone() })
}

fn eval_typeof(args: &[Value]) -> Option<Value> {
    let [value] = args else {
        return None;
    };
    Some(Value::Text(value.data_type().name().to_string()))
}
