//! # Numeric Functions
//!
//! Integer inputs stay integers where SQLite keeps them (ABS, SIGN, FLOOR,
//! CEIL of an integer). ROUND always yields REAL. Text that does not look
//! like a number is treated as 0.

use super::{any_null, arg_int};
use crate::types::Value;

const NAMES: &[&str] = &[
    "ABS", "ROUND", "FLOOR", "CEIL", "CEILING", "SQRT", "POWER", "POW", "SIGN",
];

pub(super) fn handles(name: &str) -> bool {
    NAMES.contains(&name)
}

pub(super) fn eval_numeric_function(name: &str, args: &[Value]) -> Option<Value> {
    match name {
        "ABS" => eval_abs(args),
        "ROUND" => eval_round(args),
        "FLOOR" => eval_rounding(args, f64::floor),
        "CEIL" | "CEILING" => eval_rounding(args, f64::ceil),
        "SQRT" => eval_sqrt(args),
        "POWER" | "POW" => eval_power(args),
        "SIGN" => eval_sign(args),
        _ => None,
    }
}

enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(&self) -> f64 {
        match *self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

fn number(value: &Value) -> Number {
    match value {
        Value::Int(i) => Number::Int(*i),
        Value::Float(f) => Number::Float(*f),
        Value::Text(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                Number::Int(i)
            } else {
                Number::Float(s.parse::<f64>().unwrap_or(0.0))
            }
        }
        Value::Null | Value::Blob(_) => Number::Int(0),
    }
}

fn unary(args: &[Value]) -> Option<Result<Number, Value>> {
    if args.len() != 1 {
        return None;
    }
    if any_null(args) {
        return Some(Err(Value::Null));
    }
    Some(Ok(number(&args[0])))
}

fn eval_abs(args: &[Value]) -> Option<Value> {
    Some(match unary(args)? {
        Err(null) => null,
        Ok(Number::Int(i)) => match i.checked_abs() {
            Some(abs) => Value::Int(abs),
            None => Value::Float(-(i as f64)),
        },
        Ok(Number::Float(f)) => Value::Float(f.abs()),
    })
}

fn eval_round(args: &[Value]) -> Option<Value> {
    if !(1..=2).contains(&args.len()) {
        return None;
    }
    if any_null(args) {
        return Some(Value::Null);
    }
    let x = number(&args[0]).as_f64();
    let digits = match args.get(1) {
        Some(_) => arg_int(args, 1).unwrap_or(0).clamp(0, 30) as i32,
        None => 0,
    };
    let scale = 10f64.powi(digits);
    let rounded = (x * scale).round() / scale;
    Some(Value::Float(if rounded.is_finite() { rounded } else { x }))
}

fn eval_rounding(args: &[Value], f: fn(f64) -> f64) -> Option<Value> {
    Some(match unary(args)? {
        Err(null) => null,
        Ok(Number::Int(i)) => Value::Int(i),
        Ok(Number::Float(x)) => Value::Float(f(x)),
    })
}

fn eval_sqrt(args: &[Value]) -> Option<Value> {
    Some(match unary(args)? {
        Err(null) => null,
        Ok(n) => {
            let x = n.as_f64();
            if x < 0.0 {
                Value::Null
            } else {
                Value::Float(x.sqrt())
            }
        }
    })
}

fn eval_power(args: &[Value]) -> Option<Value> {
    if args.len() != 2 {
        return None;
    }
    if any_null(args) {
        return Some(Value::Null);
    }
    let base = number(&args[0]).as_f64();
    let exp = number(&args[1]).as_f64();
    Some(Value::Float(base.powf(exp)))
}

fn eval_sign(args: &[Value]) -> Option<Value> {
    Some(match unary(args)? {
        Err(null) => null,
        Ok(Number::Int(i)) => Value::Int(i.signum()),
        Ok(Number::Float(f)) if f > 0.0 => Value::Int(1),
        Ok(Number::Float(f)) if f < 0.0 => Value::Int(-1),
        Ok(Number::Float(_)) => Value::Int(0),
    })
}
