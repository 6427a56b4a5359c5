//! # Scalar Values
//!
//! `Value` is the owned scalar that flows through every stage of the core:
//! literals in the AST, bound parameters, row cells in a `RowSet`, and the
//! per-row output of the window engine.
//!
//! ## Variants
//!
//! | Variant | SQLite storage class |
//! |---------|----------------------|
//! | `Null`  | NULL |
//! | `Int`   | INTEGER (64-bit signed) |
//! | `Float` | REAL (64-bit IEEE) |
//! | `Text`  | TEXT (UTF-8) |
//! | `Blob`  | BLOB |
//!
//! Booleans have no storage class of their own: `TRUE` and `FALSE` are the
//! integers 1 and 0.
//!
//! ## Comparison
//!
//! Two orderings are provided because the pipeline needs two different ones:
//!
//! - [`compare_values`] orders rows for window functions. NULL sorts first,
//!   numbers compare numerically, everything else compares by text form.
//! - [`pushdown_compare`] compares a row cell against a literal inside a
//!   pushed-down predicate. Callers rule out NULL before calling it.

use super::DataType;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Numeric view used by comparisons and frame aggregates.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null => DataType::Null,
            Value::Int(_) => DataType::Integer,
            Value::Float(_) => DataType::Real,
            Value::Text(_) => DataType::Text,
            Value::Blob(_) => DataType::Blob,
        }
    }

    /// Canonical text form. Floats use the shortest round-trip representation
    /// and blobs render as lowercase hex.
    pub fn display_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Text(s) => s.clone(),
            Value::Blob(b) => hex_encode(b),
        }
    }

    /// Renders the value as a SQL literal.
    pub fn to_sql(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
            Value::Blob(b) => format!("X'{}'", hex_encode(b)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            other => write!(f, "{}", other.display_string()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

fn format_float(f: f64) -> String {
    if f.is_finite() && f == f.trunc() && f.abs() < 1e15 {
        format!("{:.1}", f)
    } else {
        format!("{}", f)
    }
}

pub(crate) fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push(HEX[(b >> 4) as usize] as char);
        out.push(HEX[(b & 0x0f) as usize] as char);
    }
    out
}

fn ordering_from_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Ordering used by window partitions. NULL sorts before every other value.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => ordering_from_f64(x, y),
            _ => a.display_string().cmp(&b.display_string()),
        },
    }
}

/// Comparison used by pushed-down predicates: numeric pairs compare
/// numerically, text pairs lexicographically, and any other pairing falls
/// back to comparing canonical text forms.
pub fn pushdown_compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Text(x), Value::Text(y)) => x.cmp(y),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => ordering_from_f64(x, y),
            _ => pushdown_text(a).cmp(&pushdown_text(b)),
        },
    }
}

/// Text form for the pushdown fallback. Floats print in shortest form
/// without a forced fraction, so `3.0` compares as `3`.
fn pushdown_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Text(s) => Cow::Borrowed(s),
        Value::Int(i) => Cow::Owned(i.to_string()),
        Value::Float(f) => Cow::Owned(f.to_string()),
        other => Cow::Owned(other.display_string()),
    }
}
