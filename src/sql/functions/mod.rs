//! # SQL Functions
//!
//! The core never hard-wires scalar function behavior. Anything that needs to
//! evaluate or classify a call by name goes through [`FunctionRegistry`]:
//!
//! - semantic analysis asks `function_kind` to recognize extension
//!   aggregates beyond the built-in aggregate names;
//! - the window engine's row evaluator calls `call_func` for function calls
//!   inside PARTITION BY, ORDER BY and argument expressions.
//!
//! ## Module Structure
//!
//! - `string`: UPPER, LOWER, LENGTH, SUBSTR, TRIM, REPLACE, INSTR, ...
//! - `numeric`: ABS, ROUND, FLOOR, CEIL, SQRT, POWER, SIGN
//! - `general`: COALESCE, IFNULL, NULLIF, IIF, TYPEOF
//!
//! ## Value Handling
//!
//! Scalars take `&[Value]` and return `Option<Value>`. `None` means the name
//! is unknown or the arguments do not fit the function; a SQL NULL result is
//! `Some(Value::Null)`. NULL inputs propagate to a NULL output unless the
//! function exists to handle NULL (COALESCE, IFNULL, TYPEOF, ...).

mod general;
mod numeric;
mod string;

use crate::types::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    Scalar,
    Aggregate,
    Window,
    TableValued,
}

/// Name-based function lookup. Names arrive upper-cased from the parser but
/// implementations should not rely on it.
pub trait FunctionRegistry: Send + Sync {
    /// Evaluates a scalar call. `None` when the function is unknown.
    fn call_func(&self, name: &str, args: &[Value]) -> Option<Value>;

    fn function_kind(&self, name: &str) -> Option<FunctionKind>;
}

/// The standard scalar set.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinFunctions;

impl FunctionRegistry for BuiltinFunctions {
    fn call_func(&self, name: &str, args: &[Value]) -> Option<Value> {
        eval_function(name, args)
    }

    fn function_kind(&self, name: &str) -> Option<FunctionKind> {
        let upper = name.to_ascii_uppercase();
        if crate::sql::analysis::is_builtin_aggregate(&upper) {
            return Some(FunctionKind::Aggregate);
        }
        if crate::sql::analysis::is_ranking_function(&upper) {
            return Some(FunctionKind::Window);
        }
        if string::handles(&upper) || numeric::handles(&upper) || general::handles(&upper) {
            return Some(FunctionKind::Scalar);
        }
        None
    }
}

/// Evaluates a built-in scalar function by name.
pub fn eval_function(name: &str, args: &[Value]) -> Option<Value> {
    let upper = name.to_ascii_uppercase();
    string::eval_string_function(&upper, args)
        .or_else(|| numeric::eval_numeric_function(&upper, args))
        .or_else(|| general::eval_general_function(&upper, args))
}

/// Text view of an argument; NULL has none.
fn arg_text(args: &[Value], index: usize) -> Option<String> {
    match args.get(index)? {
        Value::Null => None,
        other => Some(other.display_string()),
    }
}

/// Integer view of an argument. Floats truncate; text and blobs have none.
fn arg_int(args: &[Value], index: usize) -> Option<i64> {
    match args.get(index)? {
        Value::Int(n) => Some(*n),
        Value::Float(f) => Some(*f as i64),
        _ => None,
    }
}

fn any_null(args: &[Value]) -> bool {
    args.iter().any(Value::is_null)
}
