//! Static result types of expressions.
//!
//! Column types are unknown at this level, so a column reference is `Any`.
//! The lattice is flat apart from the numeric rule:
//!
//! ```text
//! promote(Null, T)    = T
//! promote(T, T)       = T
//! promote(Int, Float) = Float
//! otherwise           = Any
//! ```

use crate::sql::ast::{BinaryOp, Expr, UnaryOp};
use crate::types::{DataType, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    Any,
    Int,
    Float,
    Text,
    Blob,
    Bool,
    Null,
}

impl SqlType {
    pub fn promote(a: SqlType, b: SqlType) -> SqlType {
        use SqlType::*;
        match (a, b) {
            (Null, other) | (other, Null) => other,
            (x, y) if x == y => x,
            (Int, Float) | (Float, Int) => Float,
            _ => Any,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, SqlType::Int | SqlType::Float)
    }

    fn of_value(value: &Value) -> SqlType {
        match value {
            Value::Null => SqlType::Null,
            Value::Int(_) => SqlType::Int,
            Value::Float(_) => SqlType::Float,
            Value::Text(_) => SqlType::Text,
            Value::Blob(_) => SqlType::Blob,
        }
    }

    fn of_affinity(affinity: DataType) -> SqlType {
        match affinity {
            DataType::Integer => SqlType::Int,
            DataType::Real => SqlType::Float,
            DataType::Text => SqlType::Text,
            DataType::Blob => SqlType::Blob,
            DataType::Null => SqlType::Null,
            DataType::Numeric => SqlType::Any,
        }
    }
}

pub fn infer_type(expr: &Expr) -> SqlType {
    match expr {
        Expr::Literal(v) => SqlType::of_value(v),
        Expr::ColumnRef(_) | Expr::Placeholder(_) | Expr::Subquery(_) => SqlType::Any,
        Expr::Binary { op, left, right } => binary_type(*op, left, right),
        Expr::Unary { op, expr } => match op {
            UnaryOp::Not => SqlType::Bool,
            UnaryOp::BitNot => SqlType::Int,
            UnaryOp::Minus | UnaryOp::Plus => match infer_type(expr) {
                SqlType::Bool => SqlType::Int,
                other => other,
            },
        },
        Expr::Alias { expr, .. } | Expr::Collate { expr, .. } => infer_type(expr),
        Expr::Cast { type_name, .. } => {
            SqlType::of_affinity(DataType::from_type_name(type_name))
        }
        Expr::Case {
            conditions,
            else_result,
            ..
        } => conditions
            .iter()
            .map(|w| infer_type(&w.result))
            .chain(else_result.iter().map(|e| infer_type(e)))
            .fold(SqlType::Null, SqlType::promote),
        Expr::InList { .. }
        | Expr::InSubquery { .. }
        | Expr::Between { .. }
        | Expr::Exists { .. }
        | Expr::AnyAll { .. } => SqlType::Bool,
        Expr::FuncCall(call) => function_type(&call.name, &call.args),
        Expr::WindowFunc(wf) => function_type(&wf.name, &wf.args),
    }
}

fn binary_type(op: BinaryOp, left: &Expr, right: &Expr) -> SqlType {
    match op {
        BinaryOp::Concat => SqlType::Text,
        BinaryOp::BitAnd | BinaryOp::LeftShift | BinaryOp::RightShift => SqlType::Int,
        op if op.is_arithmetic() => {
            let numeric = |t: SqlType| match t {
                SqlType::Bool => SqlType::Int,
                other => other,
            };
            SqlType::promote(numeric(infer_type(left)), numeric(infer_type(right)))
        }
        _ => SqlType::Bool,
    }
}

fn function_type(name: &str, args: &[Expr]) -> SqlType {
    let first = || args.first().map_or(SqlType::Any, infer_type);
    match name.to_ascii_uppercase().as_str() {
        "COUNT" | "ROW_NUMBER" | "RANK" | "DENSE_RANK" | "NTILE" | "LENGTH" | "INSTR"
        | "SIGN" => SqlType::Int,
        "AVG" | "TOTAL" | "PERCENT_RANK" | "CUME_DIST" | "ROUND" | "SQRT" | "POWER" | "POW" => {
            SqlType::Float
        }
        "UPPER" | "LOWER" | "SUBSTR" | "SUBSTRING" | "TRIM" | "LTRIM" | "RTRIM" | "REPLACE"
        | "REVERSE" | "TYPEOF" | "GROUP_CONCAT" | "HEX" | "CONCAT" | "LEFT" | "RIGHT" => {
            SqlType::Text
        }
        "SUM" | "MIN" | "MAX" | "ABS" | "LAG" | "LEAD" | "FIRST_VALUE" | "LAST_VALUE"
        | "NTH_VALUE" | "ANY_VALUE" | "FLOOR" | "CEIL" | "CEILING" => first(),
        "COALESCE" | "IFNULL" => args
            .iter()
            .map(infer_type)
            .fold(SqlType::Null, SqlType::promote),
        _ => SqlType::Any,
    }
}
