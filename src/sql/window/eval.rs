//! Row-at-a-time expression evaluation over a [`RowSet`].
//!
//! Covers what window arguments, partition keys, ORDER BY keys and FILTER
//! clauses use in practice: column references, literals, arithmetic,
//! comparisons, boolean logic, CASE and scalar function calls. Anything
//! else evaluates to NULL.

use std::cmp::Ordering;

use hashbrown::HashMap;

use super::RowSet;
use crate::sql::ast::{BinaryOp, ColumnRef, Expr, UnaryOp};
use crate::sql::functions::FunctionRegistry;
use crate::types::{compare_values, Value};

pub struct RowEvaluator<'r> {
    rows: &'r RowSet,
    registry: &'r dyn FunctionRegistry,
    exact: HashMap<&'r str, usize>,
    folded: HashMap<String, usize>,
}

impl<'r> RowEvaluator<'r> {
    pub fn new(rows: &'r RowSet, registry: &'r dyn FunctionRegistry) -> Self {
        let mut exact = HashMap::with_capacity(rows.columns.len());
        let mut folded = HashMap::with_capacity(rows.columns.len());
        for (i, name) in rows.columns.iter().enumerate() {
            exact.entry(name.as_str()).or_insert(i);
            folded.entry(name.to_ascii_lowercase()).or_insert(i);
        }
        Self {
            rows,
            registry,
            exact,
            folded,
        }
    }

    /// Position of `column` in the row: `table.name` first, then the bare
    /// name, then the bare name ignoring case.
    pub fn resolve(&self, column: &ColumnRef) -> Option<usize> {
        if let Some(table) = &column.table {
            let qualified = format!("{}.{}", table, column.name);
            if let Some(&i) = self.exact.get(qualified.as_str()) {
                return Some(i);
            }
        }
        self.exact
            .get(column.name.as_str())
            .or_else(|| self.folded.get(&column.name.to_ascii_lowercase()))
            .copied()
    }

    pub fn eval(&self, row: usize, expr: &Expr) -> Value {
        match expr {
            Expr::Literal(v) => v.clone(),
            Expr::ColumnRef(c) => self
                .resolve(c)
                .and_then(|i| self.rows.data.get(row)?.get(i))
                .cloned()
                .unwrap_or(Value::Null),
            Expr::Alias { expr, .. } | Expr::Collate { expr, .. } => self.eval(row, expr),
            Expr::Unary { op, expr } => unary(*op, self.eval(row, expr)),
            Expr::Binary { op, left, right } => match op {
                BinaryOp::And => {
                    let l = truth(&self.eval(row, left));
                    if l == Some(false) {
                        return Value::Int(0);
                    }
                    and_or(l, truth(&self.eval(row, right)), false)
                }
                BinaryOp::Or => {
                    let l = truth(&self.eval(row, left));
                    if l == Some(true) {
                        return Value::Int(1);
                    }
                    and_or(l, truth(&self.eval(row, right)), true)
                }
                _ => binary(*op, self.eval(row, left), self.eval(row, right)),
            },
            Expr::FuncCall(call) => {
                let args: Vec<Value> = call.args.iter().map(|a| self.eval(row, a)).collect();
                self.registry
                    .call_func(&call.name, &args)
                    .unwrap_or(Value::Null)
            }
            Expr::Case {
                operand,
                conditions,
                else_result,
            } => {
                let subject = operand.as_ref().map(|o| self.eval(row, o));
                for when in conditions {
                    let test = self.eval(row, &when.condition);
                    let hit = match &subject {
                        Some(s) if s.is_null() || test.is_null() => false,
                        Some(s) => compare_values(s, &test) == Ordering::Equal,
                        None => truth(&test) == Some(true),
                    };
                    if hit {
                        return self.eval(row, &when.result);
                    }
                }
                else_result
                    .as_ref()
                    .map_or(Value::Null, |e| self.eval(row, e))
            }
            _ => Value::Null,
        }
    }

    /// True only for a definitely-true result; NULL counts as false.
    pub fn eval_predicate(&self, row: usize, expr: &Expr) -> bool {
        truth(&self.eval(row, expr)) == Some(true)
    }
}

pub(crate) fn truth(value: &Value) -> Option<bool> {
    match value {
        Value::Null => None,
        Value::Int(i) => Some(*i != 0),
        Value::Float(f) => Some(*f != 0.0),
        Value::Text(s) => Some(numeric_prefix(s) != 0.0),
        Value::Blob(_) => Some(false),
    }
}

fn and_or(l: Option<bool>, r: Option<bool>, is_or: bool) -> Value {
    let result = match (l, r) {
        (Some(a), Some(b)) => Some(if is_or { a || b } else { a && b }),
        (_, Some(b)) if b == is_or => Some(is_or),
        _ => None,
    };
    result.map_or(Value::Null, |b| Value::Int(b as i64))
}

/// Leading numeric text of `s`, 0.0 when there is none.
fn numeric_prefix(s: &str) -> f64 {
    let s = s.trim_start();
    let end = s
        .char_indices()
        .take_while(|(i, c)| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E') || (*i == 0 && matches!(c, '-' | '+')))
        .map(|(i, c)| i + c.len_utf8())
        .last()
        .unwrap_or(0);
    (0..=end)
        .rev()
        .find_map(|n| s.get(..n).and_then(|p| p.parse::<f64>().ok()))
        .unwrap_or(0.0)
}

pub(super) fn as_number(value: &Value) -> f64 {
    match value {
        Value::Int(i) => *i as f64,
        Value::Float(f) => *f,
        Value::Text(s) => numeric_prefix(s),
        Value::Null | Value::Blob(_) => 0.0,
    }
}

fn unary(op: UnaryOp, value: Value) -> Value {
    if value.is_null() {
        return Value::Null;
    }
    match op {
        UnaryOp::Plus => value,
        UnaryOp::Minus => match value {
            Value::Int(i) => i
                .checked_neg()
                .map_or(Value::Float(-(i as f64)), Value::Int),
            other => Value::Float(-as_number(&other)),
        },
        UnaryOp::Not => truth(&value).map_or(Value::Null, |b| Value::Int((!b) as i64)),
        UnaryOp::BitNot => Value::Int(!(as_number(&value) as i64)),
    }
}

fn binary(op: BinaryOp, l: Value, r: Value) -> Value {
    if l.is_null() || r.is_null() {
        return match op {
            BinaryOp::Is => Value::Int((l.is_null() && r.is_null()) as i64),
            BinaryOp::IsNot => Value::Int((l.is_null() != r.is_null()) as i64),
            _ => Value::Null,
        };
    }
    if op.is_comparison() || matches!(op, BinaryOp::Is | BinaryOp::IsNot) {
        let ord = compare_values(&l, &r);
        let hit = match op {
            BinaryOp::Eq | BinaryOp::Is => ord == Ordering::Equal,
            BinaryOp::NotEq | BinaryOp::IsNot => ord != Ordering::Equal,
            BinaryOp::Lt => ord == Ordering::Less,
            BinaryOp::LtEq => ord != Ordering::Greater,
            BinaryOp::Gt => ord == Ordering::Greater,
            _ => ord != Ordering::Less,
        };
        return Value::Int(hit as i64);
    }
    match op {
        BinaryOp::Concat => Value::Text(l.display_string() + &r.display_string()),
        BinaryOp::Plus | BinaryOp::Minus | BinaryOp::Multiply => {
            if let (Value::Int(a), Value::Int(b)) = (&l, &r) {
                let exact = match op {
                    BinaryOp::Plus => a.checked_add(*b),
                    BinaryOp::Minus => a.checked_sub(*b),
                    _ => a.checked_mul(*b),
                };
                if let Some(v) = exact {
                    return Value::Int(v);
                }
            }
            let (a, b) = (as_number(&l), as_number(&r));
            Value::Float(match op {
                BinaryOp::Plus => a + b,
                BinaryOp::Minus => a - b,
                _ => a * b,
            })
        }
        BinaryOp::Divide => match (&l, &r) {
            (Value::Int(_), Value::Int(0)) => Value::Null,
            (Value::Int(a), Value::Int(b)) => {
                a.checked_div(*b).map_or(Value::Float(*a as f64 / *b as f64), Value::Int)
            }
            _ => {
                let b = as_number(&r);
                if b == 0.0 {
                    Value::Null
                } else {
                    Value::Float(as_number(&l) / b)
                }
            }
        },
        BinaryOp::Modulo => {
            let (a, b) = (as_number(&l) as i64, as_number(&r) as i64);
            match a.checked_rem(b) {
                Some(v) if matches!((&l, &r), (Value::Int(_), Value::Int(_))) => Value::Int(v),
                Some(v) => Value::Float(v as f64),
                None => Value::Null,
            }
        }
        BinaryOp::BitAnd | BinaryOp::LeftShift | BinaryOp::RightShift => {
            let (a, b) = (as_number(&l) as i64, as_number(&r) as i64);
            Value::Int(match op {
                BinaryOp::BitAnd => a & b,
                BinaryOp::LeftShift => a.checked_shl(b.clamp(0, 63) as u32).unwrap_or(0),
                _ => a.checked_shr(b.clamp(0, 63) as u32).unwrap_or(0),
            })
        }
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::ast::Statement;
    use crate::sql::functions::BuiltinFunctions;
    use crate::sql::parser::parse;

    fn expr(sql: &str) -> Expr {
        match parse(&format!("SELECT {}", sql)).unwrap() {
            Statement::Select(s) => s.columns.into_iter().next().unwrap(),
            other => panic!("expected SELECT, got {:?}", other),
        }
    }

    fn rows() -> RowSet {
        RowSet::new(
            vec!["t.id".into(), "Name".into(), "score".into()],
            vec![
                vec![Value::Int(1), Value::from("ann"), Value::Float(2.5)],
                vec![Value::Int(2), Value::Null, Value::Int(7)],
            ],
        )
    }

    #[test]
    fn column_resolution_order() {
        let rs = rows();
        let ev = RowEvaluator::new(&rs, &BuiltinFunctions);
        assert_eq!(ev.eval(0, &expr("t.id")), Value::Int(1));
        assert_eq!(ev.eval(0, &expr("name")), Value::from("ann"));
        assert_eq!(ev.eval(1, &expr("NAME")), Value::Null);
        assert_eq!(ev.eval(0, &expr("missing")), Value::Null);
    }

    #[test]
    fn arithmetic_and_functions() {
        let rs = rows();
        let ev = RowEvaluator::new(&rs, &BuiltinFunctions);
        assert_eq!(ev.eval(1, &expr("score * 2 + 1")), Value::Int(15));
        assert_eq!(ev.eval(0, &expr("score * 2")), Value::Float(5.0));
        assert_eq!(ev.eval(1, &expr("-score")), Value::Int(-7));
        assert_eq!(ev.eval(1, &expr("score / 2")), Value::Int(3));
        assert_eq!(ev.eval(1, &expr("score / 0")), Value::Null);
        assert_eq!(ev.eval(1, &expr("score % 4")), Value::Int(3));
        assert_eq!(ev.eval(0, &expr("upper(name)")), Value::from("ANN"));
        assert_eq!(ev.eval(0, &expr("no_such_fn(name)")), Value::Null);
        assert_eq!(ev.eval(0, &expr("name || '!'")), Value::from("ann!"));
    }

    #[test]
    fn predicates_are_three_valued() {
        let rs = rows();
        let ev = RowEvaluator::new(&rs, &BuiltinFunctions);
        assert!(ev.eval_predicate(1, &expr("score > 5")));
        assert!(!ev.eval_predicate(1, &expr("name = 'ann'")));
        assert_eq!(ev.eval(1, &expr("name = 'ann' OR score > 5")), Value::Int(1));
        assert_eq!(ev.eval(1, &expr("name = 'ann' AND score > 5")), Value::Null);
        assert_eq!(ev.eval(1, &expr("name IS NULL")), Value::Int(1));
        assert_eq!(
            ev.eval(0, &expr("CASE WHEN score > 5 THEN 'hi' ELSE 'lo' END")),
            Value::from("lo")
        );
    }

    #[test]
    fn numeric_text_prefix() {
        assert_eq!(numeric_prefix("12abc"), 12.0);
        assert_eq!(numeric_prefix(" -3.5"), -3.5);
        assert_eq!(numeric_prefix("abc"), 0.0);
        assert_eq!(numeric_prefix("1e"), 1.0);
    }
}
