//! # Predicate Pushdown
//!
//! Splits a WHERE clause into predicates simple enough to evaluate directly
//! against a row map, before the general evaluator sees the row, and the
//! remainder that must stay in the WHERE clause.
//!
//! ## Pushable Shapes
//!
//! ```text
//! col  OP lit        OP in { =  !=  <  <=  >  >= }
//! lit  OP col        evaluated as col (flipped OP) lit
//! col  BETWEEN lit AND lit
//! ```
//!
//! `==` and `<>` parse to `=` and `!=`, so they are covered. Only a top-level
//! AND chain is split; an OR, a NOT or any other node is classified whole.
//!
//! ## NULL Handling
//!
//! The predicates are evaluated in WHERE context, where UNKNOWN filters the
//! row out. A NULL or missing cell, or a NULL literal, therefore makes every
//! pushed predicate false, `!=` included. Do not reuse `eval_pushdown` where
//! three-valued results matter.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::sql::ast::{BinaryOp, ColumnRef, Expr};
use crate::types::{pushdown_compare, Value};

/// Splits `where_clause` into `(pushable, remaining)`. `remaining` is `None`
/// when everything was pushed.
pub fn split_pushdown(where_clause: &Expr) -> (Vec<Expr>, Option<Expr>) {
    let mut pushable = Vec::new();
    let remaining = split_into(where_clause, &mut pushable);
    (pushable, remaining)
}

fn split_into(expr: &Expr, pushable: &mut Vec<Expr>) -> Option<Expr> {
    if let Expr::Binary {
        op: BinaryOp::And,
        left,
        right,
    } = expr
    {
        let left = split_into(left, pushable);
        let right = split_into(right, pushable);
        return match (left, right) {
            (None, None) => None,
            (Some(kept), None) | (None, Some(kept)) => Some(kept),
            (Some(l), Some(r)) => Some(Expr::binary(BinaryOp::And, l, r)),
        };
    }
    if is_pushable(expr) {
        pushable.push(expr.clone());
        None
    } else {
        Some(expr.clone())
    }
}

pub fn is_pushable(expr: &Expr) -> bool {
    match expr {
        Expr::Binary { op, left, right } if op.is_comparison() => {
            matches!(
                (&**left, &**right),
                (Expr::ColumnRef(_), Expr::Literal(_)) | (Expr::Literal(_), Expr::ColumnRef(_))
            )
        }
        Expr::Between {
            expr,
            low,
            high,
            negated: false,
        } => matches!(
            (&**expr, &**low, &**high),
            (Expr::ColumnRef(_), Expr::Literal(_), Expr::Literal(_))
        ),
        _ => false,
    }
}

fn cell<'r>(row: &'r HashMap<String, Value>, column: &ColumnRef) -> Option<&'r Value> {
    row.get(&column.name).filter(|v| !v.is_null())
}

fn satisfies(op: BinaryOp, ord: Ordering) -> bool {
    match op {
        BinaryOp::Eq => ord == Ordering::Equal,
        BinaryOp::NotEq => ord != Ordering::Equal,
        BinaryOp::Lt => ord == Ordering::Less,
        BinaryOp::LtEq => ord != Ordering::Greater,
        BinaryOp::Gt => ord == Ordering::Greater,
        BinaryOp::GtEq => ord != Ordering::Less,
        _ => false,
    }
}

/// Evaluates one pushable predicate against `row`. Shapes that
/// [`is_pushable`] rejects evaluate to false.
pub fn eval_pushdown(expr: &Expr, row: &HashMap<String, Value>) -> bool {
    match expr {
        Expr::Binary { op, left, right } => {
            let (column, literal, op) = match (&**left, &**right) {
                (Expr::ColumnRef(c), Expr::Literal(v)) => (c, v, *op),
                (Expr::Literal(v), Expr::ColumnRef(c)) => (c, v, op.flipped()),
                _ => return false,
            };
            if literal.is_null() {
                return false;
            }
            match cell(row, column) {
                Some(value) => satisfies(op, pushdown_compare(value, literal)),
                None => false,
            }
        }
        Expr::Between {
            expr,
            low,
            high,
            negated: false,
        } => {
            let (Expr::ColumnRef(column), Expr::Literal(lo), Expr::Literal(hi)) =
                (&**expr, &**low, &**high)
            else {
                return false;
            };
            if lo.is_null() || hi.is_null() {
                return false;
            }
            match cell(row, column) {
                Some(value) => {
                    pushdown_compare(value, lo) != Ordering::Less
                        && pushdown_compare(value, hi) != Ordering::Greater
                }
                None => false,
            }
        }
        _ => false,
    }
}

/// Keeps the rows that satisfy every predicate. An empty predicate list
/// returns `rows` untouched.
pub fn apply_pushdown_filter(
    rows: Vec<HashMap<String, Value>>,
    predicates: &[Expr],
) -> Vec<HashMap<String, Value>> {
    if predicates.is_empty() {
        return rows;
    }
    rows.into_iter()
        .filter(|row| predicates.iter().all(|p| eval_pushdown(p, row)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::ast::Statement;
    use crate::sql::parser::parse;

    fn where_of(sql: &str) -> Expr {
        match parse(&format!("SELECT * FROM t WHERE {}", sql)).unwrap() {
            Statement::Select(s) => s.where_clause.unwrap(),
            other => panic!("expected SELECT, got {:?}", other),
        }
    }

    fn row(cells: &[(&str, Value)]) -> HashMap<String, Value> {
        cells
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn split_separates_and_chain() {
        let (pushed, remaining) = split_pushdown(&where_of("a = 1 AND b > f(c) AND 5 < d"));
        assert_eq!(pushed.len(), 2);
        assert_eq!(pushed[0], where_of("a = 1"));
        assert_eq!(pushed[1], where_of("5 < d"));
        assert_eq!(remaining, Some(where_of("b > f(c)")));
    }

    #[test]
    fn split_everything_pushable() {
        let (pushed, remaining) = split_pushdown(&where_of("a = 1 AND b BETWEEN 2 AND 3"));
        assert_eq!(pushed.len(), 2);
        assert!(remaining.is_none());
    }

    #[test]
    fn or_is_kept_whole() {
        let expr = where_of("a = 1 OR b = 2");
        let (pushed, remaining) = split_pushdown(&expr);
        assert!(pushed.is_empty());
        assert_eq!(remaining, Some(expr));
    }

    #[test]
    fn pushable_shapes() {
        for sql in ["a = 1", "a == 1", "a <> 'x'", "a != 1", "3 >= a", "a BETWEEN 1 AND 9"] {
            assert!(is_pushable(&where_of(sql)), "{}", sql);
        }
        for sql in [
            "a = b",
            "1 = 1",
            "a NOT BETWEEN 1 AND 2",
            "a BETWEEN b AND 2",
            "a IN (1)",
            "a LIKE 'x'",
            "NOT a = 1",
        ] {
            assert!(!is_pushable(&where_of(sql)), "{}", sql);
        }
    }

    #[test]
    fn eval_flips_literal_on_left() {
        let r = row(&[("age", Value::Int(30))]);
        assert!(eval_pushdown(&where_of("25 < age"), &r));
        assert!(!eval_pushdown(&where_of("25 > age"), &r));
        assert!(eval_pushdown(&where_of("30 <= age"), &r));
    }

    #[test]
    fn null_and_missing_are_false() {
        let r = row(&[("a", Value::Null)]);
        for sql in ["a = 1", "a != 1", "a < 1", "a BETWEEN 0 AND 9", "b = 1"] {
            assert!(!eval_pushdown(&where_of(sql), &r), "{}", sql);
        }
        let r = row(&[("a", Value::Int(1))]);
        assert!(!eval_pushdown(&where_of("a != NULL"), &r));
    }

    #[test]
    fn eval_between_is_inclusive() {
        let pred = where_of("x BETWEEN 10 AND 20");
        assert!(eval_pushdown(&pred, &row(&[("x", Value::Int(10))])));
        assert!(eval_pushdown(&pred, &row(&[("x", Value::Float(20.0))])));
        assert!(!eval_pushdown(&pred, &row(&[("x", Value::Int(21))])));
    }

    #[test]
    fn apply_filters_rows() {
        let rows = vec![
            row(&[("id", Value::Int(1)), ("name", Value::from("alice"))]),
            row(&[("id", Value::Int(2)), ("name", Value::from("bob"))]),
            row(&[("id", Value::Int(3)), ("name", Value::Null)]),
        ];
        let preds = vec![where_of("id >= 2"), where_of("name != 'zed'")];
        let kept = apply_pushdown_filter(rows.clone(), &preds);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0]["name"], Value::from("bob"));
        assert_eq!(apply_pushdown_filter(rows, &[]).len(), 3);
    }
}
