//! # Window Function Integration Tests
//!
//! Window expressions are parsed from SQL, pulled out of the SELECT with the
//! analysis pass and computed over hand-built row sets.
//!
//! ```sh
//! cargo test --test window_functions
//! ```

use proptest::prelude::*;
use sqlvibe::sql::analysis::extract_window_functions;
use sqlvibe::sql::ast::{SelectStmt, Statement, WindowFuncExpr};
use sqlvibe::sql::parse;
use sqlvibe::sql::window::{compute_window, RowSet, WindowContext};
use sqlvibe::{Engine, Value};

fn select(sql: &str) -> SelectStmt {
    match parse(sql).unwrap() {
        Statement::Select(s) => *s,
        other => panic!("expected SELECT, got {:?}", other),
    }
}

fn window(sql: &str) -> (SelectStmt, WindowFuncExpr) {
    let stmt = select(sql);
    let wf = extract_window_functions(&stmt)[0].clone();
    (stmt, wf)
}

fn staff() -> RowSet {
    let row = |dept: &str, sal: i64| vec![Value::from(dept), Value::Int(sal)];
    RowSet::new(
        vec!["dept".into(), "sal".into()],
        vec![row("eng", 100), row("hr", 90), row("eng", 110)],
    )
}

#[test]
fn rank_within_department() {
    let (_, wf) = window("SELECT RANK() OVER (PARTITION BY dept ORDER BY sal) FROM staff");
    let out = compute_window(&staff(), &wf, &WindowContext::default());
    // eng rows in sorted order are 0 (100) then 2 (110); hr is alone
    assert_eq!(out[0], Value::Int(1));
    assert_eq!(out[2], Value::Int(2));
    assert_eq!(out[1], Value::Int(1));
}

#[test]
fn engine_window_uses_its_registry() {
    let engine = Engine::default();
    let (_, wf) = window("SELECT SUM(sal) OVER (PARTITION BY UPPER(dept)) FROM staff");
    assert_eq!(
        engine.window(&staff(), &wf),
        vec![Value::Int(210), Value::Int(90), Value::Int(210)]
    );
}

#[test]
fn named_window_with_extension() {
    let (stmt, wf) = window(
        "SELECT ROW_NUMBER() OVER (w ORDER BY sal DESC) FROM staff WINDOW w AS (PARTITION BY dept)",
    );
    let out = compute_window(&staff(), &wf, &WindowContext::default().with_select(&stmt));
    assert_eq!(out, vec![Value::Int(2), Value::Int(1), Value::Int(1)]);
}

#[test]
fn running_average_is_float() {
    let (_, wf) = window("SELECT AVG(sal) OVER (ORDER BY sal) FROM staff");
    let out = compute_window(&staff(), &wf, &WindowContext::default());
    assert_eq!(
        out,
        vec![Value::Float(95.0), Value::Float(90.0), Value::Float(100.0)]
    );
}

#[test]
fn total_of_nothing_is_zero() {
    let (_, wf) = window("SELECT TOTAL(sal) FILTER (WHERE sal > 500) OVER () FROM staff");
    let out = compute_window(&staff(), &wf, &WindowContext::default());
    assert_eq!(out, vec![Value::Float(0.0); 3]);
}

fn ranks(keys: &[i64], function: &str) -> Vec<(i64, i64)> {
    let rows = RowSet::new(
        vec!["k".into()],
        keys.iter().map(|k| vec![Value::Int(*k)]).collect(),
    );
    let (_, wf) = window(&format!("SELECT {}() OVER (ORDER BY k) FROM t", function));
    let out = compute_window(&rows, &wf, &WindowContext::default());
    let mut pairs: Vec<(i64, i64)> = keys
        .iter()
        .zip(out)
        .map(|(k, v)| (*k, v.as_i64().unwrap()))
        .collect();
    pairs.sort();
    pairs
}

proptest! {
    /// Sorted by key, RANK never decreases, stays put across ties and jumps
    /// by at most the distance between positions.
    #[test]
    fn rank_is_monotonic(keys in prop::collection::vec(-20i64..20, 1..60)) {
        let sorted = ranks(&keys, "RANK");
        prop_assert_eq!(sorted[0].1, 1);
        for i in 1..sorted.len() {
            let (prev_key, prev_rank) = sorted[i - 1];
            let (key, rank) = sorted[i];
            if key == prev_key {
                prop_assert_eq!(rank, prev_rank);
            } else {
                prop_assert_eq!(rank, i as i64 + 1);
                prop_assert!(rank > prev_rank);
            }
        }
    }

    /// DENSE_RANK steps by exactly one between adjacent distinct keys.
    #[test]
    fn dense_rank_has_no_gaps(keys in prop::collection::vec(-20i64..20, 1..60)) {
        let sorted = ranks(&keys, "DENSE_RANK");
        prop_assert_eq!(sorted[0].1, 1);
        for pair in sorted.windows(2) {
            let expected = if pair[0].0 == pair[1].0 { 0 } else { 1 };
            prop_assert_eq!(pair[1].1 - pair[0].1, expected);
        }
    }
}
