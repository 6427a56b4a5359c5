//! # Window Function Engine
//!
//! Computes one window expression over a materialized row set and returns one
//! value per input row, in input order.
//!
//! ## Pipeline
//!
//! ```text
//! WindowFuncExpr ──resolve_named_window──► partition / order / frame
//!        │
//!   RowSet ──build_partitions──► groups (first-seen order)
//!                                   │
//!                          SortedPartition (stable, bump scratch)
//!                                   │
//!                         kernel per function name
//!                                   │
//!                          out[row] for each row
//! ```
//!
//! ## Semantics
//!
//! - no PARTITION BY means one partition;
//! - no ORDER BY means every row of a partition is a peer;
//! - no frame means `[partition start, current row]`, except for frame
//!   aggregates without ORDER BY, which see the whole partition;
//! - an unknown function name yields NULL for every row.
//!
//! The engine keeps no state between calls.

mod eval;
mod frame;
mod functions;
mod partition;

use std::borrow::Cow;

use bumpalo::Bump;
use tracing::trace;

use crate::sql::analysis::resolve_named_window;
use crate::sql::ast::{SelectStmt, WindowFuncExpr};
use crate::sql::functions::{BuiltinFunctions, FunctionRegistry};
use crate::types::Value;

pub use eval::RowEvaluator;
pub use frame::resolve_frame_bounds;

static BUILTINS: BuiltinFunctions = BuiltinFunctions;

/// Materialized input rows. `data[i][j]` is column `columns[j]` of row `i`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub data: Vec<Vec<Value>>,
}

impl RowSet {
    pub fn new(columns: Vec<String>, data: Vec<Vec<Value>>) -> Self {
        Self { columns, data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Where scalar calls are evaluated and where `OVER name` is looked up.
#[derive(Clone, Copy)]
pub struct WindowContext<'a> {
    registry: &'a dyn FunctionRegistry,
    select: Option<&'a SelectStmt>,
}

impl<'a> WindowContext<'a> {
    pub fn new(registry: &'a dyn FunctionRegistry) -> Self {
        Self {
            registry,
            select: None,
        }
    }

    /// Enables named window lookup against `select.windows`.
    pub fn with_select(mut self, select: &'a SelectStmt) -> Self {
        self.select = Some(select);
        self
    }
}

impl Default for WindowContext<'_> {
    fn default() -> Self {
        Self::new(&BUILTINS)
    }
}

pub fn compute_window(rows: &RowSet, wf: &WindowFuncExpr, ctx: &WindowContext<'_>) -> Vec<Value> {
    let wf = match (&wf.window_name, ctx.select) {
        (Some(_), Some(select)) => Cow::Owned(resolve_named_window(wf, select)),
        _ => Cow::Borrowed(wf),
    };

    let mut out = vec![Value::Null; rows.len()];
    if rows.is_empty() {
        return out;
    }

    let eval = RowEvaluator::new(rows, ctx.registry);
    let groups = partition::build_partitions(&eval, rows.len(), &wf.partition);
    trace!(
        function = %wf.name,
        rows = rows.len(),
        partitions = groups.len(),
        "computing window"
    );

    let mut arena = Bump::new();
    for group in &groups {
        let sorted = partition::SortedPartition::sort(&arena, &eval, group, &wf.order_by);
        functions::evaluate(&wf, &sorted, &eval, &mut out);
        drop(sorted);
        arena.reset();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::analysis::extract_window_functions;
    use crate::sql::ast::Statement;
    use crate::sql::parser::parse;

    fn select(sql: &str) -> SelectStmt {
        match parse(sql).unwrap() {
            Statement::Select(s) => *s,
            other => panic!("expected SELECT, got {:?}", other),
        }
    }

    fn sales() -> RowSet {
        let row = |dept: &str, amount: i64| vec![Value::from(dept), Value::Int(amount)];
        RowSet::new(
            vec!["dept".into(), "amount".into()],
            vec![
                row("a", 10),
                row("b", 5),
                row("a", 30),
                row("a", 10),
                row("b", 7),
            ],
        )
    }

    fn run(rows: &RowSet, sql: &str) -> Vec<Value> {
        let stmt = select(sql);
        let wf = extract_window_functions(&stmt)[0].clone();
        compute_window(rows, &wf, &WindowContext::default().with_select(&stmt))
    }

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().map(|v| Value::Int(*v)).collect()
    }

    #[test]
    fn row_number_per_partition() {
        let out = run(
            &sales(),
            "SELECT ROW_NUMBER() OVER (PARTITION BY dept ORDER BY amount) FROM t",
        );
        assert_eq!(out, ints(&[1, 1, 3, 2, 2]));
    }

    #[test]
    fn rank_and_dense_rank() {
        let rows = sales();
        assert_eq!(
            run(&rows, "SELECT RANK() OVER (ORDER BY amount) FROM t"),
            ints(&[3, 1, 5, 3, 2])
        );
        assert_eq!(
            run(&rows, "SELECT DENSE_RANK() OVER (ORDER BY amount) FROM t"),
            ints(&[3, 1, 4, 3, 2])
        );
    }

    #[test]
    fn percent_rank_and_cume_dist() {
        let rows = sales();
        let pr = run(&rows, "SELECT PERCENT_RANK() OVER (ORDER BY amount) FROM t");
        assert_eq!(pr[1], Value::Float(0.0));
        assert_eq!(pr[0], Value::Float(0.5));
        assert_eq!(pr[2], Value::Float(1.0));
        let cd = run(&rows, "SELECT CUME_DIST() OVER (ORDER BY amount) FROM t");
        assert_eq!(cd[0], Value::Float(0.8));
        assert_eq!(cd[3], Value::Float(0.8));
        assert_eq!(cd[2], Value::Float(1.0));
    }

    #[test]
    fn ntile_front_loads_buckets() {
        let rows = sales();
        assert_eq!(
            run(&rows, "SELECT NTILE(2) OVER (ORDER BY amount) FROM t"),
            ints(&[1, 1, 2, 2, 1])
        );
        assert_eq!(
            run(&rows, "SELECT NTILE(0) OVER (ORDER BY amount) FROM t"),
            vec![Value::Null; 5]
        );
    }

    #[test]
    fn lag_and_lead() {
        let rows = sales();
        let lag = run(&rows, "SELECT LAG(amount) OVER (ORDER BY amount) FROM t");
        assert_eq!(lag[1], Value::Null);
        assert_eq!(lag[4], Value::Int(5));
        let lead = run(&rows, "SELECT LEAD(amount, 2, -1) OVER (ORDER BY amount) FROM t");
        assert_eq!(lead[1], Value::Int(10));
        assert_eq!(lead[2], Value::Int(-1));
        let flipped = run(&rows, "SELECT LAG(amount, -1) OVER (ORDER BY amount) FROM t");
        assert_eq!(flipped[1], Value::Int(7));
    }

    #[test]
    fn value_functions_follow_the_frame() {
        let rows = sales();
        let first = run(
            &rows,
            "SELECT FIRST_VALUE(amount) OVER (PARTITION BY dept ORDER BY amount DESC) FROM t",
        );
        assert_eq!(first, ints(&[30, 7, 30, 30, 7]));
        let last = run(&rows, "SELECT LAST_VALUE(amount) OVER (ORDER BY amount) FROM t");
        assert_eq!(last, ints(&[10, 5, 30, 10, 7]));
        let nth = run(&rows, "SELECT NTH_VALUE(amount, 2) OVER (ORDER BY amount) FROM t");
        assert_eq!(nth[1], Value::Null);
        assert_eq!(nth[4], Value::Int(7));
    }

    #[test]
    fn frame_aggregates() {
        let rows = sales();
        assert_eq!(
            run(&rows, "SELECT SUM(amount) OVER (PARTITION BY dept) FROM t"),
            ints(&[50, 12, 50, 50, 12])
        );
        assert_eq!(
            run(&rows, "SELECT SUM(amount) OVER (ORDER BY amount) FROM t"),
            ints(&[22, 5, 62, 32, 12])
        );
        let moving = run(
            &rows,
            "SELECT COUNT(*) OVER (ORDER BY amount ROWS BETWEEN 1 PRECEDING AND 1 FOLLOWING) FROM t",
        );
        assert_eq!(moving, ints(&[3, 2, 2, 3, 3]));
        let filtered = run(
            &rows,
            "SELECT COUNT(*) FILTER (WHERE amount > 6) OVER (PARTITION BY dept) FROM t",
        );
        assert_eq!(filtered, ints(&[3, 1, 3, 3, 1]));
    }

    #[test]
    fn named_window_is_resolved() {
        let out = run(
            &sales(),
            "SELECT RANK() OVER w FROM t WINDOW w AS (PARTITION BY dept ORDER BY amount)",
        );
        assert_eq!(out, ints(&[1, 1, 3, 1, 2]));
    }

    #[test]
    fn unknown_function_and_empty_input() {
        let rows = sales();
        assert_eq!(
            run(&rows, "SELECT NO_SUCH_FN(amount) OVER () FROM t"),
            vec![Value::Null; 5]
        );
        assert!(run(&RowSet::default(), "SELECT ROW_NUMBER() OVER () FROM t").is_empty());
    }
}
