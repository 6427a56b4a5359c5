//! Plan-shape classification.
//!
//! Each check recognizes one fast-path pattern. A statement that matches
//! none of them runs on the general path, which handles everything.

use crate::sql::analysis::select_has_aggregates;
use crate::sql::ast::{BinaryOp, Expr, SelectStmt, TableSource};
use crate::types::Value;

/// The decomposed parts of a `col OP literal` WHERE clause.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterInfo {
    pub column: String,
    pub op: BinaryOp,
    pub value: Value,
}

/// FROM is exactly one base table with no joins.
fn single_table(select: &SelectStmt) -> bool {
    select.from.as_ref().is_some_and(|from| {
        from.joins.is_empty() && matches!(from.source, TableSource::Table { .. })
    })
}

/// `COUNT(*)`, `SUM(col)`, `MIN(col)` or `MAX(col)` as the whole query over
/// one table. Returns the function and the column, `"*"` for COUNT.
pub fn is_simple_aggregate(select: &SelectStmt) -> Option<(&'static str, String)> {
    if !single_table(select)
        || select.compound.is_some()
        || select.where_clause.is_some()
        || !select.group_by.is_empty()
        || select.having.is_some()
        || select.distinct
        || select.columns.len() != 1
    {
        return None;
    }
    let Expr::FuncCall(call) = &select.columns[0] else {
        return None;
    };
    if call.distinct || call.filter.is_some() {
        return None;
    }
    let name = match call.name.to_ascii_uppercase().as_str() {
        // COUNT(col) skips NULLs and stays on the general path
        "COUNT" if call.star || call.args.is_empty() => return Some(("COUNT", "*".to_string())),
        "SUM" => "SUM",
        "MIN" => "MIN",
        "MAX" => "MAX",
        _ => return None,
    };
    match call.args.as_slice() {
        [Expr::ColumnRef(c)] if c.name != "*" => Some((name, c.name.clone())),
        _ => None,
    }
}

fn simple_comparison(expr: &Expr) -> Option<(&str, BinaryOp, &Value)> {
    match expr {
        Expr::Binary { op, left, right } if op.is_comparison() => match (&**left, &**right) {
            (Expr::ColumnRef(c), Expr::Literal(v)) => Some((c.name.as_str(), *op, v)),
            _ => None,
        },
        _ => None,
    }
}

/// One table, a `col OP literal` WHERE, no grouping or DISTINCT, and a
/// projection of plain (possibly aliased) columns.
pub fn is_vectorized_filter_eligible(select: &SelectStmt) -> bool {
    if !single_table(select)
        || select.compound.is_some()
        || !select.group_by.is_empty()
        || select.having.is_some()
        || select.distinct
    {
        return false;
    }
    let plain_columns = select
        .columns
        .iter()
        .all(|c| matches!(c.unaliased(), Expr::ColumnRef(_)));
    plain_columns
        && select
            .where_clause
            .as_ref()
            .and_then(simple_comparison)
            .is_some()
}

/// The WHERE clause as a [`FilterInfo`] when it is a single `col OP literal`
/// comparison with a non-NULL, non-BLOB literal.
pub fn extract_filter_info(select: &SelectStmt) -> Option<FilterInfo> {
    let (column, op, value) = simple_comparison(select.where_clause.as_ref()?)?;
    match value {
        Value::Int(_) | Value::Float(_) | Value::Text(_) => Some(FilterInfo {
            column: column.to_string(),
            op,
            value: value.clone(),
        }),
        Value::Null | Value::Blob(_) => None,
    }
}

/// Columnar execution suits full scans and aggregates but not joins.
pub fn should_use_columnar(select: &SelectStmt) -> bool {
    if select.from.as_ref().is_some_and(|f| !f.joins.is_empty()) {
        return false;
    }
    select_has_aggregates(select) || select.where_clause.is_none()
}

/// Bare `SELECT * FROM t` with no other clause.
pub fn is_simple_select_star(select: &SelectStmt) -> bool {
    single_table(select)
        && select.ctes.is_empty()
        && select.compound.is_none()
        && select.where_clause.is_none()
        && select.group_by.is_empty()
        && select.having.is_none()
        && select.order_by.is_empty()
        && !select.distinct
        && select.limit.is_none()
        && select.offset.is_none()
        && matches!(
            select.columns.as_slice(),
            [Expr::ColumnRef(c)] if c.name == "*" && c.table.is_none()
        )
}

/// Rows a Top-N accumulator must keep to answer `LIMIT limit OFFSET offset`.
/// `None` unless LIMIT is a positive integer literal and OFFSET is absent or
/// an integer literal; a negative OFFSET counts as zero.
pub fn limit_window(limit: Option<&Expr>, offset: Option<&Expr>) -> Option<usize> {
    let limit = limit?.as_literal()?.as_i64().filter(|n| *n > 0)?;
    let offset = match offset {
        Some(expr) => expr.as_literal()?.as_i64()?.max(0),
        None => 0,
    };
    let total = limit.checked_add(offset)?;
    usize::try_from(total).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::ast::Statement;
    use crate::sql::parser::parse;

    fn select(sql: &str) -> SelectStmt {
        match parse(sql).unwrap() {
            Statement::Select(s) => *s,
            other => panic!("expected SELECT, got {:?}", other),
        }
    }

    #[test]
    fn simple_aggregate_patterns() {
        assert_eq!(
            is_simple_aggregate(&select("SELECT COUNT(*) FROM t")),
            Some(("COUNT", "*".to_string()))
        );
        assert_eq!(
            is_simple_aggregate(&select("SELECT count() FROM t")),
            Some(("COUNT", "*".to_string()))
        );
        assert_eq!(
            is_simple_aggregate(&select("SELECT max(price) FROM items")),
            Some(("MAX", "price".to_string()))
        );
        assert_eq!(
            is_simple_aggregate(&select("SELECT SUM(t.v) FROM t")),
            Some(("SUM", "v".to_string()))
        );
    }

    #[test]
    fn simple_aggregate_rejections() {
        for sql in [
            "SELECT COUNT(a) FROM t",
            "SELECT COUNT(*) FROM t WHERE a = 1",
            "SELECT SUM(a) FROM t GROUP BY b",
            "SELECT SUM(DISTINCT a) FROM t",
            "SELECT SUM(a + 1) FROM t",
            "SELECT AVG(a) FROM t",
            "SELECT SUM(a), MIN(a) FROM t",
            "SELECT COUNT(*) FROM a JOIN b ON a.id = b.id",
            "SELECT COUNT(*) FROM (SELECT 1)",
            "SELECT COUNT(*)",
        ] {
            assert!(is_simple_aggregate(&select(sql)).is_none(), "{}", sql);
        }
    }

    #[test]
    fn vectorized_filter_eligibility() {
        assert!(is_vectorized_filter_eligible(&select("SELECT a, b AS bee FROM t WHERE a > 5")));
        assert!(is_vectorized_filter_eligible(&select("SELECT * FROM t WHERE name = 'x'")));
        for sql in [
            "SELECT a FROM t",
            "SELECT a + 1 FROM t WHERE a > 5",
            "SELECT a FROM t WHERE 5 < a",
            "SELECT a FROM t WHERE a > 5 AND b < 2",
            "SELECT DISTINCT a FROM t WHERE a > 5",
            "SELECT a FROM t JOIN u ON t.id = u.id WHERE a > 5",
        ] {
            assert!(!is_vectorized_filter_eligible(&select(sql)), "{}", sql);
        }
    }

    #[test]
    fn filter_info_extraction() {
        let info = extract_filter_info(&select("SELECT * FROM t WHERE score >= 2.5")).unwrap();
        assert_eq!(info.column, "score");
        assert_eq!(info.op, BinaryOp::GtEq);
        assert_eq!(info.value, Value::Float(2.5));
        assert!(extract_filter_info(&select("SELECT * FROM t WHERE a = NULL")).is_none());
        assert!(extract_filter_info(&select("SELECT * FROM t")).is_none());
    }

    #[test]
    fn columnar_decision() {
        assert!(should_use_columnar(&select("SELECT a FROM t")));
        assert!(should_use_columnar(&select("SELECT SUM(a) FROM t WHERE b = 1")));
        assert!(!should_use_columnar(&select("SELECT a FROM t WHERE b = 1")));
        assert!(!should_use_columnar(&select("SELECT COUNT(*) FROM a JOIN b ON a.x = b.x")));
    }

    #[test]
    fn select_star_fast_path() {
        assert!(is_simple_select_star(&select("SELECT * FROM t")));
        assert!(!is_simple_select_star(&select("SELECT t.* FROM t")));
        assert!(!is_simple_select_star(&select("SELECT * FROM t LIMIT 1")));
        assert!(!is_simple_select_star(&select("SELECT * FROM t ORDER BY a")));
    }

    #[test]
    fn limit_window_sizes_top_n() {
        let s = select("SELECT * FROM t ORDER BY a LIMIT 10 OFFSET 5");
        assert_eq!(limit_window(s.limit.as_ref(), s.offset.as_ref()), Some(15));
        let s = select("SELECT * FROM t LIMIT 3");
        assert_eq!(limit_window(s.limit.as_ref(), s.offset.as_ref()), Some(3));
        let s = select("SELECT * FROM t LIMIT 0");
        assert_eq!(limit_window(s.limit.as_ref(), s.offset.as_ref()), None);
        let s = select("SELECT * FROM t LIMIT ?");
        assert_eq!(limit_window(s.limit.as_ref(), s.offset.as_ref()), None);
        assert_eq!(limit_window(None, None), None);
    }
}
