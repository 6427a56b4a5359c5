//! Nested SELECT detection.

use super::walk_expr;
use crate::sql::ast::{Expr, SelectStmt};

fn subquery_of(expr: &Expr) -> Option<&SelectStmt> {
    match expr {
        Expr::Subquery(query)
        | Expr::Exists { subquery: query, .. }
        | Expr::InSubquery { subquery: query, .. }
        | Expr::AnyAll { subquery: query, .. } => Some(&**query),
        _ => None,
    }
}

pub fn has_subquery(expr: &Expr) -> bool {
    super::any_expr(expr, |e| subquery_of(e).is_some())
}

/// Outermost subqueries of `expr` in walk order. Subqueries nested inside
/// them are not listed separately.
pub fn extract_subqueries<'a>(expr: &'a Expr) -> Vec<&'a SelectStmt> {
    let mut found = Vec::new();
    walk_expr(
        &mut |e: &'a Expr| {
            if let Some(query) = subquery_of(e) {
                found.push(query);
            }
            true
        },
        expr,
    );
    found
}
