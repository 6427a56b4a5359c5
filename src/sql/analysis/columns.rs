//! Column references and output naming.

use std::collections::BTreeSet;

use super::walk_exprs;
use crate::sql::ast::{Expr, SelectStmt};

/// Column names referenced by the projection, WHERE, ORDER BY and GROUP BY.
/// Qualifiers are dropped and `*` is never reported. Subqueries keep their
/// own columns.
pub fn required_columns(select: &SelectStmt) -> BTreeSet<String> {
    let mut columns = BTreeSet::new();
    let mut collect = |e: &Expr| {
        if let Expr::ColumnRef(c) = e {
            if c.name != "*" {
                columns.insert(c.name.clone());
            }
        }
        true
    };

    walk_exprs(&mut collect, &select.columns);
    if let Some(where_clause) = &select.where_clause {
        walk_exprs(&mut collect, std::slice::from_ref(where_clause));
    }
    for item in &select.order_by {
        walk_exprs(&mut collect, std::slice::from_ref(&item.expr));
    }
    walk_exprs(&mut collect, &select.group_by);
    columns
}

/// Result column names: the alias, else the column name, else the function
/// name, else `col_N` with the 0-based position.
pub fn output_column_names(select: &SelectStmt) -> Vec<String> {
    select
        .columns
        .iter()
        .enumerate()
        .map(|(i, col)| match col {
            Expr::Alias { alias, .. } => alias.clone(),
            Expr::ColumnRef(c) => c.name.clone(),
            Expr::FuncCall(call) => call.name.to_ascii_uppercase(),
            Expr::WindowFunc(wf) => wf.name.to_ascii_uppercase(),
            _ => format!("col_{}", i),
        })
        .collect()
}

/// `SELECT *` or `SELECT t.*` as the only column.
pub fn is_star_select(select: &SelectStmt) -> bool {
    select.columns.len() == 1 && select.columns[0].is_star()
}

pub fn has_join(select: &SelectStmt) -> bool {
    select.from.as_ref().is_some_and(|f| !f.joins.is_empty())
}
