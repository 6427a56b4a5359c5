//! # Semantic Analysis
//!
//! Read-only facts derived from a parsed tree. Every pass here is a walk over
//! the same visitor, so a new expression variant only has to be taught to
//! [`walk_expr`] once.
//!
//! ## Passes
//!
//! | Module | Facts |
//! |--------|-------|
//! | `columns` | referenced columns, output names, star/join shape |
//! | `aggregates` | aggregate detection and deduplicated extraction |
//! | `windows` | window-position calls, named window resolution |
//! | `subqueries` | nested SELECTs anywhere in an expression |
//! | `cte` | WITH-clause lookups and self-reference |
//! | `types` | static result type of an expression |
//!
//! ## Walk Order
//!
//! `walk_expr` calls [`ExprVisitor::enter`] on a node before its children and
//! skips the children when `enter` returns `false`. Nested SELECTs (scalar
//! subqueries, IN/EXISTS, ANY/ALL) are entered only when
//! [`ExprVisitor::descend_into_subqueries`] says so: an aggregate inside a
//! subquery belongs to the subquery, not to the enclosing SELECT.
//!
//! `walk_select` visits the clauses of one SELECT in source order:
//!
//! ```text
//! CTE bodies* -> columns -> FROM (subqueries*, ON) -> WHERE -> GROUP BY
//!   -> HAVING -> WINDOW -> ORDER BY -> LIMIT -> OFFSET -> compound*
//! ```
//!
//! The starred parts are nested SELECTs and follow the same rule.

mod aggregates;
mod columns;
mod cte;
mod subqueries;
mod types;
mod windows;

pub use aggregates::{
    count_aggregate_functions, extract_aggregates, extract_aggregates_with,
    extract_select_aggregates, has_aggregate, has_aggregate_with, is_aggregate_function,
    select_has_aggregates, AggregateDef, AggregateInfo,
};
pub(crate) use aggregates::is_builtin_aggregate;
pub use columns::{has_join, is_star_select, output_column_names, required_columns};
pub use cte::{cte_names, find_cte, has_ctes, is_recursive, is_self_referencing, referenced_ctes};
pub use subqueries::{extract_subqueries, has_subquery};
pub use types::{infer_type, SqlType};
pub use windows::{
    extract_window_functions, has_named_windows, has_window_function, is_window_function_name,
    resolve_named_window, select_has_window_functions,
};
pub(crate) use windows::is_ranking_function;

use super::ast::*;

/// `'a` is the lifetime of the walked tree, so a visitor may keep references
/// to the nodes it sees.
pub trait ExprVisitor<'a> {
    /// Called on every node before its children. Returning `false` skips the
    /// children of this node.
    fn enter(&mut self, expr: &'a Expr) -> bool;

    fn descend_into_subqueries(&self) -> bool {
        false
    }
}

/// Adapts a closure into a visitor that stays out of subqueries.
impl<'a, F: FnMut(&'a Expr) -> bool> ExprVisitor<'a> for F {
    fn enter(&mut self, expr: &'a Expr) -> bool {
        self(expr)
    }
}

pub fn walk_expr<'a, V: ExprVisitor<'a> + ?Sized>(visitor: &mut V, expr: &'a Expr) {
    if !visitor.enter(expr) {
        return;
    }
    match expr {
        Expr::Literal(_) | Expr::ColumnRef(_) | Expr::Placeholder(_) => {}
        Expr::Binary { left, right, .. } => {
            walk_expr(visitor, left);
            walk_expr(visitor, right);
        }
        Expr::Unary { expr, .. }
        | Expr::Alias { expr, .. }
        | Expr::Cast { expr, .. }
        | Expr::Collate { expr, .. } => walk_expr(visitor, expr),
        Expr::FuncCall(call) => {
            walk_exprs(visitor, &call.args);
            if let Some(filter) = &call.filter {
                walk_expr(visitor, filter);
            }
        }
        Expr::Case {
            operand,
            conditions,
            else_result,
        } => {
            if let Some(operand) = operand {
                walk_expr(visitor, operand);
            }
            for when in conditions {
                walk_expr(visitor, &when.condition);
                walk_expr(visitor, &when.result);
            }
            if let Some(else_result) = else_result {
                walk_expr(visitor, else_result);
            }
        }
        Expr::Subquery(query) | Expr::Exists { subquery: query, .. } => {
            walk_nested(visitor, query);
        }
        Expr::AnyAll { left, subquery, .. } => {
            walk_expr(visitor, left);
            walk_nested(visitor, subquery);
        }
        Expr::InSubquery { expr, subquery, .. } => {
            walk_expr(visitor, expr);
            walk_nested(visitor, subquery);
        }
        Expr::WindowFunc(wf) => {
            walk_exprs(visitor, &wf.args);
            if let Some(filter) = &wf.filter {
                walk_expr(visitor, filter);
            }
            walk_exprs(visitor, &wf.partition);
            walk_order_by(visitor, &wf.order_by);
            walk_frame(visitor, wf.frame.as_ref());
        }
        Expr::InList { expr, list, .. } => {
            walk_expr(visitor, expr);
            walk_exprs(visitor, list);
        }
        Expr::Between {
            expr, low, high, ..
        } => {
            walk_expr(visitor, expr);
            walk_expr(visitor, low);
            walk_expr(visitor, high);
        }
    }
}

pub fn walk_exprs<'a, V: ExprVisitor<'a> + ?Sized>(visitor: &mut V, exprs: &'a [Expr]) {
    for expr in exprs {
        walk_expr(visitor, expr);
    }
}

fn walk_nested<'a, V: ExprVisitor<'a> + ?Sized>(visitor: &mut V, select: &'a SelectStmt) {
    if visitor.descend_into_subqueries() {
        walk_select(visitor, select);
    }
}

fn walk_order_by<'a, V: ExprVisitor<'a> + ?Sized>(visitor: &mut V, items: &'a [OrderByItem]) {
    for item in items {
        walk_expr(visitor, &item.expr);
    }
}

fn walk_frame<'a, V: ExprVisitor<'a> + ?Sized>(visitor: &mut V, frame: Option<&'a WindowFrame>) {
    let Some(frame) = frame else {
        return;
    };
    for bound in std::iter::once(&frame.start).chain(frame.end.as_ref()) {
        if let WindowFrameBound::Preceding(e) | WindowFrameBound::Following(e) = bound {
            walk_expr(visitor, e);
        }
    }
}

/// Visits every clause of `select`. CTE bodies, FROM subqueries and compound
/// operands count as nested SELECTs.
pub fn walk_select<'a, V: ExprVisitor<'a> + ?Sized>(visitor: &mut V, select: &'a SelectStmt) {
    let nested = visitor.descend_into_subqueries();
    if nested {
        for cte in &select.ctes {
            walk_select(visitor, &cte.query);
        }
    }
    walk_exprs(visitor, &select.columns);
    if let Some(from) = &select.from {
        for source in from.sources() {
            match source {
                TableSource::Subquery { query, .. } if nested => walk_select(visitor, query),
                TableSource::Function { args, .. } => walk_exprs(visitor, args),
                TableSource::Values { rows, .. } => {
                    for row in rows {
                        walk_exprs(visitor, row);
                    }
                }
                _ => {}
            }
        }
        for join in &from.joins {
            if let JoinCondition::On(cond) = &join.condition {
                walk_expr(visitor, cond);
            }
        }
    }
    if let Some(where_clause) = &select.where_clause {
        walk_expr(visitor, where_clause);
    }
    walk_exprs(visitor, &select.group_by);
    if let Some(having) = &select.having {
        walk_expr(visitor, having);
    }
    for window in &select.windows {
        walk_exprs(visitor, &window.spec.partition_by);
        walk_order_by(visitor, &window.spec.order_by);
        walk_frame(visitor, window.spec.frame.as_ref());
    }
    walk_order_by(visitor, &select.order_by);
    if let Some(limit) = &select.limit {
        walk_expr(visitor, limit);
    }
    if let Some(offset) = &select.offset {
        walk_expr(visitor, offset);
    }
    if nested {
        if let Some(compound) = &select.compound {
            walk_select(visitor, &compound.right);
        }
    }
}

/// True when `pred` holds for some node of `expr`, subqueries excluded.
pub(crate) fn any_expr(expr: &Expr, mut pred: impl FnMut(&Expr) -> bool) -> bool {
    let mut found = false;
    walk_expr(
        &mut |e: &Expr| {
            if found {
                return false;
            }
            if pred(e) {
                found = true;
                return false;
            }
            true
        },
        expr,
    );
    found
}
