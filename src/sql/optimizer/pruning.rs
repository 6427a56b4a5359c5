//! Column pruning.

use hashbrown::HashSet;

use crate::sql::analysis::{walk_expr, ExprVisitor};
use crate::sql::ast::{Expr, SelectStmt};

/// Collects lower-cased column names, subqueries included: a correlated
/// subquery may read an outer column.
struct ColumnCollector<'s> {
    names: &'s mut HashSet<String>,
}

impl ExprVisitor<'_> for ColumnCollector<'_> {
    fn enter(&mut self, expr: &Expr) -> bool {
        if let Expr::ColumnRef(c) = expr {
            if c.name != "*" {
                self.names.insert(c.name.to_ascii_lowercase());
            }
        }
        true
    }

    fn descend_into_subqueries(&self) -> bool {
        true
    }
}

/// The subset of `available` that `select` reads, in `available` order.
///
/// `None` means no pruning: the projection has a star, nothing is referenced,
/// or every available column is needed.
pub fn prune_columns(select: &SelectStmt, available: &[String]) -> Option<Vec<String>> {
    if available.is_empty() || select.columns.iter().any(Expr::is_star) {
        return None;
    }

    let mut names = HashSet::new();
    let mut collector = ColumnCollector { names: &mut names };
    let clauses = select
        .columns
        .iter()
        .chain(select.where_clause.iter())
        .chain(select.group_by.iter())
        .chain(select.having.iter())
        .chain(select.order_by.iter().map(|o| &o.expr));
    for expr in clauses {
        walk_expr(&mut collector, expr);
    }

    if names.is_empty() {
        return None;
    }
    let pruned: Vec<String> = available
        .iter()
        .filter(|c| names.contains(&c.to_ascii_lowercase()))
        .cloned()
        .collect();
    if pruned.len() >= available.len() {
        return None;
    }
    Some(pruned)
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

    fn available() -> Vec<String> {
        ["id", "name", "age", "email", "city"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn prunes_in_available_order() {
        let s = select("SELECT email FROM users WHERE age > 30 ORDER BY id");
        assert_eq!(
            prune_columns(&s, &available()),
            Some(vec!["id".to_string(), "age".to_string(), "email".to_string()])
        );
    }

    #[test]
    fn group_by_and_having_count() {
        let s = select("SELECT city, COUNT(*) FROM users GROUP BY city HAVING MAX(AGE) > 1");
        assert_eq!(
            prune_columns(&s, &available()),
            Some(vec!["age".to_string(), "city".to_string()])
        );
    }

    #[test]
    fn no_pruning_cases() {
        let cols = available();
        assert!(prune_columns(&select("SELECT * FROM users"), &cols).is_none());
        assert!(prune_columns(&select("SELECT COUNT(*) FROM users"), &cols).is_none());
        assert!(prune_columns(
            &select("SELECT id, name, age, email, city FROM users"),
            &cols
        )
        .is_none());
        assert!(prune_columns(&select("SELECT id FROM users"), &[]).is_none());
    }

    #[test]
    fn correlated_subquery_columns_are_kept() {
        let s = select("SELECT id FROM users u WHERE EXISTS (SELECT 1 FROM orders o WHERE o.city = u.city)");
        assert_eq!(
            prune_columns(&s, &available()),
            Some(vec!["id".to_string(), "city".to_string()])
        );
    }
}
