//! WITH-clause lookups.
//!
//! CTE names match case-insensitively, like every other SQL identifier.

use crate::sql::ast::{Cte, SelectStmt};

pub fn has_ctes(select: &SelectStmt) -> bool {
    !select.ctes.is_empty()
}

/// True when the WITH clause is `WITH RECURSIVE`.
pub fn is_recursive(select: &SelectStmt) -> bool {
    select.ctes.iter().any(|c| c.recursive)
}

pub fn cte_names(select: &SelectStmt) -> Vec<&str> {
    select.ctes.iter().map(|c| c.name.as_str()).collect()
}

pub fn find_cte<'a>(select: &'a SelectStmt, name: &str) -> Option<&'a Cte> {
    select.ctes.iter().find(|c| c.name.eq_ignore_ascii_case(name))
}

/// Table names in the FROM and JOIN list of `select` and of its compound
/// operands. Subqueries are not searched.
fn table_references(select: &SelectStmt) -> Vec<&str> {
    let mut names = Vec::new();
    let mut link = Some(select);
    while let Some(current) = link {
        if let Some(from) = &current.from {
            names.extend(from.sources().filter_map(|s| s.table_name()));
        }
        link = current.compound.as_deref().map(|op| &op.right);
    }
    names
}

/// CTEs of `select` referenced directly as tables, in WITH-clause order.
pub fn referenced_ctes(select: &SelectStmt) -> Vec<&str> {
    let tables = table_references(select);
    select
        .ctes
        .iter()
        .filter(|c| tables.iter().any(|t| t.eq_ignore_ascii_case(&c.name)))
        .map(|c| c.name.as_str())
        .collect()
}

/// True when the CTE body reads from the CTE itself.
pub fn is_self_referencing(cte: &Cte) -> bool {
    table_references(&cte.query)
        .iter()
        .any(|t| t.eq_ignore_ascii_case(&cte.name))
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
    fn cte_lookup() {
        let s = select("WITH a AS (SELECT 1), b(x) AS (SELECT 2) SELECT * FROM a");
        assert!(has_ctes(&s));
        assert!(!is_recursive(&s));
        assert_eq!(cte_names(&s), vec!["a", "b"]);
        assert_eq!(find_cte(&s, "B").unwrap().columns, vec!["x".to_string()]);
        assert!(find_cte(&s, "c").is_none());
    }

    #[test]
    fn referenced_ctes_only_from_tree() {
        let s = select(
            "WITH a AS (SELECT 1), b AS (SELECT 2), c AS (SELECT 3) \
             SELECT * FROM a JOIN c ON 1 = 1 WHERE EXISTS (SELECT * FROM b)",
        );
        assert_eq!(referenced_ctes(&s), vec!["a", "c"]);
    }

    #[test]
    fn recursive_cte_references_itself() {
        let s = select(
            "WITH RECURSIVE cnt(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM cnt WHERE n < 10) \
             SELECT n FROM cnt",
        );
        assert!(is_recursive(&s));
        let cte = find_cte(&s, "cnt").unwrap();
        assert!(cte.recursive);
        assert!(is_self_referencing(cte));

        let plain = select("WITH x AS (SELECT * FROM t) SELECT * FROM x");
        assert!(!is_self_referencing(&plain.ctes[0]));
    }
}
