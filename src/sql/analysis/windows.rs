//! Window-position calls.
//!
//! A call is a window function by position alone: `f(..) OVER ...` parses to
//! [`Expr::WindowFunc`] whatever `f` is. Name checks are only for callers
//! that need to know whether the window engine implements `f`.

use phf::phf_set;

use super::walk_exprs;
use crate::sql::ast::{Expr, NamedWindow, SelectStmt, WindowFuncExpr, WindowSpec};

static RANKING_FUNCTIONS: phf::Set<&'static str> = phf_set! {
    "ROW_NUMBER",
    "RANK",
    "DENSE_RANK",
    "PERCENT_RANK",
    "CUME_DIST",
    "NTILE",
    "LAG",
    "LEAD",
    "FIRST_VALUE",
    "LAST_VALUE",
    "NTH_VALUE",
};

static FRAME_AGGREGATES: phf::Set<&'static str> = phf_set! {
    "COUNT",
    "SUM",
    "AVG",
    "MIN",
    "MAX",
    "TOTAL",
};

/// `name` must already be upper-case.
pub(crate) fn is_ranking_function(name: &str) -> bool {
    RANKING_FUNCTIONS.contains(name)
}

pub fn is_window_function_name(name: &str) -> bool {
    let upper = name.to_ascii_uppercase();
    RANKING_FUNCTIONS.contains(upper.as_str()) || FRAME_AGGREGATES.contains(upper.as_str())
}

pub fn has_window_function(expr: &Expr) -> bool {
    super::any_expr(expr, |e| matches!(e, Expr::WindowFunc(_)))
}

/// Window calls of the projection and ORDER BY, in that order.
pub fn extract_window_functions<'a>(select: &'a SelectStmt) -> Vec<&'a WindowFuncExpr> {
    let mut found = Vec::new();
    let mut collect = |e: &'a Expr| match e {
        Expr::WindowFunc(wf) => {
            found.push(&**wf);
            false
        }
        _ => true,
    };
    walk_exprs(&mut collect, &select.columns);
    for item in &select.order_by {
        walk_exprs(&mut collect, std::slice::from_ref(&item.expr));
    }
    found
}

pub fn select_has_window_functions(select: &SelectStmt) -> bool {
    select.columns.iter().any(has_window_function)
        || select.order_by.iter().any(|o| has_window_function(&o.expr))
}

pub fn has_named_windows(select: &SelectStmt) -> bool {
    !select.windows.is_empty()
}

fn find_window<'a>(select: &'a SelectStmt, name: &str) -> Option<&'a NamedWindow> {
    select
        .windows
        .iter()
        .find(|w| w.name.eq_ignore_ascii_case(name))
}

/// Fills the empty parts of `spec` from `base`.
fn inherit(spec: &mut WindowSpec, base: &WindowSpec) {
    if spec.partition_by.is_empty() {
        spec.partition_by = base.partition_by.clone();
    }
    if spec.order_by.is_empty() {
        spec.order_by = base.order_by.clone();
    }
    if spec.frame.is_none() {
        spec.frame = base.frame.clone();
    }
}

/// Copy of `wf` with `OVER name` replaced by the definition from the
/// WINDOW clause. Parts given inline win over the named ones, and a named
/// window may itself extend another. An unknown name leaves `wf` as is.
pub fn resolve_named_window(wf: &WindowFuncExpr, select: &SelectStmt) -> WindowFuncExpr {
    let mut resolved = wf.clone();
    let Some(name) = &wf.window_name else {
        return resolved;
    };
    let Some(mut window) = find_window(select, name) else {
        return resolved;
    };

    let mut spec = WindowSpec {
        base: None,
        partition_by: std::mem::take(&mut resolved.partition),
        order_by: std::mem::take(&mut resolved.order_by),
        frame: resolved.frame.take(),
    };

    // the chain is bounded by the number of definitions, which also stops a
    // cycle like `WINDOW a AS (b), b AS (a)`
    for _ in 0..select.windows.len() {
        inherit(&mut spec, &window.spec);
        match window.spec.base.as_deref().and_then(|b| find_window(select, b)) {
            Some(next) => window = next,
            None => break,
        }
    }

    resolved.partition = spec.partition_by;
    resolved.order_by = spec.order_by;
    resolved.frame = spec.frame;
    resolved.window_name = None;
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::ast::{Statement, WindowFrameMode};
    use crate::sql::parser::parse;

    fn select(sql: &str) -> SelectStmt {
        match parse(sql).unwrap() {
            Statement::Select(s) => *s,
            other => panic!("expected SELECT, got {:?}", other),
        }
    }

    #[test]
    fn names_cover_ranking_and_frame_aggregates() {
        for name in ["row_number", "RANK", "ntile", "lag", "nth_value", "sum", "Total"] {
            assert!(is_window_function_name(name), "{}", name);
        }
        assert!(!is_window_function_name("group_concat"));
        assert!(!is_window_function_name("upper"));
        assert!(is_ranking_function("CUME_DIST"));
        assert!(!is_ranking_function("SUM"));
    }

    #[test]
    fn detection_is_positional() {
        let s = select("SELECT SUM(x) OVER (), SUM(x), upper(y) OVER () FROM t");
        assert!(has_window_function(&s.columns[0]));
        assert!(!has_window_function(&s.columns[1]));
        assert!(has_window_function(&s.columns[2]));
        assert!(select_has_window_functions(&s));
    }

    #[test]
    fn extract_in_columns_then_order_by() {
        let s = select(
            "SELECT a, RANK() OVER (ORDER BY b) + 1, LAG(c) OVER (PARTITION BY d ORDER BY e) \
             FROM t ORDER BY ROW_NUMBER() OVER (ORDER BY f)",
        );
        let names: Vec<&str> = extract_window_functions(&s)
            .iter()
            .map(|w| w.name.as_str())
            .collect();
        assert_eq!(names, vec!["RANK", "LAG", "ROW_NUMBER"]);
    }

    #[test]
    fn subquery_windows_are_not_extracted() {
        let s = select("SELECT (SELECT RANK() OVER (ORDER BY x) FROM u) FROM t");
        assert!(extract_window_functions(&s).is_empty());
        assert!(!select_has_window_functions(&s));
    }

    #[test]
    fn resolves_named_window() {
        let s = select(
            "SELECT SUM(x) OVER w FROM t WINDOW w AS (PARTITION BY g ORDER BY x ROWS BETWEEN 1 PRECEDING AND CURRENT ROW)",
        );
        assert!(has_named_windows(&s));
        let wf = extract_window_functions(&s)[0];
        let resolved = resolve_named_window(wf, &s);
        assert_eq!(resolved.partition, vec![Expr::column("g")]);
        assert_eq!(resolved.order_by.len(), 1);
        assert_eq!(resolved.frame.as_ref().unwrap().mode, WindowFrameMode::Rows);
        assert!(resolved.window_name.is_none());
    }

    #[test]
    fn inline_parts_override_named_and_bases_chain() {
        let s = select(
            "SELECT RANK() OVER (w2 ORDER BY y) FROM t \
             WINDOW w1 AS (PARTITION BY g), w2 AS (w1 ORDER BY x)",
        );
        let wf = extract_window_functions(&s)[0];
        let resolved = resolve_named_window(wf, &s);
        assert_eq!(resolved.partition, vec![Expr::column("g")]);
        assert_eq!(resolved.order_by[0].expr, Expr::column("y"));
    }

    #[test]
    fn unknown_window_name_is_untouched() {
        let s = select("SELECT RANK() OVER nope FROM t");
        let wf = extract_window_functions(&s)[0];
        assert_eq!(resolve_named_window(wf, &s), *wf);
        assert!(!has_named_windows(&s));
    }
}
