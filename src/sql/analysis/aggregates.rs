//! Aggregate detection and extraction.
//!
//! A call is an aggregate when it is a plain function call (no OVER) whose
//! name is one of the built-in aggregates or is declared
//! [`FunctionKind::Aggregate`] by a registry. The same name with OVER is a
//! window function and is never collected here.
//!
//! Extraction deduplicates by function name plus argument signature, so
//! `SELECT SUM(x), SUM(x) * 2` shares one accumulator slot. The signature is
//! the rendered argument list with DISTINCT, `*` and FILTER folded in.

use phf::phf_set;

use super::walk_exprs;
use crate::sql::ast::{Expr, FunctionCall, SelectStmt};
use crate::sql::functions::{FunctionKind, FunctionRegistry};

static BUILTIN_AGGREGATES: phf::Set<&'static str> = phf_set! {
    "COUNT",
    "SUM",
    "AVG",
    "MIN",
    "MAX",
    "TOTAL",
    "GROUP_CONCAT",
    "JSON_GROUP_ARRAY",
    "JSONB_GROUP_ARRAY",
    "JSON_GROUP_OBJECT",
    "JSONB_GROUP_OBJECT",
    "ANY_VALUE",
    "MODE",
};

/// `name` must already be upper-case.
pub(crate) fn is_builtin_aggregate(name: &str) -> bool {
    BUILTIN_AGGREGATES.contains(name)
}

pub fn is_aggregate_function(name: &str) -> bool {
    is_builtin_aggregate(&name.to_ascii_uppercase())
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateDef {
    pub function: String,
    pub args: Vec<Expr>,
    pub distinct: bool,
    pub star: bool,
    pub filter: Option<Expr>,
}

impl AggregateDef {
    fn from_call(call: &FunctionCall) -> Self {
        Self {
            function: call.name.to_ascii_uppercase(),
            args: call.args.clone(),
            distinct: call.distinct,
            star: call.star,
            filter: call.filter.as_deref().cloned(),
        }
    }

    /// Deduplication key for the argument list.
    pub fn signature(&self) -> String {
        let mut sig = String::new();
        if self.distinct {
            sig.push_str("DISTINCT ");
        }
        if self.star {
            sig.push('*');
        }
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                sig.push_str(", ");
            }
            sig.push_str(&arg.to_string());
        }
        if let Some(filter) = &self.filter {
            sig.push_str(" FILTER ");
            sig.push_str(&filter.to_string());
        }
        sig
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregateInfo {
    pub aggregates: Vec<AggregateDef>,
}

impl AggregateInfo {
    pub fn len(&self) -> usize {
        self.aggregates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aggregates.is_empty()
    }

    /// Slot of an aggregate equal to `call`, if already extracted.
    pub fn position(&self, call: &FunctionCall) -> Option<usize> {
        let wanted = AggregateDef::from_call(call);
        let sig = wanted.signature();
        self.aggregates
            .iter()
            .position(|a| a.function == wanted.function && a.signature() == sig)
    }

    fn push_unique(&mut self, call: &FunctionCall) {
        if self.position(call).is_none() {
            self.aggregates.push(AggregateDef::from_call(call));
        }
    }
}

fn is_aggregate_call(call: &FunctionCall, registry: Option<&dyn FunctionRegistry>) -> bool {
    let upper = call.name.to_ascii_uppercase();
    is_builtin_aggregate(&upper)
        || registry.is_some_and(|r| r.function_kind(&upper) == Some(FunctionKind::Aggregate))
}

pub fn has_aggregate(expr: &Expr) -> bool {
    has_aggregate_in(expr, None)
}

pub fn has_aggregate_with(expr: &Expr, registry: &dyn FunctionRegistry) -> bool {
    has_aggregate_in(expr, Some(registry))
}

fn has_aggregate_in(expr: &Expr, registry: Option<&dyn FunctionRegistry>) -> bool {
    super::any_expr(expr, |e| matches!(e, Expr::FuncCall(call) if is_aggregate_call(call, registry)))
}

pub fn extract_aggregates(expr: &Expr, info: &mut AggregateInfo) {
    extract_in(std::slice::from_ref(expr), info, None);
}

pub fn extract_aggregates_with(
    expr: &Expr,
    info: &mut AggregateInfo,
    registry: &dyn FunctionRegistry,
) {
    extract_in(std::slice::from_ref(expr), info, Some(registry));
}

fn extract_in(exprs: &[Expr], info: &mut AggregateInfo, registry: Option<&dyn FunctionRegistry>) {
    walk_exprs(
        &mut |e: &Expr| match e {
            Expr::FuncCall(call) if is_aggregate_call(call, registry) => {
                info.push_unique(call);
                false
            }
            _ => true,
        },
        exprs,
    );
}

/// Aggregates of the projection, HAVING and ORDER BY, in that order.
pub fn extract_select_aggregates(select: &SelectStmt) -> AggregateInfo {
    let mut info = AggregateInfo::default();
    extract_in(&select.columns, &mut info, None);
    if let Some(having) = &select.having {
        extract_in(std::slice::from_ref(having), &mut info, None);
    }
    for item in &select.order_by {
        extract_in(std::slice::from_ref(&item.expr), &mut info, None);
    }
    info
}

/// Number of distinct aggregate slots in `expr`.
pub fn count_aggregate_functions(expr: &Expr) -> usize {
    let mut info = AggregateInfo::default();
    extract_aggregates(expr, &mut info);
    info.len()
}

/// True with GROUP BY or when any projected column aggregates.
pub fn select_has_aggregates(select: &SelectStmt) -> bool {
    !select.group_by.is_empty() || select.columns.iter().any(has_aggregate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::ast::Statement;
    use crate::sql::functions::BuiltinFunctions;
    use crate::sql::parser::parse;
    use crate::types::Value;

    fn select(sql: &str) -> SelectStmt {
        match parse(sql).unwrap() {
            Statement::Select(s) => *s,
            other => panic!("expected SELECT, got {:?}", other),
        }
    }

    #[test]
    fn detects_nested_aggregates() {
        let s = select("SELECT CASE WHEN SUM(x) > 10 THEN 1 ELSE 0 END, y FROM t");
        assert!(has_aggregate(&s.columns[0]));
        assert!(!has_aggregate(&s.columns[1]));
        assert!(select_has_aggregates(&s));
    }

    #[test]
    fn window_position_is_not_aggregate() {
        let s = select("SELECT SUM(x) OVER (PARTITION BY g) FROM t");
        assert!(!has_aggregate(&s.columns[0]));
        assert!(!select_has_aggregates(&s));
    }

    #[test]
    fn subquery_aggregate_stays_inside() {
        let s = select("SELECT (SELECT MAX(x) FROM u) FROM t");
        assert!(!has_aggregate(&s.columns[0]));
    }

    #[test]
    fn group_by_counts_as_aggregate_query() {
        let s = select("SELECT g FROM t GROUP BY g");
        assert!(select_has_aggregates(&s));
    }

    #[test]
    fn extraction_deduplicates_by_signature() {
        let s = select(
            "SELECT SUM(x), SUM(x) * 2, SUM(DISTINCT x), COUNT(*), count(*), AVG(y) FROM t HAVING SUM(x) > 1 ORDER BY MIN(z)",
        );
        let info = extract_select_aggregates(&s);
        let names: Vec<&str> = info.aggregates.iter().map(|a| a.function.as_str()).collect();
        assert_eq!(names, vec!["SUM", "SUM", "COUNT", "AVG", "MIN"]);
        assert!(info.aggregates[1].distinct);
        assert!(info.aggregates[2].star);
        assert_eq!(info.aggregates[0].signature(), "x");
        assert_eq!(info.aggregates[1].signature(), "DISTINCT x");
    }

    #[test]
    fn count_aggregate_functions_counts_slots() {
        let s = select("SELECT MAX(a) - MIN(a) + MAX(a) FROM t");
        assert_eq!(count_aggregate_functions(&s.columns[0]), 2);
    }

    #[test]
    fn position_finds_existing_slot() {
        let s = select("SELECT COUNT(a), SUM(b) FROM t");
        let info = extract_select_aggregates(&s);
        let wanted = FunctionCall::new("sum", vec![Expr::column("b")]);
        assert_eq!(info.position(&wanted), Some(1));
        let other = FunctionCall::new("SUM", vec![Expr::Literal(Value::Int(1))]);
        assert_eq!(info.position(&other), None);
    }

    struct ExtendedRegistry;

    impl FunctionRegistry for ExtendedRegistry {
        fn call_func(&self, name: &str, args: &[Value]) -> Option<Value> {
            BuiltinFunctions.call_func(name, args)
        }

        fn function_kind(&self, name: &str) -> Option<FunctionKind> {
            if name.eq_ignore_ascii_case("MEDIAN") {
                Some(FunctionKind::Aggregate)
            } else {
                BuiltinFunctions.function_kind(name)
            }
        }
    }

    #[test]
    fn registry_declared_aggregates() {
        let s = select("SELECT MEDIAN(x) FROM t");
        assert!(!has_aggregate(&s.columns[0]));
        assert!(has_aggregate_with(&s.columns[0], &ExtendedRegistry));

        let mut info = AggregateInfo::default();
        extract_aggregates_with(&s.columns[0], &mut info, &ExtendedRegistry);
        assert_eq!(info.aggregates[0].function, "MEDIAN");
    }
}
