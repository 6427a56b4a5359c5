//! # Query Optimizer Module
//!
//! Rule-based planning for a single SELECT. The optimizer never rewrites the
//! tree: it reads it and fills in a [`SelectPlan`] that tells the executor
//! which fast path to take and how much work can be skipped.
//!
//! ## Architecture
//!
//! ```text
//! SelectStmt → [Shape] → [Pushdown] → [Prune] → [Index] → [Top-N] → SelectPlan
//! ```
//!
//! | Rule | Fills in | Module |
//! |------|----------|--------|
//! | `ShapeRule` | `shape`, `simple_aggregate`, `filter` | [`shape`] |
//! | `PushdownRule` | `pushable`, `remaining` | [`pushdown`] |
//! | `PruningRule` | `columns` | [`pruning`] |
//! | `IndexRule` | `index` | [`index`] |
//! | `TopNRule` | `top_n` | [`shape`] |
//!
//! Rules run once each, in order. A later rule may read what an earlier one
//! recorded.
//!
//! ## Failure Policy
//!
//! Planning has no error path. A statement whose shape no rule recognizes
//! keeps the defaults of [`SelectPlan::general`]: no pushdown, no pruning, the
//! general execution path. Optimization failure only ever costs performance.
//!
//! ## Usage
//!
//! ```ignore
//! use sqlvibe::sql::optimizer::Optimizer;
//!
//! let plan = Optimizer::new().plan(&select, &["id".into(), "name".into()]);
//! if let Some(n) = plan.top_n {
//!     // keep only n rows while sorting
//! }
//! ```

mod index;
mod pruning;
mod pushdown;
mod shape;
mod skip_scan;

pub use index::{find_covering_index, select_best_index, IndexMeta};
pub use pruning::prune_columns;
pub use pushdown::{apply_pushdown_filter, eval_pushdown, is_pushable, split_pushdown};
pub use shape::{
    extract_filter_info, is_simple_aggregate, is_simple_select_star,
    is_vectorized_filter_eligible, limit_window, should_use_columnar, FilterInfo,
};
pub use skip_scan::can_skip_scan;

use crate::sql::analysis::required_columns;
use crate::sql::ast::{Expr, SelectStmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanShape {
    /// `COUNT(*)`, `SUM/MIN/MAX(col)` answered from table statistics or one
    /// pass without a general aggregator.
    SimpleAggregate,
    /// Single-table `col OP literal` filter evaluated column-at-a-time.
    VectorizedFilter,
    /// Full scan or aggregate over columnar batches.
    Columnar,
    General,
}

impl PlanShape {
    pub fn name(self) -> &'static str {
        match self {
            PlanShape::SimpleAggregate => "simple-aggregate",
            PlanShape::VectorizedFilter => "vectorized-filter",
            PlanShape::Columnar => "columnar",
            PlanShape::General => "general",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectPlan {
    pub shape: PlanShape,
    pub simple_aggregate: Option<(&'static str, String)>,
    pub filter: Option<FilterInfo>,
    /// Predicates evaluated against row maps before the general evaluator.
    pub pushable: Vec<Expr>,
    /// What stays in WHERE after pushdown.
    pub remaining: Option<Expr>,
    /// Columns to read from storage; `None` reads all of them.
    pub columns: Option<Vec<String>>,
    /// Name of the chosen secondary index.
    pub index: Option<String>,
    /// Rows a Top-N accumulator must keep for `ORDER BY ... LIMIT`.
    pub top_n: Option<usize>,
}

impl SelectPlan {
    pub fn general(select: &SelectStmt) -> Self {
        Self {
            shape: PlanShape::General,
            simple_aggregate: None,
            filter: None,
            pushable: Vec::new(),
            remaining: select.where_clause.clone(),
            columns: None,
            index: None,
            top_n: None,
        }
    }

    pub fn is_general(&self) -> bool {
        self.shape == PlanShape::General
    }
}

/// Inputs a rule may consult besides the statement itself.
#[derive(Debug, Clone, Copy)]
pub struct PlanContext<'a> {
    pub available_columns: &'a [String],
    pub indexes: &'a [IndexMeta],
}

pub trait PlanRule {
    fn name(&self) -> &'static str;

    fn apply(&self, select: &SelectStmt, ctx: &PlanContext<'_>, plan: &mut SelectPlan);
}

pub struct ShapeRule;

impl PlanRule for ShapeRule {
    fn name(&self) -> &'static str {
        "shape"
    }

    fn apply(&self, select: &SelectStmt, _ctx: &PlanContext<'_>, plan: &mut SelectPlan) {
        if let Some(agg) = is_simple_aggregate(select) {
            plan.shape = PlanShape::SimpleAggregate;
            plan.simple_aggregate = Some(agg);
        } else if is_vectorized_filter_eligible(select) {
            plan.shape = PlanShape::VectorizedFilter;
            plan.filter = extract_filter_info(select);
        } else if should_use_columnar(select) {
            plan.shape = PlanShape::Columnar;
        }
    }
}

pub struct PushdownRule;

impl PlanRule for PushdownRule {
    fn name(&self) -> &'static str {
        "pushdown"
    }

    fn apply(&self, select: &SelectStmt, _ctx: &PlanContext<'_>, plan: &mut SelectPlan) {
        // a join changes which table a bare column belongs to
        if select.from.as_ref().is_some_and(|f| !f.joins.is_empty()) {
            return;
        }
        if let Some(where_clause) = &select.where_clause {
            let (pushable, remaining) = split_pushdown(where_clause);
            plan.pushable = pushable;
            plan.remaining = remaining;
        }
    }
}

pub struct PruningRule;

impl PlanRule for PruningRule {
    fn name(&self) -> &'static str {
        "prune"
    }

    fn apply(&self, select: &SelectStmt, ctx: &PlanContext<'_>, plan: &mut SelectPlan) {
        plan.columns = prune_columns(select, ctx.available_columns);
    }
}

pub struct IndexRule;

impl PlanRule for IndexRule {
    fn name(&self) -> &'static str {
        "index"
    }

    fn apply(&self, select: &SelectStmt, ctx: &PlanContext<'_>, plan: &mut SelectPlan) {
        if ctx.indexes.is_empty() {
            return;
        }
        let filter_column = plan
            .filter
            .as_ref()
            .map(|f| f.column.clone())
            .or_else(|| plan.pushable.iter().find_map(pushed_column));
        let Some(filter_column) = filter_column else {
            return;
        };
        let required: Vec<String> = match &plan.columns {
            Some(columns) => columns.clone(),
            None if select.columns.iter().any(Expr::is_star) => {
                ctx.available_columns.to_vec()
            }
            None => required_columns(select).into_iter().collect(),
        };
        plan.index = select_best_index(ctx.indexes, &filter_column, &required)
            .map(|idx| idx.name.clone());
    }
}

fn pushed_column(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Binary { left, right, .. } => left
            .as_column()
            .or_else(|| right.as_column())
            .map(|c| c.name.clone()),
        Expr::Between { expr, .. } => expr.as_column().map(|c| c.name.clone()),
        _ => None,
    }
}

pub struct TopNRule;

impl PlanRule for TopNRule {
    fn name(&self) -> &'static str {
        "top-n"
    }

    fn apply(&self, select: &SelectStmt, _ctx: &PlanContext<'_>, plan: &mut SelectPlan) {
        if select.order_by.is_empty() {
            return;
        }
        plan.top_n = limit_window(select.limit.as_ref(), select.offset.as_ref());
    }
}

pub struct Optimizer {
    rules: Vec<Box<dyn PlanRule + Send + Sync>>,
}

impl Optimizer {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(ShapeRule),
                Box::new(PushdownRule),
                Box::new(PruningRule),
                Box::new(IndexRule),
                Box::new(TopNRule),
            ],
        }
    }

    pub fn with_rules(rules: Vec<Box<dyn PlanRule + Send + Sync>>) -> Self {
        Self { rules }
    }

    pub fn add_rule(&mut self, rule: Box<dyn PlanRule + Send + Sync>) {
        self.rules.push(rule);
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn plan(&self, select: &SelectStmt, available_columns: &[String]) -> SelectPlan {
        self.plan_with_indexes(select, available_columns, &[])
    }

    pub fn plan_with_indexes(
        &self,
        select: &SelectStmt,
        available_columns: &[String],
        indexes: &[IndexMeta],
    ) -> SelectPlan {
        let ctx = PlanContext {
            available_columns,
            indexes,
        };
        let mut plan = SelectPlan::general(select);
        for rule in &self.rules {
            rule.apply(select, &ctx, &mut plan);
        }

        if plan.is_general() {
            tracing::warn!(
                pushed = plan.pushable.len(),
                "no fast path matched, using general execution"
            );
        } else {
            tracing::debug!(shape = plan.shape.name(), pushed = plan.pushable.len(), "select planned");
        }
        plan
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new()
    }
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

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn plans_simple_aggregate() {
        let plan = Optimizer::new().plan(&select("SELECT COUNT(*) FROM t"), &cols(&["a"]));
        assert_eq!(plan.shape, PlanShape::SimpleAggregate);
        assert_eq!(plan.simple_aggregate, Some(("COUNT", "*".to_string())));
        assert!(plan.pushable.is_empty());
    }

    #[test]
    fn plans_vectorized_filter_with_pushdown_and_pruning() {
        let s = select("SELECT name FROM users WHERE age > 30");
        let plan = Optimizer::new().plan(&s, &cols(&["id", "name", "age"]));
        assert_eq!(plan.shape, PlanShape::VectorizedFilter);
        assert_eq!(plan.filter.as_ref().unwrap().column, "age");
        assert_eq!(plan.pushable.len(), 1);
        assert!(plan.remaining.is_none());
        assert_eq!(plan.columns, Some(cols(&["name", "age"])));
    }

    #[test]
    fn general_path_keeps_where() {
        let s = select("SELECT a FROM t WHERE a > 1 OR b < 2");
        let plan = Optimizer::new().plan(&s, &cols(&["a", "b", "c"]));
        assert!(plan.is_general());
        assert!(plan.pushable.is_empty());
        assert_eq!(plan.remaining, s.where_clause);
    }

    #[test]
    fn joins_skip_pushdown() {
        let s = select("SELECT * FROM a JOIN b ON a.id = b.id WHERE x = 1");
        let plan = Optimizer::new().plan(&s, &[]);
        assert!(plan.is_general());
        assert!(plan.pushable.is_empty());
        assert!(plan.remaining.is_some());
    }

    #[test]
    fn top_n_needs_order_by() {
        let opt = Optimizer::new();
        let plan = opt.plan(&select("SELECT * FROM t ORDER BY a LIMIT 5 OFFSET 2"), &[]);
        assert_eq!(plan.top_n, Some(7));
        let plan = opt.plan(&select("SELECT * FROM t LIMIT 5"), &[]);
        assert_eq!(plan.top_n, None);
    }

    #[test]
    fn index_rule_uses_filter_column() {
        let s = select("SELECT name FROM users WHERE age = 30");
        let indexes = vec![
            IndexMeta::new("idx_name", "users", &["name"]),
            IndexMeta::new("idx_age_name", "users", &["age", "name"]),
        ];
        let plan =
            Optimizer::new().plan_with_indexes(&s, &cols(&["id", "name", "age"]), &indexes);
        assert_eq!(plan.index.as_deref(), Some("idx_age_name"));
    }

    #[test]
    fn custom_rule_list() {
        let opt = Optimizer::with_rules(vec![Box::new(TopNRule)]);
        assert_eq!(opt.rule_names(), vec!["top-n"]);
        let plan = opt.plan(&select("SELECT COUNT(*) FROM t"), &[]);
        assert!(plan.is_general());
        assert_eq!(Optimizer::default().rule_names().len(), 5);
    }
}
