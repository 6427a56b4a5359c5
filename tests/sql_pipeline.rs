//! # End-to-End Pipeline Tests
//!
//! Drives the public API from SQL text through parsing, normalization,
//! binding, analysis and plan selection. Expected values are written out by
//! hand.
//!
//! ## Running Tests
//!
//! ```sh
//! cargo test --test sql_pipeline
//! ```

use std::collections::HashMap;

use proptest::prelude::*;
use sqlvibe::sql::analysis::{cte_names, find_cte, has_ctes};
use sqlvibe::sql::ast::{BinaryOp, Expr, InsertSource, SelectStmt, Statement};
use sqlvibe::sql::functions::BuiltinFunctions;
use sqlvibe::sql::optimizer::{
    eval_pushdown, is_simple_aggregate, split_pushdown, PlanShape,
};
use sqlvibe::sql::window::{RowEvaluator, RowSet};
use sqlvibe::sql::{bind, normalize, parse, params};
use sqlvibe::{Engine, Value};

fn select(sql: &str) -> SelectStmt {
    match parse(sql).unwrap() {
        Statement::Select(s) => *s,
        other => panic!("expected SELECT, got {:?}", other),
    }
}

mod scenarios {
    use super::*;

    #[test]
    fn conjunction_of_equalities_is_fully_pushable() {
        let stmt = select("SELECT a, b FROM t WHERE id = 1 AND name = 'x'");
        let (pushable, remaining) = split_pushdown(stmt.where_clause.as_ref().unwrap());
        assert_eq!(
            pushable,
            vec![
                Expr::binary(BinaryOp::Eq, Expr::column("id"), Expr::literal(1i64)),
                Expr::binary(BinaryOp::Eq, Expr::column("name"), Expr::literal("x")),
            ]
        );
        assert!(remaining.is_none());
    }

    #[test]
    fn count_star_is_a_simple_aggregate() {
        let stmt = select("SELECT COUNT(*) FROM t");
        assert_eq!(is_simple_aggregate(&stmt), Some(("COUNT", "*".to_string())));
    }

    #[test]
    fn cte_lookup() {
        let stmt = select("WITH r AS (SELECT 1 AS n) SELECT n FROM r");
        assert!(has_ctes(&stmt));
        assert_eq!(cte_names(&stmt), vec!["r"]);
        assert_eq!(find_cte(&stmt, "r").unwrap().name, "r");
    }

    #[test]
    fn normalize_replaces_float_literal() {
        assert_eq!(
            normalize("SELECT * FROM t WHERE x = 3.14"),
            "select * from t where x = ?"
        );
    }

    #[test]
    fn insert_binds_positional_and_named() {
        let stmt = parse("INSERT INTO t VALUES (?, :name)").unwrap();
        let mut named = HashMap::new();
        named.insert("name".to_string(), Value::from("Alice"));
        let bound = bind(&stmt, &params([42i64]), &named).unwrap();
        match bound {
            Statement::Insert(insert) => match &insert.source {
                InsertSource::Values(rows) => assert_eq!(
                    rows[0],
                    vec![Expr::literal(42i64), Expr::literal("Alice")]
                ),
                other => panic!("expected VALUES, got {:?}", other),
            },
            other => panic!("expected INSERT, got {:?}", other),
        }
        // binding again from the same tree sees the placeholders, not Alice
        let mut named = HashMap::new();
        named.insert("name".to_string(), Value::from("Bob"));
        let rebound = bind(&stmt, &params([1i64]), &named).unwrap();
        let Statement::Insert(insert) = rebound else {
            panic!("expected INSERT");
        };
        assert_eq!(
            insert.source,
            InsertSource::Values(vec![vec![Expr::literal(1i64), Expr::literal("Bob")]])
        );
    }
}

mod binding {
    use super::*;

    #[test]
    fn host_values_bind_to_canonical_literals() {
        let stmt = parse("SELECT ?, ?, ?, ?").unwrap();
        let bound = bind(
            &stmt,
            &[
                Value::Int(7),
                params([true])[0].clone(),
                Value::Float(1.5),
                Value::Null,
            ],
            &HashMap::new(),
        )
        .unwrap();
        let Statement::Select(s) = bound else {
            panic!("expected SELECT");
        };
        assert_eq!(
            s.columns,
            vec![
                Expr::literal(7i64),
                Expr::literal(1i64),
                Expr::literal(1.5f64),
                Expr::Literal(Value::Null),
            ]
        );
    }

    #[test]
    fn missing_parameter_is_an_error() {
        let stmt = parse("SELECT ? + ?").unwrap();
        assert!(bind(&stmt, &[Value::Int(1)], &HashMap::new()).is_err());
        let stmt = parse("SELECT :who").unwrap();
        assert!(bind(&stmt, &[], &HashMap::new()).is_err());
    }
}

mod normalization {
    use super::*;

    #[test]
    fn surface_variants_share_a_key() {
        assert_eq!(
            normalize("SELECT * FROM users WHERE id = 1"),
            normalize("select   *  from USERS where id=999")
        );
    }

    #[test]
    fn normalize_is_idempotent() {
        for sql in [
            "SELECT a, b FROM t WHERE x > 10 ORDER BY a LIMIT 5",
            "insert into t values ('a', x'00ff', 1.5e3)",
            "SELECT \"Mixed\" FROM t WHERE y = :p",
        ] {
            let once = normalize(sql);
            assert_eq!(normalize(&once), once);
        }
    }
}

mod engine {
    use super::*;

    #[test]
    fn plan_select_picks_shape_and_pushdown() {
        let engine = Engine::builder().plan_cache_capacity(16).build();
        let available: Vec<String> = ["a", "b", "id", "name"].iter().map(|s| s.to_string()).collect();
        let plan = engine
            .plan_select("SELECT a, b FROM t WHERE id = 1 AND name = 'x'", &available)
            .unwrap();
        assert_eq!(plan.pushable.len(), 2);
        assert!(plan.remaining.is_none());

        let plan = engine.plan_select("SELECT COUNT(*) FROM t", &available).unwrap();
        assert_eq!(plan.shape, PlanShape::SimpleAggregate);
    }

    #[test]
    fn placeholder_statements_are_cached() {
        let engine = Engine::default();
        engine.prepare("SELECT a FROM t WHERE id = ?").unwrap();
        engine.prepare("SELECT a FROM t WHERE id = ?").unwrap();
        let stats = engine.plan_cache().stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }
}

const COLUMNS: [&str; 2] = ["a", "b"];

const OPS: [BinaryOp; 6] = [
    BinaryOp::Eq,
    BinaryOp::NotEq,
    BinaryOp::Lt,
    BinaryOp::LtEq,
    BinaryOp::Gt,
    BinaryOp::GtEq,
];

/// `None` is a missing column, `Some(None)` a NULL.
type Cell = Option<Option<i64>>;

fn cell_strategy() -> impl Strategy<Value = Cell> {
    prop_oneof![
        1 => Just(None),
        1 => Just(Some(None)),
        6 => (-4i64..4).prop_map(|v| Some(Some(v))),
    ]
}

fn leaf_strategy() -> impl Strategy<Value = Expr> {
    (0usize..2, 0usize..6, -4i64..4, any::<bool>()).prop_map(|(col, op, lit, column_left)| {
        let column = Expr::column(COLUMNS[col]);
        let literal = Expr::literal(lit);
        if column_left {
            Expr::binary(OPS[op], column, literal)
        } else {
            Expr::binary(OPS[op], literal, column)
        }
    })
}

fn conjunction(leaves: Vec<Expr>) -> Expr {
    let mut iter = leaves.into_iter();
    let first = iter.next().unwrap();
    iter.fold(first, |acc, leaf| Expr::binary(BinaryOp::And, acc, leaf))
}

proptest! {
    /// Pushed-down filtering agrees with evaluating the whole WHERE tree,
    /// including rows where the column is missing or NULL.
    #[test]
    fn pushdown_matches_general_evaluation(
        leaves in prop::collection::vec(leaf_strategy(), 1..5),
        rows in prop::collection::vec((cell_strategy(), cell_strategy()), 1..30),
    ) {
        let predicate = conjunction(leaves);
        let (pushable, remaining) = split_pushdown(&predicate);
        prop_assert!(remaining.is_none());

        let data: Vec<Vec<Value>> = rows
            .iter()
            .map(|(a, b)| {
                [*a, *b]
                    .into_iter()
                    .map(|c| c.flatten().map_or(Value::Null, Value::Int))
                    .collect()
            })
            .collect();
        let row_set = RowSet::new(COLUMNS.iter().map(|c| c.to_string()).collect(), data);
        let general = RowEvaluator::new(&row_set, &BuiltinFunctions);

        for (i, (a, b)) in rows.iter().enumerate() {
            let mut map = HashMap::new();
            for (name, cell) in COLUMNS.iter().zip([*a, *b]) {
                if let Some(value) = cell {
                    map.insert(name.to_string(), value.map_or(Value::Null, Value::Int));
                }
            }
            let pushed = pushable.iter().all(|p| eval_pushdown(p, &map));
            prop_assert_eq!(pushed, general.eval_predicate(i, &predicate));
        }
    }
}
