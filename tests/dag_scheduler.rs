//! # Executor Integration Tests
//!
//! Exercises the DAG scheduler under real threads: exactly-once scheduling of
//! a diamond under stress, the admission limit, fail-fast failure handling
//! and cancellation. The Top-N accumulator boundary properties live here too.
//!
//! ```sh
//! cargo test --test dag_scheduler
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use eyre::bail;
use proptest::prelude::*;
use sqlvibe::sql::executor::{
    CancellationToken, Dag, DagError, DagExecutor, DagNode, NodeOutcome, QueryOp, TopN,
};

/// A → {B, C} → D
fn diamond() -> Dag<QueryOp> {
    let mut dag = Dag::new();
    let a = dag.add_node(QueryOp::scan("users"));
    let b = dag.add_node(QueryOp::project(&["id"]));
    let c = dag.add_node(QueryOp::project(&["name"]));
    let d = dag.add_node(QueryOp::hash_join("id"));
    dag.add_edge(a, b).unwrap();
    dag.add_edge(a, c).unwrap();
    dag.add_edge(b, d).unwrap();
    dag.add_edge(c, d).unwrap();
    dag
}

#[test]
fn diamond_join_runs_exactly_once_under_stress() {
    for iteration in 0..200 {
        let cores = 1 + iteration % 4;
        let exec = DagExecutor::new(
            diamond(),
            cores,
            |node: &DagNode<QueryOp>, inputs: &[Arc<u64>]| {
                // jitter so B and C finish in either order
                if node.id() == 1 || node.id() == 2 {
                    thread::yield_now();
                }
                Ok(inputs.iter().map(|v| **v).sum::<u64>() + 1)
            },
        );
        let outcome = exec.execute(&CancellationToken::new()).unwrap();
        assert_eq!(exec.scheduled_count(3), 1, "iteration {}", iteration);
        assert_eq!(exec.run_count(3), 1, "iteration {}", iteration);
        assert_eq!(**outcome.result(3).unwrap(), 5);
    }
}

#[test]
fn inputs_arrive_in_edge_order() {
    let exec = DagExecutor::new(diamond(), 4, |node: &DagNode<QueryOp>, inputs: &[Arc<String>]| {
        Ok(match node.op() {
            QueryOp::Scan(scan) => scan.table.clone(),
            QueryOp::Project(project) => project.columns.join(","),
            _ => inputs.iter().map(|s| s.as_str()).collect::<Vec<_>>().join("+"),
        })
    });
    let outcome = exec.execute(&CancellationToken::new()).unwrap();
    assert_eq!(outcome.result(3).unwrap().as_str(), "id+name");
}

#[test]
fn admission_limit_bounds_concurrency() {
    let mut dag = Dag::new();
    for i in 0..8 {
        dag.add_node(QueryOp::scan(format!("t{}", i)));
    }
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let (r, p) = (Arc::clone(&running), Arc::clone(&peak));
    let exec = DagExecutor::new(dag, 2, move |_: &DagNode<QueryOp>, _: &[Arc<()>]| {
        let now = r.fetch_add(1, Ordering::SeqCst) + 1;
        p.fetch_max(now, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(5));
        r.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    });
    exec.execute(&CancellationToken::new()).unwrap();
    assert!(peak.load(Ordering::SeqCst) <= 2);
    assert!(peak.load(Ordering::SeqCst) >= 1);
}

#[test]
fn failing_branch_cancels_the_join() {
    let exec = DagExecutor::new(diamond(), 2, |node: &DagNode<QueryOp>, _: &[Arc<()>]| {
        if node.id() == 2 {
            bail!("disk on fire");
        }
        Ok(())
    });
    let err = exec.execute(&CancellationToken::new()).unwrap_err();
    assert_eq!(
        err.downcast_ref::<DagError>(),
        Some(&DagError::NodeFailed {
            node: 2,
            name: "Project".to_string(),
            message: "disk on fire".to_string(),
        })
    );
    assert_eq!(exec.run_count(3), 0);
    assert_eq!(exec.run_count(0), 1);
}

#[test]
fn caller_cancellation_stops_waiting_nodes() {
    let mut dag = Dag::new();
    let slow = dag.add_node(QueryOp::scan("slow"));
    let after = dag.add_node(QueryOp::aggregate(&["COUNT"]));
    dag.add_edge(slow, after).unwrap();

    let token = CancellationToken::new();
    let trigger = token.clone();
    let exec = DagExecutor::new(dag, 1, move |node: &DagNode<QueryOp>, _: &[Arc<()>]| {
        if node.id() == 0 {
            trigger.cancel();
        }
        Ok(())
    });
    let err = exec.execute(&token).unwrap_err();
    assert_eq!(err.downcast_ref::<DagError>(), Some(&DagError::Cancelled));
    assert_eq!(exec.run_count(0), 1);
    assert_eq!(exec.run_count(1), 0);
}

#[test]
fn timeout_token_cancels() {
    let exec = DagExecutor::new(diamond(), 1, |_: &DagNode<QueryOp>, _: &[Arc<()>]| {
        thread::sleep(Duration::from_millis(20));
        Ok(())
    });
    let err = exec
        .execute(&CancellationToken::with_timeout(Duration::from_millis(1)))
        .unwrap_err();
    assert_eq!(err.downcast_ref::<DagError>(), Some(&DagError::Cancelled));
    assert_eq!(exec.run_count(3), 0);
}

#[test]
fn outcomes_are_inspectable() {
    let exec = DagExecutor::new(diamond(), 3, |node: &DagNode<QueryOp>, _: &[Arc<usize>]| {
        Ok(node.id() * 10)
    });
    let outcome = exec.execute(&CancellationToken::new()).unwrap();
    let done: Vec<usize> = outcome
        .iter()
        .filter_map(|(_, o)| match o {
            NodeOutcome::Done(v) => Some(**v),
            _ => None,
        })
        .collect();
    assert_eq!(done, vec![0, 10, 20, 30]);
}

proptest! {
    /// Up to capacity everything is kept; past it exactly the `n` best
    /// remain, best first.
    #[test]
    fn top_n_keeps_the_best(
        values in prop::collection::vec(-1000i64..1000, 0..200),
        n in 0usize..20,
    ) {
        let mut top = TopN::new(n, |a: &i64, b: &i64| a < b);
        for v in &values {
            top.push(*v);
        }
        prop_assert_eq!(top.len(), values.len().min(n));

        let mut expected = values.clone();
        expected.sort();
        expected.truncate(n);
        prop_assert_eq!(top.into_sorted_result(), expected);
    }
}
