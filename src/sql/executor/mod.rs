//! # Plan Execution
//!
//! Execution-side building blocks that sit below the optimizer:
//!
//! - `dag`: the operator graph and the provided operator set
//! - `scheduler`: dependency-aware, bounded-parallel execution of a graph
//! - `cancel`: cooperative cancellation and timeouts
//! - `topn`: bounded accumulator for `ORDER BY ... LIMIT n`
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sqlvibe::sql::executor::{CancellationToken, Dag, DagExecutor, QueryOp};
//!
//! let mut dag = Dag::new();
//! let scan = dag.add_node(QueryOp::scan("users"));
//! let project = dag.add_node(QueryOp::project(&["id"]));
//! dag.add_edge(scan, project)?;
//!
//! let exec = DagExecutor::new(dag, 4, |node, inputs: &[Arc<usize>]| {
//!     Ok(inputs.len() + node.id())
//! });
//! let outcome = exec.execute(&CancellationToken::new())?;
//! ```

mod cancel;
mod dag;
mod scheduler;
mod topn;

pub use cancel::CancellationToken;
pub use dag::{
    AggregateOp, Dag, DagError, DagNode, FilterOp, HashJoinOp, NodeId, Operator, ProjectOp,
    QueryOp, ScanOp,
};
pub use scheduler::{DagExecutor, DagOutcome, NodeOutcome};
pub use topn::TopN;
