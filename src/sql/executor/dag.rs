//! # Operator Graph
//!
//! A plan expressed as a directed acyclic graph of operators. Acyclicity is a
//! construction rule, not a runtime check: node ids grow monotonically and an
//! edge must point from an older node to a newer one.
//!
//! ```text
//!   Scan(users)   Scan(orders)
//!        │             │
//!     Filter           │
//!         \           /
//!        HashJoin(user_id)
//!              │
//!           Project
//! ```
//!
//! Edge lists are stored on both ends. `inputs` keeps insertion order, which
//! is the order the scheduler hands input results to the handler.

use std::borrow::Cow;
use std::fmt;

use eyre::{bail, Result};
use smallvec::SmallVec;

use crate::sql::ast::Expr;

pub type NodeId = usize;

type EdgeList = SmallVec<[NodeId; 4]>;

/// A unit of work in the graph. The scheduler only needs a label.
pub trait Operator: Send + Sync {
    fn name(&self) -> Cow<'_, str>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanOp {
    pub table: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOp {
    pub predicate: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HashJoinOp {
    pub key: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectOp {
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateOp {
    pub functions: Vec<String>,
}

impl Operator for ScanOp {
    fn name(&self) -> Cow<'_, str> {
        Cow::Owned(format!("Scan({})", self.table))
    }
}

impl Operator for FilterOp {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed("Filter")
    }
}

impl Operator for HashJoinOp {
    fn name(&self) -> Cow<'_, str> {
        Cow::Owned(format!("HashJoin({})", self.key))
    }
}

impl Operator for ProjectOp {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed("Project")
    }
}

impl Operator for AggregateOp {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed("Aggregate")
    }
}

/// The provided operator set as one type, so a handler can `match` on it.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOp {
    Scan(ScanOp),
    Filter(FilterOp),
    HashJoin(HashJoinOp),
    Project(ProjectOp),
    Aggregate(AggregateOp),
}

impl Operator for QueryOp {
    fn name(&self) -> Cow<'_, str> {
        match self {
            QueryOp::Scan(op) => op.name(),
            QueryOp::Filter(op) => op.name(),
            QueryOp::HashJoin(op) => op.name(),
            QueryOp::Project(op) => op.name(),
            QueryOp::Aggregate(op) => op.name(),
        }
    }
}

impl QueryOp {
    pub fn scan(table: impl Into<String>) -> Self {
        QueryOp::Scan(ScanOp {
            table: table.into(),
        })
    }

    pub fn filter(predicate: Expr) -> Self {
        QueryOp::Filter(FilterOp { predicate })
    }

    pub fn hash_join(key: impl Into<String>) -> Self {
        QueryOp::HashJoin(HashJoinOp { key: key.into() })
    }

    pub fn project(columns: &[&str]) -> Self {
        QueryOp::Project(ProjectOp {
            columns: columns.iter().map(|c| c.to_string()).collect(),
        })
    }

    pub fn aggregate(functions: &[&str]) -> Self {
        QueryOp::Aggregate(AggregateOp {
            functions: functions.iter().map(|f| f.to_string()).collect(),
        })
    }
}

#[derive(Debug)]
pub struct DagNode<O> {
    id: NodeId,
    op: O,
    inputs: EdgeList,
    outputs: EdgeList,
}

impl<O> DagNode<O> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn op(&self) -> &O {
        &self.op
    }

    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[NodeId] {
        &self.outputs
    }
}

#[derive(Debug)]
pub struct Dag<O> {
    nodes: Vec<DagNode<O>>,
}

impl<O> Default for Dag<O> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

impl<O> Dag<O> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, op: O) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(DagNode {
            id,
            op,
            inputs: EdgeList::new(),
            outputs: EdgeList::new(),
        });
        id
    }

    /// `src` must complete before `dst` runs.
    pub fn add_edge(&mut self, src: NodeId, dst: NodeId) -> Result<()> {
        for id in [src, dst] {
            if id >= self.nodes.len() {
                bail!(DagError::UnknownNode(id));
            }
        }
        if src >= dst {
            bail!(DagError::NotAcyclic { src, dst });
        }
        self.nodes[src].outputs.push(dst);
        self.nodes[dst].inputs.push(src);
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Option<&DagNode<O>> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> &[DagNode<O>] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes with no inputs; the scheduler starts here.
    pub fn sources(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .filter(|n| n.inputs.is_empty())
            .map(|n| n.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DagError {
    /// The first handler failure of a run. A panic counts as a failure.
    NodeFailed {
        node: NodeId,
        name: String,
        message: String,
    },
    /// The caller's token fired before every node finished.
    Cancelled,
    NotAcyclic {
        src: NodeId,
        dst: NodeId,
    },
    UnknownNode(NodeId),
}

impl fmt::Display for DagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DagError::NodeFailed {
                node,
                name,
                message,
            } => write!(f, "node {} ({}) failed: {}", node, name, message),
            DagError::Cancelled => write!(f, "DAG execution cancelled"),
            DagError::NotAcyclic { src, dst } => write!(
                f,
                "edge {} -> {} must point from an older node to a newer one",
                src, dst
            ),
            DagError::UnknownNode(id) => write!(f, "unknown DAG node {}", id),
        }
    }
}

impl std::error::Error for DagError {}
