//! # DAG Scheduler
//!
//! Runs every node of a [`Dag`] through a handler, respecting data-flow
//! dependencies, with at most `cores` handlers running at once.
//!
//! ## Node Lifecycle
//!
//! ```text
//! Pending ──CAS──► Scheduled ──permit──► Running ──► Done
//!    │                 │                     │
//!    └─────────────────┴──► Cancelled        └──► Failed
//! ```
//!
//! - Source nodes are scheduled when `execute` starts.
//! - A finishing node checks each successor; a successor whose inputs are
//!   all Done is claimed with a compare-and-set on its state, so exactly one
//!   finisher spawns it no matter which input completes last.
//! - A node publishes its outcome before it flips to Done, then opens its
//!   completion latch for readers.
//!
//! ## Failure Policy
//!
//! Fail-fast. The first failure (an `Err` or a panic from the handler) is
//! recorded and trips the run's internal token. Nodes that are not Running
//! yet become Cancelled, in-flight handlers drain, and `execute` returns
//! `DagError::NodeFailed` for that first failure. A caller token that fires
//! before the run completes yields `DagError::Cancelled`.
//!
//! Blocking waits (admission and input latches) wake up every
//! `DAG_CANCEL_POLL_MS` to look at both tokens.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::Scope;
use std::time::Duration;

use eyre::Result;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use super::cancel::CancellationToken;
use super::dag::{Dag, DagError, DagNode, NodeId, Operator};
use crate::config::{DAG_CANCEL_POLL_MS, MIN_DAG_CORES};

const PENDING: u8 = 0;
const SCHEDULED: u8 = 1;
const RUNNING: u8 = 2;
const DONE: u8 = 3;
const FAILED: u8 = 4;
const CANCELLED: u8 = 5;

fn poll_interval() -> Duration {
    Duration::from_millis(DAG_CANCEL_POLL_MS)
}

#[derive(Debug)]
pub enum NodeOutcome<T> {
    Done(Arc<T>),
    Failed(String),
    Cancelled,
}

impl<T> NodeOutcome<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, NodeOutcome::Done(_))
    }

    pub fn value(&self) -> Option<&Arc<T>> {
        match self {
            NodeOutcome::Done(v) => Some(v),
            _ => None,
        }
    }
}

/// Per-node outcomes of a successful run, indexed by `NodeId`.
#[derive(Debug)]
pub struct DagOutcome<T> {
    outcomes: Vec<NodeOutcome<T>>,
}

impl<T> DagOutcome<T> {
    pub fn outcome(&self, node: NodeId) -> Option<&NodeOutcome<T>> {
        self.outcomes.get(node)
    }

    pub fn result(&self, node: NodeId) -> Option<&Arc<T>> {
        self.outcome(node).and_then(NodeOutcome::value)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &NodeOutcome<T>)> {
        self.outcomes.iter().enumerate()
    }
}

/// Counting semaphore bounding the number of Running handlers.
struct Admission {
    free: Mutex<usize>,
    cv: Condvar,
}

impl Admission {
    fn new(permits: usize) -> Self {
        Self {
            free: Mutex::new(permits),
            cv: Condvar::new(),
        }
    }

    /// `false` when `stop` fired while waiting.
    fn acquire(&self, stop: &dyn Fn() -> bool) -> bool {
        let mut free = self.free.lock();
        while *free == 0 {
            if stop() {
                return false;
            }
            self.cv.wait_for(&mut free, poll_interval());
        }
        if stop() {
            return false;
        }
        *free -= 1;
        true
    }

    fn release(&self) {
        *self.free.lock() += 1;
        self.cv.notify_one();
    }
}

/// One-shot completion signal of a node.
struct Latch {
    open: Mutex<bool>,
    cv: Condvar,
}

impl Latch {
    fn new() -> Self {
        Self {
            open: Mutex::new(false),
            cv: Condvar::new(),
        }
    }

    fn open(&self) {
        *self.open.lock() = true;
        self.cv.notify_all();
    }

    fn wait(&self, stop: &dyn Fn() -> bool) -> bool {
        let mut open = self.open.lock();
        while !*open {
            if stop() {
                return false;
            }
            self.cv.wait_for(&mut open, poll_interval());
        }
        true
    }
}

/// Mutable state of one `execute` call.
struct Run<'e, T> {
    external: &'e CancellationToken,
    internal: CancellationToken,
    states: Vec<AtomicU8>,
    outcomes: Vec<OnceLock<NodeOutcome<T>>>,
    latches: Vec<Latch>,
    admission: Admission,
    first_failure: Mutex<Option<DagError>>,
}

impl<T> Run<'_, T> {
    fn should_stop(&self) -> bool {
        self.internal.is_cancelled() || self.external.is_cancelled()
    }

    fn claim(&self, node: NodeId) -> bool {
        self.states[node]
            .compare_exchange(PENDING, SCHEDULED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    fn finish(&self, node: NodeId, outcome: NodeOutcome<T>, state: u8) {
        // the first writer wins; a node is finished at most once
        let _ = self.outcomes[node].set(outcome);
        self.states[node].store(state, Ordering::SeqCst);
        self.latches[node].open();
    }

    fn is_done(&self, node: NodeId) -> bool {
        self.states[node].load(Ordering::SeqCst) == DONE
    }
}

type Handler<O, T> = dyn Fn(&DagNode<O>, &[Arc<T>]) -> Result<T> + Send + Sync;

pub struct DagExecutor<O, T> {
    dag: Dag<O>,
    cores: usize,
    handler: Box<Handler<O, T>>,
    scheduled: Vec<AtomicUsize>,
    runs: Vec<AtomicUsize>,
}

impl<O, T> DagExecutor<O, T>
where
    O: Operator,
    T: Send + Sync,
{
    /// `cores` below one is raised to one.
    pub fn new<H>(dag: Dag<O>, cores: usize, handler: H) -> Self
    where
        H: Fn(&DagNode<O>, &[Arc<T>]) -> Result<T> + Send + Sync + 'static,
    {
        let n = dag.len();
        Self {
            dag,
            cores: cores.max(MIN_DAG_CORES),
            handler: Box::new(handler),
            scheduled: (0..n).map(|_| AtomicUsize::new(0)).collect(),
            runs: (0..n).map(|_| AtomicUsize::new(0)).collect(),
        }
    }

    pub fn cores(&self) -> usize {
        self.cores
    }

    pub fn dag(&self) -> &Dag<O> {
        &self.dag
    }

    /// Times `node` won the scheduling CAS, summed over all runs.
    pub fn scheduled_count(&self, node: NodeId) -> usize {
        self.scheduled
            .get(node)
            .map_or(0, |c| c.load(Ordering::Acquire))
    }

    /// Times the handler was invoked for `node`, summed over all runs.
    pub fn run_count(&self, node: NodeId) -> usize {
        self.runs.get(node).map_or(0, |c| c.load(Ordering::Acquire))
    }

    pub fn execute(&self, cancel: &CancellationToken) -> Result<DagOutcome<T>> {
        let n = self.dag.len();
        let run = Run {
            external: cancel,
            internal: CancellationToken::new(),
            states: (0..n).map(|_| AtomicU8::new(PENDING)).collect(),
            outcomes: (0..n).map(|_| OnceLock::new()).collect(),
            latches: (0..n).map(|_| Latch::new()).collect(),
            admission: Admission::new(self.cores),
            first_failure: Mutex::new(None),
        };
        debug!(nodes = n, cores = self.cores, "executing DAG");

        std::thread::scope(|scope| {
            for source in self.dag.sources() {
                self.schedule(scope, &run, source);
            }
        });

        if let Some(err) = run.first_failure.lock().take() {
            return Err(err.into());
        }

        let mut outcomes = Vec::with_capacity(n);
        let mut complete = true;
        for cell in run.outcomes {
            let outcome = cell.into_inner().unwrap_or(NodeOutcome::Cancelled);
            complete &= outcome.is_done();
            outcomes.push(outcome);
        }
        if !complete {
            warn!(nodes = n, "DAG execution cancelled");
            return Err(DagError::Cancelled.into());
        }
        Ok(DagOutcome { outcomes })
    }

    fn schedule<'s, 'env, 'r>(
        &'s self,
        scope: &'s Scope<'s, 'env>,
        run: &'s Run<'r, T>,
        node: NodeId,
    ) {
        if !run.claim(node) {
            return;
        }
        self.scheduled[node].fetch_add(1, Ordering::AcqRel);
        scope.spawn(move || self.run_node(scope, run, node));
    }

    fn run_node<'s, 'env, 'r>(
        &'s self,
        scope: &'s Scope<'s, 'env>,
        run: &'s Run<'r, T>,
        node: NodeId,
    ) {
        let Some(dag_node) = self.dag.node(node) else {
            return;
        };
        let name = dag_node.op().name();
        let stop = || run.should_stop();

        let mut inputs = Vec::with_capacity(dag_node.inputs().len());
        for &input in dag_node.inputs() {
            let value = run.latches[input]
                .wait(&stop)
                .then(|| run.outcomes[input].get().and_then(NodeOutcome::value))
                .flatten();
            match value {
                Some(v) => inputs.push(Arc::clone(v)),
                None => {
                    run.finish(node, NodeOutcome::Cancelled, CANCELLED);
                    return;
                }
            }
        }

        if !run.admission.acquire(&stop) {
            run.finish(node, NodeOutcome::Cancelled, CANCELLED);
            return;
        }
        if run.states[node]
            .compare_exchange(SCHEDULED, RUNNING, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            run.admission.release();
            return;
        }
        self.runs[node].fetch_add(1, Ordering::AcqRel);
        debug!(node, name = %name, "DAG node started");

        let result = catch_unwind(AssertUnwindSafe(|| (self.handler)(dag_node, &inputs)));
        run.admission.release();

        let message = match result {
            Ok(Ok(value)) => {
                run.finish(node, NodeOutcome::Done(Arc::new(value)), DONE);
                debug!(node, name = %name, "DAG node finished");
                if !run.should_stop() {
                    for &next in dag_node.outputs() {
                        let ready = self
                            .dag
                            .node(next)
                            .is_some_and(|n| n.inputs().iter().all(|&i| run.is_done(i)));
                        if ready {
                            self.schedule(scope, run, next);
                        }
                    }
                }
                return;
            }
            Ok(Err(err)) => format!("{:#}", err),
            Err(panic) => panic_message(panic.as_ref()),
        };

        warn!(node, name = %name, error = %message, "DAG node failed");
        {
            let mut first = run.first_failure.lock();
            if first.is_none() {
                *first = Some(DagError::NodeFailed {
                    node,
                    name: name.to_string(),
                    message: message.clone(),
                });
            }
        }
        run.internal.cancel();
        run.finish(node, NodeOutcome::Failed(message), FAILED);
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}
