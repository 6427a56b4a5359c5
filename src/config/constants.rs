//! # Core Configuration Constants
//!
//! Every tunable number used by the compilation pipeline and the scheduler
//! lives here. Values that depend on each other sit in the same section and
//! their relationship is enforced with a compile-time assertion.
//!
//! ## Dependency Graph
//!
//! ```text
//! DEFAULT_PLAN_CACHE_CAPACITY (1000)
//!       │
//!       └─> MIN_PLAN_CACHE_CAPACITY (1, must be <=)
//!             A zero-capacity cache would evict on every insert and turn
//!             get_or_parse into a plain parse with extra locking.
//!
//! SKIP_SCAN_CARDINALITY_RATIO (10)
//! SKIP_SCAN_ABSOLUTE_THRESHOLD (100)
//!       │
//!       └─> can_skip_scan: leading cardinality must be below
//!           min(row_count / RATIO, THRESHOLD)
//!
//! MIN_DAG_CORES (1)
//!       │
//!       └─> DEFAULT_DAG_CORES (>= MIN_DAG_CORES)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use sqlvibe::config::{DEFAULT_PLAN_CACHE_CAPACITY, MIN_DAG_CORES};
//! ```

// ============================================================================
// PLAN CACHE
// ============================================================================

/// Number of normalized statements kept by a plan cache built with default
/// settings.
pub const DEFAULT_PLAN_CACHE_CAPACITY: usize = 1000;

/// Smallest capacity a plan cache accepts; smaller requests are raised to it.
pub const MIN_PLAN_CACHE_CAPACITY: usize = 1;

const _: () = assert!(
    MIN_PLAN_CACHE_CAPACITY <= DEFAULT_PLAN_CACHE_CAPACITY,
    "MIN_PLAN_CACHE_CAPACITY must not exceed DEFAULT_PLAN_CACHE_CAPACITY"
);

const _: () = assert!(MIN_PLAN_CACHE_CAPACITY > 0, "plan cache needs at least one slot");

// ============================================================================
// OPTIMIZER HEURISTICS
// ============================================================================

/// A skip scan pays off when the leading index column has fewer distinct
/// values than `row_count / SKIP_SCAN_CARDINALITY_RATIO`.
pub const SKIP_SCAN_CARDINALITY_RATIO: usize = 10;

/// Absolute ceiling on the leading-column cardinality for a skip scan.
pub const SKIP_SCAN_ABSOLUTE_THRESHOLD: usize = 100;

const _: () = assert!(SKIP_SCAN_CARDINALITY_RATIO > 0, "ratio is a divisor");

// ============================================================================
// DAG SCHEDULER
// ============================================================================

/// Floor for the admission gate. A request for zero cores is raised to this.
pub const MIN_DAG_CORES: usize = 1;

/// Fallback when the host parallelism cannot be queried.
pub const DEFAULT_DAG_CORES: usize = 4;

const _: () = assert!(
    DEFAULT_DAG_CORES >= MIN_DAG_CORES,
    "DEFAULT_DAG_CORES must be >= MIN_DAG_CORES"
);

/// Upper bound on how long a blocked scheduler thread sleeps before it
/// re-checks its cancellation token.
pub const DAG_CANCEL_POLL_MS: u64 = 5;

// ============================================================================
// WINDOW FUNCTIONS
// ============================================================================

/// Offset used by LAG/LEAD when the second argument is absent.
pub const DEFAULT_LAG_LEAD_OFFSET: i64 = 1;

/// Joins the evaluated PARTITION BY expressions into a single group key.
pub const PARTITION_KEY_SEPARATOR: &str = "|";

// ============================================================================
// PARSER LIMITS
// ============================================================================

/// Maximum nesting depth of expressions and subqueries. Guards the recursive
/// descent against stack exhaustion on hostile input. Sized so a debug build
/// stays inside a default 2 MiB thread stack, which is what test threads and
/// DAG handler threads get.
pub const MAX_EXPR_DEPTH: usize = 100;

/// Depth charged for one nested SELECT. A SELECT level costs several times the
/// stack of one parenthesized expression.
pub const SELECT_DEPTH_COST: usize = 4;

const _: () = assert!(MAX_EXPR_DEPTH >= 64, "MAX_EXPR_DEPTH too small for real queries");
const _: () = assert!(
    MAX_EXPR_DEPTH / (SELECT_DEPTH_COST + 1) >= 16,
    "subquery nesting limit too small for real queries"
);
