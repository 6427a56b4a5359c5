//! # Engine Facade
//!
//! `Engine` wires the pipeline together for an embedding database:
//!
//! ```text
//! sql ──prepare──► Arc<Statement> ──bind──► Statement
//!                        │
//!                        └──plan_select──► SelectPlan
//!
//! RowSet + WindowFuncExpr ──window──► Vec<Value>
//! Dag<O> + handler ──executor──► DagExecutor (configured cores)
//! ```
//!
//! The plan cache and the function registry are injected through
//! [`EngineBuilder`]; nothing here is a process-wide singleton.
//!
//! ## Caching Rule
//!
//! The cache key replaces literals with `?`, so two statements that differ
//! only in literal values share one entry. `prepare` therefore caches only
//! statements whose values all arrive through placeholders. Literal-bearing
//! SQL is parsed fresh every time.
//!
//! ## Example
//!
//! ```ignore
//! use sqlvibe::Engine;
//!
//! let engine = Engine::builder().plan_cache_capacity(256).build();
//! let stmt = engine.prepare("SELECT name FROM users WHERE id = ?")?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use eyre::{Result, WrapErr};

use crate::config::{host_parallelism, EngineConfig, DEFAULT_PLAN_CACHE_CAPACITY};
use crate::sql::ast::{Statement, WindowFuncExpr};
use crate::sql::binder::bind;
use crate::sql::executor::{Dag, DagExecutor, DagNode, Operator};
use crate::sql::functions::{BuiltinFunctions, FunctionRegistry};
use crate::sql::optimizer::{Optimizer, SelectPlan};
use crate::sql::parser::ParseError;
use crate::sql::plan_cache::PlanCache;
use crate::sql::window::{compute_window, RowSet, WindowContext};
use crate::types::Value;

pub struct Engine {
    plan_cache: Arc<PlanCache>,
    functions: Arc<dyn FunctionRegistry>,
    optimizer: Optimizer,
    config: EngineConfig,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    pub fn plan_cache(&self) -> &Arc<PlanCache> {
        &self.plan_cache
    }

    pub fn functions(&self) -> &Arc<dyn FunctionRegistry> {
        &self.functions
    }

    pub fn prepare(&self, sql: &str) -> Result<Arc<Statement>> {
        self.plan_cache
            .get_or_parse(sql)
            .wrap_err("failed to prepare statement")
    }

    /// Prepares `sql` and returns a copy with every placeholder filled in.
    pub fn bind(
        &self,
        sql: &str,
        positional: &[Value],
        named: &HashMap<String, Value>,
    ) -> Result<Statement> {
        let stmt = self.prepare(sql)?;
        bind(&stmt, positional, named).wrap_err("failed to bind parameters")
    }

    pub fn plan_select(&self, sql: &str, available_columns: &[String]) -> Result<SelectPlan> {
        let stmt = self.prepare(sql)?;
        match stmt.as_select() {
            Some(select) => Ok(self.optimizer.plan(select, available_columns)),
            None => Err(eyre::Report::new(ParseError::Unsupported {
                feature: format!("planning {} statements", stmt.kind_name()),
                line: 1,
                column: 1,
            })),
        }
    }

    /// Window values evaluated with this engine's function registry.
    pub fn window(&self, rows: &RowSet, wf: &WindowFuncExpr) -> Vec<Value> {
        compute_window(rows, wf, &WindowContext::new(self.functions.as_ref()))
    }

    pub fn executor<O, T, H>(&self, dag: Dag<O>, handler: H) -> DagExecutor<O, T>
    where
        O: Operator,
        T: Send + Sync,
        H: Fn(&DagNode<O>, &[Arc<T>]) -> Result<T> + Send + Sync + 'static,
    {
        DagExecutor::new(dag, self.config.dag_cores, handler)
    }
}

impl Default for Engine {
    fn default() -> Self {
        EngineBuilder::new().build()
    }
}

/// Unset options fall back to [`EngineConfig::default`] values.
pub struct EngineBuilder {
    plan_cache_capacity: Option<usize>,
    dag_cores: Option<usize>,
    functions: Option<Arc<dyn FunctionRegistry>>,
    plan_cache: Option<Arc<PlanCache>>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            plan_cache_capacity: None,
            dag_cores: None,
            functions: None,
            plan_cache: None,
        }
    }

    pub fn plan_cache_capacity(mut self, capacity: usize) -> Self {
        self.plan_cache_capacity = Some(capacity);
        self
    }

    pub fn dag_cores(mut self, cores: usize) -> Self {
        self.dag_cores = Some(cores);
        self
    }

    pub fn function_registry(mut self, functions: Arc<dyn FunctionRegistry>) -> Self {
        self.functions = Some(functions);
        self
    }

    /// Shares an existing cache between engines. Overrides
    /// `plan_cache_capacity`.
    pub fn plan_cache(mut self, cache: Arc<PlanCache>) -> Self {
        self.plan_cache = Some(cache);
        self
    }

    pub fn build(self) -> Engine {
        let config = EngineConfig {
            plan_cache_capacity: self
                .plan_cache
                .as_ref()
                .map(|c| c.capacity())
                .or(self.plan_cache_capacity)
                .unwrap_or(DEFAULT_PLAN_CACHE_CAPACITY),
            dag_cores: self.dag_cores.unwrap_or_else(host_parallelism),
        }
        .normalized();

        let plan_cache = self
            .plan_cache
            .unwrap_or_else(|| Arc::new(PlanCache::new(config.plan_cache_capacity)));
        let functions = self
            .functions
            .unwrap_or_else(|| Arc::new(BuiltinFunctions));

        tracing::debug!(
            plan_cache_capacity = config.plan_cache_capacity,
            dag_cores = config.dag_cores,
            "engine built"
        );

        Engine {
            plan_cache,
            functions,
            optimizer: Optimizer::new(),
            config,
        }
    }
}
