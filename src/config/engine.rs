//! # Engine Settings
//!
//! `EngineConfig` is the resolved, validated form of the options collected by
//! `EngineBuilder`. Every field has a concrete value; optionality lives in the
//! builder only.

use super::{DEFAULT_DAG_CORES, DEFAULT_PLAN_CACHE_CAPACITY, MIN_DAG_CORES, MIN_PLAN_CACHE_CAPACITY};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Number of normalized statements the plan cache retains.
    pub plan_cache_capacity: usize,
    /// Admission limit of the DAG scheduler.
    pub dag_cores: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            plan_cache_capacity: DEFAULT_PLAN_CACHE_CAPACITY,
            dag_cores: host_parallelism(),
        }
    }
}

impl EngineConfig {
    /// Config for single-threaded embedding: one admission slot and a small
    /// cache.
    pub fn single_threaded() -> Self {
        Self {
            plan_cache_capacity: 64,
            dag_cores: MIN_DAG_CORES,
        }
    }

    /// Applies the floors documented in `constants`.
    pub fn normalized(self) -> Self {
        Self {
            plan_cache_capacity: self.plan_cache_capacity.max(MIN_PLAN_CACHE_CAPACITY),
            dag_cores: self.dag_cores.max(MIN_DAG_CORES),
        }
    }
}

pub(crate) fn host_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(DEFAULT_DAG_CORES)
}
