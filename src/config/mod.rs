//! # Configuration Module
//!
//! Centralizes the numeric constants of the core and the runtime
//! `EngineConfig` assembled by [`EngineBuilder`](crate::engine::EngineBuilder).
//!
//! ## Module Organization
//!
//! - [`constants`]: compile-time values with dependency documentation
//! - [`engine`]: `EngineConfig`, the resolved runtime settings

pub mod constants;
pub mod engine;

pub use constants::*;
pub use engine::EngineConfig;
pub(crate) use engine::host_parallelism;
