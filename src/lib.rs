//! # sqlvibe - SQL Compilation and Scheduling Core
//!
//! The query front half of an embedded, SQLite-compatible engine: it turns
//! SQL text into a typed AST, derives the facts a planner needs, picks a
//! plan shape, evaluates window functions over materialized rows and
//! schedules operator graphs across a bounded number of threads.
//!
//! ## Quick Start
//!
//! ```ignore
//! use sqlvibe::Engine;
//!
//! let engine = Engine::builder().plan_cache_capacity(256).build();
//! let plan = engine.plan_select(
//!     "SELECT a, b FROM t WHERE id = 1 AND name = 'x'",
//!     &["a".into(), "b".into(), "id".into(), "name".into()],
//! )?;
//! assert_eq!(plan.pushable.len(), 2);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              Engine facade              │
//! ├─────────────────────────────────────────┤
//! │  Lexer ─► Parser ─► Binder ─► Analysis  │
//! │              │                   │      │
//! │         Plan cache           Optimizer  │
//! ├─────────────────────────────────────────┤
//! │  Window engine   │   DAG scheduler      │
//! ├─────────────────────────────────────────┤
//! │  FunctionRegistry │ KeyValueStore       │
//! └─────────────────────────────────────────┘
//! ```
//!
//! Storage and extension functions are collaborators reached through traits;
//! this crate holds no page layout, WAL or transaction machinery.
//!
//! ## Module Overview
//!
//! - [`sql`]: lexer, parser, binder, analysis, optimizer, window engine,
//!   DAG scheduler
//! - [`types`]: the runtime value model
//! - [`storage`]: the key-value collaborator trait and an in-memory store
//! - [`config`]: constants and resolved engine settings
//! - [`engine`]: the facade tying the pipeline together

pub mod config;
pub mod engine;
pub mod sql;
pub mod storage;
pub mod types;

pub use config::EngineConfig;
pub use engine::{Engine, EngineBuilder};
pub use sql::{parse, Statement};
pub use types::{DataType, Value};
