//! # SQL Processing Module
//!
//! The compilation pipeline from SQL text to an evaluation plan, plus the
//! window engine and the operator scheduler that run what the plan describes.
//!
//! ## Module Structure
//!
//! - `token`: token and keyword definitions
//! - `lexer`: zero-copy SQL tokenizer
//! - `parser`: recursive descent parser producing the `ast`
//! - `normalize`: literal-insensitive statement keys
//! - `plan_cache`: bounded LRU of parsed statements
//! - `binder`: placeholder substitution
//! - `analysis`: read-only facts about a parsed tree
//! - `optimizer`: plan-shape classification and rewrite rules
//! - `window`: window function evaluation over materialized rows
//! - `executor`: operator DAG scheduler and Top-N accumulator
//! - `functions`: the scalar function registry
//!
//! ## Pipeline
//!
//! ```text
//! text ─► tokenize ─► parse ─► Statement ─► bind ─► analysis ─► optimizer
//!                       ▲                                          │
//!                   plan_cache                                 SelectPlan
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use sqlvibe::sql::{parse, Statement};
//!
//! let stmt = parse("SELECT id, name FROM users WHERE active = 1")?;
//! assert!(matches!(stmt, Statement::Select(_)));
//! ```

pub mod analysis;
pub mod ast;
pub mod binder;
pub mod executor;
pub mod functions;
pub mod lexer;
pub mod normalize;
pub mod optimizer;
pub mod parser;
pub mod plan_cache;
pub mod token;
pub mod window;

pub use ast::*;
pub use binder::{bind, params, BindValue, MissingParamError};
pub use lexer::{tokenize, LexError, Lexer};
pub use normalize::normalize;
pub use parser::{parse, parse_all, ParseError, Parser};
pub use plan_cache::PlanCache;
pub use token::{Keyword, Span, SpannedToken, Token, TokenKind};
