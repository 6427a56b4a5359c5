//! # Value Types
//!
//! Scalar values and column affinities shared by the parser, binder, optimizer
//! and window engine.
//!
//! | Type | Purpose |
//! |------|---------|
//! | `Value` | Owned scalar (NULL, INTEGER, REAL, TEXT, BLOB) |
//! | `DataType` | Storage class / declared affinity |

mod data_type;
mod value;

pub use data_type::DataType;
pub use value::{compare_values, pushdown_compare, Value};
pub(crate) use value::hex_encode;
