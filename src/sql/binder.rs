//! # Parameter Binding
//!
//! Replaces placeholders in a parsed statement with literal values. The input
//! tree is never touched: `bind` clones it and rewrites the clone, so a tree
//! shared out of the plan cache stays reusable.
//!
//! ## Placeholder Forms
//!
//! | Form | Resolved against |
//! |------|------------------|
//! | `?` | positional parameter N, where N counts the `?` marks read so far |
//! | `?NNN` | positional parameter NNN, 1-based; not counted by `?` |
//! | `:name`, `@name`, `$name` | `named["name"]`, then `named[":name"]` |
//!
//! The parser numbers every `?` as it reads it, so the pairing follows the
//! SQL text even where the tree stores clauses in another order
//! (`LIMIT offset, count`, `OFFSET .. FETCH`, ORDER BY and LIMIT lifted off
//! the last compound operand).
//!
//! Surplus positional parameters are ignored. A placeholder without a value
//! fails the whole bind with [`MissingParamError`].
//!
//! ## Value Coercion
//!
//! Host values reach the binder through [`BindValue`]:
//!
//! ```text
//! i8..i64, u8..u32, isize   -> Value::Int
//! u64, usize > i64::MAX     -> Value::Text (decimal)
//! f32, f64                  -> Value::Float
//! bool                      -> Value::Int(0 | 1)
//! &[u8], Vec<u8>            -> Value::Blob
//! &str, String              -> Value::Text
//! None                      -> Value::Null
//! BindValue::display(x)     -> Value::Text(x.to_string())
//! ```

use std::collections::HashMap;
use std::fmt;

use eyre::Result;

use super::ast::*;
use crate::types::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingParamError {
    /// 1-based index of the parameter that was not supplied.
    Positional { index: usize },
    Named { name: String },
}

impl fmt::Display for MissingParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingParamError::Positional { index } => {
                write!(f, "missing parameter: no value for positional parameter {}", index)
            }
            MissingParamError::Named { name } => {
                write!(f, "missing parameter: no value for named parameter '{}'", name)
            }
        }
    }
}

impl std::error::Error for MissingParamError {}

/// A host value converted to a SQL value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BindValue(Value);

impl BindValue {
    /// Binds any `Display` type as its text form.
    pub fn display<T: fmt::Display + ?Sized>(value: &T) -> Self {
        BindValue(Value::Text(value.to_string()))
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<BindValue> for Value {
    fn from(v: BindValue) -> Self {
        v.0
    }
}

impl From<Value> for BindValue {
    fn from(v: Value) -> Self {
        BindValue(v)
    }
}

macro_rules! bind_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for BindValue {
            fn from(v: $t) -> Self {
                BindValue(Value::Int(v as i64))
            }
        })*
    };
}

bind_signed!(i8, i16, i32, i64, isize, u8, u16, u32);

macro_rules! bind_wide_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for BindValue {
            fn from(v: $t) -> Self {
                match i64::try_from(v) {
                    Ok(i) => BindValue(Value::Int(i)),
                    Err(_) => BindValue(Value::Text(v.to_string())),
                }
            }
        })*
    };
}

bind_wide_unsigned!(u64, usize);

impl From<f32> for BindValue {
    fn from(v: f32) -> Self {
        BindValue(Value::Float(v as f64))
    }
}

impl From<f64> for BindValue {
    fn from(v: f64) -> Self {
        BindValue(Value::Float(v))
    }
}

impl From<bool> for BindValue {
    fn from(v: bool) -> Self {
        BindValue(Value::Int(v as i64))
    }
}

impl From<&str> for BindValue {
    fn from(v: &str) -> Self {
        BindValue(Value::Text(v.to_string()))
    }
}

impl From<String> for BindValue {
    fn from(v: String) -> Self {
        BindValue(Value::Text(v))
    }
}

impl From<&String> for BindValue {
    fn from(v: &String) -> Self {
        BindValue(Value::Text(v.clone()))
    }
}

impl From<&[u8]> for BindValue {
    fn from(v: &[u8]) -> Self {
        BindValue(Value::Blob(v.to_vec()))
    }
}

impl From<Vec<u8>> for BindValue {
    fn from(v: Vec<u8>) -> Self {
        BindValue(Value::Blob(v))
    }
}

impl<T: Into<BindValue>> From<Option<T>> for BindValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => BindValue(Value::Null),
        }
    }
}

/// Converts a list of host values into positional parameters.
pub fn params<I, T>(values: I) -> Vec<Value>
where
    I: IntoIterator<Item = T>,
    T: Into<BindValue>,
{
    values.into_iter().map(|v| v.into().into_value()).collect()
}

/// Returns a copy of `stmt` with every placeholder replaced by a literal.
pub fn bind(
    stmt: &Statement,
    positional: &[Value],
    named: &HashMap<String, Value>,
) -> Result<Statement> {
    let mut bound = stmt.clone();
    let binder = Binder { positional, named };
    binder.statement(&mut bound)?;
    Ok(bound)
}

struct Binder<'p> {
    positional: &'p [Value],
    named: &'p HashMap<String, Value>,
}

impl Binder<'_> {
    fn resolve(&self, placeholder: &Placeholder) -> Result<Value> {
        match placeholder {
            Placeholder::Positional(n) | Placeholder::Numbered(n) => {
                self.positional_at(*n as usize)
            }
            Placeholder::Named(raw) => {
                let key = raw.trim_start_matches([':', '@', '$']);
                self.named
                    .get(key)
                    .or_else(|| self.named.get(raw.as_str()))
                    .cloned()
                    .ok_or_else(|| {
                        eyre::Report::new(MissingParamError::Named {
                            name: key.to_string(),
                        })
                    })
            }
        }
    }

    fn positional_at(&self, index: usize) -> Result<Value> {
        index
            .checked_sub(1)
            .and_then(|i| self.positional.get(i))
            .cloned()
            .ok_or_else(|| eyre::Report::new(MissingParamError::Positional { index }))
    }

    fn statement(&self, stmt: &mut Statement) -> Result<()> {
        match stmt {
            Statement::Select(s) => self.select(s),
            Statement::Insert(i) => self.insert(i),
            Statement::Update(u) => self.update(u),
            Statement::Delete(d) => self.delete(d),
            Statement::Explain(e) => self.statement(&mut e.statement),
            Statement::CreateView(v) => self.select(&mut v.query),
            Statement::Pragma(p) => self.opt_expr(&mut p.value),
            _ => Ok(()),
        }
    }

    fn ctes(&self, ctes: &mut [Cte]) -> Result<()> {
        for cte in ctes {
            self.select(&mut cte.query)?;
        }
        Ok(())
    }

    fn select(&self, select: &mut SelectStmt) -> Result<()> {
        self.ctes(&mut select.ctes)?;
        self.exprs(&mut select.columns)?;
        if let Some(from) = &mut select.from {
            self.from(from)?;
        }
        self.opt_expr(&mut select.where_clause)?;
        self.exprs(&mut select.group_by)?;
        self.opt_expr(&mut select.having)?;
        for window in &mut select.windows {
            self.window_spec(&mut window.spec)?;
        }
        self.order_by(&mut select.order_by)?;
        self.opt_expr(&mut select.limit)?;
        self.opt_expr(&mut select.offset)?;
        if let Some(compound) = &mut select.compound {
            self.select(&mut compound.right)?;
        }
        Ok(())
    }

    fn from(&self, from: &mut FromClause) -> Result<()> {
        self.table_source(&mut from.source)?;
        for join in &mut from.joins {
            self.table_source(&mut join.source)?;
            if let JoinCondition::On(cond) = &mut join.condition {
                self.expr(cond)?;
            }
        }
        Ok(())
    }

    fn table_source(&self, source: &mut TableSource) -> Result<()> {
        match source {
            TableSource::Table { .. } => Ok(()),
            TableSource::Subquery { query, .. } => self.select(query),
            TableSource::Function { args, .. } => self.exprs(args),
            TableSource::Values { rows, .. } => {
                for row in rows {
                    self.exprs(row)?;
                }
                Ok(())
            }
        }
    }

    fn insert(&self, insert: &mut InsertStmt) -> Result<()> {
        self.ctes(&mut insert.ctes)?;
        match &mut insert.source {
            InsertSource::Values(rows) => {
                for row in rows {
                    self.exprs(row)?;
                }
            }
            InsertSource::Select(query) => self.select(query)?,
            InsertSource::DefaultValues => {}
        }
        if let Some(conflict) = &mut insert.on_conflict {
            self.opt_expr(&mut conflict.target_where)?;
            if let OnConflictAction::DoUpdate {
                assignments,
                where_clause,
            } = &mut conflict.action
            {
                self.assignments(assignments)?;
                self.opt_expr(where_clause)?;
            }
        }
        self.exprs(&mut insert.returning)
    }

    fn update(&self, update: &mut UpdateStmt) -> Result<()> {
        self.ctes(&mut update.ctes)?;
        self.assignments(&mut update.assignments)?;
        if let Some(from) = &mut update.from {
            self.from(from)?;
        }
        self.opt_expr(&mut update.where_clause)?;
        self.exprs(&mut update.returning)?;
        self.order_by(&mut update.order_by)?;
        self.opt_expr(&mut update.limit)?;
        self.opt_expr(&mut update.offset)
    }

    fn delete(&self, delete: &mut DeleteStmt) -> Result<()> {
        self.ctes(&mut delete.ctes)?;
        self.opt_expr(&mut delete.where_clause)?;
        self.exprs(&mut delete.returning)?;
        self.order_by(&mut delete.order_by)?;
        self.opt_expr(&mut delete.limit)?;
        self.opt_expr(&mut delete.offset)
    }

    fn assignments(&self, assignments: &mut [Assignment]) -> Result<()> {
        for assignment in assignments {
            self.expr(&mut assignment.value)?;
        }
        Ok(())
    }

    fn order_by(&self, items: &mut [OrderByItem]) -> Result<()> {
        for item in items {
            self.expr(&mut item.expr)?;
        }
        Ok(())
    }

    fn window_spec(&self, spec: &mut WindowSpec) -> Result<()> {
        self.exprs(&mut spec.partition_by)?;
        self.order_by(&mut spec.order_by)?;
        self.frame(&mut spec.frame)
    }

    fn frame(&self, frame: &mut Option<WindowFrame>) -> Result<()> {
        let Some(frame) = frame else {
            return Ok(());
        };
        self.frame_bound(&mut frame.start)?;
        if let Some(end) = &mut frame.end {
            self.frame_bound(end)?;
        }
        Ok(())
    }

    fn frame_bound(&self, bound: &mut WindowFrameBound) -> Result<()> {
        match bound {
            WindowFrameBound::Preceding(e) | WindowFrameBound::Following(e) => self.expr(e),
            _ => Ok(()),
        }
    }

    fn exprs(&self, exprs: &mut [Expr]) -> Result<()> {
        for expr in exprs {
            self.expr(expr)?;
        }
        Ok(())
    }

    fn opt_expr(&self, expr: &mut Option<Expr>) -> Result<()> {
        match expr {
            Some(e) => self.expr(e),
            None => Ok(()),
        }
    }

    fn expr(&self, expr: &mut Expr) -> Result<()> {
        match expr {
            Expr::Placeholder(p) => {
                let value = self.resolve(p)?;
                *expr = Expr::Literal(value);
                Ok(())
            }
            Expr::Literal(_) | Expr::ColumnRef(_) => Ok(()),
            Expr::Binary { left, right, .. } => {
                self.expr(left)?;
                self.expr(right)
            }
            Expr::Unary { expr, .. }
            | Expr::Alias { expr, .. }
            | Expr::Cast { expr, .. }
            | Expr::Collate { expr, .. } => self.expr(expr),
            Expr::FuncCall(call) => {
                self.exprs(&mut call.args)?;
                match &mut call.filter {
                    Some(filter) => self.expr(filter),
                    None => Ok(()),
                }
            }
            Expr::Case {
                operand,
                conditions,
                else_result,
            } => {
                if let Some(operand) = operand {
                    self.expr(operand)?;
                }
                for when in conditions {
                    self.expr(&mut when.condition)?;
                    self.expr(&mut when.result)?;
                }
                match else_result {
                    Some(e) => self.expr(e),
                    None => Ok(()),
                }
            }
            Expr::Subquery(query) => self.select(query),
            Expr::AnyAll { left, subquery, .. } => {
                self.expr(left)?;
                self.select(subquery)
            }
            Expr::WindowFunc(wf) => {
                self.exprs(&mut wf.args)?;
                if let Some(filter) = &mut wf.filter {
                    self.expr(filter)?;
                }
                self.exprs(&mut wf.partition)?;
                self.order_by(&mut wf.order_by)?;
                self.frame(&mut wf.frame)
            }
            Expr::InList { expr, list, .. } => {
                self.expr(expr)?;
                self.exprs(list)
            }
            Expr::InSubquery { expr, subquery, .. } => {
                self.expr(expr)?;
                self.select(subquery)
            }
            Expr::Between {
                expr, low, high, ..
            } => {
                self.expr(expr)?;
                self.expr(low)?;
                self.expr(high)
            }
            Expr::Exists { subquery, .. } => self.select(subquery),
        }
    }
}
