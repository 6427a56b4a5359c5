//! # SQL Abstract Syntax Tree
//!
//! Owned AST produced by the parser. Child nodes are `Box`ed or held in
//! `Vec`s, so a tree has exactly one owner and can be shared read-only behind
//! an `Arc` (the plan cache does this). Passes that rewrite a tree, such as
//! parameter binding, build a new tree instead of mutating a shared one.
//!
//! ## Statement Types
//!
//! - **Queries**: SELECT (including bare VALUES and compound operators)
//! - **DML**: INSERT, UPDATE, DELETE
//! - **DDL**: CREATE TABLE/INDEX/VIEW/TRIGGER/VIRTUAL TABLE, ALTER TABLE, DROP
//! - **Transactions**: BEGIN, COMMIT, ROLLBACK, SAVEPOINT, RELEASE
//! - **Utility**: PRAGMA, EXPLAIN, VACUUM, ANALYZE, REINDEX, BACKUP
//!
//! ## Shape Conventions
//!
//! ```text
//! SELECT *            columns = [ColumnRef { table: None,      name: "*" }]
//! SELECT t.*          columns = [ColumnRef { table: Some("t"), name: "*" }]
//! SELECT a AS x       columns = [Alias { expr: ColumnRef(a), alias: "x" }]
//! a UNION b UNION c   a.compound -> b, b.compound -> c
//! a -> '$.k'          FuncCall JSON_EXTRACT(a, '$.k')
//! a ->> '$.k'         FuncCall JSON_EXTRACT(a, '$.k'), text_mode = true
//! a LIKE b ESCAPE c   FuncCall LIKE(b, a, c)
//! ```
//!
//! Function names are stored upper-cased. Identifiers keep their source
//! spelling.
//!
//! ## Rendering
//!
//! `Display` renders canonical SQL. Parenthesization follows operator
//! precedence, so rendering a parsed expression and parsing it again yields an
//! equal tree.

use std::fmt;

use crate::types::Value;

use super::lexer::lookup_keyword;

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(Box<SelectStmt>),
    Insert(Box<InsertStmt>),
    Update(Box<UpdateStmt>),
    Delete(Box<DeleteStmt>),
    CreateTable(Box<CreateTableStmt>),
    CreateIndex(Box<CreateIndexStmt>),
    CreateView(Box<CreateViewStmt>),
    CreateTrigger(Box<CreateTriggerStmt>),
    CreateVirtualTable(Box<CreateVirtualTableStmt>),
    AlterTable(Box<AlterTableStmt>),
    DropTable(DropStmt),
    DropIndex(DropStmt),
    DropView(DropStmt),
    DropTrigger(DropStmt),
    Begin(BeginStmt),
    Commit,
    Rollback(RollbackStmt),
    Savepoint(String),
    Release(String),
    Pragma(PragmaStmt),
    Explain(Box<ExplainStmt>),
    Vacuum(VacuumStmt),
    Analyze(Option<ObjectName>),
    Reindex(Option<ObjectName>),
    Backup(BackupStmt),
}

impl Statement {
    pub fn as_select(&self) -> Option<&SelectStmt> {
        match self {
            Statement::Select(select) => Some(select),
            _ => None,
        }
    }

    /// Short upper-case tag used in logs and error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Statement::Select(_) => "SELECT",
            Statement::Insert(_) => "INSERT",
            Statement::Update(_) => "UPDATE",
            Statement::Delete(_) => "DELETE",
            Statement::CreateTable(_) => "CREATE TABLE",
            Statement::CreateIndex(_) => "CREATE INDEX",
            Statement::CreateView(_) => "CREATE VIEW",
            Statement::CreateTrigger(_) => "CREATE TRIGGER",
            Statement::CreateVirtualTable(_) => "CREATE VIRTUAL TABLE",
            Statement::AlterTable(_) => "ALTER TABLE",
            Statement::DropTable(_) => "DROP TABLE",
            Statement::DropIndex(_) => "DROP INDEX",
            Statement::DropView(_) => "DROP VIEW",
            Statement::DropTrigger(_) => "DROP TRIGGER",
            Statement::Begin(_) => "BEGIN",
            Statement::Commit => "COMMIT",
            Statement::Rollback(_) => "ROLLBACK",
            Statement::Savepoint(_) => "SAVEPOINT",
            Statement::Release(_) => "RELEASE",
            Statement::Pragma(_) => "PRAGMA",
            Statement::Explain(_) => "EXPLAIN",
            Statement::Vacuum(_) => "VACUUM",
            Statement::Analyze(_) => "ANALYZE",
            Statement::Reindex(_) => "REINDEX",
            Statement::Backup(_) => "BACKUP",
        }
    }
}

/// `[schema.]name`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectName {
    pub schema: Option<String>,
    pub name: String,
}

impl ObjectName {
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }
}

// ============================================================================
// SELECT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectStmt {
    pub ctes: Vec<Cte>,
    pub distinct: bool,
    pub columns: Vec<Expr>,
    pub from: Option<FromClause>,
    pub where_clause: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub having: Option<Expr>,
    pub windows: Vec<NamedWindow>,
    pub order_by: Vec<OrderByItem>,
    pub limit: Option<Expr>,
    pub offset: Option<Expr>,
    pub compound: Option<Box<SetOperation>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cte {
    pub name: String,
    pub columns: Vec<String>,
    pub query: Box<SelectStmt>,
    pub recursive: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetOperation {
    pub op: SetOperator,
    pub all: bool,
    pub right: SelectStmt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperator {
    Union,
    Intersect,
    Except,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FromClause {
    pub source: TableSource,
    pub joins: Vec<JoinClause>,
}

impl FromClause {
    /// All sources in join order, the leading one first.
    pub fn sources(&self) -> impl Iterator<Item = &TableSource> {
        std::iter::once(&self.source).chain(self.joins.iter().map(|j| &j.source))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableSource {
    Table {
        name: ObjectName,
        alias: Option<String>,
        indexed: Option<IndexHint>,
    },
    Subquery {
        query: Box<SelectStmt>,
        alias: Option<String>,
    },
    Function {
        name: String,
        args: Vec<Expr>,
        alias: Option<String>,
    },
    Values {
        rows: Vec<Vec<Expr>>,
        alias: Option<String>,
    },
}

impl TableSource {
    pub fn alias(&self) -> Option<&str> {
        match self {
            TableSource::Table { alias, .. }
            | TableSource::Subquery { alias, .. }
            | TableSource::Function { alias, .. }
            | TableSource::Values { alias, .. } => alias.as_deref(),
        }
    }

    pub fn table_name(&self) -> Option<&str> {
        match self {
            TableSource::Table { name, .. } => Some(&name.name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexHint {
    IndexedBy(String),
    NotIndexed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub join_type: JoinType,
    pub natural: bool,
    pub source: TableSource,
    pub condition: JoinCondition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JoinCondition {
    On(Expr),
    Using(Vec<String>),
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByItem {
    pub expr: Expr,
    pub direction: OrderDirection,
    pub nulls: NullsOrder,
}

impl OrderByItem {
    pub fn asc(expr: Expr) -> Self {
        Self {
            expr,
            direction: OrderDirection::Asc,
            nulls: NullsOrder::Default,
        }
    }

    pub fn is_desc(&self) -> bool {
        self.direction == OrderDirection::Desc
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullsOrder {
    First,
    Last,
    Default,
}

/// `WINDOW name AS (spec)`
#[derive(Debug, Clone, PartialEq)]
pub struct NamedWindow {
    pub name: String,
    pub spec: WindowSpec,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WindowSpec {
    pub base: Option<String>,
    pub partition_by: Vec<Expr>,
    pub order_by: Vec<OrderByItem>,
    pub frame: Option<WindowFrame>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowFrame {
    pub mode: WindowFrameMode,
    pub start: WindowFrameBound,
    /// `None` for the single-bound form, which ends at the current row.
    pub end: Option<WindowFrameBound>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowFrameMode {
    Rows,
    Range,
    Groups,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WindowFrameBound {
    CurrentRow,
    UnboundedPreceding,
    UnboundedFollowing,
    Preceding(Box<Expr>),
    Following(Box<Expr>),
}

// ============================================================================
// DML
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictAction {
    Rollback,
    Abort,
    Fail,
    Ignore,
    Replace,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertStmt {
    pub ctes: Vec<Cte>,
    pub or_action: Option<ConflictAction>,
    pub table: ObjectName,
    pub alias: Option<String>,
    pub columns: Vec<String>,
    pub source: InsertSource,
    pub on_conflict: Option<OnConflict>,
    pub returning: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InsertSource {
    Values(Vec<Vec<Expr>>),
    Select(Box<SelectStmt>),
    DefaultValues,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OnConflict {
    pub target: Vec<String>,
    pub target_where: Option<Expr>,
    pub action: OnConflictAction,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OnConflictAction {
    DoNothing,
    DoUpdate {
        assignments: Vec<Assignment>,
        where_clause: Option<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: String,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStmt {
    pub ctes: Vec<Cte>,
    pub or_action: Option<ConflictAction>,
    pub table: ObjectName,
    pub alias: Option<String>,
    pub assignments: Vec<Assignment>,
    pub from: Option<FromClause>,
    pub where_clause: Option<Expr>,
    pub order_by: Vec<OrderByItem>,
    pub limit: Option<Expr>,
    pub offset: Option<Expr>,
    pub returning: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStmt {
    pub ctes: Vec<Cte>,
    pub table: ObjectName,
    pub alias: Option<String>,
    pub where_clause: Option<Expr>,
    pub order_by: Vec<OrderByItem>,
    pub limit: Option<Expr>,
    pub offset: Option<Expr>,
    pub returning: Vec<Expr>,
}

// ============================================================================
// DDL
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStmt {
    pub temporary: bool,
    pub if_not_exists: bool,
    pub name: ObjectName,
    pub body: CreateTableBody,
    pub without_rowid: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CreateTableBody {
    Columns {
        columns: Vec<ColumnDef>,
        constraints: Vec<TableConstraint>,
    },
    AsSelect(Box<SelectStmt>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    /// Declared type text as written, e.g. `VARCHAR(20)`. Empty when absent.
    pub type_name: String,
    pub constraints: Vec<ColumnConstraint>,
}

impl ColumnDef {
    pub fn affinity(&self) -> crate::types::DataType {
        crate::types::DataType::from_type_name(&self.type_name)
    }

    pub fn is_primary_key(&self) -> bool {
        self.constraints
            .iter()
            .any(|c| matches!(c.kind, ColumnConstraintKind::PrimaryKey { .. }))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnConstraint {
    pub name: Option<String>,
    pub kind: ColumnConstraintKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnConstraintKind {
    PrimaryKey {
        direction: Option<OrderDirection>,
        autoincrement: bool,
    },
    NotNull,
    Null,
    Unique,
    Check(Expr),
    Default(Expr),
    Collate(String),
    References(ForeignKeyRef),
    Generated {
        expr: Expr,
        stored: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKeyRef {
    pub table: String,
    pub columns: Vec<String>,
    pub on_delete: Option<ReferentialAction>,
    pub on_update: Option<ReferentialAction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferentialAction {
    SetNull,
    SetDefault,
    Cascade,
    Restrict,
    NoAction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableConstraint {
    pub name: Option<String>,
    pub kind: TableConstraintKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableConstraintKind {
    PrimaryKey(Vec<IndexColumn>),
    Unique(Vec<IndexColumn>),
    Check(Expr),
    ForeignKey {
        columns: Vec<String>,
        reference: ForeignKeyRef,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateIndexStmt {
    pub unique: bool,
    pub if_not_exists: bool,
    pub name: ObjectName,
    pub table: String,
    pub columns: Vec<IndexColumn>,
    pub where_clause: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexColumn {
    pub name: String,
    pub collation: Option<String>,
    pub direction: Option<OrderDirection>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateViewStmt {
    pub temporary: bool,
    pub if_not_exists: bool,
    pub name: ObjectName,
    pub columns: Vec<String>,
    pub query: Box<SelectStmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTriggerStmt {
    pub temporary: bool,
    pub if_not_exists: bool,
    pub name: ObjectName,
    pub timing: TriggerTiming,
    pub event: TriggerEvent,
    pub table: String,
    pub for_each_row: bool,
    pub when: Option<Expr>,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerTiming {
    Before,
    After,
    InsteadOf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerEvent {
    Insert,
    Delete,
    Update(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateVirtualTableStmt {
    pub if_not_exists: bool,
    pub name: ObjectName,
    pub module: String,
    /// Module arguments as raw source text, one entry per comma-separated
    /// argument.
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlterTableStmt {
    pub table: ObjectName,
    pub action: AlterTableAction,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlterTableAction {
    AddColumn(ColumnDef),
    DropColumn(String),
    RenameColumn { from: String, to: String },
    RenameTable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropStmt {
    pub if_exists: bool,
    pub name: ObjectName,
}

// ============================================================================
// TRANSACTIONS AND UTILITIES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BeginStmt {
    pub mode: Option<TransactionMode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionMode {
    Deferred,
    Immediate,
    Exclusive,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RollbackStmt {
    pub savepoint: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PragmaStmt {
    pub name: ObjectName,
    pub value: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExplainStmt {
    pub query_plan: bool,
    pub statement: Statement,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VacuumStmt {
    pub schema: Option<String>,
    pub into: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupStmt {
    pub incremental: bool,
    pub path: String,
}

// ============================================================================
// EXPRESSIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    ColumnRef(ColumnRef),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    FuncCall(FunctionCall),
    Alias {
        expr: Box<Expr>,
        alias: String,
    },
    Case {
        operand: Option<Box<Expr>>,
        conditions: Vec<WhenClause>,
        else_result: Option<Box<Expr>>,
    },
    Cast {
        expr: Box<Expr>,
        type_name: String,
    },
    Collate {
        expr: Box<Expr>,
        collation: String,
    },
    Subquery(Box<SelectStmt>),
    AnyAll {
        left: Box<Expr>,
        op: BinaryOp,
        quantifier: Quantifier,
        subquery: Box<SelectStmt>,
    },
    WindowFunc(Box<WindowFuncExpr>),
    Placeholder(Placeholder),
    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },
    InSubquery {
        expr: Box<Expr>,
        subquery: Box<SelectStmt>,
        negated: bool,
    },
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        negated: bool,
    },
    Exists {
        subquery: Box<SelectStmt>,
        negated: bool,
    },
}

impl Expr {
    pub fn column(name: impl Into<String>) -> Self {
        Expr::ColumnRef(ColumnRef {
            table: None,
            name: name.into(),
        })
    }

    pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Self {
        Expr::ColumnRef(ColumnRef {
            table: Some(table.into()),
            name: name.into(),
        })
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn star() -> Self {
        Expr::column("*")
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn alias(self, alias: impl Into<String>) -> Self {
        Expr::Alias {
            expr: Box::new(self),
            alias: alias.into(),
        }
    }

    /// `true` for `*` and `t.*`.
    pub fn is_star(&self) -> bool {
        matches!(self, Expr::ColumnRef(c) if c.name == "*")
    }

    /// Strips any `Alias` wrappers.
    pub fn unaliased(&self) -> &Expr {
        let mut expr = self;
        while let Expr::Alias { expr: inner, .. } = expr {
            expr = inner;
        }
        expr
    }

    pub fn as_column(&self) -> Option<&ColumnRef> {
        match self {
            Expr::ColumnRef(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            Expr::Literal(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Placeholder {
    /// `?`, numbered 1, 2, ... in the order the parser read it.
    Positional(u32),
    /// `?NNN`
    Numbered(u32),
    /// `:name`, `@name`, `$name`, prefix kept.
    Named(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Is,
    IsNot,
    Like,
    NotLike,
    Glob,
    NotGlob,
    Match,
    Regexp,
    NotRegexp,
    BitAnd,
    LeftShift,
    RightShift,
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Concat,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Or => "OR",
            BinaryOp::And => "AND",
            BinaryOp::Eq => "=",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Is => "IS",
            BinaryOp::IsNot => "IS NOT",
            BinaryOp::Like => "LIKE",
            BinaryOp::NotLike => "NOT LIKE",
            BinaryOp::Glob => "GLOB",
            BinaryOp::NotGlob => "NOT GLOB",
            BinaryOp::Match => "MATCH",
            BinaryOp::Regexp => "REGEXP",
            BinaryOp::NotRegexp => "NOT REGEXP",
            BinaryOp::BitAnd => "&",
            BinaryOp::LeftShift => "<<",
            BinaryOp::RightShift => ">>",
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Concat => "||",
        }
    }

    /// Left binding power; the right one is always `lbp + 1`.
    pub fn binding_power(self) -> u8 {
        match self {
            BinaryOp::Or => 2,
            BinaryOp::And => 4,
            BinaryOp::Eq
            | BinaryOp::NotEq
            | BinaryOp::Lt
            | BinaryOp::LtEq
            | BinaryOp::Gt
            | BinaryOp::GtEq
            | BinaryOp::Is
            | BinaryOp::IsNot
            | BinaryOp::Like
            | BinaryOp::NotLike
            | BinaryOp::Glob
            | BinaryOp::NotGlob
            | BinaryOp::Match
            | BinaryOp::Regexp
            | BinaryOp::NotRegexp => 6,
            BinaryOp::BitAnd | BinaryOp::LeftShift | BinaryOp::RightShift => 8,
            BinaryOp::Plus | BinaryOp::Minus | BinaryOp::Concat => 10,
            BinaryOp::Multiply | BinaryOp::Divide | BinaryOp::Modulo => 12,
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Lt
                | BinaryOp::LtEq
                | BinaryOp::Gt
                | BinaryOp::GtEq
        )
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Plus
                | BinaryOp::Minus
                | BinaryOp::Multiply
                | BinaryOp::Divide
                | BinaryOp::Modulo
        )
    }

    /// The operator with its operands swapped: `a < b` is `b > a`.
    pub fn flipped(self) -> Self {
        match self {
            BinaryOp::Lt => BinaryOp::Gt,
            BinaryOp::LtEq => BinaryOp::GtEq,
            BinaryOp::Gt => BinaryOp::Lt,
            BinaryOp::GtEq => BinaryOp::LtEq,
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Minus,
    Plus,
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantifier {
    Any,
    All,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expr>,
    pub distinct: bool,
    /// `COUNT(*)`
    pub star: bool,
    pub filter: Option<Box<Expr>>,
    /// Set on the `->>` desugaring; the result is coerced to text.
    pub text_mode: bool,
}

impl FunctionCall {
    pub fn new(name: &str, args: Vec<Expr>) -> Self {
        Self {
            name: name.to_ascii_uppercase(),
            args,
            ..Default::default()
        }
    }
}

/// A function call in window position (`f(..) OVER ...`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WindowFuncExpr {
    pub name: String,
    pub args: Vec<Expr>,
    pub distinct: bool,
    pub star: bool,
    pub filter: Option<Box<Expr>>,
    pub partition: Vec<Expr>,
    pub order_by: Vec<OrderByItem>,
    pub frame: Option<WindowFrame>,
    /// `OVER w` or `OVER (w ...)`; resolved against `SelectStmt::windows`.
    pub window_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhenClause {
    pub condition: Expr,
    pub result: Expr,
}

// ============================================================================
// RENDERING
// ============================================================================

/// Writes `name` bare when it lexes back as the same identifier, otherwise
/// double-quoted.
pub fn fmt_ident(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    let bare = !name.is_empty()
        && name
            .bytes()
            .next()
            .is_some_and(|b| b.is_ascii_alphabetic() || b == b'_' || b >= 0x80)
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80)
        && lookup_keyword(name).map_or(true, |k| !k.is_reserved());
    if bare {
        f.write_str(name)
    } else {
        write!(f, "\"{}\"", name.replace('"', "\"\""))
    }
}

fn fmt_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn fmt_ident_list(f: &mut fmt::Formatter<'_>, names: &[String]) -> fmt::Result {
    for (i, name) in names.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        fmt_ident(f, name)?;
    }
    Ok(())
}

/// Binding power of the tightest operator at the root of `expr`, used to
/// decide where parentheses are needed. Atoms bind tighter than everything.
fn expr_power(expr: &Expr) -> u8 {
    match expr {
        Expr::Binary { op, .. } => op.binding_power(),
        Expr::Unary { op: UnaryOp::Not, .. } => 5,
        Expr::InList { .. } | Expr::InSubquery { .. } | Expr::Between { .. } | Expr::AnyAll { .. } => 6,
        Expr::Exists { negated: true, .. } => 5,
        Expr::Unary { .. } => 14,
        Expr::Alias { .. } => 0,
        _ => u8::MAX,
    }
}

struct Operand<'a> {
    expr: &'a Expr,
    min: u8,
}

impl fmt::Display for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if expr_power(self.expr) < self.min {
            write!(f, "({})", self.expr)
        } else {
            write!(f, "{}", self.expr)
        }
    }
}

fn operand(expr: &Expr, min: u8) -> Operand<'_> {
    Operand { expr, min }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(schema) = &self.schema {
            fmt_ident(f, schema)?;
            f.write_str(".")?;
        }
        fmt_ident(f, &self.name)
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(table) = &self.table {
            fmt_ident(f, table)?;
            f.write_str(".")?;
        }
        if self.name == "*" {
            f.write_str("*")
        } else {
            fmt_ident(f, &self.name)
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placeholder::Positional(_) => f.write_str("?"),
            Placeholder::Numbered(n) => write!(f, "?{}", n),
            Placeholder::Named(name) => f.write_str(name),
        }
    }
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_call(
            f,
            &self.name,
            &self.args,
            self.distinct,
            self.star,
            self.filter.as_deref(),
        )
    }
}

fn fmt_call(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    args: &[Expr],
    distinct: bool,
    star: bool,
    filter: Option<&Expr>,
) -> fmt::Result {
    write!(f, "{}(", name)?;
    if distinct {
        f.write_str("DISTINCT ")?;
    }
    if star {
        f.write_str("*")?;
    } else {
        fmt_list(f, args)?;
    }
    f.write_str(")")?;
    if let Some(filter) = filter {
        write!(f, " FILTER (WHERE {})", filter)?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(value) => f.write_str(&value.to_sql()),
            Expr::ColumnRef(col) => write!(f, "{}", col),
            Expr::Placeholder(p) => write!(f, "{}", p),
            Expr::Binary { op, left, right } => {
                let bp = op.binding_power();
                write!(
                    f,
                    "{} {} {}",
                    operand(left, bp),
                    op.as_str(),
                    operand(right, bp + 1)
                )
            }
            Expr::Unary { op, expr } => match op {
                UnaryOp::Not => write!(f, "NOT {}", operand(expr, 6)),
                UnaryOp::Minus => match &**expr {
                    Expr::Literal(Value::Int(_) | Value::Float(_))
                    | Expr::Unary {
                        op: UnaryOp::Minus,
                        ..
                    } => write!(f, "-({})", expr),
                    _ => write!(f, "-{}", operand(expr, 14)),
                },
                UnaryOp::Plus => write!(f, "+{}", operand(expr, 14)),
                UnaryOp::BitNot => write!(f, "~{}", operand(expr, 14)),
            },
            Expr::FuncCall(call) => write!(f, "{}", call),
            Expr::Alias { expr, alias } => {
                write!(f, "{} AS ", expr)?;
                fmt_ident(f, alias)
            }
            Expr::Case {
                operand: case_operand,
                conditions,
                else_result,
            } => {
                f.write_str("CASE")?;
                if let Some(op) = case_operand {
                    write!(f, " {}", op)?;
                }
                for when in conditions {
                    write!(f, " WHEN {} THEN {}", when.condition, when.result)?;
                }
                if let Some(else_result) = else_result {
                    write!(f, " ELSE {}", else_result)?;
                }
                f.write_str(" END")
            }
            Expr::Cast { expr, type_name } => write!(f, "CAST({} AS {})", expr, type_name),
            Expr::Collate { expr, collation } => {
                write!(f, "{} COLLATE ", operand(expr, 18))?;
                fmt_ident(f, collation)
            }
            Expr::Subquery(select) => write!(f, "({})", select),
            Expr::AnyAll {
                left,
                op,
                quantifier,
                subquery,
            } => {
                let q = match quantifier {
                    Quantifier::Any => "ANY",
                    Quantifier::All => "ALL",
                };
                write!(f, "{} {} {} ({})", operand(left, 7), op.as_str(), q, subquery)
            }
            Expr::WindowFunc(wf) => write!(f, "{}", wf),
            Expr::InList {
                expr,
                list,
                negated,
            } => {
                write!(f, "{} ", operand(expr, 7))?;
                if *negated {
                    f.write_str("NOT ")?;
                }
                f.write_str("IN (")?;
                fmt_list(f, list)?;
                f.write_str(")")
            }
            Expr::InSubquery {
                expr,
                subquery,
                negated,
            } => {
                write!(f, "{} ", operand(expr, 7))?;
                if *negated {
                    f.write_str("NOT ")?;
                }
                write!(f, "IN ({})", subquery)
            }
            Expr::Between {
                expr,
                low,
                high,
                negated,
            } => {
                write!(f, "{} ", operand(expr, 7))?;
                if *negated {
                    f.write_str("NOT ")?;
                }
                write!(f, "BETWEEN {} AND {}", operand(low, 7), operand(high, 7))
            }
            Expr::Exists { subquery, negated } => {
                if *negated {
                    f.write_str("NOT ")?;
                }
                write!(f, "EXISTS ({})", subquery)
            }
        }
    }
}

impl fmt::Display for WindowFuncExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_call(
            f,
            &self.name,
            &self.args,
            self.distinct,
            self.star,
            self.filter.as_deref(),
        )?;
        f.write_str(" OVER ")?;
        let spec = WindowSpecRef {
            base: self.window_name.as_deref(),
            partition_by: &self.partition,
            order_by: &self.order_by,
            frame: self.frame.as_ref(),
        };
        if spec.is_bare_name() {
            return fmt_ident(f, self.window_name.as_deref().unwrap_or_default());
        }
        write!(f, "({})", spec)
    }
}

struct WindowSpecRef<'a> {
    base: Option<&'a str>,
    partition_by: &'a [Expr],
    order_by: &'a [OrderByItem],
    frame: Option<&'a WindowFrame>,
}

impl WindowSpecRef<'_> {
    fn is_bare_name(&self) -> bool {
        self.base.is_some()
            && self.partition_by.is_empty()
            && self.order_by.is_empty()
            && self.frame.is_none()
    }
}

impl fmt::Display for WindowSpecRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        if let Some(base) = self.base {
            fmt_ident(f, base)?;
            sep = " ";
        }
        if !self.partition_by.is_empty() {
            write!(f, "{}PARTITION BY ", sep)?;
            fmt_list(f, self.partition_by)?;
            sep = " ";
        }
        if !self.order_by.is_empty() {
            write!(f, "{}ORDER BY ", sep)?;
            fmt_list(f, self.order_by)?;
            sep = " ";
        }
        if let Some(frame) = self.frame {
            write!(f, "{}{}", sep, frame)?;
        }
        Ok(())
    }
}

impl fmt::Display for WindowSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        WindowSpecRef {
            base: self.base.as_deref(),
            partition_by: &self.partition_by,
            order_by: &self.order_by,
            frame: self.frame.as_ref(),
        }
        .fmt(f)
    }
}

impl fmt::Display for WindowFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.mode {
            WindowFrameMode::Rows => "ROWS",
            WindowFrameMode::Range => "RANGE",
            WindowFrameMode::Groups => "GROUPS",
        };
        match &self.end {
            Some(end) => write!(f, "{} BETWEEN {} AND {}", mode, self.start, end),
            None => write!(f, "{} {}", mode, self.start),
        }
    }
}

impl fmt::Display for WindowFrameBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowFrameBound::CurrentRow => f.write_str("CURRENT ROW"),
            WindowFrameBound::UnboundedPreceding => f.write_str("UNBOUNDED PRECEDING"),
            WindowFrameBound::UnboundedFollowing => f.write_str("UNBOUNDED FOLLOWING"),
            WindowFrameBound::Preceding(n) => write!(f, "{} PRECEDING", n),
            WindowFrameBound::Following(n) => write!(f, "{} FOLLOWING", n),
        }
    }
}

impl fmt::Display for OrderByItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)?;
        if self.direction == OrderDirection::Desc {
            f.write_str(" DESC")?;
        }
        match self.nulls {
            NullsOrder::First => f.write_str(" NULLS FIRST"),
            NullsOrder::Last => f.write_str(" NULLS LAST"),
            NullsOrder::Default => Ok(()),
        }
    }
}

impl fmt::Display for TableSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableSource::Table { name, indexed, .. } => {
                write!(f, "{}", name)?;
                self.fmt_alias(f)?;
                match indexed {
                    Some(IndexHint::IndexedBy(index)) => {
                        f.write_str(" INDEXED BY ")?;
                        fmt_ident(f, index)
                    }
                    Some(IndexHint::NotIndexed) => f.write_str(" NOT INDEXED"),
                    None => Ok(()),
                }
            }
            TableSource::Subquery { query, .. } => {
                write!(f, "({})", query)?;
                self.fmt_alias(f)
            }
            TableSource::Function { name, args, .. } => {
                fmt_ident(f, name)?;
                f.write_str("(")?;
                fmt_list(f, args)?;
                f.write_str(")")?;
                self.fmt_alias(f)
            }
            TableSource::Values { rows, .. } => {
                f.write_str("(")?;
                fmt_values(f, rows)?;
                f.write_str(")")?;
                self.fmt_alias(f)
            }
        }
    }
}

impl TableSource {
    fn fmt_alias(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.alias() {
            Some(alias) => {
                f.write_str(" AS ")?;
                fmt_ident(f, alias)
            }
            None => Ok(()),
        }
    }
}

fn fmt_values(f: &mut fmt::Formatter<'_>, rows: &[Vec<Expr>]) -> fmt::Result {
    f.write_str("VALUES ")?;
    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        f.write_str("(")?;
        fmt_list(f, row)?;
        f.write_str(")")?;
    }
    Ok(())
}

impl fmt::Display for FromClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)?;
        for join in &self.joins {
            if join.join_type == JoinType::Cross && !join.natural {
                write!(f, ", {}", join.source)?;
                continue;
            }
            f.write_str(" ")?;
            if join.natural {
                f.write_str("NATURAL ")?;
            }
            let kw = match join.join_type {
                JoinType::Inner => "JOIN",
                JoinType::Left => "LEFT JOIN",
                JoinType::Right => "RIGHT JOIN",
                JoinType::Full => "FULL JOIN",
                JoinType::Cross => "CROSS JOIN",
            };
            write!(f, "{} {}", kw, join.source)?;
            match &join.condition {
                JoinCondition::On(expr) => write!(f, " ON {}", expr)?,
                JoinCondition::Using(cols) => {
                    f.write_str(" USING (")?;
                    fmt_ident_list(f, cols)?;
                    f.write_str(")")?;
                }
                JoinCondition::None => {}
            }
        }
        Ok(())
    }
}

impl fmt::Display for Cte {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_ident(f, &self.name)?;
        if !self.columns.is_empty() {
            f.write_str("(")?;
            fmt_ident_list(f, &self.columns)?;
            f.write_str(")")?;
        }
        write!(f, " AS ({})", self.query)
    }
}

impl SelectStmt {
    fn fmt_core(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values_only = self.is_values_body();
        if let (true, Some(FromClause {
            source: TableSource::Values { rows, .. },
            ..
        })) = (values_only, &self.from)
        {
            return fmt_values(f, rows);
        }

        f.write_str("SELECT ")?;
        if self.distinct {
            f.write_str("DISTINCT ")?;
        }
        fmt_list(f, &self.columns)?;
        if let Some(from) = &self.from {
            write!(f, " FROM {}", from)?;
        }
        if let Some(where_clause) = &self.where_clause {
            write!(f, " WHERE {}", where_clause)?;
        }
        if !self.group_by.is_empty() {
            f.write_str(" GROUP BY ")?;
            fmt_list(f, &self.group_by)?;
        }
        if let Some(having) = &self.having {
            write!(f, " HAVING {}", having)?;
        }
        if !self.windows.is_empty() {
            f.write_str(" WINDOW ")?;
            for (i, w) in self.windows.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                fmt_ident(f, &w.name)?;
                write!(f, " AS ({})", w.spec)?;
            }
        }
        Ok(())
    }

    /// A bare `VALUES (..), (..)` body: star projection over an unaliased
    /// values source and nothing else.
    pub fn is_values_body(&self) -> bool {
        matches!(
            &self.from,
            Some(FromClause {
                source: TableSource::Values { alias: None, .. },
                joins,
            }) if joins.is_empty()
        ) && self.columns.len() == 1
            && self.columns[0].is_star()
            && self.where_clause.is_none()
            && self.group_by.is_empty()
            && self.having.is_none()
            && !self.distinct
    }
}

impl fmt::Display for SelectStmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.ctes.is_empty() {
            f.write_str("WITH ")?;
            if self.ctes.iter().any(|c| c.recursive) {
                f.write_str("RECURSIVE ")?;
            }
            fmt_list(f, &self.ctes)?;
            f.write_str(" ")?;
        }
        self.fmt_core(f)?;
        let mut link = self.compound.as_deref();
        while let Some(set_op) = link {
            let op = match set_op.op {
                SetOperator::Union => "UNION",
                SetOperator::Intersect => "INTERSECT",
                SetOperator::Except => "EXCEPT",
            };
            write!(f, " {}{} ", op, if set_op.all { " ALL" } else { "" })?;
            set_op.right.fmt_core(f)?;
            link = set_op.right.compound.as_deref();
        }
        if !self.order_by.is_empty() {
            f.write_str(" ORDER BY ")?;
            fmt_list(f, &self.order_by)?;
        }
        if let Some(limit) = &self.limit {
            write!(f, " LIMIT {}", limit)?;
        }
        if let Some(offset) = &self.offset {
            write!(f, " OFFSET {}", offset)?;
        }
        Ok(())
    }
}

/// Canonical text of a window frame; `""` when absent.
pub fn frame_spec_string(frame: Option<&WindowFrame>) -> String {
    frame.map(|f| f.to_string()).unwrap_or_default()
}
