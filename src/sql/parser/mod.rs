//! # SQL Parser - Owned AST Builder
//!
//! Recursive descent for statements and Pratt binding powers for
//! expressions. The parser pulls tokens from the streaming [`Lexer`] with one
//! token of lookahead (`current`) plus an on-demand peek at the token after
//! it.
//!
//! ## Parser Architecture
//!
//! ```text
//! SQL text → Lexer → Parser → Statement (owned, Box/Vec)
//! ```
//!
//! | File | Grammar |
//! |------|---------|
//! | `mod.rs` | token helpers, errors, statement dispatch |
//! | `select.rs` | SELECT, VALUES, FROM/JOIN, CTEs, compound operators, ORDER BY, LIMIT |
//! | `expr.rs` | expressions, function calls, window specs, IN-list folding |
//! | `dml.rs` | INSERT, UPDATE, DELETE |
//! | `ddl.rs` | CREATE, ALTER, DROP |
//! | `txn.rs` | transactions, PRAGMA, EXPLAIN, VACUUM, ANALYZE, REINDEX, BACKUP |
//!
//! ## Expression Precedence
//!
//! | Binding power | Operators |
//! |---------------|-----------|
//! | 2/3 | OR |
//! | 4/5 | AND |
//! | rhs 6 | NOT (prefix) |
//! | 6/7 | = == != <> < <= > >=, IS, IN, LIKE, GLOB, MATCH, REGEXP, BETWEEN, op ANY/ALL |
//! | 8/9 | & << >> |
//! | 10/11 | + - \|\| -> ->> |
//! | 12/13 | * / % |
//! | 14 | unary - + ~ |
//! | 18 | COLLATE (postfix) |
//!
//! ## Error Handling
//!
//! Parsing stops at the first error; there is no recovery. Errors are typed
//! [`ParseError`] values (or the underlying
//! [`LexError`](super::lexer::LexError) when the lexer
//! rejected the input) wrapped in `eyre::Report`, so callers can
//! `downcast_ref` them.
//!
//! ## Usage Example
//!
//! ```ignore
//! use sqlvibe::sql::parser::parse;
//!
//! let stmt = parse("SELECT id, name FROM users WHERE active = 1")?;
//! ```

mod ddl;
mod dml;
mod expr;
mod select;
mod txn;

use std::fmt;

use eyre::Result;

use super::ast::Statement;
use super::lexer::Lexer;
use super::token::{Keyword, SpannedToken, Token};
use crate::config::MAX_EXPR_DEPTH;


#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    UnexpectedToken {
        expected: String,
        found: String,
        line: u32,
        column: u32,
    },
    UnexpectedEof {
        expected: String,
        line: u32,
        column: u32,
    },
    Unsupported {
        feature: String,
        line: u32,
        column: u32,
    },
    DuplicatePrimaryKey {
        table: String,
        line: u32,
        column: u32,
    },
}

impl ParseError {
    pub fn line(&self) -> u32 {
        match self {
            ParseError::UnexpectedToken { line, .. }
            | ParseError::UnexpectedEof { line, .. }
            | ParseError::Unsupported { line, .. }
            | ParseError::DuplicatePrimaryKey { line, .. } => *line,
        }
    }

    pub fn column(&self) -> u32 {
        match self {
            ParseError::UnexpectedToken { column, .. }
            | ParseError::UnexpectedEof { column, .. }
            | ParseError::Unsupported { column, .. }
            | ParseError::DuplicatePrimaryKey { column, .. } => *column,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnexpectedToken {
                expected,
                found,
                line,
                column,
            } => write!(
                f,
                "expected {}, found '{}' at line {} column {}",
                expected, found, line, column
            ),
            ParseError::UnexpectedEof {
                expected,
                line,
                column,
            } => write!(
                f,
                "expected {}, found end of input at line {} column {}",
                expected, line, column
            ),
            ParseError::Unsupported {
                feature,
                line,
                column,
            } => write!(
                f,
                "unsupported: {} at line {} column {}",
                feature, line, column
            ),
            ParseError::DuplicatePrimaryKey {
                table,
                line,
                column,
            } => write!(
                f,
                "table {} has more than one primary key at line {} column {}",
                table, line, column
            ),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parses exactly one statement. A trailing `;` is allowed.
pub fn parse(sql: &str) -> Result<Statement> {
    tracing::trace!(len = sql.len(), "parse");
    let mut parser = Parser::new(sql);
    let stmt = parser.parse_statement()?;
    while parser.consume_token(&Token::Semicolon) {}
    if !parser.is_at_end() {
        return Err(parser.unexpected("end of statement"));
    }
    Ok(stmt)
}

/// Parses a `;`-separated script. Empty statements are skipped.
pub fn parse_all(sql: &str) -> Result<Vec<Statement>> {
    tracing::trace!(len = sql.len(), "parse_all");
    let mut parser = Parser::new(sql);
    let mut statements = Vec::new();

    loop {
        while parser.consume_token(&Token::Semicolon) {}
        if parser.is_at_end() {
            return Ok(statements);
        }
        parser.positional = 0;
        statements.push(parser.parse_statement()?);
        if !parser.is_at_end() && !parser.check_token(&Token::Semicolon) {
            return Err(parser.unexpected("';' or end of input"));
        }
    }
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: SpannedToken<'a>,
    previous_end: usize,
    depth: usize,
    /// Anonymous `?` read so far in the current statement.
    positional: u32,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_spanned();
        Self {
            lexer,
            current,
            previous_end: 0,
            depth: 0,
            positional: 0,
        }
    }

    pub fn is_at_end(&self) -> bool {
        matches!(self.current.token, Token::Eof)
    }

    pub fn peek(&self) -> &Token<'a> {
        &self.current.token
    }

    /// The token after `current`.
    pub fn peek_next(&self) -> Token<'a> {
        self.lexer.peek().token
    }

    pub fn advance(&mut self) -> SpannedToken<'a> {
        let next = self.lexer.next_spanned();
        let prev = std::mem::replace(&mut self.current, next);
        self.previous_end = prev.span.end();
        prev
    }

    pub fn check_keyword(&self, keyword: Keyword) -> bool {
        matches!(&self.current.token, Token::Keyword(k) if *k == keyword)
    }

    pub fn consume_keyword(&mut self, keyword: Keyword) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn expect_keyword(&mut self, keyword: Keyword) -> Result<()> {
        if self.check_keyword(keyword) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&format!("{:?}", keyword).to_ascii_uppercase()))
        }
    }

    pub fn check_token(&self, expected: &Token<'_>) -> bool {
        std::mem::discriminant(&self.current.token) == std::mem::discriminant(expected)
    }

    pub fn consume_token(&mut self, expected: &Token<'_>) -> bool {
        if self.check_token(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn expect_token(&mut self, expected: &Token<'_>) -> Result<()> {
        if self.check_token(expected) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(token_description(expected)))
        }
    }

    /// Error for the current token. Lexer failures surface as the original
    /// `LexError`.
    pub(crate) fn unexpected(&self, expected: &str) -> eyre::Report {
        let line = self.current.line;
        let column = self.current.column;
        match &self.current.token {
            Token::Error(err) => eyre::Report::new(*err),
            Token::Eof => eyre::Report::new(ParseError::UnexpectedEof {
                expected: expected.to_string(),
                line,
                column,
            }),
            _ => eyre::Report::new(ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: self.current.text.to_string(),
                line,
                column,
            }),
        }
    }

    pub(crate) fn unsupported(&self, feature: &str) -> eyre::Report {
        eyre::Report::new(ParseError::Unsupported {
            feature: feature.to_string(),
            line: self.current.line,
            column: self.current.column,
        })
    }

    /// Charges `cost` against the nesting budget. Pair with `leave(cost)`.
    fn enter(&mut self, cost: usize) -> Result<()> {
        self.depth += cost;
        if self.depth > MAX_EXPR_DEPTH {
            self.depth -= cost;
            return Err(self.unsupported("expression nesting deeper than the parser limit"));
        }
        Ok(())
    }

    fn leave(&mut self, cost: usize) {
        self.depth = self.depth.saturating_sub(cost);
    }

    /// True when the current token can be read as a name.
    pub(crate) fn check_ident(&self) -> bool {
        match &self.current.token {
            Token::Ident(_) | Token::QuotedIdent(_) => true,
            Token::Keyword(k) => !k.is_reserved(),
            _ => false,
        }
    }

    pub(crate) fn expect_ident(&mut self) -> Result<String> {
        let name = match &self.current.token {
            Token::Ident(s) => s.to_string(),
            Token::QuotedIdent(s) => unquote_ident(self.current.text, s),
            Token::String(s) => s.replace("''", "'"),
            Token::Keyword(k) if !k.is_reserved() => self.current.text.to_string(),
            _ => return Err(self.unexpected("identifier")),
        };
        self.advance();
        Ok(name)
    }

    pub(crate) fn expect_string(&mut self) -> Result<String> {
        match &self.current.token {
            Token::String(s) => {
                let value = s.replace("''", "'");
                self.advance();
                Ok(value)
            }
            _ => Err(self.unexpected("string literal")),
        }
    }

    pub(crate) fn parse_ident_list(&mut self) -> Result<Vec<String>> {
        let mut names = vec![self.expect_ident()?];
        while self.consume_token(&Token::Comma) {
            names.push(self.expect_ident()?);
        }
        Ok(names)
    }

    /// `( name, ... )`
    pub(crate) fn parse_paren_ident_list(&mut self) -> Result<Vec<String>> {
        self.expect_token(&Token::LParen)?;
        let names = self.parse_ident_list()?;
        self.expect_token(&Token::RParen)?;
        Ok(names)
    }

    /// `IF NOT EXISTS`
    pub(crate) fn parse_if_not_exists(&mut self) -> Result<bool> {
        if self.consume_keyword(Keyword::If) {
            self.expect_keyword(Keyword::Not)?;
            self.expect_keyword(Keyword::Exists)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// `IF EXISTS`
    pub(crate) fn parse_if_exists(&mut self) -> Result<bool> {
        if self.consume_keyword(Keyword::If) {
            self.expect_keyword(Keyword::Exists)?;
            return Ok(true);
        }
        Ok(false)
    }

    pub fn parse_statement(&mut self) -> Result<Statement> {
        match self.peek() {
            Token::Keyword(Keyword::Select) | Token::Keyword(Keyword::Values) => {
                let select = self.parse_select()?;
                Ok(Statement::Select(Box::new(select)))
            }
            Token::Keyword(Keyword::With) => self.parse_with_statement(),
            Token::Keyword(Keyword::Insert) | Token::Keyword(Keyword::Replace) => {
                let insert = self.parse_insert(Vec::new())?;
                Ok(Statement::Insert(Box::new(insert)))
            }
            Token::Keyword(Keyword::Update) => {
                let update = self.parse_update(Vec::new())?;
                Ok(Statement::Update(Box::new(update)))
            }
            Token::Keyword(Keyword::Delete) => {
                let delete = self.parse_delete(Vec::new())?;
                Ok(Statement::Delete(Box::new(delete)))
            }
            Token::Keyword(Keyword::Create) => self.parse_create(),
            Token::Keyword(Keyword::Alter) => {
                let alter = self.parse_alter()?;
                Ok(Statement::AlterTable(Box::new(alter)))
            }
            Token::Keyword(Keyword::Drop) => self.parse_drop(),
            Token::Keyword(Keyword::Begin) => Ok(Statement::Begin(self.parse_begin()?)),
            Token::Keyword(Keyword::Commit) | Token::Keyword(Keyword::End) => {
                self.advance();
                self.consume_keyword(Keyword::Transaction);
                Ok(Statement::Commit)
            }
            Token::Keyword(Keyword::Rollback) => Ok(Statement::Rollback(self.parse_rollback()?)),
            Token::Keyword(Keyword::Savepoint) => {
                self.advance();
                Ok(Statement::Savepoint(self.expect_ident()?))
            }
            Token::Keyword(Keyword::Release) => {
                self.advance();
                self.consume_keyword(Keyword::Savepoint);
                Ok(Statement::Release(self.expect_ident()?))
            }
            Token::Keyword(Keyword::Pragma) => Ok(Statement::Pragma(self.parse_pragma()?)),
            Token::Keyword(Keyword::Explain) => {
                let explain = self.parse_explain()?;
                Ok(Statement::Explain(Box::new(explain)))
            }
            Token::Keyword(Keyword::Vacuum) => Ok(Statement::Vacuum(self.parse_vacuum()?)),
            Token::Keyword(Keyword::Analyze) => {
                self.advance();
                Ok(Statement::Analyze(self.parse_optional_object_name()?))
            }
            Token::Keyword(Keyword::Reindex) => {
                self.advance();
                Ok(Statement::Reindex(self.parse_optional_object_name()?))
            }
            Token::Keyword(Keyword::Backup) => Ok(Statement::Backup(self.parse_backup()?)),
            _ => Err(self.unexpected("statement")),
        }
    }

    fn parse_with_statement(&mut self) -> Result<Statement> {
        let ctes = self.parse_with_clause()?;
        match self.peek() {
            Token::Keyword(Keyword::Insert) | Token::Keyword(Keyword::Replace) => {
                Ok(Statement::Insert(Box::new(self.parse_insert(ctes)?)))
            }
            Token::Keyword(Keyword::Update) => {
                Ok(Statement::Update(Box::new(self.parse_update(ctes)?)))
            }
            Token::Keyword(Keyword::Delete) => {
                Ok(Statement::Delete(Box::new(self.parse_delete(ctes)?)))
            }
            _ => {
                let mut select = self.parse_compound()?;
                select.ctes = ctes;
                Ok(Statement::Select(Box::new(select)))
            }
        }
    }
}

fn token_description(token: &Token<'_>) -> &'static str {
    match token {
        Token::LParen => "'('",
        Token::RParen => "')'",
        Token::Comma => "','",
        Token::Semicolon => "';'",
        Token::Dot => "'.'",
        Token::Eq => "'='",
        Token::Star => "'*'",
        Token::Ident(_) | Token::QuotedIdent(_) => "identifier",
        Token::String(_) => "string literal",
        Token::Integer(_) => "integer",
        _ => "token",
    }
}

/// Body of a quoted identifier with the delimiter escapes collapsed.
fn unquote_ident(text: &str, body: &str) -> String {
    match text.as_bytes().first() {
        Some(b'"') => body.replace("\"\"", "\""),
        Some(b'`') => body.replace("``", "`"),
        _ => body.to_string(),
    }
}
