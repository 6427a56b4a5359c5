//! Transaction control and utility statements.

use eyre::Result;

use super::Parser;
use crate::sql::ast::*;
use crate::sql::token::{Keyword, Token};


impl<'a> Parser<'a> {
    pub(crate) fn parse_begin(&mut self) -> Result<BeginStmt> {
        self.expect_keyword(Keyword::Begin)?;
        let mode = match self.peek() {
            Token::Keyword(Keyword::Deferred) => Some(TransactionMode::Deferred),
            Token::Keyword(Keyword::Immediate) => Some(TransactionMode::Immediate),
            Token::Keyword(Keyword::Exclusive) => Some(TransactionMode::Exclusive),
            _ => None,
        };
        if mode.is_some() {
            self.advance();
        }
        self.consume_keyword(Keyword::Transaction);
        Ok(BeginStmt { mode })
    }

    pub(crate) fn parse_rollback(&mut self) -> Result<RollbackStmt> {
        self.expect_keyword(Keyword::Rollback)?;
        self.consume_keyword(Keyword::Transaction);
        let savepoint = if self.consume_keyword(Keyword::To) {
            self.consume_keyword(Keyword::Savepoint);
            Some(self.expect_ident()?)
        } else {
            None
        };
        Ok(RollbackStmt { savepoint })
    }

    /// `PRAGMA [schema.]name [= value | (value)]`
    pub(crate) fn parse_pragma(&mut self) -> Result<PragmaStmt> {
        self.expect_keyword(Keyword::Pragma)?;
        let name = self.parse_object_name()?;
        let value = if self.consume_token(&Token::Eq) {
            Some(self.parse_expr(0)?)
        } else if self.consume_token(&Token::LParen) {
            let value = self.parse_expr(0)?;
            self.expect_token(&Token::RParen)?;
            Some(value)
        } else {
            None
        };
        Ok(PragmaStmt { name, value })
    }

    pub(crate) fn parse_explain(&mut self) -> Result<ExplainStmt> {
        self.expect_keyword(Keyword::Explain)?;
        let query_plan = if self.consume_keyword(Keyword::Query) {
            self.expect_keyword(Keyword::Plan)?;
            true
        } else {
            false
        };
        let statement = self.parse_statement()?;
        Ok(ExplainStmt {
            query_plan,
            statement,
        })
    }

    pub(crate) fn parse_vacuum(&mut self) -> Result<VacuumStmt> {
        self.expect_keyword(Keyword::Vacuum)?;
        let schema = if self.check_ident() {
            Some(self.expect_ident()?)
        } else {
            None
        };
        let into = if self.consume_keyword(Keyword::Into) {
            Some(self.expect_string()?)
        } else {
            None
        };
        Ok(VacuumStmt { schema, into })
    }

    pub(crate) fn parse_backup(&mut self) -> Result<BackupStmt> {
        self.expect_keyword(Keyword::Backup)?;
        let incremental = self.consume_keyword(Keyword::Incremental);
        self.expect_keyword(Keyword::To)?;
        let path = self.expect_string()?;
        Ok(BackupStmt { incremental, path })
    }
}
