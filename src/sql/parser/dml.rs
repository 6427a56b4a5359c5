//! INSERT, UPDATE and DELETE.

use eyre::Result;

use super::Parser;
use crate::sql::ast::*;
use crate::sql::token::{Keyword, Token};


impl<'a> Parser<'a> {
    pub(crate) fn parse_insert(&mut self, ctes: Vec<Cte>) -> Result<InsertStmt> {
        let or_action = if self.consume_keyword(Keyword::Replace) {
            Some(ConflictAction::Replace)
        } else {
            self.expect_keyword(Keyword::Insert)?;
            self.parse_or_action()?
        };
        self.expect_keyword(Keyword::Into)?;

        let table = self.parse_object_name()?;
        let alias = if self.consume_keyword(Keyword::As) {
            Some(self.expect_ident()?)
        } else {
            None
        };
        let columns = if self.check_token(&Token::LParen) {
            self.parse_paren_ident_list()?
        } else {
            Vec::new()
        };

        let source = if self.consume_keyword(Keyword::Default) {
            self.expect_keyword(Keyword::Values)?;
            InsertSource::DefaultValues
        } else if self.check_keyword(Keyword::Values) && !self.values_is_compound_head() {
            self.advance();
            InsertSource::Values(self.parse_values_rows()?)
        } else if self.check_select_start() {
            InsertSource::Select(Box::new(self.parse_select()?))
        } else {
            return Err(self.unexpected("VALUES, SELECT or DEFAULT VALUES"));
        };

        let on_conflict = if self.check_keyword(Keyword::On) {
            Some(self.parse_on_conflict()?)
        } else {
            None
        };
        let returning = self.parse_returning()?;

        Ok(InsertStmt {
            ctes,
            or_action,
            table,
            alias,
            columns,
            source,
            on_conflict,
            returning,
        })
    }

    /// `VALUES (...) UNION ...` is a SELECT source, not a row list. A clone of
    /// the lexer scans ahead to the end of the row list.
    fn values_is_compound_head(&self) -> bool {
        let mut lexer = self.lexer.clone();
        let mut depth = 0usize;
        loop {
            match lexer.next_spanned().token {
                Token::LParen => depth += 1,
                Token::RParen => depth = depth.saturating_sub(1),
                Token::Keyword(Keyword::Union | Keyword::Intersect | Keyword::Except)
                    if depth == 0 =>
                {
                    return true
                }
                Token::Keyword(Keyword::Order | Keyword::Limit) if depth == 0 => return true,
                Token::Semicolon | Token::Eof | Token::Error(_) => return false,
                Token::Keyword(Keyword::On | Keyword::Returning) if depth == 0 => return false,
                _ => {}
            }
        }
    }

    fn parse_or_action(&mut self) -> Result<Option<ConflictAction>> {
        if !self.consume_keyword(Keyword::Or) {
            return Ok(None);
        }
        let action = match self.peek() {
            Token::Keyword(Keyword::Rollback) => ConflictAction::Rollback,
            Token::Keyword(Keyword::Abort) => ConflictAction::Abort,
            Token::Keyword(Keyword::Fail) => ConflictAction::Fail,
            Token::Keyword(Keyword::Ignore) => ConflictAction::Ignore,
            Token::Keyword(Keyword::Replace) => ConflictAction::Replace,
            _ => return Err(self.unexpected("ROLLBACK, ABORT, FAIL, IGNORE or REPLACE")),
        };
        self.advance();
        Ok(Some(action))
    }

    /// `ON CONFLICT [(cols) [WHERE e]] DO NOTHING | DO UPDATE SET ... [WHERE e]`
    fn parse_on_conflict(&mut self) -> Result<OnConflict> {
        self.expect_keyword(Keyword::On)?;
        self.expect_keyword(Keyword::Conflict)?;

        let mut target = Vec::new();
        let mut target_where = None;
        if self.check_token(&Token::LParen) {
            target = self.parse_paren_ident_list()?;
            if self.consume_keyword(Keyword::Where) {
                target_where = Some(self.parse_expr(0)?);
            }
        }

        self.expect_keyword(Keyword::Do)?;
        let action = if self.consume_keyword(Keyword::Nothing) {
            OnConflictAction::DoNothing
        } else {
            self.expect_keyword(Keyword::Update)?;
            self.expect_keyword(Keyword::Set)?;
            let assignments = self.parse_assignments()?;
            let where_clause = if self.consume_keyword(Keyword::Where) {
                Some(self.parse_expr(0)?)
            } else {
                None
            };
            OnConflictAction::DoUpdate {
                assignments,
                where_clause,
            }
        };

        Ok(OnConflict {
            target,
            target_where,
            action,
        })
    }

    fn parse_assignments(&mut self) -> Result<Vec<Assignment>> {
        let mut assignments = Vec::new();
        loop {
            if self.check_token(&Token::LParen) {
                return Err(self.unsupported("row value assignment"));
            }
            let column = self.expect_ident()?;
            self.expect_token(&Token::Eq)?;
            let value = self.parse_expr(0)?;
            assignments.push(Assignment { column, value });
            if !self.consume_token(&Token::Comma) {
                return Ok(assignments);
            }
        }
    }

    fn parse_returning(&mut self) -> Result<Vec<Expr>> {
        if self.consume_keyword(Keyword::Returning) {
            self.parse_select_columns()
        } else {
            Ok(Vec::new())
        }
    }

    pub(crate) fn parse_update(&mut self, ctes: Vec<Cte>) -> Result<UpdateStmt> {
        self.expect_keyword(Keyword::Update)?;
        let or_action = self.parse_or_action()?;
        let table = self.parse_object_name()?;
        let alias = self.parse_table_alias()?;

        self.expect_keyword(Keyword::Set)?;
        let assignments = self.parse_assignments()?;

        let from = if self.consume_keyword(Keyword::From) {
            Some(self.parse_from_clause()?)
        } else {
            None
        };
        let where_clause = if self.consume_keyword(Keyword::Where) {
            Some(self.parse_expr(0)?)
        } else {
            None
        };

        let mut returning = self.parse_returning()?;
        let order_by = if self.consume_keyword(Keyword::Order) {
            self.expect_keyword(Keyword::By)?;
            self.parse_order_by_items()?
        } else {
            Vec::new()
        };
        let (limit, offset) = self.parse_limit_clause()?;
        if returning.is_empty() {
            returning = self.parse_returning()?;
        }

        Ok(UpdateStmt {
            ctes,
            or_action,
            table,
            alias,
            assignments,
            from,
            where_clause,
            order_by,
            limit,
            offset,
            returning,
        })
    }

    pub(crate) fn parse_delete(&mut self, ctes: Vec<Cte>) -> Result<DeleteStmt> {
        self.expect_keyword(Keyword::Delete)?;
        self.expect_keyword(Keyword::From)?;
        let table = self.parse_object_name()?;
        let alias = self.parse_table_alias()?;

        let where_clause = if self.consume_keyword(Keyword::Where) {
            Some(self.parse_expr(0)?)
        } else {
            None
        };

        let mut returning = self.parse_returning()?;
        let order_by = if self.consume_keyword(Keyword::Order) {
            self.expect_keyword(Keyword::By)?;
            self.parse_order_by_items()?
        } else {
            Vec::new()
        };
        let (limit, offset) = self.parse_limit_clause()?;
        if returning.is_empty() {
            returning = self.parse_returning()?;
        }

        Ok(DeleteStmt {
            ctes,
            table,
            alias,
            where_clause,
            order_by,
            limit,
            offset,
            returning,
        })
    }
}
