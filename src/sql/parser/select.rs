//! SELECT grammar: projection, FROM/JOIN, WHERE, GROUP BY, HAVING, WINDOW,
//! compound operators, ORDER BY and LIMIT, plus the WITH clause.
//!
//! ORDER BY and LIMIT written after the last operand of a compound query
//! belong to the whole chain and are hoisted onto the head statement.

use std::mem;

use eyre::Result;

use super::Parser;
use crate::config::SELECT_DEPTH_COST;
use crate::sql::ast::*;
use crate::sql::token::{Keyword, Token};
use crate::types::Value;


impl<'a> Parser<'a> {
    /// `[WITH ...] select-core [compound ...] [ORDER BY] [LIMIT]`
    pub(crate) fn parse_select(&mut self) -> Result<SelectStmt> {
        self.enter(SELECT_DEPTH_COST)?;
        let ctes = if self.check_keyword(Keyword::With) {
            self.parse_with_clause()?
        } else {
            Vec::new()
        };
        let mut select = self.parse_compound()?;
        select.ctes = ctes;
        self.leave(SELECT_DEPTH_COST);
        Ok(select)
    }

    pub(crate) fn check_select_start(&self) -> bool {
        matches!(
            self.peek(),
            Token::Keyword(Keyword::Select)
                | Token::Keyword(Keyword::With)
                | Token::Keyword(Keyword::Values)
        )
    }

    /// `( select )` as used by subqueries, EXISTS and IN.
    pub(crate) fn parse_paren_select(&mut self) -> Result<SelectStmt> {
        self.expect_token(&Token::LParen)?;
        let select = self.parse_select()?;
        self.expect_token(&Token::RParen)?;
        Ok(select)
    }

    pub(crate) fn parse_compound(&mut self) -> Result<SelectStmt> {
        let mut select = self.parse_select_core()?;

        if let Some((op, all)) = self.parse_set_operator()? {
            let mut right = self.parse_compound()?;
            select.order_by = mem::take(&mut right.order_by);
            select.limit = right.limit.take();
            select.offset = right.offset.take();
            select.compound = Some(Box::new(SetOperation { op, all, right }));
            return Ok(select);
        }

        self.parse_order_limit(&mut select)?;
        if self.check_set_operator() {
            return Err(self.unsupported("ORDER BY or LIMIT before a compound operator"));
        }
        Ok(select)
    }

    fn check_set_operator(&self) -> bool {
        matches!(
            self.peek(),
            Token::Keyword(Keyword::Union)
                | Token::Keyword(Keyword::Intersect)
                | Token::Keyword(Keyword::Except)
        )
    }

    fn parse_set_operator(&mut self) -> Result<Option<(SetOperator, bool)>> {
        let op = match self.peek() {
            Token::Keyword(Keyword::Union) => SetOperator::Union,
            Token::Keyword(Keyword::Intersect) => SetOperator::Intersect,
            Token::Keyword(Keyword::Except) => SetOperator::Except,
            _ => return Ok(None),
        };
        self.advance();

        if self.check_keyword(Keyword::Distinct) {
            return Err(self.unsupported("DISTINCT after a compound operator"));
        }
        let all = self.consume_keyword(Keyword::All);
        Ok(Some((op, all)))
    }

    fn parse_select_core(&mut self) -> Result<SelectStmt> {
        if self.consume_keyword(Keyword::Values) {
            let rows = self.parse_values_rows()?;
            return Ok(SelectStmt {
                columns: vec![Expr::star()],
                from: Some(FromClause {
                    source: TableSource::Values { rows, alias: None },
                    joins: Vec::new(),
                }),
                ..SelectStmt::default()
            });
        }

        self.expect_keyword(Keyword::Select)?;
        let distinct = if self.consume_keyword(Keyword::Distinct) {
            true
        } else {
            self.consume_keyword(Keyword::All);
            false
        };

        let columns = self.parse_select_columns()?;

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

        let group_by = if self.consume_keyword(Keyword::Group) {
            self.expect_keyword(Keyword::By)?;
            self.parse_expr_list()?
        } else {
            Vec::new()
        };

        let having = if self.consume_keyword(Keyword::Having) {
            Some(self.parse_expr(0)?)
        } else {
            None
        };

        let windows = if self.consume_keyword(Keyword::Window) {
            self.parse_named_windows()?
        } else {
            Vec::new()
        };

        Ok(SelectStmt {
            distinct,
            columns,
            from,
            where_clause,
            group_by,
            having,
            windows,
            ..SelectStmt::default()
        })
    }

    /// `(expr, ...), (expr, ...)`
    pub(crate) fn parse_values_rows(&mut self) -> Result<Vec<Vec<Expr>>> {
        let mut rows = Vec::new();
        loop {
            self.expect_token(&Token::LParen)?;
            rows.push(self.parse_expr_list()?);
            self.expect_token(&Token::RParen)?;
            if !self.consume_token(&Token::Comma) {
                return Ok(rows);
            }
        }
    }

    pub(crate) fn parse_select_columns(&mut self) -> Result<Vec<Expr>> {
        let mut columns = vec![self.parse_select_item()?];
        while self.consume_token(&Token::Comma) {
            columns.push(self.parse_select_item()?);
        }
        Ok(columns)
    }

    fn parse_select_item(&mut self) -> Result<Expr> {
        if self.consume_token(&Token::Star) {
            return Ok(Expr::star());
        }

        let expr = self.parse_expr(0)?;
        if self.consume_keyword(Keyword::As) {
            let alias = self.expect_ident()?;
            return Ok(expr.alias(alias));
        }
        if self.check_implicit_alias() {
            let alias = self.expect_ident()?;
            return Ok(expr.alias(alias));
        }
        Ok(expr)
    }

    /// A name directly after a projection item is an alias only when the
    /// item clearly ends after it.
    fn check_implicit_alias(&self) -> bool {
        let is_name = matches!(
            self.peek(),
            Token::Ident(_) | Token::QuotedIdent(_) | Token::String(_)
        ) || matches!(self.peek(), Token::Keyword(k) if !k.is_reserved());
        if !is_name {
            return false;
        }
        match self.peek_next() {
            Token::Comma | Token::RParen | Token::Semicolon | Token::Eof => true,
            Token::Keyword(k) => k.ends_select_item(),
            _ => false,
        }
    }

    pub(crate) fn parse_from_clause(&mut self) -> Result<FromClause> {
        let source = self.parse_table_source()?;
        let mut joins = Vec::new();

        loop {
            if self.consume_token(&Token::Comma) {
                joins.push(JoinClause {
                    join_type: JoinType::Cross,
                    natural: false,
                    source: self.parse_table_source()?,
                    condition: JoinCondition::None,
                });
                continue;
            }

            let Some((join_type, natural)) = self.parse_join_operator()? else {
                break;
            };
            let source = self.parse_table_source()?;
            let condition = if self.consume_keyword(Keyword::On) {
                JoinCondition::On(self.parse_expr(0)?)
            } else if self.consume_keyword(Keyword::Using) {
                JoinCondition::Using(self.parse_paren_ident_list()?)
            } else {
                JoinCondition::None
            };
            joins.push(JoinClause {
                join_type,
                natural,
                source,
                condition,
            });
        }

        Ok(FromClause { source, joins })
    }

    fn parse_join_operator(&mut self) -> Result<Option<(JoinType, bool)>> {
        let natural = self.consume_keyword(Keyword::Natural);

        let join_type = match self.peek() {
            Token::Keyword(Keyword::Join) => JoinType::Inner,
            Token::Keyword(Keyword::Inner) => {
                self.advance();
                JoinType::Inner
            }
            Token::Keyword(Keyword::Cross) => {
                self.advance();
                JoinType::Cross
            }
            Token::Keyword(Keyword::Left) => {
                self.advance();
                self.consume_keyword(Keyword::Outer);
                JoinType::Left
            }
            Token::Keyword(Keyword::Right) => {
                self.advance();
                self.consume_keyword(Keyword::Outer);
                JoinType::Right
            }
            Token::Keyword(Keyword::Full) => {
                self.advance();
                self.consume_keyword(Keyword::Outer);
                JoinType::Full
            }
            _ if natural => return Err(self.unexpected("JOIN")),
            _ => return Ok(None),
        };

        self.expect_keyword(Keyword::Join)?;
        Ok(Some((join_type, natural)))
    }

    fn parse_table_source(&mut self) -> Result<TableSource> {
        if self.consume_token(&Token::LParen) {
            if self.consume_keyword(Keyword::Values) {
                let rows = self.parse_values_rows()?;
                self.expect_token(&Token::RParen)?;
                let alias = self.parse_table_alias()?;
                return Ok(TableSource::Values { rows, alias });
            }
            if self.check_select_start() {
                let query = Box::new(self.parse_select()?);
                self.expect_token(&Token::RParen)?;
                let alias = self.parse_table_alias()?;
                return Ok(TableSource::Subquery { query, alias });
            }
            return Err(self.unsupported("parenthesized join"));
        }

        let name = self.parse_object_name()?;
        if self.consume_token(&Token::LParen) {
            let args = if self.check_token(&Token::RParen) {
                Vec::new()
            } else {
                self.parse_expr_list()?
            };
            self.expect_token(&Token::RParen)?;
            let alias = self.parse_table_alias()?;
            return Ok(TableSource::Function {
                name: name.name,
                args,
                alias,
            });
        }

        let alias = self.parse_table_alias()?;
        let indexed = if self.consume_keyword(Keyword::Indexed) {
            self.expect_keyword(Keyword::By)?;
            Some(IndexHint::IndexedBy(self.expect_ident()?))
        } else if self.check_keyword(Keyword::Not) && self.peek_next() == Token::Keyword(Keyword::Indexed) {
            self.advance();
            self.advance();
            Some(IndexHint::NotIndexed)
        } else {
            None
        };

        Ok(TableSource::Table {
            name,
            alias,
            indexed,
        })
    }

    /// `[AS] alias` after a table source.
    pub(crate) fn parse_table_alias(&mut self) -> Result<Option<String>> {
        if self.consume_keyword(Keyword::As) {
            return Ok(Some(self.expect_ident()?));
        }
        if self.check_ident()
            && !self.check_keyword(Keyword::Indexed)
            && !self.check_keyword(Keyword::Fetch)
        {
            return Ok(Some(self.expect_ident()?));
        }
        Ok(None)
    }

    /// `name` or `schema.name`.
    pub(crate) fn parse_object_name(&mut self) -> Result<ObjectName> {
        let first = self.expect_ident()?;
        if self.consume_token(&Token::Dot) {
            let name = self.expect_ident()?;
            return Ok(ObjectName {
                schema: Some(first),
                name,
            });
        }
        Ok(ObjectName::bare(first))
    }

    pub(crate) fn parse_optional_object_name(&mut self) -> Result<Option<ObjectName>> {
        if self.check_ident() {
            Ok(Some(self.parse_object_name()?))
        } else {
            Ok(None)
        }
    }

    fn parse_named_windows(&mut self) -> Result<Vec<NamedWindow>> {
        let mut windows = Vec::new();
        loop {
            let name = self.expect_ident()?;
            self.expect_keyword(Keyword::As)?;
            self.expect_token(&Token::LParen)?;
            let spec = self.parse_window_spec()?;
            self.expect_token(&Token::RParen)?;
            windows.push(NamedWindow { name, spec });
            if !self.consume_token(&Token::Comma) {
                return Ok(windows);
            }
        }
    }

    /// `WITH [RECURSIVE] name [(cols)] AS (select), ...`
    pub(crate) fn parse_with_clause(&mut self) -> Result<Vec<Cte>> {
        self.expect_keyword(Keyword::With)?;
        let recursive = self.consume_keyword(Keyword::Recursive);

        let mut ctes = Vec::new();
        loop {
            let name = self.expect_ident()?;
            let columns = if self.check_token(&Token::LParen) {
                self.parse_paren_ident_list()?
            } else {
                Vec::new()
            };
            self.expect_keyword(Keyword::As)?;
            self.skip_materialized_hint();
            let query = Box::new(self.parse_paren_select()?);
            ctes.push(Cte {
                name,
                columns,
                query,
                recursive,
            });
            if !self.consume_token(&Token::Comma) {
                return Ok(ctes);
            }
        }
    }

    /// `[NOT] MATERIALIZED` carries no meaning for this engine.
    fn skip_materialized_hint(&mut self) {
        let is_materialized =
            |token: &Token<'_>| matches!(token, Token::Ident(s) if s.eq_ignore_ascii_case("materialized"));
        if self.check_keyword(Keyword::Not) && is_materialized(&self.peek_next()) {
            self.advance();
            self.advance();
        } else if is_materialized(self.peek()) {
            self.advance();
        }
    }

    pub(crate) fn parse_order_limit(&mut self, select: &mut SelectStmt) -> Result<()> {
        if self.consume_keyword(Keyword::Order) {
            self.expect_keyword(Keyword::By)?;
            select.order_by = self.parse_order_by_items()?;
        }
        let (limit, offset) = self.parse_limit_clause()?;
        select.limit = limit;
        select.offset = offset;
        Ok(())
    }

    pub(crate) fn parse_order_by_items(&mut self) -> Result<Vec<OrderByItem>> {
        let mut items = vec![self.parse_order_by_item()?];
        while self.consume_token(&Token::Comma) {
            items.push(self.parse_order_by_item()?);
        }
        Ok(items)
    }

    fn parse_order_by_item(&mut self) -> Result<OrderByItem> {
        if self.check_keyword(Keyword::Is) {
            return Err(self.unsupported("ORDER BY term starting with IS"));
        }
        let expr = self.parse_expr(0)?;

        let direction = if self.consume_keyword(Keyword::Desc) {
            OrderDirection::Desc
        } else {
            self.consume_keyword(Keyword::Asc);
            OrderDirection::Asc
        };

        let nulls = if self.consume_keyword(Keyword::Nulls) {
            if self.consume_keyword(Keyword::First) {
                NullsOrder::First
            } else if self.consume_keyword(Keyword::Last) {
                NullsOrder::Last
            } else {
                return Err(self.unexpected("FIRST or LAST"));
            }
        } else if self.check_keyword(Keyword::First) || self.check_keyword(Keyword::Last) {
            return Err(self.unsupported("FIRST or LAST without NULLS"));
        } else {
            NullsOrder::Default
        };

        Ok(OrderByItem {
            expr,
            direction,
            nulls,
        })
    }

    /// `LIMIT n [OFFSET m]`, `LIMIT m, n`, or
    /// `[OFFSET m {ROW|ROWS}] [FETCH {FIRST|NEXT} [n] {ROW|ROWS} ONLY]`.
    pub(crate) fn parse_limit_clause(&mut self) -> Result<(Option<Expr>, Option<Expr>)> {
        if self.consume_keyword(Keyword::Limit) {
            let first = self.parse_expr(0)?;
            if self.consume_token(&Token::Comma) {
                let count = self.parse_expr(0)?;
                return Ok((Some(count), Some(first)));
            }
            let offset = if self.consume_keyword(Keyword::Offset) {
                Some(self.parse_expr(0)?)
            } else {
                None
            };
            return Ok((Some(first), offset));
        }

        let mut offset = None;
        if self.consume_keyword(Keyword::Offset) {
            offset = Some(self.parse_expr(0)?);
            if !self.consume_keyword(Keyword::Rows) && !self.consume_keyword(Keyword::Row) {
                return Err(self.unexpected("ROW or ROWS"));
            }
        }

        let mut limit = None;
        if self.consume_keyword(Keyword::Fetch) {
            if !self.consume_keyword(Keyword::First) && !self.consume_keyword(Keyword::Next) {
                return Err(self.unexpected("FIRST or NEXT"));
            }
            let count = if self.check_keyword(Keyword::Row) || self.check_keyword(Keyword::Rows) {
                Expr::Literal(Value::Int(1))
            } else {
                self.parse_expr(0)?
            };
            if !self.consume_keyword(Keyword::Rows) && !self.consume_keyword(Keyword::Row) {
                return Err(self.unexpected("ROW or ROWS"));
            }
            self.expect_keyword(Keyword::Only)?;
            limit = Some(count);
        }

        Ok((limit, offset))
    }
}
