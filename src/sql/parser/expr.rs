//! Expression grammar.
//!
//! `parse_expr(min_bp)` is a Pratt loop over `(op, l_bp, r_bp)` triples. The
//! comparison-tier keyword forms (IS, IN, LIKE, GLOB, MATCH, REGEXP, BETWEEN)
//! are handled inline at binding power 6 because their right-hand side is not
//! a plain operand.

use eyre::Result;

use super::Parser;
use crate::sql::ast::*;
use crate::sql::token::{Keyword, Parameter, Token};
use crate::types::Value;

#[cfg(test)]
mod tests {
    use super::super::{parse, ParseError};
    use super::*;

    fn expr(sql: &str) -> Expr {
        let stmt = parse(&format!("SELECT {}", sql)).unwrap();
        let select = stmt.as_select().cloned().unwrap();
        select.columns.into_iter().next().unwrap()
    }

    fn col(name: &str) -> Expr {
        Expr::column(name)
    }

    fn int(v: i64) -> Expr {
        Expr::Literal(Value::Int(v))
    }

    #[test]
    fn parse_precedence_mul_over_add() {
        assert_eq!(
            expr("1 + 2 * 3"),
            Expr::binary(
                BinaryOp::Plus,
                int(1),
                Expr::binary(BinaryOp::Multiply, int(2), int(3))
            )
        );
    }

    #[test]
    fn parse_left_associative_subtraction() {
        assert_eq!(
            expr("a - b - c"),
            Expr::binary(
                BinaryOp::Minus,
                Expr::binary(BinaryOp::Minus, col("a"), col("b")),
                col("c")
            )
        );
    }

    #[test]
    fn parse_and_binds_tighter_than_or() {
        let e = expr("a = 1 OR b = 2 AND c = 3");
        match e {
            Expr::Binary { op: BinaryOp::Or, right, .. } => {
                assert!(matches!(*right, Expr::Binary { op: BinaryOp::And, .. }));
            }
            other => panic!("expected OR, got {:?}", other),
        }
    }

    #[test]
    fn parse_not_covers_comparison() {
        let e = expr("NOT a = 1 AND b");
        match e {
            Expr::Binary { op: BinaryOp::And, left, .. } => match *left {
                Expr::Unary { op: UnaryOp::Not, expr } => {
                    assert!(matches!(*expr, Expr::Binary { op: BinaryOp::Eq, .. }));
                }
                other => panic!("expected NOT, got {:?}", other),
            },
            other => panic!("expected AND, got {:?}", other),
        }
    }

    #[test]
    fn parse_bitwise_between_comparison_and_additive() {
        let e = expr("a & 1 + 2 = 3");
        match e {
            Expr::Binary { op: BinaryOp::Eq, left, .. } => match *left {
                Expr::Binary { op: BinaryOp::BitAnd, right, .. } => {
                    assert!(matches!(*right, Expr::Binary { op: BinaryOp::Plus, .. }));
                }
                other => panic!("expected &, got {:?}", other),
            },
            other => panic!("expected =, got {:?}", other),
        }
    }

    #[test]
    fn parse_negative_literal_folds() {
        assert_eq!(expr("-5"), int(-5));
        assert_eq!(expr("-9223372036854775808"), int(i64::MIN));
        assert_eq!(expr("- 2.5"), Expr::Literal(Value::Float(-2.5)));
        assert!(matches!(
            expr("-a"),
            Expr::Unary { op: UnaryOp::Minus, .. }
        ));
    }

    #[test]
    fn parse_integer_overflow_becomes_float() {
        assert_eq!(
            expr("9223372036854775808"),
            Expr::Literal(Value::Float(9223372036854775808.0))
        );
    }

    #[test]
    fn parse_literals() {
        assert_eq!(expr("'it''s'"), Expr::Literal(Value::Text("it's".into())));
        assert_eq!(
            expr("x'CAFE'"),
            Expr::Literal(Value::Blob(vec![0xCA, 0xFE]))
        );
        assert_eq!(expr("1.5e2"), Expr::Literal(Value::Float(150.0)));
    }

    #[test]
    fn parse_placeholders() {
        assert_eq!(expr("?"), Expr::Placeholder(Placeholder::Positional(1)));
        assert_eq!(expr("?3"), Expr::Placeholder(Placeholder::Numbered(3)));
        assert_eq!(
            expr(":name"),
            Expr::Placeholder(Placeholder::Named(":name".into()))
        );
    }

    #[test]
    fn parse_is_forms() {
        assert!(matches!(expr("a IS NULL"), Expr::Binary { op: BinaryOp::Is, .. }));
        assert!(matches!(
            expr("a IS NOT NULL"),
            Expr::Binary { op: BinaryOp::IsNot, .. }
        ));
        assert!(matches!(
            expr("a IS DISTINCT FROM b"),
            Expr::Binary { op: BinaryOp::IsNot, .. }
        ));
        assert!(matches!(
            expr("a IS NOT DISTINCT FROM b"),
            Expr::Binary { op: BinaryOp::Is, .. }
        ));
    }

    #[test]
    fn parse_between_and_not_between() {
        match expr("a NOT BETWEEN 1 AND 10") {
            Expr::Between {
                negated, low, high, ..
            } => {
                assert!(negated);
                assert_eq!(*low, int(1));
                assert_eq!(*high, int(10));
            }
            other => panic!("expected BETWEEN, got {:?}", other),
        }
    }

    #[test]
    fn parse_between_inside_and_chain() {
        let e = expr("a BETWEEN 1 AND 2 AND b = 3");
        assert!(matches!(e, Expr::Binary { op: BinaryOp::And, .. }));
    }

    #[test]
    fn parse_in_list_folds_constants() {
        match expr("x IN (1 + 2, -(3), 'a' || 'b', 10 / 0, y)") {
            Expr::InList { list, negated, .. } => {
                assert!(!negated);
                assert_eq!(list[0], int(3));
                assert_eq!(list[1], int(-3));
                assert_eq!(list[2], Expr::Literal(Value::Text("ab".into())));
                assert!(matches!(list[3], Expr::Binary { op: BinaryOp::Divide, .. }));
                assert_eq!(list[4], col("y"));
            }
            other => panic!("expected IN list, got {:?}", other),
        }
    }

    #[test]
    fn parse_in_list_mixed_arithmetic_promotes() {
        match expr("x IN (1 + 0.5)") {
            Expr::InList { list, .. } => {
                assert_eq!(list[0], Expr::Literal(Value::Float(1.5)))
            }
            other => panic!("expected IN list, got {:?}", other),
        }
    }

    #[test]
    fn parse_not_in_subquery_and_empty_list() {
        assert!(matches!(
            expr("x NOT IN (SELECT id FROM t)"),
            Expr::InSubquery { negated: true, .. }
        ));
        assert!(matches!(
            expr("x IN ()"),
            Expr::InList { ref list, .. } if list.is_empty()
        ));
    }

    #[test]
    fn parse_like_escape_becomes_function() {
        match expr("a NOT LIKE 'x%' ESCAPE '!'") {
            Expr::Unary {
                op: UnaryOp::Not,
                expr,
            } => match *expr {
                Expr::FuncCall(call) => {
                    assert_eq!(call.name, "LIKE");
                    assert_eq!(call.args.len(), 3);
                    assert_eq!(call.args[1], col("a"));
                }
                other => panic!("expected LIKE call, got {:?}", other),
            },
            other => panic!("expected NOT, got {:?}", other),
        }
        assert!(matches!(
            expr("a GLOB 'x*'"),
            Expr::Binary { op: BinaryOp::Glob, .. }
        ));
        assert!(matches!(
            expr("a NOT REGEXP 'x'"),
            Expr::Binary { op: BinaryOp::NotRegexp, .. }
        ));
    }

    #[test]
    fn parse_not_match_rejected() {
        let err = parse("SELECT a NOT MATCH 'x'").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ParseError>(),
            Some(ParseError::Unsupported { .. })
        ));
    }

    #[test]
    fn parse_json_arrows() {
        match expr("doc ->> '$.name'") {
            Expr::FuncCall(call) => {
                assert_eq!(call.name, "JSON_EXTRACT");
                assert!(call.text_mode);
            }
            other => panic!("expected JSON_EXTRACT, got {:?}", other),
        }
        match expr("doc -> '$.a'") {
            Expr::FuncCall(call) => assert!(!call.text_mode),
            other => panic!("expected JSON_EXTRACT, got {:?}", other),
        }
    }

    #[test]
    fn parse_any_all_quantifiers() {
        assert!(matches!(
            expr("a > ALL (SELECT b FROM t)"),
            Expr::AnyAll { quantifier: Quantifier::All, op: BinaryOp::Gt, .. }
        ));
        assert!(matches!(
            expr("a = SOME (SELECT b FROM t)"),
            Expr::AnyAll { quantifier: Quantifier::Any, .. }
        ));
    }

    #[test]
    fn parse_case_cast_collate() {
        match expr("CASE x WHEN 1 THEN 'a' ELSE 'b' END") {
            Expr::Case {
                operand,
                conditions,
                else_result,
            } => {
                assert!(operand.is_some());
                assert_eq!(conditions.len(), 1);
                assert!(else_result.is_some());
            }
            other => panic!("expected CASE, got {:?}", other),
        }
        assert_eq!(
            expr("CAST(a AS VARCHAR(20))"),
            Expr::Cast {
                expr: Box::new(col("a")),
                type_name: "VARCHAR(20)".into()
            }
        );
        assert_eq!(
            expr("name COLLATE NOCASE"),
            Expr::Collate {
                expr: Box::new(col("name")),
                collation: "NOCASE".into()
            }
        );
    }

    #[test]
    fn parse_exists_and_not_exists() {
        assert!(matches!(
            expr("NOT EXISTS (SELECT 1)"),
            Expr::Exists { negated: true, .. }
        ));
        assert!(matches!(expr("(SELECT 1)"), Expr::Subquery(_)));
    }

    #[test]
    fn parse_function_calls() {
        match expr("count(DISTINCT a) FILTER (WHERE a > 0)") {
            Expr::FuncCall(call) => {
                assert_eq!(call.name, "COUNT");
                assert!(call.distinct);
                assert!(call.filter.is_some());
            }
            other => panic!("expected call, got {:?}", other),
        }
        match expr("COUNT(*)") {
            Expr::FuncCall(call) => assert!(call.star && call.args.is_empty()),
            other => panic!("expected call, got {:?}", other),
        }
        assert!(matches!(expr("replace(a, 'x', 'y')"), Expr::FuncCall(_)));
    }

    #[test]
    fn parse_window_function_inline_spec() {
        match expr("SUM(x) OVER (PARTITION BY g ORDER BY x ROWS BETWEEN 1 PRECEDING AND CURRENT ROW)") {
            Expr::WindowFunc(wf) => {
                assert_eq!(wf.name, "SUM");
                assert_eq!(wf.partition, vec![col("g")]);
                let frame = wf.frame.unwrap();
                assert_eq!(frame.mode, WindowFrameMode::Rows);
                assert_eq!(frame.start, WindowFrameBound::Preceding(Box::new(int(1))));
                assert_eq!(frame.end, Some(WindowFrameBound::CurrentRow));
            }
            other => panic!("expected window function, got {:?}", other),
        }
    }

    #[test]
    fn parse_window_function_named() {
        match expr("row_number() OVER w") {
            Expr::WindowFunc(wf) => {
                assert_eq!(wf.name, "ROW_NUMBER");
                assert_eq!(wf.window_name.as_deref(), Some("w"));
            }
            other => panic!("expected window function, got {:?}", other),
        }
    }

    #[test]
    fn parse_three_part_column() {
        assert_eq!(expr("main.t.c"), Expr::qualified("t", "c"));
        assert_eq!(expr("t.c"), Expr::qualified("t", "c"));
    }

    #[test]
    fn parse_row_value_rejected() {
        let err = parse("SELECT * FROM t WHERE (a, b) = (1, 2)").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ParseError>(),
            Some(ParseError::Unsupported { .. })
        ));
    }

    #[test]
    fn parse_unique_subquery_rejected() {
        let err = parse("SELECT UNIQUE (SELECT 1)").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ParseError>(),
            Some(ParseError::Unsupported { .. })
        ));
    }

    #[test]
    fn parse_render_reparse_is_stable() {
        for sql in [
            "a + b * c - d",
            "(a OR b) AND NOT c",
            "x NOT IN (1, 2, 3)",
            "CASE WHEN a > 1 THEN 'big' END",
            "-(a + 1)",
            "t.\"select\" || 'x'",
        ] {
            let first = expr(sql);
            let rendered = first.to_string();
            assert_eq!(expr(&rendered), first, "round trip of {}", sql);
        }
    }
}

impl<'a> Parser<'a> {
    pub(crate) fn parse_expr(&mut self, min_bp: u8) -> Result<Expr> {
        self.enter(1)?;
        let result = self.parse_expr_bp(min_bp);
        self.leave(1);
        result
    }

    pub(crate) fn parse_expr_list(&mut self) -> Result<Vec<Expr>> {
        let mut exprs = vec![self.parse_expr(0)?];
        while self.consume_token(&Token::Comma) {
            exprs.push(self.parse_expr(0)?);
        }
        Ok(exprs)
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Expr> {
        let mut lhs = self.parse_prefix()?;

        loop {
            if let Some((op, l_bp, r_bp)) = self.peek_binary_op() {
                if l_bp < min_bp {
                    break;
                }
                self.advance();
                lhs = self.parse_binary_rhs(lhs, op, r_bp)?;
                continue;
            }

            match self.peek() {
                Token::Arrow | Token::DoubleArrow => {
                    if 10 < min_bp {
                        break;
                    }
                    let text_mode = matches!(self.advance().token, Token::DoubleArrow);
                    let path = self.parse_expr(11)?;
                    let mut call = FunctionCall::new("JSON_EXTRACT", vec![lhs, path]);
                    call.text_mode = text_mode;
                    lhs = Expr::FuncCall(call);
                }
                Token::Keyword(Keyword::Is) => {
                    if 6 < min_bp {
                        break;
                    }
                    self.advance();
                    lhs = self.parse_is(lhs)?;
                }
                Token::Keyword(Keyword::Not) => {
                    if !is_negatable_keyword(&self.peek_next()) {
                        break;
                    }
                    if 6 < min_bp {
                        break;
                    }
                    self.advance();
                    lhs = self.parse_comparison_keyword(lhs, true)?;
                }
                token if is_negatable_keyword(token) => {
                    if 6 < min_bp {
                        break;
                    }
                    lhs = self.parse_comparison_keyword(lhs, false)?;
                }
                Token::Keyword(Keyword::Collate) => {
                    if 18 < min_bp {
                        break;
                    }
                    self.advance();
                    let collation = self.expect_ident()?;
                    lhs = Expr::Collate {
                        expr: Box::new(lhs),
                        collation,
                    };
                }
                _ => break,
            }
        }

        Ok(lhs)
    }

    fn peek_binary_op(&self) -> Option<(BinaryOp, u8, u8)> {
        let op = match self.peek() {
            Token::Keyword(Keyword::Or) => BinaryOp::Or,
            Token::Keyword(Keyword::And) => BinaryOp::And,
            Token::Eq => BinaryOp::Eq,
            Token::NotEq => BinaryOp::NotEq,
            Token::Lt => BinaryOp::Lt,
            Token::LtEq => BinaryOp::LtEq,
            Token::Gt => BinaryOp::Gt,
            Token::GtEq => BinaryOp::GtEq,
            Token::Ampersand => BinaryOp::BitAnd,
            Token::LeftShift => BinaryOp::LeftShift,
            Token::RightShift => BinaryOp::RightShift,
            Token::Plus => BinaryOp::Plus,
            Token::Minus => BinaryOp::Minus,
            Token::Concat => BinaryOp::Concat,
            Token::Star => BinaryOp::Multiply,
            Token::Slash => BinaryOp::Divide,
            Token::Percent => BinaryOp::Modulo,
            _ => return None,
        };
        let l_bp = op.binding_power();
        Some((op, l_bp, l_bp + 1))
    }

    fn parse_binary_rhs(&mut self, lhs: Expr, op: BinaryOp, r_bp: u8) -> Result<Expr> {
        if op.is_comparison() {
            let quantifier = match self.peek() {
                Token::Keyword(Keyword::Any) | Token::Keyword(Keyword::Some) => {
                    Some(Quantifier::Any)
                }
                Token::Keyword(Keyword::All) => Some(Quantifier::All),
                _ => None,
            };
            if let Some(quantifier) = quantifier {
                self.advance();
                let subquery = Box::new(self.parse_paren_select()?);
                return Ok(Expr::AnyAll {
                    left: Box::new(lhs),
                    op,
                    quantifier,
                    subquery,
                });
            }
        }

        let rhs = self.parse_expr(r_bp)?;
        Ok(Expr::binary(op, lhs, rhs))
    }

    /// After `IS`: `[NOT] [DISTINCT FROM] rhs`.
    fn parse_is(&mut self, lhs: Expr) -> Result<Expr> {
        let negated = self.consume_keyword(Keyword::Not);
        let op = if self.consume_keyword(Keyword::Distinct) {
            self.expect_keyword(Keyword::From)?;
            if negated {
                BinaryOp::Is
            } else {
                BinaryOp::IsNot
            }
        } else if negated {
            BinaryOp::IsNot
        } else {
            BinaryOp::Is
        };
        let rhs = self.parse_expr(7)?;
        Ok(Expr::binary(op, lhs, rhs))
    }

    fn parse_comparison_keyword(&mut self, lhs: Expr, negated: bool) -> Result<Expr> {
        let keyword = match self.peek() {
            Token::Keyword(k) => *k,
            _ => return Err(self.unexpected("IN, BETWEEN, LIKE, GLOB, MATCH or REGEXP")),
        };
        if keyword == Keyword::Match && negated {
            return Err(self.unsupported("NOT MATCH"));
        }
        self.advance();

        match keyword {
            Keyword::Between => {
                let low = self.parse_expr(7)?;
                self.expect_keyword(Keyword::And)?;
                let high = self.parse_expr(7)?;
                Ok(Expr::Between {
                    expr: Box::new(lhs),
                    low: Box::new(low),
                    high: Box::new(high),
                    negated,
                })
            }
            Keyword::In => self.parse_in(lhs, negated),
            Keyword::Like => {
                let pattern = self.parse_expr(7)?;
                if self.consume_keyword(Keyword::Escape) {
                    let escape = self.parse_expr(7)?;
                    let call = Expr::FuncCall(FunctionCall::new("LIKE", vec![pattern, lhs, escape]));
                    return Ok(if negated {
                        Expr::Unary {
                            op: UnaryOp::Not,
                            expr: Box::new(call),
                        }
                    } else {
                        call
                    });
                }
                let op = if negated {
                    BinaryOp::NotLike
                } else {
                    BinaryOp::Like
                };
                Ok(Expr::binary(op, lhs, pattern))
            }
            Keyword::Glob => {
                let op = if negated {
                    BinaryOp::NotGlob
                } else {
                    BinaryOp::Glob
                };
                let pattern = self.parse_expr(7)?;
                Ok(Expr::binary(op, lhs, pattern))
            }
            Keyword::Regexp => {
                let op = if negated {
                    BinaryOp::NotRegexp
                } else {
                    BinaryOp::Regexp
                };
                let pattern = self.parse_expr(7)?;
                Ok(Expr::binary(op, lhs, pattern))
            }
            Keyword::Match => {
                let pattern = self.parse_expr(7)?;
                Ok(Expr::binary(BinaryOp::Match, lhs, pattern))
            }
            _ => Err(self.unexpected("IN, BETWEEN, LIKE, GLOB, MATCH or REGEXP")),
        }
    }

    fn parse_in(&mut self, lhs: Expr, negated: bool) -> Result<Expr> {
        self.expect_token(&Token::LParen)?;

        if self.check_select_start() {
            let subquery = Box::new(self.parse_select()?);
            self.expect_token(&Token::RParen)?;
            return Ok(Expr::InSubquery {
                expr: Box::new(lhs),
                subquery,
                negated,
            });
        }

        let list = if self.check_token(&Token::RParen) {
            Vec::new()
        } else {
            self.parse_expr_list()?
                .into_iter()
                .map(fold_constant)
                .collect()
        };
        self.expect_token(&Token::RParen)?;

        Ok(Expr::InList {
            expr: Box::new(lhs),
            list,
            negated,
        })
    }

    fn parse_prefix(&mut self) -> Result<Expr> {
        match self.peek().clone() {
            Token::Integer(text) => {
                self.advance();
                Ok(Expr::Literal(integer_literal(text, false)))
            }
            Token::Float(text) => {
                self.advance();
                Ok(Expr::Literal(float_literal(text, false)))
            }
            Token::String(body) => {
                self.advance();
                Ok(Expr::Literal(Value::Text(body.replace("''", "'"))))
            }
            Token::Blob(hex) => {
                let bytes = decode_hex(hex).ok_or_else(|| self.unexpected("blob literal"))?;
                self.advance();
                Ok(Expr::Literal(Value::Blob(bytes)))
            }
            Token::Parameter(param) => {
                self.advance();
                Ok(Expr::Placeholder(match param {
                    Parameter::Anonymous => {
                        self.positional += 1;
                        Placeholder::Positional(self.positional)
                    }
                    Parameter::Numbered(n) => Placeholder::Numbered(n),
                    Parameter::Named(name) => Placeholder::Named(name.to_string()),
                }))
            }
            Token::Keyword(Keyword::Null) => {
                self.advance();
                Ok(Expr::Literal(Value::Null))
            }
            Token::Keyword(Keyword::True) => {
                self.advance();
                Ok(Expr::Literal(Value::Int(1)))
            }
            Token::Keyword(Keyword::False) => {
                self.advance();
                Ok(Expr::Literal(Value::Int(0)))
            }
            Token::Minus => {
                self.advance();
                match self.peek().clone() {
                    Token::Integer(text) => {
                        self.advance();
                        Ok(Expr::Literal(integer_literal(text, true)))
                    }
                    Token::Float(text) => {
                        self.advance();
                        Ok(Expr::Literal(float_literal(text, true)))
                    }
                    _ => self.parse_unary(UnaryOp::Minus),
                }
            }
            Token::Plus => {
                self.advance();
                self.parse_unary(UnaryOp::Plus)
            }
            Token::Tilde => {
                self.advance();
                self.parse_unary(UnaryOp::BitNot)
            }
            Token::Keyword(Keyword::Not) => {
                self.advance();
                if self.consume_keyword(Keyword::Exists) {
                    let subquery = Box::new(self.parse_paren_select()?);
                    return Ok(Expr::Exists {
                        subquery,
                        negated: true,
                    });
                }
                let expr = self.parse_expr(6)?;
                Ok(Expr::Unary {
                    op: UnaryOp::Not,
                    expr: Box::new(expr),
                })
            }
            Token::Keyword(Keyword::Exists) => {
                self.advance();
                let subquery = Box::new(self.parse_paren_select()?);
                Ok(Expr::Exists {
                    subquery,
                    negated: false,
                })
            }
            Token::Keyword(Keyword::Case) => self.parse_case(),
            Token::Keyword(Keyword::Cast) => self.parse_cast(),
            Token::Keyword(Keyword::Unique) if self.peek_next() == Token::LParen => {
                Err(self.unsupported("UNIQUE subquery predicate"))
            }
            Token::LParen => {
                self.advance();
                if self.check_select_start() {
                    let subquery = Box::new(self.parse_select()?);
                    self.expect_token(&Token::RParen)?;
                    return Ok(Expr::Subquery(subquery));
                }
                let expr = self.parse_expr(0)?;
                if self.check_token(&Token::Comma) {
                    return Err(self.unsupported("row value constructor"));
                }
                self.expect_token(&Token::RParen)?;
                Ok(expr)
            }
            Token::Keyword(Keyword::Like | Keyword::Glob | Keyword::Match | Keyword::Left | Keyword::Right)
                if self.peek_next() == Token::LParen =>
            {
                let name = self.advance().text.to_string();
                self.parse_function_call(&name)
            }
            _ if self.check_ident() => self.parse_name_expr(),
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_unary(&mut self, op: UnaryOp) -> Result<Expr> {
        let expr = self.parse_expr(14)?;
        Ok(Expr::Unary {
            op,
            expr: Box::new(expr),
        })
    }

    /// Column reference (`c`, `t.c`, `s.t.c`, `t.*`) or function call.
    fn parse_name_expr(&mut self) -> Result<Expr> {
        if self.peek_next() == Token::LParen {
            let name = self.expect_ident()?;
            return self.parse_function_call(&name);
        }

        let first = self.expect_ident()?;
        if !self.consume_token(&Token::Dot) {
            return Ok(Expr::column(first));
        }
        if self.consume_token(&Token::Star) {
            return Ok(Expr::qualified(first, "*"));
        }

        let second = self.expect_ident()?;
        if !self.consume_token(&Token::Dot) {
            return Ok(Expr::qualified(first, second));
        }
        if self.consume_token(&Token::Star) {
            return Ok(Expr::qualified(second, "*"));
        }
        let third = self.expect_ident()?;
        Ok(Expr::qualified(second, third))
    }

    fn parse_function_call(&mut self, name: &str) -> Result<Expr> {
        self.expect_token(&Token::LParen)?;
        let mut call = FunctionCall::new(name, Vec::new());

        if self.consume_token(&Token::Star) {
            call.star = true;
        } else if !self.check_token(&Token::RParen) {
            call.distinct = self.consume_keyword(Keyword::Distinct);
            if !call.distinct {
                self.consume_keyword(Keyword::All);
            }
            call.args = self.parse_expr_list()?;
        }
        self.expect_token(&Token::RParen)?;

        if self.consume_keyword(Keyword::Filter) {
            self.expect_token(&Token::LParen)?;
            self.expect_keyword(Keyword::Where)?;
            call.filter = Some(Box::new(self.parse_expr(0)?));
            self.expect_token(&Token::RParen)?;
        }

        if !self.consume_keyword(Keyword::Over) {
            return Ok(Expr::FuncCall(call));
        }

        let spec = if self.consume_token(&Token::LParen) {
            let spec = self.parse_window_spec()?;
            self.expect_token(&Token::RParen)?;
            spec
        } else {
            WindowSpec {
                base: Some(self.expect_ident()?),
                ..WindowSpec::default()
            }
        };

        Ok(Expr::WindowFunc(Box::new(WindowFuncExpr {
            name: call.name,
            args: call.args,
            distinct: call.distinct,
            star: call.star,
            filter: call.filter,
            partition: spec.partition_by,
            order_by: spec.order_by,
            frame: spec.frame,
            window_name: spec.base,
        })))
    }

    /// Body of `( ... )` after OVER or in a WINDOW definition.
    pub(crate) fn parse_window_spec(&mut self) -> Result<WindowSpec> {
        let base = if matches!(self.peek(), Token::Ident(_) | Token::QuotedIdent(_)) {
            Some(self.expect_ident()?)
        } else {
            None
        };

        let partition_by = if self.consume_keyword(Keyword::Partition) {
            self.expect_keyword(Keyword::By)?;
            self.parse_expr_list()?
        } else {
            Vec::new()
        };

        let order_by = if self.consume_keyword(Keyword::Order) {
            self.expect_keyword(Keyword::By)?;
            self.parse_order_by_items()?
        } else {
            Vec::new()
        };

        let mode = match self.peek() {
            Token::Keyword(Keyword::Rows) => Some(WindowFrameMode::Rows),
            Token::Keyword(Keyword::Range) => Some(WindowFrameMode::Range),
            Token::Keyword(Keyword::Groups) => Some(WindowFrameMode::Groups),
            _ => None,
        };
        let frame = match mode {
            Some(mode) => {
                self.advance();
                Some(self.parse_frame(mode)?)
            }
            None => None,
        };

        Ok(WindowSpec {
            base,
            partition_by,
            order_by,
            frame,
        })
    }

    fn parse_frame(&mut self, mode: WindowFrameMode) -> Result<WindowFrame> {
        if self.consume_keyword(Keyword::Between) {
            let start = self.parse_frame_bound()?;
            self.expect_keyword(Keyword::And)?;
            let end = self.parse_frame_bound()?;
            return Ok(WindowFrame {
                mode,
                start,
                end: Some(end),
            });
        }
        Ok(WindowFrame {
            mode,
            start: self.parse_frame_bound()?,
            end: None,
        })
    }

    fn parse_frame_bound(&mut self) -> Result<WindowFrameBound> {
        if self.consume_keyword(Keyword::Unbounded) {
            if self.consume_keyword(Keyword::Preceding) {
                return Ok(WindowFrameBound::UnboundedPreceding);
            }
            self.expect_keyword(Keyword::Following)?;
            return Ok(WindowFrameBound::UnboundedFollowing);
        }
        if self.consume_keyword(Keyword::Current) {
            self.expect_keyword(Keyword::Row)?;
            return Ok(WindowFrameBound::CurrentRow);
        }

        let offset = Box::new(self.parse_expr(7)?);
        if self.consume_keyword(Keyword::Preceding) {
            return Ok(WindowFrameBound::Preceding(offset));
        }
        self.expect_keyword(Keyword::Following)?;
        Ok(WindowFrameBound::Following(offset))
    }

    fn parse_case(&mut self) -> Result<Expr> {
        self.expect_keyword(Keyword::Case)?;
        let operand = if self.check_keyword(Keyword::When) {
            None
        } else {
            Some(Box::new(self.parse_expr(0)?))
        };

        let mut conditions = Vec::new();
        while self.consume_keyword(Keyword::When) {
            let condition = self.parse_expr(0)?;
            self.expect_keyword(Keyword::Then)?;
            let result = self.parse_expr(0)?;
            conditions.push(WhenClause { condition, result });
        }
        if conditions.is_empty() {
            return Err(self.unexpected("WHEN"));
        }

        let else_result = if self.consume_keyword(Keyword::Else) {
            Some(Box::new(self.parse_expr(0)?))
        } else {
            None
        };
        self.expect_keyword(Keyword::End)?;

        Ok(Expr::Case {
            operand,
            conditions,
            else_result,
        })
    }

    fn parse_cast(&mut self) -> Result<Expr> {
        self.expect_keyword(Keyword::Cast)?;
        self.expect_token(&Token::LParen)?;
        let expr = self.parse_expr(0)?;
        self.expect_keyword(Keyword::As)?;
        let type_name = self.parse_type_name()?;
        if type_name.is_empty() {
            return Err(self.unexpected("type name"));
        }
        self.expect_token(&Token::RParen)?;
        Ok(Expr::Cast {
            expr: Box::new(expr),
            type_name,
        })
    }

    /// Declared type as written: `INTEGER`, `UNSIGNED BIG INT`,
    /// `DECIMAL(10,2)`. Empty when no type follows.
    pub(crate) fn parse_type_name(&mut self) -> Result<String> {
        let mut words: Vec<&str> = Vec::new();
        loop {
            let is_word = match self.peek() {
                Token::Ident(_) => true,
                Token::Keyword(k) => !k.is_reserved() && *k != Keyword::Generated,
                _ => false,
            };
            if !is_word {
                break;
            }
            words.push(self.advance().text);
        }

        let mut type_name = words.join(" ");
        if !type_name.is_empty() && self.consume_token(&Token::LParen) {
            let mut args = vec![String::new()];
            loop {
                match self.peek() {
                    Token::RParen => break,
                    Token::Comma => {
                        self.advance();
                        args.push(String::new());
                    }
                    Token::Eof | Token::Error(_) => return Err(self.unexpected("')'")),
                    _ => {
                        let text = self.advance().text;
                        if let Some(arg) = args.last_mut() {
                            arg.push_str(text);
                        }
                    }
                }
            }
            self.expect_token(&Token::RParen)?;
            type_name.push('(');
            type_name.push_str(&args.join(","));
            type_name.push(')');
        }
        Ok(type_name)
    }
}

fn is_negatable_keyword(token: &Token<'_>) -> bool {
    matches!(
        token,
        Token::Keyword(
            Keyword::In
                | Keyword::Between
                | Keyword::Like
                | Keyword::Glob
                | Keyword::Match
                | Keyword::Regexp
        )
    )
}

fn integer_literal(text: &str, negative: bool) -> Value {
    let parsed = if negative {
        format!("-{}", text).parse::<i64>()
    } else {
        text.parse::<i64>()
    };
    match parsed {
        Ok(v) => Value::Int(v),
        Err(_) => Value::Float(float_value(text, negative)),
    }
}

fn float_literal(text: &str, negative: bool) -> Value {
    Value::Float(float_value(text, negative))
}

fn float_value(text: &str, negative: bool) -> f64 {
    // the lexer only emits well-formed decimal numbers
    let v = text.parse::<f64>().unwrap_or(0.0);
    if negative {
        -v
    } else {
        v
    }
}

fn decode_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok())
        .collect()
}

/// Replaces a constant IN-list entry by its value. Anything that does not
/// reduce cleanly is returned unchanged.
pub(crate) fn fold_constant(expr: Expr) -> Expr {
    match eval_constant(&expr) {
        Some(value) => Expr::Literal(value),
        None => expr,
    }
}

fn eval_constant(expr: &Expr) -> Option<Value> {
    match expr {
        Expr::Literal(v) => Some(v.clone()),
        Expr::Unary {
            op: UnaryOp::Minus,
            expr,
        } => match eval_constant(expr)? {
            Value::Int(i) => i.checked_neg().map(Value::Int),
            Value::Float(f) => Some(Value::Float(-f)),
            _ => None,
        },
        Expr::Unary {
            op: UnaryOp::Plus,
            expr,
        } => match eval_constant(expr)? {
            v @ (Value::Int(_) | Value::Float(_)) => Some(v),
            _ => None,
        },
        Expr::Binary {
            op: BinaryOp::Concat,
            left,
            right,
        } => match (eval_constant(left)?, eval_constant(right)?) {
            (Value::Text(mut a), Value::Text(b)) => {
                a.push_str(&b);
                Some(Value::Text(a))
            }
            _ => None,
        },
        Expr::Binary { op, left, right } if op.is_arithmetic() => {
            fold_arithmetic(*op, eval_constant(left)?, eval_constant(right)?)
        }
        _ => None,
    }
}

fn fold_arithmetic(op: BinaryOp, left: Value, right: Value) -> Option<Value> {
    if let (Value::Int(a), Value::Int(b)) = (&left, &right) {
        let (a, b) = (*a, *b);
        let result = match op {
            BinaryOp::Plus => a.checked_add(b),
            BinaryOp::Minus => a.checked_sub(b),
            BinaryOp::Multiply => a.checked_mul(b),
            BinaryOp::Divide => a.checked_div(b),
            BinaryOp::Modulo => a.checked_rem(b),
            _ => None,
        };
        return result.map(Value::Int);
    }

    if !left.is_numeric() || !right.is_numeric() {
        return None;
    }
    let a = left.as_f64()?;
    let b = right.as_f64()?;
    let result = match op {
        BinaryOp::Plus => a + b,
        BinaryOp::Minus => a - b,
        BinaryOp::Multiply => a * b,
        BinaryOp::Divide if b != 0.0 => a / b,
        BinaryOp::Modulo if b != 0.0 => a % b,
        _ => return None,
    };
    Some(Value::Float(result))
}
