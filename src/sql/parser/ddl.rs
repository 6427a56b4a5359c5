//! CREATE, ALTER and DROP.

use eyre::Result;

use super::{ParseError, Parser};
use crate::sql::ast::*;
use crate::sql::token::{Keyword, Token};
use crate::types::Value;

#[cfg(test)]
mod tests {
    use super::super::{parse, ParseError};
    use crate::sql::ast::*;
    use crate::types::{DataType, Value};

    fn create_table(sql: &str) -> CreateTableStmt {
        match parse(sql).unwrap() {
            Statement::CreateTable(c) => *c,
            other => panic!("expected CREATE TABLE, got {:?}", other),
        }
    }

    fn columns(stmt: &CreateTableStmt) -> &[ColumnDef] {
        match &stmt.body {
            CreateTableBody::Columns { columns, .. } => columns,
            other => panic!("expected column list, got {:?}", other),
        }
    }

    #[test]
    fn parse_create_table_columns_and_types() {
        let c = create_table(
            "CREATE TABLE IF NOT EXISTS users (id INTEGER PRIMARY KEY AUTOINCREMENT, name VARCHAR(64) NOT NULL, score DOUBLE PRECISION, price DECIMAL(10, 2), raw)",
        );
        assert!(c.if_not_exists);
        let cols = columns(&c);
        assert_eq!(cols.len(), 5);
        assert!(cols[0].is_primary_key());
        assert_eq!(
            cols[0].constraints[0].kind,
            ColumnConstraintKind::PrimaryKey {
                direction: None,
                autoincrement: true
            }
        );
        assert_eq!(cols[1].type_name, "VARCHAR(64)");
        assert_eq!(cols[1].affinity(), DataType::Text);
        assert_eq!(cols[2].type_name, "DOUBLE PRECISION");
        assert_eq!(cols[3].type_name, "DECIMAL(10,2)");
        assert_eq!(cols[4].type_name, "");
        assert_eq!(cols[4].affinity(), DataType::Blob);
    }

    #[test]
    fn parse_column_constraints() {
        let c = create_table(
            "CREATE TABLE t (a INT CONSTRAINT pos CHECK (a > 0) DEFAULT -1 UNIQUE, b TEXT COLLATE NOCASE DEFAULT 'x' REFERENCES other(id) ON DELETE CASCADE ON UPDATE SET NULL, c INT GENERATED ALWAYS AS (a * 2) STORED, d INT AS (a + 1), e TEXT DEFAULT (upper('x')) NULL, f TEXT DEFAULT CURRENT_TIMESTAMP)",
        );
        let cols = columns(&c);
        assert_eq!(cols[0].constraints[0].name.as_deref(), Some("pos"));
        assert!(matches!(cols[0].constraints[0].kind, ColumnConstraintKind::Check(_)));
        assert_eq!(
            cols[0].constraints[1].kind,
            ColumnConstraintKind::Default(Expr::Literal(Value::Int(-1)))
        );
        assert_eq!(cols[0].constraints[2].kind, ColumnConstraintKind::Unique);

        assert_eq!(
            cols[1].constraints[0].kind,
            ColumnConstraintKind::Collate("NOCASE".into())
        );
        match &cols[1].constraints[2].kind {
            ColumnConstraintKind::References(fk) => {
                assert_eq!(fk.table, "other");
                assert_eq!(fk.columns, vec!["id".to_string()]);
                assert_eq!(fk.on_delete, Some(ReferentialAction::Cascade));
                assert_eq!(fk.on_update, Some(ReferentialAction::SetNull));
            }
            other => panic!("expected REFERENCES, got {:?}", other),
        }

        assert!(matches!(
            cols[2].constraints[0].kind,
            ColumnConstraintKind::Generated { stored: true, .. }
        ));
        assert!(matches!(
            cols[3].constraints[0].kind,
            ColumnConstraintKind::Generated { stored: false, .. }
        ));
        assert!(matches!(
            cols[4].constraints[0].kind,
            ColumnConstraintKind::Default(Expr::FuncCall(_))
        ));
        assert_eq!(cols[4].constraints[1].kind, ColumnConstraintKind::Null);
        assert_eq!(
            cols[5].constraints[0].kind,
            ColumnConstraintKind::Default(Expr::column("CURRENT_TIMESTAMP"))
        );
    }

    #[test]
    fn parse_table_constraints() {
        let c = create_table(
            "CREATE TABLE t (a INT, b INT, CONSTRAINT pk PRIMARY KEY (a, b DESC), UNIQUE (b), CHECK (a < b), FOREIGN KEY (b) REFERENCES u (id)) WITHOUT ROWID",
        );
        assert!(c.without_rowid);
        match c.body {
            CreateTableBody::Columns { constraints, .. } => {
                assert_eq!(constraints.len(), 4);
                assert_eq!(constraints[0].name.as_deref(), Some("pk"));
                match &constraints[0].kind {
                    TableConstraintKind::PrimaryKey(cols) => {
                        assert_eq!(cols.len(), 2);
                        assert_eq!(cols[1].direction, Some(OrderDirection::Desc));
                    }
                    other => panic!("expected PRIMARY KEY, got {:?}", other),
                }
                assert!(matches!(
                    constraints[3].kind,
                    TableConstraintKind::ForeignKey { .. }
                ));
            }
            other => panic!("expected column list, got {:?}", other),
        }
    }

    #[test]
    fn parse_duplicate_primary_key_rejected() {
        let err = parse("CREATE TABLE t (a INT PRIMARY KEY, b INT, PRIMARY KEY (b))").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ParseError>(),
            Some(ParseError::DuplicatePrimaryKey { table, .. }) if table == "t"
        ));
    }

    #[test]
    fn parse_create_table_as_select() {
        let c = create_table("CREATE TEMP TABLE snap AS SELECT * FROM t");
        assert!(c.temporary);
        assert!(matches!(c.body, CreateTableBody::AsSelect(_)));
    }

    #[test]
    fn parse_create_index() {
        match parse("CREATE UNIQUE INDEX IF NOT EXISTS idx ON t (a COLLATE NOCASE DESC, b) WHERE a > 0").unwrap() {
            Statement::CreateIndex(i) => {
                assert!(i.unique && i.if_not_exists);
                assert_eq!(i.table, "t");
                assert_eq!(i.columns[0].collation.as_deref(), Some("NOCASE"));
                assert_eq!(i.columns[0].direction, Some(OrderDirection::Desc));
                assert_eq!(i.columns[1].name, "b");
                assert!(i.where_clause.is_some());
            }
            other => panic!("expected CREATE INDEX, got {:?}", other),
        }
    }

    #[test]
    fn parse_create_view() {
        match parse("CREATE VIEW v (x, y) AS SELECT a, b FROM t").unwrap() {
            Statement::CreateView(v) => {
                assert_eq!(v.columns, vec!["x".to_string(), "y".to_string()]);
                assert_eq!(v.query.columns.len(), 2);
            }
            other => panic!("expected CREATE VIEW, got {:?}", other),
        }
    }

    #[test]
    fn parse_create_trigger() {
        match parse(
            "CREATE TRIGGER audit AFTER UPDATE OF salary ON emp FOR EACH ROW WHEN NEW.salary > 0 BEGIN INSERT INTO log VALUES (NEW.id); DELETE FROM tmp; END",
        )
        .unwrap()
        {
            Statement::CreateTrigger(t) => {
                assert_eq!(t.timing, TriggerTiming::After);
                assert_eq!(t.event, TriggerEvent::Update(vec!["salary".to_string()]));
                assert_eq!(t.table, "emp");
                assert!(t.for_each_row);
                assert!(t.when.is_some());
                assert_eq!(t.body.len(), 2);
            }
            other => panic!("expected CREATE TRIGGER, got {:?}", other),
        }

        match parse("CREATE TRIGGER tr INSTEAD OF DELETE ON v BEGIN SELECT 1; END").unwrap() {
            Statement::CreateTrigger(t) => assert_eq!(t.timing, TriggerTiming::InsteadOf),
            other => panic!("expected CREATE TRIGGER, got {:?}", other),
        }
    }

    #[test]
    fn parse_create_virtual_table_keeps_raw_args() {
        match parse("CREATE VIRTUAL TABLE docs USING fts5(title, body, tokenize = 'porter ascii')").unwrap() {
            Statement::CreateVirtualTable(v) => {
                assert_eq!(v.module, "fts5");
                assert_eq!(
                    v.args,
                    vec![
                        "title".to_string(),
                        "body".to_string(),
                        "tokenize = 'porter ascii'".to_string()
                    ]
                );
            }
            other => panic!("expected CREATE VIRTUAL TABLE, got {:?}", other),
        }
    }

    #[test]
    fn parse_alter_table_actions() {
        let action = |sql: &str| match parse(sql).unwrap() {
            Statement::AlterTable(a) => a.action,
            other => panic!("expected ALTER TABLE, got {:?}", other),
        };
        assert!(matches!(
            action("ALTER TABLE t ADD COLUMN c TEXT NOT NULL DEFAULT ''"),
            AlterTableAction::AddColumn(ref c) if c.name == "c"
        ));
        assert_eq!(
            action("ALTER TABLE t DROP c"),
            AlterTableAction::DropColumn("c".into())
        );
        assert_eq!(
            action("ALTER TABLE t RENAME COLUMN a TO b"),
            AlterTableAction::RenameColumn {
                from: "a".into(),
                to: "b".into()
            }
        );
        assert_eq!(
            action("ALTER TABLE t RENAME TO u"),
            AlterTableAction::RenameTable("u".into())
        );
    }

    #[test]
    fn parse_drop_statements() {
        match parse("DROP TABLE IF EXISTS main.t").unwrap() {
            Statement::DropTable(d) => {
                assert!(d.if_exists);
                assert_eq!(d.name.schema.as_deref(), Some("main"));
            }
            other => panic!("expected DROP TABLE, got {:?}", other),
        }
        assert!(matches!(parse("DROP INDEX i").unwrap(), Statement::DropIndex(_)));
        assert!(matches!(parse("DROP VIEW v").unwrap(), Statement::DropView(_)));
        assert!(matches!(parse("DROP TRIGGER tr").unwrap(), Statement::DropTrigger(_)));
    }

    #[test]
    fn parse_drop_cascade_rejected() {
        let err = parse("DROP TABLE t CASCADE").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ParseError>(),
            Some(ParseError::Unsupported { .. })
        ));
    }
}

impl<'a> Parser<'a> {
    pub(crate) fn parse_create(&mut self) -> Result<Statement> {
        self.expect_keyword(Keyword::Create)?;
        let temporary =
            self.consume_keyword(Keyword::Temp) || self.consume_keyword(Keyword::Temporary);

        match self.peek() {
            Token::Keyword(Keyword::Table) => {
                let stmt = self.parse_create_table(temporary)?;
                Ok(Statement::CreateTable(Box::new(stmt)))
            }
            Token::Keyword(Keyword::View) => {
                let stmt = self.parse_create_view(temporary)?;
                Ok(Statement::CreateView(Box::new(stmt)))
            }
            Token::Keyword(Keyword::Trigger) => {
                let stmt = self.parse_create_trigger(temporary)?;
                Ok(Statement::CreateTrigger(Box::new(stmt)))
            }
            Token::Keyword(Keyword::Unique) | Token::Keyword(Keyword::Index) if !temporary => {
                let unique = self.consume_keyword(Keyword::Unique);
                let stmt = self.parse_create_index(unique)?;
                Ok(Statement::CreateIndex(Box::new(stmt)))
            }
            Token::Keyword(Keyword::Virtual) if !temporary => {
                let stmt = self.parse_create_virtual_table()?;
                Ok(Statement::CreateVirtualTable(Box::new(stmt)))
            }
            _ => Err(self.unexpected("TABLE, INDEX, VIEW, TRIGGER or VIRTUAL TABLE")),
        }
    }

    fn parse_create_table(&mut self, temporary: bool) -> Result<CreateTableStmt> {
        self.expect_keyword(Keyword::Table)?;
        let if_not_exists = self.parse_if_not_exists()?;
        let name = self.parse_object_name()?;

        if self.consume_keyword(Keyword::As) {
            let select = self.parse_select()?;
            return Ok(CreateTableStmt {
                temporary,
                if_not_exists,
                name,
                body: CreateTableBody::AsSelect(Box::new(select)),
                without_rowid: false,
            });
        }

        self.expect_token(&Token::LParen)?;
        let mut columns = Vec::new();
        let mut constraints = Vec::new();
        loop {
            if self.check_table_constraint_start() {
                constraints.push(self.parse_table_constraint()?);
            } else if constraints.is_empty() {
                columns.push(self.parse_column_def()?);
            } else {
                return Err(self.unexpected("table constraint"));
            }
            if !self.consume_token(&Token::Comma) {
                break;
            }
        }
        let close_line = self.current.line;
        let close_column = self.current.column;
        self.expect_token(&Token::RParen)?;

        let column_keys = columns.iter().filter(|c| c.is_primary_key()).count();
        let table_keys = constraints
            .iter()
            .filter(|c| matches!(c.kind, TableConstraintKind::PrimaryKey(_)))
            .count();
        if column_keys + table_keys > 1 {
            return Err(eyre::Report::new(ParseError::DuplicatePrimaryKey {
                table: name.name,
                line: close_line,
                column: close_column,
            }));
        }

        let without_rowid = if self.consume_keyword(Keyword::Without) {
            match self.peek() {
                Token::Ident(word) if word.eq_ignore_ascii_case("rowid") => {
                    self.advance();
                    true
                }
                _ => return Err(self.unexpected("ROWID")),
            }
        } else {
            false
        };

        Ok(CreateTableStmt {
            temporary,
            if_not_exists,
            name,
            body: CreateTableBody::Columns {
                columns,
                constraints,
            },
            without_rowid,
        })
    }

    fn check_table_constraint_start(&self) -> bool {
        matches!(
            self.peek(),
            Token::Keyword(
                Keyword::Constraint
                    | Keyword::Primary
                    | Keyword::Unique
                    | Keyword::Check
                    | Keyword::Foreign
            )
        )
    }

    pub(crate) fn parse_column_def(&mut self) -> Result<ColumnDef> {
        let name = self.expect_ident()?;
        let type_name = self.parse_type_name()?;

        let mut constraints = Vec::new();
        loop {
            let constraint_name = if self.consume_keyword(Keyword::Constraint) {
                Some(self.expect_ident()?)
            } else {
                None
            };
            let Some(kind) = self.parse_column_constraint()? else {
                if constraint_name.is_some() {
                    return Err(self.unexpected("column constraint"));
                }
                break;
            };
            constraints.push(ColumnConstraint {
                name: constraint_name,
                kind,
            });
        }

        Ok(ColumnDef {
            name,
            type_name,
            constraints,
        })
    }

    fn parse_column_constraint(&mut self) -> Result<Option<ColumnConstraintKind>> {
        let kind = match self.peek() {
            Token::Keyword(Keyword::Primary) => {
                self.advance();
                self.expect_keyword(Keyword::Key)?;
                let direction = self.parse_optional_direction();
                let autoincrement = self.consume_keyword(Keyword::Autoincrement);
                ColumnConstraintKind::PrimaryKey {
                    direction,
                    autoincrement,
                }
            }
            Token::Keyword(Keyword::Not) => {
                self.advance();
                self.expect_keyword(Keyword::Null)?;
                ColumnConstraintKind::NotNull
            }
            Token::Keyword(Keyword::Null) => {
                self.advance();
                ColumnConstraintKind::Null
            }
            Token::Keyword(Keyword::Unique) => {
                self.advance();
                ColumnConstraintKind::Unique
            }
            Token::Keyword(Keyword::Check) => {
                self.advance();
                ColumnConstraintKind::Check(self.parse_paren_expr()?)
            }
            Token::Keyword(Keyword::Default) => {
                self.advance();
                ColumnConstraintKind::Default(self.parse_default_value()?)
            }
            Token::Keyword(Keyword::Collate) => {
                self.advance();
                ColumnConstraintKind::Collate(self.expect_ident()?)
            }
            Token::Keyword(Keyword::References) => {
                ColumnConstraintKind::References(self.parse_foreign_key_ref()?)
            }
            Token::Keyword(Keyword::Generated) => {
                self.advance();
                self.expect_keyword(Keyword::Always)?;
                self.expect_keyword(Keyword::As)?;
                self.parse_generated()?
            }
            Token::Keyword(Keyword::As) => {
                self.advance();
                self.parse_generated()?
            }
            _ => return Ok(None),
        };
        Ok(Some(kind))
    }

    fn parse_generated(&mut self) -> Result<ColumnConstraintKind> {
        let expr = self.parse_paren_expr()?;
        let stored = if self.consume_keyword(Keyword::Stored) {
            true
        } else {
            self.consume_keyword(Keyword::Virtual);
            false
        };
        Ok(ColumnConstraintKind::Generated { expr, stored })
    }

    fn parse_paren_expr(&mut self) -> Result<Expr> {
        self.expect_token(&Token::LParen)?;
        let expr = self.parse_expr(0)?;
        self.expect_token(&Token::RParen)?;
        Ok(expr)
    }

    /// `DEFAULT literal | (expr) | -number | +number | identifier`
    fn parse_default_value(&mut self) -> Result<Expr> {
        match self.peek() {
            Token::LParen => self.parse_paren_expr(),
            Token::Minus | Token::Plus => {
                let negative = matches!(self.advance().token, Token::Minus);
                match self.parse_default_value()? {
                    Expr::Literal(Value::Int(v)) if negative => Ok(Expr::Literal(Value::Int(-v))),
                    Expr::Literal(Value::Float(v)) if negative => {
                        Ok(Expr::Literal(Value::Float(-v)))
                    }
                    lit @ Expr::Literal(Value::Int(_) | Value::Float(_)) => Ok(lit),
                    _ => Err(self.unexpected("number")),
                }
            }
            Token::Integer(_)
            | Token::Float(_)
            | Token::String(_)
            | Token::Blob(_)
            | Token::Keyword(Keyword::Null | Keyword::True | Keyword::False) => {
                self.parse_expr(19)
            }
            _ if self.check_ident() => Ok(Expr::column(self.expect_ident()?)),
            _ => Err(self.unexpected("default value")),
        }
    }

    fn parse_foreign_key_ref(&mut self) -> Result<ForeignKeyRef> {
        self.expect_keyword(Keyword::References)?;
        let table = self.expect_ident()?;
        let columns = if self.check_token(&Token::LParen) {
            self.parse_paren_ident_list()?
        } else {
            Vec::new()
        };

        let mut on_delete = None;
        let mut on_update = None;
        while self.consume_keyword(Keyword::On) {
            let is_delete = if self.consume_keyword(Keyword::Delete) {
                true
            } else {
                self.expect_keyword(Keyword::Update)?;
                false
            };
            let action = self.parse_referential_action()?;
            if is_delete {
                on_delete = Some(action);
            } else {
                on_update = Some(action);
            }
        }

        Ok(ForeignKeyRef {
            table,
            columns,
            on_delete,
            on_update,
        })
    }

    fn parse_referential_action(&mut self) -> Result<ReferentialAction> {
        if self.consume_keyword(Keyword::Set) {
            if self.consume_keyword(Keyword::Null) {
                return Ok(ReferentialAction::SetNull);
            }
            self.expect_keyword(Keyword::Default)?;
            return Ok(ReferentialAction::SetDefault);
        }
        if self.consume_keyword(Keyword::Cascade) {
            return Ok(ReferentialAction::Cascade);
        }
        if self.consume_keyword(Keyword::Restrict) {
            return Ok(ReferentialAction::Restrict);
        }
        if self.consume_keyword(Keyword::No) {
            self.expect_keyword(Keyword::Action)?;
            return Ok(ReferentialAction::NoAction);
        }
        Err(self.unexpected("SET NULL, SET DEFAULT, CASCADE, RESTRICT or NO ACTION"))
    }

    fn parse_table_constraint(&mut self) -> Result<TableConstraint> {
        let name = if self.consume_keyword(Keyword::Constraint) {
            Some(self.expect_ident()?)
        } else {
            None
        };

        let kind = match self.peek() {
            Token::Keyword(Keyword::Primary) => {
                self.advance();
                self.expect_keyword(Keyword::Key)?;
                TableConstraintKind::PrimaryKey(self.parse_index_columns()?)
            }
            Token::Keyword(Keyword::Unique) => {
                self.advance();
                TableConstraintKind::Unique(self.parse_index_columns()?)
            }
            Token::Keyword(Keyword::Check) => {
                self.advance();
                TableConstraintKind::Check(self.parse_paren_expr()?)
            }
            Token::Keyword(Keyword::Foreign) => {
                self.advance();
                self.expect_keyword(Keyword::Key)?;
                let columns = self.parse_paren_ident_list()?;
                let reference = self.parse_foreign_key_ref()?;
                TableConstraintKind::ForeignKey { columns, reference }
            }
            _ => return Err(self.unexpected("PRIMARY KEY, UNIQUE, CHECK or FOREIGN KEY")),
        };

        Ok(TableConstraint { name, kind })
    }

    /// `( col [COLLATE c] [ASC|DESC], ... )`
    fn parse_index_columns(&mut self) -> Result<Vec<IndexColumn>> {
        self.expect_token(&Token::LParen)?;
        let mut columns = Vec::new();
        loop {
            let name = self.expect_ident()?;
            let collation = if self.consume_keyword(Keyword::Collate) {
                Some(self.expect_ident()?)
            } else {
                None
            };
            let direction = self.parse_optional_direction();
            columns.push(IndexColumn {
                name,
                collation,
                direction,
            });
            if !self.consume_token(&Token::Comma) {
                break;
            }
        }
        self.expect_token(&Token::RParen)?;
        Ok(columns)
    }

    fn parse_optional_direction(&mut self) -> Option<OrderDirection> {
        if self.consume_keyword(Keyword::Asc) {
            Some(OrderDirection::Asc)
        } else if self.consume_keyword(Keyword::Desc) {
            Some(OrderDirection::Desc)
        } else {
            None
        }
    }

    fn parse_create_index(&mut self, unique: bool) -> Result<CreateIndexStmt> {
        self.expect_keyword(Keyword::Index)?;
        let if_not_exists = self.parse_if_not_exists()?;
        let name = self.parse_object_name()?;
        self.expect_keyword(Keyword::On)?;
        let table = self.expect_ident()?;
        let columns = self.parse_index_columns()?;
        let where_clause = if self.consume_keyword(Keyword::Where) {
            Some(self.parse_expr(0)?)
        } else {
            None
        };

        Ok(CreateIndexStmt {
            unique,
            if_not_exists,
            name,
            table,
            columns,
            where_clause,
        })
    }

    fn parse_create_view(&mut self, temporary: bool) -> Result<CreateViewStmt> {
        self.expect_keyword(Keyword::View)?;
        let if_not_exists = self.parse_if_not_exists()?;
        let name = self.parse_object_name()?;
        let columns = if self.check_token(&Token::LParen) {
            self.parse_paren_ident_list()?
        } else {
            Vec::new()
        };
        self.expect_keyword(Keyword::As)?;
        let query = Box::new(self.parse_select()?);

        Ok(CreateViewStmt {
            temporary,
            if_not_exists,
            name,
            columns,
            query,
        })
    }

    fn parse_create_trigger(&mut self, temporary: bool) -> Result<CreateTriggerStmt> {
        self.expect_keyword(Keyword::Trigger)?;
        let if_not_exists = self.parse_if_not_exists()?;
        let name = self.parse_object_name()?;

        let timing = if self.consume_keyword(Keyword::Before) {
            TriggerTiming::Before
        } else if self.consume_keyword(Keyword::Instead) {
            self.expect_keyword(Keyword::Of)?;
            TriggerTiming::InsteadOf
        } else {
            self.consume_keyword(Keyword::After);
            TriggerTiming::After
        };

        let event = match self.peek() {
            Token::Keyword(Keyword::Insert) => {
                self.advance();
                TriggerEvent::Insert
            }
            Token::Keyword(Keyword::Delete) => {
                self.advance();
                TriggerEvent::Delete
            }
            Token::Keyword(Keyword::Update) => {
                self.advance();
                let columns = if self.consume_keyword(Keyword::Of) {
                    self.parse_ident_list()?
                } else {
                    Vec::new()
                };
                TriggerEvent::Update(columns)
            }
            _ => return Err(self.unexpected("INSERT, DELETE or UPDATE")),
        };

        self.expect_keyword(Keyword::On)?;
        let table = self.expect_ident()?;

        let for_each_row = if self.consume_keyword(Keyword::For) {
            self.expect_keyword(Keyword::Each)?;
            self.expect_keyword(Keyword::Row)?;
            true
        } else {
            false
        };

        let when = if self.consume_keyword(Keyword::When) {
            Some(self.parse_expr(0)?)
        } else {
            None
        };

        self.expect_keyword(Keyword::Begin)?;
        let mut body = Vec::new();
        loop {
            body.push(self.parse_trigger_step()?);
            self.expect_token(&Token::Semicolon)?;
            if self.consume_keyword(Keyword::End) {
                break;
            }
        }

        Ok(CreateTriggerStmt {
            temporary,
            if_not_exists,
            name,
            timing,
            event,
            table,
            for_each_row,
            when,
            body,
        })
    }

    fn parse_trigger_step(&mut self) -> Result<Statement> {
        match self.peek() {
            Token::Keyword(
                Keyword::Select
                | Keyword::Values
                | Keyword::With
                | Keyword::Insert
                | Keyword::Replace
                | Keyword::Update
                | Keyword::Delete,
            ) => self.parse_statement(),
            _ => Err(self.unexpected("INSERT, UPDATE, DELETE or SELECT")),
        }
    }

    fn parse_create_virtual_table(&mut self) -> Result<CreateVirtualTableStmt> {
        self.expect_keyword(Keyword::Virtual)?;
        self.expect_keyword(Keyword::Table)?;
        let if_not_exists = self.parse_if_not_exists()?;
        let name = self.parse_object_name()?;
        self.expect_keyword(Keyword::Using)?;
        let module = self.expect_ident()?;

        let mut args = Vec::new();
        if self.consume_token(&Token::LParen) {
            let input = self.lexer.input();
            let mut depth = 0usize;
            let mut arg_start: Option<usize> = None;
            loop {
                match self.peek() {
                    Token::Eof | Token::Error(_) => return Err(self.unexpected("')'")),
                    Token::RParen if depth == 0 => {
                        if let Some(start) = arg_start.take() {
                            args.push(input[start..self.previous_end].to_string());
                        }
                        self.advance();
                        break;
                    }
                    Token::Comma if depth == 0 => {
                        if let Some(start) = arg_start.take() {
                            args.push(input[start..self.previous_end].to_string());
                        }
                        self.advance();
                    }
                    token => {
                        match token {
                            Token::LParen => depth += 1,
                            Token::RParen => depth -= 1,
                            _ => {}
                        }
                        if arg_start.is_none() {
                            arg_start = Some(self.current.span.start);
                        }
                        self.advance();
                    }
                }
            }
        }

        Ok(CreateVirtualTableStmt {
            if_not_exists,
            name,
            module,
            args,
        })
    }

    pub(crate) fn parse_alter(&mut self) -> Result<AlterTableStmt> {
        self.expect_keyword(Keyword::Alter)?;
        self.expect_keyword(Keyword::Table)?;
        let table = self.parse_object_name()?;

        let action = match self.peek() {
            Token::Keyword(Keyword::Add) => {
                self.advance();
                self.consume_keyword(Keyword::Column);
                AlterTableAction::AddColumn(self.parse_column_def()?)
            }
            Token::Keyword(Keyword::Drop) => {
                self.advance();
                self.consume_keyword(Keyword::Column);
                AlterTableAction::DropColumn(self.expect_ident()?)
            }
            Token::Keyword(Keyword::Rename) => {
                self.advance();
                if self.consume_keyword(Keyword::To) {
                    AlterTableAction::RenameTable(self.expect_ident()?)
                } else {
                    self.consume_keyword(Keyword::Column);
                    let from = self.expect_ident()?;
                    self.expect_keyword(Keyword::To)?;
                    let to = self.expect_ident()?;
                    AlterTableAction::RenameColumn { from, to }
                }
            }
            _ => return Err(self.unexpected("ADD, DROP or RENAME")),
        };

        Ok(AlterTableStmt { table, action })
    }

    pub(crate) fn parse_drop(&mut self) -> Result<Statement> {
        self.expect_keyword(Keyword::Drop)?;
        let kind = match self.peek() {
            Token::Keyword(k @ (Keyword::Table | Keyword::Index | Keyword::View | Keyword::Trigger)) => *k,
            _ => return Err(self.unexpected("TABLE, INDEX, VIEW or TRIGGER")),
        };
        self.advance();

        let if_exists = self.parse_if_exists()?;
        let name = self.parse_object_name()?;
        if self.check_keyword(Keyword::Restrict) || self.check_keyword(Keyword::Cascade) {
            return Err(self.unsupported("RESTRICT or CASCADE on DROP"));
        }

        let stmt = DropStmt { if_exists, name };
        Ok(match kind {
            Keyword::Table => Statement::DropTable(stmt),
            Keyword::Index => Statement::DropIndex(stmt),
            Keyword::View => Statement::DropView(stmt),
            _ => Statement::DropTrigger(stmt),
        })
    }
}
