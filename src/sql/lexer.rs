//! # SQL Lexer
//!
//! Tokenizes SQLite-dialect SQL without allocating: identifiers, literals and
//! parameter names are slices of the input string.
//!
//! ## Token Types
//!
//! - **Keywords**: matched case-insensitively through a phf perfect hash map
//! - **Identifiers**: bare (`users`, `_tmp`, `naïve`) and quoted (`"Column"`,
//!   `` `order` ``, `[group]`)
//! - **Literals**: integers (`42`), decimals (`3.14`, `.5`, `1.`), exponent
//!   forms (`1e10`, `2.5E-3`), strings (`'it''s'`) and blobs (`x'CAFE'`)
//! - **Parameters**: `?`, `?3`, `:name`, `@name`, `$name`
//! - **Comments**: `-- ...`, `// ...` and `/* ... */`. An unterminated block
//!   comment swallows the rest of the input.
//!
//! ## Operator Matching
//!
//! Multi-character operators are matched greedily before their one-character
//! prefixes:
//!
//! ```text
//! <   <=  <>  <<        >   >=  >>
//! =   ==                !=  (bare ! is an error)
//! ||  (bare | is an error)
//! -   ->  ->>
//! ```
//!
//! ## Errors
//!
//! `next_token` never fails; problems surface as `Token::Error(LexError)` so
//! the parser can report them with the token position. `tokenize` turns the
//! first error token into an `eyre::Report` carrying the typed `LexError`.
//!
//! ## Usage Example
//!
//! ```ignore
//! use sqlvibe::sql::lexer::tokenize;
//!
//! let tokens = tokenize("SELECT id FROM users WHERE id = ?")?;
//! assert_eq!(tokens.len(), 8);
//! ```

use std::fmt;

use eyre::Result;
use phf::phf_map;

use super::token::{Keyword, Parameter, Span, SpannedToken, Token};

static KEYWORDS: phf::Map<&'static str, Keyword> = phf_map! {
    "ABORT" => Keyword::Abort,
    "ACTION" => Keyword::Action,
    "ADD" => Keyword::Add,
    "AFTER" => Keyword::After,
    "ALL" => Keyword::All,
    "ALTER" => Keyword::Alter,
    "ALWAYS" => Keyword::Always,
    "ANALYZE" => Keyword::Analyze,
    "AND" => Keyword::And,
    "ANY" => Keyword::Any,
    "AS" => Keyword::As,
    "ASC" => Keyword::Asc,
    "AUTOINCREMENT" => Keyword::Autoincrement,
    "BACKUP" => Keyword::Backup,
    "BEFORE" => Keyword::Before,
    "BEGIN" => Keyword::Begin,
    "BETWEEN" => Keyword::Between,
    "BY" => Keyword::By,
    "CASCADE" => Keyword::Cascade,
    "CASE" => Keyword::Case,
    "CAST" => Keyword::Cast,
    "CHECK" => Keyword::Check,
    "COLLATE" => Keyword::Collate,
    "COLUMN" => Keyword::Column,
    "COMMIT" => Keyword::Commit,
    "CONFLICT" => Keyword::Conflict,
    "CONSTRAINT" => Keyword::Constraint,
    "CREATE" => Keyword::Create,
    "CROSS" => Keyword::Cross,
    "CURRENT" => Keyword::Current,
    "DEFAULT" => Keyword::Default,
    "DEFERRED" => Keyword::Deferred,
    "DELETE" => Keyword::Delete,
    "DESC" => Keyword::Desc,
    "DISTINCT" => Keyword::Distinct,
    "DO" => Keyword::Do,
    "DROP" => Keyword::Drop,
    "EACH" => Keyword::Each,
    "ELSE" => Keyword::Else,
    "END" => Keyword::End,
    "ESCAPE" => Keyword::Escape,
    "EXCEPT" => Keyword::Except,
    "EXCLUSIVE" => Keyword::Exclusive,
    "EXISTS" => Keyword::Exists,
    "EXPLAIN" => Keyword::Explain,
    "FAIL" => Keyword::Fail,
    "FALSE" => Keyword::False,
    "FETCH" => Keyword::Fetch,
    "FILTER" => Keyword::Filter,
    "FIRST" => Keyword::First,
    "FOLLOWING" => Keyword::Following,
    "FOR" => Keyword::For,
    "FOREIGN" => Keyword::Foreign,
    "FROM" => Keyword::From,
    "FULL" => Keyword::Full,
    "GENERATED" => Keyword::Generated,
    "GLOB" => Keyword::Glob,
    "GROUP" => Keyword::Group,
    "GROUPS" => Keyword::Groups,
    "HAVING" => Keyword::Having,
    "IF" => Keyword::If,
    "IGNORE" => Keyword::Ignore,
    "IMMEDIATE" => Keyword::Immediate,
    "IN" => Keyword::In,
    "INCREMENTAL" => Keyword::Incremental,
    "INDEX" => Keyword::Index,
    "INDEXED" => Keyword::Indexed,
    "INNER" => Keyword::Inner,
    "INSERT" => Keyword::Insert,
    "INSTEAD" => Keyword::Instead,
    "INTERSECT" => Keyword::Intersect,
    "INTO" => Keyword::Into,
    "IS" => Keyword::Is,
    "JOIN" => Keyword::Join,
    "KEY" => Keyword::Key,
    "LAST" => Keyword::Last,
    "LEFT" => Keyword::Left,
    "LIKE" => Keyword::Like,
    "LIMIT" => Keyword::Limit,
    "MATCH" => Keyword::Match,
    "NATURAL" => Keyword::Natural,
    "NEXT" => Keyword::Next,
    "NO" => Keyword::No,
    "NOT" => Keyword::Not,
    "NOTHING" => Keyword::Nothing,
    "NULL" => Keyword::Null,
    "NULLS" => Keyword::Nulls,
    "OF" => Keyword::Of,
    "OFFSET" => Keyword::Offset,
    "ON" => Keyword::On,
    "ONLY" => Keyword::Only,
    "OR" => Keyword::Or,
    "ORDER" => Keyword::Order,
    "OUTER" => Keyword::Outer,
    "OVER" => Keyword::Over,
    "PARTITION" => Keyword::Partition,
    "PLAN" => Keyword::Plan,
    "PRAGMA" => Keyword::Pragma,
    "PRECEDING" => Keyword::Preceding,
    "PRIMARY" => Keyword::Primary,
    "QUERY" => Keyword::Query,
    "RANGE" => Keyword::Range,
    "RECURSIVE" => Keyword::Recursive,
    "REFERENCES" => Keyword::References,
    "REGEXP" => Keyword::Regexp,
    "REINDEX" => Keyword::Reindex,
    "RELEASE" => Keyword::Release,
    "RENAME" => Keyword::Rename,
    "REPLACE" => Keyword::Replace,
    "RESTRICT" => Keyword::Restrict,
    "RETURNING" => Keyword::Returning,
    "RIGHT" => Keyword::Right,
    "ROLLBACK" => Keyword::Rollback,
    "ROW" => Keyword::Row,
    "ROWS" => Keyword::Rows,
    "SAVEPOINT" => Keyword::Savepoint,
    "SELECT" => Keyword::Select,
    "SET" => Keyword::Set,
    "SOME" => Keyword::Some,
    "STORED" => Keyword::Stored,
    "TABLE" => Keyword::Table,
    "TEMP" => Keyword::Temp,
    "TEMPORARY" => Keyword::Temporary,
    "THEN" => Keyword::Then,
    "TO" => Keyword::To,
    "TRANSACTION" => Keyword::Transaction,
    "TRIGGER" => Keyword::Trigger,
    "TRUE" => Keyword::True,
    "UNBOUNDED" => Keyword::Unbounded,
    "UNION" => Keyword::Union,
    "UNIQUE" => Keyword::Unique,
    "UPDATE" => Keyword::Update,
    "USING" => Keyword::Using,
    "VACUUM" => Keyword::Vacuum,
    "VALUES" => Keyword::Values,
    "VIEW" => Keyword::View,
    "VIRTUAL" => Keyword::Virtual,
    "WHEN" => Keyword::When,
    "WHERE" => Keyword::Where,
    "WINDOW" => Keyword::Window,
    "WITH" => Keyword::With,
    "WITHOUT" => Keyword::Without,
};

/// Looks up a keyword by its text, ignoring case.
pub fn lookup_keyword(word: &str) -> Option<Keyword> {
    if word.len() > 16 {
        return None;
    }
    KEYWORDS.get(word.to_ascii_uppercase().as_str()).copied()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexError {
    UnterminatedString { position: usize },
    InvalidCharacter { ch: char, position: usize },
    InvalidOperator { op: char, position: usize },
}

impl LexError {
    pub fn position(&self) -> usize {
        match *self {
            LexError::UnterminatedString { position }
            | LexError::InvalidCharacter { position, .. }
            | LexError::InvalidOperator { position, .. } => position,
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexError::UnterminatedString { position } => {
                write!(f, "unterminated string starting at position {}", position)
            }
            LexError::InvalidCharacter { ch, position } => {
                write!(f, "invalid character '{}' at position {}", ch, position)
            }
            LexError::InvalidOperator { op, position } => {
                write!(f, "invalid operator '{}' at position {}", op, position)
            }
        }
    }
}

impl std::error::Error for LexError {}

/// Tokenizes `input` completely. The trailing `Eof` is not included.
pub fn tokenize(input: &str) -> Result<Vec<SpannedToken<'_>>> {
    tracing::trace!(len = input.len(), "tokenize");
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let spanned = lexer.next_spanned();
        match spanned.token {
            Token::Eof => return Ok(tokens),
            Token::Error(err) => return Err(eyre::Report::new(err)),
            _ => tokens.push(spanned),
        }
    }
}

#[derive(Clone)]
pub struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    column: u32,
    token_start: usize,
    token_line: u32,
    token_column: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
            token_start: 0,
            token_line: 1,
            token_column: 1,
        }
    }

    pub fn input(&self) -> &'a str {
        self.input
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn span(&self) -> Span {
        Span::new(self.token_start, self.pos - self.token_start)
    }

    /// Scans the next token and records where it started.
    pub fn next_spanned(&mut self) -> SpannedToken<'a> {
        let token = self.next_token();
        let span = self.span();
        SpannedToken {
            token,
            text: &self.input[span.start..span.end()],
            span,
            line: self.token_line,
            column: self.token_column,
        }
    }

    /// Returns the token after the current position without consuming it.
    pub fn peek(&self) -> SpannedToken<'a> {
        let mut ahead = self.clone();
        ahead.next_spanned()
    }

    pub fn next_token(&mut self) -> Token<'a> {
        self.skip_whitespace();
        self.token_start = self.pos;
        self.token_line = self.line;
        self.token_column = self.column;

        if self.is_eof() {
            return Token::Eof;
        }

        let ch = self.current();

        if is_ident_start(ch) {
            return self.scan_identifier_or_keyword();
        }

        if ch.is_ascii_digit() {
            return self.scan_number();
        }

        match ch {
            b'\'' => self.scan_string(),
            b'"' => self.scan_quoted_identifier(b'"'),
            b'`' => self.scan_quoted_identifier(b'`'),
            b'[' => self.scan_bracket_identifier(),
            b'?' => self.scan_question(),
            b':' | b'@' | b'$' => self.scan_named_param(),
            b'-' => self.scan_minus(),
            b'/' => self.scan_slash(),
            b'+' => self.single(Token::Plus),
            b'*' => self.single(Token::Star),
            b'%' => self.single(Token::Percent),
            b'&' => self.single(Token::Ampersand),
            b'~' => self.single(Token::Tilde),
            b'(' => self.single(Token::LParen),
            b')' => self.single(Token::RParen),
            b',' => self.single(Token::Comma),
            b';' => self.single(Token::Semicolon),
            b'|' => self.scan_pipe(),
            b'=' => self.scan_equals(),
            b'<' => self.scan_less_than(),
            b'>' => self.scan_greater_than(),
            b'!' => self.scan_exclamation(),
            b'.' => self.scan_dot(),
            _ => {
                let position = self.pos;
                self.advance();
                Token::Error(LexError::InvalidCharacter {
                    ch: ch as char,
                    position,
                })
            }
        }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn current(&self) -> u8 {
        self.bytes[self.pos]
    }

    fn peek_char(&self) -> Option<u8> {
        self.bytes.get(self.pos + 1).copied()
    }

    fn at(&self, byte: u8) -> bool {
        !self.is_eof() && self.current() == byte
    }

    fn advance(&mut self) {
        if !self.is_eof() {
            if self.current() == b'\n' {
                self.line += 1;
                self.column = 1;
            } else if self.current() & 0xC0 != 0x80 {
                self.column += 1;
            }
            self.pos += 1;
        }
    }

    fn single(&mut self, token: Token<'a>) -> Token<'a> {
        self.advance();
        token
    }

    fn skip_whitespace(&mut self) {
        while !self.is_eof() {
            match self.current() {
                b' ' | b'\t' | b'\r' | b'\n' | b'\x0c' => self.advance(),
                _ => break,
            }
        }
    }

    fn skip_line_comment(&mut self) -> Token<'a> {
        while !self.is_eof() && self.current() != b'\n' {
            self.advance();
        }
        self.next_token()
    }

    fn scan_identifier_or_keyword(&mut self) -> Token<'a> {
        let start = self.pos;

        if matches!(self.current(), b'x' | b'X') && self.peek_char() == Some(b'\'') {
            return self.scan_blob();
        }

        while !self.is_eof() && is_ident_continue(self.current()) {
            self.advance();
        }

        let ident = &self.input[start..self.pos];
        match lookup_keyword(ident) {
            Some(keyword) => Token::Keyword(keyword),
            None => Token::Ident(ident),
        }
    }

    fn scan_blob(&mut self) -> Token<'a> {
        let opening = self.pos;
        self.advance();
        self.advance();
        let start = self.pos;

        while !self.is_eof() && self.current() != b'\'' {
            let ch = self.current();
            if !ch.is_ascii_hexdigit() {
                let position = self.pos;
                let ch = self.input[position..].chars().next().unwrap_or('?');
                self.skip_to_quote();
                return Token::Error(LexError::InvalidCharacter { ch, position });
            }
            self.advance();
        }

        if self.is_eof() {
            return Token::Error(LexError::UnterminatedString { position: opening });
        }

        let hex = &self.input[start..self.pos];
        let closing = self.pos;
        self.advance();

        if hex.len() % 2 != 0 {
            return Token::Error(LexError::InvalidCharacter {
                ch: '\'',
                position: closing,
            });
        }

        Token::Blob(hex)
    }

    fn skip_to_quote(&mut self) {
        while !self.is_eof() && self.current() != b'\'' {
            self.advance();
        }
        self.advance();
    }

    fn scan_digits(&mut self) {
        while !self.is_eof() && self.current().is_ascii_digit() {
            self.advance();
        }
    }

    fn scan_exponent(&mut self) -> bool {
        if !matches!(self.bytes.get(self.pos), Some(b'e' | b'E')) {
            return false;
        }
        let digits_at = match self.bytes.get(self.pos + 1) {
            Some(b'+' | b'-') => self.pos + 2,
            _ => self.pos + 1,
        };
        if !self.bytes.get(digits_at).is_some_and(|b| b.is_ascii_digit()) {
            return false;
        }
        while self.pos < digits_at {
            self.advance();
        }
        self.scan_digits();
        true
    }

    fn scan_number(&mut self) -> Token<'a> {
        let start = self.pos;
        self.scan_digits();

        let mut is_float = false;

        if self.at(b'.') {
            is_float = true;
            self.advance();
            self.scan_digits();
        }

        if self.scan_exponent() {
            is_float = true;
        }

        let text = &self.input[start..self.pos];
        if is_float {
            Token::Float(text)
        } else {
            Token::Integer(text)
        }
    }

    fn scan_delimited(&mut self, close: u8, doubled: bool) -> Result<&'a str, LexError> {
        let opening = self.pos;
        self.advance();
        let start = self.pos;

        loop {
            if self.is_eof() {
                return Err(LexError::UnterminatedString { position: opening });
            }

            if self.current() == close {
                if doubled && self.peek_char() == Some(close) {
                    self.advance();
                    self.advance();
                } else {
                    let end = self.pos;
                    self.advance();
                    return Ok(&self.input[start..end]);
                }
            } else {
                self.advance();
            }
        }
    }

    fn scan_string(&mut self) -> Token<'a> {
        match self.scan_delimited(b'\'', true) {
            Ok(body) => Token::String(body),
            Err(err) => Token::Error(err),
        }
    }

    fn scan_quoted_identifier(&mut self, quote: u8) -> Token<'a> {
        match self.scan_delimited(quote, true) {
            Ok(body) => Token::QuotedIdent(body),
            Err(err) => Token::Error(err),
        }
    }

    fn scan_bracket_identifier(&mut self) -> Token<'a> {
        match self.scan_delimited(b']', false) {
            Ok(body) => Token::QuotedIdent(body),
            Err(err) => Token::Error(err),
        }
    }

    fn scan_question(&mut self) -> Token<'a> {
        let position = self.pos;
        self.advance();
        let start = self.pos;
        self.scan_digits();

        if self.pos == start {
            return Token::Parameter(Parameter::Anonymous);
        }

        match self.input[start..self.pos].parse::<u32>() {
            Ok(n) if n > 0 => Token::Parameter(Parameter::Numbered(n)),
            _ => Token::Error(LexError::InvalidCharacter { ch: '?', position }),
        }
    }

    fn scan_named_param(&mut self) -> Token<'a> {
        let start = self.pos;
        let prefix = self.current();
        self.advance();

        let name_start = self.pos;
        while !self.is_eof() && is_ident_continue(self.current()) {
            self.advance();
        }

        if self.pos == name_start {
            return Token::Error(LexError::InvalidCharacter {
                ch: prefix as char,
                position: start,
            });
        }

        Token::Parameter(Parameter::Named(&self.input[start..self.pos]))
    }

    fn scan_minus(&mut self) -> Token<'a> {
        self.advance();

        match self.bytes.get(self.pos) {
            Some(b'-') => self.skip_line_comment(),
            Some(b'>') => {
                self.advance();
                if self.at(b'>') {
                    self.advance();
                    Token::DoubleArrow
                } else {
                    Token::Arrow
                }
            }
            _ => Token::Minus,
        }
    }

    fn scan_slash(&mut self) -> Token<'a> {
        self.advance();

        match self.bytes.get(self.pos) {
            Some(b'/') => self.skip_line_comment(),
            Some(b'*') => {
                self.advance();
                self.scan_block_comment()
            }
            _ => Token::Slash,
        }
    }

    fn scan_block_comment(&mut self) -> Token<'a> {
        while !self.is_eof() {
            if self.current() == b'*' && self.peek_char() == Some(b'/') {
                self.advance();
                self.advance();
                return self.next_token();
            }
            self.advance();
        }
        self.next_token()
    }

    fn scan_pipe(&mut self) -> Token<'a> {
        let position = self.pos;
        self.advance();

        if self.at(b'|') {
            self.advance();
            Token::Concat
        } else {
            Token::Error(LexError::InvalidOperator { op: '|', position })
        }
    }

    fn scan_equals(&mut self) -> Token<'a> {
        self.advance();
        if self.at(b'=') {
            self.advance();
        }
        Token::Eq
    }

    fn scan_less_than(&mut self) -> Token<'a> {
        self.advance();

        match self.bytes.get(self.pos) {
            Some(b'=') => self.single(Token::LtEq),
            Some(b'>') => self.single(Token::NotEq),
            Some(b'<') => self.single(Token::LeftShift),
            _ => Token::Lt,
        }
    }

    fn scan_greater_than(&mut self) -> Token<'a> {
        self.advance();

        match self.bytes.get(self.pos) {
            Some(b'=') => self.single(Token::GtEq),
            Some(b'>') => self.single(Token::RightShift),
            _ => Token::Gt,
        }
    }

    fn scan_exclamation(&mut self) -> Token<'a> {
        let position = self.pos;
        self.advance();

        if self.at(b'=') {
            self.advance();
            Token::NotEq
        } else {
            Token::Error(LexError::InvalidOperator { op: '!', position })
        }
    }

    fn scan_dot(&mut self) -> Token<'a> {
        let start = self.pos;
        self.advance();

        if !self.is_eof() && self.current().is_ascii_digit() {
            self.scan_digits();
            self.scan_exponent();
            Token::Float(&self.input[start..self.pos])
        } else {
            Token::Dot
        }
    }
}

fn is_ident_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_' || ch >= 0x80
}

fn is_ident_continue(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_' || ch >= 0x80
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(sql: &str) -> Vec<Token<'_>> {
        tokenize(sql)
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    fn lex_error(sql: &str) -> LexError {
        let err = tokenize(sql).unwrap_err();
        *err.downcast_ref::<LexError>().unwrap()
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        assert_eq!(
            tokens("select FROM WhErE"),
            vec![
                Token::Keyword(Keyword::Select),
                Token::Keyword(Keyword::From),
                Token::Keyword(Keyword::Where),
            ]
        );
    }

    #[test]
    fn test_identifiers_borrow_input() {
        let sql = "SELECT user_name, _tmp2 FROM users";
        assert_eq!(
            tokens(sql),
            vec![
                Token::Keyword(Keyword::Select),
                Token::Ident("user_name"),
                Token::Comma,
                Token::Ident("_tmp2"),
                Token::Keyword(Keyword::From),
                Token::Ident("users"),
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            tokens("42 3.14 .5 1. 1e10 2.5E-3"),
            vec![
                Token::Integer("42"),
                Token::Float("3.14"),
                Token::Float(".5"),
                Token::Float("1."),
                Token::Float("1e10"),
                Token::Float("2.5E-3"),
            ]
        );
    }

    #[test]
    fn test_exponent_without_digits_is_not_consumed() {
        assert_eq!(tokens("1e"), vec![Token::Integer("1"), Token::Ident("e")]);
    }

    #[test]
    fn test_strings_keep_doubled_quotes() {
        assert_eq!(tokens("'it''s'"), vec![Token::String("it''s")]);
        assert_eq!(tokens(r"'a\nb'"), vec![Token::String(r"a\nb")]);
    }

    #[test]
    fn test_quoted_identifiers() {
        assert_eq!(
            tokens(r#""Col" `order` [group]"#),
            vec![
                Token::QuotedIdent("Col"),
                Token::QuotedIdent("order"),
                Token::QuotedIdent("group"),
            ]
        );
    }

    #[test]
    fn test_blob_literal() {
        assert_eq!(tokens("x'CAFE' X'00'"), vec![Token::Blob("CAFE"), Token::Blob("00")]);
    }

    #[test]
    fn test_blob_odd_length_is_invalid() {
        assert!(matches!(
            lex_error("x'ABC'"),
            LexError::InvalidCharacter { ch: '\'', position: 5 }
        ));
    }

    #[test]
    fn test_blob_non_hex_is_invalid() {
        assert!(matches!(
            lex_error("x'AZ'"),
            LexError::InvalidCharacter { ch: 'Z', position: 3 }
        ));
    }

    #[test]
    fn test_unterminated_string() {
        assert_eq!(
            lex_error("SELECT 'abc"),
            LexError::UnterminatedString { position: 7 }
        );
    }

    #[test]
    fn test_greedy_operators() {
        assert_eq!(
            tokens("<= <> << >= >> != == || -> ->> < > = -"),
            vec![
                Token::LtEq,
                Token::NotEq,
                Token::LeftShift,
                Token::GtEq,
                Token::RightShift,
                Token::NotEq,
                Token::Eq,
                Token::Concat,
                Token::Arrow,
                Token::DoubleArrow,
                Token::Lt,
                Token::Gt,
                Token::Eq,
                Token::Minus,
            ]
        );
    }

    #[test]
    fn test_bare_bang_and_pipe_are_invalid_operators() {
        assert_eq!(lex_error("a ! b"), LexError::InvalidOperator { op: '!', position: 2 });
        assert_eq!(lex_error("a | b"), LexError::InvalidOperator { op: '|', position: 2 });
    }

    #[test]
    fn test_invalid_character() {
        assert_eq!(lex_error("SELECT #"), LexError::InvalidCharacter { ch: '#', position: 7 });
    }

    #[test]
    fn test_comments_are_skipped() {
        let sql = "SELECT -- line\n a // other\n, /* block */ b /* open";
        assert_eq!(
            tokens(sql),
            vec![
                Token::Keyword(Keyword::Select),
                Token::Ident("a"),
                Token::Comma,
                Token::Ident("b"),
            ]
        );
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(
            tokens("? ?12 :name @id $v"),
            vec![
                Token::Parameter(Parameter::Anonymous),
                Token::Parameter(Parameter::Numbered(12)),
                Token::Parameter(Parameter::Named(":name")),
                Token::Parameter(Parameter::Named("@id")),
                Token::Parameter(Parameter::Named("$v")),
            ]
        );
    }

    #[test]
    fn test_positions_lines_and_columns() {
        let toks = tokenize("SELECT a\n  FROM t").unwrap();
        assert_eq!(toks[0].position(), 0);
        assert_eq!(toks[1].position(), 7);
        assert_eq!(toks[2].line, 2);
        assert_eq!(toks[2].column, 3);
        assert_eq!(toks[2].text, "FROM");
    }

    #[test]
    fn test_streaming_peek_does_not_consume() {
        let mut lexer = Lexer::new("a b");
        assert_eq!(lexer.peek().token, Token::Ident("a"));
        assert_eq!(lexer.next_spanned().token, Token::Ident("a"));
        assert_eq!(lexer.next_spanned().token, Token::Ident("b"));
        assert_eq!(lexer.next_spanned().token, Token::Eof);
    }

    #[test]
    fn test_lex_error_display() {
        let err = LexError::InvalidOperator { op: '!', position: 4 };
        assert_eq!(err.to_string(), "invalid operator '!' at position 4");
    }
}
