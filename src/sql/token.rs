//! # SQL Tokens
//!
//! Token definitions shared by the lexer, the parser and the normalizer.
//! Tokens borrow their text from the input, so a token stream is valid only
//! while the SQL string it was produced from is alive.
//!
//! ## Token Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Keywords | `Keyword(Keyword)` |
//! | Names | `Ident`, `QuotedIdent` |
//! | Literals | `Integer`, `Float`, `String`, `Blob` |
//! | Placeholders | `Parameter(Parameter)` |
//! | Operators | `Plus` .. `Tilde` |
//! | Punctuation | `LParen`, `RParen`, `Comma`, `Semicolon`, `Dot` |
//! | Control | `Eof`, `Error(LexError)` |
//!
//! ## Reserved Keywords
//!
//! Only a subset of keywords is reserved. Non-reserved keywords (`KEY`,
//! `FIRST`, `PLAN`, `REPLACE`, ...) are accepted wherever the grammar expects
//! a name, which keeps common column names such as `key` or `first` usable.

use super::lexer::LexError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub len: usize,
}

impl Span {
    pub fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter<'a> {
    /// `?`
    Anonymous,
    /// `?NNN`, 1-based.
    Numbered(u32),
    /// `:name`, `@name` or `$name`, prefix included.
    Named(&'a str),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    Keyword(Keyword),
    Ident(&'a str),
    /// `"name"`, `` `name` `` or `[name]`, without the delimiters.
    QuotedIdent(&'a str),
    Integer(&'a str),
    Float(&'a str),
    /// Single-quoted literal body; doubled quotes are still doubled.
    String(&'a str),
    /// Hex digits of `x'..'`.
    Blob(&'a str),
    Parameter(Parameter<'a>),

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Concat,
    Arrow,
    DoubleArrow,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    LeftShift,
    RightShift,
    Ampersand,
    Tilde,

    LParen,
    RParen,
    Comma,
    Semicolon,
    Dot,

    Eof,
    Error(LexError),
}

/// Discriminant of a [`Token`], used where the token text is irrelevant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Keyword,
    Ident,
    QuotedIdent,
    Integer,
    Float,
    String,
    Blob,
    Parameter,
    Operator,
    Punctuation,
    Eof,
    Error,
}

impl<'a> Token<'a> {
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Keyword(_) => TokenKind::Keyword,
            Token::Ident(_) => TokenKind::Ident,
            Token::QuotedIdent(_) => TokenKind::QuotedIdent,
            Token::Integer(_) => TokenKind::Integer,
            Token::Float(_) => TokenKind::Float,
            Token::String(_) => TokenKind::String,
            Token::Blob(_) => TokenKind::Blob,
            Token::Parameter(_) => TokenKind::Parameter,
            Token::LParen | Token::RParen | Token::Comma | Token::Semicolon | Token::Dot => {
                TokenKind::Punctuation
            }
            Token::Eof => TokenKind::Eof,
            Token::Error(_) => TokenKind::Error,
            _ => TokenKind::Operator,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Token::Integer(_) | Token::Float(_) | Token::String(_) | Token::Blob(_)
        )
    }
}

/// A token together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken<'a> {
    pub token: Token<'a>,
    /// Exact source text of the token, delimiters included.
    pub text: &'a str,
    pub span: Span,
    pub line: u32,
    pub column: u32,
}

impl<'a> SpannedToken<'a> {
    pub fn kind(&self) -> TokenKind {
        self.token.kind()
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn position(&self) -> usize {
        self.span.start
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Abort,
    Action,
    Add,
    After,
    All,
    Alter,
    Always,
    Analyze,
    And,
    Any,
    As,
    Asc,
    Autoincrement,
    Backup,
    Before,
    Begin,
    Between,
    By,
    Cascade,
    Case,
    Cast,
    Check,
    Collate,
    Column,
    Commit,
    Conflict,
    Constraint,
    Create,
    Cross,
    Current,
    Default,
    Deferred,
    Delete,
    Desc,
    Distinct,
    Do,
    Drop,
    Each,
    Else,
    End,
    Escape,
    Except,
    Exclusive,
    Exists,
    Explain,
    Fail,
    False,
    Fetch,
    Filter,
    First,
    Following,
    For,
    Foreign,
    From,
    Full,
    Generated,
    Glob,
    Group,
    Groups,
    Having,
    If,
    Ignore,
    Immediate,
    In,
    Incremental,
    Index,
    Indexed,
    Inner,
    Insert,
    Instead,
    Intersect,
    Into,
    Is,
    Join,
    Key,
    Last,
    Left,
    Like,
    Limit,
    Match,
    Natural,
    Next,
    No,
    Not,
    Nothing,
    Null,
    Nulls,
    Of,
    Offset,
    On,
    Only,
    Or,
    Order,
    Outer,
    Over,
    Partition,
    Plan,
    Pragma,
    Preceding,
    Primary,
    Query,
    Range,
    Recursive,
    References,
    Regexp,
    Reindex,
    Release,
    Rename,
    Replace,
    Restrict,
    Returning,
    Right,
    Rollback,
    Row,
    Rows,
    Savepoint,
    Select,
    Set,
    Some,
    Stored,
    Table,
    Temp,
    Temporary,
    Then,
    To,
    Transaction,
    Trigger,
    True,
    Unbounded,
    Union,
    Unique,
    Update,
    Using,
    Vacuum,
    Values,
    View,
    Virtual,
    When,
    Where,
    Window,
    With,
    Without,
}

impl Keyword {
    /// Reserved keywords can never be used as bare identifiers.
    pub fn is_reserved(self) -> bool {
        matches!(
            self,
            Keyword::All
                | Keyword::Alter
                | Keyword::And
                | Keyword::As
                | Keyword::Between
                | Keyword::Case
                | Keyword::Cast
                | Keyword::Check
                | Keyword::Collate
                | Keyword::Constraint
                | Keyword::Create
                | Keyword::Cross
                | Keyword::Default
                | Keyword::Delete
                | Keyword::Distinct
                | Keyword::Drop
                | Keyword::Else
                | Keyword::End
                | Keyword::Escape
                | Keyword::Except
                | Keyword::Exists
                | Keyword::False
                | Keyword::Foreign
                | Keyword::From
                | Keyword::Full
                | Keyword::Glob
                | Keyword::Group
                | Keyword::Having
                | Keyword::In
                | Keyword::Index
                | Keyword::Inner
                | Keyword::Insert
                | Keyword::Intersect
                | Keyword::Into
                | Keyword::Is
                | Keyword::Join
                | Keyword::Left
                | Keyword::Like
                | Keyword::Limit
                | Keyword::Match
                | Keyword::Natural
                | Keyword::Not
                | Keyword::Null
                | Keyword::Offset
                | Keyword::On
                | Keyword::Or
                | Keyword::Order
                | Keyword::Outer
                | Keyword::Primary
                | Keyword::References
                | Keyword::Returning
                | Keyword::Right
                | Keyword::Select
                | Keyword::Set
                | Keyword::Table
                | Keyword::Then
                | Keyword::True
                | Keyword::Union
                | Keyword::Unique
                | Keyword::Update
                | Keyword::Using
                | Keyword::Values
                | Keyword::When
                | Keyword::Where
                | Keyword::Window
                | Keyword::With
        )
    }

    /// Keywords that end a projection item; an identifier followed by one of
    /// these is an implicit alias.
    pub fn ends_select_item(self) -> bool {
        matches!(
            self,
            Keyword::From
                | Keyword::Where
                | Keyword::Group
                | Keyword::Having
                | Keyword::Window
                | Keyword::Order
                | Keyword::Limit
                | Keyword::Union
                | Keyword::Except
                | Keyword::Intersect
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_kind_classification() {
        assert_eq!(Token::Keyword(Keyword::Select).kind(), TokenKind::Keyword);
        assert_eq!(Token::Concat.kind(), TokenKind::Operator);
        assert_eq!(Token::Comma.kind(), TokenKind::Punctuation);
        assert_eq!(Token::Parameter(Parameter::Anonymous).kind(), TokenKind::Parameter);
    }

    #[test]
    fn test_reserved_keywords() {
        assert!(Keyword::Select.is_reserved());
        assert!(!Keyword::Key.is_reserved());
        assert!(!Keyword::First.is_reserved());
        assert!(Keyword::From.ends_select_item());
        assert!(!Keyword::As.ends_select_item());
    }
}
