//! # Statement Normalization
//!
//! Derives the plan-cache key of a SQL string. Two statements that differ only
//! in literal values, keyword case, whitespace or comments share a key.
//!
//! ```text
//! SELECT * FROM users WHERE id = 1      ─┐
//! select   *  from USERS where id=999   ─┴─> "select * from users where id = ?"
//! ```
//!
//! ## Rules
//!
//! | Token | Emitted as |
//! |-------|------------|
//! | keyword, bare identifier | lowercased text |
//! | quoted identifier | verbatim, delimiters included |
//! | integer, float, string, blob | `?` |
//! | placeholder | verbatim |
//! | operator, punctuation | source text |
//!
//! Tokens are joined by single spaces and trailing `;` are dropped. If the
//! input does not lex, the key falls back to the lowercased input with runs
//! of whitespace collapsed.

use super::lexer::Lexer;
use super::token::Token;

pub fn normalize(sql: &str) -> String {
    let mut lexer = Lexer::new(sql);
    let mut parts: Vec<String> = Vec::new();

    loop {
        let spanned = lexer.next_spanned();
        let part = match spanned.token {
            Token::Eof => break,
            Token::Error(_) => return fallback_key(sql),
            Token::Integer(_) | Token::Float(_) | Token::String(_) | Token::Blob(_) => {
                "?".to_string()
            }
            Token::QuotedIdent(_) | Token::Parameter(_) => spanned.text.to_string(),
            _ => spanned.text.to_ascii_lowercase(),
        };
        parts.push(part);
    }

    while parts.last().map(String::as_str) == Some(";") {
        parts.pop();
    }
    parts.join(" ")
}

/// True when the statement carries a literal value outside placeholders. A
/// statement that does not lex counts as literal-bearing.
pub fn has_literals(sql: &str) -> bool {
    let mut lexer = Lexer::new(sql);
    loop {
        match lexer.next_token() {
            Token::Eof => return false,
            Token::Error(_) => return true,
            token if token.is_literal() => return true,
            _ => {}
        }
    }
}

fn fallback_key(sql: &str) -> String {
    sql.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
