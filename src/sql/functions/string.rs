//! # String Functions
//!
//! Positions are 1-based and counted in characters, not bytes. Non-text
//! arguments are converted through their canonical text form, so
//! `UPPER(12)` is `'12'`.

use super::{any_null, arg_int, arg_text};
use crate::types::Value;

const NAMES: &[&str] = &[
    "UPPER", "LOWER", "LENGTH", "SUBSTR", "SUBSTRING", "TRIM", "LTRIM", "RTRIM", "REPLACE",
    "INSTR", "REVERSE", "CONCAT", "LEFT", "RIGHT", "HEX",
];

pub(super) fn handles(name: &str) -> bool {
    NAMES.contains(&name)
}

pub(super) fn eval_string_function(name: &str, args: &[Value]) -> Option<Value> {
    match name {
        "UPPER" => map_text(args, |s| s.to_uppercase()),
        "LOWER" => map_text(args, |s| s.to_lowercase()),
        "LENGTH" => eval_length(args),
        "SUBSTR" | "SUBSTRING" => eval_substr(args),
        "TRIM" => eval_trim(args, TrimSide::Both),
        "LTRIM" => eval_trim(args, TrimSide::Start),
        "RTRIM" => eval_trim(args, TrimSide::End),
        "REPLACE" => eval_replace(args),
        "INSTR" => eval_instr(args),
        "REVERSE" => map_text(args, |s| s.chars().rev().collect()),
        "CONCAT" => eval_concat(args),
        "LEFT" => eval_left(args),
        "RIGHT" => eval_right(args),
        "HEX" => eval_hex(args),
        _ => None,
    }
}

fn map_text(args: &[Value], f: impl FnOnce(&str) -> String) -> Option<Value> {
    if args.len() != 1 {
        return None;
    }
    match arg_text(args, 0) {
        Some(s) => Some(Value::Text(f(&s))),
        None => Some(Value::Null),
    }
}

fn eval_length(args: &[Value]) -> Option<Value> {
    match args.first()? {
        Value::Null => Some(Value::Null),
        Value::Blob(b) => Some(Value::Int(b.len() as i64)),
        other => Some(Value::Int(other.display_string().chars().count() as i64)),
    }
}

/// `SUBSTR(x, start [, len])`. A negative start counts from the end; a
/// negative length takes characters before `start`.
fn eval_substr(args: &[Value]) -> Option<Value> {
    if !(2..=3).contains(&args.len()) {
        return None;
    }
    if any_null(args) {
        return Some(Value::Null);
    }
    let chars: Vec<char> = arg_text(args, 0)?.chars().collect();
    let size = chars.len() as i64;
    let mut start = arg_int(args, 1)?;
    let mut len = match args.get(2) {
        Some(_) => arg_int(args, 2)?,
        None => size.saturating_add(1),
    };

    if start < 0 {
        start += size + 1;
        if start < 1 {
            len += start - 1;
            start = 1;
        }
    } else if start == 0 {
        len -= 1;
        start = 1;
    }
    if len < 0 {
        let end = start;
        start = (start + len).max(1);
        len = end - start;
    }

    let from = (start - 1).clamp(0, size) as usize;
    let to = (start - 1).saturating_add(len).clamp(0, size) as usize;
    Some(Value::Text(chars[from..to.max(from)].iter().collect()))
}

#[derive(Clone, Copy)]
enum TrimSide {
    Start,
    End,
    Both,
}

fn eval_trim(args: &[Value], side: TrimSide) -> Option<Value> {
    if !(1..=2).contains(&args.len()) {
        return None;
    }
    if any_null(args) {
        return Some(Value::Null);
    }
    let text = arg_text(args, 0)?;
    let set: Vec<char> = match args.get(1) {
        Some(_) => arg_text(args, 1)?.chars().collect(),
        None => vec![' '],
    };
    let trim = |c: char| set.contains(&c);
    let out = match side {
        TrimSide::Start => text.trim_start_matches(trim),
        TrimSide::End => text.trim_end_matches(trim),
        TrimSide::Both => text.trim_matches(trim),
    };
    Some(Value::Text(out.to_string()))
}

fn eval_replace(args: &[Value]) -> Option<Value> {
    if args.len() != 3 {
        return None;
    }
    if any_null(args) {
        return Some(Value::Null);
    }
    let text = arg_text(args, 0)?;
    let from = arg_text(args, 1)?;
    let to = arg_text(args, 2)?;
    if from.is_empty() {
        return Some(Value::Text(text));
    }
    Some(Value::Text(text.replace(&from, &to)))
}

fn eval_instr(args: &[Value]) -> Option<Value> {
    if args.len() != 2 {
        return None;
    }
    if any_null(args) {
        return Some(Value::Null);
    }
    let haystack = arg_text(args, 0)?;
    let needle = arg_text(args, 1)?;
    let position = match haystack.find(&needle) {
        Some(byte) => haystack[..byte].chars().count() as i64 + 1,
        None => 0,
    };
    Some(Value::Int(position))
}

fn eval_concat(args: &[Value]) -> Option<Value> {
    let mut out = String::new();
    for arg in args {
        if !arg.is_null() {
            out.push_str(&arg.display_string());
        }
    }
    Some(Value::Text(out))
}

fn eval_left(args: &[Value]) -> Option<Value> {
    if args.len() != 2 {
        return None;
    }
    if any_null(args) {
        return Some(Value::Null);
    }
    let n = arg_int(args, 1)?.max(0) as usize;
    Some(Value::Text(arg_text(args, 0)?.chars().take(n).collect()))
}

fn eval_right(args: &[Value]) -> Option<Value> {
    if args.len() != 2 {
        return None;
    }
    if any_null(args) {
        return Some(Value::Null);
    }
    let text = arg_text(args, 0)?;
    let n = arg_int(args, 1)?.max(0) as usize;
    let skip = text.chars().count().saturating_sub(n);
    Some(Value::Text(text.chars().skip(skip).collect()))
}

fn eval_hex(args: &[Value]) -> Option<Value> {
    let bytes = match args.first()? {
        Value::Null => return Some(Value::Text(String::new())),
        Value::Blob(b) => b.clone(),
        other => other.display_string().into_bytes(),
    };
    Some(Value::Text(crate::types::hex_encode(&bytes).to_ascii_uppercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Value {
        Value::Text(s.into())
    }

    fn call(name: &str, args: &[Value]) -> Value {
        eval_string_function(name, args).unwrap()
    }

    #[test]
    fn test_case_mapping_converts_numbers() {
        assert_eq!(call("UPPER", &[text("héllo")]), text("HÉLLO"));
        assert_eq!(call("LOWER", &[Value::Int(12)]), text("12"));
        assert_eq!(call("UPPER", &[Value::Null]), Value::Null);
    }

    #[test]
    fn test_length_counts_chars() {
        assert_eq!(call("LENGTH", &[text("héllo")]), Value::Int(5));
        assert_eq!(call("LENGTH", &[Value::Blob(vec![1, 2, 3])]), Value::Int(3));
        assert_eq!(call("LENGTH", &[Value::Int(-42)]), Value::Int(3));
    }

    #[test]
    fn test_substr_forms() {
        assert_eq!(call("SUBSTR", &[text("abcdef"), Value::Int(2)]), text("bcdef"));
        assert_eq!(
            call("SUBSTR", &[text("abcdef"), Value::Int(2), Value::Int(3)]),
            text("bcd")
        );
        assert_eq!(
            call("SUBSTR", &[text("abcdef"), Value::Int(-2), Value::Int(2)]),
            text("ef")
        );
        assert_eq!(
            call("SUBSTR", &[text("abcdef"), Value::Int(0), Value::Int(2)]),
            text("a")
        );
        assert_eq!(
            call("SUBSTR", &[text("abcdef"), Value::Int(4), Value::Int(-2)]),
            text("bc")
        );
        assert_eq!(
            call("SUBSTR", &[text("abc"), Value::Int(10)]),
            text("")
        );
    }

    #[test]
    fn test_trim_with_char_set() {
        assert_eq!(call("TRIM", &[text("  x  ")]), text("x"));
        assert_eq!(call("LTRIM", &[text("xxyxx"), text("x")]), text("yxx"));
        assert_eq!(call("RTRIM", &[text("xxyxx"), text("x")]), text("xxy"));
    }

    #[test]
    fn test_replace_and_instr() {
        assert_eq!(
            call("REPLACE", &[text("a-b-c"), text("-"), text("+")]),
            text("a+b+c")
        );
        assert_eq!(call("INSTR", &[text("héllo"), text("llo")]), Value::Int(3));
        assert_eq!(call("INSTR", &[text("abc"), text("z")]), Value::Int(0));
    }

    #[test]
    fn test_hex_uppercase() {
        assert_eq!(call("HEX", &[Value::Blob(vec![0xab, 0x01])]), text("AB01"));
        assert_eq!(call("HEX", &[text("A")]), text("41"));
    }

    #[test]
    fn test_wrong_arity_is_none() {
        assert_eq!(eval_string_function("UPPER", &[]), None);
        assert_eq!(eval_string_function("REPLACE", &[text("a")]), None);
    }
}
