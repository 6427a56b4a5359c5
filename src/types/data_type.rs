//! # Column Affinity
//!
//! SQLite attaches an *affinity* to every declared column type. The affinity
//! is derived from the type name with a fixed rule set, checked in order:
//!
//! | Rule | Declared type contains | Affinity |
//! |------|------------------------|----------|
//! | 1 | `INT` | Integer |
//! | 2 | `CHAR`, `CLOB`, `TEXT` | Text |
//! | 3 | `BLOB`, or no type at all | Blob |
//! | 4 | `REAL`, `FLOA`, `DOUB` | Real |
//! | 5 | anything else | Numeric |
//!
//! `DataType::Null` is not an affinity; it is the runtime class of a NULL
//! value and is only produced by `Value::data_type`.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DataType {
    Null = 0,
    Integer = 1,
    Real = 2,
    Text = 3,
    Blob = 4,
    Numeric = 5,
}

impl DataType {
    pub fn from_type_name(name: &str) -> Self {
        let upper = name.to_ascii_uppercase();
        if upper.contains("INT") {
            DataType::Integer
        } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
            DataType::Text
        } else if upper.is_empty() || upper.contains("BLOB") {
            DataType::Blob
        } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
            DataType::Real
        } else {
            DataType::Numeric
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DataType::Null => "null",
            DataType::Integer => "integer",
            DataType::Real => "real",
            DataType::Text => "text",
            DataType::Blob => "blob",
            DataType::Numeric => "numeric",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affinity_rules_in_order() {
        assert_eq!(DataType::from_type_name("BIGINT"), DataType::Integer);
        assert_eq!(DataType::from_type_name("varchar(20)"), DataType::Text);
        assert_eq!(DataType::from_type_name(""), DataType::Blob);
        assert_eq!(DataType::from_type_name("DOUBLE PRECISION"), DataType::Real);
        assert_eq!(DataType::from_type_name("DECIMAL(10,2)"), DataType::Numeric);
        // INT wins over CHAR: "CHARINT" is Integer.
        assert_eq!(DataType::from_type_name("CHARINT"), DataType::Integer);
    }
}
