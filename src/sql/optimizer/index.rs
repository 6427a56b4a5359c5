//! # Index Selection
//!
//! Chooses among the secondary indexes of one table for a filter column and
//! the set of columns the query must produce.
//!
//! ## Preference Order
//!
//! 1. The leading column matches the filter and the index covers every
//!    required column (index-only scan).
//! 2. The leading column matches the filter (index seek plus row lookup).
//! 3. The index covers every required column (index-only full scan).
//!
//! Ties go to the index declared first.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMeta {
    pub name: String,
    pub table: String,
    pub columns: Vec<String>,
}

impl IndexMeta {
    pub fn new(name: impl Into<String>, table: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn leading_column(&self) -> Option<&str> {
        self.columns.first().map(String::as_str)
    }

    pub fn covers_columns<S: AsRef<str>>(&self, required: &[S]) -> bool {
        required.iter().all(|r| {
            self.columns
                .iter()
                .any(|c| c.eq_ignore_ascii_case(r.as_ref()))
        })
    }

    fn leads_with(&self, column: &str) -> bool {
        self.leading_column()
            .is_some_and(|c| c.eq_ignore_ascii_case(column))
    }
}

pub fn find_covering_index<'a, S: AsRef<str>>(
    indexes: &'a [IndexMeta],
    required: &[S],
) -> Option<&'a IndexMeta> {
    indexes.iter().find(|idx| idx.covers_columns(required))
}

pub fn select_best_index<'a, S: AsRef<str>>(
    indexes: &'a [IndexMeta],
    filter_column: &str,
    required: &[S],
) -> Option<&'a IndexMeta> {
    indexes
        .iter()
        .find(|idx| idx.leads_with(filter_column) && idx.covers_columns(required))
        .or_else(|| indexes.iter().find(|idx| idx.leads_with(filter_column)))
        .or_else(|| find_covering_index(indexes, required))
}
