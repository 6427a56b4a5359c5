//! Skip-scan cost heuristic.
//!
//! A skip scan answers a filter on the trailing columns of a composite index
//! by seeking once per distinct value of the leading column. It only pays
//! off when the leading column has few distinct values.

use crate::config::{SKIP_SCAN_ABSOLUTE_THRESHOLD, SKIP_SCAN_CARDINALITY_RATIO};

/// True when `filter_cols` is a proper, non-empty suffix of `index_cols` and
/// the leading column is sparse enough:
///
/// ```text
/// leading_cardinality < min(row_count / RATIO, THRESHOLD)
/// ```
pub fn can_skip_scan<S: AsRef<str>>(
    index_cols: &[S],
    filter_cols: &[S],
    leading_cardinality: usize,
    row_count: usize,
) -> bool {
    if filter_cols.is_empty() || index_cols.len() <= filter_cols.len() {
        return false;
    }
    let suffix = &index_cols[index_cols.len() - filter_cols.len()..];
    let matches = suffix
        .iter()
        .zip(filter_cols)
        .all(|(i, f)| i.as_ref().eq_ignore_ascii_case(f.as_ref()));
    if !matches {
        return false;
    }
    let threshold = (row_count / SKIP_SCAN_CARDINALITY_RATIO).min(SKIP_SCAN_ABSOLUTE_THRESHOLD);
    leading_cardinality < threshold
}
