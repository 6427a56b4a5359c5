//! Partitioning and ordering of rows.

use std::cmp::Ordering;

use bumpalo::collections::Vec as BumpVec;
use bumpalo::Bump;
use hashbrown::HashMap;
use smallvec::SmallVec;

use super::eval::RowEvaluator;
use crate::config::PARTITION_KEY_SEPARATOR;
use crate::sql::ast::{Expr, NullsOrder, OrderByItem};
use crate::types::{compare_values, Value};

type SortKey = SmallVec<[Value; 2]>;

/// Group key of one row. Each part is the SQL literal form of the value, so
/// `1` and `'1'` and NULL and `''` land in different groups.
pub(crate) fn partition_key(eval: &RowEvaluator<'_>, row: usize, exprs: &[Expr]) -> String {
    let parts: SmallVec<[String; 4]> = exprs.iter().map(|e| eval.eval(row, e).to_sql()).collect();
    parts.join(PARTITION_KEY_SEPARATOR)
}

/// Row indices grouped by PARTITION BY key, groups in first-seen order and
/// rows in input order.
pub(crate) fn build_partitions(
    eval: &RowEvaluator<'_>,
    row_count: usize,
    exprs: &[Expr],
) -> Vec<Vec<usize>> {
    if exprs.is_empty() {
        return vec![(0..row_count).collect()];
    }
    let mut slot_of: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for row in 0..row_count {
        let key = partition_key(eval, row, exprs);
        let slot = *slot_of.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(row);
    }
    groups
}

fn compare_item(a: &Value, b: &Value, item: &OrderByItem) -> Ordering {
    match (a.is_null(), b.is_null(), item.nulls) {
        (true, true, _) => Ordering::Equal,
        (true, false, NullsOrder::First) | (false, true, NullsOrder::Last) => Ordering::Less,
        (true, false, NullsOrder::Last) | (false, true, NullsOrder::First) => Ordering::Greater,
        _ => {
            let ord = compare_values(a, b);
            if item.is_desc() {
                ord.reverse()
            } else {
                ord
            }
        }
    }
}

fn compare_keys(a: &SortKey, b: &SortKey, order_by: &[OrderByItem]) -> Ordering {
    for ((x, y), item) in a.iter().zip(b.iter()).zip(order_by) {
        let ord = compare_item(x, y, item);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// One partition after ORDER BY, with the sort keys kept for peer tests.
pub(crate) struct SortedPartition<'b> {
    rows: BumpVec<'b, usize>,
    keys: Vec<SortKey>,
    ordered: bool,
}

impl<'b> SortedPartition<'b> {
    /// Stable sort of `group` by `order_by`. Scratch lives in `arena`.
    pub(crate) fn sort(
        arena: &'b Bump,
        eval: &RowEvaluator<'_>,
        group: &[usize],
        order_by: &[OrderByItem],
    ) -> Self {
        let mut keyed: Vec<Option<SortKey>> = group
            .iter()
            .map(|&row| Some(order_by.iter().map(|o| eval.eval(row, &o.expr)).collect()))
            .collect();

        let mut perm = BumpVec::with_capacity_in(group.len(), arena);
        perm.extend(0..group.len());
        if !order_by.is_empty() {
            perm.sort_by(|&a: &usize, &b: &usize| match (&keyed[a], &keyed[b]) {
                (Some(x), Some(y)) => compare_keys(x, y, order_by),
                _ => Ordering::Equal,
            });
        }

        let mut rows = BumpVec::with_capacity_in(group.len(), arena);
        rows.extend(perm.iter().map(|&i| group[i]));
        let keys = perm
            .iter()
            .map(|&i| keyed[i].take().unwrap_or_default())
            .collect();

        Self {
            rows,
            keys,
            ordered: !order_by.is_empty(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }

    /// Input row index at sorted position `pos`.
    pub(crate) fn row(&self, pos: usize) -> usize {
        self.rows[pos]
    }

    pub(crate) fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub(crate) fn is_ordered(&self) -> bool {
        self.ordered
    }

    /// Equal ORDER BY keys. Without ORDER BY every row is a peer.
    pub(crate) fn are_peers(&self, a: usize, b: usize) -> bool {
        self.keys[a]
            .iter()
            .zip(self.keys[b].iter())
            .all(|(x, y)| compare_values(x, y) == Ordering::Equal)
    }

    /// One past the last position of the peer run starting at or containing
    /// `pos`.
    pub(crate) fn peer_run_end(&self, pos: usize) -> usize {
        let mut end = pos + 1;
        while end < self.len() && self.are_peers(pos, end) {
            end += 1;
        }
        end
    }
}
