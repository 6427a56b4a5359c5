//! Window function kernels. Each kernel fills `out[row]` for every row of one
//! sorted partition; rows it does not touch stay NULL.

use std::cmp::Ordering;

use hashbrown::HashSet;

use super::eval::{as_number, RowEvaluator};
use super::frame::resolve_frame_bounds;
use super::partition::SortedPartition;
use crate::config::DEFAULT_LAG_LEAD_OFFSET;
use crate::sql::ast::WindowFuncExpr;
use crate::types::{compare_values, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ranking {
    Rank,
    DenseRank,
    PercentRank,
    CumeDist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameAggregate {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    Total,
}

impl FrameAggregate {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "COUNT" => Self::Count,
            "SUM" => Self::Sum,
            "AVG" => Self::Avg,
            "MIN" => Self::Min,
            "MAX" => Self::Max,
            "TOTAL" => Self::Total,
            _ => return None,
        })
    }
}

pub(crate) fn evaluate(
    wf: &WindowFuncExpr,
    part: &SortedPartition<'_>,
    eval: &RowEvaluator<'_>,
    out: &mut [Value],
) {
    if part.len() == 0 {
        return;
    }
    let name = wf.name.to_ascii_uppercase();
    match name.as_str() {
        "ROW_NUMBER" => {
            for pos in 0..part.len() {
                out[part.row(pos)] = Value::Int(pos as i64 + 1);
            }
        }
        "RANK" => ranking(Ranking::Rank, part, out),
        "DENSE_RANK" => ranking(Ranking::DenseRank, part, out),
        "PERCENT_RANK" => ranking(Ranking::PercentRank, part, out),
        "CUME_DIST" => ranking(Ranking::CumeDist, part, out),
        "NTILE" => ntile(wf, part, eval, out),
        "LAG" => lag_lead(wf, part, eval, out, false),
        "LEAD" => lag_lead(wf, part, eval, out, true),
        "FIRST_VALUE" | "LAST_VALUE" | "NTH_VALUE" => frame_value(&name, wf, part, eval, out),
        other => {
            if let Some(kind) = FrameAggregate::from_name(other) {
                aggregate(kind, wf, part, eval, out);
            }
        }
    }
}

fn ranking(kind: Ranking, part: &SortedPartition<'_>, out: &mut [Value]) {
    let n = part.len();
    let mut start = 0;
    let mut dense = 0i64;
    while start < n {
        let end = part.peer_run_end(start);
        dense += 1;
        let value = match kind {
            Ranking::Rank => Value::Int(start as i64 + 1),
            Ranking::DenseRank => Value::Int(dense),
            Ranking::PercentRank if n <= 1 => Value::Float(0.0),
            Ranking::PercentRank => Value::Float(start as f64 / (n - 1) as f64),
            Ranking::CumeDist => Value::Float(end as f64 / n as f64),
        };
        for pos in start..end {
            out[part.row(pos)] = value.clone();
        }
        start = end;
    }
}

/// Bucket sizes `n / k`, the first `n % k` buckets one larger.
fn ntile(wf: &WindowFuncExpr, part: &SortedPartition<'_>, eval: &RowEvaluator<'_>, out: &mut [Value]) {
    let k = wf
        .args
        .first()
        .and_then(|a| eval.eval(part.row(0), a).as_i64())
        .filter(|k| *k > 0);
    let Some(k) = k.and_then(|k| usize::try_from(k).ok()) else {
        return;
    };
    let n = part.len();
    let small = n / k;
    let large = small + 1;
    let extra = n % k;
    let large_span = extra * large;
    for pos in 0..n {
        let bucket = if pos < large_span {
            pos / large
        } else {
            extra + (pos - large_span) / small
        };
        out[part.row(pos)] = Value::Int(bucket as i64 + 1);
    }
}

fn lag_lead(
    wf: &WindowFuncExpr,
    part: &SortedPartition<'_>,
    eval: &RowEvaluator<'_>,
    out: &mut [Value],
    lead: bool,
) {
    let Some(arg) = wf.args.first() else {
        return;
    };
    let n = part.len() as i64;
    for pos in 0..part.len() {
        let row = part.row(pos);
        let offset = wf
            .args
            .get(1)
            .and_then(|a| eval.eval(row, a).as_i64())
            .unwrap_or(DEFAULT_LAG_LEAD_OFFSET);
        let delta = if lead { Some(offset) } else { offset.checked_neg() };
        let target = delta.and_then(|d| (pos as i64).checked_add(d)).filter(|t| (0..n).contains(t));
        out[row] = match target {
            Some(t) => eval.eval(part.row(t as usize), arg),
            None => wf
                .args
                .get(2)
                .map_or(Value::Null, |d| eval.eval(row, d)),
        };
    }
}

fn frame_value(
    name: &str,
    wf: &WindowFuncExpr,
    part: &SortedPartition<'_>,
    eval: &RowEvaluator<'_>,
    out: &mut [Value],
) {
    let Some(arg) = wf.args.first() else {
        return;
    };
    for pos in 0..part.len() {
        let row = part.row(pos);
        let (start, end) = resolve_frame_bounds(wf.frame.as_ref(), pos, part.len());
        let target = match name {
            "FIRST_VALUE" => Some(start),
            "LAST_VALUE" => Some(end),
            _ => wf
                .args
                .get(1)
                .and_then(|a| eval.eval(row, a).as_i64())
                .filter(|k| *k >= 1)
                .and_then(|k| usize::try_from(k - 1).ok())
                .and_then(|k| start.checked_add(k))
                .filter(|t| *t <= end),
        };
        if let Some(t) = target {
            out[row] = eval.eval(part.row(t), arg);
        }
    }
}

fn aggregate(
    kind: FrameAggregate,
    wf: &WindowFuncExpr,
    part: &SortedPartition<'_>,
    eval: &RowEvaluator<'_>,
    out: &mut [Value],
) {
    let count_rows = kind == FrameAggregate::Count && (wf.star || wf.args.is_empty());
    // None marks a row excluded by FILTER
    let inputs: Vec<Option<Value>> = part
        .rows()
        .iter()
        .map(|&row| {
            if let Some(filter) = &wf.filter {
                if !eval.eval_predicate(row, filter) {
                    return None;
                }
            }
            if count_rows {
                return Some(Value::Int(1));
            }
            Some(wf.args.first().map_or(Value::Null, |a| eval.eval(row, a)))
        })
        .collect();
    let distinct = wf.distinct && !count_rows;

    if !part.is_ordered() && wf.frame.is_none() {
        let value = fold(kind, &inputs, distinct);
        for &row in part.rows() {
            out[row] = value.clone();
        }
        return;
    }
    for pos in 0..part.len() {
        let (start, end) = resolve_frame_bounds(wf.frame.as_ref(), pos, part.len());
        out[part.row(pos)] = fold(kind, &inputs[start..=end], distinct);
    }
}

fn fold(kind: FrameAggregate, inputs: &[Option<Value>], distinct: bool) -> Value {
    let mut values: Vec<&Value> = inputs
        .iter()
        .flatten()
        .filter(|v| !v.is_null())
        .collect();
    if distinct {
        let mut seen = HashSet::new();
        values.retain(|v| seen.insert(v.to_sql()));
    }

    match kind {
        FrameAggregate::Count => Value::Int(values.len() as i64),
        FrameAggregate::Total => Value::Float(values.iter().map(|v| as_number(v)).sum()),
        _ if values.is_empty() => Value::Null,
        FrameAggregate::Sum => sum(&values),
        FrameAggregate::Avg => {
            Value::Float(values.iter().map(|v| as_number(v)).sum::<f64>() / values.len() as f64)
        }
        FrameAggregate::Min => extreme(&values, Ordering::Less),
        FrameAggregate::Max => extreme(&values, Ordering::Greater),
    }
}

/// Integer while every input is an integer and the sum fits, otherwise Float.
fn sum(values: &[&Value]) -> Value {
    let ints: Option<i64> = values.iter().try_fold(0i64, |acc, v| match v {
        Value::Int(i) => acc.checked_add(*i),
        _ => None,
    });
    match ints {
        Some(total) => Value::Int(total),
        None => Value::Float(values.iter().map(|v| as_number(v)).sum()),
    }
}

fn extreme(values: &[&Value], keep: Ordering) -> Value {
    values
        .iter()
        .copied()
        .reduce(|best, v| if compare_values(v, best) == keep { v } else { best })
        .cloned()
        .unwrap_or(Value::Null)
}
