//! Frame bound resolution.
//!
//! Positions are indices into the sorted partition. ROWS, RANGE and GROUPS
//! frames all resolve by row offset.

use crate::sql::ast::{Expr, WindowFrame, WindowFrameBound};
use crate::types::Value;

/// `N` of `N PRECEDING` / `N FOLLOWING`. Only a non-negative integer literal
/// counts; any other expression is treated as 0.
fn bound_offset(expr: &Expr) -> usize {
    match expr.unaliased() {
        Expr::Literal(Value::Int(n)) if *n >= 0 => usize::try_from(*n).unwrap_or(usize::MAX),
        _ => 0,
    }
}

fn resolve_bound(bound: &WindowFrameBound, pos: usize, last: usize) -> usize {
    match bound {
        WindowFrameBound::UnboundedPreceding => 0,
        WindowFrameBound::UnboundedFollowing => last,
        WindowFrameBound::CurrentRow => pos,
        WindowFrameBound::Preceding(n) => pos.saturating_sub(bound_offset(n)),
        WindowFrameBound::Following(n) => pos.saturating_add(bound_offset(n)).min(last),
    }
}

/// Inclusive `(start, end)` of the frame around `pos` in a partition of
/// `size` rows. No frame means `(0, pos)`. Both ends are clamped into the
/// partition and a start past the end collapses onto the end.
pub fn resolve_frame_bounds(frame: Option<&WindowFrame>, pos: usize, size: usize) -> (usize, usize) {
    if size == 0 {
        return (0, 0);
    }
    let last = size - 1;
    let pos = pos.min(last);
    let Some(frame) = frame else {
        return (0, pos);
    };
    let start = resolve_bound(&frame.start, pos, last).min(last);
    let end = frame
        .end
        .as_ref()
        .map_or(pos, |b| resolve_bound(b, pos, last))
        .min(last);
    (start.min(end), end)
}
