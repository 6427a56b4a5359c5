//! # Top-N Accumulator
//!
//! Keeps the best `n` rows of a stream in `O(n)` memory for
//! `ORDER BY ... LIMIT n`. The rows live in a binary heap whose root is the
//! worst row kept, so a new row only has to beat the root to get in.
//!
//! ```text
//!            worst
//!           /     \
//!       better   better
//! ```

use std::cmp::Ordering;

pub struct TopN<R, F>
where
    F: Fn(&R, &R) -> bool,
{
    limit: usize,
    heap: Vec<R>,
    is_better: F,
}

impl<R, F> TopN<R, F>
where
    F: Fn(&R, &R) -> bool,
{
    /// `is_better(a, b)` is true when `a` sorts strictly before `b`.
    pub fn new(limit: usize, is_better: F) -> Self {
        Self {
            limit,
            heap: Vec::with_capacity(limit),
            is_better,
        }
    }

    pub fn push(&mut self, row: R) {
        if self.limit == 0 {
            return;
        }
        if self.heap.len() < self.limit {
            self.heap.push(row);
            self.sift_up(self.heap.len() - 1);
        } else if (self.is_better)(&row, &self.heap[0]) {
            self.heap[0] = row;
            self.sift_down(0);
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Kept rows, best first.
    pub fn into_sorted_result(self) -> Vec<R> {
        let Self {
            mut heap,
            is_better,
            ..
        } = self;
        heap.sort_by(|a, b| {
            if is_better(a, b) {
                Ordering::Less
            } else if is_better(b, a) {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        });
        heap
    }

    fn is_worse(&self, a: usize, b: usize) -> bool {
        (self.is_better)(&self.heap[b], &self.heap[a])
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if !self.is_worse(i, parent) {
                break;
            }
            self.heap.swap(i, parent);
            i = parent;
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        let len = self.heap.len();
        loop {
            let mut worst = i;
            for child in [2 * i + 1, 2 * i + 2] {
                if child < len && self.is_worse(child, worst) {
                    worst = child;
                }
            }
            if worst == i {
                break;
            }
            self.heap.swap(i, worst);
            i = worst;
        }
    }
}
