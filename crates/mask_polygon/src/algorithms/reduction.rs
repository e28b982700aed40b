use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::types::{HullScalar, Point};

/// Area of the triangle cut off when vertex `b` is dropped between `a` and `c`
#[inline]
fn removal_cost<T: HullScalar>(a: Point<T>, b: Point<T>, c: Point<T>) -> f64 {
    let (ax, ay) = (a[0].as_f64(), a[1].as_f64());
    let (bx, by) = (b[0].as_f64(), b[1].as_f64());
    let (cx, cy) = (c[0].as_f64(), c[1].as_f64());
    ((bx - ax) * (cy - ay) - (by - ay) * (cx - ax)).abs() / 2.0
}

/// Heap entry; `version` goes stale once a neighbour of `index` is removed
#[derive(Debug, Clone, Copy)]
struct Candidate {
    cost: f64,
    index: usize,
    version: u32,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    // Cheapest first, lowest hull index on ties
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .total_cmp(&other.cost)
            .then_with(|| self.index.cmp(&other.index))
            .then_with(|| self.version.cmp(&other.version))
    }
}

/// Greedily drop hull vertices until `k` remain.
///
/// Each step removes the vertex whose triangle with its two current
/// neighbours has the smallest area, i.e. the removal that loses the least
/// of the hull. Survivors keep their original cyclic order, so a convex
/// input stays convex and simple. Runs in O(h log h) over the hull alone.
///
/// Rings that already have `k` or fewer vertices are returned unchanged.
pub fn reduce_to_k<T: HullScalar>(hull: Vec<Point<T>>, k: usize) -> Vec<Point<T>> {
    let n = hull.len();
    if n <= k || k < 3 {
        return hull;
    }

    let mut prev: Vec<usize> = (0..n).map(|i| (i + n - 1) % n).collect();
    let mut next: Vec<usize> = (0..n).map(|i| (i + 1) % n).collect();
    let mut alive = vec![true; n];
    let mut version = vec![0u32; n];

    let cost_at = |i: usize, prev: &[usize], next: &[usize]| {
        removal_cost(hull[prev[i]], hull[i], hull[next[i]])
    };

    let mut heap: BinaryHeap<Reverse<Candidate>> = (0..n)
        .map(|index| {
            Reverse(Candidate {
                cost: cost_at(index, &prev, &next),
                index,
                version: 0,
            })
        })
        .collect();

    let mut remaining = n;
    while remaining > k {
        let Some(Reverse(candidate)) = heap.pop() else {
            break;
        };
        let i = candidate.index;
        if !alive[i] || version[i] != candidate.version {
            continue;
        }

        let (p, q) = (prev[i], next[i]);
        next[p] = q;
        prev[q] = p;
        alive[i] = false;
        remaining -= 1;

        for j in [p, q] {
            version[j] += 1;
            heap.push(Reverse(Candidate {
                cost: cost_at(j, &prev, &next),
                index: j,
                version: version[j],
            }));
        }
    }

    hull.iter()
        .zip(alive)
        .filter_map(|(&p, keep)| keep.then_some(p))
        .collect()
}
