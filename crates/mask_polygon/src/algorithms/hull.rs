use std::cmp::Ordering;

use geo::kernels::{HasKernel, Kernel, Orientation};
use geo_types::Coord;

use crate::{
    error::{HullError, Result},
    types::{HullScalar, Point},
};

#[inline]
fn coord<T: HullScalar>([a, b]: Point<T>) -> Coord<T::Wide> {
    Coord {
        x: a.widen(),
        y: b.widen(),
    }
}

/// Orientation of the turn `o -> a -> b`, using geo's kernel for the widened type
#[inline]
pub(crate) fn orientation<T: HullScalar>(o: Point<T>, a: Point<T>, b: Point<T>) -> Orientation {
    <T::Wide as HasKernel>::Ker::orient2d(coord(o), coord(a), coord(b))
}

#[inline]
fn lexicographic<T: HullScalar>(p: &Point<T>, q: &Point<T>) -> Ordering {
    p.partial_cmp(q).unwrap_or(Ordering::Equal)
}

/// Reject coordinates that would break the ordering the hull relies on
pub(crate) fn ensure_finite<T: HullScalar>(points: &[Point<T>]) -> Result<()> {
    match points
        .iter()
        .position(|&[a, b]| !a.is_finite_coord() || !b.is_finite_coord())
    {
        Some(index) => Err(HullError::InvalidInput(format!(
            "point {} has a non-finite coordinate: {:?}",
            index, points[index]
        ))),
        None => Ok(()),
    }
}

/// Convex hull by Andrew's monotone chain.
///
/// Vertices come back counterclockwise in the (first axis, second axis)
/// frame, starting from the lexicographically smallest point. Duplicates and
/// collinear boundary points are dropped, so all points collinear yields the
/// two extremes and a single distinct point yields itself.
///
/// Coordinates must be finite; callers validate with [`ensure_finite`].
pub fn convex_hull<T: HullScalar>(points: &[Point<T>]) -> Vec<Point<T>> {
    let mut sorted = points.to_vec();
    sorted.sort_by(lexicographic);
    sorted.dedup();

    if sorted.len() < 3 {
        return sorted;
    }

    let mut hull: Vec<Point<T>> = Vec::with_capacity(sorted.len() + 1);

    // Lower chain
    for &p in &sorted {
        while hull.len() >= 2
            && orientation(hull[hull.len() - 2], hull[hull.len() - 1], p)
                != Orientation::CounterClockwise
        {
            hull.pop();
        }
        hull.push(p);
    }

    // Upper chain, stacked on top of the lower one
    let lower_len = hull.len() + 1;
    for &p in sorted.iter().rev().skip(1) {
        while hull.len() >= lower_len
            && orientation(hull[hull.len() - 2], hull[hull.len() - 1], p)
                != Orientation::CounterClockwise
        {
            hull.pop();
        }
        hull.push(p);
    }

    // The last point pushed is the first point again
    hull.pop();
    hull
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_with_interior_and_edge_points() {
        let points = vec![
            [0i64, 0], [5, 0], [10, 0], [10, 5], [10, 10],
            [5, 10], [0, 10], [0, 5], [5, 5], [3, 7],
        ];
        let hull = convex_hull(&points);
        assert_eq!(hull, vec![[0, 0], [10, 0], [10, 10], [0, 10]]);
    }

    #[test]
    fn test_duplicates_collapse() {
        let points = vec![[2i64, 2], [2, 2], [2, 2]];
        assert_eq!(convex_hull(&points), vec![[2, 2]]);

        let points = vec![[0i64, 0], [4, 0], [0, 0], [0, 4], [4, 0]];
        assert_eq!(convex_hull(&points), vec![[0, 0], [4, 0], [0, 4]]);
    }

    #[test]
    fn test_collinear_keeps_extremes() {
        let points = vec![[2i64, 2], [0, 0], [1, 1], [3, 3]];
        assert_eq!(convex_hull(&points), vec![[0, 0], [3, 3]]);
    }

    #[test]
    fn test_hull_is_counterclockwise() {
        let points = vec![[1.0f64, 0.0], [0.0, 1.0], [-1.0, 0.0], [0.0, -1.0], [0.2, 0.1]];
        let hull = convex_hull(&points);
        assert_eq!(hull.len(), 4);
        for i in 0..hull.len() {
            let a = hull[i];
            let b = hull[(i + 1) % hull.len()];
            let c = hull[(i + 2) % hull.len()];
            assert_eq!(orientation(a, b, c), Orientation::CounterClockwise);
        }
    }

    #[test]
    fn test_non_finite_rejected() {
        let points = vec![[0.0f64, 0.0], [f64::NAN, 1.0]];
        assert!(matches!(ensure_finite(&points), Err(HullError::InvalidInput(_))));
        assert!(ensure_finite(&[[1i32, 2]]).is_ok());
    }
}
