use tracing::debug;

use crate::{
    algorithms::{
        hull::{convex_hull, ensure_finite},
        reduction::reduce_to_k,
    },
    error::{HullError, Result},
    types::{HullScalar, KGon, PixelSet, Point, VertexBudget},
};

/// Result of one hull extraction, with the size of the exact hull kept for diagnostics
#[derive(Debug, Clone, PartialEq)]
pub struct HullReport<T> {
    pub polygon: KGon<T>,
    pub hull_vertex_count: usize,
}

/// Reduces a foreground point set to a convex polygon of at most `k` vertices
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HullExtractor {
    budget: VertexBudget,
}

impl HullExtractor {
    pub fn new(budget: VertexBudget) -> Self {
        Self { budget }
    }

    pub fn with_vertex_count(k: usize) -> Result<Self> {
        Ok(Self::new(VertexBudget::new(k)?))
    }

    pub fn budget(&self) -> VertexBudget {
        self.budget
    }

    pub fn extract<T: HullScalar>(&self, points: &[Point<T>]) -> Result<HullReport<T>> {
        if points.is_empty() {
            return Err(HullError::InvalidInput(
                "cannot derive a polygon from an empty point set".to_string(),
            ));
        }
        ensure_finite(points)?;

        let k = self.budget.get();
        let hull = convex_hull(points);
        let hull_vertex_count = hull.len();
        let vertices = reduce_to_k(hull, k);

        debug!(
            points = points.len(),
            hull_vertices = hull_vertex_count,
            k,
            output_vertices = vertices.len(),
            "computed k-gon"
        );

        Ok(HullReport {
            polygon: KGon::new(vertices),
            hull_vertex_count,
        })
    }

    pub fn extract_pixels(&self, pixels: &PixelSet) -> Result<HullReport<i64>> {
        self.extract(pixels.as_slice())
    }
}

/// Convex polygon of at most `k` vertices approximating the hull of `points`.
///
/// Axis order is whatever the caller used; the result is counterclockwise in
/// that frame. Hulls with `k` or fewer vertices come back exactly, larger
/// ones are reduced by greedy smallest-area vertex removal. All-collinear or
/// single-point input gives a 2- or 1-point result instead of an error.
///
/// # Errors
///
/// - [`HullError::InvalidArgument`] if `k < 3`
/// - [`HullError::InvalidInput`] if `points` is empty or holds a NaN/infinite coordinate
pub fn compute_k_gon<T: HullScalar>(points: &[Point<T>], k: usize) -> Result<KGon<T>> {
    let extractor = HullExtractor::with_vertex_count(k)?;
    Ok(extractor.extract(points)?.polygon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::hull::orientation;
    use geo::kernels::Orientation;

    fn dense_disc(center: f64, radius: f64) -> Vec<Point<i64>> {
        let lo = (center - radius).floor() as i64;
        let hi = (center + radius).ceil() as i64;
        let mut points = Vec::new();
        for r in lo..=hi {
            for c in lo..=hi {
                let dr = r as f64 - center;
                let dc = c as f64 - center;
                if dr * dr + dc * dc <= radius * radius {
                    points.push([r, c]);
                }
            }
        }
        points
    }

    fn assert_strictly_convex(poly: &KGon<i64>) {
        let v = &poly.vertices;
        let n = v.len();
        for i in 0..n {
            assert_eq!(
                orientation(v[i], v[(i + 1) % n], v[(i + 2) % n]),
                Orientation::CounterClockwise,
                "turn at vertex {} is not counterclockwise",
                (i + 1) % n
            );
        }
    }

    fn segments_cross(a: Point<i64>, b: Point<i64>, c: Point<i64>, d: Point<i64>) -> bool {
        let o1 = orientation(a, b, c);
        let o2 = orientation(a, b, d);
        let o3 = orientation(c, d, a);
        let o4 = orientation(c, d, b);
        o1 != o2 && o3 != o4
            && ![o1, o2, o3, o4].contains(&Orientation::Collinear)
    }

    fn assert_simple(poly: &KGon<i64>) {
        let v = &poly.vertices;
        let n = v.len();
        for i in 0..n {
            for j in i + 2..n {
                if i == 0 && j == n - 1 {
                    continue;
                }
                assert!(
                    !segments_cross(v[i], v[(i + 1) % n], v[j], v[(j + 1) % n]),
                    "edges {} and {} cross",
                    i,
                    j
                );
            }
        }
    }

    #[test]
    fn test_square_returns_exact_hull() {
        let points = vec![[0i64, 0], [0, 10], [10, 0], [10, 10]];
        let poly = compute_k_gon(&points, 6).expect("square is valid");
        assert_eq!(poly.vertices, vec![[0, 0], [10, 0], [10, 10], [0, 10]]);
        assert!(poly.signed_area() > 0.0);
    }

    #[test]
    fn test_dense_disc_reduces_to_hexagon() {
        let points = dense_disc(50.0, 50.0);
        assert!(points.len() > 1000);

        let report = HullExtractor::default().extract(&points).expect("disc is valid");
        let poly = &report.polygon;
        assert!(report.hull_vertex_count > 6);
        assert_eq!(poly.len(), 6);
        assert_strictly_convex(poly);
        assert_simple(poly);

        let hull_area = KGon::new(convex_hull(&points)).area();
        assert!(poly.area() <= hull_area + 1e-9);
        // A regular inscribed hexagon covers about 83% of the disc
        assert!(poly.area() > 0.7 * hull_area);

        for &[r, c] in &poly.vertices {
            let dist = ((r as f64 - 50.0).powi(2) + (c as f64 - 50.0).powi(2)).sqrt();
            assert!((dist - 50.0).abs() <= 1.5, "vertex [{}, {}] is {} from center", r, c, dist);
        }
    }

    #[test]
    fn test_single_point() {
        let poly = compute_k_gon(&[[5i64, 5]], 6).expect("single point is valid");
        assert_eq!(poly.vertices, vec![[5, 5]]);
        assert!(poly.is_degenerate());
    }

    #[test]
    fn test_two_points_give_segment() {
        let poly = compute_k_gon(&[[3i64, 1], [0, 0], [3, 1]], 3).expect("two points are valid");
        assert_eq!(poly.vertices, vec![[0, 0], [3, 1]]);
    }

    #[test]
    fn test_collinear_gives_extremes() {
        let points = vec![[0i64, 0], [1, 1], [2, 2]];
        let poly = compute_k_gon(&points, 6).expect("collinear is not an error");
        assert_eq!(poly.vertices, vec![[0, 0], [2, 2]]);
        assert_eq!(poly.area(), 0.0);
    }

    #[test]
    fn test_empty_is_invalid_input() {
        let points: Vec<Point<i64>> = Vec::new();
        assert!(matches!(compute_k_gon(&points, 6), Err(HullError::InvalidInput(_))));
    }

    #[test]
    fn test_k_below_three_is_invalid_argument() {
        let points = vec![[0i64, 0], [0, 10], [10, 0], [10, 10]];
        assert!(matches!(compute_k_gon(&points, 2), Err(HullError::InvalidArgument(_))));
        assert!(matches!(compute_k_gon(&points, 0), Err(HullError::InvalidArgument(_))));
    }

    #[test]
    fn test_nan_is_invalid_input() {
        let points = vec![[0.0f32, 0.0], [1.0, f32::NAN], [2.0, 0.0]];
        assert!(matches!(compute_k_gon(&points, 6), Err(HullError::InvalidInput(_))));
    }

    #[test]
    fn test_deterministic_output() {
        let points = dense_disc(20.0, 15.0);
        let first = compute_k_gon(&points, 5).expect("valid");
        let second = compute_k_gon(&points, 5).expect("valid");
        assert_eq!(first, second);
    }

    #[test]
    fn test_result_independent_of_input_order() {
        let points = dense_disc(20.0, 15.0);
        let mut reversed = points.clone();
        reversed.reverse();
        assert_eq!(
            compute_k_gon(&points, 7).expect("valid"),
            compute_k_gon(&reversed, 7).expect("valid")
        );
    }

    #[test]
    fn test_vertex_bound_across_k() {
        let points = dense_disc(30.0, 25.0);
        let hull_len = convex_hull(&points).len();
        for k in 3..=20 {
            let poly = compute_k_gon(&points, k).expect("valid");
            assert!(poly.len() <= k);
            assert!(poly.len() <= hull_len);
            assert_strictly_convex(&poly);
            assert_simple(&poly);
        }
    }

    #[test]
    fn test_vertices_come_from_hull() {
        let points = dense_disc(30.0, 25.0);
        let hull = convex_hull(&points);
        let poly = compute_k_gon(&points, 8).expect("valid");
        assert!(poly.vertices.iter().all(|v| hull.contains(v)));
    }

    #[test]
    fn test_large_i32_coordinates_keep_extreme_corners() {
        let points: Vec<Point<i32>> = vec![[0, 0], [50_000, 0], [50_000, 50_000], [0, 50_000], [25_000, 1]];
        let poly = compute_k_gon(&points, 6).expect("valid");
        assert_eq!(poly.vertices, vec![[0, 0], [50_000, 0], [50_000, 50_000], [0, 50_000]]);
    }

    #[test]
    fn test_large_i64_coordinates_keep_extreme_corners() {
        let far = 4_000_000_000i64;
        let points = vec![[0, 0], [far, 0], [far, far], [0, far], [far / 2, 1]];
        let poly = compute_k_gon(&points, 6).expect("valid");
        assert_eq!(poly.vertices, vec![[0, 0], [far, 0], [far, far], [0, far]]);
    }

    #[test]
    fn test_float_input_keeps_type_and_axes() {
        let points = vec![[0.5f64, 0.0], [3.0, 0.25], [3.0, 4.0], [0.0, 4.0], [1.0, 1.0]];
        let poly = compute_k_gon(&points, 3).expect("valid");
        assert_eq!(poly.len(), 3);
        assert!(poly.vertices.iter().all(|v| points.contains(v)));
    }
}
