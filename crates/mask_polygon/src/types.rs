use geo::GeoNum;
use geo::kernels::HasKernel;
use geo_types::{Coord, LineString, Polygon};
use image::GrayImage;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{HullError, Result};

/// A 2D coordinate pair. The core never reinterprets the two axes: whatever
/// order the caller uses (row/col or x/y) is carried through unchanged.
pub type Point<T> = [T; 2];

/// Coordinate scalar accepted by the hull engine.
///
/// Built on `geo::GeoNum` so orientation predicates go through geo's kernels
/// (exact for integers, robust for floats). Orientation is evaluated in
/// [`HullScalar::Wide`] so integer cross products cannot overflow.
pub trait HullScalar: GeoNum + Send + Sync {
    /// Type the orientation predicate runs in
    type Wide: HasKernel;

    fn as_f64(self) -> f64;

    fn widen(self) -> Self::Wide;

    fn is_finite_coord(self) -> bool {
        self.as_f64().is_finite()
    }
}

macro_rules! impl_hull_scalar {
    ($($t:ty => $wide:ty),*) => {
        $(
            impl HullScalar for $t {
                type Wide = $wide;

                #[inline]
                fn as_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn widen(self) -> $wide {
                    self as $wide
                }
            }
        )*
    };
}

impl_hull_scalar!(i32 => i64, i64 => i128, f32 => f64, f64 => f64);

/// Which axis comes first in a coordinate pair
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AxisOrder {
    /// `[row, col]`, the order produced by the pixel-set adapter
    RowCol,
    /// `[x, y]` with x = column and y = row
    #[default]
    Xy,
}

impl AxisOrder {
    /// Reorder a pair given in `self` order into `[x, y]`
    #[inline]
    pub fn to_xy<T: Copy>(self, [a, b]: Point<T>) -> Point<T> {
        match self {
            AxisOrder::RowCol => [b, a],
            AxisOrder::Xy => [a, b],
        }
    }
}

/// Validated target vertex count for the k-gon reduction.
///
/// Construct it once when the configuration is loaded so per-call code never
/// has to deal with an out-of-range `k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexBudget(usize);

impl VertexBudget {
    pub const MIN: usize = 3;
    pub const DEFAULT: usize = 6;

    pub fn new(k: usize) -> Result<Self> {
        if k < Self::MIN {
            return Err(HullError::InvalidArgument(format!(
                "a polygon needs at least {} vertices, got k = {}",
                Self::MIN,
                k
            )));
        }
        Ok(Self(k))
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for VertexBudget {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl TryFrom<usize> for VertexBudget {
    type Error = HullError;

    fn try_from(k: usize) -> Result<Self> {
        Self::new(k)
    }
}

/// Dense row-major 2D array, the shape a segmentation model hands back per mask
#[derive(Debug, Clone, PartialEq)]
pub struct Grid2D<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T> Grid2D<T> {
    pub fn new(rows: usize, cols: usize, data: Vec<T>) -> Result<Self> {
        if rows.checked_mul(cols) != Some(data.len()) {
            return Err(HullError::InvalidInput(format!(
                "grid of {}x{} cannot hold {} cells",
                rows,
                cols,
                data.len()
            )));
        }
        Ok(Self { rows, cols, data })
    }

    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                data.push(f(row, col));
            }
        }
        Self { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        if row < self.rows && col < self.cols {
            self.data.get(row * self.cols + col)
        } else {
            None
        }
    }

    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Grid2D<U> {
        Grid2D {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(f).collect(),
        }
    }

    /// Cells in row-major order together with their `(row, col)` index
    pub fn indexed(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let cols = self.cols.max(1);
        self.data
            .iter()
            .enumerate()
            .map(move |(i, value)| (i / cols, i % cols, value))
    }
}

impl<T: Clone> Grid2D<T> {
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    pub fn set(&mut self, row: usize, col: usize, value: T) -> bool {
        if row < self.rows && col < self.cols {
            self.data[row * self.cols + col] = value;
            true
        } else {
            false
        }
    }
}

impl Grid2D<u8> {
    /// Image y becomes the row index, x the column index
    pub fn from_gray_image(image: &GrayImage) -> Self {
        Self {
            rows: image.height() as usize,
            cols: image.width() as usize,
            data: image.as_raw().clone(),
        }
    }

    pub fn to_gray_image(&self) -> Result<GrayImage> {
        let (Ok(width), Ok(height)) = (u32::try_from(self.cols), u32::try_from(self.rows)) else {
            return Err(HullError::InvalidInput(format!(
                "{}x{} grid is too large for an image",
                self.rows, self.cols
            )));
        };
        GrayImage::from_raw(width, height, self.data.clone()).ok_or_else(|| {
            HullError::InvalidInput("grid data does not match its dimensions".to_string())
        })
    }
}

/// Foreground pixels of one predicted object, as `[row, col]` pairs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PixelSet {
    points: Vec<Point<i64>>,
}

impl PixelSet {
    pub fn new(points: Vec<Point<i64>>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn as_slice(&self) -> &[Point<i64>] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = &Point<i64>> {
        self.points.iter()
    }

    pub fn push(&mut self, row: i64, col: i64) {
        self.points.push([row, col]);
    }

    /// Same pixels as `[x, y]` = `[col, row]`
    pub fn to_xy(&self) -> Vec<Point<i64>> {
        self.points
            .iter()
            .map(|&p| AxisOrder::RowCol.to_xy(p))
            .collect()
    }

    pub fn into_inner(self) -> Vec<Point<i64>> {
        self.points
    }
}

impl From<Vec<Point<i64>>> for PixelSet {
    fn from(points: Vec<Point<i64>>) -> Self {
        Self::new(points)
    }
}

/// Convex polygon with a bounded number of vertices.
///
/// Vertices run counterclockwise in the right-handed frame spanned by
/// (first axis, second axis) and the ring is implicitly closed: the last
/// vertex connects back to the first. Fewer than three vertices means the
/// input was degenerate (a single point or a segment).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KGon<T> {
    pub vertices: Vec<Point<T>>,
}

impl<T: HullScalar> KGon<T> {
    pub fn new(vertices: Vec<Point<T>>) -> Self {
        Self { vertices }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Point or segment rather than a polygon with interior
    pub fn is_degenerate(&self) -> bool {
        self.vertices.len() < 3
    }

    /// Shoelace area, positive for counterclockwise rings
    pub fn signed_area(&self) -> f64 {
        let n = self.vertices.len();
        if n < 3 {
            return 0.0;
        }
        let twice: f64 = (0..n)
            .map(|i| {
                let [x1, y1] = self.vertices[i];
                let [x2, y2] = self.vertices[(i + 1) % n];
                x1.as_f64() * y2.as_f64() - x2.as_f64() * y1.as_f64()
            })
            .sum();
        twice / 2.0
    }

    /// Convert to a closed geo-types polygon for geometric operations
    pub fn to_geo_polygon(&self) -> Polygon<f64> {
        let coords: Vec<Coord<f64>> = self
            .vertices
            .iter()
            .map(|&[a, b]| Coord {
                x: a.as_f64(),
                y: b.as_f64(),
            })
            .collect();
        Polygon::new(LineString::new(coords), vec![])
    }

    pub fn area(&self) -> f64 {
        use geo::Area;
        if self.is_degenerate() {
            return 0.0;
        }
        self.to_geo_polygon().unsigned_area()
    }

    /// Length of the closed ring; twice the segment length for a degenerate 2-gon
    pub fn perimeter(&self) -> f64 {
        let n = self.vertices.len();
        if n < 2 {
            return 0.0;
        }
        (0..n)
            .map(|i| {
                let [x1, y1] = self.vertices[i];
                let [x2, y2] = self.vertices[(i + 1) % n];
                (x2.as_f64() - x1.as_f64()).hypot(y2.as_f64() - y1.as_f64())
            })
            .sum()
    }

    /// Swap the two axes of every vertex.
    ///
    /// Swapping mirrors the polygon, so the ring is reversed after the first
    /// vertex to stay counterclockwise in the new frame.
    pub fn transposed(&self) -> Self {
        let mut vertices: Vec<Point<T>> = self.vertices.iter().map(|&[a, b]| [b, a]).collect();
        if vertices.len() > 2 {
            vertices[1..].reverse();
        }
        Self { vertices }
    }

    /// Integer pixel coordinates, truncated toward zero
    pub fn to_pixel_coords(&self) -> Vec<Point<i32>> {
        self.vertices
            .iter()
            .map(|&[a, b]| [a.as_f64() as i32, b.as_f64() as i32])
            .collect()
    }

    /// Vertices as `[x, y]` floats, given the axis order they are stored in
    pub fn xy_points(&self, order: AxisOrder) -> Vec<Point<f64>> {
        self.vertices
            .iter()
            .map(|&[a, b]| order.to_xy([a.as_f64(), b.as_f64()]))
            .collect()
    }

    /// COCO-style flattened segmentation `[x1, y1, x2, y2, ...]`
    pub fn to_flat_segmentation(&self, order: AxisOrder) -> Vec<f64> {
        self.xy_points(order).into_iter().flatten().collect()
    }

    /// `[x_min, y_min, width, height]`, all zero for an empty polygon
    pub fn bounding_box(&self, order: AxisOrder) -> [f64; 4] {
        let points = self.xy_points(order);
        if points.is_empty() {
            return [0.0; 4];
        }
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;

        for [x, y] in points {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        [min_x, min_y, max_x - min_x, max_y - min_y]
    }
}

/// Polygon produced for one predicted mask
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskPolygon {
    /// Reduced hull, in `[row, col]` order
    pub polygon: KGon<i64>,
    /// Number of foreground pixels the hull was computed from
    pub pixel_count: usize,
    /// Vertex count of the exact convex hull before reduction
    pub hull_vertex_count: usize,
    /// Model confidence for the mask, when one was supplied
    pub score: Option<f32>,
}

/// All polygons extracted from one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonSet {
    pub polygons: Vec<MaskPolygon>,
    pub image_width: u32,
    pub image_height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_budget_rejects_small_k() {
        assert!(matches!(VertexBudget::new(2), Err(HullError::InvalidArgument(_))));
        assert!(matches!(VertexBudget::try_from(0), Err(HullError::InvalidArgument(_))));
        assert_eq!(VertexBudget::new(3).expect("3 is valid").get(), 3);
        assert_eq!(VertexBudget::default().get(), 6);
    }

    #[test]
    fn test_grid_dimensions_checked() {
        assert!(Grid2D::new(2, 3, vec![0u8; 5]).is_err());
        let grid = Grid2D::new(2, 3, vec![0u8, 1, 2, 3, 4, 5]).expect("valid grid");
        assert_eq!(grid.get(1, 2), Some(&5));
        assert_eq!(grid.get(2, 0), None);
        let cells: Vec<_> = grid.indexed().map(|(r, c, v)| (r, c, *v)).collect();
        assert_eq!(cells[4], (1, 1, 4));
    }

    #[test]
    fn test_grid_from_gray_image_is_row_major() {
        let mut img = GrayImage::new(4, 2);
        img.put_pixel(3, 1, image::Luma([255u8]));
        let grid = Grid2D::from_gray_image(&img);
        assert_eq!(grid.rows(), 2);
        assert_eq!(grid.cols(), 4);
        assert_eq!(grid.get(1, 3), Some(&255));
        assert_eq!(grid.to_gray_image().expect("fits"), img);
    }

    #[test]
    fn test_kgon_area_and_bbox() {
        let square = KGon::new(vec![[0i64, 0], [10, 0], [10, 10], [0, 10]]);
        assert_eq!(square.signed_area(), 100.0);
        assert!((square.area() - 100.0).abs() < 1e-9);
        assert!((square.perimeter() - 40.0).abs() < 1e-9);
        assert_eq!(square.bounding_box(AxisOrder::Xy), [0.0, 0.0, 10.0, 10.0]);
    }

    #[test]
    fn test_transpose_keeps_counterclockwise() {
        let tri = KGon::new(vec![[0i64, 0], [4, 0], [0, 2]]);
        assert!(tri.signed_area() > 0.0);
        let swapped = tri.transposed();
        assert_eq!(swapped.vertices[0], [0, 0]);
        assert!(swapped.signed_area() > 0.0);
        assert_eq!(swapped.signed_area(), tri.signed_area());
    }

    #[test]
    fn test_flat_segmentation_from_row_col() {
        let poly = KGon::new(vec![[1i64, 2], [3, 4]]);
        assert_eq!(poly.to_flat_segmentation(AxisOrder::RowCol), vec![2.0, 1.0, 4.0, 3.0]);
        assert_eq!(poly.to_flat_segmentation(AxisOrder::Xy), vec![1.0, 2.0, 3.0, 4.0]);
        assert!(poly.is_degenerate());
        assert_eq!(poly.area(), 0.0);
    }

    #[test]
    fn test_pixel_coords_truncate() {
        let poly = KGon::new(vec![[1.9f64, -0.5], [2.2, 3.7]]);
        assert_eq!(poly.to_pixel_coords(), vec![[1, 0], [2, 3]]);
    }

    #[test]
    fn test_axis_order_parse() {
        assert_eq!("row_col".parse::<AxisOrder>().expect("known"), AxisOrder::RowCol);
        assert_eq!(AxisOrder::Xy.to_string(), "xy");
    }
}
