//! # Mask Polygon Extraction Library
//!
//! Turns segmentation masks into compact convex polygons: the foreground
//! pixels of a mask are wrapped in their exact convex hull, which is then
//! reduced to at most `k` vertices by repeatedly dropping the vertex whose
//! removal loses the least area.
//!
//! ## Core Features
//!
//! - **Generic hull engine**: [`compute_k_gon`] works on integer or float points in any axis order
//! - **Pipeline System**: preprocess, select foreground, reduce, post-process
//! - **Batch processing**: confidence filtering and per-mask failure isolation, optionally on rayon
//! - **Export**: GeoJSON feature collections and COCO-style flat segmentations
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mask_polygon::{AxisOrder, Pipeline};
//! use image::open;
//!
//! let pipeline = Pipeline::builder()
//!     .with_vertex_count(6)?
//!     .build();
//!
//! let image = open("mask.png")?.to_luma8();
//! let result = pipeline.process(&image)?;
//!
//! // Pipeline output is [row, col]; GeoJSON is written as [x, y]
//! result.save_geojson("output.geojson", AxisOrder::RowCol)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Raw points
//!
//! ```rust
//! use mask_polygon::compute_k_gon;
//!
//! let square = [[0, 0], [10, 0], [10, 10], [0, 10], [5, 5]];
//! let polygon = compute_k_gon(&square, 6)?;
//! assert_eq!(polygon.vertices, vec![[0, 0], [10, 0], [10, 10], [0, 10]]);
//! # Ok::<(), mask_polygon::HullError>(())
//! ```

pub mod error;
pub mod types;
pub mod traits;
pub mod algorithms;
pub mod pipeline;
pub mod io;
pub mod config;
pub mod session;

pub use error::{HullError, Result};
pub use types::{AxisOrder, Grid2D, HullScalar, KGon, MaskPolygon, PixelSet, Point, PolygonSet, VertexBudget};
pub use traits::*;
pub use algorithms::{compute_k_gon, extract_foreground, extract_foreground_above, HullExtractor, HullReport};
pub use pipeline::{BatchOutcome, Pipeline, PredictedMask, builder::PipelineBuilder};
pub use io::CocoPolygon;
pub use config::HullConfig;
pub use session::{CommandOutput, HullCommand, PredictionSession, PromptResult};
