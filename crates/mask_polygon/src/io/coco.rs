use serde::{Deserialize, Serialize};

use crate::types::{AxisOrder, MaskPolygon, PolygonSet};

/// One polygon in COCO annotation layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CocoPolygon {
    /// Flattened `[x1, y1, x2, y2, ...]` rings, a single ring per polygon
    pub segmentation: Vec<Vec<f64>>,
    /// `[x, y, width, height]`
    pub bbox: [f64; 4],
    pub area: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl CocoPolygon {
    pub fn from_mask_polygon(mask: &MaskPolygon, order: AxisOrder) -> Self {
        Self {
            segmentation: vec![mask.polygon.to_flat_segmentation(order)],
            bbox: mask.polygon.bounding_box(order),
            area: mask.polygon.area(),
            score: mask.score,
        }
    }
}

impl PolygonSet {
    pub fn to_coco_polygons(&self, order: AxisOrder) -> Vec<CocoPolygon> {
        self.polygons
            .iter()
            .map(|mask| CocoPolygon::from_mask_polygon(mask, order))
            .collect()
    }
}
