use crate::{error::Result, traits::PolygonPostProcessor, types::MaskPolygon};

/// Drops polygons whose area is below `min_area` square pixels
#[derive(Debug, Clone)]
pub struct MinimumAreaFilter {
    pub min_area: f64,
}

impl Default for MinimumAreaFilter {
    fn default() -> Self {
        Self { min_area: 10.0 }
    }
}

impl PolygonPostProcessor for MinimumAreaFilter {
    fn process(&self, polygons: &mut Vec<MaskPolygon>) -> Result<()> {
        polygons.retain(|p| p.polygon.area() >= self.min_area);
        Ok(())
    }
}

/// Drops point and segment results. Degenerate hulls are a valid core result;
/// this filter is for consumers that can only render polygons with interior.
#[derive(Debug, Clone, Default)]
pub struct DegenerateShapeFilter;

impl PolygonPostProcessor for DegenerateShapeFilter {
    fn process(&self, polygons: &mut Vec<MaskPolygon>) -> Result<()> {
        polygons.retain(|p| !p.polygon.is_degenerate());
        Ok(())
    }
}
