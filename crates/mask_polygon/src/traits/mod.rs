use image::GrayImage;
use crate::{error::Result, types::{MaskPolygon, PixelSet}};

/// Trait for mask image preprocessing (denoise, binarize)
pub trait ImagePreprocessor: Send + Sync {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage>;
}

/// Trait for picking the foreground pixels out of a preprocessed mask
pub trait ForegroundExtractor: Send + Sync {
    /// Returns the foreground as `[row, col]` pairs
    fn extract_foreground(&self, image: &GrayImage) -> Result<PixelSet>;
}

/// Trait for polygon post-processing; implementations drop or adjust polygons in place
pub trait PolygonPostProcessor: Send + Sync {
    fn process(&self, polygons: &mut Vec<MaskPolygon>) -> Result<()>;
}
