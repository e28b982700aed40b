pub mod builder;

use image::GrayImage;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::{
    algorithms::{HullExtractor, extract_foreground_above},
    error::Result,
    traits::{ForegroundExtractor, ImagePreprocessor, PolygonPostProcessor},
    types::{Grid2D, MaskPolygon, PixelSet, PolygonSet},
};

/// One mask returned by the segmentation model, with its confidence
#[derive(Debug, Clone, PartialEq)]
pub struct PredictedMask {
    /// Per-pixel scores; cells above the pipeline's mask threshold are foreground
    pub mask: Grid2D<f32>,
    pub score: f32,
}

impl PredictedMask {
    pub fn new(mask: Grid2D<f32>, score: f32) -> Self {
        Self { mask, score }
    }
}

/// Polygons from a batch of masks plus what was left out and why
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    pub polygons: Vec<MaskPolygon>,
    /// Masks below the confidence cut-off
    pub skipped_low_confidence: usize,
    /// Masks whose hull extraction failed (e.g. no foreground pixels)
    pub failed: usize,
}

enum MaskOutcome {
    Polygon(MaskPolygon),
    LowConfidence,
    Failed,
}

/// Mask-to-polygon pipeline: preprocess, select foreground, reduce to a k-gon, post-process
pub struct Pipeline {
    preprocessors: Vec<Box<dyn ImagePreprocessor>>,
    foreground_extractor: Box<dyn ForegroundExtractor>,
    hull_extractor: HullExtractor,
    postprocessors: Vec<Box<dyn PolygonPostProcessor>>,
    min_confidence: f32,
    mask_threshold: f32,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    pub fn new(
        preprocessors: Vec<Box<dyn ImagePreprocessor>>,
        foreground_extractor: Box<dyn ForegroundExtractor>,
        hull_extractor: HullExtractor,
        postprocessors: Vec<Box<dyn PolygonPostProcessor>>,
        min_confidence: f32,
        mask_threshold: f32,
    ) -> Self {
        Self {
            preprocessors,
            foreground_extractor,
            hull_extractor,
            postprocessors,
            min_confidence,
            mask_threshold,
        }
    }

    pub fn hull_extractor(&self) -> HullExtractor {
        self.hull_extractor
    }

    /// Reduce one pixel set to its polygon, without post-processing
    pub fn polygon_for(&self, pixels: &PixelSet, score: Option<f32>) -> Result<MaskPolygon> {
        let report = self.hull_extractor.extract_pixels(pixels)?;
        Ok(MaskPolygon {
            polygon: report.polygon,
            pixel_count: pixels.len(),
            hull_vertex_count: report.hull_vertex_count,
            score,
        })
    }

    /// Process a single mask image.
    ///
    /// An image with no foreground is an error; a polygon removed by a
    /// post-processor just leaves the returned set empty.
    pub fn process(&self, image: &GrayImage) -> Result<PolygonSet> {
        let mut processed_image = image.clone();
        for preprocessor in &self.preprocessors {
            processed_image = preprocessor.preprocess(&processed_image)?;
        }

        let pixels = self.foreground_extractor.extract_foreground(&processed_image)?;
        let mut polygons = vec![self.polygon_for(&pixels, None)?];
        self.postprocess(&mut polygons)?;

        Ok(PolygonSet {
            polygons,
            image_width: image.width(),
            image_height: image.height(),
        })
    }

    /// [`Pipeline::process`] for a grid already in memory
    pub fn process_grid(&self, mask: &Grid2D<u8>) -> Result<PolygonSet> {
        self.process(&mask.to_gray_image()?)
    }

    /// Process every mask of one prediction.
    ///
    /// Low-confidence masks are skipped and a mask that fails extraction is
    /// logged and counted; neither stops the rest of the batch.
    pub fn process_batch(&self, masks: &[PredictedMask]) -> Result<BatchOutcome> {
        let outcomes = masks.iter().enumerate().map(|(i, m)| self.run_mask(i, m));
        self.collect_batch(outcomes)
    }

    /// Same result as [`Pipeline::process_batch`], with masks spread over the rayon pool
    pub fn process_batch_parallel(&self, masks: &[PredictedMask]) -> Result<BatchOutcome> {
        let outcomes: Vec<MaskOutcome> = masks
            .par_iter()
            .enumerate()
            .map(|(i, m)| self.run_mask(i, m))
            .collect();
        self.collect_batch(outcomes)
    }

    fn run_mask(&self, index: usize, mask: &PredictedMask) -> MaskOutcome {
        if mask.score < self.min_confidence {
            debug!(mask = index, score = mask.score, "mask below confidence cut-off");
            return MaskOutcome::LowConfidence;
        }
        let pixels = extract_foreground_above(&mask.mask, self.mask_threshold);
        match self.polygon_for(&pixels, Some(mask.score)) {
            Ok(polygon) => MaskOutcome::Polygon(polygon),
            Err(e) => {
                warn!(mask = index, error = %e, "skipping mask: hull extraction failed");
                MaskOutcome::Failed
            }
        }
    }

    fn collect_batch(&self, outcomes: impl IntoIterator<Item = MaskOutcome>) -> Result<BatchOutcome> {
        let mut batch = BatchOutcome::default();
        for outcome in outcomes {
            match outcome {
                MaskOutcome::Polygon(polygon) => batch.polygons.push(polygon),
                MaskOutcome::LowConfidence => batch.skipped_low_confidence += 1,
                MaskOutcome::Failed => batch.failed += 1,
            }
        }
        self.postprocess(&mut batch.polygons)?;
        Ok(batch)
    }

    fn postprocess(&self, polygons: &mut Vec<MaskPolygon>) -> Result<()> {
        for postprocessor in &self.postprocessors {
            postprocessor.process(polygons)?;
        }
        Ok(())
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        format!(
            "Pipeline: {} preprocessors, k = {}, min confidence {}, {} postprocessors",
            self.preprocessors.len(),
            self.hull_extractor.budget().get(),
            self.min_confidence,
            self.postprocessors.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HullError;

    fn square_mask(rows: usize, cols: usize, lo: usize, hi: usize) -> Grid2D<f32> {
        Grid2D::from_fn(rows, cols, |r, c| {
            if (lo..hi).contains(&r) && (lo..hi).contains(&c) { 1.0 } else { 0.0 }
        })
    }

    #[test]
    fn test_batch_skips_low_confidence_and_empty() {
        let pipeline = Pipeline::builder().build();
        let masks = vec![
            PredictedMask::new(square_mask(20, 20, 5, 15), 0.9),
            PredictedMask::new(square_mask(20, 20, 5, 15), 0.05),
            PredictedMask::new(Grid2D::filled(20, 20, 0.0), 0.8),
        ];

        let batch = pipeline.process_batch(&masks).expect("batch");
        assert_eq!(batch.polygons.len(), 1);
        assert_eq!(batch.skipped_low_confidence, 1);
        assert_eq!(batch.failed, 1);

        let polygon = &batch.polygons[0];
        assert_eq!(polygon.polygon.vertices, vec![[5, 5], [14, 5], [14, 14], [5, 14]]);
        assert_eq!(polygon.pixel_count, 100);
        assert_eq!(polygon.score, Some(0.9));
    }

    #[test]
    fn test_parallel_batch_matches_sequential() {
        let pipeline = Pipeline::builder().build();
        let masks: Vec<PredictedMask> = (0..8)
            .map(|i| PredictedMask::new(square_mask(30, 30, i, 20 + i), 0.5))
            .collect();
        let sequential = pipeline.process_batch(&masks).expect("sequential");
        let parallel = pipeline.process_batch_parallel(&masks).expect("parallel");
        assert_eq!(sequential, parallel);
        assert_eq!(parallel.polygons.len(), 8);
    }

    #[test]
    fn test_process_grid() {
        let pipeline = Pipeline::builder().with_vertex_count(4).expect("valid k").build();
        let grid = Grid2D::from_fn(6, 8, |r, c| if r == 1 || c == 6 { 200u8 } else { 0 });
        let result = pipeline.process_grid(&grid).expect("process");
        assert_eq!(result.image_width, 8);
        assert_eq!(result.image_height, 6);
        assert_eq!(result.polygons[0].polygon.vertices, vec![[0, 6], [1, 0], [5, 6], [1, 7]]);
    }

    #[test]
    fn test_empty_image_is_invalid_input() {
        let pipeline = Pipeline::builder().build();
        let image = GrayImage::new(10, 10);
        assert!(matches!(pipeline.process(&image), Err(HullError::InvalidInput(_))));
    }
}
