use crate::{
    algorithms::{
        BackgroundExtractor, DegenerateShapeFilter, GaussianBlurPreprocessor, HullExtractor,
        MinimumAreaFilter, ThresholdPreprocessor,
    },
    config::HullConfig,
    error::Result,
    pipeline::Pipeline,
    traits::{ForegroundExtractor, ImagePreprocessor, PolygonPostProcessor},
    types::VertexBudget,
};

/// Confidence below which a predicted mask is not turned into a polygon
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.1;

/// Builder for creating processing pipelines with a fluent API
pub struct PipelineBuilder {
    preprocessors: Vec<Box<dyn ImagePreprocessor>>,
    foreground_extractor: Option<Box<dyn ForegroundExtractor>>,
    budget: VertexBudget,
    postprocessors: Vec<Box<dyn PolygonPostProcessor>>,
    min_confidence: f32,
    mask_threshold: f32,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            preprocessors: Vec::new(),
            foreground_extractor: None,
            budget: VertexBudget::default(),
            postprocessors: Vec::new(),
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            mask_threshold: 0.0,
        }
    }

    pub fn add_preprocessor<P>(mut self, preprocessor: P) -> Self
    where
        P: ImagePreprocessor + 'static,
    {
        self.preprocessors.push(Box::new(preprocessor));
        self
    }

    /// Set the foreground extractor (replaces any existing one)
    pub fn set_foreground_extractor<E>(mut self, extractor: E) -> Self
    where
        E: ForegroundExtractor + 'static,
    {
        self.foreground_extractor = Some(Box::new(extractor));
        self
    }

    /// Pixels equal to `background_value` are background, everything else foreground
    pub fn with_background(self, background_value: u8) -> Self {
        self.set_foreground_extractor(BackgroundExtractor { background_value })
    }

    pub fn with_vertex_budget(mut self, budget: VertexBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Fails with `InvalidArgument` for `k < 3`
    pub fn with_vertex_count(self, k: usize) -> Result<Self> {
        Ok(self.with_vertex_budget(VertexBudget::new(k)?))
    }

    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// Score above which a cell of a predicted mask counts as foreground
    pub fn with_mask_threshold(mut self, mask_threshold: f32) -> Self {
        self.mask_threshold = mask_threshold;
        self
    }

    pub fn add_postprocessor<P>(mut self, postprocessor: P) -> Self
    where
        P: PolygonPostProcessor + 'static,
    {
        self.postprocessors.push(Box::new(postprocessor));
        self
    }

    pub fn with_minimum_area(self, min_area: f64) -> Self {
        self.add_postprocessor(MinimumAreaFilter { min_area })
    }

    pub fn drop_degenerate(self) -> Self {
        self.add_postprocessor(DegenerateShapeFilter)
    }

    /// Build the pipeline; the foreground extractor defaults to background value 0
    pub fn build(self) -> Pipeline {
        let foreground_extractor = self
            .foreground_extractor
            .unwrap_or_else(|| Box::new(BackgroundExtractor::default()));

        Pipeline::new(
            self.preprocessors,
            foreground_extractor,
            HullExtractor::new(self.budget),
            self.postprocessors,
            self.min_confidence,
            self.mask_threshold,
        )
    }

    /// Pipeline described by a validated configuration
    pub fn build_from_config(config: &HullConfig) -> Result<Pipeline> {
        let budget = config.validate()?;
        let mut builder = Self::new()
            .with_vertex_budget(budget)
            .with_background(config.background_value)
            .with_min_confidence(config.min_confidence)
            .with_mask_threshold(config.mask_threshold);

        if let Some(sigma) = config.blur_sigma {
            builder = builder.add_preprocessor(GaussianBlurPreprocessor { sigma });
        }
        if let Some(threshold) = config.binarize_threshold {
            builder = builder.add_preprocessor(ThresholdPreprocessor { threshold });
        }
        if config.drop_degenerate {
            builder = builder.drop_degenerate();
        }
        if config.min_area > 0.0 {
            builder = builder.with_minimum_area(config.min_area);
        }
        Ok(builder.build())
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
