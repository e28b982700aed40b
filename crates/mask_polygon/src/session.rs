use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};
use tracing::{info, warn};

use crate::{
    algorithms::compute_k_gon,
    config::HullConfig,
    error::{HullError, Result},
    pipeline::{BatchOutcome, Pipeline, PredictedMask, builder::PipelineBuilder},
    types::{KGon, PolygonSet},
};

#[derive(
    Debug, Clone,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
    PartialEq
)]
#[serde(tag = "type", content = "params")]
#[strum(serialize_all = "snake_case")]
pub enum HullCommand {
    /// Reduce an explicit point list to a k-gon
    #[serde(rename = "compute_k_gon")]
    ComputeKGon {
        points: Vec<[f64; 2]>,
        #[schemars(range(min = 3, max = 100))]
        k: usize,
    },

    /// Load a mask image and extract its polygon
    #[serde(rename = "extract_mask")]
    ExtractMask {
        #[schemars(length(min = 1))]
        path: String,
        /// Overrides the session's configured vertex count
        k: Option<usize>,
    },
}

impl HullCommand {
    /// Get the JSON schema for all commands
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(HullCommand)
    }

    pub fn command_names() -> &'static [&'static str] {
        <Self as VariantNames>::VARIANTS
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::ComputeKGon { .. } => "Reduce a list of 2D points to a convex polygon of at most k vertices",
            Self::ExtractMask { .. } => "Extract the k-vertex hull polygon of a mask image",
        }
    }

    /// `(name, description, required)` for each parameter
    pub fn parameters_info(&self) -> Vec<(&'static str, &'static str, bool)> {
        match self {
            Self::ComputeKGon { .. } => vec![
                ("points", "Points as [a, b] pairs, axis order is preserved", true),
                ("k", "Target vertex count (at least 3)", true),
            ],
            Self::ExtractMask { .. } => vec![
                ("path", "Path to a grayscale mask image", true),
                ("k", "Target vertex count, defaults to the session setting", false),
            ],
        }
    }
}

/// Output of [`PredictionSession::execute`]
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", content = "result", rename_all = "snake_case")]
pub enum CommandOutput {
    Polygon(KGon<f64>),
    Outline(PolygonSet),
}

/// Polygons for one prompt of a prediction request
#[derive(Debug, Clone, PartialEq)]
pub struct PromptResult {
    /// Position of the prompt in the request
    pub prompt_index: usize,
    pub outcome: BatchOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ActiveImage {
    id: String,
    width: u32,
    height: u32,
}

/// Per-client context: the image currently being annotated plus the
/// configured pipeline. Handlers receive it explicitly instead of reaching
/// into process-wide state.
#[derive(Clone)]
pub struct PredictionSession {
    config: HullConfig,
    pipeline: Arc<Pipeline>,
    active: Option<ActiveImage>,
}

impl PredictionSession {
    /// Validates the configuration up front so predictions never see a bad `k`
    pub fn new(config: HullConfig) -> Result<Self> {
        let pipeline = PipelineBuilder::build_from_config(&config)?;
        Ok(Self {
            config,
            pipeline: Arc::new(pipeline),
            active: None,
        })
    }

    pub fn config(&self) -> &HullConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Make `image_id` the image predictions refer to, replacing any previous one
    pub fn activate_image(&mut self, image_id: impl Into<String>, width: u32, height: u32) {
        let id = image_id.into();
        info!(image_id = %id, width, height, "activated image");
        self.active = Some(ActiveImage { id, width, height });
    }

    pub fn active_image(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.id.as_str())
    }

    pub fn clear(&mut self) {
        self.active = None;
    }

    /// Turn the masks predicted for each prompt into polygons.
    ///
    /// Prompts that produced no masks are skipped with a warning; failures
    /// inside one prompt never affect the others.
    pub fn predict(&self, image_id: &str, prompts: &[Vec<PredictedMask>]) -> Result<Vec<PromptResult>> {
        let active = self.require_active(image_id)?;

        let mut results = Vec::with_capacity(prompts.len());
        for (prompt_index, masks) in prompts.iter().enumerate() {
            if masks.is_empty() {
                warn!(prompt = prompt_index, "skipping prompt with no predicted masks");
                continue;
            }
            for mask in masks {
                if mask.mask.rows() != active.height as usize || mask.mask.cols() != active.width as usize {
                    warn!(
                        prompt = prompt_index,
                        rows = mask.mask.rows(),
                        cols = mask.mask.cols(),
                        "mask size differs from the active image"
                    );
                }
            }
            let outcome = self.pipeline.process_batch(masks)?;
            results.push(PromptResult { prompt_index, outcome });
        }
        Ok(results)
    }

    pub fn execute(&self, command: HullCommand) -> Result<CommandOutput> {
        match command {
            HullCommand::ComputeKGon { points, k } => {
                Ok(CommandOutput::Polygon(compute_k_gon(&points, k)?))
            }
            HullCommand::ExtractMask { path, k } => {
                let image = image::open(&path)?.to_luma8();
                let outline = match k {
                    Some(k) if k != self.config.vertex_count => {
                        let config = HullConfig {
                            vertex_count: k,
                            ..self.config.clone()
                        };
                        PipelineBuilder::build_from_config(&config)?.process(&image)?
                    }
                    _ => self.pipeline.process(&image)?,
                };
                Ok(CommandOutput::Outline(outline))
            }
        }
    }

    fn require_active(&self, image_id: &str) -> Result<&ActiveImage> {
        match &self.active {
            Some(active) if active.id == image_id => Ok(active),
            other => Err(HullError::UnknownImage {
                requested: image_id.to_string(),
                active: other.as_ref().map(|a| a.id.clone()),
            }),
        }
    }
}
