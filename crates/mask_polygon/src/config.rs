use std::fs;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    error::{HullError, Result},
    pipeline::builder::DEFAULT_MIN_CONFIDENCE,
    types::{AxisOrder, VertexBudget},
};

/// User-facing settings for mask-to-polygon extraction
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct HullConfig {
    /// Target vertex count `k` of the output polygon
    #[schemars(range(min = 3, max = 100))]
    pub vertex_count: usize,
    /// Gray value treated as background in mask images
    pub background_value: u8,
    /// Gaussian blur applied to mask images before foreground selection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blur_sigma: Option<f32>,
    /// Binarize mask images after blurring: above this becomes 255, the rest 0
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binarize_threshold: Option<u8>,
    /// Predicted masks scoring below this are skipped
    #[schemars(range(min = 0.0, max = 1.0))]
    pub min_confidence: f32,
    /// Cells of a score mask above this value are foreground
    pub mask_threshold: f32,
    /// Polygons smaller than this (square pixels) are dropped; 0 keeps everything
    pub min_area: f64,
    /// Drop point and segment results
    pub drop_degenerate: bool,
    /// Axis order used when exporting polygons
    pub output_axis_order: AxisOrder,
}

impl Default for HullConfig {
    fn default() -> Self {
        Self {
            vertex_count: VertexBudget::DEFAULT,
            background_value: 0,
            blur_sigma: None,
            binarize_threshold: None,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            mask_threshold: 0.0,
            min_area: 0.0,
            drop_degenerate: false,
            output_axis_order: AxisOrder::Xy,
        }
    }
}

impl HullConfig {
    /// Check every field and return the vertex budget
    pub fn validate(&self) -> Result<VertexBudget> {
        let budget = VertexBudget::new(self.vertex_count)?;

        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(HullError::InvalidConfig(format!(
                "min_confidence must be within [0, 1], got {}",
                self.min_confidence
            )));
        }
        if let Some(sigma) = self.blur_sigma {
            if !sigma.is_finite() || sigma <= 0.0 {
                return Err(HullError::InvalidConfig(format!(
                    "blur_sigma must be a positive number, got {}",
                    sigma
                )));
            }
        }
        if !self.mask_threshold.is_finite() {
            return Err(HullError::InvalidConfig(
                "mask_threshold must be finite".to_string(),
            ));
        }
        if !self.min_area.is_finite() || self.min_area < 0.0 {
            return Err(HullError::InvalidConfig(format!(
                "min_area must be a non-negative number, got {}",
                self.min_area
            )));
        }
        Ok(budget)
    }

    pub fn vertex_budget(&self) -> Result<VertexBudget> {
        VertexBudget::new(self.vertex_count)
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: HullConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load configuration from a JSON string
    pub fn from_json(content: &str) -> Result<Self> {
        let config: HullConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(HullError::UnsupportedFormat),
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Save configuration, picking TOML or JSON from the extension
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path_ref = path.as_ref();
        let content = match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => self.to_toml()?,
            Some("json") => self.to_json()?,
            _ => return Err(HullError::UnsupportedFormat),
        };
        fs::write(path_ref, content)?;
        Ok(())
    }
}
