use clap::ValueEnum;
use mask_polygon::{AxisOrder, HullConfig, HullError, PolygonSet};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    Hull(#[from] HullError),
    #[error("Job file lists no masks")]
    NoMasks,
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

/// How extracted polygons are written out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// The polygon set as serialized by the library
    #[default]
    Json,
    /// COCO-style annotations with flattened segmentation and bbox
    Coco,
    Geojson,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json | OutputFormat::Coco => "json",
            OutputFormat::Geojson => "geojson",
        }
    }
}

/// Serialize a pipeline result. `order` is the export axis order; pipeline
/// polygons are stored `[row, col]` and converted when `order` is `xy`.
pub fn render_output(
    set: &PolygonSet,
    format: OutputFormat,
    order: AxisOrder,
) -> Result<String, CliError> {
    let rendered = match format {
        OutputFormat::Json => match order {
            AxisOrder::RowCol => serde_json::to_string_pretty(set)?,
            AxisOrder::Xy => {
                let mut xy = set.clone();
                for mask in &mut xy.polygons {
                    mask.polygon = mask.polygon.transposed();
                }
                serde_json::to_string_pretty(&xy)?
            }
        },
        // Both exports always write [x, y]; they only need the storage order
        OutputFormat::Coco => serde_json::to_string_pretty(&set.to_coco_polygons(AxisOrder::RowCol))?,
        OutputFormat::Geojson => set.to_geojson_string(AxisOrder::RowCol)?,
    };
    Ok(rendered)
}

/// Write rendered output to `destination`, or stdout when there is none
pub fn write_output(rendered: &str, destination: Option<&Path>) -> Result<(), CliError> {
    match destination {
        Some(path) => {
            fs::write(path, rendered)?;
            info!("Wrote {:?}", path);
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

/// One mask image to convert
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct MaskEntry {
    pub name: String,
    pub path: String,
    /// Overrides `config.vertex_count` for this mask
    pub vertex_count: Option<usize>,
}

/// Batch job: many mask images, one configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct MaskJob {
    pub output_dir: String,
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default)]
    pub config: HullConfig,
    pub masks: Vec<MaskEntry>,
}

impl MaskJob {
    /// Load a job from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, CliError> {
        let job: MaskJob = toml::from_str(content)?;
        job.validate()?;
        Ok(job)
    }

    /// Load a job from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, CliError> {
        let job: MaskJob = serde_json::from_str(content)?;
        job.validate()?;
        Ok(job)
    }

    /// Auto-detect file format and load the job
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(CliError::UnsupportedFileFormat),
        }
    }

    pub fn to_toml(&self) -> Result<String, CliError> {
        Ok(toml::to_string_pretty(&self)?)
    }

    pub fn to_json(&self) -> Result<String, CliError> {
        Ok(serde_json::to_string_pretty(&self)?)
    }

    /// Save the job, picking TOML or JSON from the extension
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CliError> {
        let path_ref = path.as_ref();
        let content = match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => self.to_toml()?,
            Some("json") => self.to_json()?,
            _ => return Err(CliError::UnsupportedFileFormat),
        };
        fs::write(path_ref, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<(), CliError> {
        if self.masks.is_empty() {
            return Err(CliError::NoMasks);
        }
        self.config.validate()?;
        for mask in &self.masks {
            if let Some(k) = mask.vertex_count {
                mask_polygon::VertexBudget::new(k)?;
            }
        }
        Ok(())
    }

    /// Output file for one mask
    pub fn output_path(&self, mask: &MaskEntry) -> std::path::PathBuf {
        Path::new(&self.output_dir).join(format!("{}.{}", mask.name, self.format.extension()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mask_polygon::{KGon, MaskPolygon};

    fn triangle_set() -> PolygonSet {
        PolygonSet {
            polygons: vec![MaskPolygon {
                polygon: KGon::new(vec![[0, 0], [4, 0], [0, 2]]),
                pixel_count: 9,
                hull_vertex_count: 3,
                score: None,
            }],
            image_width: 5,
            image_height: 5,
        }
    }

    #[test]
    fn test_job_from_toml() {
        let job = MaskJob::from_toml(
            r#"
output_dir = "out"
format = "geojson"

[config]
vertex_count = 8

[[masks]]
name = "cat"
path = "masks/cat.png"

[[masks]]
name = "dog"
path = "masks/dog.png"
vertex_count = 4
"#,
        )
        .expect("valid job");

        assert_eq!(job.format, OutputFormat::Geojson);
        assert_eq!(job.config.vertex_count, 8);
        assert_eq!(job.config.min_confidence, 0.1);
        assert_eq!(job.masks[1].vertex_count, Some(4));
        assert_eq!(job.output_path(&job.masks[0]), Path::new("out").join("cat.geojson"));
    }

    #[test]
    fn test_job_rejects_bad_vertex_count() {
        let err = MaskJob::from_json(
            r#"{"output_dir": "out", "masks": [{"name": "a", "path": "a.png", "vertex_count": 2}]}"#,
        )
        .expect_err("k = 2");
        assert!(matches!(err, CliError::Hull(HullError::InvalidArgument(_))));
    }

    #[test]
    fn test_job_requires_masks() {
        let err = MaskJob::from_json(r#"{"output_dir": "out", "masks": []}"#).expect_err("empty");
        assert!(matches!(err, CliError::NoMasks));
    }

    #[test]
    fn test_render_json_xy_transposes() {
        let rendered = render_output(&triangle_set(), OutputFormat::Json, AxisOrder::Xy).expect("render");
        let value: serde_json::Value = serde_json::from_str(&rendered).expect("json");
        assert_eq!(value["polygons"][0]["polygon"], serde_json::json!([[0, 0], [2, 0], [0, 4]]));
    }

    #[test]
    fn test_write_output_reports_failure() {
        let dir = std::env::temp_dir().join("mask_polygon_cli_write_output");
        fs::create_dir_all(&dir).expect("temp dir");

        let good = dir.join("ok.json");
        write_output("{}", Some(&good)).expect("writable");
        assert_eq!(fs::read_to_string(&good).expect("read back"), "{}");

        let missing = dir.join("no_such_dir").join("out.json");
        let err = write_output("{}", Some(&missing)).expect_err("parent is missing");
        assert!(matches!(err, CliError::IoError(_)));
    }

    #[test]
    fn test_render_coco() {
        let rendered = render_output(&triangle_set(), OutputFormat::Coco, AxisOrder::Xy).expect("render");
        let value: serde_json::Value = serde_json::from_str(&rendered).expect("json");
        assert_eq!(value[0]["bbox"], serde_json::json!([0.0, 0.0, 2.0, 4.0]));
    }
}
