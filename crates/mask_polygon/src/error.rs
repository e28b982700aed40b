use thiserror::Error;

#[derive(Error, Debug)]
pub enum HullError {
    /// No polygon can be derived from the given points (empty set, non-finite coordinate)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A caller-supplied parameter is out of range (e.g. fewer than 3 vertices requested)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to load mask image: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("Image '{requested}' is not the active image (active: {active:?})")]
    UnknownImage {
        requested: String,
        active: Option<String>,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFormat,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),
}

pub type Result<T> = std::result::Result<T, HullError>;
