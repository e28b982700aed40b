pub mod coco;
pub mod geojson;

pub use coco::*;
