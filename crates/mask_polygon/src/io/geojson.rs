use std::path::Path;

use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde_json::{Map, Number, Value as JsonValue};

use crate::{
    error::{HullError, Result},
    types::{AxisOrder, KGon, MaskPolygon, PolygonSet},
};

fn number(value: f64) -> JsonValue {
    Number::from_f64(value)
        .map(JsonValue::Number)
        .unwrap_or(JsonValue::Null)
}

fn position(&[x, y]: &[i64; 2]) -> Vec<f64> {
    vec![x as f64, y as f64]
}

/// Polygon in `[x, y]` order, still counterclockwise
fn to_xy_polygon(polygon: &KGon<i64>, order: AxisOrder) -> KGon<i64> {
    match order {
        AxisOrder::RowCol => polygon.transposed(),
        AxisOrder::Xy => polygon.clone(),
    }
}

/// Point and segment results keep their own geometry type instead of
/// becoming invalid rings.
fn geometry_for(polygon: &KGon<i64>) -> Option<Geometry> {
    let positions: Vec<Vec<f64>> = polygon.vertices.iter().map(position).collect();
    let value = match positions.len() {
        0 => return None,
        1 => Value::Point(positions[0].clone()),
        2 => Value::LineString(positions),
        _ => {
            let mut ring = positions;
            ring.push(ring[0].clone());
            Value::Polygon(vec![ring])
        }
    };
    Some(Geometry::new(value))
}

impl PolygonSet {
    /// Export to a GeoJSON feature collection in `[x, y]` coordinates.
    ///
    /// `order` is the axis order the polygons are stored in; pipeline output
    /// is `[row, col]`, i.e. [`AxisOrder::RowCol`].
    pub fn to_geojson(&self, order: AxisOrder) -> FeatureCollection {
        let features = self
            .polygons
            .iter()
            .enumerate()
            .map(|(i, mask)| {
                let polygon = to_xy_polygon(&mask.polygon, order);

                let mut properties = Map::new();
                properties.insert("id".to_string(), JsonValue::from(i));
                properties.insert("area".to_string(), number(polygon.area()));
                properties.insert("vertex_count".to_string(), JsonValue::from(polygon.len()));
                properties.insert("hull_vertex_count".to_string(), JsonValue::from(mask.hull_vertex_count));
                properties.insert("pixel_count".to_string(), JsonValue::from(mask.pixel_count));
                properties.insert(
                    "score".to_string(),
                    mask.score.map(|s| number(s as f64)).unwrap_or(JsonValue::Null),
                );

                Feature {
                    bbox: None,
                    geometry: geometry_for(&polygon),
                    id: Some(geojson::feature::Id::Number(Number::from(i))),
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        let mut foreign_members = Map::new();
        foreign_members.insert("image_width".to_string(), JsonValue::from(self.image_width));
        foreign_members.insert("image_height".to_string(), JsonValue::from(self.image_height));
        foreign_members.insert("polygon_count".to_string(), JsonValue::from(self.polygons.len()));

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(foreign_members),
        }
    }

    /// Export to GeoJSON and serialize to a JSON string
    pub fn to_geojson_string(&self, order: AxisOrder) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_geojson(order))?)
    }

    pub fn save_geojson<P: AsRef<Path>>(&self, path: P, order: AxisOrder) -> Result<()> {
        std::fs::write(path, self.to_geojson_string(order)?)?;
        Ok(())
    }

    /// Load polygons written by [`PolygonSet::to_geojson_string`], storing
    /// them back in `order`
    pub fn from_geojson_string(geojson_str: &str, order: AxisOrder) -> Result<Self> {
        let collection: FeatureCollection = geojson_str.parse()?;

        let metadata = collection
            .foreign_members
            .as_ref()
            .ok_or_else(|| HullError::InvalidInput("missing image metadata in GeoJSON".to_string()))?;
        let dimension = |key: &str| {
            metadata
                .get(key)
                .and_then(|v| v.as_u64())
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| HullError::InvalidInput(format!("missing or invalid {key}")))
        };
        let image_width = dimension("image_width")?;
        let image_height = dimension("image_height")?;

        let mut polygons = Vec::with_capacity(collection.features.len());
        for feature in &collection.features {
            let Some(geometry) = &feature.geometry else {
                continue;
            };
            let positions: Vec<&Vec<f64>> = match &geometry.value {
                Value::Point(p) => vec![p],
                Value::LineString(line) => line.iter().collect(),
                Value::Polygon(rings) => match rings.first() {
                    Some(ring) => ring.iter().take(ring.len().saturating_sub(1)).collect(),
                    None => continue,
                },
                _ => return Err(HullError::UnsupportedFormat),
            };
            let vertices = positions
                .into_iter()
                .map(|p| match p.as_slice() {
                    [x, y, ..] => Ok([*x as i64, *y as i64]),
                    _ => Err(HullError::InvalidInput("position needs two coordinates".to_string())),
                })
                .collect::<Result<Vec<_>>>()?;

            let xy = KGon::new(vertices);
            let polygon = match order {
                AxisOrder::RowCol => xy.transposed(),
                AxisOrder::Xy => xy,
            };
            let property = |key: &str| feature.property(key).and_then(|v| v.as_u64()).unwrap_or(0) as usize;

            polygons.push(MaskPolygon {
                pixel_count: property("pixel_count"),
                hull_vertex_count: property("hull_vertex_count"),
                score: feature.property("score").and_then(|v| v.as_f64()).map(|s| s as f32),
                polygon,
            });
        }

        Ok(Self {
            polygons,
            image_width,
            image_height,
        })
    }
}
