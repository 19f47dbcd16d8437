//! Administrative region features.

use ntl_common::{BoundingBox, ViewerError, ViewerResult, ViewportState};
use serde::Serialize;
use serde_json::Value;

/// Descriptive attributes shown for a region.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegionAttributes {
    pub name: Option<String>,
    pub iso_a3: Option<String>,
    pub region_un: Option<String>,
    pub pop_est: Option<f64>,
    pub pop_year: Option<i64>,
    pub economy: Option<String>,
    pub income_grp: Option<String>,
    pub gdp_md: Option<f64>,
    pub gdp_year: Option<i64>,
    pub kind: Option<String>,
}

impl RegionAttributes {
    fn from_properties(props: &Value) -> Self {
        let text = |key: &str| props.get(key).and_then(Value::as_str).map(str::to_string);
        let number = |key: &str| props.get(key).and_then(Value::as_f64);
        let integer = |key: &str| props.get(key).and_then(Value::as_i64);
        Self {
            name: text("name"),
            iso_a3: text("iso_a3"),
            region_un: text("region_un"),
            pop_est: number("pop_est"),
            pop_year: integer("pop_year"),
            economy: text("economy"),
            income_grp: text("income_grp"),
            gdp_md: number("gdp_md"),
            gdp_year: integer("gdp_year"),
            kind: text("type"),
        }
    }
}

/// A GeoJSON boundary feature with its id and extent resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionFeature {
    pub id: String,
    pub bounds: BoundingBox,
    pub attributes: RegionAttributes,
    /// The feature as received.
    pub raw: Value,
}

impl RegionFeature {
    /// Read a feature, taking its id from `id_property`.
    pub fn from_value(feature: Value, id_property: &str) -> ViewerResult<Self> {
        let props = feature
            .get("properties")
            .ok_or_else(|| ViewerError::decode("feature has no properties"))?;
        let id = props
            .get(id_property)
            .and_then(Value::as_str)
            .ok_or_else(|| ViewerError::decode(format!("feature has no '{}'", id_property)))?
            .to_string();
        let geometry = feature
            .get("geometry")
            .ok_or_else(|| ViewerError::decode(format!("feature {} has no geometry", id)))?;
        let bounds = geometry_bounds(geometry)
            .ok_or_else(|| ViewerError::decode(format!("feature {} has no coordinates", id)))?;

        Ok(Self {
            id,
            bounds,
            attributes: RegionAttributes::from_properties(props),
            raw: feature,
        })
    }

    /// All features of a collection. Features without an id or geometry are
    /// skipped.
    pub fn from_collection(collection: &Value, id_property: &str) -> Vec<Self> {
        collection
            .get("features")
            .and_then(Value::as_array)
            .map(|features| {
                features
                    .iter()
                    .filter_map(|f| Self::from_value(f.clone(), id_property).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Initial view of the comparison surfaces for this region.
    pub fn initial_view(&self) -> ViewportState {
        ViewportState::fitting(&self.bounds)
    }
}

/// Extent of a Polygon or MultiPolygon geometry.
pub fn geometry_bounds(geometry: &Value) -> Option<BoundingBox> {
    let coords = geometry.get("coordinates")?;
    let points: Vec<(f64, f64)> = match geometry.get("type").and_then(Value::as_str)? {
        "Polygon" => rings_points(coords),
        "MultiPolygon" => coords
            .as_array()?
            .iter()
            .flat_map(rings_points)
            .collect(),
        _ => return None,
    };
    BoundingBox::from_points(points)
}

fn rings_points(rings: &Value) -> Vec<(f64, f64)> {
    rings
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(Value::as_array)
        .flatten()
        .filter_map(|p| {
            let p = p.as_array()?;
            Some((p.first()?.as_f64()?, p.get(1)?.as_f64()?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_polygon_bounds() {
        let geometry = json!({
            "type": "Polygon",
            "coordinates": [[[1.0, 2.0], [3.0, 2.0], [3.0, 5.0], [1.0, 2.0]]]
        });
        assert_eq!(
            geometry_bounds(&geometry),
            Some(BoundingBox::new(1.0, 2.0, 3.0, 5.0))
        );
    }

    #[test]
    fn test_unsupported_geometry() {
        let point = json!({"type": "Point", "coordinates": [1.0, 2.0]});
        assert_eq!(geometry_bounds(&point), None);
    }

    #[test]
    fn test_missing_id() {
        let feature = json!({
            "type": "Feature",
            "properties": {"name": "x"},
            "geometry": {"type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 1.0]]]}
        });
        let err = RegionFeature::from_value(feature, "adm0_a3").unwrap_err();
        assert_eq!(err.category(), "DecodeError");
    }
}
