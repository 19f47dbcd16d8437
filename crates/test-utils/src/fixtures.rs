//! Common fixtures: dates, admin-area features and bounding boxes.

use serde_json::{json, Value};

/// Common bounding box definitions as (min_lon, min_lat, max_lon, max_lat).
pub mod bbox {
    /// Switzerland, roughly
    pub const SWITZERLAND: (f64, f64, f64, f64) = (5.96, 45.82, 10.49, 47.81);

    /// Liechtenstein, roughly
    pub const LIECHTENSTEIN: (f64, f64, f64, f64) = (9.47, 47.05, 9.64, 47.27);

    /// Global extent
    pub const GLOBAL: (f64, f64, f64, f64) = (-180.0, -90.0, 180.0, 90.0);
}

/// Date lists as served by the backend.
pub mod dates {
    /// Every date with any data.
    pub const GLOBAL: [&str; 3] = ["2023-01-01", "2023-01-05", "2023-02-10"];

    /// Dates with data for Switzerland.
    pub const SWITZERLAND: [&str; 1] = ["2023-01-05"];

    /// Dates with data for Liechtenstein.
    pub const LIECHTENSTEIN: [&str; 2] = ["2023-01-01", "2023-02-10"];
}

/// Region ids used by the fixtures.
pub mod regions {
    pub const SWITZERLAND: &str = "CHE";
    pub const LIECHTENSTEIN: &str = "LIE";
    pub const ITALY: &str = "ITA";
}

fn properties(id: &str, name: &str, pop_est: f64, gdp_md: f64, economy: &str, income: &str) -> Value {
    json!({
        "adm0_a3": id,
        "iso_a3": id,
        "name": name,
        "region_un": "Europe",
        "pop_est": pop_est,
        "pop_year": 2019,
        "economy": economy,
        "income_grp": income,
        "gdp_md": gdp_md,
        "gdp_year": 2019,
        "type": "Sovereign country",
    })
}

/// Switzerland as a simple polygon feature.
pub fn switzerland_feature() -> Value {
    let (w, s, e, n) = bbox::SWITZERLAND;
    json!({
        "type": "Feature",
        "properties": properties("CHE", "Switzerland", 8574832.0, 703082.0, "2. Developed region: nonG7", "1. High income: OECD"),
        "geometry": {
            "type": "Polygon",
            "coordinates": [[[w, s], [e, s], [e, (s + n) / 2.0], [e, n], [w, n], [w, s]]]
        }
    })
}

/// Liechtenstein as a simple polygon feature.
pub fn liechtenstein_feature() -> Value {
    let (w, s, e, n) = bbox::LIECHTENSTEIN;
    json!({
        "type": "Feature",
        "properties": properties("LIE", "Liechtenstein", 38019.0, 6876.0, "2. Developed region: nonG7", "2. High income: nonOECD"),
        "geometry": {
            "type": "Polygon",
            "coordinates": [[[w, s], [e, s], [e, n], [w, n], [w, s]]]
        }
    })
}

/// Italy as a multi-polygon (mainland plus an island).
pub fn italy_feature() -> Value {
    json!({
        "type": "Feature",
        "properties": properties("ITA", "Italy", 60297396.0, 2003576.0, "1. Developed region: G7", "1. High income: OECD"),
        "geometry": {
            "type": "MultiPolygon",
            "coordinates": [
                [[[6.6, 38.0], [18.5, 38.0], [18.5, 47.1], [6.6, 47.1], [6.6, 38.0]]],
                [[[12.4, 36.6], [15.7, 36.6], [15.7, 38.3], [12.4, 38.3], [12.4, 36.6]]]
            ]
        }
    })
}

/// Feature collection of every fixture region.
pub fn admin_area_collection() -> Value {
    json!({
        "type": "FeatureCollection",
        "features": [switzerland_feature(), liechtenstein_feature(), italy_feature()]
    })
}
