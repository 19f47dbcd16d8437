//! Coordinate Reference System codes understood by the raster decoder and renderer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Web Mercator half-extent in meters.
pub const WEB_MERCATOR_EXTENT: f64 = 20_037_508.342_789_244;

/// Earth radius used by Web Mercator (meters).
const EARTH_RADIUS: f64 = 6_378_137.0;

/// CRS codes a raster may be georeferenced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsCode {
    /// WGS84 Geographic (lat/lon in degrees)
    Epsg4326,
    /// Web Mercator (meters)
    Epsg3857,
    /// Any other EPSG code; pixel coordinates are treated as lon/lat degrees.
    Other(u16),
}

impl CrsCode {
    /// Map an EPSG code to a CRS.
    pub fn from_epsg(code: u16) -> Self {
        match code {
            4326 => CrsCode::Epsg4326,
            3857 => CrsCode::Epsg3857,
            other => CrsCode::Other(other),
        }
    }

    /// Parse "EPSG:xxxx" (case insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_uppercase();
        if normalized == "CRS:84" {
            return Some(CrsCode::Epsg4326);
        }
        normalized
            .strip_prefix("EPSG:")
            .and_then(|code| code.parse::<u16>().ok())
            .map(Self::from_epsg)
    }

    pub fn epsg(&self) -> u16 {
        match self {
            CrsCode::Epsg4326 => 4326,
            CrsCode::Epsg3857 => 3857,
            CrsCode::Other(code) => *code,
        }
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        !matches!(self, CrsCode::Epsg3857)
    }

    /// Project a lon/lat pair into this CRS.
    pub fn from_lon_lat(&self, lon: f64, lat: f64) -> (f64, f64) {
        match self {
            CrsCode::Epsg3857 => lon_lat_to_mercator(lon, lat),
            _ => (lon, lat),
        }
    }

    /// Unproject a coordinate in this CRS back to lon/lat.
    pub fn to_lon_lat(&self, x: f64, y: f64) -> (f64, f64) {
        match self {
            CrsCode::Epsg3857 => mercator_to_lon_lat(x, y),
            _ => (x, y),
        }
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

/// Forward spherical Mercator.
pub fn lon_lat_to_mercator(lon: f64, lat: f64) -> (f64, f64) {
    let lat = lat.clamp(-85.051_128_78, 85.051_128_78);
    let x = EARTH_RADIUS * lon.to_radians();
    let y = EARTH_RADIUS * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
    (x, y)
}

/// Inverse spherical Mercator.
pub fn mercator_to_lon_lat(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees();
    (lon, lat)
}
