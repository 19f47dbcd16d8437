//! Viewport state of a map surface.

use serde::{Deserialize, Serialize};

use crate::BoundingBox;

/// Minimum zoom a comparison surface is initialised with.
pub const MIN_FIT_ZOOM: i32 = 1;
/// Maximum zoom a comparison surface is initialised with.
pub const MAX_FIT_ZOOM: i32 = 18;

/// Geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// What portion of the map a surface currently displays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    pub center: LatLng,
    pub zoom: i32,
}

impl ViewportState {
    pub fn new(center: LatLng, zoom: i32) -> Self {
        Self { center, zoom }
    }

    /// View centred on `bounds` at the best-fitting zoom.
    pub fn fitting(bounds: &BoundingBox) -> Self {
        Self {
            center: bounds.center(),
            zoom: best_fit_zoom(bounds),
        }
    }
}

impl Default for ViewportState {
    /// Zürich at zoom 8, the initial view of a fresh surface.
    fn default() -> Self {
        Self {
            center: LatLng::new(47.3769, 8.5417),
            zoom: 8,
        }
    }
}

/// Approximate zoom level at which `bounds` (degrees) fills a surface.
///
/// Zoom 0 shows the whole 360° world and each level halves the span, so the
/// larger of the two extents decides. The result is clamped to 1..=18.
pub fn best_fit_zoom(bounds: &BoundingBox) -> i32 {
    let larger = bounds.width().max(bounds.height());
    if !larger.is_finite() || larger <= 0.0 {
        return MAX_FIT_ZOOM;
    }
    let zoom = (360.0 / larger).log2() + 2.0;
    (zoom.floor() as i32).clamp(MIN_FIT_ZOOM, MAX_FIT_ZOOM)
}
