//! Out-of-band band statistics supplied alongside raster payloads.

use serde::{Deserialize, Serialize};

/// Header carrying the 2nd percentile of the raster's first band.
pub const HEADER_P02: &str = "x-raster-p02";
/// Header carrying the 98th percentile of the raster's first band.
pub const HEADER_P98: &str = "x-raster-p98";

/// 2nd/98th percentile of a band's value distribution.
///
/// Either value may be NaN when the backend did not supply it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandStatistics {
    pub p02: f64,
    pub p98: f64,
}

impl Default for BandStatistics {
    fn default() -> Self {
        Self::unavailable()
    }
}

impl BandStatistics {
    pub fn new(p02: f64, p98: f64) -> Self {
        Self { p02, p98 }
    }

    /// Statistics that were not supplied at all.
    pub fn unavailable() -> Self {
        Self {
            p02: f64::NAN,
            p98: f64::NAN,
        }
    }

    /// Build from raw header strings. Missing or non-numeric values become NaN.
    pub fn from_header_values(p02: Option<&str>, p98: Option<&str>) -> Self {
        Self {
            p02: parse_numeric(p02),
            p98: parse_numeric(p98),
        }
    }

    /// The percentile range, when both values are finite and ordered.
    pub fn range(&self) -> Option<(f64, f64)> {
        if self.p02.is_finite() && self.p98.is_finite() && self.p02 <= self.p98 {
            Some((self.p02, self.p98))
        } else {
            None
        }
    }

    pub fn is_usable(&self) -> bool {
        self.range().is_some()
    }
}

fn parse_numeric(value: Option<&str>) -> f64 {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}
