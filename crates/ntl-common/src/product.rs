//! Raster product catalogue.
//!
//! A product is one selectable data source for a comparison slot. The declaration
//! order of [`ProductType::ALL`] is the order used when picking the next unused
//! product for a new slot.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Product shown in a comparison slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProductType {
    #[serde(rename = "base_map", alias = "BaseMap")]
    BaseMap,
    #[serde(rename = "vnp46a2_gap_filled", alias = "VNP46A2_GapFilled")]
    Vnp46a2GapFilled,
    #[serde(rename = "vnp46a2_dnb", alias = "VNP46A2_DNB")]
    Vnp46a2Dnb,
    #[serde(rename = "vnp46a1_dnb", alias = "VNP46A1_DNB")]
    Vnp46a1Dnb,
    #[serde(rename = "vnp46a1_radiance_m10", alias = "VNP46A1_RadianceM10")]
    Vnp46a1RadianceM10,
    #[serde(rename = "vnp46a1_radiance_m11", alias = "VNP46A1_RadianceM11")]
    Vnp46a1RadianceM11,
    #[serde(rename = "lj", alias = "LuoJia")]
    LuoJia,
    #[serde(rename = "overlay", alias = "Overlay")]
    Overlay,
    #[serde(rename = "diff", alias = "Difference")]
    Difference,
}

/// Satellite mission a raster product comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mission {
    BlackMarble,
    LuoJia,
}

impl Mission {
    pub fn name(&self) -> &'static str {
        match self {
            Mission::BlackMarble => "Black Marble",
            Mission::LuoJia => "LuoJia1-01",
        }
    }

    /// Nominal imaging datetime for a data date.
    ///
    /// Black Marble's overpass for a date happens at 01:30 the following day;
    /// LuoJia images the same evening at 22:30.
    pub fn imaging_datetime(&self, date: NaiveDate) -> NaiveDateTime {
        match self {
            Mission::BlackMarble => (date + Duration::days(1)).and_time(hm(1, 30)),
            Mission::LuoJia => date.and_time(hm(22, 30)),
        }
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

impl ProductType {
    /// Every product, in selection order.
    pub const ALL: [ProductType; 9] = [
        ProductType::BaseMap,
        ProductType::Vnp46a2GapFilled,
        ProductType::Vnp46a2Dnb,
        ProductType::Vnp46a1Dnb,
        ProductType::Vnp46a1RadianceM10,
        ProductType::Vnp46a1RadianceM11,
        ProductType::LuoJia,
        ProductType::Overlay,
        ProductType::Difference,
    ];

    /// Stable string identifier used in persisted configuration.
    pub fn id(&self) -> &'static str {
        match self {
            ProductType::BaseMap => "base_map",
            ProductType::Vnp46a2GapFilled => "vnp46a2_gap_filled",
            ProductType::Vnp46a2Dnb => "vnp46a2_dnb",
            ProductType::Vnp46a1Dnb => "vnp46a1_dnb",
            ProductType::Vnp46a1RadianceM10 => "vnp46a1_radiance_m10",
            ProductType::Vnp46a1RadianceM11 => "vnp46a1_radiance_m11",
            ProductType::LuoJia => "lj",
            ProductType::Overlay => "overlay",
            ProductType::Difference => "diff",
        }
    }

    /// Legacy variant name, also accepted when parsing.
    pub fn variant_name(&self) -> &'static str {
        match self {
            ProductType::BaseMap => "BaseMap",
            ProductType::Vnp46a2GapFilled => "VNP46A2_GapFilled",
            ProductType::Vnp46a2Dnb => "VNP46A2_DNB",
            ProductType::Vnp46a1Dnb => "VNP46A1_DNB",
            ProductType::Vnp46a1RadianceM10 => "VNP46A1_RadianceM10",
            ProductType::Vnp46a1RadianceM11 => "VNP46A1_RadianceM11",
            ProductType::LuoJia => "LuoJia",
            ProductType::Overlay => "Overlay",
            ProductType::Difference => "Difference",
        }
    }

    /// Human-readable name for slot selectors.
    pub fn display_name(&self) -> &'static str {
        match self {
            ProductType::BaseMap => "Base map",
            ProductType::Vnp46a2GapFilled => "Blackmarble (VNP46A2, BRDF-Corrected, Gap-Filled)",
            ProductType::Vnp46a2Dnb => "Blackmarble (VNP46A2, BRDF-Corrected)",
            ProductType::Vnp46a1Dnb => "Blackmarble (VNP46A1, Day-Night-Band Radiance)",
            ProductType::Vnp46a1RadianceM10 => "Blackmarble (VNP46A1, M10 Radiance)",
            ProductType::Vnp46a1RadianceM11 => "Blackmarble (VNP46A1, M11 Radiance)",
            ProductType::LuoJia => "LuoJia1-01",
            ProductType::Overlay => "Overlay",
            ProductType::Difference => "Difference",
        }
    }

    /// Legend title including the physical unit.
    pub fn legend_title(&self) -> &'static str {
        match self {
            ProductType::BaseMap => "Base map",
            ProductType::Vnp46a2GapFilled => {
                "DNB Radiance (gap-filled, BRDF-corrected) [nW·cm⁻²·sr⁻¹]"
            }
            ProductType::Vnp46a2Dnb => "DNB Radiance (BRDF-corrected) [nW·cm⁻²·sr⁻¹]",
            ProductType::Vnp46a1Dnb => "At-sensor DNB Radiance [nW·cm⁻²·sr⁻¹]",
            ProductType::Vnp46a1RadianceM10 => "Radiance (band M10) [W·m⁻²·μm⁻¹·sr⁻¹]",
            ProductType::Vnp46a1RadianceM11 => "Radiance (band M11) [W·m⁻²·μm⁻¹·sr⁻¹]",
            ProductType::LuoJia => "At-sensor Radiance [nW·cm⁻²·sr⁻¹]",
            ProductType::Overlay | ProductType::Difference => "<not yet supported>",
        }
    }

    pub fn mission(&self) -> Option<Mission> {
        match self {
            ProductType::Vnp46a2GapFilled
            | ProductType::Vnp46a2Dnb
            | ProductType::Vnp46a1Dnb
            | ProductType::Vnp46a1RadianceM10
            | ProductType::Vnp46a1RadianceM11 => Some(Mission::BlackMarble),
            ProductType::LuoJia => Some(Mission::LuoJia),
            _ => None,
        }
    }

    /// Whether the product is backed by a raster endpoint.
    pub fn is_raster(&self) -> bool {
        self.mission().is_some()
    }

    /// Black Marble (product, variable) pair for the `bm` endpoint.
    fn black_marble_variable(&self) -> Option<(&'static str, &'static str)> {
        match self {
            ProductType::Vnp46a2GapFilled => {
                Some(("VNP46A2", "Gap_Filled_DNB_BRDF-Corrected_NTL"))
            }
            ProductType::Vnp46a2Dnb => Some(("VNP46A2", "DNB_BRDF-Corrected_NTL")),
            ProductType::Vnp46a1Dnb => Some(("VNP46A1", "DNB_At_Sensor_Radiance_500m")),
            ProductType::Vnp46a1RadianceM10 => Some(("VNP46A1", "Radiance_M10")),
            ProductType::Vnp46a1RadianceM11 => Some(("VNP46A1", "Radiance_M11")),
            _ => None,
        }
    }

    /// How the raster endpoint is addressed for this product, or `None` for
    /// products without raster data.
    ///
    /// ```
    /// use ntl_common::ProductType;
    ///
    /// let route = ProductType::LuoJia.raster_route().unwrap();
    /// assert_eq!(route.endpoint, "lj");
    /// assert!(route.params.is_empty());
    /// ```
    pub fn raster_route(&self) -> Option<RasterRoute> {
        if let Some((product, variable)) = self.black_marble_variable() {
            return Some(RasterRoute {
                endpoint: "bm",
                params: vec![("product", product), ("variable", variable)],
            });
        }
        match self {
            ProductType::LuoJia => Some(RasterRoute {
                endpoint: "lj",
                params: Vec::new(),
            }),
            _ => None,
        }
    }
}

/// Raster request shape: `{raster}/{date}/{region}/{endpoint}?{params}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterRoute {
    pub endpoint: &'static str,
    pub params: Vec<(&'static str, &'static str)>,
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Error returned for an identifier that names no product.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Cannot convert to product type: {0}")]
pub struct UnknownProduct(pub String);

impl FromStr for ProductType {
    type Err = UnknownProduct;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProductType::ALL
            .iter()
            .copied()
            .find(|p| p.id() == s || p.variant_name() == s)
            .ok_or_else(|| UnknownProduct(s.to_string()))
    }
}
