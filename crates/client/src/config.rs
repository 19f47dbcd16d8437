//! Backend connection settings.

use chrono::NaiveDate;
use ntl_common::ProductType;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::api::BoundaryResolution;

/// Endpoint paths relative to [`ApiConfig::base_url`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointPaths {
    pub dates: String,
    pub region_dates: String,
    pub admin_areas: String,
    pub raster: String,
}

impl Default for EndpointPaths {
    fn default() -> Self {
        Self {
            dates: "/explore/dates".to_string(),
            region_dates: "/explore/dates".to_string(),
            admin_areas: "/explore/admin-areas".to_string(),
            raster: "/compare".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub endpoints: EndpointPaths,
    pub timeout_secs: u64,
    /// Lifetime of a cached raster.
    pub cache_ttl_secs: u64,
    /// Maximum number of cached rasters.
    pub cache_capacity: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            endpoints: EndpointPaths::default(),
            timeout_secs: 30,
            cache_ttl_secs: 900,
            cache_capacity: 32,
        }
    }
}

impl ApiConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn join(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// `endpoint` followed by percent-encoded path `segments` and `query`.
    fn endpoint_url(&self, endpoint: &str, segments: &[&str], query: &[(&str, &str)]) -> String {
        let joined = self.join(endpoint);
        let Ok(mut url) = Url::parse(&joined) else {
            // Unparseable base: leave it to the request to report.
            return joined;
        };
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        url.to_string()
    }

    pub fn dates_url(&self) -> String {
        self.endpoint_url(&self.endpoints.dates, &[], &[])
    }

    pub fn region_dates_url(&self, region_id: &str) -> String {
        self.endpoint_url(&self.endpoints.region_dates, &[region_id], &[])
    }

    pub fn admin_areas_url(&self, resolution: BoundaryResolution) -> String {
        self.endpoint_url(
            &self.endpoints.admin_areas,
            &[],
            &[("resolution", resolution.as_str())],
        )
    }

    pub fn admin_area_url(&self, region_id: &str, resolution: BoundaryResolution) -> String {
        self.endpoint_url(
            &self.endpoints.admin_areas,
            &[region_id],
            &[("resolution", resolution.as_str())],
        )
    }

    /// Raster URL for a product, or `None` for products without raster data.
    pub fn raster_url(
        &self,
        product: ProductType,
        date: NaiveDate,
        region_id: &str,
    ) -> Option<String> {
        let route = product.raster_route()?;
        let date = date.format("%Y-%m-%d").to_string();
        Some(self.endpoint_url(
            &self.endpoints.raster,
            &[date.as_str(), region_id, route.endpoint],
            &route.params,
        ))
    }
}
