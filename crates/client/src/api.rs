//! Metadata endpoints: dates and administrative boundaries.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveDate;
use ntl_common::{ViewerError, ViewerResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::ApiConfig;

/// Natural Earth boundary resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BoundaryResolution {
    #[serde(rename = "10m")]
    Fine,
    #[default]
    #[serde(rename = "50m")]
    Medium,
    #[serde(rename = "110m")]
    Coarse,
}

impl BoundaryResolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoundaryResolution::Fine => "10m",
            BoundaryResolution::Medium => "50m",
            BoundaryResolution::Coarse => "110m",
        }
    }
}

impl fmt::Display for BoundaryResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoundaryResolution {
    type Err = ViewerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "10m" => Ok(BoundaryResolution::Fine),
            "50m" => Ok(BoundaryResolution::Medium),
            "110m" => Ok(BoundaryResolution::Coarse),
            other => Err(ViewerError::validation(
                "resolution",
                format!("expected 10m, 50m or 110m, got '{}'", other),
            )),
        }
    }
}

/// Client for the explore endpoints.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ApiConfig,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> ViewerResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ViewerError::Io(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Every date with data for any region, ascending.
    pub async fn dates(&self) -> ViewerResult<Vec<NaiveDate>> {
        let mut dates: Vec<NaiveDate> = self.get_json(&self.config.dates_url()).await?;
        dates.sort();
        Ok(dates)
    }

    /// Dates with data for one region, ascending.
    pub async fn region_dates(&self, region_id: &str) -> ViewerResult<Vec<NaiveDate>> {
        let mut dates: Vec<NaiveDate> =
            self.get_json(&self.config.region_dates_url(region_id)).await?;
        dates.sort();
        Ok(dates)
    }

    /// GeoJSON feature collection of every administrative area.
    pub async fn admin_areas(&self, resolution: BoundaryResolution) -> ViewerResult<Value> {
        self.get_json(&self.config.admin_areas_url(resolution)).await
    }

    /// A single GeoJSON feature.
    pub async fn admin_area(
        &self,
        region_id: &str,
        resolution: BoundaryResolution,
    ) -> ViewerResult<Value> {
        self.get_json(&self.config.admin_area_url(region_id, resolution))
            .await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> ViewerResult<T> {
        debug!(url = %url, "GET");
        let network = |e: reqwest::Error| ViewerError::Network {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self.http.get(url).send().await.map_err(network)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ViewerError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.bytes().await.map_err(network)?;
        serde_json::from_slice(&body).map_err(|e| ViewerError::decode(format!("{}: {}", url, e)))
    }
}
