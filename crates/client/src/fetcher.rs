//! Raster fetching with a URL-keyed cache.
//!
//! A fetch is one GET with `nocache=true` and `Accept: image/tiff`. The
//! percentile statistics come from the `x-raster-p02` / `x-raster-p98`
//! response headers and the body is decoded as a GeoTIFF on the blocking pool.
//!
//! Decoded rasters are kept in an LRU cache keyed by URL with a TTL.
//! [`FetchMode::Fresh`] skips the lookup and replaces the cached entry.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use ntl_common::stats::{HEADER_P02, HEADER_P98};
use ntl_common::{BandStatistics, ViewerError, ViewerResult};
use raster::{decode_geotiff, FetchedRaster};
use reqwest::header::{HeaderMap, ACCEPT};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::ApiConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// Serve from the cache when possible.
    #[default]
    Cached,
    /// Always go to the network, e.g. when retrying after an error.
    Fresh,
}

/// Anything that can produce a decoded raster for a URL.
#[async_trait]
pub trait RasterSource: Send + Sync {
    async fn fetch(&self, url: &str, mode: FetchMode) -> ViewerResult<FetchedRaster>;
}

struct CachedRaster {
    raster: FetchedRaster,
    inserted_at: Instant,
}

pub struct RasterFetcher {
    http: reqwest::Client,
    cache: Mutex<LruCache<String, CachedRaster>>,
    ttl: Duration,
}

impl RasterFetcher {
    pub fn new(config: &ApiConfig) -> ViewerResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ViewerError::Io(format!("Failed to build HTTP client: {}", e)))?;
        let capacity = NonZeroUsize::new(config.cache_capacity).unwrap_or(NonZeroUsize::MIN);

        Ok(Self {
            http,
            cache: Mutex::new(LruCache::new(capacity)),
            ttl: Duration::from_secs(config.cache_ttl_secs),
        })
    }

    /// Drop the cached raster for `url`. Returns whether one was cached.
    pub async fn invalidate(&self, url: &str) -> bool {
        self.cache.lock().await.pop(url).is_some()
    }

    pub async fn cached_count(&self) -> usize {
        self.cache.lock().await.len()
    }

    async fn lookup(&self, url: &str) -> Option<FetchedRaster> {
        let mut cache = self.cache.lock().await;
        let expired = match cache.get(url) {
            Some(entry) if entry.inserted_at.elapsed() <= self.ttl => {
                return Some(entry.raster.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            cache.pop(url);
            debug!(url = %url, "Cached raster expired");
        }
        None
    }

    async fn download(&self, url: &str) -> ViewerResult<(Bytes, BandStatistics)> {
        let network = |e: reqwest::Error| ViewerError::Network {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self
            .http
            .get(with_nocache(url))
            .header(ACCEPT, "image/tiff")
            .send()
            .await
            .map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ViewerError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let stats = parse_band_statistics(response.headers());
        let body = response.bytes().await.map_err(network)?;
        Ok((body, stats))
    }
}

#[async_trait]
impl RasterSource for RasterFetcher {
    async fn fetch(&self, url: &str, mode: FetchMode) -> ViewerResult<FetchedRaster> {
        if mode == FetchMode::Cached {
            if let Some(raster) = self.lookup(url).await {
                debug!(url = %url, "Raster cache hit");
                return Ok(raster);
            }
        }

        let start = Instant::now();
        let (body, stats) = self.download(url).await?;
        let size = body.len();

        let owned_url = url.to_string();
        let dataset = tokio::task::spawn_blocking(move || {
            decode_geotiff(&body).map(|d| d.with_url(owned_url))
        })
        .await
        .map_err(|e| ViewerError::decode(format!("decode task failed: {}", e)))?
        .map_err(|e| {
            warn!(url = %url, error = %e, "Raster decode failed");
            ViewerError::from(e)
        })?;

        info!(
            url = %url,
            bytes = size,
            width = dataset.width(),
            height = dataset.height(),
            p02 = stats.p02,
            p98 = stats.p98,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fetched raster"
        );

        let raster = FetchedRaster::new(dataset, stats);
        self.cache.lock().await.put(
            url.to_string(),
            CachedRaster {
                raster: raster.clone(),
                inserted_at: Instant::now(),
            },
        );
        Ok(raster)
    }
}

/// Append `nocache=true` to a URL's query.
pub fn with_nocache(url: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}nocache=true", url, separator)
}

/// Percentile statistics from response headers. Missing or non-numeric
/// values are unavailable (NaN).
pub fn parse_band_statistics(headers: &HeaderMap) -> BandStatistics {
    let value = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    BandStatistics::from_header_values(value(HEADER_P02), value(HEADER_P98))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_with_nocache() {
        assert_eq!(with_nocache("http://a/b/lj"), "http://a/b/lj?nocache=true");
        assert_eq!(
            with_nocache("http://a/b/bm?product=VNP46A2"),
            "http://a/b/bm?product=VNP46A2&nocache=true"
        );
    }

    #[test]
    fn test_parse_band_statistics() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_P02, HeaderValue::from_static("0.5"));
        headers.insert(HEADER_P98, HeaderValue::from_static("42"));
        assert_eq!(parse_band_statistics(&headers).range(), Some((0.5, 42.0)));

        headers.insert(HEADER_P98, HeaderValue::from_static("NaN"));
        assert!(parse_band_statistics(&headers).range().is_none());
        assert!(!parse_band_statistics(&HeaderMap::new()).is_usable());
    }
}
