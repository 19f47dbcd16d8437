//! Viewer configuration.
//!
//! Loaded from a YAML file (default `config/viewer.yaml`) and then adjusted by
//! environment variables. Every section and field has a default, so a missing
//! file or a partial file is fine.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use client::{ApiConfig, BoundaryResolution};
use ntl_common::{InterpolationMode, ProductType};
use renderer::{resolve_palette, OverlayOptions};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_PATH: &str = "config/viewer.yaml";

pub const ENV_CONFIG_PATH: &str = "NTL_CONFIG";
pub const ENV_API_URL: &str = "NTL_API_URL";
pub const ENV_STORAGE_PATH: &str = "NTL_STORAGE_PATH";

/// Per-product tweaks merged onto the default overlay options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductOverride {
    pub resolution: Option<usize>,
    pub opacity: Option<f32>,
    pub palette: Option<String>,
    pub mode: Option<InterpolationMode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Key the slot list is stored under.
    pub storage_key: String,
    /// Slots used when nothing was stored yet.
    pub default_slots: Vec<ProductType>,
    pub default_product: ProductType,
    /// JSON file backing the key-value store. In memory when unset.
    pub storage_path: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_key: "chart-config".to_string(),
            default_slots: vec![ProductType::Vnp46a2GapFilled, ProductType::LuoJia],
            default_product: ProductType::Vnp46a2GapFilled,
            storage_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryConfig {
    pub resolution: BoundaryResolution,
    /// Feature property holding the region id.
    pub id_property: String,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            resolution: BoundaryResolution::Medium,
            id_property: "adm0_a3".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendConfig {
    /// TrueType font for legend labels. Legends are drawn without text when
    /// unset.
    pub font_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub api: ApiConfig,
    pub overlay: OverlayOptions,
    pub products: HashMap<ProductType, ProductOverride>,
    pub session: SessionConfig,
    pub boundaries: BoundaryConfig,
    pub legend: LegendConfig,
}

impl ViewerConfig {
    pub fn from_yaml_str(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: ViewerConfig =
            serde_yaml::from_str(contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&contents, path)?;
        info!(path = ?path, products = config.products.len(), "Loaded viewer config");
        Ok(config)
    }

    /// Like [`ViewerConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            warn!(path = ?path, "Viewer config not found, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Load from `NTL_CONFIG` (or the default path) and apply environment
    /// overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::load_or_default(Path::new(&path))?;
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// Apply overrides from any variable lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL) {
            debug!(url = %url, "API base URL overridden from environment");
            self.api.base_url = url;
        }
        if let Some(path) = lookup(ENV_STORAGE_PATH) {
            self.session.storage_path = Some(PathBuf::from(path));
        }
    }

    /// Overlay options for one product, with its overrides applied.
    pub fn overlay_for(&self, product: ProductType) -> OverlayOptions {
        let mut options = self.overlay.clone();
        if let Some(o) = self.products.get(&product) {
            if let Some(resolution) = o.resolution {
                options.resolution = resolution;
            }
            if let Some(opacity) = o.opacity {
                options.opacity = opacity;
            }
            if let Some(palette) = &o.palette {
                options.palette = palette.clone();
            }
            if let Some(mode) = o.mode {
                options.mode = mode;
            }
        }
        options
    }

    fn validate(&self) -> Result<(), ConfigError> {
        check_overlay("overlay", &self.overlay)?;
        for product in self.products.keys() {
            check_overlay(product.id(), &self.overlay_for(*product))?;
        }
        if self.session.storage_key.is_empty() {
            return Err(ConfigError::Invalid(
                "session.storage_key must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_overlay(section: &str, options: &OverlayOptions) -> Result<(), ConfigError> {
    if options.resolution == 0 || options.tile_size == 0 {
        return Err(ConfigError::Invalid(format!(
            "{}: resolution and tile_size must be positive",
            section
        )));
    }
    if !(0.0..=1.0).contains(&options.opacity) {
        return Err(ConfigError::Invalid(format!(
            "{}: opacity {} outside 0..=1",
            section, options.opacity
        )));
    }
    resolve_palette(&options.palette)
        .map_err(|e| ConfigError::Invalid(format!("{}: {}", section, e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
api:
  base_url: "http://backend:9000"
  cache_ttl_secs: 60
overlay:
  resolution: 64
  palette: greys
products:
  lj:
    opacity: 0.8
    palette: viridis
  vnp46a1_radiance_m10:
    mode: rgb
session:
  default_slots: [lj, vnp46a1_dnb]
boundaries:
  resolution: 110m
"#;

    #[test]
    fn test_parse_sample() {
        let config = ViewerConfig::from_yaml_str(SAMPLE, Path::new("sample.yaml")).unwrap();
        assert_eq!(config.api.base_url, "http://backend:9000");
        assert_eq!(config.api.cache_ttl_secs, 60);
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.overlay.resolution, 64);
        assert_eq!(config.overlay.tile_size, 256);
        assert_eq!(
            config.session.default_slots,
            vec![ProductType::LuoJia, ProductType::Vnp46a1Dnb]
        );
        assert_eq!(config.session.storage_key, "chart-config");
        assert_eq!(config.boundaries.resolution, BoundaryResolution::Coarse);
        assert_eq!(config.boundaries.id_property, "adm0_a3");
    }

    #[test]
    fn test_overlay_for_merges_overrides() {
        let config = ViewerConfig::from_yaml_str(SAMPLE, Path::new("sample.yaml")).unwrap();

        let lj = config.overlay_for(ProductType::LuoJia);
        assert_eq!(lj.opacity, 0.8);
        assert_eq!(lj.palette, "viridis");
        assert_eq!(lj.resolution, 64);

        let m10 = config.overlay_for(ProductType::Vnp46a1RadianceM10);
        assert_eq!(m10.mode, InterpolationMode::Rgb);
        assert_eq!(m10.palette, "greys");

        assert_eq!(config.overlay_for(ProductType::Vnp46a2Dnb), config.overlay);
    }

    #[test]
    fn test_empty_file_is_default() {
        let config = ViewerConfig::from_yaml_str("{}", Path::new("empty.yaml")).unwrap();
        assert_eq!(config, ViewerConfig::default());
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad_opacity = "overlay:\n  opacity: 1.5\n";
        assert!(matches!(
            ViewerConfig::from_yaml_str(bad_opacity, Path::new("x")),
            Err(ConfigError::Invalid(_))
        ));

        let bad_palette = "products:\n  lj:\n    palette: nope\n";
        assert!(matches!(
            ViewerConfig::from_yaml_str(bad_palette, Path::new("x")),
            Err(ConfigError::Invalid(_))
        ));

        let bad_yaml = "overlay: [";
        assert!(matches!(
            ViewerConfig::from_yaml_str(bad_yaml, Path::new("x")),
            Err(ConfigError::Parse { .. })
        ));

        let unknown_product = "products:\n  nope: {}\n";
        assert!(ViewerConfig::from_yaml_str(unknown_product, Path::new("x")).is_err());
    }

    #[test]
    fn test_overrides_from_lookup() {
        let mut config = ViewerConfig::default();
        config.apply_overrides(|key| match key {
            ENV_API_URL => Some("http://override:1".to_string()),
            ENV_STORAGE_PATH => Some("/tmp/slots.json".to_string()),
            _ => None,
        });
        assert_eq!(config.api.base_url, "http://override:1");
        assert_eq!(
            config.session.storage_path,
            Some(PathBuf::from("/tmp/slots.json"))
        );
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config =
            ViewerConfig::load_or_default(Path::new("/definitely/not/here.yaml")).unwrap();
        assert_eq!(config, ViewerConfig::default());
    }
}
