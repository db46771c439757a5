//! Crawl configuration.
//!
//! Values come from three layers, later ones winning: a JSON config file,
//! `BUCKET_STAC_*` environment variables, then CLI flags (applied by the
//! binary). Every field has a default so an empty file is a valid config.

use crate::bounds::{BBox, default_workers};
use crate::error::{CrawlError, Result};
use crate::split_list;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "BUCKET_STAC_";
pub const STAC_VERSION: &str = "1.0.0";

/// Puget Sound region, used whenever a raster's real bounds are unknown.
pub const DEFAULT_BBOX: [f64; 4] = [
    -124.81791282934638,
    46.593055784134464,
    -120.65459447215042,
    49.00245266588554,
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CrawlConfig {
    pub bucket: String,
    pub prefix: String,
    /// Public base for asset hrefs. Defaults to the bucket's public endpoint.
    pub asset_base_url: Option<String>,
    /// When set, document links are absolute under this URL.
    pub catalog_root_url: Option<String>,
    pub output_dir: PathBuf,
    pub default_bbox: BBox,
    pub catalog_id: String,
    pub catalog_title: String,
    pub catalog_description: String,
    pub keywords: Vec<String>,
    pub provider_name: String,
    pub license: String,
    pub metadata_path: Option<PathBuf>,
    pub bounds_workers: Option<usize>,
    pub stac_version: String,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        CrawlConfig {
            bucket: "bucket".to_string(),
            prefix: "public/layers/".to_string(),
            asset_base_url: None,
            catalog_root_url: None,
            output_dir: PathBuf::from("catalog"),
            default_bbox: BBox::from(DEFAULT_BBOX),
            catalog_id: "data-catalog".to_string(),
            catalog_title: "Stormwater Heatmap Data Catalog".to_string(),
            catalog_description: "STAC catalog for Stormwater Heatmap datasets including raster \
                                  layers and pollutant concentration models"
                .to_string(),
            keywords: ["geospatial", "stormwater", "hydrology", "pollution", "environmental"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            provider_name: "StormwaterHeatmap.Org".to_string(),
            license: "MPL-2.0".to_string(),
            metadata_path: None,
            bounds_workers: None,
            stac_version: STAC_VERSION.to_string(),
        }
    }
}

impl CrawlConfig {
    /// Read a JSON config file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|err| CrawlError::io(path, err))?;
        serde_json::from_str(&data).map_err(|err| CrawlError::json(path.display().to_string(), err))
    }

    /// Apply `BUCKET_STAC_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let var = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}"))
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(bucket) = var("BUCKET") {
            self.bucket = bucket;
        }
        if let Some(prefix) = var("PREFIX") {
            self.prefix = prefix;
        }
        if let Some(url) = var("ASSET_BASE_URL") {
            self.asset_base_url = Some(url);
        }
        if let Some(url) = var("ROOT_URL") {
            self.catalog_root_url = Some(url);
        }
        if let Some(dir) = var("OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(path) = var("METADATA") {
            self.metadata_path = Some(PathBuf::from(path));
        }
        if let Some(raw) = var("KEYWORDS") {
            self.keywords = split_list(&raw);
        }
        if let Some(raw) = var("WORKERS") {
            let workers = raw.parse::<usize>().map_err(|err| {
                CrawlError::Config(format!("{ENV_PREFIX}WORKERS must be an integer, got '{raw}': {err}"))
            })?;
            self.bounds_workers = Some(workers);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            return Err(CrawlError::Config("bucket must not be empty".into()));
        }
        if !self.default_bbox.is_well_formed() {
            return Err(CrawlError::Config(format!(
                "default_bbox must be finite with west <= east and south <= north, got {:?}",
                <[f64; 4]>::from(self.default_bbox)
            )));
        }
        if self.bounds_workers == Some(0) {
            return Err(CrawlError::Config("bounds_workers must be at least 1".into()));
        }
        if self.catalog_id.trim().is_empty() {
            return Err(CrawlError::Config("catalog_id must not be empty".into()));
        }
        Ok(())
    }

    pub fn asset_base_url(&self) -> String {
        match &self.asset_base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://storage.googleapis.com/{}", self.bucket),
        }
    }

    pub fn workers(&self) -> usize {
        self.bounds_workers.unwrap_or_else(default_workers)
    }
}
