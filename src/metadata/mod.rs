//! Per-layer descriptive metadata.
//!
//! The metadata file groups entries into `rasters` and `cocs` (contaminants of
//! concern), both keyed by a human display name. Lookup goes through the
//! ordered strategies in [`matching`].

pub mod matching;

pub use matching::{MatchStrategy, STRATEGIES, normalize_name};

use crate::error::{CrawlError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// One layer's entry in the metadata file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerMetadata {
    #[serde(default)]
    pub safe_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Ground sample distance; usually a number, kept verbatim.
    #[serde(default)]
    pub scale: Option<Value>,
    #[serde(default, rename = "sourceName")]
    pub source_name: Option<String>,
    #[serde(default, rename = "sourceUrl")]
    pub source_url: Option<String>,
    #[serde(default)]
    pub units: Option<String>,
    #[serde(default)]
    pub discrete: Option<bool>,
    #[serde(default, rename = "vizType")]
    pub viz_type: Option<String>,
    #[serde(default)]
    pub default_reduction: Option<String>,
    #[serde(default)]
    pub docs_link: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub values: Vec<Value>,
    #[serde(default)]
    pub layer: Option<LayerStyle>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerStyle {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "visParams")]
    pub vis_params: Option<Map<String, Value>>,
}

impl LayerMetadata {
    pub fn display_name(&self) -> Option<&str> {
        self.layer.as_ref()?.name.as_deref()
    }

    pub fn vis_params(&self) -> Option<&Map<String, Value>> {
        self.layer.as_ref()?.vis_params.as_ref()
    }

    /// `(min, max)` from the visualization parameters when both are present.
    pub fn value_range(&self) -> Option<(&Value, &Value)> {
        let params = self.vis_params()?;
        Some((params.get("min")?, params.get("max")?))
    }

    /// Discrete layers with labels carry a class table.
    pub fn is_categorical(&self) -> bool {
        self.discrete == Some(true) && !self.labels.is_empty()
    }

    /// `(value, label)` pairs; an unparseable or missing value falls back to the label index.
    pub fn classes(&self) -> Vec<(i64, &str)> {
        self.labels
            .iter()
            .enumerate()
            .map(|(idx, label)| {
                let value = self
                    .values
                    .get(idx)
                    .and_then(class_value)
                    .unwrap_or(idx as i64);
                (value, label.as_str())
            })
            .collect()
    }
}

fn class_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f as i64),
        _ => None,
    }
}

/// Source of per-layer metadata.
pub trait LayerMetadataStore {
    fn lookup(&self, name: &str) -> Option<&LayerMetadata>;

    /// An empty store never reports misses.
    fn is_empty(&self) -> bool;
}

/// A successful lookup with its provenance.
#[derive(Clone, Copy, Debug)]
pub struct MetadataMatch<'a> {
    pub key: &'a str,
    pub strategy: &'static str,
    pub metadata: &'a LayerMetadata,
}

/// The `{"rasters": {...}, "cocs": {...}}` metadata file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerMetadataFile {
    #[serde(default)]
    pub rasters: BTreeMap<String, LayerMetadata>,
    #[serde(default)]
    pub cocs: BTreeMap<String, LayerMetadata>,
}

impl LayerMetadataFile {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|err| CrawlError::io(path, err))?;
        let file: LayerMetadataFile = serde_json::from_str(&data)
            .map_err(|err| CrawlError::json(path.display().to_string(), err))?;
        info!(
            path = %path.display(),
            rasters = file.rasters.len(),
            cocs = file.cocs.len(),
            "loaded layer metadata"
        );
        Ok(file)
    }

    /// Like [`load`](Self::load), but an unreadable file becomes an empty store.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(file) => file,
            Err(err) => {
                warn!(error = %err, "layer metadata unavailable; items keep derived properties");
                LayerMetadataFile::default()
            }
        }
    }

    /// Entries in search order: every raster, then every coc.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &LayerMetadata)> {
        self.rasters
            .iter()
            .chain(self.cocs.iter())
            .map(|(key, meta)| (key.as_str(), meta))
    }

    /// Run the strategy chain. Each strategy scans every entry before the next is tried.
    pub fn find(&self, name: &str) -> Option<MetadataMatch<'_>> {
        for &(strategy, matches) in STRATEGIES {
            if let Some((key, metadata)) = self.entries().find(|&(key, meta)| matches(key, meta, name)) {
                debug!(name, key, strategy, "layer metadata matched");
                return Some(MetadataMatch {
                    key,
                    strategy,
                    metadata,
                });
            }
        }
        None
    }
}

impl LayerMetadataStore for LayerMetadataFile {
    fn lookup(&self, name: &str) -> Option<&LayerMetadata> {
        self.find(name).map(|hit| hit.metadata)
    }

    fn is_empty(&self) -> bool {
        self.rasters.is_empty() && self.cocs.is_empty()
    }
}
