//! Object classification: which listed objects become catalog assets.
//!
//! Classification only sniffs the key; it never opens the object. A record
//! yields at most one [`DiscoveredAsset`], and anything that is not a
//! recognised vector or raster extension is skipped without error.

use crate::listing::ObjectRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const VECTOR_EXTENSIONS: &[&str] = &["geojson"];
const RASTER_EXTENSIONS: &[&str] = &["tif", "tiff", "gtiff"];

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Vector,
    Raster,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Vector => "vector",
            AssetKind::Raster => "raster",
        }
    }

    /// File format name used in summaries.
    pub fn format(&self) -> &'static str {
        match self {
            AssetKind::Vector => "GeoJSON",
            AssetKind::Raster => "GeoTIFF",
        }
    }

    fn from_extension(extension: &str) -> Option<Self> {
        let lower = extension.to_ascii_lowercase();
        if VECTOR_EXTENSIONS.contains(&lower.as_str()) {
            Some(AssetKind::Vector)
        } else if RASTER_EXTENSIONS.contains(&lower.as_str()) {
            Some(AssetKind::Raster)
        } else {
            None
        }
    }
}

/// One physical vector or raster object found under the crawl prefix.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredAsset {
    pub name: String,
    pub full_path: String,
    pub url: String,
    pub kind: AssetKind,
    pub size_bytes: Option<u64>,
    pub content_type: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub checksum: Option<String>,
    pub path_segments: Vec<String>,
}

/// Identity used for deduplication: `(kind, name, full_path)`.
pub type AssetKey = (AssetKind, String, String);

impl DiscoveredAsset {
    pub fn key(&self) -> AssetKey {
        (self.kind, self.name.clone(), self.full_path.clone())
    }

    /// Directory (relative to the catalog root) holding this asset's item document.
    pub fn item_dir(&self) -> String {
        self.path_segments.join("/")
    }
}

/// Classify one object record under `prefix`.
///
/// `asset_base_url` is joined with the full key to form the public URL.
pub fn classify(record: &ObjectRecord, prefix: &str, asset_base_url: &str) -> Option<DiscoveredAsset> {
    let path = record.path.as_str();
    if path.is_empty() || path.ends_with('/') {
        return None;
    }

    let (directory, filename) = match path.rsplit_once('/') {
        Some((dir, file)) => (dir, file),
        None => ("", path),
    };
    let (stem, extension) = filename.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    let kind = AssetKind::from_extension(extension)?;

    Some(DiscoveredAsset {
        name: stem.to_string(),
        full_path: path.to_string(),
        url: public_url(asset_base_url, path),
        kind,
        size_bytes: record.size,
        content_type: record.content_type.clone(),
        created_at: record.created_at,
        updated_at: record.updated_at,
        checksum: record.checksum.clone(),
        path_segments: path_segments(directory, prefix),
    })
}

/// Directory components of `directory` with `prefix` stripped.
pub fn path_segments(directory: &str, prefix: &str) -> Vec<String> {
    let trimmed_prefix = prefix.trim_matches('/');
    let mut relative = directory.trim_start_matches('/');
    if !trimmed_prefix.is_empty() {
        if let Some(rest) = relative.strip_prefix(trimmed_prefix) {
            // Only strip on a segment boundary: "layers" must not eat "layers2".
            if rest.is_empty() || rest.starts_with('/') {
                relative = rest;
            }
        }
    }
    relative
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

fn public_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if base.is_empty() {
        path.to_string()
    } else {
        format!("{base}/{path}")
    }
}
