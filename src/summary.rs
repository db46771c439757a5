//! The `crawl_summary.json` report written beside the catalog.

use crate::classify::{AssetKind, DiscoveredAsset};
use crate::error::Incident;
use crate::hierarchy::DirectoryNode;
use crate::stac::DocPath;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

pub const SUMMARY_FILE: &str = "crawl_summary.json";

#[derive(Clone, Debug, Serialize)]
pub struct CrawlSummary<'a> {
    pub crawl_summary: SummaryCounts,
    pub discovered_items: &'a [DiscoveredAsset],
    pub directory_structure: &'a BTreeMap<String, DirectoryNode>,
    pub stac_structure: StacStructure,
    pub incidents: &'a [Incident],
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SummaryCounts {
    pub bucket_name: String,
    pub prefix: String,
    pub source: String,
    pub crawl_time: String,
    /// Assets kept after deduplication.
    pub total_items: usize,
    /// Classified assets before deduplication.
    pub assets_classified: usize,
    pub vectors_found: usize,
    pub rasters_found: usize,
    pub duplicates_dropped: usize,
    pub collections_generated: usize,
    pub stac_items_generated: usize,
    pub documents_written: usize,
    pub used_sample_data: bool,
}

impl SummaryCounts {
    /// Fill the per-kind counters from the deduplicated assets.
    pub fn count_kinds(&mut self, assets: &[DiscoveredAsset]) {
        self.total_items = assets.len();
        self.vectors_found = assets
            .iter()
            .filter(|asset| asset.kind == AssetKind::Vector)
            .count();
        self.rasters_found = assets
            .iter()
            .filter(|asset| asset.kind == AssetKind::Raster)
            .count();
    }
}

/// Where each document was placed, relative to the output root.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct StacStructure {
    pub catalog: String,
    pub collections: Vec<String>,
    pub items: Vec<String>,
}

impl StacStructure {
    pub fn new(catalog: &DocPath, collections: &[DocPath], items: &[DocPath]) -> Self {
        StacStructure {
            catalog: catalog.to_string(),
            collections: collections.iter().map(DocPath::to_string).collect(),
            items: items.iter().map(DocPath::to_string).collect(),
        }
    }
}

pub fn format_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
