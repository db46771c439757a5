//! Shared library for the bucket-stac crawler.
//!
//! The crate turns a flat listing of object-storage keys into a linked STAC
//! catalog tree: [`classify`] decides which objects are layers, [`hierarchy`]
//! hangs them on directory nodes, and [`stac::synth`] renders items,
//! collections, and the root catalog. [`pipeline::run_crawl`] wires those
//! stages to the listing, bounds, and metadata collaborators and writes the
//! result to disk. The binaries under `src/bin/` are thin clap front-ends over
//! this API.

pub mod bounds;
pub mod classify;
pub mod config;
pub mod error;
pub mod hierarchy;
pub mod listing;
pub mod metadata;
pub mod observability;
pub mod pipeline;
pub mod stac;
pub mod summary;
pub mod validate;
pub mod writer;

pub use bounds::{
    BBox, Bounds, BoundsManifestReader, BoundsReader, BoundsTable, NoBounds,
    UnavailableBoundsReader, resolve_bounds,
};
pub use classify::{AssetKind, DiscoveredAsset, classify};
pub use config::CrawlConfig;
pub use error::{CrawlError, Incident, IncidentKind, Result};
pub use hierarchy::{DirectoryNode, Hierarchy, attachment_node_path, build_hierarchy};
pub use listing::{LocalDirLister, ManifestLister, ObjectLister, ObjectRecord};
pub use metadata::{LayerMetadata, LayerMetadataFile, LayerMetadataStore};
pub use pipeline::{CrawlInputs, RunReport, run_crawl, run_crawl_at};
pub use validate::{DocumentKind, DocumentSchemas, validate_catalog_dir};

/// Split a comma- or whitespace-separated list, dropping empty entries.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .replace(',', " ")
        .split_whitespace()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
