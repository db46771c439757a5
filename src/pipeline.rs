//! End-to-end crawl: list, classify, build, resolve bounds, render, write.
//!
//! [`run_crawl`] only returns `Err` for setup problems (invalid config,
//! unusable schemas). Everything that goes wrong afterwards is scoped to one
//! asset or one document and lands in [`RunReport::incidents`].

use crate::bounds::{BoundsReader, resolve_bounds};
use crate::classify::{DiscoveredAsset, classify};
use crate::config::CrawlConfig;
use crate::error::{CrawlError, Incident, Result};
use crate::hierarchy::{Hierarchy, build_hierarchy};
use crate::listing::{ObjectLister, list_or_sample};
use crate::metadata::LayerMetadataStore;
use crate::stac::{DocPath, Rendered, Synthesizer};
use crate::summary::{CrawlSummary, SUMMARY_FILE, StacStructure, SummaryCounts, format_time};
use crate::validate::{DocumentKind, DocumentSchemas};
use crate::writer::{copy_metadata, write_document};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{info, warn};

/// Collaborators for one run.
pub struct CrawlInputs<'a> {
    pub lister: &'a dyn ObjectLister,
    pub bounds: &'a dyn BoundsReader,
    pub metadata: &'a dyn LayerMetadataStore,
    /// When present, every document is checked before it is written.
    pub schemas: Option<&'a DocumentSchemas>,
}

/// Everything a caller needs to know about a finished run.
#[derive(Debug)]
pub struct RunReport {
    pub crawl_time: DateTime<Utc>,
    pub output_dir: PathBuf,
    pub used_sample_data: bool,
    pub counts: SummaryCounts,
    pub hierarchy: Hierarchy,
    pub catalog: DocPath,
    pub collections: Vec<DocPath>,
    pub items: Vec<DocPath>,
    pub incidents: Vec<Incident>,
    pub summary_path: Option<PathBuf>,
}

impl RunReport {
    pub fn incident_count(&self) -> usize {
        self.incidents.len()
    }
}

/// Run a crawl with the current time as the discovery timestamp.
pub fn run_crawl(config: &CrawlConfig, inputs: CrawlInputs<'_>) -> Result<RunReport> {
    run_crawl_at(config, inputs, Utc::now())
}

/// Run a crawl, stamping every document with `crawl_time`.
pub fn run_crawl_at(
    config: &CrawlConfig,
    inputs: CrawlInputs<'_>,
    crawl_time: DateTime<Utc>,
) -> Result<RunReport> {
    config.validate()?;
    let mut incidents: Vec<Incident> = Vec::new();

    let listing = list_or_sample(inputs.lister, &config.prefix);
    incidents.extend(listing.incident);

    let base_url = config.asset_base_url();
    let classified: Vec<DiscoveredAsset> = listing
        .records
        .iter()
        .filter_map(|record| classify(record, &config.prefix, &base_url))
        .collect();
    info!(
        objects = listing.records.len(),
        assets = classified.len(),
        "classified objects"
    );
    let assets_classified = classified.len();

    let mut hierarchy = build_hierarchy(classified);
    let skipped: HashSet<String> = hierarchy
        .violations
        .iter()
        .filter_map(|err| match err {
            CrawlError::BuilderInvariantViolation { asset_path, .. } => Some(asset_path.clone()),
            _ => None,
        })
        .collect();
    incidents.extend(hierarchy.violations.drain(..).map(Incident::from));

    let mut bounds = resolve_bounds(inputs.bounds, &hierarchy.assets, config.workers());
    incidents.extend(bounds.failures.drain(..).map(Incident::from));

    let output_dir = config.output_dir.clone();
    let metadata_doc = match &config.metadata_path {
        Some(source) if source.is_file() => match copy_metadata(source, &output_dir) {
            Ok(doc) => Some(doc),
            Err(err) => {
                warn!(error = %err, "layer metadata not copied");
                incidents.push(Incident::from(err));
                None
            }
        },
        Some(source) => {
            warn!(path = %source.display(), "layer metadata file not found; not copied");
            None
        }
        None => None,
    };

    let mut synth = Synthesizer::new(config, &bounds, inputs.metadata, crawl_time);
    if let Some(doc) = metadata_doc {
        synth = synth.with_metadata_asset(doc);
    }
    synth.assign_ids(&hierarchy);

    let mut emitter = Emitter {
        root: output_dir.clone(),
        schemas: inputs.schemas,
        incidents: &mut incidents,
        written: 0,
    };

    let mut items = Vec::new();
    for asset in hierarchy
        .assets
        .iter()
        .filter(|asset| !skipped.contains(&asset.full_path))
    {
        let rendered = synth.render_item(asset, hierarchy.owner_of(asset));
        items.push(emitter.emit(DocumentKind::Item, rendered));
    }

    let mut collections = Vec::new();
    for node_ref in hierarchy.collections() {
        let rendered = synth.render_collection(node_ref.node, node_ref.parent);
        collections.push(emitter.emit(DocumentKind::Collection, rendered));
    }

    let catalog = emitter.emit(
        DocumentKind::Catalog,
        synth.render_catalog(&hierarchy.roots, &hierarchy.root_assets),
    );
    let written = emitter.written;

    let mut counts = SummaryCounts {
        bucket_name: config.bucket.clone(),
        prefix: config.prefix.clone(),
        source: inputs.lister.describe(),
        crawl_time: format_time(crawl_time),
        assets_classified,
        duplicates_dropped: hierarchy.duplicates_dropped,
        collections_generated: collections.len(),
        stac_items_generated: items.len(),
        documents_written: written,
        used_sample_data: listing.used_sample_data,
        ..SummaryCounts::default()
    };
    counts.count_kinds(&hierarchy.assets);

    let summary = CrawlSummary {
        crawl_summary: counts.clone(),
        discovered_items: &hierarchy.assets,
        directory_structure: &hierarchy.roots,
        stac_structure: StacStructure::new(&catalog, &collections, &items),
        incidents: &incidents,
    };
    let summary_path = match write_document(&output_dir, &DocPath::file(SUMMARY_FILE), &summary) {
        Ok(path) => Some(path),
        Err(err) => {
            warn!(error = %err, "crawl summary not written");
            incidents.push(Incident::from(err));
            None
        }
    };

    info!(
        items = counts.stac_items_generated,
        collections = counts.collections_generated,
        written,
        incidents = incidents.len(),
        output = %output_dir.display(),
        "catalog generation complete"
    );

    Ok(RunReport {
        crawl_time,
        output_dir,
        used_sample_data: listing.used_sample_data,
        counts,
        hierarchy,
        catalog,
        collections,
        items,
        incidents,
        summary_path,
    })
}

/// Validates and writes rendered documents, collecting incidents.
struct Emitter<'a, 'b> {
    root: PathBuf,
    schemas: Option<&'a DocumentSchemas>,
    incidents: &'b mut Vec<Incident>,
    written: usize,
}

impl Emitter<'_, '_> {
    fn emit<T: Serialize>(&mut self, kind: DocumentKind, rendered: Rendered<T>) -> DocPath {
        let Rendered {
            path,
            document,
            incidents,
        } = rendered;
        self.incidents.extend(incidents.into_iter().map(Incident::from));

        if let Some(schemas) = self.schemas {
            let checked = serde_json::to_value(&document)
                .map_err(|err| CrawlError::json(path.to_string(), err))
                .and_then(|value| schemas.check(kind, path.as_str(), &value));
            if let Err(err) = checked {
                warn!(error = %err, "writing document despite validation failure");
                self.incidents.push(Incident::from(err));
            }
        }

        match write_document(&self.root, &path, &document) {
            Ok(_) => self.written += 1,
            Err(err) => {
                warn!(error = %err, kind = kind.as_str(), "document not written");
                self.incidents.push(Incident::from(err));
            }
        }
        path
    }
}
