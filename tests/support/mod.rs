#![allow(dead_code)]

use anyhow::{Context, Result};
use bucket_stac::error::CrawlError;
use bucket_stac::{
    BoundsReader, CrawlConfig, CrawlInputs, DocumentSchemas, LayerMetadataFile, ObjectLister,
    ObjectRecord, RunReport, UnavailableBoundsReader, run_crawl_at,
};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use std::fs;
use std::path::{Component, Path, PathBuf};

pub const BUCKET: &str = "swhm_data";
pub const ASSET_BASE: &str = "https://storage.googleapis.com/swhm_data";

pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// Config rooted at `output` with no prefix and two bounds workers.
pub fn test_config(output: &Path) -> CrawlConfig {
    CrawlConfig {
        bucket: BUCKET.to_string(),
        prefix: String::new(),
        output_dir: output.to_path_buf(),
        bounds_workers: Some(2),
        ..CrawlConfig::default()
    }
}

/// In-memory listing used instead of a manifest file.
pub struct StaticLister(pub Vec<ObjectRecord>);

impl StaticLister {
    pub fn of(paths: &[&str]) -> Self {
        StaticLister(paths.iter().map(|path| ObjectRecord::new(*path)).collect())
    }
}

impl ObjectLister for StaticLister {
    fn describe(&self) -> String {
        "static test listing".to_string()
    }

    fn list(&self, prefix: &str) -> bucket_stac::Result<Vec<ObjectRecord>> {
        Ok(self
            .0
            .iter()
            .filter(|record| record.path.starts_with(prefix))
            .cloned()
            .collect())
    }
}

pub struct FailingLister;

impl ObjectLister for FailingLister {
    fn describe(&self) -> String {
        "failing test listing".to_string()
    }

    fn list(&self, prefix: &str) -> bucket_stac::Result<Vec<ObjectRecord>> {
        Err(CrawlError::ListingFailure {
            prefix: prefix.to_string(),
            message: "permission denied".to_string(),
        })
    }
}

/// Run a crawl with empty metadata and the fixed timestamp.
pub fn crawl(
    config: &CrawlConfig,
    lister: &dyn ObjectLister,
    bounds: &dyn BoundsReader,
    schemas: Option<&DocumentSchemas>,
) -> Result<RunReport> {
    let metadata = LayerMetadataFile::default();
    run_crawl_at(
        config,
        CrawlInputs {
            lister,
            bounds,
            metadata: &metadata,
            schemas,
        },
        fixed_time(),
    )
    .context("crawl failed")
}

pub fn crawl_paths(config: &CrawlConfig, paths: &[&str]) -> Result<RunReport> {
    crawl(
        config,
        &StaticLister::of(paths),
        &UnavailableBoundsReader,
        None,
    )
}

pub fn read_json(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Write `value` as JSON under `dir` and return the file path.
pub fn write_json(dir: &Path, name: &str, value: &Value) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string_pretty(value)?)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

/// `(rel, href)` pairs of a document's links.
pub fn links(doc: &Value) -> Vec<(String, String)> {
    doc["links"]
        .as_array()
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
        .map(|link| {
            (
                link["rel"].as_str().unwrap_or_default().to_string(),
                link["href"].as_str().unwrap_or_default().to_string(),
            )
        })
        .collect()
}

pub fn hrefs_with_rel(doc: &Value, rel: &str) -> Vec<String> {
    links(doc)
        .into_iter()
        .filter(|(r, _)| r == rel)
        .map(|(_, href)| href)
        .collect()
}

/// Resolve a relative href against the document at `from`, lexically.
pub fn resolve_href(from: &Path, href: &str) -> PathBuf {
    let base = from.parent().unwrap_or_else(|| Path::new(""));
    let mut out = PathBuf::new();
    for component in base.join(href).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
