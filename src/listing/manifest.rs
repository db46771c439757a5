//! Listing backed by a saved object manifest.
//!
//! Accepts the shapes storage tooling usually produces: a JSON array of
//! records, a storage API list response (`{"items": [...]}`), a single record,
//! or NDJSON with one record per line.

use super::{ObjectLister, ObjectRecord, retain_prefixed};
use crate::error::{CrawlError, Result};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

/// Reads object records from a manifest file on disk.
#[derive(Clone, Debug)]
pub struct ManifestLister {
    path: PathBuf,
}

impl ManifestLister {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ManifestLister { path: path.into() }
    }
}

impl ObjectLister for ManifestLister {
    fn describe(&self) -> String {
        format!("manifest {}", self.path.display())
    }

    fn list(&self, prefix: &str) -> Result<Vec<ObjectRecord>> {
        let data = fs::read_to_string(&self.path).map_err(|err| CrawlError::ListingFailure {
            prefix: prefix.to_string(),
            message: format!("reading {}: {err}", self.path.display()),
        })?;
        let mut records =
            parse_record_stream(&data).map_err(|err| CrawlError::ListingFailure {
                prefix: prefix.to_string(),
                message: err.to_string(),
            })?;
        retain_prefixed(&mut records, prefix);
        Ok(records)
    }
}

/// Parse a record stream, accepting either NDJSON or a JSON document.
///
/// Empty input is an empty listing, not an error: an empty bucket is a valid
/// crawl target. Entries that do not deserialize as object records are
/// skipped with a warning; only input that cannot be read as JSON at all is
/// an error.
pub fn parse_record_stream(input: &str) -> Result<Vec<ObjectRecord>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return match value {
            Value::Array(items) => Ok(records_from_array(items)),
            Value::Object(mut map) => match map.remove("items") {
                Some(Value::Array(items)) => Ok(records_from_array(items)),
                Some(_) => Err(CrawlError::Config(
                    "manifest 'items' must be an array of object records".into(),
                )),
                None if map.contains_key("kind") && !map.contains_key("name") => {
                    // A list response with no objects omits `items` entirely.
                    Ok(Vec::new())
                }
                None => serde_json::from_value(Value::Object(map))
                    .map(|record| vec![record])
                    .map_err(|err| CrawlError::json("object record", err)),
            },
            _ => Err(CrawlError::Config(
                "unsupported manifest; expected object, array, or NDJSON".into(),
            )),
        };
    }

    let mut records = Vec::new();
    let mut first_error = None;
    let mut json_lines = 0;
    for (idx, line) in trimmed.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(err) => {
                warn!(line = idx + 1, error = %err, "skipping manifest line that is not JSON");
                first_error.get_or_insert((idx + 1, err));
                continue;
            }
        };
        json_lines += 1;
        if let Some(record) = record_from_value(value, &format!("manifest line {}", idx + 1)) {
            records.push(record);
        }
    }

    match first_error {
        Some((line, err)) if json_lines == 0 => {
            Err(CrawlError::json(format!("manifest line {line}"), err))
        }
        _ => Ok(records),
    }
}

fn records_from_array(items: Vec<Value>) -> Vec<ObjectRecord> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(idx, item)| record_from_value(item, &format!("manifest entry {idx}")))
        .collect()
}

fn record_from_value(value: Value, location: &str) -> Option<ObjectRecord> {
    match serde_json::from_value(value) {
        Ok(record) => Some(record),
        Err(err) => {
            warn!(location, error = %err, "skipping malformed object record");
            None
        }
    }
}
