//! Structural JSON Schema checks for rendered documents.
//!
//! The schemas under `schema/` are compiled into the binary. They check the
//! shape the synthesizer promises (required keys, link relations, bbox
//! arity), not the full STAC extension surface. Validation is advisory: a
//! failing document is still written and the failure is recorded.

use crate::error::{CrawlError, Result};
use jsonschema::JSONSchema;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

const CATALOG_SCHEMA: &str = include_str!("../schema/catalog.schema.json");
const COLLECTION_SCHEMA: &str = include_str!("../schema/collection.schema.json");
const ITEM_SCHEMA: &str = include_str!("../schema/item.schema.json");

/// Relations whose targets must exist when hrefs are relative.
const CHECKED_RELS: &[&str] = &["parent", "root", "child", "item", "collection"];

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum DocumentKind {
    Catalog,
    Collection,
    Item,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Catalog => "catalog",
            DocumentKind::Collection => "collection",
            DocumentKind::Item => "item",
        }
    }

    /// Kind of a parsed document, from its `type` field.
    pub fn detect(value: &Value) -> Option<Self> {
        match value.get("type").and_then(Value::as_str)? {
            "Catalog" => Some(DocumentKind::Catalog),
            "Collection" => Some(DocumentKind::Collection),
            "Feature" => Some(DocumentKind::Item),
            _ => None,
        }
    }
}

/// Compiled validators for the three document kinds.
pub struct DocumentSchemas {
    catalog: JSONSchema,
    collection: JSONSchema,
    item: JSONSchema,
}

impl DocumentSchemas {
    /// Compile the schemas bundled with the crate.
    pub fn bundled() -> Result<Self> {
        Ok(DocumentSchemas {
            catalog: compile("catalog.schema.json", CATALOG_SCHEMA)?,
            collection: compile("collection.schema.json", COLLECTION_SCHEMA)?,
            item: compile("item.schema.json", ITEM_SCHEMA)?,
        })
    }

    fn schema(&self, kind: DocumentKind) -> &JSONSchema {
        match kind {
            DocumentKind::Catalog => &self.catalog,
            DocumentKind::Collection => &self.collection,
            DocumentKind::Item => &self.item,
        }
    }

    /// Validate `value` as `kind`; `document` names it in the error.
    pub fn check(&self, kind: DocumentKind, document: &str, value: &Value) -> Result<()> {
        if let Err(errors) = self.schema(kind).validate(value) {
            let details = errors
                .map(|err| format!("{} at {}", err, err.instance_path))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(CrawlError::SchemaViolation {
                document: document.to_string(),
                details,
            });
        }
        Ok(())
    }
}

fn compile(name: &str, raw: &str) -> Result<JSONSchema> {
    let schema: Value =
        serde_json::from_str(raw).map_err(|err| CrawlError::json(format!("bundled {name}"), err))?;
    JSONSchema::compile(&schema).map_err(|err| {
        CrawlError::Config(format!("compiling bundled schema {name}: {err}"))
    })
}

/// Outcome of checking a catalog directory on disk.
#[derive(Debug, Default)]
pub struct DirectoryReport {
    pub checked: usize,
    pub skipped: Vec<PathBuf>,
    pub violations: Vec<CrawlError>,
}

impl DirectoryReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Validate every STAC document under `root` and check that relative links resolve.
///
/// JSON files that are not catalogs, collections, or items (the crawl summary,
/// the layer metadata copy) are skipped.
pub fn validate_catalog_dir(root: &Path, schemas: &DocumentSchemas) -> Result<DirectoryReport> {
    if !root.is_dir() {
        return Err(CrawlError::Config(format!(
            "{} is not a catalog directory",
            root.display()
        )));
    }

    let mut report = DirectoryReport::default();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|err| CrawlError::Config(err.to_string()))?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "json") {
            continue;
        }
        let name = path
            .strip_prefix(root)
            .unwrap_or(path)
            .display()
            .to_string();
        let text = fs::read_to_string(path).map_err(|err| CrawlError::io(path, err))?;
        let value: Value = match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(err) => {
                report.violations.push(CrawlError::SchemaViolation {
                    document: name,
                    details: format!("not valid JSON: {err}"),
                });
                continue;
            }
        };
        let Some(kind) = DocumentKind::detect(&value) else {
            debug!(document = %name, "not a STAC document; skipping");
            report.skipped.push(path.to_path_buf());
            continue;
        };

        report.checked += 1;
        if let Err(err) = schemas.check(kind, &name, &value) {
            warn!(error = %err, "schema violation");
            report.violations.push(err);
        }
        report
            .violations
            .extend(broken_links(path, &name, &value));
    }
    Ok(report)
}

fn broken_links(path: &Path, name: &str, value: &Value) -> Vec<CrawlError> {
    let Some(dir) = path.parent() else {
        return Vec::new();
    };
    let links = value
        .get("links")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    links
        .iter()
        .filter(|link| {
            link.get("rel")
                .and_then(Value::as_str)
                .is_some_and(|rel| CHECKED_RELS.contains(&rel))
        })
        .filter_map(|link| link.get("href").and_then(Value::as_str))
        .filter(|href| !href.contains("://"))
        .filter(|href| !dir.join(href).is_file())
        .map(|href| CrawlError::SchemaViolation {
            document: name.to_string(),
            details: format!("link target {href} does not exist"),
        })
        .collect()
}
