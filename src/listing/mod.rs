//! Object listing: the records a crawl starts from.
//!
//! The core never talks to a storage API directly. It consumes an
//! [`ObjectLister`], and when that lister fails the run degrades to a fixed
//! two-object sample so the rest of the pipeline stays exercisable offline.

pub mod local;
pub mod manifest;

pub use local::LocalDirLister;
pub use manifest::{ManifestLister, parse_record_stream};

use crate::error::{CrawlError, Incident, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// One object as reported by the storage listing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    #[serde(alias = "name", alias = "key")]
    pub path: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default, alias = "contentType")]
    pub content_type: Option<String>,
    #[serde(default, alias = "time_created", alias = "timeCreated")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "updated")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "md5_hash", alias = "md5Hash")]
    pub checksum: Option<String>,
}

impl ObjectRecord {
    pub fn new(path: impl Into<String>) -> Self {
        ObjectRecord {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Source of object records under a prefix.
pub trait ObjectLister {
    /// Human-readable source name for logs and the crawl summary.
    fn describe(&self) -> String;

    /// Enumerate every object whose key starts with `prefix`, in listing order.
    fn list(&self, prefix: &str) -> Result<Vec<ObjectRecord>>;
}

/// Listing result after the sample-data fallback has been applied.
#[derive(Debug)]
pub struct ListingOutcome {
    pub records: Vec<ObjectRecord>,
    pub used_sample_data: bool,
    pub incident: Option<Incident>,
}

/// Run the lister, falling back to [`sample_records`] on failure.
pub fn list_or_sample(lister: &dyn ObjectLister, prefix: &str) -> ListingOutcome {
    let source = lister.describe();
    info!(%source, prefix, "listing objects");
    match lister.list(prefix) {
        Ok(records) => {
            info!(%source, count = records.len(), "listing complete");
            ListingOutcome {
                records,
                used_sample_data: false,
                incident: None,
            }
        }
        Err(err) => {
            warn!(%source, error = %err, "listing failed; using built-in sample data");
            let incident = if matches!(err, CrawlError::ListingFailure { .. }) {
                Incident::from(&err)
            } else {
                Incident::from(CrawlError::ListingFailure {
                    prefix: prefix.to_string(),
                    message: err.to_string(),
                })
            };
            ListingOutcome {
                records: sample_records(prefix),
                used_sample_data: true,
                incident: Some(incident),
            }
        }
    }
}

/// The two synthetic objects used when the real listing is unavailable.
pub fn sample_records(prefix: &str) -> Vec<ObjectRecord> {
    vec![
        ObjectRecord::new(format!("{prefix}category1/subcategory1/sample_vector.geojson"))
            .with_content_type("application/geo+json"),
        ObjectRecord::new(format!("{prefix}category2/subcategory2/sample_raster.tiff"))
            .with_content_type("image/tiff"),
    ]
}

/// Drop records outside `prefix`, mirroring a prefix-scoped storage listing.
pub(crate) fn retain_prefixed(records: &mut Vec<ObjectRecord>, prefix: &str) {
    if prefix.is_empty() {
        return;
    }
    let bare = prefix.trim_start_matches('/');
    records.retain(|record| {
        record.path.starts_with(prefix) || record.path.trim_start_matches('/').starts_with(bare)
    });
}
