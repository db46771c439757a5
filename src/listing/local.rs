//! Listing over a local directory laid out like a bucket.
//!
//! Keys are the `/`-joined paths relative to the root, so a mirrored bucket
//! (`gsutil rsync`, `rclone copy`) lists exactly like the remote one.

use super::{ObjectLister, ObjectRecord, retain_prefixed};
use crate::error::{CrawlError, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Clone, Debug)]
pub struct LocalDirLister {
    root: PathBuf,
}

impl LocalDirLister {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalDirLister { root: root.into() }
    }
}

impl ObjectLister for LocalDirLister {
    fn describe(&self) -> String {
        format!("directory {}", self.root.display())
    }

    fn list(&self, prefix: &str) -> Result<Vec<ObjectRecord>> {
        if !self.root.is_dir() {
            return Err(CrawlError::ListingFailure {
                prefix: prefix.to_string(),
                message: format!("{} is not a directory", self.root.display()),
            });
        }

        let mut records = Vec::new();
        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
        {
            let entry = entry.map_err(|err| CrawlError::ListingFailure {
                prefix: prefix.to_string(),
                message: err.to_string(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(key) = object_key(&self.root, entry.path()) else {
                continue;
            };
            let metadata = entry.metadata().ok();
            records.push(ObjectRecord {
                path: key,
                size: metadata.as_ref().map(|meta| meta.len()),
                content_type: None,
                created_at: metadata
                    .as_ref()
                    .and_then(|meta| meta.created().ok())
                    .map(DateTime::<Utc>::from),
                updated_at: metadata
                    .as_ref()
                    .and_then(|meta| meta.modified().ok())
                    .map(DateTime::<Utc>::from),
                checksum: None,
            });
        }

        retain_prefixed(&mut records, prefix);
        Ok(records)
    }
}

fn object_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = relative
        .components()
        .map(|component| component.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}
