//! Writes rendered documents under the output directory.
//!
//! Documents are serialized as 2-space indented JSON with a trailing newline
//! and land through a temp file in the destination directory, so a failed
//! write never leaves a truncated document behind.

use crate::error::{CrawlError, Result};
use crate::stac::DocPath;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Where the layer metadata file is copied, relative to the output root.
pub const METADATA_COPY_PATH: &str = "layer_metadata/layer_metadata.json";

/// Serialize `value` to the on-disk JSON form.
pub fn to_pretty_json(value: &impl Serialize) -> Result<String> {
    let mut text = serde_json::to_string_pretty(value)
        .map_err(|err| CrawlError::json("rendering document", err))?;
    text.push('\n');
    Ok(text)
}

/// Write `value` to `root/doc`, creating parent directories.
pub fn write_document(root: &Path, doc: &DocPath, value: &impl Serialize) -> Result<PathBuf> {
    let dest = root.join(doc.as_str());
    let text = to_pretty_json(value).map_err(|err| CrawlError::WriteFailure {
        path: dest.clone(),
        message: err.to_string(),
    })?;
    write_atomic(&dest, text.as_bytes())?;
    debug!(path = %dest.display(), "wrote document");
    Ok(dest)
}

fn write_atomic(dest: &Path, bytes: &[u8]) -> Result<()> {
    let failure = |message: String| CrawlError::WriteFailure {
        path: dest.to_path_buf(),
        message,
    };
    let parent = dest
        .parent()
        .ok_or_else(|| failure("destination has no parent directory".into()))?;
    fs::create_dir_all(parent).map_err(|err| failure(format!("creating {}: {err}", parent.display())))?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(|err| failure(err.to_string()))?;
    tmp.write_all(bytes).map_err(|err| failure(err.to_string()))?;
    tmp.persist(dest).map_err(|err| failure(err.error.to_string()))?;
    Ok(())
}

/// Copy the layer metadata file into the catalog tree.
pub fn copy_metadata(source: &Path, root: &Path) -> Result<DocPath> {
    let doc = DocPath::file(METADATA_COPY_PATH);
    let dest = root.join(doc.as_str());
    let bytes = fs::read(source).map_err(|err| CrawlError::io(source, err))?;
    if fs::canonicalize(source).ok() == fs::canonicalize(&dest).ok() && dest.exists() {
        debug!(path = %dest.display(), "layer metadata already in place");
        return Ok(doc);
    }
    write_atomic(&dest, &bytes)?;
    info!(from = %source.display(), to = %dest.display(), "copied layer metadata");
    Ok(doc)
}

/// What [`clear_catalog_dir`] removed.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ClearReport {
    pub files_removed: usize,
    pub dirs_removed: usize,
}

/// Remove every `.json` file below `root`, then prune emptied subdirectories.
///
/// `root` itself is kept. A missing `root` is not an error.
pub fn clear_catalog_dir(root: &Path) -> Result<ClearReport> {
    let mut report = ClearReport::default();
    if !root.exists() {
        info!(path = %root.display(), "catalog directory does not exist; nothing to clear");
        return Ok(report);
    }

    let json_files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "json"))
        .map(|entry| entry.into_path())
        .collect();

    for path in &json_files {
        match fs::remove_file(path) {
            Ok(()) => report.files_removed += 1,
            Err(err) => warn!(path = %path.display(), error = %err, "could not remove file"),
        }
    }

    // Deepest first, so parents see their emptied children as gone.
    for entry in WalkDir::new(root)
        .min_depth(1)
        .contents_first(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_dir())
    {
        let is_empty = fs::read_dir(entry.path())
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        if is_empty && fs::remove_dir(entry.path()).is_ok() {
            report.dirs_removed += 1;
        }
    }

    info!(
        path = %root.display(),
        files = report.files_removed,
        dirs = report.dirs_removed,
        "cleared catalog directory"
    );
    Ok(report)
}
