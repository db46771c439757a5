//! Error taxonomy for a crawl run.
//!
//! Every variant is scoped to the smallest affected unit (one listing, one
//! asset, one document). The pipeline records these as [`Incident`]s and keeps
//! going; only setup failures (bad config, unreadable inputs) surface as `Err`
//! to the caller.

use serde::Serialize;
use std::path::PathBuf;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, CrawlError>;

#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    /// The object lister could not enumerate the prefix.
    #[error("listing failed for prefix '{prefix}': {message}")]
    ListingFailure { prefix: String, message: String },

    /// The bounds reader could not produce a bbox for a raster.
    #[error("bounds unavailable for {path}: {message}")]
    BoundsUnavailable { path: String, message: String },

    /// No layer metadata entry matched an asset name.
    #[error("no layer metadata for '{name}'")]
    MetadataMiss { name: String },

    /// The hierarchy builder could not find the node an asset belongs to.
    #[error("attachment node '{node_path}' missing for asset {asset_path}")]
    BuilderInvariantViolation {
        node_path: String,
        asset_path: String,
    },

    /// A document could not be written to its destination.
    #[error("failed to write {}: {message}", path.display())]
    WriteFailure { path: PathBuf, message: String },

    /// A rendered document did not satisfy its structural schema.
    #[error("{document} failed schema validation: {details}")]
    SchemaViolation { document: String, details: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json error in {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl CrawlError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CrawlError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        CrawlError::Json {
            context: context.into(),
            source,
        }
    }

    /// Short stable label used in summaries and log fields.
    pub fn kind(&self) -> IncidentKind {
        match self {
            CrawlError::ListingFailure { .. } => IncidentKind::ListingFailure,
            CrawlError::BoundsUnavailable { .. } => IncidentKind::BoundsUnavailable,
            CrawlError::MetadataMiss { .. } => IncidentKind::MetadataMiss,
            CrawlError::BuilderInvariantViolation { .. } => IncidentKind::BuilderInvariantViolation,
            CrawlError::WriteFailure { .. } | CrawlError::Io { .. } => IncidentKind::WriteFailure,
            CrawlError::SchemaViolation { .. } => IncidentKind::SchemaViolation,
            CrawlError::Config(_) | CrawlError::Json { .. } => IncidentKind::Setup,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentKind {
    ListingFailure,
    BoundsUnavailable,
    MetadataMiss,
    BuilderInvariantViolation,
    WriteFailure,
    SchemaViolation,
    Setup,
}

/// A non-fatal failure recorded during a run.
#[derive(Clone, Debug, Serialize)]
pub struct Incident {
    pub kind: IncidentKind,
    pub message: String,
}

impl From<&CrawlError> for Incident {
    fn from(err: &CrawlError) -> Self {
        Incident {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<CrawlError> for Incident {
    fn from(err: CrawlError) -> Self {
        Incident::from(&err)
    }
}
