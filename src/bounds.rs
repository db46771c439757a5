//! Raster bounds: the bbox type, the reader seam, and parallel resolution.
//!
//! Bounds extraction is the one stage that runs off the main thread. Results
//! are keyed by `full_path`, so the order in which reads finish never leaks
//! into the catalog.

use crate::classify::{AssetKind, DiscoveredAsset};
use crate::error::{CrawlError, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Upper bound on the default worker count.
pub const MAX_DEFAULT_WORKERS: usize = 8;

/// Axis-aligned bounding box in WGS84, serialized as `[west, south, east, north]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl From<[f64; 4]> for BBox {
    fn from([west, south, east, north]: [f64; 4]) -> Self {
        BBox {
            west,
            south,
            east,
            north,
        }
    }
}

impl From<BBox> for [f64; 4] {
    fn from(bbox: BBox) -> Self {
        [bbox.west, bbox.south, bbox.east, bbox.north]
    }
}

impl BBox {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        BBox {
            west,
            south,
            east,
            north,
        }
    }

    pub fn is_well_formed(&self) -> bool {
        [self.west, self.south, self.east, self.north]
            .iter()
            .all(|v| v.is_finite())
            && self.west <= self.east
            && self.south <= self.north
    }

    /// Componentwise min/max of two boxes.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            west: self.west.min(other.west),
            south: self.south.min(other.south),
            east: self.east.max(other.east),
            north: self.north.max(other.north),
        }
    }

    /// Union of every box in `boxes`, or `None` when empty.
    pub fn union_all<'a>(boxes: impl IntoIterator<Item = &'a BBox>) -> Option<BBox> {
        boxes
            .into_iter()
            .fold(None, |acc: Option<BBox>, b| {
                Some(acc.map_or(*b, |a| a.union(b)))
            })
    }

    pub fn contains(&self, other: &BBox) -> bool {
        self.west <= other.west
            && self.south <= other.south
            && self.east >= other.east
            && self.north >= other.north
    }

    /// GeoJSON polygon tracing the box as a closed ring.
    pub fn to_polygon(&self) -> Polygon {
        let ring = vec![
            [self.west, self.south],
            [self.east, self.south],
            [self.east, self.north],
            [self.west, self.north],
            [self.west, self.south],
        ];
        Polygon {
            kind: "Polygon".to_string(),
            coordinates: vec![ring],
        }
    }
}

/// GeoJSON polygon geometry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<Vec<[f64; 2]>>,
}

/// Spatial footprint of one raster.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Bounds {
    pub bbox: BBox,
    pub footprint: Option<Polygon>,
}

/// The reader had nothing usable for an asset.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{0}")]
pub struct NoBounds(pub String);

/// Source of raster bounds. Shared across the worker pool.
pub trait BoundsReader: Send + Sync {
    fn read(&self, asset: &DiscoveredAsset) -> std::result::Result<Bounds, NoBounds>;
}

/// Reader that never has bounds; every raster falls back to the default bbox.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnavailableBoundsReader;

impl BoundsReader for UnavailableBoundsReader {
    fn read(&self, _asset: &DiscoveredAsset) -> std::result::Result<Bounds, NoBounds> {
        Err(NoBounds("no bounds source configured".to_string()))
    }
}

/// Bounds precomputed into a JSON map of `full_path` or `name` to `[w, s, e, n]`.
#[derive(Clone, Debug, Default)]
pub struct BoundsManifestReader {
    entries: BTreeMap<String, BBox>,
}

impl BoundsManifestReader {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|err| CrawlError::io(path, err))?;
        let entries: BTreeMap<String, BBox> = serde_json::from_str(&data)
            .map_err(|err| CrawlError::json(path.display().to_string(), err))?;
        Ok(BoundsManifestReader { entries })
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (String, BBox)>) -> Self {
        BoundsManifestReader {
            entries: entries.into_iter().collect(),
        }
    }
}

impl BoundsReader for BoundsManifestReader {
    fn read(&self, asset: &DiscoveredAsset) -> std::result::Result<Bounds, NoBounds> {
        let bbox = self
            .entries
            .get(&asset.full_path)
            .or_else(|| self.entries.get(&asset.name))
            .copied()
            .ok_or_else(|| NoBounds(format!("{} not in bounds manifest", asset.full_path)))?;
        if !bbox.is_well_formed() {
            return Err(NoBounds(format!(
                "malformed bbox for {}: {:?}",
                asset.full_path,
                <[f64; 4]>::from(bbox)
            )));
        }
        Ok(Bounds {
            bbox,
            footprint: Some(bbox.to_polygon()),
        })
    }
}

/// Resolved bounds for every raster, plus the failures.
#[derive(Debug, Default)]
pub struct BoundsTable {
    resolved: BTreeMap<String, Bounds>,
    pub failures: Vec<CrawlError>,
}

impl BoundsTable {
    pub fn get(&self, full_path: &str) -> Option<&Bounds> {
        self.resolved.get(full_path)
    }

    pub fn resolved_count(&self) -> usize {
        self.resolved.len()
    }

    pub fn insert(&mut self, full_path: impl Into<String>, bounds: Bounds) {
        self.resolved.insert(full_path.into(), bounds);
    }
}

/// Worker count used when none is configured.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .min(MAX_DEFAULT_WORKERS)
}

/// Read bounds for every raster in `assets` on a pool of `workers` threads.
///
/// Vectors are ignored. If the pool cannot be built the reads run inline.
pub fn resolve_bounds(
    reader: &dyn BoundsReader,
    assets: &[DiscoveredAsset],
    workers: usize,
) -> BoundsTable {
    let rasters: Vec<&DiscoveredAsset> = assets
        .iter()
        .filter(|asset| asset.kind == AssetKind::Raster)
        .collect();
    if rasters.is_empty() {
        return BoundsTable::default();
    }

    let read_one = |asset: &&DiscoveredAsset| (asset.full_path.clone(), reader.read(asset));
    let results: Vec<(String, std::result::Result<Bounds, NoBounds>)> =
        match rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|idx| format!("bounds-worker-{idx}"))
            .build()
        {
            Ok(pool) => {
                debug!(workers, rasters = rasters.len(), "reading raster bounds in parallel");
                pool.install(|| rasters.par_iter().map(read_one).collect())
            }
            Err(err) => {
                warn!(error = %err, "bounds pool unavailable; reading sequentially");
                rasters.iter().map(read_one).collect()
            }
        };

    let mut table = BoundsTable::default();
    for (full_path, result) in results {
        match result {
            Ok(bounds) => table.insert(full_path, bounds),
            Err(NoBounds(message)) => {
                let err = CrawlError::BoundsUnavailable {
                    path: full_path,
                    message,
                };
                warn!(error = %err, "using default bbox");
                table.failures.push(err);
            }
        }
    }
    info!(
        resolved = table.resolved_count(),
        failed = table.failures.len(),
        "raster bounds resolved"
    );
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::listing::ObjectRecord;

    fn asset(path: &str) -> DiscoveredAsset {
        classify(&ObjectRecord::new(path), "", "").unwrap()
    }

    #[test]
    fn bbox_serializes_as_four_numbers() {
        let bbox = BBox::new(-1.0, -2.0, 3.0, 4.0);
        assert_eq!(serde_json::to_string(&bbox).unwrap(), "[-1.0,-2.0,3.0,4.0]");
        let back: BBox = serde_json::from_str("[-1,-2,3,4]").unwrap();
        assert_eq!(back, bbox);
    }

    #[test]
    fn union_is_componentwise_min_max() {
        let a = BBox::new(0.0, 0.0, 1.0, 1.0);
        let b = BBox::new(-1.0, 0.5, 0.5, 2.0);
        assert_eq!(a.union(&b), BBox::new(-1.0, 0.0, 1.0, 2.0));
        assert_eq!(BBox::union_all([&a, &b]), Some(a.union(&b)));
        assert_eq!(BBox::union_all(std::iter::empty()), None);
    }

    #[test]
    fn polygon_ring_is_closed() {
        let polygon = BBox::new(0.0, 1.0, 2.0, 3.0).to_polygon();
        let ring = &polygon.coordinates[0];
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.first(), ring.last());
    }

    #[test]
    fn manifest_reader_prefers_full_path_then_name() {
        let reader = BoundsManifestReader::from_entries([
            ("a/b/dem.tif".to_string(), BBox::new(0.0, 0.0, 1.0, 1.0)),
            ("dem".to_string(), BBox::new(5.0, 5.0, 6.0, 6.0)),
        ]);
        let exact = reader.read(&asset("a/b/dem.tif")).unwrap();
        assert_eq!(exact.bbox, BBox::new(0.0, 0.0, 1.0, 1.0));
        let by_name = reader.read(&asset("c/d/dem.tif")).unwrap();
        assert_eq!(by_name.bbox, BBox::new(5.0, 5.0, 6.0, 6.0));
        assert!(reader.read(&asset("c/d/other.tif")).is_err());
    }

    #[test]
    fn inverted_bbox_is_no_bounds() {
        let reader = BoundsManifestReader::from_entries([(
            "bad".to_string(),
            BBox::new(10.0, 0.0, -10.0, 1.0),
        )]);
        assert!(reader.read(&asset("x/y/bad.tif")).is_err());
    }

    #[test]
    fn resolve_skips_vectors_and_records_failures() {
        let assets = vec![
            asset("a/b/known.tif"),
            asset("a/b/unknown.tif"),
            asset("a/b/roads.geojson"),
        ];
        let reader = BoundsManifestReader::from_entries([(
            "known".to_string(),
            BBox::new(0.0, 0.0, 1.0, 1.0),
        )]);
        let table = resolve_bounds(&reader, &assets, 2);
        assert!(table.get("a/b/known.tif").is_some());
        assert!(table.get("a/b/unknown.tif").is_none());
        assert!(table.get("a/b/roads.geojson").is_none());
        assert_eq!(table.failures.len(), 1);
        assert!(matches!(
            table.failures[0],
            CrawlError::BoundsUnavailable { .. }
        ));
    }

    #[test]
    fn default_workers_is_capped() {
        let workers = default_workers();
        assert!((1..=MAX_DEFAULT_WORKERS).contains(&workers));
    }
}
