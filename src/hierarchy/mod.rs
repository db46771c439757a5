//! Builds the collection tree from classified assets.
//!
//! Assets arrive in listing order. The builder drops repeated
//! `(kind, name, full_path)` keys, defers shallow assets to the root catalog,
//! and hangs every other asset on the node for `path_segments[..len - 1]`.
//! The asset's own leaf directory never becomes a collection.

pub mod node;

pub use node::{DirectoryNode, NodeRef};

use crate::classify::{AssetKey, DiscoveredAsset};
use crate::error::CrawlError;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

/// Minimum number of path segments before an asset gets a collection.
pub const COLLECTION_DEPTH: usize = 2;

/// Output of [`build_hierarchy`].
#[derive(Debug, Default)]
pub struct Hierarchy {
    /// Top-level nodes keyed by segment name.
    pub roots: BTreeMap<String, DirectoryNode>,
    /// Deduplicated assets in listing order.
    pub assets: Vec<DiscoveredAsset>,
    /// Assets shallower than [`COLLECTION_DEPTH`], linked from the root catalog.
    pub root_assets: Vec<DiscoveredAsset>,
    pub duplicates_dropped: usize,
    pub violations: Vec<CrawlError>,
}

/// Path of the node an asset attaches to, or `None` when it belongs to the root.
///
/// For `[p1, .., pn]` with `n >= 2` this is `p1/../p(n-1)`.
pub fn attachment_node_path(path_segments: &[String]) -> Option<String> {
    if path_segments.len() < COLLECTION_DEPTH {
        return None;
    }
    Some(path_segments[..path_segments.len() - 1].join("/"))
}

/// Deduplicate `assets` and assemble the directory tree.
pub fn build_hierarchy(assets: impl IntoIterator<Item = DiscoveredAsset>) -> Hierarchy {
    let mut hierarchy = Hierarchy::default();
    let mut seen: HashSet<AssetKey> = HashSet::new();

    for asset in assets {
        if !seen.insert(asset.key()) {
            debug!(name = %asset.name, path = %asset.full_path, "skipping duplicate asset");
            hierarchy.duplicates_dropped += 1;
            continue;
        }
        hierarchy.assets.push(asset);
    }

    for asset in &hierarchy.assets {
        let Some(node_path) = attachment_node_path(&asset.path_segments) else {
            debug!(
                name = %asset.name,
                depth = asset.path_segments.len(),
                "asset too shallow for a collection; linking from root catalog"
            );
            hierarchy.root_assets.push(asset.clone());
            continue;
        };

        let parent_dirs: Vec<&str> = asset.path_segments[..asset.path_segments.len() - 1]
            .iter()
            .map(String::as_str)
            .collect();
        ensure_path(&mut hierarchy.roots, &parent_dirs);

        match node_mut(&mut hierarchy.roots, &parent_dirs) {
            Some(node) => {
                debug!(name = %asset.name, collection = %node.path, "attached asset");
                node.items.push(asset.clone());
            }
            None => {
                let violation = CrawlError::BuilderInvariantViolation {
                    node_path,
                    asset_path: asset.full_path.clone(),
                };
                warn!(error = %violation, "skipping asset");
                hierarchy.violations.push(violation);
            }
        }
    }

    info!(
        assets = hierarchy.assets.len(),
        duplicates = hierarchy.duplicates_dropped,
        collections = hierarchy.collection_count(),
        root_items = hierarchy.root_assets.len(),
        "hierarchy built"
    );
    hierarchy
}

/// Create any missing node along `segments`, starting at the roots.
fn ensure_path(roots: &mut BTreeMap<String, DirectoryNode>, segments: &[&str]) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };
    let mut path = (*first).to_string();
    let mut current = roots
        .entry((*first).to_string())
        .or_insert_with(|| DirectoryNode::new(*first, path.clone()));
    for segment in rest {
        path.push('/');
        path.push_str(segment);
        current = current
            .children
            .entry((*segment).to_string())
            .or_insert_with(|| DirectoryNode::new(*segment, path.clone()));
    }
}

fn node_mut<'a>(
    roots: &'a mut BTreeMap<String, DirectoryNode>,
    segments: &[&str],
) -> Option<&'a mut DirectoryNode> {
    let (first, rest) = segments.split_first()?;
    roots.get_mut(*first)?.descendant_mut(rest)
}

impl Hierarchy {
    /// Look up a node by its slash-joined path.
    pub fn node(&self, path: &str) -> Option<&DirectoryNode> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let (first, rest) = segments.split_first()?;
        self.roots.get(*first)?.descendant(rest)
    }

    /// Every node in pre-order, each paired with its parent.
    pub fn collections(&self) -> Vec<NodeRef<'_>> {
        let mut out = Vec::new();
        for root in self.roots.values() {
            root.walk(None, &mut out);
        }
        out
    }

    pub fn collection_count(&self) -> usize {
        self.collections().len()
    }

    /// Node path owning `asset`, if it was attached to a collection.
    pub fn owner_of(&self, asset: &DiscoveredAsset) -> Option<&DirectoryNode> {
        let path = attachment_node_path(&asset.path_segments)?;
        self.node(&path)
    }
}
