use crate::classify::DiscoveredAsset;
use serde::Serialize;
use std::collections::BTreeMap;

/// One directory that materializes as a collection.
///
/// Children are owned and keyed by segment name, so each path has exactly one
/// node and walking the tree for rendering cannot alias the structure that
/// built it.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DirectoryNode {
    pub name: String,
    pub path: String,
    pub children: BTreeMap<String, DirectoryNode>,
    pub items: Vec<DiscoveredAsset>,
}

/// A node paired with its parent collection (`None` for top-level nodes).
#[derive(Clone, Copy, Debug)]
pub struct NodeRef<'a> {
    pub node: &'a DirectoryNode,
    pub parent: Option<&'a DirectoryNode>,
}

impl DirectoryNode {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        DirectoryNode {
            name: name.into(),
            path: path.into(),
            children: BTreeMap::new(),
            items: Vec::new(),
        }
    }

    /// Follow `segments` downward from this node.
    pub fn descendant(&self, segments: &[&str]) -> Option<&DirectoryNode> {
        let mut current = self;
        for segment in segments {
            current = current.children.get(*segment)?;
        }
        Some(current)
    }

    pub(crate) fn descendant_mut(&mut self, segments: &[&str]) -> Option<&mut DirectoryNode> {
        let mut current = self;
        for segment in segments {
            current = current.children.get_mut(*segment)?;
        }
        Some(current)
    }

    /// Pre-order traversal of this node and everything below it.
    pub fn walk<'a>(&'a self, parent: Option<&'a DirectoryNode>, out: &mut Vec<NodeRef<'a>>) {
        out.push(NodeRef { node: self, parent });
        for child in self.children.values() {
            child.walk(Some(self), out);
        }
    }
}
