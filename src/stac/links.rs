//! Document locations and href resolution.
//!
//! Every document has a [`DocPath`] relative to the catalog root. Hrefs
//! between documents are either absolute under a configured root URL or
//! relative to the referencing document's directory.

use std::fmt;

pub const CATALOG_FILE: &str = "catalog.json";
pub const COLLECTION_FILE: &str = "collection.json";

/// Slash-separated path of a document below the catalog root.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DocPath(String);

impl DocPath {
    pub fn catalog() -> Self {
        DocPath(CATALOG_FILE.to_string())
    }

    pub fn collection(node_path: &str) -> Self {
        DocPath::join(node_path, COLLECTION_FILE)
    }

    pub fn item(item_dir: &str, id: &str) -> Self {
        DocPath::join(item_dir, &format!("{id}.json"))
    }

    /// Arbitrary file under the root, such as the copied metadata file.
    pub fn file(path: &str) -> Self {
        DocPath(path.trim_matches('/').to_string())
    }

    fn join(dir: &str, file: &str) -> Self {
        let dir = dir.trim_matches('/');
        if dir.is_empty() {
            DocPath(file.to_string())
        } else {
            DocPath(format!("{dir}/{file}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn directory(&self) -> Vec<&str> {
        let mut parts: Vec<&str> = self.0.split('/').collect();
        parts.pop();
        parts
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Produces hrefs between documents.
#[derive(Clone, Debug, Default)]
pub struct Linker {
    root_url: Option<String>,
}

impl Linker {
    pub fn new(root_url: Option<&str>) -> Self {
        Linker {
            root_url: root_url
                .map(|url| url.trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty()),
        }
    }

    pub fn is_absolute(&self) -> bool {
        self.root_url.is_some()
    }

    /// Href for `to` as written inside the document at `from`.
    pub fn href(&self, from: &DocPath, to: &DocPath) -> String {
        match &self.root_url {
            Some(root) => format!("{root}/{to}"),
            None => relative_href(from, to),
        }
    }
}

fn relative_href(from: &DocPath, to: &DocPath) -> String {
    let from_dir = from.directory();
    let to_parts: Vec<&str> = to.as_str().split('/').collect();
    let (to_dir, to_file) = to_parts.split_at(to_parts.len() - 1);

    let common = from_dir
        .iter()
        .zip(to_dir.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let ups = from_dir.len() - common;

    let mut segments: Vec<&str> = Vec::new();
    if ups == 0 {
        segments.push(".");
    } else {
        segments.extend(std::iter::repeat_n("..", ups));
    }
    segments.extend(&to_dir[common..]);
    segments.extend(to_file);
    segments.join("/")
}
