//! Serializable STAC 1.0.0 documents.
//!
//! Only the fields the synthesizer emits are typed. Extension fields
//! (`file:*`, `raster:*`, `swmh:*`) ride in flattened maps so new ones do not
//! need a struct change.

use crate::bounds::{BBox, Polygon};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const MEDIA_JSON: &str = "application/json";
pub const MEDIA_GEOJSON: &str = "application/geo+json";
pub const MEDIA_GEOTIFF: &str = "image/tiff; application=geotiff";
pub const MEDIA_COG: &str = "image/tiff; application=geotiff; profile=cloud-optimized";

pub const FILE_EXTENSION: &str = "https://stac-extensions.github.io/file/v2.1.0/schema.json";
pub const RASTER_EXTENSION: &str = "https://stac-extensions.github.io/raster/v1.1.0/schema.json";
pub const CLASSIFICATION_EXTENSION: &str =
    "https://stac-extensions.github.io/classification/v1.0.0/schema.json";

pub const CONFORMS_TO: &[&str] = &[
    "https://api.stacspec.org/v1.0.0/core",
    "https://api.stacspec.org/v1.0.0/collections",
];

/// Link relation types the catalog uses.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rel {
    #[serde(rename = "self")]
    SelfLink,
    Parent,
    Root,
    Child,
    Item,
    Collection,
}

impl Rel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rel::SelfLink => "self",
            Rel::Parent => "parent",
            Rel::Root => "root",
            Rel::Child => "child",
            Rel::Item => "item",
            Rel::Collection => "collection",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub rel: Rel,
    pub href: String,
    #[serde(rename = "type")]
    pub media_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Link {
    pub fn json(rel: Rel, href: impl Into<String>) -> Self {
        Link {
            rel,
            href: href.into(),
            media_type: MEDIA_JSON.to_string(),
            title: None,
        }
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub name: String,
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Provider {
    pub fn new(name: impl Into<String>, roles: &[&str], url: Option<String>) -> Self {
        Provider {
            name: name.into(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            url,
        }
    }
}

/// One entry of an item's (or catalog's) `assets` map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub href: String,
    #[serde(rename = "type")]
    pub media_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub roles: Vec<String>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl Asset {
    pub fn new(href: impl Into<String>, media_type: &str, roles: &[&str]) -> Self {
        Asset {
            href: href.into(),
            media_type: media_type.to_string(),
            title: None,
            description: None,
            roles: roles.iter().map(|r| r.to_string()).collect(),
            fields: BTreeMap::new(),
        }
    }
}

/// `item_assets` entry on a collection: the shape its items' assets share.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemAssetDefinition {
    #[serde(rename = "type")]
    pub media_type: String,
    pub title: String,
    pub roles: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemProperties {
    pub title: String,
    pub description: String,
    pub datetime: String,
    pub created: String,
    pub updated: String,
    pub providers: Vec<Provider>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

/// A GeoJSON Feature describing one data object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "type")]
    pub kind: String,
    pub stac_version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stac_extensions: Vec<String>,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    pub properties: ItemProperties,
    pub geometry: Option<Polygon>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BBox>,
    pub assets: BTreeMap<String, Asset>,
    pub links: Vec<Link>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpatialExtent {
    pub bbox: Vec<BBox>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemporalExtent {
    pub interval: Vec<[Option<String>; 2]>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub spatial: SpatialExtent,
    pub temporal: TemporalExtent,
}

impl Extent {
    /// Spatial extent of `bbox` with an open temporal interval.
    pub fn open(bbox: BBox) -> Self {
        Extent {
            spatial: SpatialExtent { bbox: vec![bbox] },
            temporal: TemporalExtent {
                interval: vec![[None, None]],
            },
        }
    }
}

/// One directory node rendered as a STAC collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    #[serde(rename = "type")]
    pub kind: String,
    pub stac_version: String,
    pub id: String,
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub license: String,
    pub extent: Extent,
    pub providers: Vec<Provider>,
    pub links: Vec<Link>,
    pub item_assets: BTreeMap<String, ItemAssetDefinition>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CatalogType {
    AbsolutePublished,
    SelfContained,
}

/// The root catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(rename = "type")]
    pub kind: String,
    pub catalog_type: CatalogType,
    pub stac_version: String,
    pub id: String,
    pub title: String,
    pub description: String,
    pub created: String,
    pub updated: String,
    pub keywords: Vec<String>,
    pub providers: Vec<Provider>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub assets: BTreeMap<String, Asset>,
    pub links: Vec<Link>,
    #[serde(rename = "conformsTo")]
    pub conforms_to: Vec<String>,
}
