//! Renders the hierarchy into STAC items, collections, and the root catalog.
//!
//! Rendering is pure given its inputs: the config, the resolved bounds, the
//! metadata store, and one discovery timestamp shared by the whole run. Every
//! document is returned with its [`DocPath`] so the caller decides where and
//! whether to write it.

use super::links::{DocPath, Linker};
use super::model::{
    Asset, CLASSIFICATION_EXTENSION, CONFORMS_TO, Catalog, CatalogType, Collection, Extent,
    FILE_EXTENSION, Item, ItemAssetDefinition, ItemProperties, Link, MEDIA_COG, MEDIA_GEOJSON,
    MEDIA_GEOTIFF, MEDIA_JSON, Provider, RASTER_EXTENSION, Rel,
};
use super::title_case;
use crate::bounds::{BBox, BoundsTable};
use crate::classify::{AssetKind, DiscoveredAsset};
use crate::config::CrawlConfig;
use crate::error::CrawlError;
use crate::hierarchy::{DirectoryNode, Hierarchy};
use crate::summary::SUMMARY_FILE;
use crate::writer::METADATA_COPY_PATH;
use crate::metadata::{LayerMetadata, LayerMetadataStore};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

/// Asset fields copied from the `data` asset onto the `cog` asset.
const COG_MIRRORED_FIELDS: &[&str] = &[
    "raster:bands",
    "swmh:source_name",
    "swmh:source_url",
    "gsd",
    "swmh:discrete",
    "swmh:viz_type",
];

const HOST_ROLES: &[&str] = &["producer", "processor", "host"];

/// A rendered document, where it belongs, and what went wrong rendering it.
#[derive(Debug)]
pub struct Rendered<T> {
    pub path: DocPath,
    pub document: T,
    pub incidents: Vec<CrawlError>,
}

pub struct Synthesizer<'a> {
    config: &'a CrawlConfig,
    bounds: &'a BoundsTable,
    metadata: &'a dyn LayerMetadataStore,
    linker: Linker,
    discovered_at: DateTime<Utc>,
    asset_base_url: String,
    item_ids: BTreeMap<String, String>,
    metadata_asset: Option<DocPath>,
}

impl<'a> Synthesizer<'a> {
    pub fn new(
        config: &'a CrawlConfig,
        bounds: &'a BoundsTable,
        metadata: &'a dyn LayerMetadataStore,
        discovered_at: DateTime<Utc>,
    ) -> Self {
        Synthesizer {
            config,
            bounds,
            metadata,
            linker: Linker::new(config.catalog_root_url.as_deref()),
            discovered_at,
            asset_base_url: config.asset_base_url(),
            item_ids: BTreeMap::new(),
            metadata_asset: None,
        }
    }

    /// Reference a copied layer metadata file from the catalog's `assets`.
    pub fn with_metadata_asset(mut self, path: DocPath) -> Self {
        self.metadata_asset = Some(path);
        self
    }

    /// Fix item ids for every asset in `hierarchy`, disambiguating names that
    /// would share a document.
    ///
    /// The first asset keeps its bare name. A later asset with the same name in
    /// the same item directory, or one whose name would land on a collection,
    /// the catalog, the crawl summary, or the metadata copy, gets `-{kind}`
    /// appended, then a counter.
    pub fn assign_ids(&mut self, hierarchy: &Hierarchy) {
        let mut taken = reserved_documents(hierarchy);
        for asset in &hierarchy.assets {
            let dir = asset.item_dir();
            let mut id = asset.name.clone();
            if taken.contains(&(dir.clone(), id.clone())) {
                id = format!("{}-{}", asset.name, asset.kind.as_str());
                let mut counter = 2;
                while taken.contains(&(dir.clone(), id.clone())) {
                    id = format!("{}-{}-{counter}", asset.name, asset.kind.as_str());
                    counter += 1;
                }
                warn!(
                    path = %asset.full_path,
                    id = %id,
                    "item id already used in this directory; disambiguating"
                );
            }
            taken.insert((dir, id.clone()));
            self.item_ids.insert(asset.full_path.clone(), id);
        }
    }

    pub fn item_id(&self, asset: &DiscoveredAsset) -> String {
        self.item_ids
            .get(&asset.full_path)
            .cloned()
            .unwrap_or_else(|| asset.name.clone())
    }

    pub fn item_path(&self, asset: &DiscoveredAsset) -> DocPath {
        DocPath::item(&asset.item_dir(), &self.item_id(asset))
    }

    fn timestamp(&self, at: Option<DateTime<Utc>>) -> String {
        at.unwrap_or(self.discovered_at)
            .to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    fn host_provider(&self, roles: &[&str]) -> Provider {
        Provider::new(
            self.config.provider_name.clone(),
            roles,
            Some(self.asset_base_url.clone()),
        )
    }

    /// Render the item for `asset`, owned by `owner` or by the root catalog.
    pub fn render_item(
        &self,
        asset: &DiscoveredAsset,
        owner: Option<&DirectoryNode>,
    ) -> Rendered<Item> {
        let id = self.item_id(asset);
        let path = DocPath::item(&asset.item_dir(), &id);
        let catalog = DocPath::catalog();
        let mut incidents = Vec::new();

        let layer = self.metadata.lookup(&asset.name);
        if layer.is_none() && !self.metadata.is_empty() {
            let miss = CrawlError::MetadataMiss {
                name: asset.name.clone(),
            };
            debug!(error = %miss, "using derived properties");
            incidents.push(miss);
        }

        let mut properties = ItemProperties {
            title: title_case(&asset.name),
            description: asset.name.clone(),
            datetime: self.timestamp(None),
            created: self.timestamp(asset.created_at),
            updated: self.timestamp(asset.updated_at.or(asset.created_at)),
            providers: vec![self.host_provider(HOST_ROLES)],
            fields: BTreeMap::new(),
        };
        if let Some(layer) = layer {
            self.apply_layer_properties(&mut properties, asset, layer);
        }

        let (bbox, geometry) = match asset.kind {
            AssetKind::Vector => (None, None),
            AssetKind::Raster => match self.bounds.get(&asset.full_path) {
                Some(bounds) => (Some(bounds.bbox), bounds.footprint.clone()),
                None => (Some(self.config.default_bbox), None),
            },
        };

        let mut assets = BTreeMap::new();
        let data = self.data_asset(asset, &properties, layer);
        if asset.kind == AssetKind::Raster {
            assets.insert("cog".to_string(), cog_asset(asset, &data));
        }
        assets.insert("data".to_string(), data);

        let mut links = vec![
            Link::json(Rel::SelfLink, self.linker.href(&path, &path)),
        ];
        let collection = match owner {
            Some(node) => {
                let owner_path = DocPath::collection(&node.path);
                links.push(Link::json(Rel::Parent, self.linker.href(&path, &owner_path)));
                links.push(Link::json(Rel::Root, self.linker.href(&path, &catalog)));
                links.push(Link::json(
                    Rel::Collection,
                    self.linker.href(&path, &owner_path),
                ));
                Some(node.name.clone())
            }
            None => {
                links.push(Link::json(Rel::Parent, self.linker.href(&path, &catalog)));
                links.push(Link::json(Rel::Root, self.linker.href(&path, &catalog)));
                None
            }
        };

        debug!(id = %id, path = %path, kind = asset.kind.as_str(), "rendered item");
        Rendered {
            document: Item {
                kind: "Feature".to_string(),
                stac_version: self.config.stac_version.clone(),
                stac_extensions: extensions_used(&assets),
                id,
                collection,
                properties,
                geometry,
                bbox,
                assets,
                links,
            },
            path,
            incidents,
        }
    }

    fn apply_layer_properties(
        &self,
        properties: &mut ItemProperties,
        asset: &DiscoveredAsset,
        layer: &LayerMetadata,
    ) {
        if let Some(name) = layer.display_name() {
            properties.title = name.to_string();
        }
        properties.description = layer.description.clone().unwrap_or_else(|| {
            format!("{} dataset: {}", title_case(asset.kind.as_str()), asset.name)
        });

        let fields = &mut properties.fields;
        insert_some(fields, "gsd", layer.scale.clone().filter(|v| !v.is_null()));
        fields.insert(
            "platform".to_string(),
            json!(
                layer
                    .source_name
                    .clone()
                    .unwrap_or_else(|| self.config.provider_name.clone())
            ),
        );
        insert_some(fields, "swmh:units", layer.units.clone().map(Value::from));
        insert_some(fields, "swmh:discrete", layer.discrete.map(Value::from));
        insert_some(fields, "swmh:viz_type", layer.viz_type.clone().map(Value::from));
        insert_some(
            fields,
            "swmh:default_reduction",
            layer.default_reduction.clone().map(Value::from),
        );
        insert_some(fields, "swmh:safe_name", layer.safe_name.clone().map(Value::from));
        insert_some(fields, "swmh:docs_link", layer.docs_link.clone().map(Value::from));
        insert_some(fields, "swmh:source_url", layer.source_url.clone().map(Value::from));
        insert_some(
            fields,
            "swmh:vis_params",
            layer.vis_params().cloned().map(Value::Object),
        );
        if layer.is_categorical() {
            fields.insert("swmh:labels".to_string(), json!(layer.labels));
            fields.insert("swmh:values".to_string(), Value::Array(layer.values.clone()));
        }

        if let Some(source) = &layer.source_name {
            properties.providers = vec![
                Provider::new(
                    source.clone(),
                    &["producer"],
                    Some(
                        layer
                            .source_url
                            .clone()
                            .unwrap_or_else(|| self.asset_base_url.clone()),
                    ),
                ),
                self.host_provider(&["processor", "host"]),
            ];
        }
    }

    fn data_asset(
        &self,
        asset: &DiscoveredAsset,
        properties: &ItemProperties,
        layer: Option<&LayerMetadata>,
    ) -> Asset {
        let mut data = match asset.kind {
            AssetKind::Vector => {
                let mut data = Asset::new(asset.url.clone(), MEDIA_GEOJSON, &["data"]);
                data.title = Some("GeoJSON data".to_string());
                data.description = Some("Vector data in GeoJSON format".to_string());
                data
            }
            AssetKind::Raster => {
                let mut data = Asset::new(asset.url.clone(), MEDIA_GEOTIFF, &["data"]);
                data.title = Some(properties.title.clone());
                data.description = Some(properties.description.clone());
                data
            }
        };
        insert_some(&mut data.fields, "file:size", asset.size_bytes.map(Value::from));
        insert_some(
            &mut data.fields,
            "file:checksum",
            asset.checksum.clone().map(Value::from),
        );

        if let (AssetKind::Raster, Some(layer)) = (asset.kind, layer) {
            data.fields.insert(
                "raster:bands".to_string(),
                Value::Array(vec![raster_band(asset, layer)]),
            );
            let fields = &mut data.fields;
            insert_some(fields, "swmh:source_name", layer.source_name.clone().map(Value::from));
            insert_some(fields, "swmh:source_url", layer.source_url.clone().map(Value::from));
            insert_some(fields, "gsd", layer.scale.clone().filter(|v| !v.is_null()));
            insert_some(fields, "swmh:discrete", layer.discrete.map(Value::from));
            insert_some(fields, "swmh:viz_type", layer.viz_type.clone().map(Value::from));
        }
        data
    }

    /// Spatial extent of `node`: the union of its direct rasters' resolved bboxes.
    pub fn collection_extent(&self, node: &DirectoryNode) -> BBox {
        BBox::union_all(
            node.items
                .iter()
                .filter(|item| item.kind == AssetKind::Raster)
                .filter_map(|item| self.bounds.get(&item.full_path))
                .map(|bounds| &bounds.bbox),
        )
        .unwrap_or(self.config.default_bbox)
    }

    /// Render the collection for `node`, whose parent is `parent` or the root catalog.
    pub fn render_collection(
        &self,
        node: &DirectoryNode,
        parent: Option<&DirectoryNode>,
    ) -> Rendered<Collection> {
        let path = DocPath::collection(&node.path);
        let catalog = DocPath::catalog();
        let parent_path = parent
            .map(|p| DocPath::collection(&p.path))
            .unwrap_or_else(DocPath::catalog);

        let mut links = vec![
            Link::json(Rel::SelfLink, self.linker.href(&path, &path)),
            Link::json(Rel::Parent, self.linker.href(&path, &parent_path)),
            Link::json(Rel::Root, self.linker.href(&path, &catalog)),
        ];
        for child in node.children.values() {
            let child_path = DocPath::collection(&child.path);
            links.push(
                Link::json(Rel::Child, self.linker.href(&path, &child_path))
                    .titled(title_case(&child.name)),
            );
        }
        for item in &node.items {
            links.push(
                Link::json(Rel::Item, self.linker.href(&path, &self.item_path(item)))
                    .titled(title_case(&item.name)),
            );
        }

        let extent = self.collection_extent(node);
        debug!(
            collection = %node.path,
            items = node.items.len(),
            children = node.children.len(),
            "rendered collection"
        );
        Rendered {
            document: Collection {
                kind: "Collection".to_string(),
                stac_version: self.config.stac_version.clone(),
                id: node.name.clone(),
                title: title_case(&node.name),
                description: format!("Collection for {}", node.name),
                keywords: vec![node.name.clone()],
                license: self.config.license.clone(),
                extent: Extent::open(extent),
                providers: vec![self.host_provider(HOST_ROLES)],
                links,
                item_assets: item_asset_definitions(&node.items),
            },
            path,
            incidents: Vec::new(),
        }
    }

    /// Render the root catalog over the top-level nodes and the deferred assets.
    pub fn render_catalog(
        &self,
        roots: &BTreeMap<String, DirectoryNode>,
        root_assets: &[DiscoveredAsset],
    ) -> Rendered<Catalog> {
        let path = DocPath::catalog();
        let mut links = vec![
            Link::json(Rel::SelfLink, self.linker.href(&path, &path))
                .titled(self.config.catalog_title.clone()),
            Link::json(Rel::Root, self.linker.href(&path, &path)),
        ];
        for node in roots.values() {
            links.push(
                Link::json(
                    Rel::Child,
                    self.linker.href(&path, &DocPath::collection(&node.path)),
                )
                .titled(title_case(&node.name)),
            );
        }
        for asset in root_assets {
            links.push(
                Link::json(Rel::Item, self.linker.href(&path, &self.item_path(asset)))
                    .titled(title_case(&asset.name)),
            );
        }

        let mut assets = BTreeMap::new();
        if let Some(metadata_path) = &self.metadata_asset {
            let mut layer_metadata = Asset::new(
                self.linker.href(&path, metadata_path),
                MEDIA_JSON,
                &["metadata"],
            );
            layer_metadata.title = Some("Layer Metadata".to_string());
            layer_metadata.description = Some(
                "Complete metadata for all data layers including visualization parameters, \
                 units, and source information"
                    .to_string(),
            );
            assets.insert("layer_metadata".to_string(), layer_metadata);
        }

        let now = self.timestamp(None);
        Rendered {
            document: Catalog {
                kind: "Catalog".to_string(),
                catalog_type: if self.linker.is_absolute() {
                    CatalogType::AbsolutePublished
                } else {
                    CatalogType::SelfContained
                },
                stac_version: self.config.stac_version.clone(),
                id: self.config.catalog_id.clone(),
                title: self.config.catalog_title.clone(),
                description: self.config.catalog_description.clone(),
                created: now.clone(),
                updated: now,
                keywords: self.config.keywords.clone(),
                providers: vec![self.host_provider(HOST_ROLES)],
                assets,
                links,
                conforms_to: CONFORMS_TO.iter().map(|s| s.to_string()).collect(),
            },
            path,
            incidents: Vec::new(),
        }
    }
}

/// `(directory, stem)` of every non-item document the crawl writes.
fn reserved_documents(hierarchy: &Hierarchy) -> HashSet<(String, String)> {
    let fixed = [
        DocPath::catalog(),
        DocPath::file(SUMMARY_FILE),
        DocPath::file(METADATA_COPY_PATH),
    ];
    let collections = hierarchy
        .collections()
        .into_iter()
        .map(|node_ref| DocPath::collection(&node_ref.node.path));
    fixed
        .into_iter()
        .chain(collections)
        .map(|doc| {
            let (dir, file) = doc.as_str().rsplit_once('/').unwrap_or(("", doc.as_str()));
            let stem = file.strip_suffix(".json").unwrap_or(file);
            (dir.to_string(), stem.to_string())
        })
        .collect()
}

fn insert_some(fields: &mut BTreeMap<String, Value>, key: &str, value: Option<Value>) {
    if let Some(value) = value {
        fields.insert(key.to_string(), value);
    }
}

fn raster_band(asset: &DiscoveredAsset, layer: &LayerMetadata) -> Value {
    let mut band = Map::new();
    band.insert(
        "name".to_string(),
        json!(layer.safe_name.clone().unwrap_or_else(|| asset.name.clone())),
    );
    band.insert(
        "description".to_string(),
        json!(
            layer
                .description
                .clone()
                .unwrap_or_else(|| "Raster band".to_string())
        ),
    );
    band.insert("data_type".to_string(), json!("float32"));
    if let Some(units) = &layer.units {
        band.insert("unit".to_string(), json!(units));
    }
    if let Some((min, max)) = layer.value_range() {
        band.insert(
            "statistics".to_string(),
            json!({"minimum": min, "maximum": max}),
        );
    }
    if layer.is_categorical() {
        let classes: Vec<Value> = layer
            .classes()
            .into_iter()
            .map(|(value, label)| json!({"value": value, "description": label}))
            .collect();
        band.insert("classification:classes".to_string(), Value::Array(classes));
    }
    Value::Object(band)
}

fn cog_asset(asset: &DiscoveredAsset, data: &Asset) -> Asset {
    let mut cog = Asset::new(asset.url.clone(), MEDIA_COG, &["data", "overview"]);
    cog.title = Some("Cloud Optimized GeoTIFF".to_string());
    cog.description = Some("Cloud Optimized GeoTIFF for web access".to_string());
    for key in COG_MIRRORED_FIELDS {
        if let Some(value) = data.fields.get(*key) {
            cog.fields.insert((*key).to_string(), value.clone());
        }
    }
    cog
}

fn extensions_used(assets: &BTreeMap<String, Asset>) -> Vec<String> {
    let has = |key: &str| assets.values().any(|asset| asset.fields.contains_key(key));
    let has_classes = assets.values().any(|asset| {
        asset
            .fields
            .get("raster:bands")
            .and_then(Value::as_array)
            .is_some_and(|bands| {
                bands
                    .iter()
                    .any(|band| band.get("classification:classes").is_some())
            })
    });

    let mut extensions = Vec::new();
    if has("file:size") || has("file:checksum") {
        extensions.push(FILE_EXTENSION.to_string());
    }
    if has("raster:bands") {
        extensions.push(RASTER_EXTENSION.to_string());
    }
    if has_classes {
        extensions.push(CLASSIFICATION_EXTENSION.to_string());
    }
    extensions
}

/// `item_assets` for a collection. Rasters win when kinds are mixed.
fn item_asset_definitions(items: &[DiscoveredAsset]) -> BTreeMap<String, ItemAssetDefinition> {
    let definition = |media_type: &str, title: &str, roles: &[&str]| ItemAssetDefinition {
        media_type: media_type.to_string(),
        title: title.to_string(),
        roles: roles.iter().map(|r| r.to_string()).collect(),
    };

    let mut defs = BTreeMap::new();
    if items.iter().any(|item| item.kind == AssetKind::Raster) {
        defs.insert(
            "data".to_string(),
            definition(MEDIA_GEOTIFF, "GeoTIFF data", &["data"]),
        );
        defs.insert(
            "cog".to_string(),
            definition(MEDIA_COG, "Cloud Optimized GeoTIFF", &["data", "overview"]),
        );
    } else if items.iter().any(|item| item.kind == AssetKind::Vector) {
        defs.insert(
            "data".to_string(),
            definition(MEDIA_GEOJSON, "GeoJSON data", &["data"]),
        );
    }
    defs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::Bounds;
    use crate::classify::classify;
    use crate::hierarchy::build_hierarchy;
    use crate::listing::ObjectRecord;
    use crate::metadata::LayerMetadataFile;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn config() -> CrawlConfig {
        CrawlConfig {
            bucket: "swhm_data".into(),
            prefix: String::new(),
            ..CrawlConfig::default()
        }
    }

    fn asset(path: &str) -> DiscoveredAsset {
        let mut record = ObjectRecord::new(path);
        record.size = Some(42);
        classify(&record, "", "https://storage.googleapis.com/swhm_data").unwrap()
    }

    fn bounds_for(entries: &[(&str, BBox)]) -> BoundsTable {
        let mut table = BoundsTable::default();
        for (path, bbox) in entries {
            table.insert(
                *path,
                Bounds {
                    bbox: *bbox,
                    footprint: Some(bbox.to_polygon()),
                },
            );
        }
        table
    }

    #[test]
    fn vector_item_has_null_spatial_fields_and_collection_links() {
        let config = config();
        let bounds = BoundsTable::default();
        let store = LayerMetadataFile::default();
        let synth = Synthesizer::new(&config, &bounds, &store, fixed_time());
        let hierarchy = build_hierarchy(vec![asset("a/b/x_roads.geojson")]);
        let item_asset = &hierarchy.assets[0];

        let rendered = synth.render_item(item_asset, hierarchy.owner_of(item_asset));
        let item = rendered.document;
        assert_eq!(rendered.path.as_str(), "a/b/x_roads.json");
        assert_eq!(item.id, "x_roads");
        assert_eq!(item.properties.title, "X Roads");
        assert_eq!(item.properties.datetime, "2024-05-01T12:00:00Z");
        assert!(item.bbox.is_none());
        assert!(item.geometry.is_none());
        assert_eq!(item.collection.as_deref(), Some("a"));
        assert_eq!(item.assets["data"].media_type, MEDIA_GEOJSON);
        assert!(!item.assets.contains_key("cog"));

        let rels: Vec<(&str, &str)> = item
            .links
            .iter()
            .map(|l| (l.rel.as_str(), l.href.as_str()))
            .collect();
        assert_eq!(
            rels,
            vec![
                ("self", "./x_roads.json"),
                ("parent", "../collection.json"),
                ("root", "../../catalog.json"),
                ("collection", "../collection.json"),
            ]
        );
        assert!(rendered.incidents.is_empty());
    }

    #[test]
    fn raster_without_bounds_uses_default_bbox() {
        let config = config();
        let bounds = BoundsTable::default();
        let store = LayerMetadataFile::default();
        let synth = Synthesizer::new(&config, &bounds, &store, fixed_time());
        let item = synth.render_item(&asset("a/b/y.tif"), None).document;
        assert_eq!(item.bbox, Some(config.default_bbox));
        assert!(item.geometry.is_none());
        assert!(item.collection.is_none());
        assert_eq!(item.assets["cog"].media_type, MEDIA_COG);
    }

    #[test]
    fn metadata_enriches_properties_and_bands() {
        let config = config();
        let bounds = bounds_for(&[("a/b/land_cover.tif", BBox::new(0.0, 0.0, 1.0, 1.0))]);
        let store: LayerMetadataFile = serde_json::from_value(json!({
            "rasters": {
                "Land Cover": {
                    "safe_name": "land_cover",
                    "description": "Land cover classes",
                    "sourceName": "NLCD",
                    "sourceUrl": "https://nlcd.example",
                    "units": "class",
                    "discrete": true,
                    "scale": 30,
                    "labels": ["Water", "Forest"],
                    "values": [11, 41],
                    "layer": {"name": "Land Cover 2020", "visParams": {"min": 11, "max": 41}}
                }
            }
        }))
        .unwrap();
        let synth = Synthesizer::new(&config, &bounds, &store, fixed_time());
        let item = synth.render_item(&asset("a/b/land_cover.tif"), None).document;

        assert_eq!(item.properties.title, "Land Cover 2020");
        assert_eq!(item.properties.description, "Land cover classes");
        assert_eq!(item.properties.fields["platform"], "NLCD");
        assert_eq!(item.properties.fields["gsd"], 30);
        assert_eq!(item.properties.providers.len(), 2);
        assert_eq!(item.properties.providers[0].roles, vec!["producer"]);
        assert_eq!(item.bbox, Some(BBox::new(0.0, 0.0, 1.0, 1.0)));
        assert!(item.geometry.is_some());

        let band = &item.assets["data"].fields["raster:bands"][0];
        assert_eq!(band["unit"], "class");
        assert_eq!(band["statistics"]["maximum"], 41);
        assert_eq!(band["classification:classes"][1]["value"], 41);
        assert_eq!(
            item.assets["cog"].fields["raster:bands"],
            item.assets["data"].fields["raster:bands"]
        );
        assert!(item.stac_extensions.contains(&RASTER_EXTENSION.to_string()));
        assert!(item.stac_extensions.contains(&CLASSIFICATION_EXTENSION.to_string()));
        assert!(item.stac_extensions.contains(&FILE_EXTENSION.to_string()));
    }

    #[test]
    fn metadata_miss_is_recorded_only_when_store_has_entries() {
        let config = config();
        let bounds = BoundsTable::default();
        let store: LayerMetadataFile =
            serde_json::from_value(json!({"rasters": {"Slope": {}}})).unwrap();
        let synth = Synthesizer::new(&config, &bounds, &store, fixed_time());
        let rendered = synth.render_item(&asset("a/b/aspect.tif"), None);
        assert_eq!(rendered.incidents.len(), 1);
        assert!(matches!(
            rendered.incidents[0],
            CrawlError::MetadataMiss { .. }
        ));
    }

    #[test]
    fn collection_extent_unions_direct_rasters_only() {
        let config = config();
        let bounds = bounds_for(&[
            ("a/b/one.tif", BBox::new(0.0, 0.0, 1.0, 1.0)),
            ("a/c/two.tif", BBox::new(2.0, -1.0, 3.0, 0.5)),
            ("a/d/e/deep.tif", BBox::new(50.0, 50.0, 60.0, 60.0)),
        ]);
        let store = LayerMetadataFile::default();
        let synth = Synthesizer::new(&config, &bounds, &store, fixed_time());
        let hierarchy = build_hierarchy(vec![
            asset("a/b/one.tif"),
            asset("a/c/two.tif"),
            asset("a/b/roads.geojson"),
            asset("a/d/e/deep.tif"),
        ]);
        let node = hierarchy.node("a").unwrap();
        assert_eq!(synth.collection_extent(node), BBox::new(0.0, -1.0, 3.0, 1.0));

        let collection = synth.render_collection(node, None).document;
        let children: Vec<&str> = collection
            .links
            .iter()
            .filter(|l| l.rel == Rel::Child)
            .map(|l| l.href.as_str())
            .collect();
        assert_eq!(children, vec!["./d/collection.json"]);
        let items: Vec<&str> = collection
            .links
            .iter()
            .filter(|l| l.rel == Rel::Item)
            .map(|l| l.href.as_str())
            .collect();
        assert_eq!(items, vec!["./b/one.json", "./c/two.json", "./b/roads.json"]);
        assert!(collection.item_assets.contains_key("cog"));
    }

    #[test]
    fn empty_collection_falls_back_to_default_extent() {
        let config = config();
        let bounds = BoundsTable::default();
        let store = LayerMetadataFile::default();
        let synth = Synthesizer::new(&config, &bounds, &store, fixed_time());
        let hierarchy = build_hierarchy(vec![asset("a/b/c/x.geojson")]);
        let node = hierarchy.node("a").unwrap();
        assert!(node.items.is_empty());
        assert_eq!(synth.collection_extent(node), config.default_bbox);
    }

    #[test]
    fn duplicate_names_in_one_directory_get_distinct_ids() {
        let config = config();
        let bounds = BoundsTable::default();
        let store = LayerMetadataFile::default();
        let mut synth = Synthesizer::new(&config, &bounds, &store, fixed_time());
        let hierarchy =
            build_hierarchy(vec![asset("a/b/x.tif"), asset("a/b/x.geojson"), asset("a/c/x.tif")]);
        synth.assign_ids(&hierarchy);
        let assets = &hierarchy.assets;
        assert_eq!(synth.item_id(&assets[0]), "x");
        assert_eq!(synth.item_id(&assets[1]), "x-vector");
        assert_eq!(synth.item_id(&assets[2]), "x");
    }

    #[test]
    fn item_ids_avoid_collection_catalog_and_summary_documents() {
        let config = config();
        let bounds = BoundsTable::default();
        let store = LayerMetadataFile::default();
        let mut synth = Synthesizer::new(&config, &bounds, &store, fixed_time());
        let hierarchy = build_hierarchy(vec![
            asset("a/b/collection.tif"),
            asset("a/b/c/deep.tif"),
            asset("catalog.geojson"),
            asset("crawl_summary.tif"),
            asset("layer_metadata/layer_metadata.geojson"),
            asset("a/collection.tif"),
        ]);
        synth.assign_ids(&hierarchy);
        let path_of = |full_path: &str| {
            let asset = hierarchy
                .assets
                .iter()
                .find(|asset| asset.full_path == full_path)
                .unwrap();
            synth.item_path(asset).to_string()
        };

        assert_eq!(path_of("a/b/collection.tif"), "a/b/collection-raster.json");
        assert_eq!(path_of("a/b/c/deep.tif"), "a/b/c/deep.json");
        assert_eq!(path_of("catalog.geojson"), "catalog-vector.json");
        assert_eq!(path_of("crawl_summary.tif"), "crawl_summary-raster.json");
        assert_eq!(
            path_of("layer_metadata/layer_metadata.geojson"),
            "layer_metadata/layer_metadata-vector.json"
        );
        // Shallow asset whose item directory is node `a`.
        assert_eq!(path_of("a/collection.tif"), "a/collection-raster.json");
    }

    #[test]
    fn catalog_links_roots_and_deferred_items() {
        let config = CrawlConfig {
            catalog_root_url: Some("https://example.org/stac".into()),
            ..config()
        };
        let bounds = BoundsTable::default();
        let store = LayerMetadataFile::default();
        let synth = Synthesizer::new(&config, &bounds, &store, fixed_time())
            .with_metadata_asset(DocPath::file("layer_metadata/layer_metadata.json"));
        let hierarchy = build_hierarchy(vec![asset("top.tif"), asset("a/b/x.tif")]);
        let catalog = synth
            .render_catalog(&hierarchy.roots, &hierarchy.root_assets)
            .document;

        assert_eq!(catalog.catalog_type, CatalogType::AbsolutePublished);
        let hrefs: Vec<(&str, &str)> = catalog
            .links
            .iter()
            .map(|l| (l.rel.as_str(), l.href.as_str()))
            .collect();
        assert_eq!(
            hrefs,
            vec![
                ("self", "https://example.org/stac/catalog.json"),
                ("root", "https://example.org/stac/catalog.json"),
                ("child", "https://example.org/stac/a/collection.json"),
                ("item", "https://example.org/stac/top.json"),
            ]
        );
        assert_eq!(
            catalog.assets["layer_metadata"].href,
            "https://example.org/stac/layer_metadata/layer_metadata.json"
        );
    }
}
