use bucket_stac::{
    DirectoryNode, DiscoveredAsset, ObjectRecord, attachment_node_path, build_hierarchy, classify,
};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn object_path() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(prop::sample::select(vec!["a", "b", "c"]), 0..5),
        prop::sample::select(vec!["x", "y"]),
        prop::sample::select(vec!["tif", "tiff", "geojson"]),
    )
        .prop_map(|(dirs, name, ext)| {
            let mut parts: Vec<String> = dirs.iter().map(|dir| dir.to_string()).collect();
            parts.push(format!("{name}.{ext}"));
            parts.join("/")
        })
}

fn assets_for(paths: &[String]) -> Vec<DiscoveredAsset> {
    paths
        .iter()
        .filter_map(|path| classify(&ObjectRecord::new(path.as_str()), "", "https://host/b"))
        .collect()
}

fn collect_nodes<'a>(roots: &'a BTreeMap<String, DirectoryNode>, out: &mut Vec<&'a DirectoryNode>) {
    for node in roots.values() {
        out.push(node);
        collect_nodes(&node.children, out);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn rebuilding_from_deduplicated_assets_changes_nothing(
        paths in prop::collection::vec(object_path(), 0..24)
    ) {
        let first = build_hierarchy(assets_for(&paths));
        let second = build_hierarchy(first.assets.clone());

        prop_assert_eq!(second.duplicates_dropped, 0);
        prop_assert_eq!(&second.assets, &first.assets);
        prop_assert_eq!(&second.roots, &first.roots);
        prop_assert_eq!(&second.root_assets, &first.root_assets);
    }

    #[test]
    fn every_asset_is_linked_exactly_once(
        paths in prop::collection::vec(object_path(), 0..24)
    ) {
        let hierarchy = build_hierarchy(assets_for(&paths));
        prop_assert!(hierarchy.violations.is_empty());

        let mut nodes = Vec::new();
        collect_nodes(&hierarchy.roots, &mut nodes);
        for asset in &hierarchy.assets {
            let in_nodes = nodes
                .iter()
                .flat_map(|node| node.items.iter())
                .filter(|item| item.key() == asset.key())
                .count();
            let at_root = hierarchy
                .root_assets
                .iter()
                .filter(|item| item.key() == asset.key())
                .count();
            prop_assert_eq!(in_nodes + at_root, 1, "{} linked {} times", asset.full_path, in_nodes + at_root);
        }
    }

    #[test]
    fn items_sit_one_level_above_their_directory(
        paths in prop::collection::vec(object_path(), 0..24)
    ) {
        let hierarchy = build_hierarchy(assets_for(&paths));
        let mut nodes = Vec::new();
        collect_nodes(&hierarchy.roots, &mut nodes);

        for node in &nodes {
            for item in &node.items {
                prop_assert!(item.path_segments.len() >= 2);
                prop_assert_eq!(attachment_node_path(&item.path_segments), Some(node.path.clone()));
            }
        }
        for asset in &hierarchy.root_assets {
            prop_assert!(asset.path_segments.len() < 2);
        }
    }
}

#[test]
fn duplicate_keys_collapse_and_are_counted() {
    let paths: Vec<String> = ["a/b/x.tif", "a/b/x.tif", "a/b/x.geojson", "a/c/x.tif"]
        .iter()
        .map(|p| p.to_string())
        .collect();
    let hierarchy = build_hierarchy(assets_for(&paths));
    assert_eq!(hierarchy.duplicates_dropped, 1);
    assert_eq!(hierarchy.assets.len(), 3);
    assert_eq!(hierarchy.node("a").map(|node| node.items.len()), Some(3));
}
