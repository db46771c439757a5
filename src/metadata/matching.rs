//! Name-matching strategies for layer metadata lookup.
//!
//! Each strategy is a pure predicate over `(entry key, entry, asset name)`.
//! [`STRATEGIES`] fixes their priority.

use super::LayerMetadata;

pub type MatchStrategy = fn(&str, &LayerMetadata, &str) -> bool;

/// Strategies in priority order, each with the label used in logs.
pub const STRATEGIES: &[(&str, MatchStrategy)] = &[
    ("exact key", exact_key),
    ("safe_name alias", safe_name_alias),
    ("normalized key", normalized_key),
];

/// Lower-case with `_` and `-` turned into spaces: `Land_Cover` -> `land cover`.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase().replace(['_', '-'], " ")
}

/// Display key equals the asset name once separators become spaces.
pub fn exact_key(key: &str, _entry: &LayerMetadata, name: &str) -> bool {
    key.to_lowercase() == normalize_name(name)
}

/// The entry's `safe_name` equals the asset name, ignoring case.
pub fn safe_name_alias(_key: &str, entry: &LayerMetadata, name: &str) -> bool {
    entry
        .safe_name
        .as_deref()
        .is_some_and(|safe| safe.to_lowercase() == name.to_lowercase())
}

/// Display key with spaces as underscores equals the asset name, raw or normalized.
pub fn normalized_key(key: &str, _entry: &LayerMetadata, name: &str) -> bool {
    let key = key.to_lowercase().replace(' ', "_");
    key == name.to_lowercase() || key == normalize_name(name).replace(' ', "_")
}
