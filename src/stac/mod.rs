//! STAC document model, link resolution, and the synthesizer that renders
//! the hierarchy into documents.

pub mod links;
pub mod model;
pub mod synth;

pub use links::{DocPath, Linker};
pub use model::{Asset, Catalog, CatalogType, Collection, Extent, Item, Link, Provider, Rel};
pub use synth::{Rendered, Synthesizer};

/// Display title for an identifier: `flow_duration` -> `Flow Duration`.
///
/// A letter is upper-cased when it starts a run of letters and lower-cased
/// otherwise, so `dem_2ft` becomes `Dem 2Ft`.
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_word = false;
    for ch in name.chars() {
        let ch = if ch == '_' { ' ' } else { ch };
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::title_case;

    #[test]
    fn title_case_capitalizes_letter_runs() {
        assert_eq!(title_case("flow_duration"), "Flow Duration");
        assert_eq!(title_case("LAND_cover"), "Land Cover");
        assert_eq!(title_case("dem_2ft"), "Dem 2Ft");
        assert_eq!(title_case(""), "");
    }
}
