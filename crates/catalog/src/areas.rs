use std::collections::{BTreeMap, BTreeSet};

use crate::model::{AreaPin, SiteConfig};
use crate::naming::resolve_display_name;

/// Merges the static area seed with areas discovered only from storage.
///
/// Static entries are always included, even with zero photos. Discovered
/// folders with no matching config (case-insensitive `folder` match) become
/// synthetic name-only pins. Dedup key is the resolved display name, not the
/// folder slug; ordering here is incidental (consumers impose their own).
pub fn list_areas(site: &SiteConfig, discovered_folders: &BTreeSet<String>) -> Vec<AreaPin> {
    let mut by_name: BTreeMap<String, AreaPin> = BTreeMap::new();

    for config in &site.areas {
        by_name
            .entry(config.name.clone())
            .or_insert_with(|| AreaPin::from_config(config));
    }

    for folder in discovered_folders {
        if site.area_by_folder(folder).is_some() {
            continue;
        }
        let name = resolve_display_name(folder, None);
        if !by_name.contains_key(&name) {
            by_name.insert(name.clone(), AreaPin::named(name));
        }
    }

    by_name.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::list_areas;
    use crate::model::SiteConfig;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    #[test]
    fn static_areas_always_present() {
        let site = SiteConfig::builtin("cdn.example.com");
        let pins = list_areas(&site, &BTreeSet::new());
        let names: Vec<&str> = pins.iter().map(|p| p.name.as_str()).collect();
        assert!(names.contains(&"Iceland"));
        assert!(names.contains(&"Japan"));
        assert!(names.contains(&"New Zealand"));
    }

    #[test]
    fn discovered_folder_becomes_synthetic_pin() {
        let site = SiteConfig::builtin("cdn.example.com");
        let discovered = BTreeSet::from(["patagonia".to_string()]);
        let pins = list_areas(&site, &discovered);

        let pin = pins.iter().find(|p| p.name == "Patagonia").unwrap();
        assert_eq!(pin.id, None);
        assert_eq!(pin.lat, None);
        assert_eq!(pin.lng, None);
    }

    #[test]
    fn configured_folder_does_not_duplicate() {
        let site = SiteConfig::builtin("cdn.example.com");
        // Same folder as the static Iceland entry, different case.
        let discovered = BTreeSet::from(["ICELAND".to_string()]);
        let pins = list_areas(&site, &discovered);
        let count = pins.iter().filter(|p| p.name == "Iceland").count();
        assert_eq!(count, 1);
        // The static coordinates survive.
        assert!(pins.iter().find(|p| p.name == "Iceland").unwrap().has_coordinates());
    }
}
