use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Static, authoritative seed for one top-level storage prefix.
///
/// `folder` is the raw storage-key segment; `name` is the canonical display
/// label. Coordinates are optional; areas without them rely on the geocode
/// resolver downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub folder: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
}

/// One discovered image object, with display names already resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoItem {
    pub area: String,
    pub region: String,
    pub src: String,
    pub alt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumb_src: Option<String>,
}

/// The renderable form of an area: static config merged with resolved
/// coordinates. A pin renders only once both `lat` and `lng` are numeric;
/// coordinate-less pins are silently excluded from the visualization layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaPin {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
}

impl AreaPin {
    pub fn from_config(config: &AreaConfig) -> Self {
        Self {
            id: config.id.clone(),
            name: config.name.clone(),
            lat: config.lat,
            lng: config.lng,
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            lat: None,
            lng: None,
        }
    }

    /// Both coordinates present and finite.
    pub fn has_coordinates(&self) -> bool {
        matches!((self.lat, self.lng), (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite())
    }
}

/// Single-area catalog response: the resolved display name, the sorted photo
/// manifest, and the discovered region labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaCatalog {
    pub area: String,
    pub photos: Vec<PhotoItem>,
    pub regions: Vec<String>,
}

/// Global catalog response across all areas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalCatalog {
    pub areas: Vec<AreaPin>,
    pub photos: Vec<PhotoItem>,
}

/// Static site configuration: the CDN host, the authoritative area seed, and
/// the region display-name override tables keyed by area folder slug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub cdn_domain: String,
    #[serde(default)]
    pub areas: Vec<AreaConfig>,
    /// area-folder-slug -> region-folder-slug -> display name.
    #[serde(default)]
    pub region_names: BTreeMap<String, BTreeMap<String, String>>,
}

impl SiteConfig {
    pub fn new(cdn_domain: impl Into<String>) -> Self {
        Self {
            cdn_domain: cdn_domain.into(),
            areas: Vec::new(),
            region_names: BTreeMap::new(),
        }
    }

    /// Built-in configuration used when no config file is supplied.
    pub fn builtin(cdn_domain: impl Into<String>) -> Self {
        let mut region_names: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        region_names.insert(
            "iceland".to_string(),
            BTreeMap::from([("reykjavik".to_string(), "Reykjavík".to_string())]),
        );
        region_names.insert(
            "japan".to_string(),
            BTreeMap::from([
                ("tokyo".to_string(), "Tokyo".to_string()),
                ("kyoto".to_string(), "Kyoto".to_string()),
            ]),
        );

        Self {
            cdn_domain: cdn_domain.into(),
            areas: vec![
                AreaConfig {
                    id: Some("iceland".to_string()),
                    folder: "iceland".to_string(),
                    name: "Iceland".to_string(),
                    lat: Some(64.9631),
                    lng: Some(-19.0208),
                },
                AreaConfig {
                    id: Some("japan".to_string()),
                    folder: "japan".to_string(),
                    name: "Japan".to_string(),
                    lat: Some(36.2048),
                    lng: Some(138.2529),
                },
                AreaConfig {
                    id: Some("new-zealand".to_string()),
                    folder: "newzealand".to_string(),
                    name: "New Zealand".to_string(),
                    lat: None,
                    lng: None,
                },
            ],
            region_names,
        }
    }

    /// Public CDN URL for a storage key (no signing, no expiry).
    pub fn cdn_url(&self, key: &str) -> String {
        format!("https://{}/{}", self.cdn_domain, key)
    }

    /// Region display-name overrides for one area folder, if any.
    pub fn region_overrides(&self, area_folder: &str) -> Option<&BTreeMap<String, String>> {
        self.region_names.get(area_folder)
    }

    /// Static config entry whose display name matches, case-insensitively.
    pub fn area_by_name(&self, name: &str) -> Option<&AreaConfig> {
        self.areas
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// Static config entry whose storage folder matches, case-insensitively.
    pub fn area_by_folder(&self, folder: &str) -> Option<&AreaConfig> {
        self.areas
            .iter()
            .find(|a| a.folder.eq_ignore_ascii_case(folder))
    }
}

#[cfg(test)]
mod tests {
    use super::{AreaPin, PhotoItem, SiteConfig};
    use pretty_assertions::assert_eq;

    #[test]
    fn cdn_url_joins_domain_and_key() {
        let site = SiteConfig::new("cdn.example.com");
        assert_eq!(
            site.cdn_url("images/iceland/a.jpg"),
            "https://cdn.example.com/images/iceland/a.jpg"
        );
    }

    #[test]
    fn pin_requires_both_finite_coordinates() {
        let mut pin = AreaPin::named("Iceland");
        assert!(!pin.has_coordinates());
        pin.lat = Some(64.9);
        assert!(!pin.has_coordinates());
        pin.lng = Some(f64::NAN);
        assert!(!pin.has_coordinates());
        pin.lng = Some(-19.0);
        assert!(pin.has_coordinates());
    }

    #[test]
    fn photo_item_serializes_thumb_src_in_camel_case() {
        let photo = PhotoItem {
            area: "Iceland".to_string(),
            region: "All".to_string(),
            src: "https://cdn/x.jpg".to_string(),
            alt: "Iceland".to_string(),
            thumb_src: Some("https://cdn/thumbs/x.jpg".to_string()),
        };
        let json = serde_json::to_value(&photo).unwrap();
        assert_eq!(json["thumbSrc"], "https://cdn/thumbs/x.jpg");

        let bare = PhotoItem {
            thumb_src: None,
            ..photo
        };
        let json = serde_json::to_value(&bare).unwrap();
        assert!(json.get("thumbSrc").is_none());
    }

    #[test]
    fn area_lookup_is_case_insensitive() {
        let site = SiteConfig::builtin("cdn.example.com");
        assert!(site.area_by_name("iceland").is_some());
        assert!(site.area_by_folder("ICELAND").is_some());
        assert!(site.area_by_name("atlantis").is_none());
    }
}
