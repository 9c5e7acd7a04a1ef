use std::collections::{BTreeMap, BTreeSet};

use storage::{ObjectStore, list_all_keys, list_child_prefixes};
use tracing::warn;

use crate::CatalogError;
use crate::areas;
use crate::model::{AreaCatalog, GlobalCatalog, PhotoItem, SiteConfig};
use crate::naming::{ALL_REGION, resolve_display_name};

/// Accepted image extensions, matched case-insensitively.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

/// Every photo key lives under this root.
const ROOT_PREFIX: &str = "images/";

/// Sub-prefix holding thumbnail variants of the sibling full-size keys.
const THUMBS_SEGMENT: &str = "thumbs";

/// Storage folder for an area name.
///
/// A static config entry wins (matched case-insensitively by display name);
/// otherwise the folder is derived as the lowercased name with all whitespace
/// removed. The global listing path intentionally does NOT use this
/// derivation; it matches discovered folders against `AreaConfig.folder`
/// directly, and the two can disagree for multi-word names.
pub fn area_folder_for_name(site: &SiteConfig, area_name: &str) -> String {
    if let Some(config) = site.area_by_name(area_name) {
        return config.folder.clone();
    }
    area_name
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Builds the catalog for one area: full pagination of
/// `images/<folder>/`, an advisory child-prefix pass for region discovery,
/// thumbnail pairing, and the canonical `src` ordering.
pub async fn build_area_catalog(
    store: &dyn ObjectStore,
    site: &SiteConfig,
    area_name: &str,
) -> Result<AreaCatalog, CatalogError> {
    let folder = area_folder_for_name(site, area_name);
    let prefix = format!("{ROOT_PREFIX}{folder}/");
    let area_display = site
        .area_by_name(area_name)
        .map(|a| a.name.clone())
        .unwrap_or_else(|| resolve_display_name(&folder, None));

    let mut regions: BTreeSet<String> = BTreeSet::new();

    // Fast path: one-level "directory" listing for the region set. Purely
    // advisory; per-object scanning below recovers regions if this fails or
    // comes back incomplete.
    match list_child_prefixes(store, &prefix).await {
        Ok(prefixes) => {
            for child in prefixes {
                let Some(slug) = child_slug(&prefix, &child) else {
                    continue;
                };
                if slug.eq_ignore_ascii_case(THUMBS_SEGMENT) {
                    continue;
                }
                regions.insert(resolve_display_name(slug, site.region_overrides(&folder)));
            }
        }
        Err(err) => {
            warn!("region prefix listing failed for {prefix}, falling back to scan: {err}");
        }
    }

    let keys = list_all_keys(store, &prefix).await?;
    let scan = scan_keys(&keys);

    let mut photos = Vec::with_capacity(scan.photos.len());
    for entry in &scan.photos {
        let region = resolve_display_name(&entry.region_slug, site.region_overrides(&folder));
        regions.insert(region.clone());
        photos.push(photo_item(site, &scan, entry, area_display.clone(), region));
    }

    photos.sort_by(|a, b| a.src.cmp(&b.src));

    Ok(AreaCatalog {
        area: area_display,
        photos,
        regions: regions.into_iter().collect(),
    })
}

/// Builds the global catalog: one listing of everything under `images/`,
/// partitioned by the first two path segments, plus the merged area registry.
pub async fn build_global_catalog(
    store: &dyn ObjectStore,
    site: &SiteConfig,
) -> Result<GlobalCatalog, CatalogError> {
    let keys = list_all_keys(store, ROOT_PREFIX).await?;
    let scan = scan_keys(&keys);

    let mut discovered: BTreeSet<String> = BTreeSet::new();
    let mut photos = Vec::with_capacity(scan.photos.len());

    for entry in &scan.photos {
        discovered.insert(entry.area_slug.clone());

        let (area_display, overrides_key) = match site.area_by_folder(&entry.area_slug) {
            Some(config) => (config.name.clone(), config.folder.clone()),
            None => (
                resolve_display_name(&entry.area_slug, None),
                entry.area_slug.clone(),
            ),
        };
        let region = resolve_display_name(
            &entry.region_slug,
            site.region_overrides(&overrides_key),
        );
        photos.push(photo_item(site, &scan, entry, area_display, region));
    }

    photos.sort_by(|a, b| a.src.cmp(&b.src));

    Ok(GlobalCatalog {
        areas: areas::list_areas(site, &discovered),
        photos,
    })
}

#[derive(Debug)]
struct PhotoKey {
    key: String,
    area_slug: String,
    region_slug: String,
}

#[derive(Debug, Default)]
struct Scan {
    photos: Vec<PhotoKey>,
    /// full-size key -> thumbnail key, regardless of listing order.
    thumbs: BTreeMap<String, String>,
}

/// Partitions raw keys into full-size photos and the thumbnail side table.
///
/// Order-independent: thumbnails may be listed before or after their
/// full-size counterpart. Orphan thumbnails (no sibling in the same listing)
/// simply never pair up and are dropped.
fn scan_keys(keys: &[String]) -> Scan {
    let mut scan = Scan::default();

    for key in keys {
        match classify_key(key) {
            KeyKind::Photo {
                area_slug,
                region_slug,
            } => scan.photos.push(PhotoKey {
                key: key.clone(),
                area_slug,
                region_slug,
            }),
            KeyKind::Thumbnail { full_key } => {
                scan.thumbs.insert(full_key, key.clone());
            }
            KeyKind::Skip => {}
        }
    }

    scan
}

#[derive(Debug, PartialEq, Eq)]
enum KeyKind {
    Photo {
        area_slug: String,
        region_slug: String,
    },
    Thumbnail {
        full_key: String,
    },
    Skip,
}

fn classify_key(key: &str) -> KeyKind {
    // Prefix-only entries carry a trailing slash.
    if key.is_empty() || key.ends_with('/') {
        return KeyKind::Skip;
    }

    let segments: Vec<&str> = key.split('/').collect();
    let file = segments[segments.len() - 1];
    if !has_image_extension(file) {
        return KeyKind::Skip;
    }

    if let Some(pos) = segments.iter().position(|s| *s == THUMBS_SEGMENT) {
        let mut full: Vec<&str> = segments.clone();
        full.remove(pos);
        return KeyKind::Thumbnail {
            full_key: full.join("/"),
        };
    }

    // images/<area>/<file> is the minimum shape.
    if segments.len() < 3 || segments[0] != "images" {
        return KeyKind::Skip;
    }

    let region_slug = if segments.len() >= 4 {
        segments[2].to_string()
    } else {
        "all".to_string()
    };

    KeyKind::Photo {
        area_slug: segments[1].to_string(),
        region_slug,
    }
}

fn has_image_extension(file: &str) -> bool {
    match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            let ext = ext.to_lowercase();
            IMAGE_EXTENSIONS.iter().any(|e| *e == ext)
        }
        _ => false,
    }
}

fn photo_item(
    site: &SiteConfig,
    scan: &Scan,
    entry: &PhotoKey,
    area_display: String,
    region_display: String,
) -> PhotoItem {
    let alt = if region_display == ALL_REGION {
        area_display.clone()
    } else {
        format!("{region_display}, {area_display}")
    };

    PhotoItem {
        src: site.cdn_url(&entry.key),
        thumb_src: scan.thumbs.get(&entry.key).map(|k| site.cdn_url(k)),
        area: area_display,
        region: region_display,
        alt,
    }
}

/// Extracts the immediate child folder slug from a rolled-up prefix like
/// `images/iceland/reykjavik/`.
fn child_slug<'a>(parent: &str, child_prefix: &'a str) -> Option<&'a str> {
    let rest = child_prefix.strip_prefix(parent)?;
    let slug = rest.strip_suffix('/').unwrap_or(rest);
    if slug.is_empty() || slug.contains('/') {
        return None;
    }
    Some(slug)
}

#[cfg(test)]
mod tests {
    use super::{
        area_folder_for_name, build_area_catalog, build_global_catalog, classify_key, scan_keys,
        KeyKind,
    };
    use crate::model::SiteConfig;
    use pretty_assertions::assert_eq;
    use storage::MemoryObjectStore;

    fn site() -> SiteConfig {
        SiteConfig::builtin("cdn.example.com")
    }

    #[test]
    fn classification_matches_key_shapes() {
        assert_eq!(
            classify_key("images/iceland/reykjavik/a.jpg"),
            KeyKind::Photo {
                area_slug: "iceland".to_string(),
                region_slug: "reykjavik".to_string(),
            }
        );
        assert_eq!(
            classify_key("images/iceland/b.PNG"),
            KeyKind::Photo {
                area_slug: "iceland".to_string(),
                region_slug: "all".to_string(),
            }
        );
        assert_eq!(
            classify_key("images/iceland/reykjavik/thumbs/a.jpg"),
            KeyKind::Thumbnail {
                full_key: "images/iceland/reykjavik/a.jpg".to_string(),
            }
        );
        // Thumbs directly under the area folder pair with root-level photos.
        assert_eq!(
            classify_key("images/iceland/thumbs/b.jpg"),
            KeyKind::Thumbnail {
                full_key: "images/iceland/b.jpg".to_string(),
            }
        );
        assert_eq!(classify_key("images/iceland/reykjavik/"), KeyKind::Skip);
        assert_eq!(classify_key("images/iceland/notes.txt"), KeyKind::Skip);
        assert_eq!(classify_key("images/loose.jpg"), KeyKind::Skip);
        assert_eq!(classify_key("backups/iceland/a.jpg"), KeyKind::Skip);
    }

    #[test]
    fn thumbnail_pairing_is_order_independent() {
        let forward = vec![
            "images/iceland/a.jpg".to_string(),
            "images/iceland/thumbs/a.jpg".to_string(),
        ];
        let reversed: Vec<String> = forward.iter().rev().cloned().collect();

        for keys in [forward, reversed] {
            let scan = scan_keys(&keys);
            assert_eq!(scan.photos.len(), 1);
            assert_eq!(
                scan.thumbs.get("images/iceland/a.jpg"),
                Some(&"images/iceland/thumbs/a.jpg".to_string())
            );
        }
    }

    #[test]
    fn folder_derivation_prefers_config_then_strips_whitespace() {
        let site = site();
        assert_eq!(area_folder_for_name(&site, "New Zealand"), "newzealand");
        assert_eq!(area_folder_for_name(&site, "iceland"), "iceland");
        // Unconfigured multi-word name: lowercased, whitespace removed.
        assert_eq!(area_folder_for_name(&site, "Faroe  Islands"), "faroeislands");
    }

    #[tokio::test]
    async fn area_catalog_pairs_thumbs_and_sorts_by_src() {
        let store = MemoryObjectStore::with_keys([
            "images/iceland/reykjavik/a.jpg",
            "images/iceland/reykjavik/thumbs/a.jpg",
            "images/iceland/b.jpg",
        ]);

        let catalog = build_area_catalog(&store, &site(), "Iceland")
            .await
            .unwrap();

        assert_eq!(catalog.area, "Iceland");
        assert_eq!(catalog.photos.len(), 2);
        // Lexicographic by src: .../b.jpg < .../reykjavik/a.jpg.
        assert_eq!(
            catalog.photos[0].src,
            "https://cdn.example.com/images/iceland/b.jpg"
        );
        assert_eq!(catalog.photos[0].region, "All");
        assert_eq!(catalog.photos[0].thumb_src, None);
        assert_eq!(
            catalog.photos[1].src,
            "https://cdn.example.com/images/iceland/reykjavik/a.jpg"
        );
        assert_eq!(catalog.photos[1].region, "Reykjavík");
        assert_eq!(
            catalog.photos[1].thumb_src,
            Some("https://cdn.example.com/images/iceland/reykjavik/thumbs/a.jpg".to_string())
        );
        assert_eq!(
            catalog.regions,
            vec!["All".to_string(), "Reykjavík".to_string()]
        );
    }

    #[tokio::test]
    async fn orphan_thumbnails_are_dropped() {
        let store = MemoryObjectStore::with_keys(["images/iceland/thumbs/ghost.jpg"]);
        let catalog = build_area_catalog(&store, &site(), "Iceland")
            .await
            .unwrap();
        assert!(catalog.photos.is_empty());
    }

    #[tokio::test]
    async fn region_discovery_survives_delimiter_failure() {
        let store = MemoryObjectStore::with_keys([
            "images/iceland/reykjavik/a.jpg",
            "images/iceland/b.jpg",
        ])
        .failing_on_delimiter();

        let catalog = build_area_catalog(&store, &site(), "Iceland")
            .await
            .unwrap();
        // Scan-derived regions still come through.
        assert_eq!(
            catalog.regions,
            vec!["All".to_string(), "Reykjavík".to_string()]
        );
    }

    #[tokio::test]
    async fn full_listing_failure_fails_the_catalog() {
        let store = MemoryObjectStore::with_keys(["images/iceland/a.jpg"]).failing();
        assert!(build_area_catalog(&store, &site(), "Iceland").await.is_err());
    }

    #[tokio::test]
    async fn sorting_is_idempotent() {
        let store = MemoryObjectStore::with_keys([
            "images/iceland/c.jpg",
            "images/iceland/a.jpg",
            "images/iceland/b.jpg",
        ]);
        let first = build_area_catalog(&store, &site(), "Iceland").await.unwrap();
        let mut resorted = first.photos.clone();
        resorted.sort_by(|a, b| a.src.cmp(&b.src));
        assert_eq!(first.photos, resorted);
    }

    #[tokio::test]
    async fn global_catalog_discovers_unconfigured_areas() {
        let store = MemoryObjectStore::with_keys([
            "images/iceland/a.jpg",
            "images/patagonia/torres/b.jpg",
        ]);

        let catalog = build_global_catalog(&store, &site()).await.unwrap();

        let patagonia = catalog
            .areas
            .iter()
            .find(|a| a.name == "Patagonia")
            .expect("synthetic area");
        assert_eq!(patagonia.id, None);
        assert!(!patagonia.has_coordinates());

        // Static areas are present even with zero photos.
        assert!(catalog.areas.iter().any(|a| a.name == "Japan"));

        let torres = catalog
            .photos
            .iter()
            .find(|p| p.src.ends_with("b.jpg"))
            .unwrap();
        assert_eq!(torres.area, "Patagonia");
        assert_eq!(torres.region, "Torres");
    }

    #[tokio::test]
    async fn global_catalog_resolves_configured_names_by_folder() {
        let store = MemoryObjectStore::with_keys(["images/newzealand/milford/a.jpg"]);
        let catalog = build_global_catalog(&store, &site()).await.unwrap();
        assert_eq!(catalog.photos[0].area, "New Zealand");
        assert_eq!(catalog.photos[0].region, "Milford");
    }
}
