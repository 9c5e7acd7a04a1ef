use std::collections::{BTreeMap, BTreeSet};

use catalog::AreaCatalog;
use tracing::warn;

use crate::navigation::{next_index, previous_index};

/// Transition record for observers (UI layers, tests, logs).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GalleryEvent {
    AreaOpened { area: String },
    FetchStarted { area: String },
    FetchCompleted { area: String, photos: usize },
    FetchFailed { area: String, error: String },
    GalleryClosed,
    PhotoSelected { index: usize },
    ViewerClosed,
    HoverChanged { label: Option<String> },
}

/// Result of an open attempt for one area.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    /// Manifest already loaded; no network call.
    CacheHit,
    /// Area was unfetched; caller must run the fetch and report back via
    /// `complete_fetch`.
    FetchStarted,
    /// A fetch for this area is already in flight; do not start another.
    AlreadyLoading,
}

/// URLs to warm after an index change. Fire-and-forget; the browser (or HTTP)
/// cache absorbs redundant requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prefetch {
    pub next: Option<String>,
    pub previous: Option<String>,
}

/// Keyboard input relevant to the viewer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Key {
    Escape,
    ArrowLeft,
    ArrowRight,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// No image selected (bindings inactive) or an irrelevant key.
    Ignored,
    ViewerClosed,
    Navigated(Prefetch),
}

/// The gallery state machine.
///
/// Per-area manifests are keyed by lowercased area name and move
/// `unfetched -> loading -> loaded`; a failed fetch removes the loading flag
/// and records nothing, so a later open retries. Loaded is terminal for the
/// lifetime of the page view.
#[derive(Debug, Default)]
pub struct GalleryState {
    photos_by_area: BTreeMap<String, AreaCatalog>,
    loading_areas: BTreeSet<String>,
    active_area: Option<String>,
    gallery_open: bool,
    selected: Option<usize>,
    hover_label: Option<String>,
    events: Vec<GalleryEvent>,
}

impl GalleryState {
    pub fn new() -> Self {
        Self::default()
    }

    fn area_key(name: &str) -> String {
        name.to_lowercase()
    }

    /// Opens an area (pin click / menu selection): makes it active, opens the
    /// gallery, and reports whether a fetch must start.
    pub fn open_area(&mut self, name: &str) -> OpenOutcome {
        self.active_area = Some(name.to_string());
        self.gallery_open = true;
        self.events.push(GalleryEvent::AreaOpened {
            area: name.to_string(),
        });

        let key = Self::area_key(name);
        if self.photos_by_area.contains_key(&key) {
            return OpenOutcome::CacheHit;
        }
        if self.loading_areas.contains(&key) {
            return OpenOutcome::AlreadyLoading;
        }

        self.loading_areas.insert(key);
        self.events.push(GalleryEvent::FetchStarted {
            area: name.to_string(),
        });
        OpenOutcome::FetchStarted
    }

    /// Reports the outcome of a fetch started by `open_area`.
    ///
    /// Late results are idempotent keyed writes: completing an area that is
    /// no longer active just fills its cache.
    pub fn complete_fetch(&mut self, name: &str, result: Result<AreaCatalog, String>) {
        let key = Self::area_key(name);
        self.loading_areas.remove(&key);

        match result {
            Ok(catalog) => {
                self.events.push(GalleryEvent::FetchCompleted {
                    area: name.to_string(),
                    photos: catalog.photos.len(),
                });
                self.photos_by_area.insert(key, catalog);
            }
            Err(error) => {
                warn!("photo fetch failed for {name}: {error}");
                // No tombstone: the next open retries.
                self.events.push(GalleryEvent::FetchFailed {
                    area: name.to_string(),
                    error,
                });
            }
        }
    }

    pub fn is_loading(&self, name: &str) -> bool {
        self.loading_areas.contains(&Self::area_key(name))
    }

    pub fn area_catalog(&self, name: &str) -> Option<&AreaCatalog> {
        self.photos_by_area.get(&Self::area_key(name))
    }

    pub fn active_area(&self) -> Option<&str> {
        self.active_area.as_deref()
    }

    pub fn gallery_open(&self) -> bool {
        self.gallery_open
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn hover_label(&self) -> Option<&str> {
        self.hover_label.as_deref()
    }

    pub fn set_hover_label(&mut self, label: Option<String>) {
        if self.hover_label != label {
            self.hover_label = label.clone();
            self.events.push(GalleryEvent::HoverChanged { label });
        }
    }

    /// Photos of the active area, in canonical (src-sorted) order. Empty when
    /// nothing is active or loaded.
    pub fn active_photos(&self) -> &[catalog::PhotoItem] {
        self.active_area
            .as_deref()
            .and_then(|name| self.area_catalog(name))
            .map(|c| c.photos.as_slice())
            .unwrap_or(&[])
    }

    /// Selects a photo by index in the active sequence. Out-of-range
    /// selections are ignored.
    pub fn select_photo(&mut self, index: usize) -> Option<Prefetch> {
        if index >= self.active_photos().len() {
            return None;
        }
        self.selected = Some(index);
        self.events.push(GalleryEvent::PhotoSelected { index });
        Some(self.neighbor_prefetch(index))
    }

    pub fn next_photo(&mut self) -> Option<Prefetch> {
        self.step(next_index)
    }

    pub fn previous_photo(&mut self) -> Option<Prefetch> {
        self.step(previous_index)
    }

    fn step(&mut self, advance: fn(usize, usize) -> usize) -> Option<Prefetch> {
        let index = self.selected?;
        let len = self.active_photos().len();
        if len == 0 {
            return None;
        }
        let new_index = advance(index, len);
        self.selected = Some(new_index);
        self.events.push(GalleryEvent::PhotoSelected { index: new_index });
        Some(self.neighbor_prefetch(new_index))
    }

    fn neighbor_prefetch(&self, index: usize) -> Prefetch {
        let photos = self.active_photos();
        let len = photos.len();
        if len == 0 {
            return Prefetch::default();
        }
        Prefetch {
            next: Some(photos[next_index(index, len)].src.clone()),
            previous: Some(photos[previous_index(index, len)].src.clone()),
        }
    }

    pub fn close_viewer(&mut self) {
        if self.selected.take().is_some() {
            self.events.push(GalleryEvent::ViewerClosed);
        }
    }

    pub fn close_gallery(&mut self) {
        self.gallery_open = false;
        self.selected = None;
        self.events.push(GalleryEvent::GalleryClosed);
    }

    /// Whether viewer key bindings are attached. They exist only while an
    /// image is selected.
    pub fn key_bindings_active(&self) -> bool {
        self.selected.is_some()
    }

    /// Handles a key press. Returns `Ignored` whenever bindings are inactive,
    /// which is the same as the listener having been removed.
    pub fn handle_key(&mut self, key: Key) -> KeyOutcome {
        if !self.key_bindings_active() {
            return KeyOutcome::Ignored;
        }
        match key {
            Key::Escape => {
                self.close_viewer();
                KeyOutcome::ViewerClosed
            }
            Key::ArrowRight => match self.next_photo() {
                Some(prefetch) => KeyOutcome::Navigated(prefetch),
                None => KeyOutcome::Ignored,
            },
            Key::ArrowLeft => match self.previous_photo() {
                Some(prefetch) => KeyOutcome::Navigated(prefetch),
                None => KeyOutcome::Ignored,
            },
            Key::Other => KeyOutcome::Ignored,
        }
    }

    /// Component teardown: drops selection (and with it the key bindings).
    pub fn unmount(&mut self) {
        self.selected = None;
        self.hover_label = None;
    }

    /// Drains the transition log for observers.
    pub fn drain_events(&mut self) -> Vec<GalleryEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::{GalleryEvent, GalleryState, Key, KeyOutcome, OpenOutcome};
    use catalog::{AreaCatalog, PhotoItem};
    use pretty_assertions::assert_eq;

    fn photo(src: &str) -> PhotoItem {
        PhotoItem {
            area: "Iceland".to_string(),
            region: "All".to_string(),
            src: src.to_string(),
            alt: "Iceland".to_string(),
            thumb_src: None,
        }
    }

    fn loaded_iceland(state: &mut GalleryState, count: usize) {
        assert_eq!(state.open_area("Iceland"), OpenOutcome::FetchStarted);
        let photos: Vec<PhotoItem> = (0..count)
            .map(|i| photo(&format!("https://cdn/p{i}.jpg")))
            .collect();
        state.complete_fetch(
            "Iceland",
            Ok(AreaCatalog {
                area: "Iceland".to_string(),
                photos,
                regions: vec!["All".to_string()],
            }),
        );
    }

    #[test]
    fn reopening_a_loaded_area_is_a_cache_hit() {
        let mut state = GalleryState::new();
        loaded_iceland(&mut state, 2);
        assert_eq!(state.open_area("Iceland"), OpenOutcome::CacheHit);
        // Case-insensitive area keying.
        assert_eq!(state.open_area("ICELAND"), OpenOutcome::CacheHit);
    }

    #[test]
    fn same_area_open_while_loading_is_deduplicated() {
        let mut state = GalleryState::new();
        assert_eq!(state.open_area("Iceland"), OpenOutcome::FetchStarted);
        assert_eq!(state.open_area("Iceland"), OpenOutcome::AlreadyLoading);
        // A different area interleaves freely.
        assert_eq!(state.open_area("Japan"), OpenOutcome::FetchStarted);
    }

    #[test]
    fn failed_fetch_leaves_no_tombstone() {
        let mut state = GalleryState::new();
        assert_eq!(state.open_area("Iceland"), OpenOutcome::FetchStarted);
        state.complete_fetch("Iceland", Err("boom".to_string()));
        assert!(!state.is_loading("Iceland"));
        assert!(state.area_catalog("Iceland").is_none());
        // Retry is a fresh fetch.
        assert_eq!(state.open_area("Iceland"), OpenOutcome::FetchStarted);
    }

    #[test]
    fn navigation_wraps_and_prefetches_neighbors() {
        let mut state = GalleryState::new();
        loaded_iceland(&mut state, 3);

        let prefetch = state.select_photo(2).expect("selectable");
        assert_eq!(prefetch.next.as_deref(), Some("https://cdn/p0.jpg"));
        assert_eq!(prefetch.previous.as_deref(), Some("https://cdn/p1.jpg"));

        let prefetch = state.next_photo().expect("wraps");
        assert_eq!(state.selected_index(), Some(0));
        assert_eq!(prefetch.next.as_deref(), Some("https://cdn/p1.jpg"));

        state.previous_photo();
        assert_eq!(state.selected_index(), Some(2));
    }

    #[test]
    fn selection_out_of_range_is_ignored() {
        let mut state = GalleryState::new();
        loaded_iceland(&mut state, 1);
        assert!(state.select_photo(1).is_none());
        assert_eq!(state.selected_index(), None);
    }

    #[test]
    fn keys_are_inert_without_a_selection() {
        let mut state = GalleryState::new();
        loaded_iceland(&mut state, 2);
        assert!(!state.key_bindings_active());
        assert_eq!(state.handle_key(Key::ArrowRight), KeyOutcome::Ignored);
        assert_eq!(state.handle_key(Key::Escape), KeyOutcome::Ignored);
    }

    #[test]
    fn escape_closes_the_viewer_and_releases_bindings() {
        let mut state = GalleryState::new();
        loaded_iceland(&mut state, 2);
        state.select_photo(0);
        assert!(state.key_bindings_active());

        assert_eq!(state.handle_key(Key::Escape), KeyOutcome::ViewerClosed);
        assert_eq!(state.selected_index(), None);
        assert_eq!(state.handle_key(Key::ArrowLeft), KeyOutcome::Ignored);
    }

    #[test]
    fn unmount_releases_bindings() {
        let mut state = GalleryState::new();
        loaded_iceland(&mut state, 2);
        state.select_photo(1);
        state.unmount();
        assert!(!state.key_bindings_active());
        assert_eq!(state.handle_key(Key::ArrowRight), KeyOutcome::Ignored);
    }

    #[test]
    fn events_record_the_transition_sequence() {
        let mut state = GalleryState::new();
        state.open_area("Iceland");
        state.complete_fetch("Iceland", Err("offline".to_string()));

        let events = state.drain_events();
        assert_eq!(
            events,
            vec![
                GalleryEvent::AreaOpened {
                    area: "Iceland".to_string()
                },
                GalleryEvent::FetchStarted {
                    area: "Iceland".to_string()
                },
                GalleryEvent::FetchFailed {
                    area: "Iceland".to_string(),
                    error: "offline".to_string()
                },
            ]
        );
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn late_results_are_idempotent_keyed_writes() {
        let mut state = GalleryState::new();
        state.open_area("Iceland");
        // User moved on before the fetch finished.
        state.open_area("Japan");
        state.complete_fetch(
            "Iceland",
            Ok(AreaCatalog {
                area: "Iceland".to_string(),
                photos: vec![photo("https://cdn/p.jpg")],
                regions: vec![],
            }),
        );

        assert_eq!(state.active_area(), Some("Japan"));
        assert!(state.area_catalog("Iceland").is_some());
        // The inactive area's photos do not leak into the active view.
        assert!(state.active_photos().is_empty());
    }
}
