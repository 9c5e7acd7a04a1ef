use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Namespace prefix for persisted coordinate entries.
const KEY_PREFIX: &str = "photography-geocode";

/// Cache key for an area name: fixed namespace plus the lowercased name.
pub fn cache_key(area_name: &str) -> String {
    format!("{KEY_PREFIX}:{}", area_name.to_lowercase())
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coords {
    pub lat: f64,
    pub lng: f64,
}

impl Coords {
    pub fn is_well_formed(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// Persistent, advisory coordinate cache.
///
/// The surface is infallible on purpose: a miss and a storage failure are the
/// same thing to the resolver (it re-queries), and a failed write only costs
/// a future re-query. Implementations log failures and move on.
pub trait CoordCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Coords>;
    fn put(&self, key: &str, coords: Coords);
}

/// In-memory cache for tests and single-process use.
#[derive(Debug, Default)]
pub struct MemoryCoordCache {
    entries: Mutex<BTreeMap<String, Coords>>,
}

impl MemoryCoordCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CoordCache for MemoryCoordCache {
    fn get(&self, key: &str) -> Option<Coords> {
        let entries = self.entries.lock().ok()?;
        entries.get(key).copied().filter(Coords::is_well_formed)
    }

    fn put(&self, key: &str, coords: Coords) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), coords);
        }
    }
}

/// File-backed cache: one JSON file per entry, named by the cache key.
///
/// Writes go through a temp file and rename so a crashed write never leaves a
/// half-written entry behind. Malformed or non-finite entries read as misses,
/// which triggers a clean re-query.
#[derive(Debug)]
pub struct FileCoordCache {
    dir: PathBuf,
}

impl FileCoordCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl CoordCache for FileCoordCache {
    fn get(&self, key: &str) -> Option<Coords> {
        let raw = std::fs::read_to_string(self.entry_path(key)).ok()?;
        let coords: Coords = serde_json::from_str(&raw).ok()?;
        coords.is_well_formed().then_some(coords)
    }

    fn put(&self, key: &str, coords: Coords) {
        if let Err(err) = self.write_entry(key, coords) {
            debug!("coordinate cache write failed for {key}: {err}");
        }
    }
}

impl FileCoordCache {
    fn write_entry(&self, key: &str, coords: Coords) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.entry_path(key);
        let tmp = path.with_extension("tmp");
        let text = serde_json::to_string(&coords)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(&tmp, text)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}
