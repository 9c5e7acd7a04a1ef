//! Photo catalog construction.
//!
//! The catalog is derived fresh on every request from the object-storage key
//! namespace: keys under `images/<area>/[<region>/][thumbs/]<file>.<ext>` are
//! classified into full-size photos and thumbnail variants, display names are
//! resolved against static tables, and the result is a flat manifest with a
//! deterministic ordering contract (ascending lexicographic by `src`).

pub mod areas;
pub mod builder;
pub mod model;
pub mod naming;

pub use areas::list_areas;
pub use builder::{area_folder_for_name, build_area_catalog, build_global_catalog};
pub use model::{AreaCatalog, AreaConfig, AreaPin, GlobalCatalog, PhotoItem, SiteConfig};

use storage::StorageError;

#[derive(Debug)]
pub enum CatalogError {
    /// Required storage configuration is absent; raised before any network
    /// call is attempted.
    Config(String),
    /// The full object listing failed; the whole catalog read fails with it.
    Listing(StorageError),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Config(msg) => write!(f, "catalog configuration error: {msg}"),
            CatalogError::Listing(err) => write!(f, "catalog listing failed: {err}"),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Config(_) => None,
            CatalogError::Listing(err) => Some(err),
        }
    }
}

impl From<StorageError> for CatalogError {
    fn from(err: StorageError) -> Self {
        CatalogError::Listing(err)
    }
}
