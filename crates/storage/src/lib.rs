//! Object-storage listing contract.
//!
//! The catalog pipeline only ever *lists* objects; it never reads or writes
//! them. This crate defines the listing trait, the paginated page shape, an
//! S3-compatible HTTP implementation, and an in-memory store for tests.
//!
//! New providers can be added by implementing the `ObjectStore` trait.

mod config;
mod memory;
mod s3;

pub use config::StorageConfig;
pub use memory::MemoryObjectStore;
pub use s3::S3HttpStore;

use std::future::Future;
use std::pin::Pin;

/// Error type for object-store operations.
#[derive(Debug)]
pub struct StorageError {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}

impl StorageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// One page of a listing request.
///
/// Keys and common prefixes are returned in provider order; callers that need
/// a deterministic order sort after accumulating all pages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    pub keys: Vec<String>,
    pub common_prefixes: Vec<String>,
    /// Token for the next page; `None` means the listing is complete.
    pub continuation: Option<String>,
}

/// Parameters for one listing call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListRequest {
    pub prefix: String,
    /// One-level "directory" enumeration when set; keys past the delimiter
    /// are rolled up into `common_prefixes`.
    pub delimiter: Option<char>,
    pub continuation: Option<String>,
}

impl ListRequest {
    pub fn objects(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            delimiter: None,
            continuation: None,
        }
    }

    pub fn child_prefixes(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            delimiter: Some('/'),
            continuation: None,
        }
    }
}

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait for paginated object listing.
///
/// Implementations must be `Send + Sync` for use across async tasks.
/// Methods return boxed futures for dyn-compatibility.
pub trait ObjectStore: Send + Sync {
    /// List one page of objects under a prefix.
    fn list_page(&self, request: ListRequest) -> BoxFuture<'_, Result<ListPage, StorageError>>;
}

/// Lists every key under `prefix`, following continuation tokens until the
/// provider reports no further page.
///
/// Partial results are never returned: any page failure fails the whole call.
pub async fn list_all_keys(
    store: &dyn ObjectStore,
    prefix: &str,
) -> Result<Vec<String>, StorageError> {
    let mut keys = Vec::new();
    let mut continuation: Option<String> = None;

    loop {
        let page = store
            .list_page(ListRequest {
                prefix: prefix.to_string(),
                delimiter: None,
                continuation: continuation.take(),
            })
            .await?;

        keys.extend(page.keys);
        match page.continuation {
            Some(token) => continuation = Some(token),
            None => break,
        }
    }

    Ok(keys)
}

/// Lists the immediate child prefixes under `prefix` (one-level "directory"
/// enumeration), following continuation tokens to exhaustion.
pub async fn list_child_prefixes(
    store: &dyn ObjectStore,
    prefix: &str,
) -> Result<Vec<String>, StorageError> {
    let mut prefixes = Vec::new();
    let mut continuation: Option<String> = None;

    loop {
        let page = store
            .list_page(ListRequest {
                prefix: prefix.to_string(),
                delimiter: Some('/'),
                continuation: continuation.take(),
            })
            .await?;

        prefixes.extend(page.common_prefixes);
        match page.continuation {
            Some(token) => continuation = Some(token),
            None => break,
        }
    }

    Ok(prefixes)
}
