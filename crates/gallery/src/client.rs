use std::sync::Arc;

use catalog::AreaCatalog;
use tokio::sync::Mutex;
use tracing::debug;

use crate::state::{GalleryState, Key, KeyOutcome, OpenOutcome, Prefetch};
use crate::BoxFuture;

#[derive(Debug)]
pub enum FetchError {
    Request(String),
    Status(u16),
    Decode(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Request(msg) => write!(f, "area fetch failed: {msg}"),
            FetchError::Status(code) => write!(f, "area fetch returned HTTP {code}"),
            FetchError::Decode(msg) => write!(f, "area manifest malformed: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Source of per-area manifests.
///
/// Implementations must be `Send + Sync`; methods return boxed futures for
/// dyn-compatibility.
pub trait ManifestSource: Send + Sync {
    fn fetch_area(&self, name: &str) -> BoxFuture<'_, Result<AreaCatalog, FetchError>>;
}

/// Fire-and-forget image warmer. No await, no result: redundant requests are
/// absorbed by the HTTP cache.
pub trait Prefetcher: Send + Sync {
    fn prefetch(&self, url: &str);
}

pub struct NoopPrefetcher;

impl Prefetcher for NoopPrefetcher {
    fn prefetch(&self, _url: &str) {}
}

/// Spawned, unawaited GET per URL. Errors are discarded; prefetching is pure
/// opportunism.
pub struct HttpPrefetcher {
    client: reqwest::Client,
}

impl HttpPrefetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Prefetcher for HttpPrefetcher {
    fn prefetch(&self, url: &str) {
        let client = self.client.clone();
        let url = url.to_string();
        tokio::spawn(async move {
            if let Err(err) = client.get(&url).send().await {
                debug!("prefetch failed for {url}: {err}");
            }
        });
    }
}

/// Manifest source backed by the catalog server's area endpoint.
pub struct HttpManifestSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpManifestSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    async fn fetch(&self, name: &str) -> Result<AreaCatalog, FetchError> {
        let url = format!(
            "{}/api/photography/area",
            self.base_url.trim_end_matches('/')
        );
        let resp = self
            .client
            .get(&url)
            .query(&[("name", name)])
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        resp.json::<AreaCatalog>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

impl ManifestSource for HttpManifestSource {
    fn fetch_area(&self, name: &str) -> BoxFuture<'_, Result<AreaCatalog, FetchError>> {
        let name = name.to_string();
        Box::pin(async move { self.fetch(&name).await })
    }
}

/// Async driver for the gallery state machine.
///
/// Opens run the fetch protocol (`open_area` -> fetch -> `complete_fetch`);
/// the state machine's in-flight flag guarantees at most one fetch per area,
/// and navigation fires neighbor prefetches through the `Prefetcher`.
#[derive(Clone)]
pub struct GalleryClient {
    state: Arc<Mutex<GalleryState>>,
    source: Arc<dyn ManifestSource>,
    prefetcher: Arc<dyn Prefetcher>,
}

impl GalleryClient {
    pub fn new(source: Arc<dyn ManifestSource>, prefetcher: Arc<dyn Prefetcher>) -> Self {
        Self {
            state: Arc::new(Mutex::new(GalleryState::new())),
            source,
            prefetcher,
        }
    }

    /// Opens an area, fetching its manifest when unfetched. Cache hits and
    /// deduplicated opens return without any network call.
    pub async fn open_area(&self, name: &str) -> OpenOutcome {
        let outcome = self.state.lock().await.open_area(name);
        if outcome == OpenOutcome::FetchStarted {
            let result = self
                .source
                .fetch_area(name)
                .await
                .map_err(|e| e.to_string());
            self.state.lock().await.complete_fetch(name, result);
        }
        outcome
    }

    pub async fn select_photo(&self, index: usize) {
        let prefetch = self.state.lock().await.select_photo(index);
        self.fire(prefetch);
    }

    pub async fn handle_key(&self, key: Key) -> KeyOutcome {
        let outcome = self.state.lock().await.handle_key(key);
        if let KeyOutcome::Navigated(prefetch) = &outcome {
            self.fire(Some(prefetch.clone()));
        }
        outcome
    }

    pub async fn close_gallery(&self) {
        self.state.lock().await.close_gallery();
    }

    /// Read access to the state for UI rendering and tests.
    pub async fn with_state<R>(&self, f: impl FnOnce(&mut GalleryState) -> R) -> R {
        let mut state = self.state.lock().await;
        f(&mut state)
    }

    fn fire(&self, prefetch: Option<Prefetch>) {
        let Some(prefetch) = prefetch else {
            return;
        };
        for url in [prefetch.next, prefetch.previous].into_iter().flatten() {
            self.prefetcher.prefetch(&url);
        }
    }
}
