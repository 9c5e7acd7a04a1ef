use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use catalog::{build_area_catalog, build_global_catalog, AreaPin, CatalogError, SiteConfig};
use geocode::{resolve_pins, CoordCache, FileCoordCache, GeoLookup, NominatimLookup};
use storage::{ObjectStore, S3HttpStore, StorageConfig};

mod cache;
mod changelog;

use cache::TtlCache;

/// Catalogs are rebuilt per request; this header lets the edge serve stale
/// copies while revalidating.
const CATALOG_CACHE_CONTROL: &str = "public, s-maxage=120, stale-while-revalidate=600";

/// Upper bound on pin resolution per listing request. Resolution is advisory;
/// on expiry the response ships the pins unresolved and the coordinate cache
/// picks the rest up on a later request.
const GEOCODE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Clone)]
pub struct AppState {
    site: Arc<SiteConfig>,
    storage: Option<StorageConfig>,
    http: reqwest::Client,
    geocoder: Option<Arc<Geocoder>>,
    changelog: Arc<ChangelogConfig>,
    changelog_cache: Arc<Mutex<TtlCache<Value>>>,
}

/// Server-side pin resolution: the external lookup plus the file-backed
/// coordinate cache. Enabled only when `GEOCODE_URL` is set; without it the
/// global listing serves pins exactly as configured.
pub struct Geocoder {
    lookup: NominatimLookup,
    cache: FileCoordCache,
}

#[derive(Debug, Default)]
pub struct ChangelogConfig {
    pub github_url: Option<String>,
    pub github_token: Option<String>,
    pub vercel_url: Option<String>,
    pub vercel_token: Option<String>,
}

impl ChangelogConfig {
    fn from_env() -> Self {
        Self {
            github_url: env_var_non_empty("CHANGELOG_GITHUB_URL"),
            github_token: env_var_non_empty("CHANGELOG_GITHUB_TOKEN"),
            vercel_url: env_var_non_empty("CHANGELOG_VERCEL_URL"),
            vercel_token: env_var_non_empty("CHANGELOG_VERCEL_TOKEN"),
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let addr: SocketAddr = env::var("PHOTOS_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:9200".to_string())
        .parse()
        .expect("invalid PHOTOS_ADDR");

    let storage = StorageConfig::from_env();
    if storage.is_none() {
        warn!("PHOTOS_BUCKET / PHOTOS_REGION not set; catalog endpoints will return 500");
    }

    let cdn_domain = env_var_non_empty("PHOTOS_CDN_DOMAIN")
        .or_else(|| {
            storage
                .as_ref()
                .map(|s| format!("{}.s3.{}.amazonaws.com", s.bucket, s.region))
        })
        .unwrap_or_else(|| "localhost".to_string());

    let site = load_site_config(&cdn_domain).await;
    let http = reqwest::Client::new();

    let geocoder = env_var_non_empty("GEOCODE_URL").map(|url| {
        let cache_dir = env_var_non_empty("GEOCODE_CACHE_DIR")
            .unwrap_or_else(|| ".cache/geocode".to_string());
        Arc::new(Geocoder {
            lookup: NominatimLookup::with_client(url, http.clone()),
            cache: FileCoordCache::new(cache_dir),
        })
    });

    let state = AppState {
        site: Arc::new(site),
        storage,
        http,
        geocoder,
        changelog: Arc::new(ChangelogConfig::from_env()),
        changelog_cache: Arc::new(Mutex::new(TtlCache::new())),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([Method::GET, Method::OPTIONS]);

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/photography/list", get(get_global))
        .route("/api/photography/area", get(get_area))
        .route("/api/changelog/releases", get(changelog::get_releases))
        .route("/api/changelog/deployments", get(changelog::get_deployments))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("photo catalog server listening on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await.unwrap(), app)
        .await
        .unwrap();
}

/// Loads the area/region tables from the `PHOTOS_CONFIG` JSON file when set,
/// falling back to the built-in tables on any failure.
async fn load_site_config(cdn_domain: &str) -> SiteConfig {
    let Some(path) = env_var_non_empty("PHOTOS_CONFIG") else {
        return SiteConfig::builtin(cdn_domain);
    };

    match tokio::fs::read_to_string(&path).await {
        Ok(text) => match serde_json::from_str::<SiteConfig>(&text) {
            Ok(mut site) => {
                if site.cdn_domain.trim().is_empty() {
                    site.cdn_domain = cdn_domain.to_string();
                }
                site
            }
            Err(err) => {
                warn!("invalid config file {path}, using built-in tables: {err}");
                SiteConfig::builtin(cdn_domain)
            }
        },
        Err(err) => {
            warn!("failed to read config file {path}, using built-in tables: {err}");
            SiteConfig::builtin(cdn_domain)
        }
    }
}

async fn healthz() -> Response {
    (StatusCode::OK, "ok").into_response()
}

#[derive(Debug, Deserialize)]
struct AreaQuery {
    name: Option<String>,
}

async fn get_global(
    State(state): State<AppState>,
) -> Result<Response, (StatusCode, Json<Value>)> {
    let store = object_store(&state).map_err(catalog_api_error)?;
    global_response(&store, &state.site, state.geocoder.as_deref()).await
}

async fn get_area(
    State(state): State<AppState>,
    Query(query): Query<AreaQuery>,
) -> Result<Response, (StatusCode, Json<Value>)> {
    let Some(name) = query.name.filter(|n| !n.trim().is_empty()) else {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Query parameter 'name' is required",
        ));
    };

    let store = object_store(&state).map_err(catalog_api_error)?;
    area_response(&store, &state.site, &name).await
}

async fn global_response(
    store: &dyn ObjectStore,
    site: &SiteConfig,
    geocoder: Option<&Geocoder>,
) -> Result<Response, (StatusCode, Json<Value>)> {
    let mut catalog = build_global_catalog(store, site)
        .await
        .map_err(catalog_api_error)?;

    if let Some(geocoder) = geocoder {
        let pins = std::mem::take(&mut catalog.areas);
        catalog.areas =
            resolve_pins_within(GEOCODE_TIMEOUT, pins, &geocoder.lookup, &geocoder.cache).await;
    }

    catalog_response(&catalog)
}

async fn area_response(
    store: &dyn ObjectStore,
    site: &SiteConfig,
    name: &str,
) -> Result<Response, (StatusCode, Json<Value>)> {
    let catalog = build_area_catalog(store, site, name)
        .await
        .map_err(catalog_api_error)?;
    catalog_response(&catalog)
}

/// Runs pin resolution with a hard budget. The catalog response never waits
/// on a slow provider past the budget; unresolved pins ship as-is.
async fn resolve_pins_within(
    budget: Duration,
    pins: Vec<AreaPin>,
    lookup: &dyn GeoLookup,
    cache: &dyn CoordCache,
) -> Vec<AreaPin> {
    match tokio::time::timeout(budget, resolve_pins(pins.clone(), lookup, cache)).await {
        Ok(resolved) => resolved,
        Err(_) => {
            warn!("pin resolution exceeded {budget:?}; serving unresolved pins");
            pins
        }
    }
}

/// Per-request store handle. Absent bucket/region is a configuration error,
/// raised before any network call is attempted.
fn object_store(state: &AppState) -> Result<S3HttpStore, CatalogError> {
    let Some(config) = &state.storage else {
        return Err(CatalogError::Config(
            "PHOTOS_BUCKET / PHOTOS_REGION are not set".to_string(),
        ));
    };
    Ok(S3HttpStore::with_client(config, state.http.clone()))
}

fn catalog_api_error(err: CatalogError) -> (StatusCode, Json<Value>) {
    api_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

fn catalog_response<T: Serialize>(value: &T) -> Result<Response, (StatusCode, Json<Value>)> {
    let body = serde_json::to_string(value).map_err(|e| {
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Response serialization failed: {e}"),
        )
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(
        http::header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(
        http::header::CACHE_CONTROL,
        HeaderValue::from_static(CATALOG_CACHE_CONTROL),
    );
    Ok((StatusCode::OK, headers, Body::from(body)).into_response())
}

pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message.into() })))
}

fn env_var_non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
