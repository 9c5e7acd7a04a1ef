use std::time::{Duration, Instant};

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{api_error, AppState};

const CACHE_TTL: Duration = Duration::from_secs(120);

/// One release entry from the repository hosting API. Upstream payloads vary
/// by account settings, so every field is optional with a safe default.
/// Decodes the upstream snake_case names, serves camelCase.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all(serialize = "camelCase"))]
pub struct ReleaseNote {
    pub tag_name: String,
    pub name: String,
    pub published_at: String,
    pub body: String,
    pub html_url: String,
}

/// One deployment entry from the hosting platform API. Same partial-field
/// treatment as `ReleaseNote`; its field names are single words upstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Deployment {
    pub uid: String,
    pub state: String,
    pub created: u64,
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct DeploymentList {
    deployments: Vec<Deployment>,
}

pub async fn get_releases(
    State(state): State<AppState>,
) -> Result<Json<Vec<ReleaseNote>>, (StatusCode, Json<Value>)> {
    let Some(upstream) = state.changelog.github_url.clone() else {
        return Err(api_error(
            StatusCode::NOT_FOUND,
            "Release feed is not configured",
        ));
    };

    let raw = fetch_cached(&state, "releases", &upstream, state.changelog.github_token.as_deref())
        .await?;
    let notes: Vec<ReleaseNote> = serde_json::from_value(raw).unwrap_or_default();
    Ok(Json(notes))
}

pub async fn get_deployments(
    State(state): State<AppState>,
) -> Result<Json<Vec<Deployment>>, (StatusCode, Json<Value>)> {
    let Some(upstream) = state.changelog.vercel_url.clone() else {
        return Err(api_error(
            StatusCode::NOT_FOUND,
            "Deployment feed is not configured",
        ));
    };

    let raw = fetch_cached(
        &state,
        "deployments",
        &upstream,
        state.changelog.vercel_token.as_deref(),
    )
    .await?;
    let list: DeploymentList = serde_json::from_value(raw).unwrap_or_default();
    Ok(Json(list.deployments))
}

/// Fetches the upstream JSON, consulting the shared TTL cache first. A hit
/// skips the network entirely; a successful fetch writes through.
async fn fetch_cached(
    state: &AppState,
    key: &str,
    url: &str,
    token: Option<&str>,
) -> Result<Value, (StatusCode, Json<Value>)> {
    let now = Instant::now();
    if let Some(cached) = state.changelog_cache.lock().await.get(key, now) {
        debug!("changelog cache hit for {key}");
        return Ok(cached);
    }

    let mut request = state.http.get(url).header("User-Agent", "photo-atlas");
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }

    let resp = request
        .send()
        .await
        .map_err(|e| api_error(StatusCode::BAD_GATEWAY, format!("Fetch failed: {e}")))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(api_error(
            StatusCode::BAD_GATEWAY,
            format!("Upstream HTTP {}", status.as_u16()),
        ));
    }

    let value: Value = resp
        .json()
        .await
        .map_err(|e| api_error(StatusCode::BAD_GATEWAY, format!("Decode failed: {e}")))?;

    state
        .changelog_cache
        .lock()
        .await
        .put(key, value.clone(), CACHE_TTL, Instant::now());
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::{Deployment, DeploymentList, ReleaseNote};
    use pretty_assertions::assert_eq;

    #[test]
    fn release_decodes_with_missing_fields() {
        let note: ReleaseNote =
            serde_json::from_str(r#"{"tag_name": "v1.2.0", "unknown": true}"#).unwrap();
        assert_eq!(note.tag_name, "v1.2.0");
        assert_eq!(note.body, "");
        assert_eq!(note.published_at, "");

        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["tagName"], "v1.2.0");
    }

    #[test]
    fn deployment_list_tolerates_empty_payload() {
        let list: DeploymentList = serde_json::from_str("{}").unwrap();
        assert!(list.deployments.is_empty());

        let list: DeploymentList = serde_json::from_str(
            r#"{"deployments": [{"uid": "d1", "state": "READY", "created": 1700000000000}]}"#,
        )
        .unwrap();
        assert_eq!(list.deployments.len(), 1);
        assert_eq!(list.deployments[0].state, "READY");
        assert_eq!(list.deployments[0].url, "");
    }

    #[test]
    fn deployment_keeps_its_upstream_field_names() {
        let dep = Deployment {
            uid: "d1".to_string(),
            state: "READY".to_string(),
            created: 1,
            url: "example.vercel.app".to_string(),
        };
        let json = serde_json::to_value(&dep).unwrap();
        assert_eq!(json["uid"], "d1");
        assert!(json.get("created").is_some());
    }
}
