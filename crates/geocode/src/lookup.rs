use serde::Deserialize;

use crate::{BoxFuture, GeocodeError};

/// One candidate from the lookup provider. Coordinates arrive as strings and
/// may be absent or garbage; nothing here is trusted until parsed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeoCandidate {
    pub lat: String,
    pub lon: String,
}

/// Lookup-by-name provider.
///
/// Implementations must be `Send + Sync`; methods return boxed futures for
/// dyn-compatibility.
pub trait GeoLookup: Send + Sync {
    fn lookup(&self, name: &str) -> BoxFuture<'_, Result<Vec<GeoCandidate>, GeocodeError>>;
}

/// Nominatim-style HTTP lookup: `GET <base>/search?q=<name>&format=json&limit=1`,
/// returning a JSON array of candidates. Only the first candidate is used by
/// the resolver.
pub struct NominatimLookup {
    base_url: String,
    client: reqwest::Client,
}

impl NominatimLookup {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    async fn search(&self, name: &str) -> Result<Vec<GeoCandidate>, GeocodeError> {
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));
        let resp = self
            .client
            .get(&url)
            .query(&[("q", name), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| GeocodeError::Request(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status.as_u16()));
        }

        resp.json::<Vec<GeoCandidate>>()
            .await
            .map_err(|e| GeocodeError::Decode(e.to_string()))
    }
}

impl GeoLookup for NominatimLookup {
    fn lookup(&self, name: &str) -> BoxFuture<'_, Result<Vec<GeoCandidate>, GeocodeError>> {
        let name = name.to_string();
        Box::pin(async move { self.search(&name).await })
    }
}
