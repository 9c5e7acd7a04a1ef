use serde::Deserialize;
use tracing::warn;

use crate::{BoxFuture, ListPage, ListRequest, ObjectStore, StorageConfig, StorageError};

/// S3-compatible listing over plain HTTP (unsigned ListObjectsV2).
///
/// The photo bucket is public-read, so no request signing is involved; the
/// store only issues `GET ?list-type=2` calls against the bucket endpoint.
pub struct S3HttpStore {
    endpoint: String,
    client: reqwest::Client,
}

impl S3HttpStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            endpoint: config.endpoint(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_client(config: &StorageConfig, client: reqwest::Client) -> Self {
        Self {
            endpoint: config.endpoint(),
            client,
        }
    }

    async fn fetch_page(&self, request: ListRequest) -> Result<ListPage, StorageError> {
        let mut query: Vec<(&str, String)> = vec![
            ("list-type", "2".to_string()),
            ("prefix", request.prefix.clone()),
        ];
        if let Some(delim) = request.delimiter {
            query.push(("delimiter", delim.to_string()));
        }
        if let Some(token) = request.continuation {
            query.push(("continuation-token", token));
        }

        let resp = self
            .client
            .get(&self.endpoint)
            .query(&query)
            .send()
            .await
            .map_err(|e| StorageError::with_source("bucket listing request failed", e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(StorageError::new(format!(
                "bucket listing failed: HTTP {status}"
            )));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| StorageError::with_source("bucket listing body read failed", e))?;

        parse_list_response(&body)
    }
}

impl ObjectStore for S3HttpStore {
    fn list_page(&self, request: ListRequest) -> BoxFuture<'_, Result<ListPage, StorageError>> {
        Box::pin(self.fetch_page(request))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct ListBucketResult {
    contents: Vec<ObjectEntry>,
    common_prefixes: Vec<PrefixEntry>,
    is_truncated: bool,
    next_continuation_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct ObjectEntry {
    key: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct PrefixEntry {
    prefix: String,
}

fn parse_list_response(body: &str) -> Result<ListPage, StorageError> {
    let result: ListBucketResult = quick_xml::de::from_str(body)
        .map_err(|e| StorageError::with_source("bucket listing response malformed", e))?;

    // Some providers report IsTruncated without a token; without a token there
    // is no way to resume, so treat that as the final page.
    let continuation = if result.is_truncated {
        let token = result.next_continuation_token.filter(|t| !t.is_empty());
        if token.is_none() {
            warn!("listing truncated without a continuation token; stopping at this page");
        }
        token
    } else {
        None
    };

    Ok(ListPage {
        keys: result.contents.into_iter().map(|c| c.key).collect(),
        common_prefixes: result
            .common_prefixes
            .into_iter()
            .map(|p| p.prefix)
            .collect(),
        continuation,
    })
}
