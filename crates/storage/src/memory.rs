use std::collections::BTreeSet;

use crate::{BoxFuture, ListPage, ListRequest, ObjectStore, StorageError};

/// In-memory object store for tests.
///
/// Keys are held in a `BTreeSet`, so pages come back in lexicographic order;
/// the continuation token is the last key of the previous page.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    keys: BTreeSet<String>,
    page_size: usize,
    fail_listing: bool,
    fail_delimiter: bool,
}

impl MemoryObjectStore {
    pub fn with_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            page_size: 1000,
            fail_listing: false,
            fail_delimiter: false,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Every listing call fails with a transport-style error.
    pub fn failing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    /// Only delimiter (child-prefix) listings fail; object listings succeed.
    pub fn failing_on_delimiter(mut self) -> Self {
        self.fail_delimiter = true;
        self
    }

    fn page(&self, request: &ListRequest) -> Result<ListPage, StorageError> {
        if self.fail_listing {
            return Err(StorageError::new("memory store unavailable"));
        }
        if self.fail_delimiter && request.delimiter.is_some() {
            return Err(StorageError::new(
                "memory store unavailable for delimiter listing",
            ));
        }

        let after = request.continuation.clone().unwrap_or_default();
        let mut keys = Vec::new();
        let mut common: BTreeSet<String> = BTreeSet::new();
        let mut continuation = None;
        let mut seen = 0usize;

        for key in self.keys.iter() {
            if !key.starts_with(&request.prefix) || key.as_str() <= after.as_str() {
                continue;
            }
            if seen == self.page_size {
                continuation = Some(keys.last().cloned().unwrap_or_default());
                break;
            }
            seen += 1;

            match request.delimiter {
                Some(delim) => {
                    let rest = &key[request.prefix.len()..];
                    match rest.find(delim) {
                        Some(idx) => {
                            let rolled =
                                format!("{}{}", request.prefix, &rest[..=idx]);
                            common.insert(rolled);
                        }
                        None => keys.push(key.clone()),
                    }
                }
                None => keys.push(key.clone()),
            }
        }

        // Rolled-up prefixes still consume keys for paging purposes, so the
        // continuation token tracks the raw key cursor, not the output.
        if continuation.is_some() {
            let cursor = self
                .keys
                .iter()
                .filter(|k| k.starts_with(&request.prefix) && k.as_str() > after.as_str())
                .nth(self.page_size - 1)
                .cloned();
            continuation = cursor;
        }

        Ok(ListPage {
            keys,
            common_prefixes: common.into_iter().collect(),
            continuation,
        })
    }
}

impl ObjectStore for MemoryObjectStore {
    fn list_page(&self, request: ListRequest) -> BoxFuture<'_, Result<ListPage, StorageError>> {
        Box::pin(async move { self.page(&request) })
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryObjectStore;
    use crate::{ListRequest, ObjectStore};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn pages_resume_from_continuation_token() {
        let store = MemoryObjectStore::with_keys(["p/a", "p/b", "p/c"]).with_page_size(2);

        let first = store.list_page(ListRequest::objects("p/")).await.unwrap();
        assert_eq!(first.keys, vec!["p/a".to_string(), "p/b".to_string()]);
        let token = first.continuation.clone().expect("truncated");

        let second = store
            .list_page(ListRequest {
                prefix: "p/".to_string(),
                delimiter: None,
                continuation: Some(token),
            })
            .await
            .unwrap();
        assert_eq!(second.keys, vec!["p/c".to_string()]);
        assert_eq!(second.continuation, None);
    }

    #[tokio::test]
    async fn delimiter_rolls_up_without_duplicates() {
        let store = MemoryObjectStore::with_keys([
            "images/x/r/a.jpg",
            "images/x/r/b.jpg",
            "images/x/top.jpg",
        ]);
        let page = store
            .list_page(ListRequest::child_prefixes("images/x/"))
            .await
            .unwrap();
        assert_eq!(page.common_prefixes, vec!["images/x/r/".to_string()]);
        assert_eq!(page.keys, vec!["images/x/top.jpg".to_string()]);
    }

    #[tokio::test]
    async fn delimiter_failure_is_injectable() {
        let store =
            MemoryObjectStore::with_keys(["images/x/a.jpg"]).failing_on_delimiter();
        assert!(store
            .list_page(ListRequest::child_prefixes("images/x/"))
            .await
            .is_err());
        assert!(store
            .list_page(ListRequest::objects("images/x/"))
            .await
            .is_ok());
    }
}
