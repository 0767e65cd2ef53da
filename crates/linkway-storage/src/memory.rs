use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use jiff::Timestamp;
use linkway_core::repository::{Link, ReadRepository, Repository, Result};
use linkway_core::{ShortCode, StorageError};
use tracing::trace;

/// In-memory storage entry for a link.
#[derive(Debug, Clone)]
struct StoredLink {
    original_url: String,
    created_at: Timestamp,
}

impl StoredLink {
    fn to_link(&self, code: &ShortCode) -> Link {
        Link {
            code: code.clone(),
            original_url: self.original_url.clone(),
            created_at: self.created_at,
        }
    }
}

/// Link store kept in process memory. Contents are lost on restart.
///
/// DashMap uses sharded locks, so reads and writes that land in different
/// shards never block each other. A write holds its shard lock for the whole
/// check-and-insert, which makes inserts for the same code linearizable with
/// reads of that code.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    storage: DashMap<String, StoredLink>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self {
            storage: DashMap::new(),
        }
    }

    /// Preallocates room for `capacity` links.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: DashMap::with_capacity(capacity),
        }
    }

    /// Number of stored links.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

#[async_trait]
impl ReadRepository for InMemoryRepository {
    async fn get(&self, code: &ShortCode) -> Result<Option<Link>> {
        Ok(self
            .storage
            .get(code.as_str())
            .map(|entry| entry.to_link(code)))
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn insert(&self, code: &ShortCode, original_url: &str) -> Result<Link> {
        match self.storage.entry(code.as_str().to_owned()) {
            Entry::Occupied(_) => {
                trace!(code = %code, "short code already taken");
                Err(StorageError::Conflict(code.to_string()))
            }
            Entry::Vacant(slot) => {
                let stored = StoredLink {
                    original_url: original_url.to_owned(),
                    created_at: Timestamp::now(),
                };
                let link = stored.to_link(code);
                slot.insert(stored);
                Ok(link)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn code(s: &str) -> ShortCode {
        ShortCode::new_unchecked(s)
    }

    #[tokio::test]
    async fn stored_link_reads_back_unchanged() {
        let store = InMemoryRepository::with_capacity(4);
        assert!(store.is_empty());

        let stored = store
            .insert(&code("Xk9_a-2"), "http://example.com/aBcDeFgH")
            .await
            .unwrap();
        assert_eq!(stored.original_url, "http://example.com/aBcDeFgH");

        for _ in 0..3 {
            let read = store.get(&code("Xk9_a-2")).await.unwrap();
            assert_eq!(read.as_ref(), Some(&stored));
        }
    }

    #[tokio::test]
    async fn unknown_code_reads_as_none() {
        let store = InMemoryRepository::new();
        assert_eq!(store.get(&code("missing")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_code_is_a_conflict_and_first_link_wins() {
        let store = InMemoryRepository::new();
        let first = store
            .insert(&code("lw000000"), "https://first.example")
            .await
            .unwrap();

        let err = store
            .insert(&code("lw000000"), "https://second.example")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict(c) if c == "lw000000"));

        assert_eq!(store.get(&code("lw000000")).await.unwrap(), Some(first));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn readers_never_observe_a_partial_link() {
        let store = Arc::new(InMemoryRepository::new());

        let writers = (0..50).map(|i| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                let url = format!("https://example.com/{i}");
                store.insert(&code(&format!("w{i:04}")), &url).await.map(|_| ())
            })
        });
        let readers = (0..50).map(|i| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                if let Some(link) = store.get(&code(&format!("w{i:04}"))).await? {
                    assert_eq!(link.original_url, format!("https://example.com/{i}"));
                }
                Ok::<(), StorageError>(())
            })
        });

        for handle in writers.chain(readers).collect::<Vec<_>>() {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(store.len(), 50);
    }

    #[tokio::test]
    async fn racing_inserts_for_one_code_have_a_single_winner() {
        let store = Arc::new(InMemoryRepository::new());

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .insert(&code("contended"), &format!("https://example.com/{i}"))
                        .await
                })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => winners += 1,
                Err(err) => assert!(matches!(err, StorageError::Conflict(_))),
            }
        }

        assert_eq!(winners, 1);
        assert_eq!(store.len(), 1);
    }
}
