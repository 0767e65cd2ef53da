use crate::error::StorageError;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A stored link. Links are append-only: once inserted they are never
/// updated or removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// The unique short code.
    pub code: ShortCode,
    /// The original URL, exactly as submitted.
    pub original_url: String,
    /// When the link was stored.
    pub created_at: Timestamp,
}

/// A read-only view of a repository.
///
/// This trait provides only the read operations from [`Repository`],
/// allowing services like the redirector to have read-only access.
#[async_trait]
pub trait ReadRepository: Send + Sync + 'static {
    /// Retrieves the link for a given short code.
    /// Returns `None` if the code does not exist.
    async fn get(&self, code: &ShortCode) -> Result<Option<Link>>;
}

#[async_trait]
pub trait Repository: ReadRepository {
    /// Stores a new link and returns it with its creation timestamp.
    ///
    /// Returns `Err(StorageError::Conflict)` if the code already exists.
    /// The uniqueness check and the write happen atomically.
    async fn insert(&self, code: &ShortCode, original_url: &str) -> Result<Link>;
}

// A single store is usually shared between the shortener (writes) and the
// redirector (reads).
#[async_trait]
impl<T: ReadRepository + ?Sized> ReadRepository for Arc<T> {
    async fn get(&self, code: &ShortCode) -> Result<Option<Link>> {
        (**self).get(code).await
    }
}

#[async_trait]
impl<T: Repository + ?Sized> Repository for Arc<T> {
    async fn insert(&self, code: &ShortCode, original_url: &str) -> Result<Link> {
        (**self).insert(code, original_url).await
    }
}
