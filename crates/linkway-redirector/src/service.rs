use std::sync::Arc;

use crate::redirector::{RedirectTarget, Redirector};
use crate::RedirectorError;
use async_trait::async_trait;
use linkway_core::{ReadRepository, ShortCode};
use tracing::{debug, trace};

/// Service for handling URL redirects.
///
/// Uses a read-only repository to look up links. Resolution never writes.
#[derive(Debug, Clone)]
pub struct RedirectorService<R> {
    repository: Arc<R>,
}

impl<R: ReadRepository> RedirectorService<R> {
    /// Creates a new RedirectorService with the given repository.
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }
}

#[async_trait]
impl<R: ReadRepository> Redirector for RedirectorService<R> {
    async fn resolve(&self, code: &ShortCode) -> crate::Result<RedirectTarget> {
        trace!(code = %code, "resolving short code");

        match self.repository.get(code).await? {
            Some(link) => {
                debug!(code = %code, url = %link.original_url, "resolved short code");
                Ok(link.into())
            }
            None => {
                trace!(code = %code, "short code not found");
                Err(RedirectorError::NotFound(code.to_string()))
            }
        }
    }
}
