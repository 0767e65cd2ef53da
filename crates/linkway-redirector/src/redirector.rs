use crate::Result;
use async_trait::async_trait;
use linkway_core::{Link, ShortCode};

/// Where a short code points to. Served as a temporary (307) redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget {
    pub code: ShortCode,
    /// The original URL, used verbatim as the `Location` header.
    pub location: String,
}

impl From<Link> for RedirectTarget {
    fn from(link: Link) -> Self {
        Self {
            code: link.code,
            location: link.original_url,
        }
    }
}

#[async_trait]
pub trait Redirector: Send + Sync + 'static {
    /// Resolves a short code to its redirect target.
    /// Returns [`RedirectorError::NotFound`](crate::RedirectorError::NotFound)
    /// if the code was never issued.
    async fn resolve(&self, code: &ShortCode) -> Result<RedirectTarget>;
}
