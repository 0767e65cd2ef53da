use crate::shortcode::ShortCode;
use async_trait::async_trait;
use jiff::Timestamp;

type Result<T> = std::result::Result<T, crate::error::ShortenerError>;

/// The outcome of a successful [`Shortener::shorten`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortenedLink {
    /// The generated short code.
    pub code: ShortCode,
    /// The fully qualified short URL (base URL + code).
    pub short: String,
    /// The submitted URL, echoed byte-for-byte.
    pub original: String,
    pub created_at: Timestamp,
}

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Validates `original_url`, stores it under a fresh short code and
    /// returns the short link.
    async fn shorten(&self, original_url: &str) -> Result<ShortenedLink>;
}
