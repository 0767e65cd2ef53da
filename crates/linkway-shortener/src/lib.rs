//! URL shortener service implementation.
//!
//! This crate provides the shortening service and the bounded retry
//! combinator it uses to recover from short code collisions. Core types
//! are re-exported from `linkway_core`.

pub mod retry;
pub mod service;

pub use linkway_core::{ShortenedLink, Shortener, ShortenerError};
pub use retry::{BoundedRetry, RetryError};
pub use service::{ShortenerService, ShortenerSettings};
