//! Core types and traits for the linkway URL shortener.
//!
//! This crate provides shared types and traits used by the shortener,
//! the redirector, the storage backends and the HTTP gateway.

pub mod error;
pub mod repository;
pub mod shortcode;
pub mod shortener;

pub use error::{CoreError, ShortenerError, StorageError};
pub use repository::{Link, ReadRepository, Repository};
pub use shortcode::ShortCode;
pub use shortener::{ShortenedLink, Shortener};
