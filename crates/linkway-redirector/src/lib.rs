//! Redirect handling for short links.
//!
//! A [`RedirectorService`] resolves short codes to redirect targets using a
//! read-only view of the link store.

pub mod error;
pub mod redirector;
pub mod service;

pub use error::{RedirectorError, Result};
pub use redirector::{RedirectTarget, Redirector};
pub use service::RedirectorService;
