mod health;
mod link;
mod redirect;

pub use health::health_handler;
pub use link::{create_link_handler, get_link_handler};
pub use redirect::redirect_handler;

use crate::error::AppError;
use linkway_core::ShortCode;
use linkway_redirector::RedirectorError;

/// A path segment that is not a well-formed code can never have been issued.
fn parse_short_code(raw: String) -> Result<ShortCode, AppError> {
    ShortCode::new(raw.as_str()).map_err(|_| AppError::Redirector(RedirectorError::NotFound(raw)))
}
