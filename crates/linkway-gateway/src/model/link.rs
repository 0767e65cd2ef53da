use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateLinkRequest {
    pub url: String,
}

/// Body of both the create and the lookup endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct LinkResponse {
    pub short: String,
    pub original: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error kind, e.g. `invalid_url`.
    pub error: String,
    pub message: String,
}
