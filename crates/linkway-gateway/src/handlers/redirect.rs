use crate::error::{AppError, Result};
use crate::handlers::parse_short_code;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

/// `GET /{short_code}`: answers 307 so clients keep the method and do not
/// cache the target permanently.
pub async fn redirect_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
) -> Result<Response> {
    let code = parse_short_code(short_code)?;
    let target = state.redirector.resolve(&code).await?;

    let location = HeaderValue::try_from(target.location.as_str()).map_err(|e| {
        AppError::Internal(format!("stored url is not a valid Location header: {e}"))
    })?;

    Ok((StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, location)]).into_response())
}
