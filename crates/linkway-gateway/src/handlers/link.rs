use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::handlers::parse_short_code;
use crate::model::{CreateLinkRequest, LinkResponse};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::info;

/// `POST /api/v1/links`
///
/// Any rejection of the JSON body (missing or wrong content type, bad
/// syntax, missing `url` field) is answered with 400.
pub async fn create_link_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateLinkRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LinkResponse>)> {
    let Json(request) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    // Run on its own task: a client that disconnects mid-request drops this
    // handler, but the write it started still commits.
    let shortener = Arc::clone(&state.shortener);
    let link = tokio::spawn(async move { shortener.shorten(&request.url).await })
        .await
        .map_err(|e| AppError::Internal(format!("shorten task failed: {e}")))??;

    info!(code = %link.code, short = %link.short, "created short link");

    Ok((
        StatusCode::CREATED,
        Json(LinkResponse {
            short: link.short,
            original: link.original,
        }),
    ))
}

/// `GET /api/v1/links/{short_code}`
pub async fn get_link_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<LinkResponse>> {
    let code = parse_short_code(short_code)?;
    let target = state.redirector.resolve(&code).await?;

    Ok(Json(LinkResponse {
        short: target.code.to_url(&state.base_url),
        original: target.location,
    }))
}
