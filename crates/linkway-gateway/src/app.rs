use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{create_link_handler, get_link_handler, health_handler, redirect_handler};
use crate::state::AppState;

pub struct App {}

impl App {
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/readyz", get(health_handler))
            .route("/api/v1/links", post(create_link_handler))
            .route("/api/v1/links/{short_code}", get(get_link_handler))
            // Static routes above take precedence over this catch-all.
            .route("/{short_code}", get(redirect_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}
