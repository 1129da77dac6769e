//! HTTP route handlers.

pub mod artifacts;
pub mod generate;
pub mod health;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::{Json, Router};
use genforge_core::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(generate::routes())
        .merge(artifacts::routes())
        .merge(health::routes())
}

/// Map a core error to a status and `{success: false, error}` body.
pub(crate) fn error_response(err: &Error) -> (StatusCode, Json<serde_json::Value>) {
    let status = match err {
        Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(serde_json::json!({ "success": false, "error": err.to_string() })),
    )
}
