//! Artifact routes: list, fetch and delete stored artifacts.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use genforge_store::Removal;
use serde::Deserialize;

use super::error_response;
use crate::state::AppState;

const DEFAULT_LIST_LIMIT: usize = 10;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/workspace", get(list_artifacts))
        .route("/artifacts/{name}", get(get_artifact).delete(delete_artifact))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    limit: Option<usize>,
}

/// GET /api/workspace: most recent artifacts, metadata only.
async fn list_artifacts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> (StatusCode, Json<serde_json::Value>) {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    match state.orchestrator.list(limit) {
        Ok(artifacts) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "count": artifacts.len(),
                "artifacts": artifacts,
            })),
        ),
        Err(e) => error_response(&e),
    }
}

/// GET /api/artifacts/{name}: raw body with its stored content type.
async fn get_artifact(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Response {
    match state.orchestrator.get(&name) {
        Ok(Some(artifact)) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, artifact.info.content_type),
                (header::ETAG, format!("\"{}\"", artifact.info.digest)),
            ],
            artifact.body,
        )
            .into_response(),
        Ok(None) => not_found(&name).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// DELETE /api/artifacts/{name}
async fn delete_artifact(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> (StatusCode, Json<serde_json::Value>) {
    match state.orchestrator.delete(&name) {
        Ok(Removal::Deleted) => (
            StatusCode::OK,
            Json(serde_json::json!({ "success": true, "deleted": name })),
        ),
        Ok(Removal::NotFound) => not_found(&name),
        Err(e) => error_response(&e),
    }
}

fn not_found(name: &str) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "success": false,
            "error": format!("Artifact not found: {}", name),
        })),
    )
}
