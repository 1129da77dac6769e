//! GET /api/health: backend probes and template inventory.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let report = state.orchestrator.health().await;
    let mut body = serde_json::to_value(&report).unwrap_or_default();
    if let Some(obj) = body.as_object_mut() {
        obj.insert("port".into(), serde_json::json!(state.config.port));
        obj.insert(
            "timestamp".into(),
            serde_json::json!(chrono::Utc::now().to_rfc3339()),
        );
    }
    Json(body)
}
