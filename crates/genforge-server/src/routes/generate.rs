//! Generation routes: application requests from AI and human callers, and
//! image requests.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use genforge_core::{ArtifactKind, GenerationRequest};
use serde::Deserialize;
use tracing::warn;

use super::error_response;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ai/process", post(process_ai))
        .route("/human/process", post(process_human))
        .route("/generate/image", post(generate_image))
}

#[derive(Debug, Deserialize)]
struct ProcessRequest {
    #[serde(default)]
    message: String,
    session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageRequest {
    #[serde(default)]
    prompt: String,
    source: Option<String>,
    session_id: Option<String>,
}

/// POST /api/ai/process: application request from an automated caller.
async fn process_ai(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ProcessRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    let request = GenerationRequest::new(
        ArtifactKind::Application,
        body.message,
        Some("ai"),
        body.session_id.as_deref(),
    );
    run(&state, request).await
}

/// POST /api/human/process: application request typed by a person.
async fn process_human(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ProcessRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    let request = GenerationRequest::new(
        ArtifactKind::Application,
        body.message,
        Some("human"),
        body.session_id.as_deref(),
    );
    run(&state, request).await
}

/// POST /api/generate/image: text → enhanced prompt → image.
async fn generate_image(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ImageRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    let request = GenerationRequest::new(
        ArtifactKind::Image,
        body.prompt,
        body.source.as_deref(),
        body.session_id.as_deref(),
    );
    run(&state, request).await
}

async fn run(
    state: &AppState,
    request: genforge_core::Result<GenerationRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    let request = match request {
        Ok(r) => r,
        Err(e) => {
            warn!("Rejected request: {}", e);
            return error_response(&e);
        }
    };

    match state.orchestrator.generate(request).await {
        Ok(report) => {
            let mut body = serde_json::to_value(&report).unwrap_or_default();
            if let Some(obj) = body.as_object_mut() {
                obj.insert("success".into(), serde_json::Value::Bool(true));
            }
            (StatusCode::OK, Json(body))
        }
        Err(e) => error_response(&e),
    }
}
