//! Generation request model.

use serde::{Deserialize, Serialize};

use crate::config::BackendKind;
use crate::error::{Error, Result};

/// Attribution used when a request does not say who sent it.
pub const UNKNOWN_SOURCE: &str = "unknown";

/// What kind of artifact a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Application skeleton (source code).
    Application,
    /// Image, produced by the text → image pipeline.
    Image,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::Image => "image",
        }
    }

    /// Backend kind that synthesizes the final artifact body.
    pub fn backend_kind(&self) -> BackendKind {
        match self {
            Self::Application => BackendKind::Text,
            Self::Image => BackendKind::Image,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "application" => Some(Self::Application),
            "image" => Some(Self::Image),
            _ => None,
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated request. Created at ingress, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    intent_text: String,
    source: String,
    session_id: String,
    kind: ArtifactKind,
}

impl GenerationRequest {
    /// Validate and build a request.
    ///
    /// `source` defaults to `"unknown"` and is reduced to `[A-Za-z0-9.-]` so it
    /// can be embedded in an artifact name. `session_id` defaults to the
    /// current time in milliseconds.
    pub fn new(
        kind: ArtifactKind,
        intent_text: impl Into<String>,
        source: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<Self> {
        let intent_text = intent_text.into();
        if intent_text.trim().is_empty() {
            return Err(Error::InvalidRequest("intent text is empty".into()));
        }

        let source = source
            .map(sanitize_token)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| UNKNOWN_SOURCE.to_string());

        let session_id = session_id
            .map(sanitize_token)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis().to_string());

        Ok(Self {
            intent_text,
            source,
            session_id,
            kind,
        })
    }

    pub fn intent_text(&self) -> &str {
        &self.intent_text
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }
}

/// Replace anything outside `[A-Za-z0-9.-]` with `-`.
pub fn sanitize_token(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                c
            } else {
                '-'
            }
        })
        .collect()
}
