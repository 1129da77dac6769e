//! Artifact types.

use genforge_core::{ArtifactKind, ProducedBy};
use serde::Serialize;

/// Input to [`crate::ArtifactStore::put`].
#[derive(Debug, Clone)]
pub struct NewArtifact {
    pub kind: ArtifactKind,
    pub source: String,
    pub session_id: Option<String>,
    pub body: Vec<u8>,
    pub content_type: String,
    pub produced_by: ProducedBy,
    /// Prompt the final stage was given, when it differs from the intent.
    pub prompt: Option<String>,
}

/// Stored artifact metadata (everything except the body).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactInfo {
    pub name: String,
    pub kind: ArtifactKind,
    pub source: String,
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub size: usize,
    pub digest: String,
    #[serde(rename = "contentType")]
    pub content_type: String,
    #[serde(rename = "producedBy")]
    pub produced_by: ProducedBy,
    /// Creation time, milliseconds since the Unix epoch.
    #[serde(rename = "createdAt")]
    pub created_at: i64,
    #[serde(rename = "enhancedPrompt", skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

/// A stored artifact with its body.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub info: ArtifactInfo,
    pub body: Vec<u8>,
}

/// Result of a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Deleted,
    NotFound,
}
