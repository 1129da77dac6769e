//! Runtime types.

use genforge_backend::BackendOutcome;
use genforge_catalog::TemplateCatalog;
use genforge_core::{BackendDescriptor, ProducedBy, StageSource};
use genforge_store::ArtifactInfo;
use serde::Serialize;

/// What the selector falls back to when no backend delivers.
#[derive(Debug, Clone, Copy)]
pub enum Fallback<'a> {
    /// Keyword-matched template from a catalog.
    Catalog(&'a TemplateCatalog),
    /// The request's intent text, unchanged.
    Passthrough,
}

/// Content chosen for one stage.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedContent {
    pub body: Vec<u8>,
    pub source: StageSource,
    pub content_type: String,
}

impl ResolvedContent {
    /// Body as text, lossily decoded.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// One backend attempt, reduced to what the request log needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub backend_id: String,
    pub outcome: &'static str,
}

impl Attempt {
    pub fn from_outcomes(outcomes: &[(BackendDescriptor, BackendOutcome)]) -> Vec<Self> {
        outcomes
            .iter()
            .map(|(d, o)| Self {
                backend_id: d.id.clone(),
                outcome: o.label(),
            })
            .collect()
    }
}

/// Output of a two-stage pipeline.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Stage 1 output, used verbatim as the stage 2 prompt.
    pub enhanced_prompt: String,
    pub enhancement: StageSource,
    pub synthesis: ResolvedContent,
    pub enhancement_attempts: Vec<Attempt>,
    pub synthesis_attempts: Vec<Attempt>,
}

impl PipelineResult {
    pub fn produced_by(&self) -> ProducedBy {
        ProducedBy::Pipeline {
            enhancement: self.enhancement.clone(),
            synthesis: self.synthesis.source.clone(),
        }
    }

    /// Both stages used fallback content.
    pub fn is_degraded(&self) -> bool {
        self.enhancement.is_fallback() && self.synthesis.source.is_fallback()
    }
}

/// Request lifecycle phases, in order. Logged at each transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestPhase {
    Received,
    BackendAttempted,
    Resolved,
    Persisted,
    Responded,
}

impl RequestPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::BackendAttempted => "backend_attempted",
            Self::Resolved => "resolved",
            Self::Persisted => "persisted",
            Self::Responded => "responded",
        }
    }
}

impl std::fmt::Display for RequestPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a successful generation, returned to the front door.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    #[serde(rename = "requestId")]
    pub request_id: String,
    #[serde(flatten)]
    pub artifact: ArtifactInfo,
    /// No backend contributed to any stage.
    pub degraded: bool,
}

/// Template ids per catalog, for health output.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateIds {
    pub applications: Vec<&'static str>,
    pub images: Vec<&'static str>,
}

/// Health of the whole system. Always operational: templates cover every
/// backend outage.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub backends: Vec<genforge_backend::BackendHealth>,
    pub templates: TemplateIds,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<i64>,
}
