//! Orchestrator: request in, stored artifact out.

use std::time::Instant;

use genforge_backend::{invoke_all, BackendRegistry, Expected};
use genforge_catalog::TemplateCatalog;
use genforge_core::{ArtifactKind, BackendKind, ForgeConfig, GenerationRequest, ProducedBy, Result};
use genforge_store::{Artifact, ArtifactInfo, ArtifactStore, NewArtifact, Removal};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::pipeline::PipelineComposer;
use crate::prompts;
use crate::selector::FallbackSelector;
use crate::types::*;

/// What a request resolved to, before persistence.
struct Resolution {
    body: Vec<u8>,
    content_type: String,
    produced_by: ProducedBy,
    enhanced_prompt: Option<String>,
}

/// Top-level coordinator. Holds no per-request state, so one instance serves
/// any number of concurrent requests.
pub struct Orchestrator {
    registry: BackendRegistry,
    store: ArtifactStore,
}

impl Orchestrator {
    pub fn new(registry: BackendRegistry, store: ArtifactStore) -> Self {
        info!(
            "Orchestrator initialized: {} text backends, {} image backends",
            registry.of_kind(BackendKind::Text).len(),
            registry.of_kind(BackendKind::Image).len()
        );
        Self { registry, store }
    }

    /// Build backends and open the store from a loaded configuration.
    pub fn from_config(config: &ForgeConfig) -> Result<Self> {
        let registry = BackendRegistry::from_config(config)?;
        let store = ArtifactStore::open(&config.data_paths.artifacts)?;
        Ok(Self::new(registry, store))
    }

    /// Resolve `request` to content and persist it.
    ///
    /// Backend failures never surface here; the only error is a failed write.
    pub async fn generate(&self, request: GenerationRequest) -> Result<GenerationReport> {
        let request_id = Uuid::new_v4().to_string();
        let started = Instant::now();
        info!(
            request = %request_id,
            phase = %RequestPhase::Received,
            kind = %request.kind(),
            source = request.source(),
            session = request.session_id(),
            "generation request"
        );

        let resolution = match request.kind() {
            ArtifactKind::Application => self.resolve_application(&request_id, &request).await,
            ArtifactKind::Image => self.resolve_image(&request_id, &request).await,
        };
        let degraded = resolution.produced_by.is_degraded();
        info!(
            request = %request_id,
            phase = %RequestPhase::Resolved,
            produced_by = %resolution.produced_by.summary(),
            degraded,
            "content resolved"
        );

        let artifact = self
            .store
            .put(NewArtifact {
                kind: request.kind(),
                source: request.source().to_string(),
                session_id: Some(request.session_id().to_string()),
                body: resolution.body,
                content_type: resolution.content_type,
                produced_by: resolution.produced_by,
                prompt: resolution.enhanced_prompt,
            })
            .map_err(|e| {
                error!(request = %request_id, "artifact write failed: {}", e);
                e
            })?;
        info!(
            request = %request_id,
            phase = %RequestPhase::Persisted,
            name = %artifact.name,
            bytes = artifact.size,
            "artifact stored"
        );

        info!(
            request = %request_id,
            phase = %RequestPhase::Responded,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "generation complete"
        );
        Ok(GenerationReport {
            request_id,
            artifact,
            degraded,
        })
    }

    async fn resolve_application(
        &self,
        request_id: &str,
        request: &GenerationRequest,
    ) -> Resolution {
        let backends = self.registry.of_kind(request.kind().backend_kind());
        let prompt = prompts::application_prompt(request.intent_text());
        let outcomes = invoke_all(&backends, &prompt, Expected::Code).await;
        log_attempts(request_id, "generation", &Attempt::from_outcomes(&outcomes));

        let resolved = FallbackSelector::resolve(
            request,
            outcomes,
            Fallback::Catalog(TemplateCatalog::for_kind(request.kind())),
        );
        Resolution {
            body: resolved.body,
            content_type: resolved.content_type,
            produced_by: ProducedBy::from_stage(resolved.source),
            enhanced_prompt: None,
        }
    }

    async fn resolve_image(&self, request_id: &str, request: &GenerationRequest) -> Resolution {
        let enhancers = self.registry.of_kind(BackendKind::Text);
        let painters = self.registry.of_kind(request.kind().backend_kind());

        let result = PipelineComposer::run_two_stage(
            request,
            &enhancers,
            &painters,
            TemplateCatalog::for_kind(request.kind()),
        )
        .await;
        log_attempts(request_id, "enhancement", &result.enhancement_attempts);
        log_attempts(request_id, "synthesis", &result.synthesis_attempts);
        let produced_by = result.produced_by();
        Resolution {
            body: result.synthesis.body,
            content_type: result.synthesis.content_type,
            produced_by,
            enhanced_prompt: Some(result.enhanced_prompt),
        }
    }

    /// Fetch a stored artifact. `None` when the name is unknown.
    pub fn get(&self, name: &str) -> Result<Option<Artifact>> {
        self.store.get(name)
    }

    /// Most recent artifacts first.
    pub fn list(&self, limit: usize) -> Result<Vec<ArtifactInfo>> {
        self.store.list(limit)
    }

    pub fn delete(&self, name: &str) -> Result<Removal> {
        let removal = self.store.delete(name)?;
        debug!("Delete {}: {:?}", name, removal);
        Ok(removal)
    }

    /// Probe every backend. Never fails.
    pub async fn health(&self) -> HealthReport {
        let backends = self.registry.health().await;
        let artifacts = match self.store.count() {
            Ok(n) => Some(n),
            Err(e) => {
                warn!("Artifact count unavailable: {}", e);
                None
            }
        };
        HealthReport {
            status: "operational",
            backends,
            templates: TemplateIds {
                applications: TemplateCatalog::applications().ids(),
                images: TemplateCatalog::images().ids(),
            },
            artifacts,
        }
    }
}

fn log_attempts(request_id: &str, stage: &str, attempts: &[Attempt]) {
    for attempt in attempts {
        info!(
            request = %request_id,
            phase = %RequestPhase::BackendAttempted,
            stage,
            backend = %attempt.backend_id,
            outcome = attempt.outcome,
            "backend attempted"
        );
    }
}
