//! Two-stage composition: prompt enhancement, then synthesis.

use std::sync::Arc;

use genforge_backend::{invoke_all, Expected, GenerativeBackend};
use genforge_catalog::TemplateCatalog;
use genforge_core::GenerationRequest;
use tracing::debug;

use crate::prompts;
use crate::selector::FallbackSelector;
use crate::types::{Attempt, Fallback, PipelineResult};

pub struct PipelineComposer;

impl PipelineComposer {
    /// Run stage 1 against `stage1`, then feed its output to `stage2`.
    ///
    /// Stage 1 falls back to the intent text unchanged; stage 2 falls back to
    /// `catalog`, matched against the original intent text. Neither stage
    /// fails, so neither does the pipeline.
    pub async fn run_two_stage(
        request: &GenerationRequest,
        stage1: &[Arc<dyn GenerativeBackend>],
        stage2: &[Arc<dyn GenerativeBackend>],
        catalog: &TemplateCatalog,
    ) -> PipelineResult {
        let prompt = prompts::enhancement_prompt(request.intent_text());
        let outcomes = invoke_all(stage1, &prompt, Expected::Prose).await;
        let enhancement_attempts = Attempt::from_outcomes(&outcomes);
        let enhanced = FallbackSelector::resolve(request, outcomes, Fallback::Passthrough);
        let enhanced_prompt = enhanced.text();
        debug!(
            enhancement = ?enhanced.source,
            chars = enhanced_prompt.len(),
            "stage 1 resolved"
        );

        let outcomes = invoke_all(stage2, &enhanced_prompt, Expected::Prose).await;
        let synthesis_attempts = Attempt::from_outcomes(&outcomes);
        let synthesis = FallbackSelector::resolve(request, outcomes, Fallback::Catalog(catalog));
        debug!(synthesis = ?synthesis.source, "stage 2 resolved");

        PipelineResult {
            enhanced_prompt,
            enhancement: enhanced.source,
            synthesis,
            enhancement_attempts,
            synthesis_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genforge_backend::testing::ScriptedBackend;
    use genforge_backend::{CallError, RawPayload};
    use genforge_core::{ArtifactKind, ProducedBy, StageSource};

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    fn png() -> Result<RawPayload, CallError> {
        Ok(RawPayload::Binary(PNG.to_vec()))
    }

    fn request(text: &str) -> GenerationRequest {
        GenerationRequest::new(ArtifactKind::Image, text, Some("human"), Some("s1")).unwrap()
    }

    #[tokio::test]
    async fn test_stage2_consumes_stage1_output() {
        let enhancer = ScriptedBackend::text(
            "ollama",
            0,
            ScriptedBackend::ok_text("a misty lake at dawn, volumetric light"),
        );
        let painter = ScriptedBackend::image("sd", 0, png());

        let result = PipelineComposer::run_two_stage(
            &request("a lake"),
            &[enhancer.as_dyn()],
            &[painter.as_dyn()],
            TemplateCatalog::images(),
        )
        .await;

        assert_eq!(result.enhanced_prompt, "a misty lake at dawn, volumetric light");
        assert_eq!(painter.prompts(), vec![result.enhanced_prompt.clone()]);
        assert!(enhancer.prompts()[0].contains("a lake"));
        assert_eq!(result.synthesis.body, PNG);
        assert_eq!(result.synthesis.content_type, "image/png");
        assert!(!result.is_degraded());
    }

    #[tokio::test]
    async fn test_unusable_enhancement_passes_intent_through() {
        let enhancer = ScriptedBackend::text("ollama", 0, ScriptedBackend::ok_text("   "));
        let painter = ScriptedBackend::image("sd", 0, png());

        let result = PipelineComposer::run_two_stage(
            &request("a sunset over the sea"),
            &[enhancer.as_dyn()],
            &[painter.as_dyn()],
            TemplateCatalog::images(),
        )
        .await;

        assert_eq!(result.enhancement, StageSource::Passthrough);
        assert_eq!(result.synthesis.source.backend_id(), Some("sd"));
        assert_eq!(
            result.enhancement_attempts,
            vec![Attempt {
                backend_id: "ollama".into(),
                outcome: "unusable_output",
            }]
        );
        assert_eq!(result.synthesis_attempts[0].outcome, "success");
        assert_eq!(painter.prompts(), vec!["a sunset over the sea".to_string()]);
        assert_eq!(
            result.produced_by(),
            ProducedBy::Pipeline {
                enhancement: StageSource::Passthrough,
                synthesis: StageSource::Backend {
                    backend_id: "sd".into()
                },
            }
        );
        assert!(!result.is_degraded());
    }

    #[tokio::test]
    async fn test_stage2_failure_uses_template_for_original_intent() {
        let enhancer = ScriptedBackend::text(
            "ollama",
            0,
            ScriptedBackend::ok_text("an abstract swirl of colour"),
        );
        let painter = ScriptedBackend::image("sd", 0, ScriptedBackend::refused());

        let result = PipelineComposer::run_two_stage(
            &request("portrait of my cat"),
            &[enhancer.as_dyn()],
            &[painter.as_dyn()],
            TemplateCatalog::images(),
        )
        .await;

        assert_eq!(result.enhancement.backend_id(), Some("ollama"));
        assert_eq!(
            result.synthesis.source,
            StageSource::Template {
                template_id: "portrait".into()
            }
        );
        assert_eq!(result.synthesis.content_type, "image/svg+xml");
        assert_eq!(result.enhancement_attempts[0].outcome, "success");
        assert_eq!(
            result.synthesis_attempts,
            vec![Attempt {
                backend_id: "sd".into(),
                outcome: "transport_error",
            }]
        );
        assert!(!result.is_degraded());
    }

    #[tokio::test]
    async fn test_total_outage_is_degraded() {
        let result = PipelineComposer::run_two_stage(
            &request("something"),
            &[],
            &[],
            TemplateCatalog::images(),
        )
        .await;

        assert_eq!(result.enhanced_prompt, "something");
        assert_eq!(
            result.synthesis.source,
            StageSource::Template {
                template_id: "abstract".into()
            }
        );
        assert!(result.is_degraded());
        assert!(result.produced_by().is_degraded());
    }
}
