//! Fallback selection over an ordered list of backend outcomes.

use genforge_backend::BackendOutcome;
use genforge_core::{BackendDescriptor, BackendKind, GenerationRequest, StageSource};
use tracing::{debug, info};

use crate::types::{Fallback, ResolvedContent};

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G'];

/// Picks the content for one stage. Never fails.
pub struct FallbackSelector;

impl FallbackSelector {
    /// First `Success` in caller order wins; later successes are dropped.
    /// Without one, content comes from `fallback`, matched against the
    /// request's intent text.
    pub fn resolve(
        request: &GenerationRequest,
        outcomes: Vec<(BackendDescriptor, BackendOutcome)>,
        fallback: Fallback<'_>,
    ) -> ResolvedContent {
        let mut winner: Option<ResolvedContent> = None;

        for (descriptor, outcome) in outcomes {
            match outcome {
                BackendOutcome::Success(body) if winner.is_none() => {
                    winner = Some(ResolvedContent {
                        content_type: sniff_content_type(descriptor.kind, &body).to_string(),
                        body,
                        source: StageSource::Backend {
                            backend_id: descriptor.id,
                        },
                    });
                }
                BackendOutcome::Success(body) => {
                    debug!(
                        backend = %descriptor.id,
                        bytes = body.len(),
                        "discarding later success"
                    );
                }
                other => {
                    debug!(backend = %descriptor.id, outcome = other.label(), "backend skipped");
                }
            }
        }

        if let Some(content) = winner {
            return content;
        }

        match fallback {
            Fallback::Catalog(catalog) => {
                let template = catalog.select(request.intent_text());
                info!(template = template.id, "no backend delivered, using template");
                ResolvedContent {
                    body: template.body.as_bytes().to_vec(),
                    source: StageSource::Template {
                        template_id: template.id.to_string(),
                    },
                    content_type: template.content_type.to_string(),
                }
            }
            Fallback::Passthrough => {
                info!("no backend delivered, passing intent text through");
                ResolvedContent {
                    body: request.intent_text().as_bytes().to_vec(),
                    source: StageSource::Passthrough,
                    content_type: "text/plain".into(),
                }
            }
        }
    }
}

/// Content type of backend output, from the backend kind and leading bytes.
pub fn sniff_content_type(kind: BackendKind, body: &[u8]) -> &'static str {
    match kind {
        BackendKind::Text => "application/javascript",
        BackendKind::Image if body.starts_with(PNG_MAGIC) => "image/png",
        BackendKind::Image => {
            let head = String::from_utf8_lossy(&body[..body.len().min(256)]);
            let head = head.trim_start();
            if head.starts_with("<svg") || head.starts_with("<?xml") {
                "image/svg+xml"
            } else {
                "application/octet-stream"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genforge_catalog::TemplateCatalog;
    use genforge_core::{ArtifactKind, BackendProtocol};

    fn descriptor(id: &str, kind: BackendKind) -> BackendDescriptor {
        BackendDescriptor {
            id: id.into(),
            endpoint: "http://localhost".into(),
            kind,
            protocol: match kind {
                BackendKind::Text => BackendProtocol::Ollama,
                BackendKind::Image => BackendProtocol::StableDiffusion,
            },
            model: None,
            deadline_ms: 1_000,
            enabled: true,
            api_key: None,
        }
    }

    fn app_request(text: &str) -> GenerationRequest {
        GenerationRequest::new(ArtifactKind::Application, text, Some("ai"), Some("s1")).unwrap()
    }

    #[test]
    fn test_first_success_in_order_wins() {
        let outcomes = vec![
            (descriptor("a", BackendKind::Text), BackendOutcome::Timeout),
            (
                descriptor("b", BackendKind::Text),
                BackendOutcome::Success(b"from b".to_vec()),
            ),
            (
                descriptor("c", BackendKind::Text),
                BackendOutcome::Success(b"from c".to_vec()),
            ),
        ];
        let resolved = FallbackSelector::resolve(
            &app_request("todo app"),
            outcomes,
            Fallback::Catalog(TemplateCatalog::applications()),
        );
        assert_eq!(resolved.body, b"from b");
        assert_eq!(resolved.source.backend_id(), Some("b"));
        assert_eq!(resolved.content_type, "application/javascript");
    }

    #[test]
    fn test_catalog_fallback_matches_keywords() {
        let outcomes = vec![
            (
                descriptor("a", BackendKind::Text),
                BackendOutcome::TransportError("refused".into()),
            ),
            (
                descriptor("b", BackendKind::Text),
                BackendOutcome::UnusableOutput("empty".into()),
            ),
        ];
        let resolved = FallbackSelector::resolve(
            &app_request("Build me a WEATHER app"),
            outcomes,
            Fallback::Catalog(TemplateCatalog::applications()),
        );
        assert_eq!(
            resolved.source,
            StageSource::Template {
                template_id: "weather".into()
            }
        );
        let weather = TemplateCatalog::applications().get("weather").unwrap();
        assert_eq!(resolved.body, weather.body.as_bytes());
    }

    #[test]
    fn test_catalog_default_without_backends() {
        let resolved = FallbackSelector::resolve(
            &app_request("something unrelated"),
            Vec::new(),
            Fallback::Catalog(TemplateCatalog::applications()),
        );
        assert_eq!(
            resolved.source,
            StageSource::Template {
                template_id: "calculator".into()
            }
        );
    }

    #[test]
    fn test_passthrough_returns_intent() {
        let request =
            GenerationRequest::new(ArtifactKind::Image, "a misty lake", None, None).unwrap();
        let resolved = FallbackSelector::resolve(
            &request,
            vec![(descriptor("a", BackendKind::Text), BackendOutcome::Timeout)],
            Fallback::Passthrough,
        );
        assert_eq!(resolved.source, StageSource::Passthrough);
        assert_eq!(resolved.text(), "a misty lake");
    }

    #[test]
    fn test_sniff_content_type() {
        assert_eq!(
            sniff_content_type(BackendKind::Image, &[0x89, b'P', b'N', b'G', 0x0d]),
            "image/png"
        );
        assert_eq!(
            sniff_content_type(BackendKind::Image, b"  <svg xmlns=\"\"></svg>"),
            "image/svg+xml"
        );
        assert_eq!(
            sniff_content_type(BackendKind::Image, b"GIF89a"),
            "application/octet-stream"
        );
        assert_eq!(
            sniff_content_type(BackendKind::Text, b"export default 1;"),
            "application/javascript"
        );
    }
}
