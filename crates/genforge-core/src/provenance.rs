//! Provenance: which backend or template produced an artifact.

use serde::{Deserialize, Serialize};

/// Where one stage's content came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StageSource {
    /// A backend returned usable output.
    Backend {
        #[serde(rename = "backendId")]
        backend_id: String,
    },
    /// Every backend failed; a catalog template was used.
    Template {
        #[serde(rename = "templateId")]
        template_id: String,
    },
    /// Every backend failed; the stage input was passed through unchanged.
    Passthrough,
}

impl StageSource {
    pub fn backend_id(&self) -> Option<&str> {
        match self {
            Self::Backend { backend_id } => Some(backend_id),
            _ => None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        !matches!(self, Self::Backend { .. })
    }
}

/// Provenance recorded on every artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProducedBy {
    Template {
        #[serde(rename = "templateId")]
        template_id: String,
    },
    Backend {
        #[serde(rename = "backendId")]
        backend_id: String,
    },
    Pipeline {
        enhancement: StageSource,
        synthesis: StageSource,
    },
}

impl ProducedBy {
    /// Provenance of a single-stage resolution.
    pub fn from_stage(source: StageSource) -> Self {
        match source {
            StageSource::Backend { backend_id } => Self::Backend { backend_id },
            StageSource::Template { template_id } => Self::Template { template_id },
            // Only enhancement stages pass through; record it as a pseudo-template.
            StageSource::Passthrough => Self::Template {
                template_id: "passthrough".into(),
            },
        }
    }

    /// True when no backend contributed to any stage.
    pub fn is_degraded(&self) -> bool {
        match self {
            Self::Template { .. } => true,
            Self::Backend { .. } => false,
            Self::Pipeline {
                enhancement,
                synthesis,
            } => enhancement.is_fallback() && synthesis.is_fallback(),
        }
    }

    /// One-line form for logs and CLI listings.
    pub fn summary(&self) -> String {
        fn stage(s: &StageSource) -> String {
            match s {
                StageSource::Backend { backend_id } => backend_id.clone(),
                StageSource::Template { template_id } => format!("template:{}", template_id),
                StageSource::Passthrough => "passthrough".into(),
            }
        }
        match self {
            Self::Template { template_id } => format!("template:{}", template_id),
            Self::Backend { backend_id } => backend_id.clone(),
            Self::Pipeline {
                enhancement,
                synthesis,
            } => format!("{} -> {}", stage(enhancement), stage(synthesis)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_shape() {
        let p = ProducedBy::Pipeline {
            enhancement: StageSource::Passthrough,
            synthesis: StageSource::Backend {
                backend_id: "stable-diffusion".into(),
            },
        };
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["type"], "pipeline");
        assert_eq!(v["enhancement"]["type"], "passthrough");
        assert_eq!(v["synthesis"]["backendId"], "stable-diffusion");

        let back: ProducedBy = serde_json::from_value(v).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn test_degraded() {
        assert!(ProducedBy::Template {
            template_id: "weather".into()
        }
        .is_degraded());
        assert!(!ProducedBy::Backend {
            backend_id: "ollama".into()
        }
        .is_degraded());

        let both_fallback = ProducedBy::Pipeline {
            enhancement: StageSource::Passthrough,
            synthesis: StageSource::Template {
                template_id: "abstract".into(),
            },
        };
        assert!(both_fallback.is_degraded());
        assert_eq!(both_fallback.summary(), "passthrough -> template:abstract");
    }
}
