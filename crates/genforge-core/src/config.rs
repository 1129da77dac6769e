//! Configuration and data directory management.
//!
//! The process environment is read once, in [`ForgeConfig::from_env`]. The
//! resulting value is handed to the backend registry and the orchestrator by
//! reference; nothing downstream looks at environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};

pub const DEFAULT_PORT: u16 = 3003;
pub const DEFAULT_TEXT_DEADLINE_MS: u64 = 20_000;
pub const DEFAULT_IMAGE_DEADLINE_MS: u64 = 90_000;
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3";
pub const DEFAULT_CHAT_URL: &str = "http://localhost:8080";
pub const DEFAULT_CHAT_MODEL: &str = "deepseek-coder";
pub const DEFAULT_SD_URL: &str = "http://127.0.0.1:7860";

/// Paths to all GenForge data directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Artifact database directory (`data/artifacts/`).
    pub artifacts: PathBuf,
    /// Optional backend list (`data/backends.json`).
    pub backends_file: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            artifacts: root.join("artifacts"),
            backends_file: root.join("backends.json"),
            root,
        };
        std::fs::create_dir_all(&paths.artifacts)?;
        Ok(paths)
    }
}

/// What a backend produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Text,
    Image,
}

impl BackendKind {
    /// Deadline used when a backend does not configure one.
    pub fn default_deadline_ms(&self) -> u64 {
        match self {
            Self::Text => DEFAULT_TEXT_DEADLINE_MS,
            Self::Image => DEFAULT_IMAGE_DEADLINE_MS,
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Image => write!(f, "image"),
        }
    }
}

/// Wire protocol spoken by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendProtocol {
    /// Ollama `/api/generate`.
    Ollama,
    /// OpenAI-compatible `/v1/chat/completions` (llama.cpp server, DeepSeek, cloud APIs).
    #[serde(rename = "openai")]
    OpenAi,
    /// Automatic1111 `/sdapi/v1/txt2img`.
    StableDiffusion,
}

/// Static description of one configured backend. Never mutated after startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendDescriptor {
    pub id: String,
    pub endpoint: String,
    pub kind: BackendKind,
    pub protocol: BackendProtocol,
    #[serde(default)]
    pub model: Option<String>,
    pub deadline_ms: u64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Bearer token for OpenAI-compatible endpoints. Never written back out.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

/// One entry of `backends.json`. A missing `deadline_ms` defaults by kind.
#[derive(Debug, Deserialize)]
struct BackendEntry {
    id: String,
    endpoint: String,
    kind: BackendKind,
    protocol: BackendProtocol,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    deadline_ms: Option<u64>,
    #[serde(default = "default_enabled")]
    enabled: bool,
    #[serde(default)]
    api_key: Option<String>,
}

impl From<BackendEntry> for BackendDescriptor {
    fn from(e: BackendEntry) -> Self {
        Self {
            deadline_ms: e.deadline_ms.unwrap_or_else(|| e.kind.default_deadline_ms()),
            id: e.id,
            endpoint: e.endpoint,
            kind: e.kind,
            protocol: e.protocol,
            model: e.model,
            enabled: e.enabled,
            api_key: e.api_key,
        }
    }
}

fn default_enabled() -> bool {
    true
}

impl BackendDescriptor {
    /// Deadline applied to a call when the caller does not supply one.
    pub fn default_deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    /// Endpoint with any trailing slash removed, ready for path joining.
    pub fn base_url(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }
}

/// Top-level GenForge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgeConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
    /// Configured backends in preference order.
    pub backends: Vec<BackendDescriptor>,
}

impl ForgeConfig {
    /// Create configuration from the process environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> Result<Self> {
        Self::from_lookup(data_dir, |key| std::env::var(key).ok())
    }

    /// Create configuration using `lookup` in place of the process environment.
    pub fn from_lookup(
        data_dir: impl AsRef<Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let port = lookup("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let data_paths = DataPaths::new(data_dir)?;

        let mut backends = if data_paths.backends_file.exists() {
            load_backends(&data_paths.backends_file)?
        } else {
            default_backends(&lookup)
        };

        // Env vars as fallback for API keys
        if let Some(key) = lookup("OPENAI_API_KEY") {
            for backend in backends
                .iter_mut()
                .filter(|b| b.protocol == BackendProtocol::OpenAi && b.api_key.is_none())
            {
                backend.api_key = Some(key.clone());
            }
        }

        validate_backends(&backends)?;

        info!(
            "Configured {} backends: {}",
            backends.len(),
            backends
                .iter()
                .map(|b| format!("{}({})", b.id, b.kind))
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(Self {
            port,
            data_paths,
            backends,
        })
    }

    /// Enabled backends of the given kind, in preference order.
    pub fn backends_of(&self, kind: BackendKind) -> impl Iterator<Item = &BackendDescriptor> {
        self.backends
            .iter()
            .filter(move |b| b.enabled && b.kind == kind)
    }
}

fn load_backends(path: &Path) -> Result<Vec<BackendDescriptor>> {
    let raw = std::fs::read_to_string(path)?;
    let entries: Vec<BackendEntry> = serde_json::from_str(&raw)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    let backends: Vec<BackendDescriptor> = entries.into_iter().map(Into::into).collect();
    if backends.is_empty() {
        warn!(
            "{} lists no backends; every request will use templates",
            path.display()
        );
    }
    Ok(backends)
}

fn default_backends(lookup: &impl Fn(&str) -> Option<String>) -> Vec<BackendDescriptor> {
    vec![
        BackendDescriptor {
            id: "ollama".into(),
            endpoint: lookup("GENFORGE_OLLAMA_URL").unwrap_or_else(|| DEFAULT_OLLAMA_URL.into()),
            kind: BackendKind::Text,
            protocol: BackendProtocol::Ollama,
            model: Some(
                lookup("GENFORGE_OLLAMA_MODEL").unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.into()),
            ),
            deadline_ms: DEFAULT_TEXT_DEADLINE_MS,
            enabled: true,
            api_key: None,
        },
        BackendDescriptor {
            id: "deepseek".into(),
            endpoint: lookup("GENFORGE_CHAT_URL").unwrap_or_else(|| DEFAULT_CHAT_URL.into()),
            kind: BackendKind::Text,
            protocol: BackendProtocol::OpenAi,
            model: Some(
                lookup("GENFORGE_CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.into()),
            ),
            deadline_ms: DEFAULT_TEXT_DEADLINE_MS,
            enabled: true,
            api_key: None,
        },
        BackendDescriptor {
            id: "stable-diffusion".into(),
            endpoint: lookup("GENFORGE_SD_URL").unwrap_or_else(|| DEFAULT_SD_URL.into()),
            kind: BackendKind::Image,
            protocol: BackendProtocol::StableDiffusion,
            model: None,
            deadline_ms: DEFAULT_IMAGE_DEADLINE_MS,
            enabled: true,
            api_key: None,
        },
    ]
}

fn validate_backends(backends: &[BackendDescriptor]) -> Result<()> {
    let mut seen = std::collections::HashSet::new();
    for b in backends {
        if b.id.trim().is_empty() {
            return Err(Error::Config("backend with empty id".into()));
        }
        if !seen.insert(b.id.as_str()) {
            return Err(Error::Config(format!("duplicate backend id: {}", b.id)));
        }
        if b.deadline_ms == 0 {
            return Err(Error::Config(format!("backend {} has a zero deadline", b.id)));
        }
        let image_protocol = b.protocol == BackendProtocol::StableDiffusion;
        if image_protocol != (b.kind == BackendKind::Image) {
            return Err(Error::Config(format!(
                "backend {}: protocol {:?} cannot serve {} requests",
                b.id, b.protocol, b.kind
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ForgeConfig::from_lookup(dir.path(), lookup_from(&[])).unwrap();

        assert_eq!(config.port, 3003);
        assert!(config.data_paths.artifacts.is_dir());
        let ids: Vec<_> = config.backends.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["ollama", "deepseek", "stable-diffusion"]);
        assert_eq!(config.backends_of(BackendKind::Text).count(), 2);
        assert_eq!(config.backends_of(BackendKind::Image).count(), 1);
    }

    #[test]
    fn test_env_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let config = ForgeConfig::from_lookup(
            dir.path(),
            lookup_from(&[
                ("PORT", "8081"),
                ("GENFORGE_OLLAMA_URL", "http://gpu-box:11434/"),
                ("OPENAI_API_KEY", "sk-test"),
            ]),
        )
        .unwrap();

        assert_eq!(config.port, 8081);
        let ollama = &config.backends[0];
        assert_eq!(ollama.base_url(), "http://gpu-box:11434");
        assert!(ollama.api_key.is_none());
        assert_eq!(config.backends[1].api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_backends_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("backends.json"),
            r#"[
                {"id": "local", "endpoint": "http://localhost:11434", "kind": "text",
                 "protocol": "ollama", "model": "tinyllama", "deadline_ms": 5000},
                {"id": "sd", "endpoint": "http://localhost:7860", "kind": "image",
                 "protocol": "stable-diffusion", "enabled": false}
            ]"#,
        )
        .unwrap();

        let config = ForgeConfig::from_lookup(dir.path(), lookup_from(&[])).unwrap();
        assert_eq!(config.backends.len(), 2);
        assert_eq!(config.backends[0].default_deadline(), Duration::from_secs(5));
        assert_eq!(config.backends[1].deadline_ms, DEFAULT_IMAGE_DEADLINE_MS);
        assert_eq!(config.backends_of(BackendKind::Image).count(), 0);
    }

    #[test]
    fn test_missing_deadline_defaults_by_kind() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("backends.json"),
            r#"[
                {"id": "llm", "endpoint": "http://localhost:8080", "kind": "text", "protocol": "openai"},
                {"id": "sd", "endpoint": "http://localhost:7860", "kind": "image", "protocol": "stable-diffusion"}
            ]"#,
        )
        .unwrap();

        let config = ForgeConfig::from_lookup(dir.path(), lookup_from(&[])).unwrap();
        assert_eq!(config.backends[0].deadline_ms, DEFAULT_TEXT_DEADLINE_MS);
        assert_eq!(config.backends[1].default_deadline(), Duration::from_secs(90));
    }

    #[test]
    fn test_rejects_mismatched_protocol() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("backends.json"),
            r#"[{"id": "x", "endpoint": "http://x", "kind": "image", "protocol": "ollama"}]"#,
        )
        .unwrap();

        let err = ForgeConfig::from_lookup(dir.path(), lookup_from(&[])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_api_key_not_serialized() {
        let dir = tempfile::tempdir().unwrap();
        let config = ForgeConfig::from_lookup(
            dir.path(),
            lookup_from(&[("OPENAI_API_KEY", "sk-secret")]),
        )
        .unwrap();
        let json = serde_json::to_string(&config.backends).unwrap();
        assert!(!json.contains("sk-secret"));
    }
}
