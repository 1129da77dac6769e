//! Configured backends, grouped by kind, plus health probing.

use std::sync::Arc;

use genforge_core::{BackendKind, Error, ForgeConfig, Result};
use reqwest::Client;
use serde::Serialize;
use tracing::info;

use crate::client::GenerativeBackend;
use crate::providers::build_backend;

/// Reachability of one backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Online,
    Offline,
}

/// Health entry for one backend.
#[derive(Debug, Clone, Serialize)]
pub struct BackendHealth {
    pub id: String,
    pub kind: BackendKind,
    pub endpoint: String,
    pub status: HealthStatus,
}

/// All enabled backends in preference order.
pub struct BackendRegistry {
    backends: Vec<Arc<dyn GenerativeBackend>>,
}

impl BackendRegistry {
    /// Build HTTP adapters for every enabled backend in `config`.
    pub fn from_config(config: &ForgeConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| Error::Http(format!("Failed to build HTTP client: {}", e)))?;

        let backends: Vec<_> = config
            .backends_of(BackendKind::Text)
            .chain(config.backends_of(BackendKind::Image))
            .map(|d| build_backend(d.clone(), client.clone()))
            .collect();

        info!("BackendRegistry: {} backends enabled", backends.len());
        Ok(Self { backends })
    }

    /// Wrap pre-built backends (used by tests and embedders).
    pub fn new(backends: Vec<Arc<dyn GenerativeBackend>>) -> Self {
        Self { backends }
    }

    /// Registry with no backends: every request resolves from templates.
    pub fn empty() -> Self {
        Self {
            backends: Vec::new(),
        }
    }

    /// Backends serving `kind`, in preference order.
    pub fn of_kind(&self, kind: BackendKind) -> Vec<Arc<dyn GenerativeBackend>> {
        self.backends
            .iter()
            .filter(|b| b.descriptor().kind == kind)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Probe every backend concurrently.
    pub async fn health(&self) -> Vec<BackendHealth> {
        let probes = self.backends.iter().map(|backend| async move {
            let d = backend.descriptor();
            let status = if backend.probe().await {
                HealthStatus::Online
            } else {
                HealthStatus::Offline
            };
            BackendHealth {
                id: d.id.clone(),
                kind: d.kind,
                endpoint: d.endpoint.clone(),
                status,
            }
        });
        futures::future::join_all(probes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedBackend;
    use crate::types::{CallError, RawPayload};

    #[test]
    fn test_from_config_skips_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ForgeConfig::from_lookup(dir.path(), |_| None).unwrap();
        config.backends[1].enabled = false;

        let registry = BackendRegistry::from_config(&config).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.of_kind(BackendKind::Text).len(), 1);
        assert_eq!(registry.of_kind(BackendKind::Image).len(), 1);
    }

    #[tokio::test]
    async fn test_health_reports_each_backend() {
        let up = ScriptedBackend::text("up", 0, Ok(RawPayload::Text("ok".into())));
        let down = ScriptedBackend::text("down", 0, Err(CallError::Transport("refused".into())));
        let backends: Vec<Arc<dyn GenerativeBackend>> = vec![up.as_dyn(), down.as_dyn()];
        let registry = BackendRegistry::new(backends);

        let health = registry.health().await;
        assert_eq!(health.len(), 2);
        assert_eq!(health[0].id, "up");
        assert_eq!(health[0].status, HealthStatus::Online);
        assert_eq!(health[1].status, HealthStatus::Offline);
    }
}
