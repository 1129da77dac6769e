//! Scripted in-process backend for tests. Enabled by the `test-utils` feature.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use genforge_core::{BackendDescriptor, BackendKind, BackendProtocol};
use parking_lot::Mutex;

use crate::client::GenerativeBackend;
use crate::types::{CallError, RawPayload};

/// Backend that sleeps for `delay`, then returns a fixed result, recording
/// every prompt it receives.
pub struct ScriptedBackend {
    descriptor: BackendDescriptor,
    delay: Duration,
    result: Result<RawPayload, CallError>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    /// Text backend with a 200ms default deadline.
    pub fn text(id: &str, delay_ms: u64, result: Result<RawPayload, CallError>) -> Arc<Self> {
        Self::build(id, BackendKind::Text, BackendProtocol::Ollama, delay_ms, result)
    }

    /// Image backend with a 200ms default deadline.
    pub fn image(id: &str, delay_ms: u64, result: Result<RawPayload, CallError>) -> Arc<Self> {
        Self::build(
            id,
            BackendKind::Image,
            BackendProtocol::StableDiffusion,
            delay_ms,
            result,
        )
    }

    fn build(
        id: &str,
        kind: BackendKind,
        protocol: BackendProtocol,
        delay_ms: u64,
        result: Result<RawPayload, CallError>,
    ) -> Arc<Self> {
        Arc::new(Self {
            descriptor: BackendDescriptor {
                id: id.into(),
                endpoint: format!("http://{}.invalid", id),
                kind,
                protocol,
                model: None,
                deadline_ms: 200,
                enabled: true,
                api_key: None,
            },
            delay: Duration::from_millis(delay_ms),
            result,
            prompts: Mutex::new(Vec::new()),
        })
    }

    /// Returns text wrapped in `Ok`.
    pub fn ok_text(s: &str) -> Result<RawPayload, CallError> {
        Ok(RawPayload::Text(s.into()))
    }

    /// Fails with a transport error.
    pub fn refused() -> Result<RawPayload, CallError> {
        Err(CallError::Transport("connection refused".into()))
    }

    pub fn as_dyn(self: &Arc<Self>) -> Arc<dyn GenerativeBackend> {
        self.clone()
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl GenerativeBackend for ScriptedBackend {
    fn descriptor(&self) -> &BackendDescriptor {
        &self.descriptor
    }

    async fn generate(&self, prompt: &str) -> Result<RawPayload, CallError> {
        self.prompts.lock().push(prompt.to_string());
        tokio::time::sleep(self.delay).await;
        self.result.clone()
    }

    async fn probe(&self) -> bool {
        self.result.is_ok()
    }
}
