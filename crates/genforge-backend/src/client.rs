//! Deadline-bounded backend invocation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use genforge_core::BackendDescriptor;
use tracing::{debug, warn};

use crate::extract::finish;
use crate::types::{BackendOutcome, CallError, Expected, RawPayload};

/// A remote generative service.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Static configuration of this backend.
    fn descriptor(&self) -> &BackendDescriptor;

    /// Send one prompt and return the decoded payload. No retries.
    async fn generate(&self, prompt: &str) -> Result<RawPayload, CallError>;

    /// Cheap reachability check.
    async fn probe(&self) -> bool;
}

/// Run one attempt against `backend`, returning within `deadline`. Text
/// payloads are extracted according to `expected`.
///
/// The call runs on its own task. When the deadline fires the task is left to
/// finish on its own and its result is dropped; whatever the remote service
/// queued is not cancelled.
pub async fn invoke(
    backend: Arc<dyn GenerativeBackend>,
    prompt: &str,
    deadline: Duration,
    expected: Expected,
) -> BackendOutcome {
    let id = backend.descriptor().id.clone();
    let prompt = prompt.to_string();
    let abandoned = Arc::new(AtomicBool::new(false));
    let started = Instant::now();

    let task = {
        let abandoned = abandoned.clone();
        let id = id.clone();
        tokio::spawn(async move {
            let result = backend.generate(&prompt).await;
            if abandoned.load(Ordering::Acquire) {
                debug!(
                    backend = %id,
                    ok = result.is_ok(),
                    "late response discarded after deadline"
                );
            }
            result
        })
    };

    let outcome = match tokio::time::timeout(deadline, task).await {
        Err(_) => {
            abandoned.store(true, Ordering::Release);
            BackendOutcome::Timeout
        }
        Ok(Err(join_err)) => BackendOutcome::TransportError(format!("call aborted: {}", join_err)),
        Ok(Ok(Err(CallError::Transport(detail)))) => BackendOutcome::TransportError(detail),
        Ok(Ok(Err(CallError::Unusable(detail)))) => BackendOutcome::UnusableOutput(detail),
        Ok(Ok(Ok(raw))) => finish(raw, expected),
    };

    let elapsed_ms = started.elapsed().as_millis() as u64;
    match &outcome {
        BackendOutcome::Success(body) => {
            debug!(backend = %id, elapsed_ms, bytes = body.len(), "backend succeeded");
        }
        BackendOutcome::Timeout => {
            warn!(backend = %id, deadline_ms = deadline.as_millis() as u64, "backend timed out");
        }
        BackendOutcome::TransportError(detail) | BackendOutcome::UnusableOutput(detail) => {
            warn!(backend = %id, elapsed_ms, outcome = outcome.label(), "{}", detail);
        }
    }

    outcome
}

/// Invoke every backend concurrently, each under its own default deadline,
/// and wait for all of them. Output order matches input order.
pub async fn invoke_all(
    backends: &[Arc<dyn GenerativeBackend>],
    prompt: &str,
    expected: Expected,
) -> Vec<(BackendDescriptor, BackendOutcome)> {
    let calls = backends.iter().map(|backend| {
        let descriptor = backend.descriptor().clone();
        let deadline = descriptor.default_deadline();
        let backend = backend.clone();
        async move {
            let outcome = invoke(backend, prompt, deadline, expected).await;
            (descriptor, outcome)
        }
    });
    futures::future::join_all(calls).await
}
